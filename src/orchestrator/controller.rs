//! Job lifecycle controller.
//!
//! Serializes UI commands and poll ticks onto one [`Orchestrator`] and emits events
//! for presentation layers.

use super::machine::{Orchestrator, SubmitRequest};
use super::timer::PollTimer;
use crate::model::JobEvent;
use crate::service::KrigingApi;
use anyhow::Result;
use std::path::PathBuf;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    LoadPoints(PathBuf),
    Submit(SubmitRequest),
    Search(String),
    Quit,
}

/// Drive the orchestrator from UI commands and poll ticks until quit.
pub(crate) async fn run_controller<A: KrigingApi>(
    api: A,
    event_tx: UnboundedSender<JobEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut orch = Orchestrator::new(api, event_tx);
    let mut timer = PollTimer::default();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::LoadPoints(path)) => orch.load_points(&path),
                    Some(UiCommand::Submit(req)) => orch.submit(req).await,
                    Some(UiCommand::Search(text)) => orch.search(&text).await,
                    // Dropping the timer is enough to stop an in-flight job from polling.
                    Some(UiCommand::Quit) | None => break,
                }
            }
            _ = timer.tick() => {
                orch.poll().await;
            }
        }
        timer.sync(orch.is_polling());
    }

    Ok(())
}
