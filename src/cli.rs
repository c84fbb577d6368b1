use crate::grid::GridForm;
use crate::model::{ClientConfig, JobEvent, KrigingMethod, RenderedJob, Variogram};
use crate::orchestrator::{process_result, Orchestrator, PollTimer, SubmitRequest};
use crate::service::KrigingClient;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;

/// Per-request timeout for calls to the kriging service.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "kriging-tui",
    version,
    about = "Submit geospatial kriging jobs to a remote service and view the result"
)]
pub struct Cli {
    /// Base URL of the kriging service
    #[arg(long, env = "KRIGING_HOST", default_value = "http://localhost:8000")]
    pub host: String,

    /// Points file: one `lat lon value` row per line
    #[arg(long)]
    pub points: Option<std::path::PathBuf>,

    /// Latitude grid as START:STOP:STEP
    #[arg(long, value_name = "START:STOP:STEP", allow_hyphen_values = true)]
    pub lat: Option<String>,

    /// Longitude grid as START:STOP:STEP
    #[arg(long, value_name = "START:STOP:STEP", allow_hyphen_values = true)]
    pub lon: Option<String>,

    /// Variogram model
    #[arg(long, value_enum)]
    pub variogram: Option<Variogram>,

    /// Kriging method
    #[arg(long, value_enum)]
    pub method: Option<KrigingMethod>,

    /// Show an existing job instead of submitting a new one
    #[arg(long, value_name = "JOB_ID", conflicts_with = "points")]
    pub search: Option<String>,

    /// Print the finished job as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print a text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Export the result collection as JSON
    #[arg(long)]
    pub export_json: Option<std::path::PathBuf>,

    /// Export the result as lat,lon,value CSV
    #[arg(long)]
    pub export_csv: Option<std::path::PathBuf>,

    /// Log file for the interactive UI
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,
}

pub async fn run(args: Cli) -> Result<()> {
    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_headless(args).await;
        }
    }

    run_headless(args).await
}

/// Build a `ClientConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> ClientConfig {
    ClientConfig {
        base_url: args.host.clone(),
        timeout: REQUEST_TIMEOUT,
        user_agent: format!("kriging-tui/{}", env!("CARGO_PKG_VERSION")),
    }
}

/// Build the submit request described by the command line.
pub fn submit_request(args: &Cli) -> SubmitRequest {
    SubmitRequest {
        variogram: args.variogram,
        method: args.method,
        grid: GridForm::from_triples(
            args.lat.as_deref().unwrap_or_default(),
            args.lon.as_deref().unwrap_or_default(),
        ),
    }
}

/// Forward pending orchestrator events to the output writer, remembering the last
/// message that explains why no result may follow.
fn relay_events(
    evt_rx: &mut mpsc::UnboundedReceiver<JobEvent>,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
    last_message: &mut Option<String>,
) {
    while let Ok(ev) = evt_rx.try_recv() {
        let line = match ev {
            JobEvent::StateChanged(state) => match state.process_id() {
                Some(id) => format!("== {} ({id}) ==", state.label()),
                None => format!("== {} ==", state.label()),
            },
            JobEvent::PointsLoaded { path, count } => {
                format!("Loaded {count} points from {}", path.display())
            }
            JobEvent::JobSubmitted { process_id } => format!("Submitted job {process_id}"),
            JobEvent::JobResolved { process_id, .. } => format!("Found job {process_id}"),
            JobEvent::ResultReady(job) => {
                format!("Result ready: {} points", job.result.len())
            }
            JobEvent::Info(msg) => {
                *last_message = Some(msg.clone());
                msg
            }
            JobEvent::Failed(msg) => {
                *last_message = Some(msg.clone());
                format!("Error: {msg}")
            }
        };
        let _ = out_tx.send(OutputLine::Stderr(line));
    }
}

/// Run the submit or search path without a UI, then print the result.
async fn run_headless(args: Cli) -> Result<()> {
    crate::logging::init_stderr();
    let api = KrigingClient::new(&build_config(&args))?;
    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<JobEvent>();
    let mut orch = Orchestrator::new(api, evt_tx);
    let mut last_message = None;

    if let Some(id) = args.search.as_deref() {
        orch.search(id).await;
    } else {
        let path = args
            .points
            .as_deref()
            .context("--points or --search is required with --json/--text")?;
        orch.load_points(path);
        orch.submit(submit_request(&args)).await;
    }
    relay_events(&mut evt_rx, &out_tx, &mut last_message);

    let mut timer = PollTimer::default();
    timer.sync(orch.is_polling());
    while orch.is_polling() {
        tokio::select! {
            _ = timer.tick() => orch.poll().await,
            _ = tokio::signal::ctrl_c() => {
                drop(out_tx);
                let _ = out_handle.await;
                anyhow::bail!("interrupted while waiting for the job");
            }
        }
        relay_events(&mut evt_rx, &out_tx, &mut last_message);
    }

    let job: RenderedJob = match orch.rendered() {
        Some(job) => job.clone(),
        None => {
            drop(out_tx);
            let _ = out_handle.await;
            anyhow::bail!(last_message.unwrap_or_else(|| "job did not produce a result".into()));
        }
    };

    let processed = process_result(
        &job,
        args.export_json.as_deref(),
        args.export_csv.as_deref(),
    );
    for msg in processed.export_messages {
        let _ = out_tx.send(OutputLine::Stderr(msg));
    }
    let heatmap = processed.heatmap.context("result does not match its grid")?;

    if args.json {
        let out = serde_json::to_string_pretty(&job)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        let summary = crate::text_summary::build_text_summary(&job, &heatmap)?;
        for line in summary.lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }

    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}
