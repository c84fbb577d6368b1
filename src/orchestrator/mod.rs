//! Application-level orchestration.
//!
//! This module owns the job lifecycle (load, submit, poll, search) and post-result
//! processing such as rendering and exports. UI/CLI layers call into this module to
//! keep responsibilities separated.

mod controller;
mod machine;
mod post_process;
mod timer;

pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use machine::{Orchestrator, SubmitRequest};
pub(crate) use post_process::{process_result, ProcessedResult};
pub(crate) use timer::PollTimer;
