//! Post-result processing utilities.
//!
//! Builds the rendered lattice and runs the requested exports once a result arrives.

use crate::model::RenderedJob;
use crate::render::{Heatmap, RenderError};
use crate::storage;
use std::path::Path;
use tracing::error;

/// Result of post-processing, ready for presentation layers.
pub(crate) struct ProcessedResult {
    pub heatmap: Result<Heatmap, RenderError>,
    pub export_messages: Vec<String>,
}

/// Process a finished job: build its heatmap and write any requested exports.
pub(crate) fn process_result(
    job: &RenderedJob,
    export_json: Option<&Path>,
    export_csv: Option<&Path>,
) -> ProcessedResult {
    let heatmap = Heatmap::build(&job.result, &job.grid);
    if let Err(e) = &heatmap {
        error!(process_id = %job.process_id, error = %e, "result does not cover its grid");
    }

    let mut export_messages = Vec::new();
    if let Some(export_path) = export_json {
        match storage::export_json(export_path, job) {
            Ok(_) => export_messages.push(format!("Exported JSON: {}", export_path.display())),
            Err(e) => export_messages.push(format!("Export JSON failed: {e:#}")),
        }
    }
    if let Some(export_path) = export_csv {
        match storage::export_csv(export_path, job) {
            Ok(_) => export_messages.push(format!("Exported CSV: {}", export_path.display())),
            Err(e) => export_messages.push(format!("Export CSV failed: {e:#}")),
        }
    }

    ProcessedResult {
        heatmap,
        export_messages,
    }
}
