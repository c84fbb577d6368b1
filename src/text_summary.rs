//! Text summary builder for CLI output.
//!
//! This module computes metrics and formats human-readable lines for text mode.

use crate::metrics;
use crate::model::RenderedJob;
use crate::render::Heatmap;
use anyhow::{Context, Result};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a finished job and its rendered lattice.
pub(crate) fn build_text_summary(job: &RenderedJob, heatmap: &Heatmap) -> Result<TextSummary> {
    let mut lines = Vec::new();

    lines.push(format!("Job: {}", job.process_id));
    lines.push(format!(
        "Variogram: {}  Method: {}",
        job.variogram, job.method
    ));
    lines.push(format!("Grid: {}", job.grid));
    lines.push(format!(
        "Cells: {} ({} lat x {} lon)",
        job.grid.cell_count(),
        heatmap.rows(),
        heatmap.cols()
    ));

    let stats = metrics::compute_value_stats(&job.result.values())
        .context("result contains no values to summarize")?;
    lines.push(format!(
        "Values: n {} min {:.4} max {:.4} avg {:.4} med {:.4} p25 {:.4} p75 {:.4}",
        stats.count,
        stats.min,
        stats.max,
        stats.mean,
        stats.median,
        stats.p25,
        stats.p75
    ));

    Ok(TextSummary { lines })
}
