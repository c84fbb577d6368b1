//! Result exports.

use crate::model::RenderedJob;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File name used when the user exports without choosing one.
pub fn default_export_name(process_id: Uuid, ext: &str) -> PathBuf {
    PathBuf::from(format!("kriging-{process_id}.{ext}"))
}

fn create(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    std::fs::File::create(path).with_context(|| format!("create {}", path.display()))
}

/// Write the result collection in the service's feature-collection shape.
pub fn export_json(path: &Path, job: &RenderedJob) -> Result<()> {
    let file = create(path)?;
    let mut w = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, &job.result).context("serialize result")?;
    w.flush().with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Write one `lat,lon,value` row per result point.
pub fn export_csv(path: &Path, job: &RenderedJob) -> Result<()> {
    let file = create(path)?;
    let mut w = std::io::BufWriter::new(file);
    writeln!(w, "lat,lon,value")?;
    for p in job.result.points() {
        writeln!(w, "{},{},{}", p.lat(), p.lon(), p.value())?;
    }
    w.flush().with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
