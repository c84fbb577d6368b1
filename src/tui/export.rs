use crate::model::RenderedJob;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

// Global clipboard manager channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

/// Export the result as JSON and CSV next to the working directory.
/// Returns the absolute paths of both files.
pub fn export_result(job: &RenderedJob) -> Result<(PathBuf, PathBuf)> {
    let current_dir = std::env::current_dir().context("get current directory")?;
    let json = current_dir.join(crate::storage::default_export_name(job.process_id, "json"));
    let csv = current_dir.join(crate::storage::default_export_name(job.process_id, "csv"));
    crate::storage::export_json(&json, job)?;
    crate::storage::export_csv(&csv, job)?;
    Ok((json, csv))
}

/// Start the clipboard thread on first use. Each copy keeps its clipboard alive for a
/// moment so clipboard managers on Linux can read it.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                match Clipboard::new() {
                    Ok(mut clipboard) => {
                        if let Err(e) = clipboard.set_text(&text) {
                            tracing::warn!(error = %e, "clipboard write failed");
                            continue;
                        }
                        std::thread::sleep(Duration::from_secs(2));
                    }
                    Err(e) => tracing::warn!(error = %e, "clipboard unavailable"),
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Queue text for the clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}
