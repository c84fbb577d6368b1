mod cli;
mod error;
mod grid;
mod ingest;
mod logging;
mod metrics;
mod model;
mod orchestrator;
mod render;
mod service;
mod storage;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = args.json || args.text;

    let res = cli::run(args).await;
    // Explicitly exit with code 0 on success, especially for non-TUI modes
    if res.is_ok() && is_non_tui {
        std::process::exit(0);
    }
    res
}
