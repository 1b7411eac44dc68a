//! kubegraph - explore dependency relationships between Kubernetes resources
//!
//! Retrieves the resource dependency graph from a graph backend (over HTTP,
//! through the API server service proxy, or from a JSON snapshot) and prints,
//! focuses, summarizes or exports it.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Args, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_file = init_logging(args.debug);
    if let Some(ref log_path) = log_file {
        eprintln!(
            "Debug logging enabled. Logs written to: {}",
            log_path.display()
        );
        tracing::debug!("kubegraph {} starting", env!("CARGO_PKG_VERSION"));
    }

    cli::run(args).await
}
