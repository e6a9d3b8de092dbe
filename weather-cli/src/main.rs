//! Binary crate for the `weathergrid` sync job.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Choosing between a bucket and a local directory for snapshots
//! - Wiring logging, timeout and Ctrl-C cancellation around one sync run

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
