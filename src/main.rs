mod actions;
mod auth;
mod cli;
mod config;
mod error;
mod graph;
mod history;
mod links;
mod metrics;
mod output;
mod records;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting stagelens");
    cli.execute().await?;

    Ok(())
}
