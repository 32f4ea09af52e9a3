//! itemenrich CLI — enrich a JSON array of records from remote lookups.
//!
//! Reads records, optionally attaches namespace, metadata, and settings data
//! fetched from the namespace and items services, and writes the array back.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
