#![warn(missing_docs)]

//! `olk`: command line access to a storage array through the OceanLink session layer.

use anyhow::Result;
use clap::Parser;
use oceanlink_rest::cli::Cli;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    tracing::debug!(config = %cli.config.display(), "OceanLink CLI starting");
    cli.run().await
}
