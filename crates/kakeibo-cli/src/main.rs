//! kakeibo CLI - payment-email importer
//!
//! Usage:
//!   kakeibo parse --source rakuten-pay --file mail.txt    Parse a mail body
//!   kakeibo resolve "ユニクロ 渋谷店"                     Classify a shop name
//!   kakeibo process --source rakuten-card --file mail.txt Parse and classify
//!   kakeibo categories                                    Show the taxonomy

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Parse { source, file } => {
            commands::cmd_parse(cli.config.as_ref(), &source, &file)
        }
        Commands::Resolve { shop, offline } => {
            commands::cmd_resolve(cli.config.as_ref(), &shop, offline).await
        }
        Commands::Process {
            source,
            file,
            date,
            offline,
        } => commands::cmd_process(cli.config.as_ref(), &source, &file, date, offline).await,
        Commands::Categories => commands::cmd_categories(cli.config.as_ref()),
    }
}
