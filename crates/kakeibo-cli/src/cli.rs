//! CLI argument definitions

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "kakeibo",
    version,
    about = "Turn payment-provider emails into categorized ledger entries"
)]
pub struct Cli {
    /// Path to a config file (default: data-dir override, then built-in)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a saved mail body into transaction records
    Parse {
        /// Mail source key (rakuten-pay, rakuten-pay-online, rakuten-card)
        #[arg(long)]
        source: String,
        /// File holding the mail body text
        #[arg(long)]
        file: PathBuf,
    },
    /// Resolve a shop name to a category/genre pair
    Resolve {
        /// Shop name as extracted from a mail
        shop: String,
        /// Static rules only; never call the classification gateway
        #[arg(long)]
        offline: bool,
    },
    /// Parse a mail body and resolve every record into ledger-ready entries
    Process {
        /// Mail source key (rakuten-pay, rakuten-pay-online, rakuten-card)
        #[arg(long)]
        source: String,
        /// File holding the mail body text
        #[arg(long)]
        file: PathBuf,
        /// Receipt date used for records whose mail carried no date
        /// (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Static rules only; never call the classification gateway
        #[arg(long)]
        offline: bool,
    },
    /// Print the configured category taxonomy
    Categories,
}
