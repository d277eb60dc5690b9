//! Command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use tracing::{info, warn};

use kakeibo_core::{CategoryResolver, Config, GatewayClient, LedgerEntry, ParserRegistry, Source};

/// Marker placed in every ledger comment, so imported entries can be found
/// (and bulk-deleted) later
const COMMENT_MARKER: &str = "Created by kakeibo";

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    Config::load(path.map(|p| p.as_path())).context("failed to load configuration")
}

fn read_body(file: &Path) -> Result<String> {
    std::fs::read_to_string(file)
        .with_context(|| format!("failed to read mail body from {}", file.display()))
}

fn build_resolver(config: Config, offline: bool) -> CategoryResolver {
    let gateway = if offline {
        None
    } else {
        let gateway = GatewayClient::from_env(&config.gateway);
        if gateway.is_none() {
            warn!("no classification gateway available, unmatched shops resolve to その他");
        }
        gateway
    };
    let settings = config.gateway.clone();
    CategoryResolver::new(config.taxonomy, config.shop_map, gateway, &settings)
}

/// `kakeibo parse` - run one source parser over a saved mail body
pub fn cmd_parse(config_path: Option<&PathBuf>, source_key: &str, file: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let source: Source = source_key.parse()?;
    let registry = ParserRegistry::new(config.skip_merchants);

    let body = read_body(file)?;
    let records = registry.parse(source, &body);

    if records.is_empty() {
        info!(source = %source, "no transaction found in mail body");
    }
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

/// `kakeibo resolve` - classify a single shop name
pub async fn cmd_resolve(config_path: Option<&PathBuf>, shop: &str, offline: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let taxonomy = config.taxonomy.clone();
    let resolver = build_resolver(config, offline);

    let resolved = resolver.resolve(shop).await;
    let category_name = taxonomy
        .category(resolved.category_id)
        .map(|c| c.name.as_str())
        .unwrap_or("?");

    println!(
        "{} -> {} (category {}, genre {})",
        shop, category_name, resolved.category_id, resolved.genre_id
    );
    Ok(())
}

/// `kakeibo process` - parse a mail body and emit ledger-ready entries
///
/// Skipped records (internal transfers) are reported but excluded from the
/// output, matching the submission contract: the message counts as handled,
/// the transfer is never posted.
pub async fn cmd_process(
    config_path: Option<&PathBuf>,
    source_key: &str,
    file: &Path,
    date: Option<NaiveDate>,
    offline: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let source: Source = source_key.parse()?;
    let registry = ParserRegistry::new(config.skip_merchants.clone());
    let resolver = build_resolver(config, offline);

    let body = read_body(file)?;
    let records = registry.parse(source, &body);
    if records.is_empty() {
        info!(source = %source, "no transaction found in mail body");
    }

    let default_date = date.unwrap_or_else(|| Local::now().date_naive());
    let mut entries = Vec::new();
    for record in records {
        if record.skip {
            info!(shop = %record.shop, amount = record.amount, "skipping internal transfer");
            continue;
        }
        let resolved = resolver.resolve(&record.shop).await;
        let record = record.with_category(resolved);
        if let Some(entry) = LedgerEntry::from_record(&record, default_date, COMMENT_MARKER) {
            entries.push(entry);
        }
    }

    info!(
        source = %source.display_name(),
        count = entries.len(),
        "entries ready for submission"
    );
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

/// `kakeibo categories` - print the taxonomy tree
pub fn cmd_categories(config_path: Option<&PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    for category in config.taxonomy.categories() {
        println!("{} ({})", category.name, category.id);
        for genre in &category.genres {
            println!("  └ {} ({})", genre.name, genre.id);
        }
    }
    Ok(())
}
