//! Configuration loading
//!
//! The taxonomy, shop rules, skip-merchant substrings, and gateway settings
//! all live in one TOML file. Resolution is two-layer, matching the rest of
//! the tooling's conventions:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/kakeibo/config/kakeibo.toml)
//! 2. The embedded default (compiled into the binary)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::taxonomy::{Category, ShopCategoryMap, ShopRule, Taxonomy};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/kakeibo.toml");

/// Classification gateway settings
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// API base URL (model path and key are appended per call)
    pub endpoint: String,
    pub model: String,
    /// Minimum spacing between fallback calls (provider rate limit)
    pub min_call_interval: Duration,
    /// Output budget; only a short "categoryId,genreId" answer is expected
    pub max_output_tokens: u32,
    pub timeout: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            min_call_interval: Duration::from_secs(4),
            max_output_tokens: 20,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Fully validated runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub taxonomy: Taxonomy,
    pub shop_map: ShopCategoryMap,
    pub skip_merchants: Vec<String>,
    pub gateway: GatewaySettings,
}

/// Raw TOML shape before validation
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    skip_merchants: Vec<String>,
    #[serde(default)]
    gateway: RawGateway,
    categories: Vec<Category>,
    #[serde(default)]
    shop_rules: Vec<ShopRule>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGateway {
    endpoint: Option<String>,
    model: Option<String>,
    min_call_interval_secs: Option<u64>,
    max_output_tokens: Option<u32>,
    timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration (explicit path > data-dir override > embedded default)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let content = match override_path {
            Some(path) => fs::read_to_string(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => {
                    debug!(path = %path.display(), "loading config override");
                    fs::read_to_string(&path)?
                }
                None => DEFAULT_CONFIG.to_string(),
            },
        };
        Self::from_toml_str(&content)
    }

    /// Parse and validate a config document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)?;
        let defaults = GatewaySettings::default();

        let taxonomy = Taxonomy::new(raw.categories)?;
        let shop_map = ShopCategoryMap::new(raw.shop_rules);
        shop_map.validate(&taxonomy)?;

        Ok(Self {
            taxonomy,
            shop_map,
            skip_merchants: raw.skip_merchants,
            gateway: GatewaySettings {
                endpoint: raw.gateway.endpoint.unwrap_or(defaults.endpoint),
                model: raw.gateway.model.unwrap_or(defaults.model),
                min_call_interval: raw
                    .gateway
                    .min_call_interval_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.min_call_interval),
                max_output_tokens: raw
                    .gateway
                    .max_output_tokens
                    .unwrap_or(defaults.max_output_tokens),
                timeout: raw
                    .gateway
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.timeout),
            },
        })
    }

    /// The embedded default configuration
    pub fn embedded_default() -> Result<Self> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("kakeibo").join("config").join("kakeibo.toml"))
}
