//! Kakeibo Core Library
//!
//! Shared functionality for the kakeibo payment-email importer:
//! - Markup stripping for HTML notification mails
//! - Per-source email parsers (app payment, online order, card statement)
//! - Two-level category taxonomy and static shop-to-category rules
//! - Hybrid category resolver with a pluggable classification gateway
//! - TOML configuration with embedded defaults

pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod normalize;
pub mod parsers;
pub mod resolver;
pub mod taxonomy;

pub use config::{Config, GatewaySettings};
pub use error::{Error, Result};
pub use gateway::{ClassifyBackend, CompletionOptions, GatewayClient, GeminiBackend, MockBackend};
pub use models::{LedgerEntry, ResolvedCategory, TransactionRecord};
pub use normalize::Normalizer;
pub use parsers::{ParserRegistry, Source};
pub use resolver::CategoryResolver;
pub use taxonomy::{Category, Genre, ShopCategoryMap, ShopRule, Taxonomy, OTHER_CATEGORY_ID};
