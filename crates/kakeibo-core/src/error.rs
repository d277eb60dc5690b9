//! Error types for kakeibo

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown mail source: {0}")]
    UnknownSource(String),
}

pub type Result<T> = std::result::Result<T, Error>;
