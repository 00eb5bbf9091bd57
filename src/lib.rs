//! Dementor: an escalating same-site link extractor
//!
//! This crate extracts the set of same-site hyperlinks reachable from a target
//! web page, escalating through increasingly sophisticated fetch strategies
//! until enough links are found, and persists the result as a sitemap document.

pub mod banner;
pub mod batch;
pub mod config;
pub mod convert;
pub mod escalate;
pub mod extract;
pub mod fetch;
pub mod regions;
pub mod sitemap;

use thiserror::Error;

/// Main error type for Dementor operations
#[derive(Debug, Error)]
pub enum DementorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] fetch::FetchError),

    #[error("Sitemap error: {0}")]
    Sitemap(#[from] sitemap::SitemapError),

    #[error("Conversion error: {0}")]
    Convert(#[from] convert::ConvertError),

    #[error("Batch store error: {0}")]
    Batch(#[from] batch::BatchError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Dementor operations
pub type Result<T> = std::result::Result<T, DementorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use escalate::{Controller, RunReport};
pub use fetch::Target;
pub use sitemap::RunOutcome;
