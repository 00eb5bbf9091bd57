//! Configuration module for Dementor
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every field has a compiled-in default, so running without a config
//! file is fully supported.
//!
//! # Example
//!
//! ```no_run
//! use dementor::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("dementor.toml")).unwrap();
//! println!("Success threshold: {}", config.fetch.min_urls_required);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, ConvertConfig, CrawlConfig, FetchConfig, OutputConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
