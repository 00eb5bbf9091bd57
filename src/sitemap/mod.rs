//! Sitemap writing and run-outcome classification
//!
//! The persisted sitemap file is the single source of truth for escalation
//! decisions: the controller always reads the `<loc>` count back from disk
//! rather than trusting the in-memory link set.

mod classify;
mod writer;

pub use classify::{classify, quarantine, LevelVerdict, RunOutcome};
pub use writer::{count, write};

use thiserror::Error;

/// Errors that can occur while persisting or inspecting sitemap documents
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("Failed to write sitemap {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to read sitemap {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to quarantine sitemap {path}: {source}")]
    Quarantine {
        path: String,
        source: std::io::Error,
    },
}

/// Result type for sitemap operations
pub type SitemapResult<T> = Result<T, SitemapError>;
