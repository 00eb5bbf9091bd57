//! Multi-tenant batch mode
//!
//! Iterates tenant rows from the external store strictly sequentially,
//! running one escalation controller per row with a per-tenant sitemap
//! filename. A failing row logs and never aborts the batch; every
//! iteration's resources are torn down before the next begins.

mod store;

pub use store::{BatchStore, TenantRow, STORE_KEY_VAR, STORE_URL_VAR};

use crate::config::Config;
use crate::convert::PythonConverter;
use crate::escalate::Controller;
use crate::fetch::{
    DirectFetch, FetchStrategy, ScriptedBrowser, SelectorTargeted, StealthBrowser, Target,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Maximum length of a slugified tenant filename stem
const SLUG_MAX_LEN: usize = 64;

/// Errors talking to the batch store
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("Store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store responded with HTTP {0}")]
    Status(u16),

    #[error("Store returned malformed rows: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Counts for a finished batch
#[derive(Debug, Default, Clone, Copy)]
pub struct BatchSummary {
    pub rows: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Derives a filesystem-safe slug from a tenant display name
///
/// Lowercases, collapses every non-alphanumeric run into a single hyphen,
/// trims leading/trailing hyphens, and caps the length.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());

    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }

    let slug = slug.trim_end_matches('-');
    let mut slug = slug.chars().take(SLUG_MAX_LEN).collect::<String>();
    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        "tenant".to_string()
    } else {
        slug
    }
}

/// Per-tenant sitemap path next to the configured single-run output
fn tenant_sitemap_path(config: &Config, name: &str) -> PathBuf {
    let parent = Path::new(&config.output.sitemap_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    parent.join(format!("{}-sitemap.xml", slugify(name)))
}

/// Builds the strategy ladder for one row
///
/// A usable selector hint restricts the row to the selector-targeted fetch;
/// rows without a hint walk the standard ladder minus the library-crawl
/// baseline.
fn row_ladder(row: &TenantRow, config: &Config) -> Vec<Box<dyn FetchStrategy>> {
    let hint = row
        .selector
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    match hint {
        Some(hint) => vec![Box::new(SelectorTargeted::new(hint, config.fetch.clone()))],
        None => vec![
            Box::new(DirectFetch::new(config.fetch.clone())),
            Box::new(ScriptedBrowser::new(config.fetch.clone())),
            Box::new(StealthBrowser::new(config.fetch.clone())),
        ],
    }
}

/// Runs one tenant row through its own controller
async fn run_row(config: &Config, row: &TenantRow, convert: bool) -> crate::Result<()> {
    let target = Target::from_user_input(&row.url)?;
    let sitemap_path = tenant_sitemap_path(config, &row.name);

    tracing::info!(
        "Tenant '{}' -> {} ({})",
        row.name,
        target,
        sitemap_path.display()
    );

    let mut controller =
        Controller::new(config, row_ladder(row, config)).with_sitemap_path(sitemap_path);

    if convert {
        controller =
            controller.with_converter(Box::new(PythonConverter::new(config.convert.clone())));
    }

    let report = controller.run(&target).await?;
    tracing::info!("Tenant '{}': {}", row.name, report.outcome);

    Ok(())
}

/// Runs the full batch, one row at a time
///
/// Errors inside one iteration are logged and never abort the batch.
pub async fn run_batch(
    config: &Config,
    store: &BatchStore,
    convert: bool,
) -> crate::Result<BatchSummary> {
    let rows = store.fetch_rows().await?;

    let mut summary = BatchSummary {
        rows: rows.len(),
        ..BatchSummary::default()
    };

    for row in &rows {
        match run_row(config, row, convert).await {
            Ok(()) => summary.succeeded += 1,
            Err(e) => {
                summary.failed += 1;
                tracing::error!("Tenant '{}' failed, continuing batch: {}", row.name, e);
            }
        }
    }

    tracing::info!(
        "Batch finished: {} rows, {} succeeded, {} failed",
        summary.rows,
        summary.succeeded,
        summary.failed
    );

    Ok(summary)
}
