//! Outcome classification and quarantine handling

use crate::sitemap::{SitemapError, SitemapResult};
use std::path::{Path, PathBuf};

/// Filename prefix applied to quarantined sitemap documents
const QUARANTINE_PREFIX: &str = "error-";

/// Verdict for a single escalation level's persisted link count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelVerdict {
    /// Enough links; the run can stop here
    Sufficient,

    /// Too few links; escalate if levels remain
    Insufficient,

    /// Exactly one link; never accepted as success, regardless of threshold
    Degenerate,
}

/// Terminal outcome of one escalation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The threshold was met; the count is the number of persisted links
    Success(usize),

    /// Every level was exhausted without meeting the threshold
    InsufficientAcrossAllLevels(usize),

    /// The final persisted document held exactly one link
    Degenerate,
}

impl RunOutcome {
    /// Whether this outcome should trigger the conversion collaborator
    pub fn warrants_conversion(&self) -> bool {
        matches!(self, RunOutcome::Success(_))
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Success(count) => write!(f, "success ({} links)", count),
            RunOutcome::InsufficientAcrossAllLevels(count) => {
                write!(f, "insufficient after all levels ({} links)", count)
            }
            RunOutcome::Degenerate => write!(f, "degenerate (single link)"),
        }
    }
}

/// Classifies a persisted link count against the success threshold
///
/// A count of exactly one is always `Degenerate`: a single-link sitemap is a
/// data-quality failure even when a low threshold would nominally accept it.
///
/// # Examples
///
/// ```
/// use dementor::sitemap::{classify, LevelVerdict};
///
/// assert_eq!(classify(0, 3), LevelVerdict::Insufficient);
/// assert_eq!(classify(1, 3), LevelVerdict::Degenerate);
/// assert_eq!(classify(2, 3), LevelVerdict::Insufficient);
/// assert_eq!(classify(5, 3), LevelVerdict::Sufficient);
/// ```
pub fn classify(count: usize, min_required: usize) -> LevelVerdict {
    if count == 1 {
        LevelVerdict::Degenerate
    } else if count >= min_required {
        LevelVerdict::Sufficient
    } else {
        LevelVerdict::Insufficient
    }
}

/// Relocates a degenerate sitemap into the quarantine directory
///
/// The file keeps its name with an `error-` prefix; when a file of that name
/// already sits in quarantine, a timestamp disambiguates. Returns the final
/// quarantine path.
///
/// # Arguments
///
/// * `path` - The sitemap file to relocate
/// * `quarantine_dir` - Directory collecting unusable outputs
pub fn quarantine(path: &Path, quarantine_dir: &Path) -> SitemapResult<PathBuf> {
    let wrap = |source: std::io::Error| SitemapError::Quarantine {
        path: path.display().to_string(),
        source,
    };

    std::fs::create_dir_all(quarantine_dir).map_err(wrap)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("sitemap.xml");

    let mut destination = quarantine_dir.join(format!("{}{}", QUARANTINE_PREFIX, file_name));

    if destination.exists() {
        let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
        destination = quarantine_dir.join(format!("{}{}-{}", QUARANTINE_PREFIX, stamp, file_name));
    }

    std::fs::rename(path, &destination).map_err(wrap)?;

    tracing::warn!(
        "Quarantined degenerate sitemap: {}",
        destination.display()
    );

    Ok(destination)
}
