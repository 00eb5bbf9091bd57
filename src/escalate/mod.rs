//! Escalation controller
//!
//! Drives the ordered strategy ladder against one target: fetch, extract,
//! persist, read the persisted count back, then either stop with a terminal
//! outcome or purge per-level resources and advance. Levels strictly
//! increase; there are no backward transitions and no controller-level
//! retries beyond what a strategy does internally.

use crate::config::Config;
use crate::convert::Converter;
use crate::extract::extract;
use crate::fetch::{pause_between, FetchStrategy, Identity, Target};
use crate::sitemap::{self, classify, LevelVerdict, RunOutcome};
use std::path::PathBuf;

/// Ladder index from which the identity is rerolled before fetching
///
/// Earlier failed attempts may have burned the current fingerprint; the
/// stealth level starts from a fresh one.
const IDENTITY_REROLL_LEVEL: usize = 3;

/// Summary of one escalation run
#[derive(Debug)]
pub struct RunReport {
    /// Terminal outcome of the run
    pub outcome: RunOutcome,

    /// Number of levels attempted before stopping
    pub levels_attempted: usize,

    /// Final location of the sitemap (the quarantine path on Degenerate)
    pub sitemap_path: PathBuf,

    /// `Some(success)` when a converter was wired and the run succeeded
    pub conversion: Option<bool>,
}

/// The escalation controller
///
/// Owns the current target's sitemap document and identity for the duration
/// of one run. Two controllers must never share output paths concurrently;
/// batch mode creates a fresh controller per iteration.
pub struct Controller {
    strategies: Vec<Box<dyn FetchStrategy>>,
    converter: Option<Box<dyn Converter>>,
    identity: Identity,
    min_urls_required: usize,
    pacing_min_ms: u64,
    pacing_max_ms: u64,
    sitemap_path: PathBuf,
    quarantine_dir: PathBuf,
    temp_cache_path: PathBuf,
}

impl Controller {
    /// Creates a controller over the given strategy ladder
    ///
    /// Output paths and thresholds come from the configuration; strategies
    /// are walked in the order given.
    pub fn new(config: &Config, strategies: Vec<Box<dyn FetchStrategy>>) -> Self {
        Self {
            strategies,
            converter: None,
            identity: Identity::random(),
            min_urls_required: config.fetch.min_urls_required,
            pacing_min_ms: config.fetch.level_pacing_min_ms,
            pacing_max_ms: config.fetch.level_pacing_max_ms,
            sitemap_path: PathBuf::from(&config.output.sitemap_path),
            quarantine_dir: PathBuf::from(&config.output.quarantine_dir),
            temp_cache_path: PathBuf::from(&config.output.temp_cache_path),
        }
    }

    /// Overrides the sitemap output path (batch and region modes)
    pub fn with_sitemap_path(mut self, path: PathBuf) -> Self {
        self.sitemap_path = path;
        self
    }

    /// Wires a conversion collaborator invoked on success
    pub fn with_converter(mut self, converter: Box<dyn Converter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Runs the escalation ladder against the target
    ///
    /// Every level writes the sitemap; the `<loc>` count read back from disk
    /// is the single source of truth for the advance/stop decision. A failed
    /// fetch counts as zero links and escalates like any other insufficient
    /// level. Sitemap write failures abort the run.
    pub async fn run(&mut self, target: &Target) -> crate::Result<RunReport> {
        let total = self.strategies.len();
        let mut last_count = 0usize;

        for level in 0..total {
            if level >= IDENTITY_REROLL_LEVEL {
                self.identity = Identity::random();
                tracing::debug!("Rerolled identity entering level {}", level);
            }

            let strategy = &self.strategies[level];
            tracing::info!(
                "Level {}/{} ({}) against {}",
                level,
                total - 1,
                strategy.name(),
                target
            );

            let links = match strategy.fetch(target, &self.identity).await {
                Ok(markup) => {
                    self.cache_markup(&markup);
                    extract(&markup, target.url())
                }
                Err(e) => {
                    tracing::warn!("Level {} ({}) failed: {}", level, strategy.name(), e);
                    Vec::new()
                }
            };

            sitemap::write(&links, &self.sitemap_path)?;
            let count = sitemap::count(&self.sitemap_path)?;
            last_count = count;

            tracing::info!("Level {} persisted {} links", level, count);

            match classify(count, self.min_urls_required) {
                LevelVerdict::Sufficient => {
                    self.purge_temp_cache();
                    let conversion = self.maybe_convert().await;
                    return Ok(RunReport {
                        outcome: RunOutcome::Success(count),
                        levels_attempted: level + 1,
                        sitemap_path: self.sitemap_path.clone(),
                        conversion,
                    });
                }
                LevelVerdict::Insufficient | LevelVerdict::Degenerate => {
                    if level + 1 < total {
                        self.purge_temp_cache();
                        pause_between(self.pacing_min_ms, self.pacing_max_ms).await;
                    }
                }
            }
        }

        self.purge_temp_cache();

        if last_count == 1 {
            let moved = sitemap::quarantine(&self.sitemap_path, &self.quarantine_dir)?;
            Ok(RunReport {
                outcome: RunOutcome::Degenerate,
                levels_attempted: total,
                sitemap_path: moved,
                conversion: None,
            })
        } else {
            tracing::warn!(
                "All {} levels exhausted with {} links; the target likely has \
                 strong anti-automation defenses",
                total,
                last_count
            );
            Ok(RunReport {
                outcome: RunOutcome::InsufficientAcrossAllLevels(last_count),
                levels_attempted: total,
                sitemap_path: self.sitemap_path.clone(),
                conversion: None,
            })
        }
    }

    /// Invokes the converter on success, if one is wired
    ///
    /// Converter failures are recorded, never retried, and never demote the
    /// run outcome; the sitemap remains valid regardless.
    async fn maybe_convert(&self) -> Option<bool> {
        let converter = self.converter.as_ref()?;

        match converter.convert(&self.sitemap_path).await {
            Ok(()) => Some(true),
            Err(e) => {
                tracing::error!("Conversion failed: {}", e);
                Some(false)
            }
        }
    }

    /// Persists the level's raw markup to the transient cache
    fn cache_markup(&self, markup: &str) {
        if let Err(e) = std::fs::write(&self.temp_cache_path, markup) {
            tracing::warn!(
                "Could not cache markup to {}: {}",
                self.temp_cache_path.display(),
                e
            );
        }
    }

    /// Deletes the transient markup cache between levels and at run end
    fn purge_temp_cache(&self) {
        match std::fs::remove_file(&self.temp_cache_path) {
            Ok(()) => tracing::debug!("Purged {}", self.temp_cache_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                "Could not purge {}: {}",
                self.temp_cache_path.display(),
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{ConvertError, Converter};
    use crate::fetch::{synthesize_markup, FetchError, FetchResult};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Strategy returning a fixed number of same-site links
    struct FixedLinks {
        count: usize,
        calls: Arc<AtomicUsize>,
    }

    impl FixedLinks {
        fn boxed(count: usize, calls: &Arc<AtomicUsize>) -> Box<dyn FetchStrategy> {
            Box::new(Self {
                count,
                calls: Arc::clone(calls),
            })
        }
    }

    #[async_trait]
    impl FetchStrategy for FixedLinks {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(&self, _target: &Target, _identity: &Identity) -> FetchResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let links: Vec<String> = (0..self.count)
                .map(|i| format!("https://site.test/page-{}", i))
                .collect();
            Ok(synthesize_markup(&links))
        }
    }

    /// Strategy that always fails at the fetch boundary
    struct AlwaysFails;

    #[async_trait]
    impl FetchStrategy for AlwaysFails {
        fn name(&self) -> &'static str {
            "always-fails"
        }

        async fn fetch(&self, _target: &Target, _identity: &Identity) -> FetchResult<String> {
            Err(FetchError::Crawl("simulated failure".to_string()))
        }
    }

    /// Converter counting its invocations
    struct CountingConverter {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Converter for CountingConverter {
        async fn convert(&self, _sitemap: &Path) -> Result<(), ConvertError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn test_config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.output.sitemap_path = dir
            .path()
            .join("dementor-sitemap.xml")
            .display()
            .to_string();
        config.output.quarantine_dir = dir.path().join("error-sitemaps").display().to_string();
        config.output.temp_cache_path = dir.path().join("temp-page.html").display().to_string();
        config.fetch.level_pacing_min_ms = 0;
        config.fetch.level_pacing_max_ms = 1;
        config
    }

    fn target() -> Target {
        Target::new("https://site.test/start").unwrap()
    }

    #[tokio::test]
    async fn test_scenario_escalates_to_first_sufficient_level() {
        // Levels return 0, 2, 5 links; threshold 3 stops at the third level
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let calls = Arc::new(AtomicUsize::new(0));
        let convert_calls = Arc::new(AtomicUsize::new(0));

        let mut controller = Controller::new(
            &config,
            vec![
                FixedLinks::boxed(0, &calls),
                FixedLinks::boxed(2, &calls),
                FixedLinks::boxed(5, &calls),
            ],
        )
        .with_converter(Box::new(CountingConverter {
            calls: Arc::clone(&convert_calls),
        }));

        let report = controller.run(&target()).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Success(5));
        assert_eq!(report.levels_attempted, 3);
        assert_eq!(sitemap::count(&report.sitemap_path).unwrap(), 5);
        assert_eq!(convert_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_monotonicity_stops_exactly_at_sufficient_level() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let early_calls = Arc::new(AtomicUsize::new(0));
        let later_calls = Arc::new(AtomicUsize::new(0));

        let mut controller = Controller::new(
            &config,
            vec![
                FixedLinks::boxed(2, &early_calls),
                FixedLinks::boxed(3, &early_calls),
                FixedLinks::boxed(10, &later_calls),
            ],
        );

        let report = controller.run(&target()).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Success(3));
        assert_eq!(report.levels_attempted, 2);
        // Each earlier level ran exactly once; the level past success never ran
        assert_eq!(early_calls.load(Ordering::SeqCst), 2);
        assert_eq!(later_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_degenerate_levels_quarantine() {
        // Every level returns a single link; terminal state is Degenerate,
        // the sitemap lands in quarantine, conversion never runs
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let calls = Arc::new(AtomicUsize::new(0));
        let convert_calls = Arc::new(AtomicUsize::new(0));

        let mut controller = Controller::new(
            &config,
            vec![
                FixedLinks::boxed(1, &calls),
                FixedLinks::boxed(1, &calls),
                FixedLinks::boxed(1, &calls),
            ],
        )
        .with_converter(Box::new(CountingConverter {
            calls: Arc::clone(&convert_calls),
        }));

        let report = controller.run(&target()).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Degenerate);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(convert_calls.load(Ordering::SeqCst), 0);

        let name = report.sitemap_path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("error-"));
        assert!(report
            .sitemap_path
            .parent()
            .unwrap()
            .ends_with("error-sitemaps"));
        assert!(report.sitemap_path.exists());
        assert!(!Path::new(&config.output.sitemap_path).exists());
    }

    #[tokio::test]
    async fn test_single_link_never_succeeds_even_with_threshold_one() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config(&dir);
        config.fetch.min_urls_required = 1;
        let calls = Arc::new(AtomicUsize::new(0));

        let mut controller = Controller::new(&config, vec![FixedLinks::boxed(1, &calls)]);
        let report = controller.run(&target()).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Degenerate);
        let name = report.sitemap_path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("error-"));
    }

    #[tokio::test]
    async fn test_fetch_failure_counts_as_zero_and_escalates() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let calls = Arc::new(AtomicUsize::new(0));

        let mut controller = Controller::new(
            &config,
            vec![Box::new(AlwaysFails), FixedLinks::boxed(4, &calls)],
        );

        let report = controller.run(&target()).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Success(4));
        assert_eq!(report.levels_attempted, 2);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_insufficient() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let calls = Arc::new(AtomicUsize::new(0));

        let mut controller = Controller::new(
            &config,
            vec![FixedLinks::boxed(0, &calls), FixedLinks::boxed(2, &calls)],
        );

        let report = controller.run(&target()).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::InsufficientAcrossAllLevels(2));
        assert_eq!(report.levels_attempted, 2);
        // The final (insufficient) sitemap stays in place
        assert_eq!(sitemap::count(&report.sitemap_path).unwrap(), 2);
        assert!(report.conversion.is_none());
    }

    #[tokio::test]
    async fn test_temp_cache_purged_after_run() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let calls = Arc::new(AtomicUsize::new(0));

        let mut controller = Controller::new(&config, vec![FixedLinks::boxed(5, &calls)]);
        controller.run(&target()).await.unwrap();

        assert!(!Path::new(&config.output.temp_cache_path).exists());
    }

    #[tokio::test]
    async fn test_converter_failure_does_not_demote_success() {
        struct FailingConverter;

        #[async_trait]
        impl Converter for FailingConverter {
            async fn convert(&self, _sitemap: &Path) -> Result<(), ConvertError> {
                Err(ConvertError::Failed {
                    status: 1,
                    stderr: "boom".to_string(),
                })
            }
        }

        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let calls = Arc::new(AtomicUsize::new(0));

        let mut controller = Controller::new(&config, vec![FixedLinks::boxed(5, &calls)])
            .with_converter(Box::new(FailingConverter));

        let report = controller.run(&target()).await.unwrap();

        assert_eq!(report.outcome, RunOutcome::Success(5));
        assert_eq!(report.conversion, Some(false));
        // The sitemap output remains valid regardless
        assert_eq!(sitemap::count(&report.sitemap_path).unwrap(), 5);
    }
}
