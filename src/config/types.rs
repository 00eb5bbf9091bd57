use serde::Deserialize;

/// Main configuration structure for Dementor
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub crawl: CrawlConfig,
    pub output: OutputConfig,
    pub convert: ConvertConfig,
}

/// Fetch-strategy and escalation tuning
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Links required before a level counts as a success
    #[serde(rename = "min-urls-required")]
    pub min_urls_required: usize,

    /// Total request timeout in seconds
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Connection establishment timeout in seconds
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Retry attempts for the direct single-request level
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Settle delay after browser navigation, for client-side rendering
    #[serde(rename = "settle-delay-ms")]
    pub settle_delay_ms: u64,

    /// Lower bound of the randomized pause between escalation levels
    #[serde(rename = "level-pacing-min-ms")]
    pub level_pacing_min_ms: u64,

    /// Upper bound of the randomized pause between escalation levels
    #[serde(rename = "level-pacing-max-ms")]
    pub level_pacing_max_ms: u64,
}

/// Tuning for the embedded library-crawl level
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Maximum BFS depth from the target page
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Hard cap on collected entries
    #[serde(rename = "max-entries")]
    pub max_entries: usize,

    /// Politeness pause between successive page requests (milliseconds)
    #[serde(rename = "interval-ms")]
    pub interval_ms: u64,

    /// Wall-clock ceiling for the whole crawl (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Well-known paths pre-seeded into the crawl queue
    #[serde(rename = "seed-paths")]
    pub seed_paths: Vec<String>,
}

/// Output path configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the generated sitemap document
    #[serde(rename = "sitemap-path")]
    pub sitemap_path: String,

    /// Directory collecting quarantined (degenerate) sitemaps
    #[serde(rename = "quarantine-dir")]
    pub quarantine_dir: String,

    /// Transient markup cache, purged between escalation levels
    #[serde(rename = "temp-cache-path")]
    pub temp_cache_path: String,
}

/// External document-converter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Converter script invoked with the sitemap path
    #[serde(rename = "script-path")]
    pub script_path: String,

    /// Directory the converter writes documents into
    #[serde(rename = "output-dir")]
    pub output_dir: String,

    /// Python interpreter used for bootstrap and invocation
    pub python: String,

    /// Packages ensured before the converter runs
    pub packages: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            min_urls_required: 3,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retries: 3,
            settle_delay_ms: 1000,
            level_pacing_min_ms: 1000,
            level_pacing_max_ms: 2500,
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_entries: 200,
            interval_ms: 500,
            timeout_secs: 120,
            seed_paths: vec![
                "/leistungen/".to_string(),
                "/kontakt/".to_string(),
                "/impressum/".to_string(),
                "/datenschutz/".to_string(),
            ],
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sitemap_path: "./dementor-sitemap.xml".to_string(),
            quarantine_dir: "./error-sitemaps".to_string(),
            temp_cache_path: "./temp-page.html".to_string(),
        }
    }
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            script_path: "./markdown_converter.py".to_string(),
            output_dir: "./markdown-output".to_string(),
            python: "python3".to_string(),
            packages: vec![
                "beautifulsoup4".to_string(),
                "markdownify".to_string(),
                "requests".to_string(),
            ],
        }
    }
}
