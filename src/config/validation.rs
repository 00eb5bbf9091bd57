use crate::config::types::Config;
use crate::ConfigError;

/// Validates a parsed configuration
///
/// Rejects values that would make a run meaningless (zero timeouts, empty
/// output paths) or internally inconsistent (inverted pacing bounds).
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.fetch.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "fetch.request-timeout-secs must be greater than zero".to_string(),
        ));
    }

    if config.fetch.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "fetch.connect-timeout-secs must be greater than zero".to_string(),
        ));
    }

    if config.fetch.level_pacing_min_ms > config.fetch.level_pacing_max_ms {
        return Err(ConfigError::Validation(format!(
            "fetch.level-pacing-min-ms ({}) exceeds level-pacing-max-ms ({})",
            config.fetch.level_pacing_min_ms, config.fetch.level_pacing_max_ms
        )));
    }

    if config.crawl.max_depth == 0 {
        return Err(ConfigError::Validation(
            "crawl.max-depth must be at least 1".to_string(),
        ));
    }

    if config.crawl.max_entries == 0 {
        return Err(ConfigError::Validation(
            "crawl.max-entries must be at least 1".to_string(),
        ));
    }

    if config.crawl.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "crawl.timeout-secs must be greater than zero".to_string(),
        ));
    }

    for seed in &config.crawl.seed_paths {
        if !seed.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "crawl.seed-paths entry must be root-relative: {}",
                seed
            )));
        }
    }

    if config.output.sitemap_path.is_empty() {
        return Err(ConfigError::Validation(
            "output.sitemap-path must not be empty".to_string(),
        ));
    }

    if config.output.quarantine_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output.quarantine-dir must not be empty".to_string(),
        ));
    }

    if config.output.temp_cache_path.is_empty() {
        return Err(ConfigError::Validation(
            "output.temp-cache-path must not be empty".to_string(),
        ));
    }

    Ok(())
}
