//! Direct single-request fetch strategy
//!
//! Issues one HTTP GET against the target with a realistic browser header
//! set, compression enabled, bounded retries with backoff, and a hard
//! timeout.

use crate::config::FetchConfig;
use crate::fetch::identity::{human_delay, Identity};
use crate::fetch::{FetchError, FetchResult, FetchStrategy, Target};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Base delay doubled on each retry attempt
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Level 1: one GET request dressed up as an ordinary browser navigation
pub struct DirectFetch {
    config: FetchConfig,
}

impl DirectFetch {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    /// Builds an HTTP client presenting the given identity
    ///
    /// Compression (gzip/brotli) is negotiated by the client itself, so no
    /// explicit Accept-Encoding header is set here.
    fn build_client(&self, identity: &Identity) -> FetchResult<Client> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        if let Ok(value) = HeaderValue::from_str(&identity.accept_language) {
            headers.insert(ACCEPT_LANGUAGE, value);
        }
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
        headers.insert("DNT", HeaderValue::from_static("1"));
        headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
        headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
        headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
        headers.insert("Sec-Fetch-Site", HeaderValue::from_static("none"));

        Client::builder()
            .user_agent(&identity.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(self.config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(self.config.connect_timeout_secs))
            .redirect(Policy::limited(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(FetchError::ClientBuild)
    }

    /// Performs one GET attempt
    async fn attempt(&self, client: &Client, url: &str) -> FetchResult<String> {
        let response = client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Http {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })?;

        if body.is_empty() {
            return Err(FetchError::EmptyBody {
                url: url.to_string(),
            });
        }

        Ok(body)
    }

    /// Whether a failed attempt is worth retrying
    fn is_transient(error: &FetchError) -> bool {
        match error {
            FetchError::Timeout { .. } | FetchError::Http { .. } => true,
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[async_trait]
impl FetchStrategy for DirectFetch {
    fn name(&self) -> &'static str {
        "direct-request"
    }

    async fn fetch(&self, target: &Target, identity: &Identity) -> FetchResult<String> {
        human_delay().await;

        let client = self.build_client(identity)?;
        let url = target.url().as_str();

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = RETRY_BASE_DELAY_MS * (1u64 << (attempt - 1));
                tracing::debug!("Retry {} for {} after {}ms", attempt, url, backoff);
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            match self.attempt(&client, url).await {
                Ok(body) => {
                    tracing::info!("Fetched {} bytes from {}", body.len(), url);
                    return Ok(body);
                }
                Err(e) => {
                    tracing::warn!("Direct fetch attempt {} failed: {}", attempt + 1, e);
                    let transient = Self::is_transient(&e);
                    last_error = Some(e);
                    if !transient {
                        break;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::EmptyBody {
            url: url.to_string(),
        }))
    }
}
