//! Embedded same-site crawl strategy
//!
//! Level 0 of the ladder: a breadth-first, depth- and entry-bounded crawl of
//! the target site itself. Pages that respond successfully are collected;
//! their same-site links feed the queue. Links discovered inside navigation
//! or footer chrome go into an exclusion accumulator and are never queued.
//!
//! The accumulator is state owned by one invocation and passed explicitly,
//! so repeated or interleaved crawls cannot leak exclusions between runs.
//!
//! The crawl terminates on queue exhaustion or a hard wall-clock ceiling,
//! whichever comes first; on timeout the partial collection is the result.

use crate::config::{CrawlConfig, FetchConfig};
use crate::extract::{is_denylisted_asset, normalize_candidate, same_site};
use crate::fetch::identity::Identity;
use crate::fetch::robots::fetch_robots;
use crate::fetch::{synthesize_markup, FetchError, FetchResult, FetchStrategy, Target};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Level 0: bounded breadth-first crawl of the target site
pub struct LibraryCrawl {
    crawl: CrawlConfig,
    fetch: FetchConfig,
}

impl LibraryCrawl {
    pub fn new(crawl: CrawlConfig, fetch: FetchConfig) -> Self {
        Self { crawl, fetch }
    }

    fn build_client(&self, identity: &Identity) -> FetchResult<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(&identity.user_agent)
            .timeout(Duration::from_secs(self.fetch.request_timeout_secs))
            .connect_timeout(Duration::from_secs(self.fetch.connect_timeout_secs))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(FetchError::ClientBuild)
    }

    /// Fetches one page of the crawl, returning its body on an HTML 2xx
    async fn fetch_page(&self, client: &reqwest::Client, url: &Url) -> FetchResult<String> {
        let response = client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| FetchError::Http {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| FetchError::Http {
            url: url.to_string(),
            source: e,
        })
    }
}

#[async_trait]
impl FetchStrategy for LibraryCrawl {
    fn name(&self) -> &'static str {
        "library-crawl"
    }

    async fn fetch(&self, target: &Target, identity: &Identity) -> FetchResult<String> {
        let deadline = Instant::now() + Duration::from_secs(self.crawl.timeout_secs);
        let client = self.build_client(identity)?;
        let robots = fetch_robots(&client, target.base()).await;
        let base_host = target.host().to_string();

        let mut queue: VecDeque<(Url, u32)> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut collected: Vec<String> = Vec::new();
        // Nav/footer exclusion accumulator, scoped to this invocation
        let mut excluded: HashSet<String> = HashSet::new();

        visited.insert(target.url().to_string());
        queue.push_back((target.url().clone(), 0));

        // Pre-seed well-known paths (services index, contact, legal notices)
        for seed in &self.crawl.seed_paths {
            if let Ok(seed_url) = target.base().join(seed) {
                if visited.insert(seed_url.to_string()) {
                    queue.push_back((seed_url, 1));
                }
            }
        }

        let mut first_request = true;
        let mut timed_out = false;

        while let Some((url, depth)) = queue.pop_front() {
            if Instant::now() >= deadline {
                timed_out = true;
                break;
            }
            if collected.len() >= self.crawl.max_entries {
                tracing::debug!("Entry cap {} reached", self.crawl.max_entries);
                break;
            }
            if !robots.is_allowed(url.as_str(), &identity.user_agent) {
                tracing::debug!("Robots disallows {}", url);
                continue;
            }

            if !first_request {
                tokio::time::sleep(Duration::from_millis(self.crawl.interval_ms)).await;
            }
            first_request = false;

            let markup = match self.fetch_page(&client, &url).await {
                Ok(m) => m,
                Err(e) => {
                    tracing::debug!("Crawl skipped {}: {}", url, e);
                    continue;
                }
            };

            collected.push(url.to_string());
            tracing::debug!("Added to crawl [{}]: {}", collected.len(), url);

            if depth >= self.crawl.max_depth {
                continue;
            }

            for link in discover_page_links(&markup, &url, &base_host, &mut excluded) {
                if excluded.contains(&link) {
                    continue;
                }
                if visited.insert(link.clone()) {
                    if let Ok(link_url) = Url::parse(&link) {
                        queue.push_back((link_url, depth + 1));
                    }
                }
            }
        }

        if collected.is_empty() {
            return Err(FetchError::Crawl(format!(
                "no pages reachable on {}",
                target.host()
            )));
        }

        if timed_out {
            tracing::warn!(
                "Crawl hit wall-clock ceiling after {} pages, using partial result",
                collected.len()
            );
        }
        tracing::info!(
            "Crawl collected {} pages ({} chrome links excluded)",
            collected.len(),
            excluded.len()
        );

        Ok(synthesize_markup(&collected))
    }
}

/// Extracts queueable same-site links from one crawled page
///
/// Anchors sitting inside navigation or footer chrome are recorded in the
/// exclusion accumulator instead of being returned.
fn discover_page_links(
    markup: &str,
    page_url: &Url,
    base_host: &str,
    excluded: &mut HashSet<String>,
) -> Vec<String> {
    let document = Html::parse_document(markup);

    let anchor_selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut links = Vec::new();
    let mut seen = HashSet::new();

    for element in document.select(&anchor_selector) {
        let href = match element.value().attr("href") {
            Some(h) => h,
            None => continue,
        };

        let url = match normalize_candidate(href, None, page_url) {
            Some(u) => u,
            None => continue,
        };

        let host = match url.host_str() {
            Some(h) => h,
            None => continue,
        };
        if !same_site(host, base_host) || is_denylisted_asset(&url) {
            continue;
        }

        let url = url.to_string();
        if in_chrome_region(&element) {
            excluded.insert(url);
            continue;
        }

        if seen.insert(url.clone()) {
            links.push(url);
        }
    }

    links
}

/// Checks whether an element sits inside a navigation or footer region
fn in_chrome_region(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| {
            let name = ancestor.value().name();
            if name.eq_ignore_ascii_case("nav") || name.eq_ignore_ascii_case("footer") {
                return true;
            }
            matches!(
                ancestor.value().attr("role"),
                Some("navigation") | Some("contentinfo")
            )
        })
}
