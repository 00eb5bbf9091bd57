//! Region-targeted fetch variant
//!
//! Site-specific strategy for the regionalized services portal: load the
//! fixed services URL in a scripted browser, select the region via its
//! session key and cookie, reload, and collect only the anchors nested in
//! ordered-list elements whose path belongs to the selected region. When the
//! cookie-based selection yields nothing, fall back to simulating the
//! postal-code form and run the same scoped extraction again.

use crate::config::FetchConfig;
use crate::extract::{normalize_candidate, same_site};
use crate::fetch::browser::{navigate, BrowserSession};
use crate::fetch::identity::{human_delay, Identity};
use crate::fetch::{synthesize_markup, FetchResult, FetchStrategy, Target};
use crate::regions::{path_matches, path_matches_other, Region};
use async_trait::async_trait;
use chromiumoxide::Page;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// The services listing every regional run starts from
pub const DEFAULT_SERVICES_URL: &str = "https://www.aok.de/pk/leistungen/";

/// How long to poll for the list-structured anchors to appear
const LIST_WAIT_SECS: u64 = 10;

/// Region-targeted services extraction
pub struct RegionTargeted {
    region: &'static Region,
    services_url: Url,
    config: FetchConfig,
}

impl RegionTargeted {
    /// Creates the variant for one region against the default services URL
    pub fn new(region: &'static Region, config: FetchConfig) -> Self {
        // The default URL is a compile-time constant and always parses
        let services_url = Url::parse(DEFAULT_SERVICES_URL)
            .unwrap_or_else(|_| unreachable!("default services URL is valid"));
        Self {
            region,
            services_url,
            config,
        }
    }

    /// Overrides the services URL (used against test servers)
    pub fn with_services_url(mut self, url: Url) -> Self {
        self.services_url = url;
        self
    }

    async fn drive(&self, session: &BrowserSession) -> FetchResult<Vec<String>> {
        let page = session.browser.new_page("about:blank").await?;

        navigate(
            &page,
            self.services_url.as_str(),
            self.config.request_timeout_secs,
            self.config.settle_delay_ms,
        )
        .await?;

        // Select the region, then reload so the listing regionalizes
        self.apply_region_state(&page).await?;
        navigate(
            &page,
            self.services_url.as_str(),
            self.config.request_timeout_secs,
            self.config.settle_delay_ms,
        )
        .await?;

        self.wait_for_list_anchors(&page).await;

        let markup = page.content().await?;
        let mut links = extract_region_links(&markup, &self.services_url, self.region);

        if links.is_empty() {
            tracing::info!(
                "Cookie-based region selection yielded nothing for {}, trying postal-code form",
                self.region.code
            );
            if self.submit_postal_code_form(&page).await? {
                self.wait_for_list_anchors(&page).await;
                let markup = page.content().await?;
                links = extract_region_links(&markup, &self.services_url, self.region);
            }
        }

        Ok(links)
    }

    /// Stores the region choice in session state and a cookie
    async fn apply_region_state(&self, page: &Page) -> FetchResult<()> {
        page.evaluate(format!(
            "sessionStorage.setItem('aoklv', '{}')",
            self.region.code
        ))
        .await?;

        page.evaluate(format!(
            "document.cookie = 'aok_location={}; path=/'",
            self.region.code
        ))
        .await?;

        tracing::debug!("Region state set: aoklv={}", self.region.code);
        Ok(())
    }

    /// Polls until anchors inside ordered lists appear, or the wait expires
    async fn wait_for_list_anchors(&self, page: &Page) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(LIST_WAIT_SECS);

        while tokio::time::Instant::now() < deadline {
            let count: u64 = match page
                .evaluate("document.querySelectorAll('ol a[href]').length")
                .await
            {
                Ok(result) => result.into_value().unwrap_or(0),
                Err(_) => 0,
            };

            if count > 0 {
                tracing::debug!("{} list anchors present", count);
                return;
            }

            tokio::time::sleep(Duration::from_millis(500)).await;
        }

        tracing::debug!("No list anchors appeared within {}s", LIST_WAIT_SECS);
    }

    /// Fills and submits the postal-code form; returns whether a form was found
    async fn submit_postal_code_form(&self, page: &Page) -> FetchResult<bool> {
        let script = format!(
            r#"(function() {{
                const input = document.querySelector(
                    "input[name*='plz' i], input[name*='zip' i], input[type='text']");
                if (!input) {{ return false; }}
                input.value = '{}';
                input.dispatchEvent(new Event('input', {{ bubbles: true }}));
                const form = input.closest('form');
                if (!form) {{ return false; }}
                if (form.requestSubmit) {{ form.requestSubmit(); }} else {{ form.submit(); }}
                return true;
            }})()"#,
            self.region.postal_code
        );

        let submitted: bool = page
            .evaluate(script)
            .await?
            .into_value()
            .unwrap_or(false);

        if submitted {
            tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
        }

        Ok(submitted)
    }
}

/// Extracts region-scoped links from the services listing markup
///
/// Only anchors nested inside `<ol>` elements count; of those, a link is
/// kept when its path matches the selected region and does not match any
/// other region's slug.
fn extract_region_links(markup: &str, services_url: &Url, region: &Region) -> Vec<String> {
    let document = Html::parse_document(markup);

    let anchor_selector = match Selector::parse("ol a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let base_host = match services_url.host_str() {
        Some(h) => h,
        None => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&anchor_selector) {
        let href = match element.value().attr("href") {
            Some(h) => h,
            None => continue,
        };

        let url = match normalize_candidate(href, None, services_url) {
            Some(u) => u,
            None => continue,
        };

        let host = match url.host_str() {
            Some(h) => h,
            None => continue,
        };
        if !same_site(host, base_host) {
            continue;
        }

        if !path_matches(region, url.path()) || path_matches_other(region, url.path()) {
            continue;
        }

        let url = url.to_string();
        if seen.insert(url.clone()) {
            links.push(url);
        }
    }

    links
}

#[async_trait]
impl FetchStrategy for RegionTargeted {
    fn name(&self) -> &'static str {
        "region-targeted"
    }

    async fn fetch(&self, _target: &Target, identity: &Identity) -> FetchResult<String> {
        human_delay().await;

        let session = BrowserSession::launch(identity, self.config.request_timeout_secs).await?;

        let result = self.drive(&session).await;
        session.close().await;

        let links = result?;
        tracing::info!(
            "Region {}: {} links after slug filtering",
            self.region.code,
            links.len()
        );

        Ok(synthesize_markup(&links))
    }
}
