//! Rotating request identity and human-pacing delays
//!
//! Strategies above the baseline crawl level share a per-run identity (user
//! agent, accept-language, viewport) drawn from small fixed pools. The
//! controller rerolls the identity when entering the stealth level so later
//! attempts do not correlate with earlier failed fingerprints.

use rand::seq::IndexedRandom;
use rand::Rng;
use std::time::Duration;

/// Browser user agents the identity pool rotates through
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:109.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Accept-Language values paired with the user agents
const ACCEPT_LANGUAGES: &[&str] = &[
    "de-DE,de;q=0.9,en;q=0.8",
    "en-US,en;q=0.9",
    "fr-FR,fr;q=0.9,en;q=0.8",
    "es-ES,es;q=0.9,en;q=0.8",
];

/// Viewport pool for browser-level strategies
const VIEWPORTS: &[(u32, u32)] = &[(1366, 768), (1280, 800), (1440, 900), (1920, 1080)];

/// The identity a strategy presents to the target site
#[derive(Debug, Clone)]
pub struct Identity {
    /// User-Agent header value
    pub user_agent: String,

    /// Accept-Language header value
    pub accept_language: String,

    /// Browser window size (width, height)
    pub viewport: (u32, u32),
}

impl Identity {
    /// Draws a fresh identity from the pools
    pub fn random() -> Self {
        let mut rng = rand::rng();

        Self {
            user_agent: USER_AGENTS
                .choose(&mut rng)
                .copied()
                .unwrap_or(USER_AGENTS[0])
                .to_string(),
            accept_language: ACCEPT_LANGUAGES
                .choose(&mut rng)
                .copied()
                .unwrap_or(ACCEPT_LANGUAGES[0])
                .to_string(),
            viewport: VIEWPORTS.choose(&mut rng).copied().unwrap_or(VIEWPORTS[0]),
        }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::random()
    }
}

/// Sleeps a randomized human-like pause before a request (0.5s to 1.5s)
pub(crate) async fn human_delay() {
    let millis = rand::rng().random_range(500..=1500);
    tracing::debug!("Human-pacing delay: {}ms", millis);
    tokio::time::sleep(Duration::from_millis(millis)).await;
}

/// Sleeps a randomized pause within the given bounds (inclusive)
pub(crate) async fn pause_between(min_ms: u64, max_ms: u64) {
    let millis = if min_ms >= max_ms {
        min_ms
    } else {
        rand::rng().random_range(min_ms..=max_ms)
    };
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
