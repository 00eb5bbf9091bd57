//! Robots.txt handling for the embedded crawl level
//!
//! The extractor itself judges pages only by their markup, but the embedded
//! crawler issues real follow-up requests and stays polite: robots.txt is
//! fetched once per origin and consulted before queueing.

use robotstxt::DefaultMatcher;
use url::Url;

/// Parsed robots.txt data
///
/// Thin wrapper over the robotstxt crate providing a simplified allow check.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,
}

impl ParsedRobots {
    /// Creates a ParsedRobots from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Creates a permissive ParsedRobots that allows everything
    ///
    /// Used as the default when robots.txt cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
        }
    }

    /// Checks if a URL is allowed for the given user agent
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }
}

/// Fetches and parses robots.txt for an origin
///
/// Any failure (missing file, network error) degrades to allow-all: robots
/// handling must never abort a crawl.
pub(crate) async fn fetch_robots(client: &reqwest::Client, base: &Url) -> ParsedRobots {
    let robots_url = match base.join("/robots.txt") {
        Ok(u) => u,
        Err(_) => return ParsedRobots::allow_all(),
    };

    match client.get(robots_url.as_str()).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
            Ok(content) => {
                tracing::debug!("Fetched robots.txt for {}", base);
                ParsedRobots::from_content(&content)
            }
            Err(_) => ParsedRobots::allow_all(),
        },
        _ => {
            tracing::debug!("No robots.txt for {}, allowing all", base);
            ParsedRobots::allow_all()
        }
    }
}
