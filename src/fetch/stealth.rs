//! Stealth browser fetch strategy
//!
//! Level 3 of the ladder: the scripted browser plus page-level
//! anti-fingerprinting overrides injected before navigation, a randomized
//! viewport from the identity pool, and simulated human interaction (staged
//! scroll passes with randomized pauses) before the DOM is captured.

use crate::config::FetchConfig;
use crate::fetch::browser::{navigate, BrowserSession};
use crate::fetch::identity::{human_delay, pause_between, Identity};
use crate::fetch::{FetchResult, FetchStrategy, Target};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;

/// Number of staged scroll passes through the page
const SCROLL_PASSES: u32 = 3;

/// Page-level overrides applied before any site script runs
///
/// Clears the webdriver automation marker, presents a plausible plugin and
/// language list, and intercepts the permissions-query hook that headless
/// detection scripts probe.
const EVASION_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', {
    get: () => undefined
});

Object.defineProperty(navigator, 'languages', {
    get: () => ['de-DE', 'de', 'en']
});

Object.defineProperty(navigator, 'plugins', {
    get: () => [
        { name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer' },
        { name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai' },
        { name: 'Native Client', filename: 'internal-nacl-plugin' }
    ]
});

if (!window.chrome) {
    window.chrome = { runtime: {} };
}

const originalQuery = window.navigator.permissions.query;
window.navigator.permissions.query = (parameters) => (
    parameters.name === 'notifications'
        ? Promise.resolve({ state: Notification.permission })
        : originalQuery(parameters)
);
"#;

/// Level 3: anti-fingerprinting browser capture
pub struct StealthBrowser {
    config: FetchConfig,
}

impl StealthBrowser {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    async fn drive(&self, session: &BrowserSession, target: &Target) -> FetchResult<String> {
        let page = session.browser.new_page("about:blank").await?;

        // Evasions must be registered before the target document loads
        page.execute(AddScriptToEvaluateOnNewDocumentParams {
            source: EVASION_SCRIPT.to_string(),
            include_command_line_api: None,
            world_name: None,
            run_immediately: None,
        })
        .await?;

        navigate(
            &page,
            target.url().as_str(),
            self.config.request_timeout_secs,
            self.config.settle_delay_ms,
        )
        .await?;

        scroll_through(&page).await?;

        // Final settle after interaction, then capture
        tokio::time::sleep(std::time::Duration::from_millis(
            self.config.settle_delay_ms,
        ))
        .await;

        let content = page.content().await?;
        Ok(content)
    }
}

/// Simulates a human reading pass: staged scrolls with randomized pauses
async fn scroll_through(page: &Page) -> FetchResult<()> {
    for pass in 0..SCROLL_PASSES {
        page.evaluate("window.scrollBy(0, window.innerHeight)").await?;
        tracing::trace!("Scroll pass {}", pass + 1);
        pause_between(300, 900).await;
    }
    page.evaluate("window.scrollTo(0, 0)").await?;
    Ok(())
}

#[async_trait]
impl FetchStrategy for StealthBrowser {
    fn name(&self) -> &'static str {
        "stealth-browser"
    }

    async fn fetch(&self, target: &Target, identity: &Identity) -> FetchResult<String> {
        human_delay().await;

        tracing::debug!(
            "Stealth attempt with viewport {}x{}",
            identity.viewport.0,
            identity.viewport.1
        );

        let session = BrowserSession::launch(identity, self.config.request_timeout_secs).await?;

        let result = self.drive(&session, target).await;
        session.close().await;

        match &result {
            Ok(content) => {
                tracing::info!("Stealth capture: {} bytes from {}", content.len(), target)
            }
            Err(e) => tracing::warn!("Stealth browser fetch failed: {}", e),
        }

        result
    }
}
