//! Scripted headless-browser fetch strategy
//!
//! Level 2 of the ladder: drive a headless Chromium instance through CDP,
//! wait for the navigation to settle so client-side rendering completes, and
//! capture the fully realized DOM. One browser process per attempt, torn
//! down unconditionally on success and failure paths.

use crate::config::FetchConfig;
use crate::fetch::identity::{human_delay, Identity};
use crate::fetch::{FetchError, FetchResult, FetchStrategy, Target};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Locates a Chrome/Chromium executable
///
/// The `CHROMIUM_PATH` environment variable overrides all other methods,
/// followed by well-known installation paths per platform, then a `which`
/// probe on Unix systems.
pub(crate) fn find_browser_executable() -> FetchResult<PathBuf> {
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(
            "CHROMIUM_PATH points to a non-existent file: {}",
            path.display()
        );
    }

    for candidate in chrome_candidate_paths() {
        let path = if let Some(rest) = candidate.strip_prefix("~/") {
            match dirs::home_dir() {
                Some(home) => home.join(rest),
                None => continue,
            }
        } else {
            PathBuf::from(candidate)
        };

        if path.exists() {
            tracing::debug!("Found browser at {}", path.display());
            return Ok(path);
        }
    }

    if !cfg!(target_os = "windows") {
        for name in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
            if let Ok(output) = Command::new("which").arg(name).output() {
                if output.status.success() {
                    let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                    if !found.is_empty() {
                        return Ok(PathBuf::from(found));
                    }
                }
            }
        }
    }

    Err(FetchError::Browser(
        "no Chrome/Chromium executable found (set CHROMIUM_PATH)".to_string(),
    ))
}

/// Well-known Chrome/Chromium installation paths per platform
fn chrome_candidate_paths() -> Vec<&'static str> {
    if cfg!(target_os = "windows") {
        vec![
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        vec![
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        vec![
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    }
}

/// A launched browser process plus its CDP event pump
///
/// Must be closed via [`BrowserSession::close`]; the session owns one
/// Chromium process whose lifetime is exactly one fetch attempt.
pub(crate) struct BrowserSession {
    pub browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Launches a headless browser presenting the given identity
    pub(crate) async fn launch(
        identity: &Identity,
        request_timeout_secs: u64,
    ) -> FetchResult<Self> {
        let executable = find_browser_executable()?;
        let (width, height) = identity.viewport;

        let config = BrowserConfig::builder()
            .chrome_executable(executable)
            .request_timeout(Duration::from_secs(request_timeout_secs))
            .window_size(width, height)
            .arg(format!("--user-agent={}", identity.user_agent))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-notifications")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-background-networking")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--hide-scrollbars")
            .arg("--mute-audio")
            .build()
            .map_err(FetchError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    // CDP serialization hiccups are routine; keep them quiet
                    tracing::trace!("Browser handler event error: {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Shuts the browser process down and stops the event pump
    ///
    /// Called on success and failure paths alike; errors during teardown are
    /// logged, not surfaced.
    pub(crate) async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::debug!("Browser close failed: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Browser wait failed: {}", e);
        }
        self.handler_task.abort();
    }
}

/// Navigates a page to a URL with hard timeouts on load and settle
pub(crate) async fn navigate(
    page: &Page,
    url: &str,
    load_timeout_secs: u64,
    settle_delay_ms: u64,
) -> FetchResult<()> {
    let load_timeout = Duration::from_secs(load_timeout_secs);

    tokio::time::timeout(load_timeout, page.goto(url))
        .await
        .map_err(|_| FetchError::Timeout {
            url: url.to_string(),
        })??;

    tokio::time::timeout(load_timeout, page.wait_for_navigation())
        .await
        .map_err(|_| FetchError::Timeout {
            url: url.to_string(),
        })??;

    // Give client-side rendering time to populate the DOM
    tokio::time::sleep(Duration::from_millis(settle_delay_ms)).await;

    Ok(())
}

/// Level 2: headless browser navigation and DOM capture
pub struct ScriptedBrowser {
    config: FetchConfig,
}

impl ScriptedBrowser {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    async fn drive(&self, session: &BrowserSession, target: &Target) -> FetchResult<String> {
        let page = session.browser.new_page("about:blank").await?;

        navigate(
            &page,
            target.url().as_str(),
            self.config.request_timeout_secs,
            self.config.settle_delay_ms,
        )
        .await?;

        let content = page.content().await?;
        Ok(content)
    }
}

#[async_trait]
impl FetchStrategy for ScriptedBrowser {
    fn name(&self) -> &'static str {
        "scripted-browser"
    }

    async fn fetch(&self, target: &Target, identity: &Identity) -> FetchResult<String> {
        human_delay().await;

        let session = BrowserSession::launch(identity, self.config.request_timeout_secs).await?;

        // Teardown is unconditional: close runs on both paths
        let result = self.drive(&session, target).await;
        session.close().await;

        match &result {
            Ok(content) => tracing::info!(
                "Captured {} bytes of rendered DOM from {}",
                content.len(),
                target
            ),
            Err(e) => tracing::warn!("Scripted browser fetch failed: {}", e),
        }

        result
    }
}
