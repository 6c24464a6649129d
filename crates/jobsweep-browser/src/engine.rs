use crate::error::{BrowserError, Result};
use crate::fingerprint::FingerprintConfig;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::{Duration, Instant};
use tracing::debug;

/// How often to re-probe the page while waiting for a selector.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Browser automation engine.
///
/// Owns exactly one browser and one page; the page is the platform session
/// surface and is never shared across platforms or tasks.
pub struct BrowserEngine {
    browser: Browser,
    page: Page,
    fingerprint: FingerprintConfig,
    default_timeout: Duration,
}

impl BrowserEngine {
    /// Launch a browser with a randomized fingerprint.
    pub async fn launch(headless: bool, default_timeout: Duration) -> Result<Self> {
        Self::launch_with_fingerprint(FingerprintConfig::randomized(), headless, default_timeout)
            .await
    }

    /// Launch a browser presenting a specific fingerprint.
    pub async fn launch_with_fingerprint(
        fingerprint: FingerprintConfig,
        headless: bool,
        default_timeout: Duration,
    ) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(fingerprint.viewport_width, fingerprint.viewport_height)
            .arg(format!("--lang={}", &fingerprint.accept_language));

        if !headless {
            builder = builder.with_head();
        }

        let config = builder
            .build()
            .map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(config).await?;

        // Drive the CDP event loop for the lifetime of the browser.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let page = browser.new_page("about:blank").await?;
        page.set_user_agent(fingerprint.user_agent.as_str()).await?;

        debug!(
            user_agent = %fingerprint.user_agent,
            viewport = format!("{}x{}", fingerprint.viewport_width, fingerprint.viewport_height),
            "browser launched"
        );

        Ok(Self {
            browser,
            page,
            fingerprint,
            default_timeout,
        })
    }

    /// The fingerprint this session presents.
    #[must_use]
    pub fn fingerprint(&self) -> &FingerprintConfig {
        &self.fingerprint
    }

    /// Navigate the session page to a URL and wait for the load to settle.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;
        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;
        Ok(())
    }

    /// Full HTML content of the session page.
    pub async fn page_content(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }

    /// Wait for a selector to appear, polling up to the given timeout
    /// (engine default when `None`).
    pub async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Option<Duration>,
    ) -> Result<Element> {
        let timeout = timeout.unwrap_or(self.default_timeout);
        let deadline = Instant::now() + timeout;

        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "selector '{selector}' not found within {timeout:?}"
                )));
            }
            tokio::time::sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    /// Find an element without waiting.
    pub async fn find(&self, selector: &str) -> Result<Element> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))
    }

    /// Find all elements matching a selector (possibly empty).
    pub async fn find_all(&self, selector: &str) -> Result<Vec<Element>> {
        Ok(self.page.find_elements(selector).await.unwrap_or_default())
    }

    /// Fill a form field: focus, then type the value.
    pub async fn fill_field(&self, selector: &str, value: &str) -> Result<()> {
        let element = self
            .find(selector)
            .await?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        element
            .type_str(value)
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(())
    }

    /// Click an element by selector.
    pub async fn click(&self, selector: &str) -> Result<()> {
        let element = self.find(selector).await?;
        element
            .click()
            .await
            .map_err(|e| BrowserError::ChromiumError(e.to_string()))?;
        Ok(())
    }

    /// Close the browser, ending the session.
    pub async fn shutdown(mut self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires Chrome browser to be installed"]
    async fn test_launch_and_navigate() {
        let engine = BrowserEngine::launch(true, Duration::from_secs(10))
            .await
            .expect("launch browser");
        engine
            .navigate("about:blank")
            .await
            .expect("navigate to blank page");
        engine.shutdown().await.expect("shutdown");
    }
}
