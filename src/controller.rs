//! Browser Session Controller
//!
//! One attached tab plus the imperative command set driven against it:
//! navigate, search, click, fill, read text, run script, screenshot.

use std::path::PathBuf;

use crate::browser::Browser;
use crate::error::Result;
use crate::page::Page;
use crate::BrowserConfig;

/// Search engine used by [`Controller::search`]
const SEARCH_URL: &str = "https://www.google.com";
/// The search engine's query input
const SEARCH_INPUT: &str = "input[name='q']";
/// Result headings on the search results page
const RESULT_HEADING: &str = "h3";
/// How many result headings `search` returns
const RESULT_LIMIT: usize = 5;

/// A browser-automation session with an imperative command set.
///
/// Construction attaches to a Chrome already listening on the configured
/// debugging address and falls back to launching a fresh process. Every
/// command operates on the session's single adopted tab and surfaces the
/// underlying protocol error unchanged; there is no retry layer.
pub struct Controller {
    browser: Browser,
    page: Page,
}

impl Controller {
    /// Attach to a running Chrome or launch one, then adopt the first tab
    pub async fn connect(config: BrowserConfig) -> Result<Self> {
        let browser = Browser::attach_or_launch(config).await?;
        let page = browser.first_page().await?;
        Ok(Self { browser, page })
    }

    /// The underlying browser session
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// The adopted page
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Navigate to a URL and return the resulting page title
    pub async fn navigate(&self, url: &str) -> Result<String> {
        self.page.goto(url).await?;
        self.page
            .wait_until_loaded(self.browser.config().nav_timeout_ms)
            .await?;

        let title = self.page.title().await?;
        tracing::info!("Navigated to {}: {}", url, title);
        Ok(title)
    }

    /// Run a query through the search engine and return the text of the first
    /// few result headings
    pub async fn search(&self, query: &str) -> Result<Vec<String>> {
        self.navigate(SEARCH_URL).await?;

        let timeout = self.browser.config().click_timeout_ms;
        self.page.wait_for(SEARCH_INPUT, timeout).await?;
        self.page.fill(SEARCH_INPUT, query).await?;
        self.page.press_key("Enter").await?;

        self.page.wait_for(RESULT_HEADING, timeout).await?;

        let headings = self.page.find_all(RESULT_HEADING).await?;
        let mut results = Vec::new();
        for heading in headings.iter().take(RESULT_LIMIT) {
            results.push(heading.text().await?);
        }
        Ok(results)
    }

    /// Click an element, waiting a bounded interval for it to become clickable
    pub async fn click(&self, selector: &str) -> Result<()> {
        let timeout = self.browser.config().click_timeout_ms;
        let element = self.page.wait_for_clickable(selector, timeout).await?;
        element.click().await?;
        tracing::info!("Clicked {}", selector);
        Ok(())
    }

    /// Fill a form field; fails immediately when the element is absent
    pub async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        self.page.fill(selector, text).await?;
        tracing::info!("Filled {}", selector);
        Ok(())
    }

    /// Get the text of an element; fails immediately when the element is absent
    pub async fn get_text(&self, selector: &str) -> Result<String> {
        let element = self.page.find(selector).await?;
        element.text().await
    }

    /// Run a script in the page and return its result value
    pub async fn run_script(&self, code: &str) -> Result<serde_json::Value> {
        self.page.evaluate_value(code).await
    }

    /// Capture the viewport to the configured screenshot directory under the
    /// supplied filename, returning the full path
    pub async fn screenshot(&self, name: &str) -> Result<PathBuf> {
        let png = self.page.screenshot().await?;

        let dir = &self.browser.config().screenshot_dir;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(name);
        std::fs::write(&path, png)?;

        tracing::info!("Screenshot saved: {}", path.display());
        Ok(path)
    }

    /// Release the session; terminates the browser only if this run launched it
    pub async fn close(self) -> Result<()> {
        self.browser.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockChrome;
    use crate::Error;

    fn test_config(mock: &MockChrome) -> BrowserConfig {
        BrowserConfig {
            debugger_addr: mock.addr(),
            click_timeout_ms: 400,
            nav_timeout_ms: 2_000,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn navigate_returns_title_unchanged() {
        let mock = MockChrome::builder().title("Mock Landing Page").spawn();
        let ctl = Controller::connect(test_config(&mock))
            .await
            .expect("connect failed");

        let title = ctl
            .navigate("http://example.invalid/")
            .await
            .expect("navigate failed");
        assert_eq!(title, "Mock Landing Page");

        ctl.close().await.expect("close failed");
    }

    #[tokio::test]
    async fn click_waits_bounded_interval_before_failing() {
        let mock = MockChrome::builder().spawn();
        let config = test_config(&mock);
        let timeout = std::time::Duration::from_millis(config.click_timeout_ms);

        let ctl = Controller::connect(config).await.expect("connect failed");

        let start = std::time::Instant::now();
        let err = ctl.click("#never-appears").await.err().expect("must fail");
        let elapsed = start.elapsed();

        assert!(matches!(err, Error::Timeout(_)), "got {:?}", err);
        assert!(
            elapsed >= timeout,
            "gave up after {:?}, bound is {:?}",
            elapsed,
            timeout
        );

        ctl.close().await.expect("close failed");
    }

    #[tokio::test]
    async fn fill_fails_immediately_when_element_absent() {
        let mock = MockChrome::builder().spawn();
        let ctl = Controller::connect(test_config(&mock))
            .await
            .expect("connect failed");

        let err = ctl.fill("#missing", "text").await.err().expect("must fail");
        assert!(matches!(err, Error::ElementNotFound(_)), "got {:?}", err);

        ctl.close().await.expect("close failed");
    }

    #[tokio::test]
    async fn click_acts_on_present_element() {
        let mock = MockChrome::builder().selector("#submit").spawn();
        let ctl = Controller::connect(test_config(&mock))
            .await
            .expect("connect failed");

        ctl.click("#submit").await.expect("click failed");

        // A full click is a press and a release
        let mouse_events = mock
            .methods()
            .iter()
            .filter(|m| *m == "Input.dispatchMouseEvent")
            .count();
        assert_eq!(mouse_events, 2);

        ctl.close().await.expect("close failed");
    }

    #[tokio::test]
    async fn screenshot_writes_exact_filename() {
        let mock = MockChrome::builder().spawn();

        let dir = std::env::temp_dir().join(format!("tabctl-test-{}", std::process::id()));
        let config = BrowserConfig {
            screenshot_dir: dir.clone(),
            ..test_config(&mock)
        };

        let ctl = Controller::connect(config).await.expect("connect failed");

        let path = ctl
            .screenshot("google_search.png")
            .await
            .expect("screenshot failed");
        assert_eq!(path, dir.join("google_search.png"));

        let bytes = std::fs::read(&path).expect("file missing");
        assert_eq!(&bytes[0..4], &[0x89, 0x50, 0x4E, 0x47]);

        ctl.close().await.expect("close failed");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn run_script_returns_null_for_valueless_results() {
        let mock = MockChrome::builder().spawn();
        let ctl = Controller::connect(test_config(&mock))
            .await
            .expect("connect failed");

        let value = ctl
            .run_script("console.log('side effect only')")
            .await
            .expect("run_script failed");
        assert!(value.is_null());

        ctl.close().await.expect("close failed");
    }
}
