//! Page Abstraction
//!
//! High-level API for interacting with one attached tab.

use crate::cdp::types::InputDispatchKeyEvent;
use crate::cdp::{KeyEventType, MouseButton, MouseEventType, Session};
use crate::error::{Error, Result};

/// Escape a string for safe use in JavaScript string literals
fn escape_js_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('"', "\\\"")
        .replace('`', "\\`")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace("${", "\\${")
}

/// A page attached over a CDP session
pub struct Page {
    session: Session,
}

impl Page {
    /// Create a new Page wrapping a CDP session
    pub(crate) fn new(session: Session) -> Self {
        Self { session }
    }

    /// Get the underlying CDP session
    pub fn session(&self) -> &Session {
        &self.session
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Navigate to a URL
    pub async fn goto(&self, url: &str) -> Result<()> {
        let result = self.session.navigate(url).await?;
        if let Some(error) = result.error_text {
            return Err(Error::Navigation(error));
        }
        Ok(())
    }

    /// Wait for the document to finish loading
    ///
    /// Polls `document.readyState` until it reports "complete". This replaces
    /// the fixed post-navigation sleep with an explicit condition.
    pub async fn wait_until_loaded(&self, timeout_ms: u64) -> Result<()> {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);
        let poll_interval = std::time::Duration::from_millis(50);

        loop {
            match self.session.evaluate("document.readyState").await {
                Ok(result) => {
                    if let Some(value) = result.result.value {
                        if value.as_str() == Some("complete") {
                            return Ok(());
                        }
                    }
                }
                Err(_) => {
                    // Page might be mid-navigation, readyState unavailable - keep waiting
                }
            }

            if start.elapsed() > timeout {
                return Err(Error::Timeout(format!(
                    "Navigation did not complete within {}ms",
                    timeout_ms
                )));
            }

            tokio::time::sleep(poll_interval).await;
        }
    }

    // =========================================================================
    // Page Info
    // =========================================================================

    /// Get current URL
    pub async fn url(&self) -> Result<String> {
        let frame_tree = self.session.get_frame_tree().await?;
        Ok(frame_tree.frame.url)
    }

    /// Get page title
    pub async fn title(&self) -> Result<String> {
        let result = self.session.evaluate("document.title").await?;
        if let Some(value) = result.result.value {
            if let Some(s) = value.as_str() {
                return Ok(s.to_string());
            }
        }
        Ok(String::new())
    }

    /// Get page text content (body innerText)
    pub async fn text(&self) -> Result<String> {
        let result = self.session.evaluate("document.body.innerText").await?;
        if let Some(value) = result.result.value {
            if let Some(s) = value.as_str() {
                return Ok(s.to_string());
            }
        }
        Ok(String::new())
    }

    // =========================================================================
    // Screenshots
    // =========================================================================

    /// Capture a screenshot of the viewport as PNG bytes
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        self.session.capture_screenshot(Some("png"), None).await
    }

    // =========================================================================
    // Element Finding
    // =========================================================================

    /// Find an element by CSS selector
    pub async fn find(&self, selector: &str) -> Result<Element<'_>> {
        let doc = self.session.get_document(Some(0)).await?;
        let node_id = self.session.query_selector(doc.node_id, selector).await?;

        if node_id == 0 {
            return Err(Error::ElementNotFound(selector.to_string()));
        }

        Ok(Element {
            page: self,
            node_id,
        })
    }

    /// Find all elements matching a CSS selector
    pub async fn find_all(&self, selector: &str) -> Result<Vec<Element<'_>>> {
        let doc = self.session.get_document(Some(0)).await?;
        let node_ids = self
            .session
            .query_selector_all(doc.node_id, selector)
            .await?;

        Ok(node_ids
            .into_iter()
            .filter(|&id| id != 0)
            .map(|node_id| Element {
                page: self,
                node_id,
            })
            .collect())
    }

    /// Check if an element exists
    #[must_use = "returns true if element exists"]
    pub async fn exists(&self, selector: &str) -> bool {
        self.find(selector).await.is_ok()
    }

    // =========================================================================
    // Interaction
    // =========================================================================

    /// Click at coordinates
    pub async fn click_at(&self, x: f64, y: f64) -> Result<()> {
        self.session
            .dispatch_mouse_event(
                MouseEventType::MousePressed,
                x,
                y,
                Some(MouseButton::Left),
                Some(1),
            )
            .await?;

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        self.session
            .dispatch_mouse_event(
                MouseEventType::MouseReleased,
                x,
                y,
                Some(MouseButton::Left),
                Some(1),
            )
            .await?;

        Ok(())
    }

    /// Click on an element by selector
    pub async fn click(&self, selector: &str) -> Result<()> {
        let element = self.find(selector).await?;
        element.click().await
    }

    /// Type text into an element by selector
    pub async fn type_into(&self, selector: &str, text: &str) -> Result<()> {
        let element = self.find(selector).await?;
        element.click().await?;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        self.session.insert_text(text).await
    }

    /// Fill a form field: clicks, clears existing content, and types new value
    pub async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let element = self.find(selector).await?;
        element.click().await?;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        // Select all so the inserted text replaces the old value
        self.execute("document.activeElement.select()").await?;
        self.session.insert_text(value).await
    }

    /// Press a named key (down + up) on the focused element
    ///
    /// "Enter" carries a carriage return and virtual key code 13 so form
    /// submission works the way a physical key press does.
    pub async fn press_key(&self, key: &str) -> Result<()> {
        let (text, key_code) = match key {
            "Enter" => (Some("\r".to_string()), Some(13)),
            _ => (None, None),
        };

        self.session
            .dispatch_key_event(InputDispatchKeyEvent {
                r#type: KeyEventType::KeyDown,
                text,
                key: Some(key.to_string()),
                code: Some(key.to_string()),
                windows_virtual_key_code: key_code,
                native_virtual_key_code: key_code,
            })
            .await?;

        self.session
            .dispatch_key_event(InputDispatchKeyEvent {
                r#type: KeyEventType::KeyUp,
                text: None,
                key: Some(key.to_string()),
                code: Some(key.to_string()),
                windows_virtual_key_code: key_code,
                native_virtual_key_code: key_code,
            })
            .await?;

        Ok(())
    }

    // =========================================================================
    // JavaScript Evaluation
    // =========================================================================

    /// Evaluate JavaScript and deserialize the result
    pub async fn evaluate<T: serde::de::DeserializeOwned>(&self, expression: &str) -> Result<T> {
        let value = self.evaluate_value(expression).await?;
        let typed: T = serde_json::from_value(value)?;
        Ok(typed)
    }

    /// Evaluate JavaScript and return the raw result value
    ///
    /// Expressions that produce no value (undefined) return `null`, matching
    /// what a driver's execute-script call reports.
    pub async fn evaluate_value(&self, expression: &str) -> Result<serde_json::Value> {
        let result = self.session.evaluate(expression).await?;

        if let Some(exception) = result.exception_details {
            return Err(Error::Script(format!(
                "{} at {}:{}",
                exception.text, exception.line_number, exception.column_number
            )));
        }

        Ok(result.result.value.unwrap_or(serde_json::Value::Null))
    }

    /// Execute JavaScript without expecting a return value
    pub async fn execute(&self, expression: &str) -> Result<()> {
        self.evaluate_value(expression).await?;
        Ok(())
    }

    // =========================================================================
    // Wait Helpers
    // =========================================================================

    /// Wait for an element to appear in the DOM
    pub async fn wait_for(&self, selector: &str, timeout_ms: u64) -> Result<Element<'_>> {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if let Ok(element) = self.find(selector).await {
                return Ok(element);
            }

            if start.elapsed() > timeout {
                return Err(Error::Timeout(format!(
                    "Element '{}' not found within {}ms",
                    selector, timeout_ms
                )));
            }

            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    }

    /// Wait for an element to be visible and clickable (has a computable box
    /// model), not just present in the DOM
    pub async fn wait_for_clickable(&self, selector: &str, timeout_ms: u64) -> Result<Element<'_>> {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(timeout_ms);

        loop {
            if let Ok(element) = self.find(selector).await {
                if element.center().await.is_ok() {
                    return Ok(element);
                }
            }

            if start.elapsed() > timeout {
                return Err(Error::Timeout(format!(
                    "Element '{}' not clickable within {}ms",
                    selector, timeout_ms
                )));
            }

            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
    }

    /// Wait for a fixed duration
    pub async fn wait(&self, ms: u64) {
        tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
    }
}

/// An element on the page
pub struct Element<'a> {
    page: &'a Page,
    node_id: i32,
}

impl<'a> Element<'a> {
    /// Get the element's center coordinates
    pub async fn center(&self) -> Result<(f64, f64)> {
        let model = self.page.session.get_box_model(self.node_id).await?;
        Ok(model.center())
    }

    /// Click this element
    pub async fn click(&self) -> Result<()> {
        let (x, y) = self.center().await?;
        self.page.click_at(x, y).await
    }

    /// Get outer HTML
    pub async fn outer_html(&self) -> Result<String> {
        self.page.session.get_outer_html(self.node_id).await
    }

    /// Get inner text
    ///
    /// Extracts text content from the element's outerHTML without changing
    /// focus.
    pub async fn text(&self) -> Result<String> {
        let html = self.page.session.get_outer_html(self.node_id).await?;
        let escaped_html = escape_js_string(&html);

        let result = self
            .page
            .session
            .evaluate(&format!(
                r#"(() => {{
                const div = document.createElement('div');
                div.innerHTML = '{}';
                return div.innerText || div.textContent || '';
            }})()"#,
                escaped_html
            ))
            .await?;

        if let Some(value) = result.result.value {
            if let Some(s) = value.as_str() {
                return Ok(s.to_string());
            }
        }
        Ok(String::new())
    }

    /// Check if the element is visible (has a computable box model)
    #[must_use = "returns visibility state"]
    pub async fn is_visible(&self) -> Result<bool> {
        match self.page.session.get_box_model(self.node_id).await {
            Ok(_) => Ok(true),
            Err(Error::Cdp { message, .. }) if message.contains("box model") => Ok(false),
            Err(e) => Err(e),
        }
    }
}
