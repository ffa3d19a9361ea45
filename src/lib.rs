//! # tabctl
//!
//! Drive a running Chrome over its remote-debugging protocol.
//!
//! tabctl is a small automation crate with two independent entry points built
//! on the same hand-rolled CDP client:
//!
//! - [`Controller`] - a browser-automation session with an imperative command
//!   set (navigate, search, click, fill, read text, run script, screenshot).
//!   It attaches to a Chrome already listening on its remote-debugging port
//!   and falls back to launching a fresh process when nothing is there.
//! - [`navigator`] - a raw protocol walk-through: discover the WebSocket
//!   debugger URL over HTTP, attach to the first open tab, navigate it, and
//!   read back `document.title`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tabctl::{BrowserConfig, Controller};
//!
//! #[tokio::main]
//! async fn main() -> tabctl::Result<()> {
//!     let ctl = Controller::connect(BrowserConfig::default()).await?;
//!
//!     let title = ctl.navigate("https://example.com").await?;
//!     println!("loaded: {}", title);
//!
//!     ctl.click("a.more-information").await?;
//!     let heading = ctl.get_text("h1").await?;
//!     println!("heading: {}", heading);
//!
//!     ctl.screenshot("example.png").await?;
//!     ctl.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! All addresses and directories the scripts used to hard-code are explicit
//! configuration, so tests can point them at mock endpoints:
//!
//! ```rust,no_run
//! use tabctl::BrowserConfig;
//!
//! let config = BrowserConfig {
//!     headless: true,
//!     debugger_addr: "127.0.0.1:9333".into(),
//!     ..Default::default()
//! };
//! ```

use std::path::PathBuf;

pub mod browser;
pub mod cdp;
pub mod controller;
pub mod error;
pub mod navigator;
pub mod page;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports
pub use browser::{Browser, TabInfo};
pub use controller::Controller;
pub use error::{Error, Result};
pub use page::{Element, Page};

/// Configuration for a browser session
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run without a visible window
    pub headless: bool,
    /// Remote-debugging address of an already-running Chrome
    pub debugger_addr: String,
    /// Path to the Chrome/Chromium binary (None = search well-known locations)
    pub chrome_path: Option<String>,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Display server address used when launching in visible mode
    pub display: Option<String>,
    /// Directory screenshots are written to
    pub screenshot_dir: PathBuf,
    /// How long navigation may take before `navigate` gives up
    pub nav_timeout_ms: u64,
    /// How long `click` waits for an element to become clickable
    pub click_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            debugger_addr: "127.0.0.1:9222".into(),
            chrome_path: None,
            viewport_width: 1920,
            viewport_height: 1080,
            display: Some(":99".into()),
            screenshot_dir: std::env::temp_dir(),
            nav_timeout_ms: 30_000,
            click_timeout_ms: 10_000,
        }
    }
}

impl BrowserConfig {
    /// Create a headless config
    pub fn headless() -> Self {
        Self {
            headless: true,
            ..Default::default()
        }
    }
}
