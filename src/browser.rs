//! Browser Sessions
//!
//! Attaches to a Chrome already exposing its remote-debugging port, or
//! discovers the binary and launches a fresh one.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cdp::endpoint::DebugEndpoint;
use crate::cdp::transport::launch_chrome;
use crate::cdp::{Connection, Transport};
use crate::error::{Error, Result};
use crate::page::Page;
use crate::BrowserConfig;

/// Global counter for unique user data directories
static BROWSER_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Baseline browser arguments
fn browser_args(config: &BrowserConfig) -> Vec<String> {
    let mut args = vec![
        "--no-sandbox".into(),
        "--disable-dev-shm-usage".into(),
        "--disable-gpu".into(),
        "--no-first-run".into(),
        "--no-default-browser-check".into(),
        format!(
            "--window-size={},{}",
            config.viewport_width, config.viewport_height
        ),
    ];

    if config.headless {
        args.push("--headless=new".into());
    }

    args
}

/// Find the Chrome binary on the system
pub fn find_chrome() -> Result<PathBuf> {
    let candidates = if cfg!(target_os = "macos") {
        vec![
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
        ]
    } else if cfg!(target_os = "linux") {
        vec![
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ]
    } else if cfg!(target_os = "windows") {
        vec![
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
        ]
    } else {
        vec![]
    };

    for candidate in candidates {
        let path = Path::new(candidate);
        if path.exists() {
            return Ok(path.to_path_buf());
        }
    }

    Err(Error::ChromeNotFound)
}

/// Info about an open tab
#[derive(Debug, Clone)]
pub struct TabInfo {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// A browser session, either attached to a running Chrome or owning one
pub struct Browser {
    connection: Connection,
    config: Arc<BrowserConfig>,
    /// User data directory, present only when this run launched Chrome
    user_data_dir: Option<PathBuf>,
    /// Whether this run launched its own Chrome process
    launched: bool,
}

impl Browser {
    /// Attach to a Chrome already listening on the configured debugging address
    pub async fn attach(config: BrowserConfig) -> Result<Self> {
        let config = Arc::new(config);

        let endpoint = DebugEndpoint::new(config.debugger_addr.as_str());
        let info = endpoint.version().await?;

        let transport = Transport::connect(&info.web_socket_debugger_url)?;
        let connection = Connection::new(transport);

        let version = connection.version().await?;
        tracing::info!(
            "Attached to Chrome at {}: {}",
            config.debugger_addr,
            version.product
        );

        Ok(Self {
            connection,
            config,
            user_data_dir: None,
            launched: false,
        })
    }

    /// Launch a fresh Chrome process
    pub async fn launch(config: BrowserConfig) -> Result<Self> {
        let config = Arc::new(config);

        // Create unique user data directory
        let instance_id = BROWSER_COUNTER.fetch_add(1, Ordering::Relaxed);
        let user_data_dir = std::env::temp_dir().join(format!(
            "tabctl-browser-{}-{}",
            std::process::id(),
            instance_id
        ));

        // Clean up any stale data
        let _ = std::fs::remove_dir_all(&user_data_dir);
        std::fs::create_dir_all(&user_data_dir)?;

        // Find Chrome path
        let chrome_path = match &config.chrome_path {
            Some(p) => PathBuf::from(p),
            None => find_chrome()?,
        };

        let mut args = browser_args(&config);
        args.push(format!("--user-data-dir={}", user_data_dir.display()));

        // Visible mode renders to the configured display server
        let mut envs = Vec::new();
        if !config.headless {
            if let Some(display) = &config.display {
                envs.push(("DISPLAY".to_string(), display.clone()));
            }
        }

        tracing::info!("Launching Chrome from {:?}", chrome_path);
        let (child, ws_url) = launch_chrome(&chrome_path, &args, &envs)?;

        let transport = Transport::with_child(child, &ws_url)?;
        let connection = Connection::new(transport);

        let version = connection.version().await?;
        tracing::info!("Launched Chrome: {}", version.product);

        Ok(Self {
            connection,
            config,
            user_data_dir: Some(user_data_dir),
            launched: true,
        })
    }

    /// Attach to a running Chrome, falling back to launching a fresh one.
    ///
    /// The attach error is logged rather than silently discarded; a refused
    /// connection and a misconfigured address look the same from here.
    pub async fn attach_or_launch(config: BrowserConfig) -> Result<Self> {
        match Self::attach(config.clone()).await {
            Ok(browser) => Ok(browser),
            Err(e) => {
                tracing::warn!(
                    "Could not attach to Chrome at {}: {}; launching a new instance",
                    config.debugger_addr,
                    e
                );
                Self::launch(config).await
            }
        }
    }

    /// Whether this session launched its own Chrome process
    pub fn launched(&self) -> bool {
        self.launched
    }

    /// Adopt the first open page tab, creating one if the browser has none
    pub async fn first_page(&self) -> Result<Page> {
        let targets = self.connection.get_targets().await?;
        let target_id = match targets.into_iter().find(|t| t.r#type == "page") {
            Some(target) => target.target_id,
            None => {
                self.connection
                    .create_target("about:blank", None, None)
                    .await?
            }
        };

        let session = self.connection.attach_to_target(&target_id).await?;
        session.page_enable().await?;

        Ok(Page::new(session))
    }

    /// Create a new page and navigate it to a URL
    pub async fn new_page(&self, url: &str) -> Result<Page> {
        let target_id = self
            .connection
            .create_target("about:blank", None, None)
            .await?;

        let session = self.connection.attach_to_target(&target_id).await?;
        session.page_enable().await?;

        let nav_result = session.navigate(url).await?;
        if let Some(error) = nav_result.error_text {
            return Err(Error::Navigation(error));
        }

        Ok(Page::new(session))
    }

    /// Get the browser version
    pub async fn version(&self) -> Result<String> {
        let v = self.connection.version().await?;
        Ok(v.product)
    }

    /// List all open tabs
    pub async fn tabs(&self) -> Result<Vec<TabInfo>> {
        let targets = self.connection.get_targets().await?;
        Ok(targets
            .into_iter()
            .filter(|t| t.r#type == "page")
            .map(|t| TabInfo {
                id: t.target_id,
                title: t.title,
                url: t.url,
            })
            .collect())
    }

    /// Release the session. A browser launched by this run is terminated; a
    /// browser we merely attached to keeps running.
    pub async fn close(self) -> Result<()> {
        if self.launched {
            self.connection.close_browser().await?;
        } else {
            self.connection.detach().await?;
        }

        if let Some(dir) = &self.user_data_dir {
            let _ = std::fs::remove_dir_all(dir);
        }

        Ok(())
    }

    /// The configuration this session was built from
    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }
}

impl Drop for Browser {
    fn drop(&mut self) {
        // Best-effort cleanup of the user data directory if close() wasn't
        // called. The Transport's Drop impl handles killing an owned process.
        if let Some(dir) = &self.user_data_dir {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
