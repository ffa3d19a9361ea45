//! Remote-debugging HTTP endpoint
//!
//! Chrome started with `--remote-debugging-port` serves a small HTTP API next
//! to the DevTools WebSocket: `/json/version` carries the browser-level
//! WebSocket debugger URL, `/json` lists the open tabs.

use serde::Deserialize;

use crate::error::Result;

/// Browser-level version info from `/json/version`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    #[serde(default)]
    pub browser: String,
    pub web_socket_debugger_url: String,
}

/// One open tab from `/json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabTarget {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// The HTTP side of a remote-debugging address
#[derive(Debug, Clone)]
pub struct DebugEndpoint {
    addr: String,
}

impl DebugEndpoint {
    /// Create an endpoint for a `host:port` debugging address
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// The configured `host:port`
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Fetch browser version info, including the WebSocket debugger URL
    pub async fn version(&self) -> Result<VersionInfo> {
        let url = format!("http://{}/json/version", self.addr);
        tracing::debug!("Fetching {}", url);

        let info: VersionInfo = reqwest::get(&url).await?.error_for_status()?.json().await?;
        Ok(info)
    }

    /// Fetch the list of open tabs
    pub async fn tabs(&self) -> Result<Vec<TabTarget>> {
        let url = format!("http://{}/json", self.addr);
        tracing::debug!("Fetching {}", url);

        let tabs: Vec<TabTarget> = reqwest::get(&url).await?.error_for_status()?.json().await?;
        Ok(tabs)
    }
}
