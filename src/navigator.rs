//! Raw Protocol Navigator
//!
//! Walks the remote-debugging surface directly, without the [`Controller`]
//! layer: HTTP discovery, one WebSocket connection, attach to the first open
//! tab, navigate it, and read back `document.title`.
//!
//! [`Controller`]: crate::Controller

use crate::cdp::endpoint::DebugEndpoint;
use crate::cdp::{Connection, Transport};
use crate::error::Result;

/// Bound on the post-navigation readiness poll
const LOAD_TIMEOUT_MS: u64 = 10_000;

/// Title reported when the evaluate response carries no usable value
const UNKNOWN_TITLE: &str = "Unknown";

/// Navigate the first open tab of the Chrome at `debugger_addr` to `url`.
///
/// Returns the page title afterwards, or `None` when the browser has no open
/// tabs (in which case nothing is sent over the WebSocket). An attach failure
/// propagates before any navigate command goes out.
pub async fn navigate_first_tab(debugger_addr: &str, url: &str) -> Result<Option<String>> {
    let endpoint = DebugEndpoint::new(debugger_addr);

    // Browser-level WebSocket debugger URL from /json/version
    let info = endpoint.version().await?;
    tracing::info!("Connecting to {}", info.web_socket_debugger_url);

    let connection = Connection::new(Transport::connect(&info.web_socket_debugger_url)?);

    // Tab list from /json
    let tabs = endpoint.tabs().await?;
    let Some(tab) = tabs.first() else {
        tracing::warn!("No tabs open at {}", debugger_addr);
        return Ok(None);
    };
    tracing::info!("Using tab: {}", tab.title);

    // Attach, then navigate scoped to the returned session
    let session = connection.attach_to_target(&tab.id).await?;
    session.navigate(url).await?;
    tracing::info!("Navigated to: {}", url);

    // Give the load a bounded chance to settle; a slow page is not an error
    let start = std::time::Instant::now();
    loop {
        if let Ok(result) = session.evaluate("document.readyState").await {
            if result.result.value.as_ref().and_then(|v| v.as_str()) == Some("complete") {
                break;
            }
        }
        if start.elapsed() > std::time::Duration::from_millis(LOAD_TIMEOUT_MS) {
            tracing::debug!("Load did not settle within {}ms", LOAD_TIMEOUT_MS);
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    let title = session
        .evaluate("document.title")
        .await?
        .result
        .value
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    connection.detach().await?;

    Ok(Some(title))
}
