//! Chrome automation demo
//!
//! Attaches to a Chrome listening on the default debugging address (falling
//! back to launching one) and walks through the command set.
//!
//! Usage: chrome-automate [headless|visible]

use tabctl::{BrowserConfig, Controller};

#[tokio::main]
async fn main() -> tabctl::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mode = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "visible".to_string());

    let config = if mode == "headless" {
        println!("Running in HEADLESS mode (no display)");
        BrowserConfig::headless()
    } else {
        println!("Running in VISIBLE mode");
        BrowserConfig::default()
    };

    let ctl = Controller::connect(config).await?;

    println!("\n=== Chrome Automation Demo ===\n");

    let title = ctl.navigate("https://www.google.com").await?;
    println!("Page title: {}", title);

    println!("\nSearching for 'rust async runtime'...");
    let results = ctl.search("rust async runtime").await?;
    println!("Top results:");
    for (i, result) in results.iter().enumerate() {
        println!("  {}. {}", i + 1, result);
    }

    let shot = ctl.screenshot("google_search.png").await?;
    println!("Screenshot saved: {}", shot.display());

    ctl.navigate("https://example.com").await?;

    let heading = ctl.get_text("h1").await?;
    println!("\nPage heading: {}", heading);

    let url = ctl.run_script("window.location.href").await?;
    println!("Current URL via script: {}", url.as_str().unwrap_or("unknown"));

    ctl.close().await?;
    println!("\nDemo complete");
    Ok(())
}
