//! Navigate the first open tab of a running Chrome over the raw protocol
//!
//! Usage: chrome-navigate [url]

use tabctl::{navigator, BrowserConfig};

#[tokio::main]
async fn main() -> tabctl::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://www.google.com".to_string());

    let addr = BrowserConfig::default().debugger_addr;

    match navigator::navigate_first_tab(&addr, &url).await? {
        Some(title) => println!("Page title: {}", title),
        None => println!("No tabs found!"),
    }

    Ok(())
}
