//! Manufacturer listing fetcher.
//!
//! Scrapes the circuitpython.org downloads page for the `data-name` /
//! `data-manufacturer` attributes on the per-board download elements. The
//! result is a hint list only: a failed fetch degrades to an empty list and
//! never aborts a run.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The listing page scraped for manufacturer hints.
pub const DEFAULT_LISTING_URL: &str = "https://circuitpython.org/downloads?sort-by=alpha-asc";

const FETCH_TIMEOUT_SECS: u64 = 30;

static DOWNLOAD_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<div[^>]*class="[^"]*download[^"]*"[^>]*>"#).expect("valid download tag regex")
});
static DATA_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-name="([^"]*)""#).expect("valid data-name regex"));
static DATA_MANUFACTURER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-manufacturer="([^"]*)""#).expect("valid data-manufacturer regex")
});

/// One board entry from the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturerEntry {
    pub name: String,
    pub manufacturer: String,
}

/// Extract manufacturer entries from listing page HTML.
///
/// Elements missing either attribute are discarded. The result is sorted
/// case-insensitively by name.
pub fn parse_listing(html: &str) -> Vec<ManufacturerEntry> {
    let mut entries: Vec<ManufacturerEntry> = DOWNLOAD_TAG_RE
        .find_iter(html)
        .filter_map(|tag| {
            let tag = tag.as_str();
            let name = DATA_NAME_RE.captures(tag)?[1].to_string();
            let manufacturer = DATA_MANUFACTURER_RE.captures(tag)?[1].to_string();
            if name.is_empty() || manufacturer.is_empty() {
                return None;
            }
            Some(ManufacturerEntry { name, manufacturer })
        })
        .collect();
    entries.sort_by_key(|entry| entry.name.to_lowercase());
    entries
}

/// Fetch and parse the manufacturer listing.
///
/// Network and HTTP errors are logged and yield an empty list; callers must
/// treat an empty list as "no hints available", not as a failure.
pub async fn fetch_manufacturers(url: &str) -> Vec<ManufacturerEntry> {
    match try_fetch(url).await {
        Ok(entries) => {
            tracing::debug!("fetched {} manufacturer entries from {}", entries.len(), url);
            entries
        }
        Err(e) => {
            tracing::warn!("failed to fetch manufacturer listing from {}: {}", url, e);
            Vec::new()
        }
    }
}

async fn try_fetch(url: &str) -> Result<Vec<ManufacturerEntry>, reqwest::Error> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()?;
    let response = client.get(url).send().await?.error_for_status()?;
    let body = response.text().await?;
    Ok(parse_listing(&body))
}

/// Blocking wrapper for callers outside an async context (the CLI and the
/// orchestrator). Spins up a current-thread runtime for the single request.
pub fn fetch_manufacturers_blocking(url: &str) -> Vec<ManufacturerEntry> {
    match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime.block_on(fetch_manufacturers(url)),
        Err(e) => {
            tracing::warn!("failed to start runtime for manufacturer fetch: {}", e);
            Vec::new()
        }
    }
}
