//! Remote directory-listing scanner.
//!
//! The archive publishes per-month Apache-style index pages under
//! `{base}/{year}/{month:02}/`. This crate fetches a month page and turns
//! its anchor tags into typed entries, pairing each file link with the size
//! and last-modified text scraped from the same table row.
//!
//! Anchors that match the file suffix but carry a malformed date are
//! returned as typed skips rather than silently dropped, so callers can
//! count and report skip rates.

use std::time::Duration;

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use argo_common::time::profile_date;
use argo_common::{ArgoError, ArgoResult};

/// One file advertised by a month listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Bare filename, e.g. `20250911_prof.nc`.
    pub filename: String,
    /// Absolute download URL.
    pub url: String,
    /// Size text as reported by the listing (`"Unknown"` when absent).
    pub size: String,
    /// Last-modified text as reported by the listing (`"Unknown"` when
    /// absent). Compared as an opaque string, never parsed.
    pub last_modified: String,
    /// Profile date extracted from the filename.
    pub date: NaiveDate,
}

/// Why a suffix-matching anchor was not turned into an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The filename does not carry a parseable `YYYYMMDD` date.
    MalformedDate,
}

/// A suffix-matching anchor that could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedHref {
    pub href: String,
    pub reason: SkipReason,
}

/// Result of scanning one month page.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    pub entries: Vec<RemoteEntry>,
    pub skipped: Vec<SkippedHref>,
}

impl Scan {
    /// Anchors parsed into entries.
    pub fn parsed_count(&self) -> usize {
        self.entries.len()
    }

    /// Anchors skipped as malformed.
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// HTTP client for month listing pages.
pub struct ListingClient {
    client: reqwest::Client,
    base_url: String,
    suffix: String,
}

impl ListingClient {
    /// Create a listing client for an archive base URL.
    pub fn new(base_url: &str, suffix: &str, timeout: Duration) -> ArgoResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ArgoError::ListingFetch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            suffix: suffix.to_string(),
        })
    }

    /// URL of the month index page.
    pub fn month_url(&self, year: i32, month: u32) -> String {
        format!("{}/{}/{:02}/", self.base_url, year, month)
    }

    /// Fetch and parse one month listing.
    pub async fn scan(&self, year: i32, month: u32) -> ArgoResult<Scan> {
        let url = self.month_url(year, month);
        debug!(url = %url, "Scanning directory listing");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ArgoError::ListingFetch(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(ArgoError::ListingFetch(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ArgoError::ListingFetch(format!("{}: {}", url, e)))?;

        let scan = parse_listing(&body, &url, &self.suffix);

        info!(
            year = year,
            month = month,
            parsed = scan.parsed_count(),
            skipped = scan.skipped_count(),
            "Scanned month listing"
        );

        Ok(scan)
    }
}

/// Parse a month index page into entries and typed skips.
pub fn parse_listing(html: &str, base_url: &str, suffix: &str) -> Scan {
    let document = Html::parse_document(html);
    let anchors = Selector::parse("a[href]").expect("anchor selector");
    let cells = Selector::parse("td").expect("cell selector");

    let mut scan = Scan::default();

    for link in document.select(&anchors) {
        let href = match link.value().attr("href") {
            Some(h) => h,
            None => continue,
        };
        if !href.ends_with(suffix) {
            continue;
        }

        let filename = href.rsplit('/').next().unwrap_or(href).to_string();
        match profile_date(&filename) {
            Some(date) => {
                let (last_modified, size) = row_metadata(&link, &cells);
                scan.entries.push(RemoteEntry {
                    url: join_url(base_url, href),
                    filename,
                    size,
                    last_modified,
                    date,
                });
            }
            None => scan.skipped.push(SkippedHref {
                href: href.to_string(),
                reason: SkipReason::MalformedDate,
            }),
        }
    }

    scan
}

/// Index pages put each anchor in the first cell of a table row; the second
/// and third cells carry last-modified and size.
fn row_metadata(link: &ElementRef, cells: &Selector) -> (String, String) {
    if let Some(row) = link
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "tr")
    {
        let texts: Vec<String> = row
            .select(cells)
            .map(|c| c.text().collect::<String>().trim().to_string())
            .collect();
        if texts.len() >= 3 && !texts[1].is_empty() && !texts[2].is_empty() {
            return (texts[1].clone(), texts[2].clone());
        }
    }
    ("Unknown".to_string(), "Unknown".to_string())
}

/// Resolve an href against the page URL. Listing pages use bare filenames;
/// absolute links pass through.
fn join_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            href.trim_start_matches('/')
        )
    }
}
