// src/fetch/urls.rs
use crate::fetch::get_text;
use crate::process::date_parser::{period_from_filename, Period};
use anyhow::Result;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

/// A linked report file and the month its figures describe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub period: Period,
    pub url: Url,
    pub filename: String,
}

/// Last path segment of a raw href, without query or fragment.
fn href_filename(href: &str) -> Option<&str> {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    path.rsplit('/').next().filter(|name| !name.is_empty())
}

/// Collect every spreadsheet link on the page whose filename encodes a period.
pub fn extract_candidates(html: &str, base: &Url) -> Vec<CandidateFile> {
    let selector = Selector::parse("a[href]").expect("CSS selector for links should be valid");

    Html::parse_document(html)
        .select(&selector)
        .filter_map(|e| e.value().attr("href"))
        .filter(|href| href.to_lowercase().contains(".xls"))
        .filter_map(|href| {
            let filename = href_filename(href)?.to_string();
            let url = base.join(href).ok()?;
            match period_from_filename(&filename) {
                Some(period) => Some(CandidateFile {
                    period,
                    url,
                    filename,
                }),
                None => {
                    debug!(%filename, "skipping link without a report period");
                    None
                }
            }
        })
        .collect()
}

/// Fetch the listing page and return its report candidates, possibly none.
#[instrument(level = "info", skip_all, fields(listing = %listing))]
pub async fn fetch_candidates(client: &Client, listing: &Url) -> Result<Vec<CandidateFile>> {
    let html = get_text(client, listing).await?;
    let candidates = extract_candidates(&html, listing);
    info!(count = candidates.len(), "found report files");
    Ok(candidates)
}

/// The candidate with the latest period; the first one seen wins a tie.
pub fn select_latest(candidates: &[CandidateFile]) -> Option<&CandidateFile> {
    candidates.iter().fold(None, |best, c| match best {
        Some(b) if b.period >= c.period => Some(b),
        _ => Some(c),
    })
}
