// src/collect/metadata.rs
//! Single-page metadata scraping for sources that are not syndication
//! feeds. Open-Graph tags are matched with targeted patterns, not a full
//! markup parse — tolerant of malformed documents at the cost of missing
//! nonstandard attribute orderings.

use anyhow::{ensure, Context, Result};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;

use super::types::ContentMetadata;

/// Response bodies beyond this size are truncated, not rejected.
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Fetch a page and extract its metadata. Errors on transport failure or a
/// non-200 status.
pub async fn fetch_page_metadata(
    client: &reqwest::Client,
    url: &str,
) -> Result<ContentMetadata> {
    let mut resp = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("fetching page {url}"))?;
    ensure!(
        resp.status() == StatusCode::OK,
        "page fetch returned status {} for {url}",
        resp.status()
    );

    let mut body: Vec<u8> = Vec::new();
    while let Some(chunk) = resp.chunk().await.context("reading page body")? {
        if body.len() + chunk.len() > MAX_BODY_BYTES {
            body.extend_from_slice(&chunk[..MAX_BODY_BYTES - body.len()]);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    let html = String::from_utf8_lossy(&body);

    let mut title = extract_meta_tag(&html, "og:title");
    if title.is_empty() {
        title = extract_title_tag(&html);
    }

    let mut description = extract_meta_tag(&html, "og:description");
    if description.is_empty() {
        description = extract_meta_tag(&html, "description");
    }

    let image_url = extract_meta_tag(&html, "og:image");

    Ok(ContentMetadata {
        title,
        description,
        url: url.to_string(),
        image_url,
        // Pages rarely expose a reliable date; use collection time.
        published_at: Utc::now(),
    })
}

/// Matches `<meta property="og:title" content="..." />` or
/// `<meta name="description" content="..." />`. Attribute-order-sensitive.
fn extract_meta_tag(html: &str, property: &str) -> String {
    let pattern = format!(
        r#"(?i)<meta\s+(?:property|name)=["']{}["']\s+content=["'](.*?)["']"#,
        regex::escape(property)
    );
    let re = Regex::new(&pattern).expect("meta tag pattern");
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str()))
        .unwrap_or_default()
}

static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<title>(.*?)</title>").expect("title pattern"));

fn extract_title_tag(html: &str) -> String {
    TITLE_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str()))
        .unwrap_or_default()
}

/// Decode the five common HTML entities. No general entity table.
fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#39;", "'")
}
