// src/collect/feed.rs
//! RSS/Atom feed parsing. Two-phase decode: sniff the root element with a
//! streaming reader, then fully deserialize with the matching grammar.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::format_description::{self, OwnedFormatItem};
use time::{OffsetDateTime, PrimitiveDateTime};

use super::types::ContentMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedRoot {
    Rss,
    Atom,
}

// ---- RSS grammar ----

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

// ---- Atom grammar ----

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<String>,
    summary: Option<String>,
    published: Option<String>,
    updated: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    #[serde(rename = "media:group")]
    group: Option<MediaGroup>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaGroup {
    #[serde(rename = "media:description")]
    description: Option<String>,
    #[serde(rename = "media:thumbnail")]
    thumbnail: Option<MediaThumbnail>,
}

#[derive(Debug, Deserialize)]
struct MediaThumbnail {
    #[serde(rename = "@url")]
    url: Option<String>,
}

/// Parse a feed document into canonical items. The root element decides the
/// grammar: `rss` or `feed`; any other root is an unrecoverable format
/// error.
pub fn parse_feed(xml: &str) -> Result<Vec<ContentMetadata>> {
    let t0 = std::time::Instant::now();

    let items = match sniff_root(xml)? {
        FeedRoot::Rss => parse_rss(xml)?,
        FeedRoot::Atom => parse_atom(xml)?,
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("collect_parse_ms").record(ms);
    counter!("collect_events_total").increment(items.len() as u64);
    Ok(items)
}

fn sniff_root(xml: &str) -> Result<FeedRoot> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                return match e.local_name().as_ref() {
                    b"rss" => Ok(FeedRoot::Rss),
                    b"feed" => Ok(FeedRoot::Atom),
                    other => bail!(
                        "unrecognized feed root element: {}",
                        String::from_utf8_lossy(other)
                    ),
                };
            }
            Ok(Event::Eof) => bail!("feed document has no root element"),
            Ok(_) => continue,
            Err(e) => return Err(e).context("scanning feed for root element"),
        }
    }
}

fn parse_rss(xml: &str) -> Result<Vec<ContentMetadata>> {
    let rss: Rss = from_str(xml).context("parsing rss feed xml")?;
    let items = rss
        .channel
        .items
        .into_iter()
        .map(|it| {
            let published_at = it
                .pub_date
                .as_deref()
                .and_then(|d| parse_date(d).ok())
                .unwrap_or_else(Utc::now);
            ContentMetadata {
                title: it.title.unwrap_or_default(),
                description: it.description.unwrap_or_default(),
                url: it.link.unwrap_or_default(),
                // RSS images usually live inside description HTML; not extracted.
                image_url: String::new(),
                published_at,
            }
        })
        .collect();
    Ok(items)
}

fn parse_atom(xml: &str) -> Result<Vec<ContentMetadata>> {
    let feed: AtomFeed = from_str(xml).context("parsing atom feed xml")?;
    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let published_at = entry
                .published
                .as_deref()
                .and_then(|d| parse_date(d).ok())
                .or_else(|| entry.updated.as_deref().and_then(|d| parse_date(d).ok()))
                .unwrap_or_else(Utc::now);

            let mut description = entry.summary.unwrap_or_default();
            let mut image_url = String::new();
            if let Some(group) = entry.group {
                if let Some(d) = group.description.filter(|d| !d.is_empty()) {
                    description = d;
                }
                if let Some(u) = group.thumbnail.and_then(|t| t.url).filter(|u| !u.is_empty()) {
                    image_url = u;
                }
            }

            ContentMetadata {
                title: entry.title.unwrap_or_default(),
                description,
                url: entry
                    .links
                    .first()
                    .and_then(|l| l.href.clone())
                    .unwrap_or_default(),
                image_url,
                published_at,
            }
        })
        .collect();
    Ok(entries)
}

// RFC 1123 with a literal GMT zone, e.g. "Fri, 27 Oct 2023 10:00:00 GMT".
static RFC1123_GMT: Lazy<OwnedFormatItem> = Lazy::new(|| {
    format_description::parse_owned::<2>(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT",
    )
    .expect("rfc1123 gmt format description")
});

// Fixed "Day, DD Mon YYYY HH:MM:SS +-HHMM" pattern.
static RFC1123_NUMERIC: Lazy<OwnedFormatItem> = Lazy::new(|| {
    format_description::parse_owned::<2>(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]",
    )
    .expect("rfc1123 numeric-zone format description")
});

/// Parse a feed timestamp, trying the recognized formats in order; the first
/// successful parse wins. Callers fall back to the current time on error —
/// a deliberate lossy default, not a fatal condition.
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    let s = raw.trim();

    let parsed = OffsetDateTime::parse(s, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(s, &Rfc3339))
        .or_else(|_| PrimitiveDateTime::parse(s, &*RFC1123_GMT).map(|dt| dt.assume_utc()))
        .or_else(|_| OffsetDateTime::parse(s, &*RFC1123_NUMERIC));

    let dt = match parsed {
        Ok(dt) => dt,
        Err(_) => bail!("unrecognized date format: {s:?}"),
    };

    DateTime::<Utc>::from_timestamp(dt.unix_timestamp(), dt.nanosecond())
        .with_context(|| format!("timestamp out of range: {s:?}"))
}
