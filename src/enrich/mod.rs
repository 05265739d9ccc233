// src/enrich/mod.rs
//! Enrichment: AI-generated summary/tags/difficulty for collected items.
//! The backend is an opaque prompt-in/structured-result-out service behind
//! the `Enricher` trait; `gemini` holds the production client.

pub mod gemini;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Upper bound on tags kept from a backend response.
pub const MAX_TAGS: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

/// Decoded result of one enrichment call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Enrichment {
    pub summary: String,
    pub tags: Vec<String>,
    pub difficulty: Difficulty,
}

#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, title: &str, description: &str) -> Result<Enrichment>;
    fn name(&self) -> &'static str;
}

/// Decode the machine-readable part of a backend response. The backend is
/// known to sometimes wrap its JSON in a markdown code fence, so the fence
/// is trimmed before structural decoding. Decode failure is a hard error.
pub fn decode_enrichment(raw: &str) -> Result<Enrichment> {
    let body = strip_code_fence(raw);
    let mut result: Enrichment =
        serde_json::from_str(body).context("decoding enrichment result json")?;
    if result.tags.len() > MAX_TAGS {
        result.tags.truncate(MAX_TAGS);
    }
    Ok(result)
}

/// Trim a leading/trailing code-fence marker, including a language-tagged
/// opening fence.
fn strip_code_fence(raw: &str) -> &str {
    let s = raw.trim();
    let s = s.strip_prefix("```json").unwrap_or(s);
    let s = s.strip_prefix("```").unwrap_or(s);
    let s = s.strip_suffix("```").unwrap_or(s);
    s.trim()
}
