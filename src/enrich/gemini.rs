// src/enrich/gemini.rs
use std::time::Duration;

use anyhow::{anyhow, ensure, Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{decode_enrichment, Enricher, Enrichment};

pub const DEFAULT_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent";

/// Gemini-backed enrichment client. Authenticates with a static credential
/// passed as a `key` query parameter; an empty credential still constructs
/// (calls fail downstream instead).
pub struct GeminiEnricher {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiEnricher {
    pub fn new(api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        if api_key.is_empty() {
            warn!("gemini api key is empty; enrichment calls will fail");
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("content-collector/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key,
        }
    }

    /// Point the client at a different backend URL (tests, proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

fn build_prompt(title: &str, description: &str) -> String {
    format!(
        "Analyze the following content metadata (Title and Description) for a learning platform.\n\
         \n\
         Title: {title}\n\
         Description: {description}\n\
         \n\
         Please provide a JSON response with the following fields:\n\
         1. \"summary\": A concise 2-sentence summary of what this content teaches.\n\
         2. \"tags\": A list of 3-5 relevant technical tags (e.g., \"Go\", \"React\", \"Database\").\n\
         3. \"difficulty\": One of \"Beginner\", \"Intermediate\", \"Advanced\".\n\
         \n\
         Return ONLY the JSON."
    )
}

#[async_trait]
impl Enricher for GeminiEnricher {
    async fn enrich(&self, title: &str, description: &str) -> Result<Enrichment> {
        let url = format!("{}?key={}", self.endpoint, self.api_key);
        let prompt = build_prompt(title, description);
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: &prompt }],
            }],
        };

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("sending enrichment request")?;
        ensure!(
            resp.status() == StatusCode::OK,
            "enrichment backend returned status {}",
            resp.status()
        );

        let decoded: GenerateResponse = resp
            .json()
            .await
            .context("decoding enrichment response body")?;
        let text = decoded
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| anyhow!("enrichment backend produced no content"))?;

        decode_enrichment(text)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_inputs_and_schema() {
        let p = build_prompt("Intro to Rust", "Ownership explained");
        assert!(p.contains("Title: Intro to Rust"));
        assert!(p.contains("Description: Ownership explained"));
        assert!(p.contains("\"summary\""));
        assert!(p.contains("3-5"));
        assert!(p.contains("\"Beginner\", \"Intermediate\", \"Advanced\""));
    }
}
