// src/config/pipeline.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

fn default_batch_size() -> usize {
    crate::collect::DEFAULT_BATCH_SIZE
}
fn default_enrich_pause_ms() -> u64 {
    1_000
}
fn default_warmup_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// "ENV" means: read from GEMINI_API_KEY
    #[serde(default)]
    pub api_key: String,
    /// Unprocessed items pulled per enrichment pass.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Fixed pause between successive enrichment calls.
    #[serde(default = "default_enrich_pause_ms")]
    pub enrich_pause_ms: u64,
    /// Delay before the first collection run after process start.
    #[serde(default = "default_warmup_secs")]
    pub warmup_secs: u64,
    /// Override of the enrichment backend URL (tests, proxies).
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_key: "ENV".to_string(),
            batch_size: default_batch_size(),
            enrich_pause_ms: default_enrich_pause_ms(),
            warmup_secs: default_warmup_secs(),
            endpoint: None,
        }
    }
}

impl PipelineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let mut cfg: PipelineConfig = serde_json::from_str(&data)?;
        cfg.resolve();
        Ok(cfg)
    }

    /// Load from a file if present, else fall back to defaults. An empty
    /// resolved key is allowed; the enrichment client warns about it.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let mut cfg = match Self::load_from_file(path) {
            Ok(cfg) => return cfg,
            Err(_) => Self::default(),
        };
        cfg.resolve();
        cfg
    }

    fn resolve(&mut self) {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
        }
        if self.batch_size == 0 {
            self.batch_size = default_batch_size();
        }
    }
}
