// src/config/sources.rs
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const ENV_PATH: &str = "COLLECTOR_SOURCES_PATH";

/// A source definition seeded into the store at startup. Mirrors the admin
/// create operation, which lives outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct SeedSource {
    pub name: String,
    pub kind: String,
    pub url: String,
}

/// Load seed sources from an explicit path. Supports TOML or JSON formats.
pub fn load_sources_from(path: &Path) -> Result<Vec<SeedSource>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, ext.as_str())
}

/// Load seed sources using env var + fallbacks:
/// 1) $COLLECTOR_SOURCES_PATH
/// 2) config/sources.toml
/// 3) config/sources.json
pub fn load_sources_default() -> Result<Vec<SeedSource>> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_sources_from(&pb);
        } else {
            return Err(anyhow!("COLLECTOR_SOURCES_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/sources.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/sources.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok(Vec::new())
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<SeedSource>> {
    let try_toml = hint_ext == "toml" || s.contains("[[sources]]");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported sources format"))
}

fn parse_toml(s: &str) -> Result<Vec<SeedSource>> {
    #[derive(serde::Deserialize)]
    struct TomlSources {
        sources: Vec<SeedSource>,
    }
    let v: TomlSources = toml::from_str(s)?;
    Ok(v.sources)
}

fn parse_json(s: &str) -> Result<Vec<SeedSource>> {
    let v: Vec<SeedSource> = serde_json::from_str(s)?;
    Ok(v)
}
