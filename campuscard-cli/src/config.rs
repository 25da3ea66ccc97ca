use anyhow::{Context, Result};
use campuscard_analyze::report::{DEFAULT_OUTPUT_DIR, DEFAULT_TOP};
use campuscard_fetch::paginate::{DEFAULT_MAX_RETRIES, DEFAULT_ROWS};
use campuscard_fetch::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::ensure_campuscard_home;

/// `~/.campuscard/config.toml`. Session cookies never go in here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub portal: PortalSection,
    #[serde(default)]
    pub analyze: AnalyzeSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalSection {
    pub base_url: String,
    /// Page size sent as `rows`.
    pub rows: u32,
    /// Seconds between page requests; also the retry backoff unit.
    pub delay_secs: f64,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for PortalSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            rows: DEFAULT_ROWS,
            delay_secs: 1.0,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeSection {
    pub output_dir: String,
    pub top: usize,
}

impl Default for AnalyzeSection {
    fn default() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            top: DEFAULT_TOP,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_campuscard_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

pub fn render_config(cfg: &Config) -> Result<String> {
    toml::to_string_pretty(cfg).context("serialize config")
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    fs::write(&p, render_config(&Config::default())?).with_context(|| format!("write {}", p.display()))?;
    println!("Wrote {}", p.display());
    Ok(())
}
