use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$CAMPUSCARD_HOME`, else `~/.campuscard`.
pub fn campuscard_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("CAMPUSCARD_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".campuscard"))
}

pub fn ensure_campuscard_home() -> Result<PathBuf> {
    let dir = campuscard_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
