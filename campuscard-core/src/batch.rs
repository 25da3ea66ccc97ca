//! Reading and writing transaction batch files (a JSON array of records).

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use crate::range::OUTPUT_PREFIX;
use crate::record::CardTransaction;

/// Load a batch written by the fetcher (or anything shaped like one).
pub fn load_batch(path: impl AsRef<Path>) -> Result<Vec<CardTransaction>> {
    let path = path.as_ref();
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse_batch(&s).with_context(|| format!("parse {}", path.display()))
}

pub fn parse_batch(s: &str) -> Result<Vec<CardTransaction>> {
    let value: Value = serde_json::from_str(s).context("not valid JSON")?;
    let Value::Array(items) = value else {
        bail!("expected a JSON array of transactions");
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            CardTransaction::from_value(item)
                .ok_or_else(|| anyhow::anyhow!("record {i} is not a JSON object"))
        })
        .collect()
}

/// Serialize a batch: two-space indent, UTF-8 unescaped, trailing newline.
pub fn render_batch(txns: &[CardTransaction]) -> Result<String> {
    let mut s = serde_json::to_string_pretty(txns).context("serialize transactions")?;
    s.push('\n');
    Ok(s)
}

/// Write the batch via a sibling `.part` file so a failed write leaves no
/// truncated output behind.
pub fn save_batch(path: impl AsRef<Path>, txns: &[CardTransaction]) -> Result<()> {
    let path = path.as_ref();
    let body = render_batch(txns)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".part");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, body).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    tracing::debug!(path = %path.display(), records = txns.len(), "saved batch");
    Ok(())
}

/// Most recent fetch output in `dir`: the file whose range ends last (then
/// starts last), whatever the account. Names without a parsable range tag
/// rank below every tagged file.
pub fn latest_batch_file(dir: impl AsRef<Path>) -> Result<Option<PathBuf>> {
    let dir = dir.as_ref();
    let mut newest: Option<(Option<(NaiveDate, NaiveDate)>, String, PathBuf)> = None;
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !(name.starts_with(OUTPUT_PREFIX) && name.ends_with(".json")) {
            continue;
        }
        let tag = range_of(&name);
        if newest
            .as_ref()
            .is_none_or(|(best_tag, best_name, _)| (tag, &name) > (*best_tag, best_name))
        {
            newest = Some((tag, name, entry.path()));
        }
    }
    Ok(newest.map(|(_, _, p)| p))
}

/// `(end, start)` from `card_transactions_<account>_<start>-<end>.json`.
fn range_of(name: &str) -> Option<(NaiveDate, NaiveDate)> {
    let stem = name.strip_prefix(OUTPUT_PREFIX)?.strip_suffix(".json")?;
    let (_, tag) = stem.rsplit_once('_')?;
    let (start, end) = tag.split_once('-')?;
    let start = NaiveDate::parse_from_str(start, "%Y%m%d").ok()?;
    let end = NaiveDate::parse_from_str(end, "%Y%m%d").ok()?;
    Some((end, start))
}
