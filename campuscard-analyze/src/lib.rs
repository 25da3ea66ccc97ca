//! campuscard-analyze: descriptive statistics over a fetched transaction batch.

pub mod analysis;
pub mod category_rules;
pub mod filter;
pub mod report;

pub use analysis::{Analysis, MerchantGroup, UNKNOWN_MERCHANT};
pub use category_rules::{Category, CategoryRules};
pub use report::{render_summary, write_report, ReportFiles};

use anyhow::Result;
use campuscard_core::load_batch;
use chrono::NaiveDate;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub spending_only: bool,
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
}

/// Load `path`, apply the filters and compute the statistics.
///
/// Fails (before anything is written) if the file is missing or not a batch.
pub fn analyze_file(path: &Path, opts: &AnalyzeOptions) -> Result<Analysis> {
    let mut txns = load_batch(path)?;
    tracing::info!(path = %path.display(), records = txns.len(), "loaded transactions");

    if opts.spending_only {
        let (kept, dropped) = filter::spending_only(txns);
        tracing::info!(dropped, "filtered out non-spending records");
        txns = kept;
    }
    txns = filter::within_dates(txns, opts.since, opts.until)?;

    let rules = CategoryRules::builtin()?;
    Ok(Analysis::compute(&txns, &rules))
}
