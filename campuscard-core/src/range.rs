//! Query date range and the file name it maps to.

use anyhow::{bail, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Days covered when no start date is given.
pub const DEFAULT_LOOKBACK_DAYS: u64 = 60;

/// Inclusive span of dates sent to the portal as `sdate` / `edate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl QueryRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            bail!("start date {start} is after end date {end}");
        }
        Ok(Self { start, end })
    }

    /// Fill in missing bounds: end defaults to `today`, start to
    /// `DEFAULT_LOOKBACK_DAYS` before the end.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> Result<Self> {
        let end = end.unwrap_or(today);
        let start = match start {
            Some(s) => s,
            None => end
                .checked_sub_days(Days::new(DEFAULT_LOOKBACK_DAYS))
                .unwrap_or(NaiveDate::MIN),
        };
        Self::new(start, end)
    }

    pub fn sdate(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn edate(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }

    /// Compact tag used in file names: `YYYYMMDD-YYYYMMDD`.
    pub fn file_tag(&self) -> String {
        format!("{}-{}", self.start.format("%Y%m%d"), self.end.format("%Y%m%d"))
    }
}

/// Prefix shared by every fetch output file.
pub const OUTPUT_PREFIX: &str = "card_transactions_";

/// `card_transactions_<account>_<range>.json`
pub fn output_file_name(account: &str, range: &QueryRange) -> String {
    format!("{OUTPUT_PREFIX}{}_{}.json", account.trim(), range.file_tag())
}
