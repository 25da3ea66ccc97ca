//! Time utilities: the portal lives in China Standard Time.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Zone the portal reports and filters dates in (Asia/Shanghai).
pub fn portal_tz() -> Tz {
    chrono_tz::Asia::Shanghai
}

/// Calendar date in the portal's zone at the given instant.
pub fn portal_date_at(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&portal_tz()).date_naive()
}

/// Today's date as the portal sees it.
pub fn portal_today() -> NaiveDate {
    portal_date_at(Utc::now())
}

/// Parse a CLI date like "2024-11-01".
pub fn parse_cli_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("invalid date format: {s}. Use YYYY-MM-DD"))
}
