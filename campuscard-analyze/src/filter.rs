//! Record selection applied before aggregation.

use anyhow::{bail, Result};
use campuscard_core::CardTransaction;
use chrono::NaiveDate;

/// Keep only charges (negative amounts) and flip them positive, so totals
/// read as money spent. Records without an amount are dropped too.
/// Returns the kept records and how many were dropped.
pub fn spending_only(txns: Vec<CardTransaction>) -> (Vec<CardTransaction>, usize) {
    let before = txns.len();
    let kept: Vec<CardTransaction> = txns
        .into_iter()
        .filter_map(|mut t| match t.amount() {
            Some(a) if a < 0.0 => {
                t.set_amount(-a);
                Some(t)
            }
            _ => None,
        })
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// Keep records whose timestamp falls on `since..=until`. With either bound
/// set, undated records are dropped. An inverted window is an error.
pub fn within_dates(
    txns: Vec<CardTransaction>,
    since: Option<NaiveDate>,
    until: Option<NaiveDate>,
) -> Result<Vec<CardTransaction>> {
    if let (Some(s), Some(u)) = (since, until) {
        if s > u {
            bail!("--since {s} is after --until {u}");
        }
    }
    if since.is_none() && until.is_none() {
        return Ok(txns);
    }
    Ok(txns
        .into_iter()
        .filter(|t| {
            let Some(day) = t.occurred_at().map(|at| at.date()) else {
                return false;
            };
            since.is_none_or(|s| day >= s) && until.is_none_or(|u| day <= u)
        })
        .collect())
}
