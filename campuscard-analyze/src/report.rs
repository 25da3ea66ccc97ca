//! Human-readable summary and report files.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::{Analysis, WEEKDAYS};

pub const CURRENCY: &str = "CNY";
pub const DEFAULT_TOP: usize = 5;
pub const DEFAULT_OUTPUT_DIR: &str = "transaction_analysis";

pub fn render_summary(a: &Analysis, top: usize) -> String {
    let mut s = Vec::new();
    s.push("Transaction Analysis Summary".to_string());
    s.push("=".repeat(30));

    match (a.first_day, a.last_day) {
        (Some(first), Some(last)) => s.push(format!("\nDate Range: {first} to {last}")),
        _ => s.push("\nDate Range: n/a (no dated records)".to_string()),
    }
    s.push(format!("Total Amount: {:.2} {CURRENCY}", a.total));
    s.push(format!(
        "Inflow: {:.2} {CURRENCY} / Outflow: {:.2} {CURRENCY}",
        a.inflow, a.outflow
    ));
    if a.days_spanned > 0 {
        s.push(format!(
            "Average Daily Amount: {:.2} {CURRENCY} over {} days",
            a.average_daily, a.days_spanned
        ));
    }
    s.push(format!("Average Transaction: {:.2} {CURRENCY}", a.average));
    s.push(format!("Total Transactions: {}", a.count));
    if a.missing_amount > 0 {
        s.push(format!("Records without an amount: {}", a.missing_amount));
    }
    if a.undated > 0 {
        s.push(format!("Records without a timestamp: {}", a.undated));
    }

    if !a.by_merchant.is_empty() {
        s.push(format!("\nTop {} Merchants by Amount:", top.min(a.by_merchant.len())));
        for m in a.by_merchant.iter().take(top) {
            s.push(format!(
                "- {}: {:.2} {CURRENCY} ({} transactions, avg {:.2} {CURRENCY}/transaction)",
                m.merchant, m.total, m.count, m.average
            ));
        }
    }

    if !a.by_category.is_empty() {
        s.push("\nBy Category:".to_string());
        for c in &a.by_category {
            s.push(format!(
                "- {}: {:.2} {CURRENCY} ({} transactions)",
                c.category, c.total, c.count
            ));
        }
    }

    if let Some(peak) = a.peak_hour {
        s.push(format!(
            "\nPeak Spending Hour: {:02}:00 (Total: {:.2} {CURRENCY})",
            peak.hour, peak.total
        ));
    }

    s.join("\n")
}

/// Paths written by `write_report`.
#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Write summary.txt, report.json and the CSV breakdowns into `dir`.
pub fn write_report(dir: &Path, a: &Analysis, top: usize) -> Result<ReportFiles> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let mut files = Vec::new();

    let summary = dir.join("summary.txt");
    fs::write(&summary, render_summary(a, top) + "\n")
        .with_context(|| format!("write {}", summary.display()))?;
    files.push(summary);

    let json = dir.join("report.json");
    let body = serde_json::to_string_pretty(a).context("serialize analysis")?;
    fs::write(&json, body + "\n").with_context(|| format!("write {}", json.display()))?;
    files.push(json);

    files.push(write_csv(dir, "daily_spending.csv", &a.by_day)?);
    files.push(write_csv(dir, "merchant_spending.csv", &a.by_merchant)?);
    files.push(write_csv(dir, "hourly_spending.csv", &a.by_hour)?);
    files.push(write_csv(dir, "category_spending.csv", &a.by_category)?);
    files.push(write_heatmap(dir, a)?);

    tracing::info!(dir = %dir.display(), files = files.len(), "report written");
    Ok(ReportFiles {
        dir: dir.to_path_buf(),
        files,
    })
}

fn write_csv<T: Serialize>(dir: &Path, name: &str, rows: &[T]) -> Result<PathBuf> {
    let path = dir.join(name);
    let mut w = csv::Writer::from_path(&path).with_context(|| format!("create {}", path.display()))?;
    for row in rows {
        w.serialize(row).with_context(|| format!("write {}", path.display()))?;
    }
    w.flush()?;
    Ok(path)
}

fn write_heatmap(dir: &Path, a: &Analysis) -> Result<PathBuf> {
    let path = dir.join("spending_heatmap.csv");
    let mut w = csv::Writer::from_path(&path).with_context(|| format!("create {}", path.display()))?;

    let mut header = vec!["day".to_string()];
    header.extend((0..24).map(|h| h.to_string()));
    w.write_record(&header)?;

    for (day, row) in WEEKDAYS.iter().zip(a.heatmap.cells.iter()) {
        let mut record = vec![day.to_string()];
        record.extend(row.iter().map(|v| format!("{v:.2}")));
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category_rules::CategoryRules;
    use campuscard_core::parse_batch;

    fn analysis(json: &str) -> Analysis {
        Analysis::compute(&parse_batch(json).unwrap(), &CategoryRules::builtin().unwrap())
    }

    #[test]
    fn test_summary_lines() {
        let a = analysis(
            r#"[{"MERCNAME":"Canteen1","TRANAMT":12.5,"OCCTIME":"2024-11-18 12:10:00"},
                {"MERCNAME":"Canteen1","TRANAMT":7.0,"OCCTIME":"2024-11-19 12:40:00"},
                {"MERCNAME":"Library","TRANAMT":3.0,"OCCTIME":"2024-11-19 09:00:00"}]"#,
        );
        let s = render_summary(&a, 5);
        assert!(s.starts_with("Transaction Analysis Summary\n=============================="));
        assert!(s.contains("Date Range: 2024-11-18 to 2024-11-19"));
        assert!(s.contains("Total Amount: 22.50 CNY"));
        assert!(s.contains("Average Daily Amount: 11.25 CNY over 2 days"));
        assert!(s.contains("Top 2 Merchants by Amount:"));
        assert!(s.contains("- Canteen1: 19.50 CNY (2 transactions, avg 9.75 CNY/transaction)"));
        assert!(s.contains("Peak Spending Hour: 12:00 (Total: 19.50 CNY)"));
    }

    #[test]
    fn test_summary_respects_top() {
        let a = analysis(r#"[{"merchant":"A","amount":1},{"merchant":"B","amount":2},{"merchant":"C","amount":3}]"#);
        let s = render_summary(&a, 1);
        assert!(s.contains("Top 1 Merchants"));
        assert!(s.contains("- C: 3.00"));
        assert!(!s.contains("- A: 1.00"));
    }

    #[test]
    fn test_empty_summary() {
        let s = render_summary(&analysis("[]"), 5);
        assert!(s.contains("Date Range: n/a"));
        assert!(s.contains("Total Transactions: 0"));
        assert!(!s.contains("Peak Spending Hour"));
    }
}
