use campuscard_analyze::{analyze_file, write_report, AnalyzeOptions};
use campuscard_core::load_batch;
use std::collections::HashMap;
use std::path::Path;
use tempfile::tempdir;

const PORTAL_SAMPLE: &str = r#"[
  {"OCCTIME": "2024-11-20 12:01:33", "MERCNAME": "学一食堂  ", "TRANAMT": -12.5, "CARDBAL": 87.5},
  {"OCCTIME": "2024-11-20 08:10:00", "MERCNAME": "图书馆打印", "TRANAMT": -0.4, "CARDBAL": 100.0},
  {"OCCTIME": "2024-11-19 21:30:00", "MERCNAME": "45楼浴室", "TRANAMT": -3.25, "CARDBAL": 100.4},
  {"OCCTIME": "2024-11-19 12:15:00", "MERCNAME": "学一食堂", "TRANAMT": -9.0, "CARDBAL": 103.65},
  {"OCCTIME": "2024-11-18 10:00:00", "MERCNAME": "圈存机", "TRANAMT": 100.0, "CARDBAL": 112.65},
  {"OCCTIME": "2024-11-18 11:50:00", "TRANAMT": "-2.5"},
  {"MERCNAME": "燕园超市", "TRANAMT": -6.0}
]"#;

fn write(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let p = dir.join(name);
    std::fs::write(&p, body).unwrap();
    p
}

#[test]
fn test_total_is_sum_of_amounts() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "batch.json", PORTAL_SAMPLE);

    let a = analyze_file(&path, &AnalyzeOptions::default()).unwrap();
    let expected: f64 = load_batch(&path).unwrap().iter().filter_map(|t| t.amount()).sum();
    assert!((a.total - expected).abs() < 1e-9);
    assert_eq!(a.count, 7);
}

#[test]
fn test_merchant_groups_partition_records() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "batch.json", PORTAL_SAMPLE);
    let a = analyze_file(&path, &AnalyzeOptions::default()).unwrap();

    let sizes: usize = a.by_merchant.iter().map(|m| m.count).sum();
    assert_eq!(sizes, a.count);

    let mut names: HashMap<&str, usize> = HashMap::new();
    for m in &a.by_merchant {
        *names.entry(m.merchant.as_str()).or_default() += 1;
    }
    assert!(names.values().all(|n| *n == 1), "duplicate merchant group");

    // Trailing spaces do not split a merchant.
    let canteen = a.by_merchant.iter().find(|m| m.merchant == "学一食堂").unwrap();
    assert_eq!(canteen.count, 2);
    assert_eq!(canteen.total, -21.5);

    let cat_sizes: usize = a.by_category.iter().map(|c| c.count).sum();
    assert_eq!(cat_sizes, a.count);
}

#[test]
fn test_spending_only_reports_positive_spend() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "batch.json", PORTAL_SAMPLE);
    let opts = AnalyzeOptions {
        spending_only: true,
        ..Default::default()
    };
    let a = analyze_file(&path, &opts).unwrap();
    assert_eq!(a.count, 6);
    assert!((a.total - 33.65).abs() < 1e-9);
    assert_eq!(a.inflow, a.total);
}

#[test]
fn test_worked_example_report_files() {
    let dir = tempdir().unwrap();
    let path = write(
        dir.path(),
        "example.json",
        r#"[{"amount": 12.5, "merchant": "Canteen1"}, {"amount": 7.0, "merchant": "Canteen1"}, {"amount": 3.0, "merchant": "Library"}]"#,
    );
    let a = analyze_file(&path, &AnalyzeOptions::default()).unwrap();
    assert_eq!(a.total, 22.5);

    let grouped: HashMap<_, _> = a.by_merchant.iter().map(|m| (m.merchant.as_str(), m.total)).collect();
    assert_eq!(grouped, HashMap::from([("Canteen1", 19.5), ("Library", 3.0)]));

    let out = dir.path().join("report");
    let files = write_report(&out, &a, 5).unwrap();
    assert_eq!(files.files.len(), 7);

    let summary = std::fs::read_to_string(out.join("summary.txt")).unwrap();
    assert!(summary.contains("Total Amount: 22.50 CNY"));

    let merchants = std::fs::read_to_string(out.join("merchant_spending.csv")).unwrap();
    let mut lines = merchants.lines();
    assert_eq!(lines.next(), Some("merchant,category,total,count,average,last_balance"));
    assert_eq!(lines.next(), Some("Canteen1,dining,19.5,2,9.75,"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("report.json")).unwrap()).unwrap();
    assert_eq!(report["total"], 22.5);

    let heatmap = std::fs::read_to_string(out.join("spending_heatmap.csv")).unwrap();
    assert_eq!(heatmap.lines().count(), 8);
}

#[test]
fn test_malformed_input_fails_before_report() {
    let dir = tempdir().unwrap();
    let path = write(dir.path(), "broken.json", "[{\"amount\": 1.0,");
    assert!(analyze_file(&path, &AnalyzeOptions::default()).is_err());

    let missing = dir.path().join("missing.json");
    assert!(analyze_file(&missing, &AnalyzeOptions::default()).is_err());
}
