//! Aggregate statistics over a transaction batch.

use campuscard_core::CardTransaction;
use chrono::{Datelike, NaiveDate, Timelike};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::category_rules::{Category, CategoryRules};

/// Group name for records without a merchant.
pub const UNKNOWN_MERCHANT: &str = "(unknown)";

pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    total: f64,
    count: usize,
}

impl Tally {
    fn add(&mut self, amount: f64) {
        self.total += amount;
        self.count += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MerchantGroup {
    pub merchant: String,
    /// From the name alone; unmatched names are `other` even when some of
    /// their records land in `top-up` in `by_category`.
    pub category: Category,
    pub total: f64,
    pub count: usize,
    pub average: f64,
    /// Card balance on the last record (file order) that carried one.
    pub last_balance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGroup {
    pub category: Category,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotal {
    pub period: String,
    pub total: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HourTotal {
    pub hour: u32,
    pub total: f64,
    pub count: usize,
}

/// Totals per weekday (rows, Monday first) and hour of day (columns).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub cells: [[f64; 24]; 7],
}

impl Default for Heatmap {
    fn default() -> Self {
        Self { cells: [[0.0; 24]; 7] }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub count: usize,
    /// Signed sum of every amount; records without one count as 0.
    pub total: f64,
    pub average: f64,
    pub inflow: f64,
    pub outflow: f64,
    pub first_day: Option<NaiveDate>,
    pub last_day: Option<NaiveDate>,
    pub days_spanned: u32,
    pub average_daily: f64,
    /// Records with no usable amount.
    pub missing_amount: usize,
    /// Records with no usable timestamp; left out of every time grouping.
    pub undated: usize,
    pub by_merchant: Vec<MerchantGroup>,
    pub by_category: Vec<CategoryGroup>,
    pub by_day: Vec<PeriodTotal>,
    pub by_week: Vec<PeriodTotal>,
    pub by_month: Vec<PeriodTotal>,
    pub by_hour: Vec<HourTotal>,
    pub heatmap: Heatmap,
    pub peak_hour: Option<HourTotal>,
}

impl Analysis {
    pub fn compute(txns: &[CardTransaction], rules: &CategoryRules) -> Self {
        let mut total = 0.0;
        let mut inflow = 0.0;
        let mut outflow = 0.0;
        let mut missing_amount = 0;
        let mut undated = 0;

        let mut merchants: HashMap<String, (Tally, Category, Option<f64>)> = HashMap::new();
        let mut categories: BTreeMap<Category, Tally> = BTreeMap::new();
        let mut days: BTreeMap<NaiveDate, Tally> = BTreeMap::new();
        let mut weeks: BTreeMap<(i32, u32), Tally> = BTreeMap::new();
        let mut months: BTreeMap<(i32, u32), Tally> = BTreeMap::new();
        let mut hours: BTreeMap<u32, Tally> = BTreeMap::new();
        let mut heatmap = Heatmap::default();

        for txn in txns {
            let amount = match txn.amount() {
                Some(a) => a,
                None => {
                    missing_amount += 1;
                    0.0
                }
            };
            total += amount;
            if amount > 0.0 {
                inflow += amount;
            } else {
                outflow -= amount;
            }

            let merchant = txn.merchant().unwrap_or(UNKNOWN_MERCHANT);
            let entry = merchants.entry(merchant.to_string()).or_insert_with(|| {
                // Name only; its records may still split across categories.
                (Tally::default(), rules.categorize(txn.merchant(), None), None)
            });
            entry.0.add(amount);
            if let Some(b) = txn.balance() {
                entry.2 = Some(b);
            }
            let category = rules.categorize(txn.merchant(), txn.amount());
            categories.entry(category).or_default().add(amount);

            let Some(at) = txn.occurred_at() else {
                undated += 1;
                continue;
            };
            let day = at.date();
            days.entry(day).or_default().add(amount);
            let iso = day.iso_week();
            weeks.entry((iso.year(), iso.week())).or_default().add(amount);
            months.entry((day.year(), day.month())).or_default().add(amount);
            hours.entry(at.hour()).or_default().add(amount);
            heatmap.cells[day.weekday().num_days_from_monday() as usize][at.hour() as usize] += amount;
        }

        let count = txns.len();
        let first_day = days.keys().next().copied();
        let last_day = days.keys().next_back().copied();
        let days_spanned = match (first_day, last_day) {
            (Some(a), Some(b)) => (b - a).num_days() as u32 + 1,
            _ => 0,
        };

        let mut by_merchant: Vec<MerchantGroup> = merchants
            .into_iter()
            .map(|(merchant, (t, category, last_balance))| MerchantGroup {
                merchant,
                category,
                total: t.total,
                count: t.count,
                average: t.total / t.count as f64,
                last_balance,
            })
            .collect();
        by_merchant.sort_by(|a, b| {
            b.total
                .abs()
                .total_cmp(&a.total.abs())
                .then_with(|| a.merchant.cmp(&b.merchant))
        });

        let mut by_category: Vec<CategoryGroup> = categories
            .into_iter()
            .map(|(category, t)| CategoryGroup {
                category,
                total: t.total,
                count: t.count,
            })
            .collect();
        by_category.sort_by(|a, b| {
            b.total
                .abs()
                .total_cmp(&a.total.abs())
                .then_with(|| a.category.cmp(&b.category))
        });

        let by_hour: Vec<HourTotal> = hours
            .into_iter()
            .map(|(hour, t)| HourTotal {
                hour,
                total: t.total,
                count: t.count,
            })
            .collect();

        // Earliest hour wins ties: only a strictly larger total replaces it.
        let peak_hour = by_hour.iter().fold(None::<HourTotal>, |best, h| match best {
            Some(b) if b.total.abs() >= h.total.abs() => Some(b),
            _ => Some(*h),
        });

        Self {
            count,
            total,
            average: if count == 0 { 0.0 } else { total / count as f64 },
            inflow,
            outflow,
            first_day,
            last_day,
            days_spanned,
            average_daily: if days_spanned == 0 { 0.0 } else { total / days_spanned as f64 },
            missing_amount,
            undated,
            by_merchant,
            by_category,
            by_day: periods(days, |d| d.format("%Y-%m-%d").to_string()),
            by_week: periods(weeks, |(y, w)| format!("{y}-W{w:02}")),
            by_month: periods(months, |(y, m)| format!("{y}-{m:02}")),
            by_hour,
            heatmap,
            peak_hour,
        }
    }
}

fn periods<K: Ord>(map: BTreeMap<K, Tally>, label: impl Fn(K) -> String) -> Vec<PeriodTotal> {
    map.into_iter()
        .map(|(k, t)| PeriodTotal {
            period: label(k),
            total: t.total,
            count: t.count,
        })
        .collect()
}
