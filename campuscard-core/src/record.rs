//! Campus-card transaction records.
//!
//! The portal's schema is undocumented, so a record keeps every field it was
//! given (in the order it was given) and only interprets the handful the
//! analyzer needs. Portal exports look like:
//!
//! {"OCCTIME": "2024-11-20 12:01:33", "MERCNAME": "Canteen1  ", "TRANAMT": -12.5, "CARDBAL": 87.3, ...}

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names checked for the amount, first match wins.
pub const AMOUNT_FIELDS: &[&str] = &["TRANAMT", "amount"];
/// Field names checked for the merchant / terminal name.
pub const MERCHANT_FIELDS: &[&str] = &["MERCNAME", "merchant"];
/// Field names checked for the occurrence time.
pub const TIME_FIELDS: &[&str] = &["OCCTIME", "timestamp", "time"];
/// Field names checked for the running card balance.
pub const BALANCE_FIELDS: &[&str] = &["CARDBAL", "balance"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

/// A single portal transaction, stored as the raw JSON object.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct CardTransaction {
    fields: Map<String, Value>,
}

impl CardTransaction {
    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Build from an arbitrary JSON value; `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Signed amount. Portal charges are negative, top-ups positive.
    pub fn amount(&self) -> Option<f64> {
        self.first_of(AMOUNT_FIELDS).and_then(numeric)
    }

    /// Merchant name with surrounding whitespace removed; blank counts as missing.
    pub fn merchant(&self) -> Option<&str> {
        let raw = self.first_of(MERCHANT_FIELDS)?.as_str()?.trim();
        if raw.is_empty() { None } else { Some(raw) }
    }

    pub fn occurred_at(&self) -> Option<NaiveDateTime> {
        let raw = self.first_of(TIME_FIELDS)?.as_str()?;
        parse_occurred_at(raw)
    }

    pub fn balance(&self) -> Option<f64> {
        self.first_of(BALANCE_FIELDS).and_then(numeric)
    }

    /// Overwrite the amount in whichever alias the record already uses.
    pub fn set_amount(&mut self, amount: f64) {
        let key = AMOUNT_FIELDS
            .iter()
            .find(|k| self.fields.contains_key(**k))
            .copied()
            .unwrap_or(AMOUNT_FIELDS[0]);
        if let Some(n) = serde_json::Number::from_f64(amount) {
            self.fields.insert(key.to_string(), Value::Number(n));
        }
    }

    fn first_of(&self, keys: &[&str]) -> Option<&Value> {
        keys.iter().find_map(|k| self.fields.get(*k))
    }
}

/// Finite number from a JSON number or numeric string. "NaN" and "inf"
/// parse as f64 but count as missing.
fn numeric(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|x| x.is_finite())
}

/// Parse the portal's timestamp formats. A bare date maps to midnight.
pub fn parse_occurred_at(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}
