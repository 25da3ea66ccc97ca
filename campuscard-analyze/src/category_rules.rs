//! Deterministic category rules for campus-card merchant / terminal names.
//!
//! Terminal names are short and mostly Chinese ("学一食堂", "浴室2号机"),
//! so a keyword regex per category covers nearly everything.

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Dining,
    Groceries,
    Bathing,
    Laundry,
    Utilities,
    Printing,
    Library,
    Medical,
    Transport,
    TopUp,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Dining => "dining",
            Category::Groceries => "groceries",
            Category::Bathing => "bathing",
            Category::Laundry => "laundry",
            Category::Utilities => "utilities",
            Category::Printing => "printing",
            Category::Library => "library",
            Category::Medical => "medical",
            Category::Transport => "transport",
            Category::TopUp => "top-up",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Checked in order; the first match wins.
const RULES: &[(Category, &str)] = &[
    (Category::TopUp, r"充值|圈存|补助|补贴|top.?up|recharge|deposit"),
    (Category::Bathing, r"浴室|淋浴|洗浴|shower|bath"),
    (Category::Laundry, r"洗衣|laundry"),
    (Category::Groceries, r"超市|商店|便利|水果|小卖|market|store|shop|grocery"),
    (Category::Dining, r"食堂|餐厅|餐饮|饭|面包|咖啡|茶|canteen|cafeteria|dining|restaurant|cafe|coffee|bakery"),
    (Category::Utilities, r"电费|水费|网费|热水|开水|水控|electric|utility|water"),
    (Category::Printing, r"打印|复印|文印|print|copy"),
    (Category::Library, r"图书|library"),
    (Category::Medical, r"医院|校医|医务|药|hospital|clinic|pharmacy|medical"),
    (Category::Transport, r"班车|校车|交通|停车|bus|shuttle|bike|parking"),
];

/// Compiled keyword rules.
pub struct CategoryRules {
    rules: Vec<(Category, Regex)>,
}

impl CategoryRules {
    pub fn builtin() -> Result<Self> {
        let rules = RULES
            .iter()
            .map(|(cat, pat)| Ok((*cat, Regex::new(&format!("(?i){pat}"))?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Categorize by merchant name; a positive amount with no matching name
    /// is a top-up (the portal records deposits as positive).
    pub fn categorize(&self, merchant: Option<&str>, amount: Option<f64>) -> Category {
        if let Some(name) = merchant {
            if let Some((cat, _)) = self.rules.iter().find(|(_, re)| re.is_match(name)) {
                return *cat;
            }
        }
        match amount {
            Some(a) if a > 0.0 => Category::TopUp,
            _ => Category::Other,
        }
    }
}
