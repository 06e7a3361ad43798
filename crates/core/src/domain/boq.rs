use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where a line's man-day figure came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffortSource {
    /// Matched one of the explicit extraction rules, named by `rule`.
    Explicit { rule: String },
    /// Nothing explicit; a keyword in the description supplied the default.
    KeywordDefault { keyword: String },
    /// Neither; the line is a non-costed placeholder.
    Unresolved,
}

/// One billable line as read from free text, before costing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoqLine {
    pub description: String,
    pub man_days: u32,
    pub effort_source: EffortSource,
}

impl BoqLine {
    pub fn is_costed(&self) -> bool {
        self.man_days > 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePricing {
    pub rate_usd: Decimal,
    pub rate_inr: Decimal,
    pub total_inr: Decimal,
}

/// A costed (or placeholder) line. `pricing` is `None` exactly when
/// `man_days == 0`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoqLineItem {
    pub description: String,
    pub man_days: u32,
    pub pricing: Option<LinePricing>,
}

impl BoqLineItem {
    pub fn total_inr(&self) -> Option<Decimal> {
        self.pricing.as_ref().map(|pricing| pricing.total_inr)
    }
}

/// A short-form service row, before costing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceLine {
    pub description: String,
    pub category: String,
    pub man_days: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceItem {
    pub category: String,
    pub description: String,
    pub man_days: u32,
    pub rate_usd: Decimal,
    pub total_usd: Decimal,
    pub total_inr: Decimal,
}
