//! Line and aggregate costing.
//!
//! Every INR figure is derived from the build's single [`ExchangeRate`] and
//! rounded half-up to paise at each step, so the table, the subtotal and the
//! tax line always reconcile.

pub mod fx;

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::{
    domain::boq::{BoqLine, BoqLineItem, LinePricing, ServiceItem, ServiceLine},
    words::rupees_in_words,
};

use self::fx::ExchangeRate;

pub const WORKSHOP_KEYWORD: &str = "workshop";

/// Half-up to two places, always carrying two places of scale.
pub fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// `$1,234.50`
pub fn format_usd(amount: Decimal) -> String {
    format!("${}", group_thousands(amount))
}

/// `₹1,234.50`
pub fn format_inr(amount: Decimal) -> String {
    format!("₹{}", group_thousands(amount))
}

fn group_thousands(amount: Decimal) -> String {
    let rounded = round_money(amount);
    let text = rounded.abs().to_string();
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}{grouped}.{fraction}")
}

/// Daily USD rates. Workshops outrank categories, categories outrank the
/// default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateCard {
    pub default_usd: Decimal,
    pub workshop_usd: Decimal,
    pub categories: BTreeMap<String, Decimal>,
}

impl RateCard {
    pub fn rate_for(&self, description: &str, category: Option<&str>) -> Decimal {
        if description.to_lowercase().contains(WORKSHOP_KEYWORD) {
            return self.workshop_usd;
        }
        category
            .and_then(|category| self.categories.get(category.trim()))
            .copied()
            .unwrap_or(self.default_usd)
    }
}

impl Default for RateCard {
    fn default() -> Self {
        let categories = [
            ("Migration Services", 400),
            ("Assessment Services", 600),
            ("Development Services", 600),
            ("AI & Advanced Analytics", 600),
            ("Deployment Services", 400),
        ]
        .into_iter()
        .map(|(name, rate)| (name.to_string(), Decimal::from(rate)))
        .collect();

        Self { default_usd: Decimal::from(400), workshop_usd: Decimal::from(600), categories }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTraceStep {
    pub stage: String,
    pub detail: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTrace {
    pub currency: String,
    pub steps: Vec<PricingTraceStep>,
}

impl PricingTrace {
    fn inr() -> Self {
        Self { currency: "INR".to_string(), steps: Vec::new() }
    }

    fn record(&mut self, stage: &str, detail: impl Into<String>, amount: Decimal) {
        self.steps.push(PricingTraceStep { stage: stage.to_string(), detail: detail.into(), amount });
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostSummary {
    pub subtotal_inr: Decimal,
    pub gst_inr: Decimal,
    pub final_inr: Decimal,
    pub final_in_words: String,
}

/// Costed BOQ for one build.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostSheet {
    pub items: Vec<BoqLineItem>,
    pub summary: CostSummary,
    pub trace: PricingTrace,
}

impl CostSheet {
    pub fn costed_items(&self) -> impl Iterator<Item = &BoqLineItem> {
        self.items.iter().filter(|item| item.pricing.is_some())
    }
}

/// Short-form cost table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceQuote {
    pub items: Vec<ServiceItem>,
    pub total_usd: Decimal,
    pub total_inr: Decimal,
}

#[derive(Clone, Debug)]
pub struct CostingEngine {
    rate_card: RateCard,
    gst_rate: Decimal,
}

impl CostingEngine {
    pub fn new(rate_card: RateCard, gst_rate: Decimal) -> Self {
        Self { rate_card, gst_rate }
    }

    pub fn rate_card(&self) -> &RateCard {
        &self.rate_card
    }

    /// `GST @18% (INR)`
    pub fn gst_label(&self) -> String {
        format!("GST @{}% (INR)", (self.gst_rate * Decimal::ONE_HUNDRED).normalize())
    }

    pub fn price_line(&self, line: &BoqLine, fx: &ExchangeRate) -> BoqLineItem {
        let pricing = line.is_costed().then(|| {
            let rate_usd = self.rate_card.rate_for(&line.description, None);
            let rate_inr = round_money(rate_usd * fx.rate);
            let total_inr = round_money(rate_inr * Decimal::from(line.man_days));
            LinePricing { rate_usd, rate_inr, total_inr }
        });

        BoqLineItem { description: line.description.clone(), man_days: line.man_days, pricing }
    }

    pub fn cost_lines(&self, lines: &[BoqLine], fx: &ExchangeRate) -> CostSheet {
        let mut trace = PricingTrace::inr();
        let items: Vec<BoqLineItem> = lines.iter().map(|line| self.price_line(line, fx)).collect();

        for item in &items {
            if let Some(pricing) = &item.pricing {
                trace.record(
                    "line",
                    format!("{}: {} x {}", item.description, item.man_days, pricing.rate_inr),
                    pricing.total_inr,
                );
            }
        }

        let subtotal = items.iter().filter_map(BoqLineItem::total_inr).sum();
        let summary = self.summarize(subtotal);

        trace.record("subtotal", "sum(total_inr) over costed lines", summary.subtotal_inr);
        trace.record("gst", format!("round(subtotal * {})", self.gst_rate), summary.gst_inr);
        trace.record("final", "subtotal + gst", summary.final_inr);

        CostSheet { items, summary, trace }
    }

    /// Tax and total for a subtotal. `gst = round(subtotal * rate)`,
    /// `final = subtotal + gst`.
    pub fn summarize(&self, subtotal: Decimal) -> CostSummary {
        let subtotal_inr = round_money(subtotal);
        let gst_inr = round_money(subtotal_inr * self.gst_rate);
        let final_inr = subtotal_inr + gst_inr;

        CostSummary {
            subtotal_inr,
            gst_inr,
            final_inr,
            final_in_words: rupees_in_words(final_inr),
        }
    }

    pub fn cost_services(&self, services: &[ServiceLine], fx: &ExchangeRate) -> ServiceQuote {
        let items: Vec<ServiceItem> = services
            .iter()
            .map(|service| {
                let rate_usd =
                    self.rate_card.rate_for(&service.description, Some(&service.category));
                let total_usd = round_money(rate_usd * Decimal::from(service.man_days));
                let total_inr = round_money(total_usd * fx.rate);
                ServiceItem {
                    category: service.category.clone(),
                    description: service.description.clone(),
                    man_days: service.man_days,
                    rate_usd,
                    total_usd,
                    total_inr,
                }
            })
            .collect();

        let total_usd = items.iter().map(|item| item.total_usd).sum();
        let total_inr = items.iter().map(|item| item.total_inr).sum();
        ServiceQuote { items, total_usd, total_inr }
    }
}
