use std::sync::Arc;

use rust_decimal::Decimal;

use crate::{costing::RateCard, taxonomy::Taxonomy};

/// Keyword to man-day defaults, consulted in order; the first keyword found
/// in a lower-cased description wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffortTable {
    entries: Vec<(String, u32)>,
}

impl EffortTable {
    pub fn new(entries: Vec<(String, u32)>) -> Self {
        Self { entries }
    }

    pub fn standard() -> Self {
        let entries = [
            ("assessment", 5),
            ("planning", 5),
            ("design", 10),
            ("migration", 15),
            ("implementation", 15),
            ("deployment", 10),
            ("configuration", 8),
            ("testing", 5),
            ("validation", 5),
            ("training", 3),
            ("documentation", 3),
            ("support", 10),
            ("optimization", 5),
            ("monitoring", 5),
            ("license", 0),
            ("professional services", 5),
        ];
        Self::new(entries.iter().map(|(keyword, days)| ((*keyword).to_string(), *days)).collect())
    }

    /// First matching `(keyword, days)` for a description.
    pub fn lookup(&self, description: &str) -> Option<(&str, u32)> {
        let lowered = description.to_lowercase();
        self.entries
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword.as_str()))
            .map(|(keyword, days)| (keyword.as_str(), *days))
    }

    pub fn entries(&self) -> &[(String, u32)] {
        &self.entries
    }
}

impl Default for EffortTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Fixed strings the document carries regardless of upstream content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentProfile {
    pub title: String,
    pub prepared_by: String,
    pub confidentiality_notice: String,
    pub terms: Vec<String>,
    pub closing: String,
    pub signature: String,
}

impl Default for DocumentProfile {
    fn default() -> Self {
        Self {
            title: "Professional Services Proposal".to_string(),
            prepared_by: "Integrated Tech9 Labs Pvt. Ltd.".to_string(),
            confidentiality_notice: "CONFIDENTIAL - For Client Review Only".to_string(),
            terms: [
                "All services are delivered on a best-effort basis in accordance with the agreed Statement of Work.",
                "Pricing is exclusive of applicable taxes (GST/VAT) and government duties.",
                "Payment terms: 50% advance, 50% upon project completion, unless otherwise agreed.",
                "Travel and accommodation expenses, if required, will be charged on actuals with prior approval.",
                "Client shall provide necessary access, credentials, and resources for successful project execution.",
                "Any scope changes will be managed through a formal Change Request process with revised timelines and costs.",
            ]
            .iter()
            .map(|term| (*term).to_string())
            .collect(),
            closing: "We appreciate your consideration and look forward to partnering with you on \
                      this important initiative. Our team is committed to delivering exceptional \
                      results and ensuring your success."
                .to_string(),
            signature: "Integrated Tech9 Labs Pvt. Ltd. - Professional Services Team".to_string(),
        }
    }
}

/// Everything a build reads but never writes. Built once per process and
/// shared across builds behind an `Arc`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineTables {
    pub taxonomy: Taxonomy,
    pub rate_card: RateCard,
    pub effort: EffortTable,
    /// Tax fraction applied to the subtotal, e.g. `0.18`.
    pub gst_rate: Decimal,
    pub document: DocumentProfile,
}

impl EngineTables {
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for EngineTables {
    fn default() -> Self {
        Self {
            taxonomy: Taxonomy::standard(),
            rate_card: RateCard::default(),
            effort: EffortTable::standard(),
            gst_rate: Decimal::new(18, 2),
            document: DocumentProfile::default(),
        }
    }
}
