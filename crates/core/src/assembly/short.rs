use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{BuildOutcome, PlannedBuild, ProposalEngine};
use crate::{
    costing::{format_inr, format_usd, fx::ExchangeRate, ServiceQuote},
    cover::DATE_FORMAT,
    domain::{
        plan::{DocumentPlan, ParagraphStyle, PlanScope, Span},
        section::SectionSet,
    },
    errors::AssemblyError,
    render::Renderer,
    taxonomy::COMMERCIAL_KEY,
};

pub const SERVICE_HEADERS: [&str; 6] =
    ["Category", "Service", "Man-Days", "Rate (USD/day)", "Total (USD)", "Total (INR)"];

const REQUIREMENT_SUMMARY_CHARS: usize = 200;

/// Request facts for a short-form proposal; narrative comes from the
/// section mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortProposalRequest {
    pub customer: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub deployment_type: Option<String>,
    #[serde(default)]
    pub hardware_choice: Option<String>,
    #[serde(default)]
    pub client_requirements: Option<String>,
    #[serde(default)]
    pub client_boq: Option<String>,
}

impl ShortProposalRequest {
    /// `This proposal is prepared for X, in the Y sector, ...` plus the first
    /// requirement line as the key objective.
    pub fn context_sentence(&self) -> String {
        let mut parts = vec![format!("This proposal is prepared for {}", self.customer)];
        if let Some(industry) = present(&self.industry) {
            parts.push(format!("in the {industry} sector"));
        }
        if let Some(deployment) = present(&self.deployment_type) {
            parts.push(format!("with a {deployment} deployment model"));
        }
        if let Some(hardware) = present(&self.hardware_choice) {
            parts.push(format!("on {hardware} infrastructure"));
        }

        let mut sentence = format!("{}.", parts.join(", "));
        let objective = self
            .client_requirements
            .as_deref()
            .and_then(|text| text.trim().lines().next())
            .map(|line| line.chars().take(REQUIREMENT_SUMMARY_CHARS).collect::<String>())
            .filter(|line| !line.trim().is_empty());
        if let Some(objective) = objective {
            sentence.push_str(&format!(" Key objective: \"{}\".", objective.trim()));
        }
        sentence
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|text| !text.is_empty())
}

impl ProposalEngine {
    /// Concise proposal: premium cover, narrative highlights, service cost
    /// table, terms and sign-off.
    pub async fn build_short<R: Renderer>(
        &self,
        request: &ShortProposalRequest,
        sections: &SectionSet,
        issued_on: NaiveDate,
        renderer: R,
    ) -> Result<BuildOutcome<R::Output>, AssemblyError> {
        let correlation_id = Uuid::new_v4().to_string();
        info!(
            event_name = "build.short.started",
            correlation_id = %correlation_id,
            customer = %request.customer,
            "building short proposal"
        );

        let exchange_rate = self.fx.resolve().await;
        let planned = self.plan_short(request, sections, issued_on, &exchange_rate);
        self.finish(correlation_id, planned, exchange_rate, renderer)
    }

    pub fn plan_short(
        &self,
        request: &ShortProposalRequest,
        sections: &SectionSet,
        issued_on: NaiveDate,
        fx: &ExchangeRate,
    ) -> PlannedBuild {
        let profile = &self.tables.document;
        let mut plan = DocumentPlan::new();

        let mut cover = plan.writer(PlanScope::Cover);
        cover.heading(0, profile.title.as_str()).styled(
            ParagraphStyle::Centered,
            vec![Span::emphasized(format!("Prepared for: {}", request.customer))],
        );
        if let Some(industry) = present(&request.industry) {
            cover.styled(ParagraphStyle::Centered, vec![Span::plain(format!("Industry: {industry}"))]);
        }
        cover
            .styled(
                ParagraphStyle::Centered,
                vec![Span::plain(format!("Prepared By: {}", profile.prepared_by))],
            )
            .styled(
                ParagraphStyle::Centered,
                vec![Span::plain(format!("Date: {}", issued_on.format(DATE_FORMAT)))],
            )
            .styled(ParagraphStyle::Note, vec![Span::emphasized(profile.confidentiality_notice.as_str())])
            .page_break();

        plan.writer(PlanScope::Section("context".to_string())).text(request.context_sentence());

        if let Some(text) = non_blank(sections, &["executive_summary"]) {
            let mut writer = plan.writer(PlanScope::Section("executive_summary".to_string()));
            writer.heading(1, "Executive Summary");
            self.classifier.emit(text, &mut writer);
        }

        if let Some(text) = non_blank(sections, &["scope_summary", "scope_of_work_in_scope"]) {
            let mut writer = plan.writer(PlanScope::Section("scope_summary".to_string()));
            writer.heading(1, "Scope Summary");
            self.classifier.emit(text, &mut writer);
        }

        if let Some(text) = non_blank(sections, &["key_benefits"]) {
            let mut writer = plan.writer(PlanScope::Section("key_benefits".to_string()));
            writer.heading(2, "Key Benefits");
            for benefit in list_items(text) {
                writer.bullet(self.classifier.spans(benefit));
            }
        }

        if let Some(text) = non_blank(sections, &["risk_note", "risks_and_mitigation"]) {
            let mut writer = plan.writer(PlanScope::Section("risks".to_string()));
            writer.heading(2, "Risks & Considerations");
            self.classifier.emit(text, &mut writer);
        }

        let client_boq = present(&request.client_boq);
        if let Some(text) = client_boq {
            let mut writer = plan.writer(PlanScope::Section("client_boq".to_string()));
            writer.heading(2, "Client Bill of Quantities (Summary)");
            for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
                writer.bullet(vec![Span::plain(line)]);
            }
        }

        let boq_text = client_boq.or_else(|| non_blank(sections, &[COMMERCIAL_KEY])).unwrap_or_default();
        let services = self.boq.parse_services(boq_text);
        let quote = self.costing.cost_services(&services, fx);

        let mut writer = plan.writer(PlanScope::Section("cost_summary".to_string()));
        writer
            .heading(1, "Cost Summary")
            .table(
                SERVICE_HEADERS.iter().map(|header| (*header).to_string()).collect(),
                service_rows(&quote),
            )
            .note(fx.disclosure());

        let mut writer = plan.writer(PlanScope::Section("terms".to_string()));
        writer.heading(1, "Terms & Conditions");
        for term in &profile.terms {
            writer.bullet(vec![Span::plain(term.as_str())]);
        }

        let mut writer = plan.writer(PlanScope::Section("closing".to_string()));
        writer.heading(2, "Closing Note");
        match non_blank(sections, &["closing"]) {
            Some(text) => self.classifier.emit(text, &mut writer),
            None => {
                writer.text(profile.closing.as_str());
            }
        }
        writer.text("Sincerely,").paragraph(vec![Span::emphasized(profile.signature.as_str())]);

        PlannedBuild { plan, cost_sheet: None, service_quote: Some(quote) }
    }
}

/// First of `keys` holding non-blank text.
fn non_blank<'a>(sections: &'a SectionSet, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| sections.get(key))
        .find(|section| !section.is_blank() && section.validate().is_ok())
        .map(|section| section.text())
}

/// One item per line, list markers removed.
fn list_items(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|line| line.trim().trim_start_matches(['-', '*', '•']).trim())
        .filter(|line| !line.is_empty())
}

fn service_rows(quote: &ServiceQuote) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = quote
        .items
        .iter()
        .map(|item| {
            vec![
                item.category.clone(),
                item.description.clone(),
                item.man_days.to_string(),
                format_usd(item.rate_usd),
                format_usd(item.total_usd),
                format_inr(item.total_inr),
            ]
        })
        .collect();

    rows.push(vec![
        String::new(),
        "GRAND TOTAL".to_string(),
        String::new(),
        String::new(),
        format_usd(quote.total_usd),
        format_inr(quote.total_inr),
    ]);
    rows
}
