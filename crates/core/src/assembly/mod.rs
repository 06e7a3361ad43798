//! Build orchestration.
//!
//! A build resolves one exchange rate, sequences cover, contents and sections
//! into a [`DocumentPlan`], then streams the plan through a [`Renderer`].
//! Planning is synchronous; the FX fetch is the only suspension point.

mod short;

use std::{collections::HashSet, sync::Arc};

use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    boq::BoqParser,
    costing::{format_inr, format_usd, fx::ExchangeRate, fx::FxResolver, CostSheet, CostingEngine, ServiceQuote},
    cover::{CoverDetails, CustomerExtractor},
    domain::{
        boq::BoqLineItem,
        plan::{DocumentPlan, PlanScope, PlanWriter},
        section::{SectionContent, SectionSet},
    },
    errors::AssemblyError,
    markdown::BlockClassifier,
    render::{deliver, Renderer},
    tables::EngineTables,
    taxonomy::COMMERCIAL_KEY,
};

pub use short::ShortProposalRequest;

pub const BOQ_HEADERS: [&str; 5] =
    ["Services", "Man Days", "USD Cost", "INR Cost", "Total INR Cost"];
const NOT_APPLICABLE: &str = "N/A";

/// Everything one build produced, alongside the renderer's artifact.
#[derive(Debug)]
pub struct BuildOutcome<T> {
    pub correlation_id: String,
    pub artifact: T,
    pub plan: DocumentPlan,
    pub exchange_rate: ExchangeRate,
    pub cost_sheet: Option<CostSheet>,
    pub service_quote: Option<ServiceQuote>,
}

/// A plan and the figures behind it, before any renderer is involved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedBuild {
    pub plan: DocumentPlan,
    pub cost_sheet: Option<CostSheet>,
    pub service_quote: Option<ServiceQuote>,
}

pub struct ProposalEngine {
    tables: Arc<EngineTables>,
    fx: FxResolver,
    classifier: BlockClassifier,
    boq: BoqParser,
    costing: CostingEngine,
    customers: CustomerExtractor,
}

impl ProposalEngine {
    pub fn new(tables: impl Into<Arc<EngineTables>>, fx: FxResolver) -> Result<Self, AssemblyError> {
        let tables = tables.into();
        Ok(Self {
            classifier: BlockClassifier::new()?,
            boq: BoqParser::new(tables.effort.clone())?,
            costing: CostingEngine::new(tables.rate_card.clone(), tables.gst_rate),
            customers: CustomerExtractor::new()?,
            tables,
            fx,
        })
    }

    pub fn tables(&self) -> &EngineTables {
        &self.tables
    }

    pub async fn resolve_rate(&self) -> ExchangeRate {
        self.fx.resolve().await
    }

    /// Full proposal: cover, contents, every section, costed BOQ.
    pub async fn build_detailed<R: Renderer>(
        &self,
        sections: &SectionSet,
        issued_on: NaiveDate,
        renderer: R,
    ) -> Result<BuildOutcome<R::Output>, AssemblyError> {
        let correlation_id = Uuid::new_v4().to_string();
        info!(
            event_name = "build.detailed.started",
            correlation_id = %correlation_id,
            sections = sections.len(),
            "building detailed proposal"
        );

        let exchange_rate = self.fx.resolve().await;
        let planned = self.plan_detailed(sections, issued_on, &exchange_rate);
        self.finish(correlation_id, planned, exchange_rate, renderer)
    }

    pub fn plan_detailed(
        &self,
        sections: &SectionSet,
        issued_on: NaiveDate,
        fx: &ExchangeRate,
    ) -> PlannedBuild {
        let taxonomy = &self.tables.taxonomy;
        let profile = &self.tables.document;
        let mut plan = DocumentPlan::new();

        let cover_text = match sections.get(taxonomy.cover_key()).map(SectionContent::validate) {
            Some(Ok(text)) => text,
            Some(Err(error)) => {
                warn!(
                    event_name = "content.section.garbled",
                    section = taxonomy.cover_key(),
                    error = %error,
                    "building cover from document defaults"
                );
                ""
            }
            None => "",
        };
        let mut cover = CoverDetails::parse(cover_text, profile);
        if cover.customer.is_none() {
            cover.customer = self.customers.extract_from_sections(sections);
        }
        cover.emit(&profile.title, issued_on, &mut plan.writer(PlanScope::Cover));

        self.emit_contents(&mut plan.writer(PlanScope::Contents));

        let present: Vec<&SectionContent> = taxonomy
            .order(sections.keys())
            .iter()
            .filter_map(|key| sections.get(key))
            .filter(|section| {
                if section.is_blank() {
                    warn!(
                        event_name = "content.section.empty",
                        section = section.key(),
                        "skipping section without content"
                    );
                }
                !section.is_blank()
            })
            .collect();

        let mut entered_groups = HashSet::new();
        let mut cost_sheet = None;

        for (index, section) in present.iter().enumerate() {
            let mut writer = plan.writer(PlanScope::Section(section.key().to_string()));
            let group = taxonomy.group_for(section.key());
            if let Some(group) = group {
                if entered_groups.insert(group.number) {
                    writer.heading(1, group.heading());
                }
            }
            let level = if group.is_some() { 2 } else { 1 };
            writer.heading(level, taxonomy.title_for(section.key()));

            match section.validate() {
                Ok(text) if section.key() == COMMERCIAL_KEY => {
                    cost_sheet = Some(self.emit_commercial(text, fx, &mut writer));
                }
                Ok(text) => self.classifier.emit(text, &mut writer),
                Err(error) => {
                    warn!(
                        event_name = "content.section.garbled",
                        section = section.key(),
                        error = %error,
                        "rendering diagnostic placeholder"
                    );
                    writer.note(format!(
                        "[This section could not be rendered from the supplied content: {error}]"
                    ));
                }
            }

            if index + 1 < present.len() {
                writer.page_break();
            }
        }

        PlannedBuild { plan, cost_sheet, service_quote: None }
    }

    fn emit_contents(&self, writer: &mut PlanWriter<'_>) {
        let groups = self.tables.taxonomy.groups();
        writer.heading(1, "Table of Contents").note(format!(
            "This proposal is organized into {} major sections. Page numbers are resolved when \
             the document is rendered.",
            groups.len()
        ));
        for group in groups {
            writer.toc_entry(1, group.number.to_string(), group.title.as_str());
            for (position, entry) in (1..).zip(&group.sections) {
                writer.toc_entry(2, format!("{}.{position}", group.number), entry.title.as_str());
            }
        }
        writer.page_break();
    }

    /// Cost table, then subtotal, tax, final amount, words and the FX note,
    /// in that order.
    fn emit_commercial(&self, text: &str, fx: &ExchangeRate, writer: &mut PlanWriter<'_>) -> CostSheet {
        let lines = self.boq.parse_section(text);
        let sheet = self.costing.cost_lines(&lines, fx);

        let headers = BOQ_HEADERS.iter().map(|header| (*header).to_string()).collect();
        let rows = sheet.items.iter().map(boq_row).collect();
        writer.table(headers, rows);

        let summary = &sheet.summary;
        writer
            .labelled("Subtotal (INR)", format_inr(summary.subtotal_inr))
            .labelled(&self.costing.gst_label(), format_inr(summary.gst_inr))
            .labelled("Final Amount (INR, incl. GST)", format_inr(summary.final_inr))
            .labelled("Final Amount in words", summary.final_in_words.as_str())
            .note(fx.disclosure());

        sheet
    }

    fn finish<R: Renderer>(
        &self,
        correlation_id: String,
        planned: PlannedBuild,
        exchange_rate: ExchangeRate,
        renderer: R,
    ) -> Result<BuildOutcome<R::Output>, AssemblyError> {
        let artifact = deliver(&planned.plan, renderer).map_err(|error| {
            warn!(
                event_name = "build.failed",
                correlation_id = %correlation_id,
                error = %error,
                "renderer failed; no document produced"
            );
            error
        })?;

        info!(
            event_name = "build.completed",
            correlation_id = %correlation_id,
            operations = planned.plan.len(),
            fx_rate = %exchange_rate.rate,
            fx_source = %exchange_rate.source,
            final_inr = ?planned.cost_sheet.as_ref().map(|sheet| sheet.summary.final_inr),
            "proposal built"
        );

        Ok(BuildOutcome {
            correlation_id,
            artifact,
            plan: planned.plan,
            exchange_rate,
            cost_sheet: planned.cost_sheet,
            service_quote: planned.service_quote,
        })
    }
}

fn boq_row(item: &BoqLineItem) -> Vec<String> {
    match &item.pricing {
        Some(pricing) => vec![
            item.description.clone(),
            item.man_days.to_string(),
            format_usd(pricing.rate_usd),
            format_inr(pricing.rate_inr),
            format_inr(pricing.total_inr),
        ],
        None => {
            let mut row = vec![item.description.clone()];
            row.extend(std::iter::repeat(NOT_APPLICABLE.to_string()).take(BOQ_HEADERS.len() - 1));
            row
        }
    }
}
