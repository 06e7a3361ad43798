//! Propkit core - proposal document assembly and commercial costing.
//!
//! Upstream content arrives as a loosely structured mapping of section key to
//! free-form text. This crate turns it into a deterministic operation stream
//! for a document renderer, together with a costed bill of quantities.
//!
//! # Pipeline
//!
//! 1. **Normalize** (`normalize`) - coerce raw JSON values to section text.
//! 2. **Order** (`taxonomy`) - canonical grouping and ordering of sections.
//! 3. **Classify** (`markdown`) - markdown-lite blocks to render operations.
//! 4. **Cost** (`boq`, `costing`, `words`) - parse billable effort, resolve FX,
//!    compute totals with tax and spell the final amount.
//! 5. **Assemble** (`assembly`) - sequence everything into a `DocumentPlan` and
//!    hand it to a `render::Renderer`.
//!
//! Process-wide tables (taxonomy, rate card, effort defaults) are built once
//! from configuration as `tables::EngineTables` and shared read-only.

pub mod assembly;
pub mod boq;
pub mod config;
pub mod costing;
pub mod cover;
pub mod domain;
pub mod errors;
pub mod markdown;
pub mod normalize;
pub mod render;
pub mod tables;
pub mod taxonomy;
pub mod words;

pub use assembly::{BuildOutcome, ProposalEngine, ShortProposalRequest};
pub use costing::fx::{ExchangeRate, FxResolver, HttpRateProvider, RateFetchError, RateProvider};
pub use costing::{CostSheet, CostSummary, CostingEngine, RateCard};
pub use domain::boq::{BoqLine, BoqLineItem, EffortSource, LinePricing};
pub use domain::plan::{DocumentPlan, ParagraphStyle, PlanScope, RenderOp, Span};
pub use domain::section::{SectionContent, SectionSet, UpstreamContentError};
pub use errors::{ApplicationError, AssemblyError, InterfaceError};
pub use render::{RenderError, Renderer};
pub use tables::{DocumentProfile, EffortTable, EngineTables};
pub use taxonomy::{SectionGroup, Taxonomy};
pub use words::rupees_in_words;
