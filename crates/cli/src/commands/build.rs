use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use propkit_core::{
    config::ConfigOverrides, costing::format_inr, normalize::sections_from_value,
    ApplicationError, ExchangeRate, ProposalEngine, SectionSet, ShortProposalRequest,
};
use propkit_render::HtmlRenderer;
use serde_json::Value;
use tracing::info;

use crate::commands::{CommandResult, ConfigSource};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum BuildKind {
    #[default]
    Detailed,
    Short,
}

impl BuildKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Detailed => "detailed",
            Self::Short => "short",
        }
    }
}

#[derive(Clone, Debug, Default, Args)]
pub struct BuildArgs {
    #[arg(long, value_name = "JSON", help = "Section mapping produced by the drafting step")]
    pub input: PathBuf,
    #[arg(long, value_name = "PATH", help = "Output file; defaults to document.output_dir")]
    pub output: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = BuildKind::Detailed)]
    pub kind: BuildKind,
    #[arg(long, help = "Customer name (required for short proposals)")]
    pub customer: Option<String>,
    #[arg(long)]
    pub industry: Option<String>,
    #[arg(long)]
    pub deployment_type: Option<String>,
    #[arg(long)]
    pub hardware_choice: Option<String>,
    #[arg(long, help = "Client requirements; the first line becomes the key objective")]
    pub requirements: Option<String>,
    #[arg(long, value_name = "FILE", help = "Client bill of quantities, one service per line")]
    pub client_boq: Option<PathBuf>,
    #[arg(long, value_name = "YYYY-MM-DD", help = "Issue date printed on the cover; defaults to today")]
    pub date: Option<NaiveDate>,
    #[arg(long, help = "Skip the live exchange rate and bill at the configured fallback")]
    pub offline: bool,
    #[arg(long, help = "Write the JSON document plan instead of rendered HTML")]
    pub plan: bool,
}

pub fn run(args: BuildArgs, source: &ConfigSource) -> CommandResult {
    match execute(&args, source) {
        Ok(message) => CommandResult::success("build", message),
        Err(error) => CommandResult::from_application_error("build", error),
    }
}

fn execute(args: &BuildArgs, source: &ConfigSource) -> Result<String, ApplicationError> {
    let overrides =
        ConfigOverrides { fx_offline: args.offline.then_some(true), ..ConfigOverrides::default() };
    let config = source.load(overrides)?;
    let tables = config.engine_tables();

    let input = read_json(&args.input).map_err(|error| ApplicationError::Input(format!("{error:#}")))?;
    let sections = sections_from_value(&input, &tables.taxonomy)?;
    let request = match args.kind {
        BuildKind::Detailed => None,
        BuildKind::Short => Some(short_request(args)?),
    };

    let fx = config.fx_resolver().map_err(|error| ApplicationError::Integration(error.to_string()))?;
    let engine = ProposalEngine::new(tables, fx)?;
    let issued_on = args.date.unwrap_or_else(|| Local::now().date_naive());

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        ApplicationError::Integration(format!("failed to initialize async runtime: {error}"))
    })?;
    let (document, summary) = runtime.block_on(produce(
        &engine,
        args,
        request.as_ref(),
        &sections,
        issued_on,
        &config.document.footer,
    ))?;

    let output = args.output.clone().unwrap_or_else(|| {
        default_output(&config.document.output_dir, args.kind, issued_on, args.plan)
    });
    write_document(&output, &document)
        .map_err(|error| ApplicationError::Integration(format!("{error:#}")))?;
    info!(event_name = "document.written", path = %output.display(), bytes = document.len(), "document written");

    Ok(format!("wrote {} ({summary})", output.display()))
}

async fn produce(
    engine: &ProposalEngine,
    args: &BuildArgs,
    request: Option<&ShortProposalRequest>,
    sections: &SectionSet,
    issued_on: NaiveDate,
    footer: &str,
) -> Result<(String, String), ApplicationError> {
    if args.plan {
        let rate = engine.resolve_rate().await;
        let planned = match request {
            Some(request) => engine.plan_short(request, sections, issued_on, &rate),
            None => engine.plan_detailed(sections, issued_on, &rate),
        };
        let json = serde_json::to_string_pretty(&planned.plan).map_err(|error| {
            ApplicationError::Integration(format!("document plan serialization failed: {error}"))
        })?;
        let summary = format!("{} plan, {} operations, {}", args.kind.as_str(), planned.plan.len(), rate_note(&rate));
        return Ok((json, summary));
    }

    let renderer = HtmlRenderer::new(footer)
        .map_err(|error| ApplicationError::Integration(error.to_string()))?;
    let outcome = match request {
        Some(request) => engine.build_short(request, sections, issued_on, renderer).await?,
        None => engine.build_detailed(sections, issued_on, renderer).await?,
    };

    let total = outcome
        .cost_sheet
        .as_ref()
        .map(|sheet| sheet.summary.final_inr)
        .or_else(|| outcome.service_quote.as_ref().map(|quote| quote.total_inr));
    let mut summary = format!(
        "{} proposal, correlation_id {}, {}",
        args.kind.as_str(),
        outcome.correlation_id,
        rate_note(&outcome.exchange_rate)
    );
    if let Some(total) = total {
        summary.push_str(&format!(", total {}", format_inr(total)));
    }
    Ok((outcome.artifact, summary))
}

fn short_request(args: &BuildArgs) -> Result<ShortProposalRequest, ApplicationError> {
    let customer = args
        .customer
        .as_deref()
        .map(str::trim)
        .filter(|customer| !customer.is_empty())
        .ok_or_else(|| ApplicationError::Input("--customer is required for short proposals".to_string()))?;

    let client_boq = args
        .client_boq
        .as_deref()
        .map(read_text)
        .transpose()
        .map_err(|error| ApplicationError::Input(format!("{error:#}")))?;

    Ok(ShortProposalRequest {
        customer: customer.to_string(),
        industry: args.industry.clone(),
        deployment_type: args.deployment_type.clone(),
        hardware_choice: args.hardware_choice.clone(),
        client_requirements: args.requirements.clone(),
        client_boq,
    })
}

fn rate_note(rate: &ExchangeRate) -> String {
    format!("1 USD = {} INR via {}", rate.rate, rate.source)
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("could not read `{}`", path.display()))
}

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let raw = read_text(path)?;
    serde_json::from_str(&raw).with_context(|| format!("`{}` is not valid JSON", path.display()))
}

fn default_output(dir: &Path, kind: BuildKind, issued_on: NaiveDate, plan: bool) -> PathBuf {
    let extension = if plan { "json" } else { "html" };
    dir.join(format!("proposal-{}-{}.{extension}", kind.as_str(), issued_on.format("%Y-%m-%d")))
}

fn write_document(path: &Path, document: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("could not create `{}`", parent.display()))?;
    }
    fs::write(path, document).with_context(|| format!("could not write `{}`", path.display()))
}
