use std::time::Duration;

use propkit_core::{
    config::{AppConfig, ConfigOverrides},
    costing::fx::{HttpRateProvider, RateProvider, RateRequest},
    ProposalEngine,
};
use serde::Serialize;

use crate::commands::{CommandResult, ConfigSource, EXIT_BUILD_FAILURE, EXIT_CONFIG_FAILURE};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool, source: &ConfigSource) -> CommandResult {
    let report = build_report(source);
    let config_failed = report
        .checks
        .iter()
        .any(|check| check.name == "config_validation" && check.status == CheckStatus::Fail);
    let exit_code = match report.overall_status {
        CheckStatus::Fail if config_failed => EXIT_CONFIG_FAILURE,
        CheckStatus::Fail => EXIT_BUILD_FAILURE,
        CheckStatus::Pass | CheckStatus::Skipped => 0,
    };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return CommandResult { exit_code, output };
    }

    let human = render_human(&report);
    if exit_code == 0 {
        CommandResult::success("doctor", human)
    } else {
        let class = if config_failed { "config_validation" } else { "readiness" };
        CommandResult::failure("doctor", class, human, exit_code)
    }
}

fn build_report(source: &ConfigSource) -> DoctorReport {
    let mut checks = Vec::new();

    match source.load(ConfigOverrides::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_engine_tables(&config));
            checks.push(check_rate_provider(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["engine_tables", "rate_provider_reachability"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_engine_tables(config: &AppConfig) -> DoctorCheck {
    let tables = config.engine_tables();
    let summary = format!(
        "{} section groups, {} rate categories, GST {}%",
        tables.taxonomy.groups().len(),
        tables.rate_card.categories.len(),
        config.tax.gst_pct
    );

    let fallback = propkit_core::FxResolver::offline(config.fx.fallback_usd_inr);
    match ProposalEngine::new(tables, fallback) {
        Ok(_) => DoctorCheck { name: "engine_tables", status: CheckStatus::Pass, details: summary },
        Err(error) => {
            DoctorCheck { name: "engine_tables", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn check_rate_provider(config: &AppConfig) -> DoctorCheck {
    if config.fx.offline {
        return DoctorCheck {
            name: "rate_provider_reachability",
            status: CheckStatus::Skipped,
            details: format!(
                "fx.offline is set; builds bill at the fallback rate {}",
                config.fx.fallback_usd_inr
            ),
        };
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "rate_provider_reachability",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let timeout = Duration::from_secs(config.fx.timeout_secs);
    let result = runtime.block_on(async {
        let provider =
            HttpRateProvider::new(config.fx.provider_url.clone(), config.fx.api_key.clone(), timeout)?;
        provider.fetch_rate(&RateRequest::usd_inr()).await
    });

    match result {
        Ok(rate) => DoctorCheck {
            name: "rate_provider_reachability",
            status: CheckStatus::Pass,
            details: format!("`{}` answered 1 USD = {rate} INR", config.fx.provider_url),
        },
        Err(error) => DoctorCheck {
            name: "rate_provider_reachability",
            status: CheckStatus::Fail,
            details: format!(
                "`{}` unreachable ({error}); builds would fall back to {}",
                config.fx.provider_url, config.fx.fallback_usd_inr
            ),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
