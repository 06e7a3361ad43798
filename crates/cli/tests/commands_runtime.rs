use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use propkit_cli::commands::{build, config, doctor, fx, words, ConfigSource};
use serde_json::Value;

const SECTIONS: &str = r###"{
    "proposal_sections": {
        "cover_page": "Cover\nCustomer: Stark Industries",
        "executive_summary": "## Goals\nCut **hosting** spend.",
        "commercial_boq_expanded": "Architecture Design Workshop -> 8 man-days\nDocumentation Delivery -> 3 man-days"
    }
}"###;

#[test]
fn words_spells_grouped_amounts() {
    let result = words::run("629766");
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "words");
    assert_eq!(
        payload["message"],
        "Six Lakh Twenty Nine Thousand Seven Hundred and Sixty Six Rupees Only"
    );
}

#[test]
fn fx_offline_reports_the_buffered_fallback() {
    with_env(&[], || {
        let result = fx::run(true, &ConfigSource::default());
        assert_eq!(result.exit_code, 0, "offline fx never fails: {}", result.output);

        let payload = parse_payload(&result.output);
        let message = payload["message"].as_str().expect("message is text");
        assert!(message.starts_with("1 USD = 88.95 INR"), "unexpected message: {message}");
        assert!(message.contains("Fallback configuration +1 INR buffer"));
    });
}

#[test]
fn fx_uses_the_env_fallback_rate() {
    with_env(&[("PROPKIT_FX_FALLBACK_USD_INR", "84.10"), ("PROPKIT_FX_OFFLINE", "true")], || {
        let result = fx::run(false, &ConfigSource::default());
        assert_eq!(result.exit_code, 0);
        assert!(parse_payload(&result.output)["message"]
            .as_str()
            .is_some_and(|message| message.starts_with("1 USD = 85.10 INR")));
    });
}

#[test]
fn build_writes_a_detailed_html_proposal() {
    with_env(&[], || {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = write_input(&dir, SECTIONS);
        let output = dir.path().join("nested").join("proposal.html");

        let result = build::run(
            build::BuildArgs {
                input,
                output: Some(output.clone()),
                offline: true,
                date: chrono::NaiveDate::from_ymd_opt(2025, 6, 30),
                ..build::BuildArgs::default()
            },
            &ConfigSource::default(),
        );
        assert_eq!(result.exit_code, 0, "build failed: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "build");
        assert_eq!(payload["status"], "ok");
        let message = payload["message"].as_str().expect("message is text");
        assert!(message.contains("detailed proposal"));
        assert!(message.contains("total ₹629,766.00"), "unexpected message: {message}");

        let html = fs::read_to_string(&output).expect("output written");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Prepared for: Stark Industries"));
        assert!(html.contains("30 June 2025"));
        assert!(html.contains("Six Lakh Twenty Nine Thousand Seven Hundred and Sixty Six Rupees Only"));
    });
}

#[test]
fn build_plan_mode_writes_json_operations() {
    with_env(&[], || {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = write_input(&dir, SECTIONS);
        let output = dir.path().join("plan.json");

        let result = build::run(
            build::BuildArgs {
                input,
                output: Some(output.clone()),
                offline: true,
                plan: true,
                date: chrono::NaiveDate::from_ymd_opt(2025, 6, 30),
                ..build::BuildArgs::default()
            },
            &ConfigSource::default(),
        );
        assert_eq!(result.exit_code, 0, "plan build failed: {}", result.output);

        let plan: Value =
            serde_json::from_str(&fs::read_to_string(&output).expect("plan written"))
                .expect("plan is JSON");
        let rendered = plan.to_string();
        assert!(rendered.contains("\"op\":\"heading\""));
        assert!(rendered.contains("Architecture Design Workshop"));
    });
}

#[test]
fn short_build_requires_a_customer() {
    with_env(&[], || {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = write_input(&dir, SECTIONS);

        let result = build::run(
            build::BuildArgs {
                input,
                output: Some(dir.path().join("short.html")),
                kind: build::BuildKind::Short,
                offline: true,
                ..build::BuildArgs::default()
            },
            &ConfigSource::default(),
        );
        assert_eq!(result.exit_code, 1);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "input");
        assert!(!dir.path().join("short.html").exists());
    });
}

#[test]
fn build_rejects_input_that_is_not_json() {
    with_env(&[], || {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = write_input(&dir, "cover_page: not json");

        let result = build::run(
            build::BuildArgs { input, offline: true, ..build::BuildArgs::default() },
            &ConfigSource::default(),
        );
        assert_eq!(result.exit_code, 1);
        assert_eq!(parse_payload(&result.output)["error_class"], "input");
    });
}

#[test]
fn invalid_config_fails_with_config_exit_code() {
    with_env(&[("PROPKIT_TAX_GST_PCT", "120")], || {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = write_input(&dir, SECTIONS);

        let result = build::run(
            build::BuildArgs { input, offline: true, ..build::BuildArgs::default() },
            &ConfigSource::default(),
        );
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn explicit_config_file_must_exist() {
    with_env(&[], || {
        let source = ConfigSource { path: Some(PathBuf::from("definitely-missing/propkit.toml")) };
        let result = fx::run(true, &source);

        assert_eq!(result.exit_code, 2);
        assert_eq!(parse_payload(&result.output)["error_class"], "config_validation");
    });
}

#[test]
fn config_reports_file_and_env_sources() {
    with_env(&[("PROPKIT_TAX_GST_PCT", "12"), ("PROPKIT_FX_API_KEY", "fx-secret-value")], || {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("propkit.toml");
        fs::write(&path, "[document]\nprepared_by = \"Acme Consulting\"\n").expect("config written");

        let result = config::run(&ConfigSource { path: Some(path.clone()) });
        assert_eq!(result.exit_code, 0, "config failed: {}", result.output);

        let payload = parse_payload(&result.output);
        let message = payload["message"].as_str().expect("message is text");
        assert!(message.contains("- tax.gst_pct = 12 (source: env (PROPKIT_TAX_GST_PCT))"));
        assert!(message.contains(&format!(
            "- document.prepared_by = Acme Consulting (source: file ({}))",
            path.display()
        )));
        assert!(message.contains("- fx.api_key = <redacted>"));
        assert!(!message.contains("fx-secret-value"));
        assert!(message.contains("- fx.timeout_secs = 5 (source: default)"));
    });
}

#[test]
fn doctor_passes_offline_and_skips_the_provider() {
    with_env(&[("PROPKIT_FX_OFFLINE", "true")], || {
        let result = doctor::run(true, &ConfigSource::default());
        assert_eq!(result.exit_code, 0, "doctor failed: {}", result.output);

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "pass");
        let checks = report["checks"].as_array().expect("checks array");
        assert_eq!(checks.len(), 3);
        assert_eq!(checks[0]["name"], "config_validation");
        assert_eq!(checks[2]["name"], "rate_provider_reachability");
        assert_eq!(checks[2]["status"], "skipped");
    });
}

#[test]
fn doctor_reports_config_failure() {
    with_env(&[("PROPKIT_FX_TIMEOUT_SECS", "0")], || {
        let result = doctor::run(false, &ConfigSource::default());
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "doctor");
        assert_eq!(payload["error_class"], "config_validation");
        assert!(payload["message"].as_str().is_some_and(|text| text.contains("[fail] config_validation")));
    });
}

fn write_input(dir: &tempfile::TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("sections.json");
    fs::write(&path, content).expect("input written");
    path
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "PROPKIT_FX_PROVIDER_URL",
        "PROPKIT_FX_API_KEY",
        "PROPKIT_FX_TIMEOUT_SECS",
        "PROPKIT_FX_FALLBACK_USD_INR",
        "PROPKIT_FX_OFFLINE",
        "PROPKIT_RATES_DEFAULT_USD",
        "PROPKIT_RATES_WORKSHOP_USD",
        "PROPKIT_TAX_GST_PCT",
        "PROPKIT_DOCUMENT_TITLE",
        "PROPKIT_DOCUMENT_PREPARED_BY",
        "PROPKIT_DOCUMENT_FOOTER",
        "PROPKIT_DOCUMENT_OUTPUT_DIR",
        "PROPKIT_LOGGING_LEVEL",
        "PROPKIT_LOGGING_FORMAT",
        "PROPKIT_LOG_LEVEL",
        "PROPKIT_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
