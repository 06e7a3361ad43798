use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use propkit_core::config::{AppConfig, ConfigOverrides, DEFAULT_CONFIG_FILE, NESTED_CONFIG_FILE};
use toml::Value;

use crate::commands::{CommandResult, ConfigSource};

/// One reported setting: dotted key, rendered value, and the environment
/// variables that can set it.
struct Setting {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run(source: &ConfigSource) -> CommandResult {
    let config = match source.load(ConfigOverrides::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_application_error("config", error),
    };

    let file_path = detect_config_path(source.path.as_deref());
    let file_doc = load_config_file_doc(file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for setting in settings(&config) {
        let origin = field_source(&setting, file_doc.as_ref(), file_path.as_deref());
        lines.push(format!("- {} = {} (source: {origin})", setting.key, setting.value));
    }

    CommandResult::success("config", lines.join("\n"))
}

fn settings(config: &AppConfig) -> Vec<Setting> {
    let categories = config
        .rates
        .category_usd
        .iter()
        .map(|(category, rate)| format!("{category}={rate}"))
        .collect::<Vec<_>>()
        .join(", ");

    vec![
        Setting {
            key: "fx.provider_url",
            value: config.fx.provider_url.clone(),
            env_keys: &["PROPKIT_FX_PROVIDER_URL"],
        },
        Setting {
            key: "fx.api_key",
            value: (if config.fx.api_key.is_some() { "<redacted>" } else { "<unset>" }).to_string(),
            env_keys: &["PROPKIT_FX_API_KEY"],
        },
        Setting {
            key: "fx.timeout_secs",
            value: config.fx.timeout_secs.to_string(),
            env_keys: &["PROPKIT_FX_TIMEOUT_SECS"],
        },
        Setting {
            key: "fx.fallback_usd_inr",
            value: config.fx.fallback_usd_inr.to_string(),
            env_keys: &["PROPKIT_FX_FALLBACK_USD_INR"],
        },
        Setting {
            key: "fx.offline",
            value: config.fx.offline.to_string(),
            env_keys: &["PROPKIT_FX_OFFLINE"],
        },
        Setting {
            key: "rates.default_usd",
            value: config.rates.default_usd.to_string(),
            env_keys: &["PROPKIT_RATES_DEFAULT_USD"],
        },
        Setting {
            key: "rates.workshop_usd",
            value: config.rates.workshop_usd.to_string(),
            env_keys: &["PROPKIT_RATES_WORKSHOP_USD"],
        },
        Setting { key: "rates.category_usd", value: categories, env_keys: &[] },
        Setting {
            key: "tax.gst_pct",
            value: config.tax.gst_pct.to_string(),
            env_keys: &["PROPKIT_TAX_GST_PCT"],
        },
        Setting {
            key: "document.title",
            value: config.document.title.clone(),
            env_keys: &["PROPKIT_DOCUMENT_TITLE"],
        },
        Setting {
            key: "document.prepared_by",
            value: config.document.prepared_by.clone(),
            env_keys: &["PROPKIT_DOCUMENT_PREPARED_BY"],
        },
        Setting {
            key: "document.footer",
            value: config.document.footer.clone(),
            env_keys: &["PROPKIT_DOCUMENT_FOOTER"],
        },
        Setting {
            key: "document.output_dir",
            value: config.document.output_dir.display().to_string(),
            env_keys: &["PROPKIT_DOCUMENT_OUTPUT_DIR"],
        },
        Setting {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["PROPKIT_LOGGING_LEVEL", "PROPKIT_LOG_LEVEL"],
        },
        Setting {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["PROPKIT_LOGGING_FORMAT", "PROPKIT_LOG_FORMAT"],
        },
    ]
}

fn detect_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(setting: &Setting, file_doc: Option<&Value>, file_path: Option<&Path>) -> String {
    if let Some(env_key) =
        setting.env_keys.iter().find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()))
    {
        return format!("env ({env_key})");
    }

    if let Some(doc) = file_doc {
        if contains_path(doc, setting.key) {
            let file_path = file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::contains_path;

    #[test]
    fn dotted_paths_walk_nested_tables() {
        let doc: Value = "[fx]\noffline = true\n".parse().expect("valid toml");

        assert!(contains_path(&doc, "fx.offline"));
        assert!(!contains_path(&doc, "fx.api_key"));
        assert!(!contains_path(&doc, "tax.gst_pct"));
    }
}
