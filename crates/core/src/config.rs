use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    costing::{
        fx::{FxResolver, HttpRateProvider, RateFetchError},
        RateCard,
    },
    tables::{DocumentProfile, EffortTable, EngineTables},
    taxonomy::Taxonomy,
};

pub const DEFAULT_CONFIG_FILE: &str = "propkit.toml";
pub const NESTED_CONFIG_FILE: &str = "config/propkit.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub fx: FxConfig,
    pub rates: RatesConfig,
    pub tax: TaxConfig,
    pub document: DocumentConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct FxConfig {
    pub provider_url: String,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
    /// Raw USD to INR rate used when the live fetch fails; the buffer is
    /// applied on top.
    pub fallback_usd_inr: Decimal,
    pub offline: bool,
}

#[derive(Clone, Debug)]
pub struct RatesConfig {
    pub default_usd: Decimal,
    pub workshop_usd: Decimal,
    pub category_usd: BTreeMap<String, Decimal>,
}

#[derive(Clone, Debug)]
pub struct TaxConfig {
    /// Percentage, e.g. `18` for 18%.
    pub gst_pct: Decimal,
}

#[derive(Clone, Debug)]
pub struct DocumentConfig {
    pub title: String,
    pub prepared_by: String,
    pub footer: String,
    pub output_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub fx_offline: Option<bool>,
    pub fx_provider_url: Option<String>,
    pub fx_fallback_usd_inr: Option<Decimal>,
    pub gst_pct: Option<Decimal>,
    pub output_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        let profile = DocumentProfile::default();
        let rate_card = RateCard::default();
        Self {
            fx: FxConfig {
                provider_url: "https://api.exchangerate.host/latest".to_string(),
                api_key: None,
                timeout_secs: 5,
                fallback_usd_inr: Decimal::new(8795, 2),
                offline: false,
            },
            rates: RatesConfig {
                default_usd: rate_card.default_usd,
                workshop_usd: rate_card.workshop_usd,
                category_usd: rate_card.categories,
            },
            tax: TaxConfig { gst_pct: Decimal::from(18) },
            document: DocumentConfig {
                title: profile.title,
                prepared_by: profile.prepared_by,
                footer: "Generated by propkit".to_string(),
                output_dir: PathBuf::from("out"),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// The immutable tables every build reads.
    pub fn engine_tables(&self) -> EngineTables {
        EngineTables {
            taxonomy: Taxonomy::standard(),
            rate_card: RateCard {
                default_usd: self.rates.default_usd,
                workshop_usd: self.rates.workshop_usd,
                categories: self.rates.category_usd.clone(),
            },
            effort: EffortTable::standard(),
            gst_rate: self.tax.gst_pct / Decimal::ONE_HUNDRED,
            document: DocumentProfile {
                title: self.document.title.clone(),
                prepared_by: self.document.prepared_by.clone(),
                ..DocumentProfile::default()
            },
        }
    }

    pub fn fx_resolver(&self) -> Result<FxResolver, RateFetchError> {
        if self.fx.offline {
            return Ok(FxResolver::offline(self.fx.fallback_usd_inr));
        }
        let timeout = Duration::from_secs(self.fx.timeout_secs);
        let provider =
            HttpRateProvider::new(self.fx.provider_url.clone(), self.fx.api_key.clone(), timeout)?;
        Ok(FxResolver::new(Box::new(provider), timeout, self.fx.fallback_usd_inr))
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(fx) = patch.fx {
            if let Some(provider_url) = fx.provider_url {
                self.fx.provider_url = provider_url;
            }
            if let Some(api_key) = fx.api_key {
                self.fx.api_key = Some(SecretString::from(api_key));
            }
            if let Some(timeout_secs) = fx.timeout_secs {
                self.fx.timeout_secs = timeout_secs;
            }
            if let Some(fallback_usd_inr) = fx.fallback_usd_inr {
                self.fx.fallback_usd_inr = fallback_usd_inr;
            }
            if let Some(offline) = fx.offline {
                self.fx.offline = offline;
            }
        }

        if let Some(rates) = patch.rates {
            if let Some(default_usd) = rates.default_usd {
                self.rates.default_usd = default_usd;
            }
            if let Some(workshop_usd) = rates.workshop_usd {
                self.rates.workshop_usd = workshop_usd;
            }
            // Listed categories replace or extend the built-in ones.
            if let Some(category_usd) = rates.category_usd {
                self.rates.category_usd.extend(category_usd);
            }
        }

        if let Some(tax) = patch.tax {
            if let Some(gst_pct) = tax.gst_pct {
                self.tax.gst_pct = gst_pct;
            }
        }

        if let Some(document) = patch.document {
            if let Some(title) = document.title {
                self.document.title = title;
            }
            if let Some(prepared_by) = document.prepared_by {
                self.document.prepared_by = prepared_by;
            }
            if let Some(footer) = document.footer {
                self.document.footer = footer;
            }
            if let Some(output_dir) = document.output_dir {
                self.document.output_dir = output_dir;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("PROPKIT_FX_PROVIDER_URL") {
            self.fx.provider_url = value;
        }
        if let Some(value) = read_env("PROPKIT_FX_API_KEY") {
            self.fx.api_key = Some(SecretString::from(value));
        }
        if let Some(value) = read_env("PROPKIT_FX_TIMEOUT_SECS") {
            self.fx.timeout_secs = parse_env("PROPKIT_FX_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("PROPKIT_FX_FALLBACK_USD_INR") {
            self.fx.fallback_usd_inr = parse_env("PROPKIT_FX_FALLBACK_USD_INR", &value)?;
        }
        if let Some(value) = read_env("PROPKIT_FX_OFFLINE") {
            self.fx.offline = parse_env("PROPKIT_FX_OFFLINE", &value)?;
        }

        if let Some(value) = read_env("PROPKIT_RATES_DEFAULT_USD") {
            self.rates.default_usd = parse_env("PROPKIT_RATES_DEFAULT_USD", &value)?;
        }
        if let Some(value) = read_env("PROPKIT_RATES_WORKSHOP_USD") {
            self.rates.workshop_usd = parse_env("PROPKIT_RATES_WORKSHOP_USD", &value)?;
        }

        if let Some(value) = read_env("PROPKIT_TAX_GST_PCT") {
            self.tax.gst_pct = parse_env("PROPKIT_TAX_GST_PCT", &value)?;
        }

        if let Some(value) = read_env("PROPKIT_DOCUMENT_TITLE") {
            self.document.title = value;
        }
        if let Some(value) = read_env("PROPKIT_DOCUMENT_PREPARED_BY") {
            self.document.prepared_by = value;
        }
        if let Some(value) = read_env("PROPKIT_DOCUMENT_FOOTER") {
            self.document.footer = value;
        }
        if let Some(value) = read_env("PROPKIT_DOCUMENT_OUTPUT_DIR") {
            self.document.output_dir = PathBuf::from(value);
        }

        let log_level =
            read_env("PROPKIT_LOGGING_LEVEL").or_else(|| read_env("PROPKIT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("PROPKIT_LOGGING_FORMAT").or_else(|| read_env("PROPKIT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(offline) = overrides.fx_offline {
            self.fx.offline = offline;
        }
        if let Some(provider_url) = overrides.fx_provider_url {
            self.fx.provider_url = provider_url;
        }
        if let Some(fallback_usd_inr) = overrides.fx_fallback_usd_inr {
            self.fx.fallback_usd_inr = fallback_usd_inr;
        }
        if let Some(gst_pct) = overrides.gst_pct {
            self.tax.gst_pct = gst_pct;
        }
        if let Some(output_dir) = overrides.output_dir {
            self.document.output_dir = output_dir;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_fx(&self.fx)?;
        validate_rates(&self.rates)?;
        validate_tax(&self.tax)?;
        validate_document(&self.document)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from(NESTED_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_fx(fx: &FxConfig) -> Result<(), ConfigError> {
    if fx.timeout_secs == 0 || fx.timeout_secs > 60 {
        return Err(ConfigError::Validation("fx.timeout_secs must be in range 1..=60".to_string()));
    }

    if fx.fallback_usd_inr <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "fx.fallback_usd_inr must be a positive rate (set PROPKIT_FX_FALLBACK_USD_INR)"
                .to_string(),
        ));
    }

    if !fx.offline {
        let url = fx.provider_url.trim();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "fx.provider_url must start with http:// or https:// (or set fx.offline = true)"
                    .to_string(),
            ));
        }
    }

    if let Some(api_key) = &fx.api_key {
        if api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "fx.api_key is set but empty; remove it or provide a key".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_rates(rates: &RatesConfig) -> Result<(), ConfigError> {
    if rates.default_usd <= Decimal::ZERO || rates.workshop_usd <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "rates.default_usd and rates.workshop_usd must be greater than zero".to_string(),
        ));
    }

    for (category, rate) in &rates.category_usd {
        if category.trim().is_empty() {
            return Err(ConfigError::Validation(
                "rates.category_usd contains an empty category name".to_string(),
            ));
        }
        if *rate <= Decimal::ZERO {
            return Err(ConfigError::Validation(format!(
                "rates.category_usd.\"{category}\" must be greater than zero"
            )));
        }
    }

    Ok(())
}

fn validate_tax(tax: &TaxConfig) -> Result<(), ConfigError> {
    if tax.gst_pct < Decimal::ZERO || tax.gst_pct > Decimal::ONE_HUNDRED {
        return Err(ConfigError::Validation("tax.gst_pct must be in range 0..=100".to_string()));
    }
    Ok(())
}

fn validate_document(document: &DocumentConfig) -> Result<(), ConfigError> {
    if document.title.trim().is_empty() {
        return Err(ConfigError::Validation("document.title must not be empty".to_string()));
    }
    if document.prepared_by.trim().is_empty() {
        return Err(ConfigError::Validation("document.prepared_by must not be empty".to_string()));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    fx: Option<FxPatch>,
    rates: Option<RatesPatch>,
    tax: Option<TaxPatch>,
    document: Option<DocumentPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct FxPatch {
    provider_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
    fallback_usd_inr: Option<Decimal>,
    offline: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct RatesPatch {
    default_usd: Option<Decimal>,
    workshop_usd: Option<Decimal>,
    category_usd: Option<BTreeMap<String, Decimal>>,
}

#[derive(Debug, Default, Deserialize)]
struct TaxPatch {
    gst_pct: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentPatch {
    title: Option<String>,
    prepared_by: Option<String>,
    footer: Option<String>,
    output_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use rust_decimal::Decimal;
    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
    use crate::costing::fx::RatePath;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_validate_and_build_standard_tables() -> Result<(), String> {
        let config = AppConfig::default();
        config.validate().map_err(|err| err.to_string())?;

        let tables = config.engine_tables();
        ensure(tables.gst_rate == Decimal::new(18, 2), "default gst rate should be 0.18")?;
        ensure(
            tables.rate_card.categories.get("Assessment Services") == Some(&Decimal::from(600)),
            "assessment services should bill at 600",
        )?;
        ensure(
            config.fx.fallback_usd_inr == Decimal::new(8795, 2),
            "fallback rate should default to 87.95",
        )?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_PROPKIT_FX_KEY", "key-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("propkit.toml");
            fs::write(
                &path,
                r#"
[fx]
api_key = "${TEST_PROPKIT_FX_KEY}"
fallback_usd_inr = 86.10

[rates.category_usd]
"Training & Support" = 350
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.fx.api_key.as_ref().map(|key| key.expose_secret()) == Some("key-from-env"),
                "api key should be interpolated from the environment",
            )?;
            ensure(
                config.fx.fallback_usd_inr == Decimal::new(8610, 2),
                "fallback rate should come from the file",
            )?;
            ensure(
                config.rates.category_usd.get("Training & Support") == Some(&Decimal::from(350)),
                "file categories should extend the rate card",
            )?;
            ensure(
                config.rates.category_usd.contains_key("Migration Services"),
                "built-in categories should survive a partial table",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_PROPKIT_FX_KEY"]);
        result
    }

    #[test]
    fn missing_interpolation_variable_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&["TEST_PROPKIT_UNSET_VAR"]);

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("propkit.toml");
        fs::write(&path, "[document]\nfooter = \"${TEST_PROPKIT_UNSET_VAR}\"\n")
            .map_err(|err| err.to_string())?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            {
                Ok(_) => return Err("expected interpolation failure".to_string()),
                Err(error) => error,
            };
        ensure(
            matches!(error, ConfigError::MissingEnvInterpolation { ref var } if var == "TEST_PROPKIT_UNSET_VAR"),
            "error should name the missing variable",
        )
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PROPKIT_FX_FALLBACK_USD_INR", "85.25");
        env::set_var("PROPKIT_DOCUMENT_TITLE", "Title From Env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("propkit.toml");
            fs::write(
                &path,
                r#"
[fx]
fallback_usd_inr = 80.00
timeout_secs = 9

[document]
title = "Title From File"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    log_level: Some("debug".to_string()),
                    fx_offline: Some(true),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.fx.timeout_secs == 9, "file timeout should win over the default")?;
            ensure(
                config.fx.fallback_usd_inr == Decimal::new(8525, 2),
                "env fallback rate should win over the file",
            )?;
            ensure(config.document.title == "Title From Env", "env title should win over file")?;
            ensure(config.logging.level == "debug", "override log level should win")?;
            ensure(config.fx.offline, "override should switch fx offline")?;
            Ok(())
        })();

        clear_vars(&["PROPKIT_FX_FALLBACK_USD_INR", "PROPKIT_DOCUMENT_TITLE"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PROPKIT_LOG_LEVEL", "warn");
        env::set_var("PROPKIT_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )
        })();

        clear_vars(&["PROPKIT_LOG_LEVEL", "PROPKIT_LOG_FORMAT"]);
        result
    }

    #[test]
    fn malformed_env_override_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PROPKIT_FX_FALLBACK_USD_INR", "eighty-seven");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected invalid override".to_string()),
            Err(error) => ensure(
                matches!(error, ConfigError::InvalidEnvOverride { ref key, .. } if key == "PROPKIT_FX_FALLBACK_USD_INR"),
                "error should name the offending variable",
            ),
        };

        clear_vars(&["PROPKIT_FX_FALLBACK_USD_INR"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PROPKIT_TAX_GST_PCT", "120");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            ensure(
                matches!(error, ConfigError::Validation(ref message) if message.contains("tax.gst_pct")),
                "validation failure should mention tax.gst_pct",
            )
        })();

        clear_vars(&["PROPKIT_TAX_GST_PCT"]);
        result
    }

    #[test]
    fn timeout_outside_range_is_rejected() {
        let mut config = AppConfig::default();
        config.fx.timeout_secs = 61;

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(message)) if message.contains("fx.timeout_secs")
        ));
    }

    #[test]
    fn required_file_must_exist() -> Result<(), String> {
        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = dir.path().join("absent.toml");

        let outcome = AppConfig::load(LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        });
        ensure(
            matches!(outcome, Err(ConfigError::MissingConfigFile(ref missing)) if *missing == path),
            "missing required file should be reported with its path",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("PROPKIT_FX_API_KEY", "fx-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("fx-secret-value"), "debug output should not contain api key")
        })();

        clear_vars(&["PROPKIT_FX_API_KEY"]);
        result
    }

    #[tokio::test]
    async fn offline_resolver_takes_the_buffered_fallback() {
        let mut config = AppConfig::default();
        config.fx.offline = true;

        let resolver = config.fx_resolver().expect("offline resolver builds");
        let rate = resolver.resolve().await;

        assert_eq!(rate.path, RatePath::Fallback);
        assert_eq!(rate.rate, Decimal::new(8895, 2));
    }
}
