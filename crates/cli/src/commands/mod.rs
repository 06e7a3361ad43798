pub mod build;
pub mod config;
pub mod doctor;
pub mod fx;
pub mod words;

use std::path::PathBuf;

use propkit_core::{
    config::{AppConfig, ConfigOverrides, LoadOptions},
    ApplicationError,
};
use serde::Serialize;
use uuid::Uuid;

pub const EXIT_BUILD_FAILURE: u8 = 1;
pub const EXIT_CONFIG_FAILURE: u8 = 2;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Configuration problems exit with 2, everything else with 1. The
    /// message carries a correlation id so a report can be matched to logs.
    pub fn from_application_error(command: &str, error: ApplicationError) -> Self {
        let (error_class, exit_code) = match &error {
            ApplicationError::Configuration(_) => ("config_validation", EXIT_CONFIG_FAILURE),
            ApplicationError::Input(_) => ("input", EXIT_BUILD_FAILURE),
            ApplicationError::Integration(_) => ("integration", EXIT_BUILD_FAILURE),
            ApplicationError::Assembly(_) => ("assembly", EXIT_BUILD_FAILURE),
        };
        let correlation_id = Uuid::new_v4().to_string();
        let interface = error.into_interface(correlation_id.clone());
        tracing::error!(
            event_name = "cli.command.failed",
            correlation_id = %correlation_id,
            command,
            error_class,
            error = %interface,
            "command failed"
        );
        let message = format!("{} {interface} (correlation_id {correlation_id})", interface.user_message());
        Self::failure(command, error_class, message, exit_code)
    }
}

/// How a command finds its configuration: an explicit `--config` file must
/// exist, otherwise the default locations are optional.
#[derive(Clone, Debug, Default)]
pub struct ConfigSource {
    pub path: Option<PathBuf>,
}

impl ConfigSource {
    pub fn load(&self, overrides: ConfigOverrides) -> Result<AppConfig, ApplicationError> {
        AppConfig::load(LoadOptions {
            config_path: self.path.clone(),
            require_file: self.path.is_some(),
            overrides,
        })
        .map_err(ApplicationError::from)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
