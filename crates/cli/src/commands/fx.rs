use propkit_core::{config::ConfigOverrides, ApplicationError};

use crate::commands::{CommandResult, ConfigSource};

/// Resolves the rate a build started now would bill at.
pub fn run(offline: bool, source: &ConfigSource) -> CommandResult {
    match execute(offline, source) {
        Ok(message) => CommandResult::success("fx", message),
        Err(error) => CommandResult::from_application_error("fx", error),
    }
}

fn execute(offline: bool, source: &ConfigSource) -> Result<String, ApplicationError> {
    let config = source
        .load(ConfigOverrides { fx_offline: offline.then_some(true), ..ConfigOverrides::default() })?;
    let resolver =
        config.fx_resolver().map_err(|error| ApplicationError::Integration(error.to_string()))?;

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        ApplicationError::Integration(format!("failed to initialize async runtime: {error}"))
    })?;
    let rate = runtime.block_on(resolver.resolve());

    Ok(format!(
        "1 USD = {} INR (raw {}, path {:?}, source: {})",
        rate.rate, rate.raw_rate, rate.path, rate.source
    ))
}
