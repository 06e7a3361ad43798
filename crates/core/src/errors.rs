use thiserror::Error;

use crate::{
    config::ConfigError,
    domain::{plan::PlanScope, section::UpstreamContentError},
    render::RenderError,
};

/// Terminal failure of a build. Everything recoverable (FX fetch, garbled
/// sections, malformed blocks) is handled locally and never reaches here.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("renderer failed while processing {scope}: {source}")]
    Render {
        scope: PlanScope,
        #[source]
        source: RenderError,
    },
    #[error("engine initialisation failed: {0}")]
    Engine(String),
}

impl AssemblyError {
    /// The part of the document being emitted when the renderer failed.
    pub fn scope(&self) -> Option<&PlanScope> {
        match self {
            Self::Render { scope, .. } => Some(scope),
            Self::Engine(_) => None,
        }
    }
}

impl From<regex::Error> for AssemblyError {
    fn from(value: regex::Error) -> Self {
        Self::Engine(format!("pattern compilation failed: {value}"))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    #[error("input rejected: {0}")]
    Input(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl From<UpstreamContentError> for ApplicationError {
    fn from(value: UpstreamContentError) -> Self {
        Self::Input(value.to_string())
    }
}

impl From<ConfigError> for ApplicationError {
    fn from(value: ConfigError) -> Self {
        Self::Configuration(value.to_string())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The proposal input could not be processed. Check the section mapping and try again."
            }
            Self::ServiceUnavailable { .. } => {
                "A downstream service is temporarily unavailable. Please retry shortly."
            }
            Self::Internal { .. } => "The proposal document could not be produced.",
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        match value {
            ApplicationError::Input(message) => {
                Self::BadRequest { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Integration(message) => {
                Self::ServiceUnavailable { message, correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Assembly(error) => {
                Self::Internal { message: error.to_string(), correlation_id: "unassigned".to_owned() }
            }
            ApplicationError::Configuration(message) => {
                Self::Internal { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}
