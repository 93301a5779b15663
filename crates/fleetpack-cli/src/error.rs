//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use fleetpack_core::{CoreError, RenderError, RenderErrorKind};
use fleetpack_engine::EngineError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// A single render failure, shown with its own diagnostic
    #[error(transparent)]
    #[diagnostic(transparent)]
    Render(RenderError),

    /// Validate-only run found errors (already printed)
    #[error("Validation failed: {summary}")]
    #[diagnostic(code(fleetpack::cli::validation))]
    ValidationFailed {
        summary: String,
        /// Kind of the first error, decides the exit code
        kind: RenderErrorKind,
    },

    /// Pack structure or loading error
    #[error("Pack error: {message}")]
    #[diagnostic(code(fleetpack::cli::pack))]
    Pack {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Values could not be parsed or decoded
    #[error("Invalid values: {message}")]
    #[diagnostic(code(fleetpack::cli::values))]
    Values {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(fleetpack::cli::io))]
    Io { message: String },

    /// Anything else
    #[error("{message}")]
    #[diagnostic(code(fleetpack::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Render(e) => kind_exit_code(e.kind()),
            CliError::ValidationFailed { kind, .. } => kind_exit_code(*kind),
            CliError::Pack { .. } => exit_codes::PACK_ERROR,
            CliError::Values { .. } => exit_codes::SCHEMA_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a pack error
    pub fn pack(message: impl Into<String>) -> Self {
        Self::Pack {
            message: message.into(),
            help: None,
        }
    }

    /// Create a pack error with help text
    pub fn pack_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Pack {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a values error with help text
    pub fn values_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Values {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Wrap a loading error from `Pack.yaml`, which is always a pack problem
    pub fn pack_load(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => Self::from(e),
            other => Self::pack(other.to_string()),
        }
    }
}

fn kind_exit_code(kind: RenderErrorKind) -> i32 {
    match kind {
        RenderErrorKind::SchemaValidation => exit_codes::SCHEMA_ERROR,
        RenderErrorKind::Referential => exit_codes::REFERENCE_ERROR,
        RenderErrorKind::Conflict => exit_codes::CONFLICT_ERROR,
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => Self::from(e),
            CoreError::EnvironmentNotFound { .. } => Self::pack_with_help(
                err.to_string(),
                "environments are read from `environments/<name>.yaml` in the pack",
            ),
            CoreError::PackNotFound { .. }
            | CoreError::InvalidPack { .. }
            | CoreError::InvalidVersion(_) => Self::pack(err.to_string()),
            CoreError::ValuesMerge { .. } => {
                Self::values_with_help(err.to_string(), "use --set key=value, e.g. --set global.activeColor=green")
            }
            CoreError::YamlParse(_) | CoreError::JsonParse(_) | CoreError::InvalidValues { .. } => {
                Self::Values {
                    message: err.to_string(),
                    help: None,
                }
            }
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Render(e) => CliError::Render(e),
            EngineError::Yaml(e) => CliError::Other {
                message: format!("Failed to serialize manifests: {}", e),
            },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_exit_codes() {
        let schema = CliError::Render(RenderError::schema("global", "namespace", "is invalid"));
        let reference = CliError::Render(RenderError::reference("h", "/", "api:1", "is bad"));
        let conflict = CliError::Render(RenderError::conflict("application name", "svc", "a", "b"));

        assert_eq!(schema.exit_code(), exit_codes::SCHEMA_ERROR);
        assert_eq!(reference.exit_code(), exit_codes::REFERENCE_ERROR);
        assert_eq!(conflict.exit_code(), exit_codes::CONFLICT_ERROR);
    }

    #[test]
    fn test_core_error_mapping() {
        let missing = CliError::from(CoreError::EnvironmentNotFound {
            name: "qa".to_string(),
            available: "prod".to_string(),
        });
        assert_eq!(missing.exit_code(), exit_codes::PACK_ERROR);

        let values = CliError::from(CoreError::InvalidValues {
            message: "bad".to_string(),
        });
        assert_eq!(values.exit_code(), exit_codes::SCHEMA_ERROR);

        let io = CliError::from(CoreError::Io(std::io::Error::other("boom")));
        assert_eq!(io.exit_code(), exit_codes::IO_ERROR);
    }
}
