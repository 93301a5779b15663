//! Core error types
//!
//! Two families live here:
//! - [`CoreError`]: loading a pack from disk (files, YAML, versions, `--set`)
//! - [`RenderError`]: the render taxonomy (schema, reference, conflict)

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Pack not found: {path}")]
    PackNotFound { path: String },

    #[error("Invalid Pack.yaml: {message}")]
    InvalidPack { message: String },

    #[error("Environment `{name}` not found (available: {available})")]
    EnvironmentNotFound { name: String, available: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid version: {0}")]
    InvalidVersion(#[from] semver::Error),

    #[error("Values merge error: {message}")]
    ValuesMerge { message: String },

    #[error("Invalid values: {message}")]
    InvalidValues { message: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Category of a [`RenderError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderErrorKind {
    SchemaValidation,
    Referential,
    Conflict,
}

impl RenderErrorKind {
    /// Short code used in JSON output and diagnostics
    pub fn to_code_string(&self) -> &'static str {
        match self {
            Self::SchemaValidation => "schema",
            Self::Referential => "reference",
            Self::Conflict => "conflict",
        }
    }
}

/// A structural failure that aborts a render
///
/// Every variant carries enough context (subject, field, host/path, names)
/// to locate the offending configuration entry.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Missing required field, unrecognized enum value or violated invariant
    #[error("{subject}: `{field}` {message}")]
    #[diagnostic(code(fleetpack::schema))]
    SchemaValidation {
        /// Entry the field belongs to, e.g. `apps[1] (worker)` or `global`
        subject: String,
        /// Dotted field path, e.g. `image.name`
        field: String,
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A cross-reference points at a missing or ineligible target
    #[error("ingress rule `{host}{path}`: backend `{backend}` {message}")]
    #[diagnostic(code(fleetpack::reference))]
    Referential {
        host: String,
        path: String,
        backend: String,
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Two entries claim the same identity
    #[error("duplicate {what} `{name}` ({first} and {second})")]
    #[diagnostic(code(fleetpack::conflict))]
    Conflict {
        /// What collided, e.g. `application name` or `Service name`
        what: String,
        name: String,
        first: String,
        second: String,
    },
}

impl RenderError {
    /// Create a schema validation error
    pub fn schema(
        subject: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SchemaValidation {
            subject: subject.into(),
            field: field.into(),
            message: message.into(),
            help: None,
        }
    }

    /// Create a referential error for an ingress backend
    pub fn reference(
        host: impl Into<String>,
        path: impl Into<String>,
        backend: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Referential {
            host: host.into(),
            path: path.into(),
            backend: backend.into(),
            message: message.into(),
            help: None,
        }
    }

    /// Create a conflict error
    pub fn conflict(
        what: impl Into<String>,
        name: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self::Conflict {
            what: what.into(),
            name: name.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// Attach a hint; ignored for conflicts, which carry no help text
    pub fn with_help(mut self, hint: impl Into<String>) -> Self {
        match &mut self {
            Self::SchemaValidation { help, .. } | Self::Referential { help, .. } => {
                *help = Some(hint.into());
            }
            Self::Conflict { .. } => {}
        }
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> RenderErrorKind {
        match self {
            Self::SchemaValidation { .. } => RenderErrorKind::SchemaValidation,
            Self::Referential { .. } => RenderErrorKind::Referential,
            Self::Conflict { .. } => RenderErrorKind::Conflict,
        }
    }

    /// The hint attached to this error, if any
    pub fn help_text(&self) -> Option<&str> {
        match self {
            Self::SchemaValidation { help, .. } | Self::Referential { help, .. } => {
                help.as_deref()
            }
            Self::Conflict { .. } => None,
        }
    }
}

/// Format the subject of an application entry: `apps[1] (worker)`
pub fn app_subject(index: usize, name: &str) -> String {
    if name.is_empty() {
        format!("apps[{}]", index)
    } else {
        format!("apps[{}] ({})", index, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display() {
        let err = RenderError::schema("apps[0] (api)", "image.name", "is required");
        assert_eq!(err.to_string(), "apps[0] (api): `image.name` is required");
        assert_eq!(err.kind(), RenderErrorKind::SchemaValidation);
    }

    #[test]
    fn test_reference_error_display() {
        let err = RenderError::reference("shop.example.com", "/api", "api:9090", "port not declared");
        assert_eq!(
            err.to_string(),
            "ingress rule `shop.example.com/api`: backend `api:9090` port not declared"
        );
        assert_eq!(err.kind().to_code_string(), "reference");
    }

    #[test]
    fn test_conflict_error_names_both_entries() {
        let err = RenderError::conflict("application name", "svc", "apps[0]", "apps[1]");
        let msg = err.to_string();
        assert!(msg.contains("`svc`"));
        assert!(msg.contains("apps[0] and apps[1]"));
    }

    #[test]
    fn test_with_help() {
        let err = RenderError::schema("global", "namespace", "is empty").with_help("set it");
        assert_eq!(err.help_text(), Some("set it"));

        let conflict = RenderError::conflict("x", "y", "a", "b").with_help("ignored");
        assert_eq!(conflict.help_text(), None);
    }

    #[test]
    fn test_app_subject() {
        assert_eq!(app_subject(1, "worker"), "apps[1] (worker)");
        assert_eq!(app_subject(3, ""), "apps[3]");
    }
}
