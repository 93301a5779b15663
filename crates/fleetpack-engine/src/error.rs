//! Engine error types and the validate-only report

use fleetpack_core::{RenderError, RenderErrorKind};
use indexmap::IndexMap;
use miette::Diagnostic;
use thiserror::Error;

/// Main engine error type
#[derive(Error, Debug, Diagnostic)]
pub enum EngineError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Render(#[from] RenderError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl EngineError {
    /// Render error kind, if this is a render failure
    pub fn render_kind(&self) -> Option<RenderErrorKind> {
        match self {
            Self::Render(e) => Some(e.kind()),
            Self::Yaml(_) => None,
        }
    }
}

/// All render errors of one input, grouped by the entry they concern
#[derive(Debug, Default, Clone)]
pub struct RenderReport {
    /// Errors grouped by subject (IndexMap preserves insertion order)
    pub errors_by_subject: IndexMap<String, Vec<RenderError>>,

    /// Total error count
    pub total_errors: usize,
}

impl RenderReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error under the subject it concerns
    pub fn add_error(&mut self, error: RenderError) {
        self.errors_by_subject
            .entry(subject_of(&error))
            .or_default()
            .push(error);
        self.total_errors += 1;
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = RenderError>) {
        for error in errors {
            self.add_error(error);
        }
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Get count of subjects with errors
    pub fn subjects_with_errors(&self) -> usize {
        self.errors_by_subject.len()
    }

    /// All errors in insertion order
    pub fn errors(&self) -> impl Iterator<Item = &RenderError> {
        self.errors_by_subject.values().flatten()
    }

    /// The first error recorded
    pub fn first(&self) -> Option<&RenderError> {
        self.errors().next()
    }

    /// Number of errors of one kind
    pub fn count(&self, kind: RenderErrorKind) -> usize {
        self.errors().filter(|e| e.kind() == kind).count()
    }

    /// Generate summary message: "5 errors in 3 entries"
    pub fn summary(&self) -> String {
        let entry_word = if self.subjects_with_errors() == 1 {
            "entry"
        } else {
            "entries"
        };
        let error_word = if self.total_errors == 1 {
            "error"
        } else {
            "errors"
        };
        format!(
            "{} {} in {} {}",
            self.total_errors,
            error_word,
            self.subjects_with_errors(),
            entry_word
        )
    }
}

fn subject_of(error: &RenderError) -> String {
    match error {
        RenderError::SchemaValidation { subject, .. } => subject.clone(),
        RenderError::Referential { .. } => "ingress".to_string(),
        RenderError::Conflict { what, .. } => format!("{} conflicts", what),
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_report_new() {
        let report = RenderReport::new();
        assert!(!report.has_errors());
        assert_eq!(report.total_errors, 0);
        assert_eq!(report.subjects_with_errors(), 0);
        assert!(report.first().is_none());
    }

    #[test]
    fn test_render_report_groups_by_subject() {
        let mut report = RenderReport::new();
        report.add_error(RenderError::schema("apps[0] (api)", "image.name", "is required"));
        report.add_error(RenderError::schema("apps[0] (api)", "image.tag", "is required"));
        report.add_error(RenderError::reference("a.example.com", "/", "web:80", "is unknown"));

        assert_eq!(report.total_errors, 3);
        assert_eq!(report.subjects_with_errors(), 2);
        assert_eq!(report.errors_by_subject["apps[0] (api)"].len(), 2);
        assert_eq!(report.count(RenderErrorKind::Referential), 1);
        assert_eq!(report.summary(), "3 errors in 2 entries");
    }

    #[test]
    fn test_render_report_summary_singular() {
        let mut report = RenderReport::new();
        report.add_error(RenderError::conflict("application name", "svc", "apps[0]", "apps[1]"));
        assert_eq!(report.summary(), "1 error in 1 entry");
        assert!(report.errors_by_subject.contains_key("application name conflicts"));
    }

    #[test]
    fn test_engine_error_kind() {
        let err = EngineError::from(RenderError::schema("global", "namespace", "is invalid"));
        assert_eq!(err.render_kind(), Some(RenderErrorKind::SchemaValidation));
        assert_eq!(err.to_string(), "global: `namespace` is invalid");
    }
}
