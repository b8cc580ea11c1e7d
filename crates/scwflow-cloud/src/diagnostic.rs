//! Host-facing diagnostics
//!
//! Controllers return [`crate::Result`]; the host turns the error side into
//! a list of diagnostics. No controller recovers after a diagnostic, so a
//! failed operation always yields exactly one error entry.

use crate::error::{CloudError, ErrorKind};
use serde::{Deserialize, Serialize};

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A single message reported back to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,

    /// Short one-line summary
    pub summary: String,

    /// Longer explanation, may be empty
    pub detail: String,

    /// Attribute path the message is pinned to (e.g. `cron.0.schedule`)
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: String::new(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: String::new(),
            attribute: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }
}

impl From<&CloudError> for Diagnostic {
    fn from(err: &CloudError) -> Self {
        let mut diag = Diagnostic::error(err.to_string()).with_detail(format!("kind: {}", err.kind()));
        if let Some(attribute) = err.attribute() {
            diag = diag.with_attribute(attribute);
        }
        diag
    }
}

/// Ordered list of diagnostics for one operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.0.push(diag);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Converts an operation outcome into the host's diagnostic list
    pub fn from_result<T>(result: &crate::Result<T>) -> Self {
        let mut diags = Self::new();
        if let Err(err) = result {
            diags.push(Diagnostic::from(err));
        }
        diags
    }

    /// Kind of the first error entry, used by hosts deciding on re-planning
    pub fn first_error_kind(result: &crate::Result<()>) -> Option<ErrorKind> {
        result.as_ref().err().map(CloudError::kind)
    }
}

impl From<CloudError> for Diagnostics {
    fn from(err: CloudError) -> Self {
        let mut diags = Self::new();
        diags.push(Diagnostic::from(&err));
        diags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pinned_diagnostic() {
        let err = CloudError::invalid_attribute("timeout", "invalid duration \"soon\"");
        let diags = Diagnostics::from(err);
        assert_eq!(diags.len(), 1);
        let first = diags.iter().next().unwrap();
        assert_eq!(first.attribute.as_deref(), Some("timeout"));
        assert!(diags.has_errors());
    }

    #[test]
    fn test_success_has_no_diagnostics() {
        let ok: crate::Result<()> = Ok(());
        assert!(Diagnostics::from_result(&ok).is_empty());
        assert_eq!(Diagnostics::first_error_kind(&ok), None);
    }
}
