//! Validator diagnostics.

use std::fmt;

use serde::Serialize;

use crate::error::SchemaError;

/// Severity of a diagnostic. Errors block emission; warnings do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// One finding: a stable code, the offending path and a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,

    /// `DEFKIT-Exxx`/`DEFKIT-Wxxx` for schema checks, `IR-Exxx`/`IR-Wxxx`
    /// for operation log checks
    pub code: &'static str,

    pub path: String,

    pub message: String,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn error(code: &'static str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, path, message)
    }

    pub fn warning(code: &'static str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, path, message)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<&SchemaError> for Diagnostic {
    fn from(err: &SchemaError) -> Self {
        Diagnostic::error(err.code(), err.path(), err.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}] {}: {}",
            self.severity.as_str(),
            self.code,
            self.path,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let d = Diagnostic::warning("DEFKIT-W002", "parameter.image", "missing description");
        assert_eq!(
            d.to_string(),
            "warning[DEFKIT-W002] parameter.image: missing description"
        );
        assert!(!d.is_error());
    }

    #[test]
    fn test_from_schema_error() {
        let err = SchemaError::EmptyEnum {
            param: "mode".to_string(),
        };
        let d = Diagnostic::from(&err);
        assert!(d.is_error());
        assert_eq!(d.code, "DEFKIT-E004");
        assert_eq!(d.path, "parameter.mode");
    }
}
