//! Error types for the compiler.
//!
//! Every failure is returned as a value so that a batch driver can keep
//! compiling sibling definitions after one of them fails.

use std::path::PathBuf;
use thiserror::Error;

use crate::validate::Diagnostic;

/// Result type alias for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// Top-level error for compiling one definition.
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    /// The traced definition could not be captured into IR.
    #[error("definition '{definition}': {source}")]
    Schema {
        definition: String,
        #[source]
        source: SchemaError,
    },

    /// The validator reported blocking diagnostics.
    #[error("definition '{definition}' failed validation:\n{}", format_diagnostics(.diagnostics))]
    Validation {
        definition: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// CUE generation hit an unsupported construct.
    #[error("definition '{definition}': {source}")]
    Emission {
        definition: String,
        #[source]
        source: EmissionError,
    },
}

impl CompileError {
    /// Name of the definition that failed.
    pub fn definition(&self) -> &str {
        match self {
            CompileError::Schema { definition, .. }
            | CompileError::Validation { definition, .. }
            | CompileError::Emission { definition, .. } => definition,
        }
    }

    /// Stable machine-readable codes carried by this error.
    pub fn codes(&self) -> Vec<&'static str> {
        match self {
            CompileError::Schema { source, .. } => vec![source.code()],
            CompileError::Validation { diagnostics, .. } => {
                diagnostics.iter().map(|d| d.code).collect()
            }
            CompileError::Emission { source, .. } => vec![source.code()],
        }
    }
}

/// Build-time error raised while capturing parameters and operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("parameter '{name}' is declared more than once")]
    DuplicateParameter { name: String },

    #[error("'{name}' is not a valid parameter or field name")]
    InvalidName { name: String },

    #[error("parameter '{param}' cannot be both required and defaulted")]
    RequiredWithDefault { param: String },

    #[error("default of parameter '{param}' is not a valid {expected}")]
    DefaultTypeMismatch { param: String, expected: String },

    #[error("default {value} of parameter '{param}' violates bound {bound}")]
    DefaultOutOfRange {
        param: String,
        value: String,
        bound: String,
    },

    #[error("default {value} of parameter '{param}' is not one of the enum values")]
    DefaultNotInEnum { param: String, value: String },

    #[error("enum parameter '{param}' has no values")]
    EmptyEnum { param: String },

    #[error("parameter '{param}' has {constraint} greater than its upper bound")]
    InvertedBounds { param: String, constraint: String },

    #[error("constraint {constraint} does not apply to {kind} parameter '{param}'")]
    ConstraintMismatch {
        param: String,
        constraint: String,
        kind: String,
    },

    #[error("parameter '{param}' has invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        param: String,
        pattern: String,
        message: String,
    },

    #[error("default {value} of parameter '{param}' does not match pattern '{pattern}'")]
    DefaultPatternMismatch {
        param: String,
        value: String,
        pattern: String,
    },

    #[error("'{param}' declares field '{field}' more than once")]
    DuplicateField { param: String, field: String },

    #[error("union '{param}' has no variants")]
    EmptyUnion { param: String },

    #[error("union '{param}' declares variant '{variant}' more than once")]
    DuplicateVariant { param: String, variant: String },

    #[error("union '{param}' is ambiguous: a value can match both '{first}' and '{second}'")]
    AmbiguousUnion {
        param: String,
        first: String,
        second: String,
    },

    #[error("variant '{variant}' of union '{param}' declares the discriminator field '{field}'")]
    DiscriminatorClash {
        param: String,
        variant: String,
        field: String,
    },

    #[error("unbalanced conditional scope: {detail}")]
    UnbalancedScope { detail: String },

    #[error("parameter '{param}' belongs to a different definition")]
    ForeignParameter { param: String },

    #[error("parameter '{param}' is not declared in this definition")]
    UnknownParameter { param: String },

    #[error("parameter '{param}' has no field '{field}'")]
    UnknownParamField { param: String, field: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("path '{path}' writes into a reserved template field")]
    ReservedPath { path: String },

    #[error("content hash mismatch: document says {declared}, contents hash to {actual}")]
    HashMismatch { declared: String, actual: String },
}

impl SchemaError {
    /// Stable diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::RequiredWithDefault { .. } => "DEFKIT-E001",
            SchemaError::DefaultOutOfRange { .. } => "DEFKIT-E002",
            SchemaError::DefaultNotInEnum { .. } => "DEFKIT-E003",
            SchemaError::EmptyEnum { .. } => "DEFKIT-E004",
            SchemaError::AmbiguousUnion { .. } => "DEFKIT-E005",
            SchemaError::DuplicateVariant { .. } => "DEFKIT-E006",
            SchemaError::DiscriminatorClash { .. } => "DEFKIT-E007",
            SchemaError::EmptyUnion { .. } => "DEFKIT-E008",
            SchemaError::InvertedBounds { .. } => "DEFKIT-E011",
            SchemaError::InvalidPattern { .. } => "DEFKIT-E012",
            SchemaError::DefaultPatternMismatch { .. } => "DEFKIT-E013",
            SchemaError::DefaultTypeMismatch { .. } => "DEFKIT-E014",
            SchemaError::ConstraintMismatch { .. } => "DEFKIT-E015",
            SchemaError::DuplicateParameter { .. } => "DEFKIT-E016",
            SchemaError::DuplicateField { .. } => "DEFKIT-E017",
            SchemaError::InvalidName { .. } => "DEFKIT-E018",
            SchemaError::UnbalancedScope { .. } => "IR-E001",
            SchemaError::UnknownParameter { .. } => "IR-E002",
            SchemaError::ForeignParameter { .. } => "IR-E003",
            SchemaError::UnknownParamField { .. } => "IR-E004",
            SchemaError::InvalidPath { .. } => "IR-E005",
            SchemaError::ReservedPath { .. } => "IR-E006",
            SchemaError::HashMismatch { .. } => "IR-E007",
        }
    }

    /// The parameter or path the error points at.
    pub fn path(&self) -> String {
        match self {
            SchemaError::DuplicateParameter { name } | SchemaError::InvalidName { name } => {
                format!("parameter.{name}")
            }
            SchemaError::RequiredWithDefault { param }
            | SchemaError::DefaultTypeMismatch { param, .. }
            | SchemaError::DefaultOutOfRange { param, .. }
            | SchemaError::DefaultNotInEnum { param, .. }
            | SchemaError::EmptyEnum { param }
            | SchemaError::InvertedBounds { param, .. }
            | SchemaError::ConstraintMismatch { param, .. }
            | SchemaError::InvalidPattern { param, .. }
            | SchemaError::DefaultPatternMismatch { param, .. }
            | SchemaError::EmptyUnion { param }
            | SchemaError::DuplicateVariant { param, .. }
            | SchemaError::AmbiguousUnion { param, .. }
            | SchemaError::DiscriminatorClash { param, .. }
            | SchemaError::ForeignParameter { param }
            | SchemaError::UnknownParameter { param } => format!("parameter.{param}"),
            SchemaError::DuplicateField { param, field }
            | SchemaError::UnknownParamField { param, field } => {
                format!("parameter.{param}.{field}")
            }
            SchemaError::InvalidPath { path, .. } | SchemaError::ReservedPath { path } => {
                path.clone()
            }
            SchemaError::UnbalancedScope { .. } | SchemaError::HashMismatch { .. } => {
                String::new()
            }
        }
    }
}

/// Error raised while generating CUE text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmissionError {
    #[error("ambiguous overwrite: '{path}' is written more than once without mutually exclusive conditions")]
    AmbiguousOverwrite { path: String },

    #[error("'{path}' conflicts with a write to '{other}'")]
    PathConflict { path: String, other: String },

    #[error("unrecognized context path '{path}'")]
    UnknownContextPath { path: String },

    #[error("conditional write to '{path}' needs unification: {reason}")]
    UnsupportedConditional { path: String, reason: String },

    #[error("unbalanced conditional scope: {detail}")]
    UnbalancedScope { detail: String },

    #[error("cannot render literal: {detail}")]
    InvalidLiteral { detail: String },

    #[error("'{path}' writes list index {index} but the list has {len} item(s); list writes must be contiguous")]
    SparseListIndex {
        path: String,
        index: usize,
        len: usize,
    },
}

impl EmissionError {
    /// Stable diagnostic code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            EmissionError::AmbiguousOverwrite { .. } => "EMIT-E001",
            EmissionError::PathConflict { .. } => "EMIT-E002",
            EmissionError::UnknownContextPath { .. } => "EMIT-E003",
            EmissionError::UnsupportedConditional { .. } => "EMIT-E004",
            EmissionError::UnbalancedScope { .. } => "EMIT-E005",
            EmissionError::InvalidLiteral { .. } => "EMIT-E006",
            EmissionError::SparseListIndex { .. } => "EMIT-E007",
        }
    }
}

/// Error loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid TOML syntax.
    #[error("Invalid TOML in {path}: {message}")]
    InvalidToml { path: PathBuf, message: String },

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// IO error reading config.
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    /// Create an invalid TOML error.
    pub fn invalid_toml(path: PathBuf, message: impl Into<String>) -> Self {
        Self::InvalidToml {
            path,
            message: message.into(),
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Error from the definition registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("definition '{name}' is already registered")]
    Duplicate { name: String },

    #[error("no definition matches '{name}'")]
    NotFound { name: String },

    #[error("'{name}' is ambiguous, candidates: {}", .candidates.join(", "))]
    Ambiguous {
        name: String,
        candidates: Vec<String>,
    },
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .enumerate()
        .map(|(i, d)| format!("  {}. {}", i + 1, d))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::Severity;

    #[test]
    fn test_schema_error_codes_are_stable() {
        let err = SchemaError::RequiredWithDefault {
            param: "replicas".to_string(),
        };
        assert_eq!(err.code(), "DEFKIT-E001");
        assert_eq!(err.path(), "parameter.replicas");

        let err = SchemaError::UnbalancedScope {
            detail: "1 scope left open".to_string(),
        };
        assert_eq!(err.code(), "IR-E001");
    }

    #[test]
    fn test_compile_error_display_lists_diagnostics() {
        let err = CompileError::Validation {
            definition: "webservice".to_string(),
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "DEFKIT-E009",
                "parameter.a",
                "conditional requirement cycle",
            )],
        };
        let display = err.to_string();
        assert!(display.contains("webservice"));
        assert!(display.contains("1. error[DEFKIT-E009]"));
        assert_eq!(err.codes(), vec!["DEFKIT-E009"]);
    }

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::Ambiguous {
            name: "webservice".to_string(),
            candidates: vec!["a/webservice".to_string(), "b/webservice".to_string()],
        };
        assert!(err.to_string().contains("a/webservice, b/webservice"));
    }
}
