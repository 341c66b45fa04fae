//! Error types for the harmonization engine.
//!
//! This module defines one error type per concern:
//!
//! - [`IngestError`] - reading files into grids
//! - [`SchemaError`] - loading and looking up provider schemas
//! - [`ExpressionError`] - filter and calculation mini-languages
//! - [`HarmonizeError`] - top-level orchestration errors
//!
//! Pipeline stages never surface these to callers: they are turned into
//! log entries at the stage boundary. Only the orchestrator returns
//! [`HarmonizeError`], and only for per-file failures.

use thiserror::Error;

// =============================================================================
// Ingestion Errors
// =============================================================================

/// Errors while turning a file into grids of cells.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Extension is not handled by any reader.
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// Malformed CSV content.
    #[error("Invalid CSV format: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook could not be opened or a sheet could not be read.
    #[error("Invalid workbook: {0}")]
    Workbook(String),
}

impl From<calamine::Error> for IngestError {
    fn from(err: calamine::Error) -> Self {
        IngestError::Workbook(err.to_string())
    }
}

// =============================================================================
// Schema Errors
// =============================================================================

/// Errors from provider schema loading and lookup.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Lookup with a blank provider name.
    #[error("Provider name cannot be null or empty")]
    EmptyName,

    /// No schema registered under this name.
    #[error("No matching provider found for: {0}")]
    NotFound(String),

    /// Schema file has an extension we cannot parse.
    #[error("Unsupported schema file: {0}")]
    UnsupportedFile(String),

    /// IO error.
    #[error("Schema IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Schema JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error.
    #[error("Schema YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// =============================================================================
// Expression Errors
// =============================================================================

/// Errors raised by the filter and calculation languages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    /// Filter lacks a `[column]` reference.
    #[error("Invalid filter format - missing [column]")]
    MissingColumnRef,

    /// Filter lacks an operator or a right-hand value.
    #[error("Invalid filter format - missing operator or value")]
    MissingOperator,

    /// Referenced column does not exist in the dataset.
    #[error("Column '{0}' not found")]
    UnknownColumn(String),

    /// Ordering operators are only defined for numbers.
    #[error("Operator '{op}' is not defined for text value '{value}'")]
    TextOrdering { op: String, value: String },

    /// Unexpected character while tokenizing.
    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    /// String literal or field reference never closed.
    #[error("Unterminated {0}")]
    Unterminated(&'static str),

    /// Token sequence does not form an expression.
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Row-level evaluation failure.
    #[error("Evaluation failed: {0}")]
    Evaluation(String),
}

// =============================================================================
// Harmonize Errors (top-level)
// =============================================================================

/// Top-level orchestration errors.
///
/// Returned by [`crate::harmonizer::Harmonizer`] when a whole file cannot be
/// processed. Such files are recorded as failures and never reach the master
/// dataset.
#[derive(Debug, Error)]
pub enum HarmonizeError {
    /// Schema lookup or loading error.
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Directory does not exist or is not a directory.
    #[error("Directory {0} does not exist or is not a directory")]
    NotADirectory(String),

    /// Provider mapping could not be read.
    #[error("Invalid provider mapping: {0}")]
    Mapping(String),

    /// File discovery pattern is malformed.
    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Nothing accumulated yet.
    #[error("No data to export")]
    NoData,

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for ingestion.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for expression parsing and evaluation.
pub type ExpressionResult<T> = Result<T, ExpressionError>;

/// Result type for orchestration.
pub type HarmonizeResult<T> = Result<T, HarmonizeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let schema_err = SchemaError::NotFound("ACME".into());
        let err: HarmonizeError = schema_err.into();
        assert!(err.to_string().contains("ACME"));

        let pattern_err = glob::Pattern::new("[").unwrap_err();
        let err: HarmonizeError = pattern_err.into();
        assert!(err.to_string().starts_with("Invalid file pattern"));

        let ingest_err = IngestError::UnsupportedFormat(".txt".into());
        assert_eq!(ingest_err.to_string(), "Unsupported file type: .txt");
    }

    #[test]
    fn test_filter_status_strings() {
        assert_eq!(
            ExpressionError::MissingColumnRef.to_string(),
            "Invalid filter format - missing [column]"
        );
        assert_eq!(
            ExpressionError::UnknownColumn("amount".into()).to_string(),
            "Column 'amount' not found"
        );
        assert_eq!(
            ExpressionError::MissingOperator.to_string(),
            "Invalid filter format - missing operator or value"
        );
    }
}
