//! Error types for the BCA comparison pipeline.
//!
//! Only file-level problems are errors. Everything that can go wrong at the
//! cell level (a missing lookup, an unparseable value) is absorbed where it
//! happens and never shows up here.
//!
//! - [`ExtractError`] - summary table structure and decoding errors
//! - [`FileNameError`] - `<customer>-<date>.xlsx` naming errors
//! - [`SourceError`] - everything that can reject a single uploaded file
//! - [`BatchError`] - a batch with nothing usable in it
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Summary Extraction Errors
// =============================================================================

/// Errors while reading one customer's summary table.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes could not be decoded.
    #[error("Failed to decode content: {0}")]
    Encoding(String),

    /// Malformed delimited text.
    #[error("Invalid table format: {0}")]
    Parse(String),

    /// Workbook could not be opened or read.
    #[error("Failed to read workbook: {0}")]
    Workbook(String),

    /// Workbook without the summary worksheet.
    #[error("Workbook has no '{0}' sheet")]
    MissingSheet(String),

    /// Nothing but whitespace.
    #[error("Summary table is empty")]
    EmptyTable,

    /// No `Metric` column in the header row.
    #[error("Missing '{0}' column")]
    MissingMetricColumn(String),

    /// No `{product line} Cumulative` column in the header row.
    #[error("No '<product line> Cumulative' columns found")]
    NoProductLines,
}

impl From<csv::Error> for ExtractError {
    fn from(err: csv::Error) -> Self {
        ExtractError::Parse(err.to_string())
    }
}

// =============================================================================
// File Name Errors
// =============================================================================

/// Errors deriving a customer identity from an uploaded file name.
#[derive(Debug, Error, PartialEq)]
pub enum FileNameError {
    /// Exactly one `-` is expected between customer and date.
    #[error(
        "Expected '<customer name>-<date>.xlsx' with exactly one '-', found {found} in '{name}'"
    )]
    Separator { name: String, found: usize },

    /// Nothing before the `-`.
    #[error("Customer name is empty in '{0}'")]
    EmptyCustomer(String),
}

// =============================================================================
// Source File Errors
// =============================================================================

/// Everything that can reject a single file of a batch.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Bad file name.
    #[error(transparent)]
    FileName(#[from] FileNameError),

    /// Bad summary table.
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

// =============================================================================
// Batch Errors
// =============================================================================

/// Batch-level failures.
#[derive(Debug, Error)]
pub enum BatchError {
    /// No files were supplied at all.
    #[error("Please upload at least one file to proceed")]
    NoFiles,

    /// Every file in the batch was rejected.
    #[error("None of the {0} file(s) could be loaded")]
    NothingLoaded(usize),

    /// The requested mode string is not `Cumulative` or `Per Unit`.
    #[error("Unknown view mode: {0}")]
    UnknownMode(String),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Batch error.
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Failed to bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for summary extraction.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Result type for single-file loading.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ExtractError -> SourceError
        let err: SourceError = ExtractError::EmptyTable.into();
        assert!(err.to_string().contains("empty"));

        // FileNameError -> SourceError
        let err: SourceError = FileNameError::EmptyCustomer("-2024.xlsx".into()).into();
        assert!(err.to_string().contains("-2024.xlsx"));

        // BatchError -> ServerError
        let err: ServerError = BatchError::NothingLoaded(3).into();
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_workbook_errors_name_the_problem() {
        let err = ExtractError::MissingSheet("Summary".into());
        assert_eq!(err.to_string(), "Workbook has no 'Summary' sheet");

        let err: SourceError = ExtractError::Workbook("invalid zip header".into()).into();
        assert!(err.to_string().starts_with("Failed to read workbook"));
    }

    #[test]
    fn test_separator_error_format() {
        let err = FileNameError::Separator {
            name: "acme-2024-01.xlsx".into(),
            found: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("found 2"));
        assert!(msg.contains("acme-2024-01.xlsx"));
    }
}
