// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for pds4table.
//!
//! Errors fall into the categories the table codec distinguishes:
//! - Construction-time schema and file failures (always fatal)
//! - Operation-time failures (unknown FID, read-only access, late schema change)
//! - Parse failures for the XML and WKT sub-languages
//!
//! Per-row encode/decode problems are not errors: they are logged through
//! `tracing` and the row is still processed.

use thiserror::Error;

/// Errors that can occur while reading, writing or rewriting a PDS4 table.
#[derive(Debug, Clone, Error)]
pub enum TableError {
    /// Parse error in XML or WKT text
    #[error("Parse error in {context}: {message}")]
    ParseError {
        /// What was being parsed
        context: String,
        /// Error message
        message: String,
    },

    /// Table definition is structurally invalid
    #[error("Invalid table definition '{table}': {reason}")]
    InvalidSchema {
        /// Table name or file being described
        table: String,
        /// Validation error message
        reason: String,
    },

    /// FID outside `1..=record_count`
    #[error("Feature {fid} does not exist")]
    NonExistingFeature {
        /// Requested feature id
        fid: i64,
    },

    /// Write attempted on a table opened read-only
    #[error("Table '{table}' is opened read-only: cannot {operation}")]
    ReadOnly {
        /// Table name
        table: String,
        /// Operation that was refused
        operation: String,
    },

    /// Schema change attempted after rows were written
    #[error("Cannot {operation} on non-empty table '{table}'")]
    NonEmptyLayer {
        /// Table name
        table: String,
        /// Operation that was refused
        operation: String,
    },

    /// Field lookup by name failed
    #[error("Field '{field}' not found")]
    FieldNotFound {
        /// Field name
        field: String,
    },

    /// Unsupported type, option value or feature
    #[error("Unsupported feature: '{feature}'")]
    Unsupported {
        /// What is not supported
        feature: String,
    },

    /// Internal invariant was broken
    #[error("Invariant violation: {invariant}")]
    InvariantViolation {
        /// Description of the invariant that was violated
        invariant: String,
    },

    /// I/O failure on the table or one of its companion files
    #[error("I/O error on {path}: {message}")]
    Io {
        /// File the operation targeted
        path: String,
        /// Underlying error message
        message: String,
    },

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

impl TableError {
    /// Create a parse error.
    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        TableError::ParseError {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create an invalid table definition error.
    pub fn invalid_schema(table: impl Into<String>, reason: impl Into<String>) -> Self {
        TableError::InvalidSchema {
            table: table.into(),
            reason: reason.into(),
        }
    }

    /// Create a "non-existing feature" error.
    pub fn non_existing_feature(fid: i64) -> Self {
        TableError::NonExistingFeature { fid }
    }

    /// Create a read-only access error.
    pub fn read_only(table: impl Into<String>, operation: impl Into<String>) -> Self {
        TableError::ReadOnly {
            table: table.into(),
            operation: operation.into(),
        }
    }

    /// Create a non-empty layer error.
    pub fn non_empty_layer(table: impl Into<String>, operation: impl Into<String>) -> Self {
        TableError::NonEmptyLayer {
            table: table.into(),
            operation: operation.into(),
        }
    }

    /// Create a field not found error.
    pub fn field_not_found(field: impl Into<String>) -> Self {
        TableError::FieldNotFound {
            field: field.into(),
        }
    }

    /// Create an unsupported feature error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        TableError::Unsupported {
            feature: feature.into(),
        }
    }

    /// Create an invariant violation error.
    pub fn invariant_violation(invariant: impl Into<String>) -> Self {
        TableError::InvariantViolation {
            invariant: invariant.into(),
        }
    }

    /// Create an I/O error bound to a path.
    pub fn io(path: impl AsRef<std::path::Path>, err: std::io::Error) -> Self {
        TableError::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    /// Whether this error reports an out-of-range FID.
    pub fn is_non_existing_feature(&self) -> bool {
        matches!(self, TableError::NonExistingFeature { .. })
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            TableError::ParseError { context, message } => {
                vec![("context", context.clone()), ("message", message.clone())]
            }
            TableError::InvalidSchema { table, reason } => {
                vec![("table", table.clone()), ("reason", reason.clone())]
            }
            TableError::NonExistingFeature { fid } => vec![("fid", fid.to_string())],
            TableError::ReadOnly { table, operation }
            | TableError::NonEmptyLayer { table, operation } => {
                vec![("table", table.clone()), ("operation", operation.clone())]
            }
            TableError::FieldNotFound { field } => vec![("field", field.clone())],
            TableError::Unsupported { feature } => vec![("feature", feature.clone())],
            TableError::InvariantViolation { invariant } => {
                vec![("invariant", invariant.clone())]
            }
            TableError::Io { path, message } => {
                vec![("path", path.clone()), ("message", message.clone())]
            }
            TableError::Other(msg) => vec![("message", msg.clone())],
        }
    }
}

impl From<std::io::Error> for TableError {
    fn from(err: std::io::Error) -> Self {
        TableError::Io {
            path: "<table>".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for pds4table operations.
pub type Result<T> = std::result::Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error() {
        let err = TableError::parse("xml", "unexpected end of input");
        assert!(matches!(err, TableError::ParseError { .. }));
        assert_eq!(err.to_string(), "Parse error in xml: unexpected end of input");
    }

    #[test]
    fn test_invalid_schema_error() {
        let err = TableError::invalid_schema("table.dat", "Invalid record_length");
        assert_eq!(
            err.to_string(),
            "Invalid table definition 'table.dat': Invalid record_length"
        );
    }

    #[test]
    fn test_non_existing_feature() {
        let err = TableError::non_existing_feature(7);
        assert!(err.is_non_existing_feature());
        assert_eq!(err.to_string(), "Feature 7 does not exist");
        assert_eq!(err.log_fields(), vec![("fid", "7".to_string())]);
    }

    #[test]
    fn test_read_only_and_non_empty() {
        let err = TableError::read_only("t", "create field");
        assert_eq!(
            err.to_string(),
            "Table 't' is opened read-only: cannot create field"
        );
        let err = TableError::non_empty_layer("t", "create field");
        assert_eq!(err.to_string(), "Cannot create field on non-empty table 't'");
        let fields = err.log_fields();
        assert_eq!(fields[0], ("table", "t".to_string()));
        assert_eq!(fields[1], ("operation", "create field".to_string()));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TableError = io_err.into();
        assert!(matches!(err, TableError::Io { .. }));
        assert_eq!(err.to_string(), "I/O error on <table>: file not found");
    }

    #[test]
    fn test_io_with_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = TableError::io("/tmp/x.dat", io_err);
        assert_eq!(err.log_fields()[0], ("path", "/tmp/x.dat".to_string()));
    }

    #[test]
    fn test_error_clone() {
        let err1 = TableError::unsupported("ComplexLSB16");
        let err2 = err1.clone();
        assert_eq!(err1.to_string(), err2.to_string());
    }
}
