//! Error types for the grid engine.
//!
//! Grid operations driven by user gestures never return these errors to the
//! caller. They are logged at the boundary where they occur and turned into a
//! sentinel result (`None`, [`SearchOutcome::NotFound`](crate::SearchOutcome),
//! [`EditOutcome::Cancelled`](crate::EditOutcome)). Data sources and settings
//! persistence report them through [`Result`].

use std::path::PathBuf;

/// Result type alias for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors raised by data sources and grid collaborators.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// The data source has no field with this name.
    #[error("Field '{field}' not found in data source")]
    FieldNotFound { field: String },

    /// A row index past the end of the data source.
    #[error("Row {row} out of range (row count {row_count})")]
    RowOutOfRange { row: usize, row_count: usize },

    /// A column index with no column behind it.
    #[error("Column {column} out of range")]
    ColumnOutOfRange { column: usize },

    /// A value whose type does not match the field's declared type.
    #[error("Type mismatch for field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    /// The field cannot be written.
    #[error("Field '{field}' is read-only")]
    ReadOnly { field: String },

    /// A value outside the editor's list of valid choices.
    #[error("'{value}' is not a valid choice")]
    InvalidChoice { value: String },

    /// The data source does not support the operation.
    #[error("Data source does not support {operation}")]
    Unsupported { operation: &'static str },

    /// Any other data source failure.
    #[error("Data source error: {0}")]
    DataSource(String),

    /// Settings persistence failure.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl GridError {
    /// Create a field-not-found error.
    pub fn field_not_found(field: impl Into<String>) -> Self {
        Self::FieldNotFound {
            field: field.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(
        field: impl Into<String>,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

/// Errors from loading or saving [`Settings`](crate::Settings).
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File I/O error.
    #[error("Failed to access settings file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file contents could not be parsed.
    #[error("Invalid settings file '{path}': {message}")]
    Format { path: PathBuf, message: String },

    /// A value could not be serialized.
    #[error("Failed to serialize setting: {0}")]
    Serialize(String),
}

impl SettingsError {
    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a format error.
    pub fn format(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Format {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
