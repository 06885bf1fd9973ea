//! Error types for sample retrieval.

use thiserror::Error;

/// Every way a retrieval can fail.
///
/// The first group of variants are request-scoped "not found" failures: the
/// request named something the archive does not have, or asked for more
/// records than exist. [`Error::is_not_found`] tells them apart from genuine
/// I/O or data problems so that callers can map them to a client error.
#[derive(Error, Debug)]
pub enum Error {
    /// The requested model is not a top-level group of the archive.
    #[error("Model {model} not present in {filename}. Available models are {}", .available.join(", "))]
    ModelNotFound {
        model: String,
        filename: String,
        available: Vec<String>,
    },

    /// The archive has no `injections` group.
    #[error("Injections not found in {filename}.")]
    InjectionsNotFound { filename: String },

    /// More records were requested than the (filtered) population holds.
    #[error(
        "Insufficient samples available in {filename}. {requested} requested and {available} available."
    )]
    InsufficientSamples {
        requested: usize,
        available: usize,
        filename: String,
    },

    /// A requested column is not declared by the table schema.
    #[error("Variable {variable} not found. Available variables are: {}", .available.join(", "))]
    VariableNotFound {
        variable: String,
        available: Vec<String>,
    },

    /// A group exists but does not hold the expected table.
    #[error("Dataset {dataset} not found in group {group}")]
    DatasetNotFound { group: String, dataset: String },

    /// A group is missing a required scalar attribute.
    #[error("Attribute {attribute} not found in group {group}")]
    AttributeNotFound { group: String, attribute: String },

    /// The request itself is malformed (e.g. a negative sample count).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The archive exists but does not follow the expected layout or types.
    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "parquet")]
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[cfg(feature = "arrow")]
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl Error {
    /// Whether this failure means "the request asked for something that is
    /// not there" rather than a fault while reading.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::ModelNotFound { .. }
                | Error::InjectionsNotFound { .. }
                | Error::InsufficientSamples { .. }
                | Error::VariableNotFound { .. }
                | Error::DatasetNotFound { .. }
                | Error::AttributeNotFound { .. }
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
