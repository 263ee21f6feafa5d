//! Error handling for population estimation.

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

use crate::models::{Category, GeographyCode};

/// Errors raised while loading, resolving, assembling or estimating
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No translation exists for a geography code into the target system
    #[error("Unmappable geography: {code} ({source_system}) has no mapping into {target_system}")]
    UnmappableGeography {
        code: String,
        source_system: String,
        target_system: String,
    },

    /// No dataset holds any data for the geography/category
    #[error("Empty series: no data for {geography} ({category})")]
    EmptySeries {
        geography: GeographyCode,
        category: Category,
    },

    /// Target year lies beyond the permitted extrapolation distance
    #[error(
        "Year {year} is out of range for {geography}: data covers {first}-{last}, extrapolation limited to {max_extrapolation_years} years"
    )]
    OutOfRange {
        geography: GeographyCode,
        year: i32,
        first: i32,
        last: i32,
        max_extrapolation_years: u32,
    },

    /// Unknown projection variant code
    #[error("Invalid variant name: {0}")]
    UnknownVariant(String),

    /// Mapping table failed validation
    #[error("Invalid mapping for {old_code}: {message}")]
    InvalidMapping { old_code: String, message: String },

    /// Row-level data failed validation during ingestion
    #[error("Invalid data in {dataset}: {message}")]
    InvalidData { dataset: String, message: String },

    /// Required column missing from a tabular input
    #[error("Column '{column}' not found")]
    ColumnNotFound { column: String },

    /// Same (year, geography, age, sex) key seen twice in one dataset
    #[error("Duplicate point in {dataset}: {key}")]
    DuplicatePoint { dataset: String, key: String },

    /// Loader has no dataset with the given name
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    /// Configuration is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal state could not be accessed, e.g. a poisoned lock
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serde(String),
}

impl Error {
    /// Short machine-readable name of the error kind
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnmappableGeography { .. } => "unmappable_geography",
            Self::EmptySeries { .. } => "empty_series",
            Self::OutOfRange { .. } => "out_of_range",
            Self::UnknownVariant(_) => "unknown_variant",
            Self::InvalidMapping { .. } => "invalid_mapping",
            Self::InvalidData { .. } => "invalid_data",
            Self::ColumnNotFound { .. } => "column_not_found",
            Self::DuplicatePoint { .. } => "duplicate_point",
            Self::DatasetNotFound(_) => "dataset_not_found",
            Self::Config(_) => "config",
            Self::InvalidOperation(_) => "invalid_operation",
            Self::Arrow(_) => "arrow",
            Self::Parquet(_) => "parquet",
            Self::Io(_) => "io",
            Self::Serde(_) => "serde",
        }
    }

    pub(crate) fn invalid_data(dataset: &str, message: impl Into<String>) -> Self {
        Self::InvalidData {
            dataset: dataset.to_string(),
            message: message.into(),
        }
    }
}

impl From<serde_arrow::Error> for Error {
    fn from(error: serde_arrow::Error) -> Self {
        Self::Serde(error.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serde(error.to_string())
    }
}

/// Result type for population estimation operations
pub type Result<T> = std::result::Result<T, Error>;
