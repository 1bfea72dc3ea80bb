//! Error types for the timeline conversion pipeline.
//!
//! Each stage has its own error enum:
//!
//! - [`DateError`] - Header date canonicalization
//! - [`IngestError`] - Reading and parsing one wide table
//! - [`GenerateError`] - Derived dataset generation
//! - [`RegistryError`] - Dataset registry bookkeeping
//! - [`OutputError`] - Writing the merged table
//! - [`ConfigError`] - Loading the derivation plan
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use std::path::PathBuf;

use thiserror::Error;

// =============================================================================
// Date Errors
// =============================================================================

/// Errors while turning a header label into a `YYYYMMDD` token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// The label does not look like any supported date layout,
    /// or names a day that does not exist.
    #[error("Unrecognized date: '{0}'")]
    Unrecognized(String),
}

// =============================================================================
// Ingest Errors
// =============================================================================

/// Errors while ingesting one wide table.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to read the source file.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid CSV syntax.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The table has no header record.
    #[error("Table '{0}' is empty")]
    Empty(String),

    /// A record does not have as many fields as the header.
    #[error("Malformed row in '{name}' at line {line}: expected {expected} fields, found {found}")]
    MalformedRow {
        name: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A header column past the identifier prefix is not a date.
    #[error("Bad date header in '{name}', column {column}: {source}")]
    Date {
        name: String,
        column: usize,
        #[source]
        source: DateError,
    },
}

// =============================================================================
// Generate Errors
// =============================================================================

/// Errors while computing a derived dataset.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// A non-empty cell that is not a number.
    #[error("Invalid number '{value}' in '{dataset}' for '{key}', column {column}")]
    InvalidNumber {
        dataset: String,
        key: String,
        column: usize,
        value: String,
    },

    /// A companion row has fewer columns than the row it is combined with.
    #[error("Row '{key}' in '{dataset}' has {found} fields, expected at least {expected}")]
    ColumnMismatch {
        dataset: String,
        key: String,
        expected: usize,
        found: usize,
    },

    /// A computed value has no integer form (division by a zero population).
    #[error("Non-finite value in '{dataset}' for '{key}', column {column}")]
    NonFinite {
        dataset: String,
        key: String,
        column: usize,
    },
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors from the dataset registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A dataset with this name was already registered.
    #[error("Dataset already registered: {0}")]
    Duplicate(String),

    /// The designated primary dataset was never registered.
    #[error("Primary dataset not found: {0}")]
    MissingPrimary(String),
}

// =============================================================================
// Output Errors
// =============================================================================

/// Errors while writing the merged table.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Failed to create or write the output.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// The registry cannot supply a header.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors while loading pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The derivation plan is not valid JSON for the expected shape.
    #[error("Invalid derivation plan: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run_pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Ingestion error.
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Derived dataset error.
    #[error("Generate error: {0}")]
    Generate(#[from] GenerateError),

    /// Registry error.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Output error.
    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The input directory could not be listed.
    #[error("Cannot list input directory {}: {source}", .path.display())]
    InputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for date normalization.
pub type DateResult<T> = Result<T, DateError>;

/// Result type for ingestion.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for derived dataset generation.
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for output operations.
pub type OutputResult<T> = Result<T, OutputError>;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
