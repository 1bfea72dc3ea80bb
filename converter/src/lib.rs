//! # Gapminder - wide time-series tables to one merged timeline
//!
//! Reads per-indicator wide tables (one row per region, one column per day),
//! derives ratio, daily and population-normalized series, and writes every
//! indicator as one long-format table that timeline tools can load directly.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Wide CSVs  │────▶│   Parser    │────▶│  Registry   │────▶│ Merged CSV  │
//! │ (per indic.)│     │ (dates/keys)│     │ (+ derived) │     │  (sorted)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gapminder::{run_pipeline, ConsoleSink, PipelineConfig};
//!
//! let summary = run_pipeline(&PipelineConfig::default(), &ConsoleSink::new()).unwrap();
//! println!("Wrote {} datasets", summary.datasets_written);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Dataset, column layouts and entity keys
//! - [`parser`] - Wide table ingestion and date normalization
//! - [`transform`] - Derived dataset generators and the pipeline
//! - [`registry`] - Dataset registry with primary selection
//! - [`output`] - Merged table writer
//! - [`config`] - Modes and the derivation plan
//! - [`logging`] - Injected log sinks

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Registry and output
pub mod output;
pub mod registry;

// Ambient
pub mod config;
pub mod logging;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError, DateError, GenerateError, IngestError, OutputError, PipelineError, RegistryError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{entity_key, ColumnLayout, Dataset, INDICATOR_LABEL};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_encoding, indicator_name, ingest_file, ingest_table, normalize_date,
    parse_date,
};

// =============================================================================
// Re-exports - Generators
// =============================================================================

pub use transform::generators::{daily_delta, population_normalize, ratio};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    derive_datasets, discover_inputs, load_population, run_pipeline, DerivationReport,
    PipelineSummary,
};

// =============================================================================
// Re-exports - Registry and output
// =============================================================================

pub use output::{render_merged, write_merged, write_merged_file, WriteStats};
pub use registry::DatasetRegistry;

// =============================================================================
// Re-exports - Config and logging
// =============================================================================

pub use config::{DerivationPlan, Mode, PipelineConfig};
pub use logging::{ConsoleSink, LogEntry, LogLevel, LogSink, MemorySink, NullSink};
