//! Transformation module.
//!
//! - Generators: ratio, daily delta and population-normalized datasets
//! - Pipeline: discovery, ingestion, derivation and output for one run

pub mod generators;
pub mod pipeline;

pub use generators::{daily_delta, population_normalize, ratio, FALLBACK_POPULATION, RATE_SCALE, RATIO_SCALE};
pub use pipeline::*;
