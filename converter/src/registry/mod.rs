//! Dataset Registry - every dataset of one run, keyed by name.
//!
//! The registry knows which entry is the primary dataset (the one whose
//! header heads the merged output) and hands out the others in ascending
//! name order. Entries are never replaced or removed once inserted.

use std::collections::BTreeMap;

use crate::error::{RegistryError, RegistryResult};
use crate::models::Dataset;

/// Datasets collected during a run.
#[derive(Debug, Clone)]
pub struct DatasetRegistry {
    /// Name of the dataset that supplies the output header
    primary: String,
    /// Loaded and derived datasets (name -> dataset)
    entries: BTreeMap<String, Dataset>,
    /// Population lookup; used by normalization, never written out
    population: Option<Dataset>,
}

impl DatasetRegistry {
    /// Create an empty registry with the given primary dataset name.
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            entries: BTreeMap::new(),
            population: None,
        }
    }

    pub fn primary_name(&self) -> &str {
        &self.primary
    }

    /// Register a dataset under its own name.
    pub fn insert(&mut self, dataset: Dataset) -> RegistryResult<()> {
        if self.entries.contains_key(dataset.name()) {
            return Err(RegistryError::Duplicate(dataset.name().to_string()));
        }
        self.entries.insert(dataset.name().to_string(), dataset);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The primary dataset.
    pub fn primary(&self) -> RegistryResult<&Dataset> {
        self.entries
            .get(&self.primary)
            .ok_or_else(|| RegistryError::MissingPrimary(self.primary.clone()))
    }

    /// Every dataset except the primary one, in ascending name order.
    pub fn others(&self) -> impl Iterator<Item = &Dataset> {
        self.entries
            .iter()
            .filter(move |(name, _)| **name != self.primary)
            .map(|(_, dataset)| dataset)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attach the population lookup.
    pub fn set_population(&mut self, reference: Dataset) {
        self.population = Some(reference);
    }

    pub fn population(&self) -> Option<&Dataset> {
        self.population.as_ref()
    }
}
