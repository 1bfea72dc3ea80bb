//! Domain models for the timeline conversion pipeline.
//!
//! - [`Dataset`] - One named indicator table (header + rows keyed by entity)
//! - [`ColumnLayout`] - Where the identifier and value columns sit in a source table
//! - [`entity_key`] - Builds the composite key for one geographic unit

use std::collections::BTreeMap;

/// Label of the second output column.
pub const INDICATOR_LABEL: &str = "Indicator";

/// Joins the two identifier components of an entity key.
pub const KEY_SEPARATOR: char = '-';

/// Stand-in for commas inside identifiers, so keys stay comma-free.
pub const COMMA_PLACEHOLDER: &str = "-";

/// Index of the first value field in every row (`[key, indicator, values...]`).
pub const VALUE_OFFSET: usize = 2;

// =============================================================================
// Entity Key
// =============================================================================

/// Build the composite key for one geographic unit.
///
/// `sub_region` is the fine-grained identifier (Province/State, Admin2),
/// `region` the coarse one (Country/Region, Province_State). An empty
/// sub-region degrades to `<placeholder>-<region>`.
pub fn entity_key(sub_region: &str, region: &str, placeholder: &str) -> String {
    let region = region.replace(',', COMMA_PLACEHOLDER);
    let head = if sub_region.is_empty() {
        placeholder.to_string()
    } else {
        sub_region.replace(',', COMMA_PLACEHOLDER)
    };
    format!("{}{}{}", head, KEY_SEPARATOR, region)
}

// =============================================================================
// Column Layout
// =============================================================================

/// Column layout of a wide source table.
///
/// Columns other than the two key columns and the value columns are
/// identifier columns that get dropped during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Sub-region and region columns forming the entity key.
    pub key_columns: (usize, usize),
    /// First date/value column.
    pub value_start: usize,
    /// Whether a population column precedes the first date column.
    pub has_population_column: bool,
    /// Key prefix used when the sub-region column is empty.
    pub placeholder: &'static str,
}

impl ColumnLayout {
    /// Global tables: Province/State, Country/Region, Lat, Long, dates...
    pub const fn global() -> Self {
        Self {
            key_columns: (0, 1),
            value_start: 4,
            has_population_column: false,
            placeholder: "Country",
        }
    }

    /// US tables: UID, iso2, iso3, code3, FIPS, Admin2, Province_State,
    /// Country_Region, Lat, Long_, Combined_Key, [Population], dates...
    pub const fn regional(has_population_column: bool) -> Self {
        Self {
            key_columns: (5, 6),
            value_start: if has_population_column { 12 } else { 11 },
            has_population_column,
            placeholder: "Other",
        }
    }

    /// Smallest record width that still holds both key columns.
    pub fn min_width(&self) -> usize {
        self.key_columns.0.max(self.key_columns.1) + 1
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// A named wide table in canonical form.
///
/// Every row is `[key, indicator, value_1, ..., value_n]` and has exactly
/// as many fields as the header. Rows iterate in ascending key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    name: String,
    header: Vec<String>,
    rows: BTreeMap<String, Vec<String>>,
}

impl Dataset {
    /// Create an empty dataset with the given header.
    pub fn new(name: impl Into<String>, header: Vec<String>) -> Self {
        Self {
            name: name.into(),
            header,
            rows: BTreeMap::new(),
        }
    }

    /// Create a dataset from complete rows; each row's first field is its key.
    pub fn from_rows<I>(name: impl Into<String>, header: Vec<String>, rows: I) -> Self
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut dataset = Self::new(name, header);
        for row in rows {
            if let Some(key) = row.first().cloned() {
                dataset.insert_row(key, row);
            }
        }
        dataset
    }

    /// Insert a row; a later row with the same key replaces the earlier one.
    pub(crate) fn insert_row(&mut self, key: String, fields: Vec<String>) {
        self.rows.insert(key, fields);
    }

    /// Registry name, also the indicator value of every row.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Rows in ascending key order.
    pub fn rows(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.rows.iter()
    }

    pub fn row(&self, key: &str) -> Option<&[String]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.rows.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
