//! Pipeline configuration.
//!
//! [`PipelineConfig`] carries the caller's choices (paths, layout mode) and
//! the [`DerivationPlan`] listing which derived datasets to build. The plan
//! defaults to the standard deaths/confirmed/recovered set and can be
//! replaced by a JSON file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::models::ColumnLayout;

/// Default merged output file.
pub const DEFAULT_OUTPUT: &str = "tst.csv";

/// Default population reference file, looked up in the working directory.
pub const DEFAULT_POPULATION_FILE: &str = "Population.dat";

/// Marker of regional (US) table file names.
pub const US_FILE_MARKER: &str = "_US.csv";

pub const CONFIRMED_GLOBAL: &str = "time_series_covid19_confirmed_global";
pub const DEATHS_GLOBAL: &str = "time_series_covid19_deaths_global";
pub const RECOVERED_GLOBAL: &str = "time_series_covid19_recovered_global";
pub const CONFIRMED_US: &str = "time_series_covid19_confirmed_US";
pub const DEATHS_US: &str = "time_series_covid19_deaths_US";

/// US tables that carry a `Population` column before the dates.
pub const US_POPULATION_TABLES: &[&str] = &[DEATHS_US];

// =============================================================================
// Mode
// =============================================================================

/// Which family of source tables a run reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Country-level tables (`*_global.csv`)
    #[default]
    Global,
    /// County-level US tables (`*_US.csv`)
    Us,
}

impl Mode {
    /// Whether a file in the input directory belongs to this mode.
    pub fn accepts(&self, file_name: &str) -> bool {
        let is_us = file_name.contains(US_FILE_MARKER);
        match self {
            Mode::Global => !is_us,
            Mode::Us => is_us,
        }
    }

    /// Column layout for a table of this mode.
    pub fn layout_for(&self, indicator: &str) -> ColumnLayout {
        match self {
            Mode::Global => ColumnLayout::global(),
            Mode::Us => ColumnLayout::regional(US_POPULATION_TABLES.contains(&indicator)),
        }
    }

    /// Primary dataset name when the plan does not name one.
    pub fn default_primary(&self) -> &'static str {
        match self {
            Mode::Global => CONFIRMED_GLOBAL,
            Mode::Us => CONFIRMED_US,
        }
    }

    /// Derived datasets are only built from global tables.
    pub fn derives(&self) -> bool {
        matches!(self, Mode::Global)
    }
}

// =============================================================================
// Derivation Plan
// =============================================================================

/// One ratio dataset: `dividend / divisor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatioSpec {
    pub name: String,
    pub dividend: String,
    pub divisor: String,
}

/// One day-over-day dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaSpec {
    pub name: String,
    pub source: String,
}

/// One population-normalized dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeSpec {
    pub name: String,
    pub source: String,
}

/// Derived datasets to build, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivationPlan {
    /// Overrides the mode's primary dataset
    pub primary: Option<String>,
    pub ratios: Vec<RatioSpec>,
    pub deltas: Vec<DeltaSpec>,
    /// Only built when a population reference is available
    pub normalized: Vec<NormalizeSpec>,
}

impl Default for DerivationPlan {
    fn default() -> Self {
        let ratio = |name: &str, dividend: &str, divisor: &str| RatioSpec {
            name: name.to_string(),
            dividend: dividend.to_string(),
            divisor: divisor.to_string(),
        };
        let delta = |name: &str, source: &str| DeltaSpec {
            name: name.to_string(),
            source: source.to_string(),
        };
        let normalize = |name: &str, source: &str| NormalizeSpec {
            name: name.to_string(),
            source: source.to_string(),
        };

        Self {
            primary: None,
            ratios: vec![
                ratio("Ratio: Death/Confirmed", DEATHS_GLOBAL, CONFIRMED_GLOBAL),
                ratio("Ratio: Confirmed/Recovered", CONFIRMED_GLOBAL, RECOVERED_GLOBAL),
                ratio("Ratio: Death/Recovered", DEATHS_GLOBAL, RECOVERED_GLOBAL),
            ],
            deltas: vec![
                delta("Day: Death", DEATHS_GLOBAL),
                delta("Day: Confirmed", CONFIRMED_GLOBAL),
                delta("Day: Recovered", RECOVERED_GLOBAL),
            ],
            normalized: vec![
                normalize("Population Normalized: Death", DEATHS_GLOBAL),
                normalize("Population Normalized: Confirmed", CONFIRMED_GLOBAL),
                normalize("Population Normalized: Recovered", RECOVERED_GLOBAL),
            ],
        }
    }
}

impl DerivationPlan {
    /// A plan that derives nothing.
    pub fn empty() -> Self {
        Self {
            primary: None,
            ratios: Vec::new(),
            deltas: Vec::new(),
            normalized: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// =============================================================================
// Pipeline Config
// =============================================================================

/// Everything one pipeline run needs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory scanned for `*csv` tables
    pub input_dir: PathBuf,
    /// Merged output file
    pub output: PathBuf,
    /// Population reference; absent file disables normalization
    pub population: PathBuf,
    pub mode: Mode,
    pub plan: DerivationPlan,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output: PathBuf::from(DEFAULT_OUTPUT),
            population: PathBuf::from(DEFAULT_POPULATION_FILE),
            mode: Mode::default(),
            plan: DerivationPlan::default(),
        }
    }
}

impl PipelineConfig {
    /// Name of the dataset whose header heads the output.
    pub fn primary_name(&self) -> &str {
        self.plan
            .primary
            .as_deref()
            .unwrap_or_else(|| self.mode.default_primary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_mode_file_filter() {
        assert!(Mode::Global.accepts("time_series_covid19_deaths_global.csv"));
        assert!(!Mode::Global.accepts("time_series_covid19_deaths_US.csv"));
        assert!(Mode::Us.accepts("time_series_covid19_deaths_US.csv"));
        assert!(!Mode::Us.accepts("time_series_covid19_deaths_global.csv"));
    }

    #[test]
    fn test_mode_layouts() {
        assert_eq!(Mode::Global.layout_for(DEATHS_GLOBAL), ColumnLayout::global());
        assert_eq!(Mode::Us.layout_for(CONFIRMED_US), ColumnLayout::regional(false));
        assert_eq!(Mode::Us.layout_for(DEATHS_US), ColumnLayout::regional(true));
    }

    #[test]
    fn test_default_plan() {
        let plan = DerivationPlan::default();
        assert_eq!(plan.ratios.len(), 3);
        assert_eq!(plan.deltas.len(), 3);
        assert_eq!(plan.normalized.len(), 3);
        assert_eq!(plan.ratios[0].dividend, DEATHS_GLOBAL);
        assert_eq!(plan.ratios[0].divisor, CONFIRMED_GLOBAL);
    }

    #[test]
    fn test_primary_name() {
        let mut config = PipelineConfig::default();
        assert_eq!(config.primary_name(), CONFIRMED_GLOBAL);

        config.mode = Mode::Us;
        assert_eq!(config.primary_name(), CONFIRMED_US);

        config.plan.primary = Some("deaths".to_string());
        assert_eq!(config.primary_name(), "deaths");
    }

    #[test]
    fn test_partial_plan_json() {
        let plan = DerivationPlan::from_json(
            r#"{"deltas": [{"name": "Day: Tests", "source": "tests"}]}"#,
        )
        .unwrap();
        assert_eq!(plan.deltas.len(), 1);
        assert!(plan.ratios.len() == 3, "missing fields keep their defaults");
    }

    #[test]
    fn test_plan_file_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plan.json");
        std::fs::write(&path, DerivationPlan::empty().to_json().unwrap()).unwrap();

        assert_eq!(DerivationPlan::from_json_file(&path).unwrap(), DerivationPlan::empty());
    }

    #[test]
    fn test_bad_plan() {
        assert!(matches!(DerivationPlan::from_json("{\"ratios\": 3}"), Err(ConfigError::Json(_))));
        let err = DerivationPlan::from_json_file(Path::new("/nonexistent/plan.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
