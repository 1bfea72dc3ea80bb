//! High-level pipeline: input directory in, merged timeline out.
//!
//! 1. Discover `*csv` tables for the selected mode
//! 2. Ingest each one into the registry
//! 3. Load the population reference if present
//! 4. Build the derived datasets named by the plan
//! 5. Write the merged table
//!
//! # Example
//!
//! ```rust,no_run
//! use gapminder::{run_pipeline, ConsoleSink, PipelineConfig};
//!
//! let summary = run_pipeline(&PipelineConfig::default(), &ConsoleSink::new()).unwrap();
//! println!("{} rows written", summary.rows_written);
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::generators::{daily_delta, population_normalize, ratio};
use crate::config::{Mode, PipelineConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::logging::{LogEntry, LogSink};
use crate::models::{ColumnLayout, Dataset};
use crate::output::write_merged_file;
use crate::parser::{indicator_name, ingest_file};
use crate::registry::DatasetRegistry;

/// Outcome of a full pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineSummary {
    /// Merged output file
    pub output: PathBuf,
    /// Indicators read from the input directory
    pub ingested: Vec<String>,
    /// Whether a population reference was loaded
    pub population_loaded: bool,
    /// Derived datasets that were built
    pub derived: Vec<String>,
    /// Derived datasets left out because a source was not loaded
    pub skipped: Vec<String>,
    /// Datasets written, primary included
    pub datasets_written: usize,
    /// Data rows written
    pub rows_written: usize,
}

/// Derived datasets produced by [`derive_datasets`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivationReport {
    pub derived: Vec<String>,
    pub skipped: Vec<String>,
}

/// Run the whole pipeline and write the merged output file.
pub fn run_pipeline(config: &PipelineConfig, log: &dyn LogSink) -> PipelineResult<PipelineSummary> {
    let mut summary = PipelineSummary {
        output: config.output.clone(),
        ..PipelineSummary::default()
    };

    let (registry, report) = build_registry(config, log, &mut summary)?;
    summary.derived = report.derived;
    summary.skipped = report.skipped;

    log.info("Write Gapminder Data");
    let stats = write_merged_file(&registry, &config.output)?;
    log.log(LogEntry::info(registry.primary_name()).with_indent(1));
    for dataset in registry.others() {
        log.log(LogEntry::info(dataset.name()).with_indent(1));
    }

    summary.datasets_written = stats.datasets;
    summary.rows_written = stats.rows;
    log.success(&format!(
        "{} datasets, {} rows written to {}",
        stats.datasets,
        stats.rows,
        config.output.display()
    ));

    Ok(summary)
}

/// Ingest every input, then derive. Nothing is written.
fn build_registry(
    config: &PipelineConfig,
    log: &dyn LogSink,
    summary: &mut PipelineSummary,
) -> PipelineResult<(DatasetRegistry, DerivationReport)> {
    let mut registry = DatasetRegistry::new(config.primary_name());

    log.info("Convert Files");
    for path in discover_inputs(&config.input_dir, config.mode, log)? {
        let dataset = ingest_input(&path, config.mode)?;
        summary.ingested.push(dataset.name().to_string());
        registry.insert(dataset)?;
    }

    if !config.mode.derives() {
        return Ok((registry, DerivationReport::default()));
    }

    if let Some(population) = load_population(&config.population, log)? {
        registry.set_population(population);
        summary.population_loaded = true;
    }

    let report = derive_datasets(&mut registry, config, log)?;
    Ok((registry, report))
}

/// List the tables of `dir` that belong to `mode`, sorted by file name.
///
/// Files ending in `csv` of the other mode are logged as skipped. Names that
/// are not valid UTF-8 are matched and logged in their lossy form.
pub fn discover_inputs(dir: &Path, mode: Mode, log: &dyn LogSink) -> PipelineResult<Vec<PathBuf>> {
    let input_dir_error = |source| PipelineError::InputDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(input_dir_error)? {
        let path = entry.map_err(input_dir_error)?.path();
        if !path.is_file() {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.ends_with("csv") {
            candidates.push((name, path));
        }
    }
    candidates.sort();

    let mut inputs = Vec::new();
    for (name, path) in candidates {
        if mode.accepts(&name) {
            log.log(LogEntry::info(name.as_str()).with_indent(1));
            inputs.push(path);
        } else {
            log.log(LogEntry::info(format!("Skipping {}", name)).with_indent(2));
        }
    }

    Ok(inputs)
}

fn ingest_input(path: &Path, mode: Mode) -> PipelineResult<Dataset> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let layout = mode.layout_for(indicator_name(&file_name));
    Ok(ingest_file(path, &layout)?)
}

/// Read the population reference if the file exists.
pub fn load_population(path: &Path, log: &dyn LogSink) -> PipelineResult<Option<Dataset>> {
    if !path.is_file() {
        return Ok(None);
    }
    log.info("Read population Data File");
    Ok(Some(ingest_file(path, &ColumnLayout::global())?))
}

/// Build every derived dataset of the plan and register it.
///
/// A derivation whose source was never loaded is skipped with a warning.
/// Normalized datasets need the registry's population reference.
pub fn derive_datasets(
    registry: &mut DatasetRegistry,
    config: &PipelineConfig,
    log: &dyn LogSink,
) -> PipelineResult<DerivationReport> {
    let plan = &config.plan;
    let mut report = DerivationReport::default();

    log.info("Create Relative Data");
    for spec in &plan.ratios {
        let derived = match (registry.get(&spec.dividend), registry.get(&spec.divisor)) {
            (Some(dividend), Some(divisor)) => Some(ratio(dividend, divisor, &spec.name, log)?),
            (dividend, _) => {
                let missing = if dividend.is_none() { &spec.dividend } else { &spec.divisor };
                skip(&mut report, &spec.name, missing, log);
                None
            }
        };
        if let Some(dataset) = derived {
            register(registry, &mut report, dataset, log)?;
        }
    }

    log.info("Create Daily Data");
    for spec in &plan.deltas {
        let derived = match registry.get(&spec.source) {
            Some(source) => Some(daily_delta(source, &spec.name)?),
            None => {
                skip(&mut report, &spec.name, &spec.source, log);
                None
            }
        };
        if let Some(dataset) = derived {
            register(registry, &mut report, dataset, log)?;
        }
    }

    if registry.population().is_some() {
        log.info("Create Population Normalized Data");
        for spec in &plan.normalized {
            let derived = match (registry.get(&spec.source), registry.population()) {
                (Some(source), Some(reference)) => Some(population_normalize(source, reference, &spec.name, log)?),
                _ => {
                    skip(&mut report, &spec.name, &spec.source, log);
                    None
                }
            };
            if let Some(dataset) = derived {
                register(registry, &mut report, dataset, log)?;
            }
        }
    }

    Ok(report)
}

fn register(
    registry: &mut DatasetRegistry,
    report: &mut DerivationReport,
    dataset: Dataset,
    log: &dyn LogSink,
) -> PipelineResult<()> {
    log.log(LogEntry::info(dataset.name()).with_indent(1));
    report.derived.push(dataset.name().to_string());
    registry.insert(dataset)?;
    Ok(())
}

fn skip(report: &mut DerivationReport, name: &str, missing: &str, log: &dyn LogSink) {
    log.log(LogEntry::warning(format!("Skipping {}: '{}' not loaded", name, missing)).with_indent(1));
    report.skipped.push(name.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DerivationPlan, CONFIRMED_GLOBAL, DEATHS_GLOBAL};
    use crate::error::{GenerateError, IngestError};
    use crate::logging::{LogLevel, MemorySink, NullSink};
    use tempfile::{tempdir, TempDir};

    const HEADER: &str = "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20\n";

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    fn scenario() -> TempDir {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "time_series_covid19_deaths_global.csv",
            &format!("{HEADER},A,0,0,10,20\n,B,0,0,0,5\n"),
        );
        write(
            dir.path(),
            "time_series_covid19_confirmed_global.csv",
            &format!("{HEADER},A,0,0,100,200\n,B,0,0,10,50\n"),
        );
        dir
    }

    fn config(dir: &Path) -> PipelineConfig {
        PipelineConfig {
            input_dir: dir.to_path_buf(),
            output: dir.join("out.txt"),
            population: dir.join("Population.dat"),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_end_to_end_scenario() {
        let dir = scenario();
        let config = config(dir.path());
        let sink = MemorySink::new();

        let summary = run_pipeline(&config, &sink).unwrap();

        let written = std::fs::read_to_string(&config.output).unwrap();
        assert_eq!(
            written,
            "Province/State-Country/Region,Indicator,20200122,20200123,\n\
             Country-A,time_series_covid19_confirmed_global,100,200,\n\
             Country-B,time_series_covid19_confirmed_global,10,50,\n\
             Country-A,Day: Confirmed,100,100,\n\
             Country-B,Day: Confirmed,10,40,\n\
             Country-A,Day: Death,10,10,\n\
             Country-B,Day: Death,0,5,\n\
             Country-A,Ratio: Death/Confirmed,100,100,\n\
             Country-B,Ratio: Death/Confirmed,0,100,\n\
             Country-A,time_series_covid19_deaths_global,10,20,\n\
             Country-B,time_series_covid19_deaths_global,0,5,\n"
        );

        assert_eq!(summary.ingested, vec![CONFIRMED_GLOBAL, DEATHS_GLOBAL]);
        assert_eq!(summary.derived, vec!["Ratio: Death/Confirmed", "Day: Death", "Day: Confirmed"]);
        assert_eq!(
            summary.skipped,
            vec!["Ratio: Confirmed/Recovered", "Ratio: Death/Recovered", "Day: Recovered"]
        );
        assert!(!summary.population_loaded);
        assert_eq!(summary.datasets_written, 5);
        assert_eq!(summary.rows_written, 10);
        assert_eq!(sink.messages(LogLevel::Warning).len(), 3);
    }

    #[test]
    fn test_repeated_runs_are_byte_identical() {
        let dir = scenario();
        let config = config(dir.path());

        run_pipeline(&config, &NullSink).unwrap();
        let first = std::fs::read(&config.output).unwrap();
        run_pipeline(&config, &NullSink).unwrap();
        let second = std::fs::read(&config.output).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_population_normalization() {
        let dir = scenario();
        write(
            dir.path(),
            "Population.dat",
            &format!("{HEADER},A,0,0,2000000,\n,B,0,0,,\n,C,0,0,5,\n"),
        );
        let config = config(dir.path());
        let sink = MemorySink::new();

        let summary = run_pipeline(&config, &sink).unwrap();
        assert!(summary.population_loaded);
        assert!(summary.derived.contains(&"Population Normalized: Death".to_string()));
        assert!(summary.skipped.contains(&"Population Normalized: Recovered".to_string()));

        let written = std::fs::read_to_string(&config.output).unwrap();
        // A: 1e9 * 10 / 2e6 = 5000, 1e9 * 20 / 2e6 = 10000
        assert!(written.contains("Country-A,Population Normalized: Death,5000,10000,\n"));
        // B falls back to one million: 0 stays 0, 1e9 * 5 / 1e6 = 5000
        assert!(written.contains("Country-B,Population Normalized: Death,0,5000,\n"));
        // Population file itself is never written
        assert!(!written.contains("Population.dat"));

        let warnings = sink.messages(LogLevel::Warning);
        assert!(warnings.contains(&"Line missing: Country-C in Population Normalized: Death".to_string()));
    }

    #[test]
    fn test_us_mode() {
        let dir = tempdir().unwrap();
        let us_header = "UID,iso2,iso3,code3,FIPS,Admin2,Province_State,Country_Region,Lat,Long_,Combined_Key";
        write(
            dir.path(),
            "time_series_covid19_confirmed_US.csv",
            &format!("{us_header},1/22/20\n1,US,USA,840,1001,Autauga,Alabama,US,0,0,\"Autauga, Alabama, US\",4\n"),
        );
        write(
            dir.path(),
            "time_series_covid19_deaths_US.csv",
            &format!("{us_header},Population,1/22/20\n1,US,USA,840,1001,Autauga,Alabama,US,0,0,\"Autauga, Alabama, US\",55869,1\n"),
        );
        write(dir.path(), "time_series_covid19_deaths_global.csv", &format!("{HEADER},A,0,0,1,2\n"));

        let mut config = config(dir.path());
        config.mode = Mode::Us;
        let summary = run_pipeline(&config, &NullSink).unwrap();

        assert_eq!(
            summary.ingested,
            vec!["time_series_covid19_confirmed_US", "time_series_covid19_deaths_US"]
        );
        assert!(summary.derived.is_empty());

        let written = std::fs::read_to_string(&config.output).unwrap();
        assert_eq!(
            written,
            "Admin2-Province_State,Indicator,20200122,\n\
             Autauga-Alabama,time_series_covid19_confirmed_US,4,\n\
             Autauga-Alabama,time_series_covid19_deaths_US,1,\n"
        );
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempdir().unwrap();
        for name in ["b_global.csv", "a_global.csv", "c_US.csv", "notes.txt"] {
            write(dir.path(), name, "");
        }
        std::fs::create_dir(dir.path().join("sub.csv")).unwrap();
        let sink = MemorySink::new();

        let inputs = discover_inputs(dir.path(), Mode::Global, &sink).unwrap();
        let names: Vec<_> = inputs
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a_global.csv", "b_global.csv"]);
        assert!(sink.messages(LogLevel::Info).contains(&"Skipping c_US.csv".to_string()));
    }

    #[test]
    fn test_discover_logs_every_input() {
        let dir = tempdir().unwrap();
        for name in ["b_global.csv", "a_global.csv", "c_US.csv"] {
            write(dir.path(), name, "");
        }
        let sink = MemorySink::new();

        discover_inputs(dir.path(), Mode::Us, &sink).unwrap();
        let entries = sink.entries();
        let logged: Vec<(&str, u8)> = entries.iter().map(|e| (e.message.as_str(), e.indent)).collect();
        assert_eq!(
            logged,
            vec![("Skipping a_global.csv", 2), ("Skipping b_global.csv", 2), ("c_US.csv", 1)]
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_discover_keeps_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let raw = OsStr::from_bytes(b"caf\xE9_global.csv");
        std::fs::write(dir.path().join(raw), "").unwrap();
        let sink = MemorySink::new();

        let inputs = discover_inputs(dir.path(), Mode::Global, &sink).unwrap();
        assert_eq!(inputs, vec![dir.path().join(raw)]);
        assert_eq!(sink.messages(LogLevel::Info), vec!["caf\u{FFFD}_global.csv"]);
    }

    #[test]
    fn test_missing_input_dir() {
        let err = discover_inputs(Path::new("/nonexistent/input"), Mode::Global, &NullSink).unwrap_err();
        assert!(matches!(err, PipelineError::InputDir { .. }));
    }

    #[test]
    fn test_missing_primary_aborts() {
        let dir = tempdir().unwrap();
        write(dir.path(), "time_series_covid19_deaths_global.csv", &format!("{HEADER},A,0,0,1,2\n"));
        let config = config(dir.path());

        let err = run_pipeline(&config, &NullSink).unwrap_err();
        assert!(err.to_string().contains(CONFIRMED_GLOBAL));
    }

    #[test]
    fn test_malformed_row_aborts() {
        let dir = scenario();
        write(dir.path(), "time_series_covid19_recovered_global.csv", &format!("{HEADER},A,0,0,1\n"));
        let config = config(dir.path());

        let err = run_pipeline(&config, &NullSink).unwrap_err();
        assert!(matches!(err, PipelineError::Ingest(IngestError::MalformedRow { .. })));
    }

    #[test]
    fn test_non_numeric_cell_aborts() {
        let dir = scenario();
        write(
            dir.path(),
            "time_series_covid19_deaths_global.csv",
            &format!("{HEADER},A,0,0,ten,20\n,B,0,0,0,5\n"),
        );
        let config = config(dir.path());

        let err = run_pipeline(&config, &NullSink).unwrap_err();
        assert!(matches!(err, PipelineError::Generate(GenerateError::InvalidNumber { .. })));
    }

    #[test]
    fn test_custom_plan() {
        let dir = scenario();
        let mut config = config(dir.path());
        config.plan = DerivationPlan::from_json(
            r#"{"ratios": [], "deltas": [{"name": "Day: Death", "source": "time_series_covid19_deaths_global"}], "normalized": []}"#,
        )
        .unwrap();

        let summary = run_pipeline(&config, &NullSink).unwrap();
        assert_eq!(summary.derived, vec!["Day: Death"]);
        assert!(summary.skipped.is_empty());
    }
}
