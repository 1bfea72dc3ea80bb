//! Merged long-format output.
//!
//! Layout: the primary dataset's header, the primary dataset's rows, then
//! the rows of every other dataset in ascending name order. Rows inside a
//! dataset are in ascending key order. Every field is followed by a comma
//! and every record ends with `\n`, so identical registries always produce
//! identical bytes.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::OutputResult;
use crate::models::Dataset;
use crate::registry::DatasetRegistry;

/// What a write produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    /// Datasets written, the primary included
    pub datasets: usize,
    /// Data rows written, the header excluded
    pub rows: usize,
}

/// Write the merged table to any sink.
pub fn write_merged<W: Write>(registry: &DatasetRegistry, sink: W) -> OutputResult<WriteStats> {
    let primary = registry.primary()?;
    let mut out = BufWriter::new(sink);
    let mut stats = WriteStats::default();

    write_record(&mut out, primary.header())?;
    stats.rows += write_rows(&mut out, primary)?;
    stats.datasets += 1;

    for dataset in registry.others() {
        stats.rows += write_rows(&mut out, dataset)?;
        stats.datasets += 1;
    }

    out.flush()?;
    Ok(stats)
}

/// Create (or truncate) `path` and write the merged table into it.
pub fn write_merged_file(registry: &DatasetRegistry, path: &Path) -> OutputResult<WriteStats> {
    let file = File::create(path)?;
    write_merged(registry, file)
}

/// Render the merged table into a string.
pub fn render_merged(registry: &DatasetRegistry) -> OutputResult<String> {
    let mut buffer = Vec::new();
    write_merged(registry, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn write_rows<W: Write>(out: &mut W, dataset: &Dataset) -> std::io::Result<usize> {
    let mut count = 0;
    for (_, fields) in dataset.rows() {
        write_record(out, fields)?;
        count += 1;
    }
    Ok(count)
}

fn write_record<W: Write>(out: &mut W, fields: &[String]) -> std::io::Result<()> {
    for field in fields {
        out.write_all(field.as_bytes())?;
        out.write_all(b",")?;
    }
    out.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OutputError, RegistryError};
    use tempfile::tempdir;

    fn dataset(name: &str, rows: &[(&str, &str)]) -> Dataset {
        let header = vec!["Province/State-Country/Region".to_string(), "Indicator".to_string(), "20200122".to_string()];
        Dataset::from_rows(
            name,
            header,
            rows.iter()
                .map(|(key, value)| vec![key.to_string(), name.to_string(), value.to_string()]),
        )
    }

    fn registry() -> DatasetRegistry {
        let mut registry = DatasetRegistry::new("confirmed");
        registry.insert(dataset("deaths", &[("B", "2"), ("A", "1")])).unwrap();
        registry.insert(dataset("confirmed", &[("B", "20"), ("A", "10")])).unwrap();
        registry.insert(dataset("Day: Death", &[("A", "1")])).unwrap();
        registry
    }

    #[test]
    fn test_merged_layout() {
        let text = render_merged(&registry()).unwrap();
        assert_eq!(
            text,
            "Province/State-Country/Region,Indicator,20200122,\n\
             A,confirmed,10,\n\
             B,confirmed,20,\n\
             A,Day: Death,1,\n\
             A,deaths,1,\n\
             B,deaths,2,\n"
        );
    }

    #[test]
    fn test_output_is_deterministic() {
        let registry = registry();
        assert_eq!(render_merged(&registry).unwrap(), render_merged(&registry).unwrap());
    }

    #[test]
    fn test_stats() {
        let mut buffer = Vec::new();
        let stats = write_merged(&registry(), &mut buffer).unwrap();
        assert_eq!(stats, WriteStats { datasets: 3, rows: 5 });
    }

    #[test]
    fn test_missing_primary_fails() {
        let mut registry = DatasetRegistry::new("confirmed");
        registry.insert(dataset("deaths", &[("A", "1")])).unwrap();

        let err = render_merged(&registry).unwrap_err();
        assert!(matches!(err, OutputError::Registry(RegistryError::MissingPrimary(_))));
    }

    #[test]
    fn test_write_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_merged_file(&registry(), &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, render_merged(&registry()).unwrap());
    }

    #[test]
    fn test_write_file_bad_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");

        let err = write_merged_file(&registry(), &path).unwrap_err();
        assert!(matches!(err, OutputError::Io(_)));
    }
}
