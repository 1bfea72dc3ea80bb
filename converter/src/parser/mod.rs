//! Wide table ingestion.
//!
//! Reads one wide source table (one row per entity, one column per date)
//! into a canonical [`Dataset`]. Values are carried as opaque strings;
//! nothing is parsed as a number here.
//!
//! Raw bytes are decoded with encoding detection first, so tables exported
//! as Latin-1 or Windows-1252 read the same as UTF-8 ones.

pub mod date;

use std::path::Path;

use csv::StringRecord;

use crate::error::{IngestError, IngestResult};
use crate::models::{entity_key, ColumnLayout, Dataset, INDICATOR_LABEL, KEY_SEPARATOR};

pub use date::{normalize_date, parse_date};

/// Suffix stripped from file names to form the indicator name.
pub const TABLE_SUFFIX: &str = ".csv";

/// Indicator name for a source file: the file name without `.csv`.
pub fn indicator_name(file_name: &str) -> &str {
    file_name.strip_suffix(TABLE_SUFFIX).unwrap_or(file_name)
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string, stripping a UTF-8 byte order mark.
///
/// Valid UTF-8 is taken as-is; anything else goes through detection.
pub fn decode_content(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => match detect_encoding(bytes).as_str() {
            "iso-8859-1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
            "windows-1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
            _ => String::from_utf8_lossy(bytes).into_owned(),
        },
    };

    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Ingest a wide table file; the indicator name comes from the file name.
pub fn ingest_file(path: &Path, layout: &ColumnLayout) -> IngestResult<Dataset> {
    let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    ingest_table(&decode_content(&bytes), indicator_name(&file_name), layout)
}

/// Ingest a wide table already held in memory.
///
/// # Example
/// ```
/// use gapminder::{ingest_table, ColumnLayout};
///
/// let csv = "Province/State,Country/Region,Lat,Long,1/22/20\n,Italy,41.9,12.6,3\n";
/// let dataset = ingest_table(csv, "confirmed", &ColumnLayout::global()).unwrap();
///
/// assert_eq!(dataset.header()[2], "20200122");
/// assert_eq!(dataset.row("Country-Italy").unwrap(), &["Country-Italy", "confirmed", "3"]);
/// ```
pub fn ingest_table(content: &str, name: &str, layout: &ColumnLayout) -> IngestResult<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut records = reader.records();

    let header_record = match records.next() {
        Some(record) => record?,
        None => return Err(IngestError::Empty(name.to_string())),
    };
    let width = header_record.len();
    let header = build_header(&header_record, name, layout)?;
    let mut dataset = Dataset::new(name, header);

    for record in records {
        let record = record?;
        if record.len() != width {
            return Err(IngestError::MalformedRow {
                name: name.to_string(),
                line: record_line(&record),
                expected: width,
                found: record.len(),
            });
        }

        let (sub_col, region_col) = layout.key_columns;
        let key = entity_key(&record[sub_col], &record[region_col], layout.placeholder);

        let mut fields = Vec::with_capacity(dataset.header().len());
        fields.push(key.clone());
        fields.push(name.to_string());
        fields.extend(record.iter().skip(layout.value_start).map(str::to_string));

        dataset.insert_row(key, fields);
    }

    Ok(dataset)
}

/// Key label, `Indicator`, then one `YYYYMMDD` token per value column.
fn build_header(record: &StringRecord, name: &str, layout: &ColumnLayout) -> IngestResult<Vec<String>> {
    if record.len() < layout.min_width() {
        return Err(IngestError::MalformedRow {
            name: name.to_string(),
            line: record_line(record),
            expected: layout.min_width(),
            found: record.len(),
        });
    }

    let (sub_col, region_col) = layout.key_columns;
    let mut header = vec![
        format!("{}{}{}", &record[sub_col], KEY_SEPARATOR, &record[region_col]),
        INDICATOR_LABEL.to_string(),
    ];

    for (column, label) in record.iter().enumerate().skip(layout.value_start) {
        let token = normalize_date(label).map_err(|source| IngestError::Date {
            name: name.to_string(),
            column,
            source,
        })?;
        header.push(token);
    }

    Ok(header)
}

fn record_line(record: &StringRecord) -> usize {
    record.position().map(|p| p.line() as usize).unwrap_or(0)
}
