//! Derived dataset generators.
//!
//! Each generator combines one or two ingested datasets into a new one:
//!
//! - [`ratio`] - per-mille ratio between two indicators
//! - [`daily_delta`] - cumulative series to day-over-day increments
//! - [`population_normalize`] - rate per billion inhabitants
//!
//! Inputs are assumed to share the same date columns; nothing is re-aligned.
//! Empty cells read as zero, any other non-numeric cell is an error.
//! Entities missing from a companion dataset are logged and left out.

use crate::error::{GenerateError, GenerateResult};
use crate::logging::{LogEntry, LogSink};
use crate::models::{Dataset, VALUE_OFFSET};

/// Multiplier applied to ratios (per mille).
pub const RATIO_SCALE: f64 = 1_000.0;

/// Multiplier applied to population-normalized values (per billion).
pub const RATE_SCALE: f64 = 1_000_000_000.0;

/// Population assumed when the reference cell is empty.
pub const FALLBACK_POPULATION: f64 = 1_000_000.0;

/// Ratio between two datasets: `round(1000 * dividend / divisor)`, or `0`
/// when the divisor is zero. Header and entities follow `dividend`.
pub fn ratio(
    dividend: &Dataset,
    divisor: &Dataset,
    out_name: &str,
    log: &dyn LogSink,
) -> GenerateResult<Dataset> {
    let mut out = Dataset::new(out_name, dividend.header().to_vec());

    for (key, fields) in dividend.rows() {
        let Some(companion) = divisor.row(key) else {
            log.log(LogEntry::warning(format!("Line missing: {}", key)).with_indent(2));
            continue;
        };

        let mut row = start_row(key, out_name, fields.len());
        for (column, cell) in fields.iter().enumerate().skip(VALUE_OFFSET) {
            let other = companion.get(column).ok_or_else(|| GenerateError::ColumnMismatch {
                dataset: divisor.name().to_string(),
                key: key.clone(),
                expected: fields.len(),
                found: companion.len(),
            })?;

            let numerator = parse_cell(dividend, key, column, cell)?;
            let denominator = parse_cell(divisor, key, column, other)?;
            if denominator == 0.0 {
                row.push("0".to_string());
            } else {
                row.push(format_rounded(RATIO_SCALE * numerator / denominator, out_name, key, column)?);
            }
        }
        out.insert_row(key.clone(), row);
    }

    Ok(out)
}

/// Day-over-day increments of a cumulative dataset.
///
/// The first value column is copied through unchanged. A later column that
/// reads as zero emits `0` but still becomes the new baseline. Negative
/// increments (reporting corrections) are kept.
pub fn daily_delta(cumulative: &Dataset, out_name: &str) -> GenerateResult<Dataset> {
    let mut out = Dataset::new(out_name, cumulative.header().to_vec());

    for (key, fields) in cumulative.rows() {
        let mut row = start_row(key, out_name, fields.len());
        let mut values = fields.iter().enumerate().skip(VALUE_OFFSET);

        if let Some((column, first)) = values.next() {
            let mut previous = parse_cell(cumulative, key, column, first)?;
            row.push(first.clone());

            for (column, cell) in values {
                let current = parse_cell(cumulative, key, column, cell)?;
                if current == 0.0 {
                    row.push("0".to_string());
                } else {
                    row.push(format_rounded(current - previous, out_name, key, column)?);
                }
                previous = current;
            }
        }
        out.insert_row(key.clone(), row);
    }

    Ok(out)
}

/// Values per billion inhabitants: `round(1e9 * value / population)`.
///
/// Entities are driven by `reference`; its first value column holds the
/// population, with [`FALLBACK_POPULATION`] for empty cells.
pub fn population_normalize(
    values: &Dataset,
    reference: &Dataset,
    out_name: &str,
    log: &dyn LogSink,
) -> GenerateResult<Dataset> {
    let mut out = Dataset::new(out_name, values.header().to_vec());

    for (key, reference_row) in reference.rows() {
        let population = population_of(reference, key, reference_row)?;

        let Some(fields) = values.row(key) else {
            log.log(LogEntry::warning(format!("Line missing: {} in {}", key, out_name)).with_indent(2));
            continue;
        };

        let mut row = start_row(key, out_name, fields.len());
        for (column, cell) in fields.iter().enumerate().skip(VALUE_OFFSET) {
            let value = parse_cell(values, key, column, cell)?;
            if value == 0.0 {
                row.push("0".to_string());
            } else {
                row.push(format_rounded(RATE_SCALE * value / population, out_name, key, column)?);
            }
        }
        out.insert_row(key.clone(), row);
    }

    Ok(out)
}

fn population_of(reference: &Dataset, key: &str, row: &[String]) -> GenerateResult<f64> {
    let cell = row.get(VALUE_OFFSET).ok_or_else(|| GenerateError::ColumnMismatch {
        dataset: reference.name().to_string(),
        key: key.to_string(),
        expected: VALUE_OFFSET + 1,
        found: row.len(),
    })?;

    if cell.is_empty() {
        Ok(FALLBACK_POPULATION)
    } else {
        parse_cell(reference, key, VALUE_OFFSET, cell)
    }
}

fn start_row(key: &str, out_name: &str, width: usize) -> Vec<String> {
    let mut row = Vec::with_capacity(width);
    row.push(key.to_string());
    row.push(out_name.to_string());
    row
}

/// Empty reads as zero; anything else must be a finite number.
fn parse_cell(dataset: &Dataset, key: &str, column: usize, cell: &str) -> GenerateResult<f64> {
    if cell.is_empty() {
        return Ok(0.0);
    }
    match cell.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(GenerateError::InvalidNumber {
            dataset: dataset.name().to_string(),
            key: key.to_string(),
            column,
            value: cell.to_string(),
        }),
    }
}

/// Round half away from zero and print as an integer (never `-0`).
///
/// A zero population or an overflowing product has no integer form.
fn format_rounded(value: f64, out_name: &str, key: &str, column: usize) -> GenerateResult<String> {
    if !value.is_finite() {
        return Err(GenerateError::NonFinite {
            dataset: out_name.to_string(),
            key: key.to_string(),
            column,
        });
    }
    let rounded = value.round();
    if rounded == 0.0 {
        Ok("0".to_string())
    } else {
        Ok(format!("{:.0}", rounded))
    }
}
