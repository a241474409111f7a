//! Hand-verified reference ratios used as a regression harness.

use crate::data::table::{delimiter_for, read_raw};
use crate::error::{ConfigIssue, ConfigurationError, Result};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Expected reference ratio keyed by (compound, reference column).
pub type ExpectedRatios = BTreeMap<(String, String), f64>;

/// Load expected values from a file with columns
/// `compound`, `reference_column`, `expected`.
pub fn load_expected<P: AsRef<Path>>(path: P) -> Result<ExpectedRatios> {
    let delimiter = delimiter_for(&path);
    let file = File::open(path)?;
    read_expected(BufReader::new(file), delimiter)
}

pub fn read_expected<R: Read>(reader: R, delimiter: u8) -> Result<ExpectedRatios> {
    let raw = read_raw(reader, delimiter)?;
    let compound_col = raw.require_column(&["compound", "substance"], "expected values")?;
    let column_col = raw.require_column(
        &["reference_column", "reference", "nist_column", "column"],
        "expected values",
    )?;
    let value_col = raw.require_column(&["expected", "expected_ratio", "value"], "expected values")?;

    let mut expected = ExpectedRatios::new();
    let mut issues = Vec::new();
    for row in 0..raw.rows.len() {
        let text = raw.field(row, value_col).trim();
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => {
                expected.insert(
                    (
                        raw.field(row, compound_col).trim().to_string(),
                        raw.field(row, column_col).trim().to_string(),
                    ),
                    v,
                );
            }
            _ => issues.push(ConfigIssue::InvalidParameter(format!(
                "expected values row {}: '{}' is not a number",
                row + 1,
                text
            ))),
        }
    }
    ConfigurationError::check(issues)?;
    Ok(expected)
}
