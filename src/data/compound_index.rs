//! Compound index: which internal standard each compound is divided by.

use crate::data::table::{delimiter_for, read_raw};
use crate::error::{ConfigIssue, ConfigurationError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const COMPOUND_ALIASES: &[&str] = &["compound", "substance", "name", "compound_name"];
const ISTD_ALIASES: &[&str] = &["istd", "internal standard", "internal_standard"];
const CONC_ALIASES: &[&str] = &["conc_nm", "Conc. (nM)", "concentration", "conc"];
const RF_ALIASES: &[&str] = &["response_factor", "Response factor", "rf"];

/// One row of the compound index, as read (names untrimmed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundIndexRow {
    pub compound: String,
    pub istd: String,
    /// Nominal ISTD concentration (nM).
    pub concentration: Option<f64>,
    pub response_factor: Option<f64>,
}

impl CompoundIndexRow {
    pub fn new(compound: &str, istd: &str) -> Self {
        Self {
            compound: compound.to_string(),
            istd: istd.to_string(),
            concentration: None,
            response_factor: None,
        }
    }

    /// Attach concentration and response factor.
    pub fn with_quantitation(mut self, concentration: f64, response_factor: f64) -> Self {
        self.concentration = Some(concentration);
        self.response_factor = Some(response_factor);
        self
    }
}

/// Load the compound index from a delimited file.
///
/// Required columns: compound and ISTD. Concentration and response factor
/// are optional; blank cells load as `None`.
pub fn load_compound_index<P: AsRef<Path>>(path: P) -> Result<Vec<CompoundIndexRow>> {
    let delimiter = delimiter_for(&path);
    let file = File::open(path)?;
    read_compound_index(BufReader::new(file), delimiter)
}

/// Read the compound index from any reader.
pub fn read_compound_index<R: Read>(reader: R, delimiter: u8) -> Result<Vec<CompoundIndexRow>> {
    let raw = read_raw(reader, delimiter)?;
    let compound_col = raw.require_column(COMPOUND_ALIASES, "compound index")?;
    let istd_col = raw.require_column(ISTD_ALIASES, "compound index")?;
    let conc_col = raw.find_column(CONC_ALIASES);
    let rf_col = raw.find_column(RF_ALIASES);

    let mut issues = Vec::new();
    let mut rows = Vec::with_capacity(raw.rows.len());

    for row in 0..raw.rows.len() {
        let mut number = |col: Option<usize>, field: &str| -> Option<f64> {
            let text = raw.field(row, col?).trim();
            if text.is_empty() {
                return None;
            }
            match text.replace(',', "").parse::<f64>() {
                Ok(v) if v.is_finite() => Some(v),
                _ => {
                    issues.push(ConfigIssue::InvalidParameter(format!(
                        "compound index row {}: {} '{}' is not a number",
                        row + 1,
                        field,
                        text
                    )));
                    None
                }
            }
        };
        let concentration = number(conc_col, "concentration");
        let response_factor = number(rf_col, "response factor");

        rows.push(CompoundIndexRow {
            compound: raw.field(row, compound_col).to_string(),
            istd: raw.field(row, istd_col).to_string(),
            concentration,
            response_factor,
        });
    }

    ConfigurationError::check(issues)?;
    Ok(rows)
}
