//! Sample index: which reference replicate each sample is normalized against.

use crate::data::table::{delimiter_for, read_raw};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const SAMPLE_ALIASES: &[&str] = &["sample", "sample_name", "sample_id", "name"];
const REFERENCE_ALIASES: &[&str] = &[
    "reference",
    "reference_column",
    "nist",
    "nist_column",
    "qc",
    "qc_column",
];

/// One row of the sample index. The reference may be blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleIndexRow {
    pub sample: String,
    pub reference: Option<String>,
}

impl SampleIndexRow {
    pub fn new(sample: &str, reference: Option<&str>) -> Self {
        Self {
            sample: sample.to_string(),
            reference: reference.map(str::to_string),
        }
    }

    /// Rows with no explicit reference, one per sample name.
    pub fn from_names<I, S>(names: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|n| Self::new(n.as_ref(), None))
            .collect()
    }
}

/// Load the sample index from a delimited file.
///
/// The first matching "sample" column is required. The reference column is
/// optional: when absent, every row loads with `reference: None`.
pub fn load_sample_index<P: AsRef<Path>>(path: P) -> Result<Vec<SampleIndexRow>> {
    let delimiter = delimiter_for(&path);
    let file = File::open(path)?;
    read_sample_index(BufReader::new(file), delimiter)
}

/// Read the sample index from any reader.
pub fn read_sample_index<R: Read>(reader: R, delimiter: u8) -> Result<Vec<SampleIndexRow>> {
    let raw = read_raw(reader, delimiter)?;
    let sample_col = raw.require_column(SAMPLE_ALIASES, "sample index")?;
    let reference_col = raw.find_column(REFERENCE_ALIASES).or_else(|| {
        // Two-column tables without a recognizable header: second column.
        (raw.headers.len() == 2).then(|| 1 - sample_col)
    });

    let rows = (0..raw.rows.len())
        .map(|row| {
            let reference = reference_col
                .map(|col| raw.field(row, col).trim())
                .filter(|r| !r.is_empty())
                .map(str::to_string);
            SampleIndexRow {
                sample: raw.field(row, sample_col).to_string(),
                reference,
            }
        })
        .collect();
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_sample_index() {
        let text = "Sample\tNIST\nPH-HC_1\tNIST_1-100 (1)\nPH-HC_2\t \n";
        let rows = read_sample_index(text.as_bytes(), b'\t').unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].reference.as_deref(), Some("NIST_1-100 (1)"));
        assert_eq!(rows[1].reference, None);
    }

    #[test]
    fn test_second_column_fallback() {
        let text = "sample_name,assigned\nPH-HC_26,NIST_1-100 (2)\n";
        let rows = read_sample_index(text.as_bytes(), b',').unwrap();
        assert_eq!(rows[0].reference.as_deref(), Some("NIST_1-100 (2)"));
    }

    #[test]
    fn test_names_only() {
        let text = "Sample\nPH-HC_1\nPH-HC_2\n";
        let rows = read_sample_index(text.as_bytes(), b'\t').unwrap();
        assert_eq!(rows, SampleIndexRow::from_names(["PH-HC_1", "PH-HC_2"]));
    }
}
