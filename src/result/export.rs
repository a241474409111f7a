//! Delimited-text export of result tables.

use crate::error::{NormError, Result};
use crate::result::table::ResultTable;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Layout of the exported table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One row per (compound, sample) record.
    #[default]
    Table,
    /// Compounds × samples, normalized values only.
    Matrix,
}

impl std::str::FromStr for ExportFormat {
    type Err = NormError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "matrix" => Ok(Self::Matrix),
            other => Err(NormError::InvalidParameter(format!(
                "Unknown export format '{}' (expected table or matrix)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub delimiter: u8,
    /// Decimal places for numeric cells.
    pub decimals: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Table,
            delimiter: b'\t',
            decimals: 6,
        }
    }
}

impl ExportOptions {
    pub fn matrix() -> Self {
        Self {
            format: ExportFormat::Matrix,
            ..Default::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals;
        self
    }
}

/// Missing values become empty cells.
fn cell(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", decimals, v),
        _ => String::new(),
    }
}

fn writer(options: &ExportOptions) -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| NormError::Io(e.into_error()))
}

/// Render results as delimited text.
pub fn export(results: &ResultTable, options: &ExportOptions) -> Result<Vec<u8>> {
    match options.format {
        ExportFormat::Table => export_table(results, options),
        ExportFormat::Matrix => export_matrix(results, options),
    }
}

fn export_table(results: &ResultTable, options: &ExportOptions) -> Result<Vec<u8>> {
    let mut w = writer(options);
    w.write_record([
        "compound",
        "istd",
        "sample",
        "raw_ratio",
        "reference_column",
        "reference_ratio",
        "normalized",
        "concentration",
        "status",
    ])?;
    let d = options.decimals;
    for r in &results.records {
        w.write_record([
            r.compound.clone(),
            r.istd.clone().unwrap_or_default(),
            r.sample.clone(),
            cell(r.raw_ratio, d),
            r.reference_column.clone().unwrap_or_default(),
            cell(r.reference_ratio, d),
            cell(r.normalized, d),
            cell(r.concentration, d),
            r.status.as_str().to_string(),
        ])?;
    }
    finish(w)
}

fn export_matrix(results: &ResultTable, options: &ExportOptions) -> Result<Vec<u8>> {
    let compounds = results.compounds();
    let samples = results.samples();
    let mut values: HashMap<(&str, &str), Option<f64>> = HashMap::with_capacity(results.len());
    for r in &results.records {
        values.insert((r.compound.as_str(), r.sample.as_str()), r.normalized);
    }

    let mut w = writer(options);
    let mut header = vec!["compound"];
    header.extend(samples.iter().copied());
    w.write_record(&header)?;

    for compound in compounds {
        let mut row = vec![compound.to_string()];
        for sample in &samples {
            let v = values.get(&(compound, *sample)).copied().flatten();
            row.push(cell(v, options.decimals));
        }
        w.write_record(&row)?;
    }
    finish(w)
}

/// Reference ratios as a compound × reference-column matrix, with the
/// ISTD in the second column.
pub fn export_reference_ratios(results: &ResultTable, options: &ExportOptions) -> Result<Vec<u8>> {
    let columns = results.reference_columns();
    let mut w = writer(options);

    let mut header = vec!["compound".to_string(), "istd".to_string()];
    header.extend(columns.iter().cloned());
    w.write_record(&header)?;

    let mut order: Vec<(&str, &str)> = Vec::new();
    let mut seen = HashSet::new();
    let mut values: HashMap<(&str, &str), Option<f64>> =
        HashMap::with_capacity(results.reference_ratios.len());
    for r in &results.reference_ratios {
        if seen.insert(r.compound.as_str()) {
            order.push((r.compound.as_str(), r.istd.as_str()));
        }
        values
            .entry((r.compound.as_str(), r.reference_column.as_str()))
            .or_insert(r.ratio);
    }
    for (compound, istd) in order {
        let mut row = vec![compound.to_string(), istd.to_string()];
        for column in &columns {
            let v = values.get(&(compound, column.as_str())).copied().flatten();
            row.push(cell(v, options.decimals));
        }
        w.write_record(&row)?;
    }
    finish(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratio::ResultStatus;
    use crate::result::table::{ReferenceRatio, ResultRecord};

    fn record(compound: &str, sample: &str, normalized: Option<f64>, status: ResultStatus) -> ResultRecord {
        ResultRecord {
            compound: compound.into(),
            istd: Some("IS".into()),
            sample: sample.into(),
            raw_ratio: normalized.map(|n| n / 2.0),
            reference_column: Some("NIST_1-100 (1)".into()),
            reference_ratio: Some(0.5),
            normalized,
            concentration: None,
            status,
        }
    }

    fn results() -> ResultTable {
        ResultTable {
            records: vec![
                record("A", "PH-HC_1", Some(4.053_8), ResultStatus::Ok),
                record("A", "PH-HC_2", None, ResultStatus::MissingArea),
                record("B", "PH-HC_1", Some(1.0), ResultStatus::Ok),
            ],
            reference_ratios: vec![
                ReferenceRatio {
                    compound: "A".into(),
                    istd: "IS".into(),
                    reference_column: "NIST_1-100 (1)".into(),
                    ratio: Some(0.5),
                },
                ReferenceRatio {
                    compound: "A".into(),
                    istd: "IS".into(),
                    reference_column: "NIST_1-100 (2)".into(),
                    ratio: None,
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_table_export() {
        let bytes = export(&results(), &ExportOptions::default()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("compound\tistd\tsample\traw_ratio"));
        assert_eq!(
            lines[1],
            "A\tIS\tPH-HC_1\t2.026900\tNIST_1-100 (1)\t0.500000\t4.053800\t\tok"
        );
        assert_eq!(lines[2], "A\tIS\tPH-HC_2\t\tNIST_1-100 (1)\t0.500000\t\t\tmissing_area");
        assert!(!text.contains("NaN"));
    }

    #[test]
    fn test_matrix_export() {
        let options = ExportOptions::matrix().with_delimiter(b',').with_decimals(2);
        let text = String::from_utf8(export(&results(), &options).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["compound,PH-HC_1,PH-HC_2", "A,4.05,", "B,1.00,"]);
    }

    #[test]
    fn test_reference_ratio_export() {
        let text = String::from_utf8(
            export_reference_ratios(&results(), &ExportOptions::default()).unwrap(),
        )
        .unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "compound\tistd\tNIST_1-100 (1)\tNIST_1-100 (2)");
        assert_eq!(lines[1], "A\tIS\t0.500000\t");
    }

    #[test]
    fn test_reference_ratio_export_wide_table() {
        let columns: Vec<String> = (0..80)
            .map(|i| format!("NIST_{}-{} ({})", i / 4 * 100 + 1, i / 4 * 100 + 100, i % 4 + 1))
            .collect();
        let mut reference_ratios = Vec::new();
        for column in &columns {
            for c in 0..200 {
                reference_ratios.push(ReferenceRatio {
                    compound: format!("C{}", c),
                    istd: format!("IS{}", c % 7),
                    reference_column: column.clone(),
                    ratio: (c % 5 != 0).then_some(c as f64 / 8.0),
                });
            }
        }
        let results = ResultTable {
            reference_ratios,
            ..Default::default()
        };

        let text = String::from_utf8(
            export_reference_ratios(&results, &ExportOptions::default().with_decimals(3)).unwrap(),
        )
        .unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 201);
        assert_eq!(lines[0].split('\t').count(), 82);
        assert!(lines[1].starts_with("C0\tIS0\t\t"));
        let c3: Vec<&str> = lines[4].split('\t').collect();
        assert_eq!(c3[..3], ["C3", "IS3", "0.375"]);
        assert_eq!(c3[81], "0.375");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("Matrix".parse::<ExportFormat>().unwrap(), ExportFormat::Matrix);
        assert!("xlsx".parse::<ExportFormat>().is_err());
    }
}
