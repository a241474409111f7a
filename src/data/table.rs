//! Delimited-text reading shared by the table loaders.

use crate::data::names::name_key;
use crate::error::{NormError, Result};
use std::io::Read;
use std::path::Path;

/// A header row plus its data records, as raw strings.
#[derive(Debug, Clone)]
pub(crate) struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// `.csv` files are comma-separated; everything else is read as TSV.
pub fn delimiter_for<P: AsRef<Path>>(path: P) -> u8 {
    match path.as_ref().extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
        _ => b'\t',
    }
}

pub(crate) fn read_raw<R: Read>(reader: R, delimiter: u8) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(NormError::EmptyData("Missing header row".to_string()));
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawTable { headers, rows })
}

impl RawTable {
    /// Field `col` of row `row`, or "" for short rows.
    pub fn field(&self, row: usize, col: usize) -> &str {
        self.rows[row].get(col).map(String::as_str).unwrap_or("")
    }

    /// Position of the first header matching any alias (case- and
    /// spacing-insensitive).
    pub fn find_column(&self, aliases: &[&str]) -> Option<usize> {
        let wanted: Vec<String> = aliases.iter().map(|a| header_key(a)).collect();
        self.headers
            .iter()
            .position(|h| wanted.contains(&header_key(h)))
    }

    pub fn require_column(&self, aliases: &[&str], table: &str) -> Result<usize> {
        self.find_column(aliases).ok_or_else(|| NormError::MissingColumn {
            table: table.to_string(),
            column: aliases[0].to_string(),
        })
    }
}

fn header_key(header: &str) -> String {
    name_key(header)
        .to_lowercase()
        .replace(['_', ' ', '.', '(', ')'], "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_for() {
        assert_eq!(delimiter_for("areas.csv"), b',');
        assert_eq!(delimiter_for("areas.CSV"), b',');
        assert_eq!(delimiter_for("areas.tsv"), b'\t');
        assert_eq!(delimiter_for("areas"), b'\t');
    }

    #[test]
    fn test_read_raw_skips_blank_rows() {
        let text = "Compound\tISTD\nPC 16:0\tPC 15:0 d7\n\t\nLPC 18:1\tLPC 18:1 d7\n";
        let table = read_raw(text.as_bytes(), b'\t').unwrap();
        assert_eq!(table.headers, vec!["Compound", "ISTD"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.field(1, 0), "LPC 18:1");
        assert_eq!(table.field(1, 5), "");
    }

    #[test]
    fn test_find_column_aliases() {
        let text = "Substance,ISTD,Conc. (nM),Response factor\n";
        let table = read_raw(text.as_bytes(), b',').unwrap();
        assert_eq!(table.find_column(&["compound", "substance"]), Some(0));
        assert_eq!(table.find_column(&["conc_nm", "Conc. (nM)"]), Some(2));
        assert_eq!(table.find_column(&["response_factor"]), Some(3));
        assert!(table.require_column(&["sample"], "sample index").is_err());
    }
}
