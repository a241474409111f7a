//! Raw peak-area matrix: compounds × (sample and reference) columns.

use crate::data::column::{ColumnKind, ColumnPrefixes, ReferenceTag};
use crate::data::names::{display_name, name_key, parse_area, AreaCell};
use crate::data::table::{delimiter_for, read_raw, RawTable};
use crate::error::{ConfigIssue, ConfigurationError, LookupError, NormError, Result};
use nalgebra::DMatrix;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// A column header of the area table and its classification.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaColumn {
    pub name: String,
    pub kind: ColumnKind,
}

/// Peak areas for every compound (row) in every column.
///
/// Absent or unusable cells are `None`; a zero area is a real zero.
#[derive(Debug, Clone)]
pub struct AreaTable {
    /// Areas (compounds × columns).
    data: DMatrix<Option<f64>>,
    /// Compound display names (row names).
    compound_ids: Vec<String>,
    /// Column headers (excluding the compound-name column).
    columns: Vec<AreaColumn>,
    /// Normalized compound key → row.
    row_index: HashMap<String, usize>,
    /// Cells that held text which is not a usable area.
    invalid_cells: Vec<LookupError>,
}

impl AreaTable {
    /// Build a table from in-memory rows.
    ///
    /// `values[row][col]` must line up with `compound_ids` and `column_names`.
    pub fn new(
        compound_ids: Vec<String>,
        column_names: Vec<String>,
        values: Vec<Vec<Option<f64>>>,
        prefixes: &ColumnPrefixes,
    ) -> Result<Self> {
        if values.len() != compound_ids.len() {
            return Err(NormError::InvalidParameter(format!(
                "{} value rows for {} compounds",
                values.len(),
                compound_ids.len()
            )));
        }
        if let Some(bad) = values.iter().position(|r| r.len() != column_names.len()) {
            return Err(NormError::InvalidParameter(format!(
                "Row {} has {} values, expected {}",
                bad,
                values[bad].len(),
                column_names.len()
            )));
        }

        let n_rows = compound_ids.len();
        let n_cols = column_names.len();
        let data = DMatrix::from_fn(n_rows, n_cols, |r, c| values[r][c]);
        Self::assemble(data, compound_ids, column_names, Vec::new(), prefixes)
    }

    /// Load an area table from a delimited file (`.csv` or TSV).
    ///
    /// Expected format:
    /// - First row: header; first column is the compound name, the rest are
    ///   sample and reference columns
    /// - Subsequent rows: compound name followed by peak areas
    pub fn from_path<P: AsRef<Path>>(path: P, prefixes: &ColumnPrefixes) -> Result<Self> {
        let delimiter = delimiter_for(&path);
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), delimiter, prefixes)
    }

    /// Load an area table from any reader.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8, prefixes: &ColumnPrefixes) -> Result<Self> {
        let raw = read_raw(reader, delimiter)?;
        Self::from_raw(raw, prefixes)
    }

    fn from_raw(raw: RawTable, prefixes: &ColumnPrefixes) -> Result<Self> {
        if raw.headers.len() < 2 {
            return Err(NormError::EmptyData(
                "Area table must have at least one area column".to_string(),
            ));
        }
        let column_names: Vec<String> = raw.headers[1..].iter().map(|h| h.trim().to_string()).collect();
        let n_cols = column_names.len();
        let ignored: Vec<bool> = column_names
            .iter()
            .map(|name| prefixes.classify(name) == ColumnKind::Other)
            .collect();

        let mut issues = Vec::new();
        let mut compound_ids = Vec::new();
        let mut cells: Vec<Option<f64>> = Vec::new();
        let mut invalid_cells = Vec::new();

        for row in 0..raw.rows.len() {
            let compound = display_name(raw.field(row, 0));
            if compound.is_empty() {
                issues.push(ConfigIssue::EmptyField {
                    table: "area table",
                    row: row + 1,
                    field: "compound",
                });
                continue;
            }
            for (col, column_name) in column_names.iter().enumerate() {
                let text = raw.field(row, col + 1);
                let value = match parse_area(text) {
                    AreaCell::Value(v) => Some(v),
                    AreaCell::Missing => None,
                    AreaCell::Invalid if ignored[col] => None,
                    AreaCell::Invalid => {
                        invalid_cells.push(LookupError::InvalidArea {
                            compound: compound.clone(),
                            column: column_name.clone(),
                            raw: text.trim().to_string(),
                        });
                        None
                    }
                };
                cells.push(value);
            }
            compound_ids.push(compound);
        }
        ConfigurationError::check(issues)?;

        if compound_ids.is_empty() {
            return Err(NormError::EmptyData("No compounds in area table".to_string()));
        }

        let data = DMatrix::from_row_slice(compound_ids.len(), n_cols, &cells);
        Self::assemble(data, compound_ids, column_names, invalid_cells, prefixes)
    }

    fn assemble(
        data: DMatrix<Option<f64>>,
        compound_ids: Vec<String>,
        column_names: Vec<String>,
        invalid_cells: Vec<LookupError>,
        prefixes: &ColumnPrefixes,
    ) -> Result<Self> {
        let mut row_index = HashMap::with_capacity(compound_ids.len());
        let mut issues = Vec::new();
        for (row, id) in compound_ids.iter().enumerate() {
            if row_index.insert(name_key(id), row).is_some() {
                issues.push(ConfigIssue::DuplicateAreaRow(id.clone()));
            }
        }
        ConfigurationError::check(issues)?;

        let columns: Vec<AreaColumn> = column_names
            .into_iter()
            .map(|name| {
                let kind = prefixes.classify(&name);
                if kind == ColumnKind::Other {
                    log::warn!("Column '{}' is neither a sample nor a reference column; ignored", name);
                }
                AreaColumn { name, kind }
            })
            .collect();

        for cell in &invalid_cells {
            log::warn!("{}", cell);
        }

        Ok(Self {
            data,
            compound_ids,
            columns,
            row_index,
            invalid_cells,
        })
    }

    /// Area at (row, col).
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data[(row, col)]
    }

    /// Row of a compound, looked up by normalized name.
    pub fn row_of(&self, compound: &str) -> Option<usize> {
        self.row_index.get(&name_key(compound)).copied()
    }

    /// Column position of an exact header.
    pub fn column_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Area for a compound in a column, both looked up by name.
    pub fn area(&self, compound: &str, column: &str) -> Option<f64> {
        let row = self.row_of(compound)?;
        let col = self.column_of(column)?;
        self.get(row, col)
    }

    /// Number of compounds (rows).
    #[inline]
    pub fn n_compounds(&self) -> usize {
        self.data.nrows()
    }

    /// Number of area columns.
    #[inline]
    pub fn n_columns(&self) -> usize {
        self.data.ncols()
    }

    #[inline]
    pub fn compound_ids(&self) -> &[String] {
        &self.compound_ids
    }

    #[inline]
    pub fn columns(&self) -> &[AreaColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Dense copy of one column.
    pub fn column(&self, col: usize) -> Vec<Option<f64>> {
        self.data.column(col).iter().copied().collect()
    }

    /// Positions of sample columns, in table order.
    pub fn sample_columns(&self) -> Vec<usize> {
        self.columns_where(ColumnKind::is_sample)
    }

    /// Positions of reference columns, in table order.
    pub fn reference_columns(&self) -> Vec<usize> {
        self.columns_where(ColumnKind::is_reference)
    }

    fn columns_where(&self, pred: impl Fn(&ColumnKind) -> bool) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| pred(&c.kind))
            .map(|(i, _)| i)
            .collect()
    }

    /// Reference columns grouped by numbering block, replicates sorted.
    pub fn reference_blocks(&self) -> BTreeMap<(u32, u32), Vec<(u32, String)>> {
        let mut blocks: BTreeMap<(u32, u32), Vec<(u32, String)>> = BTreeMap::new();
        for column in &self.columns {
            if let ColumnKind::Reference(ReferenceTag {
                range_start,
                range_end,
                replicate,
            }) = column.kind
            {
                blocks
                    .entry((range_start, range_end))
                    .or_default()
                    .push((replicate, column.name.clone()));
            }
        }
        for replicates in blocks.values_mut() {
            replicates.sort();
        }
        blocks
    }

    /// Cells that could not be read as areas.
    pub fn invalid_cells(&self) -> &[LookupError] {
        &self.invalid_cells
    }
}
