//! Compound-to-internal-standard area ratios.

use crate::data::{name_key, AreaTable};
use crate::index::CompoundIstdMap;
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Why a ratio could or could not be formed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RatioOutcome {
    /// A finite quotient.
    Value(f64),
    /// Numerator or denominator is absent.
    MissingArea,
    /// Denominator is zero (or the quotient is not representable).
    ZeroDivision,
}

impl RatioOutcome {
    /// Classify `numerator / denominator`.
    pub fn of(numerator: Option<f64>, denominator: Option<f64>) -> Self {
        match (numerator, denominator) {
            (Some(n), Some(d)) => {
                if d == 0.0 {
                    return Self::ZeroDivision;
                }
                let q = n / d;
                if q.is_finite() {
                    Self::Value(q)
                } else {
                    Self::ZeroDivision
                }
            }
            _ => Self::MissingArea,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Ratio of a compound's area to its ISTD's area in the same column.
///
/// `None` when either area is missing or the ISTD area is zero; a
/// computed zero is `Some(0.0)`.
pub fn compute_ratio(compound_area: Option<f64>, istd_area: Option<f64>) -> Option<f64> {
    RatioOutcome::of(compound_area, istd_area).value()
}

/// Ratios for every resolved compound across a set of area-table columns.
#[derive(Debug, Clone)]
pub struct RatioMatrix {
    /// Ratio outcomes (resolved compounds × requested columns).
    data: DMatrix<RatioOutcome>,
    /// Resolved compound names, in compound-index order.
    compound_ids: Vec<String>,
    /// Column headers, in request order.
    column_names: Vec<String>,
    /// Area-table position of each requested column.
    area_columns: Vec<usize>,
    /// Area-table position → matrix column.
    by_area_column: HashMap<usize, usize>,
    /// Normalized compound name → matrix row.
    by_key: HashMap<String, usize>,
}

impl RatioMatrix {
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data[(row, col)].value()
    }

    /// Ratio at (row, col) together with the reason it may be absent.
    #[inline]
    pub fn outcome(&self, row: usize, col: usize) -> RatioOutcome {
        self.data[(row, col)]
    }

    /// Ratio for a compound (normalized lookup) in a column (exact header).
    pub fn ratio(&self, compound: &str, column: &str) -> Option<f64> {
        let row = self.row_of(compound)?;
        let col = self.column_names.iter().position(|c| c == column)?;
        self.get(row, col)
    }

    pub fn row_of(&self, compound: &str) -> Option<usize> {
        self.by_key.get(&name_key(compound)).copied()
    }

    /// Matrix column holding the given area-table column.
    pub fn col_of_area_column(&self, area_col: usize) -> Option<usize> {
        self.by_area_column.get(&area_col).copied()
    }

    #[inline]
    pub fn n_compounds(&self) -> usize {
        self.data.nrows()
    }

    #[inline]
    pub fn n_columns(&self) -> usize {
        self.data.ncols()
    }

    pub fn compound_ids(&self) -> &[String] {
        &self.compound_ids
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn area_columns(&self) -> &[usize] {
        &self.area_columns
    }

    /// A compound's ratios across all requested columns.
    pub fn row(&self, row: usize) -> Vec<Option<f64>> {
        self.data.row(row).iter().map(|o| o.value()).collect()
    }
}

/// Compute ratios for every resolved compound in every requested column.
///
/// Each column is read once; columns are processed in parallel since no
/// two columns write the same entry. Unresolved compounds get no row.
pub fn compute_all_ratios(
    area: &AreaTable,
    compounds: &CompoundIstdMap,
    columns: &[usize],
) -> RatioMatrix {
    let resolved = compounds.resolved();

    let per_column: Vec<Vec<RatioOutcome>> = columns
        .par_iter()
        .map(|&col| {
            let values = area.column(col);
            resolved
                .iter()
                .map(|c| RatioOutcome::of(values[c.row], values[c.istd_row]))
                .collect()
        })
        .collect();

    let data = DMatrix::from_fn(resolved.len(), columns.len(), |r, c| per_column[c][r]);
    let column_names = columns
        .iter()
        .map(|&c| area.columns()[c].name.clone())
        .collect();

    log::info!(
        "Computed ratios for {} compounds × {} columns",
        resolved.len(),
        columns.len()
    );

    let mut by_area_column = HashMap::with_capacity(columns.len());
    for (i, &c) in columns.iter().enumerate() {
        by_area_column.entry(c).or_insert(i);
    }
    let by_key = resolved
        .iter()
        .enumerate()
        .map(|(i, c)| (name_key(&c.compound), i))
        .collect();

    RatioMatrix {
        data,
        compound_ids: resolved.iter().map(|c| c.compound.clone()).collect(),
        column_names,
        area_columns: columns.to_vec(),
        by_area_column,
        by_key,
    }
}
