//! Compound → internal standard lookup.

use crate::data::{display_name, name_key, AreaTable, CompoundIndexRow};
use crate::error::{ConfigIssue, ConfigurationError, LookupError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Internal standard assignment for a compound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IstdSpec {
    /// ISTD display name.
    pub istd: String,
    /// Nominal ISTD concentration (nM).
    pub concentration: Option<f64>,
    pub response_factor: Option<f64>,
}

/// A compound whose own row and ISTD row were both found in the area table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCompound {
    /// Compound display name.
    pub compound: String,
    /// Row of the compound in the area table.
    pub row: usize,
    /// Row of its ISTD in the area table.
    pub istd_row: usize,
    pub spec: IstdSpec,
}

/// Result of building the compound → ISTD map.
///
/// Every compound of the index is either in `resolved` or has at least one
/// entry in `unresolved`.
#[derive(Debug, Clone, Default)]
pub struct CompoundIstdMap {
    resolved: Vec<ResolvedCompound>,
    by_key: HashMap<String, usize>,
    unresolved: Vec<LookupError>,
    total: usize,
}

impl CompoundIstdMap {
    /// Resolved compounds in compound-index order.
    pub fn resolved(&self) -> &[ResolvedCompound] {
        &self.resolved
    }

    /// Per-compound resolution failures.
    pub fn unresolved(&self) -> &[LookupError] {
        &self.unresolved
    }

    /// Distinct compounds in the index.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    /// Look up a resolved compound by (normalized) name.
    pub fn get(&self, compound: &str) -> Option<&ResolvedCompound> {
        self.by_key
            .get(&name_key(compound))
            .map(|&i| &self.resolved[i])
    }
}

/// Build the compound → ISTD map and check it against the area table.
///
/// Names are normalized here, at ingestion. Fails with a
/// [`ConfigurationError`] listing every empty required field and every
/// compound assigned to two different ISTDs. Compounds whose row or ISTD
/// row is missing from `area` are reported in
/// [`CompoundIstdMap::unresolved`].
pub fn build_compound_istd_map(
    rows: &[CompoundIndexRow],
    area: &AreaTable,
) -> Result<CompoundIstdMap> {
    let (map, issues) = collect_compound_istd_map(rows, area);
    ConfigurationError::check(issues)?;
    Ok(map)
}

/// Like [`build_compound_istd_map`] but hands back the configuration issues
/// instead of failing, so they can be reported together with other tables.
/// Rows with an issue are left out of the map.
pub fn collect_compound_istd_map(
    rows: &[CompoundIndexRow],
    area: &AreaTable,
) -> (CompoundIstdMap, Vec<ConfigIssue>) {
    let mut issues = Vec::new();
    let mut unique: Vec<(String, IstdSpec)> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (i, row) in rows.iter().enumerate() {
        let compound = display_name(&row.compound);
        let istd = display_name(&row.istd);
        if compound.is_empty() {
            issues.push(ConfigIssue::EmptyField {
                table: "compound index",
                row: i + 1,
                field: "compound",
            });
            continue;
        }
        if istd.is_empty() {
            issues.push(ConfigIssue::EmptyField {
                table: "compound index",
                row: i + 1,
                field: "ISTD",
            });
            continue;
        }

        let key = name_key(&compound);
        if let Some(&existing) = seen.get(&key) {
            let first = &unique[existing].1.istd;
            if name_key(first) != name_key(&istd) {
                issues.push(ConfigIssue::ConflictingIstd {
                    compound,
                    first: first.clone(),
                    second: istd,
                });
            } else {
                log::debug!("Duplicate compound index row for '{}' ignored", compound);
            }
            continue;
        }

        seen.insert(key, unique.len());
        unique.push((
            compound,
            IstdSpec {
                istd,
                concentration: row.concentration,
                response_factor: row.response_factor,
            },
        ));
    }

    let mut map = CompoundIstdMap {
        total: unique.len(),
        ..Default::default()
    };

    for (compound, spec) in unique {
        let row = area.row_of(&compound);
        let istd_row = area.row_of(&spec.istd);

        if row.is_none() {
            map.unresolved.push(LookupError::MissingCompoundRow {
                compound: compound.clone(),
            });
        }
        if istd_row.is_none() {
            map.unresolved.push(LookupError::MissingIstdRow {
                compound: compound.clone(),
                istd: spec.istd.clone(),
            });
        }

        if let (Some(row), Some(istd_row)) = (row, istd_row) {
            log::debug!("Compound '{}' → ISTD '{}'", compound, spec.istd);
            map.by_key.insert(name_key(&compound), map.resolved.len());
            map.resolved.push(ResolvedCompound {
                compound,
                row,
                istd_row,
                spec,
            });
        }
    }

    log::info!(
        "Compound index: {}/{} compounds resolved against the area table",
        map.resolved.len(),
        map.total
    );
    (map, issues)
}
