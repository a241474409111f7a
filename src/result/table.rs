//! Assembled normalization results.

use crate::data::{name_key, ReferenceTag};
use crate::diagnostics::DiagnosticReport;
use crate::error::Result;
use crate::index::CompoundIstdMap;
use crate::ratio::{estimate_concentration, NormalizedResult, RatioMatrix, ResultStatus};
use crate::result::detail::CalculationDetail;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// One (compound, sample) row of the result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub compound: String,
    pub istd: Option<String>,
    pub sample: String,
    /// Compound area / ISTD area in the sample column.
    pub raw_ratio: Option<f64>,
    /// Reference column actually used.
    pub reference_column: Option<String>,
    pub reference_ratio: Option<f64>,
    /// `raw_ratio / reference_ratio`.
    pub normalized: Option<f64>,
    /// Concentration estimate from the raw ratio.
    pub concentration: Option<f64>,
    pub status: ResultStatus,
}

/// Compound / ISTD ratio in a reference column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRatio {
    pub compound: String,
    pub istd: String,
    pub reference_column: String,
    pub ratio: Option<f64>,
}

/// Counts per status and entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total: usize,
    pub compounds: usize,
    pub samples: usize,
    pub by_status: BTreeMap<String, usize>,
}

impl ResultSummary {
    pub fn count(&self, status: ResultStatus) -> usize {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

impl fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Results: {} ({} compounds × {} samples)",
            self.total, self.compounds, self.samples
        )?;
        for status in ResultStatus::ALL {
            writeln!(f, "  {:<18} {}", status.as_str(), self.count(status))?;
        }
        Ok(())
    }
}

/// Everything a run produces: normalized records, reference ratios,
/// per-calculation details and the diagnostic report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultTable {
    pub records: Vec<ResultRecord>,
    pub reference_ratios: Vec<ReferenceRatio>,
    pub details: Vec<CalculationDetail>,
    pub diagnostics: DiagnosticReport,
}

impl ResultTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultRecord> {
        self.records.iter()
    }

    /// Record for a (compound, sample) pair, matched on normalized names.
    pub fn get(&self, compound: &str, sample: &str) -> Option<&ResultRecord> {
        let compound = name_key(compound);
        let sample = name_key(sample);
        self.records
            .iter()
            .find(|r| name_key(&r.compound) == compound && name_key(&r.sample) == sample)
    }

    /// Records with the given status.
    pub fn with_status(&self, status: ResultStatus) -> Vec<&ResultRecord> {
        self.records.iter().filter(|r| r.status == status).collect()
    }

    /// Reference ratio for a compound in an exact reference column.
    ///
    /// Scans the table; use [`ResultTable::reference_ratio_index`] for
    /// repeated lookups.
    pub fn reference_ratio(&self, compound: &str, reference_column: &str) -> Option<f64> {
        let compound = name_key(compound);
        self.reference_ratios
            .iter()
            .find(|r| r.reference_column == reference_column && name_key(&r.compound) == compound)
            .and_then(|r| r.ratio)
    }

    /// Hashed (compound, reference column) lookup over the reference ratios.
    pub fn reference_ratio_index(&self) -> ReferenceRatioIndex<'_> {
        let mut by_column: HashMap<&str, HashMap<String, Option<f64>>> = HashMap::new();
        for r in &self.reference_ratios {
            by_column
                .entry(r.reference_column.as_str())
                .or_default()
                .entry(name_key(&r.compound))
                .or_insert(r.ratio);
        }
        ReferenceRatioIndex { by_column }
    }

    /// Reference columns present in the reference-ratio table, in order.
    pub fn reference_columns(&self) -> Vec<String> {
        distinct(self.reference_ratios.iter().map(|r| r.reference_column.as_str()))
            .into_iter()
            .map(String::from)
            .collect()
    }

    /// Distinct compounds, in record order.
    pub fn compounds(&self) -> Vec<&str> {
        distinct(self.records.iter().map(|r| r.compound.as_str()))
    }

    /// Distinct samples, in record order.
    pub fn samples(&self) -> Vec<&str> {
        distinct(self.records.iter().map(|r| r.sample.as_str()))
    }

    pub fn summary(&self) -> ResultSummary {
        let mut by_status = BTreeMap::new();
        for status in ResultStatus::ALL {
            by_status.insert(status.as_str().to_string(), 0);
        }
        for r in &self.records {
            *by_status.entry(r.status.as_str().to_string()).or_insert(0) += 1;
        }
        ResultSummary {
            total: self.records.len(),
            compounds: self.compounds().len(),
            samples: self.samples().len(),
            by_status,
        }
    }

    /// Attach calculation details.
    pub fn with_details(mut self, details: Vec<CalculationDetail>) -> Self {
        self.details = details;
        self
    }

    /// Serialize the whole table as pretty JSON; missing values are `null`.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Reference ratios keyed by exact column, then normalized compound name.
#[derive(Debug, Clone)]
pub struct ReferenceRatioIndex<'a> {
    by_column: HashMap<&'a str, HashMap<String, Option<f64>>>,
}

impl ReferenceRatioIndex<'_> {
    pub fn get(&self, compound: &str, reference_column: &str) -> Option<f64> {
        self.by_column
            .get(reference_column)?
            .get(name_key(compound).as_str())
            .copied()
            .flatten()
    }

    /// Number of (compound, column) entries.
    pub fn len(&self) -> usize {
        self.by_column.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// First occurrence of each item, in order.
pub(crate) fn distinct<'a>(items: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(*item)).collect()
}

/// Combine ratios and normalized values into a [`ResultTable`].
///
/// Reference ratios are taken from every column of `ratios` whose header
/// encodes a reference range and replicate. Concentrations use each
/// compound's ISTD quantitation values and `coefficient`.
pub fn assemble(
    ratios: &RatioMatrix,
    normalized: Vec<NormalizedResult>,
    compounds: &CompoundIstdMap,
    coefficient: f64,
    diagnostics: DiagnosticReport,
) -> ResultTable {
    let reference_cols: Vec<usize> = ratios
        .column_names()
        .iter()
        .enumerate()
        .filter(|(_, name)| ReferenceTag::parse(name).is_some())
        .map(|(i, _)| i)
        .collect();

    let mut reference_ratios = Vec::with_capacity(ratios.n_compounds() * reference_cols.len());
    for (row, compound) in compounds.resolved().iter().enumerate() {
        for &col in &reference_cols {
            reference_ratios.push(ReferenceRatio {
                compound: compound.compound.clone(),
                istd: compound.spec.istd.clone(),
                reference_column: ratios.column_names()[col].clone(),
                ratio: ratios.get(row, col),
            });
        }
    }

    let records = normalized
        .into_iter()
        .map(|n| {
            let concentration = compounds
                .get(&n.compound)
                .and_then(|c| estimate_concentration(n.sample_ratio, &c.spec, coefficient));
            ResultRecord {
                compound: n.compound,
                istd: n.istd,
                sample: n.sample,
                raw_ratio: n.sample_ratio,
                reference_column: n.reference_column,
                reference_ratio: n.reference_ratio,
                normalized: n.normalized,
                concentration,
                status: n.status,
            }
        })
        .collect();

    ResultTable {
        records,
        reference_ratios,
        details: Vec::new(),
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AreaTable, ColumnPrefixes, CompoundIndexRow};
    use crate::index::build_compound_istd_map;
    use crate::ratio::{compute_all_ratios, normalize_samples, ResolvedReference, SampleReference};
    use approx::assert_relative_eq;

    fn table() -> ResultTable {
        let area = AreaTable::new(
            vec!["AcylCarnitine 10:0".into(), "AC 10:0 d3".into()],
            vec!["PH-HC_1".into(), "PH-HC_2".into(), "NIST_1-100 (1)".into()],
            vec![
                vec![Some(81884.0), None, Some(20120.0)],
                vec![Some(212434.0), Some(1.0), Some(211600.0)],
            ],
            &ColumnPrefixes::default(),
        )
        .unwrap();
        let rows = vec![
            CompoundIndexRow::new("AcylCarnitine 10:0", "AC 10:0 d3").with_quantitation(90.029, 1.0),
            CompoundIndexRow::new("PC 16:0", "PC 15:0 d7"),
        ];
        let compounds = build_compound_istd_map(&rows, &area).unwrap();
        let ratios = compute_all_ratios(&area, &compounds, &[0, 1, 2]);
        let reference = Some(ResolvedReference {
            name: "NIST_1-100 (1)".into(),
            column: 2,
        });
        let samples = vec![
            SampleReference {
                sample: "PH-HC_1".into(),
                column: 0,
                reference: reference.clone(),
            },
            SampleReference {
                sample: "PH-HC_2".into(),
                column: 1,
                reference,
            },
        ];
        let normalized = normalize_samples(&ratios, &compounds, &samples);
        assemble(&ratios, normalized, &compounds, 500.0, DiagnosticReport::new())
    }

    #[test]
    fn test_assemble_records() {
        let t = table();
        assert_eq!(t.len(), 4);

        let r = t.get("AcylCarnitine 10:0", "PH-HC_1").unwrap();
        assert_eq!(r.status, ResultStatus::Ok);
        assert_relative_eq!(r.normalized.unwrap(), 4.0538, epsilon = 1e-3);
        assert_relative_eq!(r.concentration.unwrap(), r.raw_ratio.unwrap() * 90.029 * 500.0);

        let missing = t.get("AcylCarnitine 10:0", "PH-HC_2").unwrap();
        assert_eq!(missing.status, ResultStatus::MissingArea);
        assert_eq!(missing.concentration, None);

        let pc = t.get("PC 16:0", "PH-HC_1").unwrap();
        assert_eq!(pc.status, ResultStatus::MissingIstd);
        assert_eq!(pc.concentration, None);
    }

    #[test]
    fn test_reference_ratio_table() {
        let t = table();
        assert_eq!(t.reference_ratios.len(), 1);
        assert_eq!(t.reference_columns(), vec!["NIST_1-100 (1)".to_string()]);
        assert_relative_eq!(
            t.reference_ratio("AcylCarnitine 10:0", "NIST_1-100 (1)").unwrap(),
            20120.0 / 211600.0
        );
    }

    #[test]
    fn test_reference_ratio_index_matches_scan() {
        let t = table();
        let index = t.reference_ratio_index();
        assert_eq!(index.len(), t.reference_ratios.len());
        for r in &t.reference_ratios {
            assert_eq!(
                index.get(&r.compound, &r.reference_column),
                t.reference_ratio(&r.compound, &r.reference_column)
            );
        }
        assert_relative_eq!(
            index.get("  AcylCarnitine  10:0 ", "NIST_1-100 (1)").unwrap(),
            20120.0 / 211600.0
        );
        assert_eq!(index.get("AcylCarnitine 10:0", "NIST_1-100(1)"), None);
    }

    #[test]
    fn test_distinct_keeps_first_occurrence_order() {
        let items = ["b", "a", "b", "c", "a"];
        assert_eq!(distinct(items.iter().copied()), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_summary_counts() {
        let summary = table().summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.compounds, 2);
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.count(ResultStatus::Ok), 1);
        assert_eq!(summary.count(ResultStatus::MissingArea), 1);
        assert_eq!(summary.count(ResultStatus::MissingIstd), 2);
        assert_eq!(summary.count(ResultStatus::ZeroDivision), 0);
        assert!(summary.to_string().contains("missing_istd"));
    }

    #[test]
    fn test_to_json_uses_null() {
        let json = table().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let records = value["records"].as_array().unwrap();
        assert_eq!(records.len(), 4);
        assert!(records[1]["normalized"].is_null());
        assert_eq!(records[1]["status"], "missing_area");
        assert!(!json.contains("NaN"));
    }
}
