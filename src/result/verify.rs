//! Regression check of reference ratios against hand-verified values.

use crate::data::ExpectedRatios;
use crate::index::resolve_column_name;
use crate::result::table::ResultTable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome for one expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    /// No computed value, or the reference column is unknown.
    Missing,
}

impl Verdict {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Missing => "missing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationEntry {
    pub compound: String,
    /// Reference column as written in the expected-values file.
    pub reference_column: String,
    /// Column it resolved to in the results.
    pub matched_column: Option<String>,
    pub expected: f64,
    pub actual: Option<f64>,
    pub verdict: Verdict,
}

impl VerificationEntry {
    pub fn difference(&self) -> Option<f64> {
        self.actual.map(|a| (a - self.expected).abs())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub tolerance: f64,
    pub entries: Vec<VerificationEntry>,
}

impl VerificationReport {
    fn count(&self, verdict: Verdict) -> usize {
        self.entries.iter().filter(|e| e.verdict == verdict).count()
    }

    pub fn passed(&self) -> usize {
        self.count(Verdict::Pass)
    }

    pub fn failed(&self) -> usize {
        self.count(Verdict::Fail)
    }

    pub fn missing(&self) -> usize {
        self.count(Verdict::Missing)
    }

    /// Fraction of entries that passed; 0 when there are none.
    pub fn pass_rate(&self) -> f64 {
        if self.entries.is_empty() {
            0.0
        } else {
            self.passed() as f64 / self.entries.len() as f64
        }
    }

    pub fn all_passed(&self) -> bool {
        !self.entries.is_empty() && self.passed() == self.entries.len()
    }

    pub fn get(&self, compound: &str, reference_column: &str) -> Option<&VerificationEntry> {
        self.entries
            .iter()
            .find(|e| e.compound == compound && e.reference_column == reference_column)
    }
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.entries {
            let actual = e
                .actual
                .map(|a| format!("{:.6}", a))
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                f,
                "{:<8} {} [{}]: expected {:.6}, got {}",
                e.verdict.name(),
                e.compound,
                e.reference_column,
                e.expected,
                actual
            )?;
        }
        writeln!(
            f,
            "Passed {}/{} ({:.1}%), failed {}, missing {} (tolerance {:e})",
            self.passed(),
            self.entries.len(),
            self.pass_rate() * 100.0,
            self.failed(),
            self.missing(),
            self.tolerance
        )
    }
}

/// Compare computed reference ratios with expected values.
///
/// Each entry is judged on its own: `pass` when the absolute difference is
/// within `tolerance`, `fail` otherwise, `missing` when the column cannot be
/// resolved or no ratio was computed.
pub fn verify_against_expected(
    results: &ResultTable,
    expected: &ExpectedRatios,
    tolerance: f64,
) -> VerificationReport {
    let columns = results.reference_columns();
    let ratios = results.reference_ratio_index();

    let entries = expected
        .iter()
        .map(|((compound, reference_column), &value)| {
            let matched = resolve_column_name(reference_column, &columns).ok();
            let actual = matched
                .as_ref()
                .and_then(|m| ratios.get(compound, &m.name));
            let verdict = match actual {
                Some(a) if (a - value).abs() <= tolerance => Verdict::Pass,
                Some(_) => Verdict::Fail,
                None => Verdict::Missing,
            };
            VerificationEntry {
                compound: compound.clone(),
                reference_column: reference_column.clone(),
                matched_column: matched.map(|m| m.name),
                expected: value,
                actual,
                verdict,
            }
        })
        .collect();

    let report = VerificationReport { tolerance, entries };
    log::info!(
        "Verification: {}/{} passed ({} failed, {} missing)",
        report.passed(),
        report.entries.len(),
        report.failed(),
        report.missing()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::table::ReferenceRatio;

    fn results() -> ResultTable {
        ResultTable {
            reference_ratios: vec![
                ReferenceRatio {
                    compound: "AcylCarnitine 10:0".into(),
                    istd: "AC 10:0 d3".into(),
                    reference_column: "NIST_1-100 (1)".into(),
                    ratio: Some(20120.0 / 211600.0),
                },
                ReferenceRatio {
                    compound: "PC 16:0".into(),
                    istd: "PC 15:0 d7".into(),
                    reference_column: "NIST_1-100 (1)".into(),
                    ratio: Some(0.5),
                },
                ReferenceRatio {
                    compound: "PC 16:0".into(),
                    istd: "PC 15:0 d7".into(),
                    reference_column: "NIST_1-100 (2)".into(),
                    ratio: None,
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_exact_value_passes_independently() {
        let mut expected = ExpectedRatios::new();
        expected.insert(
            ("AcylCarnitine 10:0".into(), "NIST_1-100(1)".into()),
            20120.0 / 211600.0,
        );
        expected.insert(("PC 16:0".into(), "NIST_1-100 (1)".into()), 0.7);
        expected.insert(("PC 16:0".into(), "NIST_1-100 (2)".into()), 0.1);
        expected.insert(("PC 16:0".into(), "NIST_101-200 (1)".into()), 0.1);

        let report = verify_against_expected(&results(), &expected, 1e-4);
        let ac = report.get("AcylCarnitine 10:0", "NIST_1-100(1)").unwrap();
        assert_eq!(ac.verdict, Verdict::Pass);
        assert_eq!(ac.matched_column.as_deref(), Some("NIST_1-100 (1)"));
        assert_eq!(ac.difference(), Some(0.0));

        assert_eq!(report.get("PC 16:0", "NIST_1-100 (1)").unwrap().verdict, Verdict::Fail);
        assert_eq!(report.get("PC 16:0", "NIST_1-100 (2)").unwrap().verdict, Verdict::Missing);
        assert_eq!(report.get("PC 16:0", "NIST_101-200 (1)").unwrap().verdict, Verdict::Missing);

        assert_eq!(report.passed(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.missing(), 2);
        assert!((report.pass_rate() - 0.25).abs() < 1e-12);
        assert!(!report.all_passed());
    }

    #[test]
    fn test_tolerance_boundary() {
        let mut expected = ExpectedRatios::new();
        expected.insert(("PC 16:0".into(), "NIST_1-100 (1)".into()), 0.50009);
        assert!(verify_against_expected(&results(), &expected, 1e-4).all_passed());
        assert!(!verify_against_expected(&results(), &expected, 1e-5).all_passed());
    }

    #[test]
    fn test_empty_expected() {
        let report = verify_against_expected(&results(), &ExpectedRatios::new(), 1e-4);
        assert_eq!(report.pass_rate(), 0.0);
        assert!(!report.all_passed());
    }
}
