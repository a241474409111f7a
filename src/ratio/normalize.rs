//! Sample ratio ÷ reference ratio.

use crate::error::LookupError;
use crate::index::CompoundIstdMap;
use crate::ratio::compute::{RatioMatrix, RatioOutcome};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Outcome of one (compound, sample) normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Ok,
    /// The compound's internal standard is absent from the area table.
    MissingIstd,
    /// The sample has no usable reference column.
    MissingReference,
    /// A required area is blank or invalid.
    MissingArea,
    /// A denominator (ISTD area or reference ratio) is zero.
    ZeroDivision,
}

impl ResultStatus {
    pub const ALL: [ResultStatus; 5] = [
        Self::Ok,
        Self::MissingIstd,
        Self::MissingReference,
        Self::MissingArea,
        Self::ZeroDivision,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::MissingIstd => "missing_istd",
            Self::MissingReference => "missing_reference",
            Self::MissingArea => "missing_area",
            Self::ZeroDivision => "zero_division",
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a sample ratio by its reference ratio.
///
/// `None` when either ratio is missing or the reference ratio is zero.
pub fn normalize(sample_ratio: Option<f64>, reference_ratio: Option<f64>) -> Option<f64> {
    RatioOutcome::of(sample_ratio, reference_ratio).value()
}

/// A reference column matched in the area table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedReference {
    /// Header as it appears in the area table.
    pub name: String,
    /// Position in the area table.
    pub column: usize,
}

/// A sample column and the reference column it is normalized against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleReference {
    pub sample: String,
    /// Position of the sample column in the area table.
    pub column: usize,
    /// `None` when the sample could not be assigned or its reference
    /// column was not found.
    pub reference: Option<ResolvedReference>,
}

/// Normalized value for one compound in one sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedResult {
    pub compound: String,
    /// `None` when the compound never reached the ISTD lookup.
    pub istd: Option<String>,
    pub sample: String,
    pub sample_ratio: Option<f64>,
    pub reference_column: Option<String>,
    pub reference_ratio: Option<f64>,
    pub normalized: Option<f64>,
    pub status: ResultStatus,
}

fn classify(sample: RatioOutcome, reference: Option<RatioOutcome>) -> ResultStatus {
    let Some(reference) = reference else {
        return ResultStatus::MissingReference;
    };
    match (sample, reference) {
        (RatioOutcome::MissingArea, _) | (_, RatioOutcome::MissingArea) => ResultStatus::MissingArea,
        (RatioOutcome::ZeroDivision, _) | (_, RatioOutcome::ZeroDivision) => {
            ResultStatus::ZeroDivision
        }
        (RatioOutcome::Value(s), RatioOutcome::Value(r)) => match RatioOutcome::of(Some(s), Some(r)) {
            RatioOutcome::Value(_) => ResultStatus::Ok,
            _ => ResultStatus::ZeroDivision,
        },
    }
}

/// Normalize every compound of the index in every sample.
///
/// `ratios` must cover the sample columns and the resolved reference
/// columns of `samples`. Resolved compounds come first, in index order,
/// followed by a placeholder row per sample for each unresolved compound so
/// that every (compound, sample) pair carries a status.
pub fn normalize_samples(
    ratios: &RatioMatrix,
    compounds: &CompoundIstdMap,
    samples: &[SampleReference],
) -> Vec<NormalizedResult> {
    let mut results = Vec::with_capacity(compounds.total() * samples.len());

    for (row, compound) in compounds.resolved().iter().enumerate() {
        for sample in samples {
            let sample_outcome = ratios
                .col_of_area_column(sample.column)
                .map(|col| ratios.outcome(row, col))
                .unwrap_or(RatioOutcome::MissingArea);
            let reference_outcome = sample.reference.as_ref().map(|r| {
                ratios
                    .col_of_area_column(r.column)
                    .map(|col| ratios.outcome(row, col))
                    .unwrap_or(RatioOutcome::MissingArea)
            });

            let sample_ratio = sample_outcome.value();
            let reference_ratio = reference_outcome.and_then(RatioOutcome::value);
            results.push(NormalizedResult {
                compound: compound.compound.clone(),
                istd: Some(compound.spec.istd.clone()),
                sample: sample.sample.clone(),
                sample_ratio,
                reference_column: sample.reference.as_ref().map(|r| r.name.clone()),
                reference_ratio,
                normalized: normalize(sample_ratio, reference_ratio),
                status: classify(sample_outcome, reference_outcome),
            });
        }
    }

    for (compound, istd, status) in unresolved_compounds(compounds.unresolved()) {
        for sample in samples {
            results.push(NormalizedResult {
                compound: compound.clone(),
                istd: istd.clone(),
                sample: sample.sample.clone(),
                sample_ratio: None,
                reference_column: sample.reference.as_ref().map(|r| r.name.clone()),
                reference_ratio: None,
                normalized: None,
                status,
            });
        }
    }

    results
}

/// One entry per unresolved compound: a missing ISTD row takes precedence
/// over a missing compound row.
fn unresolved_compounds(errors: &[LookupError]) -> Vec<(String, Option<String>, ResultStatus)> {
    let mut out: Vec<(String, Option<String>, ResultStatus)> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();
    for error in errors {
        let (compound, istd, status) = match error {
            LookupError::MissingIstdRow { compound, istd } => {
                (compound, Some(istd.clone()), ResultStatus::MissingIstd)
            }
            LookupError::MissingCompoundRow { compound } => (compound, None, ResultStatus::MissingArea),
            _ => continue,
        };
        match position.get(compound.as_str()) {
            Some(&i) => {
                if status == ResultStatus::MissingIstd {
                    out[i].1 = istd;
                    out[i].2 = status;
                }
            }
            None => {
                position.insert(compound.as_str(), out.len());
                out.push((compound.clone(), istd, status));
            }
        }
    }
    out
}
