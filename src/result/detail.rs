//! Step-by-step record of individual calculations.

use crate::data::AreaTable;
use crate::index::CompoundIstdMap;
use crate::ratio::{compute_ratio, normalize, SampleReference};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The inputs and intermediate values behind one normalized result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationDetail {
    pub compound: String,
    pub istd: String,
    pub sample: String,
    pub compound_area: Option<f64>,
    pub istd_area: Option<f64>,
    pub sample_ratio: Option<f64>,
    pub reference_column: Option<String>,
    pub reference_compound_area: Option<f64>,
    pub reference_istd_area: Option<f64>,
    pub reference_ratio: Option<f64>,
    pub normalized: Option<f64>,
}

fn fmt_value(v: Option<f64>) -> String {
    v.map(|x| format!("{:.6}", x)).unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for CalculationDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} / {} in {}", self.compound, self.istd, self.sample)?;
        writeln!(
            f,
            "  sample:    {} / {} = {}",
            fmt_value(self.compound_area),
            fmt_value(self.istd_area),
            fmt_value(self.sample_ratio)
        )?;
        writeln!(
            f,
            "  reference: {} / {} = {} [{}]",
            fmt_value(self.reference_compound_area),
            fmt_value(self.reference_istd_area),
            fmt_value(self.reference_ratio),
            self.reference_column.as_deref().unwrap_or("-")
        )?;
        write!(
            f,
            "  normalized: {} / {} = {}",
            fmt_value(self.sample_ratio),
            fmt_value(self.reference_ratio),
            fmt_value(self.normalized)
        )
    }
}

/// Details for the first `limit` resolved compounds (all when `None`) in
/// every sample.
pub fn calculation_details(
    area: &AreaTable,
    compounds: &CompoundIstdMap,
    samples: &[SampleReference],
    limit: Option<usize>,
) -> Vec<CalculationDetail> {
    let take = limit.unwrap_or(usize::MAX);
    let mut details = Vec::new();

    for compound in compounds.resolved().iter().take(take) {
        for sample in samples {
            let compound_area = area.get(compound.row, sample.column);
            let istd_area = area.get(compound.istd_row, sample.column);
            let (reference_compound_area, reference_istd_area) = match &sample.reference {
                Some(r) => (area.get(compound.row, r.column), area.get(compound.istd_row, r.column)),
                None => (None, None),
            };
            let sample_ratio = compute_ratio(compound_area, istd_area);
            let reference_ratio = compute_ratio(reference_compound_area, reference_istd_area);

            details.push(CalculationDetail {
                compound: compound.compound.clone(),
                istd: compound.spec.istd.clone(),
                sample: sample.sample.clone(),
                compound_area,
                istd_area,
                sample_ratio,
                reference_column: sample.reference.as_ref().map(|r| r.name.clone()),
                reference_compound_area,
                reference_istd_area,
                reference_ratio,
                normalized: normalize(sample_ratio, reference_ratio),
            });
        }
    }
    details
}
