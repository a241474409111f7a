//! Concentration estimate from a raw ratio.

use crate::index::IstdSpec;

/// Default dilution/volume coefficient.
pub const DEFAULT_COEFFICIENT: f64 = 500.0;

/// `ratio × ISTD concentration × response factor × coefficient`.
///
/// `None` when the ratio, the concentration or the response factor is
/// missing, or when the product is not finite.
pub fn estimate_concentration(ratio: Option<f64>, spec: &IstdSpec, coefficient: f64) -> Option<f64> {
    let value = ratio? * spec.concentration? * spec.response_factor? * coefficient;
    value.is_finite().then_some(value)
}
