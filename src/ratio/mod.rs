//! Ratio computation engine: area ratios, normalization against the
//! reference replicate, and concentration estimates.

mod compute;
mod normalize;
mod quantify;

pub use compute::{compute_all_ratios, compute_ratio, RatioMatrix, RatioOutcome};
pub use normalize::{
    normalize, normalize_samples, NormalizedResult, ResolvedReference, ResultStatus,
    SampleReference,
};
pub use quantify::{estimate_concentration, DEFAULT_COEFFICIENT};
