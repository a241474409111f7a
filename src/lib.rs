//! NIST Ratio Normalization Library
//!
//! Normalizes LC-MS/MS peak areas against a shared QC reference material.
//! Each compound's area is divided by the area of its internal standard
//! (ISTD) in the same column, and each sample's ratio is then divided by
//! the same compound's ratio in the reference replicate assigned to that
//! sample.
//!
//! # Overview
//!
//! - **data**: Input tables (AreaTable, compound index, sample index,
//!   expected values) with cleaning and column classification
//! - **index**: Compound → ISTD and sample → reference maps, column-name
//!   resolution
//! - **ratio**: Ratio computation, normalization, concentration estimates
//! - **result**: Result table, calculation details, verification, export
//! - **diagnostics**: Per-entity lookup failures returned with results
//! - **pipeline**: Configuration and execution
//!
//! # Example
//!
//! ```no_run
//! use nist_normalize::prelude::*;
//!
//! let config = NormalizationConfig::default();
//! let area = AreaTable::from_path("areas.tsv", &config.column_prefixes()).unwrap();
//! let compounds = load_compound_index("compound_index.tsv").unwrap();
//! let samples = load_sample_index("sample_index.tsv").unwrap();
//!
//! let results = Pipeline::from_config(&config)
//!     .run(&area, &compounds, &samples)
//!     .unwrap();
//! println!("{}", results.summary());
//! ```

pub mod data;
pub mod diagnostics;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod ratio;
pub mod result;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::data::{
        load_compound_index, load_expected, load_sample_index, AreaColumn, AreaTable, ColumnKind,
        ColumnPrefixes, CompoundIndexRow, ExpectedRatios, ReferenceTag, SampleIndexRow,
    };
    pub use crate::diagnostics::DiagnosticReport;
    pub use crate::error::{ConfigIssue, ConfigurationError, LookupError, NormError, Result};
    pub use crate::index::{
        build_compound_istd_map, build_sample_reference_map, resolve_column_name,
        AssignmentPolicy, CompoundIstdMap, IstdSpec, MatchStrategy, ResolvedColumn,
        SampleAssignment, SampleReferenceMap,
    };
    pub use crate::pipeline::{run_normalization, NormalizationConfig, Pipeline};
    pub use crate::ratio::{
        compute_all_ratios, compute_ratio, estimate_concentration, normalize, normalize_samples,
        NormalizedResult, RatioMatrix, ResultStatus, SampleReference,
    };
    pub use crate::result::{
        assemble, export, export_reference_ratios, verify_against_expected, CalculationDetail,
        ExportFormat, ExportOptions, ResultRecord, ResultTable, VerificationReport, Verdict,
    };
}
