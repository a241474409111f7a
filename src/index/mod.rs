//! Reference index builder: lookup structures built and validated before
//! any ratio is computed.

mod compound;
mod resolve;
mod sample;

pub use compound::{
    build_compound_istd_map, collect_compound_istd_map, CompoundIstdMap, IstdSpec,
    ResolvedCompound,
};
pub use resolve::{
    exact_match, resolve_column_name, structured_pattern_match, whitespace_insensitive_match,
    MatchStrategy, ResolvedColumn, STRATEGIES,
};
pub use sample::{
    build_sample_reference_map, collect_sample_reference_map, AssignmentPolicy, SampleAssignment,
    SampleReferenceMap,
};
