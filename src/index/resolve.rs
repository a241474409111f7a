//! Matching logical reference-column names against actual headers.
//!
//! Strategies run in a fixed order and the first one that matches any
//! candidate wins. Each strategy is a plain predicate so it can be tested
//! on its own.

use crate::data::ReferenceTag;
use crate::error::{NormError, Result};
use serde::{Deserialize, Serialize};

/// Which strategy produced a column match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Byte-for-byte identical.
    Exact,
    /// Identical once all whitespace is removed.
    WhitespaceInsensitive,
    /// Same range start, range end and replicate index.
    StructuredPattern,
}

/// Ordered strategy list.
pub const STRATEGIES: &[(MatchStrategy, fn(&str, &str) -> bool)] = &[
    (MatchStrategy::Exact, exact_match),
    (MatchStrategy::WhitespaceInsensitive, whitespace_insensitive_match),
    (MatchStrategy::StructuredPattern, structured_pattern_match),
];

/// A logical name resolved to an actual column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumn {
    /// Position within the candidate list.
    pub index: usize,
    /// The header as it appears in the table.
    pub name: String,
    pub strategy: MatchStrategy,
}

pub fn exact_match(logical: &str, candidate: &str) -> bool {
    logical == candidate
}

pub fn whitespace_insensitive_match(logical: &str, candidate: &str) -> bool {
    let mut a = logical.chars().filter(|c| !c.is_whitespace());
    let mut b = candidate.chars().filter(|c| !c.is_whitespace());
    loop {
        match (a.next(), b.next()) {
            (None, None) => return true,
            (x, y) if x == y => continue,
            _ => return false,
        }
    }
}

pub fn structured_pattern_match(logical: &str, candidate: &str) -> bool {
    match (ReferenceTag::parse(logical), ReferenceTag::parse(candidate)) {
        (Some(a), Some(b)) => {
            a.range_start == b.range_start && a.range_end == b.range_end && a.replicate == b.replicate
        }
        _ => false,
    }
}

/// Resolve `logical` against `available` headers.
///
/// Tries [`STRATEGIES`] in order; each strategy scans every candidate
/// before the next strategy is tried. Never falls back to a default column.
pub fn resolve_column_name<S: AsRef<str>>(logical: &str, available: &[S]) -> Result<ResolvedColumn> {
    for &(strategy, matches) in STRATEGIES {
        let found = available
            .iter()
            .position(|candidate| matches(logical, candidate.as_ref()));
        if let Some(index) = found {
            let name = available[index].as_ref().to_string();
            if strategy != MatchStrategy::Exact {
                log::debug!("Resolved '{}' → '{}' ({:?})", logical, name, strategy);
            }
            return Ok(ResolvedColumn {
                index,
                name,
                strategy,
            });
        }
    }
    Err(NormError::ColumnNotFound {
        logical: logical.to_string(),
        available: available.len(),
    })
}
