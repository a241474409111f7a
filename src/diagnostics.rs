//! Per-entity diagnostics delivered alongside partial results.

use crate::error::LookupError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every per-entity lookup failure of a run plus resolved/unresolved counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    /// Individual failures, in the order they were found.
    pub entries: Vec<LookupError>,
    /// Compounds listed in the compound index.
    pub compounds_total: usize,
    /// Compounds with both their own row and their ISTD row present.
    pub compounds_resolved: usize,
    /// Sample columns in the area table.
    pub samples_total: usize,
    /// Samples with a reference column found in the area table.
    pub samples_resolved: usize,
}

impl DiagnosticReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure and log it.
    pub fn push(&mut self, error: LookupError) {
        log::warn!("{}", error);
        self.entries.push(error);
    }

    pub fn extend<I: IntoIterator<Item = LookupError>>(&mut self, errors: I) {
        for e in errors {
            self.push(e);
        }
    }

    pub fn compounds_unresolved(&self) -> usize {
        self.compounds_total.saturating_sub(self.compounds_resolved)
    }

    pub fn samples_unresolved(&self) -> usize {
        self.samples_total.saturating_sub(self.samples_resolved)
    }

    /// No failures at all.
    pub fn is_clean(&self) -> bool {
        self.entries.is_empty()
    }

    /// Failures concerning one compound or sample.
    pub fn for_entity<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a LookupError> + 'a {
        self.entries.iter().filter(move |e| e.entity() == id)
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Compounds resolved: {}/{} ({} unresolved)",
            self.compounds_resolved,
            self.compounds_total,
            self.compounds_unresolved()
        )?;
        writeln!(
            f,
            "Samples resolved:   {}/{} ({} unresolved)",
            self.samples_resolved,
            self.samples_total,
            self.samples_unresolved()
        )?;
        let (compound, sample): (Vec<&LookupError>, Vec<&LookupError>) =
            self.entries.iter().partition(|e| e.is_compound_level());
        for (label, group) in [("Compound", compound), ("Sample", sample)] {
            if group.is_empty() {
                continue;
            }
            writeln!(f, "{} diagnostics ({}):", label, group.len())?;
            for e in group {
                writeln!(f, "  - {}", e)?;
            }
        }
        Ok(())
    }
}
