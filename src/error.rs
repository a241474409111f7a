//! Error types for the nist-normalize library.
//!
//! Two tiers of failure exist. [`NormError`] aborts a run: I/O problems,
//! malformed inputs, and [`ConfigurationError`] (which lists every violated
//! invariant, not just the first). [`LookupError`] is per-entity and never
//! aborts: it is collected into a diagnostic report that travels with the
//! partial results.

use std::fmt;
use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum NormError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    #[error("No column matches '{logical}' among {available} candidates")]
    ColumnNotFound { logical: String, available: usize },

    #[error("Missing column '{column}' in {table}")]
    MissingColumn { table: String, column: String },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, NormError>;

/// A single violated invariant in the mapping tables or configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigIssue {
    #[error("compound '{compound}' is assigned to both ISTD '{first}' and '{second}'")]
    ConflictingIstd {
        compound: String,
        first: String,
        second: String,
    },

    #[error("sample '{sample}' is assigned to both '{first}' and '{second}'")]
    ConflictingReference {
        sample: String,
        first: String,
        second: String,
    },

    #[error("compound '{0}' appears more than once in the area table")]
    DuplicateAreaRow(String),

    #[error("{table} row {row}: required field '{field}' is empty")]
    EmptyField {
        table: &'static str,
        row: usize,
        field: &'static str,
    },

    #[error("{0}")]
    InvalidParameter(String),
}

/// Fatal configuration failure carrying every issue found.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationError {
    pub issues: Vec<ConfigIssue>,
}

impl ConfigurationError {
    pub fn new(issues: Vec<ConfigIssue>) -> Self {
        Self { issues }
    }

    /// Ok when no issues were collected, otherwise the aggregated error.
    pub fn check(issues: Vec<ConfigIssue>) -> std::result::Result<(), Self> {
        if issues.is_empty() {
            Ok(())
        } else {
            Err(Self::new(issues))
        }
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Configuration error ({} issue(s))", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigurationError {}

/// Per-entity resolution failure. Skips the affected compound or sample only.
#[derive(Error, Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookupError {
    #[error("compound '{compound}' has no row in the area table")]
    MissingCompoundRow { compound: String },

    #[error("ISTD '{istd}' for compound '{compound}' has no row in the area table")]
    MissingIstdRow { compound: String, istd: String },

    #[error("sample column '{sample}' has no entry in the sample index")]
    UnmappedSample { sample: String },

    #[error("sample '{sample}' has no reference assignment")]
    MissingReferenceAssignment { sample: String },

    #[error("sample '{sample}' carries no sample number for positional assignment")]
    NonNumericSample { sample: String },

    #[error("sample number '{number}' of '{sample}' is outside the supported numbering range")]
    SampleNumberOutOfRange { sample: String, number: String },

    #[error("reference column '{logical}' for sample '{sample}' not found in the area table")]
    ReferenceColumnNotFound { sample: String, logical: String },

    #[error("invalid area '{raw}' for '{compound}' in column '{column}'")]
    InvalidArea {
        compound: String,
        column: String,
        raw: String,
    },
}

impl LookupError {
    /// Identifier of the entity this failure is about.
    pub fn entity(&self) -> &str {
        match self {
            Self::MissingCompoundRow { compound }
            | Self::MissingIstdRow { compound, .. }
            | Self::InvalidArea { compound, .. } => compound,
            Self::UnmappedSample { sample }
            | Self::MissingReferenceAssignment { sample }
            | Self::NonNumericSample { sample }
            | Self::SampleNumberOutOfRange { sample, .. }
            | Self::ReferenceColumnNotFound { sample, .. } => sample,
        }
    }

    /// Whether the failure concerns a compound (as opposed to a sample).
    pub fn is_compound_level(&self) -> bool {
        matches!(
            self,
            Self::MissingCompoundRow { .. } | Self::MissingIstdRow { .. } | Self::InvalidArea { .. }
        )
    }
}
