//! Run configuration, serializable to YAML.

use crate::data::ColumnPrefixes;
use crate::error::{ConfigIssue, ConfigurationError, NormError, Result};
use crate::index::{AssignmentPolicy, SampleAssignment};
use crate::ratio::DEFAULT_COEFFICIENT;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters of a normalization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// Name of the run.
    pub name: String,
    pub description: Option<String>,
    /// How samples are assigned to reference replicates.
    pub assignment_policy: AssignmentPolicy,
    /// Samples per reference replicate.
    pub batch_size: u32,
    /// Samples per numbering block.
    pub block_size: u32,
    /// Absolute tolerance for verification against expected values.
    pub tolerance: f64,
    /// Compounds for which calculation details are kept; `None` keeps all.
    pub max_compounds_detailed: Option<usize>,
    pub sample_prefix: String,
    pub reference_prefix: String,
    /// Multiplier of the concentration estimate.
    pub coefficient: f64,
    /// Decimal places in exported tables.
    pub decimals: usize,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            name: "nist-normalization".to_string(),
            description: None,
            assignment_policy: AssignmentPolicy::Explicit,
            batch_size: 25,
            block_size: 100,
            tolerance: 1e-4,
            max_compounds_detailed: None,
            sample_prefix: "PH-HC_".to_string(),
            reference_prefix: "NIST_".to_string(),
            coefficient: DEFAULT_COEFFICIENT,
            decimals: 6,
        }
    }
}

impl NormalizationConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(NormError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(NormError::from)
    }

    /// Load from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn sample_assignment(&self) -> SampleAssignment {
        SampleAssignment {
            policy: self.assignment_policy,
            batch_size: self.batch_size,
            block_size: self.block_size,
            reference_prefix: self.reference_prefix.clone(),
        }
    }

    pub fn column_prefixes(&self) -> ColumnPrefixes {
        ColumnPrefixes::new(&self.sample_prefix, &self.reference_prefix)
    }

    /// Check every constraint and report all violations together.
    pub fn validate(&self) -> Result<()> {
        ConfigurationError::check(self.issues())?;
        Ok(())
    }

    /// Every violated constraint on the settings.
    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = self.sample_assignment().issues();
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            issues.push(ConfigIssue::InvalidParameter(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if !self.coefficient.is_finite() || self.coefficient <= 0.0 {
            issues.push(ConfigIssue::InvalidParameter(format!(
                "coefficient must be positive, got {}",
                self.coefficient
            )));
        }
        if self.sample_prefix.trim().is_empty() {
            issues.push(ConfigIssue::InvalidParameter(
                "sample_prefix must not be empty".to_string(),
            ));
        }
        if self.reference_prefix.trim().is_empty() {
            issues.push(ConfigIssue::InvalidParameter(
                "reference_prefix must not be empty".to_string(),
            ));
        }
        if self.sample_prefix == self.reference_prefix {
            issues.push(ConfigIssue::InvalidParameter(format!(
                "sample_prefix and reference_prefix are both '{}'",
                self.sample_prefix
            )));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NormalizationConfig::default();
        assert_eq!(config.assignment_policy, AssignmentPolicy::Explicit);
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.block_size, 100);
        assert_eq!(config.max_compounds_detailed, None);
        assert_eq!(config.coefficient, 500.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip_and_partial_documents() {
        let yaml = "assignment_policy: positional\nbatch_size: 50\nmax_compounds_detailed: 3\n";
        let config = NormalizationConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.assignment_policy, AssignmentPolicy::Positional);
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.block_size, 100);
        assert_eq!(config.max_compounds_detailed, Some(3));
        assert_eq!(config.reference_prefix, "NIST_");

        let parsed = NormalizationConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_policy_rejected() {
        assert!(NormalizationConfig::from_yaml("assignment_policy: nearest\n").is_err());
    }

    #[test]
    fn test_validate_reports_every_issue() {
        let config = NormalizationConfig {
            batch_size: 0,
            tolerance: -1.0,
            coefficient: 0.0,
            reference_prefix: "PH-HC_".into(),
            ..Default::default()
        };
        match config.validate().unwrap_err() {
            NormError::Configuration(e) => assert_eq!(e.issues.len(), 4),
            other => panic!("unexpected error: {other}"),
        }
    }
}
