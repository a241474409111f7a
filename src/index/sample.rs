//! Sample → reference replicate assignment.
//!
//! Two policies are supported because neither is authoritative for every
//! dataset:
//!
//! - **Explicit**: the reference column is read from the sample index.
//! - **Positional**: the reference replicate is derived from the sample
//!   number. Samples are numbered in blocks of `block_size` (default 100)
//!   and each block is split into groups of `batch_size` (default 25), one
//!   group per replicate:
//!
//! ```text
//! block_start = ((n - 1) / block_size) * block_size + 1
//! position    = n - block_start + 1
//! replicate   = ((position - 1) / batch_size) + 1
//! ```

use crate::data::{display_name, name_key, sample_digits, ReferenceTag, SampleIndexRow};
use crate::error::{ConfigIssue, ConfigurationError, LookupError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// How samples are assigned to reference replicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentPolicy {
    /// Use the reference named in the sample index.
    #[default]
    Explicit,
    /// Derive the replicate from the sample's position within its block.
    Positional,
}

impl AssignmentPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Explicit => "explicit",
            Self::Positional => "positional",
        }
    }
}

/// Parameters of the sample → reference assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleAssignment {
    pub policy: AssignmentPolicy,
    /// Samples per reference replicate.
    pub batch_size: u32,
    /// Samples per numbering block.
    pub block_size: u32,
    /// Prefix used to build positional reference names.
    pub reference_prefix: String,
}

impl Default for SampleAssignment {
    fn default() -> Self {
        Self {
            policy: AssignmentPolicy::Explicit,
            batch_size: 25,
            block_size: 100,
            reference_prefix: "NIST_".to_string(),
        }
    }
}

impl SampleAssignment {
    pub fn explicit() -> Self {
        Self::default()
    }

    pub fn positional(batch_size: u32) -> Self {
        Self {
            policy: AssignmentPolicy::Positional,
            batch_size,
            ..Default::default()
        }
    }

    /// Every violated constraint on the parameters.
    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.batch_size == 0 {
            issues.push(ConfigIssue::InvalidParameter(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.block_size == 0 {
            issues.push(ConfigIssue::InvalidParameter(
                "block_size must be at least 1".to_string(),
            ));
        }
        if self.batch_size > self.block_size {
            issues.push(ConfigIssue::InvalidParameter(format!(
                "batch_size ({}) cannot exceed block_size ({})",
                self.batch_size, self.block_size
            )));
        }
        issues
    }

    /// Reference tag for a sample number under the positional policy.
    ///
    /// `None` when a size is zero or the block would end past `u32::MAX`.
    pub fn positional_tag(&self, sample_number: u32) -> Option<ReferenceTag> {
        let n = sample_number.max(1);
        let block_index = (n - 1).checked_div(self.block_size)?;
        let block_start = block_index.checked_mul(self.block_size)?.checked_add(1)?;
        let range_end = block_start.checked_add(self.block_size - 1)?;
        let position = n - block_start + 1;
        Some(ReferenceTag {
            range_start: block_start,
            range_end,
            replicate: (position - 1).checked_div(self.batch_size)? + 1,
        })
    }

    /// Logical reference column name for a sample number, e.g.
    /// `NIST_5601-5700 (4)`.
    pub fn positional_reference(&self, sample_number: u32) -> Option<String> {
        self.positional_tag(sample_number)
            .map(|tag| format!("{}{}", self.reference_prefix, tag))
    }

    fn assign_positional(&self, sample: &str) -> std::result::Result<String, LookupError> {
        let digits = sample_digits(sample).ok_or_else(|| LookupError::NonNumericSample {
            sample: sample.to_string(),
        })?;
        digits
            .parse::<u32>()
            .ok()
            .and_then(|n| self.positional_reference(n))
            .ok_or_else(|| LookupError::SampleNumberOutOfRange {
                sample: sample.to_string(),
                number: digits.to_string(),
            })
    }
}

/// Sample → logical reference column name.
#[derive(Debug, Clone, Default)]
pub struct SampleReferenceMap {
    assignments: Vec<(String, String)>,
    by_key: HashMap<String, usize>,
    unresolved: Vec<LookupError>,
    unresolved_keys: HashSet<String>,
}

impl SampleReferenceMap {
    /// (sample, logical reference) pairs in index order.
    pub fn assignments(&self) -> &[(String, String)] {
        &self.assignments
    }

    /// Samples that could not be assigned.
    pub fn unresolved(&self) -> &[LookupError] {
        &self.unresolved
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Logical reference for a sample (normalized lookup).
    pub fn get(&self, sample: &str) -> Option<&str> {
        self.by_key
            .get(&name_key(sample))
            .map(|&i| self.assignments[i].1.as_str())
    }

    /// Whether the sample has an index row, assigned or not.
    pub fn knows(&self, sample: &str) -> bool {
        let key = name_key(sample);
        self.by_key.contains_key(&key) || self.unresolved_keys.contains(&key)
    }

    /// Number of samples assigned to each logical reference.
    pub fn usage(&self) -> BTreeMap<String, usize> {
        let mut usage = BTreeMap::new();
        for (_, reference) in &self.assignments {
            *usage.entry(reference.clone()).or_insert(0) += 1;
        }
        usage
    }
}

/// Assign every sample of the index to a logical reference column.
///
/// The returned names are logical; they are matched against the actual
/// area-table headers with
/// [`resolve_column_name`](crate::index::resolve_column_name). Fails with
/// a [`ConfigurationError`] listing every invalid parameter, empty sample
/// name and conflicting explicit assignment.
pub fn build_sample_reference_map(
    rows: &[SampleIndexRow],
    assignment: &SampleAssignment,
) -> Result<SampleReferenceMap> {
    let mut issues = assignment.issues();
    let (map, row_issues) = collect_sample_reference_map(rows, assignment);
    issues.extend(row_issues);
    ConfigurationError::check(issues)?;
    Ok(map)
}

/// Like [`build_sample_reference_map`] but hands back the issues found in
/// the rows instead of failing, so they can be reported together with
/// other tables. Parameter issues come from [`SampleAssignment::issues`].
pub fn collect_sample_reference_map(
    rows: &[SampleIndexRow],
    assignment: &SampleAssignment,
) -> (SampleReferenceMap, Vec<ConfigIssue>) {
    let mut issues = Vec::new();
    let params_ok = assignment.issues().is_empty();
    let mut map = SampleReferenceMap::default();
    let mut seen: HashMap<String, Option<String>> = HashMap::new();

    for (i, row) in rows.iter().enumerate() {
        let sample = display_name(&row.sample);
        if sample.is_empty() {
            issues.push(ConfigIssue::EmptyField {
                table: "sample index",
                row: i + 1,
                field: "sample",
            });
            continue;
        }
        let key = name_key(&sample);
        let reference = row
            .reference
            .as_deref()
            .map(display_name)
            .filter(|r| !r.is_empty());

        if let Some(previous) = seen.get(&key) {
            if assignment.policy == AssignmentPolicy::Explicit {
                if let (Some(first), Some(second)) = (previous, &reference) {
                    if name_key(first) != name_key(second) {
                        issues.push(ConfigIssue::ConflictingReference {
                            sample,
                            first: first.clone(),
                            second: second.clone(),
                        });
                        continue;
                    }
                }
            }
            log::debug!("Duplicate sample index row for '{}' ignored", sample);
            continue;
        }
        seen.insert(key.clone(), reference.clone());
        if !params_ok {
            continue;
        }

        let assigned = match assignment.policy {
            AssignmentPolicy::Explicit => reference.ok_or(LookupError::MissingReferenceAssignment {
                sample: sample.clone(),
            }),
            AssignmentPolicy::Positional => assignment.assign_positional(&sample),
        };

        match assigned {
            Ok(logical) => {
                log::debug!("Sample '{}' → '{}'", sample, logical);
                map.by_key.insert(key, map.assignments.len());
                map.assignments.push((sample, logical));
            }
            Err(e) => {
                map.unresolved_keys.insert(key);
                map.unresolved.push(e);
            }
        }
    }

    if assignment.policy == AssignmentPolicy::Explicit {
        for (reference, count) in map.usage() {
            if count > assignment.batch_size as usize {
                log::warn!(
                    "Reference '{}' is assigned to {} samples (batch size {})",
                    reference,
                    count,
                    assignment.batch_size
                );
            }
        }
    }

    log::info!(
        "Sample index ({}): {} assigned, {} unassigned",
        assignment.policy.name(),
        map.assignments.len(),
        map.unresolved.len()
    );
    (map, issues)
}
