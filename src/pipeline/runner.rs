//! Pipeline runner wiring index building, ratio computation and result
//! assembly.

use crate::data::{
    load_compound_index, load_sample_index, name_key, AreaTable, CompoundIndexRow, ExpectedRatios,
    SampleIndexRow,
};
use crate::diagnostics::DiagnosticReport;
use crate::error::{ConfigurationError, LookupError, NormError, Result};
use crate::index::{
    collect_compound_istd_map, collect_sample_reference_map, resolve_column_name,
    AssignmentPolicy, SampleReferenceMap,
};
use crate::pipeline::config::NormalizationConfig;
use crate::ratio::{compute_all_ratios, normalize_samples, ResolvedReference, SampleReference};
use crate::result::{
    assemble, calculation_details, verify_against_expected, ResultTable, VerificationReport,
};
use std::collections::HashSet;
use std::path::Path;

/// Builder for configuring and running a normalization.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: NormalizationConfig,
}

impl Pipeline {
    /// Create a pipeline with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a config.
    pub fn from_config(config: &NormalizationConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Set the run name.
    pub fn name(mut self, name: &str) -> Self {
        self.config.name = name.to_string();
        self
    }

    pub fn assignment_policy(mut self, policy: AssignmentPolicy) -> Self {
        self.config.assignment_policy = policy;
        self
    }

    /// Derive reference replicates from sample numbers.
    pub fn positional(self) -> Self {
        self.assignment_policy(AssignmentPolicy::Positional)
    }

    /// Take reference columns from the sample index.
    pub fn explicit(self) -> Self {
        self.assignment_policy(AssignmentPolicy::Explicit)
    }

    pub fn batch_size(mut self, batch_size: u32) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn block_size(mut self, block_size: u32) -> Self {
        self.config.block_size = block_size;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    /// Keep calculation details for the first `n` compounds only.
    pub fn max_compounds_detailed(mut self, n: Option<usize>) -> Self {
        self.config.max_compounds_detailed = n;
        self
    }

    pub fn prefixes(mut self, sample: &str, reference: &str) -> Self {
        self.config.sample_prefix = sample.to_string();
        self.config.reference_prefix = reference.to_string();
        self
    }

    pub fn coefficient(mut self, coefficient: f64) -> Self {
        self.config.coefficient = coefficient;
        self
    }

    pub fn decimals(mut self, decimals: usize) -> Self {
        self.config.decimals = decimals;
        self
    }

    pub fn config(&self) -> &NormalizationConfig {
        &self.config
    }

    /// Convert to config for serialization.
    pub fn to_config(&self, description: Option<&str>) -> NormalizationConfig {
        NormalizationConfig {
            description: description.map(String::from),
            ..self.config.clone()
        }
    }

    /// Run the normalization.
    ///
    /// Fails only on configuration problems or when the area table has no
    /// sample columns. Every per-compound and per-sample lookup failure is
    /// reported in [`ResultTable::diagnostics`] and the affected records
    /// carry a non-`ok` status.
    pub fn run(
        &self,
        area: &AreaTable,
        compound_rows: &[CompoundIndexRow],
        sample_rows: &[SampleIndexRow],
    ) -> Result<ResultTable> {
        log::info!(
            "Running '{}': {} compounds × {} columns, {} assignment",
            self.config.name,
            area.n_compounds(),
            area.n_columns(),
            self.config.assignment_policy.name()
        );

        let sample_cols = area.sample_columns();
        let assignment = self.config.sample_assignment();
        let rows = match assignment.policy {
            AssignmentPolicy::Explicit => sample_rows.to_vec(),
            AssignmentPolicy::Positional => with_area_samples(sample_rows, area, &sample_cols),
        };

        // One error lists the issues of the settings and both index tables.
        let mut issues = self.config.issues();
        let (compounds, compound_issues) = collect_compound_istd_map(compound_rows, area);
        let (sample_map, sample_issues) = collect_sample_reference_map(&rows, &assignment);
        issues.extend(compound_issues);
        issues.extend(sample_issues);
        ConfigurationError::check(issues)?;

        if sample_cols.is_empty() {
            return Err(NormError::Pipeline(format!(
                "No sample columns with prefix '{}' in the area table",
                self.config.sample_prefix
            )));
        }
        let reference_cols = area.reference_columns();
        if reference_cols.is_empty() {
            log::warn!(
                "No reference columns with prefix '{}' in the area table",
                self.config.reference_prefix
            );
        }

        let mut diagnostics = DiagnosticReport::new();
        diagnostics.extend(area.invalid_cells().iter().cloned());
        diagnostics.extend(compounds.unresolved().iter().cloned());
        diagnostics.extend(sample_map.unresolved().iter().cloned());

        let samples = resolve_samples(area, &sample_cols, &reference_cols, &sample_map, &mut diagnostics);
        warn_on_absent_samples(&rows, area, &sample_cols);

        let mut columns = sample_cols.clone();
        columns.extend(reference_cols.iter().copied());
        let ratios = compute_all_ratios(area, &compounds, &columns);
        let normalized = normalize_samples(&ratios, &compounds, &samples);

        diagnostics.compounds_total = compounds.total();
        diagnostics.compounds_resolved = compounds.len();
        diagnostics.samples_total = samples.len();
        diagnostics.samples_resolved = samples.iter().filter(|s| s.reference.is_some()).count();

        let details = calculation_details(area, &compounds, &samples, self.config.max_compounds_detailed);
        let table = assemble(&ratios, normalized, &compounds, self.config.coefficient, diagnostics)
            .with_details(details);

        log::info!(
            "Finished '{}': {} records, {}/{} compounds and {}/{} samples resolved",
            self.config.name,
            table.len(),
            table.diagnostics.compounds_resolved,
            table.diagnostics.compounds_total,
            table.diagnostics.samples_resolved,
            table.diagnostics.samples_total
        );
        Ok(table)
    }

    /// Check a result table's reference ratios against expected values
    /// using the configured tolerance.
    pub fn verify(&self, results: &ResultTable, expected: &ExpectedRatios) -> VerificationReport {
        verify_against_expected(results, expected, self.config.tolerance)
    }
}

/// Index rows plus a bare row for every sample column the index lacks.
fn with_area_samples(rows: &[SampleIndexRow], area: &AreaTable, sample_cols: &[usize]) -> Vec<SampleIndexRow> {
    let known: HashSet<String> = rows.iter().map(|r| name_key(&r.sample)).collect();
    let mut merged = rows.to_vec();
    for &col in sample_cols {
        let name = &area.columns()[col].name;
        if !known.contains(&name_key(name)) {
            merged.push(SampleIndexRow::new(name, None));
        }
    }
    merged
}

/// Pair every sample column with its reference column in the area table.
fn resolve_samples(
    area: &AreaTable,
    sample_cols: &[usize],
    reference_cols: &[usize],
    sample_map: &SampleReferenceMap,
    diagnostics: &mut DiagnosticReport,
) -> Vec<SampleReference> {
    let reference_names: Vec<&str> = reference_cols
        .iter()
        .map(|&c| area.columns()[c].name.as_str())
        .collect();

    sample_cols
        .iter()
        .map(|&column| {
            let sample = area.columns()[column].name.clone();
            let reference = if !sample_map.knows(&sample) {
                diagnostics.push(LookupError::UnmappedSample {
                    sample: sample.clone(),
                });
                None
            } else if let Some(logical) = sample_map.get(&sample) {
                match resolve_column_name(logical, &reference_names) {
                    Ok(found) => {
                        log::debug!("Sample '{}' normalized against '{}'", sample, found.name);
                        Some(ResolvedReference {
                            name: found.name,
                            column: reference_cols[found.index],
                        })
                    }
                    Err(_) => {
                        diagnostics.push(LookupError::ReferenceColumnNotFound {
                            sample: sample.clone(),
                            logical: logical.to_string(),
                        });
                        None
                    }
                }
            } else {
                None
            };
            SampleReference {
                sample,
                column,
                reference,
            }
        })
        .collect()
}

fn warn_on_absent_samples(rows: &[SampleIndexRow], area: &AreaTable, sample_cols: &[usize]) {
    let present: HashSet<String> = sample_cols
        .iter()
        .map(|&c| name_key(&area.columns()[c].name))
        .collect();
    for row in rows {
        if !row.sample.trim().is_empty() && !present.contains(&name_key(&row.sample)) {
            log::warn!("Sample '{}' is in the sample index but not in the area table", row.sample.trim());
        }
    }
}

/// Load the three input tables from disk and run with `config`.
pub fn run_normalization<P: AsRef<Path>>(
    area_path: P,
    compound_index_path: P,
    sample_index_path: Option<P>,
    config: &NormalizationConfig,
) -> Result<ResultTable> {
    let area = AreaTable::from_path(area_path, &config.column_prefixes())?;
    let compounds = load_compound_index(compound_index_path)?;
    let samples = match sample_index_path {
        Some(path) => load_sample_index(path)?,
        None => Vec::new(),
    };
    Pipeline::from_config(config).run(&area, &compounds, &samples)
}
