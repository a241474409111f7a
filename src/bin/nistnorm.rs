//! nistnorm - NIST ratio normalization CLI
//!
//! Command-line interface for normalizing LC-MS/MS peak areas against QC
//! reference replicates.

use clap::{Parser, Subcommand, ValueEnum};
use nist_normalize::data::{
    delimiter_for, load_compound_index, load_expected, load_sample_index, AreaTable,
};
use nist_normalize::error::Result;
use nist_normalize::index::AssignmentPolicy;
use nist_normalize::pipeline::{NormalizationConfig, Pipeline};
use nist_normalize::result::{
    export, export_reference_ratios, ExportFormat, ExportOptions, ResultTable,
};
use std::path::{Path, PathBuf};

/// CLI-friendly output format
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    /// One row per compound and sample
    Table,
    /// Compounds x samples, normalized values only
    Matrix,
    /// Full result table including diagnostics and details
    Json,
}

/// CLI-friendly assignment policy
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPolicy {
    /// Reference column read from the sample index
    Explicit,
    /// Reference replicate derived from the sample number
    Positional,
}

impl From<CliPolicy> for AssignmentPolicy {
    fn from(policy: CliPolicy) -> Self {
        match policy {
            CliPolicy::Explicit => AssignmentPolicy::Explicit,
            CliPolicy::Positional => AssignmentPolicy::Positional,
        }
    }
}

/// NIST Ratio Normalization
#[derive(Parser)]
#[command(name = "nistnorm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Inputs shared by `run` and `verify`.
#[derive(clap::Args)]
struct InputArgs {
    /// Path to a YAML configuration (defaults apply otherwise)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the peak-area table (.csv or TSV)
    #[arg(short, long)]
    area: PathBuf,

    /// Path to the compound index (compound, ISTD, concentration, response factor)
    #[arg(short = 'c', long)]
    compounds: PathBuf,

    /// Path to the sample index (sample, reference column)
    #[arg(short, long)]
    samples: Option<PathBuf>,

    /// Override the assignment policy of the configuration
    #[arg(long, value_enum)]
    policy: Option<CliPolicy>,

    /// Override the batch size of the configuration
    #[arg(long)]
    batch_size: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute normalized ratios and write them out
    Run {
        #[command(flatten)]
        input: InputArgs,

        /// Output path for results
        #[arg(short, long)]
        output: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: CliFormat,

        /// Also write the reference ratio table to this path
        #[arg(long)]
        reference_ratios: Option<PathBuf>,

        /// Print calculation details to stderr
        #[arg(long)]
        details: bool,
    },

    /// Compute reference ratios and compare them with expected values
    Verify {
        #[command(flatten)]
        input: InputArgs,

        /// Path to expected values (compound, reference_column, expected)
        #[arg(short, long)]
        expected: PathBuf,

        /// Override the verification tolerance
        #[arg(long)]
        tolerance: Option<f64>,

        /// Write the verification report as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// List reference columns grouped by block
    Columns {
        /// Path to the peak-area table (.csv or TSV)
        #[arg(short, long)]
        area: PathBuf,

        /// Path to a YAML configuration (for column prefixes)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Generate an example configuration file
    Example {
        /// Output path for example config
        #[arg(short, long, default_value = "nistnorm.yaml")]
        output: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            output,
            format,
            reference_ratios,
            details,
        } => cmd_run(&input, &output, format, reference_ratios.as_deref(), details),

        Commands::Verify {
            input,
            expected,
            tolerance,
            report,
        } => cmd_verify(&input, &expected, tolerance, report.as_deref()),

        Commands::Columns { area, config } => cmd_columns(&area, config.as_deref()),

        Commands::Example { output } => cmd_example(&output),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<NormalizationConfig> {
    match path {
        Some(path) => {
            eprintln!("Loading configuration from {:?}...", path);
            NormalizationConfig::from_file(path)
        }
        None => Ok(NormalizationConfig::default()),
    }
}

/// Load inputs, apply overrides and run the pipeline.
fn compute(input: &InputArgs) -> Result<(NormalizationConfig, ResultTable)> {
    let mut config = load_config(input.config.as_deref())?;
    if let Some(policy) = input.policy {
        config.assignment_policy = policy.into();
    }
    if let Some(batch_size) = input.batch_size {
        config.batch_size = batch_size;
    }

    eprintln!("Loading data...");
    let area = AreaTable::from_path(&input.area, &config.column_prefixes())?;
    let compounds = load_compound_index(&input.compounds)?;
    let samples = match &input.samples {
        Some(path) => load_sample_index(path)?,
        None => Vec::new(),
    };

    eprintln!(
        "Loaded {} compounds x {} columns ({} samples, {} reference)",
        area.n_compounds(),
        area.n_columns(),
        area.sample_columns().len(),
        area.reference_columns().len()
    );

    eprintln!(
        "Running '{}' ({} assignment)...",
        config.name,
        config.assignment_policy.name()
    );
    let results = Pipeline::from_config(&config).run(&area, &compounds, &samples)?;
    Ok((config, results))
}

/// Compute and write results
fn cmd_run(
    input: &InputArgs,
    output_path: &Path,
    format: CliFormat,
    reference_path: Option<&Path>,
    details: bool,
) -> Result<bool> {
    let (config, results) = compute(input)?;

    eprintln!("Writing results to {:?}...", output_path);
    let bytes = match format {
        CliFormat::Json => results.to_json()?.into_bytes(),
        CliFormat::Table | CliFormat::Matrix => {
            let options = ExportOptions {
                format: match format {
                    CliFormat::Matrix => ExportFormat::Matrix,
                    _ => ExportFormat::Table,
                },
                delimiter: delimiter_for(output_path),
                decimals: config.decimals,
            };
            export(&results, &options)?
        }
    };
    std::fs::write(output_path, bytes)?;

    if let Some(path) = reference_path {
        eprintln!("Writing reference ratios to {:?}...", path);
        let options = ExportOptions::default()
            .with_delimiter(delimiter_for(path))
            .with_decimals(config.decimals);
        std::fs::write(path, export_reference_ratios(&results, &options)?)?;
    }

    if details {
        for detail in &results.details {
            eprintln!("{}", detail);
        }
    }

    eprintln!("Done!");
    eprint!("{}", results.summary());
    eprint!("{}", results.diagnostics);

    Ok(true)
}

/// Compute and compare against expected values
fn cmd_verify(
    input: &InputArgs,
    expected_path: &Path,
    tolerance: Option<f64>,
    report_path: Option<&Path>,
) -> Result<bool> {
    let (config, results) = compute(input)?;
    let expected = load_expected(expected_path)?;
    eprintln!("Loaded {} expected values", expected.len());

    let mut pipeline = Pipeline::from_config(&config);
    if let Some(tolerance) = tolerance {
        pipeline = pipeline.tolerance(tolerance);
    }
    let report = pipeline.verify(&results, &expected);

    if let Some(path) = report_path {
        eprintln!("Writing verification report to {:?}...", path);
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
    }

    print!("{}", report);
    Ok(report.failed() == 0)
}

/// List detected reference columns
fn cmd_columns(area_path: &Path, config_path: Option<&Path>) -> Result<bool> {
    let config = load_config(config_path)?;
    let area = AreaTable::from_path(area_path, &config.column_prefixes())?;

    let blocks = area.reference_blocks();
    println!(
        "{} sample columns, {} reference columns in {} blocks",
        area.sample_columns().len(),
        area.reference_columns().len(),
        blocks.len()
    );
    for ((start, end), replicates) in &blocks {
        let indices: Vec<String> = replicates.iter().map(|(r, _)| r.to_string()).collect();
        println!("  {}-{}: replicates {}", start, end, indices.join(", "));
        for (_, name) in replicates {
            println!("    {}", name);
        }
    }
    Ok(true)
}

/// Generate example configuration
fn cmd_example(output_path: &Path) -> Result<bool> {
    let pipeline = Pipeline::new()
        .name("example-nist")
        .positional()
        .batch_size(25)
        .max_compounds_detailed(Some(5));

    let config = pipeline.to_config(Some(
        "Positional NIST normalization with 25 samples per reference replicate",
    ));
    let yaml = config.to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    eprintln!("Wrote example configuration to {:?}", output_path);
    eprintln!();
    eprintln!("Contents:");
    println!("{}", yaml);

    Ok(true)
}
