//! Pipeline configuration and execution for NIST ratio normalization.

mod config;
mod runner;

pub use config::NormalizationConfig;
pub use runner::{run_normalization, Pipeline};
