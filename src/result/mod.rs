//! Result assembler and validator: the final table, calculation details,
//! regression checks against expected values, and export.

mod detail;
mod export;
mod table;
mod verify;

pub use detail::{calculation_details, CalculationDetail};
pub use export::{export, export_reference_ratios, ExportFormat, ExportOptions};
pub use table::{
    assemble, ReferenceRatio, ReferenceRatioIndex, ResultRecord, ResultSummary, ResultTable,
};
pub use verify::{verify_against_expected, Verdict, VerificationEntry, VerificationReport};
