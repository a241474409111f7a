//! Input tables for the normalization calculation.

mod area_table;
mod column;
mod compound_index;
mod expected;
mod names;
mod sample_index;
mod table;

pub use area_table::{AreaColumn, AreaTable};
pub use column::{sample_digits, sample_number, ColumnKind, ColumnPrefixes, ReferenceTag};
pub use compound_index::{load_compound_index, read_compound_index, CompoundIndexRow};
pub use expected::{load_expected, read_expected, ExpectedRatios};
pub use names::{display_name, name_key, parse_area, AreaCell};
pub use sample_index::{load_sample_index, read_sample_index, SampleIndexRow};
pub use table::delimiter_for;
