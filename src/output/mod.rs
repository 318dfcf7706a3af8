//! Output assembly
//!
//! Every extraction path writes into one [`ColumnSet`] keyed by synthetic
//! identifier; [`assemble`] names the columns and shapes the result.

pub mod columns;
mod table;

pub use self::columns::{ColumnOrigin, ColumnSet};
pub use self::table::{assemble, Column, Extraction, ExtractionOutput, OutputTable, TimeSeries};
