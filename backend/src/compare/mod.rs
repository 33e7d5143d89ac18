//! Comparison module.
//!
//! - `matrix`: customers × product lines for one metric
//! - `discrepancy`: outlier detection per product line
//! - `format`: display strings for matrix cells, and parsing them back
//!
//! ## Usage Flow
//!
//! ```text
//! CustomerRegistry → matrix::build_matrix → ComparisonMatrix ─┬→ to_display → DisplayGrid
//!                                                              └→ discrepancy::detect → DiscrepancyReport
//! ```

pub mod discrepancy;
pub mod format;
pub mod matrix;

pub use discrepancy::{
    detect, detect_display, find_outliers, Discrepancy, DiscrepancyReport, TOLERANCE,
};
pub use format::{format_number, format_value, parse_display};
pub use matrix::{build_matrix, ComparisonMatrix, DisplayGrid, DisplayRow};
