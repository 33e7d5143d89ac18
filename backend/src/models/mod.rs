//! Domain models shared across the comparison pipeline.
//!
//! - [`AggregationMode`] - Cumulative vs. Per Unit view of a metric
//! - [`CellValue`] - A matrix cell: a number or the missing marker
//! - [`MetricKind`] - How a metric's values are displayed
//! - [`FileDetails`] - Customer and date label derived from a file name

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{BatchError, FileNameError};

/// Display marker for a cell with no reported value.
pub const MISSING_MARKER: &str = "-";

// =============================================================================
// Aggregation Mode
// =============================================================================

/// Which variant of a metric is being compared.
///
/// Summary tables carry one column per product line and mode, named
/// `"{product line} Cumulative"` or `"{product line} Per Unit"`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum AggregationMode {
    /// Totals.
    #[default]
    Cumulative,
    /// Values normalized per unit.
    #[serde(rename = "Per Unit")]
    PerUnit,
}

impl AggregationMode {
    /// Column suffix used by summary tables.
    pub fn suffix(self) -> &'static str {
        match self {
            AggregationMode::Cumulative => "Cumulative",
            AggregationMode::PerUnit => "Per Unit",
        }
    }

    /// Column name holding `product_line`'s value in this mode.
    pub fn column_key(self, product_line: &str) -> String {
        format!("{} {}", product_line, self.suffix())
    }

    /// Split a summary column name into its product line and mode.
    pub fn split_column(column: &str) -> Option<(&str, AggregationMode)> {
        [AggregationMode::Cumulative, AggregationMode::PerUnit]
            .into_iter()
            .find_map(|mode| {
                column
                    .strip_suffix(mode.suffix())
                    .and_then(|rest| rest.strip_suffix(' '))
                    .map(|pline| (pline.trim(), mode))
            })
            .filter(|(pline, _)| !pline.is_empty())
    }
}

impl fmt::Display for AggregationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for AggregationMode {
    type Err = BatchError;

    /// Accepts `Cumulative`, `Per Unit`, `per-unit`, `per_unit`, `perunit`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "cumulative" => Ok(AggregationMode::Cumulative),
            "perunit" => Ok(AggregationMode::PerUnit),
            _ => Err(BatchError::UnknownMode(s.to_string())),
        }
    }
}

// =============================================================================
// Cell Value
// =============================================================================

/// One cell of a comparison matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue {
    /// A reported value.
    Number(f64),
    /// No value for this customer / product line / metric combination.
    Missing,
}

impl CellValue {
    /// The number, if the cell holds one that can take part in a comparison.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(CellValue::Missing, CellValue::Number)
    }
}

/// Numbers serialize as JSON numbers, [`CellValue::Missing`] as
/// [`MISSING_MARKER`], and NaN or infinite numbers as `null`.
impl Serialize for CellValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            CellValue::Number(_) => serializer.serialize_none(),
            CellValue::Missing => serializer.serialize_str(MISSING_MARKER),
        }
    }
}

// =============================================================================
// Metric Kind
// =============================================================================

/// Display family of a metric.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Ratios stored as fractions, shown as `"10.25 %"`.
    Percentage,
    /// Unit counts, shown as `"1,234"`.
    Quantity,
    /// Money, shown as `"$ 1,234.56"` or `"$ (1,234.56)"`.
    Currency,
}

const PERCENTAGE_METRICS: &[&str] = &["Defect %", "MARGIN %", "Contribution Margin %"];
const QUANTITY_METRICS: &[&str] = &["QTY Gross", "QTY Defect", "QTY Total"];

impl MetricKind {
    /// Resolve the kind of a metric by exact name. Unknown metrics are currency.
    pub fn for_metric(metric: &str) -> Self {
        if PERCENTAGE_METRICS.contains(&metric) {
            MetricKind::Percentage
        } else if QUANTITY_METRICS.contains(&metric) {
            MetricKind::Quantity
        } else {
            MetricKind::Currency
        }
    }
}

// =============================================================================
// File Details
// =============================================================================

/// File extensions stripped from the date label.
const KNOWN_EXTENSIONS: &[&str] = &[".xlsx", ".xls", ".csv", ".tsv", ".txt"];

/// Identity of an uploaded summary, taken from `<customer name>-<date>.xlsx`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileDetails {
    /// Customer identifier (left of the `-`).
    pub customer: String,
    /// Date label (right of the `-`, extension removed).
    pub date: String,
}

impl FileDetails {
    /// Parse a file name. Any directory part is ignored.
    pub fn from_file_name(name: &str) -> Result<Self, FileNameError> {
        let base = Path::new(name)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(name);

        let found = base.matches('-').count();
        let (customer, rest) = match base.split_once('-') {
            Some(parts) if found == 1 => parts,
            _ => {
                return Err(FileNameError::Separator {
                    name: base.to_string(),
                    found,
                })
            }
        };

        let customer = customer.trim();
        if customer.is_empty() {
            return Err(FileNameError::EmptyCustomer(base.to_string()));
        }

        let date = KNOWN_EXTENSIONS
            .iter()
            .find_map(|ext| strip_suffix_ignore_case(rest, ext))
            .unwrap_or(rest)
            .trim();

        Ok(Self {
            customer: customer.to_string(),
            date: date.to_string(),
        })
    }
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    if s.is_char_boundary(split) && s[split..].eq_ignore_ascii_case(suffix) {
        Some(&s[..split])
    } else {
        None
    }
}
