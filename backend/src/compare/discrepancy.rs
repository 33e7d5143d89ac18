//! Discrepancy Detector - per product line, find customers whose value
//! stands alone.
//!
//! A value `v` is an outlier when no other value of the same column lies
//! within `v ± 5%`. The band is centred on `v` itself, so two values can
//! disagree about each other and clusters are not transitive:
//!
//! ```text
//! [100, 102, 200]
//!   100 -> [95.0, 105.0]   contains 102   -> kept
//!   102 -> [96.9, 107.1]   contains 100   -> kept
//!   200 -> [190.0, 210.0]  contains none  -> outlier
//! ```
//!
//! With exactly two values more than 5% apart, both are outliers.

use serde::Serialize;

use super::matrix::{ComparisonMatrix, DisplayGrid};
use super::format::parse_display;

/// Relative distance beyond which a value no longer corroborates another.
pub const TOLERANCE: f64 = 0.05;

/// Outlier customers of one product line
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancy {
    pub product_line: String,
    /// In matrix row order
    pub customers: Vec<String>,
}

/// Product lines with at least one outlier, in column order
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(transparent)]
pub struct DiscrepancyReport {
    entries: Vec<Discrepancy>,
}

impl DiscrepancyReport {
    /// Outliers of a product line, if it has any.
    pub fn get(&self, product_line: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|d| d.product_line == product_line)
            .map(|d| d.customers.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Discrepancy> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(&mut self, product_line: &str, customers: Vec<&str>) {
        if !customers.is_empty() {
            self.entries.push(Discrepancy {
                product_line: product_line.to_string(),
                customers: customers.into_iter().map(String::from).collect(),
            });
        }
    }
}

impl<'a> IntoIterator for &'a DiscrepancyReport {
    type Item = &'a Discrepancy;
    type IntoIter = std::slice::Iter<'a, Discrepancy>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Detect outliers in every column of a matrix.
///
/// Missing cells and NaN values are left out of the column before
/// comparing; they are neither candidates nor neighbours.
pub fn detect(matrix: &ComparisonMatrix) -> DiscrepancyReport {
    let mut report = DiscrepancyReport::default();

    for (col, product_line) in matrix.product_lines().iter().enumerate() {
        let values: Vec<(&str, f64)> = matrix
            .column(col)
            .filter_map(|(customer, cell)| cell.as_number().map(|n| (customer, n)))
            .collect();

        report.push(product_line, find_outliers(&values));
    }

    report
}

/// Detect outliers in a grid of display strings.
///
/// Cells are read back with [`parse_display`]; cells that do not parse
/// (the `-` marker, empty strings, text) are left out.
pub fn detect_display(grid: &DisplayGrid) -> DiscrepancyReport {
    let mut report = DiscrepancyReport::default();

    for (col, product_line) in grid.product_lines.iter().enumerate() {
        let values: Vec<(&str, f64)> = grid
            .rows
            .iter()
            .filter_map(|row| {
                let value = parse_display(row.cells.get(col)?)?;
                Some((row.customer.as_str(), value))
            })
            .collect();

        report.push(product_line, find_outliers(&values));
    }

    report
}

/// Customers whose value has no neighbour within [`TOLERANCE`], in input
/// order. Fewer than two values never yield an outlier.
pub fn find_outliers<'a>(values: &[(&'a str, f64)]) -> Vec<&'a str> {
    if values.len() < 2 {
        return Vec::new();
    }

    values
        .iter()
        .enumerate()
        .filter(|&(i, &(_, v))| {
            let (low, high) = tolerance_band(v);
            values
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .all(|(_, &(_, w))| w < low || w > high)
        })
        .map(|(_, &(customer, _))| customer)
        .collect()
}

/// `[v·0.95, v·1.05]`, ordered so negative values work too.
fn tolerance_band(v: f64) -> (f64, f64) {
    let a = v * (1.0 - TOLERANCE);
    let b = v * (1.0 + TOLERANCE);
    (a.min(b), a.max(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::matrix::build_matrix;
    use crate::models::AggregationMode;
    use crate::registry::CustomerRegistry;
    use crate::summary::{MetricRow, MetricSummary};

    fn column(values: &[(&'static str, f64)]) -> Vec<&'static str> {
        find_outliers(values)
    }

    /// One metric ("Sales"), one product line ("ColumnX").
    fn matrix(values: &[(&str, Option<f64>)]) -> ComparisonMatrix {
        let mut registry = CustomerRegistry::new();
        for (customer, value) in values {
            let mut row = MetricRow::default();
            if let Some(v) = value {
                row.insert("ColumnX Cumulative", *v);
            }
            let mut summary = MetricSummary::new();
            summary.insert_metric("Sales", row);
            registry.register(*customer, summary);
        }
        let customers: Vec<String> = values.iter().map(|(c, _)| c.to_string()).collect();
        build_matrix(
            &registry,
            &customers,
            &["ColumnX".to_string()],
            "Sales",
            AggregationMode::Cumulative,
        )
    }

    #[test]
    fn test_isolated_value_flagged() {
        let m = matrix(&[
            ("Customer100", Some(100.0)),
            ("Customer102", Some(102.0)),
            ("Customer200", Some(200.0)),
        ]);
        let report = detect(&m);

        assert_eq!(report.len(), 1);
        assert_eq!(report.get("ColumnX"), Some(&["Customer200".to_string()][..]));
    }

    #[test]
    fn test_band_edges() {
        // 105 is exactly 100 * 1.05: inside the band, so 100 is not alone
        assert!(column(&[("a", 100.0), ("b", 105.0)]).is_empty());
        // 105.1 is outside 100's band, but 100 is inside 105.1's [99.845, 110.355]
        assert_eq!(column(&[("a", 100.0), ("b", 105.1)]), vec!["a"]);
        assert_eq!(column(&[("a", 100.0), ("b", 111.0)]), vec!["a", "b"]);
    }

    #[test]
    fn test_two_values_far_apart_both_flagged() {
        assert_eq!(column(&[("a", 10.0), ("b", 50.0)]), vec!["a", "b"]);
    }

    #[test]
    fn test_negative_values() {
        // -100's band is [-105, -95]
        assert!(column(&[("a", -100.0), ("b", -97.0)]).is_empty());
        assert_eq!(
            column(&[("a", -100.0), ("b", -97.0), ("c", 100.0)]),
            vec!["c"]
        );
    }

    #[test]
    fn test_zero_band_is_a_point() {
        assert!(column(&[("a", 0.0), ("b", 0.0), ("c", 0.0)]).is_empty());
        assert_eq!(column(&[("a", 0.0), ("b", 0.0), ("c", 0.01)]), vec!["c"]);
    }

    #[test]
    fn test_insufficient_data() {
        assert!(column(&[]).is_empty());
        assert!(column(&[("only", 42.0)]).is_empty());

        let m = matrix(&[("Acme", Some(42.0)), ("Zenith", None)]);
        assert!(detect(&m).is_empty());
    }

    #[test]
    fn test_all_equal_yields_empty_report() {
        let m = matrix(&[("a", Some(7.5)), ("b", Some(7.5)), ("c", Some(7.5))]);
        let report = detect(&m);

        assert!(report.is_empty());
        assert_eq!(serde_json::to_string(&report).unwrap(), "[]");
    }

    #[test]
    fn test_missing_cells_excluded() {
        let with_gaps = matrix(&[
            ("A", Some(100.0)),
            ("Gap1", None),
            ("B", Some(101.0)),
            ("Gap2", None),
            ("C", Some(300.0)),
        ]);
        let without_gaps = matrix(&[("A", Some(100.0)), ("B", Some(101.0)), ("C", Some(300.0))]);

        assert_eq!(detect(&with_gaps), detect(&without_gaps));
        assert_eq!(detect(&with_gaps).get("ColumnX"), Some(&["C".to_string()][..]));
    }

    #[test]
    fn test_nan_excluded() {
        let m = matrix(&[("A", Some(100.0)), ("B", Some(f64::NAN)), ("C", Some(100.0))]);
        assert!(detect(&m).is_empty());
    }

    #[test]
    fn test_outliers_in_row_order() {
        let m = matrix(&[
            ("Low", Some(1.0)),
            ("Mid1", Some(50.0)),
            ("Mid2", Some(51.0)),
            ("High", Some(500.0)),
        ]);
        assert_eq!(
            detect(&m).get("ColumnX"),
            Some(&["Low".to_string(), "High".to_string()][..])
        );
    }

    #[test]
    fn test_detect_display_matches_detect() {
        let m = matrix(&[
            ("A", Some(-1234.5)),
            ("B", None),
            ("C", Some(-1240.0)),
            ("D", Some(99.0)),
        ]);
        let grid = m.to_display();

        assert_eq!(grid.rows[0].cells[0], "$ (1,234.50)");
        assert_eq!(detect_display(&grid), detect(&m));
        assert_eq!(detect_display(&grid).get("ColumnX"), Some(&["D".to_string()][..]));
    }

    #[test]
    fn test_report_serialization() {
        let m = matrix(&[("a", Some(1.0)), ("b", Some(1.0)), ("c", Some(9.0))]);
        let json = serde_json::to_value(detect(&m)).unwrap();

        assert_eq!(json[0]["productLine"], "ColumnX");
        assert_eq!(json[0]["customers"][0], "c");
    }
}
