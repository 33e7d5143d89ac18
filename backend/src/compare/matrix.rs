//! Comparison Matrix - customers × product lines for one metric
//!
//! ```text
//!              Brakes        Pumps         Radiators
//! Acme         $ 12,500.00   $ (310.00)    -
//! Zenith       $ 12,100.00   $ 95.00       $ 4,020.00
//! ```
//!
//! Every cell is a registry lookup of `"{product line} Cumulative"` or
//! `"{product line} Per Unit"`. A miss is a [`CellValue::Missing`] cell,
//! so sparse matrices are normal.

use serde::Serialize;

use super::format::format_value;
use crate::models::{AggregationMode, CellValue};
use crate::registry::CustomerRegistry;

/// Values of one metric for every customer and product line
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonMatrix {
    /// Metric being compared
    pub metric: String,
    /// Cumulative or per-unit values
    pub mode: AggregationMode,
    /// Row axis, in upload order
    customers: Vec<String>,
    /// Column axis
    product_lines: Vec<String>,
    /// Row-major cells, `customers.len()` rows of `product_lines.len()`
    cells: Vec<Vec<CellValue>>,
}

impl ComparisonMatrix {
    pub fn customers(&self) -> &[String] {
        &self.customers
    }

    pub fn product_lines(&self) -> &[String] {
        &self.product_lines
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.customers.len(), self.product_lines.len())
    }

    /// Cell by position.
    pub fn cell(&self, row: usize, col: usize) -> Option<CellValue> {
        self.cells.get(row)?.get(col).copied()
    }

    /// Cell by customer and product line name.
    pub fn get(&self, customer: &str, product_line: &str) -> Option<CellValue> {
        let row = self.customers.iter().position(|c| c == customer)?;
        let col = self.product_lines.iter().position(|p| p == product_line)?;
        self.cell(row, col)
    }

    /// Cells of one column, top to bottom, with their customer.
    pub fn column(&self, col: usize) -> impl Iterator<Item = (&str, CellValue)> + '_ {
        self.customers
            .iter()
            .zip(&self.cells)
            .filter_map(move |(customer, row)| row.get(col).map(|v| (customer.as_str(), *v)))
    }

    /// Render every cell through the value formatter.
    pub fn to_display(&self) -> DisplayGrid {
        let rows = self
            .customers
            .iter()
            .zip(&self.cells)
            .map(|(customer, row)| DisplayRow {
                customer: customer.clone(),
                cells: row.iter().map(|v| format_value(v, &self.metric)).collect(),
            })
            .collect();

        DisplayGrid {
            metric: self.metric.clone(),
            mode: self.mode,
            product_lines: self.product_lines.clone(),
            rows,
        }
    }
}

/// Build the comparison matrix for `metric` in `mode`.
///
/// Rows follow `customer_order` and columns follow `product_lines`; both
/// are de-duplicated keeping the first occurrence. Unknown customers,
/// metrics or product lines produce missing cells.
pub fn build_matrix(
    registry: &CustomerRegistry,
    customer_order: &[String],
    product_lines: &[String],
    metric: &str,
    mode: AggregationMode,
) -> ComparisonMatrix {
    let customers = dedup(customer_order);
    let product_lines = dedup(product_lines);
    let keys: Vec<String> = product_lines.iter().map(|p| mode.column_key(p)).collect();

    let cells = customers
        .iter()
        .map(|customer| {
            keys.iter()
                .map(|key| CellValue::from(registry.lookup(customer, metric, key)))
                .collect()
        })
        .collect();

    ComparisonMatrix {
        metric: metric.to_string(),
        mode,
        customers,
        product_lines,
        cells,
    }
}

fn dedup(items: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(item) {
            out.push(item.clone());
        }
    }
    out
}

// =============================================================================
// Display Grid
// =============================================================================

/// A comparison matrix rendered to display strings
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayGrid {
    pub metric: String,
    pub mode: AggregationMode,
    pub product_lines: Vec<String>,
    pub rows: Vec<DisplayRow>,
}

/// One customer's formatted cells
#[derive(Debug, Clone, Serialize)]
pub struct DisplayRow {
    pub customer: String,
    pub cells: Vec<String>,
}

impl DisplayGrid {
    /// Plain-text table with a `Customer` column, padded for terminals.
    pub fn to_text_table(&self) -> String {
        let mut header = vec!["Customer".to_string()];
        header.extend(self.product_lines.iter().cloned());

        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| {
                let mut line = vec![r.customer.clone()];
                line.extend(r.cells.iter().cloned());
                line
            })
            .collect();

        let widths: Vec<usize> = (0..header.len())
            .map(|i| {
                std::iter::once(&header)
                    .chain(&body)
                    .filter_map(|line| line.get(i))
                    .map(|s| s.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        std::iter::once(&header)
            .chain(&body)
            .map(|line| {
                line.iter()
                    .zip(&widths)
                    .enumerate()
                    .map(|(i, (cell, w))| {
                        if i == 0 {
                            format!("{:<w$}", cell, w = *w)
                        } else {
                            format!("{:>w$}", cell, w = *w)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("  ")
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::{MetricRow, MetricSummary};

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn registry() -> CustomerRegistry {
        let mut acme = MetricRow::default();
        acme.insert("Brakes Cumulative", 100.0);
        acme.insert("Brakes Per Unit", 2.5);
        acme.insert("Pumps Cumulative", -50.0);
        let mut acme_summary = MetricSummary::new();
        acme_summary.insert_metric("Sales", acme);

        let mut zenith = MetricRow::default();
        zenith.insert("Brakes Cumulative", 110.0);
        let mut zenith_summary = MetricSummary::new();
        zenith_summary.insert_metric("Sales", zenith);

        // Registered in reverse of the upload order
        let mut registry = CustomerRegistry::new();
        registry.register("Zenith", zenith_summary);
        registry.register("Acme", acme_summary);
        registry
    }

    #[test]
    fn test_build_cumulative() {
        let matrix = build_matrix(
            &registry(),
            &names(&["Acme", "Zenith"]),
            &names(&["Brakes", "Pumps"]),
            "Sales",
            AggregationMode::Cumulative,
        );

        assert_eq!(matrix.shape(), (2, 2));
        assert_eq!(matrix.get("Acme", "Brakes"), Some(CellValue::Number(100.0)));
        assert_eq!(matrix.get("Acme", "Pumps"), Some(CellValue::Number(-50.0)));
        assert_eq!(matrix.get("Zenith", "Brakes"), Some(CellValue::Number(110.0)));
        assert_eq!(matrix.get("Zenith", "Pumps"), Some(CellValue::Missing));
    }

    #[test]
    fn test_build_per_unit() {
        let matrix = build_matrix(
            &registry(),
            &names(&["Acme", "Zenith"]),
            &names(&["Brakes"]),
            "Sales",
            AggregationMode::PerUnit,
        );

        assert_eq!(matrix.get("Acme", "Brakes"), Some(CellValue::Number(2.5)));
        assert_eq!(matrix.get("Zenith", "Brakes"), Some(CellValue::Missing));
    }

    #[test]
    fn test_unknown_keys_are_missing() {
        let matrix = build_matrix(
            &registry(),
            &names(&["Acme", "Ghost"]),
            &names(&["Brakes", "Gaskets"]),
            "Unknown Metric",
            AggregationMode::Cumulative,
        );

        assert_eq!(matrix.shape(), (2, 2));
        for row in 0..2 {
            for col in 0..2 {
                assert_eq!(matrix.cell(row, col), Some(CellValue::Missing));
            }
        }
    }

    #[test]
    fn test_row_order_follows_customer_order() {
        let registry = registry();
        assert_eq!(registry.customers(), ["Zenith", "Acme"]);

        let matrix = build_matrix(
            &registry,
            &names(&["Acme", "Zenith", "Acme"]),
            &names(&["Brakes", "Brakes"]),
            "Sales",
            AggregationMode::Cumulative,
        );

        assert_eq!(matrix.customers(), ["Acme", "Zenith"]);
        assert_eq!(matrix.product_lines(), ["Brakes"]);
    }

    #[test]
    fn test_display_grid() {
        let matrix = build_matrix(
            &registry(),
            &names(&["Acme", "Zenith"]),
            &names(&["Brakes", "Pumps"]),
            "Sales",
            AggregationMode::Cumulative,
        );
        let grid = matrix.to_display();

        assert_eq!(grid.rows[0].cells, vec!["$ 100.00", "$ (50.00)"]);
        assert_eq!(grid.rows[1].cells, vec!["$ 110.00", "-"]);

        let text = grid.to_text_table();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Customer"));
        assert!(lines[2].starts_with("Zenith"));
        assert!(lines[2].ends_with('-'));
    }
}
