//! Per-customer metric summaries.
//!
//! A summary is the BCA sheet of one customer reduced to
//! `metric name -> column name -> value`, where column names follow the
//! `"{product line} Cumulative"` / `"{product line} Per Unit"` convention.
//!
//! # Expected table
//!
//! ```text
//! Metric              | Brakes Cumulative | Brakes Per Unit | Pumps Cumulative | ...
//! Contribution Margin | $ 12,500.00       | 4.20            | (310.00)         |
//! MARGIN %            | 0.25              |                 | 0.18             |
//! ```
//!
//! Cells accept the same notation the formatter produces (`$`, `,`,
//! accounting parentheses). A cell ending in `%` is read back as a
//! fraction. Empty or unreadable cells are simply absent, so
//! a later lookup misses instead of seeing a zero.

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use crate::api::logs::log_warning;
use crate::compare::format::parse_display;
use crate::error::{ExtractError, ExtractResult};
use crate::models::AggregationMode;
use crate::parser::{parse_bytes_auto, parse_file_auto, Table};

/// Header of the column holding metric names.
pub const METRIC_COLUMN: &str = "Metric";

/// Values of one metric, keyed by summary column name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricRow {
    values: HashMap<String, f64>,
}

impl MetricRow {
    /// Value under an exact column name such as `"Brakes Per Unit"`.
    pub fn get(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: f64) {
        self.values.insert(column.into(), value);
    }

    /// Whether any product line reports a per-unit value.
    pub fn has_per_unit(&self) -> bool {
        self.values.keys().any(|k| {
            matches!(
                AggregationMode::split_column(k),
                Some((_, AggregationMode::PerUnit))
            )
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One customer's summary, indexed by metric name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricSummary {
    metrics: Vec<String>,
    product_lines: Vec<String>,
    rows: HashMap<String, MetricRow>,
}

impl MetricSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a metric row. Returns `false` (and keeps the existing row) when
    /// the metric is already present.
    pub fn insert_metric(&mut self, metric: impl Into<String>, row: MetricRow) -> bool {
        let metric = metric.into();
        if self.rows.contains_key(&metric) {
            return false;
        }
        for column in row.values.keys() {
            if let Some((pline, _)) = AggregationMode::split_column(column) {
                self.add_product_line(pline);
            }
        }
        self.metrics.push(metric.clone());
        self.rows.insert(metric, row);
        true
    }

    /// Declare a product line even if no value was reported for it.
    pub fn add_product_line(&mut self, product_line: &str) {
        if !self.product_lines.iter().any(|p| p == product_line) {
            self.product_lines.push(product_line.to_string());
        }
    }

    /// Two-level exact lookup.
    pub fn value(&self, metric: &str, column: &str) -> Option<f64> {
        self.rows.get(metric).and_then(|row| row.get(column))
    }

    pub fn row(&self, metric: &str) -> Option<&MetricRow> {
        self.rows.get(metric)
    }

    /// Metric names in table order.
    pub fn metrics(&self) -> &[String] {
        &self.metrics
    }

    /// Product lines in column order.
    pub fn product_lines(&self) -> &[String] {
        &self.product_lines
    }

    pub fn has_per_unit(&self, metric: &str) -> bool {
        self.rows.get(metric).is_some_and(MetricRow::has_per_unit)
    }

    /// Metrics that report at least one per-unit value, in table order.
    pub fn per_unit_metrics(&self) -> impl Iterator<Item = &str> {
        self.metrics
            .iter()
            .filter(|m| self.has_per_unit(m))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Build a summary from a parsed table.
pub fn extract_summary(table: &Table) -> ExtractResult<MetricSummary> {
    let metric_col = table
        .column_index(METRIC_COLUMN)
        .ok_or_else(|| ExtractError::MissingMetricColumn(METRIC_COLUMN.to_string()))?;

    // Keys are normalized: "Brakes  Cumulative" is stored as "Brakes Cumulative"
    let value_columns: Vec<(usize, String, AggregationMode)> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != metric_col)
        .filter_map(|(i, header)| {
            AggregationMode::split_column(header).map(|(pline, mode)| (i, pline, mode))
        })
        .map(|(i, pline, mode)| (i, mode.column_key(pline), mode))
        .collect();

    if !value_columns
        .iter()
        .any(|(_, _, mode)| *mode == AggregationMode::Cumulative)
    {
        return Err(ExtractError::NoProductLines);
    }

    let mut summary = MetricSummary::new();
    for (_, key, _) in &value_columns {
        if let Some((pline, _)) = AggregationMode::split_column(key) {
            summary.add_product_line(pline);
        }
    }

    for (row_idx, _) in table.rows.iter().enumerate() {
        let metric = table.cell(row_idx, metric_col);
        if metric.is_empty() {
            continue;
        }

        let mut row = MetricRow::default();
        for (col, key, _) in &value_columns {
            if let Some(value) = parse_source_cell(table.cell(row_idx, *col)) {
                row.insert(key.as_str(), value);
            }
        }

        if !summary.insert_metric(metric, row) {
            log_warning(format!("Duplicate metric '{}' ignored (row {})", metric, row_idx + 2));
        }
    }

    Ok(summary)
}

/// Parse a summary cell. `"10.25 %"` is a fraction shown as a percentage
/// and is stored as `0.1025`, matching what the formatter multiplies back.
fn parse_source_cell(raw: &str) -> Option<f64> {
    let value = parse_display(raw)?;
    if raw.trim_end().ends_with('%') {
        Some(value / 100.0)
    } else {
        Some(value)
    }
}

/// Read and extract a summary from raw bytes.
pub fn extract_summary_bytes(bytes: &[u8]) -> ExtractResult<MetricSummary> {
    let table = parse_bytes_auto(bytes)?;
    extract_summary(&table)
}

/// Read and extract a summary from a file.
pub fn extract_summary_file<P: AsRef<Path>>(path: P) -> ExtractResult<MetricSummary> {
    let table = parse_file_auto(path)?;
    extract_summary(&table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;

    const SAMPLE: &str = "\
Metric;Brakes Cumulative;Brakes Per Unit;Pumps Cumulative;Notes
Contribution Margin;$ 12,500.00;4.20;(310.00);ok
MARGIN %;0.25;;0.18;
QTY Total;3000;;1200;
";

    fn sample() -> MetricSummary {
        extract_summary(&parse_table(SAMPLE, ';').unwrap()).unwrap()
    }

    #[test]
    fn test_extract_values() {
        let summary = sample();

        assert_eq!(summary.value("Contribution Margin", "Brakes Cumulative"), Some(12500.0));
        assert_eq!(summary.value("Contribution Margin", "Brakes Per Unit"), Some(4.2));
        assert_eq!(summary.value("Contribution Margin", "Pumps Cumulative"), Some(-310.0));
        assert_eq!(summary.value("MARGIN %", "Pumps Cumulative"), Some(0.18));
    }

    #[test]
    fn test_empty_cells_are_absent() {
        let summary = sample();
        assert_eq!(summary.value("MARGIN %", "Brakes Per Unit"), None);
        assert_eq!(summary.value("Unknown", "Brakes Cumulative"), None);
        assert_eq!(summary.value("QTY Total", "Notes"), None);
    }

    #[test]
    fn test_catalogs() {
        let summary = sample();

        assert_eq!(summary.metrics(), ["Contribution Margin", "MARGIN %", "QTY Total"]);
        assert_eq!(summary.product_lines(), ["Brakes", "Pumps"]);
        assert_eq!(summary.per_unit_metrics().collect::<Vec<_>>(), vec!["Contribution Margin"]);
        assert!(!summary.has_per_unit("QTY Total"));
    }

    #[test]
    fn test_duplicate_metric_keeps_first() {
        let csv = "Metric;A Cumulative\nSales;1\nSales;2";
        let summary = extract_summary(&parse_table(csv, ';').unwrap()).unwrap();

        assert_eq!(summary.len(), 1);
        assert_eq!(summary.value("Sales", "A Cumulative"), Some(1.0));
    }

    #[test]
    fn test_missing_metric_column() {
        let table = parse_table("Name;A Cumulative\nSales;1", ';').unwrap();
        assert!(matches!(
            extract_summary(&table),
            Err(ExtractError::MissingMetricColumn(_))
        ));
    }

    #[test]
    fn test_percent_cells_are_fractions() {
        let csv = "Metric;A Cumulative;B Cumulative\n\
                   MARGIN %;10.25 %;0.1025\n\
                   Net Sales;$ 1,000.00;50";
        let summary = extract_summary(&parse_table(csv, ';').unwrap()).unwrap();

        let from_percent = summary.value("MARGIN %", "A Cumulative").unwrap();
        assert!((from_percent - 0.1025).abs() < 1e-12);
        assert_eq!(summary.value("MARGIN %", "B Cumulative"), Some(0.1025));
        assert_eq!(summary.value("Net Sales", "A Cumulative"), Some(1000.0));
    }

    #[test]
    fn test_irregular_header_spacing() {
        let csv = "Metric;Brakes  Cumulative;Brakes   Per Unit\nSales;100;2";
        let table = parse_table(csv, ';').unwrap();
        let summary = extract_summary(&table).unwrap();

        assert_eq!(summary.product_lines(), ["Brakes"]);
        assert_eq!(summary.value("Sales", "Brakes Cumulative"), Some(100.0));
        assert_eq!(summary.value("Sales", "Brakes Per Unit"), Some(2.0));
        assert!(summary.has_per_unit("Sales"));
    }

    #[test]
    fn test_no_cumulative_columns() {
        let table = parse_table("Metric;A Per Unit\nSales;1", ';').unwrap();
        assert!(matches!(extract_summary(&table), Err(ExtractError::NoProductLines)));
    }
}
