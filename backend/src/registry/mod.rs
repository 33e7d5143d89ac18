//! Customer Registry - summaries of one uploaded batch, keyed by customer
//!
//! The registry is built once per batch and handed explicitly to the matrix
//! builder. A new batch gets a new registry; nothing is merged across batches.

use std::collections::HashMap;

use crate::summary::MetricSummary;

/// Registry mapping customer identifiers to their metric summaries
#[derive(Debug, Clone, Default)]
pub struct CustomerRegistry {
    /// Customers in first-registration order
    order: Vec<String>,
    /// Loaded summaries (customer -> summary)
    summaries: HashMap<String, MetricSummary>,
}

impl CustomerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a customer's summary. Last write wins; a replaced
    /// customer keeps its original position.
    pub fn register(&mut self, customer: impl Into<String>, summary: MetricSummary) {
        let customer = customer.into();
        if !self.summaries.contains_key(&customer) {
            self.order.push(customer.clone());
        }
        self.summaries.insert(customer, summary);
    }

    /// Exact lookup of `customer` / `metric` / `column`. Any unknown key is
    /// a miss, never an error.
    pub fn lookup(&self, customer: &str, metric: &str, column: &str) -> Option<f64> {
        self.summaries.get(customer)?.value(metric, column)
    }

    /// Get a customer's summary
    pub fn get(&self, customer: &str) -> Option<&MetricSummary> {
        self.summaries.get(customer)
    }

    /// Customers in registration order
    pub fn customers(&self) -> &[String] {
        &self.order
    }

    /// Union of product lines across customers, first-seen order
    pub fn product_lines(&self) -> Vec<String> {
        self.union_by(|s| s.product_lines().iter().map(String::as_str).collect())
    }

    /// Union of metric names across customers, first-seen order
    pub fn metrics(&self) -> Vec<String> {
        self.union_by(|s| s.metrics().iter().map(String::as_str).collect())
    }

    /// Union of metrics with at least one per-unit value, first-seen order
    pub fn per_unit_metrics(&self) -> Vec<String> {
        self.union_by(|s| s.per_unit_metrics().collect())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn union_by<'a, F>(&'a self, names: F) -> Vec<String>
    where
        F: Fn(&'a MetricSummary) -> Vec<&'a str>,
    {
        let mut out: Vec<String> = Vec::new();
        for customer in &self.order {
            if let Some(summary) = self.summaries.get(customer) {
                for name in names(summary) {
                    if !out.iter().any(|n| n == name) {
                        out.push(name.to_string());
                    }
                }
            }
        }
        out
    }
}
