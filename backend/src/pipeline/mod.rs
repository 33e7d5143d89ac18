//! High-level pipeline: uploaded files → registry → matrix → report.
//!
//! # Example
//!
//! ```rust,ignore
//! use bca_matrix::pipeline::{load_batch_from_paths, DEFAULT_METRIC};
//! use bca_matrix::AggregationMode;
//!
//! let batch = load_batch_from_paths(&["Acme-2025.03.csv".into(), "Zenith-2025.03.csv".into()])?;
//! let analysis = batch.analyze(DEFAULT_METRIC, AggregationMode::Cumulative);
//!
//! println!("{}", analysis.display.to_text_table());
//! for d in &analysis.report {
//!     println!("{}: {}", d.product_line, d.customers.join(", "));
//! }
//! ```
//!
//! A file that cannot be loaded (bad name, bad table) becomes a
//! [`FileNotice`] on the batch; the remaining files load normally.

use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::compare::{build_matrix, detect, ComparisonMatrix, DiscrepancyReport, DisplayGrid};
use crate::error::{BatchError, BatchResult, SourceResult};
use crate::models::{AggregationMode, FileDetails};
use crate::registry::CustomerRegistry;
use crate::summary::{extract_summary_bytes, MetricSummary};

/// Metric preselected when a batch is first shown.
pub const DEFAULT_METRIC: &str = "Contribution Margin";

/// One uploaded file
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Original file name, `<customer name>-<date>.<ext>`
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// A file that was loaded into the registry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedFile {
    pub file_name: String,
    #[serde(flatten)]
    pub details: FileDetails,
    pub metric_count: usize,
    pub product_line_count: usize,
}

/// A file that was skipped, and why
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNotice {
    pub file_name: String,
    pub message: String,
}

/// Everything loaded from one upload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    /// Unique batch identifier
    pub id: String,
    /// Load timestamp (RFC 3339)
    pub loaded_at: String,
    /// Files that made it into the registry, in upload order
    pub files: Vec<LoadedFile>,
    /// Files that were rejected
    pub notices: Vec<FileNotice>,
    #[serde(skip)]
    registry: CustomerRegistry,
}

/// Matrix, display grid and discrepancy report for one metric selection
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub metric: String,
    pub mode: AggregationMode,
    pub matrix: ComparisonMatrix,
    pub display: DisplayGrid,
    pub report: DiscrepancyReport,
}

impl Batch {
    pub fn registry(&self) -> &CustomerRegistry {
        &self.registry
    }

    /// Customers in upload order
    pub fn customers(&self) -> &[String] {
        self.registry.customers()
    }

    /// Product lines reported by any customer
    pub fn product_lines(&self) -> Vec<String> {
        self.registry.product_lines()
    }

    /// Metrics selectable in `mode`: every metric for cumulative values,
    /// only metrics with per-unit values otherwise.
    pub fn metric_options(&self, mode: AggregationMode) -> Vec<String> {
        match mode {
            AggregationMode::Cumulative => self.registry.metrics(),
            AggregationMode::PerUnit => self.registry.per_unit_metrics(),
        }
    }

    /// [`DEFAULT_METRIC`] when offered in `mode`, else the first option.
    pub fn default_metric(&self, mode: AggregationMode) -> Option<String> {
        let options = self.metric_options(mode);
        if options.iter().any(|m| m == DEFAULT_METRIC) {
            Some(DEFAULT_METRIC.to_string())
        } else {
            options.into_iter().next()
        }
    }

    /// Fails when no file of the batch could be loaded.
    pub fn require_customers(&self) -> BatchResult<()> {
        if self.registry.is_empty() {
            Err(BatchError::NothingLoaded(self.notices.len()))
        } else {
            Ok(())
        }
    }

    /// Compare `metric` across every customer and product line.
    ///
    /// Reads the registry only; calling it again with another metric or
    /// mode never reloads files.
    pub fn analyze(&self, metric: &str, mode: AggregationMode) -> Analysis {
        let matrix = build_matrix(
            &self.registry,
            self.registry.customers(),
            &self.registry.product_lines(),
            metric,
            mode,
        );
        let display = matrix.to_display();
        let report = detect(&matrix);

        Analysis {
            metric: metric.to_string(),
            mode,
            matrix,
            display,
            report,
        }
    }
}

/// Derive the customer and extract the summary of a single file.
pub fn load_source(file: &SourceFile) -> SourceResult<(FileDetails, MetricSummary)> {
    let details = FileDetails::from_file_name(&file.name)?;
    let summary = extract_summary_bytes(&file.bytes)?;
    Ok((details, summary))
}

/// Load a batch of uploaded files into a fresh registry.
///
/// Only an empty upload is an error. Files that fail are reported as
/// notices; a later file for the same customer replaces the earlier one.
pub fn load_batch(files: Vec<SourceFile>) -> BatchResult<Batch> {
    load_batch_with_notices(files, Vec::new())
}

/// Load a batch from files on disk. Unreadable files become notices.
pub fn load_batch_from_paths(paths: &[PathBuf]) -> BatchResult<Batch> {
    if paths.is_empty() {
        return Err(BatchError::NoFiles);
    }

    let mut files = Vec::new();
    let mut notices = Vec::new();
    for path in paths {
        let name = display_name(path);
        match std::fs::read(path) {
            Ok(bytes) => files.push(SourceFile::new(name, bytes)),
            Err(e) => {
                log_warning(format!("{}: {}", name, e));
                notices.push(FileNotice {
                    file_name: name,
                    message: format!("Failed to read file: {}", e),
                });
            }
        }
    }

    load_batch_with_notices(files, notices)
}

fn load_batch_with_notices(
    files: Vec<SourceFile>,
    mut notices: Vec<FileNotice>,
) -> BatchResult<Batch> {
    if files.is_empty() && notices.is_empty() {
        return Err(BatchError::NoFiles);
    }

    log_info(format!("📂 Loading {} file(s)...", files.len()));

    let mut registry = CustomerRegistry::new();
    let mut loaded = Vec::new();

    for file in &files {
        match load_source(file) {
            Ok((details, summary)) => {
                if registry.get(&details.customer).is_some() {
                    log_warning(format!(
                        "Customer '{}' uploaded twice, using {}",
                        details.customer, file.name
                    ));
                }
                log_info_indent(
                    format!(
                        "{} ({}): {} metrics, {} product lines",
                        details.customer,
                        details.date,
                        summary.len(),
                        summary.product_lines().len()
                    ),
                    1,
                );
                loaded.push(LoadedFile {
                    file_name: file.name.clone(),
                    details: details.clone(),
                    metric_count: summary.len(),
                    product_line_count: summary.product_lines().len(),
                });
                registry.register(details.customer, summary);
            }
            Err(e) => {
                log_warning(format!("{}: {}", file.name, e));
                notices.push(FileNotice {
                    file_name: file.name.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    if registry.is_empty() {
        log_warning("No file could be loaded");
    } else {
        log_success(format!(
            "Detected {} customer(s), {} product line(s)",
            registry.len(),
            registry.product_lines().len()
        ));
    }

    Ok(Batch {
        id: Uuid::new_v4().to_string(),
        loaded_at: chrono::Utc::now().to_rfc3339(),
        files: loaded,
        notices,
        registry,
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(String::from)
        .unwrap_or_else(|| path.display().to_string())
}
