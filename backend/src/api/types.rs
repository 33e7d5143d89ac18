//! REST API types for the comparison endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::compare::{DiscrepancyReport, DisplayGrid};
use crate::models::AggregationMode;
use crate::pipeline::{Analysis, Batch, FileNotice, LoadedFile};

/// Shown in place of an empty discrepancy report.
pub const NO_DISCREPANCIES: &str = "No discrepancies found.";

/// Response to a batch upload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Batch identifier
    pub batch_id: String,

    /// "ready" when every file loaded, "warning" when some were skipped
    pub status: String,

    /// Loaded files with their customer and date label
    pub files: Vec<LoadedFile>,

    /// Skipped files and the reason
    pub notices: Vec<FileNotice>,

    /// Product lines found across all customers
    pub product_lines: Vec<String>,

    /// Metric choices for the cumulative view
    pub metrics: Vec<String>,

    /// Metric choices for the per-unit view
    pub per_unit_metrics: Vec<String>,

    /// Initial metric selection
    pub default_metric: Option<String>,
}

impl From<&Batch> for UploadResponse {
    fn from(batch: &Batch) -> Self {
        UploadResponse {
            batch_id: batch.id.clone(),
            status: if batch.notices.is_empty() { "ready" } else { "warning" }.to_string(),
            files: batch.files.clone(),
            notices: batch.notices.clone(),
            product_lines: batch.product_lines(),
            metrics: batch.metric_options(AggregationMode::Cumulative),
            per_unit_metrics: batch.metric_options(AggregationMode::PerUnit),
            default_metric: batch.default_metric(AggregationMode::Cumulative),
        }
    }
}

/// Query string of `/api/metrics`
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsQuery {
    pub mode: Option<String>,
}

/// Response of `/api/metrics`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub mode: AggregationMode,
    pub metrics: Vec<String>,
    pub default_metric: Option<String>,
}

/// Query string of `/api/compare`
#[derive(Debug, Clone, Deserialize)]
pub struct CompareQuery {
    pub metric: Option<String>,
    pub mode: Option<String>,
}

/// Response of `/api/compare`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub batch_id: String,
    pub grid: DisplayGrid,
    pub discrepancies: DiscrepancyReport,
    /// Set when `discrepancies` is empty
    pub message: Option<String>,
}

impl CompareResponse {
    pub fn new(batch_id: &str, analysis: Analysis) -> Self {
        let message = analysis
            .report
            .is_empty()
            .then(|| NO_DISCREPANCIES.to_string());

        CompareResponse {
            batch_id: batch_id.to_string(),
            grid: analysis.display,
            discrepancies: analysis.report,
            message,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

/// Error response that also lists the files that were rejected
pub fn error_response_with_notices(error: &str, notices: &[FileNotice]) -> Value {
    json!({
        "status": "error",
        "error": error,
        "notices": notices,
    })
}
