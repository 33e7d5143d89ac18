//! # BCA Matrix - customer business-case comparison
//!
//! Loads the BCA summaries of several customers, lines them up per product
//! line for one metric, and flags the customers whose value has no
//! counterpart within 5% among the others.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ <cust>-<date>│──▶│   Summary    │──▶│   Customer   │──▶│  Comparison  │──┬─▶ display grid
//! │   files      │   │  extraction  │   │   registry   │   │    matrix    │  └─▶ discrepancies
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bca_matrix::{load_batch, AggregationMode, SourceFile};
//!
//! let batch = load_batch(vec![
//!     SourceFile::new("Acme-2025.03.csv", std::fs::read("Acme-2025.03.csv")?),
//!     SourceFile::new("Zenith-2025.03.csv", std::fs::read("Zenith-2025.03.csv")?),
//! ])?;
//! let analysis = batch.analyze("Contribution Margin", AggregationMode::Cumulative);
//! println!("{}", analysis.display.to_text_table());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`models`] - Modes, cells, metric kinds, file details
//! - [`parser`] - Workbook and delimited-text reading
//! - [`summary`] - Per-customer metric summaries
//! - [`registry`] - Customer registry of one batch
//! - [`compare`] - Matrix, discrepancy detection, formatting
//! - [`pipeline`] - Batch loading and analysis
//! - [`config`] - Server settings
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Input
pub mod parser;
pub mod summary;

// Comparison
pub mod registry;
pub mod compare;
pub mod pipeline;

// Outer surfaces
pub mod config;
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{BatchError, ExtractError, FileNameError, ServerError, SourceError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{AggregationMode, CellValue, FileDetails, MetricKind, MISSING_MARKER};

// =============================================================================
// Re-exports - Summaries and registry
// =============================================================================

pub use summary::{
    extract_summary, extract_summary_bytes, extract_summary_file, MetricRow, MetricSummary,
};
pub use registry::CustomerRegistry;

// =============================================================================
// Re-exports - Comparison
// =============================================================================

pub use compare::{
    build_matrix,
    detect,
    detect_display,
    format_value,
    parse_display,
    ComparisonMatrix,
    Discrepancy,
    DiscrepancyReport,
    DisplayGrid,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{
    load_batch,
    load_batch_from_paths,
    Analysis,
    Batch,
    FileNotice,
    SourceFile,
    DEFAULT_METRIC,
};

pub use config::ServerConfig;

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
