//! End-to-end: summary files on disk through to the discrepancy report.

use bca_matrix::{
    detect_display, load_batch_from_paths, AggregationMode, BatchError, CellValue, DEFAULT_METRIC,
};
use std::path::{Path, PathBuf};

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn fixture(dir: &Path) -> Vec<PathBuf> {
    vec![
        write(
            dir,
            "Acme Corp-2025.03.csv",
            b"Metric,Brakes Cumulative,Brakes Per Unit,Pumps Cumulative,Pumps Per Unit\n\
              Net Sales,\"12,000.00\",30.00,\"5,000\",50\n\
              Contribution Margin,\"1,000.00\",2.50,500,5\n\
              MARGIN %,0.25,,0.10,\n\
              QTY Total,400,,100,\n",
        ),
        write(
            dir,
            "Zenith-2025.03.csv",
            b"Metric;Brakes Cumulative;Brakes Per Unit;Radiators Cumulative\n\
              Contribution Margin;1020;2.55;(80)\n\
              MARGIN %;0.26;;-0.05\n\
              QTY Total;410;;20\n",
        ),
        write(
            dir,
            "Delta-2025.03.csv",
            b"Metric;Brakes Cumulative;Brakes Per Unit;Pumps Cumulative\n\
              Contribution Margin;2500;9.00;505\n\
              MARGIN %;0.4;;0.102\n",
        ),
    ]
}

#[test]
fn test_compare_contribution_margin() {
    let dir = tempfile::tempdir().unwrap();
    let batch = load_batch_from_paths(&fixture(dir.path())).unwrap();

    assert_eq!(batch.customers(), ["Acme Corp", "Zenith", "Delta"]);
    assert_eq!(batch.product_lines(), vec!["Brakes", "Pumps", "Radiators"]);
    assert_eq!(batch.default_metric(AggregationMode::Cumulative).as_deref(), Some(DEFAULT_METRIC));

    let analysis = batch.analyze(DEFAULT_METRIC, AggregationMode::Cumulative);

    assert_eq!(analysis.matrix.get("Zenith", "Radiators"), Some(CellValue::Number(-80.0)));
    assert_eq!(analysis.matrix.get("Delta", "Radiators"), Some(CellValue::Missing));

    assert_eq!(analysis.display.rows[0].cells, vec!["$ 1,000.00", "$ 500.00", "-"]);
    assert_eq!(analysis.display.rows[1].cells, vec!["$ 1,020.00", "-", "$ (80.00)"]);

    assert_eq!(analysis.report.len(), 1);
    assert_eq!(analysis.report.get("Brakes"), Some(&["Delta".to_string()][..]));
}

#[test]
fn test_display_and_numeric_reports_agree() {
    let dir = tempfile::tempdir().unwrap();
    let batch = load_batch_from_paths(&fixture(dir.path())).unwrap();

    for metric in ["Contribution Margin", "MARGIN %", "QTY Total", "Net Sales"] {
        let analysis = batch.analyze(metric, AggregationMode::Cumulative);
        assert_eq!(detect_display(&analysis.display), analysis.report, "metric {}", metric);
    }
}

#[test]
fn test_percentage_view() {
    let dir = tempfile::tempdir().unwrap();
    let batch = load_batch_from_paths(&fixture(dir.path())).unwrap();

    let analysis = batch.analyze("MARGIN %", AggregationMode::Cumulative);

    // Sign is dropped in the percentage display
    assert_eq!(analysis.display.rows[1].cells, vec!["26.00 %", "-", "5.00 %"]);
    // Brakes: 0.25 and 0.26 agree, 0.4 stands alone; Pumps: 0.10 and 0.102 agree
    assert_eq!(analysis.report.get("Brakes"), Some(&["Delta".to_string()][..]));
    assert_eq!(analysis.report.get("Pumps"), None);
}

#[test]
fn test_per_unit_view() {
    let dir = tempfile::tempdir().unwrap();
    let batch = load_batch_from_paths(&fixture(dir.path())).unwrap();

    assert_eq!(
        batch.metric_options(AggregationMode::PerUnit),
        vec!["Net Sales", "Contribution Margin"]
    );

    let analysis = batch.analyze(DEFAULT_METRIC, AggregationMode::PerUnit);
    assert_eq!(analysis.display.rows[0].cells, vec!["$ 2.50", "$ 5.00", "-"]);
    assert_eq!(analysis.report.get("Brakes"), Some(&["Delta".to_string()][..]));
}

#[test]
fn test_bad_and_missing_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = fixture(dir.path());
    paths.push(write(dir.path(), "summary.csv", b"Metric;A Cumulative\nX;1\n"));
    paths.push(dir.path().join("Ghost-2025.03.csv"));

    let batch = load_batch_from_paths(&paths).unwrap();

    assert_eq!(batch.customers().len(), 3);
    let skipped: Vec<&str> = batch.notices.iter().map(|n| n.file_name.as_str()).collect();
    assert_eq!(skipped, vec!["Ghost-2025.03.csv", "summary.csv"]);
}

#[test]
fn test_nothing_loadable() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![write(dir.path(), "Acme-2025.csv", b"Name,Value\nX,1\n")];

    let batch = load_batch_from_paths(&paths).unwrap();
    assert!(matches!(batch.require_customers(), Err(BatchError::NothingLoaded(1))));

    assert!(matches!(load_batch_from_paths(&[]), Err(BatchError::NoFiles)));
}
