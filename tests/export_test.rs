use coldash::chart_export::{
    export_chart_image, export_dashboard_image, export_dataset, write_atomic,
    DashboardImageOptions,
};
use coldash_cli::{ChartImageFormat, DataExportFormat};
use coldash::error::{ExportError, RenderError};
use coldash::{load_path, AppConfig, Cell, Dashboard, LoadOptions};
use calamine::{open_workbook_auto, Data, Reader};
use serde_json::Value;
use tempfile::TempDir;

mod common;
use common::{people, recording_dashboard};

#[test]
fn test_export_dataset_csv() {
    let bytes = export_dataset(&people(), DataExportFormat::Csv).unwrap();
    let text = String::from_utf8(bytes).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], "age,city");
    assert!(lines[1].starts_with("25"));
    assert!(lines[1].ends_with(",NY"));
    assert_eq!(lines[3], ",LA");
}

#[test]
fn test_export_dataset_json_keeps_numbers_numeric() {
    let bytes = export_dataset(&people(), DataExportFormat::Json).unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    let records = value.as_array().unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["age"].as_f64(), Some(25.0));
    assert_eq!(records[0]["city"], "NY");
    assert!(records[2]["age"].is_null());
}

#[test]
fn test_export_dataset_xlsx_round_trips() {
    let dir = TempDir::new().unwrap();
    let bytes = export_dataset(&people(), DataExportFormat::Xlsx).unwrap();
    let path = dir.path().join("people.xlsx");
    write_atomic(&path, &bytes).unwrap();

    let mut workbook = open_workbook_auto(&path).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Data".to_string()]);
    let range = workbook.worksheet_range("Data").unwrap();
    assert_eq!(range.get_value((0, 0)), Some(&Data::String("age".to_string())));
    assert_eq!(range.get_value((1, 0)), Some(&Data::Float(25.0)));
    assert_eq!(range.get_value((2, 1)), Some(&Data::String("NY".to_string())));

    let loaded = load_path(&path, &LoadOptions::default()).unwrap();
    assert_eq!(loaded, people());
    assert_eq!(loaded.rows()[2].get(0), &Cell::Absent);
}

#[test]
fn test_chart_image_requires_live_handle() {
    let (mut dashboard, _journal) = recording_dashboard();
    dashboard.load(people());

    let err = export_chart_image(dashboard.registry(), "age", ChartImageFormat::Png).unwrap_err();
    assert!(matches!(err, ExportError::NoChart(ref c) if c == "age"));

    dashboard.build().unwrap();
    let png = export_chart_image(dashboard.registry(), "age", ChartImageFormat::Png).unwrap();
    assert_eq!(png, b"png");
    let eps = export_chart_image(dashboard.registry(), "city", ChartImageFormat::Eps).unwrap();
    assert_eq!(eps, b"eps");
}

#[test]
fn test_dashboard_image_without_charts_is_empty() {
    let (mut dashboard, _journal) = recording_dashboard();
    dashboard.load(people());
    dashboard.build().unwrap();
    dashboard.resize(0, 0);

    let err = export_dashboard_image(&dashboard, DashboardImageOptions::default()).unwrap_err();
    assert!(matches!(err, ExportError::EmptyDashboard));
}

#[test]
fn test_plotters_chart_exports_eps() {
    let mut config = AppConfig::default();
    config.chart.width = 320;
    config.chart.height = 240;
    let mut dashboard = Dashboard::with_plotters(&config).unwrap();
    dashboard.load(people());
    let reports = dashboard.build().unwrap();

    // Text drawing needs a system font; without one the plotters backend reports an error.
    let Some(report) = reports.iter().find(|r| r.is_rendered()) else {
        for report in &reports {
            assert!(matches!(
                report.outcome,
                Err(coldash::ColumnError::Render(RenderError::Backend(_)))
            ));
        }
        return;
    };

    let eps = export_chart_image(dashboard.registry(), &report.column, ChartImageFormat::Eps)
        .unwrap();
    let eps = String::from_utf8(eps).unwrap();
    assert!(eps.starts_with("%!PS-Adobe-3.0 EPSF-3.0"));
    assert!(eps.contains("%%BoundingBox: 0 0 160 120"));

    let png = export_dashboard_image(&dashboard, DashboardImageOptions::default()).unwrap();
    assert_eq!(&png[1..4], b"PNG");
}

#[test]
fn test_write_atomic_replaces_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.csv");

    write_atomic(&path, b"first").unwrap();
    write_atomic(&path, b"second").unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"second");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_write_atomic_into_missing_directory_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("out.csv");

    assert!(matches!(
        write_atomic(&path, b"data"),
        Err(ExportError::Io(_))
    ));
    assert!(!path.exists());
}
