use coldash::error::{ColumnError, DashboardError, NoDataError, RenderError};
use coldash::render::ThemeMode;
use coldash::{AppConfig, Cell, ChartKind, ColumnKind, Dashboard, Dataset, HandleState};
use std::rc::Rc;

mod common;
use common::{people, recording_dashboard, RecordingBackend, SharedJournal};

fn take_events(journal: &SharedJournal) -> Vec<String> {
    std::mem::take(&mut journal.borrow_mut().events)
}

#[test]
fn test_load_selects_every_column_without_rendering() {
    let (mut dashboard, journal) = recording_dashboard();
    dashboard.load(people());

    assert_eq!(dashboard.selected_columns(), ["age", "city"]);
    assert!(!dashboard.is_built());
    assert!(journal.borrow().events.is_empty());
    assert!(dashboard.reports().is_empty());
    assert_eq!(
        dashboard.set_chart_kind("age", ChartKind::Pie).unwrap_err(),
        DashboardError::NotSelected("age".to_string())
    );
}

#[test]
fn test_build_renders_selected_columns_in_order() {
    let (mut dashboard, journal) = recording_dashboard();
    dashboard.load(people());
    let reports = dashboard.build().unwrap();

    assert_eq!(
        take_events(&journal),
        vec![
            "create age bar light 600x450",
            "create city bar light 600x450"
        ]
    );
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.is_rendered()));
    assert_eq!(reports[0].column_kind, ColumnKind::Numerical);
    assert_eq!(reports[1].column_kind, ColumnKind::Categorical);
    assert_eq!(dashboard.registry().state("age"), HandleState::Rendered);
}

#[test]
fn test_stats_for_age_and_city() {
    let (mut dashboard, _journal) = recording_dashboard();
    dashboard.load(people());
    dashboard.build().unwrap();

    let stats = dashboard.stats_summary("age").unwrap();
    assert_eq!(stats.mean, 27.5);
    assert_eq!(stats.median, 27.5);
    assert_eq!(stats.min, 25.0);
    assert_eq!(stats.max, 30.0);
    assert_eq!(
        dashboard.stats_summary("city").unwrap_err(),
        NoDataError::NotNumerical
    );

    let age = dashboard.report("age").unwrap();
    assert_eq!(
        age.panel_text().as_deref(),
        Some("Mean: 27.50 | Median: 27.50 | Min: 25.00 | Max: 30.00")
    );
    assert_eq!(dashboard.report("city").unwrap().panel_text(), None);

    let spec = dashboard.registry().get("city").unwrap().spec();
    assert_eq!(spec.labels, vec!["NY", "LA"]);
    assert_eq!(spec.values, vec![2.0, 1.0]);
}

#[test]
fn test_chart_kind_change_replaces_only_that_column() {
    let (mut dashboard, journal) = recording_dashboard();
    dashboard.load(people());
    dashboard.build().unwrap();
    take_events(&journal);

    let report = dashboard.set_chart_kind("city", ChartKind::Doughnut).unwrap();
    assert!(report.is_rendered());
    assert_eq!(report.chart_kind, ChartKind::Doughnut);
    assert_eq!(
        take_events(&journal),
        vec!["destroy city", "create city doughnut light 600x450"]
    );
    assert_eq!(dashboard.chart_kind("city"), ChartKind::Doughnut);
    assert_eq!(dashboard.chart_kind("age"), ChartKind::Bar);
}

#[test]
fn test_repeated_rerenders_keep_one_live_instance_per_column() {
    let (mut dashboard, journal) = recording_dashboard();
    dashboard.load(people());
    dashboard.build().unwrap();

    let mut last_generation = 0;
    for round in 0..20 {
        let kind = ChartKind::ALL[round % ChartKind::ALL.len()];
        let report = dashboard.set_chart_kind("age", kind).unwrap();
        let generation = *report.outcome.as_ref().unwrap();
        assert!(generation > last_generation);
        last_generation = generation;
        dashboard.toggle_theme();
        assert_eq!(journal.borrow().live, 2);
        assert_eq!(dashboard.registry().live_count(), 2);
    }
}

#[test]
fn test_render_failure_is_isolated_to_its_column() {
    let journal = SharedJournal::default();
    let backend = RecordingBackend::new(Rc::clone(&journal)).failing_on("age");
    let mut dashboard = Dashboard::new(&AppConfig::default(), Box::new(backend)).unwrap();
    dashboard.load(people());
    let reports = dashboard.build().unwrap();

    assert_eq!(
        reports[0].outcome,
        Err(ColumnError::Render(RenderError::Backend(
            "canvas unavailable".to_string()
        )))
    );
    assert_eq!(
        reports[0].panel_text().as_deref(),
        Some("Error rendering chart: canvas unavailable")
    );
    assert!(reports[1].is_rendered());
    assert_eq!(dashboard.registry().state("age"), HandleState::Absent);
    assert_eq!(dashboard.registry().state("city"), HandleState::Rendered);
    assert_eq!(journal.borrow().live, 1);
}

#[test]
fn test_empty_column_reports_no_data() {
    let (mut dashboard, journal) = recording_dashboard();
    let ds = Dataset::from_records(
        ["blank", "name"],
        vec![
            vec![Cell::Absent, "x".into()],
            vec![Cell::Text(String::new()), "y".into()],
        ],
    )
    .unwrap();
    dashboard.load(ds);
    let reports = dashboard.build().unwrap();

    assert_eq!(
        reports[0].outcome,
        Err(ColumnError::NoData(NoDataError::EmptyColumn))
    );
    assert_eq!(
        reports[0].panel_text().as_deref(),
        Some("No valid data for this column")
    );
    assert_eq!(
        dashboard.stats_summary("blank").unwrap_err(),
        NoDataError::EmptyColumn
    );
    assert_eq!(
        take_events(&journal),
        vec!["create name bar light 600x450"]
    );
}

#[test]
fn test_theme_toggle_rerenders_everything_in_dark() {
    let (mut dashboard, journal) = recording_dashboard();
    dashboard.load(people());
    dashboard.build().unwrap();
    take_events(&journal);

    let reports = dashboard.toggle_theme();
    assert_eq!(reports.len(), 2);
    assert_eq!(dashboard.theme_mode(), ThemeMode::Dark);
    let creates: Vec<String> = take_events(&journal)
        .into_iter()
        .filter(|e| e.starts_with("create"))
        .collect();
    assert_eq!(
        creates,
        vec![
            "create age bar dark 600x450",
            "create city bar dark 600x450"
        ]
    );

    assert!(dashboard.set_theme_mode(ThemeMode::Dark).is_empty());
}

#[test]
fn test_zero_viewport_fails_every_column_then_recovers() {
    let (mut dashboard, journal) = recording_dashboard();
    dashboard.load(people());
    dashboard.build().unwrap();

    let reports = dashboard.resize(0, 0);
    assert_eq!(reports.len(), 2);
    for report in &reports {
        assert!(matches!(
            report.outcome,
            Err(ColumnError::Render(RenderError::EmptyTarget(_)))
        ));
    }
    assert_eq!(journal.borrow().live, 0);
    assert_eq!(dashboard.registry().state("age"), HandleState::Absent);

    let reports = dashboard.resize(800, 600);
    assert!(reports.iter().all(|r| r.is_rendered()));
    assert_eq!(dashboard.tile_size(), (400, 300));
    assert_eq!(journal.borrow().live, 2);
}

#[test]
fn test_fullscreen_uses_viewport_and_toggles_off() {
    let (mut dashboard, journal) = recording_dashboard();
    dashboard.load(people());
    dashboard.build().unwrap();
    take_events(&journal);

    dashboard.toggle_fullscreen("age").unwrap();
    assert_eq!(dashboard.fullscreen_column(), Some("age"));
    assert_eq!(
        take_events(&journal),
        vec!["destroy age", "create age bar light 1200x800"]
    );

    // Another column while one is fullscreen exits the current one.
    dashboard.toggle_fullscreen("city").unwrap();
    assert_eq!(dashboard.fullscreen_column(), None);
    assert_eq!(
        take_events(&journal),
        vec!["destroy age", "create age bar light 600x450"]
    );
}

#[test]
fn test_selection_changes_rebuild_in_header_order() {
    let (mut dashboard, journal) = recording_dashboard();
    dashboard.load(people());
    dashboard.build().unwrap();
    take_events(&journal);

    dashboard.select_columns(&["city"]).unwrap();
    let events = take_events(&journal);
    assert_eq!(events.iter().filter(|e| e.starts_with("destroy")).count(), 2);
    assert_eq!(events.last().unwrap(), "create city bar light 1200x900");
    assert_eq!(dashboard.registry().state("age"), HandleState::Destroyed);

    dashboard.select_columns(&["city", "age"]).unwrap();
    assert_eq!(dashboard.selected_columns(), ["age", "city"]);

    assert_eq!(
        dashboard.select_columns::<&str>(&[]).unwrap_err(),
        DashboardError::EmptySelection
    );
    assert_eq!(
        dashboard.select_columns(&["zip"]).unwrap_err(),
        DashboardError::UnknownColumn("zip".to_string())
    );
}

#[test]
fn test_teardown_releases_everything() {
    let (mut dashboard, journal) = recording_dashboard();
    dashboard.load(people());
    dashboard.build().unwrap();
    assert_eq!(journal.borrow().live, 2);

    dashboard.teardown();
    assert_eq!(journal.borrow().live, 0);
    assert!(dashboard.dataset().is_none());
    assert_eq!(dashboard.build().unwrap_err(), DashboardError::NoDataset);
}

#[test]
fn test_loading_a_new_dataset_releases_old_charts() {
    let (mut dashboard, journal) = recording_dashboard();
    dashboard.load(people());
    dashboard.build().unwrap();

    let ds = Dataset::from_records(["n"], vec![vec![Cell::Number(1.0)]]).unwrap();
    dashboard.load(ds);
    assert_eq!(journal.borrow().live, 0);
    assert_eq!(dashboard.registry().state("age"), HandleState::Absent);
    assert_eq!(dashboard.selected_columns(), ["n"]);
}
