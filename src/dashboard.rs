//! The dashboard context: the loaded dataset, the column selection, per-column chart kinds,
//! view state (theme, viewport, fullscreen) and the chart registry.
//!
//! Every view change is a render trigger. Triggers are processed synchronously, one column
//! at a time in selected-column order, and each column's outcome is reported on its own.

use std::collections::HashMap;

use color_eyre::Result;
use tracing::{debug, info};

use crate::chart::{ChartKind, ChartSpec};
use crate::chart_data::{aggregate, numeric_sample};
use crate::classify::{classify, ColumnKind};
use crate::config::AppConfig;
use crate::dataset::Dataset;
use crate::error::{ColumnError, DashboardError, NoDataError};
use crate::lifecycle::{ChartHandle, ChartRegistry};
use crate::render::{ChartBackend, PlottersBackend, RenderTarget, Theme, ThemeMode};
use crate::statistics::{compute_stats, Stats};

/// Tile height as a fraction of tile width.
const TILE_ASPECT: (u32, u32) = (3, 4);

/// What caused a re-render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTrigger {
    Selection,
    ChartKind,
    Theme,
    Resize,
    Fullscreen,
}

/// Outcome of rendering one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnReport {
    pub column: String,
    pub column_kind: ColumnKind,
    pub chart_kind: ChartKind,
    /// Generation of the new chart handle, or why there is none.
    pub outcome: Result<u64, ColumnError>,
    pub stats: Option<Stats>,
}

impl ColumnReport {
    pub fn is_rendered(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Side panel text: the failure message, or the stats line for numerical columns.
    /// Categorical columns that rendered have no panel.
    pub fn panel_text(&self) -> Option<String> {
        match &self.outcome {
            Err(err) => Some(err.to_string()),
            Ok(_) => self.stats.as_ref().map(Stats::summary_line),
        }
    }
}

/// Stats for the side panel. Categorical columns never have stats.
pub fn stats_summary(dataset: &Dataset, column: &str) -> Result<Stats, NoDataError> {
    if dataset.sample(column).is_empty() {
        return Err(NoDataError::EmptyColumn);
    }
    if classify(dataset, column) == ColumnKind::Categorical {
        return Err(NoDataError::NotNumerical);
    }
    compute_stats(&numeric_sample(dataset, column)).ok_or(NoDataError::NoNumericValues)
}

fn render_column(
    registry: &mut ChartRegistry,
    dataset: &Dataset,
    column: &str,
    chart_kind: ChartKind,
    target: &RenderTarget,
    theme: &Theme,
) -> ColumnReport {
    let column_kind = classify(dataset, column);
    let outcome = match aggregate(dataset, column, column_kind) {
        Ok(series) => {
            let spec = ChartSpec::build(column, chart_kind, &series);
            registry
                .replace(column, target, &spec, theme)
                .map(ChartHandle::generation)
                .map_err(ColumnError::from)
        }
        Err(no_data) => {
            registry.release(column);
            Err(no_data.into())
        }
    };
    ColumnReport {
        column: column.to_string(),
        column_kind,
        chart_kind,
        outcome,
        stats: stats_summary(dataset, column).ok(),
    }
}

pub struct Dashboard {
    dataset: Option<Dataset>,
    selected: Vec<String>,
    built: bool,
    kinds: HashMap<String, ChartKind>,
    default_kind: ChartKind,
    theme_mode: ThemeMode,
    light: Theme,
    dark: Theme,
    viewport: (u32, u32),
    grid_columns: u32,
    fullscreen: Option<String>,
    reports: HashMap<String, ColumnReport>,
    registry: ChartRegistry,
}

impl Dashboard {
    pub fn new(config: &AppConfig, backend: Box<dyn ChartBackend>) -> Result<Self> {
        Ok(Self {
            dataset: None,
            selected: Vec::new(),
            built: false,
            kinds: HashMap::new(),
            default_kind: config.chart.kind(),
            theme_mode: config.theme.initial_mode(),
            light: config.theme.theme(ThemeMode::Light)?,
            dark: config.theme.theme(ThemeMode::Dark)?,
            viewport: (config.chart.width, config.chart.height),
            grid_columns: config.chart.grid_columns.max(1),
            fullscreen: None,
            reports: HashMap::new(),
            registry: ChartRegistry::new(backend),
        })
    }

    /// Dashboard drawing with [`PlottersBackend`].
    pub fn with_plotters(config: &AppConfig) -> Result<Self> {
        Self::new(config, Box::new(PlottersBackend))
    }

    /// Replaces the dataset wholesale. Existing charts are released and every column is
    /// pre-selected; nothing is rendered until [`Dashboard::build`] or
    /// [`Dashboard::select_columns`].
    pub fn load(&mut self, dataset: Dataset) {
        info!(
            rows = dataset.row_count(),
            columns = dataset.column_count(),
            "dataset loaded"
        );
        self.registry.release_all();
        self.registry.forget_released();
        self.selected = dataset.headers().to_vec();
        self.dataset = Some(dataset);
        self.built = false;
        self.kinds.clear();
        self.fullscreen = None;
        self.reports.clear();
    }

    /// Selects `columns` (shown in header order) and rebuilds the dashboard.
    pub fn select_columns<S: AsRef<str>>(
        &mut self,
        columns: &[S],
    ) -> Result<Vec<ColumnReport>, DashboardError> {
        let dataset = self.dataset.as_ref().ok_or(DashboardError::NoDataset)?;
        if columns.is_empty() {
            return Err(DashboardError::EmptySelection);
        }
        if let Some(unknown) = columns.iter().find(|c| !dataset.has_column(c.as_ref())) {
            return Err(DashboardError::UnknownColumn(unknown.as_ref().to_string()));
        }
        self.selected = dataset
            .headers()
            .iter()
            .filter(|h| columns.iter().any(|c| c.as_ref() == h.as_str()))
            .cloned()
            .collect();
        self.build()
    }

    /// Rebuilds the dashboard from the current selection: every chart is released, then
    /// each selected column is rendered with the default chart kind.
    pub fn build(&mut self) -> Result<Vec<ColumnReport>, DashboardError> {
        if self.dataset.is_none() {
            return Err(DashboardError::NoDataset);
        }
        if self.selected.is_empty() {
            return Err(DashboardError::EmptySelection);
        }
        self.registry.release_all();
        self.kinds.clear();
        self.fullscreen = None;
        self.reports.clear();
        self.built = true;
        let columns = self.selected.clone();
        Ok(self.on_render_trigger(RenderTrigger::Selection, &columns))
    }

    pub fn set_chart_kind(
        &mut self,
        column: &str,
        kind: ChartKind,
    ) -> Result<ColumnReport, DashboardError> {
        self.ensure_on_dashboard(column)?;
        self.kinds.insert(column.to_string(), kind);
        let columns = [column.to_string()];
        self.on_render_trigger(RenderTrigger::ChartKind, &columns)
            .pop()
            .ok_or_else(|| DashboardError::NotSelected(column.to_string()))
    }

    /// Chart kind used for columns without an explicit choice.
    pub fn set_default_kind(&mut self, kind: ChartKind) {
        self.default_kind = kind;
    }

    pub fn toggle_theme(&mut self) -> Vec<ColumnReport> {
        self.set_theme_mode(self.theme_mode.toggled())
    }

    /// Switches the theme; re-renders every chart when it changes.
    pub fn set_theme_mode(&mut self, mode: ThemeMode) -> Vec<ColumnReport> {
        if mode == self.theme_mode {
            return Vec::new();
        }
        self.theme_mode = mode;
        let columns = self.selected.clone();
        self.on_render_trigger(RenderTrigger::Theme, &columns)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Vec<ColumnReport> {
        self.viewport = (width, height);
        let columns = self.selected.clone();
        self.on_render_trigger(RenderTrigger::Resize, &columns)
    }

    /// Enters fullscreen for `column`, or exits fullscreen if any column already is.
    pub fn toggle_fullscreen(&mut self, column: &str) -> Result<Vec<ColumnReport>, DashboardError> {
        self.ensure_on_dashboard(column)?;
        let affected = match self.fullscreen.take() {
            Some(current) => current,
            None => {
                self.fullscreen = Some(column.to_string());
                column.to_string()
            }
        };
        Ok(self.on_render_trigger(RenderTrigger::Fullscreen, &[affected]))
    }

    /// Re-renders `affected` columns that are on the dashboard, in selected-column order.
    pub fn on_render_trigger(
        &mut self,
        cause: RenderTrigger,
        affected: &[String],
    ) -> Vec<ColumnReport> {
        let Some(dataset) = self.dataset.as_ref() else {
            return Vec::new();
        };
        if !self.built {
            return Vec::new();
        }
        let order: Vec<String> = self
            .selected
            .iter()
            .filter(|c| affected.contains(c))
            .cloned()
            .collect();
        debug!(?cause, columns = order.len(), "render trigger");

        let theme = match self.theme_mode {
            ThemeMode::Light => self.light,
            ThemeMode::Dark => self.dark,
        };
        let mut reports = Vec::with_capacity(order.len());
        for column in &order {
            let (width, height) = self.target_size(column);
            let target = RenderTarget::for_column(column, width, height);
            let kind = self.kinds.get(column).copied().unwrap_or(self.default_kind);
            let report = render_column(&mut self.registry, dataset, column, kind, &target, &theme);
            self.reports.insert(column.clone(), report.clone());
            reports.push(report);
        }
        reports
    }

    /// Releases every chart and drops the dataset.
    pub fn teardown(&mut self) {
        self.registry.release_all();
        self.dataset = None;
        self.selected.clear();
        self.built = false;
        self.kinds.clear();
        self.fullscreen = None;
        self.reports.clear();
        info!("dashboard torn down");
    }

    pub fn stats_summary(&self, column: &str) -> Result<Stats, NoDataError> {
        match &self.dataset {
            Some(dataset) => stats_summary(dataset, column),
            None => Err(NoDataError::EmptyColumn),
        }
    }

    fn ensure_on_dashboard(&self, column: &str) -> Result<(), DashboardError> {
        let dataset = self.dataset.as_ref().ok_or(DashboardError::NoDataset)?;
        if !dataset.has_column(column) {
            return Err(DashboardError::UnknownColumn(column.to_string()));
        }
        if !self.built || !self.selected.iter().any(|c| c == column) {
            return Err(DashboardError::NotSelected(column.to_string()));
        }
        Ok(())
    }

    /// Size of one grid tile: the viewport width split across the grid columns.
    pub fn tile_size(&self) -> (u32, u32) {
        let n = (self.selected.len() as u32).max(1);
        let cols = self.grid_columns.min(n);
        let width = self.viewport.0 / cols;
        (width, width * TILE_ASPECT.0 / TILE_ASPECT.1)
    }

    fn target_size(&self, column: &str) -> (u32, u32) {
        if self.fullscreen.as_deref() == Some(column) {
            self.viewport
        } else {
            self.tile_size()
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn selected_columns(&self) -> &[String] {
        &self.selected
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn chart_kind(&self, column: &str) -> ChartKind {
        self.kinds.get(column).copied().unwrap_or(self.default_kind)
    }

    pub fn theme_mode(&self) -> ThemeMode {
        self.theme_mode
    }

    pub fn theme(&self) -> Theme {
        match self.theme_mode {
            ThemeMode::Light => self.light,
            ThemeMode::Dark => self.dark,
        }
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn grid_columns(&self) -> u32 {
        self.grid_columns
    }

    pub fn fullscreen_column(&self) -> Option<&str> {
        self.fullscreen.as_deref()
    }

    pub fn registry(&self) -> &ChartRegistry {
        &self.registry
    }

    /// Latest report for each column on the dashboard, in selected-column order.
    pub fn reports(&self) -> Vec<&ColumnReport> {
        if !self.built {
            return Vec::new();
        }
        self.selected
            .iter()
            .filter_map(|c| self.reports.get(c))
            .collect()
    }

    pub fn report(&self, column: &str) -> Option<&ColumnReport> {
        self.reports.get(column)
    }
}
