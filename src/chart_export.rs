//! Export: single chart images (PNG or EPS), the whole dashboard as one PNG, and the
//! dataset as CSV, JSON or an xlsx workbook.

use polars::prelude::*;
use std::io::Write;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::{DrawingArea, DrawingBackend, IntoFont, RGBColor, Text};
use rust_xlsxwriter::{Workbook, XlsxError};

use coldash_cli::{ChartImageFormat, DataExportFormat};

use crate::dashboard::Dashboard;
use crate::dataset::{Cell, Dataset};
use crate::error::ExportError;
use crate::lifecycle::ChartRegistry;
use crate::render::{draw_chart, encode_png, Theme};

const FONT: &str = "sans-serif";
/// Title strip height at scale 1.
const TITLE_HEIGHT: u32 = 28;
const CONTROLS_HEIGHT: u32 = 22;
const PANEL_HEIGHT: u32 = 24;
const XLSX_SHEET: &str = "Data";

pub fn extension(format: ChartImageFormat) -> &'static str {
    match format {
        ChartImageFormat::Png => "png",
        ChartImageFormat::Eps => "eps",
    }
}

pub fn data_extension(format: DataExportFormat) -> &'static str {
    match format {
        DataExportFormat::Csv => "csv",
        DataExportFormat::Json => "json",
        DataExportFormat::Xlsx => "xlsx",
    }
}

/// Image of the live chart for `column`.
pub fn export_chart_image(
    registry: &ChartRegistry,
    column: &str,
    format: ChartImageFormat,
) -> Result<Vec<u8>, ExportError> {
    let handle = registry
        .get(column)
        .filter(|h| h.instance().is_live())
        .ok_or_else(|| ExportError::NoChart(column.to_string()))?;
    let bytes = match format {
        ChartImageFormat::Png => handle.instance().to_png(),
        ChartImageFormat::Eps => handle.instance().to_eps(),
    }
    .map_err(|e| ExportError::Render(e.to_string()))?;
    tracing::info!(column, format = extension(format), bytes = bytes.len(), "exported chart");
    Ok(bytes)
}

/// Options for [`export_dashboard_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardImageOptions {
    /// Leave out the chart-kind control strip above each chart.
    pub exclude_controls: bool,
    pub scale: u32,
}

impl Default for DashboardImageOptions {
    fn default() -> Self {
        Self {
            exclude_controls: true,
            scale: 2,
        }
    }
}

/// One PNG with every live chart laid out on the dashboard grid, each with its title and
/// side panel text.
pub fn export_dashboard_image(
    dashboard: &Dashboard,
    options: DashboardImageOptions,
) -> Result<Vec<u8>, ExportError> {
    let registry = dashboard.registry();
    let tiles: Vec<&str> = dashboard
        .selected_columns()
        .iter()
        .map(String::as_str)
        .filter(|c| registry.get(c).is_some())
        .collect();
    if tiles.is_empty() {
        return Err(ExportError::EmptyDashboard);
    }

    let scale = options.scale.max(1);
    let cols = dashboard.grid_columns().min(tiles.len() as u32).max(1);
    let rows = (tiles.len() as u32).div_ceil(cols);
    let (tile_w, chart_h) = dashboard.tile_size();
    let chrome = TITLE_HEIGHT
        + PANEL_HEIGHT
        + if options.exclude_controls {
            0
        } else {
            CONTROLS_HEIGHT
        };
    let tile_h = chart_h + chrome;
    let width = tile_w * cols * scale;
    let height = tile_h * rows * scale;
    let theme = dashboard.theme();

    let bytes = encode_png(width, height, |root| {
        root.fill(&rgb(theme.background)).map_err(render_err)?;
        let areas = root.split_evenly((rows as usize, cols as usize));
        for (column, area) in tiles.iter().zip(areas.iter()) {
            let Some(handle) = registry.get(column) else {
                continue;
            };
            let kind = handle.spec().kind;
            let panel = dashboard
                .report(column)
                .and_then(|r| r.panel_text())
                .unwrap_or_default();
            draw_tile(
                area,
                column,
                &format!("Chart: {}", kind),
                &panel,
                handle.spec(),
                &theme,
                scale,
                !options.exclude_controls,
            )?;
        }
        Ok(())
    })
    .map_err(|e| ExportError::Render(e.to_string()))?;
    tracing::info!(charts = tiles.len(), width, height, "exported dashboard image");
    Ok(bytes)
}

fn rgb(c: crate::palette::Rgba) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

fn render_err(err: impl std::fmt::Display) -> crate::error::RenderError {
    crate::error::RenderError::Backend(err.to_string())
}

#[allow(clippy::too_many_arguments)]
fn draw_tile<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    title: &str,
    controls: &str,
    panel: &str,
    spec: &crate::chart::ChartSpec,
    theme: &Theme,
    scale: u32,
    show_controls: bool,
) -> Result<(), crate::error::RenderError> {
    let fg = rgb(theme.foreground);
    let title_style = (FONT, 16 * scale).into_font().color(&fg);
    let text_style = (FONT, 12 * scale).into_font().color(&fg);
    let pad = 6 * scale as i32;

    let (_, tile_h) = area.dim_in_pixel();
    let (title_area, rest) = area.split_vertically((TITLE_HEIGHT * scale) as i32);
    title_area
        .draw(&Text::new(title, (pad, pad), title_style))
        .map_err(render_err)?;

    let rest = if show_controls {
        let (controls_area, rest) = rest.split_vertically((CONTROLS_HEIGHT * scale) as i32);
        controls_area
            .draw(&Text::new(controls, (pad, 2 * scale as i32), text_style.clone()))
            .map_err(render_err)?;
        rest
    } else {
        rest
    };

    let (_, rest_h) = rest.dim_in_pixel();
    let chart_h = rest_h.saturating_sub(PANEL_HEIGHT * scale).min(tile_h);
    let (chart_area, panel_area) = rest.split_vertically(chart_h as i32);
    draw_chart(&chart_area, spec, theme)?;
    if !panel.is_empty() {
        panel_area
            .draw(&Text::new(panel, (pad, 4 * scale as i32), text_style))
            .map_err(render_err)?;
    }
    Ok(())
}

/// Dataset as a polars frame: columns holding only numbers (or nothing) are Float64,
/// everything else is String. Absent cells are nulls.
fn dataset_frame(dataset: &Dataset) -> Result<DataFrame, ExportError> {
    let columns: Vec<Column> = dataset
        .headers()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let cells = dataset.rows().iter().map(|r| r.get(i));
            let numeric = cells
                .clone()
                .all(|c| matches!(c, Cell::Number(_) | Cell::Absent));
            if numeric {
                let values: Vec<Option<f64>> = cells
                    .map(|c| match c {
                        Cell::Number(n) => Some(*n),
                        _ => None,
                    })
                    .collect();
                Series::new(name.as_str().into(), values).into()
            } else {
                let values: Vec<Option<String>> = cells
                    .map(|c| match c {
                        Cell::Absent => None,
                        other => Some(other.display()),
                    })
                    .collect();
                Series::new(name.as_str().into(), values).into()
            }
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Workbook with one "Data" sheet: the header row, then numbers as numeric cells and
/// text as strings. Absent cells stay blank.
fn dataset_workbook(dataset: &Dataset) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(XLSX_SHEET)?;
    for (col, header) in dataset.headers().iter().enumerate() {
        sheet.write_string(0, col as u16, header)?;
    }
    for (i, row) in dataset.rows().iter().enumerate() {
        let r = i as u32 + 1;
        for col in 0..dataset.column_count() {
            match row.get(col) {
                Cell::Number(n) => {
                    sheet.write_number(r, col as u16, *n)?;
                }
                Cell::Text(s) => {
                    sheet.write_string(r, col as u16, s)?;
                }
                Cell::Absent => {}
            }
        }
    }
    workbook.save_to_buffer()
}

/// Dataset encoded as CSV (with header), a JSON array of records, or an xlsx workbook.
pub fn export_dataset(dataset: &Dataset, format: DataExportFormat) -> Result<Vec<u8>, ExportError> {
    let out = match format {
        DataExportFormat::Csv => {
            let mut df = dataset_frame(dataset)?;
            let mut out = Vec::new();
            CsvWriter::new(&mut out)
                .include_header(true)
                .finish(&mut df)?;
            out
        }
        DataExportFormat::Json => {
            let mut df = dataset_frame(dataset)?;
            let mut out = Vec::new();
            JsonWriter::new(&mut out)
                .with_json_format(JsonFormat::Json)
                .finish(&mut df)?;
            out
        }
        DataExportFormat::Xlsx => {
            dataset_workbook(dataset).map_err(|e| ExportError::Encode(e.to_string()))?
        }
    };
    tracing::info!(
        rows = dataset.row_count(),
        format = data_extension(format),
        bytes = out.len(),
        "exported dataset"
    );
    Ok(out)
}

/// Writes `bytes` to `path` via a temporary file in the same directory, so a failed write
/// leaves nothing behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| ExportError::from(e.error))?;
    Ok(())
}
