//! Chart backend drawing with plotters into an in-memory RGB raster.

use plotters::coord::Shift;
use plotters::element::Pie;
use plotters::prelude::*;

use super::{eps, ChartBackend, ChartInstance, RenderTarget, Theme};
use crate::chart::{ChartKind, ChartSpec};
use crate::error::RenderError;
use crate::palette::Rgba;

const FONT: &str = "sans-serif";
const LABEL_SIZE: u32 = 12;
/// Headroom above the tallest bar or point.
const AXIS_HEADROOM: f64 = 1.1;

fn rgb(c: Rgba) -> RGBColor {
    RGBColor(c.r, c.g, c.b)
}

fn backend_err(err: impl std::fmt::Display) -> RenderError {
    RenderError::Backend(err.to_string())
}

/// Fill colors pre-blended onto the theme background (the bitmap and EPS outputs have no alpha).
fn fill_colors(spec: &ChartSpec, theme: &Theme) -> Vec<RGBColor> {
    spec.colors
        .iter()
        .map(|c| rgb(c.fill.over(theme.background)))
        .collect()
}

fn axis_top(max_value: f64) -> f64 {
    if max_value > 0.0 {
        max_value * AXIS_HEADROOM
    } else {
        1.0
    }
}

/// Draws `spec` onto `area`. Shared by live rendering, PNG export and dashboard composition.
pub fn draw_chart<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    theme: &Theme,
) -> Result<(), RenderError> {
    area.fill(&rgb(theme.background)).map_err(backend_err)?;
    if spec.values.is_empty() {
        return Ok(());
    }
    match spec.kind {
        ChartKind::Bar | ChartKind::Line => draw_cartesian(area, spec, theme),
        ChartKind::Pie | ChartKind::Doughnut => draw_proportional(area, spec, theme),
    }
}

fn draw_cartesian<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    theme: &Theme,
) -> Result<(), RenderError> {
    let fg = rgb(theme.foreground);
    let grid = rgb(theme.grid);
    let n = spec.values.len() as u32;
    let begin = match spec.value_axis {
        Some(axis) if axis.begin_at_zero => 0.0,
        _ => spec.values.iter().copied().fold(0.0, f64::min),
    };
    let top = axis_top(spec.max_value());

    // Integer ranges are inclusive in plotters, so n segments span 0..=n-1.
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d((0u32..n - 1).into_segmented(), begin..top)
        .map_err(backend_err)?;

    let labels = &spec.labels;
    let label_for = |v: &SegmentValue<u32>| match v {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&label_for)
        .axis_style(fg)
        .light_line_style(grid)
        .bold_line_style(grid)
        .label_style((FONT, LABEL_SIZE).into_font().color(&fg))
        .draw()
        .map_err(backend_err)?;

    let fills = fill_colors(spec, theme);
    match spec.kind {
        ChartKind::Line => {
            let points: Vec<(SegmentValue<u32>, f64)> = spec
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| (SegmentValue::CenterOf(i as u32), *v))
                .collect();
            let stroke = spec
                .colors
                .first()
                .map(|c| rgb(c.border))
                .unwrap_or(fg);
            chart
                .draw_series(LineSeries::new(points.clone(), stroke.stroke_width(2)))
                .map_err(backend_err)?;
            chart
                .draw_series(
                    points
                        .into_iter()
                        .zip(&fills)
                        .map(|(p, fill)| Circle::new(p, 4, fill.filled())),
                )
                .map_err(backend_err)?;
        }
        _ => {
            let bars = spec.values.iter().enumerate().map(|(i, v)| {
                let i = i as u32;
                let next = if i + 1 < n {
                    SegmentValue::Exact(i + 1)
                } else {
                    SegmentValue::Last
                };
                let mut bar = Rectangle::new(
                    [(SegmentValue::Exact(i), begin), (next, *v)],
                    fills[i as usize].filled(),
                );
                bar.set_margin(0, 0, 4, 4);
                bar
            });
            chart.draw_series(bars).map_err(backend_err)?;
        }
    }
    Ok(())
}

fn draw_proportional<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    theme: &Theme,
) -> Result<(), RenderError> {
    let (width, _) = area.dim_in_pixel();
    let legend_width = if spec.show_legend {
        (width as i32 / 3).min(200)
    } else {
        0
    };
    let (pie_area, legend_area) = area.split_horizontally(width as i32 - legend_width);

    let (pw, ph) = pie_area.dim_in_pixel();
    let center = (pw as i32 / 2, ph as i32 / 2);
    let radius = (pw.min(ph) as f64 / 2.0 - 10.0).max(1.0);
    let fills = fill_colors(spec, theme);
    // Slice labels are left blank; names go in the legend.
    let blank: Vec<String> = vec![String::new(); spec.values.len()];

    let mut pie = Pie::new(&center, &radius, &spec.values, &fills, &blank);
    pie.start_angle(-90.0);
    if spec.kind == ChartKind::Doughnut {
        pie.donut_hole(radius * 0.5);
    }
    pie_area.draw(&pie).map_err(backend_err)?;

    if spec.show_legend {
        draw_legend(&legend_area, spec, &fills, theme)?;
    }
    Ok(())
}

fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    fills: &[RGBColor],
    theme: &Theme,
) -> Result<(), RenderError> {
    let fg = rgb(theme.foreground);
    let style = (FONT, LABEL_SIZE).into_font().color(&fg);
    for (i, (label, fill)) in spec.labels.iter().zip(fills).enumerate() {
        let y = 10 + i as i32 * 18;
        area.draw(&Rectangle::new([(4, y), (16, y + 12)], fill.filled()))
            .map_err(backend_err)?;
        area.draw(&Text::new(label.as_str(), (22, y), style.clone()))
            .map_err(backend_err)?;
    }
    Ok(())
}

/// Renders into a temporary `.png` file and returns the encoded bytes.
pub fn encode_png<F>(width: u32, height: u32, draw: F) -> Result<Vec<u8>, RenderError>
where
    F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<(), RenderError>,
{
    if width == 0 || height == 0 {
        return Err(RenderError::EmptyTarget(format!("{}x{}", width, height)));
    }
    let file = tempfile::Builder::new()
        .prefix("coldash-")
        .suffix(".png")
        .tempfile()
        .map_err(backend_err)?;
    {
        let root = BitMapBackend::new(file.path(), (width, height)).into_drawing_area();
        draw(&root)?;
        root.present().map_err(backend_err)?;
    }
    std::fs::read(file.path()).map_err(backend_err)
}

/// Backend that rasterizes charts with plotters.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlottersBackend;

impl ChartBackend for PlottersBackend {
    fn create(
        &mut self,
        target: &RenderTarget,
        spec: &ChartSpec,
        theme: &Theme,
    ) -> Result<Box<dyn ChartInstance>, RenderError> {
        if target.is_empty() {
            return Err(RenderError::EmptyTarget(target.id.clone()));
        }
        let mut canvas = vec![0u8; target.width as usize * target.height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut canvas, (target.width, target.height))
                .into_drawing_area();
            draw_chart(&root, spec, theme)?;
            root.present().map_err(backend_err)?;
        }
        Ok(Box::new(PlottersChart {
            target: target.clone(),
            spec: spec.clone(),
            theme: *theme,
            canvas,
            live: true,
        }))
    }
}

struct PlottersChart {
    target: RenderTarget,
    spec: ChartSpec,
    theme: Theme,
    canvas: Vec<u8>,
    live: bool,
}

impl PlottersChart {
    fn ensure_live(&self) -> Result<(), RenderError> {
        if self.live {
            Ok(())
        } else {
            Err(RenderError::Backend(format!(
                "chart on '{}' has been destroyed",
                self.target.id
            )))
        }
    }
}

impl ChartInstance for PlottersChart {
    fn target_id(&self) -> &str {
        &self.target.id
    }

    fn spec(&self) -> &ChartSpec {
        &self.spec
    }

    fn size(&self) -> (u32, u32) {
        (self.target.width, self.target.height)
    }

    fn destroy(&mut self) {
        self.canvas = Vec::new();
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn raster(&self) -> Option<&[u8]> {
        self.live.then_some(self.canvas.as_slice())
    }

    fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        self.ensure_live()?;
        encode_png(self.target.width, self.target.height, |root| {
            draw_chart(root, &self.spec, &self.theme)
        })
    }

    fn to_eps(&self) -> Result<Vec<u8>, RenderError> {
        self.ensure_live()?;
        let mut out = Vec::new();
        eps::write_chart_eps(
            &mut out,
            &self.spec,
            &self.theme,
            self.target.width,
            self.target.height,
        )
        .map_err(backend_err)?;
        Ok(out)
    }
}
