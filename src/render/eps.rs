//! Chart output as Encapsulated PostScript.

use std::io::{self, Write};

use super::Theme;
use crate::chart::ChartSpec;
use crate::palette::Rgba;

const MARGIN_LEFT: f64 = 50.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 40.0;
const MARGIN_TOP: f64 = 20.0;
const MAX_TICKS: usize = 8;
const CHAR_W: f64 = 5.0;

/// Escape a string for PostScript ( and ) and \.
fn ps_escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// "Nice" tick values in [min, max] with roughly max_ticks steps.
fn nice_ticks(min: f64, max: f64, max_ticks: usize) -> Vec<f64> {
    let range = if max > min { max - min } else { 1.0 };
    if max_ticks == 0 {
        return vec![min];
    }
    let raw_step = range / max_ticks as f64;
    let mag = 10.0_f64.powf(raw_step.log10().floor());
    let norm = raw_step / mag;
    let step = if norm <= 1.0 {
        mag
    } else if norm <= 2.0 {
        2.0 * mag
    } else if norm <= 5.0 {
        5.0 * mag
    } else {
        10.0 * mag
    };
    let step = step.max(f64::EPSILON);
    let mut ticks = Vec::new();
    let mut v = (min / step).floor() * step;
    while v <= max + step * 0.001 && ticks.len() <= max_ticks + 2 {
        if v >= min - step * 0.001 {
            ticks.push(v);
        }
        v += step;
    }
    if ticks.is_empty() {
        ticks.push(min);
    }
    ticks
}

/// Compact tick text: integer when whole, else 1-2 decimals.
fn format_tick(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let abs = v.abs();
    if abs >= 1e6 || abs <= 0.01 {
        format!("{:e}", v)
    } else if (v - v.round()).abs() < 1e-10 {
        format!("{:.0}", v)
    } else if abs >= 1.0 {
        format!("{:.1}", v)
    } else {
        format!("{:.2}", v)
    }
}

fn set_color<W: Write>(out: &mut W, c: Rgba) -> io::Result<()> {
    writeln!(
        out,
        "{:.3} {:.3} {:.3} setrgbcolor",
        c.r as f64 / 255.0,
        c.g as f64 / 255.0,
        c.b as f64 / 255.0
    )
}

/// Writes `spec` as a `width` x `height` point EPS page.
pub fn write_chart_eps<W: Write>(
    out: &mut W,
    spec: &ChartSpec,
    theme: &Theme,
    width: u32,
    height: u32,
) -> io::Result<()> {
    let w = width.max(1) as f64;
    let h = height.max(1) as f64;

    writeln!(out, "%!PS-Adobe-3.0 EPSF-3.0")?;
    writeln!(out, "%%BoundingBox: 0 0 {} {}", width.max(1), height.max(1))?;
    writeln!(out, "%%Creator: coldash")?;
    writeln!(out, "%%Title: ({})", ps_escape(&spec.column))?;
    writeln!(out, "%%EndComments")?;
    writeln!(out, "gsave")?;

    set_color(out, theme.background)?;
    writeln!(out, "0 0 {} {} rectfill", w, h)?;

    if !spec.values.is_empty() {
        if spec.kind.is_proportional() {
            write_proportional(out, spec, theme, w, h)?;
        } else {
            write_cartesian(out, spec, theme, w, h)?;
        }
    }

    writeln!(out, "grestore")?;
    writeln!(out, "%%EOF")?;
    Ok(())
}

fn write_cartesian<W: Write>(
    out: &mut W,
    spec: &ChartSpec,
    theme: &Theme,
    w: f64,
    h: f64,
) -> io::Result<()> {
    let plot_w = (w - MARGIN_LEFT - MARGIN_RIGHT).max(1.0);
    let plot_h = (h - MARGIN_BOTTOM - MARGIN_TOP).max(1.0);
    let top = match spec.max_value() {
        m if m > 0.0 => m * 1.1,
        _ => 1.0,
    };
    let to_y = |v: f64| MARGIN_BOTTOM + v / top * plot_h;
    let slot = plot_w / spec.values.len() as f64;
    let center_x = |i: usize| MARGIN_LEFT + (i as f64 + 0.5) * slot;

    // Grid
    let y_ticks = nice_ticks(0.0, top, MAX_TICKS);
    set_color(out, theme.grid)?;
    writeln!(out, "0.5 setlinewidth")?;
    for &v in &y_ticks {
        let py = to_y(v);
        if (MARGIN_BOTTOM..=MARGIN_BOTTOM + plot_h).contains(&py) {
            writeln!(out, "{} {} moveto {} 0 rlineto stroke", MARGIN_LEFT, py, plot_w)?;
        }
    }

    // Axes
    set_color(out, theme.foreground)?;
    writeln!(out, "1 setlinewidth")?;
    writeln!(out, "{} {} moveto", MARGIN_LEFT, MARGIN_BOTTOM + plot_h)?;
    writeln!(out, "0 {} rlineto {} 0 rlineto stroke", -plot_h, plot_w)?;

    writeln!(out, "/Helvetica findfont 9 scalefont setfont")?;
    for &v in &y_ticks {
        let py = to_y(v);
        if (MARGIN_BOTTOM..=MARGIN_BOTTOM + plot_h).contains(&py) {
            let s = format_tick(v);
            let tx = (MARGIN_LEFT - s.len() as f64 * CHAR_W - 4.0).max(2.0);
            writeln!(out, "{} {} moveto ({}) show", tx, py - 3.0, ps_escape(&s))?;
        }
    }
    for (i, label) in spec.labels.iter().enumerate() {
        let tx = center_x(i) - label.len() as f64 * CHAR_W / 2.0;
        writeln!(
            out,
            "{} {} moveto ({}) show",
            tx.max(0.0),
            MARGIN_BOTTOM - 14.0,
            ps_escape(label)
        )?;
    }

    let fills: Vec<Rgba> = spec
        .colors
        .iter()
        .map(|c| c.fill.over(theme.background))
        .collect();

    if spec.kind == crate::chart::ChartKind::Line {
        if let Some(token) = spec.colors.first() {
            set_color(out, token.border)?;
        }
        writeln!(out, "2 setlinewidth")?;
        for (i, &v) in spec.values.iter().enumerate() {
            let op = if i == 0 { "moveto" } else { "lineto" };
            writeln!(out, "{} {} {}", center_x(i), to_y(v), op)?;
        }
        writeln!(out, "stroke")?;
        for (i, (&v, &fill)) in spec.values.iter().zip(&fills).enumerate() {
            set_color(out, fill)?;
            writeln!(out, "{} {} 3 0 360 arc fill", center_x(i), to_y(v))?;
        }
    } else {
        let bar_w = slot * 0.8;
        writeln!(out, "1 setlinewidth")?;
        for (i, ((&v, &fill), token)) in spec
            .values
            .iter()
            .zip(&fills)
            .zip(&spec.colors)
            .enumerate()
        {
            let x = center_x(i) - bar_w / 2.0;
            let bar_h = to_y(v) - MARGIN_BOTTOM;
            set_color(out, fill)?;
            writeln!(out, "{} {} {} {} rectfill", x, MARGIN_BOTTOM, bar_w, bar_h)?;
            set_color(out, token.border)?;
            writeln!(out, "{} {} {} {} rectstroke", x, MARGIN_BOTTOM, bar_w, bar_h)?;
        }
    }
    Ok(())
}

fn write_proportional<W: Write>(
    out: &mut W,
    spec: &ChartSpec,
    theme: &Theme,
    w: f64,
    h: f64,
) -> io::Result<()> {
    let legend_w = if spec.show_legend {
        (w / 3.0).min(200.0)
    } else {
        0.0
    };
    let pie_w = w - legend_w;
    let cx = pie_w / 2.0;
    let cy = h / 2.0;
    let radius = (pie_w.min(h) / 2.0 - 10.0).max(1.0);
    let total: f64 = spec.values.iter().sum();
    if total <= 0.0 {
        return Ok(());
    }

    // Slices run clockwise from 12 o'clock.
    let mut angle = 90.0;
    for (&v, token) in spec.values.iter().zip(&spec.colors) {
        let sweep = v / total * 360.0;
        let end = angle - sweep;
        set_color(out, token.fill.over(theme.background))?;
        writeln!(
            out,
            "newpath {} {} moveto {} {} {} {} {} arcn closepath fill",
            cx, cy, cx, cy, radius, angle, end
        )?;
        angle = end;
    }
    if spec.kind == crate::chart::ChartKind::Doughnut {
        set_color(out, theme.background)?;
        writeln!(out, "newpath {} {} {} 0 360 arc fill", cx, cy, radius * 0.5)?;
    }

    if spec.show_legend {
        writeln!(out, "/Helvetica findfont 9 scalefont setfont")?;
        for (i, (label, token)) in spec.labels.iter().zip(&spec.colors).enumerate() {
            let y = h - 20.0 - i as f64 * 14.0;
            set_color(out, token.fill.over(theme.background))?;
            writeln!(out, "{} {} 10 10 rectfill", pie_w + 4.0, y)?;
            set_color(out, theme.foreground)?;
            writeln!(
                out,
                "{} {} moveto ({}) show",
                pie_w + 18.0,
                y + 1.0,
                ps_escape(label)
            )?;
        }
    }
    Ok(())
}
