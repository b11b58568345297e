//! Chart kinds and the transient chart specification built on every render.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::chart_data::{truncate_label, Series};
use crate::palette::{colors, ColorToken};

/// Presentation for one column's chart.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Pie,
    Doughnut,
}

impl ChartKind {
    pub const ALL: [Self; 4] = [Self::Bar, Self::Line, Self::Pie, Self::Doughnut];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "Bar",
            Self::Line => "Line",
            Self::Pie => "Pie",
            Self::Doughnut => "Doughnut",
        }
    }

    /// Pie and doughnut show parts of a whole: no axes, legend shown.
    pub fn is_proportional(self) -> bool {
        matches!(self, Self::Pie | Self::Doughnut)
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bar" => Ok(Self::Bar),
            "line" => Ok(Self::Line),
            "pie" => Ok(Self::Pie),
            "doughnut" | "donut" => Ok(Self::Doughnut),
            other => Err(format!(
                "Unknown chart kind '{}'. Expected one of: bar, line, pie, doughnut",
                other
            )),
        }
    }
}

impl From<coldash_cli::ChartKindArg> for ChartKind {
    fn from(arg: coldash_cli::ChartKindArg) -> Self {
        use coldash_cli::ChartKindArg as A;
        match arg {
            A::Bar => Self::Bar,
            A::Line => Self::Line,
            A::Pie => Self::Pie,
            A::Doughnut => Self::Doughnut,
        }
    }
}

/// Value axis options for cartesian kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueAxis {
    pub begin_at_zero: bool,
}

/// Everything a backend needs to draw one column's chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub column: String,
    pub kind: ChartKind,
    /// Display labels (shortened for proportional kinds).
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub colors: Vec<ColorToken>,
    /// None for proportional kinds.
    pub value_axis: Option<ValueAxis>,
    pub show_legend: bool,
}

impl ChartSpec {
    pub fn build(column: &str, kind: ChartKind, series: &Series) -> Self {
        let proportional = kind.is_proportional();
        Self {
            column: column.to_string(),
            kind,
            labels: series
                .labels
                .iter()
                .map(|l| truncate_label(l, kind))
                .collect(),
            values: series.values.clone(),
            colors: colors(series.len()),
            value_axis: (!proportional).then_some(ValueAxis {
                begin_at_zero: true,
            }),
            show_legend: proportional,
        }
    }

    /// Largest value, used for the top of the value axis.
    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}
