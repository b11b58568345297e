//! Aggregation: turn a raw column into a renderable series.
//!
//! Numerical columns become equal-width histogram bins, categorical columns
//! become frequency counts in first-seen order.

use std::collections::HashMap;

use crate::chart::ChartKind;
use crate::classify::{parse_numeric, ColumnKind};
use crate::dataset::{Cell, Dataset};
use crate::error::NoDataError;

/// Upper bound on histogram bins.
pub const MAX_BINS: usize = 10;
/// Labels longer than this are shortened on proportional charts.
pub const LABEL_MAX_CHARS: usize = 20;
/// Characters kept when a label is shortened (the ellipsis makes up the rest).
pub const LABEL_KEEP_CHARS: usize = 17;
pub const ELLIPSIS: &str = "...";
/// Category key used for values that are blank after trimming.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub low: f64,
    pub high: f64,
    pub count: usize,
}

impl Bin {
    pub fn label(&self) -> String {
        format!("{:.2} - {:.2}", self.low, self.high)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub key: String,
    pub count: usize,
}

/// Labels and values handed to the rendering layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

impl From<Vec<Bin>> for Series {
    fn from(bins: Vec<Bin>) -> Self {
        Series {
            labels: bins.iter().map(Bin::label).collect(),
            values: bins.iter().map(|b| b.count as f64).collect(),
        }
    }
}

impl From<Vec<CategoryCount>> for Series {
    fn from(counts: Vec<CategoryCount>) -> Self {
        let values = counts.iter().map(|c| c.count as f64).collect();
        Series {
            labels: counts.into_iter().map(|c| c.key).collect(),
            values,
        }
    }
}

/// Numeric values of a column's sample, in row order. Unparseable cells are dropped.
pub fn numeric_sample(dataset: &Dataset, column: &str) -> Vec<f64> {
    dataset
        .sample(column)
        .into_iter()
        .filter_map(parse_numeric)
        .collect()
}

/// Equal-width histogram with `min(10, n)` bins.
///
/// A sample whose values are all identical yields a single bin `[v, v + 1)`.
/// The maximum value lands in the last bin.
pub fn histogram(values: &[f64]) -> Vec<Bin> {
    if values.is_empty() {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max == min {
        return vec![Bin {
            low: min,
            high: min + 1.0,
            count: values.len(),
        }];
    }

    let bin_count = MAX_BINS.min(values.len());
    let n = bin_count as f64;
    // Edges are interpolated and positions use halved values, so a span wider than
    // f64::MAX stays finite.
    let edge = |i: usize| {
        let t = i as f64 / n;
        min * (1.0 - t) + max * t
    };
    let half_span = max / 2.0 - min / 2.0;

    let mut bins: Vec<Bin> = (0..bin_count)
        .map(|i| Bin {
            low: edge(i),
            high: edge(i + 1),
            count: 0,
        })
        .collect();

    for &v in values {
        let position = ((v / 2.0 - min / 2.0) / half_span * n).floor();
        let idx = if position < 0.0 { 0 } else { position as usize };
        bins[idx.min(bin_count - 1)].count += 1;
    }
    bins
}

/// Frequency counts keyed by trimmed text, in first-seen order.
/// Blank-after-trim values count toward `"Unknown"`.
pub fn category_counts<'a, I>(sample: I) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a Cell>,
{
    let mut counts: Vec<CategoryCount> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for cell in sample {
        let text = cell.display();
        let trimmed = text.trim();
        let key = if trimmed.is_empty() {
            UNKNOWN_CATEGORY
        } else {
            trimmed
        };
        match positions.get(key) {
            Some(&i) => counts[i].count += 1,
            None => {
                positions.insert(key.to_string(), counts.len());
                counts.push(CategoryCount {
                    key: key.to_string(),
                    count: 1,
                });
            }
        }
    }
    counts
}

/// Aggregates a column for charting according to its kind.
pub fn aggregate(dataset: &Dataset, column: &str, kind: ColumnKind) -> Result<Series, NoDataError> {
    let sample = dataset.sample(column);
    if sample.is_empty() {
        return Err(NoDataError::EmptyColumn);
    }
    match kind {
        ColumnKind::Numerical => {
            let values: Vec<f64> = sample.into_iter().filter_map(parse_numeric).collect();
            if values.is_empty() {
                return Err(NoDataError::NoNumericValues);
            }
            Ok(histogram(&values).into())
        }
        ColumnKind::Categorical => {
            let counts = category_counts(sample);
            if counts.is_empty() {
                return Err(NoDataError::NoCategories);
            }
            Ok(counts.into())
        }
    }
}

/// Shortens long labels for proportional (pie/doughnut) charts; other kinds are untouched.
pub fn truncate_label(label: &str, kind: ChartKind) -> String {
    if !kind.is_proportional() || label.chars().count() <= LABEL_MAX_CHARS {
        return label.to_string();
    }
    let mut out: String = label.chars().take(LABEL_KEEP_CHARS).collect();
    out.push_str(ELLIPSIS);
    out
}
