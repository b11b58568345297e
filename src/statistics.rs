//! Summary statistics for numerical columns.

/// Mean, median, min and max of a numeric sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    /// Side panel text, two decimals per value.
    pub fn summary_line(&self) -> String {
        format!(
            "Mean: {:.2} | Median: {:.2} | Min: {:.2} | Max: {:.2}",
            self.mean, self.median, self.min, self.max
        )
    }
}

/// Computes stats over `values` without reordering the caller's slice.
/// Returns None for an empty slice.
pub fn compute_stats(values: &[f64]) -> Option<Stats> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let (min, max) = (sorted[0], sorted[n - 1]);
    // Each term is scaled before summing so large finite samples never reach infinity.
    let mean: f64 = values.iter().map(|v| v / n as f64).sum();
    let median = if n % 2 == 0 {
        sorted[n / 2 - 1] / 2.0 + sorted[n / 2] / 2.0
    } else {
        sorted[n / 2]
    };

    Some(Stats {
        mean: mean.clamp(min, max),
        median,
        min,
        max,
    })
}
