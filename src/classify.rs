//! Column type classification: numerical vs categorical.

use std::fmt;

use crate::dataset::{Cell, Dataset};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Numerical,
    Categorical,
}

impl ColumnKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Numerical => "numerical",
            Self::Categorical => "categorical",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a column. Numerical iff every present cell parses as a finite number;
/// a column with no present cells is numerical with an empty sample.
///
/// Pure: recomputed from the raw cells on every call.
pub fn classify(dataset: &Dataset, column: &str) -> ColumnKind {
    let all_numeric = dataset
        .column(column)
        .filter(|c| c.is_present())
        .all(|c| parse_numeric(c).is_some());
    if all_numeric {
        ColumnKind::Numerical
    } else {
        ColumnKind::Categorical
    }
}

/// Numeric value of a present cell, if it has one.
///
/// Text is read by its leading numeric prefix, so `"12abc"` is 12. Only finite
/// results count.
pub fn parse_numeric(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => n.is_finite().then_some(*n),
        Cell::Text(s) => parse_leading_float(s).filter(|v| v.is_finite()),
        Cell::Absent => None,
    }
}

/// Parses the longest decimal literal at the start of `s` (after leading whitespace):
/// optional sign, digits with an optional fraction, optional exponent, or `Infinity`.
/// Trailing characters are ignored. Returns None when no digits are found.
pub fn parse_leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        return s[..end + "Infinity".len()]
            .replace("Infinity", "inf")
            .parse()
            .ok();
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(cells: Vec<Cell>) -> Dataset {
        Dataset::from_records(["c"], cells.into_iter().map(|c| vec![c])).unwrap()
    }

    #[test]
    fn numbers_and_numeric_text_are_numerical() {
        let ds = column(vec![
            Cell::Number(1.0),
            "2.5".into(),
            " 3".into(),
            Cell::Absent,
            "".into(),
        ]);
        assert_eq!(classify(&ds, "c"), ColumnKind::Numerical);
    }

    #[test]
    fn single_non_numeric_cell_forces_categorical() {
        let ds = column(vec![Cell::Number(1.0), Cell::Number(2.0), "n/a".into()]);
        assert_eq!(classify(&ds, "c"), ColumnKind::Categorical);
    }

    #[test]
    fn whitespace_only_text_is_categorical() {
        let ds = column(vec![Cell::Number(1.0), "  ".into()]);
        assert_eq!(classify(&ds, "c"), ColumnKind::Categorical);
    }

    #[test]
    fn all_absent_column_is_numerical() {
        let ds = column(vec![Cell::Absent, "".into()]);
        assert_eq!(classify(&ds, "c"), ColumnKind::Numerical);
    }

    #[test]
    fn leading_numeric_prefix_is_accepted() {
        let ds = column(vec!["12abc".into(), Cell::Number(3.0)]);
        assert_eq!(classify(&ds, "c"), ColumnKind::Numerical);
        assert_eq!(parse_numeric(&"12abc".into()), Some(12.0));
    }

    #[test]
    fn non_finite_values_are_not_numeric() {
        assert_eq!(parse_numeric(&Cell::Number(f64::NAN)), None);
        assert_eq!(parse_numeric(&Cell::Number(f64::INFINITY)), None);
        assert_eq!(parse_numeric(&"Infinity".into()), None);
        assert_eq!(parse_numeric(&"-Infinity".into()), None);
    }

    #[test]
    fn parse_leading_float_forms() {
        assert_eq!(parse_leading_float("42"), Some(42.0));
        assert_eq!(parse_leading_float("-4.5e2xyz"), Some(-450.0));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("5."), Some(5.0));
        assert_eq!(parse_leading_float("+7"), Some(7.0));
        assert_eq!(parse_leading_float("1e"), Some(1.0));
        assert_eq!(parse_leading_float("1e+"), Some(1.0));
        assert_eq!(parse_leading_float("abc"), None);
        assert_eq!(parse_leading_float("."), None);
        assert_eq!(parse_leading_float("-"), None);
        assert_eq!(parse_leading_float(""), None);
        assert_eq!(parse_leading_float("Infinity"), Some(f64::INFINITY));
    }
}
