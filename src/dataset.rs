//! In-memory dataset: headers, rows, and typed cells.

use std::collections::HashMap;
use std::fmt;

use crate::error::IngestionError;

/// Maximum number of data rows accepted at ingestion.
pub const MAX_ROWS: usize = 10_000;
/// Maximum number of columns accepted at ingestion.
pub const MAX_COLUMNS: usize = 50;
/// Rows shown in the data preview.
pub const PREVIEW_ROWS: usize = 50;

/// A single scalar value, decided once at ingestion.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    Number(f64),
    Text(String),
    #[default]
    Absent,
}

impl Cell {
    /// A cell is present unless it is absent or an empty string.
    pub fn is_present(&self) -> bool {
        match self {
            Cell::Absent => false,
            Cell::Text(s) => !s.is_empty(),
            Cell::Number(_) => true,
        }
    }

    /// Text form of the value as used for category keys and previews.
    pub fn display(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
            Cell::Absent => Ok(()),
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

impl From<String> for Cell {
    fn from(v: String) -> Self {
        Cell::Text(v)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Cell::Absent)
    }
}

/// One record. Cells are aligned positionally with the dataset headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<Cell>,
}

static ABSENT: Cell = Cell::Absent;

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Cell at header position `index`; positions past the end of a short row read as absent.
    pub fn get(&self, index: usize) -> &Cell {
        self.cells.get(index).unwrap_or(&ABSENT)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

/// The loaded table. Immutable once built; a new ingestion replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Row>,
    index: HashMap<String, usize>,
}

impl Dataset {
    /// Builds a dataset, enforcing the ingestion invariants
    /// (at least one column and row, size caps, unique headers).
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Result<Self, IngestionError> {
        if headers.is_empty() {
            return Err(IngestionError::NoColumns);
        }
        if rows.is_empty() {
            return Err(IngestionError::EmptyDataset);
        }
        check_size(rows.len(), headers.len())?;

        let mut index = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            if index.insert(h.clone(), i).is_some() {
                return Err(IngestionError::MalformedInput(format!(
                    "duplicate column header '{}'",
                    h
                )));
            }
        }

        Ok(Self {
            headers,
            rows,
            index,
        })
    }

    /// Convenience constructor from header names and row cell vectors.
    pub fn from_records<H, R>(headers: H, rows: R) -> Result<Self, IngestionError>
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = Vec<Cell>>,
    {
        let headers = headers.into_iter().map(Into::into).collect();
        let rows = rows.into_iter().map(Row::new).collect();
        Self::new(headers, rows)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Every cell of a column in row order. Unknown columns yield nothing.
    pub fn column<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Cell> + 'a {
        let idx = self.column_index(name);
        self.rows
            .iter()
            .filter_map(move |row| idx.map(|i| row.get(i)))
    }

    /// The column sample: present cells only, in row order.
    /// Derived on every call.
    pub fn sample<'a>(&'a self, name: &str) -> Vec<&'a Cell> {
        self.column(name).filter(|c| c.is_present()).collect()
    }

    /// First `limit` rows rendered as display strings, for the data preview.
    pub fn preview(&self, limit: usize) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .take(limit)
            .map(|row| {
                (0..self.headers.len())
                    .map(|i| row.get(i).display())
                    .collect()
            })
            .collect()
    }
}

/// Rejects inputs over the row/column caps.
pub fn check_size(rows: usize, columns: usize) -> Result<(), IngestionError> {
    if rows > MAX_ROWS || columns > MAX_COLUMNS {
        return Err(IngestionError::DatasetTooLarge { rows, columns });
    }
    Ok(())
}

/// Replaces empty header names with `column_{n}` and disambiguates duplicates
/// with a numeric suffix, keeping the original order.
pub fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(raw.len());
    for (i, h) in raw.into_iter().enumerate() {
        let base = if h.trim().is_empty() {
            format!("column_{}", i + 1)
        } else {
            h
        };
        let count = seen.entry(base.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            out.push(base);
        } else {
            out.push(format!("{}_{}", base, count));
        }
    }
    out
}
