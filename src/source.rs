//! Ingestion: decode CSV, Excel and JSON files into a [`Dataset`].
//!
//! CSV and JSON inputs may be compressed; they are decompressed in memory before parsing.
//! Every failure is an [`IngestionError`].

use calamine::{open_workbook_auto, Data, DataType as _, Reader};
use chrono::{NaiveDateTime, NaiveTime};
use polars::prelude::*;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;
use tracing::info;

use coldash_cli::{CompressionFormat, FileFormat};

use crate::dataset::{check_size, normalize_headers, Cell, Dataset, Row};
use crate::error::IngestionError;
use crate::error_display::user_message_from_polars;

/// How to read a file. Unset fields are detected from the path.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub format: Option<FileFormat>,
    pub compression: Option<CompressionFormat>,
    /// Excel sheet: 0-based index or sheet name. Defaults to the first sheet.
    pub excel_sheet: Option<String>,
}

impl LoadOptions {
    pub fn from_args(args: &coldash_cli::Args) -> Self {
        Self {
            format: args.format,
            compression: args.compression,
            excel_sheet: args.excel_sheet.clone(),
        }
    }
}

fn polars_err(err: PolarsError) -> IngestionError {
    IngestionError::MalformedInput(user_message_from_polars(&err))
}

/// Loads `path` into a dataset.
pub fn load_path(path: &Path, options: &LoadOptions) -> Result<Dataset, IngestionError> {
    let format = options
        .format
        .or_else(|| FileFormat::from_path(path))
        .ok_or_else(|| {
            IngestionError::UnsupportedFormat(
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(str::to_string),
            )
        })?;
    let compression = options
        .compression
        .or_else(|| CompressionFormat::from_extension(path));

    let dataset = match format {
        FileFormat::Excel => {
            if compression.is_some() {
                return Err(IngestionError::MalformedInput(
                    "compressed Excel files are not supported".to_string(),
                ));
            }
            from_excel(path, options.excel_sheet.as_deref())?
        }
        FileFormat::Csv => from_csv_bytes(read_bytes(path, compression)?)?,
        FileFormat::Json => from_json_bytes(&read_bytes(path, compression)?)?,
    };
    info!(
        path = %path.display(),
        format = ?format,
        rows = dataset.row_count(),
        columns = dataset.column_count(),
        "ingested file"
    );
    Ok(dataset)
}

/// Reads a file fully, decompressing when `compression` is set.
fn read_bytes(path: &Path, compression: Option<CompressionFormat>) -> Result<Vec<u8>, IngestionError> {
    let file = File::open(path)?;
    let mut reader: Box<dyn Read> = match compression {
        None => Box::new(BufReader::new(file)),
        Some(CompressionFormat::Gzip) => {
            Box::new(flate2::read::MultiGzDecoder::new(BufReader::new(file)))
        }
        Some(CompressionFormat::Zstd) => Box::new(zstd::Decoder::new(file)?),
        Some(CompressionFormat::Bzip2) => {
            Box::new(bzip2::read::BzDecoder::new(BufReader::new(file)))
        }
        Some(CompressionFormat::Xz) => Box::new(xz2::read::XzDecoder::new(BufReader::new(file))),
    };
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Parses CSV with a header row; column types are inferred over every row.
pub fn from_csv_bytes(bytes: Vec<u8>) -> Result<Dataset, IngestionError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(IngestionError::EmptyDataset);
    }
    let read_options = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None);
    let df = CsvReader::new(Cursor::new(bytes))
        .with_options(read_options)
        .finish()
        .map_err(polars_err)?;
    frame_to_dataset(&df)
}

fn is_numeric_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Numeric columns become `Number` cells, nulls `Absent`, everything else `Text`.
fn column_cells(column: &Column) -> Result<Vec<Cell>, IngestionError> {
    if is_numeric_type(column.dtype()) {
        let cast = column.cast(&DataType::Float64).map_err(polars_err)?;
        let values = cast.f64().map_err(polars_err)?;
        Ok(values.iter().map(Cell::from).collect())
    } else {
        let cast = column.cast(&DataType::String).map_err(polars_err)?;
        let values = cast.str().map_err(polars_err)?;
        Ok(values.iter().map(Cell::from).collect())
    }
}

/// Converts a polars frame into a dataset, row by row.
pub fn frame_to_dataset(df: &DataFrame) -> Result<Dataset, IngestionError> {
    if df.width() == 0 {
        return Err(IngestionError::NoColumns);
    }
    check_size(df.height(), df.width())?;
    let headers = normalize_headers(
        df.get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect(),
    );

    let mut rows: Vec<Vec<Cell>> = (0..df.height())
        .map(|_| Vec::with_capacity(df.width()))
        .collect();
    for column in df.get_columns() {
        for (row, cell) in rows.iter_mut().zip(column_cells(column)?) {
            row.push(cell);
        }
    }
    Dataset::new(headers, rows.into_iter().map(Row::new).collect())
}

/// Loads one worksheet: the first row holds the headers. Blank rows are skipped.
pub fn from_excel(path: &Path, sheet: Option<&str>) -> Result<Dataset, IngestionError> {
    let excel_err = |e: calamine::Error| IngestionError::MalformedInput(format!("Excel: {}", e));
    let mut workbook = open_workbook_auto(path).map_err(excel_err)?;
    if workbook.sheet_names().is_empty() {
        return Err(IngestionError::MalformedInput(
            "Excel file has no worksheets".to_string(),
        ));
    }
    let range = match sheet {
        Some(sel) => match sel.parse::<usize>() {
            Ok(idx) => workbook
                .worksheet_range_at(idx)
                .ok_or_else(|| {
                    IngestionError::MalformedInput(format!("Excel: no sheet at index {}", idx))
                })?
                .map_err(excel_err)?,
            Err(_) => workbook.worksheet_range(sel).map_err(excel_err)?,
        },
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| IngestionError::MalformedInput("Excel: no first sheet".to_string()))?
            .map_err(excel_err)?,
    };

    let mut sheet_rows = range.rows();
    let header_row = sheet_rows.next().ok_or(IngestionError::EmptyDataset)?;
    if header_row.is_empty() {
        return Err(IngestionError::NoColumns);
    }
    let headers = normalize_headers(
        header_row
            .iter()
            .map(|c| c.as_string().unwrap_or_else(|| c.to_string()))
            .collect(),
    );

    let rows: Vec<Row> = sheet_rows
        .filter(|r| r.iter().any(|c| !c.is_empty()))
        .map(|r| Row::new(r.iter().map(excel_cell).collect()))
        .collect();
    check_size(rows.len(), headers.len())?;
    Dataset::new(headers, rows)
}

fn excel_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Absent,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
            Some(dt) => Cell::Text(format_datetime(dt)),
            None => Cell::Text(cell.to_string()),
        },
        _ => Cell::Text(cell.to_string()),
    }
}

/// ISO text; dates at midnight drop the time part.
fn format_datetime(dt: NaiveDateTime) -> String {
    if Some(dt.time()) == NaiveTime::from_hms_opt(0, 0, 0) {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

pub fn from_json_bytes(bytes: &[u8]) -> Result<Dataset, IngestionError> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| IngestionError::MalformedInput(format!("Invalid JSON: {}", e)))?;
    from_json_value(value)
}

pub fn from_json_str(text: &str) -> Result<Dataset, IngestionError> {
    from_json_bytes(text.as_bytes())
}

/// Builds a dataset from a JSON array of records. Headers are the first record's keys in
/// document order; keys missing from later records read as absent.
pub fn from_json_value(value: Value) -> Result<Dataset, IngestionError> {
    let Value::Array(records) = value else {
        return Err(IngestionError::MalformedInput(
            "JSON must be an array of objects".to_string(),
        ));
    };
    if records.is_empty() {
        return Err(IngestionError::EmptyDataset);
    }
    let objects = records
        .iter()
        .map(|r| match r {
            Value::Object(map) => Ok(map),
            _ => Err(IngestionError::MalformedInput(
                "JSON must be an array of objects".to_string(),
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let headers: Vec<String> = objects[0].keys().cloned().collect();
    check_size(objects.len(), headers.len())?;
    if headers.is_empty() {
        return Err(IngestionError::NoColumns);
    }

    let rows = objects
        .iter()
        .map(|obj| {
            Row::new(
                headers
                    .iter()
                    .map(|h| obj.get(h).map(json_cell).unwrap_or_default())
                    .collect(),
            )
        })
        .collect();
    Dataset::new(headers, rows)
}

fn json_cell(value: &Value) -> Cell {
    match value {
        Value::Number(n) => n.as_f64().map(Cell::Number).unwrap_or_default(),
        Value::String(s) => Cell::Text(s.clone()),
        Value::Bool(b) => Cell::Text(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Cell::Absent,
    }
}
