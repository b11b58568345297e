//! Shared CLI definitions for coldash.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// File format for data files (used to bypass extension-based detection).
/// When `--format` is not specified, format is auto-detected from the file extension.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma-separated values
    Csv,
    /// JSON array of records
    Json,
    /// Excel (.xls, .xlsx, .xlsm, .xlsb)
    Excel,
}

impl FileFormat {
    /// Detect file format from path extension. Compression suffixes (`.gz`, `.zst`, ...)
    /// are skipped so `data.csv.gz` is detected as CSV.
    /// Returns None when extension is missing or unknown.
    pub fn from_path(path: &Path) -> Option<Self> {
        let path = if CompressionFormat::from_extension(path).is_some() {
            Path::new(path.file_stem()?)
        } else {
            path
        };
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Parse format from extension string (e.g. "csv", "xlsx").
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "xls" | "xlsx" | "xlsm" | "xlsb" => Some(Self::Excel),
            _ => None,
        }
    }
}

/// Compression format for data files
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Gzip compression (.gz) - Most common, good balance of speed and compression
    Gzip,
    /// Zstandard compression (.zst) - Modern, fast compression with good ratios
    Zstd,
    /// Bzip2 compression (.bz2) - Good compression ratio, slower than gzip
    Bzip2,
    /// XZ compression (.xz) - Excellent compression ratio, slower than bzip2
    Xz,
}

impl CompressionFormat {
    /// Detect compression format from file extension
    pub fn from_extension(path: &Path) -> Option<Self> {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            match ext.to_lowercase().as_str() {
                "gz" => Some(Self::Gzip),
                "zst" | "zstd" => Some(Self::Zstd),
                "bz2" | "bz" => Some(Self::Bzip2),
                "xz" => Some(Self::Xz),
                _ => None,
            }
        } else {
            None
        }
    }

    /// Get file extension for this compression format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Zstd => "zst",
            Self::Bzip2 => "bz2",
            Self::Xz => "xz",
        }
    }
}

/// Chart kind as accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ChartKindArg {
    Bar,
    Line,
    Pie,
    Doughnut,
}

/// Color theme for rendered charts.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ThemeArg {
    Light,
    Dark,
}

/// Image format for per-column chart files.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ChartImageFormat {
    Png,
    Eps,
}

/// Format for the exported dataset.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum DataExportFormat {
    Csv,
    Json,
    /// Excel workbook with a single "Data" sheet
    Xlsx,
}

/// Command-line arguments for coldash
#[derive(Clone, Parser, Debug)]
#[command(
    name = "coldash",
    version,
    about = "Per-column charts and summary statistics for CSV, Excel and JSON data"
)]
pub struct Args {
    /// Path to the data file to open (not required with --generate-config)
    #[arg(required_unless_present = "generate_config", value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Force file format (csv, json, excel).
    /// By default format is auto-detected from the file extension.
    #[arg(long = "format", value_enum)]
    pub format: Option<FileFormat>,

    /// Specify the compression format explicitly (gzip, zstd, bzip2, xz)
    /// If not specified, compression is auto-detected from file extension.
    #[arg(long = "compression", value_enum)]
    pub compression: Option<CompressionFormat>,

    /// Excel sheet to load: 0-based index (e.g. 0) or sheet name (e.g. "Sales")
    #[arg(long = "sheet", value_name = "SHEET")]
    pub excel_sheet: Option<String>,

    /// Columns to chart, comma separated or repeated (default: all columns in header order)
    #[arg(long = "columns", value_name = "COL", value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Chart kind for a single column as COL=KIND (bar, line, pie, doughnut). Repeatable.
    #[arg(long = "kind", value_name = "COL=KIND")]
    pub kinds: Vec<String>,

    /// Chart kind used for columns without an explicit --kind (default: bar, or config)
    #[arg(long = "default-kind", value_enum)]
    pub default_kind: Option<ChartKindArg>,

    /// Color theme (overrides config)
    #[arg(long = "theme", value_enum)]
    pub theme: Option<ThemeArg>,

    /// Viewport width in pixels (overrides config)
    #[arg(long = "width", value_name = "PX")]
    pub width: Option<u32>,

    /// Viewport height in pixels (overrides config)
    #[arg(long = "height", value_name = "PX")]
    pub height: Option<u32>,

    /// Render this column fullscreen (full viewport size)
    #[arg(long = "fullscreen", value_name = "COL")]
    pub fullscreen: Option<String>,

    /// Number of preview rows to print before the column panels (0 disables the preview)
    #[arg(long = "preview-rows", value_name = "N")]
    pub preview_rows: Option<usize>,

    /// Directory to write one chart image per selected column
    #[arg(long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Image format for per-column chart files (overrides config)
    #[arg(long = "chart-format", value_enum)]
    pub chart_format: Option<ChartImageFormat>,

    /// Write a PNG of the whole dashboard to this path
    #[arg(long = "dashboard-image", value_name = "PATH")]
    pub dashboard_image: Option<PathBuf>,

    /// Include the chart-kind control strip in the dashboard image
    #[arg(long = "include-controls", action)]
    pub include_controls: bool,

    /// Export the loaded dataset to this path
    #[arg(long = "export-data", value_name = "PATH")]
    pub export_data: Option<PathBuf>,

    /// Format for --export-data (overrides config)
    #[arg(long = "data-format", value_enum)]
    pub data_format: Option<DataExportFormat>,

    /// Log level (error, warn, info, debug, trace). RUST_LOG is used when omitted.
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Append log output to this file instead of stderr
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Generate default configuration file at ~/.config/coldash/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Render command-line options as markdown.
///
/// Used by the gen_docs binary; output is written to stdout.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let value_placeholder = || -> String {
            arg.get_value_names()
                .map(|names| {
                    names
                        .iter()
                        .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default()
        };

        let option_str = if arg.is_positional() {
            let placeholder = value_placeholder();
            if arg.is_required_set() {
                placeholder
            } else {
                format!("[{placeholder}]")
            }
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            let placeholder = if arg.get_action().takes_values() {
                value_placeholder()
            } else {
                String::new()
            };
            if placeholder.is_empty() {
                op
            } else {
                format!("{op} {placeholder}")
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_detection() {
        assert_eq!(
            CompressionFormat::from_extension(Path::new("file.csv.gz")),
            Some(CompressionFormat::Gzip)
        );
        assert_eq!(
            CompressionFormat::from_extension(Path::new("file.json.zst")),
            Some(CompressionFormat::Zstd)
        );
        assert_eq!(
            CompressionFormat::from_extension(Path::new("file.csv.bz2")),
            Some(CompressionFormat::Bzip2)
        );
        assert_eq!(
            CompressionFormat::from_extension(Path::new("file.csv.xz")),
            Some(CompressionFormat::Xz)
        );
        assert_eq!(
            CompressionFormat::from_extension(Path::new("file.csv")),
            None
        );
        assert_eq!(CompressionFormat::from_extension(Path::new("file")), None);
    }

    #[test]
    fn test_file_format_from_path() {
        assert_eq!(
            FileFormat::from_path(Path::new("data.csv")),
            Some(FileFormat::Csv)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("data.XLSX")),
            Some(FileFormat::Excel)
        );
        assert_eq!(
            FileFormat::from_path(Path::new("records.json.gz")),
            Some(FileFormat::Json)
        );
        assert_eq!(FileFormat::from_path(Path::new("notes.txt")), None);
        assert_eq!(FileFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_args_parse_columns_and_kinds() {
        let args = Args::parse_from([
            "coldash",
            "data.csv",
            "--columns",
            "age,city",
            "--kind",
            "city=pie",
            "--theme",
            "dark",
        ]);
        assert_eq!(args.path, Some(PathBuf::from("data.csv")));
        assert_eq!(args.columns, vec!["age".to_string(), "city".to_string()]);
        assert_eq!(args.kinds, vec!["city=pie".to_string()]);
        assert_eq!(args.theme, Some(ThemeArg::Dark));
        assert!(!args.include_controls);
    }

    #[test]
    fn test_generate_config_does_not_need_path() {
        let args = Args::parse_from(["coldash", "--generate-config", "--force"]);
        assert!(args.generate_config);
        assert!(args.force);
        assert!(args.path.is_none());
    }

    #[test]
    fn test_options_markdown_lists_flags() {
        let md = render_options_markdown();
        assert!(md.contains("--columns"));
        assert!(md.contains("--dashboard-image"));
        assert!(!md.contains("`--help`"));
    }
}
