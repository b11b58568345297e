//! Column dashboards: load a tabular file, pick columns, and get one chart plus summary
//! statistics per column.

pub mod chart;
pub mod chart_data;
pub mod chart_export;
pub mod classify;
pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod error_display;
pub mod lifecycle;
pub mod logging;
pub mod palette;
pub mod render;
pub mod source;
pub mod statistics;

pub use chart::{ChartKind, ChartSpec};
pub use classify::ColumnKind;
pub use coldash_cli::{Args, CompressionFormat, FileFormat};
pub use config::{AppConfig, ConfigManager};
pub use dashboard::{ColumnReport, Dashboard, RenderTrigger};
pub use dataset::{Cell, Dataset, Row};
pub use error::{
    ColumnError, DashboardError, ExportError, IngestionError, NoDataError, RenderError,
};
pub use lifecycle::{ChartRegistry, HandleState};
pub use render::{ChartBackend, ChartInstance, PlottersBackend, RenderTarget, Theme, ThemeMode};
pub use source::{load_path, LoadOptions};
pub use statistics::Stats;

/// Application name used for the config directory and other app-specific paths
pub const APP_NAME: &str = "coldash";
