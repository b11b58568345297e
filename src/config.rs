use color_eyre::eyre::eyre;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use coldash_cli::{ChartImageFormat, DataExportFormat};

use crate::chart::ChartKind;
use crate::palette::Rgba;
use crate::render::{Theme, ThemeMode};

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Create a new ConfigManager for the given app name
    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Get path to a specific config file
    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Default configuration template (every setting commented)
    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write default configuration to config file
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version (for future compatibility)
    pub version: String,
    pub chart: ChartConfig,
    pub theme: ThemeConfig,
    pub export: ExportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub default_kind: String,
    /// Viewport width in pixels
    pub width: u32,
    /// Viewport height in pixels
    pub height: u32,
    pub grid_columns: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub mode: String,
    pub light: ColorSet,
    pub dark: ColorSet,
}

/// Chart chrome colors as `#rrggbb` strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSet {
    pub background: String,
    pub foreground: String,
    pub grid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub dashboard_scale: u32,
    pub chart_format: String,
    pub data_format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            chart: ChartConfig::default(),
            theme: ThemeConfig::default(),
            export: ExportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            default_kind: "bar".to_string(),
            width: 1200,
            height: 800,
            grid_columns: 2,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            mode: "light".to_string(),
            light: ColorSet::light(),
            dark: ColorSet::dark(),
        }
    }
}

impl ColorSet {
    pub fn light() -> Self {
        Self::from_theme(&Theme::LIGHT)
    }

    pub fn dark() -> Self {
        Self::from_theme(&Theme::DARK)
    }

    fn from_theme(theme: &Theme) -> Self {
        Self {
            background: theme.background.to_hex(),
            foreground: theme.foreground.to_hex(),
            grid: theme.grid.to_hex(),
        }
    }
}

impl Default for ColorSet {
    fn default() -> Self {
        Self::light()
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dashboard_scale: 2,
            chart_format: "png".to_string(),
            data_format: "csv".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}

// Configuration loading and merging
impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        Self::load_with(&ConfigManager::new(app_name)?)
    }

    /// Load configuration using the config file managed by `config_manager`
    pub fn load_with(config_manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();
        if let Some(user_config) = Self::load_user_config(config_manager)? {
            config.merge(user_config);
        }
        config.validate()?;
        Ok(config)
    }

    fn load_user_config(config_manager: &ConfigManager) -> Result<Option<AppConfig>> {
        let config_path = config_manager.config_path("config.toml");

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map(Some).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.chart.merge(other.chart);
        self.theme.merge(other.theme);
        self.export.merge(other.export);
        self.logging.merge(other.logging);
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with("0.1") {
            return Err(eyre!(
                "Unsupported config version: {}. Expected 0.1.x",
                self.version
            ));
        }

        self.chart
            .default_kind
            .parse::<ChartKind>()
            .map_err(|e| eyre!("Invalid default_kind: {}", e))?;
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(eyre!("chart width and height must be greater than 0"));
        }
        if !(1..=6).contains(&self.chart.grid_columns) {
            return Err(eyre!(
                "grid_columns must be between 1 and 6, got {}",
                self.chart.grid_columns
            ));
        }

        match self.theme.mode.as_str() {
            "light" | "dark" => {}
            _ => {
                return Err(eyre!(
                    "Invalid theme mode: {}. Must be 'light' or 'dark'",
                    self.theme.mode
                ))
            }
        }
        self.theme.light.validate("theme.light")?;
        self.theme.dark.validate("theme.dark")?;

        if !(1..=4).contains(&self.export.dashboard_scale) {
            return Err(eyre!(
                "dashboard_scale must be between 1 and 4, got {}",
                self.export.dashboard_scale
            ));
        }
        parse_chart_format(&self.export.chart_format)?;
        parse_data_format(&self.export.data_format)?;

        match self.logging.level.to_lowercase().as_str() {
            "off" | "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(eyre!(
                    "Invalid log level: {}. Must be one of off, error, warn, info, debug, trace",
                    self.logging.level
                ))
            }
        }

        Ok(())
    }
}

// Merge implementations for each config section
impl ChartConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ChartConfig::default();
        if other.default_kind != default.default_kind {
            self.default_kind = other.default_kind;
        }
        if other.width != default.width {
            self.width = other.width;
        }
        if other.height != default.height {
            self.height = other.height;
        }
        if other.grid_columns != default.grid_columns {
            self.grid_columns = other.grid_columns;
        }
    }

    /// The configured default chart kind (validated by `AppConfig::validate`)
    pub fn kind(&self) -> ChartKind {
        self.default_kind.parse().unwrap_or_default()
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ThemeConfig::default();
        if other.mode != default.mode {
            self.mode = other.mode;
        }
        self.light.merge(other.light, &default.light);
        self.dark.merge(other.dark, &default.dark);
    }

    pub fn initial_mode(&self) -> ThemeMode {
        match self.mode.as_str() {
            "dark" => ThemeMode::Dark,
            _ => ThemeMode::Light,
        }
    }

    /// Parsed colors for `mode`
    pub fn theme(&self, mode: ThemeMode) -> Result<Theme> {
        let set = match mode {
            ThemeMode::Light => &self.light,
            ThemeMode::Dark => &self.dark,
        };
        Ok(Theme {
            mode,
            background: parse_hex(&set.background)?,
            foreground: parse_hex(&set.foreground)?,
            grid: parse_hex(&set.grid)?,
        })
    }
}

impl ColorSet {
    fn validate(&self, section: &str) -> Result<()> {
        for (name, value) in [
            ("background", &self.background),
            ("foreground", &self.foreground),
            ("grid", &self.grid),
        ] {
            parse_hex(value)
                .map_err(|e| eyre!("Invalid color value for '{}.{}': {}", section, name, e))?;
        }
        Ok(())
    }

    /// Light and dark sets have different defaults, so the caller passes the one to compare against.
    pub fn merge(&mut self, other: Self, default: &Self) {
        if other.background != default.background {
            self.background = other.background;
        }
        if other.foreground != default.foreground {
            self.foreground = other.foreground;
        }
        if other.grid != default.grid {
            self.grid = other.grid;
        }
    }
}

impl ExportConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ExportConfig::default();
        if other.dashboard_scale != default.dashboard_scale {
            self.dashboard_scale = other.dashboard_scale;
        }
        if other.chart_format != default.chart_format {
            self.chart_format = other.chart_format;
        }
        if other.data_format != default.data_format {
            self.data_format = other.data_format;
        }
    }

    pub fn chart_image_format(&self) -> ChartImageFormat {
        parse_chart_format(&self.chart_format).unwrap_or(ChartImageFormat::Png)
    }

    pub fn data_export_format(&self) -> DataExportFormat {
        parse_data_format(&self.data_format).unwrap_or(DataExportFormat::Csv)
    }
}

impl LoggingConfig {
    pub fn merge(&mut self, other: Self) {
        let default = LoggingConfig::default();
        if other.level != default.level {
            self.level = other.level;
        }
        if other.file.is_some() {
            self.file = other.file;
        }
    }
}

fn parse_chart_format(s: &str) -> Result<ChartImageFormat> {
    match s.to_lowercase().as_str() {
        "png" => Ok(ChartImageFormat::Png),
        "eps" => Ok(ChartImageFormat::Eps),
        _ => Err(eyre!(
            "Invalid chart_format: {}. Must be 'png' or 'eps'",
            s
        )),
    }
}

fn parse_data_format(s: &str) -> Result<DataExportFormat> {
    match s.to_lowercase().as_str() {
        "csv" => Ok(DataExportFormat::Csv),
        "json" => Ok(DataExportFormat::Json),
        "xlsx" => Ok(DataExportFormat::Xlsx),
        _ => Err(eyre!(
            "Invalid data_format: {}. Must be 'csv', 'json' or 'xlsx'",
            s
        )),
    }
}

/// Parse hex color string (#ff0000) to an opaque color
pub fn parse_hex(s: &str) -> Result<Rgba> {
    let s = s.trim();
    if !s.is_ascii() || !s.starts_with('#') || s.len() != 7 {
        return Err(eyre!(
            "Invalid hex color format: '{}'. Expected format: #rrggbb",
            s
        ));
    }

    let r = u8::from_str_radix(&s[1..3], 16)
        .map_err(|_| eyre!("Invalid red component in hex color: {}", s))?;
    let g = u8::from_str_radix(&s[3..5], 16)
        .map_err(|_| eyre!("Invalid green component in hex color: {}", s))?;
    let b = u8::from_str_radix(&s[5..7], 16)
        .map_err(|_| eyre!("Invalid blue component in hex color: {}", s))?;

    Ok(Rgba::opaque(r, g, b))
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");
