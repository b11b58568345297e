//! Render target boundary: named drawing surfaces and the chart backends that fill them.

use crate::chart::ChartSpec;
use crate::error::RenderError;
use crate::palette::Rgba;

pub mod eps;
mod plotters_backend;

pub use plotters_backend::{draw_chart, encode_png, PlottersBackend};

/// A named 2D surface a single chart is drawn into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTarget {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
        }
    }

    /// Target for a column, with the id derived by [`canvas_id`].
    pub fn for_column(column: &str, width: u32, height: u32) -> Self {
        Self::new(canvas_id(column), width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Deterministic target id for a column: `chart-` plus the name with each whitespace
/// character replaced by `_`.
pub fn canvas_id(column: &str) -> String {
    format!("chart-{}", column.replace(char::is_whitespace, "_"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl From<coldash_cli::ThemeArg> for ThemeMode {
    fn from(arg: coldash_cli::ThemeArg) -> Self {
        match arg {
            coldash_cli::ThemeArg::Light => Self::Light,
            coldash_cli::ThemeArg::Dark => Self::Dark,
        }
    }
}

/// Chart chrome colors. Series colors come from the palette and do not change with the theme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub mode: ThemeMode,
    pub background: Rgba,
    pub foreground: Rgba,
    pub grid: Rgba,
}

impl Theme {
    pub const LIGHT: Theme = Theme {
        mode: ThemeMode::Light,
        background: Rgba::opaque(255, 255, 255),
        foreground: Rgba::opaque(51, 51, 51),
        grid: Rgba::opaque(224, 224, 224),
    };

    pub const DARK: Theme = Theme {
        mode: ThemeMode::Dark,
        background: Rgba::opaque(30, 30, 30),
        foreground: Rgba::opaque(224, 224, 224),
        grid: Rgba::opaque(68, 68, 68),
    };
}

impl Default for Theme {
    fn default() -> Self {
        Self::LIGHT
    }
}

/// Creates live chart instances on render targets.
pub trait ChartBackend {
    fn create(
        &mut self,
        target: &RenderTarget,
        spec: &ChartSpec,
        theme: &Theme,
    ) -> Result<Box<dyn ChartInstance>, RenderError>;
}

/// A live rendering instance bound to one target.
pub trait ChartInstance {
    fn target_id(&self) -> &str;

    fn spec(&self) -> &ChartSpec;

    /// Size of the target the instance was created on.
    fn size(&self) -> (u32, u32);

    /// Releases the instance's drawing resources. Idempotent.
    fn destroy(&mut self);

    fn is_live(&self) -> bool;

    /// Raw RGB pixels of the rendered surface, when the backend keeps one.
    fn raster(&self) -> Option<&[u8]> {
        None
    }

    fn to_png(&self) -> Result<Vec<u8>, RenderError>;

    fn to_eps(&self) -> Result<Vec<u8>, RenderError>;
}
