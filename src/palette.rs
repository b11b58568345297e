//! Deterministic series colors.
//!
//! Colors cycle through a fixed palette of muted tones so re-rendering a column
//! with the same number of bins or categories always yields the same colors.

/// Fill alpha for series elements; borders use the same hue at full opacity.
pub const FILL_ALPHA: f64 = 0.5;

/// Muted, professional tones (RGB).
pub const PALETTE: [(u8, u8, u8); 12] = [
    (166, 189, 219), // light blue
    (186, 215, 166), // light green
    (219, 166, 189), // light pink
    (219, 189, 166), // light orange
    (166, 219, 189), // light teal
    (189, 166, 219), // light purple
    (219, 219, 166), // light yellow
    (166, 166, 219), // light indigo
    (189, 219, 166), // light lime
    (219, 166, 166), // light red
    (166, 219, 219), // light cyan
    (219, 189, 219), // light magenta
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Same hue at a different alpha.
    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Alpha-blends this color over an opaque background.
    pub fn over(&self, background: Rgba) -> Rgba {
        let a = self.a.clamp(0.0, 1.0);
        let mix = |fg: u8, bg: u8| -> u8 {
            (fg as f64 * a + bg as f64 * (1.0 - a)).round() as u8
        };
        Rgba::opaque(
            mix(self.r, background.r),
            mix(self.g, background.g),
            mix(self.b, background.b),
        )
    }
}

/// Fill and border color for one series element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorToken {
    pub fill: Rgba,
    pub border: Rgba,
}

impl ColorToken {
    fn from_rgb((r, g, b): (u8, u8, u8)) -> Self {
        let fill = Rgba::new(r, g, b, FILL_ALPHA);
        Self {
            fill,
            border: fill.with_alpha(1.0),
        }
    }
}

/// `n` color tokens, element `i` taken from `PALETTE[i % 12]`.
pub fn colors(n: usize) -> Vec<ColorToken> {
    PALETTE
        .iter()
        .cycle()
        .take(n)
        .map(|&rgb| ColorToken::from_rgb(rgb))
        .collect()
}
