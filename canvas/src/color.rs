//! RGB fill colors and their CSS representations.

#[cfg(test)]
#[path = "color_test.rs"]
mod color_test;

use serde::{Deserialize, Serialize};

use crate::consts::TEXT_CONTRAST_THRESHOLD;

/// Text color used on light fills.
pub const DARK_TEXT: &str = "black";

/// Text color used on dark fills.
pub const LIGHT_TEXT: &str = "white";

/// An opaque RGB color, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Canonical lowercase `#rrggbb`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parse `#RGB` or `#RRGGBB`, ignoring surrounding whitespace.
    #[must_use]
    pub fn from_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim().strip_prefix('#')?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let expanded = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => hex.to_owned(),
            _ => return None,
        };
        let Ok(packed) = u32::from_str_radix(&expanded, 16) else {
            return None;
        };
        let [_, r, g, b] = packed.to_be_bytes();
        Some(Self { r, g, b })
    }

    /// Perceived brightness on a 0–255 scale (`0.299r + 0.587g + 0.114b`).
    #[must_use]
    pub fn luminance(self) -> f64 {
        0.299 * f64::from(self.r) + 0.587 * f64::from(self.g) + 0.114 * f64::from(self.b)
    }

    /// The text color that stays readable on top of this fill.
    #[must_use]
    pub fn contrasting_text_color(self) -> &'static str {
        if self.luminance() > TEXT_CONTRAST_THRESHOLD { DARK_TEXT } else { LIGHT_TEXT }
    }
}
