//! Configuration enum types.

use crate::draw::{Color, color};
use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Color specification - either a named color or RGB values.
///
/// # Examples
/// ```toml
/// # Named color
/// stroke_color = "black"
///
/// # Custom RGB color (0-255 per component)
/// selected_color = [0, 90, 200]
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
#[serde(untagged)]
pub enum ColorSpec {
    /// Named color: red, green, blue, gray, white, black, transparent
    Name(String),
    /// RGB color as [red, green, blue] where each component is 0-255
    Rgb([u8; 3]),
}

impl ColorSpec {
    /// Converts the color specification to a [`Color`].
    ///
    /// Unknown names fall back to `fallback` with a warning.
    pub fn to_color_or(&self, fallback: Color) -> Color {
        match self {
            ColorSpec::Name(name) => color::name_to_color(name).unwrap_or_else(|| {
                warn!("Unknown color '{}', using fallback", name);
                fallback
            }),
            ColorSpec::Rgb([r, g, b]) => Color::from_rgb8(*r, *g, *b),
        }
    }

    pub(crate) fn is_known(&self) -> bool {
        match self {
            ColorSpec::Name(name) => color::name_to_color(name).is_some(),
            ColorSpec::Rgb(_) => true,
        }
    }
}

/// Where diagram snapshots are stored.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStorageMode {
    /// `$XDG_DATA_HOME/statescriber`
    Auto,
    /// Next to the config file
    Config,
    /// `session.custom_directory`
    Custom,
}

/// Compression preference for snapshot files.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SessionCompression {
    Auto,
    On,
    Off,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_name_uses_fallback() {
        let spec = ColorSpec::Name("chartreuse-ish".to_string());
        assert!(!spec.is_known());
        assert_eq!(spec.to_color_or(color::BLACK), color::BLACK);
    }

    #[test]
    fn rgb_spec_converts() {
        let spec = ColorSpec::Rgb([0, 0, 255]);
        assert_eq!(spec.to_color_or(color::BLACK), color::BLUE);
    }
}
