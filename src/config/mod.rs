//! Configuration file support for statescriber.
//!
//! This module handles loading and validating user settings from the configuration file
//! located at `~/.config/statescriber/config.toml`. Settings include state and label
//! appearance, pointer tolerances, the redraw/autosave timer, snapshot storage, export
//! defaults and keybindings.
//!
//! If no config file exists, sensible defaults are used automatically.

pub mod enums;
pub mod keybindings;
pub mod types;

pub use enums::{ColorSpec, SessionCompression, SessionStorageMode};
pub use keybindings::{Action, KeyBinding, KeybindingsConfig};
pub use types::{
    DrawingConfig, ExportConfig, InteractionConfig, SessionConfig, TickerConfig,
};

use crate::draw::{FontDescriptor, Palette, RenderStyle, color};
use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure containing all user settings.
///
/// # Example TOML
/// ```toml
/// [drawing]
/// default_state_radius = 30.0
/// font_family = "Serif"
/// selected_color = "blue"
///
/// [interaction]
/// snap_padding = 6.0
/// transition_search_radius = 6.0
///
/// [ticker]
/// interval_ms = 500
///
/// [keybindings]
/// delete_selection = ["Delete"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    /// State, edge and label appearance
    #[serde(default)]
    pub drawing: DrawingConfig,

    /// Snapping and pointer tolerances
    #[serde(default)]
    pub interaction: InteractionConfig,

    /// Redraw, caret blink and autosave timer
    #[serde(default)]
    pub ticker: TickerConfig,

    /// Snapshot storage
    #[serde(default)]
    pub session: SessionConfig,

    /// Export defaults
    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub keybindings: KeybindingsConfig,
}

impl Config {
    /// Validates and clamps all configuration values to acceptable ranges.
    ///
    /// Invalid values are clamped to the nearest valid value and a warning is
    /// logged.
    pub fn validate_and_clamp(&mut self) {
        clamp_f64(
            &mut self.drawing.default_state_radius,
            5.0,
            200.0,
            "drawing.default_state_radius",
        );
        clamp_f64(&mut self.drawing.line_width, 0.5, 10.0, "drawing.line_width");
        clamp_f64(&mut self.drawing.font_size, 6.0, 72.0, "drawing.font_size");
        clamp_f64(
            &mut self.interaction.snap_padding,
            0.0,
            50.0,
            "interaction.snap_padding",
        );
        clamp_f64(
            &mut self.interaction.resize_tolerance,
            1.0,
            50.0,
            "interaction.resize_tolerance",
        );
        clamp_f64(
            &mut self.interaction.transition_search_radius,
            1.0,
            50.0,
            "interaction.transition_search_radius",
        );
        clamp_f64(
            &mut self.interaction.min_perpendicular_distance,
            0.0,
            0.5,
            "interaction.min_perpendicular_distance",
        );
        clamp_f64(&mut self.export.scale, 0.25, 8.0, "export.scale");

        if !(50..=5000).contains(&self.ticker.interval_ms) {
            warn!(
                "Invalid ticker.interval_ms {}, clamping to 50-5000 range",
                self.ticker.interval_ms
            );
            self.ticker.interval_ms = self.ticker.interval_ms.clamp(50, 5000);
        }

        let valid_weight = matches!(
            self.drawing.font_weight.to_lowercase().as_str(),
            "normal" | "bold" | "light" | "ultralight" | "heavy" | "ultrabold"
        ) || self
            .drawing
            .font_weight
            .parse::<u32>()
            .is_ok_and(|w| (100..=900).contains(&w));
        if !valid_weight {
            warn!(
                "Invalid font_weight '{}', falling back to 'normal'",
                self.drawing.font_weight
            );
            self.drawing.font_weight = "normal".to_string();
        }

        if !matches!(
            self.drawing.font_style.to_lowercase().as_str(),
            "normal" | "italic" | "oblique"
        ) {
            warn!(
                "Invalid font_style '{}', falling back to 'normal'",
                self.drawing.font_style
            );
            self.drawing.font_style = "normal".to_string();
        }

        for (name, spec) in [
            ("background_color", &self.drawing.background_color),
            ("stroke_color", &self.drawing.stroke_color),
            ("selected_color", &self.drawing.selected_color),
        ] {
            if !spec.is_known() {
                warn!("Unknown drawing.{name} {spec:?}; the default will be used");
            }
        }

        if self.session.storage == SessionStorageMode::Custom
            && self
                .session
                .custom_directory
                .as_deref()
                .is_none_or(|dir| dir.trim().is_empty())
        {
            warn!("session.storage = \"custom\" without session.custom_directory; using auto");
            self.session.storage = SessionStorageMode::Auto;
        }

        if StrftimeItems::new(&self.export.filename_template)
            .any(|item| matches!(item, Item::Error))
        {
            warn!(
                "Invalid export.filename_template '{}', falling back to the default",
                self.export.filename_template
            );
            self.export.filename_template = ExportConfig::default().filename_template;
        }
    }

    /// Colors for rendering, with fallbacks for unknown names.
    pub fn palette(&self) -> Palette {
        Palette {
            background: self.drawing.background_color.to_color_or(color::WHITE),
            stroke: self.drawing.stroke_color.to_color_or(color::BLACK),
            selected: self.drawing.selected_color.to_color_or(color::BLUE),
        }
    }

    pub fn render_style(&self) -> RenderStyle {
        RenderStyle {
            line_width: self.drawing.line_width,
            font: FontDescriptor::new(
                self.drawing.font_family.clone(),
                self.drawing.font_weight.clone(),
                self.drawing.font_style.clone(),
            ),
            font_size: self.drawing.font_size,
        }
    }

    /// Returns the path to the configuration file.
    ///
    /// The config file is located at `~/.config/statescriber/config.toml`.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("statescriber");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from the default location, or returns defaults if not found.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Loads configuration from `config_path`, or returns defaults if the
    /// file does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

        config.validate_and_clamp();

        info!("Loaded config from {}", config_path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Writes the documented example config to the default location.
    ///
    /// # Errors
    /// Returns an error if a config file already exists or cannot be written.
    pub fn create_default_file() -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            return Err(anyhow::anyhow!(
                "Config file already exists at {}",
                config_path.display()
            ));
        }

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let default_config = include_str!("../../config.example.toml");
        fs::write(&config_path, default_config)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        info!("Created default config at {}", config_path.display());
        Ok(config_path)
    }

    /// JSON schema of the config file, for editor integration.
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Config)
    }
}

fn clamp_f64(value: &mut f64, min: f64, max: f64, name: &str) {
    if !value.is_finite() {
        warn!("Invalid {name} {value}, resetting to {min:.2}");
        *value = min;
    } else if !(min..=max).contains(value) {
        warn!("Invalid {name} {value:.2}, clamping to {min:.2}-{max:.2} range");
        *value = value.clamp(min, max);
    }
}
