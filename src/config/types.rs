//! Configuration type definitions.

use super::enums::{ColorSpec, SessionCompression, SessionStorageMode};
use crate::diagram::{DEFAULT_MIN_PERPENDICULAR_DISTANCE, DEFAULT_TRANSITION_SEARCH_RADIUS};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Appearance of states, transitions and labels.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DrawingConfig {
    /// Radius given to newly created states, in pixels (valid range: 5.0 - 200.0)
    #[serde(default = "default_state_radius")]
    pub default_state_radius: f64,

    /// Stroke width for circles and edges (valid range: 0.5 - 10.0)
    #[serde(default = "default_line_width")]
    pub line_width: f64,

    /// Label font size in points (valid range: 6.0 - 72.0)
    #[serde(default = "default_font_size")]
    pub font_size: f64,

    /// Font family for labels; falls back to Pango's default if unavailable
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Font weight (e.g., "normal", "bold", "light", 400, 700)
    #[serde(default = "default_font_weight")]
    pub font_weight: String,

    /// Font style (e.g., "normal", "italic", "oblique")
    #[serde(default = "default_font_style")]
    pub font_style: String,

    #[serde(default = "default_background_color")]
    pub background_color: ColorSpec,

    #[serde(default = "default_stroke_color")]
    pub stroke_color: ColorSpec,

    /// Color of the selected state or transition
    #[serde(default = "default_selected_color")]
    pub selected_color: ColorSpec,
}

impl Default for DrawingConfig {
    fn default() -> Self {
        Self {
            default_state_radius: default_state_radius(),
            line_width: default_line_width(),
            font_size: default_font_size(),
            font_family: default_font_family(),
            font_weight: default_font_weight(),
            font_style: default_font_style(),
            background_color: default_background_color(),
            stroke_color: default_stroke_color(),
            selected_color: default_selected_color(),
        }
    }
}

/// Pointer tolerances and snapping.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InteractionConfig {
    /// Align dragged states with neighbours on the same row/column
    #[serde(default = "default_snap_enabled")]
    pub snap_enabled: bool,

    /// Distance in pixels within which snapping applies (valid range: 0.0 - 50.0)
    #[serde(default = "default_snap_padding")]
    pub snap_padding: f64,

    /// How close to a selected state's edge a press must be to start resizing
    #[serde(default = "default_resize_tolerance")]
    pub resize_tolerance: f64,

    /// Pixel tolerance when clicking on transitions (valid range: 1.0 - 50.0)
    #[serde(default = "default_transition_search_radius")]
    pub transition_search_radius: f64,

    /// Bends smaller than this fraction of the edge length snap to straight
    #[serde(default = "default_min_perpendicular_distance")]
    pub min_perpendicular_distance: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            snap_enabled: default_snap_enabled(),
            snap_padding: default_snap_padding(),
            resize_tolerance: default_resize_tolerance(),
            transition_search_radius: default_transition_search_radius(),
            min_perpendicular_distance: default_min_perpendicular_distance(),
        }
    }
}

/// Redraw / caret blink / autosave timer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TickerConfig {
    /// Tick interval in milliseconds (valid range: 50 - 5000)
    #[serde(default = "default_tick_interval_ms")]
    pub interval_ms: u64,

    /// Save the diagram on ticks where it changed
    #[serde(default = "default_autosave")]
    pub autosave: bool,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_tick_interval_ms(),
            autosave: default_autosave(),
        }
    }
}

/// On-disk snapshot settings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionConfig {
    #[serde(default = "default_session_storage")]
    pub storage: SessionStorageMode,

    /// Directory used when `storage = "custom"`; `~/` is expanded
    #[serde(default)]
    pub custom_directory: Option<String>,

    #[serde(default = "default_session_compression")]
    pub compress: SessionCompression,

    /// Payload size at which `compress = "auto"` switches to gzip
    #[serde(default = "default_auto_compress_threshold_kb")]
    pub auto_compress_threshold_kb: u64,

    /// Snapshots larger than this are neither written nor read
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Keep the previous snapshot as `.bak` (0 disables)
    #[serde(default = "default_backup_retention")]
    pub backup_retention: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage: default_session_storage(),
            custom_directory: None,
            compress: default_session_compression(),
            auto_compress_threshold_kb: default_auto_compress_threshold_kb(),
            max_file_size_mb: default_max_file_size_mb(),
            backup_retention: default_backup_retention(),
        }
    }
}

/// PNG/SVG/JSON export defaults.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportConfig {
    /// Output directory; `~/` is expanded
    #[serde(default = "default_export_directory")]
    pub directory: String,

    /// File name template with chrono format specifiers (no extension)
    #[serde(default = "default_filename_template")]
    pub filename_template: String,

    /// Raster scale factor (valid range: 0.25 - 8.0)
    #[serde(default = "default_export_scale")]
    pub scale: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            directory: default_export_directory(),
            filename_template: default_filename_template(),
            scale: default_export_scale(),
        }
    }
}

fn default_state_radius() -> f64 {
    30.0
}

fn default_line_width() -> f64 {
    1.0
}

fn default_font_size() -> f64 {
    20.0
}

fn default_font_family() -> String {
    "Serif".to_string()
}

fn default_font_weight() -> String {
    "normal".to_string()
}

fn default_font_style() -> String {
    "normal".to_string()
}

fn default_background_color() -> ColorSpec {
    ColorSpec::Name("white".to_string())
}

fn default_stroke_color() -> ColorSpec {
    ColorSpec::Name("black".to_string())
}

fn default_selected_color() -> ColorSpec {
    ColorSpec::Name("blue".to_string())
}

fn default_snap_enabled() -> bool {
    true
}

fn default_snap_padding() -> f64 {
    6.0
}

fn default_resize_tolerance() -> f64 {
    10.0
}

fn default_transition_search_radius() -> f64 {
    DEFAULT_TRANSITION_SEARCH_RADIUS
}

fn default_min_perpendicular_distance() -> f64 {
    DEFAULT_MIN_PERPENDICULAR_DISTANCE
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_autosave() -> bool {
    true
}

fn default_session_storage() -> SessionStorageMode {
    SessionStorageMode::Auto
}

fn default_session_compression() -> SessionCompression {
    SessionCompression::Auto
}

fn default_auto_compress_threshold_kb() -> u64 {
    100
}

fn default_max_file_size_mb() -> u64 {
    10
}

fn default_backup_retention() -> usize {
    1
}

fn default_export_directory() -> String {
    "~/Pictures/Statescriber".to_string()
}

fn default_filename_template() -> String {
    "diagram_%Y-%m-%d_%H%M%S".to_string()
}

fn default_export_scale() -> f64 {
    1.0
}
