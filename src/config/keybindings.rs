//! Keybinding configuration types and parsing.
//!
//! This module defines the configurable keybinding system that allows users
//! to customize keyboard shortcuts for all actions in the application.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// All possible actions that can be bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    // Selection
    DeleteSelection,
    Deselect,

    // Label editing
    ToggleSuperscript,
    ToggleSubscript,

    // Export (handled by the host)
    ExportPng,
    ExportSvg,
    ExportJson,
}

/// A single keybinding: a key name with optional modifiers.
///
/// Key names are stored lowercase so that "Ctrl+P" and "ctrl+p" are the
/// same binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyBinding {
    /// Parse a keybinding string like "Ctrl+Shift+W" or "Escape".
    /// Modifiers can appear in any order: "Shift+Ctrl+W", "Alt+Shift+Ctrl+W", etc.
    /// Supports spaces around '+' (e.g., "Ctrl + Shift + W")
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Empty keybinding string".to_string());
        }

        // Normalize by removing spaces around '+'
        let s_normalized = s.replace(" + ", "+").replace("+ ", "+").replace(" +", "+");

        // Split on '+' to get all parts
        let parts: Vec<&str> = s_normalized.split('+').collect();

        if parts.is_empty() {
            return Err("Empty keybinding string".to_string());
        }

        let mut ctrl = false;
        let mut shift = false;
        let mut alt = false;
        let mut key_parts = Vec::new();

        // Process each part, checking if it's a modifier or the actual key
        for part in parts {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => ctrl = true,
                "shift" => shift = true,
                "alt" => alt = true,
                _ => {
                    // Not a modifier, so it's part of the key
                    key_parts.push(part);
                }
            }
        }

        // Reconstruct the key from remaining parts (handles cases like "+" being the key)
        if key_parts.is_empty() {
            return Err(format!("No key specified in: {}", s));
        }

        // Join with '+' to handle the case where the key itself is '+'
        // (e.g., "Ctrl+Shift++" becomes ["Ctrl", "Shift", "", ""] with last two being the '+' key)
        let key = key_parts.join("+").to_lowercase();

        if key.is_empty() {
            // This happens for "Ctrl+Shift++" where we have empty strings after the modifiers
            // The key is actually '+'
            Ok(Self {
                key: "+".to_string(),
                ctrl,
                shift,
                alt,
            })
        } else {
            Ok(Self {
                key,
                ctrl,
                shift,
                alt,
            })
        }
    }

    /// Check if this keybinding matches the current input state.
    pub fn matches(&self, key: &str, ctrl: bool, shift: bool, alt: bool) -> bool {
        self.key.eq_ignore_ascii_case(key)
            && self.ctrl == ctrl
            && self.shift == shift
            && self.alt == alt
    }
}

/// Configuration for all keybindings.
///
/// Each action can have multiple keybindings. Users specify them in config.toml as:
/// ```toml
/// [keybindings]
/// delete_selection = ["Delete"]
/// export_png = ["Ctrl+P"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct KeybindingsConfig {
    #[serde(default = "default_delete_selection")]
    pub delete_selection: Vec<String>,

    #[serde(default = "default_deselect")]
    pub deselect: Vec<String>,

    #[serde(default = "default_toggle_superscript")]
    pub toggle_superscript: Vec<String>,

    #[serde(default = "default_toggle_subscript")]
    pub toggle_subscript: Vec<String>,

    #[serde(default = "default_export_png")]
    pub export_png: Vec<String>,

    #[serde(default = "default_export_svg")]
    pub export_svg: Vec<String>,

    #[serde(default = "default_export_json")]
    pub export_json: Vec<String>,
}

impl Default for KeybindingsConfig {
    fn default() -> Self {
        Self {
            delete_selection: default_delete_selection(),
            deselect: default_deselect(),
            toggle_superscript: default_toggle_superscript(),
            toggle_subscript: default_toggle_subscript(),
            export_png: default_export_png(),
            export_svg: default_export_svg(),
            export_json: default_export_json(),
        }
    }
}

impl KeybindingsConfig {
    /// Build a lookup map from keybindings to actions for efficient matching.
    /// Returns an error if any keybinding string is invalid or if duplicates are detected.
    pub fn build_action_map(&self) -> Result<HashMap<KeyBinding, Action>, String> {
        let mut map = HashMap::new();

        let groups = [
            (&self.delete_selection, Action::DeleteSelection),
            (&self.deselect, Action::Deselect),
            (&self.toggle_superscript, Action::ToggleSuperscript),
            (&self.toggle_subscript, Action::ToggleSubscript),
            (&self.export_png, Action::ExportPng),
            (&self.export_svg, Action::ExportSvg),
            (&self.export_json, Action::ExportJson),
        ];

        for (bindings, action) in groups {
            for binding_str in bindings {
                let binding = KeyBinding::parse(binding_str)?;
                if let Some(existing_action) = map.insert(binding, action) {
                    return Err(format!(
                        "Duplicate keybinding '{}' assigned to both {:?} and {:?}",
                        binding_str, existing_action, action
                    ));
                }
            }
        }

        Ok(map)
    }
}

fn default_delete_selection() -> Vec<String> {
    vec!["Delete".to_string()]
}

fn default_deselect() -> Vec<String> {
    vec!["Escape".to_string()]
}

fn default_toggle_superscript() -> Vec<String> {
    vec!["Ctrl+Up".to_string()]
}

fn default_toggle_subscript() -> Vec<String> {
    vec!["Ctrl+Down".to_string()]
}

fn default_export_png() -> Vec<String> {
    vec!["Ctrl+P".to_string()]
}

fn default_export_svg() -> Vec<String> {
    vec!["Ctrl+Shift+S".to_string()]
}

fn default_export_json() -> Vec<String> {
    vec!["Ctrl+J".to_string()]
}
