//! User settings, read once at startup.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::mapper::DragReference;

/// What deleting a marker does to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionOnDelete {
    /// Clear the selection on every delete, whichever marker was selected.
    #[default]
    Always,
    /// Clear it only when the deleted marker is the selected one.
    IfSelected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Factor applied by the zoom buttons.
    pub zoom_step: f32,
    pub drag_reference: DragReference,
    pub selection_on_delete: SelectionOnDelete,
    /// Pin height in screen pixels.
    pub pin_size: f32,
    pub window_size: [f32; 2],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_zoom: 0.5,
            max_zoom: 4.0,
            zoom_step: 1.25,
            drag_reference: DragReference::default(),
            selection_on_delete: SelectionOnDelete::default(),
            pin_size: 24.0,
            window_size: [1200.0, 800.0],
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("floorplan-annotate").join("config.json"))
    }

    /// Reads the config file, falling back to defaults when it is missing or
    /// unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            log::debug!("no config directory, using defaults");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => {
                log::info!("loaded config from {}", path.display());
                config
            }
            Err(err) => {
                log::warn!("ignoring config: {err:#}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self = serde_json::from_str(&data)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config.sanitized())
    }

    /// Repairs zoom limits that would make the view unusable.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.min_zoom.is_finite() && self.min_zoom > 0.0) {
            self.min_zoom = defaults.min_zoom;
        }
        if !(self.max_zoom.is_finite() && self.max_zoom >= self.min_zoom) {
            self.max_zoom = self.min_zoom.max(defaults.max_zoom);
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            self.zoom_step = defaults.zoom_step;
        }
        if !(self.pin_size.is_finite() && self.pin_size > 0.0) {
            self.pin_size = defaults.pin_size;
        }
        self
    }
}
