//! Editor configuration.

use crate::camera::{MAX_ZOOM, MIN_ZOOM};
use crate::snap::GRID_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Tunables for an editing session. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub grid_size: f64,
    /// Whether grid snapping starts enabled.
    pub snap_to_grid: bool,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Arrow-key nudge distance.
    pub nudge_step: f64,
    /// Arrow-key nudge distance with shift held.
    pub nudge_step_large: f64,
    /// Offset applied to duplicated shapes.
    pub duplicate_offset: f64,
    /// Size given to protocol nodes created by drop or import.
    pub node_width: f64,
    pub node_height: f64,
    /// Size given to asset shapes created by drop.
    pub asset_size: f64,
    /// Handle and connector hit radius in screen pixels.
    pub hit_tolerance: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            snap_to_grid: false,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            nudge_step: 1.0,
            nudge_step_large: 10.0,
            duplicate_offset: 20.0,
            node_width: 200.0,
            node_height: 100.0,
            asset_size: 80.0,
            hit_tolerance: 8.0,
        }
    }
}

impl EditorConfig {
    /// Parse a config from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values a session cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let zoom_ok = self.min_zoom.is_finite()
            && self.max_zoom.is_finite()
            && self.min_zoom > 0.0
            && self.min_zoom <= self.max_zoom;
        if !zoom_ok {
            return Err(ConfigError::Invalid(format!(
                "zoom limits must satisfy 0 < minZoom <= maxZoom (got {} and {})",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(self.grid_size.is_finite() && self.grid_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "gridSize must be positive (got {})",
                self.grid_size
            )));
        }
        Ok(())
    }

    /// Load a config file from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::debug!("Loaded editor config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = EditorConfig::default();
        assert!((config.grid_size - GRID_SIZE).abs() < f64::EPSILON);
        assert!((config.min_zoom - 0.1).abs() < f64::EPSILON);
        assert!((config.max_zoom - 5.0).abs() < f64::EPSILON);
        assert!(!config.snap_to_grid);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            EditorConfig::from_json(r#"{"snapToGrid": true, "nodeWidth": 240}"#).unwrap();
        assert!(config.snap_to_grid);
        assert!((config.node_width - 240.0).abs() < f64::EPSILON);
        assert!((config.node_height - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(EditorConfig::from_json("{"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_rejects_bad_zoom_limits() {
        for json in [
            r#"{"minZoom": 4, "maxZoom": 2}"#,
            r#"{"minZoom": 0}"#,
            r#"{"minZoom": -1, "maxZoom": 2}"#,
            r#"{"gridSize": 0}"#,
        ] {
            assert!(
                matches!(EditorConfig::from_json(json), Err(ConfigError::Invalid(_))),
                "{} should be rejected",
                json
            );
        }
        assert!(EditorConfig::from_json(r#"{"minZoom": 0.5, "maxZoom": 0.5}"#).is_ok());
        assert!(EditorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_load_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");
        std::fs::write(&path, r#"{"minZoom": 3, "maxZoom": 1}"#).unwrap();
        assert!(matches!(EditorConfig::load(&path), Err(ConfigError::Invalid(_))));
    }
}
