//! Engine configuration.

use crate::geometry::Stroke;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default gap between playback and target time still treated as settled.
pub const DEFAULT_SEEK_TOLERANCE_MS: u64 = 100;

/// Default largest vertical scroll that is still animated.
pub const DEFAULT_SCROLL_THRESHOLD_PX: f64 = 1000.0;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunables for capture, history, scrolling and media gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Playback within this many milliseconds of the target counts as settled.
    pub seek_tolerance_ms: u64,
    /// Vertical scroll deltas up to this many pixels are animated.
    pub scroll_threshold_px: f64,
    /// Style applied to new strokes.
    pub default_stroke: Stroke,
    /// Ramer-Douglas-Peucker tolerance applied on commit (0 disables).
    pub simplify_tolerance: f64,
    /// Hit-test distance in document percent units.
    pub hit_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seek_tolerance_ms: DEFAULT_SEEK_TOLERANCE_MS,
            scroll_threshold_px: DEFAULT_SCROLL_THRESHOLD_PX,
            default_stroke: Stroke::default(),
            simplify_tolerance: 0.0,
            hit_tolerance: 1.0,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration. Missing fields use defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            ConfigError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json).map_err(|e| match e {
            ConfigError::Parse(msg) => {
                ConfigError::Parse(format!("Failed to parse {}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let non_negative = [
            ("scroll_threshold_px", self.scroll_threshold_px),
            ("simplify_tolerance", self.simplify_tolerance),
            ("hit_tolerance", self.hit_tolerance),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        let size = self.default_stroke.size;
        if !size.is_finite() || size <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "default_stroke.size must be positive, got {size}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.seek_tolerance_ms, 100);
        assert!((config.scroll_threshold_px - 1000.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "seek_tolerance_ms": 250 }"#).unwrap();
        assert_eq!(config.seek_tolerance_ms, 250);
        assert_eq!(config.default_stroke, Stroke::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EngineConfig::from_json(r#"{ "hit_tolerance": -1.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = EngineConfig::from_json(
            r#"{
                "default_stroke": { "color": { "r": 0, "g": 0, "b": 0, "a": 255 }, "size": 0.0 }
            }"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = EngineConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "scroll_threshold_px": 400.0 }}"#).unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert!((config.scroll_threshold_px - 400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_json_roundtrip() {
        let config = EngineConfig {
            simplify_tolerance: 0.25,
            ..EngineConfig::default()
        };
        let back = EngineConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
