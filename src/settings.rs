//! Game settings
//!
//! Loaded from an optional JSON file; every field falls back to its default.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{MAX_FRAME_DELTA_MS, RELAXED_SPEED_MULTIPLIER};

/// Speed presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpeedPreset {
    #[default]
    Standard,
    /// Slower stepping for touch play
    Relaxed,
}

impl SpeedPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeedPreset::Standard => "Standard",
            SpeedPreset::Relaxed => "Relaxed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" | "normal" => Some(SpeedPreset::Standard),
            "relaxed" | "touch" => Some(SpeedPreset::Relaxed),
            _ => None,
        }
    }

    /// Step-interval multiplier (larger is slower)
    pub fn multiplier(&self) -> f64 {
        match self {
            SpeedPreset::Standard => 1.0,
            SpeedPreset::Relaxed => RELAXED_SPEED_MULTIPLIER,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("speed multiplier must be positive and finite, got {0}")]
    SpeedMultiplier(f64),
    #[error("max frame delta must be positive and finite, got {0} ms")]
    FrameDelta(f64),
}

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub speed_preset: SpeedPreset,
    /// Explicit multiplier, wins over the preset
    pub speed_multiplier_override: Option<f64>,
    /// Fixed RNG seed for reproducible boards and AI
    pub seed: Option<u64>,
    /// Per-frame elapsed time clamp (ms)
    pub max_frame_delta_ms: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed_preset: SpeedPreset::Standard,
            speed_multiplier_override: None,
            seed: None,
            max_frame_delta_ms: MAX_FRAME_DELTA_MS,
        }
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

impl Settings {
    pub fn from_preset(preset: SpeedPreset) -> Self {
        Self {
            speed_preset: preset,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let Some(path) = path else {
            log::info!("Using default settings");
            return Ok(Self::default());
        };
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if let Some(mult) = self.speed_multiplier_override {
            if !positive(mult) {
                return Err(SettingsError::SpeedMultiplier(mult));
            }
        }
        if !positive(self.max_frame_delta_ms) {
            return Err(SettingsError::FrameDelta(self.max_frame_delta_ms));
        }
        Ok(())
    }

    /// Effective step-interval multiplier
    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier_override
            .unwrap_or_else(|| self.speed_preset.multiplier())
    }

    /// Configured seed, or a fresh random one
    pub fn seed_or_random(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.speed_multiplier(), 1.0);
        assert_eq!(settings.max_frame_delta_ms, MAX_FRAME_DELTA_MS);
        assert!(settings.validate().is_ok());

        let parsed = Settings::from_json("{}").unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_preset_and_override() {
        let relaxed = Settings::from_preset(SpeedPreset::Relaxed);
        assert_eq!(relaxed.speed_multiplier(), RELAXED_SPEED_MULTIPLIER);

        let settings =
            Settings::from_json(r#"{"speed_preset":"relaxed","speed_multiplier_override":0.5,"seed":42}"#)
                .unwrap();
        assert_eq!(settings.speed_preset, SpeedPreset::Relaxed);
        assert_eq!(settings.speed_multiplier(), 0.5);
        assert_eq!(settings.seed_or_random(), 42);
    }

    #[test]
    fn test_preset_names() {
        for preset in [SpeedPreset::Standard, SpeedPreset::Relaxed] {
            assert_eq!(SpeedPreset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(SpeedPreset::from_str("ludicrous"), None);
    }

    #[test]
    fn test_invalid_settings() {
        assert!(matches!(
            Settings::from_json(r#"{"speed_multiplier_override":0.0}"#),
            Err(SettingsError::SpeedMultiplier(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{"max_frame_delta_ms":-5.0}"#),
            Err(SettingsError::FrameDelta(_))
        ));
        assert!(matches!(
            Settings::from_json("{not json"),
            Err(SettingsError::Parse(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let settings = Settings {
            seed: Some(7),
            ..Settings::from_preset(SpeedPreset::Relaxed)
        };
        let json = settings.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_load_without_path() {
        assert_eq!(Settings::load(None).unwrap(), Settings::default());
    }
}
