//! Startup configuration: defaults, TOML loading and validation.
//!
//! Every field has a default, so an empty file (or no file) is a working
//! configuration. Validation runs once, before the control loop starts.

use crate::core_modules::blob_detector::blob_detector::{
    DEFAULT_MIN_RADIUS, DEFAULT_MORPHOLOGY_ITERATIONS, DetectorSettings,
};
use crate::core_modules::direction::DEFAULT_DEADZONE;
use crate::core_modules::hsv::hsv::{ColorRange, MAX_HUE, MarkerColor};
use crate::core_modules::keys::{EmissionMode, KeySymbol};
use crate::error::{ConfigError, StickError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_FRAME_WIDTH: u32 = 640;
pub const DEFAULT_FRAME_HEIGHT: u32 = 480;

/// Red anchor marker. Red wraps around the hue circle, hence two ranges.
pub fn default_anchor() -> MarkerColor {
    MarkerColor::new(vec![
        ColorRange::new([0, 120, 70], [10, 255, 255]),
        ColorRange::new([170, 120, 70], [179, 255, 255]),
    ])
}

/// Blue joystick marker.
pub fn default_tracked() -> MarkerColor {
    MarkerColor::single(ColorRange::new([90, 80, 50], [130, 255, 255]))
}

/// Key names handed to the injection backend for each symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub up: String,
    pub down: String,
    pub left: String,
    pub right: String,
    pub action: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            up: "w".to_string(),
            down: "s".to_string(),
            left: "a".to_string(),
            right: "d".to_string(),
            action: "space".to_string(),
        }
    }
}

impl KeyBindings {
    pub fn binding(&self, symbol: KeySymbol) -> &str {
        match symbol {
            KeySymbol::Up => &self.up,
            KeySymbol::Down => &self.down,
            KeySymbol::Left => &self.left,
            KeySymbol::Right => &self.right,
            KeySymbol::Action => &self.action,
        }
    }
}

/// Configuration for the whole stick, from camera geometry to key bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickConfig {
    pub frame_width: u32,
    pub frame_height: u32,
    /// Capture device index for the camera runner.
    pub camera_index: i32,
    /// Flip camera frames horizontally so moving right reads as right.
    pub mirror: bool,
    /// Displacement from the origin, in pixels, that still counts as neutral.
    pub deadzone: u32,
    /// A blob must have a strictly larger enclosing radius than this.
    pub min_blob_radius: f32,
    pub morphology_iterations: u8,
    /// Alignment aid, only drawn while uncalibrated.
    pub anchor: MarkerColor,
    /// The marker that drives the stick.
    pub tracked: MarkerColor,
    pub emission: EmissionMode,
    pub keys: KeyBindings,
}

impl Default for StickConfig {
    fn default() -> Self {
        Self {
            frame_width: DEFAULT_FRAME_WIDTH,
            frame_height: DEFAULT_FRAME_HEIGHT,
            camera_index: 0,
            mirror: true,
            deadzone: DEFAULT_DEADZONE,
            min_blob_radius: DEFAULT_MIN_RADIUS,
            morphology_iterations: DEFAULT_MORPHOLOGY_ITERATIONS,
            anchor: default_anchor(),
            tracked: default_tracked(),
            emission: EmissionMode::default(),
            keys: KeyBindings::default(),
        }
    }
}

impl StickConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, StickError> {
        let config: StickConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StickError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading config");
        Self::from_toml_str(&text)
    }

    pub fn detector_settings(&self) -> DetectorSettings {
        DetectorSettings {
            min_radius: self.min_blob_radius,
            morphology_iterations: self.morphology_iterations,
        }
    }

    /// Rejects anything the control loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ConfigError::FrameSize {
                width: self.frame_width,
                height: self.frame_height,
            });
        }
        if self.deadzone == 0 {
            return Err(ConfigError::Deadzone);
        }
        if i32::try_from(self.deadzone).is_err() {
            return Err(ConfigError::DeadzoneTooLarge(self.deadzone));
        }
        if !self.min_blob_radius.is_finite() || self.min_blob_radius <= 0.0 {
            return Err(ConfigError::MinBlobRadius(self.min_blob_radius));
        }
        if self.morphology_iterations == 0 {
            return Err(ConfigError::MorphologyIterations);
        }
        validate_marker("anchor", &self.anchor)?;
        validate_marker("tracked", &self.tracked)?;
        for symbol in KeySymbol::ALL {
            if self.keys.binding(symbol).trim().is_empty() {
                return Err(ConfigError::EmptyKeyBinding {
                    symbol: symbol.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn validate_marker(name: &str, marker: &MarkerColor) -> Result<(), ConfigError> {
    if marker.ranges.is_empty() {
        return Err(ConfigError::EmptyMarker {
            marker: name.to_string(),
        });
    }
    for range in &marker.ranges {
        for hue in [range.lower[0], range.upper[0]] {
            if hue > MAX_HUE {
                return Err(ConfigError::HueOutOfRange {
                    marker: name.to_string(),
                    hue,
                });
            }
        }
        if range.lower.iter().zip(range.upper.iter()).any(|(low, high)| low > high) {
            return Err(ConfigError::InvertedRange {
                marker: name.to_string(),
                lower: range.lower,
                upper: range.upper,
            });
        }
    }
    Ok(())
}
