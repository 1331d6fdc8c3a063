//! Error types for chroma_stick.
//!
//! Only startup and I/O problems are errors. A marker missing from a frame is
//! an ordinary `None`, never a `StickError`.

use thiserror::Error;

/// A configuration value that must be rejected before the control loop starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("frame dimensions must be non-zero, got {width}x{height}")]
    FrameSize { width: u32, height: u32 },

    #[error("deadzone must be a positive number of pixels")]
    Deadzone,

    #[error("deadzone of {0} pixels is larger than any frame coordinate")]
    DeadzoneTooLarge(u32),

    #[error("minimum blob radius must be positive and finite, got {0}")]
    MinBlobRadius(f32),

    #[error("morphology iterations must be at least 1")]
    MorphologyIterations,

    #[error("marker `{marker}` has no color ranges")]
    EmptyMarker { marker: String },

    #[error("marker `{marker}`: hue bound {hue} exceeds 179")]
    HueOutOfRange { marker: String, hue: u8 },

    #[error("marker `{marker}`: lower bound {lower:?} exceeds upper bound {upper:?}")]
    InvertedRange {
        marker: String,
        lower: [u8; 3],
        upper: [u8; 3],
    },

    #[error("key binding for {symbol} is empty")]
    EmptyKeyBinding { symbol: String },
}

#[derive(Error, Debug)]
pub enum StickError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Frame source error: {0}")]
    FrameSource(String),

    #[error("Key injection error: {0}")]
    Injection(String),
}
