// THEORY:
// This file is the main entry point for the `chroma_stick` library crate. It
// defines the public API consumed by the `stick_runner` binary and by tests.
//
// The primary interface is the `ControlPipeline` (one frame in, one
// `FrameReport` with key commands out) and the `ControlLoop` that drives it
// against a frame source, a UI command source, a key sink and an overlay. The
// per-frame building blocks (color masks, contours, blob detection, calibration,
// direction mapping, presence edges, key state) live in `core_modules` and hold
// no I/O of their own.

pub mod config;
pub mod control_loop;
pub mod core_modules;
pub mod error;
pub mod injector;
pub mod pipeline;
pub mod sources;

pub use config::StickConfig;
pub use control_loop::{ControlLoop, FrameSource, KeySink, OverlaySink, UiCommandSource};
pub use error::{ConfigError, StickError};
pub use pipeline::{ControlPipeline, FrameReport, UiCommand};
