//! Frame and command sources that need no camera or window.
//!
//! `ImageSequenceSource` replays a directory of stills; the others exist for
//! tests and scripted demos.

use crate::control_loop::{FrameSource, UiCommandSource};
use crate::error::StickError;
use crate::pipeline::UiCommand;
use image::RgbImage;
use image::imageops;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Frames read from the image files of one directory, in file-name order.
#[derive(Debug)]
pub struct ImageSequenceSource {
    paths: VecDeque<PathBuf>,
    mirror: bool,
}

impl ImageSequenceSource {
    pub fn open(dir: impl AsRef<Path>, mirror: bool) -> Result<Self, StickError> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && is_image(&path) {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(StickError::FrameSource(format!(
                "no image files in {}",
                dir.display()
            )));
        }
        paths.sort();
        info!(dir = %dir.display(), frames = paths.len(), "replaying image sequence");
        Ok(Self {
            paths: paths.into(),
            mirror,
        })
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, StickError> {
        let Some(path) = self.paths.pop_front() else {
            return Ok(None);
        };
        debug!(path = %path.display(), "reading frame");
        let frame = image::open(&path)?.to_rgb8();
        if self.mirror {
            Ok(Some(imageops::flip_horizontal(&frame)))
        } else {
            Ok(Some(frame))
        }
    }
}

/// Frames already in memory.
#[derive(Debug, Default)]
pub struct InMemoryFrames {
    frames: VecDeque<RgbImage>,
}

impl InMemoryFrames {
    pub fn new(frames: impl IntoIterator<Item = RgbImage>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for InMemoryFrames {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, StickError> {
        Ok(self.frames.pop_front())
    }
}

/// Asks for calibration after every frame.
///
/// Calibrating is a no-op while already calibrated or with no marker in view,
/// so a replay calibrates at the first frame the tracked marker shows up.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoCalibrate;

impl UiCommandSource for AutoCalibrate {
    fn poll(&mut self) -> UiCommand {
        UiCommand::Calibrate
    }
}

/// Plays a fixed list of commands, then `UiCommand::None` forever.
#[derive(Debug, Default)]
pub struct ScriptedCommands {
    script: VecDeque<UiCommand>,
}

impl ScriptedCommands {
    pub fn new(script: impl IntoIterator<Item = UiCommand>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

impl UiCommandSource for ScriptedCommands {
    fn poll(&mut self) -> UiCommand {
        self.script.pop_front().unwrap_or_default()
    }
}
