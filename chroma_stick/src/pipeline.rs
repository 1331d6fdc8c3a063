// THEORY:
// The `pipeline` module is the top-level, per-frame API of the engine. It owns all
// state that must survive between frames (calibration, presence memory, which
// keys are held, the last tracked blob) in a single `ControlState` and threads it
// explicitly through the stateless components:
//
//   frame -> blob detection (anchor + tracked)
//         -> calibrated?  direction mapping + presence edge
//         -> desired key set -> ordered key commands
//
//   UI command -> calibrate against the blob of the frame on screen
//              -> or recalibrate and release everything held
//
// A UI command is read while a frame is being shown, so it is applied to that
// frame's tracked blob with `apply_command`, before the next frame is read.
//
// It never talks to a camera, a window or the OS keyboard. Both entry points hand
// back key commands; the control loop decides where they go.

use crate::core_modules::blob_detector::blob_detector::{self, DetectorSettings};
use crate::core_modules::calibration::CalibrationOutcome;
use crate::core_modules::direction::direction_mapper;
use crate::core_modules::keys::{KeySet, KeyState};
use crate::core_modules::presence::PresenceEdgeState;
use image::RgbImage;
use tracing::{debug, info, trace};

// Re-export key data structures for the public API.
pub use crate::config::StickConfig;
pub use crate::core_modules::blob::{Blob, Point};
pub use crate::core_modules::calibration::CalibrationState;
pub use crate::core_modules::direction::{Direction, DirectionSet};
pub use crate::core_modules::keys::{EmissionMode, KeyCommand, KeySymbol};
pub use crate::core_modules::presence::ActionEvent;

/// A discrete event from the user interface, polled once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiCommand {
    #[default]
    None,
    Calibrate,
    Recalibrate,
    Quit,
}

/// Everything that persists across frames.
#[derive(Debug, Clone, Default)]
pub struct ControlState {
    pub calibration: CalibrationState,
    pub presence: PresenceEdgeState,
    pub keys: KeyState,
    /// Tracked marker of the most recently processed frame.
    pub last_tracked: Option<Blob>,
}

/// The outcome of one frame, for the key sink and the overlay.
#[derive(Debug, Clone)]
pub struct FrameReport {
    /// 1-based index of the frame within this pipeline's lifetime.
    pub frame_index: u64,
    pub anchor: Option<Blob>,
    pub tracked: Option<Blob>,
    pub calibration: CalibrationState,
    pub directions: DirectionSet,
    pub action: Option<ActionEvent>,
    /// Key-state commands for the injection service, in emission order.
    pub commands: Vec<KeyCommand>,
}

/// The perception-to-control engine.
pub struct ControlPipeline {
    config: StickConfig,
    detector: DetectorSettings,
    state: ControlState,
    frame_count: u64,
}

impl ControlPipeline {
    /// Builds a pipeline from a configuration that has already been validated.
    pub fn new(config: StickConfig) -> Self {
        let detector = config.detector_settings();
        Self {
            config,
            detector,
            state: ControlState::default(),
            frame_count: 0,
        }
    }

    pub fn process_frame(&mut self, frame: &RgbImage) -> FrameReport {
        self.frame_count += 1;

        let anchor = blob_detector::find_blob(frame, &self.config.anchor, &self.detector);
        let tracked = blob_detector::find_blob(frame, &self.config.tracked, &self.detector);
        trace!(frame = self.frame_count, ?anchor, ?tracked, "detected");

        let edge = self.state.presence.observe(tracked.is_some());
        self.state.last_tracked = tracked;

        let (directions, action, commands) = match self.state.calibration.origin() {
            Some(origin) => {
                let directions = tracked
                    .map(|blob| direction_mapper::map(origin, blob.center, self.config.deadzone))
                    .unwrap_or(DirectionSet::NEUTRAL);
                if edge.is_some() {
                    info!(frame = self.frame_count, "tracked marker vanished: action");
                }
                let desired = KeySet::from_directions(&directions, edge.is_some());
                let commands = self.state.keys.transition(desired, self.config.emission);
                (directions, edge, commands)
            }
            None => (DirectionSet::NEUTRAL, None, self.state.keys.release_all()),
        };
        if !commands.is_empty() {
            debug!(frame = self.frame_count, ?commands, "key commands");
        }

        FrameReport {
            frame_index: self.frame_count,
            anchor,
            tracked,
            calibration: self.state.calibration,
            directions,
            action,
            commands,
        }
    }

    /// Applies a UI command read while the last processed frame was on screen.
    ///
    /// Returns the key commands it causes: a recalibration releases every held key.
    pub fn apply_command(&mut self, command: UiCommand) -> Vec<KeyCommand> {
        match command {
            UiCommand::Calibrate => {
                let tracked = self.state.last_tracked;
                if let CalibrationOutcome::Calibrated(_) = self.state.calibration.calibrate(tracked.as_ref()) {
                    self.state.presence.reset(true);
                }
                Vec::new()
            }
            UiCommand::Recalibrate => {
                self.state.calibration.recalibrate();
                let commands = self.state.keys.release_all();
                if !commands.is_empty() {
                    debug!(?commands, "released on recalibrate");
                }
                commands
            }
            UiCommand::None | UiCommand::Quit => Vec::new(),
        }
    }

    /// Key-ups for every held symbol. Call once when the loop stops.
    pub fn shutdown(&mut self) -> Vec<KeyCommand> {
        self.state.keys.release_all()
    }

    pub fn config(&self) -> &StickConfig {
        &self.config
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn calibration(&self) -> CalibrationState {
        self.state.calibration
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
