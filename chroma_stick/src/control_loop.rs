// THEORY:
// The control loop is the only place where the engine meets its collaborators:
// a frame source, a UI command source, a key sink and an optional overlay. Each
// is a small trait so the same loop drives a webcam and a window in production
// and in-memory fakes in tests.
//
// One iteration is strictly sequential:
//   read frame -> process -> emit key commands -> render overlay
//             -> poll command -> apply it to the frame on screen -> emit
//
// A command acts on the frame the user was looking at when it arrived, never on
// a later one. Key commands are emitted completely, in order, before anything
// else happens. Whatever ends the loop (quit, end of stream, a broken frame source),
// the pipeline's held keys are released before `run` returns.

use crate::error::StickError;
use crate::pipeline::{ControlPipeline, FrameReport, KeyCommand, KeySymbol, UiCommand};
use image::RgbImage;
use tracing::{error, info};

/// Supplies consecutive frames. `Ok(None)` is end of stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>, StickError>;
}

/// Delivers at most one UI command per call, waiting no longer than a frame.
pub trait UiCommandSource {
    fn poll(&mut self) -> UiCommand;
}

/// Receives key-state commands. Delivery failures are the sink's business.
pub trait KeySink {
    fn key_down(&mut self, symbol: KeySymbol);
    fn key_up(&mut self, symbol: KeySymbol);

    fn apply(&mut self, command: KeyCommand) {
        match command {
            KeyCommand::Down(symbol) => self.key_down(symbol),
            KeyCommand::Up(symbol) => self.key_up(symbol),
        }
    }
}

/// Draws debug output. Never feeds anything back into the pipeline.
pub trait OverlaySink {
    fn render(&mut self, frame: &RgbImage, report: &FrameReport);
}

/// Collects commands in order; handy for tests and dry runs.
impl KeySink for Vec<KeyCommand> {
    fn key_down(&mut self, symbol: KeySymbol) {
        self.push(KeyCommand::Down(symbol));
    }

    fn key_up(&mut self, symbol: KeySymbol) {
        self.push(KeyCommand::Up(symbol));
    }
}

/// An overlay that draws nothing, for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOverlay;

impl OverlaySink for NoOverlay {
    fn render(&mut self, _frame: &RgbImage, _report: &FrameReport) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Quit,
    EndOfStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames: u64,
    pub stop: StopReason,
}

pub struct ControlLoop {
    pipeline: ControlPipeline,
}

impl ControlLoop {
    pub fn new(pipeline: ControlPipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &ControlPipeline {
        &self.pipeline
    }

    pub fn into_pipeline(self) -> ControlPipeline {
        self.pipeline
    }

    /// Runs until quit or end of stream.
    pub fn run<F, C, K, O>(
        &mut self,
        frames: &mut F,
        commands: &mut C,
        keys: &mut K,
        overlay: &mut O,
    ) -> Result<LoopSummary, StickError>
    where
        F: FrameSource + ?Sized,
        C: UiCommandSource + ?Sized,
        K: KeySink + ?Sized,
        O: OverlaySink + ?Sized,
    {
        let mut frames_processed = 0u64;

        let stop = loop {
            let frame = match frames.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!(frames = frames_processed, "frame source ended");
                    break StopReason::EndOfStream;
                }
                Err(err) => {
                    error!(%err, "frame source failed, shutting down");
                    self.release_held(keys);
                    return Err(err);
                }
            };

            let report = self.pipeline.process_frame(&frame);
            frames_processed += 1;
            for command in &report.commands {
                keys.apply(*command);
            }
            overlay.render(&frame, &report);

            let command = commands.poll();
            if command == UiCommand::Quit {
                info!(frames = frames_processed, "quit requested");
                break StopReason::Quit;
            }
            for key_command in self.pipeline.apply_command(command) {
                keys.apply(key_command);
            }
        };

        self.release_held(keys);
        Ok(LoopSummary {
            frames: frames_processed,
            stop,
        })
    }

    fn release_held<K: KeySink + ?Sized>(&mut self, keys: &mut K) {
        for command in self.pipeline.shutdown() {
            keys.apply(command);
        }
    }
}
