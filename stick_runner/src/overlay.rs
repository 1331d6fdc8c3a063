//! The debug window: the frame plus calibration hints and the stick state.

use crate::camera::cv_error;
use chroma_stick::control_loop::{OverlaySink, UiCommandSource};
use chroma_stick::error::StickError;
use chroma_stick::pipeline::{Blob, CalibrationState, FrameReport, UiCommand};
use image::RgbImage;
use opencv::{
    core::{self, Mat, Scalar},
    highgui, imgproc,
    prelude::*,
};
use tracing::warn;

pub const WINDOW: &str = "CV Joystick";

// BGR
const WHITE: (f64, f64, f64) = (255.0, 255.0, 255.0);
const GREEN: (f64, f64, f64) = (0.0, 255.0, 0.0);
const RED: (f64, f64, f64) = (0.0, 0.0, 255.0);
const BLUE: (f64, f64, f64) = (255.0, 0.0, 0.0);
const YELLOW: (f64, f64, f64) = (0.0, 255.0, 255.0);

fn color((b, g, r): (f64, f64, f64)) -> Scalar {
    Scalar::new(b, g, r, 0.0)
}

pub struct WindowOverlay {
    deadzone: i32,
    failed: bool,
}

impl WindowOverlay {
    pub fn new(deadzone: u32) -> Result<Self, StickError> {
        highgui::named_window(WINDOW, highgui::WINDOW_AUTOSIZE).map_err(cv_error)?;
        Ok(Self {
            deadzone: ring_radius(deadzone),
            failed: false,
        })
    }

    fn draw(&self, frame: &RgbImage, report: &FrameReport) -> opencv::Result<()> {
        let mut rgb = Mat::new_rows_cols_with_default(
            frame.height() as i32,
            frame.width() as i32,
            core::CV_8UC3,
            Scalar::all(0.0),
        )?;
        rgb.data_bytes_mut()?.copy_from_slice(frame.as_raw());
        let mut canvas = Mat::default();
        imgproc::cvt_color(&rgb, &mut canvas, imgproc::COLOR_RGB2BGR, 0)?;

        match report.calibration {
            CalibrationState::Uncalibrated => {
                text(&mut canvas, "Align points and press 'c' to calibrate", 30, WHITE)?;
                if let (Some(anchor), Some(tracked)) = (&report.anchor, &report.tracked) {
                    ring(&mut canvas, anchor, RED)?;
                    ring(&mut canvas, tracked, BLUE)?;
                }
            }
            CalibrationState::Calibrated { origin } => {
                if let Some(tracked) = &report.tracked {
                    let origin = core::Point::new(origin.x, origin.y);
                    let center = core::Point::new(tracked.center.x, tracked.center.y);
                    imgproc::circle(&mut canvas, origin, self.deadzone, color(GREEN), 2, imgproc::LINE_8, 0)?;
                    imgproc::circle(&mut canvas, origin, 5, color(RED), -1, imgproc::LINE_8, 0)?;
                    ring(&mut canvas, tracked, BLUE)?;
                    imgproc::line(&mut canvas, origin, center, color(YELLOW), 2, imgproc::LINE_8, 0)?;
                }
                text(&mut canvas, &format!("Direction: {}", report.directions), 30, GREEN)?;
                text(&mut canvas, "Press 'r' to re-calibrate", 60, WHITE)?;
            }
        }

        highgui::imshow(WINDOW, &canvas)
    }
}

/// Deadzone as an OpenCV radius, saturating instead of wrapping negative.
fn ring_radius(deadzone: u32) -> i32 {
    i32::try_from(deadzone).unwrap_or(i32::MAX)
}

fn ring(canvas: &mut Mat, blob: &Blob, bgr: (f64, f64, f64)) -> opencv::Result<()> {
    imgproc::circle(
        canvas,
        core::Point::new(blob.center.x, blob.center.y),
        blob.radius as i32,
        color(bgr),
        3,
        imgproc::LINE_8,
        0,
    )
}

fn text(canvas: &mut Mat, content: &str, y: i32, bgr: (f64, f64, f64)) -> opencv::Result<()> {
    imgproc::put_text(
        canvas,
        content,
        core::Point::new(10, y),
        imgproc::FONT_HERSHEY_SIMPLEX,
        0.7,
        color(bgr),
        2,
        imgproc::LINE_AA,
        false,
    )
}

impl OverlaySink for WindowOverlay {
    fn render(&mut self, frame: &RgbImage, report: &FrameReport) {
        if let Err(err) = self.draw(frame, report) {
            if !self.failed {
                warn!(%err, "overlay drawing failed");
                self.failed = true;
            }
        }
    }
}

/// Window keys: `c` calibrate, `r` recalibrate, `q` or Esc quit.
#[derive(Debug, Default)]
pub struct WindowCommands;

impl UiCommandSource for WindowCommands {
    fn poll(&mut self) -> UiCommand {
        match highgui::wait_key(1) {
            Ok(key) => command_for_key(key),
            Err(err) => {
                warn!(%err, "reading window keys failed");
                UiCommand::None
            }
        }
    }
}

fn command_for_key(key: i32) -> UiCommand {
    if key < 0 {
        return UiCommand::None;
    }
    match (key & 0xFF) as u8 {
        b'c' => UiCommand::Calibrate,
        b'r' => UiCommand::Recalibrate,
        b'q' | 27 => UiCommand::Quit,
        _ => UiCommand::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_keys_map_to_commands() {
        assert_eq!(command_for_key(-1), UiCommand::None);
        assert_eq!(command_for_key(b'c' as i32), UiCommand::Calibrate);
        assert_eq!(command_for_key(b'r' as i32), UiCommand::Recalibrate);
        assert_eq!(command_for_key(b'q' as i32), UiCommand::Quit);
        assert_eq!(command_for_key(27), UiCommand::Quit);
        assert_eq!(command_for_key(0x100000 | b'c' as i32), UiCommand::Calibrate);
        assert_eq!(command_for_key(b'x' as i32), UiCommand::None);
    }

    #[test]
    fn huge_deadzone_saturates_the_ring_radius() {
        assert_eq!(ring_radius(40), 40);
        assert_eq!(ring_radius(i32::MAX as u32), i32::MAX);
        assert_eq!(ring_radius(u32::MAX), i32::MAX);
    }
}
