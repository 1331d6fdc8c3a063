// THEORY:
// Calibration fixes "where the stick rests". The marker's position at the moment
// the user asks for it becomes the origin every later displacement is measured
// from. It is a two-state cycle with no terminal state:
//
//   Uncalibrated --Calibrate (marker visible)--> Calibrated
//   Calibrated   --Recalibrate-----------------> Uncalibrated
//
// A calibration request with no marker in view is simply deferred: the state does
// not change and the user can try again. A second calibration while already
// calibrated is ignored; moving the origin always takes an explicit recalibrate.

use crate::core_modules::blob::{Blob, Point};
use tracing::{debug, info};

/// Whether an origin has been fixed, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationState {
    #[default]
    Uncalibrated,
    Calibrated { origin: Point },
}

/// What a calibration-related event did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationOutcome {
    /// Newly calibrated at the given origin.
    Calibrated(Point),
    /// Calibration was cleared.
    Reset,
    /// Nothing changed (no marker, or already calibrated).
    Unchanged,
}

impl CalibrationState {
    pub fn is_calibrated(&self) -> bool {
        matches!(self, CalibrationState::Calibrated { .. })
    }

    /// The origin, readable only while calibrated.
    pub fn origin(&self) -> Option<Point> {
        match self {
            CalibrationState::Calibrated { origin } => Some(*origin),
            CalibrationState::Uncalibrated => None,
        }
    }

    /// Handles a calibrate request given the tracked marker seen this frame.
    pub fn calibrate(&mut self, blob: Option<&Blob>) -> CalibrationOutcome {
        match (*self, blob) {
            (CalibrationState::Calibrated { .. }, _) => {
                debug!("calibrate ignored: already calibrated");
                CalibrationOutcome::Unchanged
            }
            (CalibrationState::Uncalibrated, None) => {
                debug!("calibrate deferred: tracked marker not visible");
                CalibrationOutcome::Unchanged
            }
            (CalibrationState::Uncalibrated, Some(blob)) => {
                *self = CalibrationState::Calibrated { origin: blob.center };
                info!(x = blob.center.x, y = blob.center.y, "calibrated");
                CalibrationOutcome::Calibrated(blob.center)
            }
        }
    }

    /// Clears calibration unconditionally.
    pub fn recalibrate(&mut self) -> CalibrationOutcome {
        let was_calibrated = self.is_calibrated();
        *self = CalibrationState::Uncalibrated;
        if was_calibrated {
            info!("calibration reset");
        }
        CalibrationOutcome::Reset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob_at(x: i32, y: i32) -> Blob {
        Blob::new(Point::new(x, y), 18.0)
    }

    #[test]
    fn starts_uncalibrated() {
        let state = CalibrationState::default();
        assert!(!state.is_calibrated());
        assert_eq!(state.origin(), None);
    }

    #[test]
    fn calibrate_without_blob_is_deferred() {
        let mut state = CalibrationState::default();
        assert_eq!(state.calibrate(None), CalibrationOutcome::Unchanged);
        assert_eq!(state, CalibrationState::Uncalibrated);
    }

    #[test]
    fn calibrate_takes_blob_center_exactly() {
        let mut state = CalibrationState::default();
        let outcome = state.calibrate(Some(&blob_at(321, 177)));
        assert_eq!(outcome, CalibrationOutcome::Calibrated(Point::new(321, 177)));
        assert_eq!(state.origin(), Some(Point::new(321, 177)));
    }

    #[test]
    fn second_calibrate_is_ignored() {
        let mut state = CalibrationState::default();
        state.calibrate(Some(&blob_at(10, 10)));
        assert_eq!(state.calibrate(Some(&blob_at(99, 99))), CalibrationOutcome::Unchanged);
        assert_eq!(state.origin(), Some(Point::new(10, 10)));
    }

    #[test]
    fn recalibrate_clears_and_allows_new_origin() {
        let mut state = CalibrationState::default();
        state.calibrate(Some(&blob_at(10, 10)));
        assert_eq!(state.recalibrate(), CalibrationOutcome::Reset);
        assert_eq!(state.origin(), None);
        state.calibrate(Some(&blob_at(50, 60)));
        assert_eq!(state.origin(), Some(Point::new(50, 60)));
    }

    #[test]
    fn recalibrate_while_uncalibrated_stays_uncalibrated() {
        let mut state = CalibrationState::default();
        state.recalibrate();
        assert_eq!(state, CalibrationState::Uncalibrated);
    }
}
