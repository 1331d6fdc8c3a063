// THEORY:
// The presence-edge detector turns "the marker disappeared" into a button press.
// Covering the marker with a hand (or turning it away) is the fallback action
// gesture. It must fire once per gesture, not once per frame the marker stays
// hidden, so only the visible -> hidden *edge* counts.
//
// The only memory is whether the marker was visible last frame. It is updated on
// every frame, calibrated or not, so a transition that happened before
// calibration can never be replayed afterwards.

/// One-shot signal: the tracked marker vanished this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionEvent;

/// Visibility of the tracked marker on the previous frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresenceEdgeState {
    pub was_visible: bool,
}

impl PresenceEdgeState {
    /// Records this frame's visibility and reports a visible -> hidden edge.
    pub fn observe(&mut self, visible: bool) -> Option<ActionEvent> {
        let fired = self.was_visible && !visible;
        self.was_visible = visible;
        fired.then_some(ActionEvent)
    }

    /// Forces the remembered visibility, used when calibration succeeds.
    pub fn reset(&mut self, visible: bool) {
        self.was_visible = visible;
    }
}
