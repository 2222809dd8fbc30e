pub mod events;
pub mod geometry;

pub use events::{Callbacks, EventLog, HoleComplete, SimEvent, SimListener};
pub use geometry::Vec3;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::events::SimEvent;
    use crate::geometry::Vec3;

    /// Assert two floats are within `eps` of each other.
    #[track_caller]
    pub fn assert_close(actual: f32, expected: f32, eps: f32) {
        assert!(
            (actual - expected).abs() <= eps,
            "expected {expected} (+/- {eps}), got {actual}"
        );
    }

    /// Assert two vectors match component-wise within `eps`.
    #[track_caller]
    pub fn assert_vec_close(actual: Vec3, expected: Vec3, eps: f32) {
        assert!(
            (actual.x - expected.x).abs() <= eps
                && (actual.y - expected.y).abs() <= eps
                && (actual.z - expected.z).abs() <= eps,
            "expected {expected:?} (+/- {eps}), got {actual:?}"
        );
    }

    /// The tail of events a capture produces: effect first, then the result.
    pub fn sink_events(strokes: u32) -> [SimEvent; 2] {
        [
            SimEvent::SinkEffectTriggered,
            SimEvent::HoleSunk { strokes },
        ]
    }

    /// Count the `StrokeTaken` events in a sequence.
    pub fn stroke_events(events: &[SimEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SimEvent::StrokeTaken { .. }))
            .count()
    }
}
