use crate::state::AlertState;
use hostwatch_common::types::{AlertEvent, Reading};

/// Applies one reading to the debounce state and returns the alert to send,
/// if any.
///
/// - absent reading: clears the flag, never alerts
/// - `value > threshold` with the flag clear: sets it and alerts
/// - `value > threshold` with the flag set: nothing (breach already reported)
/// - `value <= threshold`: clears the flag
///
/// There is no hysteresis band. A NaN value compares false against the
/// threshold and is handled like a below-threshold reading.
///
/// Only `state` is touched; the same inputs always give the same result.
pub fn evaluate(reading: Reading, threshold: f64, state: &mut AlertState) -> Option<AlertEvent> {
    let kind = reading.kind;

    let Some(value) = reading.value else {
        state.set(kind, false);
        return None;
    };

    if value > threshold {
        if state.is_alerting(kind) {
            return None;
        }
        state.set(kind, true);
        Some(AlertEvent {
            kind,
            value,
            threshold,
        })
    } else {
        state.set(kind, false);
        None
    }
}
