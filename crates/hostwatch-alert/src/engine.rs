use crate::evaluator::evaluate;
use crate::state::AlertState;
use hostwatch_common::types::{AlertEvent, Reading, Thresholds};

/// Owns the thresholds and the debounce state for the polling loop.
///
/// The engine is not shared: the loop holds it by value, so the state needs
/// no locking.
pub struct AlertEngine {
    thresholds: Thresholds,
    state: AlertState,
}

impl AlertEngine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            state: AlertState::new(),
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn state(&self) -> &AlertState {
        &self.state
    }

    /// Evaluates one tick's readings, in the order given, and returns the
    /// alerts raised by this tick in that same order.
    pub fn ingest(&mut self, readings: &[Reading]) -> Vec<AlertEvent> {
        let mut events = Vec::new();

        for reading in readings {
            let threshold = self.thresholds.get(reading.kind);
            let was_alerting = self.state.is_alerting(reading.kind);

            match evaluate(*reading, threshold, &mut self.state) {
                Some(event) => {
                    tracing::info!(
                        metric = %event.kind,
                        value = event.value,
                        threshold,
                        "Threshold exceeded"
                    );
                    events.push(event);
                }
                None if was_alerting && self.state.is_alerting(reading.kind) => {
                    tracing::debug!(
                        metric = %reading.kind,
                        value = ?reading.value,
                        "Alert suppressed (breach already reported)"
                    );
                }
                None if was_alerting => {
                    tracing::info!(
                        metric = %reading.kind,
                        value = ?reading.value,
                        threshold,
                        "Alert cleared"
                    );
                }
                None => {}
            }
        }

        events
    }
}
