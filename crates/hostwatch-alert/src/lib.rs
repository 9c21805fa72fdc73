//! Threshold evaluation with per-metric alert de-bouncing.
//!
//! [`evaluator::evaluate`] is the pure transition function: given a reading,
//! its threshold and the current [`state::AlertState`], it updates the state
//! in place and yields an [`AlertEvent`] only on the rising edge of a breach.
//! [`engine::AlertEngine`] owns the state and the thresholds for the
//! lifetime of the polling loop and evaluates one tick's readings at a time.

pub mod engine;
pub mod evaluator;
pub mod state;


pub use hostwatch_common::types::AlertEvent;
