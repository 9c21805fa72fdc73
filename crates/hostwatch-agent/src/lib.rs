//! The hostwatch daemon: configuration, the polling loop and the operator
//! console, wired from the library crates.

pub mod config;
pub mod console;
pub mod monitor;
pub mod usage_log;
