//! Bounded execution of operator console commands.
//!
//! A command line is split into shell words and run directly as program +
//! arguments (never through a shell). Before anything is spawned the program
//! name is checked against a denylist. While running, the child is held to a
//! wall-clock timeout and a combined stdout/stderr byte budget; breaking
//! either kills its whole process group. Every path ends in a
//! [`CommandResult`], never an error, so the caller always has something to
//! show the operator.

pub mod policy;
pub mod result;
pub mod runner;


pub use policy::CommandPolicy;
pub use result::{CommandOutcome, CommandResult};
pub use runner::{Sandbox, SandboxLimits};
