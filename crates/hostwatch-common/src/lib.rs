//! Domain types shared by the hostwatch crates.

pub mod types;
