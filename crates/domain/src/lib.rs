//! Shared types for the cardano-up crates: errors, configuration, the
//! environment/release catalogue and structured trace events.

pub mod catalog;
pub mod config;
pub mod error;
pub mod trace;
