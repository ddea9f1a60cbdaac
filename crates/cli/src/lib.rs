//! Command-line front end for the cardano-up session registry.

pub mod cli;
pub mod launch;
