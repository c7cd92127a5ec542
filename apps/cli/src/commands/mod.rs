//! Subcommand implementations.

pub mod example;
pub mod steps;
pub mod telemetry;
