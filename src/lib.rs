//! Rule-driven week-long simulation of a household PV and battery system.
//!
//! An operating strategy is a list of `condition → action` rules written in
//! a small, sandboxed expression language. The simulator applies the rules
//! hour by hour, checks the physical plausibility of every step and derives
//! costs and emissions from the result.

pub mod cli;
pub mod config;
/// CSV import of input series; CSV and JSON export of results and strategies.
pub mod io;
/// Deterministic default input series.
pub mod profiles;
/// Rule language: parser, sandboxed evaluator and rule sets.
pub mod rules;
pub mod runner;
/// Simulation engine, invariant checks and post-processing.
pub mod sim;
pub mod tables;
pub mod telemetry;

#[cfg(feature = "api")]
pub mod api;
