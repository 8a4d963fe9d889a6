//! Ripple Test Harness - Randomized validation of the field substrate
//!
//! This crate provides:
//! - A graph fuzzer that checks incremental results against a from-scratch oracle
//! - Scenarios for feedback convergence and teardown during a session
//! - Criterion benchmarks (see `benches/`)

pub mod fuzzer;
pub mod scenarios;

pub use fuzzer::*;
pub use scenarios::*;
