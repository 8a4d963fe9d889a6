//! Ripple Scheduler - Phase, Step and Queue
//!
//! This crate implements the session-scoped step queue:
//! - Phases: coarse, ranked processing stages
//! - Steps: pending accumulated deltas for one deferred field in one round
//! - Queue: total order over steps (round, phase, sort value, sequence)
//!
//! The queue never touches field values. Steps are owned by the deferred
//! field that created them; the queue only orders `StepEntry` records and
//! hands them back on `pop`.

pub mod phase;
pub mod step;
pub mod queue;

pub use phase::*;
pub use step::*;
pub use queue::*;
