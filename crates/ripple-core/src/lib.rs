//! Ripple Core - Fundamental types shared by the field substrate
//!
//! This crate defines the vocabulary used throughout the workspace:
//! - Identifiers (FieldId, LinkId, StepId, OwnerId)
//! - Error type and result alias
//! - Numeric constants for update suppression and normalization

pub mod id;
pub mod error;

pub use id::*;
pub use error::*;

/// Magnitudes below this are normalized to exactly zero when a field commits
pub const DEFAULT_ZERO_EPSILON: f64 = 1e-10;

/// Scale applied to a pending delta to derive an integer queue sort key
pub const DEFAULT_SORT_PRECISION: f64 = 1_000_000.0;
