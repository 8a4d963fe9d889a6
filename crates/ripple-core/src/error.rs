//! Error types for the field substrate

use thiserror::Error;

use crate::{FieldId, LinkId};

/// Core substrate errors
///
/// Everything except `StepBudgetExhausted` and `BufferTooShort` is a
/// programming error in the caller's graph construction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RippleError {
    // Graph errors
    #[error("Field not found: {0:?}")]
    FieldNotFound(FieldId),

    #[error("Link not found: {0:?}")]
    LinkNotFound(LinkId),

    #[error("Argument {arg} out of range for {field:?} (arity {arity})")]
    ArgumentOutOfRange {
        field: FieldId,
        arg: usize,
        arity: usize,
    },

    #[error("Argument {arg} of {field:?} is already bound")]
    ArgumentInUse { field: FieldId, arg: usize },

    #[error("No free argument slot on {0:?}")]
    NoFreeArgument(FieldId),

    #[error("Field {0:?} does not accept inputs")]
    NotAnInput(FieldId),

    #[error("Field {0:?} is derived and cannot be assigned")]
    NotAssignable(FieldId),

    #[error("Round increment requires a deferred sink, {0:?} is synchronous")]
    RoundRequiresQueueField(FieldId),

    // Propagation errors
    #[error("Re-entrant update on {0:?}")]
    ReentrantUpdate(FieldId),

    #[error("Step budget exhausted after {0} steps")]
    StepBudgetExhausted(u64),

    // Persistence errors
    #[error("Buffer too short: expected {expected}, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },
}

/// Result type for substrate operations
pub type RippleResult<T> = Result<T, RippleError>;
