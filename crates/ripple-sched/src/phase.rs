//! Processing phases
//!
//! A phase is the coarse ordering stage of a step. Within one round all
//! steps of a lower-ranked phase are dequeued before any step of a
//! higher-ranked phase.

use std::fmt;

/// Processing phase, ordered by rank
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Phase {
    /// Externally observed inputs settle first
    Input = 0,

    /// Ordinary forward inference
    #[default]
    Inference = 1,

    /// Positive/negative feedback loops
    Feedback = 2,

    /// Annealing and other ramped contributions
    Annealing = 3,

    /// Weight and bias adjustments
    Training = 4,

    /// Bookkeeping after the network has settled
    Finalize = 5,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Input,
        Phase::Inference,
        Phase::Feedback,
        Phase::Annealing,
        Phase::Training,
        Phase::Finalize,
    ];

    #[inline]
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            0 => Some(Phase::Input),
            1 => Some(Phase::Inference),
            2 => Some(Phase::Feedback),
            3 => Some(Phase::Annealing),
            4 => Some(Phase::Training),
            5 => Some(Phase::Finalize),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Input => "INPUT",
            Phase::Inference => "INFERENCE",
            Phase::Feedback => "FEEDBACK",
            Phase::Annealing => "ANNEALING",
            Phase::Training => "TRAINING",
            Phase::Finalize => "FINALIZE",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
