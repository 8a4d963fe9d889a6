//! Graph configuration

use ripple_core::DEFAULT_ZERO_EPSILON;

/// Field graph configuration
#[derive(Clone, Debug)]
pub struct GraphConfig {
    /// Tolerance given to fields constructed without an explicit one
    pub default_tolerance: Option<f64>,
    /// Committed values closer to zero than this become exactly zero
    pub zero_epsilon: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            default_tolerance: None,
            zero_epsilon: DEFAULT_ZERO_EPSILON,
        }
    }
}

impl GraphConfig {
    /// No suppression at all, every non-zero delta propagates
    pub fn exact() -> Self {
        GraphConfig {
            default_tolerance: None,
            zero_epsilon: 0.0,
        }
    }

    /// Suppress infinitesimal deltas, for graphs with feedback loops
    pub fn relaxed() -> Self {
        GraphConfig {
            default_tolerance: Some(1e-5),
            zero_epsilon: DEFAULT_ZERO_EPSILON,
        }
    }
}
