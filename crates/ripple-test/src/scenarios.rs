//! Session scenarios
//!
//! Small end-to-end graphs with a known closed-form outcome:
//! - Damped feedback loop closed over a round-incrementing link
//! - Queue fields torn down while their steps are pending

use ripple_core::{OwnerId, RippleResult};
use ripple_field::{FieldGraph, GraphConfig, Phase, Session};

const OWNER: OwnerId = OwnerId(0x5CE7);

/// Outcome of a scenario run
#[derive(Clone, Debug)]
pub struct ScenarioResult {
    /// Value of the observed field after the session drained
    pub value: f64,
    /// Closed-form value the field should approach
    pub expected: f64,
    /// Rounds the session spanned
    pub rounds: u64,
    /// Steps applied
    pub processed: u64,
}

impl ScenarioResult {
    pub fn within(&self, tolerance: f64) -> bool {
        (self.value - self.expected).abs() <= tolerance
    }
}

/// `x = input + gain * x`, with the feedback term lagged by one round.
///
/// Every field gets `tolerance`, which is what ends the loop: once the
/// correction falls below it, nothing more is scheduled. For `|gain| < 1`
/// the value approaches `input / (1 - gain)`.
pub fn damped_feedback(gain: f64, input: f64, tolerance: f64) -> RippleResult<ScenarioResult> {
    let mut graph = FieldGraph::with_config(GraphConfig {
        default_tolerance: Some(tolerance),
        ..GraphConfig::default()
    });
    let mut session = Session::new();

    let a = graph.add_input(OWNER, "input", None);
    let x = graph.add_queue_field(OWNER, "x", None, Phase::Feedback);
    graph.connect_input(a, x, false, session.queue_mut())?;
    let echo = graph.scale(OWNER, "gain*x", gain, Some(x), session.queue_mut())?;
    if let Some(echo) = echo {
        graph.connect_input(echo, x, true, session.queue_mut())?;
    }

    session.set_value(&mut graph, a, input)?;
    let stats = session.process(&mut graph)?.clone();

    Ok(ScenarioResult {
        value: graph.value(x)?,
        expected: input / (1.0 - gain),
        rounds: stats.rounds(),
        processed: stats.processed,
    })
}

/// `fan_out` queue fields copy one input into a sum; `removed` of them are
/// torn down before the session drains.
pub fn teardown_mid_session(fan_out: usize, removed: usize, input: f64) -> RippleResult<ScenarioResult> {
    let mut graph = FieldGraph::new();
    let mut session = Session::new();

    let a = graph.add_input(OWNER, "input", None);
    let mut copies = Vec::with_capacity(fan_out);
    for i in 0..fan_out {
        let q = graph.add_queue_field(OWNER, format!("copy{i}"), None, Phase::Inference);
        graph.connect_input(a, q, false, session.queue_mut())?;
        copies.push(q);
    }
    let total = graph.sum(OWNER, "total", &copies, session.queue_mut())?;

    session.set_value(&mut graph, a, input)?;
    let removed = removed.min(fan_out);
    for &q in &copies[..removed] {
        graph.remove_field(q, true, session.queue_mut())?;
    }
    let stats = session.process(&mut graph)?.clone();

    Ok(ScenarioResult {
        value: graph.value(total)?,
        expected: input * (fan_out - removed) as f64,
        rounds: stats.rounds(),
        processed: stats.processed,
    })
}
