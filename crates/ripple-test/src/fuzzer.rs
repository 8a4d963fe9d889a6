//! Graph Fuzzer - Randomized checking of incremental propagation
//!
//! Builds a layered random graph of sums, differences, products and queue
//! fields, then applies random input updates and link rewiring inside a
//! processing session. After every drained batch each node is compared
//! against a value recomputed from scratch.
//!
//! Tests:
//! - Additivity of sums after the queue drains
//! - Exact retraction on disconnect
//! - Product bootstrap on reconnect

use ripple_core::{FieldId, LinkId, OwnerId, RippleResult};
use ripple_field::{FieldGraph, Multiplication, Phase, Session, Subtraction, Sum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fuzzer configuration
#[derive(Clone, Debug)]
pub struct FuzzerConfig {
    /// Number of input fields
    pub input_count: usize,
    /// Number of node layers above the inputs
    pub layer_count: usize,
    /// Nodes per layer
    pub layer_width: usize,
    /// Number of update batches
    pub batch_count: usize,
    /// Updates per batch
    pub batch_size: usize,
    /// Probability that a node is a queue field
    pub deferred_prob: f64,
    /// Probability that an update toggles a link instead of setting an input
    pub rewire_prob: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        FuzzerConfig {
            input_count: 6,
            layer_count: 4,
            layer_width: 6,
            batch_count: 50,
            batch_size: 8,
            deferred_prob: 0.3,
            rewire_prob: 0.2,
            seed: 42,
        }
    }
}

impl FuzzerConfig {
    /// Light fuzzing for quick tests
    pub fn light() -> Self {
        FuzzerConfig {
            input_count: 3,
            layer_count: 3,
            layer_width: 3,
            batch_count: 10,
            batch_size: 4,
            deferred_prob: 0.3,
            rewire_prob: 0.1,
            seed: 42,
        }
    }

    /// Heavy fuzzing for thorough testing
    pub fn heavy() -> Self {
        FuzzerConfig {
            input_count: 12,
            layer_count: 6,
            layer_width: 12,
            batch_count: 500,
            batch_size: 16,
            deferred_prob: 0.4,
            rewire_prob: 0.3,
            seed: 42,
        }
    }
}

/// What a generated node computes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Input,
    Sum,
    Sub,
    Mul,
    Queue,
}

/// A node value that disagrees with the recomputed one
#[derive(Clone, Debug)]
pub struct Mismatch {
    pub batch: usize,
    pub field: FieldId,
    pub kind: NodeKind,
    pub expected: f64,
    pub actual: f64,
}

/// Fuzzing result
#[derive(Debug, Default)]
pub struct FuzzResult {
    pub updates: u64,
    pub rewires: u64,
    pub steps_processed: u64,
    pub mismatches: Vec<Mismatch>,
}

impl FuzzResult {
    pub fn is_valid(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Graph fuzzer
pub struct GraphFuzzer {
    config: FuzzerConfig,
    rng: StdRng,
    graph: FieldGraph,
    session: Session,
    nodes: Vec<(FieldId, NodeKind)>,
    inputs: Vec<FieldId>,
    links: Vec<LinkId>,
}

const OWNER: OwnerId = OwnerId(0xF022);

impl GraphFuzzer {
    /// Create a new fuzzer
    pub fn new(config: FuzzerConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        GraphFuzzer {
            config,
            rng,
            graph: FieldGraph::new(),
            session: Session::new(),
            nodes: Vec::new(),
            inputs: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn graph(&self) -> &FieldGraph {
        &self.graph
    }

    /// Build the layered graph
    fn build(&mut self) -> RippleResult<()> {
        for i in 0..self.config.input_count {
            let id = self.graph.add_input(OWNER, format!("in{i}"), None);
            self.inputs.push(id);
            self.nodes.push((id, NodeKind::Input));
        }

        let mut previous = self.inputs.clone();
        for layer in 0..self.config.layer_count {
            let mut current = Vec::with_capacity(self.config.layer_width);
            for n in 0..self.config.layer_width {
                let label = format!("l{layer}n{n}");
                let kind = self.pick_kind();
                let (id, sources) = match kind {
                    NodeKind::Sum => {
                        let id = self.graph.add_function(OWNER, label, None, Sum);
                        (id, self.pick_sources(&previous, 3))
                    }
                    NodeKind::Queue => {
                        let phase = Phase::ALL[self.rng.gen_range(0..Phase::ALL.len())];
                        let id = self.graph.add_queue_field(OWNER, label, None, phase);
                        (id, self.pick_sources(&previous, 3))
                    }
                    NodeKind::Sub => {
                        let id = self.graph.add_function(OWNER, label, None, Subtraction);
                        (id, vec![self.pick(&previous), self.pick(&previous)])
                    }
                    // Second factor is always an input field
                    _ => {
                        let id = self.graph.add_function(OWNER, label, None, Multiplication);
                        let inputs = self.inputs.clone();
                        (id, vec![self.pick(&previous), self.pick(&inputs)])
                    }
                };
                for source in sources {
                    let link = self.graph.connect_input(source, id, false, self.session.queue_mut())?;
                    self.links.push(link);
                }
                self.nodes.push((id, kind));
                current.push(id);
            }
            previous = current;
        }
        Ok(())
    }

    fn pick_kind(&mut self) -> NodeKind {
        if self.rng.gen::<f64>() < self.config.deferred_prob {
            return NodeKind::Queue;
        }
        match self.rng.gen_range(0..3) {
            0 => NodeKind::Sum,
            1 => NodeKind::Sub,
            _ => NodeKind::Mul,
        }
    }

    fn pick(&mut self, from: &[FieldId]) -> FieldId {
        from[self.rng.gen_range(0..from.len())]
    }

    fn pick_sources(&mut self, from: &[FieldId], max: usize) -> Vec<FieldId> {
        let count = self.rng.gen_range(1..=max);
        (0..count).map(|_| self.pick(from)).collect()
    }

    /// Run the fuzzer
    pub fn run(&mut self) -> RippleResult<FuzzResult> {
        self.build()?;
        let mut result = FuzzResult::default();

        for batch in 0..self.config.batch_count {
            for _ in 0..self.config.batch_size {
                if !self.links.is_empty() && self.rng.gen::<f64>() < self.config.rewire_prob {
                    let link = self.links[self.rng.gen_range(0..self.links.len())];
                    let queue = self.session.queue_mut();
                    if self.graph.link_ref(link)?.is_connected() {
                        self.graph.disconnect(link, true, queue)?;
                    } else {
                        self.graph.connect(link, true, queue)?;
                    }
                    result.rewires += 1;
                } else {
                    let input = self.inputs[self.rng.gen_range(0..self.inputs.len())];
                    let value = self.rng.gen_range(-1.0..1.0);
                    self.session.set_value(&mut self.graph, input, value)?;
                    result.updates += 1;
                }
            }
            self.session.process(&mut self.graph)?;
            self.check(batch, &mut result.mismatches)?;
        }

        result.steps_processed = self.session.stats().processed;
        Ok(result)
    }

    /// Compare every node against its recomputed value
    fn check(&self, batch: usize, mismatches: &mut Vec<Mismatch>) -> RippleResult<()> {
        let mut expected = vec![0.0; self.nodes.len()];
        for (i, &(id, kind)) in self.nodes.iter().enumerate() {
            let args = self.arguments(id, &expected)?;
            let value = match kind {
                NodeKind::Input => self.graph.value(id)?,
                NodeKind::Sum | NodeKind::Queue => args.iter().sum(),
                NodeKind::Sub => args[0] - args[1],
                NodeKind::Mul => args[0] * args[1],
            };
            expected[i] = value;

            let actual = self.graph.value(id)?;
            if (actual - value).abs() > 1e-6 * (1.0 + value.abs()) {
                mismatches.push(Mismatch {
                    batch,
                    field: id,
                    kind,
                    expected: value,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Recomputed source value per argument, zero where disconnected
    fn arguments(&self, id: FieldId, expected: &[f64]) -> RippleResult<Vec<f64>> {
        let field = self.graph.field(id)?;
        let mut args = Vec::with_capacity(field.inputs().len());
        for slot in field.inputs() {
            let value = match slot.link() {
                Some(link) if slot.is_connected() => {
                    let source = self.graph.link_ref(link)?.source();
                    self.nodes
                        .iter()
                        .position(|&(n, _)| n == source)
                        .map_or(0.0, |index| expected[index])
                }
                _ => 0.0,
            };
            args.push(value);
        }
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fuzzer_light() {
        let mut fuzzer = GraphFuzzer::new(FuzzerConfig::light());
        let result = fuzzer.run().unwrap();
        assert!(result.is_valid(), "{:?}", result.mismatches);
        assert!(result.updates > 0);
    }

    #[test]
    fn test_fuzzer_default() {
        let mut fuzzer = GraphFuzzer::new(FuzzerConfig::default());
        let result = fuzzer.run().unwrap();
        assert!(result.is_valid(), "{:?}", result.mismatches);
        assert!(result.steps_processed > 0);
    }

    #[test]
    fn test_all_deferred() {
        let config = FuzzerConfig {
            deferred_prob: 1.0,
            ..FuzzerConfig::light()
        };
        let mut fuzzer = GraphFuzzer::new(config);
        let result = fuzzer.run().unwrap();
        assert!(result.is_valid(), "{:?}", result.mismatches);
        assert!(fuzzer.graph().fields().all(|f| f.is_input() || f.is_deferred()));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_incremental_matches_recompute(seed in any::<u64>()) {
            let config = FuzzerConfig { seed, ..FuzzerConfig::light() };
            let result = GraphFuzzer::new(config).run().unwrap();
            prop_assert!(result.is_valid(), "{:?}", result.mismatches);
        }
    }
}
