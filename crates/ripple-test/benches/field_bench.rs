//! Benchmarks for Ripple field propagation and scheduling

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use ripple_core::{FieldId, OwnerId};
use ripple_field::{FieldGraph, Phase, Queue, Session};
use ripple_sched::{Step, StepEntry};

const OWNER: OwnerId = OwnerId(1);

fn bench_fan_out_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out_propagation");
    for width in [10usize, 100, 1000] {
        let mut graph = FieldGraph::new();
        let mut queue = Queue::new();
        let a = graph.add_input(OWNER, "a", None);
        for i in 0..width {
            let s = graph.sum(OWNER, format!("s{i}"), &[a], &mut queue).unwrap();
            graph.scale(OWNER, format!("k{i}"), 0.5, Some(s), &mut queue).unwrap();
        }

        let mut value = 0.0;
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| {
                value += 1.0;
                graph.set_value(a, black_box(value), &mut queue).unwrap();
            })
        });
    }
    group.finish();
}

fn bench_chain_depth(c: &mut Criterion) {
    let mut graph = FieldGraph::new();
    let mut queue = Queue::new();
    let a = graph.add_input(OWNER, "a", None);
    let mut last = a;
    for i in 0..200 {
        last = graph.sum(OWNER, format!("c{i}"), &[last], &mut queue).unwrap();
    }

    let mut value = 0.0;
    c.bench_function("chain_depth_200", |b| {
        b.iter(|| {
            value += 1.0;
            graph.set_value(a, black_box(value), &mut queue).unwrap();
        })
    });
    black_box(graph.value(last).unwrap());
}

fn bench_deferred_session(c: &mut Criterion) {
    let mut graph = FieldGraph::new();
    let mut session = Session::new();
    let inputs: Vec<FieldId> = (0..64)
        .map(|i| graph.add_input(OWNER, format!("in{i}"), None))
        .collect();
    for (i, &input) in inputs.iter().enumerate() {
        let phase = Phase::ALL[i % Phase::ALL.len()];
        let q = graph.add_queue_field(OWNER, format!("q{i}"), None, phase);
        graph.connect_input(input, q, false, session.queue_mut()).unwrap();
    }

    let mut value = 0.0;
    c.bench_function("deferred_session_64", |b| {
        b.iter(|| {
            value += 1.0;
            for &input in &inputs {
                session.set_value(&mut graph, input, value).unwrap();
            }
            session.process(&mut graph).unwrap();
        })
    });
}

fn bench_queue_churn(c: &mut Criterion) {
    let mut queue = Queue::new();
    let mut steps: Vec<Step> = (0..256)
        .map(|i| {
            Step::new(
                queue.next_step_id(),
                FieldId::new(i),
                OWNER,
                Phase::ALL[i as usize % Phase::ALL.len()],
                0,
            )
        })
        .collect();

    c.bench_function("queue_add_pop_256", |b| {
        b.iter(|| {
            for step in steps.iter_mut() {
                queue.add(step);
            }
            let mut last: Option<StepEntry> = None;
            while let Some(entry) = queue.pop() {
                last = Some(entry);
            }
            for step in steps.iter_mut() {
                step.mark_dequeued();
            }
            black_box(last)
        })
    });
}

fn bench_resort(c: &mut Criterion) {
    let mut queue = Queue::new();
    let mut steps: Vec<Step> = (0..256)
        .map(|i| Step::new(queue.next_step_id(), FieldId::new(i), OWNER, Phase::Annealing, 0))
        .collect();
    for step in steps.iter_mut() {
        queue.add(step);
    }

    let mut tick = 0i64;
    c.bench_function("queue_resort_256", |b| {
        b.iter(|| {
            tick += 1;
            for (i, step) in steps.iter_mut().enumerate() {
                queue.resort(step, black_box(-(tick * 31 + i as i64) % 1000));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_fan_out_propagation,
    bench_chain_depth,
    bench_deferred_session,
    bench_queue_churn,
    bench_resort,
);
criterion_main!(benches);
