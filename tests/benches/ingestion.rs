//! # Ordering Core Benchmarks
//!
//! | Group | Measures |
//! |-------|----------|
//! | ingestion | build + index + order of full rounds, per validator count |
//! | replay | processing of pre-built random DAGs |
//! | forkless-cause | query cost on a warm index |

use ab_tests::dag::{full_rounds, RandomDag};
use ab_tests::harness::Node;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared_types::Event;
use std::time::Duration;

fn bench_ingestion(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingestion");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(10);

    for validators in [4u32, 10, 30] {
        let ids: Vec<u32> = (1..=validators).collect();
        let specs = full_rounds(&ids, 20, "");
        group.throughput(Throughput::Elements(specs.len() as u64));
        group.bench_with_input(BenchmarkId::new("full_rounds", validators), &specs, |b, specs| {
            b.iter(|| {
                let mut node = Node::equal(ids.iter().copied());
                black_box(node.emit_all(specs).unwrap().len())
            })
        });
    }

    group.finish();
}

fn bench_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay");
    group.sample_size(10);

    for validators in [4u32, 16] {
        let gen = RandomDag {
            max_parents: 5,
            ..RandomDag::honest((1..=validators).collect(), 50)
        };
        let specs = gen.generate(&mut StdRng::seed_from_u64(42));
        let mut origin = Node::equal(gen.validators.iter().copied());
        let events: Vec<Event> = origin.emit_all(&specs).unwrap();

        group.throughput(Throughput::Elements(events.len() as u64));
        group.bench_with_input(BenchmarkId::new("random_dag", validators), &events, |b, events| {
            b.iter(|| {
                let mut node = Node::equal(gen.validators.iter().copied());
                for e in events {
                    node.deliver(e).unwrap();
                }
                black_box(node.blocks().len())
            })
        });
    }

    group.finish();
}

fn bench_forkless_cause(c: &mut Criterion) {
    let ids: Vec<u32> = (1..=10).collect();
    let mut node = Node::equal(ids.iter().copied());
    let events = node.emit_all(&full_rounds(&ids, 10, "")).unwrap();
    let first = events.first().unwrap().id();
    let last = events.last().unwrap().id();
    let index = node.consensus.index().clone();

    c.bench_function("forkless_cause/warm", |b| {
        b.iter(|| black_box(index.forkless_cause(&last, &first).unwrap()))
    });
}

criterion_group!(benches, bench_ingestion, bench_replay, bench_forkless_cause);
criterion_main!(benches);
