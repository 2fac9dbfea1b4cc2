//! # Lifecycle Benchmarks
//!
//! Performance benchmarks for driving generated processes.
//!
//! Run with: `cargo bench -p procflow-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use procflow_core::{
    CollectionData, Context, DelayBehavior, Entity, EntityFactory, EntityKind, InMemoryRegistry,
    LockablePropertyData, Process, ProcessRunner, RunMode, StepBuilder, TickCondition,
    TransitionBuilder,
};
use std::hint::black_box;

/// A process of `chapters` chapters with `steps` linked steps each. Every
/// step locks one resource and waits one tick.
fn create_linear_process(chapters: usize, steps: usize) -> Process {
    let factory = EntityFactory::default();
    let chapters = (0..chapters)
        .map(|c| {
            let steps = (0..steps)
                .map(|s| {
                    let mut transition = TransitionBuilder::new()
                        .condition(TickCondition::new(format!("c{c}s{s}-wait"), 1).into_entity());
                    if s + 1 < steps {
                        transition = transition.to(format!("c{c}s{}", s + 1));
                    }
                    factory.step(
                        StepBuilder::new(format!("c{c}s{s}"))
                            .behavior(DelayBehavior::new(format!("c{c}s{s}-fx"), 1).into_entity())
                            .lockable(LockablePropertyData::new(format!("res{s}"), true))
                            .transition(transition),
                    )
                })
                .collect();
            factory
                .chapter(format!("chapter{c}"), None, steps)
                .expect("chapter")
        })
        .collect();
    factory.process("bench", chapters).expect("process")
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_run_to_completion(c: &mut Criterion) {
    let mut group = c.benchmark_group("run_to_completion");

    for size in [10, 50, 200].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut runner =
                    ProcessRunner::new(create_linear_process(4, size), InMemoryRegistry::new());
                black_box(runner.run(u64::MAX).expect("run"))
            });
        });
    }

    group.finish();
}

fn bench_fast_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("fast_forward");

    for size in [10, 50, 200].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut runner =
                    ProcessRunner::new(create_linear_process(4, size), InMemoryRegistry::new());
                runner.start().expect("start");
                black_box(runner.fast_forward().expect("fast-forward"))
            });
        });
    }

    group.finish();
}

fn bench_parallel_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_tick");
    let mode = RunMode::default();

    for size in [10, 100, 1000].iter() {
        let children = (0..*size)
            .map(|i| Some(TickCondition::new(format!("t{i}"), u32::MAX).into_entity()))
            .collect();
        let mut parallel = EntityFactory::default().parallel(CollectionData::new(
            "wide",
            EntityKind::from_static("group"),
            children,
        ));
        let mut events = Vec::new();
        {
            let mut ctx = Context::new(&mode, &mut events);
            parallel.activate(&mut ctx).expect("activate");
            parallel.update(&mut ctx).expect("update");
        }

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut events = Vec::new();
                let mut ctx = Context::new(&mode, &mut events);
                parallel.update(&mut ctx).expect("update");
                black_box(events.len())
            });
        });
    }

    group.finish();
}

fn bench_mode_switch(c: &mut Criterion) {
    let mut group = c.benchmark_group("mode_switch");
    let hint = EntityKind::from_static("hint");

    for size in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let children = (0..size)
                    .map(|i| {
                        Some(
                            TickCondition::new(format!("t{i}"), 10)
                                .with_kind(hint.clone())
                                .optional(i % 2 == 0)
                                .into_entity(),
                        )
                    })
                    .collect();
                let mut parallel = EntityFactory::default().parallel(CollectionData::new(
                    "wide",
                    EntityKind::from_static("group"),
                    children,
                ));
                let default_mode = RunMode::default();
                let skipping = RunMode::new("Fast").skipping(hint.clone());
                let mut events = Vec::new();
                {
                    let mut ctx = Context::new(&default_mode, &mut events);
                    parallel.activate(&mut ctx).expect("activate");
                }
                let mut ctx = Context::new(&skipping, &mut events);
                parallel.configure(&mut ctx).expect("configure");
                black_box(events.len())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_run_to_completion,
    bench_fast_forward,
    bench_parallel_tick,
    bench_mode_switch,
);
criterion_main!(benches);
