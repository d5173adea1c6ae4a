//! Reduction loop benchmarks
//!
//! - Reducer execution in isolation
//! - Dispatch-to-publication round trip through the Store
//! - Effect feedback (handler stream merged back into the timeline)
//! - Fan-out to many subscribers
//!
//! Run with: `cargo bench`

#![allow(missing_docs)] // Benchmarks don't need extensive docs
#![allow(clippy::expect_used)] // Benchmarks can use expect for setup
#![allow(dead_code)] // Benchmark data structures may have unused fields

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use foldstore_core::{actions, handler_fn, ActionStream, Next, Reducer, Scheduler};
use foldstore_runtime::{Store, StoreConfig};
use tokio::runtime::Runtime;

#[derive(Clone, Debug)]
struct BenchState {
    counter: i64,
    data: Vec<u8>, // For testing state size impact
}

impl Default for BenchState {
    fn default() -> Self {
        Self {
            counter: 0,
            data: vec![0; 1024], // 1KB of data
        }
    }
}

#[derive(Clone, Debug)]
enum BenchAction {
    Increment,
    Echo,
    Echoed,
}

#[derive(Clone, Debug)]
enum BenchEffect {
    Echo,
}

#[derive(Clone)]
struct BenchReducer;

impl Reducer for BenchReducer {
    type State = BenchState;
    type Action = BenchAction;
    type Effect = BenchEffect;

    fn reduce(
        &self,
        state: Option<&BenchState>,
        action: BenchAction,
    ) -> Next<BenchState, BenchEffect> {
        match action {
            BenchAction::Increment | BenchAction::Echoed => {
                let mut state = state.cloned().unwrap_or_default();
                state.counter += 1;
                Next::state(state)
            },
            BenchAction::Echo => Next::effect(BenchEffect::Echo),
        }
    }
}

fn echo(effect: BenchEffect, _scheduler: &Scheduler) -> ActionStream<BenchAction> {
    match effect {
        BenchEffect::Echo => actions::just(BenchAction::Echoed),
    }
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime")
}

fn bench_store(runtime: &Runtime) -> Store<BenchState, BenchAction> {
    let config = StoreConfig::new()
        .with_name("bench")
        .with_scheduler(Scheduler::from_handle(runtime.handle().clone()));
    Store::build(Some(BenchState::default()), BenchReducer, handler_fn(echo), config)
        .expect("Failed to build store")
}

/// Benchmark reducer execution in isolation (no Store overhead)
fn benchmark_reducer_execution(c: &mut Criterion) {
    let mut group = c.benchmark_group("reducer");
    group.throughput(Throughput::Elements(1));

    let reducer = BenchReducer;
    let state = BenchState::default();

    group.bench_function("increment", |b| {
        b.iter(|| reducer.reduce(Some(black_box(&state)), black_box(BenchAction::Increment)));
    });

    group.bench_function("effect_only", |b| {
        b.iter(|| reducer.reduce(Some(black_box(&state)), black_box(BenchAction::Echo)));
    });

    group.finish();
}

/// Benchmark dispatch until the resulting state is observed
fn benchmark_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_trip");
    group.throughput(Throughput::Elements(1));

    let runtime = runtime();
    let store = bench_store(&runtime);
    let mut states = store.subscribe();

    group.bench_function("dispatch_and_observe", |b| {
        b.iter(|| {
            runtime.block_on(async {
                while states.try_recv().is_some() {}
                store.dispatch(black_box(BenchAction::Increment)).expect("store running");
                black_box(states.recv().await)
            })
        });
    });

    group.bench_function("effect_feedback", |b| {
        b.iter(|| {
            runtime.block_on(async {
                while states.try_recv().is_some() {}
                store.dispatch(black_box(BenchAction::Echo)).expect("store running");
                black_box(states.recv().await)
            })
        });
    });

    group.finish();
}

/// Benchmark publication to many subscribers
fn benchmark_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("fan_out");

    let runtime = runtime();
    let store = bench_store(&runtime);

    for subscribers in [1_u64, 10, 100] {
        group.throughput(Throughput::Elements(subscribers));
        let mut subscriptions: Vec<_> = (0..subscribers).map(|_| store.subscribe()).collect();

        group.bench_function(format!("subscribers_{subscribers}"), |b| {
            b.iter(|| {
                runtime.block_on(async {
                    for subscription in &mut subscriptions {
                        while subscription.try_recv().is_some() {}
                    }
                    store.dispatch(BenchAction::Increment).expect("store running");
                    for subscription in &mut subscriptions {
                        black_box(subscription.recv().await);
                    }
                });
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_reducer_execution,
    benchmark_round_trip,
    benchmark_fan_out
);
criterion_main!(benches);
