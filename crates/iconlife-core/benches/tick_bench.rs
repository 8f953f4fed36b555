//! # Tick Loop Benchmarks
//!
//! Measures one full simulation tick at increasing populations. Every pair
//! pass is quadratic, so this is the number to watch when adding agents.
//!
//! Run: `cargo bench --bench tick_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use iconlife_core::Simulation;

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    for per_kind in [1usize, 3, 6, 10] {
        let mut sim = Simulation::with_default_config(42);
        sim.populate(per_kind);
        // settle the initial placement before measuring
        sim.run(60);
        let agents = sim.agent_count();

        group.throughput(Throughput::Elements(agents as u64));
        group.bench_with_input(BenchmarkId::from_parameter(agents), &agents, |b, _| {
            b.iter(|| {
                sim.tick();
                black_box(sim.tick_count())
            })
        });
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut sim = Simulation::with_default_config(42);
    sim.populate(3);
    sim.run(60);

    c.bench_function("snapshot", |b| {
        b.iter(|| black_box(sim.snapshot("bench")))
    });
}

criterion_group!(benches, bench_tick, bench_snapshot);
criterion_main!(benches);
