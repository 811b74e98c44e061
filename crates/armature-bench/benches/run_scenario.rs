//! Criterion benchmarks for the reference scenario run.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use armature_bench::{scenario_simulator, scenario_state};
use armature_engine::Solver;

fn bench_dopri5_100ms(c: &mut Criterion) {
    let mut sim = scenario_simulator(Solver::RungeKuttaDopri5);
    let x0 = scenario_state();

    // Warm up: one run so the first-time allocations are done.
    sim.run(&x0, 0.1).unwrap();

    c.bench_function("dopri5_100ms", |b| {
        b.iter(|| {
            sim.run(black_box(&x0), 0.1).unwrap();
            black_box(sim.log());
        });
    });
}

fn bench_euler_100ms(c: &mut Criterion) {
    let mut sim = scenario_simulator(Solver::ExplicitEuler);
    let mut node = sim.engine_options();
    // The fixed-step solver needs a finer step to stay accurate.
    node.node_mut("stepper").unwrap().set("dtMax", 2.0e-4);
    sim.set_engine_options(&node).unwrap();
    let x0 = scenario_state();

    sim.run(&x0, 0.1).unwrap();

    c.bench_function("euler_100ms", |b| {
        b.iter(|| {
            sim.run(black_box(&x0), 0.1).unwrap();
            black_box(sim.log());
        });
    });
}

fn bench_dopri5_full_scenario(c: &mut Criterion) {
    let mut sim = scenario_simulator(Solver::RungeKuttaDopri5);
    let x0 = scenario_state();

    sim.run(&x0, 0.05).unwrap();

    c.bench_function("dopri5_3s", |b| {
        b.iter(|| {
            sim.run(black_box(&x0), 3.0).unwrap();
            black_box(sim.log());
        });
    });
}

criterion_group!(
    benches,
    bench_dopri5_100ms,
    bench_euler_100ms,
    bench_dopri5_full_scenario
);
criterion_main!(benches);
