//! Criterion benchmarks for the rigid-body primitives.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nalgebra::DVector;

use armature_rigid::dynamics::{crba, forward_dynamics, rnea};
use armature_test_utils::double_pendulum_rigid;

fn bench_crba(c: &mut Criterion) {
    let (model, mut data) = double_pendulum_rigid();
    let q = DVector::from_vec(vec![0.4, 0.1]);

    c.bench_function("crba_2dof", |b| {
        b.iter(|| {
            crba(&model, &mut data, black_box(&q)).unwrap();
            black_box(&data.mass_matrix);
        });
    });
}

fn bench_rnea(c: &mut Criterion) {
    let (model, mut data) = double_pendulum_rigid();
    let q = DVector::from_vec(vec![0.4, 0.1]);
    let v = DVector::from_vec(vec![0.2, -0.3]);
    let a = DVector::from_vec(vec![0.0, 0.0]);

    c.bench_function("rnea_2dof", |b| {
        b.iter(|| {
            let tau = rnea(&model, &mut data, &q, &v, black_box(&a), None).unwrap();
            black_box(tau);
        });
    });
}

fn bench_forward_dynamics(c: &mut Criterion) {
    let (model, mut data) = double_pendulum_rigid();
    let q = DVector::from_vec(vec![0.4, 0.1]);
    let v = DVector::from_vec(vec![0.2, -0.3]);
    let tau = DVector::from_vec(vec![0.0, 1.0]);

    c.bench_function("forward_dynamics_2dof", |b| {
        b.iter(|| {
            forward_dynamics(&model, &mut data, &q, &v, black_box(&tau), None).unwrap();
            black_box(&data.ddq);
        });
    });
}

criterion_group!(benches, bench_crba, bench_rnea, bench_forward_dynamics);
criterion_main!(benches);
