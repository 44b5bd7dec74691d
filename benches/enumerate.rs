//! Table generation throughput.
//!
//! 1. Single forward pass (normalize + evaluate + select)
//! 2. Packed v3.1 table, parallel vs serial
//! 3. Exhaustive verification of the same table

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use paddle_lut::lut::verify::{verify, Sampling};
use paddle_lut::{load_engine, Policy, RawState};

fn bench_forward(c: &mut Criterion) {
    let engine = load_engine("tile-ratio-v3", "builtin:trained").unwrap();
    let raw = RawState::new(160, 112, 4, -2, 80);
    c.bench_function("decide_one_state", |b| {
        b.iter(|| engine.decide(black_box(&raw)).unwrap())
    });
}

fn bench_generate(c: &mut Criterion) {
    let engine = load_engine("tile-ratio-v3.1", "builtin:trained").unwrap();
    let mut group = c.benchmark_group("generate_v3_1");
    group.sample_size(20);
    group.bench_function("parallel", |b| b.iter(|| engine.generate(true).unwrap()));
    group.bench_function("serial", |b| b.iter(|| engine.generate(false).unwrap()));
    group.finish();
}

fn bench_verify(c: &mut Criterion) {
    let engine = load_engine("tile-ratio-v3.1", "builtin:trained").unwrap();
    let blob = engine.generate(true).unwrap().blob;
    let mut group = c.benchmark_group("verify_v3_1");
    group.sample_size(20);
    group.bench_function("exhaustive", |b| {
        b.iter(|| verify(engine.config(), &blob, &engine, Sampling::Exhaustive).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_forward, bench_generate, bench_verify);
criterion_main!(benches);
