//! Criterion benchmarks for sensing and episode throughput.
//! Results land under target/criterion by default.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use qcar::prelude::*;
use qcar::sensing::scan;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Default corridor plus `extra` random short walls far from the start.
fn cluttered_track(extra: usize, seed: u64) -> Track {
    let base = Track::default_track();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut walls = base.walls().to_vec();
    for _ in 0..extra {
        let p = Point2D::new(rng.gen_range(40.0..200.0), rng.gen_range(40.0..200.0));
        let q = p + Point2D::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0));
        walls.push(Line2D::new(p, q));
    }
    Track::new(walls, base.destination(), None)
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("sensing");
    for &n in &[0usize, 8, 64, 256] {
        let track = cluttered_track(n, 41);
        let mut vehicle = Vehicle::new(VehicleCfg::default());
        vehicle.set_pose(Point2D::new(0.0, 5.0), 80.0);
        group.bench_with_input(BenchmarkId::new("scan", n), &track, |b, track| {
            b.iter(|| scan(&vehicle, track))
        });
    }
    group.finish();
}

fn bench_episode(c: &mut Criterion) {
    let mut group = c.benchmark_group("episode");
    group.bench_function("default_track_explore", |b| {
        b.iter_batched(
            || {
                let mut cfg = SimCfg::default();
                cfg.train.seed = Some(7);
                cfg.train.max_steps = 500;
                Playground::new(cfg, Track::default_track(), QTable::zeros())
                    .expect("default config is valid")
            },
            |mut pg| pg.run_episode(0.5).expect("no table path, nothing to save"),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_scan, bench_episode);
criterion_main!(benches);
