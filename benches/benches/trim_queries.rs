// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{CubicBez, Point, Rect};
use understory_trim::{CurveSegment, QuadTree, QuadTreeConfig, QueryContext, TrimLoop};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

fn gen_points(n: usize, seed: u64) -> Vec<Point> {
    let mut rng = Rng::new(seed);
    (0..n)
        .map(|_| Point::new(rng.next_f64(), rng.next_f64()))
        .collect()
}

fn gen_rects(n: usize, max_size: f64, seed: u64) -> Vec<Rect> {
    let mut rng = Rng::new(seed);
    (0..n)
        .map(|_| {
            let x0 = rng.next_f64();
            let y0 = rng.next_f64();
            Rect::new(
                x0,
                y0,
                (x0 + max_size * rng.next_f64()).min(1.0),
                (y0 + max_size * rng.next_f64()).min(1.0),
            )
        })
        .collect()
}

/// Star-shaped polygon with `n` vertices.
fn gen_polygon(n: usize, seed: u64) -> TrimLoop {
    let mut rng = Rng::new(seed);
    let pts: Vec<Point> = (0..n)
        .map(|i| {
            let a = std::f64::consts::TAU * i as f64 / n as f64;
            let r = 0.15 + 0.3 * rng.next_f64();
            Point::new(0.5 + r * a.cos(), 0.5 + r * a.sin())
        })
        .collect();
    TrimLoop::from_polygon(&pts).unwrap()
}

/// Closed loop of `n` cubic arcs wobbling around a circle.
fn gen_cubic_loop(n: usize, seed: u64) -> TrimLoop {
    let mut rng = Rng::new(seed);
    let at = |i: usize| {
        let a = std::f64::consts::TAU * (i % n) as f64 / n as f64;
        Point::new(0.5 + 0.35 * a.cos(), 0.5 + 0.35 * a.sin())
    };
    let segs = (0..n)
        .map(|i| {
            let (p0, p3) = (at(i), at(i + 1));
            let mut wobble = || (rng.next_f64() - 0.5) * 0.05;
            let p1 = p0.lerp(p3, 1.0 / 3.0) + (wobble(), wobble());
            let p2 = p0.lerp(p3, 2.0 / 3.0) + (wobble(), wobble());
            CurveSegment::from(CubicBez::new(p0, p1, p2, p3))
        })
        .collect();
    TrimLoop::new(segs).unwrap()
}

fn unit() -> Rect {
    Rect::new(0.0, 0.0, 1.0, 1.0)
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    for &n in &[16_usize, 128, 1024] {
        let polygon = [gen_polygon(n, 0x1234_5678)];
        group.bench_function(format!("polygon_{n}"), |b| {
            b.iter(|| {
                let tree =
                    QuadTree::build_loops(&polygon, unit(), QuadTreeConfig::default()).unwrap();
                black_box(tree.stats());
            })
        });
    }
    let cubic = [gen_cubic_loop(32, 0x8765_4321)];
    group.bench_function("cubic_32", |b| {
        b.iter(|| {
            let tree = QuadTree::build_loops(&cubic, unit(), QuadTreeConfig::default()).unwrap();
            black_box(tree.stats());
        })
    });
    group.finish();
}

fn bench_points(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_trimmed_in");
    let loops = [gen_cubic_loop(32, 0x8765_4321)];
    let tree = QuadTree::build_loops(&loops, unit(), QuadTreeConfig::default()).unwrap();
    let random = gen_points(10_000, 0xABCD_EF01);
    group.throughput(Throughput::Elements(random.len() as u64));
    group.bench_function("random", |b| {
        b.iter_batched(
            QueryContext::new,
            |mut ctx| {
                let hits = random
                    .iter()
                    .filter(|&&p| tree.is_trimmed_in(&mut ctx, p))
                    .count();
                black_box(hits);
            },
            BatchSize::SmallInput,
        )
    });

    // Scanline order keeps most queries in the cached leaf.
    let scan: Vec<Point> = (0..100)
        .flat_map(|j| (0..100).map(move |i| Point::new(i as f64 / 100.0, (j as f64 + 0.5) / 100.0)))
        .collect();
    group.bench_function("scanline", |b| {
        b.iter_batched(
            QueryContext::new,
            |mut ctx| {
                let hits = scan
                    .iter()
                    .filter(|&&p| tree.is_trimmed_in(&mut ctx, p))
                    .count();
                black_box(hits);
            },
            BatchSize::SmallInput,
        )
    });

    // Single leaf: every query resolves by clipping.
    let coarse = QuadTree::build_loops(&loops, unit(), QuadTreeConfig::default().with_max_depth(0))
        .unwrap();
    group.bench_function("unsubdivided", |b| {
        b.iter_batched(
            QueryContext::new,
            |mut ctx| {
                let hits = random
                    .iter()
                    .filter(|&&p| coarse.is_trimmed_in(&mut ctx, p))
                    .count();
                black_box(hits);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_rects(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_trimmed_out");
    let loops = [gen_polygon(256, 0x1234_5678)];
    let tree = QuadTree::build_loops(&loops, unit(), QuadTreeConfig::default()).unwrap();
    for &size in &[0.01, 0.1, 0.5] {
        let rects = gen_rects(4_000, size, 0x0F0F_F0F0);
        group.throughput(Throughput::Elements(rects.len() as u64));
        group.bench_function(format!("max_size_{size}"), |b| {
            b.iter_batched(
                QueryContext::new,
                |mut ctx| {
                    for r in &rects {
                        black_box(tree.is_trimmed_out(&mut ctx, *r));
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_points, bench_rects);
criterion_main!(benches);
