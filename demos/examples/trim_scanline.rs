// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trim scanline.
//!
//! Rasterize a curved trim loop to ASCII, one query per character in scanline
//! order, and report how often the cached leaf answered.
//!
//! Run:
//! - `cargo run -p understory_trim_demos --example trim_scanline`

use kurbo::{CubicBez, Point, QuadBez, Rect};
use understory_trim::{CurveSegment, QuadTree, QueryContext, TrimLoop, TrimState};

const COLS: usize = 64;
const ROWS: usize = 32;

fn main() {
    // A leaf-like outline: two cubic sides meeting at sharp tips, closed by a
    // quadratic notch at the stem.
    let tip = Point::new(0.5, 0.95);
    let left = Point::new(0.45, 0.1);
    let right = Point::new(0.55, 0.1);
    let segs = vec![
        CurveSegment::from(CubicBez::new(tip, Point::new(0.05, 0.8), Point::new(0.05, 0.3), left)),
        CurveSegment::from(QuadBez::new(left, Point::new(0.5, 0.3), right)),
        CurveSegment::from(CubicBez::new(right, Point::new(0.95, 0.3), Point::new(0.95, 0.8), tip)),
    ];
    let outline = TrimLoop::new(segs).unwrap();
    let tree = QuadTree::build(&outline, Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();
    let stats = tree.stats();
    println!(
        "{} nodes, {} leaves ({} mixed), depth {}",
        stats.nodes, stats.leaves, stats.mixed_leaves, stats.depth
    );

    let mut ctx = QueryContext::new();
    // Top row first so the picture is upright.
    for row in (0..ROWS).rev() {
        let v = (row as f64 + 0.5) / ROWS as f64;
        let line: String = (0..COLS)
            .map(|col| {
                let p = Point::new((col as f64 + 0.5) / COLS as f64, v);
                match (tree.is_trimmed_in(&mut ctx, p), tree.locate(p).map(|l| l.state)) {
                    (true, Some(TrimState::Mixed)) => '+',
                    (true, _) => '#',
                    (false, Some(TrimState::Mixed)) => '.',
                    (false, _) => ' ',
                }
            })
            .collect();
        println!("|{line}|");
    }
    println!(
        "cache: {} hits, {} misses",
        ctx.cache_hits(),
        ctx.cache_misses()
    );
}
