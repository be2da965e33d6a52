// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trim basics.
//!
//! Build a quadtree over a square loop with a circular hole, then classify a
//! few points and rectangles.
//!
//! Run:
//! - `cargo run -p understory_trim_demos --example trim_basics`

use kurbo::{Circle, PathEl, Point, Rect, Shape};
use understory_trim::{CurveSegment, QuadTree, QuadTreeConfig, QueryContext, TrimLoop};

/// Convert a closed kurbo shape into a trim loop.
fn loop_from_shape(shape: &impl Shape) -> TrimLoop {
    let mut segs = Vec::new();
    let mut last = Point::ZERO;
    let mut start = Point::ZERO;
    for el in shape.path_elements(0.1) {
        match el {
            PathEl::MoveTo(p) => {
                last = p;
                start = p;
            }
            PathEl::LineTo(p) => {
                segs.push(CurveSegment::line(last, p).unwrap());
                last = p;
            }
            PathEl::QuadTo(p1, p2) => {
                segs.push(CurveSegment::new(&[last, p1, p2]).unwrap());
                last = p2;
            }
            PathEl::CurveTo(p1, p2, p3) => {
                segs.push(CurveSegment::new(&[last, p1, p2, p3]).unwrap());
                last = p3;
            }
            PathEl::ClosePath => {
                if last != start {
                    segs.push(CurveSegment::line(last, start).unwrap());
                }
                last = start;
            }
        }
    }
    TrimLoop::new(segs).unwrap()
}

fn main() {
    let outer = TrimLoop::from_polygon(&[
        Point::new(0.1, 0.1),
        Point::new(0.9, 0.1),
        Point::new(0.9, 0.9),
        Point::new(0.1, 0.9),
    ])
    .unwrap();
    let hole = loop_from_shape(&Circle::new((0.5, 0.5), 0.2));
    let loops = [outer, hole];

    let domain = Rect::new(0.0, 0.0, 1.0, 1.0);
    let tree = QuadTree::build_loops(&loops, domain, QuadTreeConfig::default()).unwrap();
    println!("{tree:?}");

    let mut ctx = QueryContext::new();
    println!("== Points ==");
    for p in [
        Point::new(0.05, 0.5),
        Point::new(0.2, 0.5),
        Point::new(0.5, 0.5),
        Point::new(0.69, 0.5),
        Point::new(0.71, 0.5),
    ] {
        let leaf = tree.locate(p).map(|l| l.state);
        println!(
            "  {:?}: in={} (leaf {:?})",
            p,
            tree.is_trimmed_in(&mut ctx, p),
            leaf
        );
    }

    println!("== Rectangles ==");
    for r in [
        Rect::new(0.0, 0.0, 0.08, 0.08),
        Rect::new(0.12, 0.12, 0.25, 0.25),
        Rect::new(0.45, 0.45, 0.55, 0.55),
        Rect::new(0.0, 0.4, 1.0, 0.6),
    ] {
        println!("  {:?}: {:?}", r, tree.is_trimmed_out(&mut ctx, r));
    }

    println!(
        "cache: {} hits, {} misses",
        ctx.cache_hits(),
        ctx.cache_misses()
    );
}
