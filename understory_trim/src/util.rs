// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rectangle and scalar helpers shared by the tree and the clipper.

use kurbo::{Point, Rect};

#[inline]
pub(crate) fn abs(v: f64) -> f64 {
    if v < 0.0 { -v } else { v }
}

/// `|du| + |dv|`, an upper bound on the euclidean distance.
#[inline]
pub(crate) fn manhattan(a: Point, b: Point) -> f64 {
    abs(a.x - b.x) + abs(a.y - b.y)
}

pub(crate) fn is_finite_rect(r: Rect) -> bool {
    r.x0.is_finite() && r.x1.is_finite() && r.y0.is_finite() && r.y1.is_finite()
}

/// Closed containment: `inner` lies inside `outer`, edges included.
#[inline]
pub(crate) fn contains_rect(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 && inner.x1 <= outer.x1 && outer.y0 <= inner.y0 && inner.y1 <= outer.y1
}

/// Closed overlap: the rects share at least one point.
#[inline]
pub(crate) fn touches(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Whether the closed rect `r` reaches into the open interior of `cell`.
///
/// Holds for zero-width or zero-height `r` as long as it lies strictly inside
/// the cell on its degenerate axis.
#[inline]
pub(crate) fn enters_interior(r: Rect, cell: Rect) -> bool {
    r.x0 < cell.x1 && cell.x0 < r.x1 && r.y0 < cell.y1 && cell.y0 < r.y1
}

/// Per-axis overlap used by region queries.
///
/// On an axis where `query` has extent the overlap must have positive length;
/// on a degenerate axis the query coordinate only has to fall inside `cell`.
#[inline]
pub(crate) fn overlaps_query(cell: Rect, query: Rect) -> bool {
    axis_overlaps(cell.x0, cell.x1, query.x0, query.x1)
        && axis_overlaps(cell.y0, cell.y1, query.y0, query.y1)
}

#[inline]
fn axis_overlaps(c0: f64, c1: f64, q0: f64, q1: f64) -> bool {
    if q0 < q1 {
        c0.max(q0) < c1.min(q1)
    } else {
        c0 <= q0 && q0 <= c1
    }
}
