// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bezier clipping: crossing parity of one curve against a ray.
//!
//! The ray starts at the query point and runs toward `+u`. A curve crosses it
//! where it changes side of the line `v = p.v` at some `u > p.u`; a control
//! point with `v == p.v` counts as lying above the line. Together these rules
//! classify a point exactly on a curve like the point nudged infinitesimally
//! toward `+u` and `-v`.
//!
//! Pieces are processed from an explicit, fixed-capacity stack. Each popped
//! piece is classified from its control hull: hulls that cannot meet the ray
//! are dropped, hulls strictly right of the point are decided by their end
//! points, and the rest are clipped to the parameter range where the hull can
//! meet the ray (or bisected when clipping makes too little progress) until
//! they shrink below the tolerance and are resolved by their chord.

use arrayvec::ArrayVec;
use kurbo::Point;

use crate::error::TrimError;
use crate::types::{ControlPoints, CurveSegment};

/// Tolerance used when the caller has no better estimate.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Pieces deeper than this are resolved by their chord.
const MAX_CLIP_DEPTH: u16 = 48;

/// Capacity of the explicit piece stack. Bisection pushes at most one extra
/// piece per level, so this covers `MAX_CLIP_DEPTH` with room to spare.
const STACK_CAPACITY: usize = 64;

/// Clip only when the kept parameter interval is at most this fraction.
const MIN_CLIP_REDUCTION: f64 = 0.8;

/// Smallest widening applied to a clip interval, in parameter units.
const CLIP_MARGIN: f64 = 1e-6;

bitflags::bitflags! {
    /// Where the control points of a piece lie relative to the query point.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct HullSides: u8 {
        /// Some control point has `v < p.v`.
        const BELOW = 0b0000_0001;
        /// Some control point has `v >= p.v`.
        const ABOVE = 0b0000_0010;
        /// Some control point has `u <= p.u`.
        const LEFT  = 0b0000_0100;
        /// Some control point has `u > p.u`.
        const RIGHT = 0b0000_1000;
    }
}

/// Relationship between a piece's control hull and the query ray.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ClipType {
    /// The hull straddles the ray but the piece is a line or smaller than the
    /// tolerance; it is kept whole and resolved by its chord.
    A,
    /// The hull lies strictly right of the point and the end points sit on
    /// opposite sides of the ray: an odd number of crossings.
    BCross,
    /// The hull lies strictly right of the point and the end points sit on the
    /// same side of the ray: an even number of crossings.
    BNoCross,
    /// The hull cannot meet the ray: no crossing.
    C,
    /// The hull straddles the ray and is still large: clip or subdivide.
    AOrB,
    /// The hull has zero extent or is not finite. Contributes no crossing;
    /// callers that care treat the surrounding region as ambiguous.
    Unknown,
}

/// A sub-curve on the clip stack.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipPiece {
    cvs: ControlPoints,
    depth: u16,
}

impl ClipPiece {
    /// The whole of `curve`, at depth zero.
    pub fn new(curve: &CurveSegment) -> Self {
        Self {
            cvs: curve.cvs().clone(),
            depth: 0,
        }
    }

    /// Control points of the piece.
    pub fn control_points(&self) -> &[Point] {
        &self.cvs
    }

    /// Number of splits or clips that produced this piece.
    pub fn depth(&self) -> u16 {
        self.depth
    }

    /// De Casteljau subdivision at `ucut` in `[0, 1]`.
    pub fn split_at(&self, ucut: f64) -> (Self, Self) {
        let mut work = self.cvs.clone();
        let n = work.len();
        let mut left = ControlPoints::new();
        let mut right = ControlPoints::new();
        left.push(work[0]);
        right.push(work[n - 1]);
        for k in 1..n {
            for i in 0..n - k {
                work[i] = work[i].lerp(work[i + 1], ucut);
            }
            left.push(work[0]);
            right.push(work[n - 1 - k]);
        }
        right.reverse();
        let depth = self.depth.saturating_add(1);
        (
            Self { cvs: left, depth },
            Self { cvs: right, depth },
        )
    }

    /// The `[0, ucut]` half only.
    pub fn left_of(&self, ucut: f64) -> Self {
        let mut work = self.cvs.clone();
        let n = work.len();
        let mut left = ControlPoints::new();
        left.push(work[0]);
        for k in 1..n {
            for i in 0..n - k {
                work[i] = work[i].lerp(work[i + 1], ucut);
            }
            left.push(work[0]);
        }
        Self {
            cvs: left,
            depth: self.depth.saturating_add(1),
        }
    }

    /// The `[ucut, 1]` half only.
    pub fn right_of(&self, ucut: f64) -> Self {
        let mut work = self.cvs.clone();
        let n = work.len();
        let mut right = ControlPoints::new();
        right.push(work[n - 1]);
        for k in 1..n {
            for i in 0..n - k {
                work[i] = work[i].lerp(work[i + 1], ucut);
            }
            right.push(work[n - 1 - k]);
        }
        right.reverse();
        Self {
            cvs: right,
            depth: self.depth.saturating_add(1),
        }
    }

    /// The sub-curve on `[t0, t1]`, counted as one level deeper.
    pub fn sub_range(&self, t0: f64, t1: f64) -> Self {
        let tail = if t0 > 0.0 {
            self.right_of(t0)
        } else {
            self.clone()
        };
        let span = 1.0 - t0;
        let s = if span > 0.0 { (t1 - t0) / span } else { 1.0 };
        let mut out = if s < 1.0 { tail.left_of(s) } else { tail };
        out.depth = self.depth.saturating_add(1);
        out
    }

    /// Upper bound on the diameter of the control hull (`width + height` of
    /// its bounding rect).
    pub fn size_max(&self) -> f64 {
        let (mut x0, mut x1, mut y0, mut y1) = (
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
        );
        for p in &self.cvs {
            x0 = x0.min(p.x);
            x1 = x1.max(p.x);
            y0 = y0.min(p.y);
            y1 = y1.max(p.y);
        }
        (x1 - x0) + (y1 - y0)
    }

    /// Parameter interval where the hull can reach `u >= pt.u`.
    ///
    /// Outside the returned interval the curve lies strictly left of the
    /// point. `None` when the whole hull is left of it.
    pub fn find_x_cv_isections(&self, pt: Point) -> Option<(f64, f64)> {
        hull_interval(&self.cvs, |p| p.x - pt.x, true)
    }

    /// Parameter interval where the hull can meet the line `v = pt.v`.
    ///
    /// Outside the returned interval the curve stays off that line. `None`
    /// when the hull lies entirely on one side.
    pub fn find_y_cv_isections(&self, pt: Point) -> Option<(f64, f64)> {
        hull_interval(&self.cvs, |p| p.y - pt.y, false)
    }

    /// Position of the control points relative to `pt`.
    pub fn sides(&self, pt: Point) -> HullSides {
        let mut sides = HullSides::empty();
        for p in &self.cvs {
            sides |= if p.y >= pt.y {
                HullSides::ABOVE
            } else {
                HullSides::BELOW
            };
            sides |= if p.x > pt.x {
                HullSides::RIGHT
            } else {
                HullSides::LEFT
            };
        }
        sides
    }

    /// Classify the piece against the ray from `pt`.
    pub fn classify(&self, pt: Point, tolerance: f64) -> ClipType {
        let size = self.size_max();
        if !size.is_finite() || size == 0.0 {
            return ClipType::Unknown;
        }
        let sides = self.sides(pt);
        if !sides.contains(HullSides::ABOVE | HullSides::BELOW)
            || !sides.contains(HullSides::RIGHT)
        {
            return ClipType::C;
        }
        if !sides.contains(HullSides::LEFT) {
            return if self.ends_straddle(pt) {
                ClipType::BCross
            } else {
                ClipType::BNoCross
            };
        }
        if self.cvs.len() == 2 || size < tolerance {
            ClipType::A
        } else {
            ClipType::AOrB
        }
    }

    fn ends_straddle(&self, pt: Point) -> bool {
        let a = self.cvs[0];
        let b = self.cvs[self.cvs.len() - 1];
        (a.y >= pt.y) != (b.y >= pt.y)
    }

    /// Whether the chord between the end points crosses the ray.
    fn chord_crosses(&self, pt: Point) -> bool {
        if !self.ends_straddle(pt) {
            return false;
        }
        let a = self.cvs[0];
        let b = self.cvs[self.cvs.len() - 1];
        let u = a.x + (pt.y - a.y) * (b.x - a.x) / (b.y - a.y);
        u > pt.x
    }
}

/// Intersect the hull of `(i / n, d(cv_i))` with `d = 0`, or with `d >= 0`
/// when `upper` is set, and project the result onto the parameter axis.
fn hull_interval(cvs: &[Point], d: impl Fn(Point) -> f64, upper: bool) -> Option<(f64, f64)> {
    let n = cvs.len();
    let last = (n - 1) as f64;
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for i in 0..n {
        let ti = i as f64 / last;
        let di = d(cvs[i]);
        if di == 0.0 || (upper && di > 0.0) {
            lo = lo.min(ti);
            hi = hi.max(ti);
        }
        for j in i + 1..n {
            let dj = d(cvs[j]);
            if (di < 0.0 && dj > 0.0) || (di > 0.0 && dj < 0.0) {
                let tj = j as f64 / last;
                let t = ti + (tj - ti) * di / (di - dj);
                lo = lo.min(t);
                hi = hi.max(t);
            }
        }
    }
    (lo <= hi).then_some((lo, hi))
}

/// Reusable bezier clipper.
///
/// Holds only scratch space: each call starts from an empty stack, so one
/// instance can serve any number of sequential calls without allocating.
#[derive(Clone, Debug, Default)]
pub struct BezClip {
    stack: ArrayVec<ClipPiece, STACK_CAPACITY>,
}

impl BezClip {
    /// Create a clipper with an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parity of the crossings between `curve` and the `+u` ray from `point`.
    ///
    /// Returns `1` for an odd count and `0` for an even one. `tolerance` bounds
    /// the size of pieces that are resolved by their chord and must be finite
    /// and positive.
    pub fn get_isect_parity(
        &mut self,
        curve: &CurveSegment,
        point: Point,
        tolerance: f64,
    ) -> Result<u8, TrimError> {
        check_tolerance(tolerance)?;
        Ok(u8::from(self.parity(curve, point, tolerance)))
    }

    /// `get_isect_parity` without the tolerance check, as a bool.
    pub(crate) fn parity(&mut self, curve: &CurveSegment, pt: Point, tolerance: f64) -> bool {
        let b = curve.bounds();
        if b.x1 <= pt.x || b.y1 < pt.y || b.y0 >= pt.y {
            return false;
        }
        self.stack.clear();
        self.stack.push(ClipPiece::new(curve));
        let mut odd = false;
        while let Some(piece) = self.stack.pop() {
            match piece.classify(pt, tolerance) {
                ClipType::C | ClipType::BNoCross | ClipType::Unknown => {}
                ClipType::BCross => odd = !odd,
                ClipType::A => odd ^= piece.chord_crosses(pt),
                ClipType::AOrB => {
                    if piece.depth >= MAX_CLIP_DEPTH || self.stack.remaining_capacity() < 2 {
                        log::trace!(
                            "bezclip: resolving piece at depth {} by its chord",
                            piece.depth
                        );
                        odd ^= piece.chord_crosses(pt);
                        continue;
                    }
                    let (Some((x0, x1)), Some((y0, y1))) =
                        (piece.find_x_cv_isections(pt), piece.find_y_cv_isections(pt))
                    else {
                        continue;
                    };
                    let (t0, t1) = (x0.max(y0), x1.min(y1));
                    if t0 > t1 {
                        continue;
                    }
                    let margin = CLIP_MARGIN.max(0.01 * (t1 - t0));
                    let (t0, t1) = ((t0 - margin).max(0.0), (t1 + margin).min(1.0));
                    if t1 - t0 <= MIN_CLIP_REDUCTION {
                        self.stack.push(piece.sub_range(t0, t1));
                    } else {
                        let (left, right) = piece.split_at(0.5);
                        self.stack.push(right);
                        self.stack.push(left);
                    }
                }
            }
        }
        odd
    }
}

/// One-shot [`BezClip::get_isect_parity`] with a temporary clipper.
pub fn get_isect_parity(curve: &CurveSegment, point: Point, tolerance: f64) -> Result<u8, TrimError> {
    BezClip::new().get_isect_parity(curve, point, tolerance)
}

pub(crate) fn check_tolerance(tolerance: f64) -> Result<(), TrimError> {
    if tolerance.is_finite() && tolerance > 0.0 {
        Ok(())
    } else {
        Err(TrimError::NonPositiveTolerance { tolerance })
    }
}
