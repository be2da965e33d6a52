// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Curve and loop types consumed by the tree, plus the trim-state classification.

use alloc::vec::Vec;

use arrayvec::ArrayVec;
use kurbo::{CubicBez, Line, Point, QuadBez, Rect};

use crate::error::TrimError;
use crate::util::manhattan;

/// Highest supported bezier degree for a [`CurveSegment`].
pub const MAX_DEGREE: usize = 11;

/// Highest supported control-point count (`MAX_DEGREE + 1`).
pub const MAX_CONTROL_POINTS: usize = MAX_DEGREE + 1;

/// Default gap allowed between consecutive segments of a [`TrimLoop`].
pub const CLOSURE_TOLERANCE: f64 = 1e-7;

/// Control points of one bezier piece, stored inline.
pub(crate) type ControlPoints = ArrayVec<Point, MAX_CONTROL_POINTS>;

/// Classification of a region of the (u, v) domain against the trim loops.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TrimState {
    /// The region is entirely outside the trimmed region.
    Out,
    /// The region is entirely inside the trimmed region.
    In,
    /// A trim curve may pass through the region; membership has to be
    /// decided per point.
    Mixed,
}

impl TrimState {
    /// State of a region made of two sub-regions.
    ///
    /// Agreeing states survive; anything else becomes [`TrimState::Mixed`].
    #[must_use]
    pub fn combine(self, other: Self) -> Self {
        if self == other { self } else { Self::Mixed }
    }

    /// `In` for `true`, `Out` for `false`.
    pub fn from_inside(inside: bool) -> Self {
        if inside { Self::In } else { Self::Out }
    }

    /// Whether the state is decided (not [`TrimState::Mixed`]).
    pub fn is_decided(self) -> bool {
        self != Self::Mixed
    }
}

/// One bezier piece of a trim loop, in (u, v) parameter space.
///
/// Immutable after construction. `x` is `u` and `y` is `v`.
#[derive(Clone, Debug, PartialEq)]
pub struct CurveSegment {
    cvs: ControlPoints,
    bounds: Rect,
}

impl CurveSegment {
    /// Create a segment from 2..=[`MAX_CONTROL_POINTS`] finite control points.
    pub fn new(control_points: &[Point]) -> Result<Self, TrimError> {
        let count = control_points.len();
        if !(2..=MAX_CONTROL_POINTS).contains(&count) {
            return Err(TrimError::InvalidControlPointCount { count });
        }
        if control_points
            .iter()
            .any(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(TrimError::NonFiniteControlPoint);
        }
        let mut cvs = ControlPoints::new();
        cvs.extend(control_points.iter().copied());
        let bounds = control_bounds(&cvs);
        Ok(Self { cvs, bounds })
    }

    /// Degree-1 segment from `p0` to `p1`.
    pub fn line(p0: Point, p1: Point) -> Result<Self, TrimError> {
        Self::new(&[p0, p1])
    }

    /// Polynomial degree (control-point count minus one).
    pub fn degree(&self) -> usize {
        self.cvs.len() - 1
    }

    /// Control points in order.
    pub fn control_points(&self) -> &[Point] {
        &self.cvs
    }

    pub(crate) fn cvs(&self) -> &ControlPoints {
        &self.cvs
    }

    /// First control point, where the curve starts.
    pub fn start(&self) -> Point {
        self.cvs[0]
    }

    /// Last control point, where the curve ends.
    pub fn end(&self) -> Point {
        self.cvs[self.cvs.len() - 1]
    }

    /// Bounding rect of the control polygon; contains the whole curve.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// True when every control point coincides, so the curve is a single point.
    ///
    /// Such segments cannot be clipped; the tree marks every leaf they touch
    /// as [`TrimState::Mixed`].
    pub fn is_degenerate(&self) -> bool {
        self.bounds.width() == 0.0 && self.bounds.height() == 0.0
    }

    /// Evaluate the curve at `t` in `[0, 1]` with de Casteljau's algorithm.
    pub fn eval(&self, t: f64) -> Point {
        let mut work = self.cvs.clone();
        let n = work.len();
        for k in 1..n {
            for i in 0..n - k {
                work[i] = work[i].lerp(work[i + 1], t);
            }
        }
        work[0]
    }
}

impl From<Line> for CurveSegment {
    fn from(line: Line) -> Self {
        let cvs: ControlPoints = [line.p0, line.p1].into_iter().collect();
        let bounds = control_bounds(&cvs);
        Self { cvs, bounds }
    }
}

impl From<QuadBez> for CurveSegment {
    fn from(q: QuadBez) -> Self {
        let cvs: ControlPoints = [q.p0, q.p1, q.p2].into_iter().collect();
        let bounds = control_bounds(&cvs);
        Self { cvs, bounds }
    }
}

impl From<CubicBez> for CurveSegment {
    fn from(c: CubicBez) -> Self {
        let cvs: ControlPoints = [c.p0, c.p1, c.p2, c.p3].into_iter().collect();
        let bounds = control_bounds(&cvs);
        Self { cvs, bounds }
    }
}

/// Closed, ordered sequence of curve segments bounding a trimmed region.
///
/// The end of segment `i` meets the start of segment `i + 1` (wrapping around)
/// to within the closure tolerance.
#[derive(Clone, Debug, PartialEq)]
pub struct TrimLoop {
    segments: Vec<CurveSegment>,
    bounds: Rect,
}

impl TrimLoop {
    /// Create a loop, checking closure against [`CLOSURE_TOLERANCE`].
    pub fn new(segments: Vec<CurveSegment>) -> Result<Self, TrimError> {
        Self::with_closure_tolerance(segments, CLOSURE_TOLERANCE)
    }

    /// Create a loop with a caller-chosen closure tolerance (`|du| + |dv|`).
    pub fn with_closure_tolerance(
        segments: Vec<CurveSegment>,
        closure_tolerance: f64,
    ) -> Result<Self, TrimError> {
        let Some(first) = segments.first() else {
            return Err(TrimError::EmptyLoop);
        };
        let n = segments.len();
        for (i, seg) in segments.iter().enumerate() {
            let next = &segments[(i + 1) % n];
            let gap = manhattan(seg.end(), next.start());
            if gap > closure_tolerance {
                return Err(TrimError::LoopNotClosed { segment: i, gap });
            }
        }
        let bounds = segments
            .iter()
            .skip(1)
            .fold(first.bounds(), |acc, s| acc.union(s.bounds()));
        Ok(Self { segments, bounds })
    }

    /// Closed polygon of degree-1 segments through `points`.
    ///
    /// The closing edge back to the first point is added unless the last point
    /// already repeats it.
    pub fn from_polygon(points: &[Point]) -> Result<Self, TrimError> {
        let mut pts = points;
        if pts.len() > 2 && pts.first() == pts.last() {
            pts = &pts[..pts.len() - 1];
        }
        if pts.len() < 2 {
            return Err(TrimError::EmptyLoop);
        }
        let segments = (0..pts.len())
            .map(|i| CurveSegment::line(pts[i], pts[(i + 1) % pts.len()]))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(segments)
    }

    /// Segments in loop order.
    pub fn segments(&self) -> &[CurveSegment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false for a constructed loop; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Union of the segment bounds.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }
}

fn control_bounds(cvs: &[Point]) -> Rect {
    let first = Rect::from_points(cvs[0], cvs[0]);
    cvs.iter().skip(1).fold(first, |acc, p| acc.union_pt(*p))
}
