// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by curve construction, tree building, and clipping.

use core::fmt;

use kurbo::Rect;

/// Errors reported when trim input violates a construction contract.
///
/// Queries never return errors: geometric ambiguity is resolved by falling back
/// to exact bezier clipping. Only malformed input is rejected.
#[derive(Clone, Debug, PartialEq)]
pub enum TrimError {
    /// A curve segment needs between 2 and [`MAX_CONTROL_POINTS`](crate::MAX_CONTROL_POINTS)
    /// control points (degree 1 through [`MAX_DEGREE`](crate::MAX_DEGREE)).
    InvalidControlPointCount {
        /// Number of control points supplied.
        count: usize,
    },
    /// A control point contains NaN or an infinity.
    NonFiniteControlPoint,
    /// A trim loop needs at least one segment.
    EmptyLoop,
    /// The end of `segment` does not meet the start of the following segment.
    LoopNotClosed {
        /// Index of the segment whose end point misses the next start point.
        segment: usize,
        /// Distance between the two points, measured as `|du| + |dv|`.
        gap: f64,
    },
    /// The domain rectangle is empty or not finite.
    InvalidDomain,
    /// A loop reaches outside the domain that is being indexed.
    LoopOutsideDomain {
        /// Bounds of the offending loop.
        loop_bounds: Rect,
        /// Domain passed to the build.
        domain: Rect,
    },
    /// Clipping tolerance must be finite and strictly positive.
    NonPositiveTolerance {
        /// The rejected tolerance.
        tolerance: f64,
    },
    /// A [`QuadTreeConfig`](crate::QuadTreeConfig) field is out of range.
    InvalidConfig(&'static str),
}

impl fmt::Display for TrimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidControlPointCount { count } => write!(
                f,
                "curve segment needs 2..={} control points, got {count}",
                crate::MAX_CONTROL_POINTS
            ),
            Self::NonFiniteControlPoint => write!(f, "control points must be finite"),
            Self::EmptyLoop => write!(f, "trim loop requires at least one segment"),
            Self::LoopNotClosed { segment, gap } => write!(
                f,
                "trim loop is open after segment {segment} (gap {gap:e})"
            ),
            Self::InvalidDomain => write!(f, "domain rectangle must be finite and non-empty"),
            Self::LoopOutsideDomain {
                loop_bounds,
                domain,
            } => write!(
                f,
                "trim loop bounds [{:.4}, {:.4}] x [{:.4}, {:.4}] outside domain [{:.4}, {:.4}] x [{:.4}, {:.4}]",
                loop_bounds.x0,
                loop_bounds.x1,
                loop_bounds.y0,
                loop_bounds.y1,
                domain.x0,
                domain.x1,
                domain.y0,
                domain.y1
            ),
            Self::NonPositiveTolerance { tolerance } => {
                write!(f, "clip tolerance must be positive, got {tolerance}")
            }
            Self::InvalidConfig(msg) => write!(f, "invalid quadtree config: {msg}"),
        }
    }
}

impl core::error::Error for TrimError {}
