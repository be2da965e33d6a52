// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_trim --heading-base-level=0

//! Understory Trim: point and region classification against trim loops.
//!
//! A trimmed parametric surface keeps only the part of its `(u, v)` domain
//! enclosed by one or more closed loops of bezier curves. This crate answers
//! "is this parameter point kept?" and "is this parameter rectangle entirely
//! kept, entirely discarded, or neither?" quickly and repeatably.
//!
//! - [`CurveSegment`] and [`TrimLoop`] describe the loops. Segments are
//!   bezier curves of degree 1 through [`MAX_DEGREE`] in `(u, v)` space,
//!   stored as [`kurbo::Point`]s with `x = u` and `y = v`.
//! - [`QuadTree`] subdivides the domain and classifies every leaf once as
//!   [`TrimState::In`], [`TrimState::Out`], or [`TrimState::Mixed`].
//! - [`BezClip`] counts how often a ray toward `+u` crosses a single curve,
//!   subdividing it by bezier clipping. Mixed leaves fall back to it.
//!
//! Membership uses the even/odd rule across all loops, so nested loops cut
//! holes. Points exactly on a curve are classified as the point moved an
//! infinitesimal step toward `+u` and `-v`.
//!
//! # Example
//!
//! ```rust
//! use kurbo::{Point, Rect};
//! use understory_trim::{QuadTree, QueryContext, TrimLoop, TrimState};
//!
//! let square = TrimLoop::from_polygon(&[
//!     Point::new(0.25, 0.25),
//!     Point::new(0.75, 0.25),
//!     Point::new(0.75, 0.75),
//!     Point::new(0.25, 0.75),
//! ])
//! .unwrap();
//! let tree = QuadTree::build(&square, Rect::new(0.0, 0.0, 1.0, 1.0)).unwrap();
//!
//! // Each thread keeps its own context; the tree itself is shared.
//! let mut ctx = QueryContext::new();
//! assert!(tree.is_trimmed_in(&mut ctx, Point::new(0.5, 0.5)));
//! assert!(!tree.is_trimmed_in(&mut ctx, Point::new(0.1, 0.1)));
//!
//! assert_eq!(
//!     tree.is_trimmed_out(&mut ctx, Rect::new(0.3, 0.3, 0.6, 0.6)),
//!     TrimState::In
//! );
//! assert_eq!(
//!     tree.is_trimmed_out(&mut ctx, Rect::new(0.2, 0.2, 0.5, 0.5)),
//!     TrimState::Mixed
//! );
//! ```
//!
//! This crate is `no_std` and uses `alloc`.
//!
//! See the `trim_basics` and `trim_scanline` examples in `understory_trim_demos`
//! for runnable versions with printed output.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod bezclip;
mod error;
mod quadtree;
mod types;
mod util;

pub use bezclip::{BezClip, ClipPiece, ClipType, DEFAULT_TOLERANCE, HullSides, get_isect_parity};
pub use error::TrimError;
pub use quadtree::{LeafInfo, QuadTree, QuadTreeConfig, QueryContext, TreeStats};
pub use types::{CLOSURE_TOLERANCE, CurveSegment, MAX_CONTROL_POINTS, MAX_DEGREE, TrimLoop, TrimState};
