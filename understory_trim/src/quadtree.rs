// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quadtree over the (u, v) domain of a trimmed surface.
//!
//! Nodes live in a flat arena and refer to each other by index. A node splits
//! into four quadrants while more than [`QuadTreeConfig::max_segments_per_leaf`]
//! segment bounds reach into its interior and it is still larger than
//! [`QuadTreeConfig::min_cell_size`]. Every leaf is classified once at build
//! time; internal nodes carry the aggregate of their children.
//!
//! ## Ownership of points
//!
//! A leaf owns `[u0, u1) x (v0, v1]`, which matches the boundary convention of
//! [`BezClip`]: a point is classified like the point nudged toward `+u` and
//! `-v`. Points on the domain's max-u or min-v edge, and points outside the
//! domain, are outside every loop.
//!
//! ## Resolving mixed leaves
//!
//! A point in a [`TrimState::Mixed`] leaf walks leaves toward `+u` along its
//! row, collecting the segments they reference, until it reaches a decided leaf
//! or the domain edge. The decided leaf's state at a reference point on the
//! same row, corrected by the crossing parity of the collected segments
//! between the two points, is the exact answer.

use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};

use kurbo::{Point, Rect};

use crate::bezclip::{BezClip, DEFAULT_TOLERANCE, check_tolerance};
use crate::error::TrimError;
use crate::types::{CurveSegment, TrimLoop, TrimState};
use crate::util::{contains_rect, enters_interior, is_finite_rect, overlaps_query, touches};

static NEXT_TREE_ID: AtomicUsize = AtomicUsize::new(1);

/// Build parameters for a [`QuadTree`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct QuadTreeConfig {
    /// A node splits while more than this many segment bounds enter its interior.
    pub max_segments_per_leaf: usize,
    /// Nodes whose edge is at most this size do not split. Measured in
    /// normalized domain units, so `1.0 / 64.0` stops six levels below a
    /// square domain.
    pub min_cell_size: f64,
    /// Hard bound on tree depth.
    pub max_depth: u16,
    /// Tolerance forwarded to [`BezClip`].
    pub tolerance: f64,
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            max_segments_per_leaf: 0,
            min_cell_size: 1.0 / 64.0,
            max_depth: 10,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl QuadTreeConfig {
    /// Set [`Self::max_segments_per_leaf`].
    #[must_use]
    pub fn with_max_segments_per_leaf(mut self, n: usize) -> Self {
        self.max_segments_per_leaf = n;
        self
    }

    /// Set [`Self::min_cell_size`].
    #[must_use]
    pub fn with_min_cell_size(mut self, size: f64) -> Self {
        self.min_cell_size = size;
        self
    }

    /// Set [`Self::max_depth`].
    #[must_use]
    pub fn with_max_depth(mut self, depth: u16) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set [`Self::tolerance`].
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn validate(&self) -> Result<(), TrimError> {
        check_tolerance(self.tolerance)?;
        if !(self.min_cell_size > 0.0 && self.min_cell_size <= 1.0) {
            return Err(TrimError::InvalidConfig("min_cell_size must be in (0, 1]"));
        }
        if self.max_depth > 32 {
            return Err(TrimError::InvalidConfig("max_depth must be at most 32"));
        }
        Ok(())
    }
}

/// Caller-owned query state: the last visited leaf and clipping scratch.
///
/// Keep one per thread. A context remembers which tree filled its cache, so
/// reusing it with another tree only costs a cache miss.
#[derive(Clone, Debug, Default)]
pub struct QueryContext {
    tree: usize,
    last_leaf: Option<NodeIdx>,
    hits: u64,
    misses: u64,
    clip: BezClip,
    seen: Vec<usize>,
}

impl QueryContext {
    /// Empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queries answered from the cached leaf.
    pub fn cache_hits(&self) -> u64 {
        self.hits
    }

    /// Queries that had to descend from the root.
    pub fn cache_misses(&self) -> u64 {
        self.misses
    }

    /// Forget the cached leaf and zero the counters.
    pub fn reset(&mut self) {
        self.tree = 0;
        self.last_leaf = None;
        self.hits = 0;
        self.misses = 0;
    }

    fn cached(&self, tree: usize) -> Option<NodeIdx> {
        if self.tree == tree { self.last_leaf } else { None }
    }

    fn bind(&mut self, tree: usize, leaf: NodeIdx) {
        self.tree = tree;
        self.last_leaf = Some(leaf);
    }
}

/// Shape summary of a built tree.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// All nodes, internal and leaf.
    pub nodes: usize,
    /// Leaf nodes.
    pub leaves: usize,
    /// Leaves classified [`TrimState::Mixed`].
    pub mixed_leaves: usize,
    /// Depth of the deepest leaf (the root is depth 0).
    pub depth: u16,
}

/// A leaf as seen from outside the tree.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LeafInfo {
    /// Region covered by the leaf.
    pub rect: Rect,
    /// Build-time classification.
    pub state: TrimState,
    /// Segments whose bounds touch the leaf.
    pub segment_count: usize,
    /// Depth below the root.
    pub depth: u16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct NodeIdx(usize);

impl NodeIdx {
    const ROOT: Self = Self(0);

    const fn get(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
enum Kind {
    Leaf(Vec<usize>),
    Internal([NodeIdx; 4]),
}

#[derive(Clone, Debug)]
struct Node {
    rect: Rect,
    state: TrimState,
    depth: u16,
    kind: Kind,
}

/// Spatial index answering trim membership for one or more closed loops.
///
/// Borrows the loops for its lifetime and is immutable once built, so it can
/// be shared across threads; per-query mutable state lives in
/// [`QueryContext`].
pub struct QuadTree<'a> {
    id: usize,
    domain: Rect,
    u_scale: f64,
    v_scale: f64,
    config: QuadTreeConfig,
    segments: Vec<&'a CurveSegment>,
    arena: Vec<Node>,
}

impl core::fmt::Debug for QuadTree<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let stats = self.stats();
        f.debug_struct("QuadTree")
            .field("domain", &self.domain)
            .field("segments", &self.segments.len())
            .field("nodes", &stats.nodes)
            .field("leaves", &stats.leaves)
            .field("mixed_leaves", &stats.mixed_leaves)
            .field("depth", &stats.depth)
            .finish_non_exhaustive()
    }
}

impl<'a> QuadTree<'a> {
    /// Index a single loop over `domain` with the default config.
    pub fn build(trim_loop: &'a TrimLoop, domain: Rect) -> Result<Self, TrimError> {
        Self::build_loops(
            core::slice::from_ref(trim_loop),
            domain,
            QuadTreeConfig::default(),
        )
    }

    /// Index several loops at once. Membership follows the even/odd rule
    /// across all of them, so inner loops act as holes.
    pub fn build_loops(
        loops: &'a [TrimLoop],
        domain: Rect,
        config: QuadTreeConfig,
    ) -> Result<Self, TrimError> {
        config.validate()?;
        let domain = domain.abs();
        if !is_finite_rect(domain) || domain.width() <= 0.0 || domain.height() <= 0.0 {
            return Err(TrimError::InvalidDomain);
        }
        if loops.is_empty() {
            return Err(TrimError::EmptyLoop);
        }
        for l in loops {
            if !contains_rect(domain, l.bounds()) {
                return Err(TrimError::LoopOutsideDomain {
                    loop_bounds: l.bounds(),
                    domain,
                });
            }
        }
        let segments: Vec<&'a CurveSegment> =
            loops.iter().flat_map(|l| l.segments().iter()).collect();
        let degenerate = segments.iter().filter(|s| s.is_degenerate()).count();
        if degenerate > 0 {
            log::debug!("quadtree: {degenerate} degenerate segment(s) force mixed leaves");
        }

        let mut tree = Self {
            id: NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed),
            domain,
            u_scale: 1.0 / domain.width(),
            v_scale: 1.0 / domain.height(),
            config,
            segments,
            arena: Vec::new(),
        };
        let all: Vec<usize> = (0..tree.segments.len()).collect();
        let mut clip = BezClip::new();
        tree.build_node(domain, all, 0, &mut clip);

        let stats = tree.stats();
        log::debug!(
            "quadtree: {} segments, {} nodes, {} leaves ({} mixed), depth {}",
            tree.segments.len(),
            stats.nodes,
            stats.leaves,
            stats.mixed_leaves,
            stats.depth
        );
        Ok(tree)
    }

    /// The indexed domain; equal to the root node's rect.
    pub fn domain(&self) -> Rect {
        self.domain
    }

    /// Config the tree was built with.
    pub fn config(&self) -> &QuadTreeConfig {
        &self.config
    }

    /// Map a point into normalized `[0, 1] x [0, 1]` domain coordinates.
    pub fn normalize(&self, pt: Point) -> Point {
        Point::new(
            (pt.x - self.domain.x0) * self.u_scale,
            (pt.y - self.domain.y0) * self.v_scale,
        )
    }

    /// Whether `pt` lies in the trimmed region.
    ///
    /// Points outside the domain, or on its max-u or min-v edge, return
    /// `false` without touching the context.
    pub fn is_trimmed_in(&self, ctx: &mut QueryContext, pt: Point) -> bool {
        if !self.owns(pt) {
            return false;
        }
        let leaf = self.resolve_leaf(ctx, pt);
        match self.arena[leaf.get()].state {
            TrimState::In => true,
            TrimState::Out => false,
            TrimState::Mixed => self.resolve_mixed(ctx, leaf, pt),
        }
    }

    /// Quick classification of a rectangle.
    ///
    /// Never reports `In` or `Out` for a rect a trim curve passes through, but
    /// may report [`TrimState::Mixed`] for one that only lies near a curve.
    /// The rect is intersected with the domain first; a rect that misses the
    /// domain is `Out`.
    pub fn is_trimmed_out(&self, ctx: &mut QueryContext, rect: Rect) -> TrimState {
        let r = rect.abs();
        if !is_finite_rect(r) {
            return TrimState::Mixed;
        }
        let d = self.domain;
        let q = Rect::new(r.x0.max(d.x0), r.y0.max(d.y0), r.x1.min(d.x1), r.y1.min(d.y1));
        if q.x0 > q.x1 || q.y0 > q.y1 {
            return TrimState::Out;
        }

        let mut idx = NodeIdx::ROOT;
        while let Kind::Internal(children) = &self.arena[idx.get()].kind {
            let mut containing = children
                .iter()
                .filter(|c| contains_rect(self.arena[c.get()].rect, q));
            match (containing.next(), containing.next()) {
                (Some(c), None) => idx = *c,
                _ => break,
            }
        }
        let node = &self.arena[idx.get()];
        match node.kind {
            Kind::Leaf(_) => {
                ctx.bind(self.id, idx);
                node.state
            }
            Kind::Internal(_) if node.state.is_decided() => node.state,
            Kind::Internal(_) => self.aggregate(idx, q),
        }
    }

    /// Rect and state of the leaf owning `pt`, or `None` outside the domain.
    pub fn locate(&self, pt: Point) -> Option<LeafInfo> {
        if !self.owns(pt) {
            return None;
        }
        Some(self.leaf_info(self.locate_leaf(pt)))
    }

    /// Iterate all leaves in arena order.
    pub fn leaves(&self) -> impl Iterator<Item = LeafInfo> + '_ {
        (0..self.arena.len())
            .map(NodeIdx)
            .filter(|i| matches!(self.arena[i.get()].kind, Kind::Leaf(_)))
            .map(|i| self.leaf_info(i))
    }

    /// Node counts and depth.
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            nodes: self.arena.len(),
            ..TreeStats::default()
        };
        for node in &self.arena {
            if let Kind::Leaf(_) = node.kind {
                stats.leaves += 1;
                if node.state == TrimState::Mixed {
                    stats.mixed_leaves += 1;
                }
                stats.depth = stats.depth.max(node.depth);
            }
        }
        stats
    }

    // --- build ---

    fn build_node(
        &mut self,
        rect: Rect,
        candidates: Vec<usize>,
        depth: u16,
        clip: &mut BezClip,
    ) -> NodeIdx {
        let touching: Vec<usize> = candidates
            .into_iter()
            .filter(|&s| touches(self.segments[s].bounds(), rect))
            .collect();
        let crossing = touching
            .iter()
            .filter(|&&s| enters_interior(self.segments[s].bounds(), rect))
            .count();
        let idx = NodeIdx(self.arena.len());

        if crossing > self.config.max_segments_per_leaf
            && depth < self.config.max_depth
            && self.can_split(rect)
        {
            self.arena.push(Node {
                rect,
                state: TrimState::Mixed,
                depth,
                kind: Kind::Leaf(Vec::new()),
            });
            let children =
                quadrants(rect).map(|r| self.build_node(r, touching.clone(), depth + 1, clip));
            let state = children
                .iter()
                .map(|c| self.arena[c.get()].state)
                .reduce(TrimState::combine)
                .unwrap_or(TrimState::Mixed);
            let node = &mut self.arena[idx.get()];
            node.state = state;
            node.kind = Kind::Internal(children);
        } else {
            let state = self.classify_leaf(rect, &touching, clip);
            self.arena.push(Node {
                rect,
                state,
                depth,
                kind: Kind::Leaf(touching),
            });
        }
        idx
    }

    fn can_split(&self, rect: Rect) -> bool {
        let min = self.config.min_cell_size;
        rect.width() * self.u_scale > min && rect.height() * self.v_scale > min
    }

    fn classify_leaf(&self, rect: Rect, touching: &[usize], clip: &mut BezClip) -> TrimState {
        let ambiguous = touching.iter().any(|&s| {
            let seg = self.segments[s];
            seg.is_degenerate() || enters_interior(seg.bounds(), rect)
        });
        if ambiguous {
            return TrimState::Mixed;
        }
        let center = rect.center();
        let tol = self.config.tolerance;
        let inside = self
            .segments
            .iter()
            .fold(false, |acc, seg| acc ^ clip.parity(seg, center, tol));
        TrimState::from_inside(inside)
    }

    // --- queries ---

    fn owns(&self, pt: Point) -> bool {
        let d = self.domain;
        d.x0 <= pt.x && pt.x < d.x1 && d.y0 < pt.y && pt.y <= d.y1
    }

    fn locate_leaf(&self, pt: Point) -> NodeIdx {
        let mut idx = NodeIdx::ROOT;
        while let Kind::Internal(children) = &self.arena[idx.get()].kind {
            let mid = self.arena[idx.get()].rect.center();
            let q = usize::from(pt.x >= mid.x) | (usize::from(pt.y > mid.y) << 1);
            idx = children[q];
        }
        idx
    }

    fn resolve_leaf(&self, ctx: &mut QueryContext, pt: Point) -> NodeIdx {
        if let Some(leaf) = ctx.cached(self.id)
            && leaf_owns(self.arena[leaf.get()].rect, pt)
        {
            ctx.hits += 1;
            return leaf;
        }
        ctx.misses += 1;
        let leaf = self.locate_leaf(pt);
        ctx.bind(self.id, leaf);
        leaf
    }

    fn resolve_mixed(&self, ctx: &mut QueryContext, leaf: NodeIdx, pt: Point) -> bool {
        let QueryContext { clip, seen, .. } = ctx;
        seen.clear();
        let mut cur = leaf;
        let reference = loop {
            let node = &self.arena[cur.get()];
            if let Kind::Leaf(segs) = &node.kind {
                for &s in segs {
                    if !seen.contains(&s) {
                        seen.push(s);
                    }
                }
            }
            if node.state.is_decided() {
                break Some((node.state, Point::new(node.rect.center().x, pt.y)));
            }
            if node.rect.x1 >= self.domain.x1 {
                break None;
            }
            cur = self.locate_leaf(Point::new(node.rect.x1, pt.y));
        };

        let tol = self.config.tolerance;
        match reference {
            Some((state, q)) => seen.iter().fold(state == TrimState::In, |acc, &s| {
                let seg = self.segments[s];
                acc ^ clip.parity(seg, pt, tol) ^ clip.parity(seg, q, tol)
            }),
            None => seen
                .iter()
                .fold(false, |acc, &s| acc ^ clip.parity(self.segments[s], pt, tol)),
        }
    }

    fn aggregate(&self, from: NodeIdx, q: Rect) -> TrimState {
        let mut acc: Option<TrimState> = None;
        let mut stack = vec![from];
        while let Some(i) = stack.pop() {
            let node = &self.arena[i.get()];
            if !overlaps_query(node.rect, q) {
                continue;
            }
            if node.state.is_decided() {
                let state = acc.map_or(node.state, |a| a.combine(node.state));
                if state == TrimState::Mixed {
                    return state;
                }
                acc = Some(state);
                continue;
            }
            match &node.kind {
                Kind::Leaf(_) => return TrimState::Mixed,
                Kind::Internal(children) => stack.extend_from_slice(children),
            }
        }
        acc.unwrap_or(TrimState::Mixed)
    }

    fn leaf_info(&self, idx: NodeIdx) -> LeafInfo {
        let node = &self.arena[idx.get()];
        LeafInfo {
            rect: node.rect,
            state: node.state,
            segment_count: match &node.kind {
                Kind::Leaf(segs) => segs.len(),
                Kind::Internal(_) => 0,
            },
            depth: node.depth,
        }
    }
}

/// Whether a leaf owns `pt` under the `[u0, u1) x (v0, v1]` rule.
#[inline]
fn leaf_owns(rect: Rect, pt: Point) -> bool {
    rect.x0 <= pt.x && pt.x < rect.x1 && rect.y0 < pt.y && pt.y <= rect.y1
}

/// Children in `(u >= mid) | (v > mid) << 1` order.
fn quadrants(r: Rect) -> [Rect; 4] {
    let mid = r.center();
    [
        Rect::new(r.x0, r.y0, mid.x, mid.y),
        Rect::new(mid.x, r.y0, r.x1, mid.y),
        Rect::new(r.x0, mid.y, mid.x, r.y1),
        Rect::new(mid.x, mid.y, r.x1, r.y1),
    ]
}
