//! Shape-to-cell matching.
//!
//! Decomposes the grid's world against a shape by recursive descent from
//! the root cell:
//!
//! - `Disjoint` cells are pruned.
//! - `Contains` cells (cell inside the shape) are recorded as covers and
//!   never subdivided, so no cover is ever an ancestor of another token.
//! - `Intersects`/`Within` cells are subdivided until the target depth,
//!   where they are recorded as boundary (intersect) leaves. Cells passed
//!   through on the way down are recorded in their level's `intersects`.
//!
//! The target depth is `best_fit_level + extra_depth`, capped at the grid's
//! maximum depth. Depth strictly increases per step, which bounds the
//! descent without any visited-set.
//!
//! Results are deterministic: children are visited in alphabet order and
//! the per-level sets are ordered.

use crate::grid::{CellBox, SpatialGrid, QUAD_ALPHABET};
use crate::shape::{Shape, SpatialRelation};
use crate::token::{expand_root, QuadToken, TokenKind};
use serde::Serialize;
use std::collections::BTreeSet;

/// Cells matched at one depth.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LevelMatch {
    pub level: u8,
    /// Cells fully covered by the shape.
    pub covers: BTreeSet<String>,
    /// Cells only partially overlapping the shape.
    pub intersects: BTreeSet<String>,
}

impl LevelMatch {
    pub fn new(level: u8) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.covers.is_empty() && self.intersects.is_empty()
    }
}

/// Outcome of matching one shape against a grid.
///
/// `levels[d]` holds the cells at depth `d`; the vector ends at the
/// deepest level reached. `tokens` lists the leaves in descent order:
/// every cover plus every boundary cell at the target depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    levels: Vec<LevelMatch>,
    best_fit_level: u8,
    tokens: Vec<QuadToken>,
}

impl MatchResult {
    /// A result with nothing matched.
    pub fn empty(best_fit_level: u8) -> Self {
        Self {
            levels: Vec::new(),
            best_fit_level,
            tokens: Vec::new(),
        }
    }

    /// Rebuild a result from leaf tokens alone (e.g. a token literal).
    ///
    /// Duplicate tokens are dropped. The best-fit level is taken as the
    /// shallowest token level.
    pub fn from_tokens(tokens: impl IntoIterator<Item = QuadToken>) -> Self {
        let mut result = Self::empty(0);
        for token in tokens {
            result.record_leaf(token);
        }
        result.best_fit_level = result.tokens.iter().map(QuadToken::level).min().unwrap_or(0);
        result
    }

    pub fn levels(&self) -> &[LevelMatch] {
        &self.levels
    }

    pub fn level(&self, level: u8) -> Option<&LevelMatch> {
        self.levels.get(level as usize)
    }

    /// Deepest level with a recorded cell, `None` if nothing matched.
    pub fn max_depth(&self) -> Option<u8> {
        self.levels.len().checked_sub(1).map(|d| d as u8)
    }

    pub fn best_fit_level(&self) -> u8 {
        self.best_fit_level
    }

    pub fn tokens(&self) -> &[QuadToken] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Restrict the result to its leaves, the basis of a "mostly within"
    /// query.
    ///
    /// Covers stay covers at their level and boundary leaves stay
    /// intersects at theirs; path cells recorded during descent are
    /// dropped. A root token is replaced by its four children so every
    /// cell can be looked up as a term.
    pub fn mostly_within(&self) -> MatchResult {
        let mut result = Self::from_tokens(expand_root(&self.tokens));
        result.best_fit_level = self.best_fit_level;
        result
    }

    fn level_mut(&mut self, level: u8) -> &mut LevelMatch {
        let idx = level as usize;
        while self.levels.len() <= idx {
            let next = self.levels.len() as u8;
            self.levels.push(LevelMatch::new(next));
        }
        &mut self.levels[idx]
    }

    fn record_leaf(&mut self, token: QuadToken) {
        let level = self.level_mut(token.level());
        let inserted = match token.kind {
            TokenKind::Cover => level.covers.insert(token.cell.clone()),
            TokenKind::Intersect => level.intersects.insert(token.cell.clone()),
        };
        if inserted {
            self.tokens.push(token);
        }
    }

    fn record_path(&mut self, cell: &str) {
        self.level_mut(cell.len() as u8)
            .intersects
            .insert(cell.to_string());
    }
}

/// Match a shape, deriving the best-fit level from its bounding box.
pub fn match_shape(grid: &SpatialGrid, shape: &Shape) -> MatchResult {
    let Some(area) = shape.fit_area(grid) else {
        return MatchResult::empty(0);
    };
    match_at(grid, shape, grid.best_fit_level(area))
}

/// Match a shape descending to `best_fit_level + extra_depth`.
pub fn match_at(grid: &SpatialGrid, shape: &Shape, best_fit_level: u8) -> MatchResult {
    let best_fit_level = best_fit_level.min(grid.max_depth());
    let mut descent = Descent {
        grid,
        shape,
        target: grid.target_depth(best_fit_level),
        result: MatchResult::empty(best_fit_level),
    };
    let mut cell_id = String::with_capacity(descent.target as usize);
    descent.visit(&mut cell_id, grid.bounds());

    let result = descent.result;
    tracing::trace!(
        best_fit_level,
        target_depth = descent.target,
        levels = result.levels.len(),
        tokens = result.tokens.len(),
        "matched shape"
    );
    result
}

struct Descent<'a> {
    grid: &'a SpatialGrid,
    shape: &'a Shape,
    target: u8,
    result: MatchResult,
}

impl Descent<'_> {
    fn visit(&mut self, cell_id: &mut String, cell: &CellBox) {
        let depth = cell_id.len() as u8;
        match self.shape.relation(self.grid, cell) {
            SpatialRelation::Disjoint => {}
            SpatialRelation::Contains => {
                self.result.record_leaf(QuadToken::cover(cell_id.as_str()));
            }
            SpatialRelation::Intersects | SpatialRelation::Within => {
                if depth >= self.target {
                    self.result
                        .record_leaf(QuadToken::intersect(cell_id.as_str()));
                    return;
                }
                if depth > 0 {
                    self.result.record_path(cell_id);
                }
                let children = self.grid.split(cell);
                for (quadrant, child) in children.iter().enumerate() {
                    cell_id.push(QUAD_ALPHABET[quadrant]);
                    self.visit(cell_id, child);
                    cell_id.pop();
                }
            }
        }
    }
}
