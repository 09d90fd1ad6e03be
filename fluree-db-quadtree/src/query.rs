//! Query-time translation of a shape into a weighted term query.
//!
//! # Algorithm
//!
//! 1. Match the query shape against the grid
//! 2. Keep only its leaves ("mostly within" transform)
//! 3. Per level, emit one term-set clause for the covered cells and one for
//!    the boundary cells
//! 4. Combine the clauses disjunctively
//!
//! # Field routing
//!
//! A document's primary terms sit at its own target depth, so query cells
//! are looked up in the auxiliary fields, where every document also holds
//! its cells truncated to each configured resolution. Cells at level `l`
//! go to:
//!
//! - the field of resolution `l`, unchanged, if configured
//! - else the field of the shallowest resolution `r > l` within
//!   [`MAX_TERM_EXPANSION`] levels, with each cell expanded to itself and
//!   all its descendants down to `r`
//! - else the field of the deepest resolution `r < l`, with cells
//!   truncated to `r`
//!
//! A level none of these can serve fails with
//! [`QuadError::UnsupportedOperation`]; in particular a field without
//! resolutions cannot be queried.
//!
//! # Boosts
//!
//! Cover clauses are boosted by `(depth - level) + offset`: a match on a
//! coarse covered cell is rarer, stronger evidence than a match on a fine
//! one. Truncated cells also match documents just outside the query shape,
//! so truncated cover clauses get the neutral boost of 1, like boundary
//! clauses. The boost offset is a ranking heuristic, not a geometric
//! guarantee.
//!
//! Terms are matched by exact membership only, never by prefix or range.

use crate::config::QuadFieldConfig;
use crate::encoder::{truncate_tokens, IndexedFields};
use crate::error::{QuadError, Result};
use crate::grid::{SpatialGrid, QUAD_ALPHABET};
use crate::matcher::{match_shape, MatchResult};
use crate::shape::{parse_literal, Shape, ShapeLiteral};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default additive constant of the cover boost.
pub const DEFAULT_COVER_BOOST_OFFSET: f32 = 2.0;

/// Boost of boundary (intersect) clauses and truncated cover clauses.
pub const NEUTRAL_BOOST: f32 = 1.0;

/// Deepest expansion of a query cell into a finer field. Each level
/// multiplies the terms by four.
pub const MAX_TERM_EXPANSION: u8 = 3;

/// Which match kind a clause was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
    Covers,
    Intersects,
}

/// A `SHOULD` clause matching documents holding any of `terms` in `field`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermSetClause {
    pub field: String,
    pub kind: ClauseKind,
    pub terms: BTreeSet<String>,
    pub boost: f32,
}

impl TermSetClause {
    /// True if any indexed term of the document is in the set.
    pub fn matches(&self, fields: &IndexedFields) -> bool {
        fields
            .terms(&self.field)
            .is_some_and(|terms| terms.iter().any(|t| self.terms.contains(t)))
    }
}

/// Weighted boolean expression over quad-token fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpatialQuery {
    /// Matches nothing (empty query geometry).
    MatchNone,
    /// Disjunction of term-set clauses.
    AnyOf { clauses: Vec<TermSetClause> },
}

impl SpatialQuery {
    pub fn clauses(&self) -> &[TermSetClause] {
        match self {
            SpatialQuery::MatchNone => &[],
            SpatialQuery::AnyOf { clauses } => clauses,
        }
    }

    pub fn is_match_none(&self) -> bool {
        matches!(self, SpatialQuery::MatchNone)
    }

    /// Score a document: the sum of the boosts of its matching clauses, or
    /// `None` if no clause matches.
    pub fn score(&self, fields: &IndexedFields) -> Option<f32> {
        let mut hit = false;
        let mut score = 0.0;
        for clause in self.clauses() {
            if clause.matches(fields) {
                hit = true;
                score += clause.boost;
            }
        }
        hit.then_some(score)
    }
}

/// Builds spatial queries for one configured field.
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder<'a> {
    field: &'a str,
    config: &'a QuadFieldConfig,
    grid: &'a SpatialGrid,
    cover_boost_offset: f32,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(field: &'a str, config: &'a QuadFieldConfig, grid: &'a SpatialGrid) -> Self {
        Self {
            field,
            config,
            grid,
            cover_boost_offset: DEFAULT_COVER_BOOST_OFFSET,
        }
    }

    /// Override the additive constant of the cover boost.
    pub fn with_cover_boost_offset(mut self, offset: f32) -> Self {
        self.cover_boost_offset = offset;
        self
    }

    /// Parse a literal (shape or raw tokens) and build its query.
    pub fn build_literal(&self, value: &str) -> Result<SpatialQuery> {
        let result = match parse_literal(value)? {
            ShapeLiteral::Tokens(tokens) => MatchResult::from_tokens(tokens),
            ShapeLiteral::Shape(shape) => match_shape(self.grid, &shape),
        };
        self.build_from_match(&result)
    }

    pub fn build(&self, shape: &Shape) -> Result<SpatialQuery> {
        self.build_from_match(&match_shape(self.grid, shape))
    }

    /// Build the query for an existing match.
    pub fn build_from_match(&self, result: &MatchResult) -> Result<SpatialQuery> {
        let Some(depth) = result.max_depth() else {
            return Ok(SpatialQuery::MatchNone);
        };

        let within = result.mostly_within();
        let mut clauses: Vec<TermSetClause> = Vec::new();
        for level in within.levels() {
            if !level.covers.is_empty() {
                let route = self.route(level.level, &level.covers)?;
                let boost = if route.exact {
                    self.cover_boost(depth, level.level)
                } else {
                    NEUTRAL_BOOST
                };
                merge_clause(&mut clauses, route.field, ClauseKind::Covers, route.terms, boost);
            }
            if !level.intersects.is_empty() {
                let route = self.route(level.level, &level.intersects)?;
                merge_clause(
                    &mut clauses,
                    route.field,
                    ClauseKind::Intersects,
                    route.terms,
                    NEUTRAL_BOOST,
                );
            }
        }

        if clauses.is_empty() {
            return Ok(SpatialQuery::MatchNone);
        }
        let query = SpatialQuery::AnyOf { clauses };
        tracing::debug!(
            field = self.field,
            best_fit_level = result.best_fit_level(),
            depth,
            query = ?query,
            "built spatial query"
        );
        Ok(query)
    }

    /// Pick the auxiliary field and terms for the cells of one level.
    fn route(&self, level: u8, cells: &BTreeSet<String>) -> Result<Route> {
        let (resolution, terms, exact) = if self.config.resolutions.contains(&level) {
            (level, cells.iter().cloned().collect(), true)
        } else if let Some(res) = self
            .config
            .finer_resolution_for_level(level)
            .filter(|&res| res - level <= MAX_TERM_EXPANSION)
        {
            (res, expand_cells(cells, level, res), true)
        } else if let Some(res) = self.config.resolution_for_level(level) {
            let cells: Vec<String> = cells.iter().cloned().collect();
            (res, truncate_tokens(&cells, res), false)
        } else {
            return Err(QuadError::unsupported(
                &format!("spatial query at level {} without a nearby resolution", level),
                self.field,
            ));
        };

        let field = self.config.aux_field_name(resolution).ok_or_else(|| {
            QuadError::Config(format!("resolution {} has no field prefix", resolution))
        })?;
        Ok(Route {
            field,
            terms,
            exact,
        })
    }

    /// `(depth - level) + offset`; shallower levels never score lower.
    pub fn cover_boost(&self, depth: u8, level: u8) -> f32 {
        depth.saturating_sub(level) as f32 + self.cover_boost_offset
    }
}

struct Route {
    field: String,
    terms: Vec<String>,
    /// False when cells were truncated and may match outside the shape.
    exact: bool,
}

/// Each cell plus all of its descendants down to `resolution`.
fn expand_cells(cells: &BTreeSet<String>, level: u8, resolution: u8) -> Vec<String> {
    let mut terms: Vec<String> = cells.iter().cloned().collect();
    let mut frontier = terms.clone();
    for _ in level..resolution {
        frontier = frontier
            .iter()
            .flat_map(|cell| QUAD_ALPHABET.iter().map(move |q| format!("{}{}", cell, q)))
            .collect();
        terms.extend(frontier.iter().cloned());
    }
    terms
}

/// Add a clause, folding it into an existing one with the same field, kind
/// and boost.
fn merge_clause(
    clauses: &mut Vec<TermSetClause>,
    field: String,
    kind: ClauseKind,
    terms: impl IntoIterator<Item = String>,
    boost: f32,
) {
    match clauses
        .iter_mut()
        .find(|c| c.field == field && c.kind == kind && c.boost == boost)
    {
        Some(existing) => existing.terms.extend(terms),
        None => clauses.push(TermSetClause {
            field,
            kind,
            terms: terms.into_iter().collect(),
            boost,
        }),
    }
}
