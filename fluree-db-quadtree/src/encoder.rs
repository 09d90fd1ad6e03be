//! Index-time token encoding.
//!
//! Turns a match (or a raw token literal) into the fields handed to the
//! host engine's indexing pipeline:
//!
//! 1. The primary field: one exact-match term per leaf cell, and, when the
//!    field is stored, the token literal as its stored value
//! 2. One auxiliary field per configured resolution: every primary term
//!    truncated to at most that many characters, deduplicated
//!
//! Truncating a cell identifier yields one of its ancestors, so a coarse
//! auxiliary lookup never misses a document whose fine cells lie under the
//! looked-up cell.
//!
//! # Raw literals
//!
//! A value starting with `[` is a token literal produced by an earlier
//! encoding (e.g. the stored value of a re-indexed document). Its tokens
//! are used verbatim, without matching against any grid.

use crate::config::QuadFieldConfig;
use crate::error::{QuadError, Result, ShapeParseError};
use crate::grid::SpatialGrid;
use crate::matcher::{match_shape, MatchResult};
use crate::shape::{parse_literal, ShapeLiteral};
use crate::token::{expand_root, format_token_list, QuadToken};
use rustc_hash::FxHashSet;
use serde::Serialize;

/// Terms for one index field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldTokens {
    /// Field name.
    pub name: String,
    /// Stored (display) value, if the field is stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_value: Option<String>,
    /// Index terms, deduplicated, in token order.
    pub tokens: Vec<String>,
}

/// Index-only auxiliary field holding truncated tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuxField {
    pub name: String,
    pub resolution: u8,
    pub tokens: Vec<String>,
}

/// All fields produced for one indexed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexedFields {
    pub primary: FieldTokens,
    pub aux: Vec<AuxField>,
}

impl IndexedFields {
    /// Auxiliary field for a resolution.
    pub fn aux_field(&self, resolution: u8) -> Option<&AuxField> {
        self.aux.iter().find(|f| f.resolution == resolution)
    }

    /// Terms indexed under a field name (primary or auxiliary).
    pub fn terms(&self, field: &str) -> Option<&[String]> {
        if self.primary.name == field {
            return Some(&self.primary.tokens);
        }
        self.aux
            .iter()
            .find(|f| f.name == field)
            .map(|f| f.tokens.as_slice())
    }
}

/// Encoder for one configured field.
#[derive(Debug, Clone, Copy)]
pub struct Encoder<'a> {
    field: &'a str,
    config: &'a QuadFieldConfig,
}

impl<'a> Encoder<'a> {
    pub fn new(field: &'a str, config: &'a QuadFieldConfig) -> Self {
        Self { field, config }
    }

    /// Encode any accepted input: raw token literal or shape.
    pub fn encode_value(&self, grid: &SpatialGrid, value: &str) -> Result<IndexedFields> {
        match parse_literal(value)? {
            ShapeLiteral::Tokens(tokens) => {
                tracing::debug!(
                    field = self.field,
                    tokens = tokens.len(),
                    "reusing raw quad tokens"
                );
                Ok(self.encode_tokens(&tokens, value.trim()))
            }
            ShapeLiteral::Shape(shape) => Ok(self.encode(&match_shape(grid, &shape))),
        }
    }

    /// Encode a token literal without consulting any grid.
    pub fn encode_literal(&self, literal: &str) -> Result<IndexedFields> {
        match parse_literal(literal)? {
            ShapeLiteral::Tokens(tokens) => Ok(self.encode_tokens(&tokens, literal.trim())),
            ShapeLiteral::Shape(_) => Err(QuadError::bad_input(
                literal,
                ShapeParseError::ExpectedTokenList,
            )),
        }
    }

    /// Encode a match result.
    ///
    /// A covered root cell is written as its four children, which keeps
    /// the stored literal re-parseable.
    pub fn encode(&self, result: &MatchResult) -> IndexedFields {
        let tokens = expand_root(result.tokens());
        let literal = format_token_list(&tokens);
        self.encode_tokens(&tokens, &literal)
    }

    fn encode_tokens(&self, tokens: &[QuadToken], literal: &str) -> IndexedFields {
        let primary_tokens = dedup_keep_first(tokens.iter().map(|t| t.cell.as_str()));

        let aux = self
            .config
            .aux_fields()
            .map(|(resolution, name)| AuxField {
                name,
                resolution,
                tokens: truncate_tokens(&primary_tokens, resolution),
            })
            .collect();

        IndexedFields {
            primary: FieldTokens {
                name: self.field.to_string(),
                stored_value: self.config.stored.then(|| literal.to_string()),
                tokens: primary_tokens,
            },
            aux,
        }
    }
}

/// Truncate every token to at most `resolution` characters, keeping the
/// first occurrence of each result.
pub fn truncate_tokens(tokens: &[String], resolution: u8) -> Vec<String> {
    let len = resolution as usize;
    dedup_keep_first(tokens.iter().map(|t| &t[..t.len().min(len)]))
}

fn dedup_keep_first<'t>(tokens: impl IntoIterator<Item = &'t str>) -> Vec<String> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let mut out = Vec::new();
    for token in tokens {
        if seen.insert(token) {
            out.push(token.to_string());
        }
    }
    out
}
