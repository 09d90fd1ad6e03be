//! Quad tokens and the bracketed token literal.
//!
//! A token is a cell identifier plus whether the shape fully covers that
//! cell or only touches it along its boundary. The literal form lists the
//! tokens inside brackets, marking boundary cells with a trailing `*`:
//!
//! ```text
//! [ABA* CAA AAAAAB*]
//! ```
//!
//! Tokens may be separated by whitespace or commas.

use crate::error::ShapeParseError;
use crate::grid::{quadrant_index, QUAD_ALPHABET};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Suffix marking a boundary (intersect) cell in a token literal.
pub const INTERSECT_MARK: char = '*';

/// How a cell relates to the shape it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// The shape fully covers the cell.
    Cover,
    /// The cell lies on the shape's boundary.
    Intersect,
}

/// A single cell token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuadToken {
    pub cell: String,
    pub kind: TokenKind,
}

impl QuadToken {
    pub fn cover(cell: impl Into<String>) -> Self {
        Self {
            cell: cell.into(),
            kind: TokenKind::Cover,
        }
    }

    pub fn intersect(cell: impl Into<String>) -> Self {
        Self {
            cell: cell.into(),
            kind: TokenKind::Intersect,
        }
    }

    /// Depth of the cell (identifier length).
    pub fn level(&self) -> u8 {
        self.cell.len() as u8
    }

    pub fn is_cover(&self) -> bool {
        self.kind == TokenKind::Cover
    }

    /// Parse one literal entry (`ABC` or `ABC*`).
    pub fn parse(entry: &str) -> std::result::Result<Self, ShapeParseError> {
        let (cell, kind) = match entry.strip_suffix(INTERSECT_MARK) {
            Some(cell) => (cell, TokenKind::Intersect),
            None => (entry, TokenKind::Cover),
        };
        if let Some(found) = cell.chars().find(|c| quadrant_index(*c).is_none()) {
            return Err(ShapeParseError::InvalidToken {
                token: entry.to_string(),
                found,
            });
        }
        Ok(Self {
            cell: cell.to_string(),
            kind,
        })
    }
}

impl fmt::Display for QuadToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Cover => write!(f, "{}", self.cell),
            TokenKind::Intersect => write!(f, "{}{}", self.cell, INTERSECT_MARK),
        }
    }
}

/// True if the input uses the bracketed token literal form.
pub fn is_token_list(input: &str) -> bool {
    input.trim_start().starts_with('[')
}

/// Parse a bracketed token literal.
pub fn parse_token_list(input: &str) -> std::result::Result<Vec<QuadToken>, ShapeParseError> {
    let inner = input
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or(ShapeParseError::UnterminatedTokenList)?;

    inner
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|entry| !entry.is_empty())
        .map(QuadToken::parse)
        .collect()
}

/// Format tokens as a bracketed literal.
pub fn format_token_list(tokens: &[QuadToken]) -> String {
    let entries: Vec<String> = tokens.iter().map(ToString::to_string).collect();
    format!("[{}]", entries.join(" "))
}

/// Replace a root-cell token with its four level-1 children.
///
/// The root identifier is the empty string, which cannot appear in a token
/// literal or be looked up in a truncated field. The children cover
/// exactly the same area.
pub fn expand_root(tokens: &[QuadToken]) -> Vec<QuadToken> {
    let mut out = Vec::with_capacity(tokens.len() + 3);
    for token in tokens {
        if token.cell.is_empty() {
            out.extend(QUAD_ALPHABET.iter().map(|c| QuadToken {
                cell: c.to_string(),
                kind: token.kind,
            }));
        } else {
            out.push(token.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_list() {
        let tokens = parse_token_list("[ABA* CAA AAAAAB*]").unwrap();
        assert_eq!(
            tokens,
            vec![
                QuadToken::intersect("ABA"),
                QuadToken::cover("CAA"),
                QuadToken::intersect("AAAAAB"),
            ]
        );
    }

    #[test]
    fn test_parse_commas_and_empty() {
        let tokens = parse_token_list("[AB*, CD]").unwrap();
        assert_eq!(tokens.len(), 2);
        assert!(parse_token_list("[]").unwrap().is_empty());
        assert!(parse_token_list("  [ ]  ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_tokens() {
        assert_eq!(
            parse_token_list("[AB CD"),
            Err(ShapeParseError::UnterminatedTokenList)
        );
        assert!(matches!(
            parse_token_list("[AB AE*]"),
            Err(ShapeParseError::InvalidToken { found: 'E', .. })
        ));
        // Mark only allowed as a suffix
        assert!(parse_token_list("[A*B]").is_err());
    }

    #[test]
    fn test_format_matches_parse() {
        let literal = "[ABA* CAA AAAAAB*]";
        let tokens = parse_token_list(literal).unwrap();
        assert_eq!(format_token_list(&tokens), literal);
    }

    #[test]
    fn test_expand_root() {
        let expanded = expand_root(&[QuadToken::cover(""), QuadToken::intersect("AB")]);
        let cells: Vec<&str> = expanded.iter().map(|t| t.cell.as_str()).collect();
        assert_eq!(cells, vec!["A", "B", "C", "D", "AB"]);
        assert!(expanded[..4].iter().all(QuadToken::is_cover));
    }
}
