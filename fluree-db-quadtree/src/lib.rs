//! Quad-tree spatial field indexing for Fluree DB.
//!
//! This crate turns shapes (points, boxes, WKT geometries) into string
//! tokens naming cells of a fixed hierarchical quad-tree grid, so a plain
//! term index can answer approximate spatial queries. It supports:
//!
//! - **Multi-resolution tokens**: one primary field of leaf cells plus
//!   auxiliary fields of truncated (ancestor) cells
//! - **Round-trippable stored values**: the stored token literal re-indexes
//!   without touching the grid
//! - **Weighted "mostly within" queries**: coarse cover matches score higher
//!
//! # Architecture
//!
//! Each cell is named by the path of quadrant letters (`A` lower-left, `B`
//! lower-right, `C` upper-left, `D` upper-right) from the root, so a token's
//! length is its depth and its prefixes are its ancestors.
//!
//! ```text
//!                 shape literal ("x y", "x1 y1 x2 y2", WKT, "[AB* C]")
//!                               │
//!                               ▼
//!                    Shape / token list (shape, token)
//!                               │
//!              ┌────────────────┴────────────────┐
//!              ▼                                 ▼
//!    Matcher (recursive descent)          raw token fast path
//!              │                                 │
//!              └────────────────┬────────────────┘
//!                               ▼
//!                          MatchResult
//!                               │
//!              ┌────────────────┴────────────────┐
//!              ▼                                 ▼
//!    Encoder (index time)              QueryBuilder (query time)
//!    primary + <prefix><NN> fields     weighted term-set clauses
//! ```
//!
//! # Modules
//!
//! - [`grid`]: World bounds, cell geometry, best-fit level
//! - [`shape`]: Shape variants, literal parsing, cell relations
//! - [`token`]: Quad tokens and the bracketed token-list literal
//! - [`matcher`]: Shape-to-cell decomposition
//! - [`encoder`]: Index-time field production
//! - [`query`]: Query-time clause assembly
//! - [`field`]: Field type seam for the host engine
//! - [`config`]: Field configuration
//! - [`error`]: Error types

pub mod config;
pub mod encoder;
pub mod error;
pub mod field;
pub mod grid;
pub mod matcher;
pub mod query;
pub mod shape;
pub mod token;

// Re-export key types
pub use config::QuadFieldConfig;
pub use encoder::{AuxField, Encoder, FieldTokens, IndexedFields};
pub use error::{QuadError, Result, ShapeParseError};
pub use field::{QuadTreeField, SortSpec, SpatialOptions, SpatialQueryable, SpatialTokenizer};
pub use grid::{CellBox, SpatialGrid};
pub use matcher::{match_at, match_shape, LevelMatch, MatchResult};
pub use query::{ClauseKind, QueryBuilder, SpatialQuery, TermSetClause};
pub use shape::{Shape, ShapeLiteral, SpatialRelation};
pub use token::{QuadToken, TokenKind};
