//! Error types for quad-tree field indexing and querying.

use thiserror::Error;

/// Errors raised by the quad-tree field.
///
/// Every variant is a contract violation by the caller (bad input, an
/// operation the field cannot answer, or an invalid schema). None of them
/// is transient, so nothing here is ever retried.
#[derive(Error, Debug)]
pub enum QuadError {
    /// The shape literal could not be parsed.
    #[error("Bad input {input:?}: {source}")]
    BadInput {
        input: String,
        #[source]
        source: ShapeParseError,
    },

    /// The field type does not provide this operation.
    #[error("Operation not supported on quad-tree field {field}: {operation}")]
    UnsupportedOperation { operation: String, field: String },

    /// Invalid field or grid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl QuadError {
    pub(crate) fn bad_input(input: &str, source: ShapeParseError) -> Self {
        QuadError::BadInput {
            input: input.to_string(),
            source,
        }
    }

    pub(crate) fn unsupported(operation: &str, field: &str) -> Self {
        QuadError::UnsupportedOperation {
            operation: operation.to_string(),
            field: field.to_string(),
        }
    }
}

/// Detail of a shape literal parse failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeParseError {
    /// WKT syntax error.
    #[error("WKT parse error: {0}")]
    Wkt(String),

    /// WKT parsed but could not be converted to a geometry.
    #[error("WKT conversion error: {0}")]
    WktConversion(String),

    /// A coordinate was not a number.
    #[error("invalid number {token:?}: {source}")]
    InvalidNumber {
        token: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    /// A coordinate was NaN or infinite.
    #[error("coordinate must be finite, got {0}")]
    NonFinite(f64),

    /// Coordinate literal with neither 2 (point) nor 4 (box) numbers.
    #[error("expected 2 or 4 coordinates, got {0}")]
    WrongArity(usize),

    /// Box coordinates that do not describe a box.
    #[error("invalid box: {0}")]
    InvalidBox(String),

    /// A token literal was required but a shape was given.
    #[error("expected a bracketed token list")]
    ExpectedTokenList,

    /// Token literal missing its closing bracket.
    #[error("unterminated token list")]
    UnterminatedTokenList,

    /// A cell token contained a character outside the quad alphabet.
    #[error("invalid quad token {token:?}: unexpected {found:?}")]
    InvalidToken { token: String, found: char },

    /// Geometry that parses but is not valid (unclosed or self-crossing rings).
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Result type for quad-tree operations.
pub type Result<T> = std::result::Result<T, QuadError>;
