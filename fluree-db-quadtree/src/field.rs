//! Quad-tree field type: the seam between the host engine and this crate.
//!
//! The host indexing pipeline calls [`SpatialTokenizer::create_fields`] once
//! per value and receives the primary plus auxiliary fields. The host query
//! parser calls [`SpatialQueryable::field_query`] with a literal in the same
//! grammar. Operations the field cannot answer (range queries, generic
//! spatial-options queries, sorting) fail with
//! [`QuadError::UnsupportedOperation`] instead of degrading silently. So
//! does `field_query` on a field without resolutions, since queries are
//! answered from the auxiliary fields.
//!
//! A [`QuadTreeField`] is immutable once built and shares its grid through an
//! `Arc`, so one instance can serve any number of indexing and query threads.

use crate::config::QuadFieldConfig;
use crate::encoder::{Encoder, IndexedFields};
use crate::error::{QuadError, Result};
use crate::grid::SpatialGrid;
use crate::query::{QueryBuilder, SpatialQuery};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Generic spatial-options request (operation name, shape, distance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialOptions {
    pub operation: String,
    pub shape: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// Sort request on a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub descending: bool,
}

/// Index-time side of a spatial field.
pub trait SpatialTokenizer: Send + Sync {
    /// Produce every field for one input value.
    fn create_fields(&self, value: &str) -> Result<IndexedFields>;
}

/// Query-time side of a spatial field.
pub trait SpatialQueryable: Send + Sync {
    /// Name of the primary field.
    fn field_name(&self) -> &str;

    /// Build the query for a shape literal.
    fn field_query(&self, value: &str) -> Result<SpatialQuery>;

    /// Range query over the field. Unsupported unless overridden.
    fn range_query(
        &self,
        _lower: Option<&str>,
        _upper: Option<&str>,
        _lower_inclusive: bool,
        _upper_inclusive: bool,
    ) -> Result<SpatialQuery> {
        Err(QuadError::unsupported("range query", self.field_name()))
    }

    /// Generic spatial-options query. Unsupported unless overridden.
    fn spatial_options_query(&self, _options: &SpatialOptions) -> Result<SpatialQuery> {
        Err(QuadError::unsupported("spatial options query", self.field_name()))
    }

    /// Sort by the field. Unsupported unless overridden.
    fn sort_field(&self, _descending: bool) -> Result<SortSpec> {
        Err(QuadError::unsupported("sort", self.field_name()))
    }
}

/// A configured quad-tree field.
#[derive(Debug, Clone)]
pub struct QuadTreeField {
    name: String,
    config: QuadFieldConfig,
    grid: Arc<SpatialGrid>,
}

impl QuadTreeField {
    /// Create a field. Fails fast on an invalid configuration.
    pub fn new(
        name: impl Into<String>,
        config: QuadFieldConfig,
        grid: Arc<SpatialGrid>,
    ) -> Result<Self> {
        config.validate()?;
        let name = name.into();
        if name.is_empty() {
            return Err(QuadError::Config("field name must not be empty".to_string()));
        }
        tracing::debug!(
            field = %name,
            resolutions = ?config.resolutions,
            max_depth = grid.max_depth(),
            "created quad-tree field"
        );
        Ok(Self { name, config, grid })
    }

    /// Create a field from schema-style arguments on the default world grid.
    pub fn from_args(name: impl Into<String>, args: &HashMap<String, String>) -> Result<Self> {
        Self::new(
            name,
            QuadFieldConfig::from_args(args)?,
            Arc::new(SpatialGrid::geo()),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &QuadFieldConfig {
        &self.config
    }

    pub fn grid(&self) -> &Arc<SpatialGrid> {
        &self.grid
    }

    /// One input value produces several index fields.
    pub fn is_poly_field(&self) -> bool {
        true
    }

    /// Value written back in responses: the stored token literal.
    pub fn stored_value<'f>(&self, fields: &'f IndexedFields) -> Option<&'f str> {
        fields.primary.stored_value.as_deref()
    }

    pub fn encoder(&self) -> Encoder<'_> {
        Encoder::new(&self.name, &self.config)
    }

    pub fn query_builder(&self) -> QueryBuilder<'_> {
        QueryBuilder::new(&self.name, &self.config, &self.grid)
    }
}

impl SpatialTokenizer for QuadTreeField {
    fn create_fields(&self, value: &str) -> Result<IndexedFields> {
        self.encoder().encode_value(&self.grid, value)
    }
}

impl SpatialQueryable for QuadTreeField {
    fn field_name(&self) -> &str {
        &self.name
    }

    fn field_query(&self, value: &str) -> Result<SpatialQuery> {
        self.query_builder().build_literal(value)
    }
}
