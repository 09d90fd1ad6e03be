//! Quad-tree field configuration.
//!
//! A field stores its full-resolution tokens in the primary field and,
//! for every configured resolution, a copy truncated to that many
//! characters in an auxiliary field named `<prefix><resolution>` (two-digit
//! zero padding, e.g. `geo_05`). Auxiliary fields are index-only.

use crate::error::{QuadError, Result};
use crate::grid::MAX_GRID_DEPTH;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for a quad-tree field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadFieldConfig {
    /// Keep the token literal as the primary field's stored value.
    /// Default: true
    pub stored: bool,

    /// Truncation lengths, one auxiliary field each, in declared order.
    pub resolutions: Vec<u8>,

    /// Auxiliary field name prefix. Required when `resolutions` is set.
    pub prefix: Option<String>,
}

impl Default for QuadFieldConfig {
    fn default() -> Self {
        Self {
            stored: true,
            resolutions: Vec::new(),
            prefix: None,
        }
    }
}

impl QuadFieldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse schema-style string arguments.
    ///
    /// Recognized keys: `resolutions` (comma/space separated), `prefix`,
    /// `stored`. Other keys belong to the host field type and are ignored.
    pub fn from_args(args: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(stored) = args.get("stored") {
            config.stored = stored.trim().parse().map_err(|_| {
                QuadError::Config(format!("stored must be true or false, got {:?}", stored))
            })?;
        }

        if let Some(res) = args.get("resolutions") {
            config.resolutions = res
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<u8>().map_err(|e| {
                        QuadError::Config(format!("invalid resolution {:?}: {}", s, e))
                    })
                })
                .collect::<Result<Vec<u8>>>()?;
        }

        config.prefix = args.get("prefix").cloned();
        config.validate()?;
        Ok(config)
    }

    pub fn with_stored(mut self, stored: bool) -> Self {
        self.stored = stored;
        self
    }

    pub fn with_resolutions(mut self, resolutions: impl Into<Vec<u8>>) -> Self {
        self.resolutions = resolutions.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Check the configuration before any document is processed.
    pub fn validate(&self) -> Result<()> {
        if self.resolutions.is_empty() {
            return Ok(());
        }
        match self.prefix.as_deref() {
            None | Some("") => {
                return Err(QuadError::Config("missing prefix field".to_string()));
            }
            Some(_) => {}
        }
        for (i, &res) in self.resolutions.iter().enumerate() {
            if res == 0 || res > MAX_GRID_DEPTH {
                return Err(QuadError::Config(format!(
                    "resolution {} out of range 1..={}",
                    res, MAX_GRID_DEPTH
                )));
            }
            if self.resolutions[..i].contains(&res) {
                return Err(QuadError::Config(format!("duplicate resolution {}", res)));
            }
        }
        Ok(())
    }

    /// Name of the auxiliary field for a resolution.
    pub fn aux_field_name(&self, resolution: u8) -> Option<String> {
        self.prefix
            .as_deref()
            .map(|prefix| aux_field_name(prefix, resolution))
    }

    /// `(resolution, field name)` for every auxiliary field.
    pub fn aux_fields(&self) -> impl Iterator<Item = (u8, String)> + '_ {
        let prefix = self.prefix.as_deref().unwrap_or_default();
        self.resolutions
            .iter()
            .map(move |&res| (res, aux_field_name(prefix, res)))
    }

    /// Deepest configured resolution not deeper than `level`.
    pub fn resolution_for_level(&self, level: u8) -> Option<u8> {
        self.resolutions
            .iter()
            .copied()
            .filter(|&res| res <= level)
            .max()
    }

    /// Shallowest configured resolution deeper than `level`.
    pub fn finer_resolution_for_level(&self, level: u8) -> Option<u8> {
        self.resolutions
            .iter()
            .copied()
            .filter(|&res| res > level)
            .min()
    }
}

/// `<prefix><resolution>` with the resolution zero-padded to two digits.
pub fn aux_field_name(prefix: &str, resolution: u8) -> String {
    format!("{}{:02}", prefix, resolution)
}
