//! Quad-tree coordinate system over a bounded rectangular world.
//!
//! The grid recursively splits the world into four quadrants. A cell is
//! addressed by a string over a four-letter alphabet, one letter per split:
//!
//! ```text
//!  +-----+-----+
//!  |  C  |  D  |
//!  +-----+-----+
//!  |  A  |  B  |
//!  +-----+-----+
//! ```
//!
//! The string length is the cell's depth, the empty string is the root and
//! parent/child is the prefix relation. Cell boxes are never stored; they
//! are recomputed from the identifier (or passed down during descent).
//!
//! # Boundaries
//!
//! Cells are half-open `(min, max]` on both axes, closed on the world's
//! outer minimum edge. A point lying exactly on a split line belongs to the
//! lower/left quadrant, and every point of the world falls in exactly one
//! cell per level.

use crate::error::{QuadError, Result, ShapeParseError};
use geo_types::{coord, Polygon, Rect};
use serde::{Deserialize, Serialize};

/// Cell alphabet in quadrant order: lower-left, lower-right, upper-left,
/// upper-right.
pub const QUAD_ALPHABET: [char; 4] = ['A', 'B', 'C', 'D'];

/// Deepest grid supported. Beyond this the f64 midpoints stop being
/// distinct for realistic world sizes.
pub const MAX_GRID_DEPTH: u8 = 50;

/// Map a cell character to its quadrant index.
pub fn quadrant_index(c: char) -> Option<usize> {
    QUAD_ALPHABET.iter().position(|&q| q == c)
}

/// Axis-aligned rectangle of a cell (or of the world).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl CellBox {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Closed-box containment of another box.
    pub fn contains_box(&self, other: &CellBox) -> bool {
        self.min_x <= other.min_x
            && self.max_x >= other.max_x
            && self.min_y <= other.min_y
            && self.max_y >= other.max_y
    }

    /// True if the interiors of the two boxes overlap.
    pub fn overlaps_interior(&self, other: &CellBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Closed-box intersection (touching edges count).
    pub fn intersects(&self, other: &CellBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// The box as a geo polygon, for exact predicates.
    pub fn to_polygon(&self) -> Polygon<f64> {
        Rect::new(
            coord! { x: self.min_x, y: self.min_y },
            coord! { x: self.max_x, y: self.max_y },
        )
        .to_polygon()
    }
}

/// Immutable quad-tree grid.
///
/// Built once (at schema load) and shared read-only; it is `Send + Sync`
/// and is usually held in an `Arc` by the fields that use it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialGrid {
    bounds: CellBox,
    max_depth: u8,
    extra_depth: u8,
}

impl SpatialGrid {
    /// Default levels descended past a shape's best-fit level.
    pub const DEFAULT_EXTRA_DEPTH: u8 = 5;

    /// Create a grid over `[min_x, max_x] x [min_y, max_y]`.
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64, max_depth: u8) -> Result<Self> {
        let finite = [min_x, max_x, min_y, max_y].iter().all(|v| v.is_finite());
        if !finite || min_x >= max_x || min_y >= max_y {
            return Err(QuadError::Config(format!(
                "invalid world bounds: x=[{}, {}] y=[{}, {}]",
                min_x, max_x, min_y, max_y
            )));
        }
        if max_depth > MAX_GRID_DEPTH {
            return Err(QuadError::Config(format!(
                "max depth {} exceeds {}",
                max_depth, MAX_GRID_DEPTH
            )));
        }
        Ok(Self {
            bounds: CellBox::new(min_x, max_x, min_y, max_y),
            max_depth,
            extra_depth: Self::DEFAULT_EXTRA_DEPTH,
        })
    }

    /// The fixed geographic grid: x in `[-180, 180]`, y in `[-270, 90]`.
    ///
    /// The y range is stretched to 360 degrees so every cell is square.
    pub fn geo() -> Self {
        Self {
            bounds: CellBox::new(-180.0, 180.0, -270.0, 90.0),
            max_depth: 16,
            extra_depth: Self::DEFAULT_EXTRA_DEPTH,
        }
    }

    /// Set the number of levels descended past the best-fit level.
    pub fn with_extra_depth(mut self, extra_depth: u8) -> Self {
        self.extra_depth = extra_depth;
        self
    }

    pub fn bounds(&self) -> &CellBox {
        &self.bounds
    }

    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    pub fn extra_depth(&self) -> u8 {
        self.extra_depth
    }

    /// Split a cell into its four children, in alphabet order.
    ///
    /// Children share their midpoint edges exactly, so their union is the
    /// parent with no gap.
    pub fn split(&self, cell: &CellBox) -> [CellBox; 4] {
        let mid_x = cell.min_x + cell.width() / 2.0;
        let mid_y = cell.min_y + cell.height() / 2.0;
        [
            CellBox::new(cell.min_x, mid_x, cell.min_y, mid_y),
            CellBox::new(mid_x, cell.max_x, cell.min_y, mid_y),
            CellBox::new(cell.min_x, mid_x, mid_y, cell.max_y),
            CellBox::new(mid_x, cell.max_x, mid_y, cell.max_y),
        ]
    }

    /// Compute the box of a cell from its identifier.
    pub fn cell_box(&self, cell_id: &str) -> Result<CellBox> {
        let mut cell = self.bounds;
        for c in cell_id.chars() {
            let quadrant = quadrant_index(c).ok_or_else(|| {
                QuadError::bad_input(
                    cell_id,
                    ShapeParseError::InvalidToken {
                        token: cell_id.to_string(),
                        found: c,
                    },
                )
            })?;
            cell = self.split(&cell)[quadrant];
        }
        Ok(cell)
    }

    /// Area of any cell at `depth`.
    pub fn cell_area(&self, depth: u8) -> f64 {
        let scale = 2f64.powi(depth as i32);
        (self.bounds.width() / scale) * (self.bounds.height() / scale)
    }

    /// Shallowest depth whose cells are no larger than `area`.
    ///
    /// Zero-area (or invalid) inputs never fit and get `max_depth`.
    pub fn best_fit_level(&self, area: f64) -> u8 {
        if !(area > 0.0) {
            return self.max_depth;
        }
        (0..=self.max_depth)
            .find(|&depth| self.cell_area(depth) <= area)
            .unwrap_or(self.max_depth)
    }

    /// Depth at which decomposition stops for a given best-fit level.
    pub fn target_depth(&self, best_fit_level: u8) -> u8 {
        best_fit_level
            .saturating_add(self.extra_depth)
            .min(self.max_depth)
    }

    /// Point membership under the `(min, max]` convention.
    pub fn cell_contains_point(&self, cell: &CellBox, x: f64, y: f64) -> bool {
        let in_x = (x > cell.min_x || (x == cell.min_x && cell.min_x == self.bounds.min_x))
            && x <= cell.max_x;
        let in_y = (y > cell.min_y || (y == cell.min_y && cell.min_y == self.bounds.min_y))
            && y <= cell.max_y;
        in_x && in_y
    }

    /// Identifier of the cell at `depth` holding the point, if it is in
    /// the world.
    pub fn cell_for_point(&self, x: f64, y: f64, depth: u8) -> Option<String> {
        if !self.cell_contains_point(&self.bounds, x, y) {
            return None;
        }
        let mut id = String::with_capacity(depth as usize);
        let mut cell = self.bounds;
        for _ in 0..depth {
            let children = self.split(&cell);
            let quadrant = children
                .iter()
                .position(|child| self.cell_contains_point(child, x, y))?;
            id.push(QUAD_ALPHABET[quadrant]);
            cell = children[quadrant];
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> SpatialGrid {
        SpatialGrid::new(-180.0, 180.0, -90.0, 90.0, 16).unwrap()
    }

    #[test]
    fn test_root_is_world() {
        let grid = world();
        assert_eq!(grid.cell_box("").unwrap(), *grid.bounds());
    }

    #[test]
    fn test_split_reconstructs_parent() {
        let grid = world();
        let parent = grid.cell_box("CBD").unwrap();
        let children = grid.split(&parent);

        let area: f64 = children.iter().map(CellBox::area).sum();
        assert_eq!(area, parent.area());
        assert_eq!(children[0].min_x, parent.min_x);
        assert_eq!(children[3].max_x, parent.max_x);
        assert_eq!(children[0].max_x, children[1].min_x);
        assert_eq!(children[0].max_y, children[2].min_y);
        for child in &children {
            assert!(parent.contains_box(child));
        }
    }

    #[test]
    fn test_quadrant_layout() {
        let grid = world();
        assert_eq!(grid.cell_box("A").unwrap(), CellBox::new(-180.0, 0.0, -90.0, 0.0));
        assert_eq!(grid.cell_box("B").unwrap(), CellBox::new(0.0, 180.0, -90.0, 0.0));
        assert_eq!(grid.cell_box("C").unwrap(), CellBox::new(-180.0, 0.0, 0.0, 90.0));
        assert_eq!(grid.cell_box("D").unwrap(), CellBox::new(0.0, 180.0, 0.0, 90.0));
        assert_eq!(
            grid.cell_box("DA").unwrap(),
            CellBox::new(0.0, 90.0, 0.0, 45.0)
        );
    }

    #[test]
    fn test_cell_box_rejects_bad_char() {
        let err = world().cell_box("ABX").unwrap_err();
        assert!(matches!(
            err,
            QuadError::BadInput {
                source: ShapeParseError::InvalidToken { found: 'X', .. },
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(matches!(
            SpatialGrid::new(10.0, 10.0, 0.0, 1.0, 4),
            Err(QuadError::Config(_))
        ));
        assert!(matches!(
            SpatialGrid::new(0.0, 1.0, 0.0, f64::NAN, 4),
            Err(QuadError::Config(_))
        ));
        assert!(matches!(
            SpatialGrid::new(0.0, 1.0, 0.0, 1.0, MAX_GRID_DEPTH + 1),
            Err(QuadError::Config(_))
        ));
    }

    #[test]
    fn test_best_fit_level() {
        let grid = world();
        let world_area = grid.bounds().area();

        assert_eq!(grid.best_fit_level(world_area), 0);
        assert_eq!(grid.best_fit_level(world_area * 2.0), 0);
        // Exactly one level-1 cell: tie favours the shallower depth
        assert_eq!(grid.best_fit_level(world_area / 4.0), 1);
        assert_eq!(grid.best_fit_level(world_area / 5.0), 2);
        assert_eq!(grid.best_fit_level(0.0), grid.max_depth());
    }

    #[test]
    fn test_target_depth_capped() {
        let grid = world();
        assert_eq!(grid.target_depth(0), 5);
        assert_eq!(grid.target_depth(14), 16);
        assert_eq!(grid.with_extra_depth(0).target_depth(3), 3);
    }

    #[test]
    fn test_split_line_goes_lower_left() {
        let grid = world();
        assert_eq!(grid.cell_for_point(0.0, 0.0, 1).unwrap(), "A");
        assert_eq!(grid.cell_for_point(0.0, 0.0, 3).unwrap(), "ADD");
        // World's outer minimum edge is closed
        assert_eq!(grid.cell_for_point(-180.0, -90.0, 2).unwrap(), "AA");
        assert_eq!(grid.cell_for_point(180.0, 90.0, 2).unwrap(), "DD");
        assert!(grid.cell_for_point(181.0, 0.0, 2).is_none());
    }

    #[test]
    fn test_point_in_exactly_one_child() {
        let grid = world();
        let parent = grid.cell_box("B").unwrap();
        for (x, y) in [(90.0, -45.0), (90.0, -90.0), (180.0, 0.0), (45.5, -10.25)] {
            let hits = grid
                .split(&parent)
                .iter()
                .filter(|c| grid.cell_contains_point(c, x, y))
                .count();
            assert_eq!(hits, 1, "point ({}, {})", x, y);
        }
    }
}
