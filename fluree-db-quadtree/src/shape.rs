//! Shapes and the shape literal parser.
//!
//! Accepted input forms:
//!
//! - `[ABA* CAA]`: precomputed quad tokens (see [`crate::token`])
//! - `X Y`: a point
//! - `XMin YMin XMax YMax`: an axis-aligned box; `XMin > XMax` wraps
//!   across the world's horizontal seam
//! - anything else is parsed as WKT (`POLYGON((...))`, `LINESTRING(...)`, ...)
//!
//! Shapes expose a single predicate, [`Shape::relation`], classifying a
//! grid cell against the shape. Exact geometry is delegated to the `geo`
//! crate; points and boxes are answered directly.
//!
//! # Antimeridian
//!
//! WKT x coordinates are longitudes. Consecutive vertices more than 180
//! degrees apart are taken to cross the antimeridian, and the later vertex
//! is shifted by a full turn so the geometry stays continuous (e.g.
//! `LINESTRING(160 10, -170 15)` spans 30 degrees, not 330). A shifted
//! geometry is matched together with a copy moved one turn back.
//! Axis-aligned box polygons become [`Shape::Rectangle`], which wraps.
//!
//! # Validation
//!
//! Polygon rings must be closed, have at least four points, and must not
//! cross or overlap themselves. Violations are parse errors.

use crate::error::{QuadError, Result, ShapeParseError};
use crate::grid::{CellBox, SpatialGrid};
use crate::token::{is_token_list, parse_token_list, QuadToken};
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::dimensions::Dimensions;
use geo::{BoundingRect, HasDimensions, Relate, Translate};
use geo_types::{Coord, Geometry, LineString, Polygon};

/// Largest longitude in either direction.
const MAX_LONGITUDE: f64 = 180.0;

/// One turn of longitude.
const FULL_TURN: f64 = 360.0;

/// Thinnest bounding box, as height over width (or the reverse), used when
/// picking the best-fit level.
const MIN_FIT_ASPECT: f64 = 1.0 / 16.0;

/// How a cell relates to a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialRelation {
    /// No overlap.
    Disjoint,
    /// The cell lies entirely inside the shape.
    Contains,
    /// The shape lies entirely inside the cell.
    Within,
    /// Partial overlap along the shape's boundary.
    Intersects,
}

/// A WKT geometry with precomputed bbox and dimensionality.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryShape {
    geom: Geometry<f64>,
    bbox: Option<CellBox>,
    /// Copy moved one turn back into range, for geometries crossing the
    /// antimeridian.
    seam_copy: Option<(Geometry<f64>, CellBox)>,
    areal: bool,
}

impl GeometryShape {
    pub fn new(mut geom: Geometry<f64>) -> Self {
        let crossed = unwrap_antimeridian(&mut geom);
        Self::unwrapped(geom, crossed)
    }

    fn unwrapped(geom: Geometry<f64>, crossed: bool) -> Self {
        let bbox = geom
            .bounding_rect()
            .map(|r| CellBox::new(r.min().x, r.max().x, r.min().y, r.max().y));
        let seam_copy = bbox
            .filter(|_| crossed)
            .and_then(|b| seam_shift(&b).map(|dx| (b, dx)))
            .map(|(b, dx)| {
                (
                    geom.translate(dx, 0.0),
                    CellBox::new(b.min_x + dx, b.max_x + dx, b.min_y, b.max_y),
                )
            });
        let areal = geom.dimensions() == Dimensions::TwoDimensional;
        Self {
            geom,
            bbox,
            seam_copy,
            areal,
        }
    }

    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geom
    }

    /// Bounding box, with longitudes unwrapped across the antimeridian.
    pub fn bbox(&self) -> Option<&CellBox> {
        self.bbox.as_ref()
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.seam_copy.is_some()
    }

    fn relation(&self, cell: &CellBox) -> SpatialRelation {
        let Some(bbox) = &self.bbox else {
            return SpatialRelation::Disjoint;
        };
        let main = relate_geometry(&self.geom, bbox, self.areal, cell);
        let Some((copy, copy_bbox)) = &self.seam_copy else {
            return main;
        };
        match (main, relate_geometry(copy, copy_bbox, self.areal, cell)) {
            (SpatialRelation::Contains, _) | (_, SpatialRelation::Contains) => {
                SpatialRelation::Contains
            }
            (SpatialRelation::Disjoint, other) | (other, SpatialRelation::Disjoint) => other,
            _ => SpatialRelation::Intersects,
        }
    }
}

fn relate_geometry(
    geom: &Geometry<f64>,
    bbox: &CellBox,
    areal: bool,
    cell: &CellBox,
) -> SpatialRelation {
    if !bbox.intersects(cell) {
        return SpatialRelation::Disjoint;
    }

    let matrix = geom.relate(&Geometry::Polygon(cell.to_polygon()));
    if !matrix.is_intersects() {
        return SpatialRelation::Disjoint;
    }
    // Areas that only share an edge with the cell do not occupy it
    if areal && matrix.is_touches() {
        return SpatialRelation::Disjoint;
    }
    if matrix.is_contains() {
        SpatialRelation::Contains
    } else if matrix.is_within() {
        SpatialRelation::Within
    } else {
        SpatialRelation::Intersects
    }
}

/// A shape to be decomposed into grid cells.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point { x: f64, y: f64 },
    /// Axis-aligned box. `min_x > max_x` wraps across the seam.
    Rectangle(CellBox),
    Geometry(GeometryShape),
}

/// A parsed field value: either raw tokens or a shape to match.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeLiteral {
    Tokens(Vec<QuadToken>),
    Shape(Shape),
}

/// Parse any accepted input form.
pub fn parse_literal(input: &str) -> Result<ShapeLiteral> {
    if is_token_list(input) {
        return parse_token_list(input)
            .map(ShapeLiteral::Tokens)
            .map_err(|e| QuadError::bad_input(input, e));
    }
    Shape::parse(input).map(ShapeLiteral::Shape)
}

impl Shape {
    pub fn point(x: f64, y: f64) -> Self {
        Shape::Point { x, y }
    }

    /// Box in `XMin YMin XMax YMax` argument order.
    pub fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Shape::Rectangle(CellBox::new(min_x, max_x, min_y, max_y))
    }

    /// Wrap a geo geometry. Single points become [`Shape::Point`] so they
    /// follow the grid's boundary convention, and box polygons become
    /// [`Shape::Rectangle`].
    pub fn from_geometry(mut geom: Geometry<f64>) -> Self {
        let crossed = unwrap_antimeridian(&mut geom);
        Self::from_unwrapped(geom, crossed)
    }

    fn from_unwrapped(geom: Geometry<f64>, crossed: bool) -> Self {
        match geom {
            Geometry::Point(p) => Shape::Point { x: p.x(), y: p.y() },
            Geometry::Rect(r) => Shape::rect(r.min().x, r.min().y, r.max().x, r.max().y),
            Geometry::Polygon(p) => match envelope(&p) {
                Some(rect) => rect,
                None => Shape::Geometry(GeometryShape::unwrapped(Geometry::Polygon(p), crossed)),
            },
            other => Shape::Geometry(GeometryShape::unwrapped(other, crossed)),
        }
    }

    /// Parse a point, box or WKT literal.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let numeric = trimmed
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));

        let parsed = if numeric {
            parse_coordinates(trimmed)
        } else {
            parse_wkt(trimmed).and_then(|mut geom| {
                let crossed = unwrap_antimeridian(&mut geom);
                check_simple_rings(&geom)?;
                Ok(Self::from_unwrapped(geom, crossed))
            })
        };
        parsed.map_err(|e| QuadError::bad_input(input, e))
    }

    /// Classify a grid cell against this shape.
    pub fn relation(&self, grid: &SpatialGrid, cell: &CellBox) -> SpatialRelation {
        match self {
            Shape::Point { x, y } => {
                if grid.cell_contains_point(cell, *x, *y) {
                    SpatialRelation::Within
                } else {
                    SpatialRelation::Disjoint
                }
            }
            Shape::Rectangle(rect) => rect_relation(grid, rect, cell),
            Shape::Geometry(geom) => geom.relation(cell),
        }
    }

    /// Area used to pick the best-fit level, or `None` for empty geometry.
    ///
    /// This is the bounding-box area, except that a box thinner than
    /// [`MIN_FIT_ASPECT`] is widened to that aspect, so lines and flat
    /// boxes are matched like the square their length spans. Points have
    /// zero area.
    pub fn fit_area(&self, grid: &SpatialGrid) -> Option<f64> {
        let (width, height) = match self {
            Shape::Point { .. } => return Some(0.0),
            Shape::Rectangle(rect) => {
                let width = if rect.min_x > rect.max_x {
                    rect.width() + grid.bounds().width()
                } else {
                    rect.width()
                };
                (width, rect.height())
            }
            Shape::Geometry(geom) => {
                let bbox = geom.bbox()?;
                (bbox.width(), bbox.height())
            }
        };
        let longest = width.max(height);
        Some((width * height).max(longest * longest * MIN_FIT_ASPECT))
    }
}

/// Shift that moves a bbox left of or past the antimeridian back into
/// range, if it sticks out.
fn seam_shift(bbox: &CellBox) -> Option<f64> {
    if bbox.max_x > MAX_LONGITUDE {
        Some(-FULL_TURN)
    } else if bbox.min_x < -MAX_LONGITUDE {
        Some(FULL_TURN)
    } else {
        None
    }
}

/// Unwrap longitudes in place. Returns true if any vertex was shifted.
fn unwrap_antimeridian(geom: &mut Geometry<f64>) -> bool {
    match geom {
        Geometry::LineString(line) => unwrap_line(line, None),
        Geometry::Polygon(polygon) => unwrap_polygon(polygon),
        Geometry::MultiLineString(lines) => lines
            .0
            .iter_mut()
            .fold(false, |shifted, line| unwrap_line(line, None) | shifted),
        Geometry::MultiPolygon(polygons) => polygons
            .0
            .iter_mut()
            .fold(false, |shifted, polygon| unwrap_polygon(polygon) | shifted),
        Geometry::GeometryCollection(collection) => collection
            .0
            .iter_mut()
            .fold(false, |shifted, g| unwrap_antimeridian(g) | shifted),
        _ => false,
    }
}

fn unwrap_polygon(polygon: &mut Polygon<f64>) -> bool {
    let mut shifted = false;
    polygon.exterior_mut(|ring| shifted |= unwrap_line(ring, None));
    // Holes start on the same side of the seam as the exterior
    let anchor = polygon.exterior().0.first().map(|c| c.x);
    polygon.interiors_mut(|rings| {
        for ring in rings {
            shifted |= unwrap_line(ring, anchor);
        }
    });
    shifted
}

fn unwrap_line(line: &mut LineString<f64>, anchor: Option<f64>) -> bool {
    let mut shifted = false;
    let mut offset = 0.0;
    let mut previous = anchor;
    for coord in line.0.iter_mut() {
        if let Some(prev) = previous {
            let x = coord.x + offset;
            if x - prev > MAX_LONGITUDE {
                offset -= FULL_TURN;
            } else if prev - x > MAX_LONGITUDE {
                offset += FULL_TURN;
            }
        }
        coord.x += offset;
        shifted |= offset != 0.0;
        previous = Some(coord.x);
    }
    shifted
}

/// An axis-aligned box polygon as a rectangle, wrapping if it was
/// unwrapped past the antimeridian.
fn envelope(polygon: &Polygon<f64>) -> Option<Shape> {
    if !polygon.interiors().is_empty() {
        return None;
    }
    let ring = &polygon.exterior().0;
    if ring.len() != 5 {
        return None;
    }
    let rect = polygon.bounding_rect()?;
    let (min, max) = (rect.min(), rect.max());
    if min.x == max.x || min.y == max.y {
        return None;
    }

    let on_corner =
        |c: &Coord<f64>| (c.x == min.x || c.x == max.x) && (c.y == min.y || c.y == max.y);
    let axis_aligned = ring
        .windows(2)
        .all(|pair| (pair[0].x == pair[1].x) != (pair[0].y == pair[1].y));
    let distinct = (0..4).all(|i| (i + 1..4).all(|j| ring[i] != ring[j]));
    if !(axis_aligned && distinct && ring.iter().all(on_corner)) {
        return None;
    }

    let (min_x, max_x) = match seam_shift(&CellBox::new(min.x, max.x, min.y, max.y)) {
        Some(dx) if dx < 0.0 => (min.x, max.x + dx),
        Some(dx) => (min.x + dx, max.x),
        None => (min.x, max.x),
    };
    Some(Shape::rect(min_x, min.y, max_x, max.y))
}

/// Reject rings that cross or overlap themselves.
fn check_simple_rings(geom: &Geometry<f64>) -> std::result::Result<(), ShapeParseError> {
    match geom {
        Geometry::Polygon(polygon) => check_polygon(polygon),
        Geometry::MultiPolygon(polygons) => polygons.0.iter().try_for_each(check_polygon),
        Geometry::GeometryCollection(collection) => {
            collection.0.iter().try_for_each(check_simple_rings)
        }
        _ => Ok(()),
    }
}

fn check_polygon(polygon: &Polygon<f64>) -> std::result::Result<(), ShapeParseError> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .try_for_each(check_simple_ring)
}

fn check_simple_ring(ring: &LineString<f64>) -> std::result::Result<(), ShapeParseError> {
    let segments: Vec<_> = ring.lines().filter(|l| l.start != l.end).collect();
    let n = segments.len();
    for i in 0..n {
        for j in i + 1..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            match line_intersection(segments[i], segments[j]) {
                None => {}
                Some(LineIntersection::SinglePoint { .. }) if adjacent => {}
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    return Err(ShapeParseError::InvalidGeometry(format!(
                        "ring self-intersects at ({} {})",
                        intersection.x, intersection.y
                    )));
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    return Err(ShapeParseError::InvalidGeometry(format!(
                        "ring overlaps itself from ({} {}) to ({} {})",
                        intersection.start.x,
                        intersection.start.y,
                        intersection.end.x,
                        intersection.end.y
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Split a (possibly wrapping) box into the parts inside the world.
fn rect_parts(grid: &SpatialGrid, rect: &CellBox) -> Vec<CellBox> {
    if rect.min_x > rect.max_x {
        let world = grid.bounds();
        vec![
            CellBox::new(rect.min_x, world.max_x, rect.min_y, rect.max_y),
            CellBox::new(world.min_x, rect.max_x, rect.min_y, rect.max_y),
        ]
    } else {
        vec![*rect]
    }
}

fn rect_relation(grid: &SpatialGrid, rect: &CellBox, cell: &CellBox) -> SpatialRelation {
    let parts = rect_parts(grid, rect);

    if rect.width() == 0.0 && rect.height() == 0.0 {
        return Shape::point(rect.min_x, rect.min_y).relation(grid, cell);
    }
    let degenerate = rect.width() == 0.0 || rect.height() == 0.0;

    if parts.iter().any(|p| !degenerate && p.contains_box(cell)) {
        return SpatialRelation::Contains;
    }
    let overlapping = parts
        .iter()
        .filter(|p| {
            if degenerate {
                p.intersects(cell)
            } else {
                p.overlaps_interior(cell)
            }
        })
        .count();
    if overlapping == 0 {
        SpatialRelation::Disjoint
    } else if parts.iter().all(|p| cell.contains_box(p)) {
        SpatialRelation::Within
    } else {
        SpatialRelation::Intersects
    }
}

fn parse_coordinates(input: &str) -> std::result::Result<Shape, ShapeParseError> {
    let values = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|token| {
            let value: f64 = token
                .parse()
                .map_err(|source| ShapeParseError::InvalidNumber {
                    token: token.to_string(),
                    source,
                })?;
            if value.is_finite() {
                Ok(value)
            } else {
                Err(ShapeParseError::NonFinite(value))
            }
        })
        .collect::<std::result::Result<Vec<f64>, _>>()?;

    match values.as_slice() {
        [x, y] => Ok(Shape::point(*x, *y)),
        [min_x, min_y, max_x, max_y] => {
            if min_y > max_y {
                return Err(ShapeParseError::InvalidBox(format!(
                    "min y {} above max y {}",
                    min_y, max_y
                )));
            }
            Ok(Shape::rect(*min_x, *min_y, *max_x, *max_y))
        }
        other => Err(ShapeParseError::WrongArity(other.len())),
    }
}

/// Parse WKT string to geo-types Geometry.
///
/// Polygon rings must be written closed with at least four points; the
/// conversion would otherwise close them silently.
pub fn parse_wkt(wkt: &str) -> std::result::Result<Geometry<f64>, ShapeParseError> {
    use std::str::FromStr;
    let parsed = wkt::Wkt::<f64>::from_str(wkt).map_err(|e| ShapeParseError::Wkt(e.to_string()))?;
    check_closed_rings(&parsed)?;
    parsed
        .try_into()
        .map_err(|e: wkt::geo_types_from_wkt::Error| ShapeParseError::WktConversion(format!("{:?}", e)))
}

fn check_closed_rings(parsed: &wkt::Wkt<f64>) -> std::result::Result<(), ShapeParseError> {
    match parsed {
        wkt::Wkt::Polygon(polygon) => polygon.0.iter().try_for_each(check_closed_ring),
        wkt::Wkt::MultiPolygon(polygons) => polygons
            .0
            .iter()
            .flat_map(|polygon| polygon.0.iter())
            .try_for_each(check_closed_ring),
        wkt::Wkt::GeometryCollection(collection) => {
            collection.0.iter().try_for_each(check_closed_rings)
        }
        _ => Ok(()),
    }
}

fn check_closed_ring(
    ring: &wkt::types::LineString<f64>,
) -> std::result::Result<(), ShapeParseError> {
    let coords = &ring.0;
    let (Some(first), Some(last)) = (coords.first(), coords.last()) else {
        return Ok(());
    };
    if (first.x, first.y) != (last.x, last.y) {
        return Err(ShapeParseError::InvalidGeometry(format!(
            "ring is not closed: starts at ({} {}), ends at ({} {})",
            first.x, first.y, last.x, last.y
        )));
    }
    if coords.len() < 4 {
        return Err(ShapeParseError::InvalidGeometry(format!(
            "ring has {} points, at least 4 required",
            coords.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> SpatialGrid {
        SpatialGrid::new(-180.0, 180.0, -90.0, 90.0, 16).unwrap()
    }

    #[test]
    fn test_parse_point_and_box() {
        assert_eq!(Shape::parse("1.23 4.56").unwrap(), Shape::point(1.23, 4.56));
        assert_eq!(
            Shape::parse(" -10 -5 10 5 ").unwrap(),
            Shape::Rectangle(CellBox::new(-10.0, 10.0, -5.0, 5.0))
        );
        assert_eq!(Shape::parse("1,2").unwrap(), Shape::point(1.0, 2.0));
    }

    #[test]
    fn test_parse_errors_carry_cause() {
        let err = Shape::parse("1 2 3").unwrap_err();
        assert!(matches!(
            err,
            QuadError::BadInput {
                source: ShapeParseError::WrongArity(3),
                ..
            }
        ));

        let err = Shape::parse("1 abc").unwrap_err();
        assert!(matches!(
            err,
            QuadError::BadInput {
                source: ShapeParseError::InvalidNumber { .. },
                ..
            }
        ));

        assert!(matches!(
            Shape::parse("0 5 1 4"),
            Err(QuadError::BadInput {
                source: ShapeParseError::InvalidBox(_),
                ..
            })
        ));
        assert!(Shape::parse("1 inf").is_err());
        assert!(Shape::parse("POLYGON((0 0, 1 0").is_err());
    }

    #[test]
    fn test_parse_wkt_polygon() {
        let shape = Shape::parse("POLYGON((0 0, 10 0, 10 20, 5 25, 0 20, 0 0))").unwrap();
        let Shape::Geometry(geom) = &shape else {
            panic!("expected geometry, got {:?}", shape);
        };
        assert!(matches!(geom.geometry(), Geometry::Polygon(_)));
        assert_eq!(geom.bbox(), Some(&CellBox::new(0.0, 10.0, 0.0, 25.0)));
        assert!(!geom.crosses_antimeridian());
        assert_eq!(shape.fit_area(&world()), Some(250.0));
    }

    #[test]
    fn test_box_polygon_becomes_rectangle() {
        assert_eq!(
            Shape::parse("POLYGON((0 5, 10 5, 10 20, 0 20, 0 5))").unwrap(),
            Shape::rect(0.0, 5.0, 10.0, 20.0)
        );
        // Not a box: a hole, or a vertex off the corners
        assert!(matches!(
            Shape::parse("POLYGON((0 0, 10 0, 10 10, 0 10, 0 0), (2 2, 4 2, 4 4, 2 4, 2 2))")
                .unwrap(),
            Shape::Geometry(_)
        ));
        assert!(matches!(
            Shape::parse("POLYGON((0 0, 10 0, 10 10, 5 10, 0 0))").unwrap(),
            Shape::Geometry(_)
        ));
    }

    #[test]
    fn test_box_polygon_across_antimeridian_wraps() {
        let expected = Shape::Rectangle(CellBox::new(160.0, -170.0, 0.0, 10.0));
        assert_eq!(
            Shape::parse("POLYGON((160 0, -170 0, -170 10, 160 10, 160 0))").unwrap(),
            expected
        );
        assert_eq!(
            Shape::parse("POLYGON((160 0, 160 10, -170 10, -170 0, 160 0))").unwrap(),
            expected
        );
        assert_eq!(expected.fit_area(&world()), Some(300.0));
    }

    #[test]
    fn test_linestring_across_antimeridian() {
        let grid = world();
        let shape = Shape::parse("LINESTRING(160 10, -170 15)").unwrap();
        let Shape::Geometry(geom) = &shape else {
            panic!("expected geometry, got {:?}", shape);
        };
        assert!(geom.crosses_antimeridian());
        assert_eq!(geom.bbox().map(CellBox::width), Some(30.0));

        // Both sides of the seam, nothing in between
        assert_eq!(
            shape.relation(&grid, &CellBox::new(170.0, 180.0, 0.0, 20.0)),
            SpatialRelation::Intersects
        );
        assert_eq!(
            shape.relation(&grid, &CellBox::new(-180.0, -175.0, 0.0, 20.0)),
            SpatialRelation::Intersects
        );
        assert_eq!(
            shape.relation(&grid, &CellBox::new(-10.0, 10.0, 0.0, 20.0)),
            SpatialRelation::Disjoint
        );
        assert_eq!(
            shape.relation(&grid, &CellBox::new(0.0, 180.0, 0.0, 90.0)),
            SpatialRelation::Intersects
        );
    }

    #[test]
    fn test_invalid_polygons_rejected() {
        for wkt in [
            "POLYGON((0 0, 10 0, 10 20, 5 -5, 0 20, 0 0))",
            "POLYGON((0 0, 10 0, 10 20))",
            "POLYGON((0 0, 10 0, 0 0))",
            "POLYGON((0 0, 10 0, 10 10, 0 10, 0 0), (2 2, 4 2, 4 4, 2 4))",
            "MULTIPOLYGON(((0 0, 10 0, 10 10, 0 10, 0 0)), ((20 20, 30 20, 30 30)))",
            "POLYGON((0 0, 10 0, 10 10, 10 5, 10 0, 0 0))",
        ] {
            let err = Shape::parse(wkt).unwrap_err();
            assert!(
                matches!(
                    err,
                    QuadError::BadInput {
                        source: ShapeParseError::InvalidGeometry(_),
                        ..
                    }
                ),
                "{}: {:?}",
                wkt,
                err
            );
        }
        assert!(Shape::parse("POLYGON((0 0, 5 0, 10 0, 10 10, 0 10, 0 0))").is_ok());
    }

    #[test]
    fn test_fit_area_widens_thin_boxes() {
        let grid = world();
        assert_eq!(Shape::rect(0.0, 0.0, 90.0, 0.0).fit_area(&grid), Some(8100.0 / 16.0));
        assert_eq!(Shape::rect(0.0, 0.0, 40.0, 1.0).fit_area(&grid), Some(100.0));
        assert_eq!(Shape::rect(0.0, 0.0, 10.0, 10.0).fit_area(&grid), Some(100.0));
    }

    #[test]
    fn test_wkt_point_becomes_point() {
        assert_eq!(Shape::parse("POINT(3 4)").unwrap(), Shape::point(3.0, 4.0));
    }

    #[test]
    fn test_parse_literal_dispatch() {
        assert!(matches!(
            parse_literal("[AB* C]").unwrap(),
            ShapeLiteral::Tokens(ref t) if t.len() == 2
        ));
        assert!(matches!(
            parse_literal("1 2").unwrap(),
            ShapeLiteral::Shape(Shape::Point { .. })
        ));
        assert!(matches!(
            parse_literal("[AB"),
            Err(QuadError::BadInput {
                source: ShapeParseError::UnterminatedTokenList,
                ..
            })
        ));
    }

    #[test]
    fn test_rect_relations() {
        let grid = world();
        let shape = Shape::rect(-10.0, -10.0, 10.0, 10.0);

        let inner = CellBox::new(-5.0, 5.0, -5.0, 5.0);
        let outer = CellBox::new(-20.0, 20.0, -20.0, 20.0);
        let partial = CellBox::new(5.0, 15.0, 5.0, 15.0);
        let far = CellBox::new(50.0, 60.0, 50.0, 60.0);
        let touching = CellBox::new(10.0, 20.0, -10.0, 10.0);

        assert_eq!(shape.relation(&grid, &inner), SpatialRelation::Contains);
        assert_eq!(shape.relation(&grid, &outer), SpatialRelation::Within);
        assert_eq!(shape.relation(&grid, &partial), SpatialRelation::Intersects);
        assert_eq!(shape.relation(&grid, &far), SpatialRelation::Disjoint);
        assert_eq!(shape.relation(&grid, &touching), SpatialRelation::Disjoint);
    }

    #[test]
    fn test_wrapping_rect() {
        let grid = world();
        let shape = Shape::rect(170.0, -10.0, -170.0, 10.0);

        let east = CellBox::new(172.0, 175.0, -5.0, 5.0);
        let west = CellBox::new(-175.0, -172.0, -5.0, 5.0);
        let middle = CellBox::new(-10.0, 10.0, -5.0, 5.0);

        assert_eq!(shape.relation(&grid, &east), SpatialRelation::Contains);
        assert_eq!(shape.relation(&grid, &west), SpatialRelation::Contains);
        assert_eq!(shape.relation(&grid, &middle), SpatialRelation::Disjoint);
        assert_eq!(shape.relation(&grid, grid.bounds()), SpatialRelation::Within);
        assert_eq!(shape.fit_area(&grid), Some(20.0 * 20.0));
    }

    #[test]
    fn test_polygon_relations() {
        let grid = world();
        let shape = Shape::parse("POLYGON((0 0, 40 0, 40 40, 20 50, 0 40, 0 0))").unwrap();
        assert!(matches!(shape, Shape::Geometry(_)));

        assert_eq!(
            shape.relation(&grid, &CellBox::new(10.0, 20.0, 10.0, 20.0)),
            SpatialRelation::Contains
        );
        assert_eq!(
            shape.relation(&grid, &CellBox::new(-90.0, 90.0, -90.0, 90.0)),
            SpatialRelation::Within
        );
        assert_eq!(
            shape.relation(&grid, &CellBox::new(30.0, 50.0, 30.0, 50.0)),
            SpatialRelation::Intersects
        );
        // Shares only an edge
        assert_eq!(
            shape.relation(&grid, &CellBox::new(40.0, 50.0, 0.0, 10.0)),
            SpatialRelation::Disjoint
        );
        assert_eq!(
            shape.relation(&grid, &CellBox::new(100.0, 110.0, 0.0, 10.0)),
            SpatialRelation::Disjoint
        );
    }

    #[test]
    fn test_linestring_relation() {
        let grid = world();
        let shape = Shape::parse("LINESTRING(-10 5, 10 5)").unwrap();

        assert_eq!(
            shape.relation(&grid, &CellBox::new(-20.0, 20.0, 0.0, 10.0)),
            SpatialRelation::Within
        );
        assert_eq!(
            shape.relation(&grid, &CellBox::new(0.0, 20.0, 0.0, 10.0)),
            SpatialRelation::Intersects
        );
        assert_eq!(
            shape.relation(&grid, &CellBox::new(0.0, 20.0, 10.0, 20.0)),
            SpatialRelation::Disjoint
        );
    }

    #[test]
    fn test_point_relation_uses_grid_convention() {
        let grid = world();
        let shape = Shape::point(0.0, 0.0);
        let [a, b, c, d] = grid.split(grid.bounds());

        assert_eq!(shape.relation(&grid, &a), SpatialRelation::Within);
        assert_eq!(shape.relation(&grid, &b), SpatialRelation::Disjoint);
        assert_eq!(shape.relation(&grid, &c), SpatialRelation::Disjoint);
        assert_eq!(shape.relation(&grid, &d), SpatialRelation::Disjoint);
        assert_eq!(shape.fit_area(&grid), Some(0.0));
    }
}
