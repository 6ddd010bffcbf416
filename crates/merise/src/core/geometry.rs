//! Geometric primitives and node bounding boxes
//!
//! Everything here is pure: the same positions and sizes always give the
//! same points.

use serde::Serialize;

use super::{Association, EditorConfig, Entity};

/// A point on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Vector from `self` to `other`
    pub fn to(self, other: Point) -> Point {
        Point::new(other.x - self.x, other.y - self.y)
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Width and height of a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Axis-aligned rectangle given by its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

pub fn distance(p1: Point, p2: Point) -> f64 {
    p1.to(p2).length()
}

/// Angle of the vector from `p1` to `p2`, in radians
pub fn angle_between(p1: Point, p2: Point) -> f64 {
    (p2.y - p1.y).atan2(p2.x - p1.x)
}

/// Offset of length `distance` perpendicular to `angle`
pub fn perpendicular_offset(angle: f64, distance: f64) -> Point {
    Point::new(-angle.sin() * distance, angle.cos() * distance)
}

/// Round a position to the nearest grid intersection when enabled
pub fn snap_to_grid(pos: Point, grid_size: f64, enabled: bool) -> Point {
    if !enabled || grid_size <= 0.0 {
        return pos;
    }
    Point::new(
        (pos.x / grid_size).round() * grid_size,
        (pos.y / grid_size).round() * grid_size,
    )
}

/// Entity size: fixed width, height grows with the attribute count
pub fn entity_size(entity: &Entity, config: &EditorConfig) -> Size {
    Size {
        width: config.entity_width,
        height: config.entity_min_height + entity.attributes.len() as f64 * config.attribute_height,
    }
}

/// Association size: fixed width, at least the minimum height
pub fn association_size(association: &Association, config: &EditorConfig) -> Size {
    let content = config.association_header_height
        + association.attributes.len() as f64 * config.association_attribute_height
        + config.association_padding * 2.0;
    Size {
        width: config.association_width,
        height: config.association_min_height.max(content),
    }
}

pub fn entity_bounds(entity: &Entity, config: &EditorConfig) -> Rect {
    let size = entity_size(entity, config);
    Rect::new(entity.x, entity.y, size.width, size.height)
}

/// Associations are positioned by their centre
pub fn association_bounds(association: &Association, config: &EditorConfig) -> Rect {
    let size = association_size(association, config);
    Rect::new(
        association.x - size.width / 2.0,
        association.y - size.height / 2.0,
        size.width,
        size.height,
    )
}

pub fn entity_center(entity: &Entity, config: &EditorConfig) -> Point {
    entity_bounds(entity, config).center()
}

/// Point on the ellipse inscribed in the association box, in the direction of `target`
///
/// This approximates the rounded rectangle by its inscribed ellipse.
pub fn association_edge_point(association: &Association, target: Point, config: &EditorConfig) -> Point {
    let size = association_size(association, config);
    let angle = (target.y - association.y).atan2(target.x - association.x);
    let a = size.width / 2.0;
    let b = size.height / 2.0;
    Point::new(association.x + a * angle.cos(), association.y + b * angle.sin())
}

/// Point where the segment from the entity centre to `target` leaves the entity box
pub fn entity_edge_point(entity: &Entity, target: Point, config: &EditorConfig) -> Point {
    let bounds = entity_bounds(entity, config);
    let center = bounds.center();
    let dx = target.x - center.x;
    let dy = target.y - center.y;

    if dx == 0.0 && dy == 0.0 {
        return Point::new(center.x, bounds.y);
    }

    if (dx / bounds.width).abs() > (dy / bounds.height).abs() {
        let x = if dx > 0.0 { bounds.right() } else { bounds.x };
        Point::new(x, center.y + (dy / dx) * (x - center.x))
    } else {
        let y = if dy > 0.0 { bounds.bottom() } else { bounds.y };
        Point::new(center.x + (dx / dy) * (y - center.y), y)
    }
}

/// Point on a cubic Bézier curve at parameter `t`
pub fn cubic_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let u = 1.0 - t;
    let a = u * u * u;
    let b = 3.0 * u * u * t;
    let c = 3.0 * u * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Attribute;

    fn entity_at(x: f64, y: f64, attrs: usize) -> Entity {
        let attributes = (0..attrs)
            .map(|i| Attribute::new(format!("attr_{}", i), format!("a{}", i)))
            .collect();
        Entity::new("e", "E", x, y, attributes)
    }

    #[test]
    fn test_entity_size_grows_with_attributes() {
        let config = EditorConfig::default();
        assert_eq!(entity_size(&entity_at(0.0, 0.0, 1), &config).height, 128.0);
        assert_eq!(entity_size(&entity_at(0.0, 0.0, 3), &config).height, 184.0);
    }

    #[test]
    fn test_association_size_has_minimum() {
        let config = EditorConfig::default();
        let mut assoc = Association::new("a", "A", 0.0, 0.0, Vec::new());
        assert_eq!(association_size(&assoc, &config).height, 100.0);
        assoc.attributes = (0..4).map(|i| Attribute::new(format!("x{}", i), "x")).collect();
        // 30 header + 4 * 24 rows + 2 * 12 padding
        assert_eq!(association_size(&assoc, &config).height, 150.0);
    }

    #[test]
    fn test_association_edge_point_is_on_ellipse() {
        let config = EditorConfig::default();
        let assoc = Association::new("a", "A", 500.0, 300.0, Vec::new());
        let right = association_edge_point(&assoc, Point::new(900.0, 300.0), &config);
        assert!((right.x - 580.0).abs() < 1e-9);
        assert!((right.y - 300.0).abs() < 1e-9);

        let below = association_edge_point(&assoc, Point::new(500.0, 900.0), &config);
        assert!((below.x - 500.0).abs() < 1e-9);
        assert!((below.y - 350.0).abs() < 1e-9);
    }

    #[test]
    fn test_entity_edge_point_vertical_side() {
        let config = EditorConfig::default();
        // 220 x 128 box, centre (210, 164)
        let entity = entity_at(100.0, 100.0, 1);
        let p = entity_edge_point(&entity, Point::new(600.0, 164.0), &config);
        assert_eq!(p, Point::new(320.0, 164.0));
        let p = entity_edge_point(&entity, Point::new(-400.0, 164.0), &config);
        assert_eq!(p, Point::new(100.0, 164.0));
    }

    #[test]
    fn test_entity_edge_point_horizontal_side() {
        let config = EditorConfig::default();
        let entity = entity_at(100.0, 100.0, 1);
        let p = entity_edge_point(&entity, Point::new(210.0, 600.0), &config);
        assert_eq!(p, Point::new(210.0, 228.0));
        let p = entity_edge_point(&entity, Point::new(260.0, 0.0), &config);
        assert!((p.y - 100.0).abs() < 1e-9);
        assert!((p.x - (210.0 + 50.0 * 64.0 / 164.0)).abs() < 1e-9);
    }

    #[test]
    fn test_entity_edge_point_coincident_centre() {
        let config = EditorConfig::default();
        let entity = entity_at(0.0, 0.0, 1);
        let p = entity_edge_point(&entity, entity_center(&entity, &config), &config);
        assert_eq!(p, Point::new(110.0, 0.0));
    }

    #[test]
    fn test_snap_to_grid() {
        assert_eq!(snap_to_grid(Point::new(31.0, 49.0), 20.0, true), Point::new(40.0, 40.0));
        assert_eq!(snap_to_grid(Point::new(31.0, 49.0), 20.0, false), Point::new(31.0, 49.0));
    }

    #[test]
    fn test_perpendicular_offset() {
        let off = perpendicular_offset(0.0, 15.0);
        assert!(off.x.abs() < 1e-12);
        assert!((off.y - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_cubic_endpoints() {
        let p0 = Point::new(0.0, 0.0);
        let p3 = Point::new(10.0, 0.0);
        let p1 = Point::new(2.0, 5.0);
        let p2 = Point::new(8.0, 5.0);
        assert_eq!(cubic_point(p0, p1, p2, p3, 0.0), p0);
        assert_eq!(cubic_point(p0, p1, p2, p3, 1.0), p3);
        let mid = cubic_point(p0, p1, p2, p3, 0.5);
        assert!((mid.x - 5.0).abs() < 1e-12);
        assert!((mid.y - 3.75).abs() < 1e-12);
    }

    #[test]
    fn test_rect_union() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, -5.0, 5.0, 5.0);
        assert_eq!(a.union(&b), Rect::new(0.0, -5.0, 25.0, 15.0));
        assert!(a.contains(Point::new(5.0, 5.0)));
    }
}
