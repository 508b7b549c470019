//! Geometry primitives used by map items and region filters

use std::f64::consts::{PI, TAU};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::crs::{CoordinateTransform, Crs, TransformDirection};
use crate::error::ItemResult;

/// Default angular step used when approximating circles by polygons
pub const DEFAULT_SEGMENT_ANGLE: f64 = PI / 22.5;

/// Axis-aligned rectangle in map units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Default for Rect {
    fn default() -> Self {
        Self::empty()
    }
}

impl Rect {
    /// Create a rectangle from its bounds
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// A rectangle containing nothing; `union_point` grows it
    pub fn empty() -> Self {
        Self {
            x_min: f64::INFINITY,
            y_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_max: f64::NEG_INFINITY,
        }
    }

    /// Degenerate rectangle around a single point
    pub fn from_point(p: DVec2) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }

    /// Bounding rectangle of a set of points
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a DVec2>) -> Self {
        let mut rect = Self::empty();
        for p in points {
            rect.union_point(*p);
        }
        rect
    }

    /// Whether the rectangle contains no point at all
    pub fn is_empty(&self) -> bool {
        self.x_max < self.x_min || self.y_max < self.y_min
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(
            0.5 * (self.x_min + self.x_max),
            0.5 * (self.y_min + self.y_max),
        )
    }

    /// Corners in the order (min,min), (max,min), (max,max), (min,max)
    pub fn corners(&self) -> [DVec2; 4] {
        [
            DVec2::new(self.x_min, self.y_min),
            DVec2::new(self.x_max, self.y_min),
            DVec2::new(self.x_max, self.y_max),
            DVec2::new(self.x_min, self.y_max),
        ]
    }

    /// Inclusive containment test
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x_min <= other.x_max
            && other.x_min <= self.x_max
            && self.y_min <= other.y_max
            && other.y_min <= self.y_max
    }

    /// Grow the rectangle to include `p`
    pub fn union_point(&mut self, p: DVec2) {
        self.x_min = self.x_min.min(p.x);
        self.y_min = self.y_min.min(p.y);
        self.x_max = self.x_max.max(p.x);
        self.y_max = self.y_max.max(p.y);
    }

    /// Rectangle grown by `distance` on every side
    pub fn buffered(&self, distance: f64) -> Self {
        Self::new(
            self.x_min - distance,
            self.y_min - distance,
            self.x_max + distance,
            self.y_max + distance,
        )
    }
}

/// Coarse geometry classes, used as picking filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeometryType {
    Point,
    Line,
    Polygon,
    /// Matches every geometry
    #[default]
    Unknown,
}

impl GeometryType {
    /// Whether a geometry of type `other` passes this filter
    pub fn accepts(&self, other: GeometryType) -> bool {
        *self == GeometryType::Unknown || *self == other
    }
}

/// Geometry of a map item or picked feature
///
/// Polygon rings are implicitly closed: the last vertex connects back to the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Point(DVec2),
    LineString(Vec<DVec2>),
    Polygon(Vec<DVec2>),
    Rectangle(Rect),
    Circle { center: DVec2, radius: f64 },
    MultiPolygon(Vec<Vec<DVec2>>),
}

impl Geometry {
    /// Get the coarse geometry class
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point(_) => GeometryType::Point,
            Geometry::LineString(_) => GeometryType::Line,
            Geometry::Polygon(_)
            | Geometry::Rectangle(_)
            | Geometry::Circle { .. }
            | Geometry::MultiPolygon(_) => GeometryType::Polygon,
        }
    }

    /// Whether the geometry has curved segments
    pub fn is_curved(&self) -> bool {
        matches!(self, Geometry::Circle { .. })
    }

    /// Number of parts (only multi-polygons have more than one)
    pub fn part_count(&self) -> usize {
        match self {
            Geometry::MultiPolygon(parts) => parts.len(),
            _ => 1,
        }
    }

    /// First part of a multi-geometry, or the geometry itself
    pub fn first_part(&self) -> Option<Geometry> {
        match self {
            Geometry::MultiPolygon(parts) => parts.first().cloned().map(Geometry::Polygon),
            other => Some(other.clone()),
        }
    }

    pub fn bounding_box(&self) -> Rect {
        match self {
            Geometry::Point(p) => Rect::from_point(*p),
            Geometry::LineString(points) | Geometry::Polygon(points) => Rect::from_points(points),
            Geometry::Rectangle(rect) => *rect,
            Geometry::Circle { center, radius } => {
                Rect::from_point(*center).buffered(radius.abs())
            }
            Geometry::MultiPolygon(parts) => Rect::from_points(parts.iter().flatten()),
        }
    }

    /// Approximate curved geometries by straight segments
    ///
    /// Circles become polygons with one vertex every `angle_step` radians;
    /// other geometries are returned unchanged.
    pub fn segmentize(&self, angle_step: f64) -> Geometry {
        match self {
            Geometry::Circle { center, radius } => {
                Geometry::Polygon(circle_ring(*center, *radius, angle_step))
            }
            other => other.clone(),
        }
    }

    /// Outer ring of an areal geometry
    pub fn to_ring(&self) -> Option<Vec<DVec2>> {
        match self {
            Geometry::Polygon(ring) => Some(ring.clone()),
            Geometry::Rectangle(rect) => Some(rect.corners().to_vec()),
            Geometry::Circle { center, radius } => {
                Some(circle_ring(*center, *radius, DEFAULT_SEGMENT_ANGLE))
            }
            Geometry::MultiPolygon(parts) => parts.first().cloned(),
            Geometry::Point(_) | Geometry::LineString(_) => None,
        }
    }

    /// Transform every vertex through `transform`
    ///
    /// Rectangles stay axis-aligned (bounding box of the transformed corners);
    /// circles keep their shape with the radius measured along the x axis.
    pub fn transform(
        &self,
        transform: &dyn CoordinateTransform,
        source: &Crs,
        target: &Crs,
        direction: TransformDirection,
    ) -> ItemResult<Geometry> {
        let tr = |p: DVec2| transform.transform(p, source, target, direction);
        let ring = |points: &[DVec2]| points.iter().map(|p| tr(*p)).collect::<ItemResult<Vec<_>>>();

        Ok(match self {
            Geometry::Point(p) => Geometry::Point(tr(*p)?),
            Geometry::LineString(points) => Geometry::LineString(ring(points)?),
            Geometry::Polygon(points) => Geometry::Polygon(ring(points)?),
            Geometry::Rectangle(rect) => {
                let corners = ring(&rect.corners())?;
                Geometry::Rectangle(Rect::from_points(&corners))
            }
            Geometry::Circle { center, radius } => {
                let c = tr(*center)?;
                let edge = tr(*center + DVec2::new(*radius, 0.0))?;
                Geometry::Circle {
                    center: c,
                    radius: c.distance(edge),
                }
            }
            Geometry::MultiPolygon(parts) => Geometry::MultiPolygon(
                parts
                    .iter()
                    .map(|part| ring(part))
                    .collect::<ItemResult<Vec<_>>>()?,
            ),
        })
    }
}

/// Polygon approximation of a circle, starting at angle 0, counter-clockwise
pub fn circle_ring(center: DVec2, radius: f64, angle_step: f64) -> Vec<DVec2> {
    let step = if angle_step > 0.0 {
        angle_step
    } else {
        DEFAULT_SEGMENT_ANGLE
    };
    // Tolerance keeps exact divisors of a full turn from gaining a vertex
    let segments = ((TAU / step - 1e-9).ceil() as usize).max(3);
    (0..segments)
        .map(|i| {
            let angle = i as f64 / segments as f64 * TAU;
            center + DVec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// Winding number of `ring` around `p` (zero means outside)
pub fn winding_number(ring: &[DVec2], p: DVec2) -> i32 {
    let n = ring.len();
    if n < 3 {
        return 0;
    }

    let mut winding = 0;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        // Sign of the cross product tells on which side of a->b the point lies
        let side = (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y);
        if a.y <= p.y {
            if b.y > p.y && side > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && side < 0.0 {
            winding -= 1;
        }
    }
    winding
}

/// Nonzero winding rule containment
pub fn contains_point_winding(ring: &[DVec2], p: DVec2) -> bool {
    winding_number(ring, p) != 0
}

fn segments_intersect(a1: DVec2, a2: DVec2, b1: DVec2, b2: DVec2) -> bool {
    let cross = |o: DVec2, a: DVec2, b: DVec2| (a - o).perp_dot(b - o);
    let on_segment = |p: DVec2, q: DVec2, r: DVec2| {
        q.x >= p.x.min(r.x) && q.x <= p.x.max(r.x) && q.y >= p.y.min(r.y) && q.y <= p.y.max(r.y)
    };

    let d1 = cross(b1, b2, a1);
    let d2 = cross(b1, b2, a2);
    let d3 = cross(a1, a2, b1);
    let d4 = cross(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(b1, a1, b2))
        || (d2 == 0.0 && on_segment(b1, a2, b2))
        || (d3 == 0.0 && on_segment(a1, b1, a2))
        || (d4 == 0.0 && on_segment(a1, b2, a2))
}

/// Whether a polyline (or closed ring) touches a rectangle
pub fn path_intersects_rect(points: &[DVec2], closed: bool, rect: &Rect) -> bool {
    if points.is_empty() || rect.is_empty() {
        return false;
    }
    if points.iter().any(|p| rect.contains(*p)) {
        return true;
    }
    if closed && contains_point_winding(points, rect.center()) {
        return true;
    }

    let corners = rect.corners();
    let edge_count = if closed {
        points.len()
    } else {
        points.len().saturating_sub(1)
    };
    (0..edge_count).any(|i| {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        (0..4).any(|j| segments_intersect(a, b, corners[j], corners[(j + 1) % 4]))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<DVec2> {
        vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(10.0, 10.0),
            DVec2::new(0.0, 10.0),
        ]
    }

    #[test]
    fn test_rect_basics() {
        let rect = Rect::from_points(&[DVec2::new(3.0, -1.0), DVec2::new(-2.0, 4.0)]);
        assert_eq!(rect, Rect::new(-2.0, -1.0, 3.0, 4.0));
        assert_relative_eq!(rect.width(), 5.0);
        assert_relative_eq!(rect.height(), 5.0);
        assert!(rect.contains(DVec2::new(3.0, 4.0)));
        assert!(!rect.contains(DVec2::new(3.1, 4.0)));
        assert!(Rect::empty().is_empty());
        assert!(!Rect::from_point(DVec2::ZERO).is_empty());
    }

    #[test]
    fn test_rect_intersects() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!a.intersects(&Rect::new(10.5, 0.0, 20.0, 20.0)));
        assert!(!a.intersects(&Rect::empty()));
    }

    #[test]
    fn test_winding_square() {
        let ring = square();
        assert!(contains_point_winding(&ring, DVec2::new(5.0, 5.0)));
        assert!(!contains_point_winding(&ring, DVec2::new(15.0, 5.0)));
        assert!(!contains_point_winding(&ring, DVec2::new(-0.5, 5.0)));
    }

    #[test]
    fn test_winding_orientation_independent() {
        let mut ring = square();
        ring.reverse();
        assert_eq!(winding_number(&ring, DVec2::new(5.0, 5.0)).abs(), 1);
        assert!(contains_point_winding(&ring, DVec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_winding_self_overlapping_ring() {
        // Ring going twice around the same square: winding number 2, still inside
        let mut ring = square();
        ring.extend(square());
        assert_eq!(winding_number(&ring, DVec2::new(5.0, 5.0)), 2);
        assert!(contains_point_winding(&ring, DVec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_degenerate_ring_contains_nothing() {
        let ring = vec![DVec2::ZERO, DVec2::new(1.0, 1.0)];
        assert!(!contains_point_winding(&ring, DVec2::new(0.5, 0.5)));
    }

    #[test]
    fn test_segmentize_circle() {
        let circle = Geometry::Circle {
            center: DVec2::new(5.0, 5.0),
            radius: 2.0,
        };
        let Geometry::Polygon(ring) = circle.segmentize(DEFAULT_SEGMENT_ANGLE) else {
            panic!("circle should segmentize to a polygon");
        };
        assert_eq!(ring.len(), 45);
        for p in &ring {
            assert_relative_eq!(p.distance(DVec2::new(5.0, 5.0)), 2.0, epsilon = 1e-9);
        }

        let rect = Geometry::Rectangle(Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(rect.segmentize(DEFAULT_SEGMENT_ANGLE), rect);
    }

    #[test]
    fn test_geometry_bbox_and_parts() {
        let multi = Geometry::MultiPolygon(vec![square(), vec![DVec2::new(20.0, 20.0)]]);
        assert_eq!(multi.part_count(), 2);
        assert_eq!(multi.bounding_box(), Rect::new(0.0, 0.0, 20.0, 20.0));
        assert_eq!(multi.first_part(), Some(Geometry::Polygon(square())));
        assert_eq!(multi.geometry_type(), GeometryType::Polygon);

        let circle = Geometry::Circle {
            center: DVec2::ZERO,
            radius: 3.0,
        };
        assert_eq!(circle.bounding_box(), Rect::new(-3.0, -3.0, 3.0, 3.0));
        assert!(circle.is_curved());
    }

    #[test]
    fn test_path_intersects_rect() {
        let ring = square();
        // Rect fully inside the polygon
        assert!(path_intersects_rect(&ring, true, &Rect::new(4.0, 4.0, 6.0, 6.0)));
        // Same rect does not touch the open polyline
        assert!(!path_intersects_rect(&ring, false, &Rect::new(4.0, 4.0, 6.0, 6.0)));
        // Edge crossing without any vertex inside
        assert!(path_intersects_rect(&ring, false, &Rect::new(4.0, -1.0, 6.0, 1.0)));
        assert!(!path_intersects_rect(&ring, true, &Rect::new(11.0, 11.0, 12.0, 12.0)));
    }

    #[test]
    fn test_filter_accepts() {
        assert!(GeometryType::Unknown.accepts(GeometryType::Line));
        assert!(GeometryType::Polygon.accepts(GeometryType::Polygon));
        assert!(!GeometryType::Polygon.accepts(GeometryType::Point));
    }
}
