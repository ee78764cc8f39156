//! Polygon shape (open or closed).

use super::ShapeGeometry;
use super::points::flat;
use crate::geometry::{point_in_polygon, point_to_polyline_dist, points_bounds, rotate_vec};
use crate::transform::NodeTransform;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

fn default_closed() -> bool {
    true
}

/// A polygon whose vertices are stored relative to `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub x: f64,
    pub y: f64,
    #[serde(with = "flat")]
    pub points: Vec<Point>,
    #[serde(default = "default_closed")]
    pub closed: bool,
}

impl Polygon {
    pub fn new(x: f64, y: f64, points: Vec<Point>, closed: bool) -> Self {
        Self {
            x,
            y,
            points,
            closed,
        }
    }

    /// Closed polygon from world-space vertices, anchored at the first one.
    pub fn from_absolute(vertices: &[Point]) -> Self {
        let origin = vertices.first().copied().unwrap_or(Point::ZERO);
        Self::new(
            origin.x,
            origin.y,
            vertices.iter().map(|p| (*p - origin).to_point()).collect(),
            true,
        )
    }

    /// World-space vertices.
    pub fn absolute_points(&self, rotation: f64) -> Vec<Point> {
        let origin = Point::new(self.x, self.y);
        self.points
            .iter()
            .map(|p| origin + rotate_vec(p.to_vec2(), rotation))
            .collect()
    }
}

impl ShapeGeometry for Polygon {
    fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn bounds(&self, rotation: f64) -> Rect {
        points_bounds(&self.absolute_points(rotation))
            .unwrap_or_else(|| Rect::from_points(self.origin(), self.origin()))
    }

    fn contains(&self, point: Point, rotation: f64, tolerance: f64) -> bool {
        let mut pts = self.absolute_points(rotation);
        if self.closed && point_in_polygon(point, &pts) {
            return true;
        }
        if self.closed {
            if let Some(first) = pts.first().copied() {
                pts.push(first);
            }
        }
        point_to_polyline_dist(point, &pts) <= tolerance
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    fn bake(&mut self, rotation: f64, transform: &NodeTransform) -> f64 {
        let affine = transform.to_affine();
        let origin = affine * self.origin();
        self.points = self
            .absolute_points(rotation)
            .into_iter()
            .map(|p| (affine * p - origin).to_point())
            .collect();
        self.x = origin.x;
        self.y = origin.y;
        0.0
    }

    fn vertices(&self, rotation: f64) -> Vec<Point> {
        self.absolute_points(rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        Polygon::from_absolute(&[
            Point::new(10.0, 10.0),
            Point::new(20.0, 10.0),
            Point::new(20.0, 20.0),
            Point::new(10.0, 20.0),
        ])
    }

    #[test]
    fn test_from_absolute_is_local() {
        let p = square();
        assert_eq!(p.origin(), Point::new(10.0, 10.0));
        assert_eq!(p.points[2], Point::new(10.0, 10.0));
        assert_eq!(p.bounds(0.0), Rect::new(10.0, 10.0, 20.0, 20.0));
    }

    #[test]
    fn test_open_polygon_hits_only_near_edges() {
        let mut p = square();
        assert!(p.contains(Point::new(15.0, 15.0), 0.0, 0.0));
        p.closed = false;
        assert!(!p.contains(Point::new(15.0, 15.0), 0.0, 1.0));
        assert!(p.contains(Point::new(15.0, 10.5), 0.0, 1.0));
    }

    #[test]
    fn test_missing_closed_defaults_true() {
        let p: Polygon = serde_json::from_str(r#"{"x":0,"y":0,"points":[0,0,1,0,1,1]}"#).unwrap();
        assert!(p.closed);
    }
}
