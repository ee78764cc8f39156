//! Triangle shape.

use super::ShapeGeometry;
use super::points::triple;
use crate::geometry::{point_in_polygon, point_to_polyline_dist, points_bounds, rotate_vec};
use crate::transform::NodeTransform;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A triangle whose three vertices are stored relative to `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub x: f64,
    pub y: f64,
    #[serde(with = "triple")]
    pub points: [Point; 3],
}

impl Triangle {
    pub fn new(x: f64, y: f64, points: [Point; 3]) -> Self {
        Self { x, y, points }
    }

    /// Isosceles triangle inscribed in the box spanned by two corners,
    /// apex at the top centre.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        let rect = Rect::from_points(p1, p2).abs();
        let (w, h) = (rect.width(), rect.height());
        Self::new(
            rect.x0,
            rect.y0,
            [Point::new(w / 2.0, 0.0), Point::new(w, h), Point::new(0.0, h)],
        )
    }

    /// World-space vertices.
    pub fn absolute_points(&self, rotation: f64) -> [Point; 3] {
        let origin = Point::new(self.x, self.y);
        self.points.map(|p| origin + rotate_vec(p.to_vec2(), rotation))
    }
}

impl ShapeGeometry for Triangle {
    fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn bounds(&self, rotation: f64) -> Rect {
        points_bounds(&self.absolute_points(rotation)).unwrap_or(Rect::ZERO)
    }

    fn contains(&self, point: Point, rotation: f64, tolerance: f64) -> bool {
        let pts = self.absolute_points(rotation);
        if point_in_polygon(point, &pts) {
            return true;
        }
        let closed = [pts[0], pts[1], pts[2], pts[0]];
        point_to_polyline_dist(point, &closed) <= tolerance
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    fn bake(&mut self, rotation: f64, transform: &NodeTransform) -> f64 {
        let affine = transform.to_affine();
        let origin = affine * self.origin();
        let abs = self.absolute_points(rotation).map(|p| affine * p);
        self.x = origin.x;
        self.y = origin.y;
        self.points = abs.map(|p| (p - origin).to_point());
        0.0
    }

    fn vertices(&self, rotation: f64) -> Vec<Point> {
        self.absolute_points(rotation).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        let t: Triangle =
            serde_json::from_str(r#"{"x":10,"y":10,"points":[0,0,10,0,5,10]}"#).unwrap();
        assert_eq!(t.absolute_points(0.0)[2], Point::new(15.0, 20.0));
        assert!(serde_json::from_str::<Triangle>(r#"{"x":0,"y":0,"points":[0,0,1,1]}"#).is_err());
    }

    #[test]
    fn test_contains_and_bounds() {
        let t = Triangle::from_corners(Point::ZERO, Point::new(10.0, 10.0));
        assert!(t.contains(Point::new(5.0, 8.0), 0.0, 0.0));
        assert!(!t.contains(Point::new(0.5, 1.0), 0.0, 0.0));
        assert_eq!(t.bounds(0.0), Rect::new(0.0, 0.0, 10.0, 10.0));
    }
}
