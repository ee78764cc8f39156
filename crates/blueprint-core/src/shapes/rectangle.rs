//! Rectangle shape.

use super::ShapeGeometry;
use crate::geometry::{points_bounds, rotate_vec};
use crate::transform::NodeTransform;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle, rotated about its top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    /// Top-left corner.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rectangle {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Create a rectangle from two corner points.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        Self::from_rect(Rect::from_points(p1, p2))
    }

    pub fn from_rect(rect: Rect) -> Self {
        let rect = rect.abs();
        Self::new(rect.x0, rect.y0, rect.width(), rect.height())
    }

    /// Unrotated rectangle.
    pub fn as_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height).abs()
    }

    /// The four corners in world space.
    pub fn corners(&self, rotation: f64) -> [Point; 4] {
        let origin = Point::new(self.x, self.y);
        [
            Vec2::ZERO,
            Vec2::new(self.width, 0.0),
            Vec2::new(self.width, self.height),
            Vec2::new(0.0, self.height),
        ]
        .map(|v| origin + rotate_vec(v, rotation))
    }
}

impl ShapeGeometry for Rectangle {
    fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    fn bounds(&self, rotation: f64) -> Rect {
        if rotation == 0.0 {
            return self.as_rect();
        }
        points_bounds(&self.corners(rotation)).unwrap_or(Rect::ZERO)
    }

    fn contains(&self, point: Point, rotation: f64, tolerance: f64) -> bool {
        // Bring the point into the unrotated frame
        let local = self.origin() + rotate_vec(point - self.origin(), -rotation);
        let rect = self.as_rect().inflate(tolerance, tolerance);
        local.x >= rect.x0 && local.x <= rect.x1 && local.y >= rect.y0 && local.y <= rect.y1
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    fn bake(&mut self, rotation: f64, transform: &NodeTransform) -> f64 {
        let top_left = transform.to_affine() * self.origin();
        let scale = transform.abs_scale();
        self.x = top_left.x;
        self.y = top_left.y;
        self.width *= scale.x;
        self.height *= scale.y;
        rotation + transform.rotation
    }
}
