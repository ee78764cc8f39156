//! Circle shape.

use super::ShapeGeometry;
use crate::transform::NodeTransform;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A circle given by its centre and radius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Centre.
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl Circle {
    pub fn new(x: f64, y: f64, radius: f64) -> Self {
        Self { x, y, radius }
    }

    /// Circle centred at `center` passing through `edge`.
    pub fn from_center_edge(center: Point, edge: Point) -> Self {
        Self::new(center.x, center.y, (edge - center).hypot())
    }

    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl ShapeGeometry for Circle {
    fn origin(&self) -> Point {
        self.center()
    }

    fn bounds(&self, _rotation: f64) -> Rect {
        let r = self.radius.abs();
        Rect::new(self.x - r, self.y - r, self.x + r, self.y + r)
    }

    fn contains(&self, point: Point, _rotation: f64, tolerance: f64) -> bool {
        (point - self.center()).hypot() <= self.radius.abs() + tolerance
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    fn bake(&mut self, rotation: f64, transform: &NodeTransform) -> f64 {
        let center = transform.to_affine() * self.center();
        self.x = center.x;
        self.y = center.y;
        self.radius *= transform.mean_scale();
        rotation
    }
}
