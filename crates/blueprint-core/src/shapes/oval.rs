//! Oval (ellipse) shape.

use super::ShapeGeometry;
use crate::geometry::rotate_vec;
use crate::transform::NodeTransform;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// An ellipse given by its centre and per-axis radii, rotated about its centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Oval {
    /// Centre.
    pub x: f64,
    pub y: f64,
    pub radius_x: f64,
    pub radius_y: f64,
}

impl Oval {
    pub fn new(x: f64, y: f64, radius_x: f64, radius_y: f64) -> Self {
        Self {
            x,
            y,
            radius_x,
            radius_y,
        }
    }

    /// Oval inscribed in the box spanned by two corners.
    pub fn from_corners(p1: Point, p2: Point) -> Self {
        let rect = Rect::from_points(p1, p2).abs();
        let center = rect.center();
        Self::new(center.x, center.y, rect.width() / 2.0, rect.height() / 2.0)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

impl ShapeGeometry for Oval {
    fn origin(&self) -> Point {
        self.center()
    }

    fn bounds(&self, rotation: f64) -> Rect {
        let (rx, ry) = (self.radius_x.abs(), self.radius_y.abs());
        let (sin, cos) = rotation.sin_cos();
        // Half-extents of a rotated ellipse
        let hw = ((rx * cos).powi(2) + (ry * sin).powi(2)).sqrt();
        let hh = ((rx * sin).powi(2) + (ry * cos).powi(2)).sqrt();
        Rect::new(self.x - hw, self.y - hh, self.x + hw, self.y + hh)
    }

    fn contains(&self, point: Point, rotation: f64, tolerance: f64) -> bool {
        let local = rotate_vec(point - self.center(), -rotation);
        let rx = self.radius_x.abs() + tolerance;
        let ry = self.radius_y.abs() + tolerance;
        if rx < f64::EPSILON || ry < f64::EPSILON {
            return false;
        }
        (local.x / rx).powi(2) + (local.y / ry).powi(2) <= 1.0
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    fn bake(&mut self, rotation: f64, transform: &NodeTransform) -> f64 {
        let center = transform.to_affine() * self.center();
        let scale = transform.abs_scale();
        self.x = center.x;
        self.y = center.y;
        self.radius_x *= scale.x;
        self.radius_y *= scale.y;
        rotation + transform.rotation
    }
}
