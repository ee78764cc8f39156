//! Drawable entities: polyline strokes and parametric shapes.

mod circle;
mod oval;
pub mod points;
mod polygon;
mod rectangle;
mod stroke;
mod triangle;

pub use circle::Circle;
pub use oval::Oval;
pub use polygon::Polygon;
pub use rectangle::Rectangle;
pub use stroke::Stroke;
pub use triangle::Triangle;

use crate::layers::LayerId;
use crate::transform::NodeTransform;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifier shared by strokes and shapes; unique across both collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fill color used when nothing else is known.
pub const DEFAULT_COLOR: &str = "#ffffff";

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

/// Geometry behaviour every shape variant provides.
///
/// `rotation` is the owning [`Shape`]'s rotation in radians; variants decide
/// which pivot it applies to.
pub trait ShapeGeometry {
    /// Reference position (`x`, `y`) of the variant.
    fn origin(&self) -> Point;

    /// Axis-aligned bounding box in world coordinates.
    fn bounds(&self, rotation: f64) -> Rect;

    /// Whether `point` lies inside (or within `tolerance` of) the shape.
    fn contains(&self, point: Point, rotation: f64, tolerance: f64) -> bool;

    /// Move the shape by `delta`.
    fn translate(&mut self, delta: Vec2);

    /// Fold `transform` into the stored parameters and return the new rotation.
    fn bake(&mut self, rotation: f64, transform: &NodeTransform) -> f64;

    /// Vertices used for snapping, empty when bounds suffice.
    fn vertices(&self, _rotation: f64) -> Vec<Point> {
        Vec::new()
    }
}

/// Parametric shape variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeKind {
    Rect(Rectangle),
    Circle(Circle),
    Oval(Oval),
    Triangle(Triangle),
    Polygon(Polygon),
}

impl ShapeKind {
    fn geometry(&self) -> &dyn ShapeGeometry {
        match self {
            ShapeKind::Rect(s) => s,
            ShapeKind::Circle(s) => s,
            ShapeKind::Oval(s) => s,
            ShapeKind::Triangle(s) => s,
            ShapeKind::Polygon(s) => s,
        }
    }

    fn geometry_mut(&mut self) -> &mut dyn ShapeGeometry {
        match self {
            ShapeKind::Rect(s) => s,
            ShapeKind::Circle(s) => s,
            ShapeKind::Oval(s) => s,
            ShapeKind::Triangle(s) => s,
            ShapeKind::Polygon(s) => s,
        }
    }

    /// Wire name of the variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            ShapeKind::Rect(_) => "rect",
            ShapeKind::Circle(_) => "circle",
            ShapeKind::Oval(_) => "oval",
            ShapeKind::Triangle(_) => "triangle",
            ShapeKind::Polygon(_) => "polygon",
        }
    }

    pub fn origin(&self) -> Point {
        self.geometry().origin()
    }

    pub fn bounds(&self, rotation: f64) -> Rect {
        self.geometry().bounds(rotation)
    }

    pub fn contains(&self, point: Point, rotation: f64, tolerance: f64) -> bool {
        self.geometry().contains(point, rotation, tolerance)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.geometry_mut().translate(delta);
    }

    pub fn bake(&mut self, rotation: f64, transform: &NodeTransform) -> f64 {
        self.geometry_mut().bake(rotation, transform)
    }

    pub fn vertices(&self, rotation: f64) -> Vec<Point> {
        self.geometry().vertices(rotation)
    }

    /// Absolute vertices of point-based variants (triangle, polygon).
    pub fn absolute_points(&self, rotation: f64) -> Vec<Point> {
        match self {
            ShapeKind::Triangle(t) => t.absolute_points(rotation).to_vec(),
            ShapeKind::Polygon(p) => p.absolute_points(rotation),
            _ => Vec::new(),
        }
    }

    /// Snap the reference position to a grid.
    pub fn snap_origin_to_grid(&mut self, grid_size: f64) {
        let origin = self.origin();
        let snapped = crate::snap::snap_to_grid(origin, grid_size).point;
        self.translate(snapped - origin);
    }
}

/// A parametric shape with its common attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: EntityId,
    #[serde(flatten)]
    pub kind: ShapeKind,
    #[serde(default = "default_color")]
    pub color: String,
    /// Rotation in radians.
    #[serde(default)]
    pub rotation: f64,
    pub layer_id: LayerId,
    #[serde(rename = "isAnchor", default)]
    pub is_anchor: bool,
    /// Ids grouped by an anchor block (present only on anchors).
    #[serde(rename = "containedIds", default, skip_serializing_if = "Option::is_none")]
    pub contained_ids: Option<BTreeSet<EntityId>>,
}

impl Shape {
    pub fn new(id: EntityId, kind: ShapeKind, color: impl Into<String>, layer_id: LayerId) -> Self {
        Self {
            id,
            kind,
            color: color.into(),
            rotation: 0.0,
            layer_id,
            is_anchor: false,
            contained_ids: None,
        }
    }

    /// Anchor block covering `bounds` and remembering the grouped ids.
    pub fn anchor(id: EntityId, bounds: Rect, contained: BTreeSet<EntityId>, color: impl Into<String>, layer_id: LayerId) -> Self {
        Self {
            id,
            kind: ShapeKind::Rect(Rectangle::from_rect(bounds)),
            color: color.into(),
            rotation: 0.0,
            layer_id,
            is_anchor: true,
            contained_ids: Some(contained),
        }
    }

    pub fn bounds(&self) -> Rect {
        self.kind.bounds(self.rotation)
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.kind.contains(point, self.rotation, tolerance)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.kind.translate(delta);
    }

    pub fn vertices(&self) -> Vec<Point> {
        self.kind.vertices(self.rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_json_shape() {
        let shape = Shape::new(
            EntityId(7),
            ShapeKind::Oval(Oval::new(1.0, 2.0, 3.0, 4.0)),
            "#ff0000",
            LayerId(1),
        );
        let value = serde_json::to_value(&shape).unwrap();
        assert_eq!(value["type"], "oval");
        assert_eq!(value["radiusX"], 3.0);
        assert_eq!(value["layer_id"], 1);
        assert_eq!(value["isAnchor"], false);
        assert!(value.get("containedIds").is_none());

        let back: Shape = serde_json::from_value(value).unwrap();
        assert_eq!(back, shape);
    }

    #[test]
    fn test_shape_from_integer_json() {
        let shape: Shape = serde_json::from_str(
            r#"{"id":3,"type":"rect","x":10,"y":10,"width":20,"height":10,"layer_id":1}"#,
        )
        .unwrap();
        assert_eq!(shape.color, DEFAULT_COLOR);
        assert_eq!(shape.bounds(), Rect::new(10.0, 10.0, 30.0, 20.0));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result: Result<Shape, _> =
            serde_json::from_str(r#"{"id":3,"type":"hexagon","x":0,"y":0,"layer_id":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_anchor_constructor() {
        let ids: BTreeSet<_> = [EntityId(1), EntityId(2)].into_iter().collect();
        let anchor = Shape::anchor(EntityId(9), Rect::new(0.0, 0.0, 5.0, 6.0), ids.clone(), "#000", LayerId(1));
        assert!(anchor.is_anchor);
        assert_eq!(anchor.contained_ids, Some(ids));
        assert_eq!(anchor.bounds(), Rect::new(0.0, 0.0, 5.0, 6.0));
    }

    #[test]
    fn test_snap_origin_to_grid() {
        let mut kind = ShapeKind::Circle(Circle::new(23.0, 47.0, 5.0));
        kind.snap_origin_to_grid(20.0);
        assert_eq!(kind.origin(), Point::new(20.0, 40.0));
    }
}
