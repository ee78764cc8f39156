//! Polyline strokes: freehand ink, walls and eraser marks.

use super::EntityId;
use super::points::flat;
use crate::geometry::{midpoint, point_to_polyline_dist, points_bounds};
use crate::layers::LayerId;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A polyline with drawing attributes.
///
/// A wall is a stroke constrained to a single segment. Points are absolute
/// unless a non-zero `x`/`y` offset was loaded with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: EntityId,
    #[serde(with = "flat")]
    pub points: Vec<Point>,
    pub color: String,
    pub thickness: f64,
    #[serde(rename = "isWall", default)]
    pub is_wall: bool,
    #[serde(rename = "isEraser", default)]
    pub is_eraser: bool,
    pub layer_id: LayerId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Stroke {
    /// Create a freehand stroke.
    pub fn freehand(id: EntityId, layer_id: LayerId, points: Vec<Point>, color: &str, thickness: f64) -> Self {
        Self {
            id,
            points,
            color: color.to_string(),
            thickness,
            is_wall: false,
            is_eraser: false,
            layer_id,
            material: None,
            x: 0.0,
            y: 0.0,
        }
    }

    /// Create a single-segment wall.
    pub fn wall(id: EntityId, layer_id: LayerId, start: Point, end: Point, color: &str, thickness: f64) -> Self {
        Self {
            is_wall: true,
            ..Self::freehand(id, layer_id, vec![start, end], color, thickness)
        }
    }

    fn offset(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Points in world space (offset applied).
    pub fn absolute_points(&self) -> impl Iterator<Item = Point> + '_ {
        let offset = self.offset();
        self.points.iter().map(move |p| *p + offset)
    }

    /// The wall's segment in world space, `None` for non-walls or malformed walls.
    pub fn wall_segment(&self) -> Option<(Point, Point)> {
        if !self.is_wall {
            return None;
        }
        match self.points.as_slice() {
            [a, b] => Some((*a + self.offset(), *b + self.offset())),
            _ => None,
        }
    }

    /// Whether the stroke carries enough points to be committed.
    pub fn is_valid(&self) -> bool {
        if self.is_wall {
            self.points.len() == 2
        } else {
            self.points.len() >= 2
        }
    }

    pub fn bounds(&self) -> Option<Rect> {
        let pts: Vec<Point> = self.absolute_points().collect();
        points_bounds(&pts)
    }

    /// Whether `point` is within half the thickness (plus `tolerance`) of the polyline.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let pts: Vec<Point> = self.absolute_points().collect();
        point_to_polyline_dist(point, &pts) <= self.thickness / 2.0 + tolerance
    }

    pub fn translate(&mut self, delta: Vec2) {
        for p in &mut self.points {
            *p += delta;
        }
    }

    /// Vertices offered to the snap engine; walls also offer their midpoint.
    pub fn vertices(&self) -> Vec<Point> {
        let mut pts: Vec<Point> = self.absolute_points().collect();
        if let Some((a, b)) = self.wall_segment() {
            pts.push(midpoint(a, b));
        }
        pts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wall() -> Stroke {
        Stroke::wall(EntityId(1), LayerId(1), Point::new(0.0, 0.0), Point::new(100.0, 0.0), "#000000", 4.0)
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(wall()).unwrap();
        assert_eq!(json["points"], serde_json::json!([0.0, 0.0, 100.0, 0.0]));
        assert_eq!(json["isWall"], true);
        assert_eq!(json["isEraser"], false);
        assert!(json.get("material").is_none());

        let loaded: Stroke = serde_json::from_str(
            r##"{"id":2,"points":[1,2,3,4],"color":"#f00","thickness":2,"layer_id":1}"##,
        )
        .unwrap();
        assert!(!loaded.is_wall);
        assert_eq!(loaded.points, vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]);
    }

    #[test]
    fn test_hit_uses_half_thickness() {
        let w = wall();
        assert!(w.hit_test(Point::new(50.0, 2.0), 0.0));
        assert!(!w.hit_test(Point::new(50.0, 2.5), 0.0));
    }

    #[test]
    fn test_offset_applied() {
        let mut w = wall();
        w.x = 10.0;
        w.y = 5.0;
        assert_eq!(w.wall_segment(), Some((Point::new(10.0, 5.0), Point::new(110.0, 5.0))));
        assert_eq!(w.bounds(), Some(Rect::new(10.0, 5.0, 110.0, 5.0)));
    }

    #[test]
    fn test_wall_vertices_include_midpoint() {
        let v = wall().vertices();
        assert_eq!(v.len(), 3);
        assert_eq!(v[2], Point::new(50.0, 0.0));
    }

    #[test]
    fn test_validity() {
        let mut s = Stroke::freehand(EntityId(1), LayerId(1), vec![Point::ZERO], "#000", 1.0);
        assert!(!s.is_valid());
        s.points.push(Point::new(1.0, 1.0));
        assert!(s.is_valid());
        assert!(s.bounds().is_some());
        s.points.clear();
        assert!(s.bounds().is_none());
    }
}
