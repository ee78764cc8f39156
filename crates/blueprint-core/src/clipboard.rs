//! Copy, paste and duplication of strokes and shapes.

use crate::scene::{EntityRef, Scene};
use crate::shapes::{EntityId, Shape, Stroke};
use kurbo::Vec2;
use std::collections::BTreeSet;

/// Offset applied to pasted and duplicated entities.
pub const PASTE_OFFSET: f64 = 10.0;

/// Deep copies of entities, ids preserved as copied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clipboard {
    pub strokes: Vec<Stroke>,
    pub shapes: Vec<Shape>,
}

impl Clipboard {
    /// Capture the listed entities.
    pub fn from_ids(scene: &Scene, ids: &BTreeSet<EntityId>) -> Self {
        let mut clipboard = Self::default();
        for id in ids {
            match scene.get(*id) {
                Some(EntityRef::Stroke(s)) => clipboard.strokes.push(s.clone()),
                Some(EntityRef::Shape(s)) => clipboard.shapes.push(s.clone()),
                None => {}
            }
        }
        clipboard
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.shapes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.strokes.len() + self.shapes.len()
    }

    /// Insert offset copies with fresh ids on the active layer.
    ///
    /// Returns the new ids in insertion order.
    pub fn paste_into(&self, scene: &mut Scene) -> Vec<EntityId> {
        let offset = Vec2::new(PASTE_OFFSET, PASTE_OFFSET);
        let layer = scene.active_layer();
        let mut pasted = Vec::with_capacity(self.len());

        for stroke in &self.strokes {
            let mut copy = stroke.clone();
            copy.id = scene.allocate_id();
            copy.layer_id = layer;
            copy.translate(offset);
            pasted.push(copy.id);
            scene.add_stroke(copy);
        }
        for shape in &self.shapes {
            let mut copy = shape.clone();
            copy.id = scene.allocate_id();
            copy.layer_id = layer;
            copy.translate(offset);
            pasted.push(copy.id);
            scene.add_shape(copy);
        }
        log::debug!("Pasted {} entities", pasted.len());
        pasted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Rectangle, ShapeKind, Triangle};
    use kurbo::Point;

    #[test]
    fn test_copy_preserves_ids() {
        let mut scene = Scene::new();
        let layer = scene.active_layer();
        let id = scene.allocate_id();
        scene.add_shape(Shape::new(id, ShapeKind::Rect(Rectangle::new(0.0, 0.0, 5.0, 5.0)), "#000", layer));
        let clipboard = Clipboard::from_ids(&scene, &BTreeSet::from([id, EntityId(999)]));
        assert_eq!(clipboard.len(), 1);
        assert_eq!(clipboard.shapes[0].id, id);
    }

    #[test]
    fn test_paste_offsets_and_reassigns() {
        let mut scene = Scene::new();
        let first = scene.active_layer();
        let s = scene.allocate_id();
        scene.add_stroke(Stroke::freehand(s, first, vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)], "#000", 1.0));
        let t = scene.allocate_id();
        let tri = Triangle::new(20.0, 20.0, [Point::ZERO, Point::new(4.0, 0.0), Point::new(0.0, 4.0)]);
        scene.add_shape(Shape::new(t, ShapeKind::Triangle(tri), "#000", first));

        let clipboard = Clipboard::from_ids(&scene, &BTreeSet::from([s, t]));
        let second = scene.add_layer(None);
        scene.set_active_layer(second);
        let pasted = clipboard.paste_into(&mut scene);

        assert_eq!(pasted.len(), 2);
        assert!(!pasted.contains(&s) && !pasted.contains(&t));
        let Some(EntityRef::Stroke(stroke)) = scene.get(pasted[0]) else { panic!("expected stroke") };
        assert_eq!(stroke.points, vec![Point::new(10.0, 10.0), Point::new(15.0, 15.0)]);
        assert_eq!(stroke.layer_id, second);
        let Some(EntityRef::Shape(shape)) = scene.get(pasted[1]) else { panic!("expected shape") };
        let ShapeKind::Triangle(tri) = &shape.kind else { panic!("expected triangle") };
        // Origin moves, local points stay
        assert_eq!((tri.x, tri.y), (30.0, 30.0));
        assert_eq!(tri.points[1], Point::new(4.0, 0.0));
        assert!(scene.invariant_violations().is_empty());
    }

    #[test]
    fn test_paste_empty_is_noop() {
        let mut scene = Scene::new();
        assert!(Clipboard::default().paste_into(&mut scene).is_empty());
        assert!(scene.is_empty());
    }
}
