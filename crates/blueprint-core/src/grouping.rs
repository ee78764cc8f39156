//! Anchor blocks: grouping entities under one rectangle.
//!
//! An anchor replaces its constituents in the scene with a single `rect`
//! flagged `isAnchor` that remembers the grouped ids in `containedIds`.

use crate::geometry::union_bounds;
use crate::scene::{EntityRef, Scene};
use crate::shapes::{EntityId, Shape};
use kurbo::Rect;
use std::collections::BTreeSet;

/// Fill color of new anchor blocks.
pub const ANCHOR_COLOR: &str = "#d3d3d3";

/// Ids that can be grouped (existing and not already anchors) and their combined bounds.
pub fn anchor_bounds(scene: &Scene, ids: &BTreeSet<EntityId>) -> Option<(BTreeSet<EntityId>, Rect)> {
    let members: Vec<EntityRef<'_>> = ids
        .iter()
        .filter_map(|id| scene.get(*id))
        .filter(|e| !matches!(e, EntityRef::Shape(s) if s.is_anchor))
        .collect();
    let bounds = union_bounds(members.iter().filter_map(EntityRef::bounds))?;
    Some((members.iter().map(EntityRef::id).collect(), bounds))
}

/// Replace the grouped entities with an anchor block on the active layer.
///
/// Returns the anchor's id, or `None` when nothing could be grouped. The
/// caller records history before calling.
pub fn make_anchor(scene: &mut Scene, ids: &BTreeSet<EntityId>) -> Option<EntityId> {
    let (members, bounds) = anchor_bounds(scene, ids)?;
    let id = scene.allocate_id();
    let anchor = Shape::anchor(id, bounds, members.clone(), ANCHOR_COLOR, scene.active_layer());
    scene.remove(&members);
    if !scene.add_shape(anchor) {
        return None;
    }
    log::info!("Created anchor {id} from {} entities", members.len());
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Rectangle, ShapeKind, Stroke};
    use kurbo::Point;

    fn scene_with_rect_and_circle() -> (Scene, EntityId, EntityId) {
        let mut scene = Scene::new();
        let layer = scene.active_layer();
        let r = scene.allocate_id();
        scene.add_shape(Shape::new(r, ShapeKind::Rect(Rectangle::new(10.0, 10.0, 20.0, 10.0)), "#000", layer));
        let c = scene.allocate_id();
        scene.add_shape(Shape::new(c, ShapeKind::Circle(Circle::new(50.0, 50.0, 5.0)), "#000", layer));
        (scene, r, c)
    }

    #[test]
    fn test_anchor_bbox_is_union() {
        let (scene, r, c) = scene_with_rect_and_circle();
        let ids = BTreeSet::from([r, c]);
        let (members, bounds) = anchor_bounds(&scene, &ids).unwrap();
        assert_eq!(members, ids);
        // min over all minX/minY, max over all maxX/maxY
        assert_eq!(bounds.x0, 10.0);
        assert_eq!(bounds.y0, 10.0);
        assert_eq!(bounds.width(), 55.0 - 10.0);
        assert_eq!(bounds.height(), 55.0 - 10.0);
    }

    #[test]
    fn test_make_anchor_replaces_members() {
        let (mut scene, r, c) = scene_with_rect_and_circle();
        let id = make_anchor(&mut scene, &BTreeSet::from([r, c])).unwrap();
        assert_eq!(scene.shapes().len(), 1);
        let anchor = &scene.shapes()[0];
        assert_eq!(anchor.id, id);
        assert!(anchor.is_anchor);
        assert_eq!(anchor.contained_ids, Some(BTreeSet::from([r, c])));
        assert_eq!(anchor.bounds(), Rect::new(10.0, 10.0, 55.0, 55.0));
    }

    #[test]
    fn test_stroke_offset_counts() {
        let mut scene = Scene::new();
        let layer = scene.active_layer();
        let id = scene.allocate_id();
        let mut s = Stroke::freehand(id, layer, vec![Point::ZERO, Point::new(10.0, 10.0)], "#000", 1.0);
        s.x = 100.0;
        scene.add_stroke(s);
        let (_, bounds) = anchor_bounds(&scene, &BTreeSet::from([id])).unwrap();
        assert_eq!(bounds, Rect::new(100.0, 0.0, 110.0, 10.0));
    }

    #[test]
    fn test_anchors_are_not_regrouped() {
        let (mut scene, r, c) = scene_with_rect_and_circle();
        let anchor = make_anchor(&mut scene, &BTreeSet::from([r, c])).unwrap();
        assert!(make_anchor(&mut scene, &BTreeSet::from([anchor])).is_none());
        assert!(make_anchor(&mut scene, &BTreeSet::new()).is_none());
        assert_eq!(scene.shapes().len(), 1);
    }
}
