//! Selection set and transform handle system.

use crate::shapes::EntityId;
use crate::transform::{MIN_SCALE, NodeTransform};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Handle hit tolerance in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 12.0;

/// Distance from the selection's top edge to the rotation handle (screen pixels).
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;

/// What is currently selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    None,
    Single(EntityId),
    Multi(BTreeSet<EntityId>),
}

impl Selection {
    /// Build a selection from any number of ids.
    pub fn from_ids<I: IntoIterator<Item = EntityId>>(ids: I) -> Self {
        let ids: BTreeSet<EntityId> = ids.into_iter().collect();
        match ids.len() {
            0 => Selection::None,
            1 => ids.into_iter().next().map_or(Selection::None, Selection::Single),
            _ => Selection::Multi(ids),
        }
    }

    pub fn ids(&self) -> BTreeSet<EntityId> {
        match self {
            Selection::None => BTreeSet::new(),
            Selection::Single(id) => BTreeSet::from([*id]),
            Selection::Multi(ids) => ids.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Selection::None => 0,
            Selection::Single(_) => 1,
            Selection::Multi(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: EntityId) -> bool {
        match self {
            Selection::None => false,
            Selection::Single(s) => *s == id,
            Selection::Multi(ids) => ids.contains(&id),
        }
    }

    /// Add `id` if absent, remove it if present.
    pub fn toggle(&mut self, id: EntityId) {
        let mut ids = self.ids();
        if !ids.remove(&id) {
            ids.insert(id);
        }
        *self = Selection::from_ids(ids);
    }

    /// Drop ids that no longer exist.
    pub fn retain(&mut self, mut keep: impl FnMut(EntityId) -> bool) {
        let ids: Vec<EntityId> = self.ids().into_iter().filter(|id| keep(*id)).collect();
        *self = Selection::from_ids(ids);
    }
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Position of this corner on `bounds`.
    pub fn point(self, bounds: Rect) -> Point {
        match self {
            Corner::TopLeft => Point::new(bounds.x0, bounds.y0),
            Corner::TopRight => Point::new(bounds.x1, bounds.y0),
            Corner::BottomLeft => Point::new(bounds.x0, bounds.y1),
            Corner::BottomRight => Point::new(bounds.x1, bounds.y1),
        }
    }

    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }
}

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Corner handle, scales about the opposite corner.
    Corner(Corner),
    /// Rotation handle above the top-centre.
    Rotate,
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Position in world coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// `tolerance` should be adjusted for camera zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Corner and rotation handles for the selection bounds.
///
/// `zoom` converts the screen-space rotate offset into world units.
pub fn handles_for_bounds(bounds: Rect, zoom: f64) -> Vec<Handle> {
    let offset = ROTATE_HANDLE_OFFSET / zoom.max(f64::EPSILON);
    let mut handles: Vec<Handle> = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ]
    .into_iter()
    .map(|c| Handle::new(c.point(bounds), HandleKind::Corner(c)))
    .collect();
    handles.push(Handle::new(
        Point::new(bounds.center().x, bounds.y0 - offset),
        HandleKind::Rotate,
    ));
    handles
}

/// Find which handle (if any) is hit at the given point.
pub fn hit_test_handles(bounds: Rect, zoom: f64, point: Point) -> Option<HandleKind> {
    let tolerance = HANDLE_HIT_TOLERANCE / zoom.max(f64::EPSILON);
    handles_for_bounds(bounds, zoom)
        .into_iter()
        .find(|h| h.hit_test(point, tolerance))
        .map(|h| h.kind)
}

/// Transform for dragging `corner` of `bounds` from its original spot to `current`.
///
/// Scale factors are clamped to [`MIN_SCALE`]; dragging past the pivot does not flip.
pub fn corner_scale(bounds: Rect, corner: Corner, current: Point) -> NodeTransform {
    let pivot = corner.opposite().point(bounds);
    let original = corner.point(bounds);
    let axis_scale = |orig: f64, now: f64, pivot: f64| {
        let span = orig - pivot;
        if span.abs() < f64::EPSILON {
            1.0
        } else {
            ((now - pivot) / span).max(MIN_SCALE)
        }
    };
    NodeTransform::scale_about(
        pivot,
        axis_scale(original.x, current.x, pivot.x),
        axis_scale(original.y, current.y, pivot.y),
    )
}

/// Transform for swinging the rotation handle from `start` to `current`
/// around the centre of `bounds`.
pub fn center_rotation(bounds: Rect, start: Point, current: Point) -> NodeTransform {
    let center = bounds.center();
    let from = start - center;
    let to = current - center;
    let angle = to.y.atan2(to.x) - from.y.atan2(from.x);
    NodeTransform::rotate_about(center, angle)
}
