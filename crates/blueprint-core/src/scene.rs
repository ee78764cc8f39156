//! Scene store: strokes, eraser marks, shapes and layers.

use crate::geometry::{rect_contains_inclusive, rects_overlap, union_bounds};
use crate::layers::{Layer, LayerId};
use crate::shapes::{EntityId, Shape, Stroke};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Borrowed view of a stroke or shape.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Stroke(&'a Stroke),
    Shape(&'a Shape),
}

impl EntityRef<'_> {
    pub fn id(&self) -> EntityId {
        match self {
            EntityRef::Stroke(s) => s.id,
            EntityRef::Shape(s) => s.id,
        }
    }

    pub fn layer_id(&self) -> LayerId {
        match self {
            EntityRef::Stroke(s) => s.layer_id,
            EntityRef::Shape(s) => s.layer_id,
        }
    }

    pub fn bounds(&self) -> Option<Rect> {
        match self {
            EntityRef::Stroke(s) => s.bounds(),
            EntityRef::Shape(s) => Some(s.bounds()),
        }
    }

    pub fn color(&self) -> &str {
        match self {
            EntityRef::Stroke(s) => &s.color,
            EntityRef::Shape(s) => &s.color,
        }
    }
}

/// The persistent part of the scene; what undo snapshots capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneState {
    pub project_name: String,
    pub strokes: Vec<Stroke>,
    pub erasers: Vec<Stroke>,
    pub shapes: Vec<Shape>,
    pub layers: Vec<Layer>,
    pub active_layer_id: LayerId,
}

impl Default for SceneState {
    fn default() -> Self {
        let layer = Layer::default();
        Self {
            project_name: "Untitled".to_string(),
            strokes: Vec::new(),
            erasers: Vec::new(),
            shapes: Vec::new(),
            active_layer_id: layer.id,
            layers: vec![layer],
        }
    }
}

/// The scene with its id allocator.
///
/// Every mutation keeps layer references valid and ids unique across
/// strokes, eraser marks and shapes.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Project identifier.
    pub id: String,
    state: SceneState,
    next_id: u64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            state: SceneState::default(),
            next_id: 1,
        }
    }

    /// Build a scene from a loaded state, repairing what it must.
    pub fn from_state(state: SceneState) -> Self {
        let mut scene = Self::new();
        scene.restore(state);
        scene.repair();
        scene
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    /// Deep copy of the persistent state.
    pub fn snapshot(&self) -> SceneState {
        self.state.clone()
    }

    /// Replace the persistent state. Ids allocated so far are never reused.
    pub fn restore(&mut self, state: SceneState) {
        self.state = state;
        self.reseed_ids();
    }

    fn reseed_ids(&mut self) {
        let max = self.all_ids().last().map_or(0, |id| id.0);
        self.next_id = self.next_id.max(max + 1);
    }

    /// Allocate a fresh entity id.
    pub fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn project_name(&self) -> &str {
        &self.state.project_name
    }

    pub fn set_project_name(&mut self, name: impl Into<String>) {
        self.state.project_name = name.into();
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.state.strokes
    }

    pub fn erasers(&self) -> &[Stroke] {
        &self.state.erasers
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.state.shapes
    }

    pub fn layers(&self) -> &[Layer] {
        &self.state.layers
    }

    pub fn active_layer(&self) -> LayerId {
        self.state.active_layer_id
    }

    pub fn has_layer(&self, id: LayerId) -> bool {
        self.state.layers.iter().any(|l| l.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.state.strokes.is_empty() && self.state.shapes.is_empty()
    }

    /// Every id in use, sorted.
    pub fn all_ids(&self) -> BTreeSet<EntityId> {
        self.state
            .strokes
            .iter()
            .chain(&self.state.erasers)
            .map(|s| s.id)
            .chain(self.state.shapes.iter().map(|s| s.id))
            .collect()
    }

    pub fn contains_id(&self, id: EntityId) -> bool {
        self.get(id).is_some() || self.state.erasers.iter().any(|s| s.id == id)
    }

    // --- Entities ---

    /// Whether an entity with this id may be added on `layer_id`.
    pub fn can_insert(&self, id: EntityId, layer_id: LayerId) -> bool {
        if !self.has_layer(layer_id) {
            log::warn!("Rejected entity {id}: layer {layer_id} does not exist");
            return false;
        }
        if self.contains_id(id) {
            log::warn!("Rejected entity {id}: id already in use");
            return false;
        }
        true
    }

    pub fn add_stroke(&mut self, stroke: Stroke) -> bool {
        if !self.can_insert(stroke.id, stroke.layer_id) {
            return false;
        }
        self.next_id = self.next_id.max(stroke.id.0 + 1);
        self.state.strokes.push(stroke);
        true
    }

    pub fn add_eraser(&mut self, stroke: Stroke) -> bool {
        if !self.can_insert(stroke.id, stroke.layer_id) {
            return false;
        }
        self.next_id = self.next_id.max(stroke.id.0 + 1);
        self.state.erasers.push(stroke);
        true
    }

    pub fn add_shape(&mut self, shape: Shape) -> bool {
        if !self.can_insert(shape.id, shape.layer_id) {
            return false;
        }
        self.next_id = self.next_id.max(shape.id.0 + 1);
        self.state.shapes.push(shape);
        true
    }

    pub fn get(&self, id: EntityId) -> Option<EntityRef<'_>> {
        if let Some(s) = self.state.strokes.iter().find(|s| s.id == id) {
            return Some(EntityRef::Stroke(s));
        }
        self.state
            .shapes
            .iter()
            .find(|s| s.id == id)
            .map(EntityRef::Shape)
    }

    pub fn stroke_mut(&mut self, id: EntityId) -> Option<&mut Stroke> {
        self.state.strokes.iter_mut().find(|s| s.id == id)
    }

    pub fn shape_mut(&mut self, id: EntityId) -> Option<&mut Shape> {
        self.state.shapes.iter_mut().find(|s| s.id == id)
    }

    /// Remove every stroke, eraser mark and shape whose id is listed.
    pub fn remove(&mut self, ids: &BTreeSet<EntityId>) -> usize {
        let before = self.entity_count();
        self.state.strokes.retain(|s| !ids.contains(&s.id));
        self.state.erasers.retain(|s| !ids.contains(&s.id));
        self.state.shapes.retain(|s| !ids.contains(&s.id));
        before - self.entity_count()
    }

    fn entity_count(&self) -> usize {
        self.state.strokes.len() + self.state.erasers.len() + self.state.shapes.len()
    }

    /// Move the listed entities.
    pub fn translate(&mut self, ids: &BTreeSet<EntityId>, delta: Vec2) {
        for stroke in self.state.strokes.iter_mut().filter(|s| ids.contains(&s.id)) {
            stroke.translate(delta);
        }
        for shape in self.state.shapes.iter_mut().filter(|s| ids.contains(&s.id)) {
            shape.translate(delta);
        }
    }

    // --- Layer-scoped queries ---

    pub fn strokes_on(&self, layer: LayerId) -> impl Iterator<Item = &Stroke> {
        self.state.strokes.iter().filter(move |s| s.layer_id == layer)
    }

    pub fn shapes_on(&self, layer: LayerId) -> impl Iterator<Item = &Shape> {
        self.state.shapes.iter().filter(move |s| s.layer_id == layer)
    }

    /// Ids of every stroke and shape on a layer.
    pub fn ids_on_layer(&self, layer: LayerId) -> BTreeSet<EntityId> {
        self.strokes_on(layer)
            .map(|s| s.id)
            .chain(self.shapes_on(layer).map(|s| s.id))
            .collect()
    }

    /// Segments of every wall on a layer.
    pub fn wall_segments(&self, layer: LayerId) -> Vec<(Point, Point)> {
        self.strokes_on(layer)
            .filter_map(Stroke::wall_segment)
            .collect()
    }

    /// Topmost entity under `point`, on `layer` or on any layer when `None`.
    /// Shapes render above strokes.
    pub fn hit_test(&self, point: Point, tolerance: f64, layer: Option<LayerId>) -> Option<EntityId> {
        let on_layer = |id: LayerId| layer.is_none_or(|l| l == id);
        self.state
            .shapes
            .iter()
            .rev()
            .filter(|s| on_layer(s.layer_id))
            .find(|s| s.hit_test(point, tolerance))
            .map(|s| s.id)
            .or_else(|| {
                self.state
                    .strokes
                    .iter()
                    .rev()
                    .filter(|s| on_layer(s.layer_id))
                    .find(|s| s.hit_test(point, tolerance))
                    .map(|s| s.id)
            })
    }

    /// Every entity on `layer` hit by `point` (eraser semantics, no tolerance).
    pub fn hits_at(&self, point: Point, layer: LayerId) -> BTreeSet<EntityId> {
        self.strokes_on(layer)
            .filter(|s| s.hit_test(point, 0.0))
            .map(|s| s.id)
            .chain(
                self.shapes_on(layer)
                    .filter(|s| s.hit_test(point, 0.0))
                    .map(|s| s.id),
            )
            .collect()
    }

    /// Box selection: strokes with a vertex inside, shapes whose bounds overlap.
    /// `None` searches every layer.
    pub fn entities_in_rect(&self, rect: Rect, layer: Option<LayerId>) -> Vec<EntityId> {
        let on_layer = move |id: LayerId| layer.is_none_or(|l| l == id);
        let strokes = self
            .state
            .strokes
            .iter()
            .filter(|s| on_layer(s.layer_id))
            .filter(|s| s.absolute_points().any(|p| rect_contains_inclusive(rect, p)))
            .map(|s| s.id);
        let shapes = self
            .state
            .shapes
            .iter()
            .filter(|s| on_layer(s.layer_id))
            .filter(|s| rects_overlap(rect, s.bounds()))
            .map(|s| s.id);
        strokes.chain(shapes).collect()
    }

    /// Combined bounds of the listed entities.
    pub fn bounds_of(&self, ids: &BTreeSet<EntityId>) -> Option<Rect> {
        union_bounds(ids.iter().filter_map(|id| self.get(*id)?.bounds()))
    }

    // --- Layers ---

    /// Append a layer and return its id.
    pub fn add_layer(&mut self, name: Option<&str>) -> LayerId {
        let id = LayerId(self.state.layers.iter().map(|l| l.id.0).max().unwrap_or(0) + 1);
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| format!("Layer {}", self.state.layers.len() + 1));
        self.state.layers.push(Layer::new(id, name));
        log::debug!("Added layer {id}");
        id
    }

    pub fn rename_layer(&mut self, id: LayerId, name: impl Into<String>) -> bool {
        match self.state.layers.iter_mut().find(|l| l.id == id) {
            Some(layer) => {
                layer.name = name.into();
                true
            }
            None => false,
        }
    }

    /// Delete a layer and everything on it. The last layer cannot be deleted.
    pub fn delete_layer(&mut self, id: LayerId) -> bool {
        if self.state.layers.len() <= 1 {
            log::debug!("Refusing to delete the last layer");
            return false;
        }
        let Some(index) = self.state.layers.iter().position(|l| l.id == id) else {
            return false;
        };
        self.state.layers.remove(index);
        self.state.strokes.retain(|s| s.layer_id != id);
        self.state.erasers.retain(|s| s.layer_id != id);
        self.state.shapes.retain(|s| s.layer_id != id);

        if self.state.active_layer_id == id {
            let fallback = index.min(self.state.layers.len() - 1);
            self.state.active_layer_id = self.state.layers[fallback].id;
        }
        log::info!("Deleted layer {id}");
        true
    }

    pub fn set_active_layer(&mut self, id: LayerId) -> bool {
        if !self.has_layer(id) {
            return false;
        }
        self.state.active_layer_id = id;
        true
    }

    // --- Invariants ---

    /// Restore layer and id invariants after loading foreign data.
    pub fn repair(&mut self) {
        if self.state.layers.is_empty() {
            self.state.layers.push(Layer::default());
        }
        let fallback = self.state.layers[0].id;
        if !self.has_layer(self.state.active_layer_id) {
            self.state.active_layer_id = fallback;
        }

        let layer_ids: BTreeSet<LayerId> = self.state.layers.iter().map(|l| l.id).collect();
        let mut seen = BTreeSet::new();
        let state = &mut self.state;
        let mut next_id = self.next_id.max(
            state
                .strokes
                .iter()
                .chain(&state.erasers)
                .map(|s| s.id.0)
                .chain(state.shapes.iter().map(|s| s.id.0))
                .max()
                .unwrap_or(0)
                + 1,
        );

        let mut fix = |id: &mut EntityId, layer: &mut LayerId| {
            if !layer_ids.contains(layer) {
                log::warn!("Entity {id} referenced missing layer {layer}, moved to {fallback}");
                *layer = fallback;
            }
            if !seen.insert(*id) {
                let fresh = EntityId(next_id);
                next_id += 1;
                log::warn!("Duplicate id {id} reassigned to {fresh}");
                *id = fresh;
            }
        };
        for s in state.strokes.iter_mut().chain(state.erasers.iter_mut()) {
            fix(&mut s.id, &mut s.layer_id);
        }
        for s in state.shapes.iter_mut() {
            fix(&mut s.id, &mut s.layer_id);
        }
        self.next_id = next_id;
    }

    /// Describe every violated invariant (empty when consistent).
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.state.layers.is_empty() {
            problems.push("no layers".to_string());
        }
        if !self.has_layer(self.state.active_layer_id) {
            problems.push(format!("active layer {} missing", self.state.active_layer_id));
        }
        let mut seen = BTreeSet::new();
        let entities = self
            .state
            .strokes
            .iter()
            .chain(&self.state.erasers)
            .map(|s| (s.id, s.layer_id))
            .chain(self.state.shapes.iter().map(|s| (s.id, s.layer_id)));
        for (id, layer) in entities {
            if !self.has_layer(layer) {
                problems.push(format!("entity {id} on missing layer {layer}"));
            }
            if !seen.insert(id) {
                problems.push(format!("duplicate id {id}"));
            }
        }
        problems
    }
}
