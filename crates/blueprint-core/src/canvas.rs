//! Editor runtime state and the commands that mutate it.
//!
//! Every user-visible mutation goes through [`Canvas::record`] first, which
//! snapshots the scene for undo and bumps the revision counter the
//! autosaver watches.

use crate::camera::Camera;
use crate::clipboard::Clipboard;
use crate::grouping;
use crate::history::History;
use crate::layers::LayerId;
use crate::rooms;
use crate::scene::{EntityRef, Scene};
use crate::selection::Selection;
use crate::settings::EditorSettings;
use crate::shapes::{DEFAULT_COLOR, EntityId, Polygon, Shape, ShapeKind, Stroke};
use crate::snap::snap_to_grid;
use crate::storage::{ProjectData, ProjectPayload, SaveRequest};
use crate::tools::ToolKind;
use crate::transform::{NodeTransform, bake_shape, bake_stroke};
use kurbo::{Point, Rect, Size};
use std::collections::BTreeSet;

/// Pointer hit tolerance in screen pixels.
pub const HIT_TOLERANCE_PX: f64 = 4.0;

/// Runtime editor state (not persisted as a whole).
#[derive(Debug, Clone)]
pub struct Canvas {
    pub scene: Scene,
    pub history: History,
    pub camera: Camera,
    pub settings: EditorSettings,
    pub selection: Selection,
    pub clipboard: Clipboard,
    pub tool: ToolKind,
    pub viewport_size: Size,
    /// Bumped on every scene mutation.
    revision: u64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    pub fn new() -> Self {
        Self::with_settings(EditorSettings::default())
    }

    pub fn with_settings(settings: EditorSettings) -> Self {
        Self {
            scene: Scene::new(),
            history: History::new(settings.history_limit),
            camera: Camera::with_bounds(settings.min_zoom, settings.max_zoom),
            settings,
            selection: Selection::None,
            clipboard: Clipboard::default(),
            tool: ToolKind::default(),
            viewport_size: Size::new(800.0, 600.0),
            revision: 0,
        }
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_size = Size::new(width, height);
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Snapshot for undo, then mark the scene changed.
    pub fn record(&mut self, label: &str) {
        self.history.push(label, &self.scene);
        self.mark_changed();
    }

    /// Mark the scene changed without an undo snapshot.
    pub fn mark_changed(&mut self) {
        self.revision += 1;
    }

    /// World-space hit tolerance at the current zoom.
    pub fn hit_tolerance(&self) -> f64 {
        self.camera.screen_to_world_distance(HIT_TOLERANCE_PX)
    }

    // --- Selection ---

    pub fn select(&mut self, id: EntityId) {
        self.selection = Selection::Single(id);
    }

    pub fn toggle_selection(&mut self, id: EntityId) {
        self.selection.toggle(id);
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    pub fn selected_ids(&self) -> BTreeSet<EntityId> {
        self.selection.ids()
    }

    /// Select every stroke and shape on the active layer.
    pub fn select_all(&mut self) {
        let ids = self.scene.ids_on_layer(self.scene.active_layer());
        self.selection = Selection::from_ids(ids);
    }

    pub fn selection_bounds(&self) -> Option<Rect> {
        self.scene.bounds_of(&self.selected_ids())
    }

    fn prune_selection(&mut self) {
        let scene = &self.scene;
        self.selection.retain(|id| scene.get(id).is_some());
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        if !self.history.undo(&mut self.scene) {
            return false;
        }
        self.clear_selection();
        self.mark_changed();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.history.redo(&mut self.scene) {
            return false;
        }
        self.clear_selection();
        self.mark_changed();
        true
    }

    // --- Entity commands ---

    /// Commit a finished stroke.
    pub fn commit_stroke(&mut self, stroke: Stroke) -> bool {
        if !stroke.is_valid() || !self.scene.can_insert(stroke.id, stroke.layer_id) {
            return false;
        }
        let label = if stroke.is_wall { "Draw wall" } else { "Draw stroke" };
        self.record(label);
        self.scene.add_stroke(stroke)
    }

    /// Commit a new shape on the active layer with the draw color.
    pub fn commit_shape(&mut self, kind: ShapeKind) -> Option<EntityId> {
        let id = self.scene.allocate_id();
        let shape = Shape::new(id, kind, self.settings.draw_color.clone(), self.scene.active_layer());
        if !self.scene.can_insert(id, shape.layer_id) {
            return None;
        }
        self.record("Draw shape");
        self.scene.add_shape(shape).then_some(id)
    }

    /// New stroke carrying the current draw settings.
    pub fn new_stroke(&mut self, points: Vec<Point>, is_wall: bool) -> Stroke {
        let id = self.scene.allocate_id();
        let mut stroke = Stroke::freehand(
            id,
            self.scene.active_layer(),
            points,
            &self.settings.draw_color,
            self.settings.thickness,
        );
        stroke.is_wall = is_wall;
        stroke.material = self.settings.material.clone();
        stroke
    }

    pub fn delete_selected(&mut self) -> bool {
        let ids = self.selected_ids();
        if ids.is_empty() {
            return false;
        }
        self.record("Delete");
        self.scene.remove(&ids);
        self.clear_selection();
        true
    }

    pub fn copy_selection(&mut self) -> bool {
        let ids = self.selected_ids();
        if ids.is_empty() {
            return false;
        }
        self.clipboard = Clipboard::from_ids(&self.scene, &ids);
        log::debug!("Copied {} entities", self.clipboard.len());
        true
    }

    /// Copy then delete, as one undo step.
    pub fn cut_selection(&mut self) -> bool {
        self.copy_selection() && self.delete_selected()
    }

    pub fn paste(&mut self) -> Vec<EntityId> {
        if self.clipboard.is_empty() {
            return Vec::new();
        }
        self.record("Paste");
        let clipboard = std::mem::take(&mut self.clipboard);
        let pasted = clipboard.paste_into(&mut self.scene);
        self.clipboard = clipboard;
        self.selection = Selection::from_ids(pasted.iter().copied());
        pasted
    }

    /// Paste a copy of the selection without touching the clipboard.
    pub fn duplicate_selection(&mut self) -> Vec<EntityId> {
        let ids = self.selected_ids();
        if ids.is_empty() {
            return Vec::new();
        }
        self.record("Duplicate");
        let copies = Clipboard::from_ids(&self.scene, &ids).paste_into(&mut self.scene);
        self.selection = Selection::from_ids(copies.iter().copied());
        copies
    }

    /// Group the selection into an anchor block.
    pub fn make_anchor(&mut self) -> Option<EntityId> {
        let ids = self.selected_ids();
        grouping::anchor_bounds(&self.scene, &ids)?;
        self.record("Create anchor block");
        let id = grouping::make_anchor(&mut self.scene, &ids)?;
        self.select(id);
        Some(id)
    }

    /// Bake a finished gesture transform into the listed entities.
    pub fn apply_transform(&mut self, ids: &BTreeSet<EntityId>, transform: &NodeTransform, label: &str) -> bool {
        if ids.is_empty() || transform.is_identity() {
            return false;
        }
        self.record(label);
        for id in ids {
            if let Some(stroke) = self.scene.stroke_mut(*id) {
                bake_stroke(stroke, transform);
            } else if let Some(shape) = self.scene.shape_mut(*id) {
                bake_shape(shape, transform);
            }
        }
        true
    }

    /// Snap one entity's reference point to the grid. Undoable, and only
    /// recorded when the entity actually moves.
    pub fn snap_entity_to_grid(&mut self, id: EntityId) -> bool {
        let reference = match self.scene.get(id) {
            Some(EntityRef::Stroke(s)) => s.absolute_points().next(),
            Some(EntityRef::Shape(s)) => Some(s.kind.origin()),
            None => None,
        };
        let Some(reference) = reference else {
            return false;
        };
        let delta = snap_to_grid(reference, self.settings.grid_size).point - reference;
        if delta.hypot2() < f64::EPSILON {
            return false;
        }
        self.record("Snap to grid");
        self.scene.translate(&BTreeSet::from([id]), delta);
        true
    }

    /// Remove every entity on the active layer under `point`.
    ///
    /// Erasing does not push an undo snapshot.
    pub fn erase_at(&mut self, point: Point) -> usize {
        let hits = self.scene.hits_at(point, self.scene.active_layer());
        if hits.is_empty() {
            return 0;
        }
        let removed = self.scene.remove(&hits);
        self.prune_selection();
        self.mark_changed();
        log::debug!("Erased {removed} entities");
        removed
    }

    /// Fill the smallest room around `point` with a closed polygon.
    pub fn fill_room_at(&mut self, point: Point) -> Option<EntityId> {
        let walls = self.scene.wall_segments(self.scene.active_layer());
        let rooms = rooms::detect_rooms(&walls);
        let Some(room) = rooms::room_at(&rooms, point) else {
            log::debug!("No room at ({:.1}, {:.1})", point.x, point.y);
            return None;
        };
        let polygon = Polygon::from_absolute(&room.vertices);
        self.commit_shape(ShapeKind::Polygon(polygon))
    }

    /// Color of the topmost entity under `point`, white when nothing is there.
    /// The sampled color becomes the draw color.
    pub fn pick_color_at(&mut self, point: Point) -> String {
        let tolerance = self.hit_tolerance();
        let color = self
            .scene
            .hit_test(point, tolerance, Some(self.scene.active_layer()))
            .and_then(|id| self.scene.get(id))
            .map_or_else(|| DEFAULT_COLOR.to_string(), |e| e.color().to_string());
        self.settings.draw_color = color.clone();
        color
    }

    // --- Layers ---

    pub fn add_layer(&mut self, name: Option<&str>) -> LayerId {
        self.record("Add layer");
        self.scene.add_layer(name)
    }

    pub fn delete_layer(&mut self, id: LayerId) -> bool {
        if self.scene.layers().len() <= 1 || !self.scene.has_layer(id) {
            return false;
        }
        self.record("Delete layer");
        let deleted = self.scene.delete_layer(id);
        self.prune_selection();
        deleted
    }

    pub fn rename_layer(&mut self, id: LayerId, name: &str) -> bool {
        if !self.scene.has_layer(id) {
            return false;
        }
        self.record("Rename layer");
        self.scene.rename_layer(id, name)
    }

    /// Switch the active layer; clears the selection.
    pub fn set_active_layer(&mut self, id: LayerId) -> bool {
        if !self.scene.set_active_layer(id) {
            return false;
        }
        self.clear_selection();
        true
    }

    pub fn set_project_name(&mut self, name: &str) {
        self.record("Rename project");
        self.scene.set_project_name(name);
    }

    pub fn fit_to_content(&mut self) {
        let ids = self.scene.all_ids();
        match self.scene.bounds_of(&ids) {
            Some(bounds) => self.camera.fit_to_bounds(bounds, self.viewport_size, 50.0),
            None => self.camera.reset(),
        }
    }

    // --- Persistence ---

    /// Apply a loaded project. Only present fields replace current values.
    pub fn load_project(&mut self, payload: ProjectPayload) {
        let mut state = self.scene.snapshot();
        if let Some(name) = payload.name {
            state.project_name = name;
        }
        if let Some(layers) = payload.layers {
            state.layers = layers;
        }
        if let Some(data) = payload.data {
            if let Some(strokes) = data.strokes {
                state.strokes = strokes;
            }
            if let Some(erasers) = data.erasers {
                state.erasers = erasers;
            }
            if let Some(shapes) = data.shapes {
                state.shapes = shapes;
            }
            if let Some(grid_size) = data.grid_size {
                self.settings.grid_size = grid_size;
            }
            if let Some(units) = data.units {
                self.settings.units = units;
            }
            if let Some(color) = data.draw_color {
                self.settings.draw_color = color;
            }
            if let Some(thickness) = data.thickness {
                self.settings.thickness = thickness;
            }
            if data.material.is_some() {
                self.settings.material = data.material;
            }
        }

        self.scene.restore(state);
        self.scene.repair();
        self.history.clear();
        self.clear_selection();
        log::info!(
            "Loaded project '{}' ({} strokes, {} shapes, {} layers)",
            self.scene.project_name(),
            self.scene.strokes().len(),
            self.scene.shapes().len(),
            self.scene.layers().len()
        );
    }

    /// Current scene in the save wire shape.
    pub fn save_request(&self) -> SaveRequest {
        let state = self.scene.state();
        SaveRequest {
            project_name: state.project_name.clone(),
            layers: state.layers.clone(),
            data: ProjectData {
                strokes: Some(state.strokes.clone()),
                erasers: Some(state.erasers.clone()),
                shapes: Some(state.shapes.clone()),
                grid_size: Some(self.settings.grid_size),
                units: Some(self.settings.units.clone()),
                draw_color: Some(self.settings.draw_color.clone()),
                thickness: Some(self.settings.thickness),
                material: self.settings.material.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Circle, Rectangle};
    use kurbo::Vec2;

    fn canvas_with_rect() -> (Canvas, EntityId) {
        let mut canvas = Canvas::new();
        let id = canvas
            .commit_shape(ShapeKind::Rect(Rectangle::new(0.0, 0.0, 10.0, 10.0)))
            .unwrap();
        (canvas, id)
    }

    fn square_walls(canvas: &mut Canvas) {
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ];
        for i in 0..4 {
            let wall = canvas.new_stroke(vec![corners[i], corners[(i + 1) % 4]], true);
            assert!(canvas.commit_stroke(wall));
        }
    }

    #[test]
    fn test_commit_is_undoable() {
        let (mut canvas, id) = canvas_with_rect();
        assert!(canvas.scene.get(id).is_some());
        assert_eq!(canvas.revision(), 1);
        assert!(canvas.undo());
        assert!(canvas.scene.get(id).is_none());
        assert!(canvas.redo());
        assert!(canvas.scene.get(id).is_some());
    }

    #[test]
    fn test_rejected_commit_leaves_no_undo_step() {
        let mut canvas = Canvas::new();
        let wall = canvas.new_stroke(vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0)], true);
        assert!(canvas.commit_stroke(wall.clone()));
        assert_eq!(canvas.history.undo_len(), 1);
        let revision = canvas.revision();

        // Same id again
        assert!(!canvas.commit_stroke(wall.clone()));
        let mut orphan = canvas.new_stroke(wall.points.clone(), true);
        orphan.layer_id = LayerId(99);
        assert!(!canvas.commit_stroke(orphan));

        assert_eq!(canvas.history.undo_len(), 1);
        assert_eq!(canvas.revision(), revision);
        assert_eq!(canvas.scene.strokes().len(), 1);
    }

    #[test]
    fn test_undo_clears_selection() {
        let (mut canvas, id) = canvas_with_rect();
        canvas.select(id);
        canvas.undo();
        assert!(canvas.selection.is_empty());
    }

    #[test]
    fn test_delete_selected() {
        let (mut canvas, id) = canvas_with_rect();
        assert!(!canvas.delete_selected());
        canvas.select(id);
        assert!(canvas.delete_selected());
        assert!(canvas.scene.is_empty());
        assert!(canvas.undo());
        assert!(canvas.scene.get(id).is_some());
    }

    #[test]
    fn test_cut_is_single_undo_step() {
        let (mut canvas, id) = canvas_with_rect();
        canvas.select(id);
        let before = canvas.history.undo_len();
        assert!(canvas.cut_selection());
        assert_eq!(canvas.history.undo_len(), before + 1);
        assert_eq!(canvas.clipboard.len(), 1);
        assert!(canvas.scene.is_empty());
    }

    #[test]
    fn test_paste_offsets_and_selects() {
        let (mut canvas, id) = canvas_with_rect();
        assert!(canvas.paste().is_empty());
        canvas.select(id);
        canvas.copy_selection();
        let pasted = canvas.paste();
        assert_eq!(pasted.len(), 1);
        assert_eq!(canvas.selection, Selection::Single(pasted[0]));
        let Some(EntityRef::Shape(shape)) = canvas.scene.get(pasted[0]) else { panic!("expected shape") };
        assert_eq!(shape.bounds(), Rect::new(10.0, 10.0, 20.0, 20.0));
        // Clipboard survives for repeated pastes
        assert_eq!(canvas.paste().len(), 1);
    }

    #[test]
    fn test_duplicate_keeps_clipboard() {
        let (mut canvas, id) = canvas_with_rect();
        canvas.select(id);
        let copies = canvas.duplicate_selection();
        assert_eq!(copies.len(), 1);
        assert!(canvas.clipboard.is_empty());
        assert_eq!(canvas.scene.shapes().len(), 2);
    }

    #[test]
    fn test_make_anchor_undoable() {
        let (mut canvas, rect) = canvas_with_rect();
        let circle = canvas.commit_shape(ShapeKind::Circle(Circle::new(50.0, 50.0, 5.0))).unwrap();
        canvas.selection = Selection::from_ids([rect, circle]);
        let anchor = canvas.make_anchor().unwrap();
        assert_eq!(canvas.selection, Selection::Single(anchor));
        assert_eq!(canvas.scene.shapes().len(), 1);
        assert!(canvas.undo());
        assert_eq!(canvas.scene.shapes().len(), 2);
    }

    #[test]
    fn test_make_anchor_without_selection() {
        let mut canvas = Canvas::new();
        assert!(canvas.make_anchor().is_none());
        assert!(!canvas.history.can_undo());
    }

    #[test]
    fn test_erase_skips_history() {
        let mut canvas = Canvas::new();
        let stroke = canvas.new_stroke(vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)], false);
        canvas.commit_stroke(stroke);
        let undo_len = canvas.history.undo_len();
        let revision = canvas.revision();
        assert_eq!(canvas.erase_at(Point::new(50.0, 0.5)), 1);
        assert_eq!(canvas.history.undo_len(), undo_len);
        assert!(canvas.revision() > revision);
        assert_eq!(canvas.erase_at(Point::new(50.0, 50.0)), 0);
    }

    #[test]
    fn test_erase_only_active_layer() {
        let (mut canvas, id) = canvas_with_rect();
        let other = canvas.add_layer(None);
        canvas.set_active_layer(other);
        assert_eq!(canvas.erase_at(Point::new(5.0, 5.0)), 0);
        assert!(canvas.scene.get(id).is_some());
    }

    #[test]
    fn test_fill_room() {
        let mut canvas = Canvas::new();
        square_walls(&mut canvas);
        assert!(canvas.fill_room_at(Point::new(500.0, 500.0)).is_none());
        let id = canvas.fill_room_at(Point::new(50.0, 50.0)).unwrap();
        let Some(EntityRef::Shape(shape)) = canvas.scene.get(id) else { panic!("expected shape") };
        let ShapeKind::Polygon(polygon) = &shape.kind else { panic!("expected polygon") };
        assert!(polygon.closed);
        assert_eq!(shape.bounds(), Rect::new(0.0, 0.0, 100.0, 100.0));
        assert!(canvas.undo());
        assert!(canvas.scene.get(id).is_none());
    }

    #[test]
    fn test_pick_color() {
        let mut canvas = Canvas::new();
        canvas.settings.draw_color = "#123456".to_string();
        let id = canvas.commit_shape(ShapeKind::Rect(Rectangle::new(0.0, 0.0, 10.0, 10.0))).unwrap();
        canvas.settings.draw_color = "#000000".to_string();
        let revision = canvas.revision();
        assert_eq!(canvas.pick_color_at(Point::new(5.0, 5.0)), "#123456");
        assert_eq!(canvas.settings.draw_color, "#123456");
        assert_eq!(canvas.pick_color_at(Point::new(500.0, 5.0)), "#ffffff");
        assert_eq!(canvas.revision(), revision);
        assert!(canvas.scene.get(id).is_some());
    }

    #[test]
    fn test_snap_entity_to_grid() {
        let mut canvas = Canvas::new();
        let id = canvas.commit_shape(ShapeKind::Rect(Rectangle::new(23.0, 47.0, 10.0, 10.0))).unwrap();
        let undo_len = canvas.history.undo_len();
        assert!(canvas.snap_entity_to_grid(id));
        assert_eq!(canvas.scene.get(id).unwrap().bounds().unwrap().origin(), Point::new(20.0, 40.0));
        assert_eq!(canvas.history.undo_len(), undo_len + 1);
        // Already aligned: nothing recorded
        assert!(!canvas.snap_entity_to_grid(id));
        assert_eq!(canvas.history.undo_len(), undo_len + 1);
    }

    #[test]
    fn test_apply_transform_bakes() {
        let (mut canvas, id) = canvas_with_rect();
        let ids = BTreeSet::from([id]);
        assert!(!canvas.apply_transform(&ids, &NodeTransform::identity(), "Move"));
        assert!(canvas.apply_transform(&ids, &NodeTransform::translate(Vec2::new(5.0, 5.0)), "Move"));
        assert_eq!(canvas.scene.get(id).unwrap().bounds(), Some(Rect::new(5.0, 5.0, 15.0, 15.0)));
    }

    #[test]
    fn test_layer_commands() {
        let (mut canvas, id) = canvas_with_rect();
        let first = canvas.scene.active_layer();
        assert!(!canvas.delete_layer(first));
        let second = canvas.add_layer(Some("Upstairs"));
        canvas.select(id);
        assert!(canvas.set_active_layer(second));
        assert!(canvas.selection.is_empty());
        assert!(canvas.delete_layer(first));
        assert!(canvas.scene.get(id).is_none());
        assert_eq!(canvas.scene.active_layer(), second);
        assert!(canvas.undo());
        assert!(canvas.scene.get(id).is_some());
    }

    #[test]
    fn test_select_all_active_layer_only() {
        let (mut canvas, id) = canvas_with_rect();
        let other = canvas.add_layer(None);
        canvas.set_active_layer(other);
        canvas.select_all();
        assert!(canvas.selection.is_empty());
        canvas.set_active_layer(canvas.scene.layers()[0].id);
        canvas.select_all();
        assert_eq!(canvas.selection, Selection::Single(id));
    }

    #[test]
    fn test_load_applies_present_fields_only() {
        let (mut canvas, _) = canvas_with_rect();
        canvas.settings.units = "in".to_string();
        let payload: ProjectPayload = serde_json::from_str(
            r##"{"name":"House","data":{"strokes":[{"id":40,"points":[0,0,5,5],"color":"#000","thickness":2,"layer_id":1}],"gridSize":25}}"##,
        )
        .unwrap();
        canvas.load_project(payload);
        assert_eq!(canvas.scene.project_name(), "House");
        assert_eq!(canvas.scene.strokes().len(), 1);
        // Shapes absent from the payload are kept
        assert_eq!(canvas.scene.shapes().len(), 1);
        assert_eq!(canvas.settings.grid_size, 25.0);
        assert_eq!(canvas.settings.units, "in");
        assert!(!canvas.history.can_undo());
        assert!(canvas.scene.allocate_id().0 > 40);
    }

    #[test]
    fn test_save_request_shape() {
        let (canvas, _) = canvas_with_rect();
        let json = serde_json::to_value(canvas.save_request()).unwrap();
        assert_eq!(json["projectName"], "Untitled");
        assert_eq!(json["data"]["gridSize"], 20.0);
        assert_eq!(json["data"]["shapes"][0]["type"], "rect");
        assert_eq!(json["layers"][0]["name"], "Layer 1");
    }
}
