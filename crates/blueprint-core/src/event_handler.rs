//! Pointer and keyboard state machine driving the canvas.
//!
//! Pointer positions arrive in screen space and are converted to world
//! space through the camera. Gestures that change geometry keep the scene
//! untouched until release; only then is history recorded and the gesture
//! committed or baked.

use crate::canvas::Canvas;
use crate::input::{InputState, KeyEvent, Modifiers, MouseButton, PointerEvent};
use crate::selection::{HandleKind, Selection, center_rotation, corner_scale, hit_test_handles};
use crate::shapes::EntityId;
use crate::shortcuts::{EditorAction, ShortcutRegistry};
use crate::snap::{SnapCandidates, SnapGuide, snap_bounds, snap_point, snap_to_grid};
use crate::tools::{InteractionState, ToolKind};
use crate::transform::NodeTransform;
use kurbo::{Point, Vec2};
use std::collections::BTreeSet;

/// Translates input events into canvas operations.
#[derive(Debug, Clone, Default)]
pub struct EventHandler {
    pub state: InteractionState,
    pub input: InputState,
    /// Active snap guides, for display.
    pub guides: Vec<SnapGuide>,
}

impl EventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abandon the current gesture without touching the scene.
    pub fn cancel(&mut self) {
        if !self.state.is_idle() {
            log::debug!("Cancelled {}", self.state.name());
        }
        self.state = InteractionState::Idle;
        self.clear_guides();
    }

    pub fn clear_guides(&mut self) {
        self.guides.clear();
    }

    /// Switch tools, cancelling anything in progress.
    pub fn set_tool(&mut self, canvas: &mut Canvas, tool: ToolKind) {
        self.cancel();
        canvas.tool = tool;
    }

    pub fn handle_pointer(&mut self, canvas: &mut Canvas, event: PointerEvent, modifiers: Modifiers) {
        self.input.set_modifiers(modifiers);
        self.input.handle_pointer_event(&event);
        match event {
            PointerEvent::Down { position, button } => self.handle_press(canvas, position, button),
            PointerEvent::Move { position } => self.handle_drag(canvas, position),
            PointerEvent::Up { position, button } => self.handle_release(canvas, position, button),
            PointerEvent::Scroll { position, delta } => canvas.camera.wheel_zoom(position, delta.y),
        }
    }

    /// Apply a keyboard shortcut. Returns the action performed, if any.
    pub fn handle_key(&mut self, canvas: &mut Canvas, event: &KeyEvent, modifiers: Modifiers) -> Option<EditorAction> {
        let KeyEvent::Pressed(key) = event else {
            return None;
        };
        if self.input.text_input_focused {
            return None;
        }
        let action = ShortcutRegistry::resolve(key, modifiers)?;
        // Commands wait until the current gesture has settled
        if action != EditorAction::Cancel && !self.state.is_idle() {
            return None;
        }
        match action {
            EditorAction::Undo => {
                canvas.undo();
            }
            EditorAction::Redo => {
                canvas.redo();
            }
            EditorAction::Copy => {
                canvas.copy_selection();
            }
            EditorAction::Paste => {
                canvas.paste();
            }
            EditorAction::Cut => {
                canvas.cut_selection();
            }
            EditorAction::Duplicate => {
                canvas.duplicate_selection();
            }
            EditorAction::SelectAll => canvas.select_all(),
            EditorAction::Delete => {
                canvas.delete_selected();
            }
            EditorAction::MakeAnchor => {
                canvas.make_anchor();
            }
            EditorAction::Cancel => self.cancel(),
        }
        Some(action)
    }

    fn world(canvas: &Canvas, screen: Point) -> Point {
        canvas.camera.screen_to_world(screen)
    }

    fn grid_point(canvas: &Canvas, point: Point) -> Point {
        if canvas.settings.snaps_to_grid() {
            snap_to_grid(point, canvas.settings.grid_size).point
        } else {
            point
        }
    }

    fn snap_threshold(canvas: &Canvas) -> f64 {
        canvas
            .camera
            .screen_to_world_distance(canvas.settings.snap_threshold_px)
    }

    fn candidates(canvas: &Canvas, exclude: &BTreeSet<EntityId>) -> SnapCandidates {
        SnapCandidates::collect(canvas.scene.strokes(), canvas.scene.shapes(), exclude)
    }

    /// Wall endpoint: nearby snap references win, the grid applies otherwise.
    fn wall_point(canvas: &Canvas, world: Point) -> (Point, Vec<SnapGuide>) {
        if canvas.settings.snaps_to_entities() {
            let candidates = Self::candidates(canvas, &BTreeSet::new());
            let (snapped, outcome) = snap_point(&candidates, world, Self::snap_threshold(canvas));
            if !outcome.guides.is_empty() {
                return (snapped, outcome.guides);
            }
        }
        (Self::grid_point(canvas, world), Vec::new())
    }

    fn handle_press(&mut self, canvas: &mut Canvas, screen: Point, button: MouseButton) {
        if button == MouseButton::Right {
            self.cancel();
            self.state = InteractionState::Panning { last_screen: screen };
            return;
        }
        if button != MouseButton::Left || !self.state.is_idle() {
            return;
        }

        let world = Self::world(canvas, screen);
        self.state = match canvas.tool {
            ToolKind::Pan => InteractionState::Panning { last_screen: screen },
            ToolKind::Freehand => InteractionState::DrawingFreehand {
                points: vec![Self::grid_point(canvas, world)],
            },
            ToolKind::Wall => {
                let (start, guides) = Self::wall_point(canvas, world);
                self.guides = guides;
                InteractionState::DrawingWall { start, end: start }
            }
            tool @ (ToolKind::Rectangle | ToolKind::Circle | ToolKind::Oval | ToolKind::Triangle) => {
                let start = Self::grid_point(canvas, world);
                InteractionState::DrawingShape {
                    tool,
                    start,
                    current: start,
                }
            }
            ToolKind::Eraser => {
                canvas.erase_at(world);
                InteractionState::Erasing
            }
            ToolKind::Fill => {
                canvas.fill_room_at(world);
                InteractionState::Filling
            }
            ToolKind::Picker => {
                canvas.pick_color_at(world);
                InteractionState::Picking
            }
            ToolKind::Select => self.press_select(canvas, world),
        };
    }

    fn press_select(&mut self, canvas: &mut Canvas, world: Point) -> InteractionState {
        let shift = self.input.modifiers.shift;

        // Handles of the current selection take priority
        if let Some(bounds) = canvas.selection_bounds() {
            if let Some(handle) = hit_test_handles(bounds, canvas.camera.zoom, world) {
                return InteractionState::TransformingNode {
                    ids: canvas.selected_ids(),
                    handle,
                    start: world,
                    bounds,
                    transform: NodeTransform::identity(),
                };
            }
        }

        // Click and box selection reach every layer
        let Some(hit) = canvas.scene.hit_test(world, canvas.hit_tolerance(), None) else {
            if !shift {
                canvas.clear_selection();
            }
            return InteractionState::BoxSelecting {
                start: world,
                current: world,
            };
        };

        if shift {
            canvas.toggle_selection(hit);
            if !canvas.selection.contains(hit) {
                return InteractionState::Idle;
            }
        } else if !canvas.selection.contains(hit) {
            canvas.select(hit);
        }

        match canvas.selection_bounds() {
            Some(bounds) => InteractionState::DraggingNode {
                ids: canvas.selected_ids(),
                start: world,
                bounds,
                transform: NodeTransform::identity(),
            },
            None => InteractionState::Idle,
        }
    }

    fn handle_drag(&mut self, canvas: &mut Canvas, screen: Point) {
        let world = Self::world(canvas, screen);
        let snaps_to_entities = canvas.settings.snaps_to_entities();
        let threshold = Self::snap_threshold(canvas);

        match &mut self.state {
            InteractionState::DrawingFreehand { points } => {
                points.push(world);
            }
            InteractionState::DrawingWall { end, .. } => {
                let (target, guides) = Self::wall_point(canvas, world);
                *end = target;
                self.guides = guides;
            }
            InteractionState::DrawingShape { current, .. } => {
                *current = Self::grid_point(canvas, world);
            }
            InteractionState::Erasing => {
                canvas.erase_at(world);
            }
            InteractionState::BoxSelecting { current, .. } => {
                *current = world;
            }
            InteractionState::Panning { last_screen } => {
                canvas.camera.pan(screen - *last_screen);
                *last_screen = screen;
            }
            InteractionState::DraggingNode {
                ids,
                start,
                bounds,
                transform,
            } => {
                let mut delta: Vec2 = world - *start;
                let mut guides = Vec::new();
                // Snapping only applies to single-object drags
                if ids.len() == 1 && snaps_to_entities {
                    let moved = *bounds + delta;
                    let outcome = snap_bounds(&Self::candidates(canvas, ids), moved, threshold);
                    delta += outcome.delta;
                    guides = outcome.guides;
                }
                *transform = NodeTransform::translate(delta);
                self.guides = guides;
            }
            InteractionState::TransformingNode {
                ids,
                handle,
                start,
                bounds,
                transform,
            } => {
                let mut target = world;
                let mut guides = Vec::new();
                if ids.len() == 1 && snaps_to_entities && matches!(handle, HandleKind::Corner(_)) {
                    let (snapped, outcome) = snap_point(&Self::candidates(canvas, ids), world, threshold);
                    target = snapped;
                    guides = outcome.guides;
                }
                *transform = match handle {
                    HandleKind::Corner(corner) => corner_scale(*bounds, *corner, target),
                    HandleKind::Rotate => center_rotation(*bounds, *start, target),
                };
                self.guides = guides;
            }
            InteractionState::Idle | InteractionState::Picking | InteractionState::Filling => {}
        }
    }

    fn handle_release(&mut self, canvas: &mut Canvas, screen: Point, button: MouseButton) {
        let state = std::mem::take(&mut self.state);
        self.clear_guides();

        match button {
            MouseButton::Left => {}
            // Only a right-button pan ends on a right release
            MouseButton::Right if matches!(state, InteractionState::Panning { .. }) => return,
            _ => {
                self.state = state;
                return;
            }
        }

        let world = Self::world(canvas, screen);
        match state {
            InteractionState::DrawingFreehand { mut points } => {
                if points.last() != Some(&world) {
                    points.push(world);
                }
                if points.len() >= 2 {
                    let stroke = canvas.new_stroke(points, false);
                    canvas.commit_stroke(stroke);
                }
            }
            InteractionState::DrawingWall { start, end } => {
                if (end - start).hypot() > f64::EPSILON {
                    let wall = canvas.new_stroke(vec![start, end], true);
                    canvas.commit_stroke(wall);
                }
            }
            InteractionState::DrawingShape { tool, start, current } => {
                if let Some(kind) = tool.shape_from_drag(start, current) {
                    let bounds = kind.bounds(0.0);
                    if bounds.width() > f64::EPSILON || bounds.height() > f64::EPSILON {
                        canvas.commit_shape(kind);
                    }
                }
            }
            InteractionState::BoxSelecting { start, current } => {
                let rect = crate::geometry::rect_from_corners(start, current);
                let hits = canvas.scene.entities_in_rect(rect, None);
                canvas.selection = Selection::from_ids(hits);
                if let Selection::Single(id) = canvas.selection {
                    if canvas.settings.snaps_to_grid() {
                        canvas.snap_entity_to_grid(id);
                    }
                }
            }
            InteractionState::DraggingNode { ids, transform, .. } => {
                canvas.apply_transform(&ids, &transform, "Move");
            }
            InteractionState::TransformingNode {
                ids,
                handle,
                transform,
                ..
            } => {
                let label = match handle {
                    HandleKind::Corner(_) => "Resize",
                    HandleKind::Rotate => "Rotate",
                };
                canvas.apply_transform(&ids, &transform, label);
            }
            InteractionState::Panning { .. }
            | InteractionState::Erasing
            | InteractionState::Picking
            | InteractionState::Filling
            | InteractionState::Idle => {}
        }
    }
}
