//! Tool kinds and the interaction state machine's states.

use crate::selection::HandleKind;
use crate::shapes::{Circle, EntityId, Oval, Rectangle, ShapeKind, Triangle};
use crate::transform::NodeTransform;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Freehand,
    Wall,
    Eraser,
    Rectangle,
    Circle,
    Oval,
    Triangle,
    Fill,
    Picker,
}

impl ToolKind {
    /// Whether this tool draws a parametric shape by dragging.
    pub fn is_shape_tool(self) -> bool {
        matches!(
            self,
            ToolKind::Rectangle | ToolKind::Circle | ToolKind::Oval | ToolKind::Triangle
        )
    }

    /// Shape described by a drag from `start` to `current`, `None` for
    /// non-shape tools.
    pub fn shape_from_drag(self, start: Point, current: Point) -> Option<ShapeKind> {
        let kind = match self {
            ToolKind::Rectangle => ShapeKind::Rect(Rectangle::from_corners(start, current)),
            ToolKind::Circle => ShapeKind::Circle(Circle::from_center_edge(start, current)),
            ToolKind::Oval => ShapeKind::Oval(Oval::from_corners(start, current)),
            ToolKind::Triangle => ShapeKind::Triangle(Triangle::from_corners(start, current)),
            _ => return None,
        };
        Some(kind)
    }
}

/// Current state of the interaction controller. Gesture data lives in the
/// variant that needs it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Freehand points collected so far (world space).
    DrawingFreehand { points: Vec<Point> },
    /// A wall always has exactly two endpoints.
    DrawingWall { start: Point, end: Point },
    DrawingShape {
        tool: ToolKind,
        start: Point,
        current: Point,
    },
    Erasing,
    BoxSelecting { start: Point, current: Point },
    /// Last pointer position in screen space.
    Panning { last_screen: Point },
    /// Moving the selection; `transform` is a display projection only.
    DraggingNode {
        ids: BTreeSet<EntityId>,
        start: Point,
        bounds: Rect,
        transform: NodeTransform,
    },
    /// Scaling or rotating the selection via a handle.
    TransformingNode {
        ids: BTreeSet<EntityId>,
        handle: HandleKind,
        start: Point,
        bounds: Rect,
        transform: NodeTransform,
    },
    Picking,
    Filling,
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::DrawingFreehand { .. } => "drawing-freehand",
            InteractionState::DrawingWall { .. } => "drawing-wall",
            InteractionState::DrawingShape { .. } => "drawing-shape",
            InteractionState::Erasing => "erasing",
            InteractionState::BoxSelecting { .. } => "box-selecting",
            InteractionState::Panning { .. } => "panning",
            InteractionState::DraggingNode { .. } => "dragging",
            InteractionState::TransformingNode { .. } => "transforming",
            InteractionState::Picking => "picking",
            InteractionState::Filling => "filling",
        }
    }

    /// The in-flight transform and the ids it applies to, for display.
    pub fn transient_transform(&self) -> Option<(&BTreeSet<EntityId>, NodeTransform)> {
        match self {
            InteractionState::DraggingNode { ids, transform, .. }
            | InteractionState::TransformingNode { ids, transform, .. } => Some((ids, *transform)),
            _ => None,
        }
    }

    /// Selection rectangle of an in-progress box select.
    pub fn selection_rect(&self) -> Option<Rect> {
        match self {
            InteractionState::BoxSelecting { start, current } => {
                Some(crate::geometry::rect_from_corners(*start, *current))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_from_drag() {
        let start = Point::new(10.0, 10.0);
        let current = Point::new(0.0, 30.0);
        let Some(ShapeKind::Rect(r)) = ToolKind::Rectangle.shape_from_drag(start, current) else {
            panic!("expected rect");
        };
        assert_eq!(r, Rectangle::new(0.0, 10.0, 10.0, 20.0));
        assert!(ToolKind::Wall.shape_from_drag(start, current).is_none());
        assert!(ToolKind::Circle.is_shape_tool());
        assert!(!ToolKind::Fill.is_shape_tool());
    }

    #[test]
    fn test_state_helpers() {
        let state = InteractionState::BoxSelecting {
            start: Point::new(10.0, 10.0),
            current: Point::new(0.0, 0.0),
        };
        assert_eq!(state.selection_rect(), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        assert!(state.transient_transform().is_none());
        assert!(!state.is_idle());
        assert_eq!(state.name(), "box-selecting");
    }
}
