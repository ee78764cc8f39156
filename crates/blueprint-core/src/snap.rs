//! Snap functionality for aligning points to the grid and to other entities.
//!
//! Entity snapping works per axis: every stroke and shape contributes
//! x-candidates (`vertical` guide lines) and y-candidates (`horizontal`
//! guide lines). A dragged object offers a few reference coordinates per
//! axis; the closest candidate below the threshold wins, first match on
//! ties.

use crate::shapes::{EntityId, Shape, ShapeKind, Stroke};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Grid size for snapping (matches the visual grid).
pub const GRID_SIZE: f64 = 20.0;

/// Entity snap threshold in screen pixels.
pub const SHAPE_SNAP_THRESHOLD: f64 = 10.0;

/// Snap mode for aligning entities to grid or other elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapMode {
    /// No snapping.
    None,
    /// Snap to grid intersections.
    Grid,
    /// Snap to other entities' edges, centres and vertices.
    #[default]
    Shapes,
    /// Snap to both grid and entities.
    All,
}

impl SnapMode {
    /// Cycle to the next snap mode.
    pub fn next(self) -> Self {
        match self {
            SnapMode::None => SnapMode::Grid,
            SnapMode::Grid => SnapMode::Shapes,
            SnapMode::Shapes => SnapMode::All,
            SnapMode::All => SnapMode::None,
        }
    }

    /// Check if grid snapping is enabled.
    pub fn snaps_to_grid(self) -> bool {
        matches!(self, SnapMode::Grid | SnapMode::All)
    }

    /// Check if entity snapping is enabled.
    pub fn snaps_to_shapes(self) -> bool {
        matches!(self, SnapMode::Shapes | SnapMode::All)
    }
}

/// Result of a grid snap.
#[derive(Debug, Clone, Copy)]
pub struct SnapResult {
    /// The snapped point.
    pub point: Point,
    /// Whether the X coordinate was snapped.
    pub snapped_x: bool,
    /// Whether the Y coordinate was snapped.
    pub snapped_y: bool,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped_x: false,
            snapped_y: false,
        }
    }

    /// Check if any snapping occurred.
    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> SnapResult {
    if grid_size <= 0.0 {
        return SnapResult::none(point);
    }
    let snapped_x = (point.x / grid_size).round() * grid_size;
    let snapped_y = (point.y / grid_size).round() * grid_size;

    SnapResult {
        point: Point::new(snapped_x, snapped_y),
        snapped_x: true,
        snapped_y: true,
    }
}

/// Direction of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuideOrientation {
    /// A vertical line at some x.
    Vertical,
    /// A horizontal line at some y.
    Horizontal,
}

/// Transient visual feedback for a matched snap axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapGuide {
    pub orientation: GuideOrientation,
    pub position: f64,
}

/// Snap candidate coordinates gathered from the scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapCandidates {
    /// x-coordinates.
    pub vertical: Vec<f64>,
    /// y-coordinates.
    pub horizontal: Vec<f64>,
}

impl SnapCandidates {
    /// Gather candidates from every entity not listed in `exclude`.
    pub fn collect(strokes: &[Stroke], shapes: &[Shape], exclude: &BTreeSet<EntityId>) -> Self {
        let mut candidates = Self::default();
        for stroke in strokes.iter().filter(|s| !exclude.contains(&s.id)) {
            for p in stroke.vertices() {
                candidates.push_point(p);
            }
        }
        for shape in shapes.iter().filter(|s| !exclude.contains(&s.id)) {
            match &shape.kind {
                ShapeKind::Rect(_) | ShapeKind::Circle(_) | ShapeKind::Oval(_) => {
                    candidates.push_rect(shape.bounds());
                }
                ShapeKind::Triangle(_) | ShapeKind::Polygon(_) => {
                    for p in shape.vertices() {
                        candidates.push_point(p);
                    }
                }
            }
        }
        candidates
    }

    fn push_point(&mut self, p: Point) {
        self.vertical.push(p.x);
        self.horizontal.push(p.y);
    }

    fn push_rect(&mut self, rect: Rect) {
        let (xs, ys) = rect_references(rect);
        self.vertical.extend(xs);
        self.horizontal.extend(ys);
    }

    pub fn is_empty(&self) -> bool {
        self.vertical.is_empty() && self.horizontal.is_empty()
    }
}

/// Left/centre/right and top/middle/bottom of a rectangle.
pub fn rect_references(rect: Rect) -> ([f64; 3], [f64; 3]) {
    let center = rect.center();
    (
        [rect.x0, center.x, rect.x1],
        [rect.y0, center.y, rect.y1],
    )
}

/// Outcome of an entity snap: a correction to apply plus guides to show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapOutcome {
    pub delta: Vec2,
    pub guides: Vec<SnapGuide>,
}

impl SnapOutcome {
    pub fn is_snapped(&self) -> bool {
        !self.guides.is_empty()
    }
}

/// Closest (candidate - reference) offset strictly below `threshold`.
fn best_axis(references: &[f64], candidates: &[f64], threshold: f64) -> Option<(f64, f64)> {
    let mut best: Option<(f64, f64)> = None;
    let mut best_dist = threshold;
    for &r in references {
        for &c in candidates {
            let dist = (c - r).abs();
            if dist < best_dist {
                best_dist = dist;
                best = Some((c - r, c));
            }
        }
    }
    best
}

/// Resolve a snap for the given reference coordinates.
///
/// `threshold` is in world units (callers divide the pixel threshold by the zoom).
pub fn resolve(
    candidates: &SnapCandidates,
    ref_x: &[f64],
    ref_y: &[f64],
    threshold: f64,
) -> SnapOutcome {
    let mut outcome = SnapOutcome::default();
    if let Some((dx, position)) = best_axis(ref_x, &candidates.vertical, threshold) {
        outcome.delta.x = dx;
        outcome.guides.push(SnapGuide {
            orientation: GuideOrientation::Vertical,
            position,
        });
    }
    if let Some((dy, position)) = best_axis(ref_y, &candidates.horizontal, threshold) {
        outcome.delta.y = dy;
        outcome.guides.push(SnapGuide {
            orientation: GuideOrientation::Horizontal,
            position,
        });
    }
    outcome
}

/// Snap a moving bounding box by its left/centre/right and top/middle/bottom.
pub fn snap_bounds(candidates: &SnapCandidates, bounds: Rect, threshold: f64) -> SnapOutcome {
    let (xs, ys) = rect_references(bounds);
    resolve(candidates, &xs, &ys, threshold)
}

/// Snap a single point (e.g. a wall endpoint).
pub fn snap_point(candidates: &SnapCandidates, point: Point, threshold: f64) -> (Point, SnapOutcome) {
    let outcome = resolve(candidates, &[point.x], &[point.y], threshold);
    (point + outcome.delta, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::LayerId;
    use crate::shapes::{Circle, Rectangle};

    fn rect_shape(id: u64, x: f64, y: f64, w: f64, h: f64) -> Shape {
        Shape::new(EntityId(id), ShapeKind::Rect(Rectangle::new(x, y, w, h)), "#000", LayerId(1))
    }

    #[test]
    fn test_snap_to_grid() {
        let result = snap_to_grid(Point::new(23.0, 47.0), 20.0);
        assert_eq!(result.point, Point::new(20.0, 40.0));
        assert!(result.is_snapped());
        assert!(!snap_to_grid(Point::new(1.0, 1.0), 0.0).is_snapped());
    }

    #[test]
    fn test_snap_mode_cycle() {
        assert_eq!(SnapMode::None.next(), SnapMode::Grid);
        assert_eq!(SnapMode::All.next(), SnapMode::None);
        assert!(SnapMode::All.snaps_to_grid());
        assert!(!SnapMode::Grid.snaps_to_shapes());
    }

    #[test]
    fn test_candidates_per_variant() {
        let shapes = vec![
            rect_shape(1, 0.0, 0.0, 100.0, 50.0),
            Shape::new(EntityId(2), ShapeKind::Circle(Circle::new(200.0, 200.0, 10.0)), "#000", LayerId(1)),
        ];
        let wall = Stroke::wall(EntityId(3), LayerId(1), Point::new(0.0, 300.0), Point::new(40.0, 300.0), "#000", 2.0);
        let c = SnapCandidates::collect(&[wall], &shapes, &BTreeSet::new());
        assert_eq!(c.vertical, vec![0.0, 40.0, 20.0, 0.0, 50.0, 100.0, 190.0, 200.0, 210.0]);
        assert_eq!(c.horizontal, vec![300.0, 300.0, 300.0, 0.0, 25.0, 50.0, 190.0, 200.0, 210.0]);
    }

    #[test]
    fn test_excluded_ids_contribute_nothing() {
        let shapes = vec![rect_shape(1, 0.0, 0.0, 10.0, 10.0)];
        let exclude: BTreeSet<_> = [EntityId(1)].into_iter().collect();
        assert!(SnapCandidates::collect(&[], &shapes, &exclude).is_empty());
    }

    #[test]
    fn test_resolve_picks_closest_below_threshold() {
        let candidates = SnapCandidates {
            vertical: vec![100.0, 104.0],
            horizontal: vec![500.0],
        };
        let outcome = resolve(&candidates, &[103.0], &[0.0], 10.0);
        assert_eq!(outcome.delta, Vec2::new(1.0, 0.0));
        assert_eq!(
            outcome.guides,
            vec![SnapGuide {
                orientation: GuideOrientation::Vertical,
                position: 104.0
            }]
        );
    }

    #[test]
    fn test_resolve_ties_first_encountered() {
        let candidates = SnapCandidates {
            vertical: vec![95.0, 105.0],
            horizontal: vec![],
        };
        let a = resolve(&candidates, &[100.0], &[], 10.0);
        let b = resolve(&candidates, &[100.0], &[], 10.0);
        assert_eq!(a, b);
        assert_eq!(a.guides[0].position, 95.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let candidates = SnapCandidates {
            vertical: vec![10.0],
            horizontal: vec![],
        };
        assert!(!resolve(&candidates, &[0.0], &[], 10.0).is_snapped());
        assert!(resolve(&candidates, &[0.5], &[], 10.0).is_snapped());
    }

    #[test]
    fn test_snap_bounds_and_point() {
        let shapes = vec![rect_shape(1, 0.0, 0.0, 100.0, 100.0)];
        let c = SnapCandidates::collect(&[], &shapes, &BTreeSet::new());
        let outcome = snap_bounds(&c, Rect::new(103.0, 198.0, 153.0, 248.0), 10.0);
        assert_eq!(outcome.delta, Vec2::new(-3.0, 0.0));

        let (p, outcome) = snap_point(&c, Point::new(48.0, 97.0), 10.0);
        assert_eq!(p, Point::new(50.0, 100.0));
        assert_eq!(outcome.guides.len(), 2);
    }
}
