//! Transient gesture transforms and their baking into stored geometry.
//!
//! While a drag or resize/rotate gesture is in flight the stored entities are
//! left untouched; the gesture only accumulates a [`NodeTransform`] that a
//! renderer may use as a display projection. On release the transform is
//! folded into absolute coordinates with [`bake_stroke`]/[`bake_shape`] and
//! reset to identity, so repeated edits never compound.

use crate::shapes::{Shape, Stroke};
use kurbo::{Affine, Point, Vec2};

/// Smallest absolute scale factor a gesture may produce.
pub const MIN_SCALE: f64 = 0.01;

/// Translation, non-uniform scale and rotation about an origin.
///
/// Applied as: scale and rotate around `origin`, then translate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    /// Pivot for scale and rotation (world coordinates).
    pub origin: Point,
    /// Translation applied after scale and rotation.
    pub translation: Vec2,
    /// Per-axis scale factors.
    pub scale: Vec2,
    /// Rotation in radians.
    pub rotation: f64,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl NodeTransform {
    pub const fn identity() -> Self {
        Self {
            origin: Point::ZERO,
            translation: Vec2::ZERO,
            scale: Vec2::new(1.0, 1.0),
            rotation: 0.0,
        }
    }

    /// Pure translation.
    pub fn translate(delta: Vec2) -> Self {
        Self {
            translation: delta,
            ..Self::identity()
        }
    }

    /// Scale about a pivot.
    pub fn scale_about(origin: Point, sx: f64, sy: f64) -> Self {
        Self {
            origin,
            scale: Vec2::new(sx, sy),
            ..Self::identity()
        }
    }

    /// Rotation about a pivot.
    pub fn rotate_about(origin: Point, rotation: f64) -> Self {
        Self {
            origin,
            rotation,
            ..Self::identity()
        }
    }

    pub fn is_identity(&self) -> bool {
        self.translation.hypot2() < f64::EPSILON
            && (self.scale.x - 1.0).abs() < f64::EPSILON
            && (self.scale.y - 1.0).abs() < f64::EPSILON
            && self.rotation.abs() < f64::EPSILON
    }

    /// Full affine matrix of this transform.
    pub fn to_affine(&self) -> Affine {
        let origin = self.origin.to_vec2();
        Affine::translate(origin + self.translation)
            * Affine::rotate(self.rotation)
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
            * Affine::translate(-origin)
    }

    /// Absolute per-axis scale.
    pub fn abs_scale(&self) -> Vec2 {
        Vec2::new(self.scale.x.abs(), self.scale.y.abs())
    }

    /// Mean absolute scale, used for radius-only geometry.
    pub fn mean_scale(&self) -> f64 {
        (self.scale.x.abs() + self.scale.y.abs()) / 2.0
    }
}

/// Bake a transform into a stroke's points and clear its offset.
pub fn bake_stroke(stroke: &mut Stroke, transform: &NodeTransform) {
    let affine = transform.to_affine();
    stroke.points = stroke.absolute_points().map(|p| affine * p).collect();
    stroke.x = 0.0;
    stroke.y = 0.0;
}

/// Bake a transform into a shape's stored parameters.
pub fn bake_shape(shape: &mut Shape, transform: &NodeTransform) {
    let rotation = shape.rotation;
    shape.rotation = shape.kind.bake(rotation, transform);
}
