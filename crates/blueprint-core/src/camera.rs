//! Camera module for pan/zoom transforms.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Default lower zoom bound.
pub const MIN_ZOOM: f64 = 0.2;
/// Default upper zoom bound.
pub const MAX_ZOOM: f64 = 4.0;
/// Zoom multiplier per wheel notch.
pub const WHEEL_ZOOM_STEP: f64 = 1.1;

/// Camera manages the view transform for the canvas.
///
/// World → screen is `screen = world * zoom + offset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan), in screen pixels.
    pub offset: Vec2,
    /// Current zoom level (1.0 = 100%).
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Camera with custom zoom bounds.
    pub fn with_bounds(min_zoom: f64, max_zoom: f64) -> Self {
        Self {
            min_zoom,
            max_zoom,
            zoom: 1.0_f64.clamp(min_zoom, max_zoom),
            ..Self::default()
        }
    }

    /// World → screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Screen → world transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Convert a screen-pixel distance into world units.
    pub fn screen_to_world_distance(&self, pixels: f64) -> f64 {
        pixels / self.zoom
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Set the zoom, keeping the given screen point fixed.
    ///
    /// `new_offset = p - (p - old_offset) / old_zoom * new_zoom`
    pub fn set_zoom_at(&mut self, screen_point: Point, zoom: f64) {
        let new_zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }
        let p = screen_point.to_vec2();
        self.offset = p - (p - self.offset) / self.zoom * new_zoom;
        self.zoom = new_zoom;
    }

    /// Zoom by a factor, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        self.set_zoom_at(screen_point, self.zoom * factor);
    }

    /// Zoom for a wheel delta (negative y = away from the user = zoom in).
    pub fn wheel_zoom(&mut self, screen_point: Point, delta_y: f64) {
        if delta_y == 0.0 {
            return;
        }
        let factor = if delta_y < 0.0 {
            WHEEL_ZOOM_STEP
        } else {
            1.0 / WHEEL_ZOOM_STEP
        };
        self.zoom_at(screen_point, factor);
    }

    /// Reset camera to default position and zoom.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0_f64.clamp(self.min_zoom, self.max_zoom);
    }

    /// Fit the camera to show the given bounding box.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        if bounds.is_zero_area() {
            self.reset();
            return;
        }

        let padded = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        let scale_x = padded.width / bounds.width();
        let scale_y = padded.height / bounds.height();
        self.zoom = scale_x.min(scale_y).clamp(self.min_zoom, self.max_zoom);

        // Center the bounds in the viewport
        let bounds_center = bounds.center();
        self.offset = Vec2::new(
            viewport.width / 2.0 - bounds_center.x * self.zoom,
            viewport.height / 2.0 - bounds_center.y * self.zoom,
        );
    }
}
