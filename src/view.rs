//! Zoom and pan of the image view.
//!
//! The view shows either the whole image ("fit") or one zoom rectangle in
//! scene coordinates (image pixels). Zooming shrinks or grows that rectangle
//! about its own center; the front end fits whatever rectangle is current into
//! its viewport with [`Fit`], keeping the aspect ratio.

use crate::constants::ZOOM_FACTOR;

const EPSILON: f64 = 1e-6;

/// Axis-aligned rectangle in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Same center, width and height divided by `factor`.
    pub fn scaled_about_center(&self, factor: f64) -> Rect {
        let (cx, cy) = self.center();
        let width = self.width / factor;
        let height = self.height / factor;
        Rect::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Overlap of two rectangles; empty (zero-sized) when they don't overlap.
    pub fn intersected(&self, other: &Rect) -> Rect {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);
        if x2 <= x1 || y2 <= y1 {
            return Rect::new(x1, y1, 0.0, 0.0);
        }
        Rect::new(x1, y1, x2 - x1, y2 - y1)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Equality within floating-point tolerance.
    pub fn approx_eq(&self, other: &Rect) -> bool {
        (self.x - other.x).abs() < EPSILON
            && (self.y - other.y).abs() < EPSILON
            && (self.width - other.width).abs() < EPSILON
            && (self.height - other.height).abs() < EPSILON
    }
}

/// Zoom state of the view.
///
/// At most one zoom rectangle is kept: zooming in again replaces it, so the
/// zoom depth is always 0 ("fit") or 1.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewTransform {
    scene: Rect,
    zoom: Option<Rect>,
    factor: f64,
}

impl ViewTransform {
    /// Fit view of a `width` x `height` image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            scene: Rect::new(0.0, 0.0, f64::from(width), f64::from(height)),
            zoom: None,
            factor: ZOOM_FACTOR,
        }
    }

    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    pub fn scene(&self) -> Rect {
        self.scene
    }

    /// The zoom rectangle, `None` when fitting the whole image.
    pub fn zoom_rect(&self) -> Option<Rect> {
        self.zoom
    }

    /// Number of zoom rectangles held (0 or 1).
    pub fn depth(&self) -> usize {
        usize::from(self.zoom.is_some())
    }

    pub fn is_fit(&self) -> bool {
        self.zoom.is_none()
    }

    /// The rectangle to fit into the viewport.
    pub fn visible_rect(&self) -> Rect {
        self.zoom.unwrap_or(self.scene)
    }

    /// Back to "fit whole image".
    pub fn reset(&mut self) {
        self.zoom = None;
    }

    /// Wheel step: positive deltas zoom in, others zoom out.
    pub fn wheel(&mut self, delta_y: f64) {
        if delta_y > 0.0 {
            self.zoom_in();
        } else {
            self.zoom_out();
        }
    }

    pub fn zoom_in(&mut self) {
        let current = self.visible_rect();
        let zoomed = current.scaled_about_center(self.factor).intersected(&self.scene);
        if zoomed.is_empty() {
            return;
        }
        log::debug!("🔍 Zoom in to {:?}", zoomed);
        self.zoom = Some(zoomed);
    }

    /// Grow the zoom rectangle; reaching the whole scene returns to fit.
    pub fn zoom_out(&mut self) {
        let Some(current) = self.zoom else {
            return;
        };
        let zoomed = current
            .scaled_about_center(1.0 / self.factor)
            .intersected(&self.scene);
        if zoomed.approx_eq(&self.scene) {
            log::debug!("🔍 Zoom out to fit");
            self.zoom = None;
        } else {
            log::debug!("🔍 Zoom out to {:?}", zoomed);
            self.zoom = Some(zoomed);
        }
    }

    /// Move the zoom rectangle by a scene-space delta. No-op at fit.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        if let Some(current) = self.zoom {
            let moved = current.translated(dx, dy).intersected(&self.scene);
            if !moved.is_empty() {
                self.zoom = Some(moved);
            }
        }
    }

    /// Fit of the visible rectangle into a viewport.
    pub fn fit(&self, viewport_width: f64, viewport_height: f64) -> Fit {
        Fit::new(self.visible_rect(), viewport_width, viewport_height)
    }
}

/// Aspect-preserving mapping of a scene rectangle into a viewport, centered
/// along the axis with spare room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Fit {
    pub fn new(rect: Rect, viewport_width: f64, viewport_height: f64) -> Self {
        if rect.is_empty() || viewport_width <= 0.0 || viewport_height <= 0.0 {
            return Self {
                scale: 1.0,
                offset_x: -rect.x,
                offset_y: -rect.y,
            };
        }
        let scale = (viewport_width / rect.width).min(viewport_height / rect.height);
        Self {
            scale,
            offset_x: (viewport_width - rect.width * scale) / 2.0 - rect.x * scale,
            offset_y: (viewport_height - rect.height * scale) / 2.0 - rect.y * scale,
        }
    }

    pub fn scene_to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.scale + self.offset_x, y * self.scale + self.offset_y)
    }

    pub fn screen_to_scene(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.offset_x) / self.scale, (y - self.offset_y) / self.scale)
    }
}

/// Secondary-button drag that pans the view.
///
/// Dragging right moves the visible region left, so the image follows the
/// pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanDrag {
    last: (f64, f64),
}

impl PanDrag {
    /// Start a drag at a screen position.
    pub fn begin(screen_x: f64, screen_y: f64) -> Self {
        Self {
            last: (screen_x, screen_y),
        }
    }

    /// Apply the movement since the last event to `view`.
    pub fn drag_to(&mut self, view: &mut ViewTransform, fit: &Fit, screen_x: f64, screen_y: f64) {
        let dx = (screen_x - self.last.0) / fit.scale;
        let dy = (screen_y - self.last.1) / fit.scale;
        self.last = (screen_x, screen_y);
        view.pan(-dx, -dy);
    }
}
