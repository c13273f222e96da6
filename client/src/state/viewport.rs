//! Pan/zoom state for the local canvas.
//!
//! Cursor positions go on the wire in world coordinates, so the screen
//! position of the pointer is converted here before broadcast.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use frames::Point;

/// Smallest zoom accepted by [`Viewport::set_zoom`].
pub const MIN_ZOOM: f64 = 0.1;
/// Largest zoom accepted by [`Viewport::set_zoom`].
pub const MAX_ZOOM: f64 = 5.0;

/// Viewport offset (screen pixels) and zoom factor. Local to this client.
///
/// Offsets are always finite and `zoom` always lies in `[MIN_ZOOM, MAX_ZOOM]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    x: f64,
    y: f64,
    zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, zoom: 1.0 }
    }
}

impl Viewport {
    /// Viewport at offset `(x, y)`. Zoom is clamped as in [`Viewport::set_zoom`];
    /// non-finite inputs fall back to the default offset or zoom.
    #[must_use]
    pub fn new(x: f64, y: f64, zoom: f64) -> Self {
        let mut viewport = Self::default();
        viewport.pan_by(x, y);
        viewport.set_zoom(zoom);
        viewport
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.y
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Convert a screen-space point to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.x) / self.zoom,
            y: (screen.y - self.y) / self.zoom,
        }
    }

    /// Convert a world-space point to screen coordinates.
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.zoom + self.x,
            y: world.y * self.zoom + self.y,
        }
    }

    /// Shift the offset. A pan that would leave the offset non-finite is ignored.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let (x, y) = (self.x + dx, self.y + dy);
        if x.is_finite() && y.is_finite() {
            self.x = x;
            self.y = y;
        }
    }

    /// Set zoom, clamped to `[MIN_ZOOM, MAX_ZOOM]`. Non-finite values are ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
