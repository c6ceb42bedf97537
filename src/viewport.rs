//! Viewport controller: owns the view coordinate, clamps pan and zoom
//! against the world bounds, and tells the composition root which kind of
//! broadcast (if any) a change requires.
//!
//! All out-of-range input is clamped silently; none of these operations
//! can fail.

use log::debug;

use crate::types::{Coordinates, Point, ViewConfig, ViewContext, Viewport};

#[derive(Debug)]
pub struct ViewportController {
    coord: Coordinates,
    viewport: Viewport,
    world_radius: f64,
    min_scale: f64,
    base_max_scale: f64,
}

impl ViewportController {
    pub fn new(config: &ViewConfig, viewport: Viewport) -> Self {
        Self {
            coord: Coordinates::new(0.0, 0.0, config.default_scale),
            viewport,
            world_radius: config.world_radius,
            min_scale: config.min_scale,
            base_max_scale: config.base_max_scale,
        }
    }

    pub fn coord(&self) -> Coordinates {
        self.coord
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn context(&self, latency_frames: u32) -> ViewContext {
        ViewContext {
            coord: self.coord,
            viewport: self.viewport,
            latency_frames,
        }
    }

    /// Square viewports top out at the base maximum; non-square ones get
    /// `log2(long/short)` extra headroom along the long axis.
    pub fn max_scale(&self) -> f64 {
        self.base_max_scale + (self.viewport.long_side() / self.viewport.short_side()).log2()
    }

    // -----------------------------------------------------------------------
    // Center
    // -----------------------------------------------------------------------

    /// Move the view center. Returns true when the (clamped) center
    /// actually changed — the caller owes a coord broadcast; a no-op
    /// short-circuits without one.
    pub fn set_center(&mut self, x: f64, y: f64) -> bool {
        let Point { x, y } = self.clamp_center(x, y);
        if self.coord.cx == x && self.coord.cy == y {
            return false;
        }
        self.coord.cx = x;
        self.coord.cy = y;
        debug!("view center -> ({x:.1}, {y:.1})");
        true
    }

    /// Clamp a center candidate so the visible rectangle stays inside the
    /// world bounds. Once the scale exceeds the base maximum the long
    /// axis no longer fits at all, so its center is pinned to 0.
    fn clamp_center(&self, x: f64, y: f64) -> Point {
        let aspect = self.viewport.short_side() / self.viewport.long_side();
        let short_radius = (self.coord.scale - 1.0 + aspect.log2()).exp2();
        let long_radius = (self.coord.scale - 1.0).exp2();
        let portrait = self.viewport.logical_width() < self.viewport.logical_height();
        let (x_radius, y_radius) = if portrait {
            (short_radius, long_radius)
        } else {
            (long_radius, short_radius)
        };

        let min = -self.world_radius;
        let max = self.world_radius;

        let mut x = x;
        let mut y = y;
        if x - x_radius < min {
            x = min + x_radius;
        }
        if x + x_radius > max {
            x = max - x_radius;
        }
        if y - y_radius < min {
            y = min + y_radius;
        }
        if y + y_radius > max {
            y = max - y_radius;
        }

        if self.coord.scale > self.base_max_scale {
            if portrait {
                y = 0.0;
            } else {
                x = 0.0;
            }
        }

        Point::new(x, y)
    }

    // -----------------------------------------------------------------------
    // Scale
    // -----------------------------------------------------------------------

    /// Change the zoom level. Clamps into `[min_scale, max_scale()]`,
    /// records the zoom direction hint, and returns true when the scale
    /// actually changed.
    pub fn set_scale(&mut self, v: f64) -> bool {
        let old = self.coord.scale;
        let v = v.clamp(self.min_scale, self.max_scale());

        self.coord.zoom = if v < old {
            1
        } else if v > old {
            -1
        } else {
            0
        };
        if self.coord.scale == v {
            return false;
        }
        self.coord.scale = v;
        debug!("view scale -> {v:.2} (hint {})", self.coord.zoom);

        // The new scale may leave the old center outside its tighter
        // clamping radii; re-apply.
        let Point { x, y } = self.clamp_center(self.coord.cx, self.coord.cy);
        self.coord.cx = x;
        self.coord.cy = y;
        true
    }

    /// The zoom hint is transient; the composition root clears it once
    /// the frame that consumed it has rendered.
    pub fn clear_zoom_hint(&mut self) {
        self.coord.zoom = 0;
    }

    // -----------------------------------------------------------------------
    // Resize
    // -----------------------------------------------------------------------

    /// Update the viewport dimensions. Returns true when they changed —
    /// the caller owes a *resize* broadcast, distinct from a coord
    /// broadcast: entities recompute their transform-dependent visuals
    /// without being granted fresh interpolation latency.
    pub fn resize(&mut self, width: f64, height: f64, resolution: f64) -> bool {
        let next = Viewport::new(width, height, resolution);
        if next == self.viewport {
            return false;
        }
        self.viewport = next;
        // A narrower aspect can shrink the allowed scale range, and the
        // new aspect may swap which axis carries the long clamping radius;
        // re-apply both.
        self.coord.scale = self.coord.scale.clamp(self.min_scale, self.max_scale());
        let Point { x, y } = self.clamp_center(self.coord.cx, self.coord.cy);
        self.coord.cx = x;
        self.coord.cy = y;
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
