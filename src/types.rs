//! Core view-engine types shared across all modules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

/// A 2D point, in either world or screen space depending on context.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

// ---------------------------------------------------------------------------
// View coordinate
// ---------------------------------------------------------------------------

/// The viewport's position in world space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    /// Center x, world space.
    pub cx: f64,
    /// Center y, world space.
    pub cy: f64,
    /// Power-of-two zoom level: the viewport's long side spans `2^scale`
    /// world units, so raising `scale` by one halves apparent size.
    pub scale: f64,
    /// Transient zoom direction hint (`-1`, `0`, `1`) recorded by the last
    /// `set_scale` call. Consumed only to bias the final interpolation
    /// frame; cleared on `render()`.
    pub zoom: i8,
}

impl Coordinates {
    pub fn new(cx: f64, cy: f64, scale: f64) -> Self {
        Self {
            cx,
            cy,
            scale,
            zoom: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Viewport geometry
// ---------------------------------------------------------------------------

/// Physical viewport dimensions plus device pixel ratio.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    /// Physical width in device pixels.
    pub width: f64,
    /// Physical height in device pixels.
    pub height: f64,
    /// Device pixel ratio (logical size = physical / resolution).
    pub resolution: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, resolution: f64) -> Self {
        Self {
            width,
            height,
            resolution,
        }
    }

    pub fn logical_width(&self) -> f64 {
        self.width / self.resolution
    }

    pub fn logical_height(&self) -> f64 {
        self.height / self.resolution
    }

    /// Logical center, screen space.
    pub fn center(&self) -> Point {
        Point::new(self.logical_width() / 2.0, self.logical_height() / 2.0)
    }

    pub fn long_side(&self) -> f64 {
        self.logical_width().max(self.logical_height())
    }

    pub fn short_side(&self) -> f64 {
        self.logical_width().min(self.logical_height())
    }
}

// ---------------------------------------------------------------------------
// Engine config
// ---------------------------------------------------------------------------

/// Engine tuning table. Validated once at [`WorldModel`] construction —
/// a malformed table is a programmer error and fails fast.
///
/// [`WorldModel`]: crate::world::WorldModel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Frames a position change takes to settle (1000 ms at 60 fps).
    pub latency_frames: u32,
    /// Half-extent of the world plane; bounds are `[-radius, radius]²`.
    pub world_radius: f64,
    /// Minimum zoom level.
    pub min_scale: f64,
    /// Maximum zoom level for a square viewport. Non-square viewports get
    /// `log2(long/short)` extra headroom.
    pub base_max_scale: f64,
    /// Zoom level a fresh view starts at.
    pub default_scale: f64,
    /// Screen-space radius within which the cursor snaps to a rail node.
    pub cursor_snap_px: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            latency_frames: 60,
            world_radius: 65_536.0,
            min_scale: 0.0,
            base_max_scale: 16.0,
            default_scale: 10.0,
            cursor_snap_px: 20.0,
        }
    }
}

impl ViewConfig {
    /// Reject tables no amount of clamping could make sense of.
    pub fn validate(&self) -> Result<(), ViewError> {
        if self.latency_frames == 0 {
            return Err(ViewError::InvalidConfig("latency_frames must be > 0"));
        }
        if !self.world_radius.is_finite() || self.world_radius <= 0.0 {
            return Err(ViewError::InvalidConfig("world_radius must be > 0"));
        }
        if self.min_scale > self.base_max_scale {
            return Err(ViewError::InvalidConfig("min_scale exceeds base_max_scale"));
        }
        if self.default_scale < self.min_scale || self.default_scale > self.base_max_scale {
            return Err(ViewError::InvalidConfig("default_scale outside scale range"));
        }
        if !self.cursor_snap_px.is_finite() || self.cursor_snap_px < 0.0 {
            return Err(ViewError::InvalidConfig("cursor_snap_px must be finite and >= 0"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Broadcast context
// ---------------------------------------------------------------------------

/// Transform parameters handed down to containers on merges, broadcasts
/// and ticks.
#[derive(Debug, Clone, Copy)]
pub struct ViewContext {
    pub coord: Coordinates,
    pub viewport: Viewport,
    pub latency_frames: u32,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A partial snapshot as dispatched by the transport layer: per-kind lists
/// of plain property bags. Unknown kinds and unknown properties are
/// ignored; absence of an id the engine already holds does *not* mean
/// deletion — that arrives through [`WorldModel::remove`].
///
/// [`WorldModel::remove`]: crate::world::WorldModel::remove
pub type Snapshot = HashMap<String, Vec<serde_json::Value>>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// The only fatal error category: a malformed configuration table at
/// construction time. Everything the wire can throw at the engine degrades
/// gracefully instead.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("invalid view config: {0}")]
    InvalidConfig(&'static str),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
