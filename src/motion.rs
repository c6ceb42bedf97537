//! Per-entity temporal interpolation.
//!
//! Snapshots arrive at server tick rate (sparse); the screen refreshes at
//! display rate (dense). [`Motion`] decouples the two: a destination
//! change starts a fixed-frame ease toward the new screen position, and
//! each frame tick advances `current` without any further input from the
//! network.

use crate::types::Point;

/// Interpolation state for one positional entity.
///
/// Invariants: `frames_remaining` only decreases between destination
/// updates, and `current == destination` exactly once settled (the final
/// frame snaps, so no floating drift accumulates).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Motion {
    /// Where the entity is drawn this frame, screen space.
    pub current: Point,
    /// Where the entity is headed, screen space.
    pub destination: Point,
    frames_remaining: u32,
}

impl Motion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settled(&self) -> bool {
        self.frames_remaining == 0
    }

    /// Begin easing toward `dest` over `latency` frames. The in-flight
    /// `current` position becomes the new animation start, so a merge
    /// landing mid-animation produces no discontinuity.
    pub fn retarget(&mut self, dest: Point, latency: u32) {
        self.destination = dest;
        self.frames_remaining = latency;
    }

    /// Move the destination without granting fresh latency (resize
    /// broadcasts: the transform changed, the entity did not). A settled
    /// motion snaps straight to the new destination.
    pub fn retarget_preserving_latency(&mut self, dest: Point) {
        self.destination = dest;
        if self.frames_remaining == 0 {
            self.current = dest;
        }
    }

    /// Bypass interpolation entirely (viewport drag, teleport, creation —
    /// cases where smooth motion would be misleading).
    pub fn force_move(&mut self, dest: Point) {
        self.destination = dest;
        self.current = dest;
        self.frames_remaining = 0;
    }

    /// Advance one display frame.
    ///
    /// The blend ratio is folded into the second half of the curve
    /// (`ratio < 0.5 → 1 - ratio`), which turns the linear countdown into
    /// an ease-in/ease-out. A nonzero `zoom_hint` finishes the last frame
    /// by snapping instead of blending the final half-step.
    pub fn smooth_move(&mut self, latency: u32, zoom_hint: i8) {
        if self.frames_remaining == 0 {
            self.current = self.destination;
            return;
        }

        let mut ratio = f64::from(self.frames_remaining) / f64::from(latency.max(1));
        if ratio < 0.5 {
            ratio = 1.0 - ratio;
        }
        self.current.x = self.current.x * ratio + self.destination.x * (1.0 - ratio);
        self.current.y = self.current.y * ratio + self.destination.y * (1.0 - ratio);
        self.frames_remaining -= 1;

        if self.frames_remaining == 0 || (self.frames_remaining == 1 && zoom_hint != 0) {
            self.current = self.destination;
            self.frames_remaining = 0;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
