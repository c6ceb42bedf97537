//! The cursor model: a locally-driven pointer that lives in the same
//! interpolated world as server entities.
//!
//! The pointer reports screen positions; the cursor derives the world
//! position under it and, when close enough, snaps to a rail node
//! (attachment). While attached its destination is the node's position,
//! so UI affordances like the extend-rail anchor track the node, not the
//! raw pointer.

use crate::container::Container;
use crate::entity::Schema;
use crate::kinds::RailNode;
use crate::motion::Motion;
use crate::transform::{to_screen, to_world};
use crate::types::{Point, ViewContext};

#[derive(Debug, Default)]
pub struct Cursor {
    /// Raw pointer position, screen space.
    client: Point,
    /// World position under the pointer; `None` until the pointer has
    /// entered the viewport.
    pos: Option<Point>,
    /// Rail node the cursor is currently snapped to.
    selected: Option<String>,
    visible: bool,
    pub motion: Motion,
    drawn: Point,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn world_pos(&self) -> Option<Point> {
        self.pos
    }

    /// Id of the rail node the cursor is snapped to, if any. Surfaced to
    /// the UI for anchor display.
    pub fn selection(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the cursor; returns true when the value flipped.
    pub fn set_visible(&mut self, visible: bool) -> bool {
        if self.visible == visible {
            return false;
        }
        self.visible = visible;
        true
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// The pointer moved. Pointer motion is forced — easing a cursor
    /// behind the user's hand would be misleading.
    pub fn set_client(
        &mut self,
        client: Point,
        ctx: &ViewContext,
        nodes: &Container<RailNode>,
        snap_px: f64,
    ) {
        self.client = client;
        self.pos = Some(to_world(client, &ctx.coord, &ctx.viewport));
        self.reselect(ctx, nodes, snap_px);
        self.motion.force_move(self.destination(ctx, nodes));
    }

    /// The view coordinate changed under a stationary pointer: the world
    /// position beneath it moves, and the cursor eases to its new spot.
    /// No-op until the pointer has entered the viewport.
    pub fn on_coord(&mut self, ctx: &ViewContext, nodes: &Container<RailNode>, snap_px: f64) {
        if self.pos.is_none() {
            return;
        }
        self.pos = Some(to_world(self.client, &ctx.coord, &ctx.viewport));
        self.reselect(ctx, nodes, snap_px);
        self.motion
            .retarget(self.destination(ctx, nodes), ctx.latency_frames);
    }

    /// The viewport resized: recompute without fresh latency.
    pub fn on_resize(&mut self, ctx: &ViewContext, nodes: &Container<RailNode>) {
        if self.pos.is_some() {
            self.motion
                .retarget_preserving_latency(self.destination(ctx, nodes));
        }
    }

    /// A merge may have created or removed the node the cursor is snapped
    /// to; re-derive the attachment.
    pub fn refresh_selection(
        &mut self,
        ctx: &ViewContext,
        nodes: &Container<RailNode>,
        snap_px: f64,
    ) {
        let before = self.selected.clone();
        self.reselect(ctx, nodes, snap_px);
        if self.selected != before {
            self.motion
                .retarget(self.destination(ctx, nodes), ctx.latency_frames);
        }
    }

    // -----------------------------------------------------------------------
    // Attachment
    // -----------------------------------------------------------------------

    /// Snap to the nearest rail node within `snap_px` of the pointer, or
    /// detach when none qualifies.
    fn reselect(&mut self, ctx: &ViewContext, nodes: &Container<RailNode>, snap_px: f64) {
        if self.pos.is_none() {
            self.selected = None;
            return;
        }

        let mut best: Option<(&str, f64)> = None;
        for node in nodes.iter() {
            let Some(world) = node.props.position() else {
                continue;
            };
            let screen = to_screen(world, &ctx.coord, &ctx.viewport);
            let dx = screen.x - self.client.x;
            let dy = screen.y - self.client.y;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist <= snap_px && best.map_or(true, |(_, d)| dist < d) {
                best = Some((node.id(), dist));
            }
        }
        self.selected = best.map(|(id, _)| id.to_string());
    }

    /// Attached: follow the node. Detached: follow the pointer.
    fn destination(&self, ctx: &ViewContext, nodes: &Container<RailNode>) -> Point {
        if let Some(node) = self.selected.as_deref().and_then(|id| nodes.get(id)) {
            return to_screen(
                Point::new(node.props.x, node.props.y),
                &ctx.coord,
                &ctx.viewport,
            );
        }
        self.client
    }

    // -----------------------------------------------------------------------
    // Frame tick / draw
    // -----------------------------------------------------------------------

    /// Advance one frame; returns true while still animating.
    pub fn tick(&mut self, ctx: &ViewContext) -> bool {
        if self.motion.settled() {
            return false;
        }
        self.motion.smooth_move(ctx.latency_frames, ctx.coord.zoom);
        !self.motion.settled()
    }

    pub fn before_render(&mut self) {
        self.drawn = self.motion.current;
    }

    pub fn drawn(&self) -> Point {
        self.drawn
    }

    /// Unmount: detach and cancel pending interpolation.
    pub fn end(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
