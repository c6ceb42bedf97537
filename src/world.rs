//! The composition root: one [`WorldModel`] owns the viewport controller,
//! the per-kind containers, the cursor, and the reference resolver.
//!
//! Two logical clocks drive it, both through `&mut self` (so a merge can
//! never interleave with a frame tick):
//!
//! ```text
//! network clock ──► merge_all(snapshot) ──► Container::merge_children
//!                                            └─► resolve_graph
//! frame clock   ──► tick() ──► Motion::smooth_move + eviction sweep
//!               ──► render() ──► before_render + changed-flag reset
//! ```

use log::debug;

use crate::container::Container;
use crate::cursor::Cursor;
use crate::entity::{Entity, LifecycleState, Schema};
use crate::kinds::{Company, Player, RailEdge, RailNode, Residence, Station};
use crate::resolve::{resolve_graph, ResolutionReport};
use crate::types::{Point, Snapshot, ViewConfig, ViewContext, ViewError, Viewport};
use crate::viewport::ViewportController;

/// Registered snapshot kinds, in merge (and z-) order. Anything else in a
/// snapshot is silently ignored — the server is allowed to grow new kinds
/// before this client learns to draw them.
pub const KINDS: [&str; 6] = [
    Residence::KIND,
    Company::KIND,
    Station::KIND,
    RailNode::KIND,
    RailEdge::KIND,
    Player::KIND,
];

// ---------------------------------------------------------------------------
// Merge report
// ---------------------------------------------------------------------------

/// What one `merge_all` call did. Returned to the dispatch layer; the
/// resolution report is surfaced to diagnostics, never thrown.
#[derive(Debug)]
pub struct MergeReport {
    /// Whether anything visible has changed since the last `render()`.
    pub changed: bool,
    /// Malformed records (non-object, missing id) dropped by containers.
    pub skipped: usize,
    /// Per-field reference resolution outcomes.
    pub resolution: ResolutionReport,
}

// ---------------------------------------------------------------------------
// Uniform entity projection
// ---------------------------------------------------------------------------

/// Read-only projection of one entity for point lookups from the UI.
/// Callers needing full kind-specific fields use the typed container
/// accessors instead.
#[derive(Debug, Clone, Copy)]
pub struct EntityView<'a> {
    pub id: &'a str,
    pub kind: &'static str,
    pub state: LifecycleState,
    /// World position, for spatial kinds.
    pub position: Option<Point>,
    /// Interpolated screen position this frame.
    pub current: Point,
    /// Screen position the entity is easing toward.
    pub destination: Point,
}

fn view<S: Schema>(entity: &Entity<S>) -> EntityView<'_> {
    EntityView {
        id: entity.id(),
        kind: S::KIND,
        state: entity.state(),
        position: entity.props.position(),
        current: entity.motion.current,
        destination: entity.motion.destination,
    }
}

// ---------------------------------------------------------------------------
// World model
// ---------------------------------------------------------------------------

pub struct WorldModel {
    config: ViewConfig,
    viewport: ViewportController,
    residences: Container<Residence>,
    companies: Container<Company>,
    stations: Container<Station>,
    rail_nodes: Container<RailNode>,
    rail_edges: Container<RailEdge>,
    players: Container<Player>,
    cursor: Cursor,
    changed: bool,
    animating: usize,
}

impl WorldModel {
    /// Build the engine. The config table is the one thing allowed to
    /// fail, and it fails here, fast — bad wire data later never will.
    pub fn new(config: ViewConfig, viewport: Viewport) -> Result<Self, ViewError> {
        config.validate()?;
        let viewport = ViewportController::new(&config, viewport);
        Ok(Self {
            config,
            viewport,
            residences: Container::new(),
            companies: Container::new(),
            stations: Container::new(),
            rail_nodes: Container::new(),
            rail_edges: Container::new(),
            players: Container::new(),
            cursor: Cursor::new(),
            changed: false,
            animating: 0,
        })
    }

    fn ctx(&self) -> ViewContext {
        self.viewport.context(self.config.latency_frames)
    }

    // -----------------------------------------------------------------------
    // Network clock: merge
    // -----------------------------------------------------------------------

    /// Reconcile one partial snapshot: delegate each registered kind to
    /// its container, resolve the rail graph, refresh the cursor
    /// attachment. Synchronous and atomic with respect to rendering.
    pub fn merge_all(&mut self, snapshot: &Snapshot) -> MergeReport {
        let ctx = self.ctx();
        let mut skipped = 0;

        for kind in KINDS {
            let Some(records) = snapshot.get(kind) else {
                continue;
            };
            skipped += match kind {
                k if k == Residence::KIND => self.residences.merge_children(records, &ctx),
                k if k == Company::KIND => self.companies.merge_children(records, &ctx),
                k if k == Station::KIND => self.stations.merge_children(records, &ctx),
                k if k == RailNode::KIND => self.rail_nodes.merge_children(records, &ctx),
                k if k == RailEdge::KIND => self.rail_edges.merge_children(records, &ctx),
                k if k == Player::KIND => self.players.merge_children(records, &ctx),
                _ => 0,
            };
        }

        let resolution = resolve_graph(&mut self.rail_nodes, &mut self.rail_edges);
        self.cursor
            .refresh_selection(&ctx, &self.rail_nodes, self.config.cursor_snap_px);
        self.collect_changed();

        if !resolution.is_clean() {
            debug!(
                "merge left {} unresolved reference(s)",
                resolution.dangling_count()
            );
        }

        MergeReport {
            changed: self.changed,
            skipped,
            resolution,
        }
    }

    /// The explicit deletion channel (destroy acknowledgment from the
    /// server). Marks the entity Ending; eviction happens once its exit
    /// interpolation settles. Absence from a snapshot never triggers
    /// this.
    pub fn remove(&mut self, kind: &str, id: &str) -> bool {
        let removed = match kind {
            k if k == Residence::KIND => self.residences.mark_ending(id),
            k if k == Company::KIND => self.companies.mark_ending(id),
            k if k == Station::KIND => self.stations.mark_ending(id),
            k if k == RailNode::KIND => self.rail_nodes.mark_ending(id),
            k if k == RailEdge::KIND => self.rail_edges.mark_ending(id),
            k if k == Player::KIND => self.players.mark_ending(id),
            _ => false,
        };
        if removed {
            self.changed = true;
        }
        removed
    }

    // -----------------------------------------------------------------------
    // Viewport gestures
    // -----------------------------------------------------------------------

    /// Pan. `force` snaps entities instead of easing them — used while
    /// the user is actively dragging, when smooth motion would lag the
    /// hand.
    pub fn set_center(&mut self, x: f64, y: f64, force: bool) {
        if self.viewport.set_center(x, y) {
            self.broadcast_coord(force);
        }
    }

    /// Zoom. Same force semantics as [`set_center`](Self::set_center).
    pub fn set_scale(&mut self, v: f64, force: bool) {
        if self.viewport.set_scale(v) {
            self.broadcast_coord(force);
        }
    }

    /// Viewport dimensions changed. Broadcasts a resize — destinations
    /// are recomputed but no fresh interpolation latency is granted.
    pub fn resize(&mut self, width: f64, height: f64, resolution: f64) {
        if self.viewport.resize(width, height, resolution) {
            let ctx = self.ctx();
            self.residences.broadcast_resize(&ctx);
            self.companies.broadcast_resize(&ctx);
            self.stations.broadcast_resize(&ctx);
            self.rail_nodes.broadcast_resize(&ctx);
            self.rail_edges.broadcast_resize(&ctx);
            self.players.broadcast_resize(&ctx);
            self.cursor.on_resize(&ctx, &self.rail_nodes);
            self.collect_changed();
        }
    }

    fn broadcast_coord(&mut self, force: bool) {
        let ctx = self.ctx();
        self.residences.broadcast_coord(&ctx, force);
        self.companies.broadcast_coord(&ctx, force);
        self.stations.broadcast_coord(&ctx, force);
        self.rail_nodes.broadcast_coord(&ctx, force);
        self.rail_edges.broadcast_coord(&ctx, force);
        self.players.broadcast_coord(&ctx, force);
        self.cursor
            .on_coord(&ctx, &self.rail_nodes, self.config.cursor_snap_px);
        self.collect_changed();
    }

    // -----------------------------------------------------------------------
    // Cursor input
    // -----------------------------------------------------------------------

    /// Pointer moved (screen space).
    pub fn set_cursor_client(&mut self, x: f64, y: f64) {
        let ctx = self.ctx();
        self.cursor.set_client(
            Point::new(x, y),
            &ctx,
            &self.rail_nodes,
            self.config.cursor_snap_px,
        );
        self.changed = true;
    }

    pub fn set_cursor_visible(&mut self, visible: bool) {
        if self.cursor.set_visible(visible) {
            self.changed = true;
        }
    }

    // -----------------------------------------------------------------------
    // Frame clock
    // -----------------------------------------------------------------------

    /// Advance one display frame: every in-flight interpolation moves,
    /// and Ending entities whose exit animation settled are evicted.
    pub fn tick(&mut self) {
        let ctx = self.ctx();
        let mut animating = 0;
        animating += self.residences.tick(&ctx);
        animating += self.companies.tick(&ctx);
        animating += self.stations.tick(&ctx);
        animating += self.rail_nodes.tick(&ctx);
        animating += self.rail_edges.tick(&ctx);
        animating += self.players.tick(&ctx);
        animating += usize::from(self.cursor.tick(&ctx));
        self.animating = animating;
        self.collect_changed();
    }

    /// Hand the frame to the draw step: snapshot every interpolated
    /// position, then clear the diff flags and the transient zoom hint.
    /// Calling this when nothing changed is a harmless no-op.
    pub fn render(&mut self) {
        self.residences.before_render_all();
        self.companies.before_render_all();
        self.stations.before_render_all();
        self.rail_nodes.before_render_all();
        self.rail_edges.before_render_all();
        self.players.before_render_all();
        self.cursor.before_render();

        self.residences.reset();
        self.companies.reset();
        self.stations.reset();
        self.rail_nodes.reset();
        self.rail_edges.reset();
        self.players.reset();
        self.viewport.clear_zoom_hint();
        self.changed = false;
    }

    /// True when anything visible changed since the last `render()`.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// True while any entity is still easing toward its destination.
    pub fn is_animating(&self) -> bool {
        self.animating > 0
    }

    fn collect_changed(&mut self) {
        self.changed = self.changed
            || self.residences.is_changed()
            || self.companies.is_changed()
            || self.stations.is_changed()
            || self.rail_nodes.is_changed()
            || self.rail_edges.is_changed()
            || self.players.is_changed();
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// Point lookup for UI overlays. Unregistered kinds return `None`
    /// rather than failing.
    pub fn get(&self, kind: &str, id: &str) -> Option<EntityView<'_>> {
        match kind {
            k if k == Residence::KIND => self.residences.get(id).map(view),
            k if k == Company::KIND => self.companies.get(id).map(view),
            k if k == Station::KIND => self.stations.get(id).map(view),
            k if k == RailNode::KIND => self.rail_nodes.get(id).map(view),
            k if k == RailEdge::KIND => self.rail_edges.get(id).map(view),
            k if k == Player::KIND => self.players.get(id).map(view),
            _ => None,
        }
    }

    pub fn residences(&self) -> &Container<Residence> {
        &self.residences
    }

    pub fn companies(&self) -> &Container<Company> {
        &self.companies
    }

    pub fn stations(&self) -> &Container<Station> {
        &self.stations
    }

    pub fn rail_nodes(&self) -> &Container<RailNode> {
        &self.rail_nodes
    }

    pub fn rail_edges(&self) -> &Container<RailEdge> {
        &self.rail_edges
    }

    pub fn players(&self) -> &Container<Player> {
        &self.players
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    /// Total live entities across all containers.
    pub fn entity_count(&self) -> usize {
        self.residences.len()
            + self.companies.len()
            + self.stations.len()
            + self.rail_nodes.len()
            + self.rail_edges.len()
            + self.players.len()
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Release everything in reverse creation order — later containers
    /// hold resolved references into earlier ones — and cancel all
    /// pending interpolation.
    pub fn unmount(&mut self) {
        self.players.end_all();
        self.rail_edges.end_all();
        self.rail_nodes.end_all();
        self.stations.end_all();
        self.companies.end_all();
        self.residences.end_all();
        self.cursor.end();
        self.changed = false;
        self.animating = 0;
        debug!("world model unmounted");
    }
}
