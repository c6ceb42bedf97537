//! Entity records: lifecycle state machine, the per-kind schema seam, and
//! the helpers schemas use to fold partial records into typed fields.
//!
//! An entity is exclusively owned by its container. Anything else that
//! needs to point at one holds an id plus a [`Reference`] — never
//! ownership.
//!
//! [`Reference`]: crate::resolve::Reference

use serde_json::{Map, Value};

use crate::motion::Motion;
use crate::transform::{is_outside_cache, to_screen};
use crate::types::{Point, ViewContext};

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle of a reconciled entity. `Removed` is terminal; the container
/// evicts the record in the same sweep that assigns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, defaults applied, first record not yet merged.
    Uninitialized,
    /// Live and drawable.
    Active,
    /// Marked for removal; kept until the exit interpolation settles so
    /// the sprite never pops off screen mid-animation.
    Ending,
    /// Evicted.
    Removed,
}

// ---------------------------------------------------------------------------
// Schema seam
// ---------------------------------------------------------------------------

/// What a merge actually did, per value-equality check — presence of a key
/// alone never counts as a change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeEffect {
    /// Some tracked property changed value.
    pub changed: bool,
    /// The world position specifically changed (triggers retargeting).
    pub moved: bool,
}

impl MergeEffect {
    pub fn field(changed: bool) -> Self {
        Self {
            changed,
            moved: false,
        }
    }

    pub fn position(changed: bool) -> Self {
        Self {
            changed,
            moved: changed,
        }
    }

    pub fn fold(&mut self, other: MergeEffect) {
        self.changed |= other.changed;
        self.moved |= other.moved;
    }
}

/// The closed, typed property set of one entity kind.
///
/// Every kind declares a fixed set of fields and folds incoming records
/// through explicit, change-reporting setters; unknown wire keys are
/// ignored by construction.
pub trait Schema: Default {
    /// Snapshot key this kind answers to (`"rail_nodes"`, …).
    const KIND: &'static str;

    /// Apply the keys present in `record`; ignore everything unknown.
    fn merge_record(&mut self, record: &Map<String, Value>) -> MergeEffect;

    /// World position, for spatial kinds. `None` opts the kind out of
    /// interpolation and cache culling (rail edges derive geometry from
    /// their endpoint nodes instead).
    fn position(&self) -> Option<Point>;
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// One mutable record: id, typed properties, lifecycle, and interpolation
/// state.
#[derive(Debug)]
pub struct Entity<S> {
    id: String,
    state: LifecycleState,
    /// Set by the explicit removal channel. Cache re-entry never clears
    /// it: a destroy-acknowledged entity stays Ending until evicted.
    doomed: bool,
    pub props: S,
    pub motion: Motion,
    drawn: Point,
}

impl<S: Schema> Entity<S> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: LifecycleState::Uninitialized,
            doomed: false,
            props: S::default(),
            motion: Motion::new(),
            drawn: Point::zero(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn activate(&mut self) {
        self.state = LifecycleState::Active;
    }

    /// Explicit removal (destroy acknowledgment): Ending with no way back.
    pub fn begin_ending(&mut self) {
        self.state = LifecycleState::Ending;
        self.doomed = true;
    }

    pub fn mark_removed(&mut self) {
        self.state = LifecycleState::Removed;
    }

    /// Fold a partial record into the typed properties.
    pub fn merge(&mut self, record: &Map<String, Value>) -> MergeEffect {
        self.props.merge_record(record)
    }

    // -----------------------------------------------------------------------
    // Interpolation plumbing
    // -----------------------------------------------------------------------

    /// Recompute the screen destination and start a fresh ease toward it.
    pub fn update_destination(&mut self, ctx: &ViewContext) {
        if let Some(world) = self.props.position() {
            let dest = to_screen(world, &ctx.coord, &ctx.viewport);
            self.motion.retarget(dest, ctx.latency_frames);
        }
    }

    /// Snap straight to the recomputed destination (drag, teleport,
    /// creation).
    pub fn force_move(&mut self, ctx: &ViewContext) {
        if let Some(world) = self.props.position() {
            self.motion.force_move(to_screen(world, &ctx.coord, &ctx.viewport));
        }
    }

    /// Recompute the destination without granting fresh latency (resize).
    pub fn refresh_destination(&mut self, ctx: &ViewContext) {
        if let Some(world) = self.props.position() {
            let dest = to_screen(world, &ctx.coord, &ctx.viewport);
            self.motion.retarget_preserving_latency(dest);
        }
    }

    // -----------------------------------------------------------------------
    // Cache culling
    // -----------------------------------------------------------------------

    /// Apply the cache-radius rule; returns true if the lifecycle state
    /// flipped (Active → Ending on exit, Ending → Active on re-entry).
    /// Only undoes Ending states it assigned itself; explicitly removed
    /// entities never come back.
    pub fn cull(&mut self, ctx: &ViewContext) -> bool {
        let Some(world) = self.props.position() else {
            return false;
        };
        let outside = is_outside_cache(world, &ctx.coord);
        match (self.state, outside) {
            (LifecycleState::Active, true) => {
                self.state = LifecycleState::Ending;
                true
            }
            (LifecycleState::Ending, false) if !self.doomed => {
                self.state = LifecycleState::Active;
                true
            }
            _ => false,
        }
    }

    /// Ready to evict: marked Ending and the exit animation has settled.
    /// Never true while `frames_remaining > 0`.
    pub fn should_evict(&self) -> bool {
        self.state == LifecycleState::Ending && self.motion.settled()
    }

    // -----------------------------------------------------------------------
    // Draw handoff
    // -----------------------------------------------------------------------

    /// Snapshot the interpolated position for the draw step.
    pub fn before_render(&mut self) {
        self.drawn = self.motion.current;
    }

    /// The position the draw step last snapshotted.
    pub fn drawn(&self) -> Point {
        self.drawn
    }
}

// ---------------------------------------------------------------------------
// Record helpers (used by every schema)
// ---------------------------------------------------------------------------

/// Extract an id value: the wire sends numeric ids, the engine keys by
/// string, so both are accepted.
pub(crate) fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Fold a numeric field; reports whether the value actually changed.
pub(crate) fn merge_f64(slot: &mut f64, record: &Map<String, Value>, key: &str) -> bool {
    match record.get(key).and_then(Value::as_f64) {
        Some(v) if *slot != v => {
            *slot = v;
            true
        }
        _ => false,
    }
}

/// Fold an optional numeric field.
pub(crate) fn merge_opt_f64(slot: &mut Option<f64>, record: &Map<String, Value>, key: &str) -> bool {
    match record.get(key).and_then(Value::as_f64) {
        Some(v) if *slot != Some(v) => {
            *slot = Some(v);
            true
        }
        _ => false,
    }
}

/// Fold a foreign-key field (string or numeric id on the wire).
pub(crate) fn merge_id(slot: &mut Option<String>, record: &Map<String, Value>, key: &str) -> bool {
    match record.get(key).and_then(value_to_id) {
        Some(v) if slot.as_deref() != Some(v.as_str()) => {
            *slot = Some(v);
            true
        }
        _ => false,
    }
}

/// Fold a textual field.
pub(crate) fn merge_text(slot: &mut Option<String>, record: &Map<String, Value>, key: &str) -> bool {
    match record.get(key).and_then(Value::as_str) {
        Some(v) if slot.as_deref() != Some(v) => {
            *slot = Some(v.to_string());
            true
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
