//! Per-kind entity collections: diff-aware merging, transform broadcasts,
//! the frame tick, and cache eviction.

use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;

use crate::entity::{value_to_id, Entity, Schema};
use crate::types::ViewContext;

/// Owns every entity of one kind, keyed by id. Created once, at
/// [`WorldModel`] construction; insertion order is irrelevant.
///
/// [`WorldModel`]: crate::world::WorldModel
#[derive(Debug)]
pub struct Container<S> {
    entities: HashMap<String, Entity<S>>,
    changed: bool,
}

impl<S: Schema> Container<S> {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            changed: false,
        }
    }

    // -----------------------------------------------------------------------
    // Merge
    // -----------------------------------------------------------------------

    /// Reconcile one partial record list.
    ///
    /// Unknown ids construct a fresh entity (defaults, then the record,
    /// then Active, snapped to its first destination). Known ids merge in
    /// place; a position change retargets the interpolation. Ids the list
    /// does not mention are left untouched — absence is not deletion.
    ///
    /// Returns the number of malformed records skipped (non-objects and
    /// records missing an id); this never fails.
    pub fn merge_children(&mut self, records: &[Value], ctx: &ViewContext) -> usize {
        let mut skipped = 0;

        for record in records {
            let Some(obj) = record.as_object() else {
                skipped += 1;
                continue;
            };
            let Some(id) = obj.get("id").and_then(value_to_id) else {
                skipped += 1;
                continue;
            };

            match self.entities.get_mut(&id) {
                None => {
                    let mut entity = Entity::<S>::new(id.clone());
                    entity.merge(obj);
                    entity.activate();
                    entity.force_move(ctx);
                    entity.cull(ctx);
                    debug!("created {} {}", S::KIND, id);
                    self.entities.insert(id, entity);
                    self.changed = true;
                }
                Some(entity) => {
                    let effect = entity.merge(obj);
                    if effect.moved {
                        entity.update_destination(ctx);
                        entity.cull(ctx);
                    }
                    if effect.changed {
                        self.changed = true;
                    }
                }
            }
        }

        if skipped > 0 {
            warn!("skipped {} malformed {} record(s)", skipped, S::KIND);
        }
        skipped
    }

    // -----------------------------------------------------------------------
    // Broadcasts
    // -----------------------------------------------------------------------

    /// The viewport coordinate changed: every spatial entity recomputes
    /// its destination (eased, or snapped when `force` — the user is
    /// actively dragging) and re-checks the cache window.
    pub fn broadcast_coord(&mut self, ctx: &ViewContext, force: bool) {
        let mut touched = false;
        for entity in self.entities.values_mut() {
            if entity.props.position().is_some() {
                if force {
                    entity.force_move(ctx);
                } else {
                    entity.update_destination(ctx);
                }
                touched = true;
            }
            entity.cull(ctx);
        }
        if touched {
            self.changed = true;
        }
    }

    /// The viewport was resized: destinations move but no fresh
    /// interpolation latency is granted — this is not entity motion.
    pub fn broadcast_resize(&mut self, ctx: &ViewContext) {
        let mut touched = false;
        for entity in self.entities.values_mut() {
            if entity.props.position().is_some() {
                entity.refresh_destination(ctx);
                touched = true;
            }
        }
        if touched {
            self.changed = true;
        }
    }

    // -----------------------------------------------------------------------
    // Frame tick
    // -----------------------------------------------------------------------

    /// Advance every in-flight interpolation one frame, then evict Ending
    /// entities whose exit animation settled. Returns how many entities
    /// are still animating.
    pub fn tick(&mut self, ctx: &ViewContext) -> usize {
        let mut animating = 0;
        for entity in self.entities.values_mut() {
            if !entity.motion.settled() {
                entity.motion.smooth_move(ctx.latency_frames, ctx.coord.zoom);
                if !entity.motion.settled() {
                    animating += 1;
                }
            }
        }

        let before = self.entities.len();
        self.entities.retain(|id, entity| {
            if entity.should_evict() {
                entity.mark_removed();
                debug!("evicted {} {}", S::KIND, id);
                false
            } else {
                true
            }
        });
        if self.entities.len() != before {
            self.changed = true;
        }

        animating
    }

    // -----------------------------------------------------------------------
    // Explicit removal channel
    // -----------------------------------------------------------------------

    /// Mark an entity Ending (destroy acknowledgment). Eviction happens
    /// on a later tick, once its exit interpolation settles.
    pub fn mark_ending(&mut self, id: &str) -> bool {
        match self.entities.get_mut(id) {
            Some(entity) => {
                entity.begin_ending();
                self.changed = true;
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Draw step
    // -----------------------------------------------------------------------

    pub fn before_render_all(&mut self) {
        for entity in self.entities.values_mut() {
            entity.before_render();
        }
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Clear the diff flag; called once per rendered frame.
    pub fn reset(&mut self) {
        self.changed = false;
    }

    // -----------------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------------

    pub fn get(&self, id: &str) -> Option<&Entity<S>> {
        self.entities.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Entity<S>> {
        self.entities.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity<S>> {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Entity<S>)> {
        self.entities.iter_mut()
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.entities.keys()
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Drop every entity, cancelling pending interpolation (unmount).
    pub fn end_all(&mut self) {
        for entity in self.entities.values_mut() {
            entity.mark_removed();
        }
        self.entities.clear();
        self.changed = false;
    }
}

impl<S: Schema> Default for Container<S> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::LifecycleState;
    use crate::kinds::Residence;
    use crate::types::{Coordinates, Viewport};
    use serde_json::json;

    fn ctx() -> ViewContext {
        ViewContext {
            coord: Coordinates::new(0.0, 0.0, 8.0),
            viewport: Viewport::new(800.0, 600.0, 1.0),
            latency_frames: 10,
        }
    }

    fn residences() -> Container<Residence> {
        Container::new()
    }

    // -----------------------------------------------------------------------
    // Merge
    // -----------------------------------------------------------------------

    #[test]
    fn merge_creates_active_settled_entities() {
        let mut c = residences();
        c.merge_children(&[json!({"id": "1", "x": 100, "y": 100})], &ctx());

        let e = c.get("1").unwrap();
        assert_eq!(e.state(), LifecycleState::Active);
        assert!(e.motion.settled());
        assert!(c.is_changed());
    }

    #[test]
    fn absent_ids_are_left_untouched() {
        let mut c = residences();
        c.merge_children(&[json!({"id": "1", "x": 1, "y": 1})], &ctx());
        c.reset();

        c.merge_children(&[json!({"id": "2", "x": 2, "y": 2})], &ctx());
        assert!(c.contains("1"));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn identical_merge_reports_no_change() {
        let mut c = residences();
        let records = [json!({"id": "1", "x": 100, "y": 100})];
        c.merge_children(&records, &ctx());
        c.reset();

        c.merge_children(&records, &ctx());
        assert!(!c.is_changed());
    }

    #[test]
    fn malformed_records_are_counted_not_merged() {
        let mut c = residences();
        let skipped = c.merge_children(
            &[
                json!({"x": 5, "y": 5}),
                json!("not an object"),
                json!({"id": "ok", "x": 1, "y": 1}),
            ],
            &ctx(),
        );
        assert_eq!(skipped, 2);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn position_change_starts_interpolation() {
        let mut c = residences();
        c.merge_children(&[json!({"id": "1", "x": 0, "y": 0})], &ctx());
        c.merge_children(&[json!({"id": "1", "x": 50})], &ctx());

        let e = c.get("1").unwrap();
        assert!(!e.motion.settled());
        assert_ne!(e.motion.current, e.motion.destination);
    }

    // -----------------------------------------------------------------------
    // Cache eviction
    // -----------------------------------------------------------------------

    #[test]
    fn merge_outside_cache_marks_ending_then_tick_evicts() {
        let mut c = residences();
        // Cache radius at scale 8 is 256.
        c.merge_children(&[json!({"id": "far", "x": 5000, "y": 0})], &ctx());
        assert_eq!(c.get("far").unwrap().state(), LifecycleState::Ending);

        c.tick(&ctx());
        assert!(!c.contains("far"));
    }

    #[test]
    fn eviction_waits_for_exit_animation() {
        let mut c = residences();
        c.merge_children(&[json!({"id": "1", "x": 0, "y": 0})], &ctx());
        // Move it out of cache; the retargeted ease is still in flight.
        c.merge_children(&[json!({"id": "1", "x": 5000})], &ctx());
        assert_eq!(c.get("1").unwrap().state(), LifecycleState::Ending);

        c.tick(&ctx());
        assert!(c.contains("1"), "still animating, must not pop");

        for _ in 0..10 {
            c.tick(&ctx());
        }
        assert!(!c.contains("1"));
    }

    // -----------------------------------------------------------------------
    // Broadcasts
    // -----------------------------------------------------------------------

    #[test]
    fn forced_coord_broadcast_snaps() {
        let mut c = residences();
        c.merge_children(&[json!({"id": "1", "x": 10, "y": 10})], &ctx());

        let mut moved = ctx();
        moved.coord.cx = 40.0;
        c.broadcast_coord(&moved, true);

        let e = c.get("1").unwrap();
        assert!(e.motion.settled());
    }

    #[test]
    fn unforced_coord_broadcast_eases() {
        let mut c = residences();
        c.merge_children(&[json!({"id": "1", "x": 10, "y": 10})], &ctx());

        let mut moved = ctx();
        moved.coord.cx = 40.0;
        c.broadcast_coord(&moved, false);

        assert!(!c.get("1").unwrap().motion.settled());
    }

    // -----------------------------------------------------------------------
    // Explicit removal
    // -----------------------------------------------------------------------

    #[test]
    fn mark_ending_then_settled_tick_evicts() {
        let mut c = residences();
        c.merge_children(&[json!({"id": "1", "x": 0, "y": 0})], &ctx());
        assert!(c.mark_ending("1"));
        assert!(!c.mark_ending("ghost"));

        c.tick(&ctx());
        assert!(!c.contains("1"));
    }
}
