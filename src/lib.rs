//! Railmap View Engine
//!
//! The client-side state engine for an incremental railway map: it
//! reconciles partial server snapshots into live entities and interpolates
//! everything toward its on-screen destination, one frame at a time.
//!
//! ## Architecture
//!
//! ```text
//! WorldModel  (world.rs)            ← composition root, both clocks
//!   ├── ViewportController (viewport.rs)  ← pan/zoom clamping, zoom hint
//!   ├── Container<S>  (container.rs)      ← per-kind merge, tick, eviction
//!   │     └── Entity<S>  (entity.rs)      ← lifecycle + Motion (motion.rs)
//!   ├── Cursor  (cursor.rs)               ← pointer, rail-node snapping
//!   └── resolve_graph  (resolve.rs)       ← rail reference binding
//! ```
//!
//! Kind schemas live in `kinds.rs`; the world/screen transform in
//! `transform.rs`. Everything is single-threaded: the embedding event loop
//! calls `merge_all` when a snapshot arrives and `tick`/`render` once per
//! display frame, and `&mut self` keeps the two from interleaving.

pub mod container;
pub mod cursor;
pub mod entity;
pub mod kinds;
pub mod motion;
pub mod resolve;
pub mod transform;
pub mod types;
pub mod viewport;
pub mod world;

// Convenience re-exports
pub use container::Container;
pub use cursor::Cursor;
pub use entity::{Entity, LifecycleState, MergeEffect, Schema};
pub use motion::Motion;
pub use resolve::{resolve_graph, Reference, Resolution, ResolutionReport};
pub use transform::{is_outside_cache, to_screen, to_world};
pub use types::{Coordinates, Point, Snapshot, ViewConfig, ViewContext, ViewError, Viewport};
pub use viewport::ViewportController;
pub use world::{EntityView, MergeReport, WorldModel, KINDS};
