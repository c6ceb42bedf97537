//! Cross-entity reference resolution.
//!
//! Rail entities reference each other by id: a node names the node it was
//! extended from (`pid`), an edge names its endpoints (`from`, `to`) and
//! its paired reverse edge (`eid`). After every merge the resolver binds
//! those ids to live entities and reports what it could not bind —
//! snapshots are eventually consistent, so a dangling id is ordinary
//! churn, not an error.

use std::collections::{HashMap, HashSet};

use crate::container::Container;
use crate::kinds::{RailEdge, RailNode};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Outcome of resolving one foreign-key field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The referenced entity is live; the reference is bound.
    Resolved,
    /// No entity with that id exists yet. Any previous binding is kept
    /// (later snapshots typically complete the reference; nulling it
    /// would flicker).
    Dangling,
    /// The field names its own entity; treated as unresolved.
    SelfReference,
}

// ---------------------------------------------------------------------------
// Weak reference
// ---------------------------------------------------------------------------

/// A weak, lazily-validated link to another entity: the last successfully
/// resolved target id plus the most recent resolution outcome. Never an
/// owning handle — traversal goes back through the owning container.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reference {
    resolved: Option<String>,
    outcome: Option<Resolution>,
}

impl Reference {
    /// Record a successful resolution.
    pub fn bind(&mut self, target: &str) {
        self.resolved = Some(target.to_string());
        self.outcome = Some(Resolution::Resolved);
    }

    /// Record a failed resolution, keeping any previous binding intact.
    pub fn miss(&mut self, outcome: Resolution) {
        self.outcome = Some(outcome);
    }

    /// Id of the last successfully bound target, if any.
    pub fn target(&self) -> Option<&str> {
        self.resolved.as_deref()
    }

    /// Most recent resolution outcome; `None` before the first pass.
    pub fn outcome(&self) -> Option<Resolution> {
        self.outcome
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Per-field resolution outcomes from one pass, keyed
/// `"{entity_id}.{field}"`. Surfaced to diagnostics and the UI; never
/// thrown.
#[derive(Debug, Clone, Default)]
pub struct ResolutionReport {
    entries: HashMap<String, Resolution>,
}

impl ResolutionReport {
    fn insert(&mut self, id: &str, field: &str, outcome: Resolution) {
        self.entries.insert(format!("{id}.{field}"), outcome);
    }

    /// Outcome for one entity field, if that field was examined.
    pub fn outcome(&self, id: &str, field: &str) -> Option<Resolution> {
        self.entries.get(&format!("{id}.{field}")).copied()
    }

    /// True when every examined reference resolved.
    pub fn is_clean(&self) -> bool {
        self.entries
            .values()
            .all(|o| *o == Resolution::Resolved)
    }

    pub fn dangling_count(&self) -> usize {
        self.entries
            .values()
            .filter(|o| **o != Resolution::Resolved)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Resolution)> {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// Resolution pass
// ---------------------------------------------------------------------------

/// Resolve every declared foreign key in the rail graph. Runs once per
/// `merge_all`, after all containers merged. Has no effect on any
/// container's `changed` flag — binding a reference is not a visible
/// change by itself.
pub fn resolve_graph(
    nodes: &mut Container<RailNode>,
    edges: &mut Container<RailEdge>,
) -> ResolutionReport {
    let node_ids: HashSet<String> = nodes.ids().cloned().collect();
    let edge_ids: HashSet<String> = edges.ids().cloned().collect();
    let mut report = ResolutionReport::default();

    for (id, node) in nodes.iter_mut() {
        let Some(pid) = node.props.pid.clone() else {
            continue;
        };
        let outcome = if pid == *id {
            Resolution::SelfReference
        } else if node_ids.contains(&pid) {
            Resolution::Resolved
        } else {
            Resolution::Dangling
        };
        match outcome {
            Resolution::Resolved => node.props.prev.bind(&pid),
            _ => node.props.prev.miss(outcome),
        }
        report.insert(id, "pid", outcome);
    }

    for (id, edge) in edges.iter_mut() {
        for (field, target, reference) in [
            ("from", edge.props.from.clone(), &mut edge.props.from_node),
            ("to", edge.props.to.clone(), &mut edge.props.to_node),
        ] {
            let Some(target) = target else { continue };
            if node_ids.contains(&target) {
                reference.bind(&target);
                report.insert(id, field, Resolution::Resolved);
            } else {
                reference.miss(Resolution::Dangling);
                report.insert(id, field, Resolution::Dangling);
            }
        }

        if let Some(eid) = edge.props.eid.clone() {
            let outcome = if eid == *id {
                Resolution::SelfReference
            } else if edge_ids.contains(&eid) {
                Resolution::Resolved
            } else {
                Resolution::Dangling
            };
            match outcome {
                Resolution::Resolved => edge.props.reverse.bind(&eid),
                _ => edge.props.reverse.miss(outcome),
            }
            report.insert(id, "eid", outcome);
        }
    }

    report
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coordinates, ViewContext, Viewport};
    use serde_json::json;

    fn ctx() -> ViewContext {
        ViewContext {
            coord: Coordinates::new(0.0, 0.0, 8.0),
            viewport: Viewport::new(800.0, 600.0, 1.0),
            latency_frames: 10,
        }
    }

    fn graph() -> (Container<RailNode>, Container<RailEdge>) {
        (Container::new(), Container::new())
    }

    // -----------------------------------------------------------------------
    // Edge endpoints
    // -----------------------------------------------------------------------

    #[test]
    fn edge_before_nodes_dangles_then_resolves() {
        let (mut nodes, mut edges) = graph();
        edges.merge_children(&[json!({"id": "e1", "from": "n1", "to": "n2"})], &ctx());

        let report = resolve_graph(&mut nodes, &mut edges);
        assert_eq!(report.outcome("e1", "from"), Some(Resolution::Dangling));
        assert_eq!(report.outcome("e1", "to"), Some(Resolution::Dangling));
        assert_eq!(report.dangling_count(), 2);

        nodes.merge_children(
            &[
                json!({"id": "n1", "x": 0, "y": 0}),
                json!({"id": "n2", "x": 10, "y": 0}),
            ],
            &ctx(),
        );
        let report = resolve_graph(&mut nodes, &mut edges);
        assert_eq!(report.outcome("e1", "from"), Some(Resolution::Resolved));
        assert_eq!(report.outcome("e1", "to"), Some(Resolution::Resolved));
        assert!(report.is_clean());

        let edge = edges.get("e1").unwrap();
        assert_eq!(edge.props.from_node.target(), Some("n1"));
        assert_eq!(edge.props.to_node.target(), Some("n2"));
    }

    #[test]
    fn dangling_keeps_previous_binding() {
        let (mut nodes, mut edges) = graph();
        nodes.merge_children(&[json!({"id": "n1", "x": 0, "y": 0})], &ctx());
        edges.merge_children(&[json!({"id": "e1", "from": "n1"})], &ctx());
        resolve_graph(&mut nodes, &mut edges);

        // Retarget the edge at a node that has not arrived yet.
        edges.merge_children(&[json!({"id": "e1", "from": "n9"})], &ctx());
        let report = resolve_graph(&mut nodes, &mut edges);

        assert_eq!(report.outcome("e1", "from"), Some(Resolution::Dangling));
        let edge = edges.get("e1").unwrap();
        assert_eq!(edge.props.from_node.target(), Some("n1"));
        assert_eq!(edge.props.from_node.outcome(), Some(Resolution::Dangling));
    }

    // -----------------------------------------------------------------------
    // Node previous-node chain
    // -----------------------------------------------------------------------

    #[test]
    fn node_pid_chain_resolves() {
        let (mut nodes, mut edges) = graph();
        nodes.merge_children(
            &[
                json!({"id": "n1", "x": 0, "y": 0}),
                json!({"id": "n2", "x": 5, "y": 0, "pid": "n1"}),
            ],
            &ctx(),
        );
        let report = resolve_graph(&mut nodes, &mut edges);
        assert_eq!(report.outcome("n2", "pid"), Some(Resolution::Resolved));
        assert_eq!(nodes.get("n2").unwrap().props.prev.target(), Some("n1"));
        // n1 has no pid: nothing examined, nothing reported.
        assert_eq!(report.outcome("n1", "pid"), None);
    }

    #[test]
    fn self_reference_is_reported_not_bound() {
        let (mut nodes, mut edges) = graph();
        nodes.merge_children(&[json!({"id": "n1", "x": 0, "y": 0, "pid": "n1"})], &ctx());

        let report = resolve_graph(&mut nodes, &mut edges);
        assert_eq!(report.outcome("n1", "pid"), Some(Resolution::SelfReference));
        assert_eq!(nodes.get("n1").unwrap().props.prev.target(), None);
        assert!(!report.is_clean());
    }

    // -----------------------------------------------------------------------
    // Reverse edges
    // -----------------------------------------------------------------------

    #[test]
    fn reverse_edges_pair_up() {
        let (mut nodes, mut edges) = graph();
        edges.merge_children(
            &[
                json!({"id": "e1", "eid": "e2"}),
                json!({"id": "e2", "eid": "e1"}),
            ],
            &ctx(),
        );
        let report = resolve_graph(&mut nodes, &mut edges);
        assert_eq!(report.outcome("e1", "eid"), Some(Resolution::Resolved));
        assert_eq!(report.outcome("e2", "eid"), Some(Resolution::Resolved));
        assert_eq!(edges.get("e1").unwrap().props.reverse.target(), Some("e2"));
    }

    #[test]
    fn resolution_does_not_mark_containers_changed() {
        let (mut nodes, mut edges) = graph();
        nodes.merge_children(&[json!({"id": "n1", "x": 0, "y": 0, "pid": "n0"})], &ctx());
        nodes.reset();
        edges.reset();

        resolve_graph(&mut nodes, &mut edges);
        assert!(!nodes.is_changed());
        assert!(!edges.is_changed());
    }
}
