//! The closed schema of every snapshot kind the engine registers.
//!
//! Field names follow the server's wire protocol (`pid` = previous node,
//! `from`/`to` = edge endpoints, `eid` = reverse edge, `oid` = owner).
//! Unknown wire properties are ignored by construction: a schema only
//! reads the keys it declares.

use serde_json::{Map, Value};

use crate::entity::{merge_f64, merge_id, merge_opt_f64, merge_text, MergeEffect, Schema};
use crate::resolve::Reference;
use crate::types::Point;

// ---------------------------------------------------------------------------
// Residences
// ---------------------------------------------------------------------------

/// A residence: spawns inhabitants headed for companies.
#[derive(Debug, Default)]
pub struct Residence {
    pub x: f64,
    pub y: f64,
    pub capacity: Option<f64>,
    pub wait: Option<f64>,
    pub name: Option<String>,
    pub oid: Option<String>,
}

impl Schema for Residence {
    const KIND: &'static str = "residences";

    fn merge_record(&mut self, record: &Map<String, Value>) -> MergeEffect {
        let mut effect = MergeEffect::default();
        effect.fold(MergeEffect::position(merge_f64(&mut self.x, record, "x")));
        effect.fold(MergeEffect::position(merge_f64(&mut self.y, record, "y")));
        effect.fold(MergeEffect::field(merge_opt_f64(&mut self.capacity, record, "capacity")));
        effect.fold(MergeEffect::field(merge_opt_f64(&mut self.wait, record, "wait")));
        effect.fold(MergeEffect::field(merge_text(&mut self.name, record, "name")));
        effect.fold(MergeEffect::field(merge_id(&mut self.oid, record, "oid")));
        effect
    }

    fn position(&self) -> Option<Point> {
        Some(Point::new(self.x, self.y))
    }
}

// ---------------------------------------------------------------------------
// Companies
// ---------------------------------------------------------------------------

/// A company: attracts inhabitants; `scale` sets its pull.
#[derive(Debug, Default)]
pub struct Company {
    pub x: f64,
    pub y: f64,
    pub scale: Option<f64>,
    pub name: Option<String>,
    pub oid: Option<String>,
}

impl Schema for Company {
    const KIND: &'static str = "companies";

    fn merge_record(&mut self, record: &Map<String, Value>) -> MergeEffect {
        let mut effect = MergeEffect::default();
        effect.fold(MergeEffect::position(merge_f64(&mut self.x, record, "x")));
        effect.fold(MergeEffect::position(merge_f64(&mut self.y, record, "y")));
        effect.fold(MergeEffect::field(merge_opt_f64(&mut self.scale, record, "scale")));
        effect.fold(MergeEffect::field(merge_text(&mut self.name, record, "name")));
        effect.fold(MergeEffect::field(merge_id(&mut self.oid, record, "oid")));
        effect
    }

    fn position(&self) -> Option<Point> {
        Some(Point::new(self.x, self.y))
    }
}

// ---------------------------------------------------------------------------
// Stations
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Station {
    pub x: f64,
    pub y: f64,
    pub name: Option<String>,
    pub oid: Option<String>,
}

impl Schema for Station {
    const KIND: &'static str = "stations";

    fn merge_record(&mut self, record: &Map<String, Value>) -> MergeEffect {
        let mut effect = MergeEffect::default();
        effect.fold(MergeEffect::position(merge_f64(&mut self.x, record, "x")));
        effect.fold(MergeEffect::position(merge_f64(&mut self.y, record, "y")));
        effect.fold(MergeEffect::field(merge_text(&mut self.name, record, "name")));
        effect.fold(MergeEffect::field(merge_id(&mut self.oid, record, "oid")));
        effect
    }

    fn position(&self) -> Option<Point> {
        Some(Point::new(self.x, self.y))
    }
}

// ---------------------------------------------------------------------------
// Rail nodes
// ---------------------------------------------------------------------------

/// A rail node. `pid` names the node it was extended from; `prev` holds
/// the live resolution of that id.
#[derive(Debug, Default)]
pub struct RailNode {
    pub x: f64,
    pub y: f64,
    pub pid: Option<String>,
    pub oid: Option<String>,
    pub prev: Reference,
}

impl Schema for RailNode {
    const KIND: &'static str = "rail_nodes";

    fn merge_record(&mut self, record: &Map<String, Value>) -> MergeEffect {
        let mut effect = MergeEffect::default();
        effect.fold(MergeEffect::position(merge_f64(&mut self.x, record, "x")));
        effect.fold(MergeEffect::position(merge_f64(&mut self.y, record, "y")));
        effect.fold(MergeEffect::field(merge_id(&mut self.pid, record, "pid")));
        effect.fold(MergeEffect::field(merge_id(&mut self.oid, record, "oid")));
        effect
    }

    fn position(&self) -> Option<Point> {
        Some(Point::new(self.x, self.y))
    }
}

// ---------------------------------------------------------------------------
// Rail edges
// ---------------------------------------------------------------------------

/// A directed rail edge between two nodes, with a paired reverse edge.
///
/// Edges carry no position of their own — geometry is read through the
/// resolved endpoint references at draw time — so they neither interpolate
/// nor get cache-culled directly.
#[derive(Debug, Default)]
pub struct RailEdge {
    pub from: Option<String>,
    pub to: Option<String>,
    pub eid: Option<String>,
    pub oid: Option<String>,
    pub from_node: Reference,
    pub to_node: Reference,
    pub reverse: Reference,
}

impl Schema for RailEdge {
    const KIND: &'static str = "rail_edges";

    fn merge_record(&mut self, record: &Map<String, Value>) -> MergeEffect {
        let mut effect = MergeEffect::default();
        effect.fold(MergeEffect::field(merge_id(&mut self.from, record, "from")));
        effect.fold(MergeEffect::field(merge_id(&mut self.to, record, "to")));
        effect.fold(MergeEffect::field(merge_id(&mut self.eid, record, "eid")));
        effect.fold(MergeEffect::field(merge_id(&mut self.oid, record, "oid")));
        effect
    }

    fn position(&self) -> Option<Point> {
        None
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// Another participant. Not spatial — presence and identity only.
#[derive(Debug, Default)]
pub struct Player {
    pub name: Option<String>,
    pub hue: Option<f64>,
}

impl Schema for Player {
    const KIND: &'static str = "players";

    fn merge_record(&mut self, record: &Map<String, Value>) -> MergeEffect {
        let mut effect = MergeEffect::default();
        effect.fold(MergeEffect::field(merge_text(&mut self.name, record, "name")));
        effect.fold(MergeEffect::field(merge_opt_f64(&mut self.hue, record, "hue")));
        effect
    }

    fn position(&self) -> Option<Point> {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn residence_tracks_position_changes() {
        let mut r = Residence::default();
        let eff = r.merge_record(&record(json!({"x": 100, "y": 200, "capacity": 5})));
        assert!(eff.changed && eff.moved);
        assert_eq!(r.position(), Some(Point::new(100.0, 200.0)));

        let eff = r.merge_record(&record(json!({"capacity": 6})));
        assert!(eff.changed && !eff.moved);
    }

    #[test]
    fn rail_edge_endpoint_change_is_not_a_move() {
        let mut e = RailEdge::default();
        let eff = e.merge_record(&record(json!({"from": "n1", "to": 2, "eid": "e2"})));
        assert!(eff.changed && !eff.moved);
        assert_eq!(e.from.as_deref(), Some("n1"));
        assert_eq!(e.to.as_deref(), Some("2"));
        assert_eq!(e.position(), None);
    }

    #[test]
    fn rail_node_numeric_pid_coerces_to_string() {
        let mut n = RailNode::default();
        n.merge_record(&record(json!({"x": 1, "y": 2, "pid": 7})));
        assert_eq!(n.pid.as_deref(), Some("7"));
    }

    #[test]
    fn player_is_not_spatial() {
        let mut p = Player::default();
        let eff = p.merge_record(&record(json!({"name": "admin", "hue": 130, "x": 4})));
        assert!(eff.changed && !eff.moved);
        assert_eq!(p.position(), None);
    }
}
