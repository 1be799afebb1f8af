use std::collections::HashMap;

use crate::domain::node::{NodeId, Position};
use crate::domain::session::session::SessionProvider;

/// Movement below this Euclidean distance is treated as storage noise
/// (float to int conversion of canvas coordinates), not as a readiness
/// signal.
pub const MOVEMENT_THRESHOLD: f64 = 1.0;

/// Name fragments of infrastructure pseudo-nodes that never take part in
/// traffic flows and are excluded from the snapshot.
const INFRA_MARKERS: [&str; 3] = ["emane", "CtrlNet", "PtpNet"];

/// Immutable `NodeId -> Position` baseline captured once at activation
/// start. Never mutated afterwards; readiness and peer matching both key
/// off membership in this map.
pub type TopologySnapshot = HashMap<NodeId, Position>;

/// Captures the initial positions of all regular nodes in the session.
pub fn capture_snapshot(session: &dyn SessionProvider) -> TopologySnapshot {
    let mut snapshot = TopologySnapshot::new();

    for id in session.node_ids() {
        if INFRA_MARKERS.iter().any(|marker| id.as_str().contains(marker)) {
            continue;
        }
        if let Some(node) = session.node(&id) {
            snapshot.insert(id, node.position);
        }
    }

    log::debug!("Captured topology snapshot of {} nodes.", snapshot.len());
    snapshot
}

/// Returns true as soon as any snapshot node has moved more than
/// [`MOVEMENT_THRESHOLD`] from its captured position.
///
/// One-shot edge-triggered signal: callers proceed unconditionally on the
/// first true and never re-arm the detector within an activation. Nodes
/// that left the session are skipped.
pub fn is_ready(session: &dyn SessionProvider, snapshot: &TopologySnapshot) -> bool {
    for (id, origin) in snapshot {
        let Some(node) = session.node(id) else {
            continue;
        };

        if origin.distance_to(&node.position) > MOVEMENT_THRESHOLD {
            log::info!(
                "Node {} has moved from ({}, {}) to ({}, {}); initial setup is done.",
                id,
                origin.x,
                origin.y,
                node.position.x,
                node.position.y
            );
            return true;
        }
    }

    false
}
