use std::collections::HashSet;

use crate::domain::config::WILDCARD;
use crate::domain::node::{Node, NodeId, Role};
use crate::domain::session::session::SessionProvider;
use crate::domain::topology::TopologySnapshot;

/// Parsed peer filter expression. Parsed once per activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerFilter {
    /// All nodes exposing the opposite role.
    Wildcard,
    /// Only the explicitly named nodes.
    Explicit(HashSet<String>),
}

impl PeerFilter {
    pub fn parse(expression: &str) -> PeerFilter {
        if expression.contains(WILDCARD) {
            PeerFilter::Wildcard
        } else {
            PeerFilter::Explicit(expression.split(',').map(|name| name.trim().to_string()).collect())
        }
    }

    pub fn admits(&self, id: &NodeId) -> bool {
        match self {
            PeerFilter::Wildcard => true,
            PeerFilter::Explicit(names) => names.contains(id.as_str()),
        }
    }
}

/// Enumerates eligible peers of the wanted role among the snapshot's nodes.
///
/// Excludes the caller and anything absent from the snapshot (which already
/// filtered out infrastructure pseudo-nodes). Nodes without a queryable
/// service list are silently skipped. Each eligible peer appears exactly
/// once; iteration order follows the snapshot and carries no further
/// guarantee.
pub fn find_peers(
    self_id: &NodeId,
    snapshot: &TopologySnapshot,
    filter: &PeerFilter,
    wanted_role: Role,
    session: &dyn SessionProvider,
) -> Vec<Node> {
    let mut peers = Vec::new();

    for id in snapshot.keys() {
        if id == self_id {
            continue;
        }

        let Some(node) = session.node(id) else {
            continue;
        };

        if node.services.is_none() {
            // Infrastructure nodes without config services; not an error.
            log::debug!("Node {} has no queryable service list; skipping.", id);
            continue;
        }

        if filter.admits(id) && node.exposes_role(wanted_role) {
            log::info!("{} service is enabled at node {}.", wanted_role.service_name(), id);
            peers.push(node);
        }
    }

    peers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::Position;
    use crate::domain::session::session_mock::SimulatedSession;
    use crate::domain::topology::capture_snapshot;

    fn node(id: &str, services: Option<Vec<&str>>) -> Node {
        Node {
            id: NodeId::new(id),
            position: Position::new(0.0, 0.0),
            services: services.map(|s| s.into_iter().map(String::from).collect()),
            interfaces: vec!["10.0.0.1".to_string()],
        }
    }

    fn session_with(nodes: Vec<Node>) -> SimulatedSession {
        let session = SimulatedSession::new();
        for n in nodes {
            session.add_node(n);
        }
        session
    }

    #[test]
    fn wildcard_matches_all_opposite_role_nodes_except_self() {
        let session = session_with(vec![
            node("n1", Some(vec!["FlowDestination"])),
            node("n2", Some(vec!["FlowSource"])),
            node("n3", Some(vec!["FlowSource"])),
            node("n4", Some(vec!["DefaultRoute"])),
        ]);
        let snapshot = capture_snapshot(&session);

        let peers = find_peers(&NodeId::new("n1"), &snapshot, &PeerFilter::Wildcard, Role::Source, &session);
        let mut names: Vec<String> = peers.iter().map(|p| p.id.to_string()).collect();
        names.sort();

        assert_eq!(names, vec!["n2", "n3"]);
    }

    #[test]
    fn explicit_filter_restricts_the_candidate_set() {
        let session = session_with(vec![
            node("n1", Some(vec!["FlowDestination"])),
            node("n2", Some(vec!["FlowSource"])),
            node("n3", Some(vec!["FlowSource"])),
        ]);
        let snapshot = capture_snapshot(&session);

        let filter = PeerFilter::parse("n3,n9");
        let peers = find_peers(&NodeId::new("n1"), &snapshot, &filter, Role::Source, &session);

        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].id, NodeId::new("n3"));
    }

    #[test]
    fn a_node_with_several_matching_services_appears_once() {
        let session = session_with(vec![
            node("n1", Some(vec!["FlowDestination"])),
            node("n2", Some(vec!["FlowSource", "FlowSourceBulk"])),
        ]);
        let snapshot = capture_snapshot(&session);

        let peers = find_peers(&NodeId::new("n1"), &snapshot, &PeerFilter::Wildcard, Role::Source, &session);
        assert_eq!(peers.len(), 1);
    }

    #[test]
    fn nodes_without_a_service_list_are_silently_skipped() {
        let session = session_with(vec![node("n1", Some(vec!["FlowDestination"])), node("wlan1", None)]);
        let snapshot = capture_snapshot(&session);

        let peers = find_peers(&NodeId::new("n1"), &snapshot, &PeerFilter::Wildcard, Role::Source, &session);
        assert!(peers.is_empty());
    }

    #[test]
    fn nodes_absent_from_the_snapshot_are_excluded() {
        let session = session_with(vec![node("n1", Some(vec!["FlowDestination"]))]);
        let snapshot = capture_snapshot(&session);

        // Joins the session after the snapshot was taken.
        session.add_node(node("n2", Some(vec!["FlowSource"])));

        let peers = find_peers(&NodeId::new("n1"), &snapshot, &PeerFilter::Wildcard, Role::Source, &session);
        assert!(peers.is_empty());
    }

    #[test]
    fn empty_iff_nothing_satisfies_filter_and_role() {
        let session = session_with(vec![node("n1", Some(vec!["FlowDestination"])), node("n2", Some(vec!["FlowSource"]))]);
        let snapshot = capture_snapshot(&session);

        let filter = PeerFilter::parse("n3");
        assert!(find_peers(&NodeId::new("n1"), &snapshot, &filter, Role::Source, &session).is_empty());

        let peers = find_peers(&NodeId::new("n1"), &snapshot, &PeerFilter::Wildcard, Role::Sink, &session);
        assert!(peers.is_empty(), "no other node exposes the sink role");
    }
}
