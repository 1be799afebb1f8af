use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::command::FlowSet;
use crate::domain::config::{FlowConfig, WILDCARD};
use crate::domain::node::NodeId;
use crate::domain::session::session::{NodeExecutor, NodeStatus, StatusIndicator};

/// Default artifact directory, created under the session's working area
/// when no explicit log directory is configured or the configured one
/// cannot be created.
pub const DEFAULT_LOG_DIR: &str = "SessionLogs";

/// Resolves the configured finalization directory; the wildcard picks the
/// default directory under the node's working area.
pub fn resolve_log_dir(config: &FlowConfig, work_dir: &Path) -> PathBuf {
    if config.log_directory == WILDCARD {
        work_dir.join(DEFAULT_LOG_DIR)
    } else {
        PathBuf::from(&config.log_directory)
    }
}

/// Relocates every flow artifact into the log directory and reports the
/// terminal `Complete` status.
///
/// The target directory is created on demand; if that fails the fallback
/// directory under the working area is used instead. Missing or
/// already-relocated artifacts are tolerated and do not stop the remaining
/// relocations, so the whole operation is idempotent.
///
/// Directory creation uses the orchestrator's own filesystem, which must be
/// shared with the node's namespace (true for the emulator's bind-mounted
/// working areas); relocation itself goes through the executor seam.
pub fn finalize(
    executor: &dyn NodeExecutor,
    status: &dyn StatusIndicator,
    node_id: &NodeId,
    flows: &FlowSet,
    log_dir: &Path,
    fallback_dir: &Path,
) {
    let target = match fs::create_dir_all(log_dir) {
        Ok(()) => log_dir.to_path_buf(),
        Err(e) => {
            log::warn!("Node {}: could not create log directory '{}' ({}); falling back to '{}'.", node_id, log_dir.display(), e, fallback_dir.display());
            if let Err(e) = fs::create_dir_all(fallback_dir) {
                log::error!("Node {}: could not create fallback log directory '{}': {}", node_id, fallback_dir.display(), e);
            }
            fallback_dir.to_path_buf()
        }
    };

    for flow in flows.values() {
        let Some(file_name) = flow.artifact_path.file_name() else {
            continue;
        };
        let destination = target.join(file_name);

        match executor.move_file(node_id, &flow.artifact_path, &destination) {
            Ok(()) => log::info!("Node {}: moved '{}' to '{}'.", node_id, flow.artifact_path.display(), target.display()),
            Err(e) => log::warn!("Node {}: skipping artifact '{}': {}", node_id, flow.artifact_path.display(), e),
        }
    }

    status.set_status(node_id, NodeStatus::Complete);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::command::FlowDescriptor;
    use crate::domain::node::{Node, Position};
    use crate::domain::session::session_mock::SimulatedSession;

    fn session_with_node(id: &str) -> SimulatedSession {
        let session = SimulatedSession::new();
        session.add_node(Node { id: NodeId::new(id), position: Position::new(0.0, 0.0), services: Some(vec![]), interfaces: vec![] });
        session
    }

    fn launched_flow(session: &SimulatedSession, node: &NodeId, peer: &str, artifact: &Path) -> FlowDescriptor {
        let command = format!("iperf3 --server --port 5202 --one-off --logfile {}", artifact.display());
        let handle = session.spawn_background(node, &command).unwrap();

        FlowDescriptor {
            peer_id: NodeId::new(peer),
            port: 5202,
            command_line: command,
            artifact_path: artifact.to_path_buf(),
            launched_at: None,
            handle: Some(handle),
        }
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join("flow_orchestrator_tests").join(name)
    }

    #[test]
    fn artifacts_are_relocated_and_complete_is_reported() {
        let session = session_with_node("n2");
        let id = NodeId::new("n2");
        let log_dir = temp_dir("relocate");

        let mut flows = FlowSet::new();
        let artifact = temp_dir("work").join("Server_n2_Client_n3_Port_5202_Time_t.txt");
        flows.insert(NodeId::new("n3"), launched_flow(&session, &id, "n3", &artifact));

        finalize(&session, &session, &id, &flows, &log_dir, &temp_dir("fallback"));

        assert_eq!(session.relocations().len(), 1);
        assert!(session.file_exists(&log_dir.join("Server_n2_Client_n3_Port_5202_Time_t.txt")));
        assert_eq!(session.statuses(&id), vec![NodeStatus::Complete]);
    }

    #[test]
    fn finalize_is_idempotent() {
        let session = session_with_node("n2");
        let id = NodeId::new("n2");
        let log_dir = temp_dir("idempotent");

        let mut flows = FlowSet::new();
        let artifact = temp_dir("work").join("Server_n2_Client_n3_Port_5202_Time_u.txt");
        flows.insert(NodeId::new("n3"), launched_flow(&session, &id, "n3", &artifact));

        finalize(&session, &session, &id, &flows, &log_dir, &temp_dir("fallback"));
        finalize(&session, &session, &id, &flows, &log_dir, &temp_dir("fallback"));

        assert_eq!(session.relocations().len(), 1, "second pass must not duplicate relocations");
        assert_eq!(session.statuses(&id), vec![NodeStatus::Complete, NodeStatus::Complete]);
    }

    #[test]
    fn unwritable_directory_falls_back_to_the_default() {
        let session = session_with_node("n2");
        let id = NodeId::new("n2");
        let fallback = temp_dir("fallback_used");

        let mut flows = FlowSet::new();
        let artifact = temp_dir("work").join("Server_n2_Client_n3_Port_5202_Time_v.txt");
        flows.insert(NodeId::new("n3"), launched_flow(&session, &id, "n3", &artifact));

        // /proc is not writable, directory creation must fail there.
        finalize(&session, &session, &id, &flows, Path::new("/proc/flow_orchestrator"), &fallback);

        assert!(session.file_exists(&fallback.join("Server_n2_Client_n3_Port_5202_Time_v.txt")));
    }

    #[test]
    fn missing_artifacts_do_not_stop_the_remaining_relocations() {
        let session = session_with_node("n2");
        let id = NodeId::new("n2");
        let log_dir = temp_dir("partial");

        let mut flows = FlowSet::new();
        let present = temp_dir("work").join("Server_n2_Client_n3_Port_5203_Time_w.txt");
        flows.insert(NodeId::new("n3"), launched_flow(&session, &id, "n3", &present));

        // Never launched, so its artifact never existed.
        flows.insert(
            NodeId::new("n4"),
            FlowDescriptor {
                peer_id: NodeId::new("n4"),
                port: 5204,
                command_line: "iperf3 --server --port 5204".to_string(),
                artifact_path: temp_dir("work").join("missing.txt"),
                launched_at: None,
                handle: None,
            },
        );

        finalize(&session, &session, &id, &flows, &log_dir, &temp_dir("fallback"));

        assert_eq!(session.relocations().len(), 1);
        assert_eq!(session.statuses(&id), vec![NodeStatus::Complete]);
    }

    #[test]
    fn wildcard_log_directory_resolves_under_the_work_area() {
        let config = FlowConfig::default();
        let resolved = resolve_log_dir(&config, Path::new("/tmp/n2.conf"));
        assert_eq!(resolved, Path::new("/tmp/n2.conf/SessionLogs"));

        let mut explicit = FlowConfig::default();
        explicit.log_directory = "/var/log/flows".to_string();
        assert_eq!(resolve_log_dir(&explicit, Path::new("/tmp/n2.conf")), Path::new("/var/log/flows"));
    }
}
