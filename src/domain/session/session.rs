use std::path::{Path, PathBuf};

use crate::domain::node::{Node, NodeId};
use crate::error::Result;

/// Terminal and intermediate node statuses surfaced to the operator.
///
/// The status indicator is the only channel by which a human learns that an
/// activation finished initializing, found no peer, or completed all flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    /// No peer was found; terminal for this activation.
    Idle,
    /// Initialization finished, flows are being set up or are running.
    Active,
    /// All flows finished and artifacts were relocated; terminal.
    Complete,
}

impl NodeStatus {
    /// Icon shown on the simulator canvas for this status.
    pub fn icon(&self) -> &'static str {
        match self {
            NodeStatus::Idle => "mdr.png",
            NodeStatus::Active => "alert.png",
            NodeStatus::Complete => "document-save.gif",
        }
    }
}

/// Logical descriptor of a launched background process.
///
/// This is not an OS handle; whether it can answer liveness queries depends
/// on the executor (see [`NodeExecutor::is_running`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowHandle(pub u64);

/// Read-only view of the external session's topology.
///
/// Must support snapshotting at activation start and re-querying the same
/// node by identifier later.
pub trait SessionProvider: std::fmt::Debug + Send + Sync {
    /// Current state of one node, or `None` if it is no longer part of the
    /// session.
    fn node(&self, id: &NodeId) -> Option<Node>;

    /// Identifiers of all nodes currently in the session, including
    /// infrastructure pseudo-nodes.
    fn node_ids(&self) -> Vec<NodeId>;

    /// Working directory of the node's filesystem namespace, where flow
    /// artifacts are written before finalization.
    fn work_dir(&self, id: &NodeId) -> PathBuf;
}

/// One-way status notifier; maps to a visual indicator on the node.
///
/// Fire-and-forget: no return value is consumed and repeated calls with the
/// same status must be safe.
pub trait StatusIndicator: std::fmt::Debug + Send + Sync {
    fn set_status(&self, id: &NodeId, status: NodeStatus);
}

/// Process execution facility scoped to a node's own execution context and
/// filesystem namespace.
pub trait NodeExecutor: std::fmt::Debug + Send + Sync {
    /// Starts `command` as a detached background process on the node.
    /// Must not block until completion.
    fn spawn_background(&self, id: &NodeId, command: &str) -> Result<FlowHandle>;

    /// Synchronously retrieves the node's current process listing as text,
    /// one process invocation per line.
    fn process_listing(&self, id: &NodeId) -> Result<String>;

    /// Handle-based liveness, where the facility supports it.
    ///
    /// `None` means handles cannot be queried and the caller must fall back
    /// to matching the recorded command line against the process listing.
    fn is_running(&self, handle: &FlowHandle) -> Option<bool> {
        let _ = handle;
        None
    }

    /// Moves a file within the node's filesystem namespace.
    fn move_file(&self, id: &NodeId, from: &Path, to: &Path) -> Result<()>;

    /// Removes a file from the node's filesystem namespace.
    fn remove_file(&self, id: &NodeId, path: &Path) -> Result<()>;
}
