use std::time::Duration;

use chrono::Local;
use tokio::time::sleep;

use crate::domain::command::FlowSet;
use crate::domain::node::{NodeId, Role};
use crate::domain::session::session::NodeExecutor;

/// Starts every descriptor in the flow set as a detached background process
/// on the node's execution context. Never blocks on flow completion.
///
/// Source launches insert a short gap between successive flows to avoid
/// port and resource contention when fanning out to multiple peers. A
/// failed spawn is logged and left in the set: launch failures are not
/// distinguishable from instant completion, liveness polling is the only
/// feedback channel.
pub async fn launch_flows(executor: &dyn NodeExecutor, node_id: &NodeId, role: Role, flows: &mut FlowSet, launch_gap: Duration) {
    for flow in flows.values_mut() {
        match executor.spawn_background(node_id, &flow.command_line) {
            Ok(handle) => {
                flow.handle = Some(handle);
                flow.launched_at = Some(Local::now());
                log::info!("Node {} launched flow towards {}: {}", node_id, flow.peer_id, flow.command_line);
            }
            Err(e) => {
                log::warn!("Node {} failed to launch flow towards {}: {}", node_id, flow.peer_id, e);
            }
        }

        if role == Role::Source {
            // Precaution between multiple traffic flows.
            sleep(launch_gap).await;
        }
    }
}
