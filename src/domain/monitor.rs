use std::time::Duration;

use tokio::time::sleep;

use crate::domain::command::FlowSet;
use crate::domain::node::NodeId;
use crate::domain::session::session::NodeExecutor;

/// Outcome of one liveness probe over the whole flow set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// At least one launched flow is still executing.
    Alive,
    /// No launched flow is executing any more.
    Done,
    /// The process listing could not be acquired; the session is assumed
    /// torn down and monitoring must stop without finalization.
    Lost,
}

/// Outcome of the whole monitoring loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    Completed,
    Aborted,
}

/// Probes whether any flow in the set is still executing.
///
/// Handle-based liveness is preferred where the executor supports it. For
/// flows without a queryable handle the fallback is the recorded command
/// line: any process-listing line containing it counts as alive. This is an
/// approximate test, exposed to false negatives on truncated listings and
/// false positives on unrelated look-alike invocations.
pub fn any_alive(executor: &dyn NodeExecutor, node_id: &NodeId, flows: &FlowSet) -> Liveness {
    let mut unresolved = Vec::new();

    for flow in flows.values() {
        match flow.handle.as_ref().and_then(|handle| executor.is_running(handle)) {
            Some(true) => return Liveness::Alive,
            Some(false) => {}
            None => unresolved.push(flow),
        }
    }

    if unresolved.is_empty() {
        return Liveness::Done;
    }

    match executor.process_listing(node_id) {
        Ok(listing) => {
            for line in listing.lines() {
                if unresolved.iter().any(|flow| line.contains(&flow.command_line)) {
                    return Liveness::Alive;
                }
            }
            Liveness::Done
        }
        Err(e) => {
            log::warn!("Node {}: process listing failed, aborting flow monitoring: {}", node_id, e);
            Liveness::Lost
        }
    }
}

/// Polls the flow set on a fixed cadence until nothing is alive.
///
/// A lost session aborts the loop instead of propagating the failure;
/// launched processes are never killed by this core.
pub async fn watch_flows(executor: &dyn NodeExecutor, node_id: &NodeId, flows: &FlowSet, poll_interval: Duration) -> MonitorOutcome {
    loop {
        match any_alive(executor, node_id, flows) {
            Liveness::Alive => sleep(poll_interval).await,
            Liveness::Done => return MonitorOutcome::Completed,
            Liveness::Lost => return MonitorOutcome::Aborted,
        }
    }
}
