use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::domain::command::{self, FlowSet, TIMESTAMP_FORMAT};
use crate::domain::config::FlowConfig;
use crate::domain::finalizer::{self, DEFAULT_LOG_DIR, resolve_log_dir};
use crate::domain::launcher::launch_flows;
use crate::domain::matcher::{PeerFilter, find_peers};
use crate::domain::monitor::{MonitorOutcome, watch_flows};
use crate::domain::node::{NodeId, Role};
use crate::domain::session::session::{NodeExecutor, NodeStatus, SessionProvider, StatusIndicator};
use crate::domain::topology::{capture_snapshot, is_ready};

/// Lifecycle of one node's activation.
///
/// `Running` is entered iff discovery produced a non-empty flow set, `Idle`
/// iff it was empty, and `Complete` is reachable only from `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    WaitingReady,
    Discovering,
    Running,
    Idle,
    Complete,
}

/// All orchestration delays, injected so tests can shrink them.
#[derive(Debug, Clone)]
pub struct Timing {
    /// Cadence of the readiness sleep-then-retest loop.
    pub readiness_poll: Duration,
    /// Fixed source-side delay so sink listeners can bind their ports.
    pub source_warmup: Duration,
    /// Gap between successive source launches when fanning out.
    pub launch_gap: Duration,
    /// Cadence of the liveness polling loop.
    pub liveness_poll: Duration,
}

impl Timing {
    /// Scales the canonical delays (1, 10 and 5 time units) to a concrete
    /// unit length. The launch gap stays fixed at one millisecond.
    pub fn from_unit(unit: Duration) -> Timing {
        Timing { readiness_poll: unit, source_warmup: unit * 10, launch_gap: Duration::from_millis(1), liveness_poll: unit * 5 }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Timing::from_unit(Duration::from_secs(1))
    }
}

/// Everything one activation needs, passed explicitly instead of living in
/// module-level state; activations share nothing in-process.
#[derive(Debug, Clone)]
pub struct ActivationContext {
    pub node_id: NodeId,
    pub role: Role,
    pub config: FlowConfig,
    pub session: Arc<dyn SessionProvider>,
    pub status: Arc<dyn StatusIndicator>,
    pub executor: Arc<dyn NodeExecutor>,
    pub timing: Timing,
}

/// One node's orchestrator activation: readiness wait, peer discovery,
/// flow launch, liveness monitoring and finalization, run to its own
/// terminal state as a single background task.
#[derive(Debug)]
pub struct Activation {
    ctx: ActivationContext,
    state: ActivationState,
    flows: FlowSet,
}

impl Activation {
    pub fn new(ctx: ActivationContext) -> Activation {
        Activation { ctx, state: ActivationState::WaitingReady, flows: FlowSet::new() }
    }

    /// Runs the activation as an independent background task.
    pub fn spawn(ctx: ActivationContext) -> JoinHandle<ActivationState> {
        tokio::spawn(Activation::new(ctx).run())
    }

    pub async fn run(mut self) -> ActivationState {
        let ctx = self.ctx.clone();
        let snapshot = capture_snapshot(ctx.session.as_ref());

        // Wait until the initial setup is complete, i.e. until any node
        // moves, unless configured to start immediately.
        if ctx.config.start_immediately {
            log::info!("Node {} ({}) starts immediately, readiness wait bypassed.", ctx.node_id, ctx.role);
        } else {
            while !is_ready(ctx.session.as_ref(), &snapshot) {
                sleep(ctx.timing.readiness_poll).await;
            }
        }

        ctx.status.set_status(&ctx.node_id, NodeStatus::Active);
        self.state = ActivationState::Discovering;

        if ctx.session.node(&ctx.node_id).is_none() {
            log::error!("Node {} is no longer part of the session; stalling activation.", ctx.node_id);
            return self.state;
        }

        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let work_dir = ctx.session.work_dir(&ctx.node_id);
        let filter = PeerFilter::parse(&ctx.config.peers);
        let peers = find_peers(&ctx.node_id, &snapshot, &filter, ctx.role.opposite(), ctx.session.as_ref());

        for peer in peers {
            let built = match ctx.role {
                Role::Sink => command::build_sink_flow(&ctx.node_id, &peer, &work_dir, &timestamp),
                Role::Source => command::build_source_flow(&ctx.node_id, &peer, &ctx.config, &work_dir, &timestamp),
            };

            match built {
                Ok(flow) => {
                    self.flows.insert(flow.peer_id.clone(), flow);
                }
                Err(e) => log::warn!("Node {}: skipping peer {}: {}", ctx.node_id, peer.id, e),
            }
        }

        if self.flows.is_empty() {
            log::info!("Node {}: no {} peer found.", ctx.node_id, ctx.role.opposite());
            self.state = ActivationState::Idle;
            ctx.status.set_status(&ctx.node_id, NodeStatus::Idle);
            return self.state;
        }

        self.state = ActivationState::Running;

        if ctx.role == Role::Source {
            // Sink listeners need time to bind their ports.
            sleep(ctx.timing.source_warmup).await;
        }

        launch_flows(ctx.executor.as_ref(), &ctx.node_id, ctx.role, &mut self.flows, ctx.timing.launch_gap).await;

        match watch_flows(ctx.executor.as_ref(), &ctx.node_id, &self.flows, ctx.timing.liveness_poll).await {
            MonitorOutcome::Completed => {
                log::info!("Node {}: all traffic flows are complete.", ctx.node_id);
                let log_dir = resolve_log_dir(&ctx.config, &work_dir);
                let fallback = work_dir.join(DEFAULT_LOG_DIR);
                finalizer::finalize(ctx.executor.as_ref(), ctx.status.as_ref(), &ctx.node_id, &self.flows, &log_dir, &fallback);
                self.state = ActivationState::Complete;
            }
            MonitorOutcome::Aborted => {
                // Session torn down mid-monitoring: leave artifacts in
                // place, report nothing.
                log::warn!("Node {}: monitoring aborted, artifacts left in place.", ctx.node_id);
            }
        }

        self.state
    }
}
