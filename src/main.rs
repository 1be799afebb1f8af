use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use flow_orchestrator::domain::activation::{Activation, ActivationContext, Timing};
use flow_orchestrator::domain::config::FlowConfig;
use flow_orchestrator::domain::node::{NodeId, Role};
use flow_orchestrator::domain::session::session::{NodeExecutor, SessionProvider, StatusIndicator};
use flow_orchestrator::domain::session::session_mock::SimulatedSession;
use flow_orchestrator::{load_scenario, logger};

#[derive(Parser, Debug)]
#[command(name = "flow_orchestrator", about = "Orchestrates ephemeral traffic flows between nodes of a simulated topology.")]
struct Args {
    /// Path to the scenario JSON file.
    scenario: String,

    /// Length of one orchestration time unit in milliseconds.
    #[arg(long, default_value_t = 1000)]
    unit_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init();

    let args = Args::parse();

    let scenario = load_scenario(&args.scenario).with_context(|| format!("Loading scenario '{}'", args.scenario))?;
    let session = Arc::new(SimulatedSession::from_dto(&scenario)?);
    let timing = Timing::from_unit(Duration::from_millis(args.unit_ms));

    let mut handles = Vec::new();

    for node_dto in &scenario.nodes {
        let Some(services) = &node_dto.services else {
            continue;
        };

        let mut roles: Vec<Role> = services.iter().filter_map(|s| Role::from_service_name(s)).collect();
        roles.dedup();

        for role in roles {
            let ctx = ActivationContext {
                node_id: NodeId::new(node_dto.id.clone()),
                role,
                config: FlowConfig::from_map(&node_dto.config, role),
                session: session.clone() as Arc<dyn SessionProvider>,
                status: session.clone() as Arc<dyn StatusIndicator>,
                executor: session.clone() as Arc<dyn NodeExecutor>,
                timing: timing.clone(),
            };

            log::info!("Starting {} activation on node {}.", role, node_dto.id);
            handles.push(Activation::spawn(ctx));
        }
    }

    if handles.is_empty() {
        log::warn!("Scenario contains no node with a flow service; nothing to do.");
        return Ok(());
    }

    if let Some(movement) = scenario.movement.clone() {
        let session = session.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(movement.delay_ms)).await;
            session.displace(&NodeId::new(movement.node), movement.dx, movement.dy);
        });
    }

    let states = futures::future::join_all(handles).await;
    for state in states {
        match state {
            Ok(state) => log::info!("Activation finished in state {:?}.", state),
            Err(e) => log::error!("Activation task failed: {}", e),
        }
    }

    Ok(())
}
