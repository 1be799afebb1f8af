use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Top-level scenario description consumed by the binary and the
/// integration tests. A scenario is a static topology plus an optional
/// scripted movement that fires the readiness signal.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDto {
    pub nodes: Vec<NodeDto>,

    /// Scripted displacement applied after `delayMs`, marking the end of
    /// the setup phase for every activation.
    pub movement: Option<MovementDto>,

    /// How many process-listing polls a simulated flow survives before it
    /// is considered finished.
    #[serde(default)]
    pub flow_poll_budget: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NodeDto {
    pub id: String,

    pub x: f64,
    pub y: f64,

    /// Enabled role-services. Absent (not empty) for infrastructure nodes
    /// that expose no queryable service list.
    #[serde(default)]
    pub services: Option<Vec<String>>,

    /// Interface addresses; the first one is the node's reachable address.
    #[serde(default)]
    pub interfaces: Vec<String>,

    /// Resolved configuration fields for the node's flow service.
    #[serde(default)]
    pub config: HashMap<String, String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MovementDto {
    pub node: String,
    pub dx: f64,
    pub dy: f64,
    pub delay_ms: u64,
}
