use std::collections::HashMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::api::scenario_dto::ScenarioDto;
use crate::domain::node::{Node, NodeId, Position};
use crate::domain::session::session::{FlowHandle, NodeExecutor, NodeStatus, SessionProvider, StatusIndicator};
use crate::error::{Error, Result};

/// How many process-listing polls a simulated flow survives by default.
const DEFAULT_FLOW_POLL_BUDGET: u32 = 3;

#[derive(Debug, Clone)]
struct FakeProcess {
    handle: FlowHandle,
    node: NodeId,
    command: String,
    remaining_polls: u32,
}

#[derive(Debug)]
struct SessionState {
    nodes: HashMap<NodeId, Node>,
    work_dirs: HashMap<NodeId, PathBuf>,
    statuses: HashMap<NodeId, Vec<NodeStatus>>,
    processes: Vec<FakeProcess>,
    files: HashSet<PathBuf>,
    relocations: Vec<(PathBuf, PathBuf)>,
    flow_poll_budget: u32,
    handle_liveness: bool,
    listing_fails: bool,
    next_handle: u64,
}

/// In-memory session backing the binary's demo mode and the tests.
///
/// Implements all three collaborator seams: topology queries, the status
/// indicator (recorded, plus the canvas icon logged) and a process execution
/// facility whose "processes" live for a configured number of listing polls.
#[derive(Debug)]
pub struct SimulatedSession {
    state: Mutex<SessionState>,
}

impl SimulatedSession {
    pub fn new() -> SimulatedSession {
        SimulatedSession {
            state: Mutex::new(SessionState {
                nodes: HashMap::new(),
                work_dirs: HashMap::new(),
                statuses: HashMap::new(),
                processes: Vec::new(),
                files: HashSet::new(),
                relocations: Vec::new(),
                flow_poll_budget: DEFAULT_FLOW_POLL_BUDGET,
                handle_liveness: false,
                listing_fails: false,
                next_handle: 1,
            }),
        }
    }

    pub fn from_dto(dto: &ScenarioDto) -> Result<SimulatedSession> {
        let session = SimulatedSession::new();

        for node_dto in &dto.nodes {
            let id = NodeId::new(node_dto.id.clone());

            if session.node(&id).is_some() {
                return Err(Error::ScenarioConstructionError(format!("Duplicate node id '{}' in scenario.", id)));
            }

            session.add_node(Node {
                id,
                position: Position::new(node_dto.x, node_dto.y),
                services: node_dto.services.clone(),
                interfaces: node_dto.interfaces.clone(),
            });
        }

        if let Some(budget) = dto.flow_poll_budget {
            session.set_flow_poll_budget(budget);
        }

        Ok(session)
    }

    pub fn add_node(&self, node: Node) {
        let mut state = self.state.lock().unwrap();
        state.nodes.insert(node.id.clone(), node);
    }

    /// Moves a node on the canvas; this is what fires the readiness signal.
    pub fn displace(&self, id: &NodeId, dx: f64, dy: f64) {
        let mut state = self.state.lock().unwrap();
        if let Some(node) = state.nodes.get_mut(id) {
            node.position.x += dx;
            node.position.y += dy;
            log::info!("Node {} moved to ({}, {}).", id, node.position.x, node.position.y);
        }
    }

    pub fn set_work_dir(&self, id: &NodeId, dir: PathBuf) {
        let mut state = self.state.lock().unwrap();
        state.work_dirs.insert(id.clone(), dir);
    }

    pub fn set_flow_poll_budget(&self, polls: u32) {
        let mut state = self.state.lock().unwrap();
        state.flow_poll_budget = polls;
    }

    /// Makes `is_running` answer from handles instead of returning `None`.
    pub fn enable_handle_liveness(&self) {
        let mut state = self.state.lock().unwrap();
        state.handle_liveness = true;
    }

    /// Simulates a torn-down session: every later listing request fails.
    pub fn fail_listings(&self) {
        let mut state = self.state.lock().unwrap();
        state.listing_fails = true;
    }

    pub fn statuses(&self, id: &NodeId) -> Vec<NodeStatus> {
        let state = self.state.lock().unwrap();
        state.statuses.get(id).cloned().unwrap_or_default()
    }

    pub fn spawned_commands(&self, id: &NodeId) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.processes.iter().filter(|p| &p.node == id).map(|p| p.command.clone()).collect()
    }

    pub fn relocations(&self) -> Vec<(PathBuf, PathBuf)> {
        let state = self.state.lock().unwrap();
        state.relocations.clone()
    }

    pub fn file_exists(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.files.contains(path)
    }

    /// The external process creates its own log file; mirror that here by
    /// registering the `--logfile` argument as an existing file.
    fn register_artifact(state: &mut SessionState, command: &str) {
        let mut tokens = command.split_whitespace();
        while let Some(token) = tokens.next() {
            if token == "--logfile" {
                if let Some(path) = tokens.next() {
                    state.files.insert(PathBuf::from(path));
                }
                return;
            }
        }
    }
}

impl Default for SimulatedSession {
    fn default() -> Self {
        SimulatedSession::new()
    }
}

impl SessionProvider for SimulatedSession {
    fn node(&self, id: &NodeId) -> Option<Node> {
        let state = self.state.lock().unwrap();
        state.nodes.get(id).cloned()
    }

    fn node_ids(&self) -> Vec<NodeId> {
        let state = self.state.lock().unwrap();
        state.nodes.keys().cloned().collect()
    }

    fn work_dir(&self, id: &NodeId) -> PathBuf {
        let state = self.state.lock().unwrap();
        match state.work_dirs.get(id) {
            Some(dir) => dir.clone(),
            None => std::env::temp_dir().join("flow_orchestrator").join(format!("{}.conf", id)),
        }
    }
}

impl StatusIndicator for SimulatedSession {
    fn set_status(&self, id: &NodeId, status: NodeStatus) {
        let mut state = self.state.lock().unwrap();
        log::info!("Node {} icon set to '{}'.", id, status.icon());
        state.statuses.entry(id.clone()).or_default().push(status);
    }
}

impl NodeExecutor for SimulatedSession {
    fn spawn_background(&self, id: &NodeId, command: &str) -> Result<FlowHandle> {
        let mut state = self.state.lock().unwrap();

        let handle = FlowHandle(state.next_handle);
        state.next_handle += 1;

        Self::register_artifact(&mut state, command);

        let budget = state.flow_poll_budget;
        state.processes.push(FakeProcess { handle, node: id.clone(), command: command.to_string(), remaining_polls: budget });

        Ok(handle)
    }

    fn process_listing(&self, id: &NodeId) -> Result<String> {
        let mut state = self.state.lock().unwrap();

        if state.listing_fails {
            return Err(Error::ExecutionError(format!("Process listing unavailable for node {}.", id)));
        }

        let mut listing = String::from("USER PID %CPU %MEM COMMAND\n");
        for (index, process) in state.processes.iter().enumerate() {
            if &process.node == id && process.remaining_polls > 0 {
                listing.push_str(&format!("root {} 0.0 0.1 {}\n", 1000 + index, process.command));
            }
        }

        // Each poll ages the polling node's processes by one.
        for process in state.processes.iter_mut() {
            if &process.node == id && process.remaining_polls > 0 {
                process.remaining_polls -= 1;
            }
        }

        Ok(listing)
    }

    fn is_running(&self, handle: &FlowHandle) -> Option<bool> {
        let state = self.state.lock().unwrap();

        if !state.handle_liveness {
            return None;
        }

        Some(state.processes.iter().any(|p| &p.handle == handle && p.remaining_polls > 0))
    }

    fn move_file(&self, id: &NodeId, from: &Path, to: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        if !state.files.remove(from) {
            return Err(Error::ExecutionError(format!("Node {}: no such file '{}'.", id, from.display())));
        }

        state.files.insert(to.to_path_buf());
        state.relocations.push((from.to_path_buf(), to.to_path_buf()));
        Ok(())
    }

    fn remove_file(&self, id: &NodeId, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        if state.files.remove(path) {
            Ok(())
        } else {
            Err(Error::ExecutionError(format!("Node {}: no such file '{}'.", id, path.display())))
        }
    }
}
