use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::domain::config::{FlowConfig, GenerationMode, TransportProtocol, WILDCARD};
use crate::domain::node::{Node, NodeId, Role};
use crate::domain::session::session::FlowHandle;
use crate::error::{Error, Result};

/// Ports are allocated as `BASE_PORT + numeric suffix of the sink-side
/// node`, so both endpoints of a pair agree on the port and distinct sinks
/// never collide.
pub const BASE_PORT: u16 = 5200;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// One planned or launched traffic session between this node and one peer.
#[derive(Debug, Clone)]
pub struct FlowDescriptor {
    pub peer_id: NodeId,
    pub port: u16,
    pub command_line: String,
    pub artifact_path: PathBuf,

    /// Set by the launcher; `None` until the flow is actually started.
    pub launched_at: Option<DateTime<Local>>,
    /// Logical process descriptor recorded at launch.
    pub handle: Option<FlowHandle>,
}

/// Per-activation flow set, keyed by peer identifier (keys unique).
pub type FlowSet = HashMap<NodeId, FlowDescriptor>;

fn allocate_port(sink_side: &NodeId) -> Result<u16> {
    let suffix = sink_side
        .numeric_suffix()
        .ok_or_else(|| Error::CommandConstructionError(format!("Node '{}' has no numeric suffix for port allocation.", sink_side)))?;

    BASE_PORT
        .checked_add(suffix)
        .ok_or_else(|| Error::CommandConstructionError(format!("Node '{}': suffix {} exceeds the port range.", sink_side, suffix)))
}

fn artifact_path(work_dir: &Path, self_role: Role, self_id: &NodeId, peer_id: &NodeId, port: u16, timestamp: &str) -> PathBuf {
    work_dir.join(format!(
        "{}_{}_{}_{}_Port_{}_Time_{}.txt",
        self_role.artifact_word(),
        self_id,
        self_role.opposite().artifact_word(),
        peer_id,
        port,
        timestamp
    ))
}

/// Builds the one-shot listener invocation for a sink node.
///
/// The port derives from the sink's own numeric suffix; the listener
/// terminates after one session and logs to the artifact path.
pub fn build_sink_flow(self_id: &NodeId, peer: &Node, work_dir: &Path, timestamp: &str) -> Result<FlowDescriptor> {
    let port = allocate_port(self_id)?;
    let artifact = artifact_path(work_dir, Role::Sink, self_id, &peer.id, port, timestamp);

    let command_line = format!("iperf3 --server --port {} --one-off --logfile {}", port, artifact.display());

    Ok(FlowDescriptor { peer_id: peer.id.clone(), port, command_line, artifact_path: artifact, launched_at: None, handle: None })
}

/// Builds the client invocation for a source node against one sink peer.
///
/// The port derives from the peer's numeric suffix so it matches the
/// listener the peer binds for itself. Wildcard-valued fields omit their
/// flag; interval and omit are always emitted; the generation mode selects
/// exactly one of time, block count, or byte count; TCP is the unmarked
/// default transport. Numeric values pass through untransformed.
pub fn build_source_flow(self_id: &NodeId, peer: &Node, config: &FlowConfig, work_dir: &Path, timestamp: &str) -> Result<FlowDescriptor> {
    let port = allocate_port(&peer.id)?;

    let peer_address = peer
        .interfaces
        .first()
        .ok_or_else(|| Error::CommandConstructionError(format!("Peer '{}' has no interface address.", peer.id)))?;

    let mut args = format!("--port {}", port);

    if config.buffer_length != WILDCARD {
        args.push_str(&format!(" --length {}", config.buffer_length));
    }

    if config.data_rate != WILDCARD {
        args.push_str(&format!(" --bitrate {}", config.data_rate));
    }

    if config.format != WILDCARD {
        args.push_str(&format!(" --format {}", config.format));
    }

    args.push_str(&format!(" --interval {}", config.interval));
    args.push_str(&format!(" --omit {}", config.omit));

    match config.generation_mode {
        GenerationMode::Blocks => args.push_str(&format!(" --blockcount {}", config.total_blocks)),
        GenerationMode::Bytes => args.push_str(&format!(" --bytes {}", config.total_bytes)),
        GenerationMode::Duration => args.push_str(&format!(" --time {}", config.simulation_duration)),
    }

    match config.transport {
        TransportProtocol::Udp => args.push_str(" --udp"),
        TransportProtocol::Sctp => args.push_str(" --sctp"),
        TransportProtocol::Tcp => {}
    }

    let artifact = artifact_path(work_dir, Role::Source, self_id, &peer.id, port, timestamp);
    let command_line = format!("iperf3 --client {} {} --logfile {}", peer_address, args, artifact.display());

    Ok(FlowDescriptor { peer_id: peer.id.clone(), port, command_line, artifact_path: artifact, launched_at: None, handle: None })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::Position;
    use std::collections::HashMap;

    fn peer(id: &str, address: &str) -> Node {
        Node {
            id: NodeId::new(id),
            position: Position::new(0.0, 0.0),
            services: Some(vec!["FlowDestination".to_string()]),
            interfaces: vec![address.to_string()],
        }
    }

    fn config_with(overrides: &[(&str, &str)]) -> FlowConfig {
        let mut fields = HashMap::new();
        for (key, value) in overrides {
            fields.insert(key.to_string(), value.to_string());
        }
        FlowConfig::from_map(&fields, Role::Source)
    }

    #[test]
    fn sink_command_binds_its_own_port_one_shot() {
        let flow = build_sink_flow(&NodeId::new("n2"), &peer("n3", "10.0.0.3"), Path::new("/tmp/n2.conf"), "2026-01-01_00:00:00").unwrap();

        assert_eq!(flow.port, 5202);
        assert_eq!(
            flow.command_line,
            format!("iperf3 --server --port 5202 --one-off --logfile {}", flow.artifact_path.display())
        );
        assert!(flow.artifact_path.to_string_lossy().contains("Server_n2_Client_n3_Port_5202"));
    }

    #[test]
    fn source_command_uses_defaults_and_the_peer_port() {
        let config = config_with(&[]);
        let flow =
            build_source_flow(&NodeId::new("n3"), &peer("n2", "10.0.0.2"), &config, Path::new("/tmp/n3.conf"), "2026-01-01_00:00:00").unwrap();

        assert_eq!(flow.port, 5202);
        assert_eq!(
            flow.command_line,
            format!("iperf3 --client 10.0.0.2 --port 5202 --interval 1 --omit 0 --time 100 --logfile {}", flow.artifact_path.display())
        );
        assert!(flow.artifact_path.to_string_lossy().contains("Client_n3_Server_n2_Port_5202"));
    }

    #[test]
    fn bytes_mode_with_udp_excludes_time() {
        let config = config_with(&[("TrafficGenerationOption", "No. of Bytes"), ("TotalBytes", "2G"), ("TransportProtocol", "UDP")]);
        let flow =
            build_source_flow(&NodeId::new("n3"), &peer("n2", "10.0.0.2"), &config, Path::new("/tmp/n3.conf"), "2026-01-01_00:00:00").unwrap();

        assert!(flow.command_line.contains("--bytes 2G"));
        assert!(flow.command_line.contains("--udp"));
        assert!(!flow.command_line.contains("--time"));
        assert!(!flow.command_line.contains("--blockcount"));
    }

    #[test]
    fn optional_fields_emit_in_fixed_precedence() {
        let config = config_with(&[
            ("BufferLength", "64K"),
            ("DataRate", "5Mbits"),
            ("Format", "Mbits"),
            ("TrafficGenerationOption", "No. of Blocks"),
            ("TotalBlocks", "500"),
            ("TransportProtocol", "SCTP"),
        ]);
        let flow =
            build_source_flow(&NodeId::new("n1"), &peer("n2", "10.0.0.2"), &config, Path::new("/tmp/n1.conf"), "2026-01-01_00:00:00").unwrap();

        assert!(flow.command_line.contains(
            "--port 5202 --length 64K --bitrate 5Mbits --format Mbits --interval 1 --omit 0 --blockcount 500 --sctp"
        ));
    }

    #[test]
    fn build_is_deterministic_modulo_timestamp() {
        let config = config_with(&[("DataRate", "1Mbits")]);
        let a = build_source_flow(&NodeId::new("n3"), &peer("n2", "10.0.0.2"), &config, Path::new("/tmp/n3.conf"), "2026-01-01_00:00:00").unwrap();
        let b = build_source_flow(&NodeId::new("n3"), &peer("n2", "10.0.0.2"), &config, Path::new("/tmp/n3.conf"), "2026-01-01_00:00:00").unwrap();

        assert_eq!(a.command_line, b.command_line);
        assert_eq!(a.artifact_path, b.artifact_path);
    }

    #[test]
    fn port_allocation_is_injective_over_numeric_suffixes() {
        let ids = ["n1", "n7", "n12", "n100"];
        let mut ports: Vec<u16> = ids.iter().map(|id| allocate_port(&NodeId::new(*id)).unwrap()).collect();
        ports.sort_unstable();
        ports.dedup();

        assert_eq!(ports.len(), ids.len());
    }

    #[test]
    fn nodes_without_a_numeric_suffix_cannot_allocate() {
        assert!(allocate_port(&NodeId::new("router")).is_err());
    }

    #[test]
    fn suffixes_beyond_the_port_range_are_rejected_not_wrapped() {
        // 5200 + 61000 does not fit in a u16; the peer is skipped instead
        // of taking the activation down.
        assert!(allocate_port(&NodeId::new("n61000")).is_err());
        assert!(build_sink_flow(&NodeId::new("n61000"), &peer("n3", "10.0.0.3"), Path::new("/tmp/n.conf"), "2026-01-01_00:00:00").is_err());

        // The largest representable suffix still allocates.
        assert_eq!(allocate_port(&NodeId::new("n60335")).unwrap(), u16::MAX);
    }

    #[test]
    fn peers_without_interfaces_are_rejected() {
        let mut sink = peer("n2", "10.0.0.2");
        sink.interfaces.clear();

        let result = build_source_flow(&NodeId::new("n3"), &sink, &config_with(&[]), Path::new("/tmp/n3.conf"), "2026-01-01_00:00:00");
        assert!(result.is_err());
    }
}
