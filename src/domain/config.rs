use std::collections::HashMap;

use crate::domain::node::Role;

/// Sentinel meaning "use the traffic generator's own default, omit the flag".
pub const WILDCARD: &str = "*";

/// Transport layer protocol of a flow. TCP is the unmarked default; only the
/// other two emit a command-line flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportProtocol {
    Tcp,
    Udp,
    Sctp,
}

impl TransportProtocol {
    fn parse(value: &str) -> TransportProtocol {
        match value {
            "UDP" => TransportProtocol::Udp,
            "SCTP" => TransportProtocol::Sctp,
            // Default is TCP, including for unrecognized values.
            _ => TransportProtocol::Tcp,
        }
    }
}

/// Mutually-exclusive traffic generation mode. Duration is the default for
/// unrecognized values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Duration,
    Blocks,
    Bytes,
}

impl GenerationMode {
    fn parse(value: &str) -> GenerationMode {
        match value {
            "No. of Blocks" => GenerationMode::Blocks,
            "No. of Bytes" => GenerationMode::Bytes,
            _ => GenerationMode::Duration,
        }
    }
}

/// Resolved configuration of one node's flow service.
///
/// Field names and defaults mirror the service's configuration surface; all
/// numeric values stay untransformed strings, malformed input is the traffic
/// generator's concern.
#[derive(Debug, Clone)]
pub struct FlowConfig {
    /// Peer filter expression: wildcard, or comma-separated node names.
    pub peers: String,

    pub data_rate: String,
    pub transport: TransportProtocol,
    pub omit: String,
    pub interval: String,
    pub generation_mode: GenerationMode,
    pub simulation_duration: String,
    pub total_blocks: String,
    pub total_bytes: String,
    pub format: String,
    pub buffer_length: String,

    /// Bypass the readiness wait entirely.
    pub start_immediately: bool,

    /// Finalization target directory; wildcard means the default directory
    /// under the session's working area.
    pub log_directory: String,
}

impl FlowConfig {
    /// Builds a config from the provider's field-name to value mapping.
    /// Absent fields take their defaults, unknown fields are ignored.
    pub fn from_map(fields: &HashMap<String, String>, role: Role) -> FlowConfig {
        let get = |key: &str, default: &str| fields.get(key).cloned().unwrap_or_else(|| default.to_string());

        FlowConfig {
            peers: get(role.peer_filter_field(), WILDCARD),
            data_rate: get("DataRate", WILDCARD),
            transport: TransportProtocol::parse(&get("TransportProtocol", "TCP")),
            omit: get("Omit", "0"),
            interval: get("Interval", "1"),
            generation_mode: GenerationMode::parse(&get("TrafficGenerationOption", "Simulation Duration")),
            simulation_duration: get("SimulationDuration", "100"),
            total_blocks: get("TotalBlocks", "0"),
            total_bytes: get("TotalBytes", "1G"),
            format: get("Format", WILDCARD),
            buffer_length: get("BufferLength", WILDCARD),
            start_immediately: get("StartImmediately", "false") == "true",
            log_directory: get("LogDirectory", WILDCARD),
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        FlowConfig::from_map(&HashMap::new(), Role::Source)
    }
}
