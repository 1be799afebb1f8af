use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Serialize)]
pub struct Id<T> {
    pub id: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(id: impl Into<String>) -> Self {
        Id { id: id.into(), _marker: PhantomData }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Numeric suffix of the identifier, e.g. `n12 -> 12`.
    ///
    /// Port allocation is keyed on this value; identifiers without a
    /// parsable suffix yield `None`.
    pub fn numeric_suffix(&self) -> Option<u16> {
        let digits_start = self.id.find(|c: char| c.is_ascii_digit())?;
        self.id[digits_start..].parse::<u16>().ok()
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> From<Id<T>> for String {
    fn from(id_wrapper: Id<T>) -> Self {
        id_wrapper.id
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full_name = std::any::type_name::<T>();
        let clean_name = full_name.split("::").last().unwrap_or(full_name);
        let display_name = clean_name.replace("Tag", "Id");

        write!(f, "{}: {:?}", display_name, self.id)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash, Copy)]
pub struct NodeTag;

pub type NodeId = Id<NodeTag>;

/// 2-D canvas position of a node, as reported by the session provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Position {
        Position { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Read-only snapshot of a simulator node.
///
/// Owned by the external session; the orchestration core only observes
/// these and never writes back.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub position: Position,

    /// Enabled role-service names. `None` models infrastructure nodes
    /// (wireless medium, control network) without a queryable list.
    pub services: Option<Vec<String>>,

    /// Interface addresses; the first entry is the reachable address.
    pub interfaces: Vec<String>,
}

impl Node {
    /// First-match-wins per node: true if any enabled service exposes the
    /// given role, so a node counts at most once regardless of how many
    /// services it runs.
    pub fn exposes_role(&self, role: Role) -> bool {
        match &self.services {
            Some(services) => services.iter().any(|s| s.contains(role.service_name())),
            None => false,
        }
    }
}

/// The two ends of a traffic flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Initiates traffic (iperf3 client).
    Source,
    /// Accepts traffic (iperf3 server).
    Sink,
}

impl Role {
    pub fn opposite(&self) -> Role {
        match self {
            Role::Source => Role::Sink,
            Role::Sink => Role::Source,
        }
    }

    /// Service name under which this role is enabled on a node.
    pub fn service_name(&self) -> &'static str {
        match self {
            Role::Source => "FlowSource",
            Role::Sink => "FlowDestination",
        }
    }

    /// Word used for this role in artifact file names.
    pub fn artifact_word(&self) -> &'static str {
        match self {
            Role::Source => "Client",
            Role::Sink => "Server",
        }
    }

    /// Configuration field holding the peer filter expression for this role.
    pub fn peer_filter_field(&self) -> &'static str {
        match self {
            Role::Source => "Destinations",
            Role::Sink => "Sources",
        }
    }

    pub fn from_service_name(service: &str) -> Option<Role> {
        if service.contains(Role::Source.service_name()) {
            Some(Role::Source)
        } else if service.contains(Role::Sink.service_name()) {
            Some(Role::Sink)
        } else {
            None
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Source => write!(f, "source"),
            Role::Sink => write!(f, "sink"),
        }
    }
}
