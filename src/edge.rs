//! Edges and the connection validation layer.
//!
//! An [`Edge`] links a source node's output port to a target node's input
//! port. Validation is pure: [`validate_connection`] inspects the current
//! nodes and edges and rejects self-loops, missing endpoints, duplicates,
//! exhausted port capacity, and connections that would close a cycle.
//! Rejection is an expected condition surfaced as a [`ConnectError`], never a
//! panic; [`can_connect`] is the boolean form for gesture previews.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::node::{CanvasNode, MediaKind, NodeData};

/// A directed connection between two node ports.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier within the document.
    pub id: String,
    /// Source node id.
    pub source: String,
    /// Output port on the source node.
    pub source_port: String,
    /// Target node id.
    pub target: String,
    /// Input port on the target node.
    pub target_port: String,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        source_port: impl Into<String>,
        target: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            source_port: source_port.into(),
            target: target.into(),
            target_port: target_port.into(),
        }
    }
}

/// Why a connection attempt was rejected.
///
/// These are user-facing gesture rejections: the caller drops the gesture and
/// no edge is created. They are not fatal and must not abort the editor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// Source and target are the same node.
    #[error("cannot connect node {0} to itself")]
    SelfLoop(String),

    /// One endpoint does not exist in the document.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// An identical edge already exists.
    ///
    /// Node ids are suffixed `_id` here; thiserror reserves the bare name
    /// `source` for the error cause chain.
    #[error("duplicate connection from {source_id}:{source_port} to {target_id}:{target_port}")]
    Duplicate {
        source_id: String,
        source_port: String,
        target_id: String,
        target_port: String,
    },

    /// The target port has reached its incoming-connection capacity.
    #[error("port {port} on node {node} accepts at most {capacity} connection(s)")]
    PortFull {
        node: String,
        port: String,
        capacity: usize,
    },

    /// The ports carry incompatible media types.
    #[error("type mismatch: cannot connect {source_kind} to {target_kind}")]
    TypeMismatch {
        source_kind: MediaKind,
        target_kind: MediaKind,
    },

    /// The connection would close a directed cycle.
    #[error("connection from {source_id} to {target_id} would create a cycle")]
    Cycle { source_id: String, target_id: String },
}

/// Maximum number of incoming edges a target port accepts.
///
/// `None` means unbounded. Combine nodes collect arbitrarily many inputs on
/// their `inputs` port; every other input port is single-capacity.
pub fn max_incoming(node: &CanvasNode, port: &str) -> Option<usize> {
    match &node.data {
        NodeData::Combine { .. } if port == "inputs" => None,
        _ => Some(1),
    }
}

/// Count edges already targeting `port` on node `target`.
pub fn incoming_count(edges: &[Edge], target: &str, port: &str) -> usize {
    edges
        .iter()
        .filter(|e| e.target == target && e.target_port == port)
        .count()
}

/// Validate a proposed connection against the current document contents.
pub fn validate_connection(
    nodes: &[CanvasNode],
    edges: &[Edge],
    source: &str,
    source_port: &str,
    target: &str,
    target_port: &str,
) -> Result<(), ConnectError> {
    if source == target {
        return Err(ConnectError::SelfLoop(source.to_string()));
    }
    if !nodes.iter().any(|n| n.id == source) {
        return Err(ConnectError::UnknownNode(source.to_string()));
    }
    let Some(target_node) = nodes.iter().find(|n| n.id == target) else {
        return Err(ConnectError::UnknownNode(target.to_string()));
    };

    let duplicate = edges.iter().any(|e| {
        e.source == source
            && e.source_port == source_port
            && e.target == target
            && e.target_port == target_port
    });
    if duplicate {
        return Err(ConnectError::Duplicate {
            source_id: source.to_string(),
            source_port: source_port.to_string(),
            target_id: target.to_string(),
            target_port: target_port.to_string(),
        });
    }

    if let Some(capacity) = max_incoming(target_node, target_port) {
        if incoming_count(edges, target, target_port) >= capacity {
            return Err(ConnectError::PortFull {
                node: target.to_string(),
                port: target_port.to_string(),
                capacity,
            });
        }
    }

    if would_create_cycle(nodes, edges, source, target) {
        return Err(ConnectError::Cycle {
            source_id: source.to_string(),
            target_id: target.to_string(),
        });
    }

    if let (Some(source_kind), Some(target_kind)) =
        (port_media(source_port), port_media(target_port))
    {
        // Text passes through to anything; other kinds must match exactly.
        let compatible = source_kind == MediaKind::Text
            || target_kind == MediaKind::Text
            || source_kind == target_kind;
        if !compatible {
            return Err(ConnectError::TypeMismatch {
                source_kind,
                target_kind,
            });
        }
    }

    Ok(())
}

/// Media type carried by a port, derived from its name.
///
/// Ports that name their payload (`text-output`, `image-input`) are typed;
/// anything else is untyped and connects freely.
pub fn port_media(port: &str) -> Option<MediaKind> {
    if port.contains("text") {
        Some(MediaKind::Text)
    } else if port.contains("image") {
        Some(MediaKind::Image)
    } else if port.contains("video") {
        Some(MediaKind::Video)
    } else if port.contains("audio") {
        Some(MediaKind::Audio)
    } else {
        None
    }
}

/// Boolean form of [`validate_connection`] for gesture previews.
pub fn can_connect(
    nodes: &[CanvasNode],
    edges: &[Edge],
    source: &str,
    source_port: &str,
    target: &str,
    target_port: &str,
) -> bool {
    validate_connection(nodes, edges, source, source_port, target, target_port).is_ok()
}

/// Would adding `source -> target` close a directed cycle?
///
/// Builds the adjacency list including the proposed edge and runs an
/// iterative DFS from the source.
pub fn would_create_cycle(
    nodes: &[CanvasNode],
    edges: &[Edge],
    source: &str,
    target: &str,
) -> bool {
    let mut adjacency: FxHashMap<&str, Vec<&str>> = FxHashMap::default();
    for node in nodes {
        adjacency.entry(node.id.as_str()).or_default();
    }
    for edge in edges {
        adjacency
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }
    adjacency.entry(source).or_default().push(target);

    // Cycle exists iff the source is reachable from itself via the new edge.
    let mut visited: FxHashSet<&str> = FxHashSet::default();
    let mut stack = vec![target];
    while let Some(current) = stack.pop() {
        if current == source {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        if let Some(next) = adjacency.get(current) {
            stack.extend(next.iter().copied());
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeData;
    use crate::types::Position;

    fn prompt(id: &str) -> CanvasNode {
        CanvasNode::new(
            id,
            Position::default(),
            NodeData::TextPrompt {
                content: String::new(),
                suggestion: None,
            },
        )
    }

    #[test]
    fn rejects_self_loop() {
        let nodes = vec![prompt("a")];
        let err = validate_connection(&nodes, &[], "a", "output", "a", "input").unwrap_err();
        assert_eq!(err, ConnectError::SelfLoop("a".into()));
    }

    #[test]
    fn rejects_unknown_endpoints() {
        let nodes = vec![prompt("a")];
        assert!(matches!(
            validate_connection(&nodes, &[], "a", "output", "ghost", "input"),
            Err(ConnectError::UnknownNode(_))
        ));
        assert!(matches!(
            validate_connection(&nodes, &[], "ghost", "output", "a", "input"),
            Err(ConnectError::UnknownNode(_))
        ));
    }

    #[test]
    fn detects_transitive_cycle() {
        let nodes = vec![prompt("a"), prompt("b"), prompt("c")];
        let edges = vec![
            Edge::new("e1", "a", "output", "b", "input"),
            Edge::new("e2", "b", "output", "c", "input"),
        ];
        assert!(would_create_cycle(&nodes, &edges, "c", "a"));
        assert!(!would_create_cycle(&nodes, &edges, "a", "c"));
    }
}
