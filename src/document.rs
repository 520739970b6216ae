//! The graph document store: canonical owner of nodes and edges.
//!
//! [`GraphDocument`] holds the current node and edge collections and exposes
//! the mutation operations everything else builds on. It has no side effects
//! beyond its own collections; history and change notification live in
//! [`crate::history`] and [`crate::composer`], which work on owned clones of
//! the document rather than live references.
//!
//! # Persistence
//!
//! The document round-trips through opaque JSON via [`serialize`] and
//! [`hydrate`]. Hydration of malformed input fails loudly: a snapshot that
//! does not parse or whose edges dangle indicates a corrupted invariant, not
//! a user-facing condition.
//!
//! [`serialize`]: GraphDocument::serialize
//! [`hydrate`]: GraphDocument::hydrate

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::edge::{validate_connection, ConnectError, Edge};
use crate::node::CanvasNode;
use crate::types::fresh_id;

/// Errors raised when loading a persisted document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The snapshot did not parse into a document.
    #[error("malformed document snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// An edge references a node that is not in the snapshot.
    #[error("edge {edge} references missing node {node}")]
    DanglingEdge { edge: String, node: String },
}

/// A node removed by [`GraphDocument::remove_node`], together with the
/// incident edges that were removed with it.
#[derive(Clone, Debug, PartialEq)]
pub struct RemovedNode {
    pub node: CanvasNode,
    pub edges: Vec<Edge>,
}

/// An in-memory graph document: the canonical nodes and edges collections.
///
/// Cloning a document yields a fully independent snapshot; `PartialEq`
/// provides the structural (deep) equality the history layer uses to detect
/// no-op updates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&CanvasNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Mutable lookup, for in-place payload edits.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut CanvasNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Look up an edge by id.
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// Edges targeting the given node.
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Append a node.
    ///
    /// Id collisions are ignored silently; callers must guarantee uniqueness,
    /// typically via [`fresh_id`](crate::types::fresh_id).
    pub fn add_node(&mut self, node: CanvasNode) {
        if self.node(&node.id).is_some() {
            tracing::debug!(node_id = %node.id, "ignoring node with colliding id");
            return;
        }
        self.nodes.push(node);
    }

    /// Validate and append a new edge, returning its generated id.
    pub fn connect(
        &mut self,
        source: &str,
        source_port: &str,
        target: &str,
        target_port: &str,
    ) -> Result<String, ConnectError> {
        validate_connection(
            &self.nodes,
            &self.edges,
            source,
            source_port,
            target,
            target_port,
        )?;
        let id = fresh_id();
        self.edges
            .push(Edge::new(&id, source, source_port, target, target_port));
        Ok(id)
    }

    /// Remove an edge by id. Removing a missing edge is a no-op.
    pub fn disconnect(&mut self, edge_id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != edge_id);
        self.edges.len() != before
    }

    /// Remove a node and all edges incident to it.
    ///
    /// Returns the removed node and edges so the caller can record the
    /// cascade as a single history entry, or `None` if the node is unknown.
    pub fn remove_node(&mut self, node_id: &str) -> Option<RemovedNode> {
        let index = self.nodes.iter().position(|n| n.id == node_id)?;
        let node = self.nodes.remove(index);
        let mut removed_edges = Vec::new();
        self.edges.retain(|e| {
            if e.source == node_id || e.target == node_id {
                removed_edges.push(e.clone());
                false
            } else {
                true
            }
        });
        Some(RemovedNode {
            node,
            edges: removed_edges,
        })
    }

    /// Serialize the document to an opaque JSON snapshot.
    pub fn serialize(&self) -> Value {
        serde_json::to_value(self).expect("document serialization is infallible")
    }

    /// Rebuild a document from a persisted snapshot.
    pub fn hydrate(snapshot: Value) -> Result<Self, DocumentError> {
        let document: GraphDocument = serde_json::from_value(snapshot)?;
        document.check_integrity()?;
        Ok(document)
    }

    /// Verify that every edge references nodes present in the document.
    pub fn check_integrity(&self) -> Result<(), DocumentError> {
        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if self.node(endpoint).is_none() {
                    return Err(DocumentError::DanglingEdge {
                        edge: edge.id.clone(),
                        node: endpoint.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
