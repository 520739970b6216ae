//! The composer store: root state object for one canvas editing session.
//!
//! [`ComposerStore`] ties together the graph document, its undo/redo
//! history, the viewport, and workflow metadata. It distinguishes
//! history-worthy mutations (adding, connecting, removing nodes) from
//! transient ones (per-frame drag positions, viewport pans), and notifies
//! subscribers through a `watch` revision channel after every mutation so
//! renderers can observe without polling.
//!
//! The store is a plain owned value: collaborators receive it explicitly
//! rather than reaching for a process-wide singleton, which keeps the core
//! testable in isolation.
//!
//! # Examples
//!
//! ```rust
//! use nodecanvas::composer::ComposerStore;
//! use nodecanvas::node::{CanvasNode, NodeData};
//! use nodecanvas::types::Position;
//!
//! let mut store = ComposerStore::default();
//! store.add_node(CanvasNode::new(
//!     "a",
//!     Position::default(),
//!     NodeData::TextPrompt { content: "hello".into(), suggestion: None },
//! ));
//! assert_eq!(store.document().nodes.len(), 1);
//!
//! store.undo();
//! assert!(store.document().nodes.is_empty());
//! store.redo();
//! assert_eq!(store.document().nodes.len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::config::ComposerConfig;
use crate::document::{DocumentError, GraphDocument};
use crate::edge::{ConnectError, Edge};
use crate::history::History;
use crate::node::{CanvasNode, NodeData};
use crate::types::{fresh_id, Position, Viewport};

/// Workflow metadata carried alongside the document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkflowMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Default for WorkflowMeta {
    fn default() -> Self {
        Self {
            workflow_id: None,
            title: "Untitled Workflow".to_string(),
            description: None,
            thumbnail: None,
        }
    }
}

/// Persisted form of a composer session: document plus viewport and metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct ComposerSnapshot {
    #[serde(flatten)]
    document: GraphDocument,
    #[serde(default)]
    viewport: Viewport,
    #[serde(default)]
    meta: WorkflowMeta,
}

/// Root state store for a single editor session.
pub struct ComposerStore {
    history: History,
    viewport: Viewport,
    meta: WorkflowMeta,
    revision: watch::Sender<u64>,
}

impl Default for ComposerStore {
    fn default() -> Self {
        Self::new(&ComposerConfig::default())
    }
}

impl ComposerStore {
    pub fn new(config: &ComposerConfig) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            history: History::new(GraphDocument::new(), config.history_limit),
            viewport: Viewport::default(),
            meta: WorkflowMeta::default(),
            revision,
        }
    }

    /// The live document.
    pub fn document(&self) -> &GraphDocument {
        self.history.present()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Update the viewport. Pan/zoom is transient, never undoable.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.notify();
    }

    pub fn meta(&self) -> &WorkflowMeta {
        &self.meta
    }

    pub fn set_meta(&mut self, meta: WorkflowMeta) {
        self.meta = meta;
        self.notify();
    }

    /// Subscribe to document revisions.
    ///
    /// The channel carries a monotonically increasing counter bumped after
    /// every mutation; renderers re-read the store when it changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    // ------------------------------------------------------------------
    // Transient mutations (no history)
    // ------------------------------------------------------------------

    /// Apply a transformation to the node collection without recording
    /// history. Used for continuous interactions such as dragging.
    pub fn set_nodes<F>(&mut self, updater: F)
    where
        F: FnOnce(&mut Vec<CanvasNode>),
    {
        updater(&mut self.history.present_mut().nodes);
        self.notify();
    }

    /// Apply a transformation to the edge collection without recording
    /// history.
    pub fn set_edges<F>(&mut self, updater: F)
    where
        F: FnOnce(&mut Vec<Edge>),
    {
        updater(&mut self.history.present_mut().edges);
        self.notify();
    }

    /// Move a node to a new position without recording history.
    pub fn move_node(&mut self, node_id: &str, position: Position) {
        if let Some(node) = self.history.present_mut().node_mut(node_id) {
            node.position = position;
        }
        self.notify();
    }

    // ------------------------------------------------------------------
    // History-worthy mutations
    // ------------------------------------------------------------------

    /// Apply an arbitrary document transformation as one history entry.
    ///
    /// Structurally-equal results record nothing.
    pub fn apply_with_history<F>(&mut self, updater: F)
    where
        F: FnOnce(&GraphDocument) -> GraphDocument,
    {
        self.history.set_with_history(updater);
        self.notify();
    }

    /// Add a node as one history entry.
    ///
    /// Id collisions are ignored silently (and record nothing, since the
    /// document is unchanged).
    pub fn add_node(&mut self, node: CanvasNode) {
        self.apply_with_history(|doc| {
            let mut next = doc.clone();
            next.add_node(node);
            next
        });
    }

    /// Spawn a node from a payload and position with a generated id,
    /// returning the id. This is the drop-from-library entry point.
    pub fn spawn_node(&mut self, data: NodeData, position: Position) -> String {
        let id = fresh_id();
        self.add_node(CanvasNode::new(&id, position, data));
        id
    }

    /// Validate and create a connection as one history entry.
    ///
    /// Rejected gestures leave the document and history untouched.
    pub fn connect(
        &mut self,
        source: &str,
        source_port: &str,
        target: &str,
        target_port: &str,
    ) -> Result<String, ConnectError> {
        let mut next = self.history.present().clone();
        let edge_id = next
            .connect(source, source_port, target, target_port)
            .inspect_err(|err| tracing::debug!(%err, "connection rejected"))?;
        self.history.set_with_history(|_| next);
        self.notify();
        Ok(edge_id)
    }

    /// Remove an edge as one history entry. Unknown ids are a no-op.
    pub fn disconnect(&mut self, edge_id: &str) {
        self.apply_with_history(|doc| {
            let mut next = doc.clone();
            next.disconnect(edge_id);
            next
        });
    }

    /// Remove a node and its incident edges as a single history entry, so
    /// one undo restores the node together with its connections.
    pub fn remove_node(&mut self, node_id: &str) -> bool {
        let mut next = self.history.present().clone();
        if next.remove_node(node_id).is_none() {
            return false;
        }
        self.history.set_with_history(|_| next);
        self.notify();
        true
    }

    // ------------------------------------------------------------------
    // Drag gestures
    // ------------------------------------------------------------------

    /// Begin a drag gesture; transient moves until [`end_drag`](Self::end_drag)
    /// collapse into at most one history entry.
    pub fn begin_drag(&mut self) {
        self.history.begin_gesture();
    }

    /// End the drag gesture, committing one entry if anything moved.
    pub fn end_drag(&mut self) -> bool {
        let committed = self.history.end_gesture();
        if committed {
            self.notify();
        }
        committed
    }

    // ------------------------------------------------------------------
    // History controls
    // ------------------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo();
        if changed {
            self.notify();
        }
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo();
        if changed {
            self.notify();
        }
        changed
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn reset_history(&mut self) {
        self.history.reset();
        self.notify();
    }

    /// Drop the document and all history, keeping viewport and metadata.
    pub fn clear(&mut self) {
        self.history.replace(GraphDocument::new());
        self.notify();
    }

    // ------------------------------------------------------------------
    // Persistence boundary
    // ------------------------------------------------------------------

    /// Serialize the session (document, viewport, metadata) to opaque JSON.
    pub fn to_json(&self) -> Value {
        let snapshot = ComposerSnapshot {
            document: self.history.present().clone(),
            viewport: self.viewport,
            meta: self.meta.clone(),
        };
        serde_json::to_value(snapshot).expect("composer serialization is infallible")
    }

    /// Load a persisted session, replacing the document and resetting
    /// history. Malformed snapshots fail loudly.
    pub fn load_from_json(&mut self, value: Value) -> Result<(), DocumentError> {
        let snapshot: ComposerSnapshot = serde_json::from_value(value)?;
        snapshot.document.check_integrity()?;
        self.history.replace(snapshot.document);
        self.viewport = snapshot.viewport;
        self.meta = snapshot.meta;
        self.notify();
        Ok(())
    }

    fn notify(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}
