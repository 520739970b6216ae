//! # nodecanvas: Node-Graph Document Core for Canvas Editors
//!
//! nodecanvas is the state core of a node-canvas "studio" editor: an
//! in-memory graph document with linear undo/redo history, connection
//! validation, and an asynchronous per-node execution status overlay.
//! Rendering, networking, and persistence storage are external
//! collaborators; this crate owns the document model and its invariants.
//!
//! ## Core Concepts
//!
//! - **Document**: the canonical nodes/edges collections and their mutation
//!   operations
//! - **History**: bounded linear undo/redo over owned document snapshots,
//!   with single-entry drag gestures
//! - **Validation**: pure connection rules (self-loops, port capacity,
//!   duplicates, cycles)
//! - **Execution overlay**: transient per-node run status with stale-stream
//!   protection and per-node subscriptions
//! - **Runner**: dependency-ordered execution through an async job
//!   submission seam
//!
//! ## Quick Start
//!
//! ```
//! use nodecanvas::composer::ComposerStore;
//! use nodecanvas::node::NodeData;
//! use nodecanvas::types::Position;
//!
//! let mut store = ComposerStore::default();
//!
//! let prompt = store.spawn_node(
//!     NodeData::TextPrompt { content: "a red balloon".into(), suggestion: None },
//!     Position::new(0.0, 0.0),
//! );
//! let output = store.spawn_node(
//!     NodeData::ImageOutput { images: vec![], selected_index: None },
//!     Position::new(320.0, 0.0),
//! );
//!
//! store.connect(&prompt, "output", &output, "input").unwrap();
//! assert_eq!(store.document().edges.len(), 1);
//!
//! // Connecting the same ports again is a rejected gesture, not a panic.
//! assert!(store.connect(&prompt, "output", &output, "input").is_err());
//!
//! store.undo();
//! assert!(store.document().edges.is_empty());
//! ```
//!
//! ## Error Handling
//!
//! Expected conditions never panic: invalid connections come back as
//! [`edge::ConnectError`] values, undo/redo past an empty stack is a silent
//! no-op, and stale execution updates are discarded with a debug log.
//! Corrupted invariants (a malformed persisted snapshot) fail loudly as
//! [`document::DocumentError`].
//!
//! ## Module Guide
//!
//! - [`types`] - Node kinds, positions, viewport, id generation
//! - [`node`] - Canvas nodes and their typed payloads
//! - [`edge`] - Edges and the connection validation layer
//! - [`document`] - The graph document store
//! - [`history`] - Undo/redo history and drag gestures
//! - [`composer`] - The per-session root store
//! - [`execution`] - Run status tracking and the execution event log
//! - [`runner`] - Dependency-ordered workflow execution

pub mod composer;
pub mod config;
pub mod document;
pub mod edge;
pub mod execution;
pub mod history;
pub mod node;
pub mod runner;
pub mod telemetry;
pub mod types;
