//! Core types for the nodecanvas document model.
//!
//! This module defines the fundamental identifiers and geometry used
//! throughout the crate: the closed set of node kinds a canvas document may
//! contain, 2D positions, and the viewport rectangle renderers track.
//!
//! Node and edge ids are plain strings; [`fresh_id`] produces collision-free
//! ones for callers that do not bring their own.
//!
//! # Examples
//!
//! ```rust
//! use nodecanvas::types::NodeKind;
//!
//! let kind = NodeKind::TextPrompt;
//! assert_eq!(kind.encode(), "text-prompt");
//! assert_eq!(NodeKind::decode("text-prompt"), Some(NodeKind::TextPrompt));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the type of a node on the canvas.
///
/// The set is closed: every node a document can hold is one of these kinds,
/// and each kind carries its own typed payload (see
/// [`NodeData`](crate::node::NodeData)).
///
/// # Persistence
///
/// `NodeKind` serializes to the kebab-case tag used by the document's JSON
/// form; [`encode`](Self::encode)/[`decode`](Self::decode) expose the same
/// mapping for callers working with raw strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// A reusable workflow invocation with named inputs.
    Workflow,
    /// A literal value (text, number, media url).
    Primitive,
    /// A generation result holding a preview.
    Result,
    /// Merges several inputs into one payload.
    Combine,
    /// Free-floating annotation; not part of data flow.
    Comment,
    /// Gallery of generated images.
    ImageOutput,
    /// Prompt editor with attached references.
    PromptInput,
    /// External reference image or document.
    Reference,
    /// Plain text prompt.
    TextPrompt,
}

impl NodeKind {
    /// Encode this kind as its stable string tag.
    pub fn encode(&self) -> &'static str {
        match self {
            NodeKind::Workflow => "workflow",
            NodeKind::Primitive => "primitive",
            NodeKind::Result => "result",
            NodeKind::Combine => "combine",
            NodeKind::Comment => "comment",
            NodeKind::ImageOutput => "image-output",
            NodeKind::PromptInput => "prompt-input",
            NodeKind::Reference => "reference",
            NodeKind::TextPrompt => "text-prompt",
        }
    }

    /// Decode a string tag back into a kind. Returns `None` for unknown tags.
    pub fn decode(tag: &str) -> Option<Self> {
        Some(match tag {
            "workflow" => NodeKind::Workflow,
            "primitive" => NodeKind::Primitive,
            "result" => NodeKind::Result,
            "combine" => NodeKind::Combine,
            "comment" => NodeKind::Comment,
            "image-output" => NodeKind::ImageOutput,
            "prompt-input" => NodeKind::PromptInput,
            "reference" => NodeKind::Reference,
            "text-prompt" => NodeKind::TextPrompt,
            _ => return None,
        })
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.encode())
    }
}

/// 2D position of a node on the canvas, in canvas coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The visible viewport of the canvas: pan offset plus zoom factor.
///
/// Tracked alongside the document for persistence but never part of undo
/// history; panning and zooming are not document edits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

/// Generate a fresh unique id for a node or edge.
///
/// Callers that add nodes programmatically must guarantee id uniqueness;
/// this is the supported way to do that.
pub fn fresh_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
