//! Node model: canvas nodes and their per-kind typed payloads.
//!
//! Every node carries a [`NodeData`] variant matching its
//! [`NodeKind`](crate::types::NodeKind). The payloads are a serde-tagged
//! union, so a document round-trips through JSON with the kind tag embedded
//! in the payload and callers dispatch on the variant with ordinary pattern
//! matching instead of dynamic property access.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::types::{NodeKind, Position};

/// The media type a workflow or primitive produces or holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Text,
    Number,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Text => "text",
            MediaKind::Number => "number",
        };
        f.write_str(label)
    }
}

/// How a combine node merges its inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineMode {
    Images,
    Text,
    Audio,
}

/// A reference attachment on a prompt-input node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromptReference {
    pub id: String,
    pub thumbnail: String,
}

/// Type-specific payload of a canvas node, tagged by node kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NodeData {
    /// Invocation of a hosted workflow with named inputs.
    Workflow {
        workflow_id: String,
        workflow_name: String,
        #[serde(default)]
        inputs: FxHashMap<String, Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        output_kind: Option<MediaKind>,
        #[serde(skip_serializing_if = "Option::is_none")]
        thumbnail: Option<String>,
    },
    /// A literal value of a declared media kind.
    Primitive { value_kind: MediaKind, value: Value },
    /// A generation result with an optional preview url.
    Result {
        #[serde(skip_serializing_if = "Option::is_none")]
        output_kind: Option<MediaKind>,
        #[serde(skip_serializing_if = "Option::is_none")]
        src: Option<String>,
    },
    /// Merges collected inputs under one mode.
    Combine {
        mode: CombineMode,
        #[serde(default)]
        inputs: Vec<Value>,
    },
    /// Canvas annotation; carries its own geometry since comments resize.
    Comment {
        comment: String,
        color: String,
        width: f64,
        height: f64,
    },
    /// Gallery of generated image urls.
    ImageOutput {
        #[serde(default)]
        images: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        selected_index: Option<usize>,
    },
    /// Prompt editor with reference attachments.
    PromptInput {
        prompt: String,
        #[serde(default)]
        references: Vec<PromptReference>,
        #[serde(default)]
        generation_count: u32,
    },
    /// External reference image.
    Reference { image_url: String },
    /// Plain text prompt with an optional model suggestion.
    TextPrompt {
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        suggestion: Option<String>,
    },
}

impl NodeData {
    /// The kind tag for this payload.
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::Workflow { .. } => NodeKind::Workflow,
            NodeData::Primitive { .. } => NodeKind::Primitive,
            NodeData::Result { .. } => NodeKind::Result,
            NodeData::Combine { .. } => NodeKind::Combine,
            NodeData::Comment { .. } => NodeKind::Comment,
            NodeData::ImageOutput { .. } => NodeKind::ImageOutput,
            NodeData::PromptInput { .. } => NodeKind::PromptInput,
            NodeData::Reference { .. } => NodeKind::Reference,
            NodeData::TextPrompt { .. } => NodeKind::TextPrompt,
        }
    }
}

/// A node in the canvas document.
///
/// Nodes are created by user action (drop from the library panel, paste,
/// programmatic spawn from a generation result), mutated by direct edits or
/// job completion callbacks, and removed on explicit delete. The document
/// owns the canonical collection; everything else works on clones.
///
/// # Examples
///
/// ```rust
/// use nodecanvas::node::{CanvasNode, NodeData};
/// use nodecanvas::types::{NodeKind, Position};
///
/// let node = CanvasNode::new(
///     "prompt-1",
///     Position::new(120.0, 80.0),
///     NodeData::TextPrompt {
///         content: "a lighthouse at dusk".into(),
///         suggestion: None,
///     },
/// );
/// assert_eq!(node.kind(), NodeKind::TextPrompt);
/// assert!(!node.pinned);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    /// Unique identifier within the document.
    pub id: String,
    /// Canvas position.
    pub position: Position,
    /// Kind-specific payload.
    pub data: NodeData,
    /// Pinned nodes are excluded from bulk drag.
    #[serde(default)]
    pub pinned: bool,
    /// Collapsed nodes render only their header.
    #[serde(default)]
    pub collapsed: bool,
}

impl CanvasNode {
    /// Create a node with default flags.
    pub fn new(id: impl Into<String>, position: Position, data: NodeData) -> Self {
        Self {
            id: id.into(),
            position,
            data,
            pinned: false,
            collapsed: false,
        }
    }

    /// The node's kind, dispatched from its payload.
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    #[must_use]
    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    #[must_use]
    pub fn collapsed(mut self, collapsed: bool) -> Self {
        self.collapsed = collapsed;
        self
    }
}
