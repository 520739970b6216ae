#![allow(dead_code)]

use nodecanvas::document::GraphDocument;
use nodecanvas::node::{CanvasNode, CombineMode, NodeData};
use nodecanvas::types::Position;

pub fn text_prompt(id: &str) -> CanvasNode {
    CanvasNode::new(
        id,
        Position::default(),
        NodeData::TextPrompt {
            content: format!("prompt {id}"),
            suggestion: None,
        },
    )
}

pub fn image_output(id: &str) -> CanvasNode {
    CanvasNode::new(
        id,
        Position::new(320.0, 0.0),
        NodeData::ImageOutput {
            images: vec![],
            selected_index: None,
        },
    )
}

pub fn combine(id: &str) -> CanvasNode {
    CanvasNode::new(
        id,
        Position::new(160.0, 160.0),
        NodeData::Combine {
            mode: CombineMode::Images,
            inputs: vec![],
        },
    )
}

pub fn comment(id: &str) -> CanvasNode {
    CanvasNode::new(
        id,
        Position::new(-80.0, -80.0),
        NodeData::Comment {
            comment: "note".into(),
            color: "#ffd700".into(),
            width: 200.0,
            height: 120.0,
        },
    )
}

/// Two nodes `a -> b` connected on `output`/`input`.
pub fn connected_pair() -> GraphDocument {
    let mut doc = GraphDocument::new();
    doc.add_node(text_prompt("a"));
    doc.add_node(image_output("b"));
    doc.connect("a", "output", "b", "input")
        .expect("pair connects");
    doc
}
