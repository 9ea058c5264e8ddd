//! Inbound boundaries: node specs for building trees and the command set a
//! dispatcher can invoke.
//!
//! Both are serde types so a collaborator can hand them over as JSON.

use crate::node::{
    Attr, AttrValue, Attributes, BlockKind, LeafValue, NodeArena, NodeId, NodeKind, TreeError,
};
use crate::range::{Edge, Position};
use crate::tree::{ContentTree, TreeConfig};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Declarative description of a subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeSpec {
    Block {
        kind: BlockKind,
        #[serde(default)]
        attrs: Vec<Attr>,
        #[serde(default)]
        children: Vec<NodeSpec>,
    },
    /// One character leaf per grapheme cluster.
    Text {
        text: String,
        #[serde(default)]
        attrs: Vec<Attr>,
    },
    LineBreak,
    Embed {
        kind: String,
        value: String,
    },
    Extension {
        name: String,
        #[serde(default)]
        atomic: bool,
        #[serde(default)]
        children: Vec<NodeSpec>,
    },
}

impl NodeSpec {
    pub fn paragraph(text: &str) -> Self {
        NodeSpec::Block {
            kind: BlockKind::Paragraph,
            attrs: Vec::new(),
            children: vec![NodeSpec::text(text)],
        }
    }

    pub fn text(text: &str) -> Self {
        NodeSpec::Text {
            text: text.to_string(),
            attrs: Vec::new(),
        }
    }

    /// Creates the described nodes, detached, and returns the top-level
    /// ids (several for a text spec).
    pub fn build(&self, arena: &mut NodeArena) -> Result<Vec<NodeId>, TreeError> {
        match self {
            NodeSpec::Block {
                kind,
                attrs,
                children,
            } => {
                let block = arena.create_with(NodeKind::Block(kind.clone()), flags(attrs))?;
                build_children(arena, block, children)?;
                Ok(vec![block])
            }
            NodeSpec::Text { text, attrs } => text
                .graphemes(true)
                .map(|grapheme| {
                    arena.create_with(
                        NodeKind::Leaf(LeafValue::Char(grapheme.to_string())),
                        flags(attrs),
                    )
                })
                .collect(),
            NodeSpec::LineBreak => Ok(vec![arena.create(NodeKind::Leaf(LeafValue::LineBreak))?]),
            NodeSpec::Embed { kind, value } => Ok(vec![arena.create(NodeKind::Leaf(
                LeafValue::Embed {
                    kind: kind.clone(),
                    value: value.clone(),
                },
            ))?]),
            NodeSpec::Extension {
                name,
                atomic,
                children,
            } => {
                let node = arena.create(NodeKind::Extension {
                    name: name.clone(),
                    atomic: *atomic,
                })?;
                build_children(arena, node, children)?;
                Ok(vec![node])
            }
        }
    }
}

fn flags(attrs: &[Attr]) -> Attributes {
    attrs
        .iter()
        .map(|attr| (attr.clone(), AttrValue::Bool(true)))
        .collect()
}

fn build_children(
    arena: &mut NodeArena,
    parent: NodeId,
    children: &[NodeSpec],
) -> Result<(), TreeError> {
    for spec in children {
        for child in spec.build(arena)? {
            arena.append(parent, child)?;
        }
    }
    Ok(())
}

/// A named operation a dispatcher invokes against the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Insert {
        node: NodeSpec,
    },
    InsertText {
        text: String,
    },
    DeleteSelection,
    DeleteSelectionForward,
    DeleteSelectionBackward,
    SelectAll,
    Select {
        start: NodeId,
        start_position: Position,
        end: NodeId,
        end_position: Position,
    },
    Collapse {
        edge: Edge,
    },
    SplitBlock,
    FormatToggle {
        attr: Attr,
    },
}

/// Nodes a command created and removed.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub inserted: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

impl ContentTree {
    /// Builds a document whose root holds `blocks`, with the cursor at the
    /// start.
    pub fn from_specs(blocks: &[NodeSpec], config: TreeConfig) -> Result<Self, TreeError> {
        let mut arena = NodeArena::new();
        let root = arena.root();
        build_children(&mut arena, root, blocks)?;
        ContentTree::from_arena(arena, config)
    }

    pub fn execute(&mut self, command: &Command) -> Result<Outcome, TreeError> {
        tracing::debug!(?command, "executing command");
        let mut outcome = Outcome::default();
        match command {
            Command::Insert { node } => {
                let nodes = node.build(self.arena_mut())?;
                if !self.is_collapsed() {
                    outcome.removed = self.delete_selection()?;
                }
                self.insert_nodes(&nodes)?;
                outcome.inserted = nodes;
            }
            Command::InsertText { text } => {
                if !self.is_collapsed() {
                    outcome.removed = self.delete_selection()?;
                }
                outcome.inserted = self.insert_text(text)?;
            }
            Command::DeleteSelection => outcome.removed = self.delete_selection()?,
            Command::DeleteSelectionForward => outcome.removed = self.delete_selection_forward()?,
            Command::DeleteSelectionBackward => {
                outcome.removed = self.delete_selection_backward()?
            }
            Command::SelectAll => self.select_all()?,
            Command::Select {
                start,
                start_position,
                end,
                end_position,
            } => self.select(*start, *start_position, *end, *end_position)?,
            Command::Collapse { edge } => self.collapse(*edge)?,
            Command::SplitBlock => {
                if !self.is_collapsed() {
                    outcome.removed = self.delete_selection()?;
                }
                outcome.inserted = vec![self.split_block()?];
            }
            Command::FormatToggle { attr } => self.format_toggle(attr.clone())?,
        }
        Ok(outcome)
    }
}
