//! Outbound rendering boundary.
//!
//! A renderer turns the tree into whatever representation its consumer
//! needs. Node ids are stable across edits, so consecutive renders can be
//! diffed by id.

use crate::node::{Attr, AttrValue, BlockKind, LeafValue, NodeArena, NodeId, NodeKind};
use serde::Serialize;

pub trait Render {
    type Output;

    fn render(&self, arena: &NodeArena, root: NodeId) -> Self::Output;
}

/// Serializable copy of the tree, markers included.
#[derive(Debug, Default, Clone, Copy)]
pub struct Snapshot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<(Attr, AttrValue)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl Render for Snapshot {
    type Output = Option<NodeSnapshot>;

    fn render(&self, arena: &NodeArena, root: NodeId) -> Self::Output {
        let node = arena.get(root)?;
        Some(NodeSnapshot {
            id: node.id(),
            kind: node.kind().clone(),
            attrs: node
                .attributes()
                .iter()
                .map(|(attr, value)| (attr.clone(), value.clone()))
                .collect(),
            children: node
                .children()
                .iter()
                .filter_map(|child| self.render(arena, *child))
                .collect(),
        })
    }
}

/// Compact one-line form, e.g. `p(a[]b)p(c)`.
///
/// Blocks print as `tag(children)`, characters as themselves, the start
/// and end markers as `[` and `]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Outline {
    pub show_attributes: bool,
}

impl Outline {
    pub fn with_attributes() -> Self {
        Self {
            show_attributes: true,
        }
    }

    fn write(&self, arena: &NodeArena, id: NodeId, out: &mut String) {
        let Some(node) = arena.get(id) else {
            return;
        };
        let children = |out: &mut String| {
            for child in node.children() {
                self.write(arena, *child, out);
            }
        };
        match node.kind() {
            NodeKind::Root => children(out),
            NodeKind::Block(kind) => {
                out.push_str(&block_tag(kind));
                out.push('(');
                children(out);
                out.push(')');
            }
            NodeKind::Leaf(LeafValue::Char(value)) => out.push_str(value),
            NodeKind::Leaf(LeafValue::LineBreak) => out.push('⏎'),
            NodeKind::Leaf(LeafValue::Embed { kind, .. }) => {
                out.push('<');
                out.push_str(kind);
                out.push('>');
            }
            NodeKind::RangeStart => out.push('['),
            NodeKind::RangeEnd => out.push(']'),
            NodeKind::Extension { name, atomic: true } => {
                out.push('<');
                out.push_str(name);
                out.push('>');
            }
            NodeKind::Extension { name, atomic: false } => {
                out.push_str(name);
                out.push('(');
                children(out);
                out.push(')');
            }
        }
        if self.show_attributes && !node.attributes().is_empty() {
            let names: Vec<String> = node
                .attributes()
                .iter()
                .filter(|(attr, _)| node.attributes().is_set(attr))
                .map(|(attr, _)| attr.to_string())
                .collect();
            if !names.is_empty() {
                out.push('{');
                out.push_str(&names.join(","));
                out.push('}');
            }
        }
    }
}

impl Render for Outline {
    type Output = String;

    fn render(&self, arena: &NodeArena, root: NodeId) -> String {
        let mut out = String::new();
        self.write(arena, root, &mut out);
        out
    }
}

fn block_tag(kind: &BlockKind) -> String {
    match kind {
        BlockKind::Paragraph => "p".to_string(),
        BlockKind::Heading(level) => format!("h{level}"),
        BlockKind::List { ordered: true } => "ol".to_string(),
        BlockKind::List { ordered: false } => "ul".to_string(),
        BlockKind::ListItem => "li".to_string(),
        BlockKind::Quote => "quote".to_string(),
        BlockKind::Custom(name) => name.clone(),
    }
}

impl crate::tree::ContentTree {
    pub fn render<R: Render>(&self, renderer: &R) -> R::Output {
        renderer.render(self.arena(), self.root())
    }

    /// Shorthand for rendering with the default [`Outline`].
    pub fn outline(&self) -> String {
        self.render(&Outline::default())
    }
}
