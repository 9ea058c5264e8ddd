//! Selection-aware editing operations.
//!
//! [`ContentTree`] owns one [`NodeArena`] and its [`RangeModel`]. Each
//! public operation runs to completion synchronously; on error the
//! sub-steps already applied stay applied.

use crate::node::{
    Attr, AttrValue, Direction, LeafValue, Mode, NodeArena, NodeId, NodeKind, ReferenceError,
    TreeError, Violation,
};
use crate::range::{Edge, Position, RangeModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use unicode_segmentation::UnicodeSegmentation;

mod format;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// New characters take the character formatting of the one before them.
    pub inherit_formats: bool,
    /// `insert_text` turns a newline into `split_block` instead of a
    /// `LineBreak` leaf.
    pub newline_splits_block: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            inherit_formats: true,
            newline_splits_block: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContentTree {
    arena: NodeArena,
    range: RangeModel,
    config: TreeConfig,
}

impl Default for ContentTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentTree {
    /// An empty document with a collapsed range inside the root.
    pub fn new() -> Self {
        Self::with_config(TreeConfig::default())
    }

    pub fn with_config(config: TreeConfig) -> Self {
        let arena = NodeArena::new();
        let range = RangeModel::new(&arena);
        Self {
            arena,
            range,
            config,
        }
    }

    /// Adopts a tree built by a collaborator and puts a collapsed range at
    /// the start of the document.
    pub fn from_arena(arena: NodeArena, config: TreeConfig) -> Result<Self, TreeError> {
        arena.check_invariants()?;
        let range = RangeModel::new(&arena);
        let mut tree = Self {
            arena,
            range,
            config,
        };
        let root = tree.arena.root();
        tree.range
            .set_start(&mut tree.arena, root, Position::Before)?;
        tree.range.collapse(&mut tree.arena, Edge::Start)?;
        Ok(tree)
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Direct structural access. Markers stay consistent because the arena
    /// treats them as ordinary children.
    pub fn arena_mut(&mut self) -> &mut NodeArena {
        &mut self.arena
    }

    pub fn range(&self) -> &RangeModel {
        &self.range
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn root(&self) -> NodeId {
        self.arena.root()
    }

    pub fn direction(&self) -> Direction {
        self.range.direction(&self.arena)
    }

    pub fn is_collapsed(&self) -> bool {
        self.range.is_collapsed(&self.arena)
    }

    pub fn selected_nodes(&self) -> Vec<NodeId> {
        self.range.selected_nodes(&self.arena)
    }

    pub fn set_start(&mut self, reference: NodeId, position: Position) -> Result<(), TreeError> {
        self.range.set_start(&mut self.arena, reference, position)
    }

    pub fn set_end(&mut self, reference: NodeId, position: Position) -> Result<(), TreeError> {
        self.range.set_end(&mut self.arena, reference, position)
    }

    pub fn select(
        &mut self,
        start: NodeId,
        start_position: Position,
        end: NodeId,
        end_position: Position,
    ) -> Result<(), TreeError> {
        self.range
            .select(&mut self.arena, start, start_position, end, end_position)
    }

    pub fn collapse(&mut self, edge: Edge) -> Result<(), TreeError> {
        self.range.collapse(&mut self.arena, edge)
    }

    pub fn select_all(&mut self) -> Result<(), TreeError> {
        let root = self.arena.root();
        self.select(root, Position::Before, root, Position::After)
    }

    /// Inserts a detached (or moves an attached) node at the cursor,
    /// replacing the selection first when there is one.
    pub fn insert(&mut self, node: NodeId) -> Result<(), TreeError> {
        self.insert_nodes(&[node])
    }

    pub fn insert_nodes(&mut self, nodes: &[NodeId]) -> Result<(), TreeError> {
        if !self.is_collapsed() {
            self.delete_selection()?;
        }
        let leading = self.range.leading(&self.arena);
        let parent = self
            .arena
            .parent(leading)
            .ok_or(ReferenceError::NoParent(leading))?;
        let inherited = self.inherited_formats(leading);
        for node in nodes {
            self.arena.insert_before(parent, *node, leading)?;
        }
        let pending = self.range.take_pending();
        for node in nodes {
            let leaves: Vec<NodeId> = std::iter::once(*node)
                .chain(self.arena.descendants(*node, Mode::RangeHidden))
                .filter(|id| self.arena.get(*id).is_some_and(|n| n.is_character()))
                .collect();
            for leaf in leaves {
                for (attr, value) in &inherited {
                    let present = self
                        .arena
                        .get(leaf)
                        .is_some_and(|n| n.attributes().get(attr).is_some());
                    if !present {
                        self.arena.set_attribute(leaf, attr.clone(), value.clone())?;
                    }
                }
                for (attr, value) in &pending {
                    if *value {
                        self.arena.set_attribute(leaf, attr.clone(), AttrValue::Bool(true))?;
                    } else {
                        self.arena.clear_attribute(leaf, attr)?;
                    }
                }
            }
        }
        tracing::debug!(count = nodes.len(), parent, "inserted nodes at cursor");
        Ok(())
    }

    /// Inserts one character leaf per grapheme cluster. Newlines split the
    /// block or become line breaks, per [`TreeConfig`]. Returns the created
    /// leaves.
    pub fn insert_text(&mut self, text: &str) -> Result<Vec<NodeId>, TreeError> {
        let mut created = Vec::new();
        let mut run = Vec::new();
        for grapheme in text.graphemes(true) {
            if grapheme == "\n" || grapheme == "\r\n" {
                if !run.is_empty() {
                    self.insert_nodes(&run)?;
                    created.append(&mut run);
                }
                if self.config.newline_splits_block {
                    self.split_block()?;
                } else {
                    let line_break = self.arena.create(NodeKind::Leaf(LeafValue::LineBreak))?;
                    self.insert(line_break)?;
                    created.push(line_break);
                }
                continue;
            }
            let leaf = self
                .arena
                .create(NodeKind::Leaf(LeafValue::Char(grapheme.to_string())))?;
            run.push(leaf);
        }
        if !run.is_empty() {
            self.insert_nodes(&run)?;
            created.append(&mut run);
        }
        Ok(created)
    }

    /// Removes every selected node, promoting the children of removed
    /// containers to the cursor so partially selected blocks merge instead
    /// of losing content. Returns the removed ids.
    pub fn delete_selection(&mut self) -> Result<Vec<NodeId>, TreeError> {
        let selected = self.selected_nodes();
        if selected.is_empty() {
            return Ok(selected);
        }
        let leading_edge = match self.direction() {
            Direction::Forward => Edge::Start,
            Direction::Backward => Edge::End,
        };
        self.range.collapse(&mut self.arena, leading_edge)?;

        let selected_set: BTreeSet<NodeId> = selected.iter().copied().collect();
        let (nested, outermost): (Vec<NodeId>, Vec<NodeId>) =
            selected.iter().partition(|id| {
                self.arena
                    .parent(**id)
                    .is_some_and(|parent| selected_set.contains(&parent))
            });
        // Deepest first: a selected container nested in another one hands its
        // children to its parent in place, so the leftovers keep their order.
        for node in nested.iter().rev() {
            let parent = self
                .arena
                .parent(*node)
                .ok_or(ReferenceError::NoParent(*node))?;
            for child in self.arena.node(*node)?.children().to_vec() {
                self.arena.insert_before(parent, child, *node)?;
            }
        }
        let mut reference = self.range.end();
        for node in &outermost {
            let children = self.arena.node(*node)?.children().to_vec();
            for child in children {
                let parent = self
                    .arena
                    .parent(reference)
                    .ok_or(ReferenceError::NoParent(reference))?;
                self.arena.insert_after(parent, child, reference)?;
                reference = child;
            }
        }
        for node in &selected {
            self.arena.remove(*node)?;
            self.arena.discard(*node)?;
        }
        tracing::debug!(removed = selected.len(), "deleted selection");
        Ok(selected)
    }

    /// Delete key: removes the selection, or the node after a collapsed
    /// cursor. At the end of a block the following block is merged in.
    pub fn delete_selection_forward(&mut self) -> Result<Vec<NodeId>, TreeError> {
        if !self.is_collapsed() {
            return self.delete_selection();
        }
        self.range.collapse(&mut self.arena, Edge::Start)?;
        let end = self.range.end();
        let Some(target) = self.arena.next(end, Mode::RangeHidden) else {
            tracing::trace!("forward delete at end of document");
            return Ok(Vec::new());
        };
        let position = if self.arena.node(target)?.is_atomic() {
            Position::After
        } else {
            Position::Before
        };
        self.range.set_end(&mut self.arena, target, position)?;
        self.delete_selection()
    }

    /// Backspace: removes the selection, or the node before a collapsed
    /// cursor. At the start of a block it merges into the previous one.
    pub fn delete_selection_backward(&mut self) -> Result<Vec<NodeId>, TreeError> {
        if !self.is_collapsed() {
            return self.delete_selection();
        }
        self.range.collapse(&mut self.arena, Edge::Start)?;
        let start = self.range.start();
        let mut cursor = start;
        let mut crossed = false;
        let target = loop {
            let Some(previous) = self.arena.previous(cursor, Mode::RangeHidden) else {
                tracing::trace!("backward delete at start of document");
                return Ok(Vec::new());
            };
            if self.arena.is_ancestor(previous, start) {
                crossed = true;
                cursor = previous;
                continue;
            }
            break previous;
        };
        let atomic = self.arena.node(target)?.is_atomic();
        match (crossed, atomic) {
            (false, true) => self.range.set_start(&mut self.arena, target, Position::Before)?,
            (false, false) => {
                self.range
                    .set_beside(&mut self.arena, Edge::Start, target, Position::Before)?
            }
            (true, _) => self.range.set_start(&mut self.arena, target, Position::After)?,
        }
        self.delete_selection()
    }

    /// Enter: moves the cursor and everything after it in its block into a
    /// shallow copy of that block inserted right after it. Returns the new
    /// block.
    pub fn split_block(&mut self) -> Result<NodeId, TreeError> {
        if !self.is_collapsed() {
            self.delete_selection()?;
        }
        self.range.collapse(&mut self.arena, Edge::Start)?;
        let start = self.range.start();
        let block = self
            .arena
            .parent(start)
            .ok_or(ReferenceError::NoParent(start))?;
        if block == self.arena.root() {
            return Err(Violation::RootLifecycle.into());
        }
        let container = self
            .arena
            .parent(block)
            .ok_or(ReferenceError::NoParent(block))?;
        let moved: Vec<NodeId> = std::iter::once(start)
            .chain(self.arena.following_siblings(start, Mode::RangeAware))
            .collect();
        let copy = self.arena.duplicate(block)?;
        self.arena.insert_after(container, copy, block)?;
        for node in &moved {
            self.arena.append(copy, *node)?;
        }
        tracing::debug!(block, copy, moved = moved.len(), "split block");
        Ok(copy)
    }

    /// Plain text: characters concatenated, sibling blocks joined by `\n`.
    pub fn text(&self) -> String {
        self.text_of(self.arena.root())
    }

    pub fn check_invariants(&self) -> Result<(), TreeError> {
        self.arena.check_invariants()
    }

    fn text_of(&self, id: NodeId) -> String {
        let Some(node) = self.arena.get(id) else {
            return String::new();
        };
        match node.kind() {
            NodeKind::Leaf(LeafValue::Char(value)) => value.clone(),
            NodeKind::Leaf(LeafValue::LineBreak) => "\n".to_string(),
            NodeKind::Leaf(LeafValue::Embed { .. }) => "\u{FFFC}".to_string(),
            NodeKind::RangeStart | NodeKind::RangeEnd => String::new(),
            NodeKind::Extension { .. } => node
                .children()
                .iter()
                .map(|child| self.text_of(*child))
                .collect(),
            NodeKind::Root | NodeKind::Block(_) => {
                let mut parts: Vec<String> = Vec::new();
                let mut inline: Option<String> = None;
                for child in self.arena.children(id, Mode::RangeHidden) {
                    if self.arena.get(child).is_some_and(|n| n.is_block()) {
                        parts.extend(inline.take());
                        parts.push(self.text_of(child));
                    } else {
                        inline
                            .get_or_insert_with(String::new)
                            .push_str(&self.text_of(child));
                    }
                }
                parts.extend(inline);
                parts.join("\n")
            }
        }
    }

    /// Character formatting a new leaf at `leading` would inherit.
    fn inherited_formats(&self, leading: NodeId) -> Vec<(Attr, AttrValue)> {
        if !self.config.inherit_formats {
            return Vec::new();
        }
        self.arena
            .previous_sibling(leading, Mode::RangeHidden)
            .and_then(|id| self.arena.get(id))
            .filter(|node| node.is_character())
            .map(|node| {
                node.attributes()
                    .iter()
                    .filter(|(attr, _)| node.attributes().is_set(attr))
                    .map(|(attr, value)| (attr.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}
