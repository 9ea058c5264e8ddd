//! Content nodes and the arena that owns them.
//!
//! Every node lives in a [`NodeArena`] slot addressed by its [`NodeId`].
//! Parent and child links are ids, so the tree never holds owning cycles:
//! ownership is exactly the parent's child list, and a node removed from it
//! is detached until it is reinserted or [discarded](NodeArena::discard).
//!
//! The two range markers are ordinary nodes. Structural primitives move them
//! like any other child, which keeps the selection valid across edits.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

pub mod walk;

pub use walk::{Ancestors, Direction, Mode, Siblings, Walk};

/// Stable node identity. Assigned monotonically, never reused.
pub type NodeId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    List { ordered: bool },
    ListItem,
    Quote,
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafValue {
    /// A single grapheme cluster.
    Char(String),
    LineBreak,
    Embed { kind: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Block(BlockKind),
    Leaf(LeafValue),
    RangeStart,
    RangeEnd,
    /// A kind registered by a collaborator outside this crate.
    Extension { name: String, atomic: bool },
}

impl NodeKind {
    pub fn is_atomic(&self) -> bool {
        match self {
            NodeKind::Leaf(_) | NodeKind::RangeStart | NodeKind::RangeEnd => true,
            NodeKind::Extension { atomic, .. } => *atomic,
            NodeKind::Root | NodeKind::Block(_) => false,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, NodeKind::RangeStart | NodeKind::RangeEnd)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attr {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    /// Task-list state. Only list items can carry it.
    Checked,
    Custom(String),
}

/// Which node kinds an attribute can be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrScope {
    Character,
    ListItem,
}

impl Attr {
    pub fn scope(&self) -> AttrScope {
        match self {
            Attr::Checked => AttrScope::ListItem,
            _ => AttrScope::Character,
        }
    }

    /// Whether a node of `kind` can hold this attribute.
    pub fn admits(&self, kind: &NodeKind) -> bool {
        match (self.scope(), kind) {
            (_, NodeKind::Root | NodeKind::RangeStart | NodeKind::RangeEnd) => false,
            (AttrScope::ListItem, NodeKind::Block(BlockKind::ListItem)) => true,
            (AttrScope::ListItem, _) => false,
            (AttrScope::Character, NodeKind::Leaf(_) | NodeKind::Extension { .. }) => true,
            (AttrScope::Character, NodeKind::Block(_)) => matches!(self, Attr::Custom(_)),
        }
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attr::Bold => f.write_str("bold"),
            Attr::Italic => f.write_str("italic"),
            Attr::Underline => f.write_str("underline"),
            Attr::Strike => f.write_str("strike"),
            Attr::Code => f.write_str("code"),
            Attr::Checked => f.write_str("checked"),
            Attr::Custom(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    String(String),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Attributes {
    values: BTreeMap<Attr, AttrValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, attr: &Attr) -> Option<&AttrValue> {
        self.values.get(attr)
    }

    /// True when the attribute is present and not `Bool(false)`.
    pub fn is_set(&self, attr: &Attr) -> bool {
        !matches!(self.values.get(attr), None | Some(AttrValue::Bool(false)))
    }

    pub fn set(&mut self, attr: Attr, value: AttrValue) {
        self.values.insert(attr, value);
    }

    pub fn clear(&mut self, attr: &Attr) -> Option<AttrValue> {
        self.values.remove(attr)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Attr, &AttrValue)> {
        self.values.iter()
    }
}

impl FromIterator<(Attr, AttrValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (Attr, AttrValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentNode {
    id: NodeId,
    kind: NodeKind,
    attributes: Attributes,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl ContentNode {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_atomic(&self) -> bool {
        self.kind.is_atomic()
    }

    pub fn is_marker(&self) -> bool {
        self.kind.is_marker()
    }

    /// Leaves that carry text and take character formatting.
    pub fn is_character(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(LeafValue::Char(_)))
    }

    pub fn is_block(&self) -> bool {
        matches!(self.kind, NodeKind::Block(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("node {reference} is not a child of node {parent}")]
    NotAChild { parent: NodeId, reference: NodeId },
    #[error("node {0} has no parent")]
    NoParent(NodeId),
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),
    #[error("node {node} cannot be placed inside its own subtree under {parent}")]
    Cycle { node: NodeId, parent: NodeId },
    #[error("node {0} cannot be positioned relative to itself")]
    SelfReference(NodeId),
    #[error("node {0} is not attached to the document")]
    Detached(NodeId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("atomic node {0} cannot hold children")]
    AtomicParent(NodeId),
    #[error("range marker {0} can only be relocated")]
    MarkerLifecycle(NodeId),
    #[error("the root node cannot be created, moved, removed or duplicated")]
    RootLifecycle,
    #[error("attribute `{attr}` cannot be applied to node {node}")]
    AttributeScope { attr: Attr, node: NodeId },
    #[error("{0}")]
    Structure(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("invalid reference: {0}")]
    InvalidReference(#[from] ReferenceError),
    #[error("invariant violation: {0}")]
    InvariantViolation(#[from] Violation),
}

/// Owner of every node of one document.
///
/// A fresh arena holds the root and the two range markers, so the "exactly
/// one start and one end marker" invariant holds from construction on.
#[derive(Debug, Clone)]
pub struct NodeArena {
    slots: Vec<Option<ContentNode>>,
    root: NodeId,
    start: NodeId,
    end: NodeId,
    revision: u64,
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeArena {
    pub fn new() -> Self {
        let mut arena = Self {
            slots: Vec::new(),
            root: 0,
            start: 0,
            end: 0,
            revision: 0,
        };
        arena.root = arena.alloc(NodeKind::Root, Attributes::new());
        arena.start = arena.alloc(NodeKind::RangeStart, Attributes::new());
        arena.end = arena.alloc(NodeKind::RangeEnd, Attributes::new());
        let (root, start, end) = (arena.root, arena.start, arena.end);
        arena.link(root, start, 0);
        arena.link(root, end, 1);
        arena
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn range_start(&self) -> NodeId {
        self.start
    }

    pub fn range_end(&self) -> NodeId {
        self.end
    }

    /// Bumped by every structural mutation. Caches keyed on it go stale
    /// whenever a node moves.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of live (not discarded) nodes, attached or not.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: NodeId) -> Option<&ContentNode> {
        self.slots.get(usize::try_from(id).ok()?)?.as_ref()
    }

    pub fn node(&self, id: NodeId) -> Result<&ContentNode, TreeError> {
        self.get(id)
            .ok_or_else(|| ReferenceError::UnknownNode(id).into())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    pub fn create(&mut self, kind: NodeKind) -> Result<NodeId, TreeError> {
        self.create_with(kind, Attributes::new())
    }

    /// Creates a detached node. Roots and range markers are singletons owned
    /// by the arena and cannot be created here.
    pub fn create_with(
        &mut self,
        kind: NodeKind,
        attributes: Attributes,
    ) -> Result<NodeId, TreeError> {
        match kind {
            NodeKind::Root => Err(Violation::RootLifecycle.into()),
            NodeKind::RangeStart => Err(Violation::MarkerLifecycle(self.start).into()),
            NodeKind::RangeEnd => Err(Violation::MarkerLifecycle(self.end).into()),
            kind => {
                let next = self.slots.len() as NodeId;
                if let Some((attr, _)) = attributes.iter().find(|(attr, _)| !attr.admits(&kind)) {
                    return Err(Violation::AttributeScope {
                        attr: attr.clone(),
                        node: next,
                    }
                    .into());
                }
                Ok(self.alloc(kind, attributes))
            }
        }
    }

    /// Shallow clone: same kind and attributes, fresh id, no children.
    pub fn duplicate(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
        let node = self.node(id)?;
        if node.is_marker() {
            return Err(Violation::MarkerLifecycle(id).into());
        }
        if id == self.root {
            return Err(Violation::RootLifecycle.into());
        }
        let (kind, attributes) = (node.kind.clone(), node.attributes.clone());
        Ok(self.alloc(kind, attributes))
    }

    pub fn index_of(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.get(parent)?.children.iter().position(|id| *id == child)
    }

    pub fn nth_child(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.get(parent)?.children.get(index).copied()
    }

    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: NodeId,
    ) -> Result<(), TreeError> {
        self.insert_relative(parent, node, reference, 0)
    }

    pub fn insert_after(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: NodeId,
    ) -> Result<(), TreeError> {
        self.insert_relative(parent, node, reference, 1)
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check_move(parent, child)?;
        self.detach(child);
        let index = self.node(parent)?.children.len();
        self.link(parent, child, index);
        Ok(())
    }

    pub fn prepend(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check_move(parent, child)?;
        self.detach(child);
        self.link(parent, child, 0);
        Ok(())
    }

    /// Detaches `node` from its parent.
    ///
    /// Range markers inside the removed subtree are first moved to the spot
    /// the subtree occupied, so the selection never leaves the document.
    pub fn remove(&mut self, node: NodeId) -> Result<(), TreeError> {
        let current = self.node(node)?;
        if current.is_marker() {
            return Err(Violation::MarkerLifecycle(node).into());
        }
        let parent = current.parent.ok_or(ReferenceError::NoParent(node))?;
        let markers: Vec<NodeId> = self
            .descendants(node, Mode::RangeAware)
            .filter(|id| *id == self.start || *id == self.end)
            .collect();
        for marker in markers {
            tracing::trace!(marker, node, "carrying range marker out of removed subtree");
            self.insert_before(parent, marker, node)?;
        }
        self.detach(node);
        Ok(())
    }

    /// Frees the slots of a detached subtree. Ids are retired, not reused.
    pub fn discard(&mut self, node: NodeId) -> Result<(), TreeError> {
        let current = self.node(node)?;
        if node == self.root {
            return Err(Violation::RootLifecycle.into());
        }
        if current.is_marker() {
            return Err(Violation::MarkerLifecycle(node).into());
        }
        if let Some(parent) = current.parent {
            return Err(Violation::Structure(format!(
                "node {node} is still attached to {parent}"
            ))
            .into());
        }
        if let Some(marker) = self.held_marker(node) {
            return Err(Violation::MarkerLifecycle(marker).into());
        }
        let mut pending = vec![node];
        while let Some(id) = pending.pop() {
            if let Some(slot) = usize::try_from(id).ok().and_then(|i| self.slots.get_mut(i))
                && let Some(freed) = slot.take()
            {
                pending.extend(freed.children);
            }
        }
        self.revision += 1;
        Ok(())
    }

    pub fn set_attribute(
        &mut self,
        node: NodeId,
        attr: Attr,
        value: AttrValue,
    ) -> Result<(), TreeError> {
        let target = self.node_mut(node)?;
        if !attr.admits(&target.kind) {
            return Err(Violation::AttributeScope { attr, node }.into());
        }
        target.attributes.set(attr, value);
        Ok(())
    }

    pub fn clear_attribute(&mut self, node: NodeId, attr: &Attr) -> Result<(), TreeError> {
        self.node_mut(node)?.attributes.clear(attr);
        Ok(())
    }

    /// `true` when `ancestor` is a proper ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|id| id == ancestor)
    }

    /// Whether `node` is the root or hangs under it.
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.path(node).is_some()
    }

    /// Child indices leading from the root to `node`, or `None` when the
    /// node is not attached under the root.
    pub fn path(&self, node: NodeId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            path.push(self.index_of(parent, current)?);
            current = parent;
        }
        if current != self.root {
            return None;
        }
        path.reverse();
        Some(path)
    }

    /// Document (pre-order) comparison of two attached nodes.
    ///
    /// Compares root paths instead of walking the document, so the cost is
    /// bounded by depth and fan-out rather than by the distance between the
    /// nodes.
    pub fn compare(&self, a: NodeId, b: NodeId) -> Option<Ordering> {
        Some(self.path(a)?.cmp(&self.path(b)?))
    }

    pub fn is_before(&self, this: NodeId, other: NodeId) -> bool {
        self.compare(this, other) == Some(Ordering::Less)
    }

    pub fn is_after(&self, this: NodeId, other: NodeId) -> bool {
        self.compare(this, other) == Some(Ordering::Greater)
    }

    /// Verifies parent/child agreement, atomic emptiness and the marker
    /// singletons for everything reachable from the root.
    pub fn check_invariants(&self) -> Result<(), TreeError> {
        let fail = |message: String| -> Result<(), TreeError> {
            Err(Violation::Structure(message).into())
        };
        let root = self.node(self.root)?;
        if root.parent.is_some() {
            return fail("root has a parent".to_string());
        }
        let mut seen = std::collections::BTreeSet::new();
        let mut markers = (0usize, 0usize);
        let mut pending = vec![self.root];
        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                return fail(format!("node {id} is reachable twice"));
            }
            let node = self.node(id)?;
            match node.kind {
                NodeKind::RangeStart => markers.0 += 1,
                NodeKind::RangeEnd => markers.1 += 1,
                _ => {}
            }
            if node.is_atomic() && !node.children.is_empty() {
                return fail(format!("atomic node {id} has children"));
            }
            for child in &node.children {
                let Some(child_node) = self.get(*child) else {
                    return fail(format!("node {id} lists missing child {child}"));
                };
                if child_node.parent != Some(id) {
                    return fail(format!("node {child} does not point back to {id}"));
                }
                pending.push(*child);
            }
        }
        if markers != (1, 1) {
            return fail(format!(
                "expected one start and one end marker, found {} and {}",
                markers.0, markers.1
            ));
        }
        Ok(())
    }

    fn alloc(&mut self, kind: NodeKind, attributes: Attributes) -> NodeId {
        let id = self.slots.len() as NodeId;
        self.slots.push(Some(ContentNode {
            id,
            kind,
            attributes,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut ContentNode, TreeError> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.slots.get_mut(index))
            .and_then(Option::as_mut)
            .ok_or_else(|| ReferenceError::UnknownNode(id).into())
    }

    fn insert_relative(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: NodeId,
        offset: usize,
    ) -> Result<(), TreeError> {
        if node == reference {
            return Err(ReferenceError::SelfReference(node).into());
        }
        self.check_move(parent, node)?;
        if self.index_of(parent, reference).is_none() {
            return Err(ReferenceError::NotAChild { parent, reference }.into());
        }
        self.detach(node);
        // Detaching may have shifted the reference when both share a parent.
        let index = self
            .index_of(parent, reference)
            .ok_or(ReferenceError::NotAChild { parent, reference })?;
        self.link(parent, node, index + offset);
        Ok(())
    }

    fn check_move(&self, parent: NodeId, node: NodeId) -> Result<(), TreeError> {
        let parent_node = self.node(parent)?;
        self.node(node)?;
        if node == self.root {
            return Err(Violation::RootLifecycle.into());
        }
        if parent_node.is_atomic() {
            return Err(Violation::AtomicParent(parent).into());
        }
        if node == parent || self.is_ancestor(node, parent) {
            return Err(ReferenceError::Cycle { node, parent }.into());
        }
        if let Some(marker) = self.held_marker(node)
            && !self.is_attached(parent)
        {
            tracing::trace!(
                marker,
                node,
                parent,
                "refusing to move a range marker out of the document"
            );
            return Err(ReferenceError::Detached(parent).into());
        }
        Ok(())
    }

    /// A range marker that is `node` itself or lies inside its subtree.
    fn held_marker(&self, node: NodeId) -> Option<NodeId> {
        [self.start, self.end]
            .into_iter()
            .find(|marker| *marker == node || self.is_ancestor(node, *marker))
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        if let Ok(parent_node) = self.node_mut(parent) {
            parent_node.children.retain(|id| *id != node);
        }
        if let Ok(current) = self.node_mut(node) {
            current.parent = None;
        }
        self.revision += 1;
    }

    fn link(&mut self, parent: NodeId, node: NodeId, index: usize) {
        if let Ok(parent_node) = self.node_mut(parent) {
            let index = index.min(parent_node.children.len());
            parent_node.children.insert(index, node);
        }
        if let Ok(current) = self.node_mut(node) {
            current.parent = Some(parent);
        }
        self.revision += 1;
    }
}
