//! Browsing and pre-order traversal.
//!
//! Every browsing call takes a [`Mode`]: `RangeAware` sees the range markers
//! as ordinary children, `RangeHidden` steps over them as if they were not
//! in the tree. Absence is a normal outcome and comes back as `None`.

use super::{ContentNode, NodeArena, NodeId};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Range markers are visible like any other node.
    RangeAware,
    /// Range markers are skipped.
    #[default]
    RangeHidden,
}

impl Mode {
    fn admits(self, node: &ContentNode) -> bool {
        match self {
            Mode::RangeAware => true,
            Mode::RangeHidden => !node.is_marker(),
        }
    }
}

/// Document-order direction of a walk, and of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

/// Mode-filtered slice of a child list. Double-ended, so the same type
/// serves both sibling directions.
#[derive(Debug, Clone)]
pub struct Siblings<'a> {
    arena: &'a NodeArena,
    ids: &'a [NodeId],
    mode: Mode,
}

impl<'a> Iterator for Siblings<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some((first, rest)) = self.ids.split_first() {
            self.ids = rest;
            if self.arena.get(*first).is_some_and(|n| self.mode.admits(n)) {
                return Some(*first);
            }
        }
        None
    }
}

impl DoubleEndedIterator for Siblings<'_> {
    fn next_back(&mut self) -> Option<NodeId> {
        while let Some((last, rest)) = self.ids.split_last() {
            self.ids = rest;
            if self.arena.get(*last).is_some_and(|n| self.mode.admits(n)) {
                return Some(*last);
            }
        }
        None
    }
}

/// Proper ancestors of a node, nearest first.
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    arena: &'a NodeArena,
    current: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let parent = self.arena.parent(self.current?);
        self.current = parent;
        parent
    }
}

/// Lazy pre-order walk in either direction, confined to the descendants of
/// `scope`. The starting node itself is not yielded.
#[derive(Debug, Clone)]
pub struct Walk<'a> {
    arena: &'a NodeArena,
    current: Option<NodeId>,
    scope: NodeId,
    direction: Direction,
    mode: Mode,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.current?;
        let next = match self.direction {
            Direction::Forward => self.arena.step_forward(current, self.scope, self.mode),
            Direction::Backward => self.arena.step_backward(current, self.scope, self.mode),
        };
        self.current = next;
        next
    }
}

impl NodeArena {
    pub fn children(&self, id: NodeId, mode: Mode) -> Siblings<'_> {
        let ids = self.get(id).map(|n| n.children()).unwrap_or(&[]);
        Siblings {
            arena: self,
            ids,
            mode,
        }
    }

    /// Siblings after `id`, nearest first.
    pub fn following_siblings(&self, id: NodeId, mode: Mode) -> Siblings<'_> {
        let ids = self.sibling_split(id).map(|(_, after)| after).unwrap_or(&[]);
        Siblings {
            arena: self,
            ids,
            mode,
        }
    }

    /// Siblings before `id`, nearest first.
    pub fn preceding_siblings(
        &self,
        id: NodeId,
        mode: Mode,
    ) -> std::iter::Rev<Siblings<'_>> {
        let ids = self.sibling_split(id).map(|(before, _)| before).unwrap_or(&[]);
        Siblings {
            arena: self,
            ids,
            mode,
        }
        .rev()
    }

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            arena: self,
            current: Some(id),
        }
    }

    /// Pre-order walk over the whole document starting after `from`.
    pub fn walk(&self, from: NodeId, direction: Direction, mode: Mode) -> Walk<'_> {
        self.walk_within(from, self.root(), direction, mode)
    }

    pub fn walk_within(
        &self,
        from: NodeId,
        scope: NodeId,
        direction: Direction,
        mode: Mode,
    ) -> Walk<'_> {
        Walk {
            arena: self,
            current: Some(from),
            scope,
            direction,
            mode,
        }
    }

    /// Every descendant of `scope` in document order.
    pub fn descendants(&self, scope: NodeId, mode: Mode) -> Walk<'_> {
        self.walk_within(scope, scope, Direction::Forward, mode)
    }

    pub fn first_child(&self, id: NodeId, mode: Mode) -> Option<NodeId> {
        self.children(id, mode).next()
    }

    pub fn first_child_where(
        &self,
        id: NodeId,
        mode: Mode,
        pred: impl FnMut(&ContentNode) -> bool,
    ) -> Option<NodeId> {
        self.find(self.children(id, mode), pred)
    }

    pub fn last_child(&self, id: NodeId, mode: Mode) -> Option<NodeId> {
        self.children(id, mode).next_back()
    }

    pub fn last_child_where(
        &self,
        id: NodeId,
        mode: Mode,
        pred: impl FnMut(&ContentNode) -> bool,
    ) -> Option<NodeId> {
        self.find(self.children(id, mode).rev(), pred)
    }

    pub fn next_sibling(&self, id: NodeId, mode: Mode) -> Option<NodeId> {
        self.following_siblings(id, mode).next()
    }

    pub fn next_sibling_where(
        &self,
        id: NodeId,
        mode: Mode,
        pred: impl FnMut(&ContentNode) -> bool,
    ) -> Option<NodeId> {
        self.find(self.following_siblings(id, mode), pred)
    }

    pub fn previous_sibling(&self, id: NodeId, mode: Mode) -> Option<NodeId> {
        self.preceding_siblings(id, mode).next()
    }

    pub fn previous_sibling_where(
        &self,
        id: NodeId,
        mode: Mode,
        pred: impl FnMut(&ContentNode) -> bool,
    ) -> Option<NodeId> {
        self.find(self.preceding_siblings(id, mode), pred)
    }

    /// Leftmost leaf of the subtree, or `id` itself when it has no visible
    /// children.
    pub fn first_leaf(&self, id: NodeId, mode: Mode) -> NodeId {
        let mut current = id;
        while let Some(child) = self.first_child(current, mode) {
            current = child;
        }
        current
    }

    /// First leaf of the subtree, in document order, that satisfies `pred`.
    pub fn first_leaf_where(
        &self,
        id: NodeId,
        mode: Mode,
        mut pred: impl FnMut(&ContentNode) -> bool,
    ) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.descendants(id, mode))
            .filter(|n| self.first_child(*n, mode).is_none())
            .find(|n| self.get(*n).is_some_and(&mut pred))
    }

    pub fn last_leaf(&self, id: NodeId, mode: Mode) -> NodeId {
        let mut current = id;
        while let Some(child) = self.last_child(current, mode) {
            current = child;
        }
        current
    }

    pub fn last_leaf_where(
        &self,
        id: NodeId,
        mode: Mode,
        mut pred: impl FnMut(&ContentNode) -> bool,
    ) -> Option<NodeId> {
        let last = self.last_leaf(id, mode);
        std::iter::once(last)
            .chain(self.walk_within(last, id, Direction::Backward, mode))
            .chain((last != id).then_some(id))
            .filter(|n| self.first_child(*n, mode).is_none())
            .find(|n| self.get(*n).is_some_and(&mut pred))
    }

    /// Next node in pre-order: first child, else next sibling, else the
    /// next sibling of the nearest ancestor that has one.
    pub fn next(&self, id: NodeId, mode: Mode) -> Option<NodeId> {
        self.step_forward(id, self.root(), mode)
    }

    pub fn next_where(
        &self,
        id: NodeId,
        mode: Mode,
        pred: impl FnMut(&ContentNode) -> bool,
    ) -> Option<NodeId> {
        self.find(self.walk(id, Direction::Forward, mode), pred)
    }

    /// Previous node in pre-order: the previous sibling's last leaf, else
    /// the parent. The root itself is never returned.
    pub fn previous(&self, id: NodeId, mode: Mode) -> Option<NodeId> {
        self.step_backward(id, self.root(), mode)
    }

    pub fn previous_where(
        &self,
        id: NodeId,
        mode: Mode,
        pred: impl FnMut(&ContentNode) -> bool,
    ) -> Option<NodeId> {
        self.find(self.walk(id, Direction::Backward, mode), pred)
    }

    fn find(
        &self,
        mut ids: impl Iterator<Item = NodeId>,
        mut pred: impl FnMut(&ContentNode) -> bool,
    ) -> Option<NodeId> {
        ids.find(|id| self.get(*id).is_some_and(&mut pred))
    }

    fn sibling_split(&self, id: NodeId) -> Option<(&[NodeId], &[NodeId])> {
        let parent = self.get(self.parent(id)?)?;
        let index = parent.children().iter().position(|child| *child == id)?;
        let (before, rest) = parent.children().split_at(index);
        Some((before, &rest[1..]))
    }

    pub(crate) fn step_forward(&self, id: NodeId, scope: NodeId, mode: Mode) -> Option<NodeId> {
        if let Some(child) = self.first_child(id, mode) {
            return Some(child);
        }
        let mut current = id;
        loop {
            if current == scope {
                return None;
            }
            if let Some(sibling) = self.next_sibling(current, mode) {
                return Some(sibling);
            }
            current = self.parent(current)?;
        }
    }

    pub(crate) fn step_backward(&self, id: NodeId, scope: NodeId, mode: Mode) -> Option<NodeId> {
        if id == scope {
            return None;
        }
        if let Some(sibling) = self.previous_sibling(id, mode) {
            return Some(self.last_leaf(sibling, mode));
        }
        let parent = self.parent(id)?;
        (parent != scope).then_some(parent)
    }
}
