//! The live selection.
//!
//! [`RangeModel`] does not store offsets. It holds the ids of the two marker
//! nodes that the arena keeps inside the tree and derives everything else
//! (direction, collapsed state, selected nodes) from where they sit.

use crate::node::{Attr, Direction, Mode, NodeArena, NodeId, ReferenceError, TreeError};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::BTreeMap;

/// Marker placement relative to a reference node's leftmost (`Before`) or
/// rightmost (`After`) leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Start,
    End,
}

#[derive(Debug, Clone)]
pub struct RangeModel {
    start: NodeId,
    end: NodeId,
    /// Direction computed at a given arena revision.
    direction: Cell<Option<(u64, Direction)>>,
    pending: BTreeMap<Attr, bool>,
}

impl RangeModel {
    pub fn new(arena: &NodeArena) -> Self {
        Self {
            start: arena.range_start(),
            end: arena.range_end(),
            direction: Cell::new(None),
            pending: BTreeMap::new(),
        }
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    /// Cached until the next structural change of the arena.
    pub fn direction(&self, arena: &NodeArena) -> Direction {
        let revision = arena.revision();
        if let Some((cached_at, direction)) = self.direction.get()
            && cached_at == revision
        {
            return direction;
        }
        let direction = if arena.is_after(self.start, self.end) {
            Direction::Backward
        } else {
            Direction::Forward
        };
        self.direction.set(Some((revision, direction)));
        direction
    }

    /// The marker that comes first in document order.
    pub fn leading(&self, arena: &NodeArena) -> NodeId {
        match self.direction(arena) {
            Direction::Forward => self.start,
            Direction::Backward => self.end,
        }
    }

    pub fn trailing(&self, arena: &NodeArena) -> NodeId {
        match self.direction(arena) {
            Direction::Forward => self.end,
            Direction::Backward => self.start,
        }
    }

    pub fn is_collapsed(&self, arena: &NodeArena) -> bool {
        let leading = self.leading(arena);
        arena.next_sibling(leading, Mode::RangeAware) == Some(self.trailing(arena))
    }

    /// Every node strictly between the markers, in document order.
    ///
    /// Containers whose opening lies inside the range are included even when
    /// the trailing marker sits inside them.
    pub fn selected_nodes(&self, arena: &NodeArena) -> Vec<NodeId> {
        let trailing = self.trailing(arena);
        arena
            .walk(self.leading(arena), Direction::Forward, Mode::RangeAware)
            .take_while(|id| *id != trailing)
            .filter(|id| *id != self.start && *id != self.end)
            .collect()
    }

    pub fn set_start(
        &mut self,
        arena: &mut NodeArena,
        reference: NodeId,
        position: Position,
    ) -> Result<(), TreeError> {
        self.place(arena, self.start, reference, position)
    }

    pub fn set_end(
        &mut self,
        arena: &mut NodeArena,
        reference: NodeId,
        position: Position,
    ) -> Result<(), TreeError> {
        self.place(arena, self.end, reference, position)
    }

    /// Places both markers. The end marker goes first when it is anchored
    /// after its reference, so the start never lands behind it in between.
    pub fn select(
        &mut self,
        arena: &mut NodeArena,
        start: NodeId,
        start_position: Position,
        end: NodeId,
        end_position: Position,
    ) -> Result<(), TreeError> {
        if end_position == Position::After {
            self.set_end(arena, end, end_position)?;
            self.set_start(arena, start, start_position)
        } else {
            self.set_start(arena, start, start_position)?;
            self.set_end(arena, end, end_position)
        }
    }

    /// Moves one marker next to the other. The result is always forward.
    pub fn collapse(&mut self, arena: &mut NodeArena, edge: Edge) -> Result<(), TreeError> {
        self.pending.clear();
        match edge {
            Edge::Start => {
                let parent = arena
                    .parent(self.start)
                    .ok_or(ReferenceError::NoParent(self.start))?;
                arena.insert_after(parent, self.end, self.start)
            }
            Edge::End => {
                let parent = arena
                    .parent(self.end)
                    .ok_or(ReferenceError::NoParent(self.end))?;
                arena.insert_before(parent, self.start, self.end)
            }
        }
    }

    /// Places a marker directly beside `node` in its parent, without
    /// descending to a leaf.
    pub fn set_beside(
        &mut self,
        arena: &mut NodeArena,
        edge: Edge,
        node: NodeId,
        position: Position,
    ) -> Result<(), TreeError> {
        let marker = self.marker(edge);
        if marker == node {
            return Ok(());
        }
        self.pending.clear();
        let parent = arena.parent(node).ok_or(ReferenceError::NoParent(node))?;
        match position {
            Position::Before => arena.insert_before(parent, marker, node),
            Position::After => arena.insert_after(parent, marker, node),
        }
    }

    pub fn marker(&self, edge: Edge) -> NodeId {
        match edge {
            Edge::Start => self.start,
            Edge::End => self.end,
        }
    }

    /// Formatting requested at a collapsed cursor, to be applied to the
    /// next inserted leaves.
    pub fn pending_formats(&self) -> &BTreeMap<Attr, bool> {
        &self.pending
    }

    pub(crate) fn set_pending(&mut self, attr: Attr, value: bool) {
        self.pending.insert(attr, value);
    }

    pub(crate) fn take_pending(&mut self) -> BTreeMap<Attr, bool> {
        std::mem::take(&mut self.pending)
    }

    fn place(
        &mut self,
        arena: &mut NodeArena,
        marker: NodeId,
        reference: NodeId,
        position: Position,
    ) -> Result<(), TreeError> {
        self.pending.clear();
        if marker == reference {
            return Ok(());
        }
        let target = if arena.node(reference)?.is_marker() {
            reference
        } else {
            match position {
                Position::Before => arena.first_leaf(reference, Mode::RangeHidden),
                Position::After => arena.last_leaf(reference, Mode::RangeHidden),
            }
        };
        if !arena.is_attached(target) {
            return Err(ReferenceError::Detached(target).into());
        }
        if !arena.node(target)?.is_atomic() {
            // An empty container: the marker goes inside it.
            return match position {
                Position::Before => arena.prepend(target, marker),
                Position::After => arena.append(target, marker),
            };
        }
        let parent = arena.parent(target).ok_or(ReferenceError::NoParent(target))?;
        match position {
            Position::Before => arena.insert_before(parent, marker, target),
            Position::After => arena.insert_after(parent, marker, target),
        }
    }
}
