//! Naive reference models for differential testing.
use content_tree::{Mode, NodeArena, NodeId};

/// Document order by walking forward from `this` until `other` shows up.
pub fn is_before_by_walk(arena: &NodeArena, this: NodeId, other: NodeId) -> bool {
    let mut current = this;
    while let Some(next) = arena.next(current, Mode::RangeAware) {
        if next == other {
            return true;
        }
        current = next;
    }
    false
}

/// Every node reachable from the root, in pre-order, collected recursively.
pub fn preorder(arena: &NodeArena) -> Vec<NodeId> {
    let mut out = Vec::new();
    collect(arena, arena.root(), &mut out);
    out
}

/// Character leaves in document order, found through [`preorder`].
pub fn characters(arena: &NodeArena) -> Vec<NodeId> {
    preorder(arena)
        .into_iter()
        .filter(|id| arena.get(*id).is_some_and(|node| node.is_character()))
        .collect()
}

fn collect(arena: &NodeArena, id: NodeId, out: &mut Vec<NodeId>) {
    out.push(id);
    if let Some(node) = arena.get(id) {
        for child in node.children() {
            collect(arena, *child, out);
        }
    }
}

/// A single paragraph as a flat character list with two offsets.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FlatParagraph {
    chars: Vec<char>,
    anchor: usize,
    focus: usize,
}

impl FlatParagraph {
    pub fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            anchor: 0,
            focus: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    /// `(anchor, focus)`; the anchor plays the start marker.
    pub fn selection(&self) -> (usize, usize) {
        (self.anchor, self.focus)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn select(&mut self, anchor: usize, focus: usize) {
        self.anchor = anchor.min(self.len());
        self.focus = focus.min(self.len());
    }

    pub fn insert_text(&mut self, text: &str) {
        self.delete_selection();
        let at = self.anchor;
        for (i, c) in text.chars().enumerate() {
            self.chars.insert(at + i, c);
        }
        self.anchor = at + text.chars().count();
        self.focus = self.anchor;
    }

    pub fn delete_selection(&mut self) {
        let (lo, hi) = if self.anchor <= self.focus {
            (self.anchor, self.focus)
        } else {
            (self.focus, self.anchor)
        };
        self.chars.drain(lo..hi);
        self.anchor = lo;
        self.focus = lo;
    }

    pub fn delete_backward(&mut self) {
        if !self.is_collapsed() {
            self.delete_selection();
            return;
        }
        if self.anchor > 0 {
            self.chars.remove(self.anchor - 1);
            self.anchor -= 1;
            self.focus = self.anchor;
        }
    }

    pub fn delete_forward(&mut self) {
        if !self.is_collapsed() {
            self.delete_selection();
            return;
        }
        if self.anchor < self.len() {
            self.chars.remove(self.anchor);
        }
    }
}
