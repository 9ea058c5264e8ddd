//! content-tree: a hierarchical rich-content model with an in-tree selection.
//!
//! Blocks, inline runs and atomic leaves live in an arena-backed tree. The
//! selection's two boundaries are themselves nodes of that tree, so every
//! structural primitive keeps the selection valid as a side effect. The
//! crate provides:
//!
//! - **Nodes** - arena, node kinds, attributes, mutation and browsing
//! - **Range** - direction, collapsed state, selected nodes, marker placement
//! - **Tree** - selection-aware editing: insert, delete, split, format
//! - **Commands** - serde-friendly inbound operations and node specs
//! - **Render** - outbound renderers (serializable snapshot, outline)
//!
//! # Quick Start
//!
//! ```rust
//! use content_tree::{ContentTree, NodeSpec, TreeConfig};
//!
//! let mut tree = ContentTree::from_specs(&[NodeSpec::paragraph("ac")], TreeConfig::default())
//!     .unwrap();
//! tree.delete_selection_forward().unwrap();
//! tree.insert_text("b").unwrap();
//! assert_eq!(tree.outline(), "p(b[]c)");
//! ```
//!
//! # Features
//!
//! - `cli` - Builds the `content-tree` script runner binary

// Arena, node kinds, structural primitives and traversal
pub mod node;

// Selection markers and range queries
pub mod range;

// Selection-aware editing operations
pub mod tree;

// Inbound commands and node specs
pub mod command;

// Outbound renderers
pub mod render;

pub use node::{
    Ancestors, Attr, AttrScope, AttrValue, Attributes, BlockKind, ContentNode, Direction,
    LeafValue, Mode, NodeArena, NodeId, NodeKind, ReferenceError, Siblings, TreeError, Violation,
    Walk,
};

pub use range::{Edge, Position, RangeModel};

pub use tree::{ContentTree, TreeConfig};

pub use command::{Command, NodeSpec, Outcome};

pub use render::{NodeSnapshot, Outline, Render, Snapshot};
