//! Positions within the accessibility tree.
//!
//! A [`Cursor`] is a node plus an index. The index is interpreted according
//! to the node: a character offset for text, a child index for richly
//! editable containers, or "the node as a whole". [`Cursor::deep_equivalent`]
//! resolves any cursor to the leaf text node and local offset it denotes.

use crate::role::Role;
use crate::tree::{AccessibilityTree, NodeId};

/// Upper bound on the number of levels deep resolution descends.
const MAX_RESOLVE_DEPTH: usize = 256;

/// How a cursor indexes into its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorIndex {
    /// The cursor denotes the whole node.
    Node,
    /// A character offset (or child index for richly editable containers).
    Text(usize),
}

/// An immutable position: a node and an index into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor {
    node: NodeId,
    index: CursorIndex,
}

impl Cursor {
    /// A cursor at `offset` within `node`.
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self {
            node,
            index: CursorIndex::Text(offset),
        }
    }

    /// A cursor denoting the whole of `node`.
    pub fn node_level(node: NodeId) -> Self {
        Self {
            node,
            index: CursorIndex::Node,
        }
    }

    /// Resolve `(node, offset)` to its deep equivalent.
    pub fn resolve(tree: &AccessibilityTree, node: NodeId, offset: usize) -> Self {
        Self::new(node, offset).deep_equivalent(tree)
    }

    /// The node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The raw index.
    pub fn index(&self) -> CursorIndex {
        self.index
    }

    /// The index as an offset, with a node-level index counting as zero.
    pub fn offset(&self) -> usize {
        match self.index {
            CursorIndex::Node => 0,
            CursorIndex::Text(offset) => offset,
        }
    }

    /// Whether the cursor denotes a whole node.
    pub fn is_node_level(&self) -> bool {
        self.index == CursorIndex::Node
    }

    /// Whether the cursor's node is still live.
    pub fn is_valid(&self, tree: &AccessibilityTree) -> bool {
        tree.contains(self.node)
    }

    /// Whether two cursors denote the same leaf position.
    pub fn deep_equals(&self, other: &Cursor, tree: &AccessibilityTree) -> bool {
        self.deep_equivalent(tree) == other.deep_equivalent(tree)
    }

    /// Resolve this cursor down to the most specific leaf and local offset.
    ///
    /// Static text interprets the index as an offset across its inline text
    /// boxes. Richly editable containers interpret it as a child index, with
    /// an index past the end landing at the end of the last child. Other
    /// containers interpret it as a text offset across their children. The
    /// final offset is clamped to the leaf's text length.
    ///
    /// Resolving an already deep cursor returns it unchanged.
    pub fn deep_equivalent(&self, tree: &AccessibilityTree) -> Cursor {
        self.resolve_deep(tree, true)
    }

    /// Resolve this cursor treating the index as a text offset at every
    /// level, including richly editable containers.
    ///
    /// Used for offsets that were counted over a container's text, such as
    /// a line's container offsets.
    pub fn deep_text_position(&self, tree: &AccessibilityTree) -> Cursor {
        self.resolve_deep(tree, false)
    }

    fn resolve_deep(&self, tree: &AccessibilityTree, rich_child_index: bool) -> Cursor {
        let CursorIndex::Text(mut offset) = self.index else {
            return *self;
        };
        let mut node = self.node;

        for _ in 0..MAX_RESOLVE_DEPTH {
            let Some(role) = tree.role(node) else {
                return Cursor::new(node, offset);
            };
            let children = tree.children(node);
            if children.is_empty() {
                break;
            }

            let richly_editable = tree.state(node).is_some_and(|s| s.richly_editable);
            if rich_child_index && richly_editable && role != Role::StaticText {
                if let Some(&child) = children.get(offset) {
                    node = child;
                    offset = 0;
                    continue;
                }
                let Some(leaf) = children.last().and_then(|&last| tree.leaves(last).pop()) else {
                    break;
                };
                return Cursor::new(leaf, tree.text_len(leaf));
            }

            let count = children.len();
            let mut consumed = 0;
            let mut target = None;
            for (i, &child) in children.iter().enumerate() {
                let len = if role == Role::StaticText {
                    tree.text_len(child)
                } else {
                    tree.inner_text_len(child)
                };
                let next = consumed + len;
                if offset < next || (offset == next && i + 1 == count) {
                    target = Some(child);
                    break;
                }
                consumed = next;
            }
            match target {
                Some(child) => {
                    node = child;
                    offset -= consumed;
                }
                None => {
                    // Offset lies past the container's text.
                    let Some(leaf) = tree.leaves(node).pop() else {
                        break;
                    };
                    return Cursor::new(leaf, tree.text_len(leaf));
                }
            }
        }

        Cursor::new(node, offset.min(tree.text_len(node)))
    }
}
