//! Arena-backed accessibility tree.
//!
//! The tree is the external model the editing engine reads from. It provides:
//! - Stable node handles via slotmap-based storage
//! - Parent-child relationships with cascade removal
//! - Same-line links between leaves, which may be asymmetric or stale
//! - A document selection expressed as two node/offset pairs
//!
//! Mutations validate their inputs and return [`TreeError`]. Reads never
//! fail: a removed node simply reads as absent.
//!
//! # Key Types
//!
//! - [`AccessibilityTree`] - Owns every node
//! - [`NodeId`] - Stable handle into the tree
//! - [`DocumentSelection`] - Anchor and focus of the document selection

use std::cmp::Ordering;

use slotmap::{SlotMap, new_key_type};

use crate::error::{Result, TreeError};
use crate::node::{NodeData, NodeState, TextMarker, TextStyle};
use crate::role::Role;

new_key_type! {
    /// A stable handle to a node in an [`AccessibilityTree`].
    ///
    /// Handles stay valid while the tree changes around them and become
    /// stale once the node is removed. Stale handles read as absent.
    pub struct NodeId;
}

impl NodeId {
    /// Convert the handle to a raw u64 value.
    ///
    /// The raw value can be converted back using [`NodeId::from_raw`].
    #[inline]
    pub fn as_raw(self) -> u64 {
        use slotmap::Key;
        self.data().as_ffi()
    }

    /// Create a handle from a raw u64 value.
    ///
    /// This does not check that the node exists in any tree.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self::from(slotmap::KeyData::from_ffi(raw))
    }
}

/// The document selection: an anchor and a focus, each a node and offset.
///
/// The anchor is where the selection started and the focus is where it
/// currently ends. The focus may precede the anchor in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentSelection {
    /// Node the selection started in.
    pub anchor: NodeId,
    /// Offset within the anchor node.
    pub anchor_offset: usize,
    /// Node the selection extends to.
    pub focus: NodeId,
    /// Offset within the focus node.
    pub focus_offset: usize,
}

impl DocumentSelection {
    /// A collapsed selection at `node`/`offset`.
    pub fn caret(node: NodeId, offset: usize) -> Self {
        Self {
            anchor: node,
            anchor_offset: offset,
            focus: node,
            focus_offset: offset,
        }
    }

    /// A selection from the anchor to the focus.
    pub fn new(anchor: NodeId, anchor_offset: usize, focus: NodeId, focus_offset: usize) -> Self {
        Self {
            anchor,
            anchor_offset,
            focus,
            focus_offset,
        }
    }

    /// Whether anchor and focus coincide.
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus && self.anchor_offset == self.focus_offset
    }
}

/// The accessibility tree.
///
/// Uses arena-based storage via SlotMap for stable node handles.
#[derive(Debug, Clone, Default)]
pub struct AccessibilityTree {
    nodes: SlotMap<NodeId, NodeData>,
    root: Option<NodeId>,
    selection: Option<DocumentSelection>,
}

impl AccessibilityTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            selection: None,
        }
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    /// Insert a parentless node and return its handle.
    ///
    /// The first root inserted becomes the document root.
    pub fn add_root(&mut self, data: NodeData) -> NodeId {
        let id = self.insert_detached(data);
        if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    /// Insert a node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, data: NodeData) -> Result<NodeId> {
        if !self.nodes.contains_key(parent) {
            return Err(TreeError::InvalidNodeId(parent));
        }
        let id = self.insert_detached(data);
        self.attach(id, parent);
        Ok(id)
    }

    /// Insert a node as a child of `parent` at `index`.
    ///
    /// An index past the end appends.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, data: NodeData) -> Result<NodeId> {
        let parent_data = self
            .nodes
            .get(parent)
            .ok_or(TreeError::InvalidNodeId(parent))?;
        let index = index.min(parent_data.children.len());
        let id = self.insert_detached(data);
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = Some(parent);
        }
        if let Some(parent_data) = self.nodes.get_mut(parent) {
            parent_data.children.insert(index, id);
        }
        Ok(id)
    }

    /// Move `id` to become the last child of `new_parent`.
    pub fn set_parent(&mut self, id: NodeId, new_parent: NodeId) -> Result<()> {
        if !self.nodes.contains_key(id) {
            return Err(TreeError::InvalidNodeId(id));
        }
        if !self.nodes.contains_key(new_parent) {
            return Err(TreeError::InvalidNodeId(new_parent));
        }
        if self.is_ancestor_or_self(id, new_parent) {
            return Err(TreeError::CircularParentage {
                child: id,
                parent: new_parent,
            });
        }
        self.detach(id);
        self.attach(id, new_parent);
        Ok(())
    }

    /// Remove a node and all of its descendants.
    ///
    /// Same-line links held by surviving nodes are left pointing at the
    /// removed nodes, the way a host tree leaves them between updates.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        if !self.nodes.contains_key(id) {
            return Err(TreeError::InvalidNodeId(id));
        }
        let mut doomed = Vec::new();
        self.collect_descendants(id, &mut doomed);
        tracing::trace!(
            target: "horizon_echo_core::tree",
            ?id,
            descendant_count = doomed.len(),
            "removing subtree"
        );

        self.detach(id);
        for child in doomed {
            self.nodes.remove(child);
        }
        self.nodes.remove(id);
        if self.root == Some(id) {
            self.root = None;
        }
        Ok(())
    }

    /// Remove `child` from `parent`, checking the relationship first.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let actual = self
            .nodes
            .get(child)
            .ok_or(TreeError::InvalidNodeId(child))?
            .parent;
        if actual != Some(parent) {
            return Err(TreeError::NotAChild { child, parent });
        }
        self.remove(child)
    }

    /// Set a node's accessible name.
    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        self.node_data_mut(id)?.name = name.into();
        Ok(())
    }

    /// Set a node's value.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) -> Result<()> {
        self.node_data_mut(id)?.value = Some(value.into());
        Ok(())
    }

    /// Set a node's state flags.
    pub fn set_state(&mut self, id: NodeId, state: NodeState) -> Result<()> {
        self.node_data_mut(id)?.state = state;
        Ok(())
    }

    /// Set or clear a node's focused flag.
    pub fn set_focused(&mut self, id: NodeId, focused: bool) -> Result<()> {
        self.node_data_mut(id)?.state.focused = focused;
        Ok(())
    }

    /// Set a node's text style.
    pub fn set_style(&mut self, id: NodeId, style: TextStyle) -> Result<()> {
        self.node_data_mut(id)?.style = style;
        Ok(())
    }

    /// Replace a node's text markers.
    pub fn set_markers(&mut self, id: NodeId, markers: Vec<TextMarker>) -> Result<()> {
        self.node_data_mut(id)?.markers = markers;
        Ok(())
    }

    /// Set the text selection of a plain text field.
    pub fn set_text_selection(&mut self, id: NodeId, start: usize, end: usize) -> Result<()> {
        self.node_data_mut(id)?.text_selection = Some((start, end));
        Ok(())
    }

    /// Link two leaves as adjacent on the same visual line, in both directions.
    pub fn link_on_line(&mut self, previous: NodeId, next: NodeId) -> Result<()> {
        self.set_next_on_line(previous, Some(next))?;
        self.set_previous_on_line(next, Some(previous))
    }

    /// Set only the forward same-line link of `id`.
    ///
    /// The target is not validated: hosts routinely publish links to nodes
    /// they have already destroyed.
    pub fn set_next_on_line(&mut self, id: NodeId, next: Option<NodeId>) -> Result<()> {
        self.node_data_mut(id)?.next_on_line = next;
        Ok(())
    }

    /// Set only the backward same-line link of `id`.
    pub fn set_previous_on_line(&mut self, id: NodeId, previous: Option<NodeId>) -> Result<()> {
        self.node_data_mut(id)?.previous_on_line = previous;
        Ok(())
    }

    /// Set the document selection.
    pub fn set_selection(&mut self, selection: DocumentSelection) -> Result<()> {
        for id in [selection.anchor, selection.focus] {
            if !self.nodes.contains_key(id) {
                return Err(TreeError::InvalidNodeId(id));
            }
        }
        self.selection = Some(selection);
        Ok(())
    }

    /// Clear the document selection.
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn node_data_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        self.nodes.get_mut(id).ok_or(TreeError::InvalidNodeId(id))
    }

    fn insert_detached(&mut self, mut data: NodeData) -> NodeId {
        data.parent = None;
        data.children.clear();
        let role = data.role;
        let id = self.nodes.insert(data);
        tracing::trace!(target: "horizon_echo_core::tree", ?id, ?role, "inserted node");
        id
    }

    fn attach(&mut self, id: NodeId, parent: NodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = Some(parent);
        }
        if let Some(parent_data) = self.nodes.get_mut(parent) {
            parent_data.children.push(id);
        }
    }

    fn detach(&mut self, id: NodeId) {
        let old_parent = self.nodes.get(id).and_then(|d| d.parent);
        if let Some(parent_id) = old_parent
            && let Some(parent_data) = self.nodes.get_mut(parent_id)
        {
            parent_data.children.retain(|&child| child != id);
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = None;
        }
    }

    fn collect_descendants(&self, id: NodeId, result: &mut Vec<NodeId>) {
        if let Some(data) = self.nodes.get(id) {
            for &child in &data.children {
                self.collect_descendants(child, result);
                result.push(child);
            }
        }
    }

    fn is_ancestor_or_self(&self, potential_ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(current_id) = current {
            if current_id == potential_ancestor {
                return true;
            }
            current = self.parent(current_id);
        }
        false
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// The document root.
    pub fn root(&self) -> Option<NodeId> {
        self.root.filter(|&id| self.nodes.contains_key(id))
    }

    /// The document selection, if any.
    pub fn selection(&self) -> Option<DocumentSelection> {
        self.selection
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// The data of a live node.
    pub fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// The role of a live node.
    pub fn role(&self, id: NodeId) -> Option<Role> {
        self.nodes.get(id).map(|d| d.role)
    }

    /// The accessible name of a live node.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id).map(|d| d.name.as_str())
    }

    /// The text a node contributes (value for text fields, otherwise name).
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id).map(NodeData::text)
    }

    /// Length of [`text`](Self::text) in characters, zero for stale nodes.
    pub fn text_len(&self, id: NodeId) -> usize {
        self.text(id).map_or(0, |t| t.chars().count())
    }

    /// The text of the subtree: a leaf's own text, or its children's
    /// inner text concatenated.
    pub fn inner_text(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.push_inner_text(id, &mut out);
        out
    }

    fn push_inner_text(&self, id: NodeId, out: &mut String) {
        let Some(data) = self.nodes.get(id) else {
            return;
        };
        if data.children.is_empty() {
            out.push_str(data.text());
        } else {
            for &child in &data.children {
                self.push_inner_text(child, out);
            }
        }
    }

    /// Length of [`inner_text`](Self::inner_text) in characters.
    pub fn inner_text_len(&self, id: NodeId) -> usize {
        let Some(data) = self.nodes.get(id) else {
            return 0;
        };
        if data.children.is_empty() {
            data.text().chars().count()
        } else {
            data.children.iter().map(|&c| self.inner_text_len(c)).sum()
        }
    }

    /// The state flags of a live node.
    pub fn state(&self, id: NodeId) -> Option<NodeState> {
        self.nodes.get(id).map(|d| d.state)
    }

    /// The parent of a live node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|d| d.parent)
    }

    /// The children of a node, empty for stale nodes.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |d| d.children.as_slice())
    }

    /// The first child.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// The last child.
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// Position of a node among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// The previous sibling.
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// The next sibling.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// The raw backward same-line link. The target may be stale.
    pub fn previous_on_line(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|d| d.previous_on_line)
    }

    /// The raw forward same-line link. The target may be stale.
    pub fn next_on_line(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|d| d.next_on_line)
    }

    /// Iterate the ancestors of a node, nearest first, excluding the node.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    /// The leaves below `id` in document order. A childless node is its own leaf.
    pub fn leaves(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_leaves(id, &mut out);
        out
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<NodeId>) {
        let Some(data) = self.nodes.get(id) else {
            return;
        };
        if data.children.is_empty() {
            out.push(id);
        } else {
            for &child in &data.children {
                self.collect_leaves(child, out);
            }
        }
    }

    /// The outermost node of the editable region containing `id`.
    ///
    /// Walks up while the parent is editable, stopping at a text field.
    /// Returns `None` if `id` itself is not editable.
    pub fn editable_root(&self, id: NodeId) -> Option<NodeId> {
        let data = self.nodes.get(id)?;
        if !data.state.editable {
            return None;
        }
        let mut current = id;
        loop {
            if self.role(current) == Some(Role::TextField) {
                return Some(current);
            }
            match self.parent(current) {
                Some(parent) if self.state(parent).is_some_and(|s| s.editable) => {
                    current = parent;
                }
                _ => return Some(current),
            }
        }
    }

    /// Compare two nodes in document (pre-order) order.
    ///
    /// An ancestor orders before its descendants. Returns `None` when either
    /// node is stale or the nodes belong to different roots.
    pub fn compare_document_order(&self, a: NodeId, b: NodeId) -> Option<Ordering> {
        if !self.contains(a) || !self.contains(b) {
            return None;
        }
        if a == b {
            return Some(Ordering::Equal);
        }
        let path_a = self.path_from_root(a);
        let path_b = self.path_from_root(b);
        if path_a.first() != path_b.first() {
            return None;
        }
        for (x, y) in path_a.iter().zip(&path_b).skip(1) {
            if x != y {
                return Some(self.index_in_parent(*x)?.cmp(&self.index_in_parent(*y)?));
            }
        }
        Some(path_a.len().cmp(&path_b.len()))
    }

    /// The chain of nodes from the topmost ancestor down to `id`.
    pub fn path_from_root(&self, id: NodeId) -> Vec<NodeId> {
        let mut path: Vec<NodeId> = self.ancestors(id).collect();
        path.reverse();
        path.push(id);
        path
    }
}

/// Iterator over a node's ancestors, nearest first.
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    tree: &'a AccessibilityTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
