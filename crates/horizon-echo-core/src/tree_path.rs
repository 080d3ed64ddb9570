//! Recovering a node after it was replaced.
//!
//! Hosts frequently destroy and recreate text nodes while the user types.
//! A [`TreePath`] remembers the child-index path from the topmost ancestor
//! to a node, so the position can be found again after the node is gone.

use crate::tree::{AccessibilityTree, NodeId};

/// A node plus the child-index path that leads to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreePath {
    node: NodeId,
    root: NodeId,
    path: Vec<usize>,
}

impl TreePath {
    /// Record the path to `node` as the tree currently stands.
    pub fn new(tree: &AccessibilityTree, node: NodeId) -> Self {
        let chain = tree.path_from_root(node);
        let root = chain.first().copied().unwrap_or(node);
        let path = chain
            .iter()
            .skip(1)
            .map_while(|&id| tree.index_in_parent(id))
            .collect();
        Self { node, root, path }
    }

    /// The node the path was recorded for.
    pub fn original(&self) -> NodeId {
        self.node
    }

    /// The recorded child indices, outermost first.
    pub fn indices(&self) -> &[usize] {
        &self.path
    }

    /// Find the node again.
    ///
    /// Returns the original node while it is live. Otherwise follows the
    /// recorded indices from the root as far as the current tree allows and
    /// returns the deepest node reached. Returns `None` if the root is gone.
    pub fn node(&self, tree: &AccessibilityTree) -> Option<NodeId> {
        if tree.contains(self.node) {
            return Some(self.node);
        }
        if !tree.contains(self.root) {
            return None;
        }
        let mut current = self.root;
        for &index in &self.path {
            match tree.children(current).get(index) {
                Some(&child) => current = child,
                None => break,
            }
        }
        tracing::trace!(
            target: "horizon_echo_core::tree",
            original = ?self.node,
            recovered = ?current,
            "recovered node from tree path"
        );
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeData;
    use crate::role::Role;

    #[test]
    fn test_live_node_is_returned() {
        let mut tree = AccessibilityTree::new();
        let root = tree.add_root(NodeData::new(Role::RootWebArea));
        let para = tree.append_child(root, NodeData::new(Role::Paragraph)).unwrap();
        let path = TreePath::new(&tree, para);
        assert_eq!(path.indices(), &[0]);
        assert_eq!(path.node(&tree), Some(para));
    }

    #[test]
    fn test_replaced_node_is_recovered() {
        let mut tree = AccessibilityTree::new();
        let root = tree.add_root(NodeData::new(Role::RootWebArea));
        let para = tree.append_child(root, NodeData::new(Role::Paragraph)).unwrap();
        let old = tree
            .append_child(para, NodeData::new(Role::StaticText).with_name("old"))
            .unwrap();
        let path = TreePath::new(&tree, old);

        tree.remove(old).unwrap();
        let new = tree
            .append_child(para, NodeData::new(Role::StaticText).with_name("new"))
            .unwrap();
        assert_eq!(path.node(&tree), Some(new));
    }

    #[test]
    fn test_partial_recovery_stops_at_deepest_match() {
        let mut tree = AccessibilityTree::new();
        let root = tree.add_root(NodeData::new(Role::RootWebArea));
        let para = tree.append_child(root, NodeData::new(Role::Paragraph)).unwrap();
        let text = tree.append_child(para, NodeData::new(Role::StaticText)).unwrap();
        let path = TreePath::new(&tree, text);
        tree.remove(text).unwrap();
        assert_eq!(path.node(&tree), Some(para));
    }
}
