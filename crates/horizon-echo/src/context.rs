//! Structural context entered or left between two positions.

use std::collections::HashSet;

use horizon_echo_core::{AccessibilityTree, NodeId, Role};

use crate::messages;

/// Structural nodes entered and exited when moving between two nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    /// Structural nodes around the destination but not the origin,
    /// outermost first.
    pub entered: Vec<NodeId>,
    /// Structural nodes around the origin but not the destination,
    /// innermost first.
    pub exited: Vec<NodeId>,
}

impl Transition {
    /// Whether the move crossed any structural boundary.
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }
}

/// The node and its ancestors below the enclosing editable region's root.
fn context_chain(tree: &AccessibilityTree, node: NodeId) -> Vec<NodeId> {
    let boundary = tree.editable_root(node).or_else(|| {
        tree.ancestors(node)
            .find(|&a| tree.state(a).is_some_and(|s| s.editable))
    });
    std::iter::once(node)
        .chain(tree.ancestors(node))
        .take_while(|&id| Some(id) != boundary && tree.role(id) != Some(Role::RootWebArea))
        .filter(|&id| tree.contains(id))
        .collect()
}

/// Compute the structural transition from `from` to `to`.
pub fn transition(tree: &AccessibilityTree, from: Option<NodeId>, to: NodeId) -> Transition {
    let from_chain = from.map(|f| context_chain(tree, f)).unwrap_or_default();
    let to_chain = context_chain(tree, to);
    let from_set: HashSet<NodeId> = from_chain.iter().copied().collect();
    let to_set: HashSet<NodeId> = to_chain.iter().copied().collect();
    let structural = |id: &NodeId| tree.role(*id).is_some_and(Role::is_structural);

    let mut entered: Vec<NodeId> = to_chain
        .iter()
        .copied()
        .filter(|id| !from_set.contains(id) && structural(id))
        .collect();
    entered.reverse();
    let exited = from_chain
        .into_iter()
        .filter(|id| !to_set.contains(id) && structural(id))
        .collect();
    Transition { entered, exited }
}

/// The announced name of a node's role, with a heading's level.
pub fn role_description(tree: &AccessibilityTree, node: NodeId) -> String {
    let Some(data) = tree.node(node) else {
        return String::new();
    };
    match (data.role(), data.level()) {
        (Role::Heading, Some(level)) => format!("{} {level}", Role::Heading.label()),
        (role, _) => role.label().to_owned(),
    }
}

/// Role descriptions of the structure entered moving from `from` to `to`.
pub fn entered_labels(tree: &AccessibilityTree, from: Option<NodeId>, to: NodeId) -> Vec<String> {
    transition(tree, from, to)
        .entered
        .into_iter()
        .map(|id| role_description(tree, id))
        .filter(|label| !label.is_empty())
        .collect()
}

/// Announcements for moving from `from` to `to`: "Exited X" for each node
/// left, then the description of each node entered.
pub fn transition_announcements(tree: &AccessibilityTree, from: Option<NodeId>, to: NodeId) -> Vec<String> {
    let Transition { entered, exited } = transition(tree, from, to);
    exited
        .into_iter()
        .map(|id| role_description(tree, id))
        .filter(|label| !label.is_empty())
        .map(|label| messages::exited(&label))
        .chain(
            entered
                .into_iter()
                .map(|id| role_description(tree, id))
                .filter(|label| !label.is_empty()),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_echo_core::{NodeData, NodeState};

    fn editable() -> NodeState {
        NodeState {
            editable: true,
            richly_editable: true,
            ..Default::default()
        }
    }

    struct Fixture {
        tree: AccessibilityTree,
        plain: NodeId,
        linked: NodeId,
        heading_text: NodeId,
    }

    fn setup() -> Fixture {
        let mut tree = AccessibilityTree::new();
        let root = tree.add_root(NodeData::new(Role::RootWebArea));
        let field = tree
            .append_child(root, NodeData::new(Role::TextField).with_state(editable()))
            .unwrap();
        let para = tree
            .append_child(field, NodeData::new(Role::Paragraph).with_state(editable()))
            .unwrap();
        let plain = tree
            .append_child(para, NodeData::new(Role::StaticText).with_name("go to ").with_state(editable()))
            .unwrap();
        let link = tree
            .append_child(para, NodeData::new(Role::Link).with_state(editable()))
            .unwrap();
        let linked = tree
            .append_child(link, NodeData::new(Role::StaticText).with_name("page").with_state(editable()))
            .unwrap();
        let heading = tree
            .append_child(
                field,
                NodeData::new(Role::Heading).with_level(2).with_state(editable()),
            )
            .unwrap();
        let heading_text = tree
            .append_child(heading, NodeData::new(Role::StaticText).with_name("Title").with_state(editable()))
            .unwrap();
        Fixture {
            tree,
            plain,
            linked,
            heading_text,
        }
    }

    #[test]
    fn test_entering_a_link() {
        let f = setup();
        assert_eq!(entered_labels(&f.tree, Some(f.plain), f.linked), vec!["Link"]);
        assert!(entered_labels(&f.tree, Some(f.linked), f.linked).is_empty());
    }

    #[test]
    fn test_leaving_and_entering() {
        let f = setup();
        assert_eq!(
            transition_announcements(&f.tree, Some(f.linked), f.heading_text),
            vec!["Exited Link", "Heading 2"]
        );
        assert!(transition(&f.tree, Some(f.plain), f.plain).is_empty());
    }

    #[test]
    fn test_editable_root_bounds_context() {
        let f = setup();
        // The text field itself is never announced as entered.
        assert!(entered_labels(&f.tree, None, f.plain).is_empty());
    }
}
