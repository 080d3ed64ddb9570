//! Logging and debugging facilities for Horizon Echo.
//!
//! This module provides:
//! - Target names for filtering `tracing` output by subsystem
//! - Debug visualization for accessibility trees
//! - Performance tracing hooks for profiling
//!
//! # Tracing Integration
//!
//! Horizon Echo uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in the host application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_echo::line=trace")
//!     .init();
//! ```
//!
//! # Debug Visualization
//!
//! Use [`TreeDebug`] to render a subtree along with its same-line links:
//!
//! ```ignore
//! use horizon_echo_core::logging::TreeDebug;
//!
//! println!("{}", TreeDebug::new().format_subtree(&tree, root)?);
//! ```

use std::fmt::Write as FmtWrite;

use crate::error::{Result, TreeError};
use crate::tree::{AccessibilityTree, NodeId};

/// Span names used throughout Horizon Echo for tracing.
pub mod span_names {
    /// Line reconstruction span.
    pub const LINE_BUILD: &str = "horizon_echo::line_build";
    /// Field update span.
    pub const FIELD_UPDATE: &str = "horizon_echo::field_update";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Tree model target.
    pub const TREE: &str = "horizon_echo_core::tree";
    /// Line reconstruction target.
    pub const LINE: &str = "horizon_echo::line";
    /// Text diff target.
    pub const DIFF: &str = "horizon_echo::diff";
    /// Intent fast path target.
    pub const INTENT: &str = "horizon_echo::intent";
    /// Dispatch glue target.
    pub const DISPATCH: &str = "horizon_echo::dispatch";
    /// Recorded speech output target.
    pub const SPEECH: &str = "horizon_echo::speech";
    /// Performance spans target.
    pub const PERF: &str = "horizon_echo::perf";
}

/// Style options for tree visualization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeStyle {
    /// ASCII characters for tree branches.
    Ascii,
    /// Unicode box-drawing characters.
    #[default]
    Unicode,
    /// Compact single-line representation.
    Compact,
}

/// Configuration for tree debug output.
#[derive(Debug, Clone)]
pub struct TreeFormatOptions {
    /// The style of tree visualization.
    pub style: TreeStyle,
    /// Whether to show node IDs.
    pub show_ids: bool,
    /// Whether to show state flags.
    pub show_state: bool,
    /// Whether to show same-line links.
    pub show_line_links: bool,
    /// Maximum depth to traverse (None for unlimited).
    pub max_depth: Option<usize>,
    /// Indent size for each level.
    pub indent_size: usize,
}

impl Default for TreeFormatOptions {
    fn default() -> Self {
        Self {
            style: TreeStyle::default(),
            show_ids: true,
            show_state: false,
            show_line_links: false,
            max_depth: None,
            indent_size: 2,
        }
    }
}

impl TreeFormatOptions {
    /// Create options for detailed debugging output.
    pub fn detailed() -> Self {
        Self {
            show_state: true,
            show_line_links: true,
            ..Default::default()
        }
    }

    /// Create options for minimal output.
    pub fn minimal() -> Self {
        Self {
            show_ids: false,
            ..Default::default()
        }
    }
}

/// Debug utility for visualizing accessibility trees.
#[derive(Debug, Clone, Default)]
pub struct TreeDebug {
    options: TreeFormatOptions,
}

impl TreeDebug {
    /// Create a new debug visualizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a debug visualizer with custom options.
    pub fn with_options(options: TreeFormatOptions) -> Self {
        Self { options }
    }

    /// Format the tree from its document root.
    pub fn format_all(&self, tree: &AccessibilityTree) -> String {
        let mut output = String::new();
        writeln!(output, "Accessibility Tree ({} nodes):", tree.node_count())
            .expect("write to String");
        match tree.root() {
            Some(root) => self.format_subtree_into(tree, root, 0, true, &mut output),
            None => writeln!(output, "  (empty)").expect("write to String"),
        }
        output
    }

    /// Format a subtree starting from a specific node.
    pub fn format_subtree(&self, tree: &AccessibilityTree, root: NodeId) -> Result<String> {
        if !tree.contains(root) {
            return Err(TreeError::InvalidNodeId(root));
        }
        let mut output = String::new();
        self.format_subtree_into(tree, root, 0, true, &mut output);
        Ok(output)
    }

    fn format_subtree_into(
        &self,
        tree: &AccessibilityTree,
        id: NodeId,
        depth: usize,
        is_last: bool,
        output: &mut String,
    ) {
        if let Some(max) = self.options.max_depth
            && depth > max
        {
            return;
        }
        let Some(data) = tree.node(id) else {
            return;
        };

        output.push_str(&self.build_prefix(depth, is_last));
        write!(output, "{:?}", data.role()).expect("write to String");
        if !data.text().is_empty() {
            write!(output, " {:?}", data.text()).expect("write to String");
        }
        if self.options.show_ids {
            write!(output, " [{:?}]", id).expect("write to String");
        }
        if self.options.show_state {
            let state = data.state();
            let flags = [
                (state.editable, "editable"),
                (state.richly_editable, "rich"),
                (state.multiline, "multiline"),
                (state.protected, "protected"),
                (state.offscreen, "offscreen"),
                (state.focused, "focused"),
            ];
            let set: Vec<&str> = flags
                .iter()
                .filter_map(|&(on, name)| on.then_some(name))
                .collect();
            if !set.is_empty() {
                write!(output, " {{{}}}", set.join(",")).expect("write to String");
            }
        }
        if self.options.show_line_links {
            if let Some(prev) = tree.previous_on_line(id) {
                write!(output, " <-{:?}", prev).expect("write to String");
            }
            if let Some(next) = tree.next_on_line(id) {
                write!(output, " ->{:?}", next).expect("write to String");
            }
        }
        output.push('\n');

        let children = tree.children(id);
        let count = children.len();
        for (i, &child) in children.iter().enumerate() {
            self.format_subtree_into(tree, child, depth + 1, i + 1 == count, output);
        }
    }

    fn build_prefix(&self, depth: usize, is_last: bool) -> String {
        if depth == 0 {
            return String::new();
        }

        let (branch, corner, last) = match self.options.style {
            TreeStyle::Ascii => ("|", "+-- ", "`-- "),
            TreeStyle::Unicode => ("\u{2502}", "\u{251c}\u{2500}\u{2500} ", "\u{2514}\u{2500}\u{2500} "),
            TreeStyle::Compact => ("", "- ", "- "),
        };

        let mut prefix = String::new();
        for _ in 0..(depth - 1) {
            prefix.push_str(branch);
            for _ in 0..self.options.indent_size {
                prefix.push(' ');
            }
        }
        prefix.push_str(if is_last { last } else { corner });
        prefix
    }
}

/// A guard that emits a tracing span while alive.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_echo::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeData, NodeState};
    use crate::role::Role;

    fn setup() -> (AccessibilityTree, NodeId, NodeId, NodeId) {
        let mut tree = AccessibilityTree::new();
        let root = tree.add_root(NodeData::new(Role::RootWebArea));
        let first = tree
            .append_child(root, NodeData::new(Role::StaticText).with_name("hello "))
            .unwrap();
        let second = tree
            .append_child(
                root,
                NodeData::new(Role::StaticText)
                    .with_name("world")
                    .with_state(NodeState {
                        offscreen: true,
                        ..Default::default()
                    }),
            )
            .unwrap();
        tree.link_on_line(first, second).unwrap();
        (tree, root, first, second)
    }

    #[test]
    fn test_tree_format_empty() {
        let tree = AccessibilityTree::new();
        let output = TreeDebug::new().format_all(&tree);
        assert!(output.contains("Accessibility Tree"));
        assert!(output.contains("(empty)"));
    }

    #[test]
    fn test_tree_format_hierarchy() {
        let (tree, root, _, _) = setup();
        let output = TreeDebug::new().format_subtree(&tree, root).unwrap();
        assert!(output.contains("RootWebArea"));
        assert!(output.contains("\"hello \""));
        assert!(output.contains("\"world\""));
    }

    #[test]
    fn test_tree_format_minimal() {
        let (tree, root, _, _) = setup();
        let output = TreeDebug::with_options(TreeFormatOptions::minimal())
            .format_subtree(&tree, root)
            .unwrap();
        assert!(!output.contains('['));
    }

    #[test]
    fn test_tree_format_detailed() {
        let (tree, root, _, _) = setup();
        let output = TreeDebug::with_options(TreeFormatOptions {
            style: TreeStyle::Ascii,
            ..TreeFormatOptions::detailed()
        })
        .format_subtree(&tree, root)
        .unwrap();
        assert!(output.contains("{offscreen}"));
        assert!(output.contains("->"));
        assert!(output.contains("<-"));
        assert!(output.contains("`-- "));
    }

    #[test]
    fn test_format_stale_root() {
        let (mut tree, _, first, _) = setup();
        tree.remove(first).unwrap();
        assert_eq!(
            TreeDebug::new().format_subtree(&tree, first),
            Err(TreeError::InvalidNodeId(first))
        );
    }

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
    }
}
