//! Accessibility tree model for Horizon Echo.
//!
//! This crate provides the data the editing feedback engine reads:
//!
//! - **Tree**: Arena-backed nodes with stable [`NodeId`] handles, roles,
//!   state flags, text style and markers, and same-line links
//! - **Cursor**: Node/index positions with deep resolution to leaf text
//! - **Tree paths**: Recovering a position after its node was replaced
//! - **Events**: Change notifications and semantic intents from the host
//! - **Logging**: Target names, tree visualization and perf spans
//!
//! # Example
//!
//! ```
//! use horizon_echo_core::{AccessibilityTree, Cursor, NodeData, Role};
//!
//! let mut tree = AccessibilityTree::new();
//! let root = tree.add_root(NodeData::new(Role::RootWebArea));
//! let text = tree
//!     .append_child(root, NodeData::new(Role::StaticText).with_name("hello"))
//!     .unwrap();
//! let word = tree
//!     .append_child(text, NodeData::new(Role::InlineTextBox).with_name("hello"))
//!     .unwrap();
//!
//! assert_eq!(Cursor::resolve(&tree, text, 3), Cursor::new(word, 3));
//! ```

pub mod cursor;
mod error;
pub mod event;
pub mod logging;
pub mod node;
pub mod role;
pub mod tree;
pub mod tree_path;

pub use cursor::{Cursor, CursorIndex};
pub use error::{Result, TreeError};
pub use event::{Intent, IntentCommand, MoveDirection, TextBoundary, TreeEvent, TreeEventKind};
pub use logging::{PerfSpan, TreeDebug, TreeFormatOptions, TreeStyle};
pub use node::{InputType, MarkerKind, NodeData, NodeState, TextMarker, TextStyle};
pub use role::Role;
pub use tree::{AccessibilityTree, Ancestors, DocumentSelection, NodeId};
pub use tree_path::TreePath;

static_assertions::assert_impl_all!(AccessibilityTree: Send, Sync, Clone);
static_assertions::assert_impl_all!(Cursor: Send, Sync, Copy);
static_assertions::assert_impl_all!(TreePath: Send, Sync);
