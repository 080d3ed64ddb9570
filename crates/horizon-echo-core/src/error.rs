//! Error types for Horizon Echo tree operations.

use crate::tree::NodeId;

/// Errors raised by tree mutation APIs.
///
/// Read accessors on [`AccessibilityTree`](crate::AccessibilityTree) never
/// fail loudly; they return `Option` or an empty default when a node has
/// gone stale. Only structural mutations report errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The node ID is invalid or the node has been removed.
    #[error("Invalid or removed node ID: {0:?}")]
    InvalidNodeId(NodeId),

    /// Attempted to make a node its own ancestor.
    #[error("Cannot attach {child:?} beneath its own descendant {parent:?}")]
    CircularParentage {
        /// The node being attached.
        child: NodeId,
        /// The requested parent.
        parent: NodeId,
    },

    /// The node is not a child of the given parent.
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// The supposed child.
        child: NodeId,
        /// The supposed parent.
        parent: NodeId,
    },
}

/// A specialized Result type for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;
