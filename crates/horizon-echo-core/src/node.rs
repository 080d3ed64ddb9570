//! Per-node data stored in the accessibility tree.

use crate::role::Role;
use crate::tree::NodeId;

/// State flags exposed by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeState {
    /// The node accepts text input.
    pub editable: bool,
    /// The node is part of a rich (content-editable) text region.
    pub richly_editable: bool,
    /// The field accepts more than one line of text.
    pub multiline: bool,
    /// The field content is protected (password).
    pub protected: bool,
    /// The node is scrolled or clipped out of view.
    pub offscreen: bool,
    /// The node currently has input focus.
    pub focused: bool,
}

/// The HTML-style input type of a text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputType {
    /// Plain text input.
    #[default]
    Text,
    /// Telephone number input. Hosts pad these with trailing whitespace.
    Tel,
    /// Password input.
    Password,
    /// Search input.
    Search,
    /// E-mail address input.
    Email,
    /// URL input.
    Url,
    /// Numeric input.
    Number,
}

/// Presentation attributes of a text run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextStyle {
    /// Bold weight.
    pub bold: bool,
    /// Italic slant.
    pub italic: bool,
    /// Underline decoration.
    pub underline: bool,
    /// Line-through decoration.
    pub line_through: bool,
    /// Font family name.
    pub font_family: Option<String>,
    /// Font size in pixels.
    pub font_size: Option<f32>,
}

/// The kind of a text marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// A spelling error.
    Spelling,
    /// A grammar error.
    Grammar,
    /// A find-in-page match.
    TextMatch,
}

/// A marker attached to a character range of a node's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMarker {
    /// What the marker denotes.
    pub kind: MarkerKind,
    /// First character covered.
    pub start: usize,
    /// One past the last character covered.
    pub end: usize,
}

impl TextMarker {
    /// Create a marker over `start..end`.
    pub fn new(kind: MarkerKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }

    /// Whether `offset` falls inside the marked range.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// Data held by the tree for a single node.
///
/// Attributes are set through the `with_*` builders before insertion, or
/// through [`AccessibilityTree`](crate::AccessibilityTree) setters afterwards.
/// Structural links (parent, children, same-line links) are owned by the tree.
#[derive(Debug, Clone, Default)]
pub struct NodeData {
    pub(crate) role: Role,
    pub(crate) name: String,
    pub(crate) value: Option<String>,
    pub(crate) state: NodeState,
    pub(crate) input_type: InputType,
    pub(crate) style: TextStyle,
    pub(crate) markers: Vec<TextMarker>,
    pub(crate) level: Option<u32>,
    pub(crate) text_selection: Option<(usize, usize)>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) previous_on_line: Option<NodeId>,
    pub(crate) next_on_line: Option<NodeId>,
}

impl NodeData {
    /// Create node data with the given role.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            ..Default::default()
        }
    }

    /// Set the accessible name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the value (for text fields).
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set the state flags.
    pub fn with_state(mut self, state: NodeState) -> Self {
        self.state = state;
        self
    }

    /// Set the input type.
    pub fn with_input_type(mut self, input_type: InputType) -> Self {
        self.input_type = input_type;
        self
    }

    /// Set the text style.
    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    /// Add a text marker.
    pub fn with_marker(mut self, marker: TextMarker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Set the hierarchical level (headings).
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    /// Set the text selection of a plain text field.
    pub fn with_text_selection(mut self, start: usize, end: usize) -> Self {
        self.text_selection = Some((start, end));
        self
    }

    /// The role.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The accessible name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value, if the node has one.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The text this node contributes: the value for text fields, else the name.
    pub fn text(&self) -> &str {
        match (self.role, &self.value) {
            (Role::TextField, Some(value)) => value,
            _ => &self.name,
        }
    }

    /// The state flags.
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// The input type.
    pub fn input_type(&self) -> InputType {
        self.input_type
    }

    /// The text style.
    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// The text markers.
    pub fn markers(&self) -> &[TextMarker] {
        &self.markers
    }

    /// The hierarchical level.
    pub fn level(&self) -> Option<u32> {
        self.level
    }

    /// The plain-field text selection as `(start, end)`.
    pub fn text_selection(&self) -> Option<(usize, usize)> {
        self.text_selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_prefers_value_for_fields() {
        let field = NodeData::new(Role::TextField)
            .with_name("Label")
            .with_value("typed");
        assert_eq!(field.text(), "typed");

        let text = NodeData::new(Role::StaticText).with_name("hello");
        assert_eq!(text.text(), "hello");
    }

    #[test]
    fn test_marker_contains() {
        let marker = TextMarker::new(MarkerKind::Grammar, 2, 5);
        assert!(!marker.contains(1));
        assert!(marker.contains(2));
        assert!(marker.contains(4));
        assert!(!marker.contains(5));
    }
}
