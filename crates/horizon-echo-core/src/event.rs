//! Change notifications published by the tree source.

use crate::tree::NodeId;

/// The kind of change a [`TreeEvent`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeEventKind {
    /// A node received input focus.
    Focus,
    /// The text of a node changed.
    TextChanged,
    /// The text selection inside a plain field changed.
    TextSelectionChanged,
    /// The document selection changed.
    DocumentSelectionChanged,
    /// The value of a field changed.
    ValueChanged,
    /// A node was created, destroyed or moved.
    StructureChanged,
}

impl TreeEventKind {
    /// Whether editing feedback reacts to this kind of event.
    pub fn is_editing_event(self) -> bool {
        !matches!(self, Self::StructureChanged)
    }
}

/// What the user did to cause a selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentCommand {
    /// The caret or selection moved.
    MoveSelection,
    /// The selection was extended.
    ExtendSelection,
    /// The selection was set programmatically.
    SetSelection,
    /// The selection was cleared.
    ClearSelection,
    /// Text was deleted.
    Delete,
    /// Text was inserted.
    Insert,
    /// Text was dictated.
    Dictate,
    /// Formatting was applied.
    Format,
}

/// The unit a selection intent moved by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextBoundary {
    /// One character.
    Character,
    /// To the start of a word.
    WordStart,
    /// To the end of a word.
    WordEnd,
    /// To the start of a line.
    LineStart,
    /// To the end of a line.
    LineEnd,
    /// To the start or end of a line (up/down arrow).
    LineStartOrEnd,
    /// To the start of a paragraph.
    ParagraphStart,
    /// To the end of a paragraph.
    ParagraphEnd,
    /// To the start or end of a paragraph.
    ParagraphStartOrEnd,
    /// To the start of a sentence.
    SentenceStart,
    /// To the end of a sentence.
    SentenceEnd,
    /// To the start or end of the web page.
    WebPage,
}

/// Direction of a movement intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MoveDirection {
    /// Toward the end of the document.
    #[default]
    Forward,
    /// Toward the start of the document.
    Backward,
}

/// A host-supplied hint describing why a selection changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Intent {
    /// What happened.
    pub command: IntentCommand,
    /// The unit moved by, for movement commands.
    pub text_boundary: Option<TextBoundary>,
    /// The direction moved, for movement commands.
    pub direction: MoveDirection,
}

impl Intent {
    /// A selection movement by `boundary` in `direction`.
    pub fn move_selection(boundary: TextBoundary, direction: MoveDirection) -> Self {
        Self {
            command: IntentCommand::MoveSelection,
            text_boundary: Some(boundary),
            direction,
        }
    }

    /// An intent with no boundary information.
    pub fn command(command: IntentCommand) -> Self {
        Self {
            command,
            text_boundary: None,
            direction: MoveDirection::Forward,
        }
    }
}

/// A change notification for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEvent {
    /// What changed.
    pub kind: TreeEventKind,
    /// The node the change applies to.
    pub target: NodeId,
    /// Semantic hints, in the order the host supplied them.
    pub intents: Vec<Intent>,
}

impl TreeEvent {
    /// Create an event without intents.
    pub fn new(kind: TreeEventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            intents: Vec::new(),
        }
    }

    /// Attach intents to the event.
    pub fn with_intents(mut self, intents: impl IntoIterator<Item = Intent>) -> Self {
        self.intents.extend(intents);
        self
    }
}
