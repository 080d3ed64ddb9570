//! Accessibility roles for tree nodes.

/// The accessibility role of a node.
///
/// This is the subset of host roles the editing engine distinguishes. Hosts
/// map anything else to [`Role::Unknown`] or [`Role::GenericContainer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum Role {
    /// A node with no specific role.
    #[default]
    Unknown,

    /// The root of a document.
    RootWebArea,

    /// An editable text field (input, textarea or a content-editable host).
    TextField,

    /// A generic block or inline container.
    GenericContainer,

    /// A paragraph.
    Paragraph,

    /// A run of static text. Its children, if any, are inline text boxes.
    StaticText,

    /// One visual fragment of a static text run.
    InlineTextBox,

    /// A hard line break.
    LineBreak,

    /// A hyperlink.
    Link,

    /// A heading. The level is stored on the node.
    Heading,

    /// A list of items.
    List,

    /// An item within a list.
    ListItem,

    /// An image.
    Image,

    /// A push button.
    Button,
}

impl Role {
    /// Whether this role carries literal text content.
    pub fn is_text(self) -> bool {
        matches!(self, Self::StaticText | Self::InlineTextBox | Self::LineBreak)
    }

    /// Whether this role is a visual line fragment.
    ///
    /// Line fragments are grouped by their parent when the line buffer is
    /// annotated with container spans.
    pub fn is_line_fragment(self) -> bool {
        matches!(self, Self::InlineTextBox)
    }

    /// Whether entering or leaving a node with this role is announced.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            Self::Link | Self::Heading | Self::List | Self::ListItem | Self::Button | Self::Image
        )
    }

    /// Whether this role starts a block of text.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            Self::Paragraph
                | Self::Heading
                | Self::ListItem
                | Self::GenericContainer
                | Self::TextField
                | Self::RootWebArea
        )
    }

    /// Human-readable name used when announcing the role.
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::RootWebArea => "Document",
            Self::TextField => "Edit text",
            Self::GenericContainer => "",
            Self::Paragraph => "",
            Self::StaticText => "",
            Self::InlineTextBox => "",
            Self::LineBreak => "",
            Self::Link => "Link",
            Self::Heading => "Heading",
            Self::List => "List",
            Self::ListItem => "List item",
            Self::Image => "Image",
            Self::Button => "Button",
        }
    }
}
