//! Fixed user-facing strings.

use horizon_echo_core::MarkerKind;

/// Spoken when the caret reaches the end of the text.
pub const END_OF_TEXT: &str = "End of text";
/// Spoken for an empty line.
pub const BLANK: &str = "blank";
/// Spoken for a line containing only whitespace.
pub const WHITESPACE: &str = "whitespace";
/// Appended after newly selected text.
pub const SELECTED: &str = "selected";
/// Appended after text that is no longer selected.
pub const UNSELECTED: &str = "unselected";
/// Appended after text that grew the selection.
pub const ADDED_TO_SELECTION: &str = "added to selection";
/// Appended after text that shrank the selection.
pub const REMOVED_FROM_SELECTION: &str = "removed from selection";
/// Appended after a multi-character deletion.
pub const DELETED: &str = "deleted";
/// Spoken instead of any character of a protected field.
pub const PASSWORD_CHAR: &str = "dot";
/// Spoken for an empty line in rich text.
pub const NEWLINE: &str = "\n";

/// Prefix for a structural ancestor that was left.
pub const EXITED: &str = "Exited";

/// Style announcement when bold starts.
pub const BOLD: &str = "Bold";
/// Style announcement when bold ends.
pub const NOT_BOLD: &str = "Not bold";
/// Style announcement when italic starts.
pub const ITALIC: &str = "Italic";
/// Style announcement when italic ends.
pub const NOT_ITALIC: &str = "Not italic";
/// Style announcement when underline starts.
pub const UNDERLINE: &str = "Underline";
/// Style announcement when underline ends.
pub const NOT_UNDERLINE: &str = "Not underline";
/// Style announcement when line-through starts.
pub const LINE_THROUGH: &str = "Line through";
/// Style announcement when line-through ends.
pub const NOT_LINE_THROUGH: &str = "Not line through";

/// "Size N" for a font size change.
pub fn font_size(size: f32) -> String {
    format!("Size {}", size.round())
}

/// "Font F" for a font family change.
pub fn font_family(family: &str) -> String {
    format!("Font {family}")
}

/// "Exited X" for a structural ancestor that was left.
pub fn exited(label: &str) -> String {
    format!("{EXITED} {label}")
}

/// The name of a text marker kind.
pub fn marker(kind: MarkerKind) -> &'static str {
    match kind {
        MarkerKind::Spelling => "Misspelled",
        MarkerKind::Grammar => "Grammar error",
        MarkerKind::TextMatch => "Search result",
    }
}

/// "Leaving X" for a text marker the caret moved out of.
pub fn leaving_marker(kind: MarkerKind) -> String {
    let name = marker(kind);
    let mut chars = name.chars();
    let lowered = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("Leaving {lowered}")
}
