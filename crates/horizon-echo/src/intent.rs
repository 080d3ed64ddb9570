//! Direct feedback for selection changes the host explained.
//!
//! When the host reports why the selection moved (by character, word, line
//! or paragraph), the right feedback is known without diffing. The handler
//! speaks it from the rebuilt line and tells the caller to skip the diff.

use horizon_echo_core::logging::targets;
use horizon_echo_core::{AccessibilityTree, Intent, IntentCommand, Role, TextBoundary};

use crate::context;
use crate::line::EditableLine;
use crate::messages;
use crate::speech::{Output, SpeechProperties, SpeechSink};

/// Speaks selection movements described by host intents.
///
/// Stateless. Every call works from the lines it is handed.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentHandler;

impl IntentHandler {
    /// Handle the first intent that describes a supported movement.
    ///
    /// Returns `true` when feedback was produced and the diff should be
    /// skipped.
    pub fn on_intents(
        intents: &[Intent],
        cur: &EditableLine,
        prev: Option<&EditableLine>,
        tree: &AccessibilityTree,
        speech: &mut dyn SpeechSink,
    ) -> bool {
        let mut out = Output::new(speech, true);
        Self::handle(intents, cur, prev, tree, &mut out)
    }

    pub(crate) fn handle(
        intents: &[Intent],
        cur: &EditableLine,
        prev: Option<&EditableLine>,
        tree: &AccessibilityTree,
        out: &mut Output<'_>,
    ) -> bool {
        intents.iter().any(|intent| {
            let handled = match intent.command {
                IntentCommand::MoveSelection | IntentCommand::ExtendSelection => {
                    Self::on_move_selection(intent, cur, prev, tree, out)
                }
                _ => false,
            };
            if handled {
                tracing::trace!(target: targets::INTENT, ?intent, "handled intent");
            }
            handled
        })
    }

    fn on_move_selection(
        intent: &Intent,
        cur: &EditableLine,
        prev: Option<&EditableLine>,
        tree: &AccessibilityTree,
        out: &mut Output<'_>,
    ) -> bool {
        let Some(boundary) = intent.text_boundary else {
            return false;
        };
        match boundary {
            TextBoundary::Character => {
                let from = prev.map(|p| p.end().node()).filter(|&n| tree.contains(n));
                let to = cur.end().node();
                let announcements = context::transition_announcements(tree, from, to);
                match cur.create_char_range() {
                    Some(range) => {
                        out.speak(&range.text, SpeechProperties::phonetic());
                        for announcement in &announcements {
                            out.queue(announcement, SpeechProperties::default());
                        }
                    }
                    // Nothing to the right. Only call it a new line when no
                    // structural boundary was crossed.
                    None if announcements.is_empty() => {
                        out.speak(messages::NEWLINE, SpeechProperties::default());
                    }
                    None => {
                        let mut announcements = announcements.iter();
                        if let Some(first) = announcements.next() {
                            out.speak(first, SpeechProperties::default());
                        }
                        for announcement in announcements {
                            out.queue(announcement, SpeechProperties::default());
                        }
                    }
                }
                true
            }
            TextBoundary::WordStart | TextBoundary::WordEnd => {
                let Some(range) = cur.create_word_range(boundary == TextBoundary::WordEnd) else {
                    return false;
                };
                out.speak(&range.text, SpeechProperties::default());
                let from = prev
                    .and_then(|p| p.create_word_range(boundary == TextBoundary::WordEnd))
                    .map(|r| r.start.node())
                    .filter(|&n| tree.contains(n));
                for label in context::entered_labels(tree, from, range.start.node()) {
                    out.queue(&label, SpeechProperties::default());
                }
                true
            }
            TextBoundary::LineStart | TextBoundary::LineEnd | TextBoundary::LineStartOrEnd => {
                cur.speak_line(prev, tree, out);
                true
            }
            TextBoundary::ParagraphStart => Self::speak_paragraph(cur, tree, out),
            _ => false,
        }
    }

    fn speak_paragraph(cur: &EditableLine, tree: &AccessibilityTree, out: &mut Output<'_>) -> bool {
        let Some(mut node) = cur.start_container() else {
            return false;
        };
        if tree.role(node) == Some(Role::LineBreak) {
            return false;
        }
        while tree.role(node).is_some_and(Role::is_text) {
            match tree.parent(node) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
        if tree.role(node) == Some(Role::TextField) || tree.editable_root(node) == Some(node) {
            return false;
        }
        let text = tree.inner_text(node);
        if text.is_empty() {
            return false;
        }
        out.speak(&text, SpeechProperties::default());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::LineOptions;
    use crate::speech::RecordingSpeech;
    use horizon_echo_core::{MoveDirection, NodeData, NodeId, NodeState};

    fn editable() -> NodeState {
        NodeState {
            editable: true,
            richly_editable: true,
            ..Default::default()
        }
    }

    struct Fixture {
        tree: AccessibilityTree,
        first: NodeId,
        second: NodeId,
        linked: NodeId,
    }

    /// A rich field with two paragraphs; the second holds a link.
    fn setup() -> Fixture {
        let mut tree = AccessibilityTree::new();
        let root = tree.add_root(NodeData::new(Role::RootWebArea));
        let field = tree
            .append_child(root, NodeData::new(Role::TextField).with_state(editable()))
            .unwrap();
        let p1 = tree
            .append_child(field, NodeData::new(Role::Paragraph).with_state(editable()))
            .unwrap();
        let first = tree
            .append_child(p1, NodeData::new(Role::StaticText).with_name("hello world").with_state(editable()))
            .unwrap();
        let p2 = tree
            .append_child(field, NodeData::new(Role::Paragraph).with_state(editable()))
            .unwrap();
        let second = tree
            .append_child(p2, NodeData::new(Role::StaticText).with_name("see ").with_state(editable()))
            .unwrap();
        let link = tree
            .append_child(p2, NodeData::new(Role::Link).with_state(editable()))
            .unwrap();
        let linked = tree
            .append_child(link, NodeData::new(Role::StaticText).with_name("docs").with_state(editable()))
            .unwrap();
        tree.link_on_line(second, linked).unwrap();
        Fixture {
            tree,
            first,
            second,
            linked,
        }
    }

    fn line(f: &Fixture, node: NodeId, offset: usize) -> EditableLine {
        EditableLine::caret(&f.tree, node, offset, LineOptions::default())
    }

    fn run(f: &Fixture, intent: Intent, cur: &EditableLine, prev: Option<&EditableLine>) -> (bool, Vec<String>) {
        let mut speech = RecordingSpeech::new();
        let handled = IntentHandler::on_intents(&[intent], cur, prev, &f.tree, &mut speech);
        (handled, speech.take_texts())
    }

    #[test]
    fn test_character_movement() {
        let f = setup();
        let prev = line(&f, f.first, 0);
        let cur = line(&f, f.first, 1);
        let intent = Intent::move_selection(TextBoundary::Character, MoveDirection::Forward);
        assert_eq!(run(&f, intent, &cur, Some(&prev)), (true, vec!["e".to_string()]));
    }

    #[test]
    fn test_character_at_line_end_is_newline() {
        let f = setup();
        let prev = line(&f, f.first, 10);
        let cur = line(&f, f.first, 11);
        let intent = Intent::move_selection(TextBoundary::Character, MoveDirection::Forward);
        assert_eq!(run(&f, intent, &cur, Some(&prev)), (true, vec![messages::NEWLINE.to_string()]));
    }

    #[test]
    fn test_character_into_link_announces_it() {
        let f = setup();
        let prev = line(&f, f.second, 3);
        let cur = line(&f, f.linked, 0);
        let intent = Intent::move_selection(TextBoundary::Character, MoveDirection::Forward);
        let (handled, spoken) = run(&f, intent, &cur, Some(&prev));
        assert!(handled);
        assert_eq!(spoken, vec!["d", "Link"]);
    }

    #[test]
    fn test_word_movement() {
        let f = setup();
        let cur = line(&f, f.first, 6);
        let start = Intent::move_selection(TextBoundary::WordStart, MoveDirection::Forward);
        assert_eq!(run(&f, start, &cur, None).1, vec!["world"]);
        let end = Intent::move_selection(TextBoundary::WordEnd, MoveDirection::Forward);
        assert_eq!(run(&f, end, &cur, None).1, vec!["hello"]);
    }

    #[test]
    fn test_line_movement_speaks_line() {
        let f = setup();
        let prev = line(&f, f.first, 0);
        let cur = line(&f, f.second, 0);
        let intent = Intent::move_selection(TextBoundary::LineStart, MoveDirection::Forward);
        let (handled, spoken) = run(&f, intent, &cur, Some(&prev));
        assert!(handled);
        assert_eq!(spoken, vec!["see ", "docs", "Link"]);
    }

    #[test]
    fn test_paragraph_start() {
        let f = setup();
        let cur = line(&f, f.second, 0);
        let intent = Intent::move_selection(TextBoundary::ParagraphStart, MoveDirection::Backward);
        assert_eq!(run(&f, intent, &cur, None), (true, vec!["see docs".to_string()]));
    }

    #[test]
    fn test_paragraph_start_skips_line_break() {
        let mut f = setup();
        let p1 = f.tree.parent(f.first).unwrap();
        let br = f
            .tree
            .append_child(p1, NodeData::new(Role::LineBreak).with_name("\n").with_state(editable()))
            .unwrap();
        let cur = line(&f, br, 0);
        let intent = Intent::move_selection(TextBoundary::ParagraphStart, MoveDirection::Forward);
        assert_eq!(run(&f, intent, &cur, None), (false, Vec::new()));
    }

    #[test]
    fn test_paragraph_start_skips_field_root() {
        let mut f = setup();
        let field = f.tree.parent(f.tree.parent(f.first).unwrap()).unwrap();
        let loose = f
            .tree
            .append_child(field, NodeData::new(Role::StaticText).with_name("loose").with_state(editable()))
            .unwrap();
        let cur = line(&f, loose, 0);
        let intent = Intent::move_selection(TextBoundary::ParagraphStart, MoveDirection::Backward);
        assert_eq!(run(&f, intent, &cur, None), (false, Vec::new()));
    }

    #[test]
    fn test_unhandled_intents_fall_through() {
        let f = setup();
        let cur = line(&f, f.first, 0);
        let insert = Intent::command(IntentCommand::Insert);
        assert_eq!(run(&f, insert, &cur, None), (false, Vec::new()));
        let page = Intent::move_selection(TextBoundary::WebPage, MoveDirection::Forward);
        assert_eq!(run(&f, page, &cur, None), (false, Vec::new()));
    }
}
