//! The text and selection diff state machine.
//!
//! [`EditableTextState`] remembers the last `(value, start, end)` of a field.
//! Each [`TextChangeEvent`] is classified against it and described with the
//! fewest words that tell the user what happened: the character moved over,
//! the text selected, the word just typed, the text deleted.
//!
//! The patterns are checked in a fixed priority order. Several are special
//! cases of later ones (autocomplete before selection growth, replacement
//! before deletion before whole-text diffing), so the order matters.

use horizon_echo_core::logging::targets;

use crate::messages;
use crate::settings::EditingSettings;
use crate::speech::{Output, Personality, SpeechProperties, SpeechSink};
use crate::text::{
    char_len, char_string_at, common_prefix_len, common_suffix_len, is_word_break, line_breaks, line_index,
    line_range, substring, substring_from,
};

/// A snapshot of a field's value and selection.
///
/// `start <= end` always holds: reversed selections are normalized on
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChangeEvent {
    value: String,
    start: usize,
    end: usize,
    triggered_by_user: bool,
}

impl TextChangeEvent {
    /// Create an event, swapping `start` and `end` if they are reversed.
    pub fn new(value: impl Into<String>, start: usize, end: usize, triggered_by_user: bool) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Self {
            value: value.into(),
            start,
            end,
            triggered_by_user,
        }
    }

    /// The field value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Selection start.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Selection end.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Whether the change came from user input.
    pub fn triggered_by_user(&self) -> bool {
        self.triggered_by_user
    }
}

/// The last known state of one editable field.
#[derive(Debug, Clone)]
pub struct EditableTextState {
    value: String,
    start: usize,
    end: usize,
    is_password: bool,
    multiline: bool,
    line_breaks: Vec<usize>,
    last_change_described: bool,
}

impl EditableTextState {
    /// Start tracking a field with the given value and selection.
    pub fn new(value: impl Into<String>, start: usize, end: usize, is_password: bool, multiline: bool) -> Self {
        let value = value.into();
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let line_breaks = if multiline { line_breaks(&value) } else { Vec::new() };
        Self {
            value,
            start,
            end,
            is_password,
            multiline,
            line_breaks,
            last_change_described: false,
        }
    }

    /// The current value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The current selection start.
    pub fn start(&self) -> usize {
        self.start
    }

    /// The current selection end.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Whether the field is protected.
    pub fn is_password(&self) -> bool {
        self.is_password
    }

    /// Whether the field is multiline.
    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    /// Whether the most recent [`changed`](Self::changed) call described anything.
    pub fn last_change_described(&self) -> bool {
        self.last_change_described
    }

    /// The line containing `index`. Always 0 for single-line fields.
    pub fn line_index(&self, index: usize) -> usize {
        if self.multiline {
            line_index(&self.line_breaks, index)
        } else {
            0
        }
    }

    /// The text of line `index`.
    pub fn line(&self, index: usize) -> String {
        if !self.multiline {
            return self.value.clone();
        }
        let (start, end) = line_range(&self.value, &self.line_breaks, index);
        substring(&self.value, start, end)
    }

    /// Character range of line `index`.
    pub fn line_bounds(&self, index: usize) -> (usize, usize) {
        if self.multiline {
            line_range(&self.value, &self.line_breaks, index)
        } else {
            (0, char_len(&self.value))
        }
    }

    /// Replace the tracked state without describing anything.
    pub fn update(&mut self, value: impl Into<String>, start: usize, end: usize) {
        let value = value.into();
        if value != self.value && self.multiline {
            self.line_breaks = line_breaks(&value);
        }
        self.value = value;
        self.start = start.min(end);
        self.end = start.max(end);
    }

    /// Describe the change from the tracked state to `evt`, then adopt it.
    pub fn changed(&mut self, evt: &TextChangeEvent, settings: &EditingSettings, speech: &mut dyn SpeechSink) {
        if evt.value == self.value && evt.start == self.start && evt.end == self.end {
            self.last_change_described = false;
            return;
        }

        let mut out = Output::new(speech, evt.triggered_by_user);
        if evt.value == self.value {
            self.describe_selection_changed(evt, settings, &mut out);
        } else {
            let prev = TextChangeEvent::new(self.value.clone(), self.start, self.end, true);
            self.describe_text_changed(&prev, evt, settings, &mut out);
        }
        self.last_change_described = true;
        self.update(evt.value.clone(), evt.start, evt.end);
    }

    fn describe_selection_changed(&self, evt: &TextChangeEvent, settings: &EditingSettings, out: &mut Output<'_>) {
        tracing::trace!(
            target: targets::DIFF,
            from = ?(self.start, self.end),
            to = ?(evt.start, evt.end),
            "selection changed"
        );
        if self.is_password {
            out.speak(messages::PASSWORD_CHAR, SpeechProperties::default());
            return;
        }

        let value = &self.value;
        if evt.start == evt.end {
            if self.start != self.end {
                say(out, &substring(value, self.start, self.end), SpeechProperties::default());
                out.queue(messages::UNSELECTED, SpeechProperties::default());
            } else if self.line_index(self.start) != self.line_index(evt.start) {
                let line = self.line(self.line_index(evt.start));
                if line.is_empty() {
                    out.speak(messages::BLANK, SpeechProperties::with_personality(Personality::Annotation));
                } else if line != "\n" && line.chars().all(char::is_whitespace) {
                    out.speak(messages::WHITESPACE, SpeechProperties::with_personality(Personality::Annotation));
                } else {
                    out.speak(&line, SpeechProperties::default());
                }
            } else if self.start == evt.start + 1 || self.start + 1 == evt.start {
                if evt.start == char_len(value) {
                    out.speak(messages::END_OF_TEXT, SpeechProperties::default());
                } else {
                    let properties = SpeechProperties {
                        phonetic_characters: evt.triggered_by_user,
                        ..Default::default()
                    };
                    say(out, &char_string_at(value, evt.start), properties);
                }
            } else {
                let from = self.start.min(evt.start);
                let to = self.start.max(evt.start);
                say(out, &substring(value, from, to), SpeechProperties::default());
            }
            return;
        }

        let len = char_len(value);
        if self.start + 1 == evt.start && self.end == len && evt.end == len {
            // The user typed one character of autocompleted text.
            if settings.typing_echo.speaks_characters() {
                say(out, &char_string_at(value, self.start), SpeechProperties::default());
            }
            let tail = substring_from(value, evt.start);
            if !tail.is_empty() {
                out.queue(&tail, SpeechProperties::default());
            }
        } else if self.start == self.end {
            say(out, &substring(value, evt.start, evt.end), SpeechProperties::default());
            out.queue(messages::SELECTED, SpeechProperties::default());
        } else if self.start == evt.start && self.end < evt.end {
            say(out, &substring(value, self.end, evt.end), SpeechProperties::default());
            out.queue(messages::ADDED_TO_SELECTION, SpeechProperties::default());
        } else if self.start == evt.start && self.end > evt.end {
            say(out, &substring(value, evt.end, self.end), SpeechProperties::default());
            out.queue(messages::REMOVED_FROM_SELECTION, SpeechProperties::default());
        } else if self.end == evt.end && self.start > evt.start {
            say(out, &substring(value, evt.start, self.start), SpeechProperties::default());
            out.queue(messages::ADDED_TO_SELECTION, SpeechProperties::default());
        } else if self.end == evt.end && self.start < evt.start {
            say(out, &substring(value, self.start, evt.start), SpeechProperties::default());
            out.queue(messages::REMOVED_FROM_SELECTION, SpeechProperties::default());
        } else {
            say(out, &substring(value, evt.start, evt.end), SpeechProperties::default());
            out.queue(messages::SELECTED, SpeechProperties::default());
        }
    }

    fn describe_text_changed(
        &self,
        prev: &TextChangeEvent,
        evt: &TextChangeEvent,
        settings: &EditingSettings,
        out: &mut Output<'_>,
    ) {
        let value = prev.value.as_str();
        let len = char_len(value);
        let mut personality = None;
        if char_len(&evt.value) + 1 < len {
            personality = Some(Personality::Deleted);
        }
        tracing::trace!(target: targets::DIFF, from = value, to = evt.value.as_str(), "text changed");

        if self.is_password {
            out.speak(messages::PASSWORD_CHAR, props(personality));
            return;
        }

        // A selection reaching the end of the new value is taken to be
        // autocompleted text. Diff without it and mention it afterwards.
        let mut evt_value = evt.value.clone();
        let mut evt_end = evt.end;
        let mut new_len = char_len(&evt_value);
        let mut autocomplete_suffix = String::new();
        if evt.start < evt_end && evt_end == new_len {
            autocomplete_suffix = substring_from(&evt_value, evt.start);
            evt_value = substring(&evt_value, 0, evt.start);
            evt_end = evt.start;
            new_len = char_len(&evt_value);
        }

        // The previous selection was replaced by new text at the same spot:
        // typing, pasting, or typing over a selection.
        let prefix_len = prev.start;
        let suffix_len = len.saturating_sub(prev.end);
        if new_len >= prefix_len + suffix_len + (evt_end - evt.start)
            && substring(&evt_value, 0, prefix_len) == substring(value, 0, prefix_len)
            && substring_from(&evt_value, new_len - suffix_len) == substring_from(value, prev.end)
        {
            self.describe_text_changed_helper(prev, evt, prefix_len, suffix_len, &autocomplete_suffix, personality, settings, out);
            return;
        }

        // Characters were deleted at the caret: backspace, forward delete
        // and their word or line variants.
        let prefix_len = evt.start;
        let suffix_len = new_len.saturating_sub(evt_end);
        if prev.start == prev.end
            && evt.start == evt_end
            && len >= prefix_len + suffix_len
            && substring(&evt_value, 0, prefix_len) == substring(value, 0, prefix_len)
            && substring_from(&evt_value, new_len - suffix_len) == substring_from(value, len - suffix_len)
        {
            if prev.start == evt.start {
                // Forward delete: read what is now under the caret.
                say(out, &char_string_at(&evt.value, evt.start), SpeechProperties::default());
            } else {
                self.describe_text_changed_helper(prev, evt, prefix_len, suffix_len, &autocomplete_suffix, personality, settings, out);
            }
            return;
        }

        // Not a recognizable editing operation. Describe the text change
        // without regard to the selection.
        evt_value.push_str(&autocomplete_suffix);
        let new_len = char_len(&evt_value);

        if new_len == len + 1 && substring(&evt_value, 0, len) == value {
            say(out, &char_string_at(&evt_value, new_len - 1), props(personality));
            return;
        }
        if new_len == len + 1 && substring_from(&evt_value, 1) == value {
            say(out, &char_string_at(&evt_value, 0), props(personality));
            return;
        }
        if new_len + 1 == len && substring(value, 0, new_len) == evt_value {
            say(out, &char_string_at(value, len - 1), props(personality));
            return;
        }
        if new_len + 1 == len && substring_from(value, 1) == evt_value {
            say(out, &char_string_at(value, 0), props(personality));
            return;
        }

        if self.multiline {
            // Bulk replacement in multiline content is usually composition
            // or reflow. Only note that text went away.
            if new_len < len {
                out.speak(messages::DELETED, props(personality));
            }
            return;
        }

        if new_len <= settings.max_short_phrase_len {
            self.describe_text_changed_helper(prev, evt, 0, 0, "", personality, settings, out);
            return;
        }

        // Speak only the changed middle, widened to whole words.
        let old: Vec<char> = value.chars().collect();
        let mut prefix_len = common_prefix_len(value, &evt_value);
        while prefix_len > 0 && !is_word_break(old[prefix_len - 1]) {
            prefix_len -= 1;
        }
        let mut suffix_len = common_suffix_len(value, &evt_value)
            .min(len - prefix_len)
            .min(new_len - prefix_len);
        while suffix_len > 0 && !is_word_break(old[len - suffix_len]) {
            suffix_len -= 1;
        }
        self.describe_text_changed_helper(prev, evt, prefix_len, suffix_len, "", personality, settings, out);
    }

    #[allow(clippy::too_many_arguments)]
    fn describe_text_changed_helper(
        &self,
        prev: &TextChangeEvent,
        evt: &TextChangeEvent,
        prefix_len: usize,
        suffix_len: usize,
        autocomplete_suffix: &str,
        mut personality: Option<Personality>,
        settings: &EditingSettings,
        out: &mut Output<'_>,
    ) {
        let len = char_len(&prev.value);
        let new_len = char_len(&evt.value);
        let deleted_len = len.saturating_sub(prefix_len + suffix_len);
        let deleted = substring(&prev.value, prefix_len, prefix_len + deleted_len);
        let inserted_len = new_len.saturating_sub(prefix_len + suffix_len);
        let inserted = substring(&evt.value, prefix_len, prefix_len + inserted_len);
        let mut triggered_by_user = evt.triggered_by_user;

        let mut utterance = String::new();
        if inserted_len > 1 {
            if settings.speak_insertions {
                utterance = inserted;
            }
        } else if inserted_len == 1 {
            let inserted_char = inserted.chars().next().unwrap_or(' ');
            let completes_word = settings.typing_echo.speaks_words()
                && is_word_break(inserted_char)
                && prefix_len > 0
                && !crate::text::char_at(&evt.value, prefix_len - 1).is_some_and(is_word_break);
            if completes_word {
                let chars: Vec<char> = evt.value.chars().collect();
                let mut index = prefix_len;
                while index > 0 && !is_word_break(chars[index - 1]) {
                    index -= 1;
                }
                if index < prefix_len {
                    utterance = substring(&evt.value, index, prefix_len + 1);
                } else {
                    utterance = inserted;
                    triggered_by_user = false;
                }
            } else if settings.typing_echo.speaks_characters() {
                utterance = inserted;
            }
        } else if deleted_len > 1 && autocomplete_suffix.is_empty() {
            utterance = format!("{deleted}, {}", messages::DELETED);
        } else if deleted_len == 1 {
            utterance = deleted;
            personality = Some(Personality::Deleted);
        }

        if !autocomplete_suffix.is_empty() {
            if utterance.is_empty() {
                utterance = autocomplete_suffix.to_owned();
            } else {
                utterance = format!("{utterance}, {autocomplete_suffix}");
            }
        }

        if utterance.is_empty() {
            return;
        }
        tracing::trace!(target: targets::DIFF, utterance, deleted_len, inserted_len, "describing edit");
        if triggered_by_user {
            out.speak(&utterance, props(personality));
        } else {
            out.queue(&utterance, props(personality));
        }
    }
}

fn props(personality: Option<Personality>) -> SpeechProperties {
    SpeechProperties {
        personality,
        ..Default::default()
    }
}

/// Speak with the change's queue mode, skipping empty text.
fn say(out: &mut Output<'_>, text: &str, properties: SpeechProperties) {
    if !text.is_empty() {
        out.speak(text, properties);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TypingEcho;
    use crate::speech::{QueueMode, RecordingSpeech};

    fn setup(value: &str, start: usize, end: usize) -> (EditableTextState, EditingSettings, RecordingSpeech) {
        (
            EditableTextState::new(value, start, end, false, false),
            EditingSettings::default(),
            RecordingSpeech::new(),
        )
    }

    fn change(
        state: &mut EditableTextState,
        settings: &EditingSettings,
        speech: &mut RecordingSpeech,
        value: &str,
        start: usize,
        end: usize,
    ) -> Vec<String> {
        state.changed(&TextChangeEvent::new(value, start, end, true), settings, speech);
        speech.take_texts()
    }

    #[test]
    fn test_event_normalizes_selection() {
        let evt = TextChangeEvent::new("v", 1, 0, true);
        assert_eq!((evt.start(), evt.end()), (0, 1));
    }

    #[test]
    fn test_identical_change_is_not_described() {
        let (mut state, settings, mut speech) = setup("abc", 1, 1);
        assert!(change(&mut state, &settings, &mut speech, "abc", 1, 1).is_empty());
        assert!(!state.last_change_described());
        change(&mut state, &settings, &mut speech, "abc", 2, 2);
        assert!(state.last_change_described());
    }

    #[test]
    fn test_typing_characters() {
        let (mut state, settings, mut speech) = setup("", 0, 0);
        let mut spoken = Vec::new();
        for (i, word) in ["H", "He", "Hel", "Hell", "Hello"].into_iter().enumerate() {
            spoken.extend(change(&mut state, &settings, &mut speech, word, i + 1, i + 1));
        }
        assert_eq!(spoken, vec!["H", "e", "l", "l", "o"]);
    }

    #[test]
    fn test_typing_word_echo() {
        let (mut state, settings, mut speech) = setup("Hello", 5, 5);
        let settings = EditingSettings {
            typing_echo: TypingEcho::Word,
            ..settings
        };
        assert_eq!(change(&mut state, &settings, &mut speech, "Hello ", 6, 6), vec!["Hello "]);
        assert!(change(&mut state, &settings, &mut speech, "Hello w", 7, 7).is_empty());
    }

    #[test]
    fn test_typing_echo_none() {
        let (mut state, mut settings, mut speech) = setup("", 0, 0);
        settings.typing_echo = TypingEcho::None;
        assert!(change(&mut state, &settings, &mut speech, "a", 1, 1).is_empty());
    }

    #[test]
    fn test_whole_field_replacement() {
        let (mut state, settings, mut speech) = setup("Alabama", 0, 0);
        assert_eq!(change(&mut state, &settings, &mut speech, "Alaska", 0, 0), vec!["Alaska"]);
    }

    #[test]
    fn test_autocomplete() {
        let (mut state, settings, mut speech) = setup("", 0, 0);
        assert_eq!(change(&mut state, &settings, &mut speech, "g", 1, 1), vec!["g"]);
        assert_eq!(
            change(&mut state, &settings, &mut speech, "google.com", 1, 10),
            vec!["oogle.com, oogle.com"]
        );
    }

    #[test]
    fn test_typing_into_autocompleted_selection() {
        let (mut state, settings, mut speech) = setup("google.com", 1, 10);
        assert_eq!(
            change(&mut state, &settings, &mut speech, "google.com", 2, 10),
            vec!["o", "ogle.com"]
        );
    }

    #[test]
    fn test_backspace_and_forward_delete() {
        let (mut state, settings, mut speech) = setup("abcd", 2, 2);
        assert_eq!(change(&mut state, &settings, &mut speech, "acd", 1, 1), vec!["b"]);
        assert_eq!(change(&mut state, &settings, &mut speech, "ad", 1, 1), vec!["d"]);
    }

    #[test]
    fn test_deleted_char_uses_deleted_personality() {
        let (mut state, settings, mut speech) = setup("abcd", 4, 4);
        state.changed(&TextChangeEvent::new("abc", 3, 3, true), &settings, &mut speech);
        let utterance = &speech.utterances()[0];
        assert_eq!(utterance.text, "d");
        assert_eq!(utterance.properties.personality, Some(Personality::Deleted));
        assert_eq!(utterance.mode, QueueMode::CategoryFlush);
    }

    #[test]
    fn test_word_deletion() {
        let (mut state, settings, mut speech) = setup("one two", 7, 7);
        assert_eq!(
            change(&mut state, &settings, &mut speech, "one ", 4, 4),
            vec!["two, deleted"]
        );
    }

    #[test]
    fn test_cursor_moves() {
        let (mut state, settings, mut speech) = setup("hello world", 0, 0);
        assert_eq!(change(&mut state, &settings, &mut speech, "hello world", 1, 1), vec!["e"]);
        assert_eq!(change(&mut state, &settings, &mut speech, "hello world", 6, 6), vec!["ello "]);
        assert_eq!(change(&mut state, &settings, &mut speech, "hello world", 5, 5), vec![" "]);
        change(&mut state, &settings, &mut speech, "hello world", 10, 10);
        assert_eq!(
            change(&mut state, &settings, &mut speech, "hello world", 11, 11),
            vec![messages::END_OF_TEXT]
        );
    }

    #[test]
    fn test_phonetic_only_when_user_triggered() {
        let (mut state, settings, mut speech) = setup("abc", 0, 0);
        state.changed(&TextChangeEvent::new("abc", 1, 1, true), &settings, &mut speech);
        state.changed(&TextChangeEvent::new("abc", 2, 2, false), &settings, &mut speech);
        assert!(speech.utterances()[0].properties.phonetic_characters);
        assert!(!speech.utterances()[1].properties.phonetic_characters);
        assert_eq!(speech.utterances()[1].mode, QueueMode::Queue);
    }

    #[test]
    fn test_selection_transitions() {
        let (mut state, settings, mut speech) = setup("hello world", 0, 0);
        assert_eq!(
            change(&mut state, &settings, &mut speech, "hello world", 0, 5),
            vec!["hello", messages::SELECTED]
        );
        assert_eq!(
            change(&mut state, &settings, &mut speech, "hello world", 0, 7),
            vec![" w", messages::ADDED_TO_SELECTION]
        );
        assert_eq!(
            change(&mut state, &settings, &mut speech, "hello world", 0, 6),
            vec!["w", messages::REMOVED_FROM_SELECTION]
        );
        assert_eq!(
            change(&mut state, &settings, &mut speech, "hello world", 2, 6),
            vec!["he", messages::REMOVED_FROM_SELECTION]
        );
        assert_eq!(
            change(&mut state, &settings, &mut speech, "hello world", 1, 6),
            vec!["e", messages::ADDED_TO_SELECTION]
        );
        assert_eq!(
            change(&mut state, &settings, &mut speech, "hello world", 7, 11),
            vec!["orld", messages::SELECTED]
        );
        assert_eq!(
            change(&mut state, &settings, &mut speech, "hello world", 7, 7),
            vec!["orld", messages::UNSELECTED]
        );
    }

    #[test]
    fn test_password_is_redacted() {
        let mut state = EditableTextState::new("secret", 6, 6, true, false);
        let settings = EditingSettings::default();
        let mut speech = RecordingSpeech::new();
        assert_eq!(
            change(&mut state, &settings, &mut speech, "secrets", 7, 7),
            vec![messages::PASSWORD_CHAR]
        );
        assert_eq!(
            change(&mut state, &settings, &mut speech, "secrets", 0, 0),
            vec![messages::PASSWORD_CHAR]
        );
    }

    #[test]
    fn test_multiline_line_moves() {
        let mut state = EditableTextState::new("one\n\n  \nfour", 0, 0, false, true);
        let settings = EditingSettings::default();
        let mut speech = RecordingSpeech::new();
        let value = state.value().to_owned();
        assert_eq!(change(&mut state, &settings, &mut speech, &value, 4, 4), vec![messages::BLANK]);
        assert_eq!(change(&mut state, &settings, &mut speech, &value, 5, 5), vec![messages::WHITESPACE]);
        assert_eq!(change(&mut state, &settings, &mut speech, &value, 8, 8), vec!["four"]);
        assert_eq!(state.line_index(8), 3);
        assert_eq!(state.line_bounds(3), (8, 12));
    }

    #[test]
    fn test_multiline_bulk_change_is_not_diffed() {
        let mut state = EditableTextState::new("first line\nsecond", 0, 0, false, true);
        let settings = EditingSettings::default();
        let mut speech = RecordingSpeech::new();
        assert!(change(&mut state, &settings, &mut speech, "totally\ndifferent text", 0, 0).is_empty());
        assert_eq!(
            change(&mut state, &settings, &mut speech, "x", 0, 0),
            vec![messages::DELETED]
        );
    }

    #[test]
    fn test_long_change_backs_off_to_word_boundaries() {
        let before = "the quick brown fox jumps over the lazy dog and keeps on running far away";
        let after = "the quick brown fox leaps over the lazy dog and keeps on running far away";
        let (mut state, settings, mut speech) = setup(before, 0, 0);
        let spoken = change(&mut state, &settings, &mut speech, after, 0, 0);
        assert_eq!(spoken, vec!["leaps"]);
    }

    #[test]
    fn test_insertions_gated_by_setting() {
        let (mut state, mut settings, mut speech) = setup("ab", 1, 1);
        settings.speak_insertions = false;
        assert!(change(&mut state, &settings, &mut speech, "axyzb", 4, 4).is_empty());
        settings.speak_insertions = true;
        assert_eq!(change(&mut state, &settings, &mut speech, "axyzqrb", 6, 6), vec!["qr"]);
    }
}
