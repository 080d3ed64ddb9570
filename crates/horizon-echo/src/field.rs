//! Editable field variants.
//!
//! A focused field is tracked by exactly one variant, chosen once when the
//! field gains focus:
//!
//! - [`PlainField`] for text inputs and text areas, whose content is a
//!   single value string with a text selection.
//! - [`RichField`] for richly editable regions, whose content is spread
//!   over many nodes and whose selection is the document selection.

use horizon_echo_core::logging::{span_names, targets};
use horizon_echo_core::{AccessibilityTree, Cursor, InputType, Intent, MarkerKind, NodeId, PerfSpan, TextStyle};

use crate::annotated::AnnotatedText;
use crate::editable_text::{EditableTextState, TextChangeEvent};
use crate::error::{EditingError, Result};
use crate::intent::IntentHandler;
use crate::line::{self, EditableLine, LineOptions};
use crate::messages;
use crate::settings::EditingSettings;
use crate::speech::{BrailleSink, Output, Personality, SpeechProperties, SpeechSink};
use crate::text::{char_len, substring};

/// Which variant handles a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A single-line text input.
    SingleLine,
    /// A multiline plain text area.
    Multiline,
    /// A richly editable region.
    RichText,
}

impl FieldKind {
    /// The variant for `node`, or `None` if it is not editable.
    pub fn of(tree: &AccessibilityTree, node: NodeId) -> Option<Self> {
        let state = tree.state(node)?;
        if !state.editable {
            return None;
        }
        Some(if state.richly_editable {
            Self::RichText
        } else if state.multiline {
            Self::Multiline
        } else {
            Self::SingleLine
        })
    }
}

fn check_editable(tree: &AccessibilityTree, node: NodeId) -> Result<FieldKind> {
    if !tree.contains(node) {
        return Err(EditingError::StaleNode(node));
    }
    FieldKind::of(tree, node).ok_or(EditingError::NotEditable(node))
}

// ============================================================================
// Plain fields
// ============================================================================

/// A text input or text area.
#[derive(Debug, Clone)]
pub struct PlainField {
    node: NodeId,
    kind: FieldKind,
    input_type: InputType,
    state: EditableTextState,
}

impl PlainField {
    /// Start tracking the plain field `node`.
    pub fn new(tree: &AccessibilityTree, node: NodeId) -> Result<Self> {
        let kind = match check_editable(tree, node)? {
            FieldKind::RichText => FieldKind::SingleLine,
            kind => kind,
        };
        let data = tree.node(node).ok_or(EditingError::StaleNode(node))?;
        let input_type = data.input_type();
        let is_password = data.state().protected || input_type == InputType::Password;
        let value = processed_value(data.text(), input_type);
        let (start, end) = clamped_selection(data.text_selection(), &value);
        Ok(Self {
            node,
            kind,
            input_type,
            state: EditableTextState::new(value, start, end, is_password, kind == FieldKind::Multiline),
        })
    }

    /// The field node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Single-line or multiline.
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// The tracked text state.
    pub fn text_state(&self) -> &EditableTextState {
        &self.state
    }

    /// Describe the field's current value and selection against the last
    /// known state.
    pub fn on_update(
        &mut self,
        tree: &AccessibilityTree,
        settings: &EditingSettings,
        speech: &mut dyn SpeechSink,
        braille: &mut dyn BrailleSink,
    ) -> Result<()> {
        let _perf = PerfSpan::new(span_names::FIELD_UPDATE);
        let data = tree.node(self.node).ok_or(EditingError::StaleNode(self.node))?;
        let value = processed_value(data.text(), self.input_type);
        let (start, end) = clamped_selection(data.text_selection(), &value);

        let old_start = self.state.start();
        self.state.changed(&TextChangeEvent::new(value, start, end, true), settings, speech);
        self.write_braille(old_start, braille);
        Ok(())
    }

    /// Write the line holding the moved end of the selection.
    fn write_braille(&self, old_start: usize, braille: &mut dyn BrailleSink) {
        let (start, end) = (self.state.start(), self.state.end());
        let moved = if start != old_start { start } else { end };
        let index = self.state.line_index(moved);
        let (line_start, line_end) = self.state.line_bounds(index);
        let text = if self.state.is_password() {
            "•".repeat(line_end - line_start)
        } else {
            substring(self.state.value(), line_start, line_end)
        };
        let clamp = |offset: usize| offset.clamp(line_start, line_end) - line_start;
        braille.write(&AnnotatedText::new(text), clamp(start), clamp(end));
    }
}

/// The value as diffed: telephone inputs drop the trailing padding hosts add.
fn processed_value(text: &str, input_type: InputType) -> String {
    match input_type {
        InputType::Tel => text.trim_end().to_owned(),
        _ => text.to_owned(),
    }
}

fn clamped_selection(selection: Option<(usize, usize)>, value: &str) -> (usize, usize) {
    let len = char_len(value);
    let (start, end) = selection.unwrap_or((0, 0));
    (start.min(len), end.min(len))
}

// ============================================================================
// Rich fields
// ============================================================================

/// A richly editable region.
///
/// Tracks the lines around the anchor, the focus, and the whole selection.
/// The diff state machine runs over the merged line's text.
#[derive(Debug, Clone)]
pub struct RichField {
    node: NodeId,
    anchor_line: Option<EditableLine>,
    focus_line: Option<EditableLine>,
    line: Option<EditableLine>,
    state: EditableTextState,
    last_style: TextStyle,
    active_markers: Vec<MarkerKind>,
}

impl RichField {
    /// Start tracking the rich region rooted at `node`.
    pub fn new(tree: &AccessibilityTree, node: NodeId, settings: &EditingSettings) -> Result<Self> {
        check_editable(tree, node)?;
        let mut field = Self {
            node,
            anchor_line: None,
            focus_line: None,
            line: None,
            state: EditableTextState::new("", 0, 0, false, false),
            last_style: TextStyle::default(),
            active_markers: Vec::new(),
        };
        if let Some((anchor, focus, cur)) = field.build_lines(tree, settings) {
            field.state.update(cur.text(), cur.start_offset(), cur.end_offset());
            field.active_markers = markers_at(tree, &cur);
            if let Some(data) = cur.start_container().and_then(|c| tree.node(c)) {
                field.last_style = data.style().clone();
            }
            field.anchor_line = Some(anchor);
            field.focus_line = Some(focus);
            field.line = Some(cur);
        }
        Ok(field)
    }

    /// The region root.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The line around the selection anchor.
    pub fn anchor_line(&self) -> Option<&EditableLine> {
        self.anchor_line.as_ref()
    }

    /// The line around the selection focus.
    pub fn focus_line(&self) -> Option<&EditableLine> {
        self.focus_line.as_ref()
    }

    /// The line spanning the whole selection.
    pub fn line(&self) -> Option<&EditableLine> {
        self.line.as_ref()
    }

    /// The tracked line-relative text state.
    pub fn text_state(&self) -> &EditableTextState {
        &self.state
    }

    fn build_lines(
        &self,
        tree: &AccessibilityTree,
        settings: &EditingSettings,
    ) -> Option<(EditableLine, EditableLine, EditableLine)> {
        let selection = tree.selection()?;
        if !tree.contains(selection.anchor) || !tree.contains(selection.focus) {
            tracing::debug!(target: targets::DISPATCH, ?selection, "selection endpoints are stale");
            return None;
        }
        let options = LineOptions::default().with_include_offscreen(settings.include_offscreen);
        let anchor = EditableLine::caret(tree, selection.anchor, selection.anchor_offset, options);
        let focus = EditableLine::caret(tree, selection.focus, selection.focus_offset, options);
        let cur = EditableLine::new(
            tree,
            selection.anchor,
            selection.anchor_offset,
            selection.focus,
            selection.focus_offset,
            options,
        );
        Some((anchor, focus, cur))
    }

    /// Describe the current document selection against the last one.
    pub fn on_update(
        &mut self,
        tree: &AccessibilityTree,
        intents: &[Intent],
        settings: &EditingSettings,
        speech: &mut dyn SpeechSink,
        braille: &mut dyn BrailleSink,
    ) -> Result<()> {
        let _perf = PerfSpan::new(span_names::FIELD_UPDATE);
        if !tree.contains(self.node) {
            return Err(EditingError::StaleNode(self.node));
        }
        let Some((anchor, focus, cur)) = self.build_lines(tree, settings) else {
            return Ok(());
        };
        let prev = match self.line.take() {
            // Nothing moved and nothing changed.
            Some(prev) if prev.text() == cur.text() && prev.is_same_line_and_selection(&cur, tree) => {
                braille.write(prev.annotated(), prev.start_offset(), prev.end_offset());
                self.anchor_line = Some(anchor);
                self.focus_line = Some(focus);
                self.line = Some(prev);
                return Ok(());
            }
            prev => prev,
        };

        let mut out = Output::new(speech, true);
        self.describe(tree, intents, settings, &cur, prev.as_ref(), &mut out);

        self.state.update(cur.text(), cur.start_offset(), cur.end_offset());
        self.active_markers = markers_at(tree, &cur);
        if let Some(container) = cur.start_container()
            && let Some(data) = tree.node(container)
        {
            self.last_style = data.style().clone();
        }
        braille.write(cur.annotated(), cur.start_offset(), cur.end_offset());
        self.anchor_line = Some(anchor);
        self.focus_line = Some(focus);
        self.line = Some(cur);
        Ok(())
    }

    fn describe(
        &mut self,
        tree: &AccessibilityTree,
        intents: &[Intent],
        settings: &EditingSettings,
        cur: &EditableLine,
        prev: Option<&EditableLine>,
        out: &mut Output<'_>,
    ) {
        if reached_end_of_text(tree, cur, prev) {
            out.speak(messages::END_OF_TEXT, SpeechProperties::default());
            return;
        }

        if IntentHandler::handle(intents, cur, prev, tree, out) {
            return;
        }

        let prev = prev.filter(|p| {
            let valid = p.is_valid_line(tree);
            if !valid {
                tracing::debug!(target: targets::DISPATCH, "previous line is no longer valid");
            }
            valid
        });

        if let Some(prev) = prev
            && cur.has_collapsed_selection()
            && cur.is_same_line(prev, tree)
        {
            let evt = TextChangeEvent::new(cur.text(), cur.start_offset(), cur.end_offset(), true);
            self.state.changed(&evt, settings, &mut *out.speech);
            self.speak_markers(tree, cur, out);
            if settings.announce_rich_text_attributes {
                self.speak_style(tree, cur, prev, out);
            }
            return;
        }

        if cur.has_text_selection() {
            let container_changed = prev.is_some_and(|p| {
                p.start_container().is_some()
                    && p.start_container() == cur.start_container()
                    && p.start_container_value() != cur.start_container_value()
            });
            match prev {
                Some(prev) if container_changed => {
                    self.state.update(
                        prev.start_container_value(),
                        prev.local_start_offset(),
                        prev.local_end_offset(),
                    );
                    let evt = TextChangeEvent::new(
                        cur.start_container_value(),
                        cur.local_start_offset(),
                        cur.local_end_offset(),
                        true,
                    );
                    self.state.changed(&evt, settings, &mut *out.speech);
                }
                _ => self.speak_selection_delta(tree, cur, prev, out),
            }
            return;
        }

        if cur.is_empty() {
            out.speak(messages::NEWLINE, SpeechProperties::default());
            return;
        }

        cur.speak_line(prev, tree, out);
    }

    /// Speak what entered and left the selection, container by container.
    fn speak_selection_delta(
        &self,
        tree: &AccessibilityTree,
        cur: &EditableLine,
        prev: Option<&EditableLine>,
        out: &mut Output<'_>,
    ) {
        let leaves = LeafRanges::new(tree, self.node);
        let Some((start, end)) = leaves.selection(cur) else {
            let (start, end) = ordered(cur.start_offset(), cur.end_offset());
            out.speak(&substring(cur.text(), start, end), SpeechProperties::default());
            out.queue(messages::SELECTED, SpeechProperties::default());
            return;
        };
        let (prev_start, prev_end) = prev
            .and_then(|p| leaves.selection(p))
            .filter(|(s, e)| s < e)
            .unwrap_or((start, start));

        let added = leaves.pieces(tree, difference((start, end), (prev_start, prev_end)));
        let removed = leaves.pieces(tree, difference((prev_start, prev_end), (start, end)));
        let mut first = true;
        for (pieces, marker) in [(added, messages::SELECTED), (removed, messages::UNSELECTED)] {
            if pieces.is_empty() {
                continue;
            }
            for piece in &pieces {
                if first {
                    out.speak(piece, SpeechProperties::default());
                    first = false;
                } else {
                    out.queue(piece, SpeechProperties::default());
                }
            }
            out.queue(marker, SpeechProperties::default());
        }
    }

    fn speak_markers(&self, tree: &AccessibilityTree, cur: &EditableLine, out: &mut Output<'_>) {
        let active = markers_at(tree, cur);
        for kind in active.iter().filter(|k| !self.active_markers.contains(k)) {
            out.queue(messages::marker(*kind), SpeechProperties::with_personality(Personality::Annotation));
        }
        for kind in self.active_markers.iter().filter(|k| !active.contains(k)) {
            out.queue(
                &messages::leaving_marker(*kind),
                SpeechProperties::with_personality(Personality::Annotation),
            );
        }
    }

    /// Speak style changes when the caret crosses into another container.
    fn speak_style(
        &self,
        tree: &AccessibilityTree,
        cur: &EditableLine,
        prev: &EditableLine,
        out: &mut Output<'_>,
    ) {
        if cur.start_container() == prev.start_container() {
            return;
        }
        let Some(style) = cur.start_container().and_then(|c| tree.node(c)).map(|d| d.style()) else {
            return;
        };
        for change in style_changes(&self.last_style, style) {
            out.queue(&change, SpeechProperties::with_personality(Personality::Annotation));
        }
    }
}

/// Whether the caret just arrived at the end of the region's last line
/// without the text changing.
fn reached_end_of_text(tree: &AccessibilityTree, cur: &EditableLine, prev: Option<&EditableLine>) -> bool {
    let at_end = |line: &EditableLine| {
        line.has_collapsed_selection()
            && !line.is_empty()
            && line.start_offset() == line.len()
            && line.is_last_line(tree)
    };
    match prev {
        Some(prev) => prev.text() == cur.text() && at_end(cur) && !at_end(prev),
        None => false,
    }
}

/// Marker kinds covering the caret in the start container.
fn markers_at(tree: &AccessibilityTree, line: &EditableLine) -> Vec<MarkerKind> {
    let Some(data) = line.start_container().and_then(|c| tree.node(c)) else {
        return Vec::new();
    };
    let offset = line.local_start_offset();
    let mut kinds: Vec<MarkerKind> = Vec::new();
    for marker in data.markers().iter().filter(|m| m.contains(offset)) {
        if !kinds.contains(&marker.kind) {
            kinds.push(marker.kind);
        }
    }
    kinds
}

/// Announcements for every attribute that differs between two styles.
fn style_changes(old: &TextStyle, new: &TextStyle) -> Vec<String> {
    let toggles = [
        (old.bold, new.bold, messages::BOLD, messages::NOT_BOLD),
        (old.italic, new.italic, messages::ITALIC, messages::NOT_ITALIC),
        (old.underline, new.underline, messages::UNDERLINE, messages::NOT_UNDERLINE),
        (old.line_through, new.line_through, messages::LINE_THROUGH, messages::NOT_LINE_THROUGH),
    ];
    let mut changes: Vec<String> = toggles
        .into_iter()
        .filter(|(was, is, _, _)| was != is)
        .map(|(_, is, on, off)| if is { on } else { off }.to_owned())
        .collect();
    if old.font_size != new.font_size
        && let Some(size) = new.font_size
    {
        changes.push(messages::font_size(size));
    }
    if old.font_family != new.font_family
        && let Some(family) = &new.font_family
    {
        changes.push(messages::font_family(family));
    }
    changes
}

fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}

/// The parts of `a` not covered by `b`.
fn difference(a: (usize, usize), b: (usize, usize)) -> Vec<(usize, usize)> {
    let (start, end) = a;
    let (other_start, other_end) = b;
    if other_start >= other_end {
        return vec![a];
    }
    let mut parts = Vec::new();
    if start < other_start {
        parts.push((start, end.min(other_start)));
    }
    if other_end < end {
        parts.push((start.max(other_end), end));
    }
    parts.retain(|(s, e)| s < e);
    parts
}

/// The region's leaves with their character range in the region's text.
struct LeafRanges {
    ranges: Vec<(NodeId, usize, usize)>,
}

impl LeafRanges {
    fn new(tree: &AccessibilityTree, root: NodeId) -> Self {
        let mut offset = 0;
        let ranges = tree
            .leaves(root)
            .into_iter()
            .map(|leaf| {
                let start = offset;
                offset += tree.text_len(leaf);
                (leaf, start, offset)
            })
            .collect();
        Self { ranges }
    }

    fn offset_of(&self, cursor: Cursor) -> Option<usize> {
        self.ranges
            .iter()
            .find(|(leaf, _, _)| *leaf == cursor.node())
            .map(|&(_, start, end)| (start + cursor.offset()).min(end))
    }

    /// The line's selection in region offsets, ordered.
    fn selection(&self, line: &EditableLine) -> Option<(usize, usize)> {
        let start = self.offset_of(line.start())?;
        let end = self.offset_of(line.end())?;
        Some(ordered(start, end))
    }

    /// The text of `spans`, one piece per container.
    fn pieces(&self, tree: &AccessibilityTree, spans: Vec<(usize, usize)>) -> Vec<String> {
        let mut pieces: Vec<(Option<NodeId>, String)> = Vec::new();
        for (from, to) in spans {
            let mut last: Option<Option<NodeId>> = None;
            for &(leaf, start, end) in &self.ranges {
                if end <= from || start >= to {
                    continue;
                }
                let text = tree.text(leaf).unwrap_or_default();
                let piece = substring(text, from.max(start) - start, to.min(end) - start);
                if piece.is_empty() {
                    continue;
                }
                let container = line::container_of(tree, leaf);
                match pieces.last_mut() {
                    Some((c, text)) if last == Some(container) && *c == container => text.push_str(&piece),
                    _ => pieces.push((container, piece)),
                }
                last = Some(container);
            }
        }
        pieces.into_iter().map(|(_, text)| text).collect()
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// The variant tracking a focused field.
#[derive(Debug, Clone)]
pub enum EditableField {
    /// A text input or text area.
    Plain(PlainField),
    /// A richly editable region.
    Rich(RichField),
}

impl EditableField {
    /// Pick the variant for `node` and start tracking it.
    pub fn new(tree: &AccessibilityTree, node: NodeId, settings: &EditingSettings) -> Result<Self> {
        Ok(match check_editable(tree, node)? {
            FieldKind::RichText => Self::Rich(RichField::new(tree, node, settings)?),
            FieldKind::SingleLine | FieldKind::Multiline => Self::Plain(PlainField::new(tree, node)?),
        })
    }

    /// The field node.
    pub fn node(&self) -> NodeId {
        match self {
            Self::Plain(field) => field.node(),
            Self::Rich(field) => field.node(),
        }
    }

    /// The variant kind.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Plain(field) => field.kind(),
            Self::Rich(_) => FieldKind::RichText,
        }
    }

    /// The tracked text state.
    pub fn text_state(&self) -> &EditableTextState {
        match self {
            Self::Plain(field) => field.text_state(),
            Self::Rich(field) => field.text_state(),
        }
    }

    /// Describe the field's current state. Plain fields ignore intents.
    pub fn on_update(
        &mut self,
        tree: &AccessibilityTree,
        intents: &[Intent],
        settings: &EditingSettings,
        speech: &mut dyn SpeechSink,
        braille: &mut dyn BrailleSink,
    ) -> Result<()> {
        match self {
            Self::Plain(field) => field.on_update(tree, settings, speech, braille),
            Self::Rich(field) => field.on_update(tree, intents, settings, speech, braille),
        }
    }
}

impl From<PlainField> for EditableField {
    fn from(field: PlainField) -> Self {
        Self::Plain(field)
    }
}

impl From<RichField> for EditableField {
    fn from(field: RichField) -> Self {
        Self::Rich(field)
    }
}
