//! Reconstruction of the visual line around a selection.
//!
//! Hosts expose text as many small leaves (inline text boxes, static text
//! runs, line breaks) joined by same-line links. [`EditableLine`] walks
//! those links outward from the caret to recover the whole visual line as
//! one annotated buffer, then answers offset and identity questions about
//! it.
//!
//! Same-line links come from a tree that can change underneath us, so every
//! walk is bounded and cycle-guarded, and broken links are bridged with
//! sibling-based fallbacks.

use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};

use horizon_echo_core::logging::{span_names, targets};
use horizon_echo_core::{AccessibilityTree, Cursor, CursorIndex, NodeId, PerfSpan, Role, TreePath};

use crate::annotated::{Annotation, AnnotatedText};
use crate::context;
use crate::speech::{Output, SpeechProperties};
use crate::text::{self, char_len, is_whitespace_only};

/// Upper bound on the leaves visited in one direction of a line walk.
const MAX_WALK_STEPS: usize = 1024;

/// Options for line construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineOptions {
    /// Build the line around the start cursor instead of the end cursor.
    pub base_line_on_start: bool,
    /// Count offscreen siblings when computing container offsets.
    pub include_offscreen: bool,
}

impl LineOptions {
    /// Options that base the line on the start cursor.
    pub fn based_on_start(mut self, base_line_on_start: bool) -> Self {
        self.base_line_on_start = base_line_on_start;
        self
    }

    /// Options that count offscreen siblings.
    pub fn with_include_offscreen(mut self, include_offscreen: bool) -> Self {
        self.include_offscreen = include_offscreen;
        self
    }
}

/// A range of line text together with the leaf positions that bound it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRange {
    /// Leaf position of the first character.
    pub start: Cursor,
    /// Leaf position just past the last character.
    pub end: Cursor,
    /// Offset of the first character within the line.
    pub line_start: usize,
    /// Offset just past the last character within the line.
    pub line_end: usize,
    /// The covered text.
    pub text: String,
}

/// The visual line containing a selection, built from a tree snapshot.
///
/// Immutable once built. Lines are rebuilt on every relevant tree event and
/// compared with [`is_same_line`](Self::is_same_line) rather than by node
/// identity, since any node reference may be invalidated by the next event.
#[derive(Debug, Clone)]
pub struct EditableLine {
    start: Cursor,
    end: Cursor,
    local_start_offset: usize,
    local_end_offset: usize,
    start_container: Option<NodeId>,
    end_container: Option<NodeId>,
    start_container_value: String,
    line_start: NodeId,
    line_end: NodeId,
    line_start_container: Option<NodeId>,
    line_end_container: Option<NodeId>,
    local_line_start_container_offset: usize,
    local_line_end_container_offset: usize,
    line_start_container_recovery: Option<TreePath>,
    value: AnnotatedText,
}

impl EditableLine {
    /// Build the line for a selection from `(start_node, start_offset)` to
    /// `(end_node, end_offset)`.
    ///
    /// The endpoints need not be ordered: a line can represent a reversed
    /// selection. The visual line is computed around the end cursor, or the
    /// start cursor when [`LineOptions::base_line_on_start`] is set.
    pub fn new(
        tree: &AccessibilityTree,
        start_node: NodeId,
        start_offset: usize,
        end_node: NodeId,
        end_offset: usize,
        options: LineOptions,
    ) -> Self {
        let _perf = PerfSpan::new(span_names::LINE_BUILD);

        let start = Cursor::new(start_node, start_offset).deep_equivalent(tree);
        let end = Cursor::new(end_node, end_offset).deep_equivalent(tree);

        // Cursors that resolved into a different container report the
        // resolved offset. Cursors pointing straight at a text node or one of
        // its inline boxes keep the caller's container offset.
        let local_start_offset = snap_local_offset(tree, start_node, start_offset, start);
        let local_end_offset = snap_local_offset(tree, end_node, end_offset, end);

        let mut line = Self {
            start,
            end,
            local_start_offset,
            local_end_offset,
            start_container: None,
            end_container: None,
            start_container_value: String::new(),
            line_start: start.node(),
            line_end: start.node(),
            line_start_container: None,
            line_end_container: None,
            local_line_start_container_offset: 0,
            local_line_end_container_offset: 0,
            line_start_container_recovery: None,
            value: AnnotatedText::default(),
        };
        line.compute_line_data(tree, options);
        line
    }

    /// Build the line for a collapsed selection at `(node, offset)`.
    pub fn caret(tree: &AccessibilityTree, node: NodeId, offset: usize, options: LineOptions) -> Self {
        Self::new(tree, node, offset, node, offset, options)
    }

    fn compute_line_data(&mut self, tree: &AccessibilityTree, options: LineOptions) {
        let (line_base, line_extend) = if options.base_line_on_start {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };

        let base_node = line_base.node();
        let base_text = tree.text(base_node).unwrap_or_default();
        let base_len = char_len(base_text);
        let mut value = AnnotatedText::annotated(base_text, Annotation::Cursor(line_base));
        if line_extend.node() == base_node {
            push_span(&mut value, Annotation::Cursor(line_extend), 0, base_len);
        }
        push_span(&mut value, Annotation::Leaf(base_node), 0, base_len);

        self.start_container = container_of(tree, self.start.node());
        self.end_container = container_of(tree, self.end.node());
        self.start_container_value = self
            .start_container
            .map(|c| container_value(tree, c))
            .unwrap_or_default();

        let mut parents: VecDeque<NodeId> = VecDeque::new();
        if let Some(seed) = line_parent(tree, base_node) {
            parents.push_back(seed);
        }

        let mut visited: HashSet<NodeId> = HashSet::from([base_node]);
        let mut line_start = base_node;
        for _ in 0..MAX_WALK_STEPS {
            let Some(previous) = previous_on_line(tree, line_start) else {
                break;
            };
            if !visited.insert(previous) {
                tracing::debug!(
                    target: targets::LINE,
                    node = ?previous,
                    "same-line cycle detected walking backward"
                );
                break;
            }
            line_start = previous;
            if let Some(parent) = line_parent(tree, previous)
                && parents.front() != Some(&parent)
            {
                parents.push_front(parent);
            }
            let text = tree.text(previous).unwrap_or_default();
            let mut prefix = AnnotatedText::annotated(text, Annotation::Leaf(previous));
            for cursor in [self.start, self.end] {
                if cursor.node() == previous {
                    let len = prefix.len();
                    push_span(&mut prefix, Annotation::Cursor(cursor), 0, len);
                }
            }
            value.prepend(prefix);
        }

        let mut line_end = base_node;
        for _ in 0..MAX_WALK_STEPS {
            let Some(next) = next_on_line(tree, line_end) else {
                break;
            };
            if !visited.insert(next) {
                tracing::debug!(
                    target: targets::LINE,
                    node = ?next,
                    "same-line cycle detected walking forward"
                );
                break;
            }
            line_end = next;
            if let Some(parent) = line_parent(tree, next)
                && parents.back() != Some(&parent)
            {
                parents.push_back(parent);
            }
            let text = tree.text(next).unwrap_or_default();
            let mut suffix = AnnotatedText::annotated(text, Annotation::Leaf(next));
            for cursor in [self.end, self.start] {
                if cursor.node() == next {
                    let len = suffix.len();
                    push_span(&mut suffix, Annotation::Cursor(cursor), 0, len);
                }
            }
            value.append(suffix);
        }

        self.line_start = line_start;
        self.line_end = line_end;
        self.line_start_container = tree.parent(line_start);
        self.line_end_container = tree.parent(line_end);
        self.line_start_container_recovery = self
            .line_start_container
            .map(|container| TreePath::new(tree, container));

        let text_count_before = sibling_text_count(tree, line_start, options, Direction::Backward);
        let text_count_after = sibling_text_count(tree, line_end, options, Direction::Forward);
        self.local_line_start_container_offset = text_count_before;
        self.local_line_end_container_offset = self
            .line_end_container
            .map_or(0, |c| tree.inner_text_len(c))
            .saturating_sub(text_count_after);

        // Annotate each parent with the part of its text on this line.
        let last = parents.len().saturating_sub(1);
        let mut len = 0;
        for (i, &parent) in parents.iter().enumerate() {
            let parent_len = tree.inner_text_len(parent);
            if parent_len == 0 {
                continue;
            }
            let prev_len = len;
            let mut current_len = parent_len;
            let mut offset = 0;
            if i == 0 {
                current_len = current_len.saturating_sub(text_count_before);
                offset = text_count_before;
            }
            if i == last {
                current_len = current_len.saturating_sub(text_count_after);
            }
            len += current_len;

            push_span(&mut value, Annotation::NodeOffset { node: parent, offset }, prev_len, len);
            if Some(parent) == self.start_container || Some(parent) == self.end_container {
                push_span(&mut value, Annotation::Container(parent), prev_len, len);
            }
        }

        tracing::trace!(
            target: targets::LINE,
            text = value.text(),
            line_start = ?self.line_start,
            line_end = ?self.line_end,
            text_count_before,
            text_count_after,
            "built line"
        );
        self.value = value;
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The full text of the line.
    pub fn text(&self) -> &str {
        self.value.text()
    }

    /// The annotated line buffer.
    pub fn annotated(&self) -> &AnnotatedText {
        &self.value
    }

    /// Length of the line text in characters.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Whether the line has no text.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// The deep start cursor.
    pub fn start(&self) -> Cursor {
        self.start
    }

    /// The deep end cursor.
    pub fn end(&self) -> Cursor {
        self.end
    }

    /// The container of the start cursor: its static text, or the leaf itself.
    pub fn start_container(&self) -> Option<NodeId> {
        self.start_container
    }

    /// The container of the end cursor.
    pub fn end_container(&self) -> Option<NodeId> {
        self.end_container
    }

    /// The text of the start container as it was when the line was built.
    pub fn start_container_value(&self) -> &str {
        &self.start_container_value
    }

    /// The first leaf of the line.
    pub fn line_start(&self) -> NodeId {
        self.line_start
    }

    /// The last leaf of the line.
    pub fn line_end(&self) -> NodeId {
        self.line_end
    }

    /// Parent of the first leaf.
    pub fn line_start_container(&self) -> Option<NodeId> {
        self.line_start_container
    }

    /// Parent of the last leaf.
    pub fn line_end_container(&self) -> Option<NodeId> {
        self.line_end_container
    }

    /// Offset of the line start within the line start container's text.
    pub fn local_line_start_container_offset(&self) -> usize {
        self.local_line_start_container_offset
    }

    /// Offset of the line end within the line end container's text.
    pub fn local_line_end_container_offset(&self) -> usize {
        self.local_line_end_container_offset
    }

    /// The start offset within its container, after snapping.
    pub fn local_start_offset(&self) -> usize {
        self.local_start_offset
    }

    /// The end offset within its container, after snapping.
    pub fn local_end_offset(&self) -> usize {
        self.local_end_offset
    }

    /// The leaves of the line, in order.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.value.leaves()
    }

    /// Selection start within the line text, or 0 when the start cursor lies
    /// outside the line.
    pub fn start_offset(&self) -> usize {
        self.value
            .span_start(&Annotation::Cursor(self.start))
            .map_or(0, |s| s + self.start.offset())
    }

    /// Selection end within the line text, or the line length when the end
    /// cursor lies outside the line.
    pub fn end_offset(&self) -> usize {
        self.value
            .span_start(&Annotation::Cursor(self.end))
            .map_or(self.value.len(), |s| s + self.end.offset())
    }

    /// First character of the start container within the line.
    pub fn container_start_offset(&self) -> Option<usize> {
        let container = self.start_container?;
        self.value.span_start(&Annotation::Container(container))
    }

    /// Last character of the end container within the line.
    pub fn container_end_offset(&self) -> Option<usize> {
        let container = self.end_container?;
        self.value
            .span_end(&Annotation::Container(container))
            .map(|end| end.saturating_sub(1))
    }

    /// Whether start and end coincide.
    pub fn has_collapsed_selection(&self) -> bool {
        self.start == self.end
    }

    /// Whether the selection covers at least one character.
    pub fn has_text_selection(&self) -> bool {
        !self.has_collapsed_selection()
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    /// Whether `other` denotes the same visual line.
    ///
    /// Matches when the line start container and offset agree, when the line
    /// end container and offset agree, or when the recovered line start
    /// container and start offset agree.
    pub fn is_same_line(&self, other: &EditableLine, tree: &AccessibilityTree) -> bool {
        let same_start = self.line_start_container.is_some()
            && self.line_start_container == other.line_start_container
            && self.local_line_start_container_offset == other.local_line_start_container_offset;
        if same_start {
            return true;
        }

        let same_end = self.line_end_container.is_some()
            && self.line_end_container == other.line_end_container
            && self.local_line_end_container_offset == other.local_line_end_container_offset;
        if same_end {
            return true;
        }

        let recovered = |line: &EditableLine| {
            line.line_start_container_recovery
                .as_ref()
                .and_then(|path| path.node(tree))
        };
        let mine = recovered(self);
        mine.is_some()
            && mine == recovered(other)
            && self.local_line_start_container_offset == other.local_line_start_container_offset
    }

    /// Whether `other` is the same line with the same selection offsets.
    pub fn is_same_line_and_selection(&self, other: &EditableLine, tree: &AccessibilityTree) -> bool {
        self.is_same_line(other, tree)
            && self.start_offset() == other.start_offset()
            && self.end_offset() == other.end_offset()
    }

    /// Whether this line comes before `other`.
    ///
    /// On the same line this compares end offsets. Otherwise it compares the
    /// document order of the line start containers, then the line start
    /// offsets when both lines wrap within one container.
    pub fn is_before_line(&self, other: &EditableLine, tree: &AccessibilityTree) -> bool {
        match (self.line_start_container, other.line_start_container) {
            (Some(mine), Some(theirs)) if !self.is_same_line(other, tree) => {
                match tree.compare_document_order(mine, theirs) {
                    Some(Ordering::Equal) => {
                        self.local_line_start_container_offset <= other.local_line_start_container_offset
                    }
                    order => order != Some(Ordering::Greater),
                }
            }
            _ => self.end_offset() <= other.end_offset(),
        }
    }

    /// Whether the nodes bounding this line still form one visual line.
    ///
    /// Re-derives the line bounds from the stored containers and offsets
    /// and checks that a bounded same-line walk connects them, in either
    /// direction.
    pub fn is_valid_line(&self, tree: &AccessibilityTree) -> bool {
        let (Some(start_container), Some(end_container)) =
            (self.line_start_container, self.line_end_container)
        else {
            return false;
        };
        if !tree.contains(start_container) || !tree.contains(end_container) {
            return false;
        }

        let start = Cursor::new(start_container, self.local_line_start_container_offset)
            .deep_text_position(tree)
            .node();
        let end = Cursor::new(
            end_container,
            self.local_line_end_container_offset.saturating_sub(1),
        )
        .deep_text_position(tree)
        .node();

        // Links can be broken asymmetrically, so walk both ways.
        walk_connects(tree, start, end, Direction::Forward)
            || walk_connects(tree, end, start, Direction::Backward)
    }

    /// Whether the line is the last line of its editable region.
    pub fn is_last_line(&self, tree: &AccessibilityTree) -> bool {
        let region = tree
            .editable_root(self.line_end)
            .or_else(|| tree.root())
            .unwrap_or(self.line_end);
        match tree.leaves(region).last() {
            Some(&last) => last == self.line_end || tree.is_ancestor(self.line_end, last),
            None => true,
        }
    }

    // -------------------------------------------------------------------------
    // Ranges
    // -------------------------------------------------------------------------

    /// The leaf position of a line offset.
    pub fn cursor_at(&self, offset: usize) -> Option<Cursor> {
        let spans = self.value.spans();
        let leaf = |pred: &dyn Fn(usize, usize) -> bool| {
            spans.iter().find_map(|span| match span.annotation {
                Annotation::Leaf(node) if pred(span.start, span.end) => {
                    Some(Cursor::new(node, offset - span.start))
                }
                _ => None,
            })
        };
        leaf(&|start, end| start <= offset && offset < end)
            .or_else(|| leaf(&|start, end| start <= offset && offset == end))
    }

    fn range(&self, line_start: usize, line_end: usize) -> Option<TextRange> {
        Some(TextRange {
            start: self.cursor_at(line_start)?,
            end: self.cursor_at(line_end)?,
            line_start,
            line_end,
            text: text::substring(self.text(), line_start, line_end),
        })
    }

    /// The character to the right of the selection start, if any.
    pub fn create_char_range(&self) -> Option<TextRange> {
        let offset = self.start_offset();
        if offset >= self.len() {
            return None;
        }
        self.range(offset, offset + 1)
    }

    /// The word next to the selection start.
    ///
    /// With `move_to_previous` this is the word at or before the caret,
    /// otherwise the word at or after it.
    pub fn create_word_range(&self, move_to_previous: bool) -> Option<TextRange> {
        let offset = self.start_offset();
        let words = text::word_ranges(self.text());
        let (start, end) = if move_to_previous {
            words.into_iter().rev().find(|&(start, _)| start < offset)?
        } else {
            words.into_iter().find(|&(_, end)| end > offset)?
        };
        self.range(start, end)
    }

    // -------------------------------------------------------------------------
    // Output
    // -------------------------------------------------------------------------

    /// Speak the line leaf by leaf, announcing structure entered on the way.
    ///
    /// A line consisting of a single space or no-break space is spoken as a
    /// newline.
    pub(crate) fn speak_line(&self, prev: Option<&EditableLine>, tree: &AccessibilityTree, out: &mut Output<'_>) {
        if matches!(self.text(), "" | " " | "\u{a0}") {
            out.speak(crate::messages::NEWLINE, SpeechProperties::default());
            return;
        }

        let mut previous = prev
            .and_then(|p| p.start_container)
            .filter(|&c| tree.contains(c));
        let mut spoken = false;
        for (i, leaf) in self.nodes().into_iter().enumerate() {
            if !tree.children(leaf).is_empty() {
                continue;
            }
            let text = tree.text(leaf).unwrap_or_default();
            let labels = context::entered_labels(tree, previous, leaf);
            let whitespace_only = labels.is_empty() && (text.is_empty() || is_whitespace_only(text));

            // Whitespace is only worth speaking when it leads the line.
            if i == 0 || !whitespace_only {
                let parts = Some(text)
                    .filter(|t| !t.is_empty())
                    .into_iter()
                    .chain(labels.iter().map(String::as_str));
                for part in parts {
                    if spoken {
                        out.queue(part, SpeechProperties::default());
                    } else {
                        out.speak(part, SpeechProperties::default());
                        spoken = true;
                    }
                }
            }
            previous = Some(leaf);
        }
    }
}

/// Walk direction along same-line links and siblings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Backward,
    Forward,
}

fn push_span(value: &mut AnnotatedText, annotation: Annotation, start: usize, end: usize) {
    if let Err(error) = value.set_span(annotation, start, end) {
        tracing::trace!(
            target: targets::LINE,
            ?annotation,
            %error,
            "skipping span annotation"
        );
    }
}

fn snap_local_offset(tree: &AccessibilityTree, node: NodeId, offset: usize, deep: Cursor) -> usize {
    let is_text = tree.role(node).is_some_and(Role::is_text);
    let within = deep.node() == node || tree.parent(deep.node()) == Some(node);
    if is_text && within {
        return offset;
    }
    match deep.index() {
        CursorIndex::Node => tree.text_len(deep.node()),
        CursorIndex::Text(index) => index,
    }
}

/// The static text holding a leaf, or the leaf itself.
/// The container of a cursor leaf: an inline box's static text, or the
/// leaf itself.
pub(crate) fn container_of(tree: &AccessibilityTree, node: NodeId) -> Option<NodeId> {
    match tree.role(node)? {
        Role::InlineTextBox => tree.parent(node),
        _ => Some(node),
    }
}

fn container_value(tree: &AccessibilityTree, node: NodeId) -> String {
    match tree.node(node) {
        Some(data) if data.role() == Role::TextField => data.value().unwrap_or_default().to_owned(),
        Some(data) => data.name().to_owned(),
        None => String::new(),
    }
}

/// The node recorded for parent annotation: line fragments contribute their
/// parent, every other leaf contributes itself.
fn line_parent(tree: &AccessibilityTree, node: NodeId) -> Option<NodeId> {
    match tree.role(node)? {
        role if role.is_line_fragment() => tree.parent(node),
        _ => Some(node),
    }
}

/// The previous leaf on the same visual line.
///
/// Prefers a live backward link. Falls back to the previous sibling's last
/// child, then the previous sibling itself, when that node links forward to
/// `node`.
fn previous_on_line(tree: &AccessibilityTree, node: NodeId) -> Option<NodeId> {
    if let Some(previous) = tree.previous_on_line(node)
        && tree.contains(previous)
    {
        return Some(previous);
    }
    let sibling = tree.previous_sibling(node)?;
    if let Some(last) = tree.last_child(sibling)
        && tree.next_on_line(last) == Some(node)
    {
        return Some(last);
    }
    (tree.next_on_line(sibling) == Some(node)).then_some(sibling)
}

/// The next leaf on the same visual line.
///
/// Prefers a live forward link. Falls back to the next sibling, then the
/// next sibling's first child, when that node links back to `node`.
fn next_on_line(tree: &AccessibilityTree, node: NodeId) -> Option<NodeId> {
    if let Some(next) = tree.next_on_line(node)
        && tree.contains(next)
    {
        return Some(next);
    }
    let sibling = tree.next_sibling(node)?;
    if tree.previous_on_line(sibling) == Some(node) {
        return Some(sibling);
    }
    tree.first_child(sibling)
        .filter(|&first| tree.previous_on_line(first) == Some(node))
}

fn sibling_text_count(tree: &AccessibilityTree, node: NodeId, options: LineOptions, direction: Direction) -> usize {
    let step = |id| match direction {
        Direction::Backward => tree.previous_sibling(id),
        Direction::Forward => tree.next_sibling(id),
    };
    let mut count = 0;
    let mut sibling = step(node);
    while let Some(id) = sibling {
        let offscreen = tree.state(id).is_some_and(|s| s.offscreen);
        if !offscreen || options.include_offscreen {
            count += tree.inner_text_len(id);
        }
        sibling = step(id);
    }
    count
}

fn walk_connects(tree: &AccessibilityTree, from: NodeId, to: NodeId, direction: Direction) -> bool {
    let mut visited = HashSet::new();
    let mut current = from;
    for _ in 0..MAX_WALK_STEPS {
        if current == to {
            return true;
        }
        if !visited.insert(current) {
            return false;
        }
        let next = match direction {
            Direction::Forward => next_on_line(tree, current),
            Direction::Backward => previous_on_line(tree, current),
        };
        match next {
            Some(node) => current = node,
            None => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_echo_core::{NodeData, NodeState};

    struct Fixture {
        tree: AccessibilityTree,
        para: NodeId,
        text: NodeId,
        boxes: Vec<NodeId>,
    }

    /// "this is a test" wrapped one word per visual line.
    fn wrapped() -> Fixture {
        let mut tree = AccessibilityTree::new();
        let root = tree.add_root(NodeData::new(Role::RootWebArea));
        let para = tree.append_child(root, NodeData::new(Role::Paragraph)).unwrap();
        let text = tree
            .append_child(para, NodeData::new(Role::StaticText).with_name("this is a test"))
            .unwrap();
        let boxes = ["this ", "is ", "a ", "test"]
            .into_iter()
            .map(|w| {
                tree.append_child(text, NodeData::new(Role::InlineTextBox).with_name(w))
                    .unwrap()
            })
            .collect();
        Fixture {
            tree,
            para,
            text,
            boxes,
        }
    }

    /// "this is a test" wrapped as "this is " / "a test".
    fn two_lines() -> Fixture {
        let mut f = wrapped();
        f.tree.link_on_line(f.boxes[0], f.boxes[1]).unwrap();
        f.tree.link_on_line(f.boxes[2], f.boxes[3]).unwrap();
        f
    }

    fn line(f: &Fixture, node: NodeId, offset: usize) -> EditableLine {
        EditableLine::caret(&f.tree, node, offset, LineOptions::default())
    }

    #[test]
    fn test_wrapped_word_lines() {
        let f = wrapped();

        let first = line(&f, f.text, 0);
        assert_eq!(first.text(), "this ");
        assert_eq!(first.start_offset(), 0);
        assert_eq!(first.container_start_offset(), Some(0));
        assert_eq!(first.container_end_offset(), Some(4));

        let second = line(&f, f.text, 5);
        assert_eq!(second.text(), "is ");
        assert_eq!(second.start_offset(), 0);
        assert_eq!(second.local_start_offset(), 5);
        assert_eq!(second.local_line_start_container_offset(), 5);
        assert_eq!(second.container_start_offset(), Some(0));
        assert_eq!(second.container_end_offset(), Some(2));

        let inside = line(&f, f.text, 7);
        assert_eq!(inside.text(), "is ");
        assert_eq!(inside.start_offset(), 2);
    }

    #[test]
    fn test_line_spans_linked_boxes() {
        let f = two_lines();
        let first = line(&f, f.text, 6);
        assert_eq!(first.text(), "this is ");
        assert_eq!(first.start_offset(), 6);
        assert_eq!(first.nodes(), vec![f.boxes[0], f.boxes[1]]);
        assert_eq!(first.line_start(), f.boxes[0]);
        assert_eq!(first.line_end(), f.boxes[1]);
        assert_eq!(first.local_line_start_container_offset(), 0);
        assert_eq!(first.local_line_end_container_offset(), 8);

        let second = line(&f, f.text, 9);
        assert_eq!(second.text(), "a test");
        assert_eq!(second.start_offset(), 1);
        assert_eq!(second.local_line_start_container_offset(), 8);
        assert_eq!(second.container_start_offset(), Some(0));
        assert_eq!(second.container_end_offset(), Some(5));
    }

    #[test]
    fn test_same_line_identity() {
        let f = two_lines();
        let a = line(&f, f.text, 1);
        let b = line(&f, f.text, 6);
        let c = line(&f, f.text, 9);
        assert!(a.is_same_line(&a, &f.tree));
        assert!(a.is_same_line(&b, &f.tree));
        assert!(!a.is_same_line_and_selection(&b, &f.tree));
        assert!(!a.is_same_line(&c, &f.tree));
        assert!(a.is_before_line(&b, &f.tree));
        assert!(!b.is_before_line(&a, &f.tree));
        assert!(b.is_before_line(&c, &f.tree));
    }

    #[test]
    fn test_is_valid_line() {
        let mut f = two_lines();
        let mut first = line(&f, f.text, 0);
        assert!(first.is_valid_line(&f.tree));

        first.local_line_end_container_offset = 9;
        assert!(!first.is_valid_line(&f.tree));

        first.local_line_end_container_offset = 4;
        assert!(first.is_valid_line(&f.tree));

        first.local_line_end_container_offset = 2;
        assert!(first.is_valid_line(&f.tree));

        let other = f
            .tree
            .append_child(f.para, NodeData::new(Role::StaticText).with_name("end"))
            .unwrap();
        first.line_end_container = Some(other);
        assert!(!first.is_valid_line(&f.tree));
    }

    #[test]
    fn test_rich_paragraph_lines_stay_valid() {
        let mut tree = AccessibilityTree::new();
        let rich = NodeState {
            editable: true,
            richly_editable: true,
            ..Default::default()
        };
        let root = tree.add_root(NodeData::new(Role::RootWebArea));
        let para = tree
            .append_child(root, NodeData::new(Role::Paragraph).with_state(rich))
            .unwrap();
        let leaves: Vec<NodeId> = ["aaa ", "bbb ", "ccc"]
            .into_iter()
            .map(|text| {
                tree.append_child(para, NodeData::new(Role::StaticText).with_name(text).with_state(rich))
                    .unwrap()
            })
            .collect();
        tree.link_on_line(leaves[0], leaves[1]).unwrap();

        let first = EditableLine::caret(&tree, leaves[0], 1, LineOptions::default());
        assert_eq!(first.text(), "aaa bbb ");
        assert_eq!(first.local_line_end_container_offset(), 8);
        assert!(first.is_valid_line(&tree));

        let second = EditableLine::caret(&tree, leaves[2], 1, LineOptions::default());
        assert_eq!(second.text(), "ccc");
        assert!(second.is_valid_line(&tree));
        assert!(!first.is_same_line(&second, &tree));
    }

    #[test]
    fn test_invalid_once_container_removed() {
        let mut f = two_lines();
        let first = line(&f, f.text, 0);
        f.tree.remove(f.text).unwrap();
        assert!(!first.is_valid_line(&f.tree));
    }

    #[test]
    fn test_cyclic_links_terminate() {
        let mut f = two_lines();
        f.tree.set_next_on_line(f.boxes[1], Some(f.boxes[0])).unwrap();
        f.tree.set_previous_on_line(f.boxes[0], Some(f.boxes[1])).unwrap();
        let cyclic = line(&f, f.text, 0);
        assert_eq!(cyclic.text(), "is this ");
    }

    #[test]
    fn test_stale_forward_link_uses_sibling_fallback() {
        let mut f = wrapped();
        // "this " points forward at a dead node, but "is " still points back.
        let dead = f
            .tree
            .append_child(f.para, NodeData::new(Role::StaticText))
            .unwrap();
        f.tree.remove(dead).unwrap();
        f.tree.set_next_on_line(f.boxes[0], Some(dead)).unwrap();
        f.tree.set_previous_on_line(f.boxes[1], Some(f.boxes[0])).unwrap();
        let first = line(&f, f.text, 0);
        assert_eq!(first.text(), "this is ");
    }

    #[test]
    fn test_offscreen_siblings_are_skipped_by_default() {
        let mut f = wrapped();
        let hidden = NodeState {
            offscreen: true,
            ..Default::default()
        };
        f.tree.set_state(f.boxes[0], hidden).unwrap();

        let skipped = line(&f, f.text, 5);
        assert_eq!(skipped.local_line_start_container_offset(), 0);

        let counted = EditableLine::caret(
            &f.tree,
            f.text,
            5,
            LineOptions::default().with_include_offscreen(true),
        );
        assert_eq!(counted.local_line_start_container_offset(), 5);
    }

    #[test]
    fn test_reversed_selection_based_on_either_end() {
        let f = wrapped();
        let on_focus = EditableLine::new(&f.tree, f.text, 0, f.text, 6, LineOptions::default());
        assert_eq!(on_focus.text(), "is ");
        assert_eq!(on_focus.start_offset(), 0);
        assert_eq!(on_focus.end_offset(), 1);

        let on_anchor = EditableLine::new(
            &f.tree,
            f.text,
            0,
            f.text,
            6,
            LineOptions::default().based_on_start(true),
        );
        assert_eq!(on_anchor.text(), "this ");
        assert_eq!(on_anchor.start_offset(), 0);
        assert_eq!(on_anchor.end_offset(), 5);
    }

    #[test]
    fn test_char_and_word_ranges() {
        let f = two_lines();
        let caret = line(&f, f.text, 5);
        let ch = caret.create_char_range().unwrap();
        assert_eq!(ch.text, "i");
        assert_eq!(ch.start, Cursor::new(f.boxes[1], 0));

        let after = caret.create_word_range(false).unwrap();
        assert_eq!(after.text, "is");
        let before = caret.create_word_range(true).unwrap();
        assert_eq!(before.text, "this");

        let end = line(&f, f.text, 14);
        assert_eq!(end.text(), "a test");
        assert!(end.create_char_range().is_none());
    }

    #[test]
    fn test_failed_spans_do_not_abort() {
        let mut f = wrapped();
        // A same-line link into a nameless container: its inner text is not
        // part of the buffer, so its parent span overruns and is skipped.
        let group = f
            .tree
            .append_child(f.para, NodeData::new(Role::GenericContainer))
            .unwrap();
        f.tree
            .append_child(group, NodeData::new(Role::StaticText).with_name("abcdef"))
            .unwrap();
        f.tree.link_on_line(f.boxes[3], group).unwrap();

        let built = line(&f, f.text, 12);
        assert_eq!(built.text(), "test");
        assert_eq!(built.container_start_offset(), Some(0));
        assert_eq!(built.container_end_offset(), Some(3));
        assert_eq!(built.annotated().node_offsets().len(), 1);
    }
}
