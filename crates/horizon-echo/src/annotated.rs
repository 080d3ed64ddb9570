//! A text buffer with node annotations over character ranges.

use horizon_echo_core::{Cursor, NodeId};

use crate::error::SpanError;
use crate::text::char_len;

/// What a span of the line buffer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Annotation {
    /// The text of the node a selection cursor sits in.
    Cursor(Cursor),
    /// The text of one leaf of the line.
    Leaf(NodeId),
    /// The part of a line container's text that lies on this line.
    Container(NodeId),
    /// Braille routing metadata: the span starts `offset` characters into
    /// the node's own text.
    NodeOffset {
        /// The node.
        node: NodeId,
        /// Offset of the span start within the node's text.
        offset: usize,
    },
}

/// A character range of the buffer and what it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// The annotation.
    pub annotation: Annotation,
    /// First character.
    pub start: usize,
    /// One past the last character.
    pub end: usize,
}

/// Text plus annotated character ranges.
///
/// Offsets are character offsets. Spans survive [`append`](Self::append)
/// and [`prepend`](Self::prepend), shifting as needed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotatedText {
    text: String,
    len: usize,
    spans: Vec<Span>,
}

impl AnnotatedText {
    /// Create a buffer with no annotations.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let len = char_len(&text);
        Self {
            text,
            len,
            spans: Vec::new(),
        }
    }

    /// Create a buffer whose whole text carries `annotation`.
    pub fn annotated(text: impl Into<String>, annotation: Annotation) -> Self {
        let mut buffer = Self::new(text);
        let len = buffer.len;
        buffer.spans.push(Span {
            annotation,
            start: 0,
            end: len,
        });
        buffer
    }

    /// The text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the text is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All spans, in insertion order.
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Annotate `start..end`.
    pub fn set_span(&mut self, annotation: Annotation, start: usize, end: usize) -> Result<(), SpanError> {
        if start > end {
            return Err(SpanError::Inverted { start, end });
        }
        if end > self.len {
            return Err(SpanError::OutOfBounds { end, len: self.len });
        }
        self.spans.push(Span {
            annotation,
            start,
            end,
        });
        Ok(())
    }

    /// Append another buffer, keeping its spans.
    pub fn append(&mut self, other: AnnotatedText) {
        let shift = self.len;
        self.text.push_str(&other.text);
        self.len += other.len;
        self.spans.extend(other.spans.into_iter().map(|span| Span {
            start: span.start + shift,
            end: span.end + shift,
            ..span
        }));
    }

    /// Prepend another buffer, keeping its spans.
    pub fn prepend(&mut self, other: AnnotatedText) {
        let shift = other.len;
        for span in &mut self.spans {
            span.start += shift;
            span.end += shift;
        }
        let mut text = other.text;
        text.push_str(&self.text);
        self.text = text;
        self.len += shift;
        let mut spans = other.spans;
        spans.append(&mut self.spans);
        self.spans = spans;
    }

    /// The first span carrying `annotation`.
    pub fn span(&self, annotation: &Annotation) -> Option<&Span> {
        self.spans.iter().find(|s| &s.annotation == annotation)
    }

    /// Start of the first span carrying `annotation`.
    pub fn span_start(&self, annotation: &Annotation) -> Option<usize> {
        self.span(annotation).map(|s| s.start)
    }

    /// End of the first span carrying `annotation`.
    pub fn span_end(&self, annotation: &Annotation) -> Option<usize> {
        self.span(annotation).map(|s| s.end)
    }

    /// The leaf nodes of the buffer in text order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut leaves: Vec<&Span> = self
            .spans
            .iter()
            .filter(|s| matches!(s.annotation, Annotation::Leaf(_)))
            .collect();
        leaves.sort_by_key(|s| s.start);
        leaves
            .into_iter()
            .filter_map(|s| match s.annotation {
                Annotation::Leaf(node) => Some(node),
                _ => None,
            })
            .collect()
    }

    /// Braille routing metadata: `(node, offset within node, span start, span end)`.
    pub fn node_offsets(&self) -> Vec<(NodeId, usize, usize, usize)> {
        self.spans
            .iter()
            .filter_map(|s| match s.annotation {
                Annotation::NodeOffset { node, offset } => Some((node, offset, s.start, s.end)),
                _ => None,
            })
            .collect()
    }
}

impl From<&str> for AnnotatedText {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for AnnotatedText {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_echo_core::{AccessibilityTree, NodeData, Role};

    fn nodes() -> (NodeId, NodeId) {
        let mut tree = AccessibilityTree::new();
        let a = tree.add_root(NodeData::new(Role::StaticText));
        let b = tree.add_root(NodeData::new(Role::StaticText));
        (a, b)
    }

    #[test]
    fn test_set_span_validates_bounds() {
        let (a, _) = nodes();
        let mut buffer = AnnotatedText::new("hello");
        assert_eq!(
            buffer.set_span(Annotation::Leaf(a), 3, 2),
            Err(SpanError::Inverted { start: 3, end: 2 })
        );
        assert_eq!(
            buffer.set_span(Annotation::Leaf(a), 0, 6),
            Err(SpanError::OutOfBounds { end: 6, len: 5 })
        );
        assert!(buffer.set_span(Annotation::Leaf(a), 0, 5).is_ok());
    }

    #[test]
    fn test_append_and_prepend_shift_spans() {
        let (a, b) = nodes();
        let mut buffer = AnnotatedText::annotated("world", Annotation::Leaf(b));
        buffer.prepend(AnnotatedText::annotated("hello ", Annotation::Leaf(a)));
        assert_eq!(buffer.text(), "hello world");
        assert_eq!(buffer.span_start(&Annotation::Leaf(b)), Some(6));
        assert_eq!(buffer.span_end(&Annotation::Leaf(b)), Some(11));
        assert_eq!(buffer.leaves(), vec![a, b]);

        buffer.append(AnnotatedText::new("!"));
        assert_eq!(buffer.len(), 12);
        assert_eq!(buffer.span_start(&Annotation::Leaf(a)), Some(0));
    }

    #[test]
    fn test_char_lengths() {
        let buffer = AnnotatedText::new("héllo");
        assert_eq!(buffer.len(), 5);
        assert!(!buffer.is_empty());
    }
}
