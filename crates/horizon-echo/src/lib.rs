//! Spoken and braille feedback for text editing.
//!
//! Horizon Echo watches an accessibility tree while the user edits a text
//! field and decides, on every change, what to say and what to show on a
//! braille display.
//!
//! - **Lines**: [`EditableLine`] rebuilds the visual line around the
//!   selection from fragmented leaf nodes and same-line links
//! - **Diffing**: [`EditableTextState`] turns two `(value, start, end)`
//!   snapshots into the shortest useful description
//! - **Intents**: [`IntentHandler`] speaks movements the host explained
//!   without diffing
//! - **Fields**: [`EditableField`] picks the plain or rich variant once per
//!   focused field
//! - **Dispatch**: [`TextEditHandler`] and [`EditingDispatcher`] route tree
//!   events to the focused field
//!
//! Output goes to a [`SpeechSink`] and a [`BrailleSink`].
//!
//! # Example
//!
//! ```
//! use horizon_echo::{EditingSettings, EditableTextState, RecordingSpeech, TextChangeEvent};
//!
//! let settings = EditingSettings::default();
//! let mut speech = RecordingSpeech::new();
//! let mut state = EditableTextState::new("", 0, 0, false, false);
//!
//! for (i, value) in ["H", "Hi"].into_iter().enumerate() {
//!     state.changed(&TextChangeEvent::new(value, i + 1, i + 1, true), &settings, &mut speech);
//! }
//! assert_eq!(speech.texts(), vec!["H", "i"]);
//! ```

pub mod annotated;
pub mod context;
pub mod editable_text;
mod error;
pub mod field;
pub mod handler;
pub mod intent;
pub mod line;
pub mod messages;
pub mod settings;
pub mod speech;
pub mod text;

pub use annotated::{AnnotatedText, Annotation, Span};
pub use editable_text::{EditableTextState, TextChangeEvent};
pub use error::{EditingError, Result, SettingsError, SpanError};
pub use field::{EditableField, FieldKind, PlainField, RichField};
pub use handler::{EditingDispatcher, TextEditHandler};
pub use intent::IntentHandler;
pub use line::{EditableLine, LineOptions, TextRange};
pub use settings::{EditingSettings, SettingsFormat, TypingEcho};
pub use speech::{
    BrailleLine, BrailleSink, Personality, QueueMode, RecordingBraille, RecordingSpeech, SpeechProperties,
    SpeechSink, Utterance,
};

// Re-export the tree model so hosts need only one dependency.
pub use horizon_echo_core as core;

static_assertions::assert_impl_all!(EditableLine: Send, Sync, Clone);
static_assertions::assert_impl_all!(EditableTextState: Send, Sync, Clone);
static_assertions::assert_impl_all!(TextEditHandler: Send, Sync);
