//! Output sinks for speech and braille.
//!
//! The engine never renders anything itself. It hands utterances to a
//! [`SpeechSink`] and line buffers to a [`BrailleSink`]. The recording sinks
//! keep everything they receive, which is what hosts use for logging and
//! what the tests assert against.

use horizon_echo_core::logging::targets;

use crate::annotated::AnnotatedText;

/// How an utterance interacts with speech already queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueueMode {
    /// Speak after anything already queued.
    #[default]
    Queue,
    /// Drop queued speech of the same category first.
    CategoryFlush,
    /// Drop all queued speech first.
    Flush,
}

/// A vocal variation applied to an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Personality {
    /// Lower pitch, used for deleted text.
    Deleted,
    /// Used for descriptive messages about the text rather than the text.
    Annotation,
}

/// Per-utterance rendering properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpeechProperties {
    /// Vocal variation, if any.
    pub personality: Option<Personality>,
    /// Spell single characters phonetically.
    pub phonetic_characters: bool,
}

impl SpeechProperties {
    /// Properties with a personality.
    pub fn with_personality(personality: Personality) -> Self {
        Self {
            personality: Some(personality),
            ..Default::default()
        }
    }

    /// Properties requesting phonetic character rendering.
    pub fn phonetic() -> Self {
        Self {
            phonetic_characters: true,
            ..Default::default()
        }
    }
}

/// Receives spoken output.
pub trait SpeechSink {
    /// Speak `text`.
    fn speak(&mut self, text: &str, mode: QueueMode, properties: SpeechProperties);
}

/// Receives braille output.
pub trait BrailleSink {
    /// Show `line` with the selection `start..end` (character offsets).
    fn write(&mut self, line: &AnnotatedText, start: usize, end: usize);
}

/// One recorded utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// The spoken text.
    pub text: String,
    /// The queue mode.
    pub mode: QueueMode,
    /// Rendering properties.
    pub properties: SpeechProperties,
}

/// A speech sink that records every utterance.
#[derive(Debug, Clone, Default)]
pub struct RecordingSpeech {
    utterances: Vec<Utterance>,
}

impl RecordingSpeech {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    pub fn utterances(&self) -> &[Utterance] {
        &self.utterances
    }

    /// The recorded texts, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.utterances.iter().map(|u| u.text.as_str()).collect()
    }

    /// Take and clear the recorded texts.
    pub fn take_texts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.utterances)
            .into_iter()
            .map(|u| u.text)
            .collect()
    }

    /// Forget everything recorded.
    pub fn clear(&mut self) {
        self.utterances.clear();
    }
}

impl SpeechSink for RecordingSpeech {
    fn speak(&mut self, text: &str, mode: QueueMode, properties: SpeechProperties) {
        tracing::trace!(target: targets::SPEECH, text, ?mode, "speak");
        self.utterances.push(Utterance {
            text: text.to_owned(),
            mode,
            properties,
        });
    }
}

/// One recorded braille write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrailleLine {
    /// The line text.
    pub text: String,
    /// Selection start.
    pub start: usize,
    /// Selection end.
    pub end: usize,
}

/// A braille sink that records every write.
#[derive(Debug, Clone, Default)]
pub struct RecordingBraille {
    lines: Vec<BrailleLine>,
}

impl RecordingBraille {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    pub fn lines(&self) -> &[BrailleLine] {
        &self.lines
    }

    /// The most recent write.
    pub fn last(&self) -> Option<&BrailleLine> {
        self.lines.last()
    }

    /// Forget everything recorded.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl BrailleSink for RecordingBraille {
    fn write(&mut self, line: &AnnotatedText, start: usize, end: usize) {
        self.lines.push(BrailleLine {
            text: line.text().to_owned(),
            start,
            end,
        });
    }
}

/// Output sinks plus the queue mode for the change being described.
pub(crate) struct Output<'a> {
    pub speech: &'a mut dyn SpeechSink,
    /// Queue mode for the first utterance of this change.
    pub mode: QueueMode,
}

impl<'a> Output<'a> {
    pub fn new(speech: &'a mut dyn SpeechSink, triggered_by_user: bool) -> Self {
        let mode = if triggered_by_user {
            QueueMode::CategoryFlush
        } else {
            QueueMode::Queue
        };
        Self { speech, mode }
    }

    /// Speak with the change's queue mode.
    pub fn speak(&mut self, text: &str, properties: SpeechProperties) {
        self.speech.speak(text, self.mode, properties);
    }

    /// Speak after whatever this change already said.
    pub fn queue(&mut self, text: &str, properties: SpeechProperties) {
        self.speech.speak(text, QueueMode::Queue, properties);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_speech() {
        let mut speech = RecordingSpeech::new();
        speech.speak("a", QueueMode::Flush, SpeechProperties::phonetic());
        speech.speak("b", QueueMode::Queue, SpeechProperties::default());
        assert_eq!(speech.texts(), vec!["a", "b"]);
        assert!(speech.utterances()[0].properties.phonetic_characters);
        assert_eq!(speech.take_texts(), vec!["a".to_string(), "b".to_string()]);
        assert!(speech.utterances().is_empty());
    }

    #[test]
    fn test_output_mode_follows_trigger() {
        let mut speech = RecordingSpeech::new();
        Output::new(&mut speech, true).speak("x", SpeechProperties::default());
        Output::new(&mut speech, false).speak("y", SpeechProperties::default());
        assert_eq!(speech.utterances()[0].mode, QueueMode::CategoryFlush);
        assert_eq!(speech.utterances()[1].mode, QueueMode::Queue);
    }

    #[test]
    fn test_recording_braille() {
        let mut braille = RecordingBraille::new();
        braille.write(&AnnotatedText::from("hello"), 1, 3);
        assert_eq!(
            braille.last(),
            Some(&BrailleLine {
                text: "hello".into(),
                start: 1,
                end: 3
            })
        );
    }
}
