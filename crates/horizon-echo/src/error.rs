//! Error types for the editing feedback engine.
//!
//! The feedback hot path never fails: stale nodes, broken same-line links
//! and failed annotations degrade to safe defaults. The errors below cover
//! misuse of the construction APIs and settings I/O.

use std::path::PathBuf;

use horizon_echo_core::NodeId;

/// Errors raised when constructing editing handlers or loading settings.
#[derive(Debug, thiserror::Error)]
pub enum EditingError {
    /// A handler was requested for a node that is not editable.
    #[error("Node {0:?} is not editable")]
    NotEditable(NodeId),

    /// A handler was requested for a node that no longer exists.
    #[error("Node {0:?} is no longer in the tree")]
    StaleNode(NodeId),

    /// Settings could not be read, parsed or written.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),
}

/// Errors raised by settings persistence.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Reading or writing the settings file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The JSON content could not be parsed or produced.
    #[error("Invalid JSON settings in {path}: {source}")]
    Json {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The TOML content could not be parsed.
    #[error("Invalid TOML settings in {path}: {source}")]
    TomlParse {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: toml::de::Error,
    },

    /// The settings could not be serialized as TOML.
    #[error("Cannot serialize settings as TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// The file extension does not name a supported format.
    #[error("Unsupported settings format for {0}")]
    UnsupportedFormat(PathBuf),
}

/// A span annotation could not be applied to a line buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SpanError {
    /// The span's start lies after its end.
    #[error("Span start {start} is after its end {end}")]
    Inverted {
        /// Requested start.
        start: usize,
        /// Requested end.
        end: usize,
    },

    /// The span reaches past the end of the buffer.
    #[error("Span end {end} exceeds buffer length {len}")]
    OutOfBounds {
        /// Requested end.
        end: usize,
        /// Buffer length in characters.
        len: usize,
    },
}

/// A specialized Result type for editing operations.
pub type Result<T> = std::result::Result<T, EditingError>;
