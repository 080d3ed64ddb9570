//! Editing feedback preferences.
//!
//! [`EditingSettings`] gathers every preference the engine consults. The
//! engine only reads it; hosts load and store it with the persistence
//! helpers below, in JSON or TOML.
//!
//! # Persistence
//!
//! ```ignore
//! use horizon_echo::{EditingSettings, TypingEcho};
//!
//! let mut settings = EditingSettings::default();
//! settings.typing_echo = TypingEcho::Word;
//! settings.save("echo.toml")?;
//!
//! let loaded = EditingSettings::load("echo.toml")?;
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// How much of what the user types is spoken back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypingEcho {
    /// Speak each typed character.
    Character,
    /// Speak each completed word.
    Word,
    /// Speak characters and completed words.
    #[default]
    CharacterAndWord,
    /// Speak nothing while typing.
    None,
}

impl TypingEcho {
    /// Whether a typed character is spoken.
    pub fn speaks_characters(self) -> bool {
        matches!(self, Self::Character | Self::CharacterAndWord)
    }

    /// Whether a completed word is spoken.
    pub fn speaks_words(self) -> bool {
        matches!(self, Self::Word | Self::CharacterAndWord)
    }
}

/// The format for settings file persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    /// JSON format.
    Json,
    /// TOML format.
    Toml,
}

impl SettingsFormat {
    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else if ext.eq_ignore_ascii_case("toml") {
            Some(Self::Toml)
        } else {
            None
        }
    }
}

/// Preferences consulted by the editing feedback engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditingSettings {
    /// Typing echo level.
    pub typing_echo: TypingEcho,
    /// Announce insertions longer than one character.
    pub speak_insertions: bool,
    /// Announce text style changes while moving through rich text.
    pub announce_rich_text_attributes: bool,
    /// Count offscreen siblings when computing container offsets.
    pub include_offscreen: bool,
    /// Single-line values up to this length are spoken whole when diffing fails.
    pub max_short_phrase_len: usize,
}

impl Default for EditingSettings {
    fn default() -> Self {
        Self {
            typing_echo: TypingEcho::default(),
            speak_insertions: true,
            announce_rich_text_attributes: false,
            include_offscreen: false,
            max_short_phrase_len: 60,
        }
    }
}

impl EditingSettings {
    /// Set the typing echo level.
    pub fn with_typing_echo(mut self, typing_echo: TypingEcho) -> Self {
        self.typing_echo = typing_echo;
        self
    }

    /// Enable or disable rich text attribute announcements.
    pub fn with_rich_text_attributes(mut self, enabled: bool) -> Self {
        self.announce_rich_text_attributes = enabled;
        self
    }

    /// Enable or disable counting offscreen siblings.
    pub fn with_include_offscreen(mut self, enabled: bool) -> Self {
        self.include_offscreen = enabled;
        self
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Load settings, choosing the format from the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        match SettingsFormat::from_path(path) {
            Some(SettingsFormat::Json) => Self::load_json(path),
            Some(SettingsFormat::Toml) => Self::load_toml(path),
            None => Err(SettingsError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Save settings, choosing the format from the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        match SettingsFormat::from_path(path) {
            Some(format) => self.save_as(path, format),
            None => Err(SettingsError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Save settings in an explicit format.
    pub fn save_as(&self, path: impl AsRef<Path>, format: SettingsFormat) -> Result<(), SettingsError> {
        match format {
            SettingsFormat::Json => self.save_json(path),
            SettingsFormat::Toml => self.save_toml(path),
        }
    }

    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = read_text(path)?;
        serde_json::from_str(&content).map_err(|source| SettingsError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load settings from a TOML file. Missing fields take their defaults.
    pub fn load_toml(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = read_text(path)?;
        toml::from_str(&content).map_err(|source| SettingsError::TomlParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save settings to a JSON file.
    ///
    /// The file is written atomically using a temporary file and rename.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        atomic_write(path, json.as_bytes())
    }

    /// Save settings to a TOML file.
    ///
    /// The file is written atomically using a temporary file and rename.
    pub fn save_toml(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let toml_str = toml::to_string_pretty(self)?;
        atomic_write(path.as_ref(), toml_str.as_bytes())
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> SettingsError + '_ {
    move |source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_text(path: &Path) -> Result<String, SettingsError> {
    std::fs::read_to_string(path).map_err(io_error(path))
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), SettingsError> {
    let dir: PathBuf = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut temp = tempfile::NamedTempFile::new_in(&dir).map_err(io_error(path))?;
    temp.write_all(bytes).map_err(io_error(path))?;
    temp.as_file().sync_all().map_err(io_error(path))?;
    temp.persist(path)
        .map_err(|e| SettingsError::Io {
            path: path.to_path_buf(),
            source: e.error,
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EditingSettings::default();
        assert_eq!(settings.typing_echo, TypingEcho::CharacterAndWord);
        assert!(settings.speak_insertions);
        assert!(!settings.announce_rich_text_attributes);
        assert!(!settings.include_offscreen);
        assert_eq!(settings.max_short_phrase_len, 60);
    }

    #[test]
    fn test_typing_echo_gates() {
        assert!(TypingEcho::Character.speaks_characters());
        assert!(!TypingEcho::Character.speaks_words());
        assert!(TypingEcho::Word.speaks_words());
        assert!(!TypingEcho::Word.speaks_characters());
        assert!(!TypingEcho::None.speaks_characters());
        assert!(!TypingEcho::None.speaks_words());
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("echo.toml");
        let settings = EditingSettings::default()
            .with_typing_echo(TypingEcho::Word)
            .with_rich_text_attributes(true);
        settings.save(&path).unwrap();
        assert_eq!(EditingSettings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_json_missing_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("echo.json");
        std::fs::write(&path, r#"{ "typing_echo": "none" }"#).unwrap();
        let loaded = EditingSettings::load(&path).unwrap();
        assert_eq!(loaded.typing_echo, TypingEcho::None);
        assert!(loaded.speak_insertions);
        assert_eq!(loaded.max_short_phrase_len, 60);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = EditingSettings::default().save("echo.ini").unwrap_err();
        assert!(matches!(err, SettingsError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "typing_echo = [").unwrap();
        let err = EditingSettings::load_toml(&path).unwrap_err();
        assert!(matches!(err, SettingsError::TomlParse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }
}
