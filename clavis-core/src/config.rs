use std::path::{Path, PathBuf};
use std::time::Duration;

use clavis_types::{Key, KeyboardError, KeyboardSize, TheoryError};
use serde::Deserialize;
use thiserror::Error;

use crate::chords::PlaybackOptions;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Keyboard(#[from] KeyboardError),
    #[error(transparent)]
    Theory(#[from] TheoryError),
}

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    keyboard: KeyboardConfig,
    #[serde(default)]
    osc: OscConfig,
    #[serde(default)]
    chords: ChordsConfig,
    #[serde(default)]
    midi: MidiConfig,
}

#[derive(Deserialize, Default)]
struct KeyboardConfig {
    size: Option<u16>,
    key: Option<String>,
    scale: Option<String>,
}

#[derive(Deserialize, Default)]
struct OscConfig {
    listen_addr: Option<String>,
    chord_listen_addr: Option<String>,
    target_addr: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChordsConfig {
    window_ms: Option<u64>,
    send_chord: Option<bool>,
    morph: Option<bool>,
    filter_duplicates: Option<bool>,
    min_notes: Option<usize>,
}

#[derive(Deserialize, Default)]
struct MidiConfig {
    input_port: Option<String>,
}

pub struct Config {
    keyboard: KeyboardConfig,
    osc: OscConfig,
    chords: ChordsConfig,
    midi: MidiConfig,
}

impl Config {
    /// Embedded defaults overlaid with the user's config file, if any.
    /// A user file that can't be read or parsed is logged and ignored.
    pub fn load() -> Self {
        let mut base = embedded();
        if let Some(path) = user_config_path() {
            if path.exists() {
                match read_file(&path) {
                    Ok(user) => merge(&mut base, user),
                    Err(e) => log::warn!(target: "config", "ignoring {}: {}", path.display(), e),
                }
            }
        }
        Self::from_file(base)
    }

    /// Embedded defaults overlaid with `path`. Errors are returned, not ignored.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut base = embedded();
        merge(&mut base, read_file(path)?);
        log::info!(target: "config", "loaded {}", path.display());
        Ok(Self::from_file(base))
    }

    /// Embedded defaults overlaid with TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut base = embedded();
        merge(&mut base, toml::from_str(contents)?);
        Ok(Self::from_file(base))
    }

    fn from_file(file: ConfigFile) -> Self {
        Self {
            keyboard: file.keyboard,
            osc: file.osc,
            chords: file.chords,
            midi: file.midi,
        }
    }

    pub fn keyboard_size(&self) -> Result<KeyboardSize, ConfigError> {
        match self.keyboard.size {
            Some(count) => Ok(KeyboardSize::from_key_count(count)?),
            None => Ok(KeyboardSize::default()),
        }
    }

    pub fn key(&self) -> Result<Key, ConfigError> {
        match self.keyboard.key.as_deref() {
            Some(name) => Ok(Key::from_name(name)?),
            None => Ok(Key::default()),
        }
    }

    /// Scale name as configured. Checked against the theory provider when it
    /// is applied.
    pub fn scale_name(&self) -> &str {
        self.keyboard.scale.as_deref().unwrap_or("MajorScale")
    }

    pub fn listen_addr(&self) -> &str {
        self.osc.listen_addr.as_deref().unwrap_or("127.0.0.1:57121")
    }

    pub fn chord_listen_addr(&self) -> &str {
        self.osc
            .chord_listen_addr
            .as_deref()
            .unwrap_or("127.0.0.1:50000")
    }

    pub fn target_addr(&self) -> &str {
        self.osc.target_addr.as_deref().unwrap_or("127.0.0.1:57120")
    }

    /// Quiescence window (clamped to at least 1ms).
    pub fn chord_window(&self) -> Duration {
        Duration::from_millis(self.chords.window_ms.unwrap_or(1000).max(1))
    }

    pub fn playback_options(&self) -> PlaybackOptions {
        let fallback = PlaybackOptions::default();
        PlaybackOptions {
            send_chord: self.chords.send_chord.unwrap_or(fallback.send_chord),
            morph_chords: self.chords.morph.unwrap_or(fallback.morph_chords),
            filter_duplicates: self
                .chords
                .filter_duplicates
                .unwrap_or(fallback.filter_duplicates),
            min_notes: self.chords.min_notes.unwrap_or(fallback.min_notes),
        }
    }

    pub fn midi_input_port(&self) -> Option<&str> {
        self.midi.input_port.as_deref()
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("clavis").join("config.toml"))
}

fn embedded() -> ConfigFile {
    toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|e| {
        log::error!(target: "config", "embedded config.toml is malformed: {}", e);
        ConfigFile::default()
    })
}

fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&contents)?)
}

fn merge(base: &mut ConfigFile, user: ConfigFile) {
    merge_keyboard(&mut base.keyboard, user.keyboard);
    merge_osc(&mut base.osc, user.osc);
    merge_chords(&mut base.chords, user.chords);
    if user.midi.input_port.is_some() {
        base.midi.input_port = user.midi.input_port;
    }
}

fn merge_keyboard(base: &mut KeyboardConfig, user: KeyboardConfig) {
    if user.size.is_some() {
        base.size = user.size;
    }
    if user.key.is_some() {
        base.key = user.key;
    }
    if user.scale.is_some() {
        base.scale = user.scale;
    }
}

fn merge_osc(base: &mut OscConfig, user: OscConfig) {
    if user.listen_addr.is_some() {
        base.listen_addr = user.listen_addr;
    }
    if user.chord_listen_addr.is_some() {
        base.chord_listen_addr = user.chord_listen_addr;
    }
    if user.target_addr.is_some() {
        base.target_addr = user.target_addr;
    }
}

fn merge_chords(base: &mut ChordsConfig, user: ChordsConfig) {
    if user.window_ms.is_some() {
        base.window_ms = user.window_ms;
    }
    if user.send_chord.is_some() {
        base.send_chord = user.send_chord;
    }
    if user.morph.is_some() {
        base.morph = user.morph;
    }
    if user.filter_duplicates.is_some() {
        base.filter_duplicates = user.filter_duplicates;
    }
    if user.min_notes.is_some() {
        base.min_notes = user.min_notes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn embedded_defaults() {
        let config = Config::from_file(embedded());
        assert_eq!(config.keyboard_size().unwrap(), KeyboardSize::Keys61);
        assert_eq!(config.key().unwrap(), Key::C);
        assert_eq!(config.scale_name(), "MajorScale");
        assert_eq!(config.listen_addr(), "127.0.0.1:57121");
        assert_eq!(config.chord_listen_addr(), "127.0.0.1:50000");
        assert_eq!(config.target_addr(), "127.0.0.1:57120");
        assert_eq!(config.chord_window(), Duration::from_secs(1));
        assert_eq!(config.playback_options(), PlaybackOptions::default());
        assert_eq!(config.midi_input_port(), None);
    }

    #[test]
    fn user_values_override_only_what_they_set() {
        let config = Config::from_toml_str(
            r#"
            [keyboard]
            size = 88
            key = "Eb"

            [chords]
            morph = true
            window_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.keyboard_size().unwrap(), KeyboardSize::Keys88);
        assert_eq!(config.key().unwrap(), Key::EFlat);
        assert_eq!(config.scale_name(), "MajorScale");
        assert_eq!(config.chord_window(), Duration::from_millis(250));
        let options = config.playback_options();
        assert!(options.morph_chords);
        assert!(options.send_chord);
    }

    #[test]
    fn unsupported_size_is_an_error() {
        let config = Config::from_toml_str("[keyboard]\nsize = 49\n").unwrap();
        assert!(matches!(
            config.keyboard_size(),
            Err(ConfigError::Keyboard(KeyboardError::UnsupportedSize(49)))
        ));
    }

    #[test]
    fn unknown_key_is_an_error() {
        let config = Config::from_toml_str("[keyboard]\nkey = \"H\"\n").unwrap();
        assert!(matches!(config.key(), Err(ConfigError::Theory(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[midi]\ninput_port = \"Keystation\"").unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.midi_input_port(), Some("Keystation"));
        assert_eq!(config.keyboard_size().unwrap(), KeyboardSize::Keys61);
    }

    #[test]
    fn load_from_reports_bad_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[keyboard\nsize = ").unwrap();
        assert!(matches!(
            Config::load_from(file.path()),
            Err(ConfigError::Parse(_))
        ));

        let missing = Path::new("/nonexistent/clavis/config.toml");
        assert!(matches!(
            Config::load_from(missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
