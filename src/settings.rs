//! Settings persistence using TOML
//!
//! Stores settings in ~/.config/blocktris/settings.toml (or platform equivalent)

use crate::board::{Board, DEFAULT_CELL_SIZE, DEFAULT_COLUMNS, DEFAULT_ROWS};
use crate::game::Timings;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure to write the settings file
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to write settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Game settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Keybindings
    pub keys: KeyBindings,
    /// Board dimensions
    pub board: BoardSettings,
    /// Gameplay timing
    pub gameplay: GameplaySettings,
    /// Audio settings
    pub audio: AudioSettings,
}

/// Key bindings (stored as strings for easy editing)
/// Each action can have one or more keys bound to it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_left: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_right: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub soft_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub pause: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub quit: Vec<String>,
}

/// Deserialize keys as either a single string or array of strings
fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct KeysVisitor;

    impl<'de> Visitor<'de> for KeysVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or array of strings")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut keys = Vec::new();
            while let Some(key) = seq.next_element::<String>()? {
                keys.push(key);
            }
            Ok(keys)
        }
    }

    deserializer.deserialize_any(KeysVisitor)
}

/// Serialize keys: single key as string, multiple as array
fn serialize_keys<S>(keys: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeSeq;

    if let [key] = keys {
        serializer.serialize_str(key)
    } else {
        let mut seq = serializer.serialize_seq(Some(keys.len()))?;
        for key in keys {
            seq.serialize_element(key)?;
        }
        seq.end()
    }
}

/// Board dimensions, fixed for the lifetime of a game
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
    pub rows: usize,
    pub columns: usize,
    /// Terminal columns per cell
    pub cell_width: u16,
}

/// Gameplay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    /// Delay between gravity steps in milliseconds
    pub gravity_ms: u64,
    /// Cooldown shared by left and right moves
    pub horizontal_ms: u64,
    /// Cooldown between soft drop steps
    pub vertical_ms: u64,
    /// Cooldown between rotations
    pub rotation_ms: u64,
    /// Frame rate of the main loop
    pub target_fps: u32,
    /// Fixed piece sequence seed, random when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Audio settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Music volume (0-100)
    pub music_volume: u32,
    /// SFX volume (0-100)
    pub sfx_volume: u32,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_left: vec!["Left".to_string()],
            move_right: vec!["Right".to_string()],
            soft_drop: vec!["Down".to_string()],
            rotate: vec!["Up".to_string()],
            pause: vec!["p".to_string(), "Esc".to_string()],
            quit: vec!["q".to_string()],
        }
    }
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
            cell_width: DEFAULT_CELL_SIZE,
        }
    }
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            gravity_ms: 300,
            horizontal_ms: 100,
            vertical_ms: 50,
            rotation_ms: 200,
            target_fps: 60,
            seed: None,
        }
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            music_volume: 25,
            sfx_volume: 50,
        }
    }
}

/// Smallest board every piece can spawn on
const MIN_ROWS: usize = 4;
const MIN_COLUMNS: usize = 7;
/// Largest board a terminal can plausibly show
const MAX_ROWS: usize = 200;
const MAX_COLUMNS: usize = 200;
const MAX_CELL_WIDTH: u16 = 4;

impl BoardSettings {
    /// Build an empty board, bringing the dimensions into a playable range
    pub fn build(&self) -> Board {
        let rows = self.rows.clamp(MIN_ROWS, MAX_ROWS);
        let columns = self.columns.clamp(MIN_COLUMNS, MAX_COLUMNS);
        let cell_width = self.cell_width.clamp(1, MAX_CELL_WIDTH);
        if (rows, columns, cell_width) != (self.rows, self.columns, self.cell_width) {
            tracing::warn!(
                "Board {}x{} (cell width {}) adjusted to {}x{} (cell width {})",
                self.rows,
                self.columns,
                self.cell_width,
                rows,
                columns,
                cell_width
            );
        }
        Board::new(rows, columns, cell_width)
    }
}

impl GameplaySettings {
    /// Action cooldowns for the game
    pub fn timings(&self) -> Timings {
        Timings {
            gravity: Duration::from_millis(self.gravity_ms),
            horizontal: Duration::from_millis(self.horizontal_ms),
            vertical: Duration::from_millis(self.vertical_ms),
            rotation: Duration::from_millis(self.rotation_ms),
        }
    }

    /// Time budget of one frame
    pub fn frame_duration(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.target_fps.max(1)))
    }
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "blocktris", "blocktris")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.toml"))
    }

    /// Load settings from file, or fall back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };

        match fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                tracing::warn!("Invalid settings in {}: {}", path.display(), e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Parse settings from TOML text
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Save settings to file
    pub fn save(&self) -> Result<(), SettingsError> {
        let dir = Self::config_dir().ok_or(SettingsError::NoConfigDir)?;
        fs::create_dir_all(&dir)?;

        let contents = toml::to_string_pretty(self)?;
        fs::write(dir.join("settings.toml"), contents)?;

        Ok(())
    }
}
