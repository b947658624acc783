//! Game settings and tuning
//!
//! Loaded from a JSON file. Every section is `#[serde(default)]`, so a file
//! only needs the keys it wants to override.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings json: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Gameplay numbers that shape a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player_hp: u32,
    /// Seconds of invulnerability after the player is hit
    pub player_invulnerability: f32,
    pub enemy_hp: u32,
    /// Enemies spawned by the skirmish stage
    pub enemy_count: u32,
    /// Enemy switches from chasing to battle movement inside this range (px)
    pub enemy_combat_range: f32,
    /// Enemy starts shooting inside this range (px)
    pub enemy_detection_range: f32,
    /// Seconds between trigger pulls
    pub enemy_fire_interval: f32,
    /// Radius of the enemy spawn ring around the player (px)
    pub enemy_spawn_radius: f32,
    pub boss_hp: u32,
    /// Boss picks an attack once the player is inside this range (px)
    pub boss_attack_range: f32,
    /// Allow the boss to pick the pattern it just used
    pub boss_repeat_patterns: bool,
    /// Walking time required to clear the movement stage (seconds)
    pub movement_goal: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_hp: 5,
            player_invulnerability: 1.0,
            enemy_hp: 3,
            enemy_count: 10,
            enemy_combat_range: 300.0,
            enemy_detection_range: 600.0,
            enemy_fire_interval: 1.5,
            enemy_spawn_radius: 900.0,
            boss_hp: 20,
            boss_attack_range: 800.0,
            boss_repeat_patterns: true,
            movement_goal: 3.0,
        }
    }
}

/// Volume preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    pub muted: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.7,
            muted: false,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// RNG seed for the whole run
    pub seed: u64,
    pub tuning: Tuning,
    pub audio: AudioSettings,
    /// Outline collision boxes in the draw list
    pub show_hitboxes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            tuning: Tuning::default(),
            audio: AudioSettings::default(),
            show_hitboxes: false,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
