//! Game configuration
//!
//! Loaded once at start-up from an optional JSON file. Anything missing from
//! the file takes its default value.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::{Footprint, MovementProfile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("config is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Offline session simulation knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineSessionConfig {
    /// RNG seed for latency and failure rolls
    pub seed: u64,
    /// Frames a request takes to complete (inclusive range)
    pub min_latency_frames: u32,
    pub max_latency_frames: u32,
    /// Chance a request fails with an unreachable server (0.0 - 1.0)
    pub failure_rate: f64,
    /// Name the simulated service already knows, if any
    pub known_user: Option<String>,
}

impl Default for OfflineSessionConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            min_latency_frames: 5,
            max_latency_frames: 30,
            failure_rate: 0.1,
            known_user: None,
        }
    }
}

/// Audio preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }
}

/// Game configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Scene ===
    /// Scene size in presentation units
    pub scene_width: f32,
    pub scene_height: f32,
    /// World gravity (m/s²)
    pub gravity: Vec2,

    // === Bodies ===
    pub player: Footprint,
    /// Ground height; its width is always half the scene width
    pub ground_height: f32,
    pub movement: MovementProfile,

    // === Results screen ===
    /// Leaderboard panel, centred in the scene
    pub leaderboard_panel: Footprint,
    /// Play-again button, centred on the panel's bottom edge
    pub play_button: Footprint,

    // === Rules ===
    /// Countdown length in seconds; surviving it wins the round
    pub countdown_secs: Option<u64>,

    // === Storage ===
    /// Local fallback leaderboard file (memory only when unset)
    pub scores_path: Option<PathBuf>,

    pub audio: AudioConfig,
    pub offline_session: OfflineSessionConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            scene_width: 1024.0,
            scene_height: 600.0,
            gravity: Vec2::new(0.0, -10.0),

            player: Footprint::new(64.0, 64.0),
            ground_height: 40.0,
            movement: MovementProfile::default(),

            leaderboard_panel: Footprint::new(480.0, 360.0),
            play_button: Footprint::new(200.0, 60.0),

            countdown_secs: None,

            scores_path: None,

            audio: AudioConfig::default(),
            offline_session: OfflineSessionConfig::default(),
        }
    }
}

impl GameConfig {
    /// Read a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Read a config file, falling back to defaults when it cannot be used
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Using default config ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Ground footprint: half the scene wide
    pub fn ground(&self) -> Footprint {
        Footprint::new(self.scene_width / 2.0, self.ground_height)
    }

    /// Where the player spawns (scene center)
    pub fn spawn_point(&self) -> Vec2 {
        Vec2::new(self.scene_width / 2.0, self.scene_height / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: GameConfig =
            serde_json::from_str(r#"{ "scene_width": 800.0, "countdown_secs": 30 }"#).unwrap();
        assert_eq!(config.scene_width, 800.0);
        assert_eq!(config.scene_height, 600.0);
        assert_eq!(config.countdown_secs, Some(30));
        assert_eq!(config.ground(), Footprint::new(400.0, 40.0));
        assert_eq!(config.spawn_point(), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = GameConfig::load_or_default(Path::new("/nonexistent/tumble.json"));
        assert_eq!(config.scene_width, 1024.0);
        assert!(config.countdown_secs.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("tumble-config-{}.json", std::process::id()));
        let config = GameConfig {
            countdown_secs: Some(12),
            ..GameConfig::default()
        };
        config.save(&path).unwrap();

        let loaded = GameConfig::load(&path).unwrap();
        assert_eq!(loaded.countdown_secs, Some(12));
        assert_eq!(loaded.movement, config.movement);

        std::fs::remove_file(&path).unwrap();
    }
}
