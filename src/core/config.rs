// src/core/config.rs - Chase tuning and balancing
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::components::Identity;

pub const DEFAULT_CONFIG_PATH: &str = "data/config/chase.json";

#[derive(Resource, Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ChaseConfig {
    pub grid: GridConfig,
    pub speeds: SpeedConfig,
    pub release: ReleaseConfig,
    pub vulnerability: VulnerabilityConfig,
    pub collision: CollisionConfig,
    pub waves: WaveConfig,
    pub round: RoundConfig,
    pub mystery: MysteryConfig,
    pub difficulty: Difficulty,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Difficulty {
    #[default]
    Easy,
    Hard,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    pub tile_size: f32,
    /// ASCII rows; `None` uses the built-in maze.
    pub layout: Option<Vec<String>>,
}

/// Pixels per frame.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SpeedConfig {
    pub agent: f32,
    pub hard_agent: f32,
    pub flee_multiplier: f32,
    pub returning: f32,
    pub exit: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ReleaseConfig {
    /// Frames after the Pursuer leaves home, indexed by identity.
    pub delays: [u32; 4],
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct VulnerabilityConfig {
    pub duration_frames: u32,
    pub flash_window: u32,
    pub flash_period: u32,
    pub flash_on: u32,
    pub capture_distance: f32,
    pub capture_reward: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CollisionConfig {
    pub player_radius_factor: f32,
    pub agent_radius_factor: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct WaveConfig {
    pub scatter_frames: u32,
    pub pursuit_frames: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct RoundConfig {
    pub starting_lives: u32,
    pub death_frames: u32,
    pub pellet_reward: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MysteryConfig {
    pub max_lives: u32,
    pub score_bonus: u32,
    pub score_cooldown: u32,
    pub speed_bonus: f32,
    pub speed_frames: u32,
    pub speed_cooldown: u32,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse RON config: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("unsupported config extension: {0:?}")]
    UnsupportedFormat(Option<String>),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl ChaseConfig {
    /// Load from the default path, logging and falling back to defaults on failure.
    pub fn load() -> Self {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_path(path) {
            Ok(config) => {
                info!("Loaded chase config from {}", path.display());
                config
            }
            Err(e) => {
                error!("Failed to load chase config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Strict loader: `.json` or `.ron`, validated.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);

        let config: Self = match extension.as_deref() {
            Some("json") => serde_json::from_str(&content)?,
            Some("ron") => ron::from_str(&content)?,
            _ => return Err(ConfigError::UnsupportedFormat(extension)),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if !(self.grid.tile_size > 0.0) {
            return invalid("tile_size must be positive");
        }
        let speeds = &self.speeds;
        if [speeds.agent, speeds.hard_agent, speeds.returning, speeds.exit]
            .iter()
            .any(|s| !(*s > 0.0))
        {
            return invalid("speeds must be positive");
        }
        if !(speeds.flee_multiplier > 0.0) {
            return invalid("flee_multiplier must be positive");
        }
        if self.vulnerability.duration_frames == 0 {
            return invalid("vulnerability duration must be at least one frame");
        }
        if self.vulnerability.flash_period == 0
            || self.vulnerability.flash_on > self.vulnerability.flash_period
        {
            return invalid("flash_on must fit inside a non-zero flash_period");
        }
        if self.release.delays.windows(2).any(|pair| pair[0] > pair[1]) {
            return invalid("release delays must not decrease in release order");
        }
        Ok(())
    }

    /// Base chase speed for the configured difficulty.
    pub fn agent_speed(&self) -> f32 {
        match self.difficulty {
            Difficulty::Easy => self.speeds.agent,
            Difficulty::Hard => self.speeds.hard_agent,
        }
    }

    pub fn player_radius(&self) -> f32 {
        self.collision.player_radius_factor * self.grid.tile_size
    }

    pub fn agent_radius(&self) -> f32 {
        self.collision.agent_radius_factor * self.grid.tile_size
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { tile_size: 45.0, layout: None }
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            agent: 1.5,
            hard_agent: 2.5,
            flee_multiplier: 0.7,
            returning: 1.0,
            exit: 2.0,
        }
    }
}

impl ReleaseConfig {
    pub fn delay(&self, identity: Identity) -> u32 {
        self.delays[identity.index()]
    }
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        // 8 s, 13 s and 16 s at 60 Hz.
        Self { delays: [0, 480, 780, 960] }
    }
}

impl Default for VulnerabilityConfig {
    fn default() -> Self {
        Self {
            duration_frames: 420,
            flash_window: 120,
            flash_period: 30,
            flash_on: 15,
            capture_distance: 20.0,
            capture_reward: 200,
        }
    }
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            player_radius_factor: 0.2,
            agent_radius_factor: 0.4,
        }
    }
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            scatter_frames: 420,
            pursuit_frames: 1200,
        }
    }
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            starting_lives: 3,
            death_frames: 90,
            pellet_reward: 50,
        }
    }
}

impl Default for MysteryConfig {
    fn default() -> Self {
        Self {
            max_lives: 3,
            score_bonus: 200,
            score_cooldown: 420,
            speed_bonus: 1.5,
            speed_frames: 420,
            speed_cooldown: 60,
        }
    }
}
