// src/systems/waves.rs - Alternating scatter/pursuit waves
use bevy::prelude::*;

use crate::core::components::{Agent, BehaviorMode};
use crate::core::config::{ChaseConfig, WaveConfig};
use crate::systems::ordered_agents;

/// Shared clock that flips wave-driven agents between Scatter and Pursuit.
#[derive(Resource, Clone, Debug, PartialEq, Eq)]
pub struct WaveTimer {
    mode: BehaviorMode,
    frames_in_mode: u32,
}

impl Default for WaveTimer {
    fn default() -> Self {
        Self {
            mode: BehaviorMode::Scatter,
            frames_in_mode: 0,
        }
    }
}

impl WaveTimer {
    pub fn mode(&self) -> BehaviorMode {
        self.mode
    }

    pub fn frames_in_mode(&self) -> u32 {
        self.frames_in_mode
    }

    /// Advance one frame; returns the new mode when the wave flips.
    pub fn tick(&mut self, config: &WaveConfig) -> Option<BehaviorMode> {
        self.frames_in_mode += 1;
        let length = match self.mode {
            BehaviorMode::Pursuit => config.pursuit_frames,
            _ => config.scatter_frames,
        };
        if self.frames_in_mode < length {
            return None;
        }

        self.mode = match self.mode {
            BehaviorMode::Pursuit => BehaviorMode::Scatter,
            _ => BehaviorMode::Pursuit,
        };
        self.frames_in_mode = 0;
        Some(self.mode)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Agents in Pursuit or Scatter adopt `mode`; Vulnerable and Returning keep theirs.
pub fn apply_wave(agents: &mut [&mut Agent], mode: BehaviorMode) {
    for agent in agents.iter_mut() {
        if agent.mode.is_wave_driven() {
            agent.mode = mode;
        }
    }
}

// ============================================================================
// BEVY SYSTEMS
// ============================================================================

pub fn wave_system(
    mut waves: ResMut<WaveTimer>,
    mut agents: Query<&mut Agent>,
    config: Res<ChaseConfig>,
) {
    if let Some(mode) = waves.tick(&config.waves) {
        let mut agents = ordered_agents(agents.iter_mut());
        apply_wave(&mut agents, mode);
        info!("Wave switched to {:?}", mode);
    }
}
