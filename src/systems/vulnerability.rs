// src/systems/vulnerability.rs - Energizer window, flee mode and captures
use bevy::prelude::*;

use crate::core::components::{Agent, BehaviorMode, CaptureStatus, Identity, PenState};
use crate::core::config::{ChaseConfig, VulnerabilityConfig};
use crate::core::events::{AgentCaptured, PowerPelletEaten};
use crate::core::resources::Player;
use crate::systems::pathfinding::ReturnPathCache;
use crate::systems::release::ReleaseCoordinator;
use crate::systems::waves::WaveTimer;
use crate::systems::ordered_agents;

/// Countdown for the window in which agents can be captured.
#[derive(Resource, Clone, Debug, Default, PartialEq, Eq)]
pub struct VulnerabilityController {
    remaining: u32,
}

impl VulnerabilityController {
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    /// A large pellet was eaten. Refreshes the countdown; only a window that
    /// was not already running turns agents around.
    pub fn trigger(&mut self, agents: &mut [&mut Agent], config: &VulnerabilityConfig) -> bool {
        let starting = self.remaining == 0;
        self.remaining = config.duration_frames;
        if !starting {
            return false;
        }

        for agent in agents.iter_mut().filter(|a| !a.is_returning()) {
            agent.facing = agent.facing.reversed();
            agent.mode = BehaviorMode::Vulnerable;
        }
        info!("Energizer window opened for {} frames", config.duration_frames);
        true
    }

    /// One frame of the window: hold agents vulnerable, capture the ones the
    /// player is touching, then count down. Returns the captured identities.
    pub fn update(
        &mut self,
        agents: &mut [&mut Agent],
        player: &mut Player,
        release: &mut ReleaseCoordinator,
        returns: &mut ReturnPathCache,
        wave_mode: BehaviorMode,
        config: &VulnerabilityConfig,
        tile_size: f32,
    ) -> Vec<Identity> {
        if self.remaining == 0 {
            return Vec::new();
        }

        let mut captured = Vec::new();
        let player_center = player.center(tile_size);
        for agent in agents.iter_mut() {
            if agent.is_returning() {
                continue;
            }
            agent.mode = BehaviorMode::Vulnerable;
            if agent.center(tile_size).distance(player_center) < config.capture_distance {
                capture(agent, player, release, returns, config.capture_reward, tile_size);
                captured.push(agent.identity());
            }
        }

        self.remaining -= 1;
        if self.remaining == 0 {
            for agent in agents.iter_mut().filter(|a| a.is_vulnerable()) {
                agent.mode = wave_mode;
            }
            info!("Energizer window closed");
        }
        captured
    }

    /// Render hint for the last stretch of the window.
    pub fn flashing(&self, config: &VulnerabilityConfig) -> bool {
        if self.remaining == 0 || self.remaining > config.flash_window || config.flash_period == 0 {
            return false;
        }
        let elapsed = config.duration_frames.saturating_sub(self.remaining);
        elapsed % config.flash_period < config.flash_on
    }

    pub fn clear(&mut self) {
        self.remaining = 0;
    }
}

/// Send a vulnerable agent home: it becomes Returning, reappears on its home
/// tile and is marked for re-release once it has walked back to the gate.
pub fn capture(
    agent: &mut Agent,
    player: &mut Player,
    release: &mut ReleaseCoordinator,
    returns: &mut ReturnPathCache,
    reward: u32,
    tile_size: f32,
) {
    let identity = agent.identity();
    agent.mode = BehaviorMode::Returning;
    agent.capture = CaptureStatus::Captured;
    agent.position = agent.home_position(tile_size);
    release.force(identity, PenState::Exiting);
    returns.clear(identity);
    player.score += reward;
    info!("{} captured (+{})", identity.name(), reward);
}

// ============================================================================
// BEVY SYSTEMS
// ============================================================================

pub fn vulnerability_system(
    mut controller: ResMut<VulnerabilityController>,
    mut power_pellets: EventReader<PowerPelletEaten>,
    mut captures: EventWriter<AgentCaptured>,
    mut agents: Query<&mut Agent>,
    mut player: ResMut<Player>,
    mut release: ResMut<ReleaseCoordinator>,
    mut returns: ResMut<ReturnPathCache>,
    waves: Res<WaveTimer>,
    config: Res<ChaseConfig>,
) {
    let mut agents = ordered_agents(agents.iter_mut());
    if power_pellets.read().count() > 0 {
        controller.trigger(&mut agents, &config.vulnerability);
    }

    let captured = controller.update(
        &mut agents,
        &mut player,
        &mut release,
        &mut returns,
        waves.mode(),
        &config.vulnerability,
        config.grid.tile_size,
    );
    for identity in captured {
        captures.write(AgentCaptured { identity, reward: config.vulnerability.capture_reward });
    }
}
