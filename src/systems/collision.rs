// src/systems/collision.rs - Player/agent contact resolution
use bevy::prelude::*;

use crate::core::components::{Agent, Identity};
use crate::core::config::ChaseConfig;
use crate::core::events::{AgentCaptured, PlayerCaught};
use crate::core::resources::{Player, RoundPhase};
use crate::systems::pathfinding::ReturnPathCache;
use crate::systems::release::ReleaseCoordinator;
use crate::systems::vulnerability::capture;
use crate::systems::ordered_agents;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollisionReport {
    pub captured: Vec<Identity>,
    /// The agent that caught the player, if any. At most one per frame.
    pub caught_by: Option<Identity>,
}

/// Check every agent against the player in identity order. Vulnerable agents
/// in reach are captured; the first other agent in reach costs the player a
/// life and ends the pass.
pub fn resolve_collisions(
    agents: &mut [&mut Agent],
    player: &mut Player,
    release: &mut ReleaseCoordinator,
    returns: &mut ReturnPathCache,
    config: &ChaseConfig,
) -> CollisionReport {
    let tile_size = config.grid.tile_size;
    let reach = config.player_radius() + config.agent_radius();
    let mut report = CollisionReport::default();

    for agent in agents.iter_mut() {
        let player_center = player.center(tile_size);
        if agent.center(tile_size).distance_squared(player_center) >= reach * reach {
            continue;
        }

        if agent.is_vulnerable() {
            capture(agent, player, release, returns, config.vulnerability.capture_reward, tile_size);
            report.captured.push(agent.identity());
            continue;
        }

        player.lives = player.lives.saturating_sub(1);
        report.caught_by = Some(agent.identity());
        info!("Player caught by {} ({} lives left)", agent.identity().name(), player.lives);
        break;
    }
    report
}

// ============================================================================
// BEVY SYSTEMS
// ============================================================================

pub fn collision_system(
    mut agents: Query<&mut Agent>,
    mut player: ResMut<Player>,
    mut release: ResMut<ReleaseCoordinator>,
    mut returns: ResMut<ReturnPathCache>,
    mut phase: ResMut<RoundPhase>,
    mut captures: EventWriter<AgentCaptured>,
    mut caught: EventWriter<PlayerCaught>,
    config: Res<ChaseConfig>,
) {
    let mut agents = ordered_agents(agents.iter_mut());
    let report = resolve_collisions(&mut agents, &mut player, &mut release, &mut returns, &config);

    for identity in report.captured {
        captures.write(AgentCaptured { identity, reward: config.vulnerability.capture_reward });
    }
    if let Some(by) = report.caught_by {
        *phase = RoundPhase::Dying { frames_left: config.round.death_frames };
        caught.write(PlayerCaught { by, lives_left: player.lives });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::components::{BehaviorMode, CaptureStatus, PenState};
    use crate::core::grid::{tile_origin, Tile};

    const TILE: f32 = 45.0;

    fn agents_on(tile: Tile) -> Vec<Agent> {
        Identity::ALL
            .map(|identity| {
                let mut agent =
                    Agent::new(identity, Tile::new(9 + identity.index() as i32, 9), Tile::new(10, 8), TILE);
                agent.position = tile_origin(tile, TILE);
                agent.mode = BehaviorMode::Pursuit;
                agent
            })
            .to_vec()
    }

    fn resolve(agents: &mut [Agent], player: &mut Player, release: &mut ReleaseCoordinator) -> CollisionReport {
        let mut refs: Vec<&mut Agent> = agents.iter_mut().collect();
        resolve_collisions(&mut refs, player, release, &mut ReturnPathCache::default(), &ChaseConfig::default())
    }

    #[test]
    fn first_touching_agent_wins() {
        let mut agents = agents_on(Tile::new(3, 3));
        let mut player = Player::new(Tile::new(3, 3), TILE, 3);
        let mut release = ReleaseCoordinator::default();

        let report = resolve(&mut agents, &mut player, &mut release);
        assert_eq!(report.caught_by, Some(Identity::Pursuer));
        assert!(report.captured.is_empty());
        assert_eq!(player.lives, 2);
    }

    #[test]
    fn vulnerable_contact_captures_instead_of_killing() {
        let mut agents = agents_on(Tile::new(3, 3));
        agents[0].mode = BehaviorMode::Vulnerable;
        agents[1].mode = BehaviorMode::Vulnerable;
        let mut player = Player::new(Tile::new(3, 3), TILE, 3);
        let mut release = ReleaseCoordinator::default();

        let report = resolve(&mut agents, &mut player, &mut release);
        assert_eq!(report.captured, vec![Identity::Pursuer, Identity::Ambusher]);
        assert_eq!(report.caught_by, Some(Identity::Flanker));
        assert_eq!(player.score, 400);
        assert_eq!(player.lives, 2);

        // Each captured agent took exactly the capture path.
        for agent in &agents[..2] {
            assert_eq!(agent.capture, CaptureStatus::Captured);
            assert_eq!(agent.position, agent.home_position(TILE));
            assert_eq!(release.state(agent.identity()), PenState::Exiting);
        }
    }

    #[test]
    fn returning_agents_still_catch_the_player() {
        let mut agents = agents_on(Tile::new(3, 3));
        agents[0].mode = BehaviorMode::Returning;
        let mut player = Player::new(Tile::new(3, 3), TILE, 1);

        let report = resolve(&mut agents, &mut player, &mut ReleaseCoordinator::default());
        assert_eq!(report.caught_by, Some(Identity::Pursuer));
        assert_eq!(player.lives, 0);
    }

    #[test]
    fn contact_radius_is_the_sum_of_both_radii() {
        let mut agents = agents_on(Tile::new(3, 3));
        let mut player = Player::new(Tile::new(3, 3), TILE, 3);
        // 0.2 * 45 + 0.4 * 45 = 27 px.
        player.position.x += 28.0;
        assert_eq!(resolve(&mut agents, &mut player, &mut ReleaseCoordinator::default()).caught_by, None);

        player.position.x -= 2.0;
        assert!(resolve(&mut agents, &mut player, &mut ReleaseCoordinator::default()).caught_by.is_some());
    }
}
