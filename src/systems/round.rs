// src/systems/round.rs - Death handling, round restarts and full game reset
use bevy::prelude::*;

use crate::core::components::{Agent, BehaviorMode};
use crate::core::config::ChaseConfig;
use crate::core::events::{GameOver, ResetGameRequested, RoundReset};
use crate::core::grid::MazeGrid;
use crate::core::pellets::PelletField;
use crate::core::resources::{Player, RoundPhase};
use crate::systems::pathfinding::ReturnPathCache;
use crate::systems::release::ReleaseCoordinator;
use crate::systems::vulnerability::VulnerabilityController;
use crate::systems::waves::WaveTimer;
use crate::systems::ordered_agents;

/// What the end of a frame means for the round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseStep {
    Unchanged,
    /// The death pause ran out and the player has lives left.
    Respawn,
    /// The death pause ran out with no lives left.
    GameOver,
}

/// Count down a death pause. Only `Dying` ever changes here.
pub fn advance_phase(phase: &mut RoundPhase, lives: u32) -> PhaseStep {
    let RoundPhase::Dying { frames_left } = *phase else {
        return PhaseStep::Unchanged;
    };

    if frames_left > 1 {
        *phase = RoundPhase::Dying { frames_left: frames_left - 1 };
        return PhaseStep::Unchanged;
    }

    if lives == 0 {
        *phase = RoundPhase::GameOver;
        PhaseStep::GameOver
    } else {
        *phase = RoundPhase::Playing;
        PhaseStep::Respawn
    }
}

/// Everyone back to their starting tiles after a death. Score, lives, pellets
/// and the wave clock carry over.
pub fn reset_round(
    agents: &mut [&mut Agent],
    release: &mut ReleaseCoordinator,
    vulnerability: &mut VulnerabilityController,
    returns: &mut ReturnPathCache,
    player: &mut Player,
    wave_mode: BehaviorMode,
    tile_size: f32,
) {
    for agent in agents.iter_mut() {
        agent.reset(wave_mode, tile_size);
    }
    release.reset_round();
    vulnerability.clear();
    returns.clear_all();
    player.respawn();
}

// ============================================================================
// BEVY SYSTEMS
// ============================================================================

pub fn round_system(
    mut phase: ResMut<RoundPhase>,
    mut reset_requests: EventReader<ResetGameRequested>,
    mut round_resets: EventWriter<RoundReset>,
    mut game_over: EventWriter<GameOver>,
    mut agents: Query<&mut Agent>,
    mut grid: ResMut<MazeGrid>,
    mut pellets: ResMut<PelletField>,
    mut player: ResMut<Player>,
    mut waves: ResMut<WaveTimer>,
    mut release: ResMut<ReleaseCoordinator>,
    mut vulnerability: ResMut<VulnerabilityController>,
    mut returns: ResMut<ReturnPathCache>,
    config: Res<ChaseConfig>,
) {
    let mut agents = ordered_agents(agents.iter_mut());
    let tile_size = config.grid.tile_size;

    if reset_requests.read().count() > 0 {
        grid.restore();
        *pellets = PelletField::from_grid(&grid, config.difficulty);
        player.reset(config.round.starting_lives);
        waves.reset();
        reset_round(
            &mut agents,
            &mut release,
            &mut vulnerability,
            &mut returns,
            &mut player,
            waves.mode(),
            tile_size,
        );
        *phase = RoundPhase::Playing;
        info!("Game reset");
        return;
    }

    match advance_phase(&mut phase, player.lives) {
        PhaseStep::Unchanged => {}
        PhaseStep::Respawn => {
            reset_round(
                &mut agents,
                &mut release,
                &mut vulnerability,
                &mut returns,
                &mut player,
                waves.mode(),
                tile_size,
            );
            round_resets.write(RoundReset);
            info!("Round reset, {} lives left", player.lives);
        }
        PhaseStep::GameOver => {
            game_over.write(GameOver { final_score: player.score });
            info!("Game over, final score {}", player.score);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::components::{CaptureStatus, Identity, PenState};
    use crate::core::config::VulnerabilityConfig;
    use crate::core::grid::{tile_origin, Tile};

    #[test]
    fn death_pause_counts_down_then_respawns() {
        let mut phase = RoundPhase::Dying { frames_left: 2 };
        assert_eq!(advance_phase(&mut phase, 2), PhaseStep::Unchanged);
        assert_eq!(phase, RoundPhase::Dying { frames_left: 1 });
        assert_eq!(advance_phase(&mut phase, 2), PhaseStep::Respawn);
        assert_eq!(phase, RoundPhase::Playing);
        assert_eq!(advance_phase(&mut phase, 2), PhaseStep::Unchanged);
    }

    #[test]
    fn last_life_ends_the_game() {
        let mut phase = RoundPhase::Dying { frames_left: 1 };
        assert_eq!(advance_phase(&mut phase, 0), PhaseStep::GameOver);
        assert_eq!(phase, RoundPhase::GameOver);
        assert_eq!(advance_phase(&mut phase, 0), PhaseStep::Unchanged);
    }

    #[test]
    fn round_reset_puts_everything_back() {
        let tile_size = 45.0;
        let grid = MazeGrid::default_maze();
        let pen = grid.pen_layout().unwrap();
        let mut agents: Vec<Agent> = Identity::ALL
            .map(|identity| Agent::new(identity, pen.home(identity), pen.gate, tile_size))
            .to_vec();
        for agent in &mut agents {
            agent.position = tile_origin(Tile::new(1, 1), tile_size);
            agent.mode = BehaviorMode::Vulnerable;
        }
        agents[2].mode = BehaviorMode::Returning;
        agents[2].capture = CaptureStatus::Captured;

        let mut release = ReleaseCoordinator::default();
        for identity in Identity::ALL {
            release.force(identity, PenState::Free);
        }
        let mut vulnerability = VulnerabilityController::default();
        {
            let mut refs: Vec<&mut Agent> = agents.iter_mut().collect();
            vulnerability.trigger(&mut refs, &VulnerabilityConfig::default());
        }
        let mut returns = ReturnPathCache::default();
        returns.store(Identity::Flanker, vec![Tile::new(1, 1)]);
        let mut player = Player::new(grid.player_start(), tile_size, 2);
        player.position = Vec2::new(400.0, 400.0);
        player.score = 1234;

        let mut refs: Vec<&mut Agent> = agents.iter_mut().collect();
        reset_round(
            &mut refs,
            &mut release,
            &mut vulnerability,
            &mut returns,
            &mut player,
            BehaviorMode::Pursuit,
            tile_size,
        );

        for agent in &agents {
            assert_eq!(agent.position, tile_origin(pen.home(agent.identity()), tile_size));
            assert_eq!(agent.mode, BehaviorMode::Pursuit);
            assert_eq!(agent.capture, CaptureStatus::Intact);
        }
        assert_eq!(release.state(Identity::Pursuer), PenState::Free);
        for identity in &Identity::ALL[1..] {
            assert_eq!(release.state(*identity), PenState::Held);
        }
        assert_eq!(release.reference_departed_at(), None);
        assert_eq!(vulnerability.remaining(), 0);
        assert!(!returns.has_route(Identity::Flanker));
        assert_eq!(player.position, player.start_position());
        assert_eq!(player.score, 1234);
    }
}
