// src/plugin.rs - ChasePlugin: resources, events and the fixed-step frame order
use bevy::prelude::*;

use crate::core::*;
use crate::systems::*;

/// One simulated frame, in order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChaseSet {
    /// Pickups under the player and cooldowns.
    Input,
    Release,
    Movement,
    Vulnerability,
    Collision,
    Waves,
    /// Death pauses, respawns and game resets; runs in every phase.
    Round,
    Snapshot,
}

#[derive(Default)]
pub struct ChasePlugin {
    pub config: ChaseConfig,
}

impl ChasePlugin {
    pub fn new(config: ChaseConfig) -> Self {
        Self { config }
    }
}

impl Plugin for ChasePlugin {
    fn build(&self, app: &mut App) {
        if let Err(e) = self.config.validate() {
            warn!("Chase config rejected ({}); using defaults", e);
            app.insert_resource(ChaseConfig::default());
        } else {
            app.insert_resource(self.config.clone());
        }

        app.init_resource::<TilePathfinder>()
            .init_resource::<ReturnPathCache>()
            .init_resource::<ReleaseCoordinator>()
            .init_resource::<VulnerabilityController>()
            .init_resource::<WaveTimer>()
            .init_resource::<RoundPhase>()
            .init_resource::<ChaseSnapshot>()
            .add_event::<PowerPelletEaten>()
            .add_event::<MysteryPowerUpCollected>()
            .add_event::<AgentCaptured>()
            .add_event::<AgentReleased>()
            .add_event::<PlayerCaught>()
            .add_event::<RoundReset>()
            .add_event::<GameOver>()
            .add_event::<ResetGameRequested>()
            .configure_sets(
                FixedUpdate,
                (
                    ChaseSet::Input,
                    ChaseSet::Release,
                    ChaseSet::Movement,
                    ChaseSet::Vulnerability,
                    ChaseSet::Collision,
                    ChaseSet::Waves,
                    ChaseSet::Round,
                    ChaseSet::Snapshot,
                )
                    .chain(),
            )
            .configure_sets(
                FixedUpdate,
                (
                    ChaseSet::Input,
                    ChaseSet::Release,
                    ChaseSet::Movement,
                    ChaseSet::Vulnerability,
                    ChaseSet::Collision,
                    ChaseSet::Waves,
                )
                    .distributive_run_if(round_in_play),
            )
            .add_systems(Startup, setup_chase)
            .add_systems(
                FixedUpdate,
                (
                    pellet_system.in_set(ChaseSet::Input),
                    release_system.in_set(ChaseSet::Release),
                    agent_movement_system.in_set(ChaseSet::Movement),
                    vulnerability_system.in_set(ChaseSet::Vulnerability),
                    collision_system.in_set(ChaseSet::Collision),
                    wave_system.in_set(ChaseSet::Waves),
                    round_system.in_set(ChaseSet::Round),
                    snapshot_system.in_set(ChaseSet::Snapshot),
                ),
            );
    }
}

pub fn round_in_play(phase: Res<RoundPhase>) -> bool {
    phase.is_playing()
}

/// Build the maze from config (falling back to the built-in one), then spawn
/// agents and the per-maze resources.
pub fn setup_chase(mut commands: Commands, config: Res<ChaseConfig>) {
    let (grid, pen) = build_maze(&config);
    let tile_size = config.grid.tile_size;

    for identity in Identity::ALL {
        commands.spawn((
            Agent::new(identity, pen.home(identity), pen.gate, tile_size),
            Name::new(identity.name()),
        ));
    }

    commands.insert_resource(Player::new(grid.player_start(), tile_size, config.round.starting_lives));
    commands.insert_resource(PelletField::from_grid(&grid, config.difficulty));
    commands.insert_resource(ScatterTargets::from_grid(&grid));

    info!(
        "Chase ready: {}x{} maze, gate {:?}, {:?} difficulty",
        grid.cols(),
        grid.rows(),
        pen.gate,
        config.difficulty
    );
    commands.insert_resource(grid);
}

fn build_maze(config: &ChaseConfig) -> (MazeGrid, PenLayout) {
    if let Some(rows) = &config.grid.layout {
        match MazeGrid::parse(rows.as_slice()).and_then(|grid| grid.pen_layout().map(|pen| (grid, pen))) {
            Ok(maze) => return maze,
            Err(e) => warn!("Custom maze rejected ({}); using the built-in maze", e),
        }
    }

    let grid = MazeGrid::default_maze();
    let pen = grid
        .pen_layout()
        .unwrap_or_else(|e| panic!("built-in maze has no valid pen: {e}"));
    (grid, pen)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_custom_layout_falls_back_to_built_in() {
        let mut config = ChaseConfig::default();
        config.grid.layout = Some(vec!["#####".into(), "#.?.#".into(), "#####".into()]);
        let (grid, pen) = build_maze(&config);
        assert_eq!(grid.cols(), 21);
        assert_eq!(pen.gate, Tile::new(10, 8));
    }

    #[test]
    fn custom_layout_with_a_walled_in_gate_falls_back() {
        let mut config = ChaseConfig::default();
        config.grid.layout = Some(
            ["#######", "#P0## #", "###=###", "#G123G#", "#######"]
                .map(String::from)
                .to_vec(),
        );
        let (grid, pen) = build_maze(&config);
        assert_eq!(grid.cols(), 21);
        assert_eq!(pen.gate, Tile::new(10, 8));
    }

    #[test]
    fn custom_layout_with_a_pen_is_used() {
        let mut config = ChaseConfig::default();
        config.grid.layout = Some(
            ["#######", "#P 0  #", "###=###", "#G123G#", "#######"]
                .map(String::from)
                .to_vec(),
        );
        let (grid, pen) = build_maze(&config);
        assert_eq!(grid.cols(), 7);
        assert_eq!(pen.gate, Tile::new(3, 2));
        assert_eq!(grid.player_start(), Tile::new(1, 1));
    }
}
