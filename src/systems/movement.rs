// src/systems/movement.rs - Per-frame agent advance
use bevy::prelude::*;

use crate::core::components::{Agent, BehaviorMode, CaptureStatus, Identity, PenState};
use crate::core::config::ChaseConfig;
use crate::core::grid::{tile_origin, GridMap, MazeGrid, Tile};
use crate::core::resources::Player;
use crate::systems::behavior::{BehaviorStrategy, ScatterTargets, TargetContext};
use crate::systems::pathfinding::{is_passable, step_toward, Passage, ReturnPathCache, TilePathfinder};
use crate::systems::release::ReleaseCoordinator;
use crate::systems::waves::WaveTimer;
use crate::systems::ordered_agents;

/// Read-only inputs shared by every agent's advance this frame.
pub struct Surroundings<'a, G: GridMap> {
    pub grid: &'a G,
    pub player: &'a Player,
    pub scatter: &'a ScatterTargets,
    pub release: &'a ReleaseCoordinator,
    pub wave_mode: BehaviorMode,
    pub config: &'a ChaseConfig,
}

/// Move every agent one frame, in identity order so the Interceptor reads
/// the Pursuer's position after it has moved.
pub fn advance_agents<G: GridMap>(
    agents: &mut [&mut Agent],
    world: &Surroundings<G>,
    pathfinder: &mut TilePathfinder,
    returns: &mut ReturnPathCache,
) {
    let tile_size = world.config.grid.tile_size;

    for i in 0..agents.len() {
        let pursuer_center = agents
            .iter()
            .find(|a| a.identity() == Identity::Pursuer)
            .map(|a| a.center(tile_size));
        let agent = &mut *agents[i];

        if agent.is_returning() {
            return_to_pen(agent, world, pathfinder, returns);
            continue;
        }
        if world.release.state(agent.identity()) != PenState::Free {
            continue;
        }

        let own_tile = agent.tile(tile_size);
        let (target, speed) = if agent.is_vulnerable() {
            let speed = world.config.agent_speed() * world.config.speeds.flee_multiplier;
            (flee_target(world.grid, own_tile, world.player.tile(tile_size)), speed)
        } else {
            let ctx = TargetContext {
                mode: agent.mode,
                own_tile,
                scatter: world.scatter.get(agent.identity()),
                player_tile: world.player.tile(tile_size),
                player_facing: world.player.facing,
                player_center: world.player.center(tile_size),
                pursuer_center: pursuer_center.unwrap_or_else(|| agent.center(tile_size)),
                cols: world.grid.cols(),
                rows: world.grid.rows(),
                tile_size,
            };
            let Some(target) = BehaviorStrategy::from(agent.identity()).target_tile(&ctx) else {
                continue;
            };
            (target, world.config.agent_speed())
        };

        let next = pathfinder.next_step_toward(world.grid, own_tile, target);
        agent.move_to(step_toward(agent.position, next, speed, tile_size));
    }
}

/// The tile mirroring the player's offset through the agent, clamped to the grid.
pub fn flee_target(grid: &impl GridMap, own: Tile, player: Tile) -> Tile {
    grid.clamp(Tile::new(2 * own.col - player.col, 2 * own.row - player.row))
}

fn return_to_pen<G: GridMap>(
    agent: &mut Agent,
    world: &Surroundings<G>,
    pathfinder: &mut TilePathfinder,
    returns: &mut ReturnPathCache,
) {
    let tile_size = world.config.grid.tile_size;
    let speed = world.config.speeds.returning;
    let identity = agent.identity();
    let gate = agent.gate();

    if !returns.has_route(identity) {
        let from = agent.tile(tile_size);
        match pathfinder.route(world.grid, from, gate, Passage::IncludingPen) {
            Some(route) => {
                debug!("{} heading back to the pen, {} tiles", identity.name(), route.len());
                returns.store(identity, route);
            }
            None => warn!("{} has no route from {:?} to the gate", identity.name(), from),
        }
    }

    if returns.has_route(identity) {
        if let Some(next) = returns.next_waypoint(identity, agent.position, tile_size) {
            agent.move_to(step_toward(agent.position, next, speed, tile_size));
        }
    } else {
        let from = agent.tile(tile_size);
        let closest = from
            .neighbors()
            .into_iter()
            .filter(|tile| is_passable(world.grid, *tile, Passage::IncludingPen))
            .min_by_key(|tile| tile.manhattan(gate));
        match closest {
            Some(next) => agent.move_to(step_toward(agent.position, next, speed, tile_size)),
            None => {
                warn!("{} is boxed in at {:?}; placing it on the gate", identity.name(), from);
                agent.position = tile_origin(gate, tile_size);
            }
        }
    }

    if agent.position == tile_origin(gate, tile_size) {
        agent.mode = world.wave_mode;
        agent.capture = CaptureStatus::Intact;
        returns.clear(identity);
        info!("{} is back at the gate", identity.name());
    }
}

// ============================================================================
// BEVY SYSTEMS
// ============================================================================

pub fn agent_movement_system(
    mut agents: Query<&mut Agent>,
    mut pathfinder: ResMut<TilePathfinder>,
    mut returns: ResMut<ReturnPathCache>,
    grid: Res<MazeGrid>,
    player: Res<Player>,
    scatter: Res<ScatterTargets>,
    release: Res<ReleaseCoordinator>,
    waves: Res<WaveTimer>,
    config: Res<ChaseConfig>,
) {
    let mut agents = ordered_agents(agents.iter_mut());
    let world = Surroundings {
        grid: &*grid,
        player: &player,
        scatter: &scatter,
        release: &release,
        wave_mode: waves.mode(),
        config: &config,
    };
    advance_agents(&mut agents, &world, &mut pathfinder, &mut returns);
}
