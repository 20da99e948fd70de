// src/systems/release.rs - Staggered release of agents from the pen
use bevy::prelude::*;

use crate::core::components::{Agent, Identity, PenState};
use crate::core::config::{ChaseConfig, ReleaseConfig};
use crate::core::events::AgentReleased;
use crate::core::grid::{tile_origin, Tile};
use crate::systems::ordered_agents;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReleaseRecord {
    pub state: PenState,
    /// Frames spent in `state`.
    pub since_entry: u32,
}

impl ReleaseRecord {
    fn entering(state: PenState) -> Self {
        Self { state, since_entry: 0 }
    }
}

/// Per-identity pen state plus the frame the Pursuer first left home, which
/// every other release delay is measured from.
#[derive(Resource, Clone, Debug)]
pub struct ReleaseCoordinator {
    records: [ReleaseRecord; 4],
    frame: u32,
    reference_departed_at: Option<u32>,
    /// Held at the start of the round and not yet out of the pen.
    awaiting_release: [bool; 4],
}

impl Default for ReleaseCoordinator {
    fn default() -> Self {
        let mut coordinator = Self {
            records: [ReleaseRecord::entering(PenState::Held); 4],
            frame: 0,
            reference_departed_at: None,
            awaiting_release: [false; 4],
        };
        coordinator.reset_round();
        coordinator
    }
}

impl ReleaseCoordinator {
    pub fn state(&self, identity: Identity) -> PenState {
        self.records[identity.index()].state
    }

    pub fn record(&self, identity: Identity) -> ReleaseRecord {
        self.records[identity.index()]
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn reference_departed_at(&self) -> Option<u32> {
        self.reference_departed_at
    }

    pub fn force(&mut self, identity: Identity, state: PenState) {
        self.records[identity.index()] = ReleaseRecord::entering(state);
        if state == PenState::Free {
            self.awaiting_release[identity.index()] = false;
        }
    }

    /// Pursuer free, everyone else back in the pen, departure baseline cleared.
    pub fn reset_round(&mut self) {
        for identity in Identity::ALL {
            let state = if identity.is_reference() { PenState::Free } else { PenState::Held };
            self.force(identity, state);
            self.awaiting_release[identity.index()] = state == PenState::Held;
        }
        self.reference_departed_at = None;
    }

    /// Advance one frame. `agents` must be sorted by identity. Returns the
    /// identities that walked out of the pen this frame.
    pub fn update(
        &mut self,
        agents: &mut [&mut Agent],
        release: &ReleaseConfig,
        exit_speed: f32,
        tile_size: f32,
    ) -> Vec<Identity> {
        self.frame += 1;
        for record in &mut self.records {
            record.since_entry += 1;
        }

        if self.reference_departed_at.is_none() {
            let departed = agents.iter().any(|agent| {
                agent.identity().is_reference()
                    && self.state(agent.identity()) == PenState::Free
                    && agent.tile(tile_size) != agent.home()
            });
            if departed {
                self.reference_departed_at = Some(self.frame);
                debug!("Pursuer left home at frame {}", self.frame);
            }
        }

        let mut released = Vec::new();
        for agent in agents.iter_mut() {
            let identity = agent.identity();

            if self.state(identity) == PenState::Held {
                if let Some(departed) = self.reference_departed_at {
                    if self.frame - departed >= release.delay(identity) {
                        self.force(identity, PenState::Exiting);
                    }
                }
            }

            // Captured agents walk back on their own before being led out.
            if self.state(identity) == PenState::Exiting
                && !agent.is_returning()
                && !self.waits_behind_earlier_release(identity, release)
            {
                if walk_out(agent, exit_speed, tile_size) {
                    self.force(identity, PenState::Free);
                    info!("{} released from pen", identity.name());
                    released.push(identity);
                }
            }
        }
        released
    }

    /// Exit walks differ in length, so an agent stays in the pen until every
    /// agent with a shorter delay has left it.
    fn waits_behind_earlier_release(&self, identity: Identity, release: &ReleaseConfig) -> bool {
        let delay = release.delay(identity);
        Identity::ALL
            .into_iter()
            .any(|other| self.awaiting_release[other.index()] && release.delay(other) < delay)
    }
}

/// Line up with the gate column, then climb to the row above the gate.
/// Returns true once the agent is out and snapped onto that tile.
fn walk_out(agent: &mut Agent, speed: f32, tile_size: f32) -> bool {
    let gate = agent.gate();
    let exit = tile_origin(Tile::new(gate.col, gate.row - 1), tile_size);

    let dx = exit.x - agent.position.x;
    if dx != 0.0 {
        let step = dx.signum() * dx.abs().min(speed);
        agent.move_to(agent.position + Vec2::new(step, 0.0));
        return false;
    }

    agent.move_to(agent.position - Vec2::new(0.0, speed));
    if agent.position.y <= exit.y {
        agent.position = exit;
        return true;
    }
    false
}

// ============================================================================
// BEVY SYSTEMS
// ============================================================================

pub fn release_system(
    mut coordinator: ResMut<ReleaseCoordinator>,
    mut agents: Query<&mut Agent>,
    mut released: EventWriter<AgentReleased>,
    config: Res<ChaseConfig>,
) {
    let mut agents = ordered_agents(agents.iter_mut());
    let freed = coordinator.update(
        &mut agents,
        &config.release,
        config.speeds.exit,
        config.grid.tile_size,
    );
    for identity in freed {
        released.write(AgentReleased { identity });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::components::BehaviorMode;
    use crate::core::grid::{Direction, GridMap, MazeGrid};

    const TILE: f32 = 10.0;

    fn agents() -> Vec<Agent> {
        agents_sized(TILE)
    }

    fn agents_sized(tile_size: f32) -> Vec<Agent> {
        let grid = MazeGrid::default_maze();
        let pen = grid.pen_layout().unwrap();
        Identity::ALL
            .map(|identity| Agent::new(identity, pen.home(identity), pen.gate, tile_size))
            .to_vec()
    }

    fn run(
        coordinator: &mut ReleaseCoordinator,
        agents: &mut [Agent],
        delays: &[u32; 4],
        frames: u32,
    ) -> Vec<(u32, Identity)> {
        run_sized(coordinator, agents, delays, frames, TILE)
    }

    fn run_sized(
        coordinator: &mut ReleaseCoordinator,
        agents: &mut [Agent],
        delays: &[u32; 4],
        frames: u32,
        tile_size: f32,
    ) -> Vec<(u32, Identity)> {
        let release = ReleaseConfig { delays: *delays };
        let mut released = Vec::new();
        for _ in 0..frames {
            let mut refs: Vec<&mut Agent> = agents.iter_mut().collect();
            for identity in coordinator.update(&mut refs, &release, 2.0, tile_size) {
                released.push((coordinator.frame(), identity));
            }
        }
        released
    }

    #[test]
    fn nobody_leaves_before_the_pursuer_departs() {
        let mut coordinator = ReleaseCoordinator::default();
        let mut agents = agents();
        assert_eq!(coordinator.state(Identity::Pursuer), PenState::Free);

        assert!(run(&mut coordinator, &mut agents, &[0, 0, 0, 0], 100).is_empty());
        assert_eq!(coordinator.reference_departed_at(), None);
        assert_eq!(coordinator.state(Identity::Ambusher), PenState::Held);
        assert_eq!(coordinator.record(Identity::Ambusher).since_entry, 100);
    }

    #[test]
    fn agents_leave_in_delay_order() {
        let mut coordinator = ReleaseCoordinator::default();
        let mut agents = agents();
        agents[0].position.x -= TILE;

        let released = run(&mut coordinator, &mut agents, &[0, 20, 60, 100], 400);
        let order: Vec<Identity> = released.iter().map(|(_, identity)| *identity).collect();
        assert_eq!(order, vec![Identity::Ambusher, Identity::Flanker, Identity::Interceptor]);
        assert_eq!(coordinator.reference_departed_at(), Some(1));

        // Flanker sits under the gate: 20 px up at 2 px/frame.
        let flanker_free = released[1].0;
        assert_eq!(flanker_free, 1 + 60 + 9);
    }

    #[test]
    fn tightly_spaced_delays_keep_release_order() {
        // The Ambusher's walk is a tile longer than the Flanker's.
        let tile_size = 45.0;
        let mut coordinator = ReleaseCoordinator::default();
        let mut agents = agents_sized(tile_size);
        agents[0].position.x -= tile_size;

        let released = run_sized(&mut coordinator, &mut agents, &[0, 10, 20, 30], 400, tile_size);
        let order: Vec<Identity> = released.iter().map(|(_, identity)| *identity).collect();
        assert_eq!(order, vec![Identity::Ambusher, Identity::Flanker, Identity::Interceptor]);
        assert!(released.windows(2).all(|pair| pair[0].0 < pair[1].0));
    }

    #[test]
    fn shared_delays_wait_only_for_shorter_ones() {
        let tile_size = 45.0;
        let mut coordinator = ReleaseCoordinator::default();
        let mut agents = agents_sized(tile_size);
        agents[0].position.x -= tile_size;

        let released = run_sized(&mut coordinator, &mut agents, &[0, 5, 5, 6], 400, tile_size);
        let order: Vec<Identity> = released.iter().map(|(_, identity)| *identity).collect();
        // Equal delays are unordered, so the Flanker's shorter walk wins.
        assert_eq!(order, vec![Identity::Flanker, Identity::Ambusher, Identity::Interceptor]);
    }

    #[test]
    fn waiting_agent_stays_home_until_the_pen_ahead_clears() {
        let tile_size = 45.0;
        let mut coordinator = ReleaseCoordinator::default();
        let mut agents = agents_sized(tile_size);
        agents[0].position.x -= tile_size;

        // Flanker's delay is up at frame 21; the Ambusher is still walking.
        run_sized(&mut coordinator, &mut agents, &[0, 10, 20, 30], 30, tile_size);
        assert_eq!(coordinator.state(Identity::Ambusher), PenState::Exiting);
        assert_eq!(coordinator.state(Identity::Flanker), PenState::Exiting);
        assert_eq!(agents[2].position, agents[2].home_position(tile_size));
    }

    #[test]
    fn exit_snaps_onto_the_tile_above_the_gate() {
        let mut coordinator = ReleaseCoordinator::default();
        let mut agents = agents();
        agents[0].position.x -= TILE;
        run(&mut coordinator, &mut agents, &[0, 0, 0, 0], 200);

        let grid = MazeGrid::default_maze();
        for agent in &agents[1..] {
            assert_eq!(coordinator.state(agent.identity()), PenState::Free);
            assert_eq!(agent.position, tile_origin(Tile::new(10, 7), TILE));
            assert!(grid.is_walkable(agent.tile(TILE)));
            assert_eq!(agent.facing, Direction::Up);
        }
    }

    #[test]
    fn returning_agents_are_not_walked_out() {
        let mut coordinator = ReleaseCoordinator::default();
        let mut agents = agents();
        agents[1].mode = BehaviorMode::Returning;
        coordinator.force(Identity::Ambusher, PenState::Exiting);
        let before = agents[1].position;

        run(&mut coordinator, &mut agents, &[0, 0, 0, 0], 30);
        assert_eq!(agents[1].position, before);
        assert_eq!(coordinator.state(Identity::Ambusher), PenState::Exiting);
    }

    #[test]
    fn reset_round_clears_the_baseline() {
        let mut coordinator = ReleaseCoordinator::default();
        let mut agents = agents();
        agents[0].position.x -= TILE;
        run(&mut coordinator, &mut agents, &[0, 0, 0, 0], 200);

        coordinator.reset_round();
        assert_eq!(coordinator.reference_departed_at(), None);
        assert_eq!(coordinator.state(Identity::Pursuer), PenState::Free);
        for identity in &Identity::ALL[1..] {
            assert_eq!(coordinator.state(*identity), PenState::Held);
        }
    }
}
