// src/systems/snapshot.rs - Per-frame render view of the chase
use bevy::prelude::*;
use serde::Serialize;

use crate::core::components::{Agent, BehaviorMode, CaptureStatus, Identity, PenState};
use crate::core::config::ChaseConfig;
use crate::core::grid::{Direction, Tile};
use crate::core::pellets::PelletField;
use crate::core::resources::{Player, RoundPhase};
use crate::systems::release::ReleaseCoordinator;
use crate::systems::vulnerability::VulnerabilityController;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentView {
    pub identity: Identity,
    /// Top-left pixel position.
    pub position: [f32; 2],
    pub facing: Direction,
    pub mode: BehaviorMode,
    pub capture: CaptureStatus,
    pub pen: PenState,
}

/// Everything a renderer needs for one frame, refreshed at the end of it.
#[derive(Resource, Clone, Debug, Default, PartialEq, Serialize)]
pub struct ChaseSnapshot {
    pub agents: Vec<AgentView>,
    pub flashing: bool,
    pub score: u32,
    pub lives: u32,
    pub phase: RoundPhase,
    pub pellets_left: usize,
    pub large_pellets: Vec<Tile>,
    pub mystery_tiles: Vec<Tile>,
}

impl ChaseSnapshot {
    pub fn agent(&self, identity: Identity) -> Option<&AgentView> {
        self.agents.iter().find(|view| view.identity == identity)
    }
}

pub fn snapshot_system(
    mut snapshot: ResMut<ChaseSnapshot>,
    agents: Query<&Agent>,
    release: Res<ReleaseCoordinator>,
    vulnerability: Res<VulnerabilityController>,
    player: Res<Player>,
    pellets: Res<PelletField>,
    phase: Res<RoundPhase>,
    config: Res<ChaseConfig>,
) {
    let mut views: Vec<AgentView> = agents
        .iter()
        .map(|agent| AgentView {
            identity: agent.identity(),
            position: agent.position.to_array(),
            facing: agent.facing,
            mode: agent.mode,
            capture: agent.capture,
            pen: release.state(agent.identity()),
        })
        .collect();
    views.sort_by_key(|view| view.identity);

    snapshot.agents = views;
    snapshot.flashing = vulnerability.flashing(&config.vulnerability);
    snapshot.score = player.score;
    snapshot.lives = player.lives;
    snapshot.phase = *phase;
    snapshot.pellets_left = pellets.remaining();
    snapshot.large_pellets = pellets.large_pellets().to_vec();
    snapshot.mystery_tiles = pellets.mystery_tiles().to_vec();
}
