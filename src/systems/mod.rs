// src/systems/mod.rs - Chase behaviour and the Bevy systems that drive it
use bevy::prelude::*;

use crate::core::components::Agent;

pub mod behavior;
pub mod collision;
pub mod movement;
pub mod pathfinding;
pub mod pickups;
pub mod release;
pub mod round;
pub mod snapshot;
pub mod vulnerability;
pub mod waves;

pub use behavior::*;
pub use collision::*;
pub use movement::*;
pub use pathfinding::*;
pub use pickups::*;
pub use release::*;
pub use round::*;
pub use snapshot::*;
pub use vulnerability::*;
pub use waves::*;

/// Agents from a query as plain references, sorted by identity so every
/// system visits them in release order.
pub fn ordered_agents<'a>(agents: impl Iterator<Item = Mut<'a, Agent>>) -> Vec<&'a mut Agent> {
    let mut agents: Vec<&'a mut Agent> = agents.map(Mut::into_inner).collect();
    agents.sort_by_key(|agent| agent.identity());
    agents
}
