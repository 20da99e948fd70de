// src/core/events.rs - Gameplay events emitted by the chase systems
use bevy::prelude::*;

use crate::core::components::Identity;
use crate::core::grid::Tile;
use crate::core::pellets::PowerUpKind;

/// A large pellet was eaten this frame; starts or refreshes the vulnerability window.
#[derive(Event, Debug, Clone, Copy)]
pub struct PowerPelletEaten {
    pub tile: Tile,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct MysteryPowerUpCollected {
    pub tile: Tile,
    pub kind: PowerUpKind,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct AgentCaptured {
    pub identity: Identity,
    pub reward: u32,
}

/// An agent finished walking out of the pen.
#[derive(Event, Debug, Clone, Copy)]
pub struct AgentReleased {
    pub identity: Identity,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerCaught {
    pub by: Identity,
    pub lives_left: u32,
}

/// Agents and player are back at their starting tiles after a death.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct RoundReset;

#[derive(Event, Debug, Clone, Copy)]
pub struct GameOver {
    pub final_score: u32,
}

/// Request a complete restart: maze, pellets, score, lives and waves.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct ResetGameRequested;
