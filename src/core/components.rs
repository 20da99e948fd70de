// src/core/components.rs - Adversary agent component and its state enums
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::grid::{tile_of, tile_origin, Direction, Tile};

// === IDENTITY ===

/// The four fixed adversary roles. Declaration order is release order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Identity {
    Pursuer,
    Ambusher,
    Flanker,
    Interceptor,
}

impl Identity {
    pub const ALL: [Identity; 4] = [
        Identity::Pursuer,
        Identity::Ambusher,
        Identity::Flanker,
        Identity::Interceptor,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The Pursuer never waits in the pen; everyone else is released
    /// relative to its departure.
    pub fn is_reference(self) -> bool {
        self == Identity::Pursuer
    }

    pub fn name(self) -> &'static str {
        match self {
            Identity::Pursuer => "Pursuer",
            Identity::Ambusher => "Ambusher",
            Identity::Flanker => "Flanker",
            Identity::Interceptor => "Interceptor",
        }
    }
}

// === MODES ===

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorMode {
    Pursuit,
    #[default]
    Scatter,
    Vulnerable,
    Returning,
}

impl BehaviorMode {
    /// Pursuit and Scatter follow the shared wave timer.
    pub fn is_wave_driven(self) -> bool {
        matches!(self, BehaviorMode::Pursuit | BehaviorMode::Scatter)
    }
}

/// Whether the agent has been eaten and is still heading home.
/// Kept apart from `BehaviorMode` so rendering never has to infer it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureStatus {
    #[default]
    Intact,
    Captured,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PenState {
    #[default]
    Held,
    Exiting,
    Free,
}

// === AGENT ===

#[derive(Component, Clone, Debug)]
pub struct Agent {
    pub position: Vec2,
    pub facing: Direction,
    pub mode: BehaviorMode,
    pub capture: CaptureStatus,
    identity: Identity,
    home: Tile,
    gate: Tile,
}

impl Agent {
    pub fn new(identity: Identity, home: Tile, gate: Tile, tile_size: f32) -> Self {
        Self {
            position: tile_origin(home, tile_size),
            facing: if identity.is_reference() { Direction::Left } else { Direction::Up },
            mode: BehaviorMode::Scatter,
            capture: CaptureStatus::Intact,
            identity,
            home,
            gate,
        }
    }

    pub fn identity(&self) -> Identity {
        self.identity
    }

    pub fn home(&self) -> Tile {
        self.home
    }

    pub fn gate(&self) -> Tile {
        self.gate
    }

    pub fn tile(&self, tile_size: f32) -> Tile {
        tile_of(self.position, tile_size)
    }

    pub fn center(&self, tile_size: f32) -> Vec2 {
        self.position + Vec2::splat(tile_size / 2.0)
    }

    pub fn home_position(&self, tile_size: f32) -> Vec2 {
        tile_origin(self.home, tile_size)
    }

    pub fn is_vulnerable(&self) -> bool {
        self.mode == BehaviorMode::Vulnerable
    }

    pub fn is_returning(&self) -> bool {
        self.mode == BehaviorMode::Returning
    }

    /// Move to `target`, facing along the displacement when there is one.
    pub fn move_to(&mut self, target: Vec2) {
        if let Some(direction) = Direction::from_motion(target - self.position) {
            self.facing = direction;
        }
        self.position = target;
    }

    /// Back to the home tile with neutral state, for round restarts.
    pub fn reset(&mut self, mode: BehaviorMode, tile_size: f32) {
        self.position = self.home_position(tile_size);
        self.mode = mode;
        self.capture = CaptureStatus::Intact;
        self.facing = if self.identity.is_reference() { Direction::Left } else { Direction::Up };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identities_index_in_release_order() {
        let indices: Vec<usize> = Identity::ALL.iter().map(|i| i.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert!(Identity::Pursuer.is_reference());
        assert!(!Identity::Flanker.is_reference());
    }

    #[test]
    fn move_to_updates_facing_from_dominant_axis() {
        let mut agent = Agent::new(Identity::Ambusher, Tile::new(2, 2), Tile::new(2, 1), 10.0);
        agent.move_to(agent.position + Vec2::new(-1.5, 0.5));
        assert_eq!(agent.facing, Direction::Left);

        agent.move_to(agent.position + Vec2::new(0.0, 2.0));
        assert_eq!(agent.facing, Direction::Down);

        // Standing still keeps the last facing.
        agent.move_to(agent.position);
        assert_eq!(agent.facing, Direction::Down);
    }

    #[test]
    fn reset_returns_to_home_origin() {
        let mut agent = Agent::new(Identity::Flanker, Tile::new(3, 4), Tile::new(3, 3), 45.0);
        agent.position = Vec2::new(400.0, 12.5);
        agent.mode = BehaviorMode::Returning;
        agent.capture = CaptureStatus::Captured;

        agent.reset(BehaviorMode::Pursuit, 45.0);
        assert_eq!(agent.position, Vec2::new(135.0, 180.0));
        assert_eq!(agent.mode, BehaviorMode::Pursuit);
        assert_eq!(agent.capture, CaptureStatus::Intact);
        assert_eq!(agent.tile(45.0), Tile::new(3, 4));
    }
}
