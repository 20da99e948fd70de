// src/core/resources.rs - Player contract and round phase
use bevy::prelude::*;
use serde::Serialize;

use crate::core::grid::{tile_of, tile_origin, Direction, Tile};

// === PLAYER ===

/// What the engine reads from (and writes back to) the player collaborator.
/// Input handling and movement integration live outside this crate; they
/// only have to keep `position` and `facing` current.
#[derive(Resource, Clone, Debug)]
pub struct Player {
    pub position: Vec2,
    pub facing: Direction,
    pub score: u32,
    pub lives: u32,
    /// Extra pixels/frame granted by a speed power-up while `speed_bonus_frames > 0`.
    pub speed_bonus: f32,
    pub speed_bonus_frames: u32,
    pub score_cooldown: u32,
    pub speed_cooldown: u32,
    start: Vec2,
}

impl Player {
    pub fn new(start: Tile, tile_size: f32, lives: u32) -> Self {
        let start = tile_origin(start, tile_size);
        Self {
            position: start,
            facing: Direction::Right,
            score: 0,
            lives,
            speed_bonus: 0.0,
            speed_bonus_frames: 0,
            score_cooldown: 0,
            speed_cooldown: 0,
            start,
        }
    }

    pub fn tile(&self, tile_size: f32) -> Tile {
        tile_of(self.position, tile_size)
    }

    pub fn center(&self, tile_size: f32) -> Vec2 {
        self.position + Vec2::splat(tile_size / 2.0)
    }

    pub fn start_position(&self) -> Vec2 {
        self.start
    }

    /// Back to the spawn tile after a death.
    pub fn respawn(&mut self) {
        self.position = self.start;
        self.facing = Direction::Right;
    }

    pub fn tick_cooldowns(&mut self) {
        if self.speed_bonus_frames > 0 {
            self.speed_bonus_frames -= 1;
            if self.speed_bonus_frames == 0 {
                self.speed_bonus = 0.0;
            }
        }
        self.score_cooldown = self.score_cooldown.saturating_sub(1);
        self.speed_cooldown = self.speed_cooldown.saturating_sub(1);
    }

    /// Fresh game: spawn, full lives, zero score, no power-ups.
    pub fn reset(&mut self, lives: u32) {
        self.respawn();
        self.score = 0;
        self.lives = lives;
        self.speed_bonus = 0.0;
        self.speed_bonus_frames = 0;
        self.score_cooldown = 0;
        self.speed_cooldown = 0;
    }
}

// === ROUND PHASE ===

#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum RoundPhase {
    #[default]
    Playing,
    /// Death animation owned by the renderer; agents freeze until it ends.
    Dying { frames_left: u32 },
    GameOver,
}

impl RoundPhase {
    pub fn is_playing(&self) -> bool {
        *self == RoundPhase::Playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_bonus_expires_with_its_timer() {
        let mut player = Player::new(Tile::new(1, 1), 10.0, 3);
        player.speed_bonus = 1.5;
        player.speed_bonus_frames = 2;
        player.score_cooldown = 1;

        player.tick_cooldowns();
        assert_eq!(player.speed_bonus, 1.5);
        assert_eq!(player.score_cooldown, 0);

        player.tick_cooldowns();
        assert_eq!(player.speed_bonus, 0.0);
        assert_eq!(player.speed_bonus_frames, 0);
    }

    #[test]
    fn respawn_goes_back_to_start() {
        let mut player = Player::new(Tile::new(2, 3), 10.0, 3);
        player.position = Vec2::new(77.0, 5.0);
        player.facing = Direction::Up;
        player.score = 40;

        player.respawn();
        assert_eq!(player.position, Vec2::new(20.0, 30.0));
        assert_eq!(player.facing, Direction::Right);
        assert_eq!(player.score, 40);
    }
}
