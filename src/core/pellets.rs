// src/core/pellets.rs - Pellet field and mystery power-ups
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use bevy::prelude::*;

use crate::core::config::{Difficulty, MysteryConfig};
use crate::core::grid::{Cell, GridMap, MazeGrid, Tile};
use crate::core::resources::Player;

/// Everything the player can eat, keyed by tile.
#[derive(Resource, Clone, Debug, Default)]
pub struct PelletField {
    pellets: HashSet<Tile>,
    large: Vec<Tile>,
    mystery: Vec<Tile>,
}

/// What the player's current tile held this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Consumed {
    pub pellet: bool,
    pub large_pellet: bool,
    pub mystery: bool,
}

impl PelletField {
    /// Hard difficulty trades power pellets for plain ones.
    pub fn from_grid(grid: &MazeGrid, difficulty: Difficulty) -> Self {
        let mut pellets: HashSet<Tile> = grid.tiles_with(Cell::Pellet).collect();
        let mut large: Vec<Tile> = grid.tiles_with(Cell::LargePellet).collect();
        if difficulty == Difficulty::Hard {
            pellets.extend(large.drain(..));
        }

        Self {
            pellets,
            large,
            mystery: grid.tiles_with(Cell::Mystery).collect(),
        }
    }

    pub fn contains(&self, tile: Tile) -> bool {
        self.pellets.contains(&tile)
    }

    pub fn remaining(&self) -> usize {
        self.pellets.len()
    }

    pub fn large_pellets(&self) -> &[Tile] {
        &self.large
    }

    pub fn mystery_tiles(&self) -> &[Tile] {
        &self.mystery
    }

    /// Remove whatever sits on `tile`, clearing the grid cell for large pellets.
    pub fn consume_at(&mut self, tile: Tile, grid: &mut impl GridMap) -> Consumed {
        let pellet = self.pellets.remove(&tile);

        let large_pellet = take_tile(&mut self.large, tile);
        if large_pellet {
            grid.clear_large_pellet_at(tile.col, tile.row);
        }

        Consumed {
            pellet,
            large_pellet,
            mystery: take_tile(&mut self.mystery, tile),
        }
    }
}

fn take_tile(tiles: &mut Vec<Tile>, tile: Tile) -> bool {
    match tiles.iter().position(|t| *t == tile) {
        Some(index) => {
            tiles.swap_remove(index);
            true
        }
        None => false,
    }
}

// ============================================================================
// MYSTERY POWER-UPS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerUpKind {
    ExtraLife,
    ScoreBonus,
    SpeedBoost,
}

impl PowerUpKind {
    fn priority(self) -> u8 {
        match self {
            PowerUpKind::ExtraLife => 3,
            PowerUpKind::ScoreBonus => 2,
            PowerUpKind::SpeedBoost => 1,
        }
    }
}

impl Ord for PowerUpKind {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority().cmp(&other.priority())
    }
}

impl PartialOrd for PowerUpKind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pick the highest-priority power-up the player is eligible for and apply
/// it. Returns `None` when every candidate is on cooldown.
pub fn apply_mystery_power_up(player: &mut Player, rules: &MysteryConfig) -> Option<PowerUpKind> {
    let mut candidates = BinaryHeap::new();
    if player.lives < rules.max_lives {
        candidates.push(PowerUpKind::ExtraLife);
    }
    if player.lives >= rules.max_lives && player.score_cooldown == 0 {
        candidates.push(PowerUpKind::ScoreBonus);
    }
    if player.lives >= rules.max_lives && player.score_cooldown > 0 && player.speed_cooldown == 0 {
        candidates.push(PowerUpKind::SpeedBoost);
    }

    let chosen = candidates.pop()?;
    match chosen {
        PowerUpKind::ExtraLife => player.lives += 1,
        PowerUpKind::ScoreBonus => {
            player.score += rules.score_bonus;
            player.score_cooldown = rules.score_cooldown;
        }
        PowerUpKind::SpeedBoost => {
            player.speed_bonus = rules.speed_bonus;
            player.speed_bonus_frames = rules.speed_frames;
            player.speed_cooldown = rules.speed_cooldown;
        }
    }
    Some(chosen)
}
