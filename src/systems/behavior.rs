// src/systems/behavior.rs - Per-identity targeting strategies
use bevy::prelude::*;

use crate::core::components::{BehaviorMode, Identity};
use crate::core::grid::{Direction, GridMap, Tile};

// ============================================================================
// SCATTER CORNERS
// ============================================================================

/// Each identity's scatter tile, computed once per maze.
#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScatterTargets {
    corners: [Tile; 4],
}

impl ScatterTargets {
    pub fn from_grid(grid: &impl GridMap) -> Self {
        Self {
            corners: Identity::ALL.map(|identity| scatter_corner(grid, identity)),
        }
    }

    pub fn get(&self, identity: Identity) -> Tile {
        self.corners[identity.index()]
    }
}

/// First walkable tile found scanning inward from the identity's corner.
fn scatter_corner(grid: &impl GridMap, identity: Identity) -> Tile {
    let (cols, rows) = (grid.cols(), grid.rows());
    // (scan rows bottom-up, scan cols right-to-left, fallback)
    let (bottom_up, right_to_left, fallback) = match identity {
        Identity::Pursuer => (false, true, Tile::new(cols - 2, 1)),
        Identity::Ambusher => (false, false, Tile::new(1, 1)),
        Identity::Flanker => (true, false, Tile::new(1, rows - 2)),
        Identity::Interceptor => (true, true, Tile::new(cols - 2, rows - 2)),
    };

    for r in 0..rows {
        let row = if bottom_up { rows - 1 - r } else { r };
        for c in 0..cols {
            let col = if right_to_left { cols - 1 - c } else { c };
            let tile = Tile::new(col, row);
            if grid.is_walkable(tile) {
                return tile;
            }
        }
    }
    fallback
}

// ============================================================================
// STRATEGIES
// ============================================================================

/// Everything a strategy may look at when choosing where to go.
#[derive(Clone, Copy, Debug)]
pub struct TargetContext {
    pub mode: BehaviorMode,
    pub own_tile: Tile,
    pub scatter: Tile,
    pub player_tile: Tile,
    pub player_facing: Direction,
    pub player_center: Vec2,
    /// Live centre of the Pursuer; only the Interceptor reads it.
    pub pursuer_center: Vec2,
    pub cols: i32,
    pub rows: i32,
    pub tile_size: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BehaviorStrategy {
    Pursuer,
    Ambusher,
    Flanker,
    Interceptor,
}

impl From<Identity> for BehaviorStrategy {
    fn from(identity: Identity) -> Self {
        match identity {
            Identity::Pursuer => BehaviorStrategy::Pursuer,
            Identity::Ambusher => BehaviorStrategy::Ambusher,
            Identity::Flanker => BehaviorStrategy::Flanker,
            Identity::Interceptor => BehaviorStrategy::Interceptor,
        }
    }
}

impl BehaviorStrategy {
    const AMBUSH_LEAD: i32 = 4;
    const FLANK_LEAD: i32 = 2;
    const FLANK_BACKOFF: i32 = 3;

    /// Target for Pursuit and Scatter. Vulnerable and Returning agents are
    /// steered elsewhere, so they get `None`.
    pub fn target_tile(self, ctx: &TargetContext) -> Option<Tile> {
        match ctx.mode {
            BehaviorMode::Scatter => Some(ctx.scatter),
            BehaviorMode::Pursuit => Some(self.pursuit_target(ctx)),
            BehaviorMode::Vulnerable | BehaviorMode::Returning => None,
        }
    }

    fn pursuit_target(self, ctx: &TargetContext) -> Tile {
        match self {
            BehaviorStrategy::Pursuer => ctx.player_tile,
            BehaviorStrategy::Ambusher => ctx.player_tile.offset(ctx.player_facing, Self::AMBUSH_LEAD),
            BehaviorStrategy::Flanker => {
                let ahead = ctx.player_tile.offset(ctx.player_facing, Self::FLANK_LEAD);
                if ctx.own_tile.manhattan(ahead) <= Self::FLANK_BACKOFF {
                    ctx.scatter
                } else {
                    ahead
                }
            }
            BehaviorStrategy::Interceptor => far_side_target(ctx),
        }
    }
}

/// Extend the Pursuer-to-player ray past the player until it meets the maze
/// boundary, and aim for the tile there.
fn far_side_target(ctx: &TargetContext) -> Tile {
    let ray = ctx.player_center - ctx.pursuer_center;
    if ray == Vec2::ZERO {
        return ctx.player_tile;
    }

    let bounds = Vec2::new(ctx.cols as f32, ctx.rows as f32) * ctx.tile_size;
    let reach = |origin: f32, along: f32, limit: f32| {
        if along > 0.0 {
            (limit - origin) / along
        } else if along < 0.0 {
            origin / -along
        } else {
            f32::INFINITY
        }
    };
    let scale = reach(ctx.player_center.x, ray.x, bounds.x).min(reach(ctx.player_center.y, ray.y, bounds.y));
    let hit = ctx.player_center + ray * scale;

    Tile::new(
        ((hit.x / ctx.tile_size).floor() as i32).clamp(0, (ctx.cols - 1).max(0)),
        ((hit.y / ctx.tile_size).floor() as i32).clamp(0, (ctx.rows - 1).max(0)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::{tile_center, MazeGrid};

    fn context(mode: BehaviorMode) -> TargetContext {
        TargetContext {
            mode,
            own_tile: Tile::new(1, 1),
            scatter: Tile::new(19, 19),
            player_tile: Tile::new(10, 10),
            player_facing: Direction::Right,
            player_center: tile_center(Tile::new(10, 10), 10.0),
            pursuer_center: tile_center(Tile::new(10, 10), 10.0),
            cols: 21,
            rows: 21,
            tile_size: 10.0,
        }
    }

    #[test]
    fn scatter_corners_scan_from_each_corner() {
        let grid = MazeGrid::default_maze();
        let targets = ScatterTargets::from_grid(&grid);
        assert_eq!(targets.get(Identity::Pursuer), Tile::new(19, 1));
        assert_eq!(targets.get(Identity::Ambusher), Tile::new(1, 1));
        assert_eq!(targets.get(Identity::Flanker), Tile::new(1, 19));
        assert_eq!(targets.get(Identity::Interceptor), Tile::new(19, 19));
    }

    #[test]
    fn solid_maze_uses_fallback_corners() {
        let grid = MazeGrid::parse(&["#####", "#####", "#####", "#####"]).unwrap();
        let targets = ScatterTargets::from_grid(&grid);
        assert_eq!(targets.get(Identity::Pursuer), Tile::new(3, 1));
        assert_eq!(targets.get(Identity::Flanker), Tile::new(1, 2));
        assert_eq!(targets.get(Identity::Interceptor), Tile::new(3, 2));
    }

    #[test]
    fn only_wave_modes_have_strategy_targets() {
        let ctx = context(BehaviorMode::Scatter);
        assert_eq!(BehaviorStrategy::Ambusher.target_tile(&ctx), Some(Tile::new(19, 19)));
        for mode in [BehaviorMode::Vulnerable, BehaviorMode::Returning] {
            assert_eq!(BehaviorStrategy::Pursuer.target_tile(&context(mode)), None);
        }
    }

    #[test]
    fn pursuit_targets_lead_the_player() {
        let ctx = context(BehaviorMode::Pursuit);
        assert_eq!(BehaviorStrategy::Pursuer.target_tile(&ctx), Some(Tile::new(10, 10)));
        assert_eq!(BehaviorStrategy::Ambusher.target_tile(&ctx), Some(Tile::new(14, 10)));
        assert_eq!(BehaviorStrategy::Flanker.target_tile(&ctx), Some(Tile::new(12, 10)));
    }

    #[test]
    fn flanker_backs_off_when_close() {
        let mut ctx = context(BehaviorMode::Pursuit);
        ctx.own_tile = Tile::new(13, 11);
        assert_eq!(BehaviorStrategy::Flanker.target_tile(&ctx), Some(ctx.scatter));

        ctx.own_tile = Tile::new(14, 12);
        assert_eq!(BehaviorStrategy::Flanker.target_tile(&ctx), Some(Tile::new(12, 10)));
    }

    #[test]
    fn interceptor_aims_past_the_player() {
        let mut ctx = context(BehaviorMode::Pursuit);
        // Coincident centres: fall back to the player tile.
        assert_eq!(BehaviorStrategy::Interceptor.target_tile(&ctx), Some(Tile::new(10, 10)));

        // Pursuer directly left of the player: ray runs out the right edge.
        ctx.pursuer_center = tile_center(Tile::new(5, 10), 10.0);
        assert_eq!(BehaviorStrategy::Interceptor.target_tile(&ctx), Some(Tile::new(20, 10)));

        // Pursuer up and left: ray leaves through the bottom-right corner.
        ctx.pursuer_center = tile_center(Tile::new(5, 5), 10.0);
        assert_eq!(BehaviorStrategy::Interceptor.target_tile(&ctx), Some(Tile::new(20, 20)));

        // Pursuer below: ray exits the top row.
        ctx.pursuer_center = tile_center(Tile::new(10, 15), 10.0);
        assert_eq!(BehaviorStrategy::Interceptor.target_tile(&ctx), Some(Tile::new(10, 0)));
    }
}
