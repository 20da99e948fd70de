// src/systems/pathfinding.rs - Tile BFS pathfinding and return-to-pen routes
use std::collections::VecDeque;

use bevy::prelude::*;

use crate::core::components::Identity;
use crate::core::grid::{tile_origin, GridMap, Tile};

// ============================================================================
// PASSABILITY
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Passage {
    /// Ordinary movement: pen and gate are walls.
    Maze,
    /// Captured agents heading home may cross into the pen.
    IncludingPen,
}

pub fn is_passable(grid: &impl GridMap, tile: Tile, passage: Passage) -> bool {
    if !grid.in_bounds(tile) {
        return false;
    }
    match passage {
        Passage::Maze => !grid.is_wall(tile.col, tile.row),
        Passage::IncludingPen => {
            !grid.is_wall(tile.col, tile.row) || grid.is_pen(tile.col, tile.row)
        }
    }
}

// ============================================================================
// BFS
// ============================================================================

enum Search {
    Found(usize),
    Exhausted,
}

/// Breadth-first search over the 4-connected grid. Scratch buffers are kept
/// between calls so a frame's worth of queries allocates nothing once warm.
#[derive(Resource, Default)]
pub struct TilePathfinder {
    cols: i32,
    visited: Vec<bool>,
    parents: Vec<Option<usize>>,
    discovered: Vec<usize>,
    queue: VecDeque<usize>,
}

impl TilePathfinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// First tile to step onto on the way from `from` toward `to`.
    ///
    /// The target is clamped into the grid. When it cannot be reached the
    /// agent heads for the visited tile closest to it by Manhattan distance
    /// (earliest discovered wins ties); with nothing visited it takes the
    /// first walkable neighbour, and if boxed in it stays on `from`.
    pub fn next_step_toward(&mut self, grid: &impl GridMap, from: Tile, to: Tile) -> Tile {
        let to = grid.clamp(to);
        if from == to {
            return from;
        }

        match self.search(grid, from, to, Passage::Maze) {
            Search::Found(goal) => self.first_step(from, goal),
            Search::Exhausted => {
                let start = self.index(from);
                let closest = self
                    .discovered
                    .iter()
                    .copied()
                    .filter(|index| Some(*index) != start)
                    .min_by_key(|index| self.tile(*index).manhattan(to));

                if let Some(closest) = closest {
                    debug!("Target {:?} unreachable from {:?}; heading for {:?}", to, from, self.tile(closest));
                    return self.first_step(from, closest);
                }

                from.neighbors()
                    .into_iter()
                    .find(|tile| grid.is_walkable(*tile))
                    .unwrap_or(from)
            }
        }
    }

    /// Full shortest route `from..=to`, or `None` when `to` is unreachable.
    pub fn route(
        &mut self,
        grid: &impl GridMap,
        from: Tile,
        to: Tile,
        passage: Passage,
    ) -> Option<Vec<Tile>> {
        if from == to {
            return Some(vec![from]);
        }

        let Search::Found(goal) = self.search(grid, from, to, passage) else {
            return None;
        };
        let start = self.index(from)?;

        let mut path = Vec::new();
        let mut current = goal;
        for _ in 0..self.parents.len() {
            path.push(self.tile(current));
            match self.parents[current] {
                Some(parent) if parent == start => {
                    path.push(from);
                    path.reverse();
                    return Some(path);
                }
                Some(parent) => current = parent,
                None => break,
            }
        }

        error!("Malformed parent chain while routing {:?} -> {:?}", from, to);
        None
    }

    fn search(&mut self, grid: &impl GridMap, from: Tile, to: Tile, passage: Passage) -> Search {
        self.reset(grid);
        let Some(start) = self.index(from) else {
            return Search::Exhausted;
        };
        let Some(goal) = self.index(to) else {
            return Search::Exhausted;
        };

        self.visited[start] = true;
        self.discovered.push(start);
        self.queue.push_back(start);

        while let Some(current) = self.queue.pop_front() {
            if current == goal {
                return Search::Found(goal);
            }

            for next in self.tile(current).neighbors() {
                if !is_passable(grid, next, passage) {
                    continue;
                }
                let Some(index) = self.index(next) else { continue };
                if self.visited[index] {
                    continue;
                }
                self.visited[index] = true;
                self.parents[index] = Some(current);
                self.discovered.push(index);
                self.queue.push_back(index);
            }
        }

        Search::Exhausted
    }

    /// Walk the parent chain back from `goal` to the tile adjacent to `from`.
    fn first_step(&self, from: Tile, goal: usize) -> Tile {
        let Some(start) = self.index(from) else {
            return from;
        };

        let mut current = goal;
        for _ in 0..self.parents.len() {
            match self.parents[current] {
                Some(parent) if parent == start => return self.tile(current),
                Some(parent) => current = parent,
                None => break,
            }
        }

        error!("Malformed parent chain from {:?}; staying put", from);
        from
    }

    fn reset(&mut self, grid: &impl GridMap) {
        let cells = (grid.cols().max(0) * grid.rows().max(0)) as usize;
        self.cols = grid.cols();
        self.visited.clear();
        self.visited.resize(cells, false);
        self.parents.clear();
        self.parents.resize(cells, None);
        self.discovered.clear();
        self.queue.clear();
    }

    fn index(&self, tile: Tile) -> Option<usize> {
        if tile.col < 0 || tile.row < 0 || tile.col >= self.cols {
            return None;
        }
        let index = (tile.row * self.cols + tile.col) as usize;
        (index < self.visited.len()).then_some(index)
    }

    fn tile(&self, index: usize) -> Tile {
        Tile::new(index as i32 % self.cols, index as i32 / self.cols)
    }
}

// ============================================================================
// MOTION
// ============================================================================

/// Advance `position` toward `tile` by `speed` pixels, landing exactly on the
/// tile once it is within one step.
pub fn step_toward(position: Vec2, tile: Tile, speed: f32, tile_size: f32) -> Vec2 {
    let goal = tile_origin(tile, tile_size);
    let delta = goal - position;
    let distance = delta.length();
    if distance <= speed {
        goal
    } else {
        position + delta / distance * speed
    }
}

// ============================================================================
// RETURN ROUTES
// ============================================================================

#[derive(Clone, Debug)]
struct ReturnRoute {
    tiles: Vec<Tile>,
    cursor: usize,
}

/// Routes from a capture point back to the pen gate, one per identity.
#[derive(Resource, Default, Debug)]
pub struct ReturnPathCache {
    routes: [Option<ReturnRoute>; 4],
}

impl ReturnPathCache {
    pub fn has_route(&self, identity: Identity) -> bool {
        self.routes[identity.index()].is_some()
    }

    pub fn store(&mut self, identity: Identity, tiles: Vec<Tile>) {
        self.routes[identity.index()] = Some(ReturnRoute { tiles, cursor: 0 });
    }

    /// Next tile still ahead of `position`, skipping those already reached.
    pub fn next_waypoint(&mut self, identity: Identity, position: Vec2, tile_size: f32) -> Option<Tile> {
        let route = self.routes[identity.index()].as_mut()?;
        while let Some(tile) = route.tiles.get(route.cursor).copied() {
            if tile_origin(tile, tile_size) != position {
                return Some(tile);
            }
            route.cursor += 1;
        }
        None
    }

    pub fn clear(&mut self, identity: Identity) {
        self.routes[identity.index()] = None;
    }

    pub fn clear_all(&mut self) {
        self.routes = Default::default();
    }
}
