// src/core/grid.rs - Maze grid, tile coordinates and the GridMap contract
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::components::Identity;

// ============================================================================
// TILES & DIRECTIONS
// ============================================================================

/// One grid cell, addressed by integer column and row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub col: i32,
    pub row: i32,
}

impl Tile {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub fn manhattan(self, other: Tile) -> i32 {
        (self.col - other.col).abs() + (self.row - other.row).abs()
    }

    pub fn offset(self, direction: Direction, steps: i32) -> Tile {
        let (dc, dr) = direction.delta();
        Tile::new(self.col + dc * steps, self.row + dr * steps)
    }

    /// 4-neighbours in search order: up, down, left, right.
    pub fn neighbors(self) -> [Tile; 4] {
        Direction::SEARCH_ORDER.map(|d| self.offset(d, 1))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    #[default]
    Right,
    Up,
    Down,
}

impl Direction {
    pub const SEARCH_ORDER: [Direction; 4] =
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn reversed(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// (column, row) offset; rows grow downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }

    /// Dominant axis of a displacement, `None` when it is zero.
    pub fn from_motion(delta: Vec2) -> Option<Direction> {
        if delta.x == 0.0 && delta.y == 0.0 {
            return None;
        }
        if delta.x.abs() >= delta.y.abs() {
            Some(if delta.x < 0.0 { Direction::Left } else { Direction::Right })
        } else {
            Some(if delta.y < 0.0 { Direction::Up } else { Direction::Down })
        }
    }
}

// Pixel positions are the top-left corner of a tile-sized box.

pub fn tile_of(position: Vec2, tile_size: f32) -> Tile {
    let half = tile_size / 2.0;
    Tile::new(
        ((position.x + half) / tile_size).floor() as i32,
        ((position.y + half) / tile_size).floor() as i32,
    )
}

pub fn tile_origin(tile: Tile, tile_size: f32) -> Vec2 {
    Vec2::new(tile.col as f32 * tile_size, tile.row as f32 * tile_size)
}

pub fn tile_center(tile: Tile, tile_size: f32) -> Vec2 {
    tile_origin(tile, tile_size) + Vec2::splat(tile_size / 2.0)
}

// ============================================================================
// GRID CONTRACT
// ============================================================================

/// Static maze boundary queries consumed by the adversary engine.
pub trait GridMap {
    fn is_wall(&self, col: i32, row: i32) -> bool;
    fn rows(&self) -> i32;
    fn cols(&self) -> i32;
    fn clear_large_pellet_at(&mut self, col: i32, row: i32);

    /// Pen interior and gate: walls for ordinary movement, open for agents
    /// routing back into the pen.
    fn is_pen(&self, _col: i32, _row: i32) -> bool {
        false
    }

    fn in_bounds(&self, tile: Tile) -> bool {
        tile.col >= 0 && tile.row >= 0 && tile.col < self.cols() && tile.row < self.rows()
    }

    fn clamp(&self, tile: Tile) -> Tile {
        Tile::new(
            tile.col.clamp(0, (self.cols() - 1).max(0)),
            tile.row.clamp(0, (self.rows() - 1).max(0)),
        )
    }

    fn is_walkable(&self, tile: Tile) -> bool {
        self.in_bounds(tile) && !self.is_wall(tile.col, tile.row)
    }
}

// ============================================================================
// MAZE GRID
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Wall,
    Floor,
    Pellet,
    LargePellet,
    Mystery,
    PenGate,
    PenInterior,
}

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("layout has no rows")]
    Empty,
    #[error("row {row} has {actual} cells, expected {expected}")]
    Ragged { row: usize, expected: usize, actual: usize },
    #[error("unknown cell '{glyph}' at column {col}, row {row}")]
    UnknownCell { glyph: char, col: usize, row: usize },
    #[error("layout has no pen gate ('=')")]
    MissingGate,
    #[error("layout has more than one pen gate")]
    DuplicateGate,
    #[error("layout has no home marker for {0:?}")]
    MissingHome(Identity),
    #[error("layout has more than one home marker for {0:?}")]
    DuplicateHome(Identity),
    #[error("pen gate at {0:?} has no open tile above it")]
    BlockedGate(Tile),
}

/// Pen gate plus the four agents' home tiles, indexed by identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PenLayout {
    pub gate: Tile,
    pub homes: [Tile; 4],
}

impl PenLayout {
    pub fn home(&self, identity: Identity) -> Tile {
        self.homes[identity.index()]
    }
}

/// Built-in 21x21 maze.
///
/// `#` wall, `.` pellet, `O` large pellet, `?` mystery tile, `P` player
/// start, ` ` floor, `=` pen gate, `G` pen interior, `0` Pursuer start and
/// `1`/`2`/`3` the Ambusher/Flanker/Interceptor pen slots.
pub const DEFAULT_LAYOUT: [&str; 21] = [
    "#####################",
    "#O.......?#........O#",
    "#.###.###.#.###.###.#",
    "#...................#",
    "#.###.#.#####.#.###.#",
    "#.....#...#...#.....#",
    "#####.#.#####.#.#####",
    "#####.#   0   #.#####",
    "#####.# ##=## #.#####",
    "#.....  #123#  .....#",
    "#####.# ##### #.#####",
    "#####.#   ?   #.#####",
    "#####.#.#####.#.#####",
    "#.........#.........#",
    "#.###.###.#.###.###.#",
    "#O..#.....P.....#..O#",
    "###.#.#.#####.#.#.###",
    "#.....#...#...#.....#",
    "#.#######.#.#######.#",
    "#...?...............#",
    "#####################",
];

#[derive(Resource, Clone, Debug)]
pub struct MazeGrid {
    cols: i32,
    rows: i32,
    cells: Vec<Cell>,
    original: Vec<Cell>,
    player_start: Option<Tile>,
    gates: Vec<Tile>,
    homes: [Vec<Tile>; 4],
}

impl MazeGrid {
    pub fn parse<S: AsRef<str>>(layout: &[S]) -> Result<Self, LayoutError> {
        let first = layout.first().ok_or(LayoutError::Empty)?;
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err(LayoutError::Empty);
        }

        let mut cells = Vec::with_capacity(width * layout.len());
        let mut player_start = None;
        let mut gates = Vec::new();
        let mut homes: [Vec<Tile>; 4] = Default::default();

        for (row, line) in layout.iter().enumerate() {
            let line = line.as_ref();
            let actual = line.chars().count();
            if actual != width {
                return Err(LayoutError::Ragged { row, expected: width, actual });
            }

            for (col, glyph) in line.chars().enumerate() {
                let tile = Tile::new(col as i32, row as i32);
                let cell = match glyph {
                    '#' => Cell::Wall,
                    ' ' => Cell::Floor,
                    '.' => Cell::Pellet,
                    'O' => Cell::LargePellet,
                    '?' => Cell::Mystery,
                    'G' => Cell::PenInterior,
                    'P' => {
                        player_start = Some(tile);
                        Cell::Floor
                    }
                    '=' => {
                        gates.push(tile);
                        Cell::PenGate
                    }
                    '0' => {
                        homes[0].push(tile);
                        Cell::Floor
                    }
                    '1' | '2' | '3' => {
                        let index = glyph as usize - '0' as usize;
                        homes[index].push(tile);
                        Cell::PenInterior
                    }
                    _ => return Err(LayoutError::UnknownCell { glyph, col, row }),
                };
                cells.push(cell);
            }
        }

        Ok(Self {
            cols: width as i32,
            rows: layout.len() as i32,
            original: cells.clone(),
            cells,
            player_start,
            gates,
            homes,
        })
    }

    pub fn default_maze() -> Self {
        // Checked by default_maze_parses_with_full_pen.
        Self::parse(&DEFAULT_LAYOUT).unwrap_or_else(|e| panic!("built-in maze is invalid: {e}"))
    }

    pub fn cell(&self, tile: Tile) -> Cell {
        if self.in_bounds(tile) {
            self.cells[self.index(tile)]
        } else {
            Cell::Wall
        }
    }

    /// Tiles whose cell currently matches `kind`, in row-major order.
    pub fn tiles_with(&self, kind: Cell) -> impl Iterator<Item = Tile> + '_ {
        self.cells.iter().enumerate().filter(move |(_, c)| **c == kind).map(|(i, _)| {
            Tile::new(i as i32 % self.cols, i as i32 / self.cols)
        })
    }

    /// Player spawn; layouts without a `P` fall back to the bottom middle.
    pub fn player_start(&self) -> Tile {
        self.player_start
            .unwrap_or(Tile::new(self.cols / 2, (self.rows - 2).max(0)))
    }

    pub fn pen_layout(&self) -> Result<PenLayout, LayoutError> {
        let gate = match self.gates.as_slice() {
            [] => return Err(LayoutError::MissingGate),
            [gate] => *gate,
            _ => return Err(LayoutError::DuplicateGate),
        };

        let mut homes = [Tile::default(); 4];
        for identity in Identity::ALL {
            homes[identity.index()] = match self.homes[identity.index()].as_slice() {
                [] => return Err(LayoutError::MissingHome(identity)),
                [home] => *home,
                _ => return Err(LayoutError::DuplicateHome(identity)),
            };
        }

        // Released agents step out onto the tile directly above the gate.
        if !self.is_walkable(Tile::new(gate.col, gate.row - 1)) {
            return Err(LayoutError::BlockedGate(gate));
        }

        Ok(PenLayout { gate, homes })
    }

    /// Bring every cell back to the layout as first parsed.
    pub fn restore(&mut self) {
        self.cells.copy_from_slice(&self.original);
    }

    fn index(&self, tile: Tile) -> usize {
        (tile.row * self.cols + tile.col) as usize
    }
}

impl GridMap for MazeGrid {
    fn is_wall(&self, col: i32, row: i32) -> bool {
        matches!(
            self.cell(Tile::new(col, row)),
            Cell::Wall | Cell::PenGate | Cell::PenInterior
        )
    }

    fn is_pen(&self, col: i32, row: i32) -> bool {
        matches!(self.cell(Tile::new(col, row)), Cell::PenGate | Cell::PenInterior)
    }

    fn rows(&self) -> i32 {
        self.rows
    }

    fn cols(&self) -> i32 {
        self.cols
    }

    fn clear_large_pellet_at(&mut self, col: i32, row: i32) {
        let tile = Tile::new(col, row);
        if self.cell(tile) == Cell::LargePellet {
            let index = self.index(tile);
            self.cells[index] = Cell::Floor;
        }
    }
}
