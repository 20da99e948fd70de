// tests/pathfinding.rs - BFS properties over the built-in maze
use mazechase::{GridMap, MazeGrid, Passage, Tile, TilePathfinder};

fn walkable_tiles(grid: &MazeGrid) -> Vec<Tile> {
    (0..grid.rows())
        .flat_map(|row| (0..grid.cols()).map(move |col| Tile::new(col, row)))
        .filter(|tile| grid.is_walkable(*tile))
        .collect()
}

fn distance(pathfinder: &mut TilePathfinder, grid: &MazeGrid, from: Tile, to: Tile) -> usize {
    pathfinder
        .route(grid, from, to, Passage::Maze)
        .map(|route| route.len() - 1)
        .unwrap()
}

#[test]
fn every_first_step_lies_on_a_shortest_path() {
    let grid = MazeGrid::default_maze();
    let tiles = walkable_tiles(&grid);
    let mut pathfinder = TilePathfinder::new();

    // Every start against a spread of targets keeps the run short.
    let targets: Vec<Tile> = tiles.iter().step_by(7).copied().collect();
    for &from in &tiles {
        for &to in &targets {
            if from == to {
                continue;
            }
            let step = pathfinder.next_step_toward(&grid, from, to);
            assert!(grid.is_walkable(step), "{from:?} -> {to:?} stepped into a wall at {step:?}");
            assert_eq!(from.manhattan(step), 1, "{from:?} -> {to:?} jumped to {step:?}");
            assert_eq!(
                distance(&mut pathfinder, &grid, step, to) + 1,
                distance(&mut pathfinder, &grid, from, to),
                "{from:?} -> {to:?} via {step:?} is not shortest"
            );
        }
    }
}

#[test]
fn wall_and_pen_targets_still_yield_a_walkable_neighbour() {
    let grid = MazeGrid::default_maze();
    let mut pathfinder = TilePathfinder::new();
    let unreachable = [Tile::new(0, 0), Tile::new(10, 9), Tile::new(10, 8), Tile::new(40, -3)];

    for from in walkable_tiles(&grid) {
        for to in unreachable {
            let step = pathfinder.next_step_toward(&grid, from, to);
            assert!(grid.is_walkable(step), "{from:?} -> {to:?} gave {step:?}");
            assert_eq!(from.manhattan(step), 1, "{from:?} -> {to:?} gave {step:?}");
        }
    }
}
