// src/main.rs - Headless chase demo with an autopilot player
use std::path::PathBuf;
use std::time::Duration;

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::Parser;

use mazechase::{
    round_in_play, step_toward, tile_origin, ChaseConfig, ChasePlugin, ChaseSet, ChaseSnapshot,
    Difficulty, Direction, GameOver, GridMap, MazeGrid, PelletField, Player, Tile,
};

/// Pixels per frame before power-up bonuses.
const PLAYER_SPEED: f32 = 3.5;

/// Headless maze chase: four adversaries hunt an autopilot player.
#[derive(Parser, Debug)]
#[command(name = "mazechase")]
#[command(version)]
struct Args {
    /// Config file (.json or .ron); data/config/chase.json when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frames to simulate before exiting (0 = run until game over)
    #[arg(long, default_value_t = 3600)]
    frames: u32,

    /// Seed for the autopilot's turns
    #[arg(long)]
    seed: Option<u64>,

    /// Force hard difficulty regardless of the config file
    #[arg(long)]
    hard: bool,

    /// Log the render snapshot as JSON every N frames (0 = never)
    #[arg(long, default_value_t = 0)]
    snapshot_every: u32,
}

#[derive(Resource)]
struct Autopilot {
    heading: Option<Tile>,
    rng: fastrand::Rng,
}

#[derive(Resource)]
struct DemoClock {
    frame: u32,
    limit: u32,
    snapshot_every: u32,
}

fn main() {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ChaseConfig::load_or_default(path),
        None => ChaseConfig::load(),
    };
    if args.hard {
        config.difficulty = Difficulty::Hard;
    }
    let rng = args.seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(1.0 / 60.0))))
        .add_plugins(LogPlugin::default())
        .insert_resource(Time::<Fixed>::from_hz(60.0))
        .add_plugins(ChasePlugin::new(config))
        .insert_resource(Autopilot { heading: None, rng })
        .insert_resource(DemoClock {
            frame: 0,
            limit: args.frames,
            snapshot_every: args.snapshot_every,
        })
        .add_systems(
            FixedUpdate,
            autopilot_system.before(ChaseSet::Input).run_if(round_in_play),
        )
        .add_systems(FixedUpdate, demo_clock_system.after(ChaseSet::Snapshot))
        .run();
}

/// Walk tile to tile, picking a random non-reversing turn at junctions and
/// preferring turns that lead onto a pellet.
fn autopilot_system(
    mut pilot: ResMut<Autopilot>,
    mut player: ResMut<Player>,
    grid: Res<MazeGrid>,
    pellets: Res<PelletField>,
    config: Res<ChaseConfig>,
) {
    let tile_size = config.grid.tile_size;
    let here = player.tile(tile_size);

    if pilot.heading.is_none() || player.position == tile_origin(here, tile_size) {
        let open: Vec<Direction> = Direction::SEARCH_ORDER
            .into_iter()
            .filter(|d| grid.is_walkable(here.offset(*d, 1)))
            .collect();
        let onward: Vec<Direction> = open
            .iter()
            .copied()
            .filter(|d| *d != player.facing.reversed())
            .collect();
        let hungry: Vec<Direction> = onward
            .iter()
            .copied()
            .filter(|d| pellets.contains(here.offset(*d, 1)))
            .collect();
        let onward = if hungry.is_empty() { onward } else { hungry };

        let choice = match onward.len() {
            0 => open.first().copied(),
            n => Some(onward[pilot.rng.usize(..n)]),
        };
        pilot.heading = choice.map(|d| here.offset(d, 1));
        if let Some(direction) = choice {
            player.facing = direction;
        }
    }

    if let Some(next) = pilot.heading {
        let speed = PLAYER_SPEED + player.speed_bonus;
        player.position = step_toward(player.position, next, speed, tile_size);
    }
}

fn demo_clock_system(
    mut clock: ResMut<DemoClock>,
    mut game_over: EventReader<GameOver>,
    mut exit: EventWriter<AppExit>,
    snapshot: Res<ChaseSnapshot>,
) {
    clock.frame += 1;

    if clock.snapshot_every > 0 && clock.frame % clock.snapshot_every == 0 {
        match serde_json::to_string(&*snapshot) {
            Ok(json) => info!("frame {}: {}", clock.frame, json),
            Err(e) => error!("Failed to serialize snapshot: {}", e),
        }
    }

    if let Some(over) = game_over.read().last() {
        info!("Game over after {} frames, score {}", clock.frame, over.final_score);
        exit.write(AppExit::Success);
    } else if clock.limit > 0 && clock.frame >= clock.limit {
        info!(
            "Stopping after {} frames: score {}, lives {}",
            clock.frame, snapshot.score, snapshot.lives
        );
        exit.write(AppExit::Success);
    }
}
