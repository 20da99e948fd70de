// src/systems/pickups.rs - Player pickups: pellets, power pellets, mystery tiles
use bevy::prelude::*;

use crate::core::config::ChaseConfig;
use crate::core::events::{MysteryPowerUpCollected, PowerPelletEaten};
use crate::core::grid::MazeGrid;
use crate::core::pellets::{apply_mystery_power_up, PelletField};
use crate::core::resources::Player;

pub fn pellet_system(
    mut pellets: ResMut<PelletField>,
    mut grid: ResMut<MazeGrid>,
    mut player: ResMut<Player>,
    mut power_pellets: EventWriter<PowerPelletEaten>,
    mut mysteries: EventWriter<MysteryPowerUpCollected>,
    config: Res<ChaseConfig>,
) {
    player.tick_cooldowns();

    let tile = player.tile(config.grid.tile_size);
    let consumed = pellets.consume_at(tile, &mut *grid);

    if consumed.pellet {
        player.score += config.round.pellet_reward;
        if pellets.remaining() == 0 {
            info!("All pellets cleared, score {}", player.score);
        }
    }
    if consumed.large_pellet {
        power_pellets.write(PowerPelletEaten { tile });
    }
    if consumed.mystery {
        match apply_mystery_power_up(&mut player, &config.mystery) {
            Some(kind) => {
                info!("Mystery power-up: {:?}", kind);
                mysteries.write(MysteryPowerUpCollected { tile, kind });
            }
            None => debug!("Mystery tile at {:?} had nothing to give", tile),
        }
    }
}
