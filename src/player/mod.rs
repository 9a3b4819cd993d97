use bevy::prelude::*;

use crate::player::controller::*;

pub mod controller;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_observer(on_player_spawn);
        app.add_systems(Update, (apply_controls, rotate_character_to_camera).chain());
    }
}
