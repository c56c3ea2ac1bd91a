//! Lighting plugin (Firefly), render-only. A warm point light rides on the player;
//! walls, pillars and enemies carry `Occluder2d` and cast shadows.

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use bevy_firefly::prelude::*;

use crate::common::state::GameState;
use crate::plugins::player::Player;

#[derive(Component)]
pub struct PlayerLight;

pub fn plugin(app: &mut App) {
    if !app.is_plugin_added::<FireflyPlugin>() {
        app.add_plugins(FireflyPlugin);
    }

    app.add_systems(OnEnter(GameState::InGame), setup)
        .add_systems(
            Update,
            follow_player_light.run_if(in_state(GameState::InGame)),
        );
}

fn setup(mut commands: Commands) {
    commands.spawn((
        Name::new("PlayerLight"),
        PlayerLight,
        PointLight2d {
            color: Color::srgb(1.0, 0.9, 0.75),
            range: 450.0,
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 10.0),
        DespawnOnExit(GameState::InGame),
    ));
}

fn follow_player_light(
    player: Option<Single<&Transform, (With<Player>, Without<PlayerLight>)>>,
    light: Option<Single<&mut Transform, (With<PlayerLight>, Without<Player>)>>,
) {
    let (Some(player), Some(mut light)) = (player, light) else {
        return;
    };
    light.translation.x = player.translation.x;
    light.translation.y = player.translation.y;
}
