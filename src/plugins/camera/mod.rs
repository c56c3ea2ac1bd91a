//! Camera plugin.
//!
//! The key subtlety: **B0001**.
//! A system cannot read the player's `Transform` and write the camera's `Transform`
//! unless Bevy can prove the two queries are disjoint. `Without<...>` filters encode
//! that proof.
//!
//! ```text
//! OnEnter(InGame): spawn MainCamera
//! PostUpdate:      ease the camera towards the player (before transform propagation)
//! ```

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use bevy_firefly::prelude::*;

use crate::common::state::GameState;
use crate::plugins::player::Player;

#[derive(Component)]
pub struct MainCamera {
    pub responsiveness: f32,
}

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_camera)
        .add_systems(
            PostUpdate,
            follow_player
                .before(TransformSystems::Propagate)
                .run_if(in_state(GameState::InGame)),
        );
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("MainCamera"),
        Camera2d,
        MainCamera { responsiveness: 5.0 },
        FireflyConfig::default(),
        Transform::from_xyz(0.0, 0.0, 999.0),
        DespawnOnExit(GameState::InGame),
    ));
}

/// Exponential ease: frame-rate independent.
#[inline]
fn follow_alpha(responsiveness: f32, dt: f32) -> f32 {
    1.0 - (-responsiveness * dt).exp()
}

fn follow_player(
    time: Res<Time>,
    player: Option<Single<&Transform, (With<Player>, Without<MainCamera>)>>,
    camera: Option<Single<(&mut Transform, &MainCamera), Without<Player>>>,
) {
    let (Some(player), Some(mut camera)) = (player, camera) else {
        return;
    };
    let (tf_cam, main_cam) = &mut *camera;

    let alpha = follow_alpha(main_cam.responsiveness, time.delta_secs());
    let target = player.translation.truncate();
    let current = tf_cam.translation.truncate();
    let next = current.lerp(target, alpha);

    tf_cam.translation.x = next.x;
    tf_cam.translation.y = next.y;
}
