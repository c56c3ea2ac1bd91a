//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - we then call `arena_shooter::game::configure_headless` to install gameplay plugins.

use std::time::Duration;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use arena_shooter::plugins::player::Player;
use arena_shooter::plugins::waves::WaveSpawner;

/// One simulated frame.
pub const FRAME: Duration = Duration::from_millis(50);

pub fn app_headless() -> App {
    let mut app = App::new();

    // AssetPlugin + ScenePlugin so SceneSpawner exists.
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));

    arena_shooter::game::configure_headless(&mut app);
    // `App::run` does this before the first update; plugins such as avian
    // initialize resources in `Plugin::finish`.
    app.finish();
    app.cleanup();
    app
}

/// Headless app whose clock advances by exactly `FRAME` per update.
pub fn app_headless_stepped() -> App {
    let mut app = app_headless();
    app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));
    app
}

pub fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        app.update();
    }
}

/// Enter the arena, drop every wave spawner and return the player.
/// Tests that place their own enemies start from here.
pub fn arena_without_waves(app: &mut App) -> Entity {
    run_frames(app, 2);

    let spawners: Vec<Entity> = app
        .world_mut()
        .query_filtered::<Entity, With<WaveSpawner>>()
        .iter(app.world())
        .collect();
    for e in spawners {
        app.world_mut().entity_mut(e).despawn();
    }

    app.world_mut()
        .query_filtered::<Entity, With<Player>>()
        .single(app.world())
        .expect("player spawned on enter")
}
