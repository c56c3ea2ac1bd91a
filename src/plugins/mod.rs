//! Feature plugins.

use bevy::prelude::*;

use crate::plugins::ui::debug_hud;

pub mod core;
pub mod enemies;
pub mod fx;
pub mod health;
pub mod physics;
pub mod player;
pub mod ui;
pub mod waves;
pub mod weapons;
pub mod world;

// Render-only
pub mod camera;
pub mod lighting;

/// Register gameplay plugins that work in headless tests.
pub fn register_gameplay(app: &mut App) {
    // Core first: physics reads `Tunables` while it is being configured.
    core::plugin(app);
    physics::plugin(app);
    health::plugin(app);
    debug_hud::plugin(app);
    fx::plugin(app);
    world::plugin(app);
    player::plugin(app);
    enemies::plugin(app);
    waves::plugin(app);
    weapons::plugin(app);
}

/// Register render-only plugins (requires DefaultPlugins / render infra).
pub fn register_render(app: &mut App) {
    lighting::plugin(app);
    camera::plugin(app);
}

/// Register all plugins (full app).
pub fn register_all(app: &mut App) {
    register_gameplay(app);
    register_render(app);
}
