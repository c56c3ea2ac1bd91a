//! Physics plugin: avian2d in pixel units, top-down (no gravity).
//!
//! Requires `Tunables`; register after the core plugin.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::tunables::Tunables;

pub fn plugin(app: &mut App) {
    let ppm = app
        .world()
        .get_resource::<Tunables>()
        .map_or(Tunables::default().pixels_per_meter, |t| t.pixels_per_meter);
    app.add_plugins(PhysicsPlugins::default().with_length_unit(ppm));
    app.insert_resource(Gravity(Vec2::ZERO));
}
