//! Core plugin: shared resources and global settings.
//!
//! A host may insert its own `Difficulty` before this plugin runs; otherwise the
//! Normal preset is used. `SimRng` is seeded from `Tunables::rng_seed`.

use crate::common::difficulty::Difficulty;
use crate::common::rng::SimRng;
use crate::common::tunables::Tunables;
use bevy::prelude::*;

pub fn plugin(app: &mut App) {
    let tunables = Tunables::default();
    app.insert_resource(SimRng::from_seed(tunables.rng_seed));
    app.insert_resource(tunables);
    app.init_resource::<Difficulty>();
    app.insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.07)));
}
