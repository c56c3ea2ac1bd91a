//! Tunable gameplay constants.

use bevy::prelude::*;

#[derive(Resource, Debug, Clone)]
pub struct Tunables {
    pub pixels_per_meter: f32,
    pub player_speed: f32,
    /// Distance from the player centre to the muzzle along the aim direction.
    pub muzzle_offset: f32,
    /// Seed for `SimRng`. Same seed, same spreads and spawn placements.
    pub rng_seed: u64,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 20.0,
            player_speed: 420.0,
            muzzle_offset: 18.0,
            rng_seed: 0x5EED_A7E4A,
        }
    }
}
