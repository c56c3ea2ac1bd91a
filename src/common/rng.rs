//! Seeded simulation RNG.

use bevy::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

/// The one random source for gameplay (spread, spawn selection, jitter).
#[derive(Resource, Debug, Clone, Deref, DerefMut)]
pub struct SimRng(pub Pcg32);

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(Pcg32::seed_from_u64(seed))
    }
}
