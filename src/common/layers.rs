//! Collision layers.
//!
//! A layer is the category tag of an actor; a `LayerMask` is a category mask
//! for spatial queries (feelers, overlap tests, weapon rays).

use avian2d::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(PhysicsLayer, Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layer {
    #[default]
    Default,
    World,
    Player,
    Enemy,
    PlayerBullet,
    EnemyBullet,
}

/// Union of a list of layers.
///
/// An empty list yields `LayerMask::NONE`, which matches nothing.
pub fn mask_of(layers: &[Layer]) -> LayerMask {
    layers
        .iter()
        .fold(LayerMask::NONE, |mask, layer| mask | LayerMask::from(*layer))
}

/// True when `mask` shares at least one bit with `layer`.
#[inline]
pub fn mask_contains(mask: LayerMask, layer: Layer) -> bool {
    (mask & LayerMask::from(layer)) != LayerMask::NONE
}
