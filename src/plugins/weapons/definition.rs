//! Weapon definitions and loadouts.
//!
//! A `WeaponDefinition` is immutable config. A `Loadout` shares its definitions
//! behind an `Arc`, so holders clone it freely and nothing mutates a definition
//! at runtime.

use std::sync::Arc;

use avian2d::prelude::LayerMask;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::layers::{mask_of, Layer};

/// Kind plus the parameters only that kind uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum WeaponKind {
    Hitscan,
    Projectile {
        speed: f32,
        lifetime: f32,
        /// Contact radius of the projectile body.
        #[serde(default = "default_projectile_radius")]
        radius: f32,
        /// `Some` turns impacts into an area splash (rockets).
        #[serde(default)]
        explosion_radius: Option<f32>,
    },
    Melee {
        arc_degrees: f32,
        range: f32,
    },
}

fn default_projectile_radius() -> f32 {
    5.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponAudio {
    pub volume: f32,
    /// Fire rate that plays at `pitch_base`.
    pub pitch_ref_fire_rate: f32,
    pub pitch_base: f32,
    /// Max deviation from `pitch_base` in either direction.
    pub pitch_clamp: f32,
}

impl Default for WeaponAudio {
    fn default() -> Self {
        Self {
            volume: 0.4,
            pitch_ref_fire_rate: 10.0,
            pitch_base: 1.0,
            pitch_clamp: 0.3,
        }
    }
}

impl WeaponAudio {
    /// Faster weapons play higher, within `pitch_base ± pitch_clamp`.
    pub fn pitch_for(&self, fire_rate: f32) -> f32 {
        if self.pitch_ref_fire_rate <= 0.0 {
            return self.pitch_base;
        }
        let clamp = self.pitch_clamp.abs();
        (self.pitch_base * fire_rate / self.pitch_ref_fire_rate)
            .clamp(self.pitch_base - clamp, self.pitch_base + clamp)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponDefinition {
    pub name: String,
    #[serde(flatten)]
    pub kind: WeaponKind,
    /// Shots (or swings) per second.
    pub fire_rate: f32,
    /// Per pellet, projectile or swing.
    pub damage: i32,
    #[serde(default = "default_pellets")]
    pub pellets: u32,
    #[serde(default)]
    pub spread_degrees: f32,
    /// Hitscan ray length.
    #[serde(default)]
    pub range: f32,
    /// Layers that take damage.
    pub hit_layers: Vec<Layer>,
    /// Layers that stop rays and projectiles.
    #[serde(default)]
    pub block_layers: Vec<Layer>,
    #[serde(default)]
    pub audio: WeaponAudio,
}

fn default_pellets() -> u32 {
    1
}

impl WeaponDefinition {
    /// Seconds between shots. Very low rates are floored.
    #[inline]
    pub fn cooldown_secs(&self) -> f32 {
        1.0 / self.fire_rate.max(0.01)
    }

    #[inline]
    pub fn pellet_count(&self) -> u32 {
        self.pellets.max(1)
    }

    #[inline]
    pub fn hit_mask(&self) -> LayerMask {
        mask_of(&self.hit_layers)
    }

    #[inline]
    pub fn block_mask(&self) -> LayerMask {
        mask_of(&self.block_layers)
    }

    pub fn rifle() -> Self {
        Self {
            name: "Rifle".into(),
            kind: WeaponKind::Hitscan,
            fire_rate: 8.0,
            damage: 1,
            pellets: 1,
            spread_degrees: 2.0,
            range: 600.0,
            hit_layers: vec![Layer::Enemy],
            block_layers: vec![Layer::World],
            audio: WeaponAudio::default(),
        }
    }

    pub fn shotgun() -> Self {
        Self {
            name: "Shotgun".into(),
            kind: WeaponKind::Hitscan,
            fire_rate: 1.5,
            damage: 1,
            pellets: 6,
            spread_degrees: 24.0,
            range: 320.0,
            hit_layers: vec![Layer::Enemy],
            block_layers: vec![Layer::World],
            audio: WeaponAudio {
                volume: 0.55,
                ..WeaponAudio::default()
            },
        }
    }

    pub fn rocket_launcher() -> Self {
        Self {
            name: "Rocket".into(),
            kind: WeaponKind::Projectile {
                speed: 420.0,
                lifetime: 2.5,
                radius: 6.0,
                explosion_radius: Some(60.0),
            },
            fire_rate: 1.0,
            damage: 3,
            pellets: 1,
            spread_degrees: 0.0,
            range: 0.0,
            hit_layers: vec![Layer::Enemy],
            block_layers: vec![Layer::World],
            audio: WeaponAudio::default(),
        }
    }

    pub fn blade() -> Self {
        Self {
            name: "Blade".into(),
            kind: WeaponKind::Melee {
                arc_degrees: 100.0,
                range: 48.0,
            },
            fire_rate: 2.5,
            damage: 2,
            pellets: 1,
            spread_degrees: 0.0,
            range: 0.0,
            hit_layers: vec![Layer::Enemy],
            block_layers: Vec::new(),
            audio: WeaponAudio::default(),
        }
    }

    fn validate(&self) -> Result<(), LoadoutError> {
        let invalid = |reason: &str| LoadoutError::InvalidWeapon {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if !self.fire_rate.is_finite() || self.fire_rate <= 0.0 {
            return Err(invalid("fire_rate must be positive"));
        }
        if self.damage < 0 {
            return Err(invalid("damage must not be negative"));
        }
        if self.range < 0.0 || self.spread_degrees < 0.0 {
            return Err(invalid("range and spread must not be negative"));
        }
        match self.kind {
            WeaponKind::Projectile { speed, lifetime, .. } if speed <= 0.0 || lifetime <= 0.0 => {
                Err(invalid("projectile speed and lifetime must be positive"))
            }
            WeaponKind::Melee { range, .. } if range <= 0.0 => {
                Err(invalid("melee range must be positive"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadoutError {
    #[error("loadout parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("weapon {name:?}: {reason}")]
    InvalidWeapon { name: String, reason: String },
}

/// Ordered weapon slots. Slot order is switch order.
#[derive(Debug, Clone, PartialEq)]
pub struct Loadout(Arc<[WeaponDefinition]>);

impl Default for Loadout {
    fn default() -> Self {
        Self::new(vec![
            WeaponDefinition::rifle(),
            WeaponDefinition::shotgun(),
            WeaponDefinition::rocket_launcher(),
            WeaponDefinition::blade(),
        ])
    }
}

impl Loadout {
    pub fn new(weapons: Vec<WeaponDefinition>) -> Self {
        Self(weapons.into())
    }

    /// Parse a JSON array of weapon definitions.
    pub fn from_json(json: &str) -> Result<Self, LoadoutError> {
        let weapons: Vec<WeaponDefinition> = serde_json::from_str(json)?;
        weapons.iter().try_for_each(WeaponDefinition::validate)?;
        Ok(Self::new(weapons))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&WeaponDefinition> {
        self.0.get(index)
    }
}
