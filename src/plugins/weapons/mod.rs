//! Weapons plugin: one fire pipeline for hitscan, projectile and melee weapons.
//!
//! # Data flow
//! ```text
//!   Update
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ player input  -> WeaponHolder { firing, current }                    │
//! │ fire_weapons  -> cooldown gate -> dispatch on WeaponKind             │
//! │     Hitscan    : raycast per pellet      -> DamageRequest + Tracer   │
//! │     Projectile : spawn per pellet        -> Projectile entities      │
//! │     Melee      : circle overlap + wedge  -> DamageRequest + MeleeArc │
//! └──────────────────────────────────────────────────────────────────────┘
//!   FixedUpdate
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ advance_projectiles -> resolve_projectile_impacts -> DamageRequest   │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//! Weapons never touch health directly. Damage is a request; the health plugin
//! is the single writer.

pub mod definition;
pub mod projectile;
pub mod resolve;

use avian2d::prelude::SpatialQuery;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::common::rng::SimRng;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::fx::{EffectRequest, SoundCue};
use crate::plugins::health::{DamageRequest, EnemyHealth, PlayerHealth};
use crate::plugins::player::{self, AimDirection};

pub use definition::{Loadout, LoadoutError, WeaponDefinition, WeaponKind};
pub use projectile::{Projectile, ProjectileKind};

// -----------------------------------------------------------------------------
// Components
// -----------------------------------------------------------------------------

/// The weapon capability of an actor: a loadout, the equipped slot and the
/// fire-rate gate.
#[derive(Component, Debug, Clone)]
pub struct WeaponHolder {
    loadout: Loadout,
    current: usize,
    cooldown: f32,
    pub firing: bool,
    pub enabled: bool,
}

impl WeaponHolder {
    pub fn new(loadout: Loadout) -> Self {
        Self {
            loadout,
            current: 0,
            cooldown: 0.0,
            firing: false,
            enabled: true,
        }
    }

    #[inline]
    pub fn loadout(&self) -> &Loadout {
        &self.loadout
    }

    #[inline]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[inline]
    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    pub fn current(&self) -> Option<&WeaponDefinition> {
        self.loadout.get(self.current)
    }

    /// Equip a slot (clamped into range). Always clears the cooldown.
    pub fn select(&mut self, index: usize) {
        if self.loadout.is_empty() {
            return;
        }
        self.current = index.min(self.loadout.len() - 1);
        self.cooldown = 0.0;
    }

    pub fn next(&mut self) {
        if self.loadout.is_empty() {
            return;
        }
        self.select((self.current + 1) % self.loadout.len());
    }

    pub fn prev(&mut self) {
        if self.loadout.is_empty() {
            return;
        }
        let len = self.loadout.len();
        self.select((self.current + len - 1) % len);
    }

    /// Count the cooldown down; returns the slot to fire when the trigger is
    /// held and the gate is open.
    pub fn trigger(&mut self, dt: f32) -> Option<usize> {
        if !self.enabled {
            return None;
        }
        let cooldown_secs = self.current()?.cooldown_secs();

        self.cooldown -= dt;
        if self.firing && self.cooldown <= 0.0 {
            self.cooldown = cooldown_secs;
            return Some(self.current);
        }
        None
    }

    /// Terminal: no more firing.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.firing = false;
    }
}

/// Loadout handed to the player at spawn.
#[derive(Resource, Debug, Clone, Default)]
pub struct PlayerLoadout(pub Loadout);

/// "Does this entity have somewhere to put damage?"
#[derive(SystemParam)]
pub struct HealthSinks<'w, 's> {
    q: Query<'w, 's, (), Or<(With<PlayerHealth>, With<EnemyHealth>)>>,
}

impl HealthSinks<'_, '_> {
    #[inline]
    pub fn contains(&self, e: Entity) -> bool {
        self.q.contains(e)
    }
}

// -----------------------------------------------------------------------------
// Plugin wiring
// -----------------------------------------------------------------------------

pub fn plugin(app: &mut App) {
    app.init_resource::<PlayerLoadout>().add_systems(
        Update,
        (
            fire_weapons.after(player::read_weapon_input),
            projectile::expire_projectiles,
        )
            .run_if(in_state(GameState::InGame)),
    )
    .add_systems(
        FixedUpdate,
        (
            projectile::advance_projectiles,
            projectile::resolve_projectile_impacts,
        )
            .chain()
            .run_if(in_state(GameState::InGame)),
    );
}

// -----------------------------------------------------------------------------
// Rules
// -----------------------------------------------------------------------------

/// Cooldown gate + kind dispatch for every armed actor.
pub fn fire_weapons(
    mut commands: Commands,
    time: Res<Time>,
    tunables: Res<Tunables>,
    mut rng: ResMut<SimRng>,
    spatial: SpatialQuery,
    sinks: HealthSinks,
    q_positions: Query<&Transform>,
    mut q: Query<(&Transform, &AimDirection, &mut WeaponHolder)>,
    mut damage: MessageWriter<DamageRequest>,
    mut fx: MessageWriter<EffectRequest>,
) {
    let dt = time.delta_secs();

    for (tf, aim, mut holder) in &mut q {
        let loadout = holder.loadout().clone();
        let Some(def) = holder.trigger(dt).and_then(|slot| loadout.get(slot)) else {
            continue;
        };

        let pos = tf.translation.truncate();
        let aim = aim.0;
        let muzzle = pos + aim * tunables.muzzle_offset;
        let pitch = def.audio.pitch_for(def.fire_rate);

        match def.kind {
            WeaponKind::Hitscan => {
                fx.write(EffectRequest::MuzzleFlash { at: muzzle });
                fx.write(EffectRequest::Sound {
                    cue: SoundCue::Fire,
                    at: muzzle,
                    volume: def.audio.volume,
                    pitch,
                });

                let traces =
                    resolve::fire_hitscan(&spatial, def, muzzle, aim, &mut rng.0, |e| {
                        sinks.contains(e)
                    });
                for trace in traces {
                    if let Some(target) = trace.damaged {
                        damage.write(DamageRequest { target, amount: def.damage });
                    }
                    fx.write(EffectRequest::Tracer { from: muzzle, to: trace.end });
                }
            }
            WeaponKind::Projectile { .. } => {
                for dir in resolve::projectile_directions(def, aim, &mut rng.0) {
                    projectile::spawn_projectile(&mut commands, def, muzzle, dir);
                }
                fx.write(EffectRequest::Sound {
                    cue: SoundCue::Launch,
                    at: muzzle,
                    volume: def.audio.volume,
                    pitch,
                });
            }
            WeaponKind::Melee { arc_degrees, range } => {
                let swing = resolve::MeleeSwing {
                    origin: pos,
                    aim,
                    arc_degrees,
                    range,
                    hit_mask: def.hit_mask(),
                };
                let targets = resolve::melee_targets(
                    &spatial,
                    &swing,
                    |e| q_positions.get(e).ok().map(|t| t.translation.truncate()),
                    |e| sinks.contains(e),
                );
                for target in targets {
                    damage.write(DamageRequest { target, amount: def.damage });
                }
                fx.write(EffectRequest::MeleeArc { origin: pos, dir: aim, range, arc_degrees });
                fx.write(EffectRequest::Sound {
                    cue: SoundCue::Swing,
                    at: pos,
                    volume: def.audio.volume,
                    pitch,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests;
