//! Projectiles: one straight-line flight routine, per-kind impact resolution.
//!
//! ```text
//! FixedUpdate: advance_projectiles -> resolve_projectile_impacts
//! Update:      expire_projectiles (lifetime)
//! ```
//! A projectile is gone after its first impact or when its lifetime runs out,
//! whichever comes first.

use avian2d::prelude::LayerMask;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::spatial::SpatialProbe;
use crate::common::state::GameState;
use crate::plugins::fx::{EffectRequest, SoundCue};
use crate::plugins::health::DamageRequest;

use super::definition::{WeaponDefinition, WeaponKind};
use super::HealthSinks;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileKind {
    /// Damages the first target it touches.
    Direct,
    /// Damages every target within `radius` of the impact point.
    AreaOfEffect { radius: f32 },
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Projectile {
    pub kind: ProjectileKind,
    pub dir: Vec2,
    pub speed: f32,
    pub damage: i32,
    /// Contact radius.
    pub radius: f32,
    pub hit_mask: LayerMask,
    pub block_mask: LayerMask,
    pub explosion_volume: f32,
}

#[derive(Component, Debug, Deref, DerefMut)]
pub struct ProjectileLifetime(pub Timer);

/// What an impact does.
#[derive(Debug, Clone, PartialEq)]
pub struct Impact {
    pub damaged: Vec<Entity>,
    /// Set for area impacts.
    pub explosion: Option<Vec2>,
}

impl Projectile {
    /// `None` for non-projectile weapons.
    pub fn from_definition(def: &WeaponDefinition, dir: Vec2) -> Option<Self> {
        let WeaponKind::Projectile { speed, radius, explosion_radius, .. } = def.kind else {
            return None;
        };
        Some(Self {
            kind: match explosion_radius {
                Some(r) => ProjectileKind::AreaOfEffect { radius: r },
                None => ProjectileKind::Direct,
            },
            dir: dir.normalize_or(Vec2::X),
            speed,
            damage: def.damage,
            radius,
            hit_mask: def.hit_mask(),
            block_mask: def.block_mask(),
            explosion_volume: def.audio.volume,
        })
    }
}

/// Contact test at `pos`. A target only counts when it has a health sink;
/// a blocker ends the flight without one.
pub fn resolve_impact(
    probe: &impl SpatialProbe,
    pos: Vec2,
    proj: &Projectile,
    has_health: impl Fn(Entity) -> bool,
) -> Option<Impact> {
    let touching: Vec<Entity> = probe
        .overlap_circle(pos, proj.radius, proj.hit_mask)
        .into_iter()
        .filter(|&e| has_health(e))
        .collect();

    let blocked = proj.block_mask != LayerMask::NONE
        && !probe.overlap_circle(pos, proj.radius, proj.block_mask).is_empty();

    if touching.is_empty() && !blocked {
        return None;
    }

    Some(match proj.kind {
        ProjectileKind::Direct => Impact {
            damaged: touching.into_iter().take(1).collect(),
            explosion: None,
        },
        ProjectileKind::AreaOfEffect { radius } => Impact {
            damaged: probe
                .overlap_circle(pos, radius, proj.hit_mask)
                .into_iter()
                .filter(|&e| has_health(e))
                .collect(),
            explosion: Some(pos),
        },
    })
}

/// Flight timer. A negative or non-finite lifetime expires on the first tick.
pub fn lifetime_timer(lifetime: f32) -> Timer {
    let secs = if lifetime.is_finite() { lifetime.max(0.0) } else { 0.0 };
    Timer::from_seconds(secs, TimerMode::Once)
}

pub fn spawn_projectile(
    commands: &mut Commands,
    def: &WeaponDefinition,
    origin: Vec2,
    dir: Vec2,
) -> Option<Entity> {
    let WeaponKind::Projectile { lifetime, .. } = def.kind else {
        return None;
    };
    let proj = Projectile::from_definition(def, dir)?;
    let angle = proj.dir.to_angle();
    let size = proj.radius * 2.0;

    let e = commands
        .spawn((
            Name::new("Projectile"),
            Sprite {
                color: Color::srgb(1.0, 0.55, 0.2),
                custom_size: Some(Vec2::new(size * 1.6, size)),
                ..default()
            },
            Transform::from_translation(origin.extend(2.0))
                .with_rotation(Quat::from_rotation_z(angle)),
            ProjectileLifetime(lifetime_timer(lifetime)),
            proj,
            DespawnOnExit(GameState::InGame),
        ))
        .id();
    Some(e)
}

/// Shared straight-line flight.
pub fn advance_projectiles(time: Res<Time>, mut q: Query<(&Projectile, &mut Transform)>) {
    let dt = time.delta_secs();
    for (proj, mut tf) in &mut q {
        tf.translation += (proj.dir * proj.speed * dt).extend(0.0);
    }
}

pub fn resolve_projectile_impacts(
    mut commands: Commands,
    spatial: avian2d::prelude::SpatialQuery,
    sinks: HealthSinks,
    q: Query<(Entity, &Transform, &Projectile)>,
    mut damage: MessageWriter<DamageRequest>,
    mut fx: MessageWriter<EffectRequest>,
) {
    for (e, tf, proj) in &q {
        let pos = tf.translation.truncate();
        let Some(impact) = resolve_impact(&spatial, pos, proj, |t| sinks.contains(t)) else {
            continue;
        };

        for target in impact.damaged {
            damage.write(DamageRequest { target, amount: proj.damage });
        }
        if let Some(at) = impact.explosion {
            fx.write(EffectRequest::Sound {
                cue: SoundCue::Explosion,
                at,
                volume: proj.explosion_volume,
                pitch: 1.0,
            });
        }
        commands.entity(e).despawn();
    }
}

pub fn expire_projectiles(
    mut commands: Commands,
    time: Res<Time>,
    mut q: Query<(Entity, &mut ProjectileLifetime)>,
) {
    for (e, mut lifetime) in &mut q {
        lifetime.tick(time.delta());
        if lifetime.is_finished() {
            commands.entity(e).despawn();
        }
    }
}
