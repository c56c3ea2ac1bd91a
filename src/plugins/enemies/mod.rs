//! Enemies plugin: chasers that steer toward the player, hit on contact, and die
//! through a short two-step lifecycle.
//!
//! ---------------------------
//! HOW THIS IS DESIGNED (ECS)
//! ---------------------------
//! FACTS live in components:
//!    - `Steering` is the immutable per-enemy tuning (scaled by difficulty once, at spawn).
//!    - `AttackCooldown`, `EnemyHealth`, `EnemyLifeState` are the mutable truth.
//!
//! RULES mutate facts in predictable places:
//!    - `steer_enemies` (FixedUpdate) writes velocity and requests contact damage.
//!    - the health plugin applies damage; `enemy_death_trigger` reads the result.
//!
//! ---------------------------
//! LIFECYCLE
//! ---------------------------
//! Alive -> Dying -> Dead -> despawn.
//! Entering Dying is the "deactivated" moment: the enemy stops colliding and moving
//! at once. The despawn happens later in PostUpdate so fixed-step systems never see
//! an entity vanish mid-step.

pub mod steering;

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use bevy::time::Fixed;
use bevy_firefly::prelude::Occluder2d;
use serde::{Deserialize, Serialize};

use crate::common::difficulty::Difficulty;
use crate::common::layers::Layer;
use crate::common::spatial::SpatialProbe;
use crate::common::state::GameState;
use crate::plugins::health::{DamageRequest, EnemyHealth, PlayerHealth};
use crate::plugins::player::Player;

pub use steering::{AttackCooldown, Steering};

// -----------------------------------------------------------------------------
// Components
// -----------------------------------------------------------------------------

#[derive(Component, Debug, Clone, Copy)]
pub struct Enemy;

/// Enemy lifecycle state machine.
///
/// - Alive: normal gameplay.
/// - Dying: short fade, already non-interacting.
/// - Dead: terminal marker, waiting for despawn.
#[derive(Component, Debug, Clone)]
pub enum EnemyLifeState {
    Alive,
    Dying { timer: Timer },
    Dead,
}

impl EnemyLifeState {
    #[inline]
    pub fn is_alive(&self) -> bool {
        matches!(self, Self::Alive)
    }
}

/// Marker: enemy should be removed from the world.
#[derive(Component, Debug, Clone, Copy)]
pub struct PendingDespawn;

/// What the spawner instantiates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    pub hp: i32,
    pub radius: f32,
    pub steering: Steering,
}

impl Default for EnemyTemplate {
    fn default() -> Self {
        Self {
            hp: 3,
            radius: 14.0,
            steering: Steering::default(),
        }
    }
}

// -----------------------------------------------------------------------------
// Plugin wiring
// -----------------------------------------------------------------------------

pub fn plugin(app: &mut App) {
    app.add_systems(
        FixedUpdate,
        steer_enemies.run_if(in_state(GameState::InGame)),
    );

    // Death trigger runs after damage has been applied for this frame.
    app.add_systems(
        PostUpdate,
        (
            enemy_death_trigger.after(crate::plugins::health::apply_damage_requests),
            despawn_marked_enemies,
        )
            .run_if(in_state(GameState::InGame)),
    );

    app.add_systems(
        FixedPostUpdate,
        enemy_death_progress.run_if(in_state(GameState::InGame)),
    );
}

// -----------------------------------------------------------------------------
// Spawn
// -----------------------------------------------------------------------------

#[inline]
fn enemy_layers() -> CollisionLayers {
    CollisionLayers::new(
        Layer::Enemy,
        [Layer::World, Layer::Player, Layer::Enemy, Layer::PlayerBullet],
    )
}

/// No memberships and no filters: the body stops colliding and drops out of
/// every spatial query without a structural change.
#[inline]
fn non_interacting_enemy_layers() -> CollisionLayers {
    CollisionLayers::NONE
}

/// Enemy factory. Difficulty multipliers are baked into the spawned `Steering`.
pub fn spawn_enemy(
    commands: &mut Commands,
    template: &EnemyTemplate,
    difficulty: &Difficulty,
    pos: Vec2,
) -> Entity {
    commands
        .spawn((
            Name::new("Enemy"),
            Enemy,
            EnemyHealth { hp: template.hp },
            EnemyLifeState::Alive,
            template.steering.scaled_by(difficulty),
            AttackCooldown::default(),
            Sprite {
                color: Color::srgb(0.9, 0.25, 0.25),
                custom_size: Some(Vec2::splat(template.radius * 2.0)),
                ..default()
            },
            Transform::from_translation(pos.extend(1.0)),
            RigidBody::Dynamic,
            Collider::circle(template.radius),
            LockedAxes::ROTATION_LOCKED,
            LinearVelocity::ZERO,
            enemy_layers(),
            Occluder2d::circle(template.radius),
            DespawnOnExit(GameState::InGame),
        ))
        .id()
}

// -----------------------------------------------------------------------------
// Rules: steering + contact attack
// -----------------------------------------------------------------------------

/// One fixed step of chase AI for every living enemy.
pub fn steer_enemies(
    time: Res<Time>,
    spatial: SpatialQuery,
    player: Option<Single<(Entity, &Transform, Has<PlayerHealth>), With<Player>>>,
    q_positions: Query<&Transform, With<Enemy>>,
    mut q: Query<
        (
            Entity,
            &Transform,
            &Steering,
            &EnemyLifeState,
            &mut LinearVelocity,
            &mut AttackCooldown,
        ),
        (With<Enemy>, Without<Player>),
    >,
    mut damage: MessageWriter<DamageRequest>,
) {
    let dt = time.delta_secs();
    let target = player.as_ref().map(|p| {
        let (e, tf, has_health) = **p;
        (e, tf.translation.truncate(), has_health)
    });
    let obstacles = LayerMask::from(Layer::World);
    let crowd = LayerMask::from(Layer::Enemy);

    for (me, tf, cfg, life, mut vel, mut cooldown) in &mut q {
        if !life.is_alive() {
            continue;
        }

        let origin = tf.translation.truncate();
        let neighbours: Vec<Vec2> = spatial
            .overlap_circle(origin, cfg.separation_radius, crowd)
            .into_iter()
            .filter(|&n| n != me)
            .filter_map(|n| q_positions.get(n).ok())
            .map(|t| t.translation.truncate())
            .collect();

        let out = steering::steer(
            &spatial,
            origin,
            target.map(|(_, pos, _)| pos),
            &neighbours,
            cfg,
            obstacles,
        );
        vel.0 = out.velocity;

        let Some((player_e, _, has_health)) = target else {
            continue;
        };
        if steering::tick_contact_attack(&mut cooldown, dt, out.distance, cfg, has_health) {
            damage.write(DamageRequest { target: player_e, amount: cfg.contact_damage });
        }
    }
}

// -----------------------------------------------------------------------------
// Rules: enemy death lifecycle
// -----------------------------------------------------------------------------

/// Alive -> Dying when the HP pool is empty. Stops collisions and motion at once.
pub fn enemy_death_trigger(
    mut q: Query<
        (
            &EnemyHealth,
            &mut EnemyLifeState,
            &mut CollisionLayers,
            &mut LinearVelocity,
            &mut Sprite,
        ),
        (With<Enemy>, Without<PendingDespawn>),
    >,
) {
    for (hp, mut life, mut layers, mut vel, mut sprite) in &mut q {
        if !life.is_alive() || !hp.is_depleted() {
            continue;
        }

        *life = EnemyLifeState::Dying {
            timer: Timer::from_seconds(0.35, TimerMode::Once),
        };
        *layers = non_interacting_enemy_layers();
        vel.0 = Vec2::ZERO;
        sprite.color = Color::srgba(0.8, 0.8, 0.8, 1.0);
    }
}

/// Fade the Dying state and mark PendingDespawn once finished.
pub fn enemy_death_progress(
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    mut q: Query<
        (Entity, &mut EnemyLifeState, &mut Sprite, &mut Transform),
        (With<Enemy>, Without<PendingDespawn>),
    >,
) {
    for (e, mut life, mut sprite, mut tf) in &mut q {
        let EnemyLifeState::Dying { timer } = &mut *life else {
            continue;
        };

        timer.tick(time.delta());

        let dur = timer.duration().as_secs_f32().max(0.0001);
        let t = (timer.elapsed_secs() / dur).clamp(0.0, 1.0);

        tf.scale = Vec3::splat(1.0 - t);
        let mut c = sprite.color.to_srgba();
        c.alpha = 1.0 - t;
        sprite.color = c.into();

        if timer.is_finished() {
            *life = EnemyLifeState::Dead;
            commands.entity(e).insert(PendingDespawn);
        }
    }
}

/// Centralized despawn keeps structural changes out of the fixed step.
pub fn despawn_marked_enemies(mut commands: Commands, q: Query<Entity, With<PendingDespawn>>) {
    for e in &q {
        commands.entity(e).despawn();
    }
}
