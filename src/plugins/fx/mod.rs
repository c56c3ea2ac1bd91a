//! Transient effects: tracers, muzzle flashes, melee wedges, one-shot sounds.
//!
//! Gameplay code never waits on an effect. It writes an `EffectRequest` and moves
//! on; `spawn_effects` turns requests into short-lived sprites and
//! `expire_effects` removes them once their timer runs out.

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::state::GameState;

pub const TRACER_SECS: f32 = 0.025;
pub const MUZZLE_FLASH_SECS: f32 = 0.05;
pub const MELEE_ARC_SECS: f32 = 0.12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Fire,
    Swing,
    Launch,
    Explosion,
}

#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum EffectRequest {
    Tracer { from: Vec2, to: Vec2 },
    MuzzleFlash { at: Vec2 },
    MeleeArc { origin: Vec2, dir: Vec2, range: f32, arc_degrees: f32 },
    Sound { cue: SoundCue, at: Vec2, volume: f32, pitch: f32 },
}

/// Remaining display time of a transient effect entity.
#[derive(Component, Debug, Deref, DerefMut)]
pub struct FxLifetime(pub Timer);

pub fn plugin(app: &mut App) {
    app.add_message::<EffectRequest>().add_systems(
        Update,
        (spawn_effects, expire_effects)
            .chain()
            .run_if(in_state(GameState::InGame)),
    );
}

/// A thin rectangle from `from` to `to`.
fn line_sprite(from: Vec2, to: Vec2, width: f32, color: Color, z: f32) -> (Sprite, Transform) {
    let delta = to - from;
    let len = delta.length().max(0.5);
    let angle = delta.y.atan2(delta.x);
    let mid = (from + to) * 0.5;
    (
        Sprite {
            color,
            custom_size: Some(Vec2::new(len, width)),
            ..default()
        },
        Transform::from_translation(mid.extend(z)).with_rotation(Quat::from_rotation_z(angle)),
    )
}

pub fn spawn_effects(mut commands: Commands, mut reader: MessageReader<EffectRequest>) {
    for req in reader.read() {
        match *req {
            EffectRequest::Tracer { from, to } => {
                let (sprite, tf) = line_sprite(from, to, 2.0, Color::srgb(1.0, 0.95, 0.6), 3.0);
                commands.spawn((
                    Name::new("Tracer"),
                    sprite,
                    tf,
                    FxLifetime(Timer::from_seconds(TRACER_SECS, TimerMode::Once)),
                    DespawnOnExit(GameState::InGame),
                ));
            }
            EffectRequest::MuzzleFlash { at } => {
                commands.spawn((
                    Name::new("MuzzleFlash"),
                    Sprite {
                        color: Color::srgb(1.0, 0.6, 0.15),
                        custom_size: Some(Vec2::splat(10.0)),
                        ..default()
                    },
                    Transform::from_translation(at.extend(3.0)),
                    FxLifetime(Timer::from_seconds(MUZZLE_FLASH_SECS, TimerMode::Once)),
                    DespawnOnExit(GameState::InGame),
                ));
            }
            EffectRequest::MeleeArc { origin, dir, range, arc_degrees } => {
                // Wedge outline: the two edges plus the centre line.
                let half = arc_degrees.to_radians() * 0.5;
                for angle in [-half, 0.0, half] {
                    let edge = Vec2::from_angle(angle).rotate(dir.normalize_or(Vec2::X));
                    let (sprite, tf) = line_sprite(
                        origin,
                        origin + edge * range,
                        3.0,
                        Color::srgba(0.85, 0.9, 1.0, 0.8),
                        3.0,
                    );
                    commands.spawn((
                        Name::new("MeleeArc"),
                        sprite,
                        tf,
                        FxLifetime(Timer::from_seconds(MELEE_ARC_SECS, TimerMode::Once)),
                        DespawnOnExit(GameState::InGame),
                    ));
                }
            }
            EffectRequest::Sound { cue, at, volume, pitch } => {
                trace!("sfx {cue:?} at {at} vol {volume:.2} pitch {pitch:.2}");
            }
        }
    }
}

pub fn expire_effects(
    mut commands: Commands,
    time: Res<Time>,
    mut q: Query<(Entity, &mut FxLifetime)>,
) {
    for (e, mut lifetime) in &mut q {
        lifetime.tick(time.delta());
        if lifetime.is_finished() {
            commands.entity(e).despawn();
        }
    }
}
