//! Chaser steering: seek with slowdown, three-feeler wall avoidance, crowd separation,
//! and the contact-attack cooldown.
//!
//! Everything here is a pure function of the current state plus spatial queries,
//! so the fixed-step system stays a thin loop.

use avian2d::prelude::LayerMask;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::common::difficulty::Difficulty;
use crate::common::spatial::SpatialProbe;

/// Below this distance the seek direction is zero instead of a normalized vector.
pub const ARRIVE_EPSILON: f32 = 0.001;

/// Neighbours closer than this (squared) are treated as coincident and ignored.
const SEPARATION_MIN_DIST_SQ: f32 = 1e-4;

/// Floor on the inverse-square denominator.
const SEPARATION_DENOM_FLOOR: f32 = 0.1;

/// Per-enemy steering and attack configuration.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Steering {
    pub move_speed: f32,
    pub slow_radius: f32,
    pub stop_distance: f32,

    pub feeler_length: f32,
    pub side_angle_degrees: f32,
    pub avoid_weight: f32,

    pub separation_radius: f32,
    pub separation_weight: f32,

    pub attack_range: f32,
    pub attack_cooldown: f32,
    pub contact_damage: i32,
}

impl Default for Steering {
    fn default() -> Self {
        Self {
            move_speed: 110.0,
            slow_radius: 60.0,
            stop_distance: 24.0,
            feeler_length: 28.0,
            side_angle_degrees: 30.0,
            avoid_weight: 2.0,
            separation_radius: 40.0,
            separation_weight: 1.5,
            attack_range: 34.0,
            attack_cooldown: 0.7,
            contact_damage: 1,
        }
    }
}

impl Steering {
    /// Apply the session's enemy multipliers.
    pub fn scaled_by(&self, difficulty: &Difficulty) -> Self {
        Self {
            move_speed: self.move_speed * difficulty.enemy_speed_mul,
            attack_range: self.attack_range * difficulty.enemy_attack_range_mul,
            ..self.clone()
        }
    }
}

/// Seconds until the next contact attack is allowed.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq)]
pub struct AttackCooldown(pub f32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringOutput {
    pub velocity: Vec2,
    /// Distance to the target, `f32::INFINITY` without one.
    pub distance: f32,
}

impl SteeringOutput {
    pub const IDLE: Self = Self { velocity: Vec2::ZERO, distance: f32::INFINITY };
}

/// Speed ramp: full speed outside `slow_radius`, linear inside it, zero at or
/// inside `stop_distance`.
pub fn desired_speed(distance: f32, cfg: &Steering) -> f32 {
    if distance <= cfg.stop_distance {
        return 0.0;
    }
    if distance < cfg.slow_radius {
        cfg.move_speed * (distance / cfg.slow_radius)
    } else {
        cfg.move_speed
    }
}

#[inline]
pub fn rotate_degrees(v: Vec2, degrees: f32) -> Vec2 {
    Vec2::from_angle(degrees.to_radians()).rotate(v)
}

/// Sum of feeler pushes: each hit contributes its normal scaled by how deep
/// into the feeler the obstacle sits.
pub fn avoidance(
    probe: &impl SpatialProbe,
    origin: Vec2,
    forward: Vec2,
    cfg: &Steering,
    obstacles: LayerMask,
) -> Vec2 {
    if cfg.feeler_length <= 0.0 || obstacles == LayerMask::NONE {
        return Vec2::ZERO;
    }

    let feelers = [
        forward,
        rotate_degrees(forward, cfg.side_angle_degrees),
        rotate_degrees(forward, -cfg.side_angle_degrees),
    ];

    let push: Vec2 = feelers
        .into_iter()
        .filter_map(|dir| probe.raycast(origin, dir, cfg.feeler_length, obstacles))
        .map(|hit| hit.normal * (1.0 - hit.distance / cfg.feeler_length).clamp(0.0, 1.0))
        .sum();

    push * cfg.avoid_weight
}

/// Inverse-square push away from neighbours, normalized then weighted.
pub fn separation(origin: Vec2, neighbours: &[Vec2], cfg: &Steering) -> Vec2 {
    let push: Vec2 = neighbours
        .iter()
        .filter_map(|&n| {
            let away = origin - n;
            let dist_sq = away.length_squared();
            (dist_sq > SEPARATION_MIN_DIST_SQ)
                .then(|| away.normalize() / dist_sq.max(SEPARATION_DENOM_FLOOR))
        })
        .sum();

    push.normalize_or_zero() * cfg.separation_weight
}

/// One steering step for an enemy at `origin`.
pub fn steer(
    probe: &impl SpatialProbe,
    origin: Vec2,
    target: Option<Vec2>,
    neighbours: &[Vec2],
    cfg: &Steering,
    obstacles: LayerMask,
) -> SteeringOutput {
    let Some(target) = target else {
        return SteeringOutput::IDLE;
    };

    let to_target = target - origin;
    let distance = to_target.length();
    let seek = if distance > ARRIVE_EPSILON { to_target / distance } else { Vec2::ZERO };

    let speed = desired_speed(distance, cfg);
    let avoid = avoidance(probe, origin, seek, cfg, obstacles);
    let sep = separation(origin, neighbours, cfg);

    SteeringOutput {
        velocity: (seek + avoid + sep).normalize_or_zero() * speed,
        distance,
    }
}

/// Advance the contact-attack cooldown; true when an attack lands this tick.
pub fn tick_contact_attack(
    cooldown: &mut AttackCooldown,
    dt: f32,
    distance: f32,
    cfg: &Steering,
    target_has_health: bool,
) -> bool {
    cooldown.0 -= dt;
    if distance <= cfg.attack_range && cooldown.0 <= 0.0 && target_has_health {
        cooldown.0 = cfg.attack_cooldown;
        return true;
    }
    false
}
