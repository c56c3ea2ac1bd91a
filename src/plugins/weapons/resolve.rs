//! Per-kind fire resolution against a `SpatialProbe`.
//!
//! These functions decide *what* a shot does (which entities take damage, where a
//! tracer ends). Systems turn the results into `DamageRequest`/`EffectRequest`
//! messages.

use avian2d::prelude::LayerMask;
use bevy::prelude::*;
use rand::Rng;

use crate::common::spatial::SpatialProbe;

use super::definition::WeaponDefinition;

/// Wedge edges are inclusive up to this slack (degrees); f32 rounding of the
/// angle stays well below it.
pub const WEDGE_EPSILON_DEGREES: f32 = 1e-4;

/// Melee overlap circle sits this fraction of the range ahead of the swinger.
pub const MELEE_CENTER_FRACTION: f32 = 0.6;

/// Rotate `dir` by a uniform random angle in `[-spread/2, spread/2]` degrees.
/// Zero spread returns `dir` untouched.
pub fn apply_spread(dir: Vec2, spread_degrees: f32, rng: &mut impl Rng) -> Vec2 {
    if spread_degrees <= 0.0 {
        return dir;
    }
    let half = spread_degrees * 0.5;
    let angle = rng.random_range(-half..=half).to_radians();
    Vec2::from_angle(angle).rotate(dir).normalize_or(dir)
}

/// One hitscan ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PelletTrace {
    pub dir: Vec2,
    /// Impact point, or the end of the range on a miss.
    pub end: Vec2,
    /// First thing hit, when it can take damage.
    pub damaged: Option<Entity>,
}

/// Cast every pellet. Walls in the block mask occlude; only the first hit is
/// considered and it takes damage only if it has a health sink.
pub fn fire_hitscan(
    probe: &impl SpatialProbe,
    def: &WeaponDefinition,
    origin: Vec2,
    aim: Vec2,
    rng: &mut impl Rng,
    has_health: impl Fn(Entity) -> bool,
) -> Vec<PelletTrace> {
    let mask = def.hit_mask() | def.block_mask();

    (0..def.pellet_count())
        .map(|_| {
            let dir = apply_spread(aim, def.spread_degrees, rng);
            match probe.raycast(origin, dir, def.range, mask) {
                Some(hit) => PelletTrace {
                    dir,
                    end: hit.point,
                    damaged: has_health(hit.entity).then_some(hit.entity),
                },
                None => PelletTrace {
                    dir,
                    end: origin + dir * def.range,
                    damaged: None,
                },
            }
        })
        .collect()
}

/// Projectile directions for one trigger pull.
pub fn projectile_directions(def: &WeaponDefinition, aim: Vec2, rng: &mut impl Rng) -> Vec<Vec2> {
    (0..def.pellet_count())
        .map(|_| apply_spread(aim, def.spread_degrees, rng))
        .collect()
}

/// Unsigned angle between two directions, in degrees. A zero vector is at 0.
#[inline]
pub fn angle_between_degrees(a: Vec2, b: Vec2) -> f32 {
    a.perp_dot(b).atan2(a.dot(b)).abs().to_degrees()
}

/// Angle test against the aim direction. Inclusive at both edges.
#[inline]
pub fn in_wedge(aim: Vec2, to_target: Vec2, half_arc_degrees: f32) -> bool {
    angle_between_degrees(aim, to_target) <= half_arc_degrees + WEDGE_EPSILON_DEGREES
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeleeSwing {
    pub origin: Vec2,
    pub aim: Vec2,
    pub arc_degrees: f32,
    pub range: f32,
    pub hit_mask: LayerMask,
}

impl MeleeSwing {
    #[inline]
    pub fn query_center(&self) -> Vec2 {
        self.origin + self.aim * (self.range * MELEE_CENTER_FRACTION)
    }
}

/// Everything a swing damages: overlap a circle ahead of the swinger, then keep
/// the targets whose direction *from the swinger* lies inside the arc.
pub fn melee_targets(
    probe: &impl SpatialProbe,
    swing: &MeleeSwing,
    position_of: impl Fn(Entity) -> Option<Vec2>,
    has_health: impl Fn(Entity) -> bool,
) -> Vec<Entity> {
    let half_arc = swing.arc_degrees * 0.5;

    probe
        .overlap_circle(swing.query_center(), swing.range, swing.hit_mask)
        .into_iter()
        .filter(|&e| has_health(e))
        .filter(|&e| {
            position_of(e).is_some_and(|pos| in_wedge(swing.aim, pos - swing.origin, half_arc))
        })
        .collect()
}
