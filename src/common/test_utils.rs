//! Test helpers.
//!
//! Bevy provides `World::run_system_once` (via the `RunSystemOnce` trait) for quickly
//! executing a system in tests without building a full schedule.
//!
//! Systems that use `Commands` enqueue structural changes. We call `world.flush()`
//! after running so queued commands are applied before assertions.
//!
//! `CircleSpace` is an in-memory `SpatialProbe`: every body is a circle with one
//! layer. Rays are tested analytically, so results are exact and deterministic.

use avian2d::prelude::LayerMask;
use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::prelude::*;

use crate::common::layers::{mask_contains, Layer};
use crate::common::spatial::{RayHit, SpatialProbe};

/// Run a system once on the given world, then flush deferred commands.
/// Returns the system output.
pub fn run_system_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}

#[derive(Debug, Clone, Copy)]
pub struct CircleBody {
    pub entity: Entity,
    pub center: Vec2,
    pub radius: f32,
    pub layer: Layer,
}

#[derive(Debug, Default, Clone)]
pub struct CircleSpace {
    pub bodies: Vec<CircleBody>,
}

impl CircleSpace {
    pub fn with(mut self, entity: Entity, center: Vec2, radius: f32, layer: Layer) -> Self {
        self.bodies.push(CircleBody { entity, center, radius, layer });
        self
    }
}

impl SpatialProbe for CircleSpace {
    fn raycast(&self, origin: Vec2, dir: Vec2, max_dist: f32, mask: LayerMask) -> Option<RayHit> {
        let dir = dir.try_normalize()?;
        self.bodies
            .iter()
            .filter(|b| mask_contains(mask, b.layer))
            .filter_map(|b| {
                let m = origin - b.center;
                let half_b = m.dot(dir);
                let c = m.length_squared() - b.radius * b.radius;
                if c <= 0.0 {
                    // Origin inside the circle: immediate hit.
                    return Some((b, 0.0));
                }
                let disc = half_b * half_b - c;
                if half_b > 0.0 || disc < 0.0 {
                    return None;
                }
                let t = -half_b - disc.sqrt();
                (t <= max_dist).then_some((b, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(b, t)| {
                let point = origin + dir * t;
                RayHit {
                    entity: b.entity,
                    point,
                    normal: (point - b.center).try_normalize().unwrap_or(-dir),
                    distance: t,
                }
            })
    }

    fn overlap_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<Entity> {
        self.bodies
            .iter()
            .filter(|b| mask_contains(mask, b.layer))
            .filter(|b| b.center.distance(center) <= b.radius + radius)
            .map(|b| b.entity)
            .collect()
    }
}

/// Allocate `n` fresh entity ids.
pub fn entities(world: &mut World, n: usize) -> Vec<Entity> {
    (0..n).map(|_| world.spawn_empty().id()).collect()
}
