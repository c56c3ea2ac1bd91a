//! Spatial queries the simulation needs from the physics provider.
//!
//! Gameplay code only ever asks two questions: "what does a ray hit first?" and
//! "what overlaps this circle?". Both are scoped by a category mask.
//! `SpatialProbe` is that seam; avian's `SpatialQuery` system param is the
//! production implementation.

use avian2d::prelude::*;
use bevy::prelude::*;

/// First hit along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: Entity,
    pub point: Vec2,
    pub normal: Vec2,
    pub distance: f32,
}

pub trait SpatialProbe {
    /// Cast a ray from `origin` along `dir` (normalized by the implementation).
    /// A zero direction never hits.
    fn raycast(&self, origin: Vec2, dir: Vec2, max_dist: f32, mask: LayerMask) -> Option<RayHit>;

    /// Every entity in `mask` whose collider overlaps the circle.
    fn overlap_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<Entity>;
}

impl SpatialProbe for SpatialQuery<'_, '_> {
    fn raycast(&self, origin: Vec2, dir: Vec2, max_dist: f32, mask: LayerMask) -> Option<RayHit> {
        let dir = Dir2::new(dir).ok()?;
        let filter = SpatialQueryFilter::from_mask(mask);
        let hit = self.cast_ray(origin, dir, max_dist, true, &filter)?;
        Some(RayHit {
            entity: hit.entity,
            point: origin + *dir * hit.distance,
            normal: hit.normal,
            distance: hit.distance,
        })
    }

    fn overlap_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<Entity> {
        if radius <= 0.0 {
            return Vec::new();
        }
        let filter = SpatialQueryFilter::from_mask(mask);
        self.shape_intersections(&Collider::circle(radius), center, 0.0, &filter)
    }
}
