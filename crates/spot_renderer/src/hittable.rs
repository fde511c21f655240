//! Hittable trait and HitRecord for ray-primitive intersection.

use spot_math::{Aabb, Ray};

/// Result of intersecting a ray with a single primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveHit {
    /// Distance along the (unit) ray direction, `t >= 0`
    pub t: f32,
    /// Barycentric weight of the second vertex
    pub u: f32,
    /// Barycentric weight of the third vertex
    pub v: f32,
}

/// Record of the nearest intersection in a primitive list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Index into the primitive slice the search ran over
    pub primitive: usize,
    pub t: f32,
    pub u: f32,
    pub v: f32,
}

impl HitRecord {
    pub fn new(primitive: usize, hit: PrimitiveHit) -> Self {
        Self {
            primitive,
            t: hit.t,
            u: hit.u,
            v: hit.v,
        }
    }
}

/// Trait for primitives that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Exact intersection test. Returns `None` on a miss.
    fn intersect(&self, ray: &Ray) -> Option<PrimitiveHit>;

    /// Get the axis-aligned bounding box of this primitive.
    fn bounding_box(&self) -> Aabb;
}

/// Nearest hit by testing every primitive in order.
///
/// Reference implementation for the BVH, also fine for very small scenes.
/// A later primitive replaces the current best only when strictly closer.
pub fn closest_hit_linear<H: Hittable>(primitives: &[H], ray: &Ray) -> Option<HitRecord> {
    let mut best: Option<HitRecord> = None;

    for (index, primitive) in primitives.iter().enumerate() {
        if let Some(hit) = primitive.intersect(ray) {
            if best.map_or(true, |b| hit.t < b.t) {
                best = Some(HitRecord::new(index, hit));
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Flat;
    use crate::Triangle;
    use spot_math::{Color, Vec3};
    use std::sync::Arc;

    fn wall(z: f32) -> Triangle {
        Triangle::from_positions(
            Vec3::new(-1.0, -1.0, z),
            Vec3::new(-1.0, 1.0, z),
            Vec3::new(1.0, -1.0, z),
            Arc::new(Flat::new(Color::WHITE)),
        )
    }

    #[test]
    fn test_linear_picks_nearest() {
        let walls = vec![wall(5.0), wall(2.0), wall(3.0)];
        let ray = Ray::new(Vec3::new(-0.5, -0.5, 0.0), Vec3::Z);

        let hit = closest_hit_linear(&walls, &ray).unwrap();
        assert_eq!(hit.primitive, 1);
        assert!((hit.t - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_linear_miss() {
        let walls = vec![wall(5.0)];
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert!(closest_hit_linear(&walls, &ray).is_none());
        assert!(closest_hit_linear::<Triangle>(&[], &ray).is_none());
    }

    #[test]
    fn test_linear_tie_keeps_first() {
        let walls = vec![wall(2.0), wall(2.0)];
        let ray = Ray::new(Vec3::new(-0.5, -0.5, 0.0), Vec3::Z);
        assert_eq!(closest_hit_linear(&walls, &ray).unwrap().primitive, 0);
    }
}
