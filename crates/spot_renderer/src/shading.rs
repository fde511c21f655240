//! Recursive shading.
//!
//! `Tracer::trace` finds the nearest triangle and hands the hit to that
//! triangle's material together with a `Recursion` handle. Materials that
//! need more light (mirrors, glossy scatter) cast further rays through the
//! handle, which always traces one level deeper than the hit it was made for.

use rand::RngCore;
use spot_math::{Color, Ray, Vec3};

use crate::bvh::Bvh;
use crate::hittable::HitRecord;
use crate::triangle::{Triangle, TriangleVertex};

/// Default hard cap on recursion depth.
pub const DEFAULT_MAX_DEPTH: u32 = 32;

/// Distance secondary rays start away from the surface they leave.
pub const SURFACE_OFFSET: f32 = 1e-4;

/// Background color for rays that hit nothing, a gradient over the ray's `y`.
pub fn sky_color(ray: &Ray) -> Color {
    let dy = ray.direction().y;
    Color::new(
        (255.0 * dy * 0.5 + 127.5) as i32,
        (255.0 * 0.7 + 255.0 * 0.3 * dy) as i32,
        255,
    )
}

/// Everything a material may look at for one hit.
#[derive(Debug, Clone, Copy)]
pub struct ShadingContext<'a> {
    /// The triangle that was hit
    pub triangle: &'a Triangle,
    /// The ray that hit it
    pub ray: &'a Ray,
    pub hit: HitRecord,
    /// World-space hit point, `ray.at(hit.t)`
    pub point: Vec3,
    /// Corner attributes interpolated at the hit
    pub vertex: TriangleVertex,
    /// Recursion depth of `ray`; primary rays are depth 0
    pub depth: u32,
}

/// Nearest-hit search and shading over one frame's triangles.
pub struct Tracer<'a> {
    triangles: &'a [Triangle],
    bvh: Bvh,
    max_depth: u32,
}

impl<'a> Tracer<'a> {
    /// Build a BVH over `triangles`.
    pub fn new(triangles: &'a [Triangle], max_depth: u32) -> Self {
        Self::with_bvh(triangles, Bvh::build(triangles), max_depth)
    }

    /// Use a prebuilt BVH, which must have been built from `triangles`.
    pub fn with_bvh(triangles: &'a [Triangle], bvh: Bvh, max_depth: u32) -> Self {
        Self {
            triangles,
            bvh,
            max_depth,
        }
    }

    pub fn triangles(&self) -> &'a [Triangle] {
        self.triangles
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn closest_hit(&self, ray: &Ray) -> Option<HitRecord> {
        self.bvh.closest_hit(self.triangles, ray)
    }

    /// Color seen along `ray` at recursion level `depth`.
    ///
    /// Returns the sky color on a miss, the material's answer on a hit, and
    /// `None` without tracing once `depth` exceeds the cap.
    pub fn trace(&self, ray: &Ray, depth: u32, rng: &mut dyn RngCore) -> Option<Color> {
        if depth > self.max_depth {
            return None;
        }

        let Some(hit) = self.closest_hit(ray) else {
            return Some(sky_color(ray));
        };

        let triangle = &self.triangles[hit.primitive];
        let ctx = ShadingContext {
            triangle,
            ray,
            hit,
            point: ray.at(hit.t),
            vertex: triangle.interpolate(hit.u, hit.v),
            depth,
        };

        let mut recursion = Recursion::new(self, depth, rng);
        triangle.material().shade(&ctx, &mut recursion)
    }
}

/// Handle a material uses to cast secondary rays.
pub struct Recursion<'a, 'r> {
    tracer: &'a Tracer<'a>,
    depth: u32,
    rng: &'r mut dyn RngCore,
}

impl<'a, 'r> Recursion<'a, 'r> {
    /// Handle for a hit at `depth`. Casts trace at `depth + 1`.
    pub fn new(tracer: &'a Tracer<'a>, depth: u32, rng: &'r mut dyn RngCore) -> Self {
        Self { tracer, depth, rng }
    }

    /// Trace `ray` one level deeper than the current hit.
    pub fn cast(&mut self, ray: &Ray) -> Option<Color> {
        self.tracer.trace(ray, self.depth + 1, &mut *self.rng)
    }

    /// Depth of the hit this handle was created for.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// The current pixel's random number generator.
    pub fn rng(&mut self) -> &mut dyn RngCore {
        &mut *self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Flat, Material};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    fn wall(material: Arc<dyn Material>) -> Vec<Triangle> {
        vec![Triangle::from_positions(
            Vec3::new(-10.0, -10.0, 4.0),
            Vec3::new(-10.0, 10.0, 4.0),
            Vec3::new(10.0, -10.0, 4.0),
            material,
        )]
    }

    #[test]
    fn test_sky_color_formula() {
        assert_eq!(sky_color(&Ray::new(Vec3::ZERO, Vec3::Y)), Color::new(255, 255, 255));
        assert_eq!(sky_color(&Ray::new(Vec3::ZERO, Vec3::NEG_Y)), Color::new(0, 102, 255));
        assert_eq!(sky_color(&Ray::new(Vec3::ZERO, Vec3::Z)), Color::new(127, 178, 255));
    }

    #[test]
    fn test_trace_hit_uses_material() {
        let tris = wall(Arc::new(Flat::new(Color::new(10, 20, 30))));
        let tracer = Tracer::new(&tris, DEFAULT_MAX_DEPTH);
        let mut rng = StdRng::seed_from_u64(1);

        let color = tracer.trace(&Ray::new(Vec3::ZERO, Vec3::new(-0.2, -0.2, 1.0)), 0, &mut rng);
        assert_eq!(color, Some(Color::new(10, 20, 30)));
    }

    #[test]
    fn test_trace_beyond_cap_is_none() {
        let tris = wall(Arc::new(Flat::new(Color::WHITE)));
        let tracer = Tracer::new(&tris, 3);
        let mut rng = StdRng::seed_from_u64(1);
        let ray = Ray::new(Vec3::ZERO, Vec3::Y);

        assert!(tracer.trace(&ray, 3, &mut rng).is_some());
        assert_eq!(tracer.trace(&ray, 4, &mut rng), None);
    }

    #[test]
    fn test_context_describes_hit() {
        let material = |ctx: &ShadingContext<'_>, recursion: &mut Recursion<'_, '_>| -> Option<Color> {
            assert_eq!(ctx.depth, 0);
            assert_eq!(recursion.depth(), 0);
            assert!((ctx.point.z - 4.0).abs() < 1e-4);
            assert!((ctx.point - ctx.vertex.position).length() < 1e-3);
            assert!((ctx.hit.t - ctx.point.length()).abs() < 1e-3);
            Some(Color::splat(7))
        };
        let tris = wall(Arc::new(material));
        let tracer = Tracer::new(&tris, DEFAULT_MAX_DEPTH);
        let mut rng = StdRng::seed_from_u64(1);

        let color = tracer.trace(&Ray::new(Vec3::ZERO, Vec3::new(-0.5, 0.1, 1.0)), 0, &mut rng);
        assert_eq!(color, Some(Color::splat(7)));
    }
}
