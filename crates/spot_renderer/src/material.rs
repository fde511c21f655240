//! Materials decide the color of a hit.
//!
//! A material sees the hit through a `ShadingContext` and may cast further
//! rays through the `Recursion` handle. Returning `None` means the surface
//! makes no contribution (e.g. a mirror that ran out of depth).

use std::sync::Arc;

use rand::{Rng, RngCore};
use spot_core::{MaterialDesc, Texture, TextureCache, TextureError};
use spot_math::{Color, Ray, Vec3};
use thiserror::Error;

use crate::shading::{Recursion, ShadingContext, SURFACE_OFFSET};

/// Normals shorter than this (squared) cannot define a reflection.
const DEGENERATE_NORMAL: f32 = 1e-12;

/// Amplitude of the procedural sine band.
const BAND_AMPLITUDE: f32 = 126.0;

/// Errors raised while building materials from a scene description.
#[derive(Error, Debug)]
pub enum MaterialError {
    #[error("Texture error: {0}")]
    Texture(#[from] TextureError),
}

/// Trait for surface shading.
pub trait Material: Send + Sync {
    /// Color of the hit described by `ctx`, or `None` for no contribution.
    fn shade(&self, ctx: &ShadingContext<'_>, recursion: &mut Recursion<'_, '_>) -> Option<Color>;
}

impl<F> Material for F
where
    F: Fn(&ShadingContext<'_>, &mut Recursion<'_, '_>) -> Option<Color> + Send + Sync,
{
    fn shade(&self, ctx: &ShadingContext<'_>, recursion: &mut Recursion<'_, '_>) -> Option<Color> {
        self(ctx, recursion)
    }
}

/// Constant color.
#[derive(Debug, Clone, Copy)]
pub struct Flat {
    color: Color,
}

impl Flat {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Material for Flat {
    fn shade(&self, _ctx: &ShadingContext<'_>, _recursion: &mut Recursion<'_, '_>) -> Option<Color> {
        Some(self.color)
    }
}

/// Nearest-texel lookup at the interpolated texture coordinate.
#[derive(Debug, Clone)]
pub struct Textured {
    texture: Arc<Texture>,
}

impl Textured {
    pub fn new(texture: Arc<Texture>) -> Self {
        Self { texture }
    }
}

impl Material for Textured {
    fn shade(&self, ctx: &ShadingContext<'_>, _recursion: &mut Recursion<'_, '_>) -> Option<Color> {
        Some(self.texture.sample(ctx.vertex.uv))
    }
}

/// Base color for `Procedural`.
#[derive(Debug, Clone)]
pub enum ProceduralBase {
    Texture(Arc<Texture>),
    Tint(Color),
}

/// Halved base color plus a sine band over `x + y + z` of the hit point.
///
/// Changing `phase` between frames makes the bands move.
#[derive(Debug, Clone)]
pub struct Procedural {
    base: ProceduralBase,
    frequency: f32,
    phase: f32,
}

impl Procedural {
    pub const DEFAULT_FREQUENCY: f32 = 20.0;

    pub fn new(base: ProceduralBase, frequency: f32, phase: f32) -> Self {
        Self {
            base,
            frequency,
            phase,
        }
    }

    pub fn with_texture(texture: Arc<Texture>) -> Self {
        Self::new(ProceduralBase::Texture(texture), Self::DEFAULT_FREQUENCY, 0.0)
    }

    pub fn with_tint(tint: Color) -> Self {
        Self::new(ProceduralBase::Tint(tint), Self::DEFAULT_FREQUENCY, 0.0)
    }
}

impl Material for Procedural {
    fn shade(&self, ctx: &ShadingContext<'_>, _recursion: &mut Recursion<'_, '_>) -> Option<Color> {
        let base = match &self.base {
            ProceduralBase::Texture(texture) => texture.sample(ctx.vertex.uv),
            ProceduralBase::Tint(tint) => *tint,
        };

        let p = ctx.point;
        let band = (BAND_AMPLITUDE * (self.frequency * (p.x + p.y + p.z) + self.phase).sin()) as i32;
        Some((base / 2).offset(band))
    }
}

/// Unit reflection of the incoming ray about the interpolated normal.
///
/// `None` when the normal is too short to normalize.
pub fn reflect(ctx: &ShadingContext<'_>) -> Option<Vec3> {
    let n = ctx.vertex.normal;
    if n.length_squared() < DEGENERATE_NORMAL {
        return None;
    }
    let n = n.normalize();
    let d = ctx.ray.direction();
    Some(d - 2.0 * d.dot(n) * n)
}

/// Secondary ray leaving the hit point along `direction`.
fn bounce(ctx: &ShadingContext<'_>, direction: Vec3) -> Ray {
    Ray::new(ctx.point + direction * SURFACE_OFFSET, direction)
}

/// Perfect mirror.
#[derive(Debug, Clone, Copy)]
pub struct Mirror {
    max_depth: u32,
}

impl Mirror {
    pub fn new(max_depth: u32) -> Self {
        Self { max_depth }
    }
}

impl Material for Mirror {
    fn shade(&self, ctx: &ShadingContext<'_>, recursion: &mut Recursion<'_, '_>) -> Option<Color> {
        if ctx.depth >= self.max_depth {
            return None;
        }
        let r = reflect(ctx)?;
        recursion.cast(&bounce(ctx, r))
    }
}

/// Glossy reflection: the average of several jittered mirror rays.
#[derive(Debug, Clone, Copy)]
pub struct Scatter {
    samples: u32,
    jitter: f32,
    max_depth: u32,
}

impl Scatter {
    pub fn new(samples: u32, jitter: f32, max_depth: u32) -> Self {
        Self {
            samples,
            jitter,
            max_depth,
        }
    }
}

impl Material for Scatter {
    fn shade(&self, ctx: &ShadingContext<'_>, recursion: &mut Recursion<'_, '_>) -> Option<Color> {
        if ctx.depth >= self.max_depth {
            return None;
        }
        let r = reflect(ctx)?;

        let mut colors = Vec::with_capacity(self.samples as usize);
        for _ in 0..self.samples {
            let offset = self.jitter * random_unit_vector(recursion.rng());
            let color = (r + offset)
                .try_normalize()
                .and_then(|direction| recursion.cast(&bounce(ctx, direction)));
            colors.push(color);
        }

        Color::average(colors)
    }
}

/// Uniformly distributed direction on the unit sphere.
pub fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        let len_sq = p.length_squared();
        if 1e-12 < len_sq && len_sq <= 1.0 {
            return p / len_sq.sqrt();
        }
    }
}

/// Build the material an object description asks for.
///
/// Textures are loaded through `textures` so objects sharing an image share
/// one copy. `frame` advances procedural phases.
pub fn from_description(
    desc: &MaterialDesc,
    textures: &mut TextureCache,
    frame: u32,
) -> Result<Arc<dyn Material>, MaterialError> {
    let material: Arc<dyn Material> = match desc {
        MaterialDesc::Flat { color } => Arc::new(Flat::new(Color::new(color[0], color[1], color[2]))),
        MaterialDesc::Textured { texture } => Arc::new(Textured::new(textures.load(texture)?)),
        MaterialDesc::Procedural {
            texture,
            tint,
            frequency,
            phase,
            phase_per_frame,
        } => {
            let base = match texture {
                Some(path) => ProceduralBase::Texture(textures.load(path)?),
                None => ProceduralBase::Tint(Color::new(tint[0], tint[1], tint[2])),
            };
            Arc::new(Procedural::new(
                base,
                *frequency,
                phase + phase_per_frame * frame as f32,
            ))
        }
        MaterialDesc::Mirror { max_depth } => Arc::new(Mirror::new(*max_depth)),
        MaterialDesc::Scatter {
            samples,
            jitter,
            max_depth,
        } => Arc::new(Scatter::new(*samples, *jitter, *max_depth)),
    };
    Ok(material)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::Tracer;
    use crate::triangle::{Triangle, TriangleVertex};
    use crate::HitRecord;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use spot_math::Vec2;

    fn flat_triangle() -> Triangle {
        Triangle::from_positions(Vec3::ZERO, Vec3::X, Vec3::Y, Arc::new(Flat::new(Color::BLACK)))
    }

    fn context<'a>(
        triangle: &'a Triangle,
        ray: &'a Ray,
        point: Vec3,
        vertex: TriangleVertex,
    ) -> ShadingContext<'a> {
        ShadingContext {
            triangle,
            ray,
            hit: HitRecord {
                primitive: 0,
                t: 1.0,
                u: 0.0,
                v: 0.0,
            },
            point,
            vertex,
            depth: 0,
        }
    }

    #[test]
    fn test_procedural_band() {
        let tri = flat_triangle();
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let vertex = TriangleVertex::new(Vec3::ZERO, Vec2::ZERO, Vec3::Z);

        let empty: Vec<Triangle> = Vec::new();
        let tracer = Tracer::new(&empty, 4);
        let mut rng = StdRng::seed_from_u64(0);
        let mut recursion = Recursion::new(&tracer, 0, &mut rng);

        let material = Procedural::with_tint(Color::new(200, 100, 50));

        // sin(0) = 0: base halved only
        let ctx = context(&tri, &ray, Vec3::ZERO, vertex);
        assert_eq!(material.shade(&ctx, &mut recursion), Some(Color::new(100, 50, 25)));

        // frequency * (x + y + z) = pi / 2: full band
        let ctx = context(&tri, &ray, Vec3::new(std::f32::consts::PI / 40.0, 0.0, 0.0), vertex);
        assert_eq!(material.shade(&ctx, &mut recursion), Some(Color::new(226, 176, 151)));

        // Phase shifts the band back to zero
        let shifted = Procedural::new(
            ProceduralBase::Tint(Color::new(200, 100, 50)),
            Procedural::DEFAULT_FREQUENCY,
            -std::f32::consts::FRAC_PI_2,
        );
        assert_eq!(shifted.shade(&ctx, &mut recursion), Some(Color::new(100, 50, 25)));
    }

    #[test]
    fn test_textured_samples_uv() {
        let tri = flat_triangle();
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let empty: Vec<Triangle> = Vec::new();
        let tracer = Tracer::new(&empty, 4);
        let mut rng = StdRng::seed_from_u64(0);
        let mut recursion = Recursion::new(&tracer, 0, &mut rng);

        let texture = Texture::new(
            1,
            2,
            vec![[255, 0, 0, 255], [0, 0, 255, 255]],
            "strip",
        )
        .unwrap();
        let material = Textured::new(Arc::new(texture));

        let low = TriangleVertex::new(Vec3::ZERO, Vec2::new(0.5, 0.1), Vec3::Z);
        let high = TriangleVertex::new(Vec3::ZERO, Vec2::new(0.5, 0.9), Vec3::Z);
        assert_eq!(
            material.shade(&context(&tri, &ray, Vec3::ZERO, low), &mut recursion),
            Some(Color::new(0, 0, 255))
        );
        assert_eq!(
            material.shade(&context(&tri, &ray, Vec3::ZERO, high), &mut recursion),
            Some(Color::new(255, 0, 0))
        );
    }

    #[test]
    fn test_mirror_sees_sky_in_empty_scene() {
        let tri = flat_triangle();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, -1.0, 1.0));
        let vertex = TriangleVertex::new(Vec3::ZERO, Vec2::ZERO, Vec3::Y);
        let ctx = context(&tri, &ray, Vec3::ZERO, vertex);

        let empty: Vec<Triangle> = Vec::new();
        let tracer = Tracer::new(&empty, 4);
        let mut rng = StdRng::seed_from_u64(0);
        let mut recursion = Recursion::new(&tracer, 0, &mut rng);

        let reflected = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(
            Mirror::new(4).shade(&ctx, &mut recursion),
            Some(crate::shading::sky_color(&reflected))
        );
        // No depth budget left
        assert_eq!(Mirror::new(0).shade(&ctx, &mut recursion), None);
    }

    #[test]
    fn test_scatter_averages_samples() {
        let tri = flat_triangle();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, -1.0, 1.0));
        let vertex = TriangleVertex::new(Vec3::ZERO, Vec2::ZERO, Vec3::Y);
        let ctx = context(&tri, &ray, Vec3::ZERO, vertex);

        let empty: Vec<Triangle> = Vec::new();
        let tracer = Tracer::new(&empty, 4);
        let mut rng = StdRng::seed_from_u64(9);
        let mut recursion = Recursion::new(&tracer, 0, &mut rng);

        // Zero jitter: every sample is the mirror ray
        let reflected = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 1.0));
        assert_eq!(
            Scatter::new(5, 0.0, 4).shade(&ctx, &mut recursion),
            Some(crate::shading::sky_color(&reflected))
        );

        // Jittered samples still land in the sky, blue channel is always 255
        let color = Scatter::new(8, 0.3, 4).shade(&ctx, &mut recursion).unwrap();
        assert_eq!(color.b, 255);

        let degenerate = context(&tri, &ray, Vec3::ZERO, TriangleVertex::default());
        assert_eq!(Scatter::new(8, 0.3, 4).shade(&degenerate, &mut recursion), None);
    }

    #[test]
    fn test_reflect_law() {
        let tri = flat_triangle();
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, -2.0, 3.0));
        let normal = Vec3::new(0.3, 1.0, -0.2);
        let ctx = context(&tri, &ray, Vec3::ZERO, TriangleVertex::new(Vec3::ZERO, Vec2::ZERO, normal));

        let r = reflect(&ctx).unwrap();
        let n = normal.normalize();
        let d = ray.direction();
        assert!((r.dot(n) + d.dot(n)).abs() < 1e-5);
        assert!((r.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_reflect_degenerate_normal() {
        let tri = flat_triangle();
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let ctx = context(&tri, &ray, Vec3::ZERO, TriangleVertex::default());
        assert!(reflect(&ctx).is_none());
    }

    #[test]
    fn test_random_unit_vector_is_unit() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let v = random_unit_vector(&mut rng);
            assert!((v.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_from_description() {
        let mut textures = TextureCache::new();
        textures.insert("red.png", Texture::solid_color([255, 0, 0]));

        let descs = [
            MaterialDesc::Flat { color: [1, 2, 3] },
            MaterialDesc::Textured {
                texture: "red.png".to_string(),
            },
            MaterialDesc::Procedural {
                texture: None,
                tint: [40, 40, 40],
                frequency: 20.0,
                phase: 0.0,
                phase_per_frame: 0.5,
            },
            MaterialDesc::Mirror { max_depth: 2 },
            MaterialDesc::Scatter {
                samples: 4,
                jitter: 0.1,
                max_depth: 2,
            },
        ];
        for desc in &descs {
            assert!(from_description(desc, &mut textures, 3).is_ok());
        }

        let missing = MaterialDesc::Textured {
            texture: "/no/such/texture.png".to_string(),
        };
        assert!(matches!(
            from_description(&missing, &mut textures, 0),
            Err(MaterialError::Texture(_))
        ));
    }
}
