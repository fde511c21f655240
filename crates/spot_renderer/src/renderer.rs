//! Frame rendering.
//!
//! One primary ray per pixel, traced in parallel with rayon. Each pixel gets
//! its own RNG so scatter materials never share state between threads and a
//! fixed seed reproduces the same image.

use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use spot_core::Mesh;
use spot_math::{Color, Ray, Transform};

use crate::shading::{Tracer, DEFAULT_MAX_DEPTH};
use crate::{Camera, Material, Triangle};

/// Spreads consecutive pixel indices across the seed space.
const GOLDEN: u64 = 0x9E37_79B9_7F4A_7C15;

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Hard cap on recursion depth
    pub max_depth: u32,
    /// Seed for per-pixel RNGs; `None` draws from OS entropy
    pub seed: Option<u64>,
    /// Trace pixels on the rayon pool; `false` renders on the calling thread
    pub parallel: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            seed: None,
            parallel: true,
        }
    }
}

/// Simple image buffer for storing render output.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    /// Row-major, row 0 at the top
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::BLACK; (width * height) as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Clamp to 8-bit RGB, row-major.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for color in &self.pixels {
            bytes.extend_from_slice(&color.to_rgb8());
        }
        bytes
    }
}

/// Triangles making up one frame.
///
/// Primitive indices in hit records refer to the order triangles were added.
#[derive(Default, Clone)]
pub struct Scene {
    triangles: Vec<Triangle>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn add_triangles(&mut self, triangles: impl IntoIterator<Item = Triangle>) {
        self.triangles.extend(triangles);
    }

    /// Add every triangle of `mesh` with one material, placed by `transform`.
    pub fn add_mesh(&mut self, mesh: &Mesh, material: Arc<dyn Material>, transform: &Transform) {
        let before = self.triangles.len();
        self.triangles.extend(mesh.triangles().map(|corners| {
            Triangle::from_mesh_vertices(corners, Arc::clone(&material)).transformed(transform)
        }));
        log::debug!("Added {} triangles", self.triangles.len() - before);
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn clear(&mut self) {
        self.triangles.clear();
    }

    /// Render this scene; see [`render`].
    pub fn render(&self, camera: &Camera, config: &RenderConfig) -> ImageBuffer {
        render(&self.triangles, camera, config)
    }
}

/// RNG for pixel `index`.
fn pixel_rng(seed: Option<u64>, index: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed ^ (index as u64).wrapping_mul(GOLDEN)),
        None => StdRng::from_entropy(),
    }
}

/// Color of one primary ray. A ray with no contribution renders black.
fn render_pixel(tracer: &Tracer<'_>, ray: &Ray, index: usize, seed: Option<u64>) -> Color {
    let mut rng = pixel_rng(seed, index);
    tracer.trace(ray, 0, &mut rng).unwrap_or(Color::BLACK)
}

/// Render `triangles` as seen from `camera`.
///
/// Builds a fresh BVH, then traces every pixel.
pub fn render(triangles: &[Triangle], camera: &Camera, config: &RenderConfig) -> ImageBuffer {
    let start = Instant::now();
    let tracer = Tracer::new(triangles, config.max_depth);
    let rays = camera.rays();
    let seed = config.seed;

    let pixels: Vec<Color> = if config.parallel {
        rays.par_iter()
            .enumerate()
            .map(|(index, ray)| render_pixel(&tracer, ray, index, seed))
            .collect()
    } else {
        rays.iter()
            .enumerate()
            .map(|(index, ray)| render_pixel(&tracer, ray, index, seed))
            .collect()
    };

    log::debug!(
        "Rendered {}x{} ({} triangles) in {:.2?}",
        camera.image_width,
        camera.image_height,
        triangles.len(),
        start.elapsed()
    );

    ImageBuffer {
        width: camera.image_width,
        height: camera.image_height,
        pixels,
    }
}
