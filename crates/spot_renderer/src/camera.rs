//! Pinhole camera for primary ray generation.

use spot_math::{Ray, Vec3};

/// Pinhole camera looking down +Z with a 90 degree field of view.
///
/// The image plane spans `[-1, 1]` in x and y at distance 1 from the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub origin: Vec3,
    pub image_width: u32,
    pub image_height: u32,
}

impl Camera {
    /// Create a new camera at `origin`.
    pub fn new(origin: Vec3, image_width: u32, image_height: u32) -> Self {
        Self {
            origin,
            image_width,
            image_height,
        }
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set the eye position.
    pub fn with_origin(mut self, origin: Vec3) -> Self {
        self.origin = origin;
        self
    }

    pub fn pixel_count(&self) -> usize {
        self.image_width as usize * self.image_height as usize
    }

    /// Primary ray through pixel (`row`, `col`); row 0 is the top of the image.
    pub fn get_ray(&self, row: u32, col: u32) -> Ray {
        let w = self.image_width as f32;
        let h = self.image_height as f32;
        let direction = Vec3::new(
            -1.0 + 2.0 * col as f32 / w,
            1.0 - 2.0 * row as f32 / h,
            1.0,
        );
        Ray::new(self.origin, direction)
    }

    /// Every primary ray, in row-major order.
    pub fn rays(&self) -> Vec<Ray> {
        (0..self.image_height)
            .flat_map(|row| (0..self.image_width).map(move |col| self.get_ray(row, col)))
            .collect()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 400, 400)
    }
}
