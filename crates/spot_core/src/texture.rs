//! Texture loading and caching for materials.
//!
//! Textures are loaded once before rendering and shared read-only between
//! materials through `Arc<Texture>`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Vec2;
use spot_math::Color;
use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture: {0}")]
    Load(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// Largest texture coordinate used for lookups, keeping `trunc(size * uv)` in range.
const MAX_UV: f32 = 0.99;

/// A loaded texture with 8-bit RGBA pixel data.
#[derive(Clone, Debug)]
pub struct Texture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Pixel data, row-major, row 0 at the top of the image
    pub pixels: Vec<[u8; 4]>,

    /// Original file path (for debugging)
    pub path: String,
}

impl Texture {
    /// Create a new texture from pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 4]>, path: impl Into<String>) -> TextureResult<Self> {
        let path = path.into();
        if width == 0 || height == 0 || pixels.len() != (width * height) as usize {
            return Err(TextureError::Load(format!(
                "{}: {} pixels for a {}x{} image",
                path,
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
            path,
        })
    }

    /// Create a solid color texture (1x1).
    pub fn solid_color(rgb: [u8; 3]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![[rgb[0], rgb[1], rgb[2], 255]],
            path: "<solid>".to_string(),
        }
    }

    /// Get the RGBA pixel at (row, column); row 0 is the top of the image.
    ///
    /// Out-of-range coordinates are clamped to the border.
    pub fn pixel(&self, row: u32, col: u32) -> [u8; 4] {
        let row = row.min(self.height - 1);
        let col = col.min(self.width - 1);
        self.pixels[(row * self.width + col) as usize]
    }

    /// Nearest-texel lookup at texture coordinate `uv`.
    ///
    /// Coordinates are clamped to `[0, 0.99]`. Rows are flipped so that
    /// `v = 0` samples the bottom row of the image.
    pub fn sample(&self, uv: Vec2) -> Color {
        let u = uv.x.clamp(0.0, MAX_UV);
        let v = uv.y.clamp(0.0, MAX_UV);

        let row = self.height - 1 - (self.height as f32 * v) as u32;
        let col = (self.width as f32 * u) as u32;

        let [r, g, b, _] = self.pixel(row, col);
        Color::from_rgb8([r, g, b])
    }

    /// Get total size in bytes (approximate).
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<[u8; 4]>()
    }
}

/// Cache for loaded textures.
///
/// Textures are loaded on-demand and cached for reuse.
pub struct TextureCache {
    /// Cached textures by file path
    textures: HashMap<String, Arc<Texture>>,

    /// Base directory for resolving relative paths
    base_dir: Option<PathBuf>,
}

impl TextureCache {
    /// Create a new empty texture cache.
    pub fn new() -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: None,
        }
    }

    /// Create a texture cache with a base directory for relative paths.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            textures: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Load a texture from file, using cache if available.
    pub fn load(&mut self, path: &str) -> TextureResult<Arc<Texture>> {
        if let Some(texture) = self.textures.get(path) {
            return Ok(texture.clone());
        }

        let full_path = self.resolve_path(path);
        let texture = Arc::new(load_texture_file(&full_path)?);
        self.textures.insert(path.to_string(), texture.clone());

        log::debug!(
            "Loaded texture: {} ({}x{}, {:.1} KB)",
            path,
            texture.width,
            texture.height,
            texture.size_bytes() as f32 / 1024.0
        );

        Ok(texture)
    }

    /// Insert an already-decoded texture under `path`.
    pub fn insert(&mut self, path: &str, texture: Texture) -> Arc<Texture> {
        let texture = Arc::new(texture);
        self.textures.insert(path.to_string(), texture.clone());
        texture
    }

    /// Check if a texture is cached.
    pub fn is_cached(&self, path: &str) -> bool {
        self.textures.contains_key(path)
    }

    /// Get the number of cached textures.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Resolve a path relative to the base directory.
    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);

        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(base) = &self.base_dir {
            base.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a texture from a file path.
fn load_texture_file(path: &Path) -> TextureResult<Texture> {
    let bytes = std::fs::read(path)?;
    let img = image::load_from_memory(&bytes)?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let pixels: Vec<[u8; 4]> = rgba.pixels().map(|p| p.0).collect();

    Texture::new(width, height, pixels, path.to_string_lossy())
}
