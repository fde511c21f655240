//! Scene description files.
//!
//! A scene description is a JSON document naming the image size, the camera,
//! how many frames to render, and a list of objects. Each object is either an
//! OBJ mesh or an inline quad, placed with a displacement and an Euler
//! rotation that may advance every frame.
//!
//! ```json
//! {
//!   "width": 400,
//!   "height": 400,
//!   "frames": 50,
//!   "camera": { "origin": [0, 0, 0] },
//!   "output_prefix": "cow",
//!   "objects": [
//!     {
//!       "source": { "mesh": "spot_triangulated.obj" },
//!       "material": { "type": "textured", "texture": "spot_texture.png" },
//!       "displacement": [0, 0, 1.5],
//!       "rotation_per_frame": [0.0628, 0.0628, 0]
//!     }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use spot_math::{Transform, Vec3};
use thiserror::Error;

/// Errors that can occur while reading a scene description.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid scene: {0}")]
    Invalid(String),
}

pub type SceneResult<T> = Result<T, SceneError>;

fn default_frames() -> u32 {
    1
}

fn default_output_prefix() -> String {
    "frame".to_string()
}

fn default_frequency() -> f32 {
    20.0
}

/// Top-level scene description.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SceneDescription {
    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Number of frames to render
    #[serde(default = "default_frames")]
    pub frames: u32,

    #[serde(default)]
    pub camera: CameraDesc,

    /// Hard recursion cap for the tracer; the renderer default applies when absent
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Seed for reproducible scatter sampling
    #[serde(default)]
    pub seed: Option<u64>,

    /// Output files are named `<output_prefix><frame>.png`
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,

    pub objects: Vec<ObjectDesc>,

    /// Directory of the scene file, used to resolve relative paths
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct CameraDesc {
    #[serde(default)]
    pub origin: [f32; 3],
}

impl CameraDesc {
    pub fn origin(&self) -> Vec3 {
        Vec3::from_array(self.origin)
    }
}

/// Where an object's triangles come from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceDesc {
    /// Path to an OBJ file
    Mesh(String),
    /// Four corners of a planar quad, in winding order
    Quad([[f32; 3]; 4]),
}

/// Material attached to every triangle of an object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialDesc {
    Flat {
        color: [i32; 3],
    },
    Textured {
        texture: String,
    },
    /// Texture or tint, halved, plus a sine band over `x + y + z`.
    Procedural {
        #[serde(default)]
        texture: Option<String>,
        #[serde(default)]
        tint: [i32; 3],
        #[serde(default = "default_frequency")]
        frequency: f32,
        #[serde(default)]
        phase: f32,
        /// Added to `phase` once per frame
        #[serde(default)]
        phase_per_frame: f32,
    },
    Mirror {
        max_depth: u32,
    },
    Scatter {
        samples: u32,
        jitter: f32,
        max_depth: u32,
    },
}

impl MaterialDesc {
    /// Texture path referenced by this material, if any.
    pub fn texture(&self) -> Option<&str> {
        match self {
            MaterialDesc::Textured { texture } => Some(texture),
            MaterialDesc::Procedural { texture, .. } => texture.as_deref(),
            _ => None,
        }
    }
}

/// One object in the scene.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectDesc {
    pub source: SourceDesc,

    pub material: MaterialDesc,

    #[serde(default)]
    pub displacement: [f32; 3],

    /// Euler angles in radians at frame 0
    #[serde(default)]
    pub rotation: [f32; 3],

    /// Euler angles added per frame
    #[serde(default)]
    pub rotation_per_frame: [f32; 3],
}

impl ObjectDesc {
    /// Placement of this object at `frame`.
    pub fn transform_at(&self, frame: u32) -> Transform {
        let rotation =
            Vec3::from_array(self.rotation) + Vec3::from_array(self.rotation_per_frame) * frame as f32;
        Transform::new(Vec3::from_array(self.displacement), rotation)
    }
}

impl SceneDescription {
    /// Load and validate a scene description file.
    ///
    /// Relative mesh and texture paths resolve against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut scene = Self::parse(&content)?;
        scene.base_dir = path.parent().map(Path::to_path_buf);

        log::info!(
            "Loaded scene {}: {}x{}, {} objects, {} frames",
            path.display(),
            scene.width,
            scene.height,
            scene.objects.len(),
            scene.frames
        );

        Ok(scene)
    }

    /// Parse and validate scene description JSON.
    pub fn parse(content: &str) -> SceneResult<Self> {
        let scene: SceneDescription = serde_json::from_str(content)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Check values that JSON typing alone cannot rule out.
    pub fn validate(&self) -> SceneResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SceneError::Invalid(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }

        for (i, object) in self.objects.iter().enumerate() {
            match &object.material {
                MaterialDesc::Scatter { samples: 0, .. } => {
                    return Err(SceneError::Invalid(format!(
                        "object {}: scatter material needs at least one sample",
                        i
                    )));
                }
                MaterialDesc::Procedural { texture: None, tint, .. } if *tint == [0, 0, 0] => {
                    log::warn!("object {}: procedural material has neither texture nor tint", i);
                }
                _ => {}
            }

            if let SourceDesc::Mesh(path) = &object.source {
                if path.is_empty() {
                    return Err(SceneError::Invalid(format!("object {}: empty mesh path", i)));
                }
            }
        }

        Ok(())
    }

    /// Resolve a path from the description against the scene file's directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}
