//! Spot Core - scene inputs for the Spot ray tracer.
//!
//! This crate provides:
//!
//! - **Meshes**: indexed triangle geometry and Wavefront OBJ loading
//! - **Textures**: image loading and nearest-texel lookup, cached by path
//! - **Scene descriptions**: JSON files naming objects, materials and frames
//!
//! # Example
//!
//! ```ignore
//! use spot_core::{load_obj, SceneDescription};
//!
//! let scene = SceneDescription::load("scenes/cow.json")?;
//! let mesh = load_obj(scene.resolve_path("spot_triangulated.obj"))?;
//! println!("{} triangles", mesh.triangle_count());
//! ```

pub mod mesh;
pub mod obj;
pub mod scene;
pub mod texture;

// Re-export commonly used types
pub use mesh::{Mesh, MeshVertex};
pub use obj::{load_obj, parse_obj, MeshError, MeshResult};
pub use scene::{
    CameraDesc, MaterialDesc, ObjectDesc, SceneDescription, SceneError, SceneResult, SourceDesc,
};
pub use texture::{Texture, TextureCache, TextureError, TextureResult};
