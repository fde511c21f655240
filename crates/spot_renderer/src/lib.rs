//! Spot Renderer - depth-bounded Whitted-style ray tracing on the CPU.
//!
//! Triangles are collected into a [`Scene`], a SAH BVH is built per render,
//! and every pixel's primary ray is shaded through its triangle's
//! [`Material`]. Materials may cast reflection rays through a [`Recursion`]
//! handle; depth caps keep the recursion finite.

mod bvh;
mod camera;
mod hittable;
pub mod image_out;
pub mod material;
mod renderer;
mod shading;
mod triangle;

pub use bvh::{Bvh, BvhNode, LEAF_MAX_SIZE};
pub use camera::Camera;
pub use hittable::{closest_hit_linear, HitRecord, Hittable, PrimitiveHit};
pub use image_out::{write_png, OutputError};
pub use material::{
    from_description, Flat, Material, MaterialError, Mirror, Procedural, ProceduralBase, Scatter,
    Textured,
};
pub use renderer::{render, ImageBuffer, RenderConfig, Scene};
pub use shading::{
    sky_color, Recursion, ShadingContext, Tracer, DEFAULT_MAX_DEPTH, SURFACE_OFFSET,
};
pub use triangle::{Triangle, TriangleVertex};

/// Re-export math types from spot_math
pub use spot_math::{Aabb, Color, Interval, Ray, Transform, Vec2, Vec3};
