//! Triangle primitive for ray tracing.
//!
//! Uses a one-sided Möller-Trumbore test: triangles are visible only from
//! the side their winding faces (`(v2 - v1) x (v3 - v1)` pointing back at
//! the ray). Back faces and rays parallel to the plane miss.

use std::fmt;
use std::ops::{Add, Mul};
use std::sync::Arc;

use spot_core::MeshVertex;
use spot_math::{Aabb, Ray, Transform, Vec2, Vec3};

use crate::hittable::{Hittable, PrimitiveHit};
use crate::material::Material;

/// Smallest determinant accepted as a front-facing hit.
const DET_EPSILON: f32 = 1e-6;

/// A triangle corner: position, texture coordinate and shading normal.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TriangleVertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
}

impl TriangleVertex {
    pub fn new(position: Vec3, uv: Vec2, normal: Vec3) -> Self {
        Self {
            position,
            uv,
            normal,
        }
    }

    /// Blend three corners with barycentric weights `(1 - u - v, u, v)`.
    pub fn interpolate(a: &Self, b: &Self, c: &Self, u: f32, v: f32) -> Self {
        *a * (1.0 - u - v) + *b * u + *c * v
    }

    /// Apply a placement: positions are rotated and displaced, normals only rotated.
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            position: transform.apply_point(self.position),
            uv: self.uv,
            normal: transform.apply_vector(self.normal),
        }
    }
}

impl Add for TriangleVertex {
    type Output = TriangleVertex;

    fn add(self, rhs: TriangleVertex) -> TriangleVertex {
        TriangleVertex::new(
            self.position + rhs.position,
            self.uv + rhs.uv,
            self.normal + rhs.normal,
        )
    }
}

impl Mul<f32> for TriangleVertex {
    type Output = TriangleVertex;

    fn mul(self, s: f32) -> TriangleVertex {
        TriangleVertex::new(self.position * s, self.uv * s, self.normal * s)
    }
}

impl From<MeshVertex> for TriangleVertex {
    fn from(v: MeshVertex) -> Self {
        Self::new(v.position, v.uv, v.normal)
    }
}

/// A triangle with a shared material.
#[derive(Clone)]
pub struct Triangle {
    vertices: [TriangleVertex; 3],
    material: Arc<dyn Material>,
}

impl Triangle {
    /// Create a new triangle from three corners.
    pub fn new(
        v1: TriangleVertex,
        v2: TriangleVertex,
        v3: TriangleVertex,
        material: Arc<dyn Material>,
    ) -> Self {
        Self {
            vertices: [v1, v2, v3],
            material,
        }
    }

    /// Create a triangle from bare positions (zero UVs, normal from the winding).
    pub fn from_positions(p1: Vec3, p2: Vec3, p3: Vec3, material: Arc<dyn Material>) -> Self {
        let normal = (p2 - p1).cross(p3 - p1).normalize_or_zero();
        Self::new(
            TriangleVertex::new(p1, Vec2::ZERO, normal),
            TriangleVertex::new(p2, Vec2::ZERO, normal),
            TriangleVertex::new(p3, Vec2::ZERO, normal),
            material,
        )
    }

    /// Create a triangle from three resolved mesh corners.
    pub fn from_mesh_vertices(corners: [MeshVertex; 3], material: Arc<dyn Material>) -> Self {
        let [a, b, c] = corners;
        Self::new(a.into(), b.into(), c.into(), material)
    }

    pub fn vertices(&self) -> &[TriangleVertex; 3] {
        &self.vertices
    }

    pub fn material(&self) -> &dyn Material {
        self.material.as_ref()
    }

    /// Interpolated corner attributes at barycentric `(u, v)`.
    pub fn interpolate(&self, u: f32, v: f32) -> TriangleVertex {
        let [a, b, c] = &self.vertices;
        TriangleVertex::interpolate(a, b, c, u, v)
    }

    /// A copy of this triangle with every corner placed by `transform`.
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            vertices: self.vertices.map(|v| v.transformed(transform)),
            material: Arc::clone(&self.material),
        }
    }

    /// Unnormalized face normal `(v2 - v1) x (v3 - v1)`.
    pub fn face_normal(&self) -> Vec3 {
        let [a, b, c] = &self.vertices;
        (b.position - a.position).cross(c.position - a.position)
    }
}

impl Hittable for Triangle {
    fn intersect(&self, ray: &Ray) -> Option<PrimitiveHit> {
        let [a, b, c] = &self.vertices;
        let e1 = b.position - a.position;
        let e2 = c.position - a.position;
        let n = e1.cross(e2);

        let d = ray.direction();
        let det = -d.dot(n);

        // Back face or parallel
        if det < DET_EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let ao = ray.origin() - a.position;
        let dao = ao.cross(d);

        let u = e2.dot(dao) * inv_det;
        let v = -e1.dot(dao) * inv_det;
        let t = ao.dot(n) * inv_det;

        if t >= 0.0 && u >= 0.0 && v >= 0.0 && u + v <= 1.0 {
            Some(PrimitiveHit { t, u, v })
        } else {
            None
        }
    }

    fn bounding_box(&self) -> Aabb {
        let [a, b, c] = &self.vertices;
        Aabb::from_points(
            a.position.min(b.position).min(c.position),
            a.position.max(b.position).max(c.position),
        )
    }
}

impl fmt::Debug for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Triangle")
            .field("vertices", &self.vertices)
            .finish_non_exhaustive()
    }
}
