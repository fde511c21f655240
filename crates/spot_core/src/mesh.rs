//! Mesh geometry representation.
//!
//! A `Mesh` is an indexed triangle list with one position, texture coordinate
//! and normal per vertex. Loaders (OBJ, procedural quads) fill it in; the
//! renderer turns it into triangles with `Mesh::triangles`.

use glam::{Vec2, Vec3};
use spot_math::Aabb;

use crate::obj::{MeshError, MeshResult};

/// One resolved corner of a triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshVertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
}

/// A mesh consisting of vertex positions, optional normals/UVs, and triangle indices.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional - computed by `ensure_normals` if missing)
    pub normals: Option<Vec<Vec3>>,

    /// UV coordinates (optional - one per vertex, missing UVs read as (0, 0))
    pub uvs: Option<Vec<Vec2>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,
}

impl Mesh {
    /// Create a new mesh from positions and indices, optionally with normals.
    ///
    /// If normals are not provided, they will NOT be automatically computed.
    /// Call `ensure_normals()` explicitly if you need them.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Option<Vec<Vec3>>) -> Self {
        let bounds = Aabb::from_point_cloud(&positions);
        Self {
            positions,
            normals,
            uvs: None,
            indices,
            bounds,
        }
    }

    /// Create a new mesh with UV coordinates.
    pub fn new_with_uvs(
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        normals: Option<Vec<Vec3>>,
        uvs: Option<Vec<Vec2>>,
    ) -> Self {
        Self {
            uvs,
            ..Self::new(positions, indices, normals)
        }
    }

    /// A rectangle made of two triangles `(c0, c1, c2)` and `(c0, c2, c3)`.
    ///
    /// UVs run (0,0), (1,0), (1,1), (0,1) around the corners. The visible
    /// side is the one the corners wind clockwise around, as seen by the camera.
    pub fn quad(corners: [Vec3; 4]) -> Self {
        let uvs = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let mut mesh = Self::new_with_uvs(corners.to_vec(), vec![0, 1, 2, 0, 2, 3], None, Some(uvs));
        mesh.compute_normals();
        mesh
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Face normals are the unnormalized `(p1 - p0) x (p2 - p0)`, so each face
    /// contributes in proportion to its area. Vertices touched only by
    /// degenerate faces fall back to +Y.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for face in self.indices.chunks_exact(3) {
            let i0 = face[0] as usize;
            let i1 = face[1] as usize;
            let i2 = face[2] as usize;

            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let edge1 = self.positions[i1] - p0;
            let edge2 = self.positions[i2] - p0;
            let face_normal = edge1.cross(edge2);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            *normal = normal.try_normalize().unwrap_or(Vec3::Y);
        }

        self.normals = Some(normals);
    }

    /// Check if the mesh has normals.
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Check if the mesh has UV coordinates.
    pub fn has_uvs(&self) -> bool {
        self.uvs.is_some()
    }

    /// Ensure the mesh has normals, computing them if necessary.
    /// Also recomputes if existing normals don't match vertex count.
    pub fn ensure_normals(&mut self) {
        let should_compute = match &self.normals {
            None => true,
            Some(normals) => normals.len() != self.positions.len(),
        };

        if should_compute {
            if let Some(normals) = &self.normals {
                log::debug!(
                    "Normals array length ({}) doesn't match vertex count ({}), computing smooth normals",
                    normals.len(),
                    self.positions.len()
                );
            }
            self.compute_normals();
        }
    }

    /// Append another mesh, re-basing its indices after this mesh's vertices.
    ///
    /// Attributes missing on one side are filled with defaults so the
    /// per-vertex arrays stay aligned.
    pub fn append(&mut self, other: Mesh) {
        let base = self.positions.len();
        let other_len = other.positions.len();

        self.uvs = match (self.uvs.take(), other.uvs) {
            (None, None) => None,
            (mine, theirs) => {
                let mut uvs = mine.unwrap_or_else(|| vec![Vec2::ZERO; base]);
                uvs.extend(theirs.unwrap_or_else(|| vec![Vec2::ZERO; other_len]));
                Some(uvs)
            }
        };

        self.normals = match (self.normals.take(), other.normals) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend(theirs);
                Some(mine)
            }
            // Mixed: recompute for the merged mesh below
            _ => None,
        };

        self.positions.extend(other.positions);
        self.indices
            .extend(other.indices.into_iter().map(|i| i + base as u32));
        self.bounds = Aabb::surrounding(&self.bounds, &other.bounds);
    }

    /// Check that every index and per-vertex attribute array is consistent.
    pub fn validate(&self) -> MeshResult<()> {
        let len = self.positions.len();

        if self.indices.len() % 3 != 0 {
            return Err(MeshError::Malformed(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }

        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= len) {
            return Err(MeshError::InvalidIndex {
                kind: "position",
                index: index as usize,
                len,
            });
        }

        if let Some(uvs) = &self.uvs {
            if uvs.len() != len {
                return Err(MeshError::Malformed(format!(
                    "{} texture coordinates for {} vertices",
                    uvs.len(),
                    len
                )));
            }
        }

        if let Some(normals) = &self.normals {
            if normals.len() != len {
                return Err(MeshError::Malformed(format!(
                    "{} normals for {} vertices",
                    normals.len(),
                    len
                )));
            }
        }

        Ok(())
    }

    /// Resolve vertex `index` into position, UV, and normal.
    ///
    /// Missing UVs read as (0, 0) and missing normals as zero vectors.
    pub fn vertex(&self, index: usize) -> MeshVertex {
        MeshVertex {
            position: self.positions[index],
            uv: self
                .uvs
                .as_ref()
                .and_then(|uvs| uvs.get(index).copied())
                .unwrap_or(Vec2::ZERO),
            normal: self
                .normals
                .as_ref()
                .and_then(|normals| normals.get(index).copied())
                .unwrap_or(Vec3::ZERO),
        }
    }

    /// Iterate over the triangles as resolved vertex triples.
    ///
    /// The mesh must be valid (see `validate`).
    pub fn triangles(&self) -> impl Iterator<Item = [MeshVertex; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |face| {
            [
                self.vertex(face[0] as usize),
                self.vertex(face[1] as usize),
                self.vertex(face[2] as usize),
            ]
        })
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}
