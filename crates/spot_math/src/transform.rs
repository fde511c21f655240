// Per-instance placement of mesh geometry.
//
// Rotations are fixed-axis Euler rotations applied X, then Y, then Z, followed
// by the displacement. Normals only see the rotation.

use glam::Vec3;

/// Rotate a vector around the X axis by `angle` radians.
pub fn rotate_x(p: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(p.x, p.y * c - p.z * s, p.y * s + p.z * c)
}

/// Rotate a vector around the Y axis by `angle` radians.
pub fn rotate_y(p: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(p.x * c + p.z * s, p.y, -p.x * s + p.z * c)
}

/// Rotate a vector around the Z axis by `angle` radians.
pub fn rotate_z(p: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(p.x * c - p.y * s, p.x * s + p.y * c, p.z)
}

/// Displacement plus Euler rotation of a mesh instance.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    /// Translation applied after the rotation
    pub displacement: Vec3,
    /// Euler angles in radians, applied X then Y then Z
    pub rotation: Vec3,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        displacement: Vec3::ZERO,
        rotation: Vec3::ZERO,
    };

    pub fn new(displacement: Vec3, rotation: Vec3) -> Self {
        Self {
            displacement,
            rotation,
        }
    }

    /// A pure translation.
    pub fn translation(displacement: Vec3) -> Self {
        Self::new(displacement, Vec3::ZERO)
    }

    /// A pure rotation.
    pub fn rotation(rotation: Vec3) -> Self {
        Self::new(Vec3::ZERO, rotation)
    }

    /// Transform a direction (rotation only, no translation).
    pub fn apply_vector(&self, v: Vec3) -> Vec3 {
        let v = rotate_x(v, self.rotation.x);
        let v = rotate_y(v, self.rotation.y);
        rotate_z(v, self.rotation.z)
    }

    /// Transform a position (rotation, then translation).
    pub fn apply_point(&self, p: Vec3) -> Vec3 {
        self.apply_vector(p) + self.displacement
    }
}
