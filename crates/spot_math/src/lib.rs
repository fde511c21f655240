// Re-export glam for convenience
pub use glam::*;

// Spot math types
mod aabb;
mod color;
mod interval;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use color::Color;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::{rotate_x, rotate_y, rotate_z, Transform};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_creation() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(v.x, 1.0);
        assert_eq!(v.y, 2.0);
        assert_eq!(v.z, 3.0);
    }

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(a.dot(b), 32.0);
        assert_eq!(Vec3::X.cross(Vec3::Y), Vec3::Z);
    }
}
