use crate::{Interval, Ray, Vec3};

/// Axis-Aligned Bounding Box for the BVH.
///
/// An AABB is defined by three intervals (one per axis) that bound a 3D volume.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Create an AABB from two corner points.
    ///
    /// Flat boxes are padded so every axis has a minimal positive extent.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let x = Interval::new(a.x.min(b.x), a.x.max(b.x));
        let y = Interval::new(a.y.min(b.y), a.y.max(b.y));
        let z = Interval::new(a.z.min(b.z), a.z.max(b.z));

        let mut aabb = Self { x, y, z };
        aabb.pad_to_minimums();
        aabb
    }

    /// Create the tightest (padded) AABB around a set of points.
    pub fn from_point_cloud(points: &[Vec3]) -> Self {
        let mut iter = points.iter();
        match iter.next() {
            None => Aabb::EMPTY,
            Some(&first) => {
                let (min, max) = iter.fold((first, first), |(min, max), &p| (min.min(p), max.max(p)));
                Aabb::from_points(min, max)
            }
        }
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// Returns true if this box contains nothing.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() || self.y.is_empty() || self.z.is_empty()
    }

    /// Returns true if `other` lies entirely inside this box.
    pub fn encloses(&self, other: &Aabb) -> bool {
        self.x.encloses(&other.x) && self.y.encloses(&other.y) && self.z.encloses(&other.z)
    }

    /// Entry distance of a ray into this box, clipped to `ray_t`.
    ///
    /// Uses the slab method. Returns `None` when the ray misses the box or the
    /// overlap with `ray_t` is empty. A ray starting inside the box enters at `ray_t.min`.
    pub fn hit_distance(&self, r: &Ray, mut ray_t: Interval) -> Option<f32> {
        let origin = r.origin();
        let direction = r.direction();

        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let (o, d) = (origin[axis], direction[axis]);

            if d == 0.0 {
                // Parallel to the slab: inside it for every t, or never.
                if o < slab.min || o > slab.max {
                    return None;
                }
                continue;
            }

            let adinv = 1.0 / d;
            let mut t0 = (slab.min - o) * adinv;
            let mut t1 = (slab.max - o) * adinv;
            if adinv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            ray_t.min = t0.max(ray_t.min);
            ray_t.max = t1.min(ray_t.max);
            if ray_t.max < ray_t.min {
                return None;
            }
        }

        Some(ray_t.min)
    }

    /// Surface area, used as the SAH cost weight. Empty boxes have zero area.
    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let (dx, dy, dz) = (self.x.size(), self.y.size(), self.z.size());
        2.0 * (dx * dy + dy * dz + dz * dx)
    }

    /// Pad intervals to avoid zero-width AABBs (degenerate cases).
    fn pad_to_minimums(&mut self) {
        let delta = 0.0001;
        if self.x.size() < delta {
            self.x = self.x.expand(delta);
        }
        if self.y.size() < delta {
            self.y = self.y.expand(delta);
        }
        if self.z.size() < delta {
            self.z = self.z.expand(delta);
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        Vec3::new(
            (self.x.min + self.x.max) * 0.5,
            (self.y.min + self.y.max) * 0.5,
            (self.z.min + self.z.max) * 0.5,
        )
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_from_points() {
        let aabb = Aabb::from_points(Vec3::new(10.0, 0.0, 10.0), Vec3::new(0.0, 10.0, 0.0));

        assert_eq!(aabb.x.min, 0.0);
        assert_eq!(aabb.x.max, 10.0);
        assert_eq!(aabb.y.min, 0.0);
        assert_eq!(aabb.y.max, 10.0);
        assert_eq!(aabb.z.min, 0.0);
        assert_eq!(aabb.z.max, 10.0);
    }

    #[test]
    fn test_aabb_flat_box_is_padded() {
        let aabb = Aabb::from_points(Vec3::new(0.0, 0.0, 5.0), Vec3::new(1.0, 1.0, 5.0));
        assert!(aabb.z.size() > 0.0);
        assert!(aabb.z.contains(5.0));
    }

    #[test]
    fn test_aabb_from_point_cloud() {
        let points = [
            Vec3::new(-1.0, 2.0, 0.5),
            Vec3::new(3.0, -2.0, 0.0),
            Vec3::new(0.0, 0.0, 4.0),
        ];
        let aabb = Aabb::from_point_cloud(&points);
        assert_eq!(aabb.x, Interval::new(-1.0, 3.0));
        assert_eq!(aabb.y, Interval::new(-2.0, 2.0));
        assert_eq!(aabb.z, Interval::new(0.0, 4.0));
        assert!(Aabb::from_point_cloud(&[]).is_empty());
    }

    #[test]
    fn test_aabb_surrounding_and_encloses() {
        let box1 = Aabb::from_points(Vec3::ZERO, Vec3::new(5.0, 5.0, 5.0));
        let box2 = Aabb::from_points(Vec3::new(3.0, 3.0, 3.0), Vec3::new(10.0, 10.0, 10.0));
        let surrounding = Aabb::surrounding(&box1, &box2);

        assert_eq!(surrounding.x.min, 0.0);
        assert_eq!(surrounding.x.max, 10.0);
        assert!(surrounding.encloses(&box1));
        assert!(surrounding.encloses(&box2));
        assert!(!box1.encloses(&box2));
        assert_eq!(Aabb::surrounding(&Aabb::EMPTY, &box1), box1);
    }

    #[test]
    fn test_aabb_hit() {
        let aabb = Aabb::from_points(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let forward = Interval::new(0.0, 100.0);

        // Ray pointing at center
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(aabb.hit_distance(&ray, forward).is_some());

        // Ray pointing away
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(aabb.hit_distance(&ray, forward).is_none());

        // Ray parallel to the box but outside it
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(aabb.hit_distance(&ray, forward).is_none());
    }

    #[test]
    fn test_aabb_hit_distance() {
        let aabb = Aabb::from_points(Vec3::new(-1.0, -1.0, 2.0), Vec3::new(1.0, 1.0, 4.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);

        let entry = aabb.hit_distance(&ray, Interval::FORWARD).unwrap();
        assert!((entry - 2.0).abs() < 1e-6);

        // Clipped by a closer best hit
        assert!(aabb.hit_distance(&ray, Interval::new(0.0, 1.5)).is_none());

        // Origin inside the box enters at the interval start
        let inside = Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::X);
        assert_eq!(aabb.hit_distance(&inside, Interval::FORWARD), Some(0.0));
    }

    #[test]
    fn test_aabb_surface_area() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        assert!((aabb.surface_area() - 22.0).abs() < 1e-5);
        assert_eq!(Aabb::EMPTY.surface_area(), 0.0);
    }

    #[test]
    fn test_aabb_centroid() {
        let aabb = Aabb::from_points(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 10.0));
        assert_eq!(aabb.centroid(), Vec3::new(5.0, 5.0, 5.0));
    }
}
