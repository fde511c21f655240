use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spot_renderer::{closest_hit_linear, Bvh, Color, Flat, Material, Ray, Triangle, Vec3};

/// Route `log` output through the test harness; RUST_LOG=debug shows it.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn random_point(rng: &mut StdRng, extent: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

fn random_triangles(rng: &mut StdRng, count: usize) -> Vec<Triangle> {
    let material: Arc<dyn Material> = Arc::new(Flat::new(Color::WHITE));
    (0..count)
        .map(|_| {
            let center = random_point(rng, 5.0);
            Triangle::from_positions(
                center + random_point(rng, 0.8),
                center + random_point(rng, 0.8),
                center + random_point(rng, 0.8),
                Arc::clone(&material),
            )
        })
        .collect()
}

#[test]
fn bvh_hit_matches_bruteforce() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(1);

    for count in [1, 3, 5, 17, 64, 300] {
        let triangles = random_triangles(&mut rng, count);
        let bvh = Bvh::build(&triangles);

        let mut hits = 0;
        for _ in 0..256 {
            let origin = random_point(&mut rng, 8.0);
            let target = random_point(&mut rng, 4.0);
            let ray = Ray::new(origin, target - origin);

            let brute = closest_hit_linear(&triangles, &ray);
            let fast = bvh.closest_hit(&triangles, &ray);

            assert_eq!(brute.is_some(), fast.is_some(), "count {}", count);
            if let (Some(a), Some(b)) = (brute, fast) {
                hits += 1;
                assert!((a.t - b.t).abs() < 1e-4, "count {}: {} vs {}", count, a.t, b.t);
            }
        }
        if count >= 64 {
            assert!(hits > 0, "no ray hit anything with {} triangles", count);
        }
    }
}

#[test]
fn bvh_rays_from_inside_bounds() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(7);
    let triangles = random_triangles(&mut rng, 200);
    let bvh = Bvh::build(&triangles);

    for _ in 0..256 {
        let origin = random_point(&mut rng, 1.0);
        let direction = random_point(&mut rng, 1.0);
        if direction.length_squared() < 1e-6 {
            continue;
        }
        let ray = Ray::new(origin, direction);

        let brute = closest_hit_linear(&triangles, &ray).map(|h| h.t);
        let fast = bvh.closest_hit(&triangles, &ray).map(|h| h.t);
        match (brute, fast) {
            (Some(a), Some(b)) => assert!((a - b).abs() < 1e-4),
            (a, b) => assert_eq!(a, b),
        }
    }
}

#[test]
fn bvh_does_not_reorder_primitives() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(3);
    let triangles = random_triangles(&mut rng, 50);
    let bvh = Bvh::build(&triangles);

    let mut sorted = bvh.indices().to_vec();
    sorted.sort_unstable();
    assert_eq!(sorted, (0..50).collect::<Vec<_>>());

    for (i, tri) in triangles.iter().enumerate() {
        let c = tri.vertices().iter().map(|v| v.position).sum::<Vec3>() / 3.0;
        let normal = tri.face_normal();
        if normal.length_squared() < 1e-6 {
            continue;
        }
        // Shoot at the centroid from the front side
        let origin = c + normal.normalize() * 20.0;
        let ray = Ray::new(origin, c - origin);
        let hit = bvh.closest_hit(&triangles, &ray).unwrap();
        let brute = closest_hit_linear(&triangles, &ray).unwrap();
        assert!((hit.t - brute.t).abs() < 1e-4, "triangle {}", i);
    }
}
