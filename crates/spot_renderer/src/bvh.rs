//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Binary SAH tree stored as a node arena. Leaves reference a contiguous
//! range of a permuted primitive index array, so the caller's primitive
//! slice is never reordered and hit records index straight into it.

use std::time::Instant;

use spot_math::{Aabb, Interval, Ray, Vec3};

use crate::hittable::{HitRecord, Hittable};

/// Maximum primitives per leaf node before splitting.
pub const LEAF_MAX_SIZE: usize = 4;

/// BVH node - either a branch with two children or a leaf with primitives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BvhNode {
    /// Internal node; children are indices into the node arena.
    Branch { left: usize, right: usize, bbox: Aabb },
    /// Leaf covering `indices[start..start + count]`.
    Leaf { start: usize, count: usize, bbox: Aabb },
}

impl BvhNode {
    pub fn bbox(&self) -> &Aabb {
        match self {
            BvhNode::Branch { bbox, .. } | BvhNode::Leaf { bbox, .. } => bbox,
        }
    }
}

/// Per-primitive data gathered once before building.
struct PrimitiveInfo {
    bbox: Aabb,
    centroid: Vec3,
}

#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    indices: Vec<usize>,
}

impl Bvh {
    /// Build a hierarchy over `primitives`. The root is node 0.
    pub fn build<H: Hittable>(primitives: &[H]) -> Self {
        if primitives.is_empty() {
            return Self::default();
        }

        let start = Instant::now();
        let info: Vec<PrimitiveInfo> = primitives
            .iter()
            .map(|p| {
                let bbox = p.bounding_box();
                PrimitiveInfo {
                    bbox,
                    centroid: bbox.centroid(),
                }
            })
            .collect();

        let mut indices: Vec<usize> = (0..primitives.len()).collect();
        let mut nodes = Vec::with_capacity(2 * primitives.len() / LEAF_MAX_SIZE + 1);
        build_node(&mut nodes, &info, &mut indices, 0);

        log::debug!(
            "BVH: {} primitives, {} nodes, built in {:.2?}",
            primitives.len(),
            nodes.len(),
            start.elapsed()
        );

        Self { nodes, indices }
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Primitive indices in leaf order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Bounds of the whole hierarchy (empty box when there are no primitives).
    pub fn bounds(&self) -> Aabb {
        self.nodes.first().map_or(Aabb::EMPTY, |n| *n.bbox())
    }

    /// Nearest hit among `primitives`, which must be the slice the BVH was built from.
    ///
    /// Children are visited near-first; subtrees whose entry distance is not
    /// below the best hit so far are skipped.
    pub fn closest_hit<H: Hittable>(&self, primitives: &[H], ray: &Ray) -> Option<HitRecord> {
        let root = self.nodes.first()?;
        let mut best: Option<HitRecord> = None;
        let mut best_t = f32::INFINITY;

        let entry = root.bbox().hit_distance(ray, Interval::FORWARD)?;
        let mut stack: Vec<(usize, f32)> = Vec::with_capacity(64);
        stack.push((0, entry));

        while let Some((node, entry)) = stack.pop() {
            if entry >= best_t {
                continue;
            }

            match &self.nodes[node] {
                BvhNode::Leaf { start, count, .. } => {
                    for &index in &self.indices[*start..*start + *count] {
                        if let Some(hit) = primitives[index].intersect(ray) {
                            if hit.t < best_t {
                                best_t = hit.t;
                                best = Some(HitRecord::new(index, hit));
                            }
                        }
                    }
                }
                BvhNode::Branch { left, right, .. } => {
                    let range = Interval::new(0.0, best_t);
                    let enter = |child: usize| {
                        self.nodes[child]
                            .bbox()
                            .hit_distance(ray, range)
                            .filter(|&t| t < best_t)
                            .map(|t| (child, t))
                    };

                    match (enter(*left), enter(*right)) {
                        (Some(l), Some(r)) => {
                            let (near, far) = if l.1 <= r.1 { (l, r) } else { (r, l) };
                            stack.push(far);
                            stack.push(near);
                        }
                        (Some(only), None) | (None, Some(only)) => stack.push(only),
                        (None, None) => {}
                    }
                }
            }
        }

        best
    }
}

/// Build the subtree for `indices` (which start at `offset` in the full
/// index array) and return its node index.
fn build_node(
    nodes: &mut Vec<BvhNode>,
    info: &[PrimitiveInfo],
    indices: &mut [usize],
    offset: usize,
) -> usize {
    let bbox = indices
        .iter()
        .fold(Aabb::EMPTY, |acc, &i| Aabb::surrounding(&acc, &info[i].bbox));
    let count = indices.len();

    let node = nodes.len();
    nodes.push(BvhNode::Leaf {
        start: offset,
        count,
        bbox,
    });

    if count <= LEAF_MAX_SIZE {
        return node;
    }

    let split = sah_split(info, indices, &bbox);
    let (left_indices, right_indices) = indices.split_at_mut(split);
    let left = build_node(nodes, info, left_indices, offset);
    let right = build_node(nodes, info, right_indices, offset + split);

    nodes[node] = BvhNode::Branch { left, right, bbox };
    node
}

fn sort_by_axis(info: &[PrimitiveInfo], indices: &mut [usize], axis: usize) {
    indices.sort_by(|&a, &b| info[a].centroid[axis].total_cmp(&info[b].centroid[axis]));
}

/// Axis along which `bbox` is widest.
fn longest_axis(bbox: &Aabb) -> usize {
    let sizes = [bbox.x.size(), bbox.y.size(), bbox.z.size()];
    (0..3).fold(0, |best, axis| if sizes[axis] > sizes[best] { axis } else { best })
}

/// Pick the SAH-cheapest split over all three axes.
///
/// Leaves `indices` sorted along the chosen axis and returns the size of the
/// left partition, always in `1..len`. When no split beats keeping every
/// primitive under `bbox` (coincident boxes), falls back to a median split so
/// the tree stays balanced.
fn sah_split(info: &[PrimitiveInfo], indices: &mut [usize], bbox: &Aabb) -> usize {
    let n = indices.len();
    let mut best_cost = f32::INFINITY;
    let mut best_axis = 0;
    let mut best_split = n / 2;
    let mut right_areas = vec![0.0f32; n];

    for axis in 0..3 {
        sort_by_axis(info, indices, axis);

        // right_areas[i] = area of the box around indices[i..]
        let mut acc = Aabb::EMPTY;
        for i in (1..n).rev() {
            acc = Aabb::surrounding(&acc, &info[indices[i]].bbox);
            right_areas[i] = acc.surface_area();
        }

        let mut acc = Aabb::EMPTY;
        for i in 1..n {
            acc = Aabb::surrounding(&acc, &info[indices[i - 1]].bbox);
            let cost = acc.surface_area() * i as f32 + right_areas[i] * (n - i) as f32;
            if cost < best_cost {
                best_cost = cost;
                best_axis = axis;
                best_split = i;
            }
        }
    }

    let unsplit_cost = bbox.surface_area() * n as f32;
    if best_cost >= unsplit_cost * (1.0 - 1e-5) {
        sort_by_axis(info, indices, longest_axis(bbox));
        return n / 2;
    }

    if best_axis != 2 {
        sort_by_axis(info, indices, best_axis);
    }
    best_split
}
