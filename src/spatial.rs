//! Barnes-Hut octree for approximate all-pairs repulsion.
//!
//! The tree is rebuilt from scratch every layout iteration. Two backends share
//! one insertion routine:
//! - `PointerOctree`: boxed children, recursive queries
//! - `FlatOctree`: the same tree flattened into one array of fixed-size nodes
//!   with children stored as contiguous blocks of eight, queried iteratively.
//!   Queries hold no mutable state, so many threads can evaluate it at once.

use std::collections::VecDeque;

use glam::Vec3;
use tracing::warn;

/// Separations below this produce no force.
pub const MIN_DISTANCE: f32 = 0.01;

/// Fraction of the largest extent added on every side of the root cube.
pub const BOUNDS_MARGIN: f32 = 0.1;

/// Subdivision stops at this depth; points that still share a leaf are merged
/// into one mass at their weighted centroid.
const MAX_DEPTH: usize = 32;

/// Repulsion felt at `target` from a point mass at `source`: magnitude
/// `k^2 * mass / distance^2`, directed away from the source.
#[inline]
pub fn repulsion(target: Vec3, source: Vec3, mass: f32, k: f32) -> Vec3 {
    let direction = source - target;
    let distance = direction.length();
    if distance < MIN_DISTANCE {
        return Vec3::ZERO;
    }
    -direction / distance * (k * k * mass / (distance * distance))
}

/// Axis-aligned box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The smallest cube around `points`, grown by `margin_ratio` of its
    /// largest extent on every side (at least `MIN_DISTANCE`).
    pub fn enclosing(points: &[Vec3], margin_ratio: f32) -> Self {
        if points.is_empty() {
            return Self::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        }

        let (min, max) = points.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), &point| (min.min(point), max.max(point)),
        );
        let extent = (max - min).max_element();
        let margin = (extent * margin_ratio).max(MIN_DISTANCE);
        let half = extent * 0.5 + margin;
        let center = (min + max) * 0.5;

        Self::new(center - Vec3::splat(half), center + Vec3::splat(half))
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[inline]
    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    /// Inclusive on every face.
    #[inline]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Octant index: bit 0 set for the upper x half, bit 1 for y, bit 2 for z.
    /// Points on a split plane fall into the lower half.
    #[inline]
    fn octant(&self, point: Vec3) -> usize {
        let center = self.center();
        (point.x > center.x) as usize
            | ((point.y > center.y) as usize) << 1
            | ((point.z > center.z) as usize) << 2
    }

    fn child(&self, octant: usize) -> Self {
        let center = self.center();
        let pick = |bit: usize, low: f32, mid: f32, high: f32| {
            if octant & bit != 0 {
                (mid, high)
            } else {
                (low, mid)
            }
        };
        let (min_x, max_x) = pick(1, self.min.x, center.x, self.max.x);
        let (min_y, max_y) = pick(2, self.min.y, center.y, self.max.y);
        let (min_z, max_z) = pick(4, self.min.z, center.z, self.max.z);
        Self::new(
            Vec3::new(min_x, min_y, min_z),
            Vec3::new(max_x, max_y, max_z),
        )
    }
}

/// Common query surface of both octree backends.
pub trait SpatialIndex: Send + Sync {
    /// Approximate repulsion at `target` from every indexed point.
    ///
    /// A subtree is collapsed into its centroid when
    /// `max_dimension / distance < theta`; `theta = 0` visits every leaf.
    fn force_on(&self, target: Vec3, k: f32, theta: f32) -> Vec3;

    fn total_mass(&self) -> f32;

    fn center_of_mass(&self) -> Vec3;
}

/// Which octree representation to build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OctreeBackend {
    /// Boxed-children tree.
    #[default]
    Pointer,
    /// Array-of-structs tree.
    Flat,
}

impl OctreeBackend {
    /// Builds an index over unit-mass `points`.
    pub fn build(self, points: &[Vec3]) -> Box<dyn SpatialIndex> {
        let tree = PointerOctree::build(points);
        match self {
            OctreeBackend::Pointer => Box::new(tree),
            OctreeBackend::Flat => Box::new(FlatOctree::from_tree(&tree)),
        }
    }
}

#[derive(Clone, Debug)]
enum Contents {
    Empty,
    Leaf { position: Vec3, mass: f32 },
    Internal(Box<[OctreeNode; 8]>),
}

/// One cubic region of the pointer octree.
#[derive(Clone, Debug)]
pub struct OctreeNode {
    bounds: Bounds,
    center_of_mass: Vec3,
    total_mass: f32,
    contents: Contents,
}

impl OctreeNode {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            center_of_mass: Vec3::ZERO,
            total_mass: 0.0,
            contents: Contents::Empty,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn is_leaf(&self) -> bool {
        !matches!(self.contents, Contents::Internal(_))
    }

    /// Inserts a weighted point. Returns `false` without touching the tree if
    /// `position` lies outside this node's bounds.
    pub fn insert(&mut self, position: Vec3, mass: f32) -> bool {
        if !self.bounds.contains(position) {
            return false;
        }
        self.insert_at(position, mass, 0);
        true
    }

    fn insert_at(&mut self, position: Vec3, mass: f32, depth: usize) {
        match self.contents {
            Contents::Empty => {
                self.contents = Contents::Leaf { position, mass };
            }
            Contents::Leaf {
                position: existing,
                mass: existing_mass,
            } if depth >= MAX_DEPTH => {
                let merged = existing_mass + mass;
                self.contents = Contents::Leaf {
                    position: (existing * existing_mass + position * mass) / merged,
                    mass: merged,
                };
            }
            Contents::Leaf {
                position: existing,
                mass: existing_mass,
            } => {
                let bounds = self.bounds;
                let children = std::array::from_fn(|octant| OctreeNode::new(bounds.child(octant)));
                self.contents = Contents::Internal(Box::new(children));
                // both points may land in the same octant, which subdivides again
                self.insert_into_child(existing, existing_mass, depth);
                self.insert_into_child(position, mass, depth);
            }
            Contents::Internal(_) => self.insert_into_child(position, mass, depth),
        }
        self.update_mass();
    }

    fn insert_into_child(&mut self, position: Vec3, mass: f32, depth: usize) {
        let octant = self.bounds.octant(position);
        if let Contents::Internal(children) = &mut self.contents {
            children[octant].insert_at(position, mass, depth + 1);
        }
    }

    fn update_mass(&mut self) {
        match &self.contents {
            Contents::Empty => {
                self.center_of_mass = Vec3::ZERO;
                self.total_mass = 0.0;
            }
            Contents::Leaf { position, mass } => {
                self.center_of_mass = *position;
                self.total_mass = *mass;
            }
            Contents::Internal(children) => {
                let (weighted, total) = children
                    .iter()
                    .filter(|child| child.total_mass > 0.0)
                    .fold((Vec3::ZERO, 0.0), |(weighted, total), child| {
                        (
                            weighted + child.center_of_mass * child.total_mass,
                            total + child.total_mass,
                        )
                    });
                self.total_mass = total;
                self.center_of_mass = if total > 0.0 {
                    weighted / total
                } else {
                    Vec3::ZERO
                };
            }
        }
    }

    fn force_on(&self, target: Vec3, k: f32, theta: f32) -> Vec3 {
        if self.total_mass == 0.0 {
            return Vec3::ZERO;
        }
        match &self.contents {
            Contents::Empty => Vec3::ZERO,
            Contents::Leaf { .. } => repulsion(target, self.center_of_mass, self.total_mass, k),
            Contents::Internal(children) => {
                let distance = self.center_of_mass.distance(target);
                if distance >= MIN_DISTANCE && self.bounds.max_dimension() / distance < theta {
                    repulsion(target, self.center_of_mass, self.total_mass, k)
                } else {
                    children
                        .iter()
                        .map(|child| child.force_on(target, k, theta))
                        .sum()
                }
            }
        }
    }
}

/// Octree with boxed children.
#[derive(Clone, Debug)]
pub struct PointerOctree {
    root: OctreeNode,
}

impl PointerOctree {
    /// Builds a tree over unit-mass points inside `Bounds::enclosing`.
    pub fn build(points: &[Vec3]) -> Self {
        let mut root = OctreeNode::new(Bounds::enclosing(points, BOUNDS_MARGIN));
        for &point in points {
            let inserted = root.insert(point, 1.0);
            debug_assert!(inserted, "root bounds must enclose every point");
            if !inserted {
                warn!(?point, "point outside octree bounds, skipped");
            }
        }
        Self { root }
    }

    pub fn root(&self) -> &OctreeNode {
        &self.root
    }
}

impl SpatialIndex for PointerOctree {
    fn force_on(&self, target: Vec3, k: f32, theta: f32) -> Vec3 {
        self.root.force_on(target, k, theta)
    }

    fn total_mass(&self) -> f32 {
        self.root.total_mass
    }

    fn center_of_mass(&self) -> Vec3 {
        self.root.center_of_mass
    }
}

/// Fixed-layout node of the flat octree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatNode {
    pub bounds_min: Vec3,
    pub bounds_max: Vec3,
    pub center_of_mass: Vec3,
    pub total_mass: f32,
    /// Index of the first of eight contiguous children; unused for leaves.
    pub first_child: u32,
    pub is_leaf: bool,
}

impl FlatNode {
    fn from_node(node: &OctreeNode) -> Self {
        Self {
            bounds_min: node.bounds.min,
            bounds_max: node.bounds.max,
            center_of_mass: node.center_of_mass,
            total_mass: node.total_mass,
            first_child: 0,
            is_leaf: node.is_leaf(),
        }
    }

    #[inline]
    fn max_dimension(&self) -> f32 {
        (self.bounds_max - self.bounds_min).max_element()
    }
}

/// Octree stored breadth-first in a single array.
#[derive(Clone, Debug)]
pub struct FlatOctree {
    nodes: Vec<FlatNode>,
}

impl FlatOctree {
    pub fn build(points: &[Vec3]) -> Self {
        Self::from_tree(&PointerOctree::build(points))
    }

    /// Flattens a pointer tree, allocating each node's children as one block.
    pub fn from_tree(tree: &PointerOctree) -> Self {
        let mut nodes = vec![FlatNode::from_node(&tree.root)];
        let mut pending = VecDeque::from([(0usize, &tree.root)]);

        while let Some((index, node)) = pending.pop_front() {
            if let Contents::Internal(children) = &node.contents {
                let first = nodes.len();
                nodes[index].first_child = first as u32;
                for (offset, child) in children.iter().enumerate() {
                    nodes.push(FlatNode::from_node(child));
                    pending.push_back((first + offset, child));
                }
            }
        }

        Self { nodes }
    }

    pub fn nodes(&self) -> &[FlatNode] {
        &self.nodes
    }
}

impl SpatialIndex for FlatOctree {
    fn force_on(&self, target: Vec3, k: f32, theta: f32) -> Vec3 {
        let mut force = Vec3::ZERO;
        let mut stack = vec![0u32];

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            if node.total_mass == 0.0 {
                continue;
            }
            if node.is_leaf {
                force += repulsion(target, node.center_of_mass, node.total_mass, k);
                continue;
            }

            let distance = node.center_of_mass.distance(target);
            if distance >= MIN_DISTANCE && node.max_dimension() / distance < theta {
                force += repulsion(target, node.center_of_mass, node.total_mass, k);
            } else {
                stack.extend(node.first_child..node.first_child + 8);
            }
        }

        force
    }

    fn total_mass(&self) -> f32 {
        self.nodes[0].total_mass
    }

    fn center_of_mass(&self) -> Vec3 {
        self.nodes[0].center_of_mass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_points(count: usize, seed: u64) -> Vec<Vec3> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                Vec3::new(
                    rng.gen_range(-25.0..25.0),
                    rng.gen_range(-25.0..25.0),
                    rng.gen_range(-25.0..25.0),
                )
            })
            .collect()
    }

    fn exact_force(target: Vec3, points: &[Vec3], k: f32) -> Vec3 {
        points
            .iter()
            .map(|&point| repulsion(target, point, 1.0, k))
            .sum()
    }

    fn assert_close(actual: Vec3, expected: Vec3, tolerance: f32) {
        let error = (actual - expected).length();
        let scale = expected.length().max(1.0);
        assert!(
            error / scale <= tolerance,
            "expected {expected:?}, got {actual:?} (relative error {})",
            error / scale
        );
    }

    #[test]
    fn test_enclosing_bounds_are_cubic_and_cover_points() {
        let points = random_points(50, 1);
        let bounds = Bounds::enclosing(&points, BOUNDS_MARGIN);
        let size = bounds.size();
        assert!((size.x - size.y).abs() < 1e-4 && (size.y - size.z).abs() < 1e-4);
        assert!(points.iter().all(|&point| bounds.contains(point)));
    }

    #[test]
    fn test_single_point_bounds_are_not_degenerate() {
        let bounds = Bounds::enclosing(&[Vec3::ONE], BOUNDS_MARGIN);
        assert!(bounds.max_dimension() > 0.0);
        assert!(bounds.contains(Vec3::ONE));
    }

    #[test]
    fn test_children_partition_parent() {
        let bounds = Bounds::new(Vec3::ZERO, Vec3::splat(2.0));
        let mut volume = 0.0;
        for octant in 0..8 {
            let child = bounds.child(octant);
            volume += child.size().x * child.size().y * child.size().z;
            assert_eq!(bounds.octant(child.center()), octant);
        }
        assert_eq!(volume, 8.0);
    }

    #[test]
    fn test_insert_outside_bounds_is_rejected() {
        let mut node = OctreeNode::new(Bounds::new(Vec3::ZERO, Vec3::ONE));
        assert!(!node.insert(Vec3::splat(2.0), 1.0));
        assert_eq!(node.total_mass, 0.0);
        assert!(node.insert(Vec3::splat(0.5), 1.0));
        assert_eq!(node.total_mass, 1.0);
    }

    #[test]
    fn test_second_insert_subdivides() {
        let mut node = OctreeNode::new(Bounds::new(Vec3::ZERO, Vec3::splat(4.0)));
        node.insert(Vec3::splat(0.5), 1.0);
        assert!(node.is_leaf());
        // same octant at the first level: forces a second subdivision
        node.insert(Vec3::splat(1.5), 1.0);
        assert!(!node.is_leaf());
        assert_eq!(node.total_mass, 2.0);
        assert_eq!(node.center_of_mass, Vec3::splat(1.0));
    }

    #[test]
    fn test_mass_aggregation() {
        let points = random_points(200, 2);
        let tree = PointerOctree::build(&points);
        let mean = points.iter().copied().sum::<Vec3>() / points.len() as f32;
        assert_eq!(tree.total_mass(), 200.0);
        assert_close(tree.center_of_mass(), mean, 1e-4);
    }

    #[test]
    fn test_coincident_points_terminate() {
        let points = vec![Vec3::splat(3.0); 5];
        let tree = PointerOctree::build(&points);
        assert_eq!(tree.total_mass(), 5.0);
        assert_eq!(tree.force_on(Vec3::splat(3.0), 10.0, 0.5), Vec3::ZERO);

        let away = tree.force_on(Vec3::new(4.0, 3.0, 3.0), 1.0, 0.5);
        assert_close(away, Vec3::new(5.0, 0.0, 0.0), 1e-4);
    }

    #[test]
    fn test_force_points_away_from_mass() {
        let tree = PointerOctree::build(&[Vec3::X]);
        let force = tree.force_on(Vec3::ZERO, 2.0, 0.5);
        assert_close(force, Vec3::new(-4.0, 0.0, 0.0), 1e-6);
    }

    #[test]
    fn test_zero_theta_is_exact() {
        let points = random_points(300, 3);
        let k = 10.0;
        for backend in [OctreeBackend::Pointer, OctreeBackend::Flat] {
            let index = backend.build(&points);
            for &target in points.iter().take(20) {
                assert_close(
                    index.force_on(target, k, 0.0),
                    exact_force(target, &points, k),
                    1e-3,
                );
            }
        }
    }

    #[test]
    fn test_large_theta_collapses_to_centroid() {
        let points = random_points(100, 4);
        let tree = PointerOctree::build(&points);
        let far = Vec3::new(1000.0, 0.0, 0.0);
        let approx = tree.force_on(far, 1.0, f32::INFINITY);
        let collapsed = repulsion(far, tree.center_of_mass(), 100.0, 1.0);
        assert_close(approx, collapsed, 1e-5);
    }

    #[test]
    fn test_barnes_hut_is_close_to_exact() {
        let points = random_points(500, 5);
        let tree = PointerOctree::build(&points);
        let target = Vec3::new(60.0, 10.0, -5.0);
        assert_close(
            tree.force_on(target, 10.0, 0.5),
            exact_force(target, &points, 10.0),
            0.05,
        );
    }

    #[test]
    fn test_flat_matches_pointer() {
        let points = random_points(400, 6);
        let pointer = PointerOctree::build(&points);
        let flat = FlatOctree::from_tree(&pointer);

        assert_eq!(flat.total_mass(), pointer.total_mass());
        assert_eq!(flat.nodes()[0].is_leaf, pointer.root().is_leaf());
        assert_eq!((flat.nodes().len() - 1) % 8, 0, "children come in blocks of eight");

        for &target in points.iter().step_by(40) {
            assert_close(
                flat.force_on(target, 10.0, 0.5),
                pointer.force_on(target, 10.0, 0.5),
                1e-3,
            );
        }
    }
}
