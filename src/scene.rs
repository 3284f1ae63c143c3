//! Geometry handed to the viewer: edges between laid-out states, scene
//! extents and depth-based colouring.

use glam::Vec3;
use rustc_hash::FxHashSet;

use crate::board::PuzzleState;
use crate::layout::PositionMap;
use crate::node::NodeMap;

/// One recorded adjacency entry between two placed states.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneEdge {
    pub from: Vec3,
    pub to: Vec3,
    /// The edge leads into a state on the highlighted route.
    pub on_route: bool,
}

/// Edges for every adjacency entry whose endpoints both have a position.
pub fn scene_edges<const N: usize>(
    nodes: &NodeMap<N>,
    positions: &PositionMap<N>,
    route: &FxHashSet<PuzzleState<N>>,
) -> Vec<SceneEdge> {
    nodes
        .iter()
        .filter_map(|(state, data)| positions.get(state).map(|&from| (from, data)))
        .flat_map(|(from, data)| {
            data.adjacent.iter().filter_map(move |neighbor| {
                positions.get(neighbor).map(|&to| SceneEdge {
                    from,
                    to,
                    on_route: route.contains(neighbor),
                })
            })
        })
        .collect()
}

/// Axis-aligned extent of a set of positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl SceneBounds {
    /// `None` for an empty layout.
    pub fn of<const N: usize>(positions: &PositionMap<N>) -> Option<Self> {
        let mut points = positions.values().copied();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), point| {
            (min.min(point), max.max(point))
        });
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half the diagonal; the smallest sphere around the center holding every point.
    pub fn radius(&self) -> f32 {
        (self.max - self.min).length() * 0.5
    }
}

/// Depth range of a node map, mapped onto a colour ramp.
#[derive(Clone, Debug)]
pub struct DepthShading {
    max_depth: usize,
}

impl DepthShading {
    pub fn new<const N: usize>(nodes: &NodeMap<N>) -> Self {
        Self {
            max_depth: nodes.values().map(|data| data.depth).max().unwrap_or(0),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Depth mapped into `[0, 1]`.
    pub fn fraction(&self, depth: usize) -> f32 {
        if self.max_depth == 0 {
            0.0
        } else {
            depth.min(self.max_depth) as f32 / self.max_depth as f32
        }
    }

    /// RGB colour running from blue at the root to red at the deepest level.
    pub fn color(&self, depth: usize) -> [f32; 3] {
        let t = self.fraction(depth);
        [0.2 + 0.8 * t, 0.3, 1.0 - 0.8 * t]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{EightPuzzle, MoveDirection};
    use crate::node::{new_node_map, SearchNodeData};

    fn chain() -> (NodeMap<3>, [EightPuzzle; 3]) {
        let a = EightPuzzle::solved();
        let b = a.try_move(MoveDirection::Up).expect("legal");
        let c = b.try_move(MoveDirection::Left).expect("legal");
        let mut nodes = new_node_map();
        nodes.insert(a, SearchNodeData::root());
        nodes.insert(b, SearchNodeData::child_of(a, 0));
        nodes.insert(c, SearchNodeData::child_of(b, 1));
        nodes[&a].adjacent.push(b);
        nodes[&b].adjacent.push(c);
        (nodes, [a, b, c])
    }

    #[test]
    fn test_edges_skip_unplaced_states() {
        let (nodes, [a, b, c]) = chain();
        let mut positions = PositionMap::default();
        positions.insert(a, Vec3::ZERO);
        positions.insert(b, Vec3::X);

        let mut route = FxHashSet::default();
        route.insert(b);

        let edges = scene_edges(&nodes, &positions, &route);
        assert_eq!(
            edges,
            vec![SceneEdge {
                from: Vec3::ZERO,
                to: Vec3::X,
                on_route: true
            }]
        );

        positions.insert(c, Vec3::Y);
        let edges = scene_edges(&nodes, &positions, &route);
        assert_eq!(edges.len(), 2);
        assert!(!edges[1].on_route);
    }

    #[test]
    fn test_bounds() {
        let (_, [a, b, c]) = chain();
        let mut positions = PositionMap::<3>::default();
        assert_eq!(SceneBounds::of(&positions), None);

        positions.insert(a, Vec3::new(-1.0, 0.0, 2.0));
        positions.insert(b, Vec3::new(3.0, -2.0, 0.0));
        positions.insert(c, Vec3::new(1.0, 4.0, 1.0));
        let bounds = SceneBounds::of(&positions).expect("non-empty");
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 4.0, 2.0));
        assert_eq!(bounds.center(), Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_depth_shading() {
        let (nodes, _) = chain();
        let shading = DepthShading::new(&nodes);
        assert_eq!(shading.max_depth(), 2);
        assert_eq!(shading.fraction(0), 0.0);
        assert_eq!(shading.fraction(1), 0.5);
        assert_eq!(shading.fraction(7), 1.0);
        assert_eq!(shading.color(0), [0.2, 0.3, 1.0]);
    }
}
