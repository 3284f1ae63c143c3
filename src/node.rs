//! Per-state search metadata.

use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use rustc_hash::FxHasher;

use crate::board::PuzzleState;

/// Search metadata keyed by state, in discovery order.
///
/// Insertion order is what the layout engines iterate, so a search run always
/// hands layouts the same sequence of states.
pub type NodeMap<const N: usize> =
    IndexMap<PuzzleState<N>, SearchNodeData<N>, BuildHasherDefault<FxHasher>>;

/// What a search run learned about one state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchNodeData<const N: usize> {
    pub visited: bool,
    /// Edges recorded during the search. BFS and DFS record discovery edges
    /// only; the complete explorer records every legal move in both directions.
    pub adjacent: Vec<PuzzleState<N>>,
    /// Predecessor on the discovery path, `None` for the root.
    pub parent: Option<PuzzleState<N>>,
    /// Number of moves from the root along the discovery path.
    pub depth: usize,
}

impl<const N: usize> SearchNodeData<N> {
    /// The root record: visited, no parent, depth 0.
    pub fn root() -> Self {
        Self {
            visited: true,
            adjacent: Vec::with_capacity(4),
            parent: None,
            depth: 0,
        }
    }

    /// A freshly discovered child of `parent`, one level deeper.
    pub fn child_of(parent: PuzzleState<N>, parent_depth: usize) -> Self {
        Self {
            visited: true,
            adjacent: Vec::with_capacity(4),
            parent: Some(parent),
            depth: parent_depth + 1,
        }
    }

    /// Records an edge unless it is already present.
    pub fn link(&mut self, neighbor: PuzzleState<N>) {
        if !self.adjacent.contains(&neighbor) {
            self.adjacent.push(neighbor);
        }
    }
}

/// Creates an empty node map.
pub fn new_node_map<const N: usize>() -> NodeMap<N> {
    NodeMap::default()
}

/// Total number of recorded adjacency entries.
pub fn edge_count<const N: usize>(nodes: &NodeMap<N>) -> usize {
    nodes.values().map(|data| data.adjacent.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{EightPuzzle, MoveDirection};

    #[test]
    fn test_link_ignores_duplicates() {
        let root = EightPuzzle::solved();
        let child = root.try_move(MoveDirection::Up).expect("legal");
        let mut data = SearchNodeData::root();
        data.link(child);
        data.link(child);
        assert_eq!(data.adjacent, vec![child]);
    }

    #[test]
    fn test_child_depth_and_parent() {
        let root = EightPuzzle::solved();
        let data = SearchNodeData::<3>::child_of(root, 4);
        assert_eq!(data.depth, 5);
        assert_eq!(data.parent, Some(root));
        assert!(data.visited);
    }

    #[test]
    fn test_node_map_keeps_insertion_order() {
        let root = EightPuzzle::solved();
        let mut nodes = new_node_map();
        let mut expected = vec![root];
        nodes.insert(root, SearchNodeData::root());
        for (_, next) in root.neighbors() {
            nodes.insert(next, SearchNodeData::child_of(root, 0));
            expected.push(next);
        }
        let keys: Vec<EightPuzzle> = nodes.keys().copied().collect();
        assert_eq!(keys, expected);
        assert_eq!(edge_count(&nodes), 0);
    }
}
