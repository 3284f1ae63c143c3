//! State-space exploration of the sliding-puzzle move graph.
//!
//! Key properties:
//! - A state is inserted into the node map the moment it is discovered and is
//!   never re-parented afterwards (first discoverer wins)
//! - Neighbours are always expanded in `MoveDirection::EXPANSION_ORDER`
//! - The node map keeps discovery order, so downstream layouts are reproducible
//! - An unreachable goal is a normal `Exhausted` result, not an error

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use crate::board::PuzzleState;
use crate::node::{new_node_map, NodeMap, SearchNodeData};

/// Depth cutoff used when building a bounded dataset for visualization.
///
/// Chosen for 3x3 boards, where it yields a few thousand states. It has no
/// special meaning for other board sizes.
pub const DEFAULT_VISUALIZATION_DEPTH: usize = 16;

/// Why a search run stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    /// The goal state was discovered.
    GoalReached,
    /// The configured depth cutoff stopped the run before the goal was seen.
    DepthLimitReached,
    /// Every reachable state was explored without meeting the goal.
    Exhausted,
}

/// Outcome of one search run: how it ended and everything it discovered.
#[derive(Clone, Debug)]
pub struct SearchResult<const N: usize> {
    pub status: SearchStatus,
    pub nodes: NodeMap<N>,
}

impl<const N: usize> SearchResult<N> {
    /// True only when the goal was actually reached.
    pub fn found(&self) -> bool {
        self.status == SearchStatus::GoalReached
    }

    pub fn visited_count(&self) -> usize {
        self.nodes.values().filter(|data| data.visited).count()
    }

    /// Deepest discovery depth in the node map.
    pub fn max_depth(&self) -> usize {
        self.nodes.values().map(|data| data.depth).max().unwrap_or(0)
    }

    pub fn depth_of(&self, state: &PuzzleState<N>) -> Option<usize> {
        self.nodes.get(state).map(|data| data.depth)
    }
}

/// A strategy for exploring the move graph from an initial state.
pub trait SearchAlgorithm<const N: usize> {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Explores from `initial` looking for `goal`, building a fresh node map.
    fn search(&self, initial: &PuzzleState<N>, goal: &PuzzleState<N>) -> SearchResult<N>;
}

/// Selects one of the built-in search algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStrategy {
    BreadthFirst,
    DepthFirst,
    CompleteExploration,
}

impl SearchStrategy {
    /// Runs the selected algorithm.
    ///
    /// `depth_limit` applies to breadth-first search and complete exploration;
    /// depth-first search ignores it and logs a warning.
    pub fn run<const N: usize>(
        self,
        initial: &PuzzleState<N>,
        goal: &PuzzleState<N>,
        depth_limit: Option<usize>,
    ) -> SearchResult<N> {
        match self {
            SearchStrategy::BreadthFirst => BreadthFirstSearch { depth_limit }.search(initial, goal),
            SearchStrategy::DepthFirst => {
                if let Some(limit) = depth_limit {
                    warn!(limit, "depth-first search ignores the depth limit");
                }
                DepthFirstSearch.search(initial, goal)
            }
            SearchStrategy::CompleteExploration => {
                CompleteSpaceExplorer { depth_limit }.search(initial, goal)
            }
        }
    }
}

/// Records every unvisited neighbour of `current` as its child and hands it to
/// `frontier`. Only discovery edges are recorded.
fn discover<const N: usize>(
    nodes: &mut NodeMap<N>,
    current: PuzzleState<N>,
    depth: usize,
    mut frontier: impl FnMut(PuzzleState<N>),
) {
    for (_, next) in current.neighbors() {
        if nodes.get(&next).is_some_and(|data| data.visited) {
            continue;
        }
        nodes.insert(next, SearchNodeData::child_of(current, depth));
        if let Some(data) = nodes.get_mut(&current) {
            data.adjacent.push(next);
        }
        frontier(next);
    }
}

/// FIFO exploration. Parent pointers form shortest paths in move count.
///
/// With a depth limit the run stops as soon as a state at that depth is
/// dequeued. Because states leave the queue in non-decreasing depth order, at
/// that point every state up to the limit has been discovered.
#[derive(Clone, Copy, Debug, Default)]
pub struct BreadthFirstSearch {
    pub depth_limit: Option<usize>,
}

impl BreadthFirstSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_depth_limit(depth_limit: usize) -> Self {
        Self {
            depth_limit: Some(depth_limit),
        }
    }
}

impl<const N: usize> SearchAlgorithm<N> for BreadthFirstSearch {
    fn name(&self) -> &'static str {
        "breadth-first"
    }

    fn search(&self, initial: &PuzzleState<N>, goal: &PuzzleState<N>) -> SearchResult<N> {
        let mut nodes = new_node_map();
        nodes.insert(*initial, SearchNodeData::root());
        let mut queue = VecDeque::from([*initial]);

        let status = loop {
            let Some(current) = queue.pop_front() else {
                break SearchStatus::Exhausted;
            };
            if current == *goal {
                break SearchStatus::GoalReached;
            }

            let depth = nodes[&current].depth;
            if self.depth_limit.is_some_and(|limit| depth >= limit) {
                // the goal may already sit at the cutoff depth without being dequeued
                break if nodes.contains_key(goal) {
                    SearchStatus::GoalReached
                } else {
                    SearchStatus::DepthLimitReached
                };
            }

            discover(&mut nodes, current, depth, |next| queue.push_back(next));
        };

        info!(
            algorithm = SearchAlgorithm::<N>::name(self),
            states = nodes.len(),
            ?status,
            "search finished"
        );
        SearchResult { status, nodes }
    }
}

/// LIFO exploration. Finds some path, not necessarily a short one.
#[derive(Clone, Copy, Debug, Default)]
pub struct DepthFirstSearch;

impl<const N: usize> SearchAlgorithm<N> for DepthFirstSearch {
    fn name(&self) -> &'static str {
        "depth-first"
    }

    fn search(&self, initial: &PuzzleState<N>, goal: &PuzzleState<N>) -> SearchResult<N> {
        let mut nodes = new_node_map();
        nodes.insert(*initial, SearchNodeData::root());
        let mut stack = vec![*initial];

        let status = loop {
            let Some(current) = stack.pop() else {
                break SearchStatus::Exhausted;
            };
            if current == *goal {
                break SearchStatus::GoalReached;
            }

            let depth = nodes[&current].depth;
            discover(&mut nodes, current, depth, |next| stack.push(next));
        };

        info!(
            algorithm = SearchAlgorithm::<N>::name(self),
            states = nodes.len(),
            ?status,
            "search finished"
        );
        SearchResult { status, nodes }
    }
}

/// Breadth-first exploration that never stops at the goal.
///
/// Exhausts the connected component of the initial state (181440 states for a
/// 3x3 board) and records adjacency in both directions for every legal move
/// between discovered states. Parent and depth keep first-discovery semantics.
/// An optional depth limit stops expansion below that depth for boards whose
/// components are too large to exhaust.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompleteSpaceExplorer {
    pub depth_limit: Option<usize>,
}

impl CompleteSpaceExplorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_depth_limit(depth_limit: usize) -> Self {
        Self {
            depth_limit: Some(depth_limit),
        }
    }
}

impl<const N: usize> SearchAlgorithm<N> for CompleteSpaceExplorer {
    fn name(&self) -> &'static str {
        "complete-space"
    }

    fn search(&self, initial: &PuzzleState<N>, goal: &PuzzleState<N>) -> SearchResult<N> {
        let mut nodes = new_node_map();
        nodes.insert(*initial, SearchNodeData::root());
        let mut queue = VecDeque::from([*initial]);
        let mut goal_found = false;
        let mut truncated = false;

        while let Some(current) = queue.pop_front() {
            let depth = nodes[&current].depth;
            if current == *goal {
                goal_found = true;
                debug!(depth, "goal discovered, continuing exploration");
            }
            if self.depth_limit.is_some_and(|limit| depth >= limit) {
                truncated = true;
                continue;
            }

            for (_, next) in current.neighbors() {
                if !nodes.contains_key(&next) {
                    nodes.insert(next, SearchNodeData::child_of(current, depth));
                    queue.push_back(next);
                }
                if let Some(data) = nodes.get_mut(&current) {
                    data.link(next);
                }
                if let Some(data) = nodes.get_mut(&next) {
                    data.link(current);
                }
            }
        }

        let status = if goal_found {
            SearchStatus::GoalReached
        } else if truncated {
            SearchStatus::DepthLimitReached
        } else {
            SearchStatus::Exhausted
        };

        info!(
            algorithm = SearchAlgorithm::<N>::name(self),
            states = nodes.len(),
            ?status,
            "exploration finished"
        );
        SearchResult { status, nodes }
    }
}
