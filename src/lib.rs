//! Sliding Puzzle State-Space Library
//!
//! Explores the move graph of N x N sliding puzzles (breadth-first,
//! depth-first or exhaustively), reconstructs solution paths, and lays the
//! discovered states out in 3D with a Barnes-Hut accelerated force-directed
//! simulation or a radial tree layout.

pub mod board;
pub mod error;
pub mod force;
pub mod game;
pub mod layout;
pub mod node;
pub mod path;
pub mod radial;
pub mod scene;
pub mod search;
pub mod session;
pub mod spatial;

use board::{MoveDirection, PuzzleState};
use error::{LayoutError, PuzzleError};
use layout::{LayoutKind, LayoutStrategy};
use node::edge_count;
use path::solution_moves;
use scene::SceneBounds;
use search::{CompleteSpaceExplorer, SearchAlgorithm, SearchStatus, SearchStrategy};

/// Outcome of a solve: how the search ended and the moves it found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolveReport {
    pub status: SearchStatus,
    pub states: usize,
    /// Empty unless the goal was reached.
    pub moves: Vec<MoveDirection>,
}

/// Size of an explored state space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExploreReport {
    pub status: SearchStatus,
    pub states: usize,
    pub edges: usize,
    pub max_depth: usize,
}

/// Extent of a computed layout.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutReport {
    pub states: usize,
    pub placed: usize,
    pub bounds: Option<SceneBounds>,
}

/// An initial and a goal board of one size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Problem<const N: usize> {
    pub initial: PuzzleState<N>,
    pub goal: PuzzleState<N>,
}

impl<const N: usize> Problem<N> {
    /// Parses both boards; a missing goal means the canonical solved board.
    pub fn parse(initial: &str, goal: Option<&str>) -> Result<Self, PuzzleError> {
        Ok(Self {
            initial: initial.parse()?,
            goal: match goal {
                Some(text) => text.parse()?,
                None => PuzzleState::solved(),
            },
        })
    }
}

/// Trait that erases the board size for dynamic dispatch.
///
/// The const generic `N` is hidden behind the vtable, so callers can work with
/// any board size chosen at runtime without turbofish.
pub trait PuzzleOps {
    fn size(&self) -> usize;
    /// Whether the goal lies in the same move-connected class as the initial board.
    fn is_solvable(&self) -> bool;
    fn solve(
        &self,
        strategy: SearchStrategy,
        depth_limit: Option<usize>,
    ) -> Result<SolveReport, PuzzleError>;
    fn explore(&self, depth_limit: Option<usize>) -> ExploreReport;
    fn layout(
        &self,
        strategy: SearchStrategy,
        depth_limit: Option<usize>,
        kind: &LayoutKind,
    ) -> Result<LayoutReport, LayoutError>;
    fn format_boards(&self) -> String;
}

impl<const N: usize> PuzzleOps for Problem<N> {
    fn size(&self) -> usize {
        N
    }

    fn is_solvable(&self) -> bool {
        self.initial.is_solvable_from(&self.goal)
    }

    fn solve(
        &self,
        strategy: SearchStrategy,
        depth_limit: Option<usize>,
    ) -> Result<SolveReport, PuzzleError> {
        let result = strategy.run(&self.initial, &self.goal, depth_limit);
        let moves = if result.found() {
            solution_moves(&result.nodes, &self.goal)?
        } else {
            Vec::new()
        };
        Ok(SolveReport {
            status: result.status,
            states: result.nodes.len(),
            moves,
        })
    }

    fn explore(&self, depth_limit: Option<usize>) -> ExploreReport {
        let result = CompleteSpaceExplorer { depth_limit }.search(&self.initial, &self.goal);
        ExploreReport {
            status: result.status,
            states: result.nodes.len(),
            edges: edge_count(&result.nodes),
            max_depth: result.max_depth(),
        }
    }

    fn layout(
        &self,
        strategy: SearchStrategy,
        depth_limit: Option<usize>,
        kind: &LayoutKind,
    ) -> Result<LayoutReport, LayoutError> {
        let result = strategy.run(&self.initial, &self.goal, depth_limit);
        let positions = kind.layout(&result.nodes, &self.initial)?;
        Ok(LayoutReport {
            states: result.nodes.len(),
            placed: positions.len(),
            bounds: SceneBounds::of(&positions),
        })
    }

    fn format_boards(&self) -> String {
        format!("initial:\n{}\n\ngoal:\n{}", self.initial, self.goal)
    }
}

/// Parses a problem of the given board size.
pub fn problem(
    size: usize,
    initial: &str,
    goal: Option<&str>,
) -> Result<Box<dyn PuzzleOps>, PuzzleError> {
    match size {
        2 => Ok(Box::new(Problem::<2>::parse(initial, goal)?)),
        3 => Ok(Box::new(Problem::<3>::parse(initial, goal)?)),
        4 => Ok(Box::new(Problem::<4>::parse(initial, goal)?)),
        5 => Ok(Box::new(Problem::<5>::parse(initial, goal)?)),
        _ => Err(PuzzleError::InvalidDimensions {
            size,
            reason: "supported board sizes are 2 to 5".to_string(),
        }),
    }
}
