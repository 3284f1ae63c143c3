//! Error types for puzzle construction, path reconstruction and layout.

use thiserror::Error;

use crate::board::BlockValue;

/// Errors raised by board construction, cell access and move bookkeeping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PuzzleError {
    /// The grid is not `size` x `size`.
    #[error("grid must be {size}x{size}: {reason}")]
    InvalidDimensions { size: usize, reason: String },

    /// A block value appears more than once.
    #[error("block value {0} appears more than once")]
    DuplicateValue(BlockValue),

    /// A block value in `0..N*N` never appears.
    #[error("block value {0} is missing")]
    MissingValue(BlockValue),

    /// A block value lies outside `0..N*N`.
    #[error("block value {value} is out of range (max {max})")]
    ValueOutOfRange { value: usize, max: usize },

    /// A token in a textual board could not be read as a number.
    #[error("cannot parse block value from {0:?}")]
    InvalidToken(String),

    /// A board position lies outside the grid.
    #[error("position ({row}, {column}) is outside a {size}x{size} grid")]
    OutOfRange { row: i32, column: i32, size: usize },

    /// The target cell is not orthogonally adjacent to the empty cell.
    #[error("cannot swap the empty cell with ({row}, {column})")]
    IllegalMove { row: i32, column: i32 },

    /// Two consecutive states on a path do not differ by a single move.
    #[error("states are not one move apart (empty cell moved by ({row_delta}, {column_delta}))")]
    InvalidStateTransition { row_delta: i32, column_delta: i32 },

    /// The requested state never appeared in the node map.
    #[error("state is not present in the node map")]
    UnknownState,

    /// Parent pointers loop or lead to a state missing from the node map.
    #[error("parent chain is broken after {0} steps")]
    BrokenParentChain(usize),

    /// The search ended without reaching the goal.
    #[error("search ended without reaching the goal")]
    NoSolution,

    /// An auto-solve run is already in progress.
    #[error("a solver session is already running")]
    SolverBusy,
}

/// Errors raised when a layout is configured with unusable parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    #[error("invalid layout configuration: {0}")]
    InvalidConfig(String),
}
