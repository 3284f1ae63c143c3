//! Board representation for N x N sliding puzzles.
//!
//! Generic over the grid dimension (`N`). A board is a fixed-size array of
//! block values where 0 marks the empty cell. States are small `Copy` values so
//! they can be used directly as hash keys during search.

use std::fmt;
use std::str::FromStr;

use crate::error::PuzzleError;

/// Value of a single cell. 0 is the empty cell.
pub type BlockValue = u8;

/// The classic 3x3 eight-puzzle.
pub type EightPuzzle = PuzzleState<3>;

/// A (row, column) pair, 0-indexed.
///
/// Construction is unchecked so that off-board neighbours can be represented;
/// every read through [`PuzzleState::get`] validates the bounds again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoardPosition {
    pub row: i32,
    pub column: i32,
}

impl BoardPosition {
    pub const fn new(row: i32, column: i32) -> Self {
        Self { row, column }
    }

    /// Converts a row-major linear index back to a position.
    pub const fn from_index(index: usize, size: usize) -> Self {
        Self {
            row: (index / size) as i32,
            column: (index % size) as i32,
        }
    }

    /// Row-major linear index: `row * size + column`.
    #[inline]
    pub const fn index(self, size: usize) -> usize {
        self.row as usize * size + self.column as usize
    }

    #[inline]
    pub const fn is_within(self, size: usize) -> bool {
        self.row >= 0 && self.column >= 0 && (self.row as usize) < size && (self.column as usize) < size
    }

    /// The position one step away in `direction`.
    #[inline]
    pub const fn offset(self, direction: MoveDirection) -> Self {
        let (row_delta, column_delta) = direction.offset();
        Self {
            row: self.row + row_delta,
            column: self.column + column_delta,
        }
    }

    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.row.abs_diff(other.row) + self.column.abs_diff(other.column)
    }
}

impl fmt::Display for BoardPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Direction the empty cell travels in a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Up,
    Down,
    Left,
    Right,
}

impl MoveDirection {
    /// Order in which the search algorithms expand neighbours.
    pub const EXPANSION_ORDER: [MoveDirection; 4] = [
        MoveDirection::Right,
        MoveDirection::Left,
        MoveDirection::Down,
        MoveDirection::Up,
    ];

    /// Unit `(row, column)` offset applied to the empty cell.
    #[inline]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            MoveDirection::Up => (-1, 0),
            MoveDirection::Down => (1, 0),
            MoveDirection::Left => (0, -1),
            MoveDirection::Right => (0, 1),
        }
    }

    pub const fn inverse(self) -> Self {
        match self {
            MoveDirection::Up => MoveDirection::Down,
            MoveDirection::Down => MoveDirection::Up,
            MoveDirection::Left => MoveDirection::Right,
            MoveDirection::Right => MoveDirection::Left,
        }
    }

    /// Maps a unit offset back to its direction.
    pub const fn from_offset(row_delta: i32, column_delta: i32) -> Option<Self> {
        match (row_delta, column_delta) {
            (-1, 0) => Some(MoveDirection::Up),
            (1, 0) => Some(MoveDirection::Down),
            (0, -1) => Some(MoveDirection::Left),
            (0, 1) => Some(MoveDirection::Right),
            _ => None,
        }
    }
}

impl fmt::Display for MoveDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MoveDirection::Up => "Up",
            MoveDirection::Down => "Down",
            MoveDirection::Left => "Left",
            MoveDirection::Right => "Right",
        };
        f.write_str(name)
    }
}

/// Immutable N x N board with a cached empty-cell position.
///
/// Equality and hashing are structural over the cells; the cached position is
/// a function of the cells and never disagrees with them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PuzzleState<const N: usize> {
    cells: [[BlockValue; N]; N],
    empty: BoardPosition,
}

impl<const N: usize> PuzzleState<N> {
    /// Total number of cells (`N * N`).
    pub const CELL_COUNT: usize = N * N;

    /// Validates a statically shaped grid.
    ///
    /// Fails if any value is outside `0..N*N`, appears twice, or never appears.
    /// Cells are checked in row-major order and the first bad cell decides the
    /// error, so a grid holding `1..=N*N` reports `ValueOutOfRange` for its last
    /// cell. A full grid with neither fault holds every value, which leaves
    /// `MissingValue` unreachable from here.
    pub fn new(cells: [[BlockValue; N]; N]) -> Result<Self, PuzzleError> {
        const { assert!(N >= 2 && N * N <= 256, "N must be in 2..=16") };

        let mut seen = vec![false; Self::CELL_COUNT];
        let mut empty = BoardPosition::new(0, 0);

        for (row, row_cells) in cells.iter().enumerate() {
            for (column, &value) in row_cells.iter().enumerate() {
                let slot = value as usize;
                if slot >= Self::CELL_COUNT {
                    return Err(PuzzleError::ValueOutOfRange {
                        value: slot,
                        max: Self::CELL_COUNT - 1,
                    });
                }
                if seen[slot] {
                    return Err(PuzzleError::DuplicateValue(value));
                }
                seen[slot] = true;

                if value == 0 {
                    empty = BoardPosition::new(row as i32, column as i32);
                }
            }
        }

        // unreachable for a full N x N grid without duplicates
        if let Some(missing) = seen.iter().position(|&present| !present) {
            return Err(PuzzleError::MissingValue(missing as BlockValue));
        }

        Ok(Self { cells, empty })
    }

    /// Validates a dynamically shaped grid, checking the shape first.
    pub fn from_rows<R: AsRef<[BlockValue]>>(rows: &[R]) -> Result<Self, PuzzleError> {
        if rows.len() != N {
            return Err(PuzzleError::InvalidDimensions {
                size: N,
                reason: format!("found {} rows", rows.len()),
            });
        }

        let mut cells = [[0; N]; N];
        for (row, source) in rows.iter().enumerate() {
            let source = source.as_ref();
            if source.len() != N {
                return Err(PuzzleError::InvalidDimensions {
                    size: N,
                    reason: format!("row {} has {} columns", row, source.len()),
                });
            }
            cells[row].copy_from_slice(source);
        }

        Self::new(cells)
    }

    /// The canonical goal: `1, 2, ..., N*N-1` in row-major order, empty cell last.
    pub fn solved() -> Self {
        let mut cells = [[0; N]; N];
        for (index, cell) in cells.iter_mut().flatten().enumerate() {
            *cell = ((index + 1) % Self::CELL_COUNT) as BlockValue;
        }
        Self {
            cells,
            empty: BoardPosition::new(N as i32 - 1, N as i32 - 1),
        }
    }

    #[inline]
    pub const fn size(&self) -> usize {
        N
    }

    #[inline]
    pub const fn cells(&self) -> &[[BlockValue; N]; N] {
        &self.cells
    }

    /// Reads one cell, rejecting positions outside the grid.
    pub fn get(&self, position: BoardPosition) -> Result<BlockValue, PuzzleError> {
        if !position.is_within(N) {
            return Err(PuzzleError::OutOfRange {
                row: position.row,
                column: position.column,
                size: N,
            });
        }
        Ok(self.cells[position.row as usize][position.column as usize])
    }

    #[inline]
    pub const fn empty_position(&self) -> BoardPosition {
        self.empty
    }

    /// True iff `target` is on the board and orthogonally adjacent to the empty cell.
    #[inline]
    pub fn can_swap(&self, target: BoardPosition) -> bool {
        target.is_within(N) && self.empty.manhattan_distance(target) == 1
    }

    /// Returns a new state with the empty cell and `target` exchanged.
    pub fn swap(&self, target: BoardPosition) -> Result<Self, PuzzleError> {
        if !self.can_swap(target) {
            return Err(PuzzleError::IllegalMove {
                row: target.row,
                column: target.column,
            });
        }

        let mut cells = self.cells;
        let (empty_row, empty_column) = (self.empty.row as usize, self.empty.column as usize);
        let (target_row, target_column) = (target.row as usize, target.column as usize);
        cells[empty_row][empty_column] = cells[target_row][target_column];
        cells[target_row][target_column] = 0;

        Ok(Self {
            cells,
            empty: target,
        })
    }

    /// Moves the empty cell one step, or returns `None` when that leaves the board.
    #[inline]
    pub fn try_move(&self, direction: MoveDirection) -> Option<Self> {
        self.swap(self.empty.offset(direction)).ok()
    }

    /// Linear scan for the cell holding `value`.
    pub fn find_position(&self, value: BlockValue) -> Option<BoardPosition> {
        self.cells
            .iter()
            .flatten()
            .position(|&cell| cell == value)
            .map(|index| BoardPosition::from_index(index, N))
    }

    /// Legal successor states in [`MoveDirection::EXPANSION_ORDER`].
    pub fn neighbors(&self) -> impl Iterator<Item = (MoveDirection, Self)> + '_ {
        MoveDirection::EXPANSION_ORDER
            .into_iter()
            .filter_map(move |direction| self.try_move(direction).map(|next| (direction, next)))
    }

    /// Which of the two move-connected classes this permutation belongs to.
    ///
    /// Counts tile inversions in row-major order (ignoring the empty cell); for
    /// even `N` the empty cell's row is added since a vertical move shifts the
    /// inversion count by an odd amount.
    pub fn parity_class(&self) -> u8 {
        let tiles: Vec<BlockValue> = self
            .cells
            .iter()
            .flatten()
            .copied()
            .filter(|&value| value != 0)
            .collect();

        let mut inversions = 0usize;
        for (i, &earlier) in tiles.iter().enumerate() {
            inversions += tiles[i + 1..].iter().filter(|&&later| later < earlier).count();
        }

        if N % 2 == 0 {
            inversions += self.empty.row as usize;
        }
        (inversions % 2) as u8
    }

    /// True iff `other` is reachable from `self` through legal moves.
    pub fn is_solvable_from(&self, other: &Self) -> bool {
        self.parity_class() == other.parity_class()
    }
}

impl<const N: usize> FromStr for PuzzleState<N> {
    type Err = PuzzleError;

    /// Parses `N * N` integers separated by whitespace, `,`, `/` or `;`.
    ///
    /// `"1 2 3 / 4 5 6 / 7 8 0"` and `"1,2,3,4,5,6,7,8,0"` are equivalent.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = text
            .split(|c: char| c.is_whitespace() || matches!(c, ',' | '/' | ';'))
            .filter(|token| !token.is_empty())
            .collect();

        if tokens.len() != Self::CELL_COUNT {
            return Err(PuzzleError::InvalidDimensions {
                size: N,
                reason: format!("expected {} values, found {}", Self::CELL_COUNT, tokens.len()),
            });
        }

        let mut cells = [[0; N]; N];
        for (cell, token) in cells.iter_mut().flatten().zip(tokens) {
            let value: usize = token
                .parse()
                .map_err(|_| PuzzleError::InvalidToken(token.to_string()))?;
            if value >= Self::CELL_COUNT {
                return Err(PuzzleError::ValueOutOfRange {
                    value,
                    max: Self::CELL_COUNT - 1,
                });
            }
            *cell = value as BlockValue;
        }

        Self::new(cells)
    }
}

impl<const N: usize> fmt::Display for PuzzleState<N> {
    /// Rows of right-aligned values, empty cell shown as `.`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = (Self::CELL_COUNT - 1).to_string().len();
        for (row, row_cells) in self.cells.iter().enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            for (column, &value) in row_cells.iter().enumerate() {
                if column > 0 {
                    f.write_str(" ")?;
                }
                if value == 0 {
                    write!(f, "{:>width$}", ".", width = width)?;
                } else {
                    write!(f, "{:>width$}", value, width = width)?;
                }
            }
        }
        Ok(())
    }
}
