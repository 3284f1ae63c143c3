//! Interactive play: the current board, undo/redo history and change observers.

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::board::{BlockValue, MoveDirection, PuzzleState};
use crate::error::PuzzleError;

/// One applied move and the state it was applied to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordedMove<const N: usize> {
    pub before: PuzzleState<N>,
    pub direction: MoveDirection,
}

/// Undo and redo stacks. Recording a new move discards the redo stack.
#[derive(Clone, Debug, Default)]
pub struct MoveHistory<const N: usize> {
    undo: Vec<RecordedMove<N>>,
    redo: Vec<RecordedMove<N>>,
}

impl<const N: usize> MoveHistory<N> {
    pub fn new() -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    pub fn record(&mut self, entry: RecordedMove<N>) {
        self.undo.push(entry);
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Applied moves, oldest first.
    pub fn applied(&self) -> &[RecordedMove<N>] {
        &self.undo
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

/// Callback run after every change of the current state.
pub type StateObserver<const N: usize> = Box<dyn FnMut(&PuzzleState<N>)>;

/// A board being played, with full move history.
pub struct PuzzleGame<const N: usize> {
    state: PuzzleState<N>,
    history: MoveHistory<N>,
    observers: Vec<StateObserver<N>>,
}

impl<const N: usize> PuzzleGame<N> {
    pub fn new(state: PuzzleState<N>) -> Self {
        Self {
            state,
            history: MoveHistory::new(),
            observers: Vec::new(),
        }
    }

    pub fn state(&self) -> &PuzzleState<N> {
        &self.state
    }

    pub fn history(&self) -> &MoveHistory<N> {
        &self.history
    }

    /// Registers a callback invoked with the new state after each change.
    pub fn subscribe(&mut self, observer: impl FnMut(&PuzzleState<N>) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Replaces the board and forgets the history.
    pub fn reset(&mut self, state: PuzzleState<N>) {
        self.history.clear();
        self.set_state(state);
    }

    /// Moves the empty cell. Returns `false` and changes nothing if the move
    /// would leave the board.
    pub fn try_move(&mut self, direction: MoveDirection) -> bool {
        let Some(next) = self.state.try_move(direction) else {
            return false;
        };
        self.history.record(RecordedMove {
            before: self.state,
            direction,
        });
        self.set_state(next);
        true
    }

    /// Reverts the most recent move. Returns `false` when there is none.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.undo.pop() else {
            return false;
        };
        self.history.redo.push(entry);
        self.set_state(entry.before);
        true
    }

    /// Reapplies the most recently undone move. Returns `false` when there is none.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.history.redo.pop() else {
            return false;
        };
        let Some(next) = self.state.try_move(entry.direction) else {
            // history no longer matches the board
            self.history.redo.clear();
            return false;
        };
        self.history.undo.push(entry);
        self.set_state(next);
        true
    }

    /// States passed through by the applied moves, plus the current state.
    pub fn visited_route(&self) -> FxHashSet<PuzzleState<N>> {
        self.history
            .undo
            .iter()
            .map(|entry| entry.before)
            .chain(std::iter::once(self.state))
            .collect()
    }

    /// Slides every tile between the tile holding `value` and the empty cell
    /// towards the empty cell, if the two share a row or column.
    ///
    /// Returns the number of moves applied; 0 for the empty cell itself or a
    /// tile that is not in line with it.
    pub fn slide_tile(&mut self, value: BlockValue) -> Result<usize, PuzzleError> {
        if value == 0 {
            return Ok(0);
        }
        let clicked = self
            .state
            .find_position(value)
            .ok_or(PuzzleError::ValueOutOfRange {
                value: value as usize,
                max: PuzzleState::<N>::CELL_COUNT - 1,
            })?;
        let empty = self.state.empty_position();

        let row_delta = clicked.row - empty.row;
        let column_delta = clicked.column - empty.column;
        let (direction, count) = match (row_delta, column_delta) {
            (0, 0) => return Ok(0),
            (0, delta) if delta > 0 => (MoveDirection::Right, delta),
            (0, delta) => (MoveDirection::Left, -delta),
            (delta, 0) if delta > 0 => (MoveDirection::Down, delta),
            (delta, 0) => (MoveDirection::Up, -delta),
            _ => return Ok(0),
        };

        let mut applied = 0;
        for _ in 0..count {
            if !self.try_move(direction) {
                break;
            }
            applied += 1;
        }
        Ok(applied)
    }

    fn set_state(&mut self, state: PuzzleState<N>) {
        self.state = state;
        trace!(state = %self.state, "board changed");
        for observer in &mut self.observers {
            observer(&self.state);
        }
    }
}
