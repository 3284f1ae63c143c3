//! Auto-solve: search from the current board and replay the solution one move
//! at a time.

use std::collections::VecDeque;

use tracing::{info, warn};

use crate::board::{MoveDirection, PuzzleState};
use crate::error::PuzzleError;
use crate::game::PuzzleGame;
use crate::path::{moves_along, reconstruct_path};
use crate::search::SearchStrategy;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Idle,
    /// Moves are queued; manual input is locked out.
    Running,
    Cancelled,
}

/// One queued move and the board it must be applied to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PlannedMove<const N: usize> {
    before: PuzzleState<N>,
    direction: MoveDirection,
}

/// Holds the queued solution moves of one auto-solve run.
#[derive(Clone, Debug, Default)]
pub struct SolverSession<const N: usize> {
    status: SessionStatus,
    queue: VecDeque<PlannedMove<N>>,
}

impl<const N: usize> SolverSession<N> {
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            queue: VecDeque::new(),
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Queued moves not yet applied.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Manual moves, undo and redo are refused while a run is in progress.
    pub fn accepts_manual_input(&self) -> bool {
        self.status != SessionStatus::Running
    }

    /// Searches from the game's current state to `goal` and queues the moves
    /// of the resulting path. Returns the number of queued moves.
    ///
    /// A goal in the other parity class fails with `NoSolution` without
    /// searching.
    pub fn start(
        &mut self,
        game: &PuzzleGame<N>,
        goal: &PuzzleState<N>,
        strategy: SearchStrategy,
        depth_limit: Option<usize>,
    ) -> Result<usize, PuzzleError> {
        if self.status == SessionStatus::Running {
            return Err(PuzzleError::SolverBusy);
        }
        if !game.state().is_solvable_from(goal) {
            warn!("auto-solve goal is in the other parity class");
            return Err(PuzzleError::NoSolution);
        }

        let result = strategy.run(game.state(), goal, depth_limit);
        if !result.found() {
            warn!(?strategy, status = ?result.status, "auto-solve found no path");
            return Err(PuzzleError::NoSolution);
        }
        let path = reconstruct_path(&result.nodes, goal)?;
        let moves = moves_along(&path)?;

        info!(?strategy, moves = moves.len(), "auto-solve started");
        self.queue = path
            .into_iter()
            .zip(moves)
            .map(|(before, direction)| PlannedMove { before, direction })
            .collect();
        self.status = if self.queue.is_empty() {
            SessionStatus::Idle
        } else {
            SessionStatus::Running
        };
        Ok(self.queue.len())
    }

    /// Applies the next queued move to `game`. Returns the applied direction,
    /// or `None` when the session is not running.
    ///
    /// If the board is not the one the move was planned for, the session is
    /// cancelled instead.
    pub fn step(&mut self, game: &mut PuzzleGame<N>) -> Option<MoveDirection> {
        if self.status != SessionStatus::Running {
            return None;
        }
        let planned = self.queue.pop_front()?;

        if *game.state() != planned.before || !game.try_move(planned.direction) {
            warn!(direction = %planned.direction, "board diverged from the planned path");
            self.cancel();
            return None;
        }
        if self.queue.is_empty() {
            self.status = SessionStatus::Idle;
            info!("auto-solve finished");
        }
        Some(planned.direction)
    }

    /// Drops the remaining moves.
    pub fn cancel(&mut self) {
        self.queue.clear();
        self.status = SessionStatus::Cancelled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::EightPuzzle;

    fn scrambled() -> EightPuzzle {
        "1 2 3 / 4 0 6 / 7 5 8".parse().expect("valid board")
    }

    #[test]
    fn test_auto_solve_reaches_goal() {
        let goal = EightPuzzle::solved();
        let mut game = PuzzleGame::new(scrambled());
        let mut session = SolverSession::new();

        let queued = session
            .start(&game, &goal, SearchStrategy::BreadthFirst, None)
            .expect("solvable board");
        assert_eq!(queued, 2);
        assert!(!session.accepts_manual_input());

        while session.step(&mut game).is_some() {}
        assert_eq!(*game.state(), goal);
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.accepts_manual_input());
        assert_eq!(game.history().applied().len(), 2);
    }

    #[test]
    fn test_start_while_running_is_busy() {
        let goal = EightPuzzle::solved();
        let game = PuzzleGame::new(scrambled());
        let mut session = SolverSession::new();
        session
            .start(&game, &goal, SearchStrategy::BreadthFirst, None)
            .expect("solvable board");
        assert_eq!(
            session.start(&game, &goal, SearchStrategy::BreadthFirst, None),
            Err(PuzzleError::SolverBusy)
        );
    }

    #[test]
    fn test_cancel_stops_replay() {
        let goal = EightPuzzle::solved();
        let mut game = PuzzleGame::new(scrambled());
        let mut session = SolverSession::new();
        session
            .start(&game, &goal, SearchStrategy::BreadthFirst, None)
            .expect("solvable board");

        assert!(session.step(&mut game).is_some());
        session.cancel();
        assert_eq!(session.status(), SessionStatus::Cancelled);
        assert_eq!(session.step(&mut game), None);
        assert_eq!(session.remaining(), 0);
        assert!(session.accepts_manual_input());
    }

    #[test]
    fn test_unreachable_goal_is_reported() {
        let goal: EightPuzzle = "2 1 3 / 4 5 6 / 7 8 0".parse().expect("valid board");
        let game = PuzzleGame::new(EightPuzzle::solved());
        let mut session = SolverSession::new();
        assert_eq!(
            session.start(&game, &goal, SearchStrategy::BreadthFirst, Some(6)),
            Err(PuzzleError::NoSolution)
        );
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_already_solved_queues_nothing() {
        let goal = EightPuzzle::solved();
        let game = PuzzleGame::new(goal);
        let mut session = SolverSession::new();
        assert_eq!(
            session.start(&game, &goal, SearchStrategy::DepthFirst, None),
            Ok(0)
        );
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_board_changed_to_legal_but_wrong_state_cancels() {
        let goal = EightPuzzle::solved();
        let mut game = PuzzleGame::new(scrambled());
        let mut session = SolverSession::new();
        session
            .start(&game, &goal, SearchStrategy::BreadthFirst, None)
            .expect("solvable board");

        // every queued move stays legal here, but the board is no longer on the path
        game.reset("1 2 3 / 0 4 6 / 7 5 8".parse().expect("valid board"));
        let before = *game.state();
        assert_eq!(session.step(&mut game), None);
        assert_eq!(session.status(), SessionStatus::Cancelled);
        assert_eq!(*game.state(), before, "no move is applied to a diverged board");
    }

    #[test]
    fn test_other_parity_class_is_rejected_without_search() {
        let goal: EightPuzzle = "2 1 3 / 4 5 6 / 7 8 0".parse().expect("valid board");
        let game = PuzzleGame::new(EightPuzzle::solved());
        let mut session = SolverSession::new();
        // no depth limit: only the parity check keeps this from exhausting the component
        assert_eq!(
            session.start(&game, &goal, SearchStrategy::BreadthFirst, None),
            Err(PuzzleError::NoSolution)
        );
        assert_eq!(session.remaining(), 0);
    }

    #[test]
    fn test_diverged_board_cancels() {
        let goal = EightPuzzle::solved();
        let mut game = PuzzleGame::new(scrambled());
        let mut session = SolverSession::new();
        session
            .start(&game, &goal, SearchStrategy::BreadthFirst, None)
            .expect("solvable board");

        // move the board so the first queued move (Down) no longer fits
        game.reset("1 2 3 / 4 5 6 / 7 8 0".parse().expect("valid board"));
        assert_eq!(session.step(&mut game), None);
        assert_eq!(session.status(), SessionStatus::Cancelled);
    }
}
