//! Path reconstruction from a node map.

use crate::board::{MoveDirection, PuzzleState};
use crate::error::PuzzleError;
use crate::node::NodeMap;

/// Walks parent pointers from `goal` back to the root and returns the states
/// in root-to-goal order.
///
/// Fails with `UnknownState` if `goal` was never discovered, and with
/// `BrokenParentChain` if a parent is missing from the map or the chain is
/// longer than the map itself (a cycle).
pub fn reconstruct_path<const N: usize>(
    nodes: &NodeMap<N>,
    goal: &PuzzleState<N>,
) -> Result<Vec<PuzzleState<N>>, PuzzleError> {
    let mut data = nodes.get(goal).ok_or(PuzzleError::UnknownState)?;
    let mut path = vec![*goal];

    while let Some(parent) = data.parent {
        if path.len() > nodes.len() {
            return Err(PuzzleError::BrokenParentChain(path.len()));
        }
        data = nodes
            .get(&parent)
            .ok_or(PuzzleError::BrokenParentChain(path.len()))?;
        path.push(parent);
    }

    path.reverse();
    Ok(path)
}

/// The direction the empty cell moved between two consecutive states.
///
/// Fails with `InvalidStateTransition` unless applying that move to `from`
/// yields exactly `to`; a unit shift of the empty cell is not enough when
/// other tiles differ too.
pub fn move_between<const N: usize>(
    from: &PuzzleState<N>,
    to: &PuzzleState<N>,
) -> Result<MoveDirection, PuzzleError> {
    let before = from.empty_position();
    let after = to.empty_position();
    let row_delta = after.row - before.row;
    let column_delta = after.column - before.column;
    let invalid = PuzzleError::InvalidStateTransition {
        row_delta,
        column_delta,
    };

    match MoveDirection::from_offset(row_delta, column_delta) {
        Some(direction) if from.try_move(direction).as_ref() == Some(to) => Ok(direction),
        _ => Err(invalid),
    }
}

/// Converts a state sequence into the moves that replay it.
pub fn moves_along<const N: usize>(
    path: &[PuzzleState<N>],
) -> Result<Vec<MoveDirection>, PuzzleError> {
    path.windows(2)
        .map(|pair| move_between(&pair[0], &pair[1]))
        .collect()
}

/// Reconstructs the path to `goal` and converts it to moves in one step.
pub fn solution_moves<const N: usize>(
    nodes: &NodeMap<N>,
    goal: &PuzzleState<N>,
) -> Result<Vec<MoveDirection>, PuzzleError> {
    moves_along(&reconstruct_path(nodes, goal)?)
}

/// Formats a move list as a single space-separated line.
pub fn format_moves(moves: &[MoveDirection]) -> String {
    moves
        .iter()
        .map(|direction| direction.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::EightPuzzle;
    use crate::node::{new_node_map, SearchNodeData};
    use crate::search::{BreadthFirstSearch, SearchAlgorithm};

    fn board(text: &str) -> EightPuzzle {
        text.parse().expect("valid test board")
    }

    #[test]
    fn test_single_move_example() {
        let initial = board("1 2 3 / 4 5 6 / 7 8 0");
        let goal = board("1 2 3 / 4 5 0 / 7 8 6");
        let result = BreadthFirstSearch::new().search(&initial, &goal);

        let path = reconstruct_path(&result.nodes, &goal).expect("goal was found");
        assert_eq!(path, vec![initial, goal]);
        let moves = solution_moves(&result.nodes, &goal).expect("valid chain");
        assert_eq!(moves, vec![MoveDirection::Up]);
    }

    #[test]
    fn test_bfs_path_replays_to_goal() {
        let initial = EightPuzzle::solved();
        let goal = board("5 4 3 / 1 0 7 / 2 8 6");
        let result = BreadthFirstSearch::new().search(&initial, &goal);
        let moves = solution_moves(&result.nodes, &goal).expect("valid chain");

        assert_eq!(Some(moves.len()), result.depth_of(&goal));

        let mut replay = initial;
        for direction in &moves {
            replay = replay.try_move(*direction).expect("reconstructed moves are legal");
        }
        assert_eq!(replay, goal);
    }

    #[test]
    fn test_root_path_is_just_the_root() {
        let solved = EightPuzzle::solved();
        let result = BreadthFirstSearch::new().search(&solved, &solved);
        assert_eq!(reconstruct_path(&result.nodes, &solved), Ok(vec![solved]));
        assert_eq!(solution_moves(&result.nodes, &solved), Ok(vec![]));
    }

    #[test]
    fn test_unknown_goal() {
        let nodes = new_node_map::<3>();
        assert_eq!(
            reconstruct_path(&nodes, &EightPuzzle::solved()),
            Err(PuzzleError::UnknownState)
        );
    }

    #[test]
    fn test_non_adjacent_states_are_rejected() {
        let from = EightPuzzle::solved();
        let to = board("1 2 3 / 4 5 6 / 0 7 8");
        assert_eq!(
            move_between(&from, &to),
            Err(PuzzleError::InvalidStateTransition {
                row_delta: 0,
                column_delta: -2
            })
        );
    }

    #[test]
    fn test_unit_shift_with_other_tiles_changed_is_rejected() {
        let from = EightPuzzle::solved();
        // empty cell moved up, but tiles 1 and 2 are swapped as well
        let to = board("2 1 3 / 4 5 0 / 7 8 6");
        assert_eq!(
            move_between(&from, &to),
            Err(PuzzleError::InvalidStateTransition {
                row_delta: -1,
                column_delta: 0
            })
        );

        let mut nodes = new_node_map();
        nodes.insert(from, SearchNodeData::root());
        nodes.insert(to, SearchNodeData::child_of(from, 0));
        assert!(matches!(
            solution_moves(&nodes, &to),
            Err(PuzzleError::InvalidStateTransition { .. })
        ));
    }

    #[test]
    fn test_corrupt_parent_chain() {
        let root = EightPuzzle::solved();
        let child = root.try_move(MoveDirection::Up).expect("legal");
        let mut nodes = new_node_map();
        // parent points at a state that was never recorded
        nodes.insert(child, SearchNodeData::child_of(root, 0));
        assert_eq!(
            reconstruct_path(&nodes, &child),
            Err(PuzzleError::BrokenParentChain(1))
        );

        // two states pointing at each other
        let mut looped = new_node_map();
        looped.insert(child, SearchNodeData::child_of(root, 0));
        looped.insert(root, SearchNodeData::child_of(child, 0));
        assert!(matches!(
            reconstruct_path(&looped, &child),
            Err(PuzzleError::BrokenParentChain(_))
        ));
    }

    #[test]
    fn test_format_moves() {
        let moves = [MoveDirection::Up, MoveDirection::Left, MoveDirection::Down];
        insta::assert_snapshot!(format_moves(&moves), @"Up Left Down");
    }
}
