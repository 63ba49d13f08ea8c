//! Heading-relative ("canonical") frame. In the canonical frame the snake
//! always faces up; these functions move boards and moves in and out of it.

use crate::ai::state_encoding::Grid;
use crate::error::AgentError;
use crate::game::{Battlesnake, Move};

/// Direction the snake travelled on its previous turn, from neck to head.
/// Defaults to `Up` when the body is still stacked (first turn).
pub fn infer_heading(snake: &Battlesnake) -> Result<Move, AgentError> {
    match snake.neck() {
        None => Ok(Move::Up),
        Some(neck) => neck
            .direction_to(snake.head)
            .ok_or(AgentError::InvalidHeading {
                head: snake.head,
                neck,
            }),
    }
}

/// Map a canonical move back to the world move it stands for.
pub fn to_world_space(canonical: Move, heading: Move) -> Move {
    match heading {
        Move::Up => canonical,
        Move::Right => match canonical {
            Move::Up => Move::Right,
            Move::Right => Move::Down,
            Move::Down => Move::Left,
            Move::Left => Move::Up,
        },
        Move::Down => match canonical {
            Move::Up => Move::Down,
            Move::Right => Move::Left,
            Move::Down => Move::Up,
            Move::Left => Move::Right,
        },
        Move::Left => match canonical {
            Move::Up => Move::Left,
            Move::Right => Move::Up,
            Move::Down => Move::Right,
            Move::Left => Move::Down,
        },
    }
}

/// Map a world move into the canonical frame. Exact inverse of
/// [`to_world_space`].
pub fn to_local_heading(world: Move, heading: Move) -> Move {
    match heading {
        Move::Up => world,
        Move::Right => match world {
            Move::Right => Move::Up,
            Move::Down => Move::Right,
            Move::Left => Move::Down,
            Move::Up => Move::Left,
        },
        Move::Down => match world {
            Move::Down => Move::Up,
            Move::Left => Move::Right,
            Move::Up => Move::Down,
            Move::Right => Move::Left,
        },
        Move::Left => match world {
            Move::Left => Move::Up,
            Move::Up => Move::Right,
            Move::Right => Move::Down,
            Move::Down => Move::Left,
        },
    }
}

/// Rotate a world-space grid (row 0 = top of the board) so that `heading`
/// points to the top row.
///
/// Right turns the grid a quarter counter-clockwise, left a quarter clockwise,
/// down a half turn. Non-square grids swap their dimensions on quarter turns.
pub fn rotate_board_to_local_space(grid: &Grid, heading: Move) -> Grid {
    let (rows, cols) = (grid.rows(), grid.cols());
    match heading {
        Move::Up => grid.clone(),
        Move::Right => Grid::from_fn(cols, rows, |r, c| grid.get(c, cols - 1 - r)),
        Move::Down => Grid::from_fn(rows, cols, |r, c| grid.get(rows - 1 - r, cols - 1 - c)),
        Move::Left => Grid::from_fn(cols, rows, |r, c| grid.get(rows - 1 - c, r)),
    }
}
