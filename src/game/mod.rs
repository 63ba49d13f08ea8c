//! Battlesnake game model: coordinates, moves, and the per-turn snapshot the
//! engine sends. The agent only observes these; it never simulates the game.

mod coord;
mod snapshot;

pub use coord::{Coord, Move, NUM_ACTIONS};
pub use snapshot::{Battlesnake, Board, GameInfo, GameState};

#[cfg(test)]
pub(crate) use snapshot::fixtures;
