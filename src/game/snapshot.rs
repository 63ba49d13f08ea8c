use serde::{Deserialize, Serialize};

use super::coord::Coord;

/// Game metadata sent with every snapshot. Only the id is used, for logging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameInfo {
    pub id: String,
    pub timeout: u32,
}

/// A snake as reported by the game engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battlesnake {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub health: i32,
    /// Index 0 is the head.
    pub body: Vec<Coord>,
    pub head: Coord,
    pub length: u32,
}

impl Battlesnake {
    /// Second body segment, when it sits on a different cell than the head.
    /// On the first turn the whole body is stacked on the head and there is no
    /// neck.
    pub fn neck(&self) -> Option<Coord> {
        self.body.get(1).copied().filter(|&c| c != self.head)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub food: Vec<Coord>,
    #[serde(default)]
    pub hazards: Vec<Coord>,
    #[serde(default)]
    pub snakes: Vec<Battlesnake>,
}

impl Board {
    pub fn contains(&self, coord: Coord) -> bool {
        coord.x >= 0 && coord.y >= 0 && coord.x < self.width && coord.y < self.height
    }
}

/// One per-turn observation of the game, from the point of view of `you`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    #[serde(default)]
    pub game: GameInfo,
    pub turn: u32,
    pub board: Board,
    pub you: Battlesnake,
}

impl GameState {
    /// Our own snake as listed on the board. `None` once we've been eliminated.
    pub fn self_on_board(&self) -> Option<&Battlesnake> {
        self.board.snakes.iter().find(|s| s.id == self.you.id)
    }

    /// Best known version of our own snake: the board entry when we're still
    /// alive, the `you` reference otherwise.
    pub fn self_snake(&self) -> &Battlesnake {
        self.self_on_board().unwrap_or(&self.you)
    }

    /// Every live snake other than ours.
    pub fn opponents(&self) -> impl Iterator<Item = &Battlesnake> {
        self.board.snakes.iter().filter(move |s| s.id != self.you.id)
    }
}
