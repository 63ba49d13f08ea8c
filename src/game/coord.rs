use serde::{Deserialize, Serialize};

/// Board coordinate. `y` grows upward, origin is the bottom-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// The neighbouring cell one step in `direction`.
    pub fn step(self, direction: Move) -> Coord {
        let (dx, dy) = direction.delta();
        Coord::new(self.x + dx, self.y + dy)
    }

    /// The move leading from `self` to an orthogonally adjacent `other`.
    pub fn direction_to(self, other: Coord) -> Option<Move> {
        Move::ALL.into_iter().find(|&m| self.step(m) == other)
    }
}

/// One of the four moves. The declaration order is the action ordering of the
/// approximator output: up, down, left, right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

/// Number of actions the agent chooses between.
pub const NUM_ACTIONS: usize = 4;

impl Move {
    pub const ALL: [Move; NUM_ACTIONS] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Index in the action ordering.
    pub fn index(self) -> usize {
        match self {
            Move::Up => 0,
            Move::Down => 1,
            Move::Left => 2,
            Move::Right => 3,
        }
    }

    pub fn opposite(self) -> Move {
        match self {
            Move::Up => Move::Down,
            Move::Down => Move::Up,
            Move::Left => Move::Right,
            Move::Right => Move::Left,
        }
    }

    /// World-space displacement `(dx, dy)`.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Move::Up => (0, 1),
            Move::Down => (0, -1),
            Move::Left => (-1, 0),
            Move::Right => (1, 0),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Move::Up => "up",
            Move::Down => "down",
            Move::Left => "left",
            Move::Right => "right",
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
