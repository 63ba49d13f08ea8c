use crate::ai::orientation::{infer_heading, rotate_board_to_local_space};
use crate::error::AgentError;
use crate::game::{Coord, GameState, Move};

pub const EMPTY: f32 = 0.0;
pub const FOOD: f32 = 1.0;
pub const HAZARD: f32 = -1.0;
pub const OPPONENT_BODY: f32 = -2.0;
pub const OWN_BODY: f32 = 2.0;
pub const OPPONENT_HEAD: f32 = -3.0;
pub const OWN_HEAD: f32 = 3.0;
/// Border padding around the board.
pub const WALL: f32 = -4.0;

/// Board dimensions the encoder (and therefore the approximator input) is
/// built for.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub board_width: usize,
    pub board_height: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            board_width: 11,
            board_height: 11,
        }
    }
}

/// Dense row-major 2-D grid of cell values. Row 0 is the top of the board.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<f32>,
}

impl Grid {
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut cells = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                cells.push(f(r, c));
            }
        }
        Grid { rows, cols, cells }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.cells[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.cells[row * self.cols + col] = value;
    }

    pub fn cells(&self) -> &[f32] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<f32> {
        self.cells
    }
}

/// Turns a snapshot into the flat, heading-relative feature vector fed to the
/// approximator.
///
/// Layout: the board padded by one wall cell on every side, rotated so the
/// snake faces up, flattened row-major, followed by the health ratio. Length
/// is `(height + 2) * (width + 2) + 1` whatever the heading.
#[derive(Debug, Clone)]
pub struct StateEncoder {
    config: EncoderConfig,
}

impl StateEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        StateEncoder { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Length of every vector returned by [`encode`](Self::encode).
    pub fn feature_len(&self) -> usize {
        (self.config.board_height + 2) * (self.config.board_width + 2) + 1
    }

    /// Encode using the heading inferred from our own snake.
    pub fn encode(&self, state: &GameState) -> Result<Vec<f32>, AgentError> {
        let heading = infer_heading(state.self_snake())?;
        self.encode_with_heading(state, heading)
    }

    pub fn encode_with_heading(
        &self,
        state: &GameState,
        heading: Move,
    ) -> Result<Vec<f32>, AgentError> {
        let grid = self.world_grid(state)?;
        let mut features = rotate_board_to_local_space(&grid, heading).into_cells();
        let health = state.self_snake().health as f32 / 100.0;
        features.push(health.clamp(0.0, 1.0));
        Ok(features)
    }

    /// Padded world-space grid, before rotation.
    pub fn world_grid(&self, state: &GameState) -> Result<Grid, AgentError> {
        self.check_board_size(state)?;
        let (width, height) = (self.config.board_width, self.config.board_height);

        let mut grid = Grid::from_fn(height + 2, width + 2, |r, c| {
            if r == 0 || c == 0 || r == height + 1 || c == width + 1 {
                WALL
            } else {
                EMPTY
            }
        });
        let mut paint = |coord: Coord, value: f32| {
            let (row, col) = self.cell_index(coord);
            grid.set(row, col, value);
        };

        for &food in &state.board.food {
            paint(food, FOOD);
        }
        for &hazard in &state.board.hazards {
            paint(hazard, HAZARD);
        }

        // Eliminated snakes are no longer on the board; draw our last known
        // body from `you` so a dead agent still shows up.
        let me = state.self_snake();
        for opponent in state.opponents() {
            for &cell in &opponent.body {
                paint(cell, OPPONENT_BODY);
            }
        }
        for &cell in &me.body {
            paint(cell, OWN_BODY);
        }
        for opponent in state.opponents() {
            paint(opponent.head, OPPONENT_HEAD);
        }
        paint(me.head, OWN_HEAD);

        Ok(grid)
    }

    /// Padded (row, col) for a world coordinate. Off-board coordinates are
    /// clamped onto the wall border.
    fn cell_index(&self, coord: Coord) -> (usize, usize) {
        let height = self.config.board_height as i32;
        let width = self.config.board_width as i32;
        let row = (height - coord.y).clamp(0, height + 1);
        let col = (coord.x + 1).clamp(0, width + 1);
        (row as usize, col as usize)
    }

    fn check_board_size(&self, state: &GameState) -> Result<(), AgentError> {
        let board = &state.board;
        if board.width as usize != self.config.board_width
            || board.height as usize != self.config.board_height
            || board.width <= 0
            || board.height <= 0
        {
            return Err(AgentError::BoardSizeMismatch {
                width: board.width,
                height: board.height,
                expected_width: self.config.board_width,
                expected_height: self.config.board_height,
            });
        }
        Ok(())
    }
}
