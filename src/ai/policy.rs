use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::ai::approximator::ActionValues;
use crate::ai::orientation::to_local_heading;
use crate::game::{GameState, Move};

/// World-space moves that neither reverse into the neck nor leave the board.
pub fn legal_moves(state: &GameState) -> Vec<Move> {
    let me = state.self_snake();
    let neck = me.neck();
    Move::ALL
        .into_iter()
        .filter(|&m| {
            let target = me.head.step(m);
            Some(target) != neck && state.board.contains(target)
        })
        .collect()
}

/// Index of the largest value; the first one wins ties.
pub fn argmax(values: &ActionValues) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Epsilon-greedy action selection in the canonical frame.
pub struct EpsilonGreedyPolicy {
    epsilon: f32,
    rng: StdRng,
}

impl EpsilonGreedyPolicy {
    pub fn new(epsilon: f32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        EpsilonGreedyPolicy { epsilon, rng }
    }

    /// Pick a canonical move. Greedy on `q_values`; with probability epsilon
    /// a uniformly random world-legal move instead (any move when none is
    /// legal), converted into the canonical frame.
    pub fn select(&mut self, q_values: &ActionValues, heading: Move, legal: &[Move]) -> Move {
        if self.epsilon > 0.0 && self.rng.random_range(0.0..1.0) < self.epsilon {
            let pool: &[Move] = if legal.is_empty() { &Move::ALL } else { legal };
            let world = pool[self.rng.random_range(0..pool.len())];
            return to_local_heading(world, heading);
        }
        Move::ALL[argmax(q_values)]
    }

    /// Uniformly random legal world move; `Up` when nothing is legal.
    pub fn random_legal_move(&mut self, legal: &[Move]) -> Move {
        if legal.is_empty() {
            return Move::Up;
        }
        legal[self.rng.random_range(0..legal.len())]
    }
}
