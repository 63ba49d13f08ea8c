use crate::ai::approximator::QApproximator;
use crate::ai::orientation::{infer_heading, to_world_space};
use crate::ai::policy::{argmax, legal_moves, EpsilonGreedyPolicy};
use crate::ai::reward::RewardConfig;
use crate::ai::state_encoding::{EncoderConfig, StateEncoder};
use crate::error::AgentError;
use crate::game::{GameState, Move};
use crate::training::metrics::{EpisodeResult, TrainingMetrics};
use crate::training::{DecisionRecord, EpisodeSummary, EpisodeTrainer, TurnBuffer};

/// Q-learning hyperparameters, fixed for the lifetime of the agent.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub learning_rate: f32,
    pub discount_factor: f32,
    pub epsilon: f32,
    /// Seed for exploration and fallback moves; OS entropy when unset.
    pub seed: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            learning_rate: 0.1,
            discount_factor: 0.9,
            epsilon: 0.1,
            seed: None,
        }
    }
}

/// What the agent answers for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnDecision {
    pub world_move: Move,
    /// False when the move reverses into the neck or leaves the board.
    pub was_valid: bool,
}

/// Online Q-learning agent for one game at a time.
///
/// Every [`on_turn`](Self::on_turn) buffers a decision; the rewards are only
/// known afterwards, so all learning happens in
/// [`on_episode_end`](Self::on_episode_end).
pub struct SnakeAgent<A: QApproximator> {
    approximator: A,
    encoder: StateEncoder,
    policy: EpsilonGreedyPolicy,
    buffer: TurnBuffer,
    trainer: EpisodeTrainer,
    metrics: TrainingMetrics,
    invalid_moves: usize,
}

impl<A: QApproximator> SnakeAgent<A> {
    pub fn new(
        config: &AgentConfig,
        encoder: EncoderConfig,
        reward: RewardConfig,
        approximator: A,
    ) -> Self {
        SnakeAgent {
            approximator,
            encoder: StateEncoder::new(encoder),
            policy: EpsilonGreedyPolicy::new(config.epsilon, config.seed),
            buffer: TurnBuffer::new(),
            trainer: EpisodeTrainer::new(config.learning_rate, config.discount_factor, reward),
            metrics: TrainingMetrics::new(),
            invalid_moves: 0,
        }
    }

    /// Choose a move for `state` and buffer the decision.
    pub fn on_turn(&mut self, state: &GameState) -> Result<TurnDecision, AgentError> {
        let (record, was_valid) = self.decide(state, true)?;
        let decision = TurnDecision {
            world_move: record.world_move,
            was_valid,
        };
        tracing::debug!(
            game = %state.game.id,
            turn = state.turn,
            canonical = %record.canonical_move,
            world = %record.world_move,
            was_valid,
            "turn decided"
        );
        self.buffer.record(record)?;
        if !was_valid {
            self.invalid_moves += 1;
        }
        Ok(decision)
    }

    /// Close the episode: record the final observation, train on every
    /// consecutive pair of turns, and clear the buffer.
    pub fn on_episode_end(&mut self, final_state: &GameState) -> Result<EpisodeSummary, AgentError> {
        if self.buffer.is_empty() {
            return Err(AgentError::MissingPreviousState);
        }
        let invalid_moves = std::mem::take(&mut self.invalid_moves);

        let final_record = self.decide(final_state, false).map(|(record, _)| record);
        if let Err(e) = final_record.and_then(|record| self.buffer.record(record)) {
            self.buffer.clear();
            return Err(e);
        }

        let records = self.buffer.drain();
        let summary = self.trainer.train_records(&mut self.approximator, &records)?;

        self.metrics.record_episode(EpisodeResult {
            total_reward: summary.total_reward,
            game_length: summary.turns_played.saturating_sub(1),
            invalid_moves,
        });
        tracing::info!(
            game = %final_state.game.id,
            episode = self.metrics.total_episodes(),
            turns = summary.turns_played,
            transitions = summary.transitions,
            total_reward = summary.total_reward,
            avg_reward = self.metrics.average_reward(100),
            "episode trained"
        );
        Ok(summary)
    }

    /// Drop the episode in progress without training on it. Returns the
    /// number of decisions discarded.
    pub fn abandon_episode(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        self.invalid_moves = 0;
        dropped
    }

    /// Game id of the episode in progress, if any decision is buffered.
    pub fn episode_game_id(&self) -> Option<&str> {
        self.buffer.game_id()
    }

    /// Random world-legal move for `state`, or `Up` when nothing is legal.
    /// For callers that refuse to play an invalid policy move.
    pub fn fallback_move(&mut self, state: &GameState) -> Move {
        self.policy.random_legal_move(&legal_moves(state))
    }

    fn decide(&mut self, state: &GameState, explore: bool) -> Result<(DecisionRecord, bool), AgentError> {
        let heading = infer_heading(state.self_snake())?;
        let legal = legal_moves(state);
        let features = self.encoder.encode_with_heading(state, heading)?;
        let action_values = self.approximator.predict(&features)?;

        let canonical_move = if explore {
            self.policy.select(&action_values, heading, &legal)
        } else {
            Move::ALL[argmax(&action_values)]
        };
        let world_move = to_world_space(canonical_move, heading);
        let was_valid = legal.contains(&world_move);

        let equal_moves_count = match self.buffer.previous(state.turn) {
            Some(prev) if prev.canonical_move == canonical_move => prev.equal_moves_count + 1,
            _ => 0,
        };

        let record = DecisionRecord {
            turn: state.turn,
            features,
            action_values,
            canonical_move,
            world_move,
            equal_moves_count,
            snapshot: state.clone(),
        };
        Ok((record, was_valid))
    }

    pub fn approximator(&self) -> &A {
        &self.approximator
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut TrainingMetrics {
        &mut self.metrics
    }

    /// Decisions buffered for the episode in progress.
    pub fn buffered_turns(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::approximator::testing::ScriptedApproximator;
    use crate::game::fixtures::{eliminated, snake, state};

    fn agent(values: [f32; 4], epsilon: f32) -> SnakeAgent<ScriptedApproximator> {
        let config = AgentConfig {
            epsilon,
            seed: Some(42),
            ..Default::default()
        };
        let encoder = EncoderConfig {
            board_width: 5,
            board_height: 5,
        };
        SnakeAgent::new(
            &config,
            encoder,
            RewardConfig::default(),
            ScriptedApproximator::constant(values),
        )
    }

    #[test]
    fn test_scenario_reverse_into_neck() {
        // Heading up, the approximator prefers "down" which reverses into the
        // neck: reported invalid, and the transition is punished even though
        // health went up.
        let mut agent = agent([0.0, 1.0, 0.0, 0.0], 0.0);
        let me = snake("me", &[(2, 2), (2, 1), (2, 0)], 50);
        let s0 = state(0, (5, 5), me, vec![], &[(2, 3)]);

        let decision = agent.on_turn(&s0).unwrap();
        assert_eq!(decision.world_move, Move::Down);
        assert!(!decision.was_valid);

        let after = snake("me", &[(2, 1), (2, 2), (2, 1)], 99);
        let s1 = state(1, (5, 5), after, vec![], &[(2, 3)]);
        let summary = agent.on_episode_end(&s1).unwrap();
        assert_eq!(summary.transitions, 1);
        assert_eq!(summary.total_reward, -1.0);
        assert_eq!(agent.approximator().fits.len(), 1);
        assert_eq!(agent.buffered_turns(), 0);
        assert!((agent.metrics().invalid_move_rate(10) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_greedy_move_is_mapped_to_world_space() {
        // Heading right: canonical up (argmax) is world right.
        let mut agent = agent([1.0, 0.0, 0.0, 0.0], 0.0);
        let s = state(1, (5, 5), snake("me", &[(2, 2), (1, 2)], 90), vec![], &[]);
        let decision = agent.on_turn(&s).unwrap();
        assert_eq!(decision.world_move, Move::Right);
        assert!(decision.was_valid);
    }

    #[test]
    fn test_same_turn_twice_is_rejected() {
        let mut agent = agent([1.0, 0.0, 0.0, 0.0], 0.0);
        let s = state(0, (5, 5), snake("me", &[(2, 2), (2, 1)], 90), vec![], &[]);
        agent.on_turn(&s).unwrap();
        assert!(matches!(agent.on_turn(&s), Err(AgentError::TurnReplay(0))));
        assert_eq!(agent.buffered_turns(), 1);
    }

    #[test]
    fn test_end_without_turns_is_missing_previous_state() {
        let mut agent = agent([1.0, 0.0, 0.0, 0.0], 0.0);
        let s = state(0, (5, 5), snake("me", &[(2, 2), (2, 1)], 90), vec![], &[]);
        assert!(matches!(
            agent.on_episode_end(&s),
            Err(AgentError::MissingPreviousState)
        ));
    }

    #[test]
    fn test_full_episode_trains_every_pair() {
        // Snake walks up the middle column, then dies off the top edge.
        let mut agent = agent([1.0, 0.0, 0.0, 0.0], 0.0);
        let mut turn = 0;
        for y in 1..5 {
            let me = snake("me", &[(2, y), (2, y - 1)], 100 - turn as i32);
            agent.on_turn(&state(turn, (5, 5), me, vec![], &[])).unwrap();
            turn += 1;
        }
        let dead = snake("me", &[(2, 5), (2, 4)], 96);
        let summary = agent.on_episode_end(&eliminated(turn, (5, 5), dead)).unwrap();

        assert_eq!(summary.turns_played, 5);
        assert_eq!(summary.transitions, 4);
        // Three survived turns then off the board.
        assert!((summary.total_reward - (0.3 - 1.0)).abs() < 1e-6);
        assert_eq!(agent.approximator().fits.len(), 4);
        assert_eq!(agent.metrics().total_episodes(), 1);
    }

    /// Canonical "left" every turn spins the snake around a 2x2 square.
    const SPIN: [[(i32, i32); 2]; 5] = [
        [(2, 2), (2, 1)],
        [(1, 2), (2, 2)],
        [(1, 1), (1, 2)],
        [(2, 1), (1, 1)],
        [(2, 2), (2, 1)],
    ];

    fn spin_state(turn: usize) -> GameState {
        state(turn as u32, (5, 5), snake("me", &SPIN[turn], 90), vec![], &[])
    }

    #[test]
    fn test_equal_moves_count_grows_and_resets() {
        let mut agent = agent([0.0, 0.0, 1.0, 0.0], 0.0);
        for turn in 0..4 {
            agent.on_turn(&spin_state(turn)).unwrap();
        }
        // Fifth turn goes straight instead.
        agent.approximator().push([1.0, 0.0, 0.0, 0.0]);
        agent.on_turn(&spin_state(4)).unwrap();

        let counts: Vec<u32> = (0..5)
            .map(|t| agent.buffer.get(t).unwrap().equal_moves_count)
            .collect();
        assert_eq!(counts, vec![0, 1, 2, 3, 0]);
        assert_eq!(agent.buffer.get(4).unwrap().canonical_move, Move::Up);
    }

    #[test]
    fn test_repeated_lateral_moves_are_penalised() {
        let mut agent = agent([0.0, 0.0, 1.0, 0.0], 0.0);
        for turn in 0..4 {
            agent.on_turn(&spin_state(turn)).unwrap();
        }
        let summary = agent.on_episode_end(&spin_state(4)).unwrap();

        // Three unchanged-health turns at +1, then the fourth "left" in a row.
        assert_eq!(summary.transitions, 4);
        assert!((summary.total_reward - (3.0 - 0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_abandon_episode_discards_buffer() {
        let mut agent = agent([0.0, 1.0, 0.0, 0.0], 0.0);
        let s = state(0, (5, 5), snake("me", &[(2, 2), (2, 1)], 90), vec![], &[]);
        assert!(!agent.on_turn(&s).unwrap().was_valid);
        assert_eq!(agent.episode_game_id(), Some("test-game"));

        assert_eq!(agent.abandon_episode(), 1);
        assert_eq!(agent.buffered_turns(), 0);
        assert_eq!(agent.episode_game_id(), None);
        assert!(agent.approximator().fits.is_empty());

        // Turn 0 is free again and the stale invalid move is forgotten.
        agent.on_turn(&s).unwrap();
        let next = state(1, (5, 5), snake("me", &[(2, 1), (2, 2)], 90), vec![], &[]);
        agent.on_episode_end(&next).unwrap();
        assert!((agent.metrics().invalid_move_rate(10) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_replayed_final_turn_clears_buffer() {
        let mut agent = agent([1.0, 0.0, 0.0, 0.0], 0.0);
        let s = state(0, (5, 5), snake("me", &[(2, 2), (2, 1)], 90), vec![], &[]);
        agent.on_turn(&s).unwrap();
        assert!(matches!(agent.on_episode_end(&s), Err(AgentError::TurnReplay(0))));
        assert_eq!(agent.buffered_turns(), 0);
        // Next game can start from turn 0 again.
        agent.on_turn(&s).unwrap();
    }

    #[test]
    fn test_fallback_move_is_legal() {
        let mut agent = agent([1.0, 0.0, 0.0, 0.0], 0.0);
        let s = state(0, (5, 5), snake("me", &[(0, 0), (0, 1)], 90), vec![], &[]);
        for _ in 0..20 {
            assert_eq!(agent.fallback_move(&s), Move::Right);
        }
    }
}
