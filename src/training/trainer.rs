use std::collections::BTreeMap;

use crate::ai::reward::{self, RewardConfig};
use crate::ai::{ActionValues, QApproximator};
use crate::error::AgentError;
use crate::game::Move;
use crate::training::turn_buffer::DecisionRecord;

/// Result of the end-of-episode training pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpisodeSummary {
    pub total_reward: f32,
    /// Number of Bellman updates applied.
    pub transitions: usize,
    /// Recorded turns left out because the run of consecutive turns broke.
    pub untrained_records: usize,
    /// Records collected this episode, including the final observation.
    pub turns_played: usize,
}

/// One-step Q-learning target: `q_t` with the taken action's value moved
/// towards `reward + discount * max(q_next)`.
pub fn bellman_target(
    q_t: &ActionValues,
    action: Move,
    reward: f32,
    q_next: &ActionValues,
    learning_rate: f32,
    discount_factor: f32,
) -> ActionValues {
    let a = action.index();
    let max_next_q = q_next.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut target = *q_t;
    target[a] = q_t[a] + learning_rate * (reward + discount_factor * max_next_q - q_t[a]);
    target
}

/// Turns an episode's decision records into approximator updates.
#[derive(Debug, Clone)]
pub struct EpisodeTrainer {
    learning_rate: f32,
    discount_factor: f32,
    reward: RewardConfig,
}

impl EpisodeTrainer {
    pub fn new(learning_rate: f32, discount_factor: f32, reward: RewardConfig) -> Self {
        EpisodeTrainer {
            learning_rate,
            discount_factor,
            reward,
        }
    }

    /// Bellman update for the transition `prev -> next`. Returns the reward
    /// that was used.
    pub fn update(
        &self,
        approximator: &mut dyn QApproximator,
        prev: &DecisionRecord,
        next: &DecisionRecord,
    ) -> Result<f32, AgentError> {
        let reward = reward::reward(prev, next, &self.reward);
        let target = bellman_target(
            &prev.action_values,
            prev.canonical_move,
            reward,
            &next.action_values,
            self.learning_rate,
            self.discount_factor,
        );
        tracing::debug!(
            turn = prev.turn,
            reward,
            action = %prev.canonical_move,
            "training transition"
        );
        approximator.fit(&prev.features, &target)?;
        Ok(reward)
    }

    /// Walk turns 0, 1, 2, ... while both a turn and its successor are
    /// present, applying one update per pair. Stops at the first gap.
    pub fn train_records(
        &self,
        approximator: &mut dyn QApproximator,
        records: &BTreeMap<u32, DecisionRecord>,
    ) -> Result<EpisodeSummary, AgentError> {
        let mut summary = EpisodeSummary {
            turns_played: records.len(),
            ..Default::default()
        };

        let mut turn = 0u32;
        while let (Some(prev), Some(next)) = (records.get(&turn), records.get(&(turn + 1))) {
            summary.total_reward += self.update(approximator, prev, next)?;
            summary.transitions += 1;
            turn += 1;
        }

        summary.untrained_records = records.len().saturating_sub(summary.transitions + 1);
        if summary.untrained_records > 0 {
            tracing::warn!(
                stopped_at = turn,
                untrained = summary.untrained_records,
                "turn sequence has a gap; later transitions were not trained"
            );
        }
        Ok(summary)
    }
}
