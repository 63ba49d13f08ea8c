use std::collections::VecDeque;

/// Result of a single episode.
#[derive(Debug, Clone)]
pub struct EpisodeResult {
    pub total_reward: f32,
    pub game_length: usize,
    /// Turns where the policy's move was not world-legal.
    pub invalid_moves: usize,
}

/// Rolling-window statistics over recent episodes.
pub struct TrainingMetrics {
    episode_results: VecDeque<EpisodeResult>,
    capacity: usize,
    total_episodes: usize, // lifetime count, never capped
}

impl TrainingMetrics {
    pub fn with_capacity(capacity: usize) -> Self {
        TrainingMetrics {
            episode_results: VecDeque::with_capacity(capacity),
            capacity,
            total_episodes: 0,
        }
    }

    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn record_episode(&mut self, result: EpisodeResult) {
        self.total_episodes += 1;
        self.episode_results.push_back(result);
        if self.episode_results.len() > self.capacity {
            self.episode_results.pop_front();
        }
    }

    /// Average episode reward over the last N episodes.
    pub fn average_reward(&self, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let sum: f32 = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .map(|r| r.total_reward)
            .sum();
        sum / n as f32
    }

    /// Average game length over the last N episodes.
    pub fn average_game_length(&self, last_n: usize) -> f32 {
        let n = self.episode_results.len().min(last_n);
        if n == 0 {
            return 0.0;
        }
        let total: usize = self
            .episode_results
            .iter()
            .rev()
            .take(n)
            .map(|r| r.game_length)
            .sum();
        total as f32 / n as f32
    }

    /// Share of turns with an invalid policy move over the last N episodes.
    pub fn invalid_move_rate(&self, last_n: usize) -> f32 {
        let recent = self.episode_results.iter().rev().take(last_n);
        let (invalid, turns) = recent.fold((0, 0), |(i, t), r| (i + r.invalid_moves, t + r.game_length));
        if turns == 0 {
            return 0.0;
        }
        invalid as f32 / turns as f32
    }

    pub fn last_reward(&self) -> Option<f32> {
        self.episode_results.back().map(|r| r.total_reward)
    }

    pub fn total_episodes(&self) -> usize {
        self.total_episodes
    }

    /// Continue the lifetime count from a checkpoint.
    pub fn set_total_episodes(&mut self, total: usize) {
        self.total_episodes = total;
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}
