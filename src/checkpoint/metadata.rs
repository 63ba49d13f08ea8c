use serde::{Deserialize, Serialize};

/// Metrics snapshot at checkpoint time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetrics {
    pub average_reward: f32,
    pub last_reward: f32,
    pub average_game_length: f32,
    pub invalid_move_rate: f32,
    pub fit_steps: usize,
}

/// Hyperparameters recorded in checkpoint metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointHyperparameters {
    pub learning_rate: f32,
    pub discount_factor: f32,
    pub epsilon: f32,
    pub board_width: usize,
    pub board_height: usize,
    pub hidden_size: usize,
    pub network_learning_rate: f64,
}

/// Top-level checkpoint metadata written to metadata.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub episode: usize,
    pub timestamp: u64,
    pub metrics: CheckpointMetrics,
    pub hyperparameters: CheckpointHyperparameters,
}
