//! Episode learning: the per-turn decision buffer, the end-of-episode Bellman
//! pass, and rolling metrics.

pub mod metrics;
pub mod trainer;
pub mod turn_buffer;

pub use trainer::{bellman_target, EpisodeSummary, EpisodeTrainer};
pub use turn_buffer::{DecisionRecord, TurnBuffer};
