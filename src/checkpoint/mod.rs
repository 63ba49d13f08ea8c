mod manager;
mod metadata;

pub use manager::{unix_timestamp, CheckpointData, CheckpointManager, CheckpointManagerConfig};
pub use metadata::{CheckpointHyperparameters, CheckpointMetadata, CheckpointMetrics};
