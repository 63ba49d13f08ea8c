use std::path::PathBuf;

use crate::game::Coord;

/// Errors from the opaque action-value approximator.
#[derive(Debug, thiserror::Error)]
pub enum ApproximatorError {
    #[error("no saved weights found at {0}")]
    NotFound(PathBuf),

    #[error("failed to load weights: {0}")]
    Load(String),

    #[error("failed to save weights: {0}")]
    Save(String),

    #[error("tensor data error: {0}")]
    Tensor(String),

    #[error("expected {expected} input features, got {actual}")]
    InputSize { expected: usize, actual: usize },

    #[error("expected {expected} action values, got {actual}")]
    OutputSize { expected: usize, actual: usize },
}

/// Errors raised while playing or training one episode. None of these are
/// retried; the episode (or turn) that hit one is abandoned.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("turn {0} has already been recorded")]
    TurnReplay(u32),

    #[error("missing previous state: no decision recorded before training")]
    MissingPreviousState,

    #[error("cannot infer heading: neck {neck:?} is not adjacent to head {head:?}")]
    InvalidHeading { head: Coord, neck: Coord },

    #[error("board is {width}x{height} but the encoder expects {expected_width}x{expected_height}")]
    BoardSizeMismatch {
        width: i32,
        height: i32,
        expected_width: usize,
        expected_height: usize,
    },

    #[error("approximator error: {0}")]
    Approximator(#[from] ApproximatorError),
}

/// Errors that can occur during checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("no 'latest' symlink found in {0}")]
    NoLatestSymlink(PathBuf),

    #[error("failed to read metadata from {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse metadata from {path}: {source}")]
    MetadataParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to save model: {0}")]
    ModelSave(ApproximatorError),

    #[error("failed to load model: {0}")]
    ModelLoad(ApproximatorError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Errors from the line-oriented host session.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed event on line {line}: {source}")]
    Event {
        line: usize,
        source: serde_json::Error,
    },

    #[error("failed to write response: {0}")]
    Response(serde_json::Error),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}
