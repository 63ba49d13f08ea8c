//! Line-oriented host: one JSON event per input line, one JSON response per
//! `info` or `move` event on the output.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};

use crate::ai::{QApproximator, SnakeAgent};
use crate::checkpoint::{
    unix_timestamp, CheckpointHyperparameters, CheckpointManager, CheckpointMetadata,
    CheckpointMetrics,
};
use crate::error::HostError;
use crate::game::{GameState, Move};

/// Window used for the rolling metrics written into checkpoints.
const METRICS_WINDOW: usize = 100;

/// One request from the game engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "state", rename_all = "lowercase")]
pub enum HostEvent {
    Info,
    Start(GameState),
    Move(GameState),
    End(GameState),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResponse {
    #[serde(rename = "move")]
    pub direction: Move,
}

/// Appearance reported to the game engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoResponse {
    pub apiversion: String,
    pub author: String,
    pub color: String,
    pub head: String,
    pub tail: String,
}

impl Default for InfoResponse {
    fn default() -> Self {
        InfoResponse {
            apiversion: "1".to_string(),
            author: String::new(),
            color: "#888888".to_string(),
            head: "default".to_string(),
            tail: "default".to_string(),
        }
    }
}

/// Counters for one host session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub games_started: usize,
    pub moves_answered: usize,
    /// Policy moves swapped for a random legal move.
    pub moves_replaced: usize,
    pub turn_errors: usize,
    pub episodes_trained: usize,
    pub episodes_failed: usize,
    /// Unfinished episodes dropped because another game began.
    pub episodes_abandoned: usize,
    pub checkpoints_saved: usize,
}

struct Checkpointing {
    manager: CheckpointManager,
    hyperparameters: CheckpointHyperparameters,
}

/// Drives a [`SnakeAgent`] from a stream of host events.
pub struct HostSession<A: QApproximator> {
    agent: SnakeAgent<A>,
    checkpointing: Option<Checkpointing>,
    summary: SessionSummary,
}

impl<A: QApproximator> HostSession<A> {
    pub fn new(agent: SnakeAgent<A>) -> Self {
        HostSession {
            agent,
            checkpointing: None,
            summary: SessionSummary::default(),
        }
    }

    /// Save a checkpoint every `manager.config().interval` trained episodes.
    pub fn with_checkpoints(
        mut self,
        manager: CheckpointManager,
        hyperparameters: CheckpointHyperparameters,
    ) -> Self {
        self.checkpointing = Some(Checkpointing {
            manager,
            hyperparameters,
        });
        self
    }

    pub fn agent(&self) -> &SnakeAgent<A> {
        &self.agent
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// Process every line of `input` until EOF.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        input: R,
        mut output: W,
    ) -> Result<SessionSummary, HostError> {
        for (index, line) in input.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: HostEvent =
                serde_json::from_str(&line).map_err(|source| HostError::Event {
                    line: index + 1,
                    source,
                })?;
            self.handle(event, &mut output)?;
        }
        Ok(self.summary.clone())
    }

    /// Handle one event, writing its response (if any) to `output`.
    pub fn handle<W: Write>(&mut self, event: HostEvent, output: &mut W) -> Result<(), HostError> {
        match event {
            HostEvent::Info => write_line(output, &InfoResponse::default()),
            HostEvent::Start(state) => {
                self.discard_stale_episode(&state, true);
                self.summary.games_started += 1;
                tracing::info!(game = %state.game.id, "game started");
                Ok(())
            }
            HostEvent::Move(state) => {
                self.discard_stale_episode(&state, false);
                let direction = self.answer_move(&state);
                self.summary.moves_answered += 1;
                write_line(output, &MoveResponse { direction })
            }
            HostEvent::End(state) => {
                self.discard_stale_episode(&state, false);
                self.finish_game(&state)
            }
        }
    }

    /// Drop buffered decisions left over from a game whose `end` never
    /// arrived. A `start` always closes the previous episode; other events
    /// close it when they belong to a different game.
    fn discard_stale_episode(&mut self, state: &GameState, starting: bool) {
        let stale = match self.agent.episode_game_id() {
            Some(id) => starting || id != state.game.id,
            None => false,
        };
        if !stale {
            return;
        }
        let dropped = self.agent.abandon_episode();
        tracing::warn!(
            game = %state.game.id,
            dropped,
            "discarding unfinished episode from a previous game"
        );
        self.summary.episodes_abandoned += 1;
    }

    fn answer_move(&mut self, state: &GameState) -> Move {
        match self.agent.on_turn(state) {
            Ok(decision) if decision.was_valid => decision.world_move,
            Ok(decision) => {
                let replacement = self.agent.fallback_move(state);
                tracing::warn!(
                    turn = state.turn,
                    chosen = %decision.world_move,
                    replacement = %replacement,
                    "policy move is not valid, picking a random legal move"
                );
                self.summary.moves_replaced += 1;
                replacement
            }
            Err(e) => {
                let replacement = self.agent.fallback_move(state);
                tracing::error!(turn = state.turn, error = %e, "turn failed, answering with a random legal move");
                self.summary.turn_errors += 1;
                replacement
            }
        }
    }

    fn finish_game(&mut self, state: &GameState) -> Result<(), HostError> {
        if let Err(e) = self.agent.on_episode_end(state) {
            tracing::warn!(game = %state.game.id, error = %e, "episode not trained");
            self.summary.episodes_failed += 1;
            return Ok(());
        }
        self.summary.episodes_trained += 1;

        let Some(checkpointing) = &self.checkpointing else {
            return Ok(());
        };
        let episode = self.agent.metrics().total_episodes();
        if episode % checkpointing.manager.config().interval != 0 {
            return Ok(());
        }

        let metrics = self.agent.metrics();
        let metadata = CheckpointMetadata {
            episode,
            timestamp: unix_timestamp(),
            metrics: CheckpointMetrics {
                average_reward: metrics.average_reward(METRICS_WINDOW),
                last_reward: metrics.last_reward().unwrap_or(0.0),
                average_game_length: metrics.average_game_length(METRICS_WINDOW),
                invalid_move_rate: metrics.invalid_move_rate(METRICS_WINDOW),
                fit_steps: self.agent.approximator().fit_steps(),
            },
            hyperparameters: checkpointing.hyperparameters.clone(),
        };
        let path = checkpointing
            .manager
            .save_checkpoint(self.agent.approximator(), &metadata)?;
        tracing::info!(episode, path = %path.display(), "checkpoint saved");
        self.summary.checkpoints_saved += 1;
        Ok(())
    }
}

fn write_line<W: Write, T: Serialize>(output: &mut W, response: &T) -> Result<(), HostError> {
    serde_json::to_writer(&mut *output, response).map_err(HostError::Response)?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}
