use std::collections::BTreeMap;

use crate::ai::ActionValues;
use crate::error::AgentError;
use crate::game::{GameState, Move};

/// Everything needed to rebuild one transition after the fact.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub turn: u32,
    pub features: Vec<f32>,
    pub action_values: ActionValues,
    pub canonical_move: Move,
    pub world_move: Move,
    /// How many turns in a row before this one picked the same canonical move.
    pub equal_moves_count: u32,
    pub snapshot: GameState,
}

/// Per-episode store of decisions, keyed by turn number.
///
/// Each turn may be recorded once. [`drain`](Self::drain) hands the whole
/// episode over for training and leaves the buffer empty for the next game.
#[derive(Debug, Default)]
pub struct TurnBuffer {
    records: BTreeMap<u32, DecisionRecord>,
}

impl TurnBuffer {
    pub fn new() -> Self {
        TurnBuffer::default()
    }

    /// Insert a decision. Fails without touching the existing record when the
    /// turn was already played.
    pub fn record(&mut self, record: DecisionRecord) -> Result<(), AgentError> {
        if self.records.contains_key(&record.turn) {
            return Err(AgentError::TurnReplay(record.turn));
        }
        self.records.insert(record.turn, record);
        Ok(())
    }

    pub fn get(&self, turn: u32) -> Option<&DecisionRecord> {
        self.records.get(&turn)
    }

    /// Record of the turn immediately before `turn`.
    pub fn previous(&self, turn: u32) -> Option<&DecisionRecord> {
        turn.checked_sub(1).and_then(|t| self.records.get(&t))
    }

    /// Take every record, in turn order, leaving the buffer empty.
    pub fn drain(&mut self) -> BTreeMap<u32, DecisionRecord> {
        std::mem::take(&mut self.records)
    }

    /// Game the buffered decisions belong to.
    pub fn game_id(&self) -> Option<&str> {
        self.records.values().next().map(|r| r.snapshot.game.id.as_str())
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
