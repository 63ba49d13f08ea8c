use crate::game::{Battlesnake, Board, GameState, Move};
use crate::training::turn_buffer::DecisionRecord;

/// Reward magnitudes for each transition class.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Any terminal outcome: off board, starved, collided, eliminated.
    pub death: f32,
    /// Repeating the same lateral turn for too long.
    pub oscillation: f32,
    /// Number of consecutive repeats that triggers the oscillation penalty.
    pub oscillation_run: u32,
    pub food: f32,
    pub survival: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig {
            death: -1.0,
            oscillation: -0.5,
            oscillation_run: 3,
            food: 1.0,
            survival: 0.1,
        }
    }
}

/// Why a transition got the reward it did. Checked in declaration order;
/// the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    OutOfBounds,
    Starved,
    SelfCollision,
    LostCollision,
    Oscillating,
    Eliminated,
    AteFood,
    Survived,
}

pub fn is_outside_bounds(board: &Board, snake: &Battlesnake) -> bool {
    !board.contains(snake.head)
}

pub fn is_starved(snake: &Battlesnake) -> bool {
    snake.health <= 0
}

pub fn is_collision_with_self(snake: &Battlesnake) -> bool {
    snake.body.iter().skip(1).any(|&cell| cell == snake.head)
}

/// Our head sits on another snake's body, and it's either not a head-to-head
/// or the other snake is at least as long.
pub fn is_collision_with_others_lost<'a>(
    snake: &Battlesnake,
    others: impl IntoIterator<Item = &'a Battlesnake>,
) -> bool {
    others.into_iter().any(|other| {
        other.id != snake.id
            && other
                .body
                .iter()
                .enumerate()
                .any(|(i, &cell)| cell == snake.head && (i != 0 || other.length >= snake.length))
    })
}

/// Classify the transition `prev -> next`, where `prev` holds the move that
/// was played.
pub fn classify(
    prev_state: &GameState,
    next_state: &GameState,
    prev_decision: &DecisionRecord,
    config: &RewardConfig,
) -> Outcome {
    let me = next_state.self_snake();

    if is_outside_bounds(&next_state.board, me) {
        return Outcome::OutOfBounds;
    }
    if is_starved(me) {
        return Outcome::Starved;
    }
    if is_collision_with_self(me) {
        return Outcome::SelfCollision;
    }
    if is_collision_with_others_lost(me, &next_state.board.snakes) {
        return Outcome::LostCollision;
    }
    if prev_decision.canonical_move != Move::Up
        && prev_decision.equal_moves_count >= config.oscillation_run
    {
        return Outcome::Oscillating;
    }
    if next_state.self_on_board().is_none() {
        return Outcome::Eliminated;
    }
    if me.health >= prev_state.self_snake().health {
        return Outcome::AteFood;
    }
    Outcome::Survived
}

fn outcome_reward(outcome: Outcome, config: &RewardConfig) -> f32 {
    match outcome {
        Outcome::OutOfBounds
        | Outcome::Starved
        | Outcome::SelfCollision
        | Outcome::LostCollision
        | Outcome::Eliminated => config.death,
        Outcome::Oscillating => config.oscillation,
        Outcome::AteFood => config.food,
        Outcome::Survived => config.survival,
    }
}

/// Reward for the move recorded in `prev`, judged by the snapshot recorded in
/// `next`. Pure function of its arguments.
pub fn reward(prev: &DecisionRecord, next: &DecisionRecord, config: &RewardConfig) -> f32 {
    outcome_reward(classify(&prev.snapshot, &next.snapshot, prev, config), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::fixtures::{eliminated, snake, state};

    fn decision(snapshot: GameState, canonical_move: Move, equal_moves_count: u32) -> DecisionRecord {
        DecisionRecord {
            turn: snapshot.turn,
            features: Vec::new(),
            action_values: [0.0; 4],
            canonical_move,
            world_move: canonical_move,
            equal_moves_count,
            snapshot,
        }
    }

    fn judge(prev: GameState, next: GameState) -> (Outcome, f32) {
        let config = RewardConfig::default();
        let p = decision(prev, Move::Up, 0);
        let n = decision(next, Move::Up, 0);
        let outcome = classify(&p.snapshot, &n.snapshot, &p, &config);
        (outcome, reward(&p, &n, &config))
    }

    #[test]
    fn test_off_board_beats_health_gain() {
        let prev = state(3, (5, 5), snake("me", &[(0, 2), (1, 2)], 40), vec![], &[]);
        let next = state(4, (5, 5), snake("me", &[(-1, 2), (0, 2)], 100), vec![], &[]);
        assert_eq!(judge(prev, next), (Outcome::OutOfBounds, -1.0));
    }

    #[test]
    fn test_starved() {
        let prev = state(3, (5, 5), snake("me", &[(2, 2), (2, 1)], 1), vec![], &[]);
        let next = state(4, (5, 5), snake("me", &[(2, 3), (2, 2)], 0), vec![], &[]);
        assert_eq!(judge(prev, next), (Outcome::Starved, -1.0));
    }

    #[test]
    fn test_self_collision_at_full_health() {
        let prev = state(3, (5, 5), snake("me", &[(2, 2), (2, 1), (2, 0)], 100), vec![], &[]);
        let next = state(4, (5, 5), snake("me", &[(2, 1), (2, 2), (2, 1)], 100), vec![], &[]);
        assert_eq!(judge(prev, next), (Outcome::SelfCollision, -1.0));
    }

    #[test]
    fn test_lost_body_collision() {
        let prev = state(3, (5, 5), snake("me", &[(1, 1), (0, 1), (0, 0)], 90),
            vec![snake("op", &[(3, 2), (2, 2), (2, 1)], 90)], &[]);
        let next = state(4, (5, 5), snake("me", &[(2, 1), (1, 1), (0, 1)], 95),
            vec![snake("op", &[(3, 3), (3, 2), (2, 2), (2, 1)], 90)], &[]);
        assert_eq!(judge(prev, next), (Outcome::LostCollision, -1.0));
    }

    #[test]
    fn test_head_to_head_against_equal_length_loses() {
        let prev = state(3, (5, 5), snake("me", &[(1, 2), (0, 2)], 90),
            vec![snake("op", &[(3, 2), (4, 2)], 90)], &[]);
        let next = state(4, (5, 5), snake("me", &[(2, 2), (1, 2)], 89),
            vec![snake("op", &[(2, 2), (3, 2)], 89)], &[]);
        assert_eq!(judge(prev, next).0, Outcome::LostCollision);
    }

    #[test]
    fn test_head_to_head_when_longer_is_not_a_loss() {
        let prev = state(3, (5, 5), snake("me", &[(1, 2), (0, 2), (0, 1)], 90),
            vec![snake("op", &[(3, 2), (4, 2)], 90)], &[]);
        let next = state(4, (5, 5), snake("me", &[(2, 2), (1, 2), (0, 2)], 89),
            vec![snake("op", &[(2, 2), (3, 2)], 89)], &[]);
        assert_eq!(judge(prev, next), (Outcome::Survived, 0.1));
    }

    #[test]
    fn test_oscillation_penalty_only_for_lateral_runs() {
        let config = RewardConfig::default();
        let prev = state(3, (5, 5), snake("me", &[(2, 2), (2, 1)], 90), vec![], &[]);
        let next = state(4, (5, 5), snake("me", &[(1, 2), (2, 2)], 89), vec![], &[]);
        let n = decision(next.clone(), Move::Up, 0);

        let lateral = decision(prev.clone(), Move::Left, 3);
        assert_eq!(reward(&lateral, &n, &config), -0.5);

        let short_run = decision(prev.clone(), Move::Left, 2);
        assert_eq!(reward(&short_run, &n, &config), 0.1);

        let straight = decision(prev, Move::Up, 10);
        assert_eq!(reward(&straight, &n, &config), 0.1);
    }

    #[test]
    fn test_terminal_beats_oscillation() {
        let config = RewardConfig::default();
        let prev = state(3, (5, 5), snake("me", &[(0, 2), (0, 1)], 90), vec![], &[]);
        let next = state(4, (5, 5), snake("me", &[(-1, 2), (0, 2)], 89), vec![], &[]);
        let p = decision(prev, Move::Left, 5);
        let n = decision(next, Move::Up, 0);
        assert_eq!(classify(&p.snapshot, &n.snapshot, &p, &config), Outcome::OutOfBounds);
    }

    #[test]
    fn test_eliminated_catch_all() {
        let prev = state(3, (5, 5), snake("me", &[(2, 2), (2, 1)], 90), vec![], &[]);
        let next = eliminated(4, (5, 5), snake("me", &[(2, 3), (2, 2)], 89));
        assert_eq!(judge(prev, next), (Outcome::Eliminated, -1.0));
    }

    #[test]
    fn test_food_and_full_health() {
        let prev = state(3, (5, 5), snake("me", &[(2, 2), (2, 1)], 60), vec![], &[(2, 3)]);
        let next = state(4, (5, 5), snake("me", &[(2, 3), (2, 2), (2, 2)], 100), vec![], &[]);
        assert_eq!(judge(prev, next), (Outcome::AteFood, 1.0));

        let prev = state(0, (5, 5), snake("me", &[(2, 2), (2, 2)], 100), vec![], &[]);
        let next = state(1, (5, 5), snake("me", &[(2, 3), (2, 2)], 100), vec![], &[]);
        assert_eq!(judge(prev, next).0, Outcome::AteFood);
    }

    #[test]
    fn test_plain_survival() {
        let prev = state(3, (5, 5), snake("me", &[(2, 2), (2, 1)], 60), vec![], &[]);
        let next = state(4, (5, 5), snake("me", &[(2, 3), (2, 2)], 59), vec![], &[]);
        assert_eq!(judge(prev, next), (Outcome::Survived, 0.1));
    }

    #[test]
    fn test_reward_is_pure() {
        let config = RewardConfig::default();
        let prev = state(3, (5, 5), snake("me", &[(2, 2), (2, 1)], 60), vec![], &[]);
        let next = state(4, (5, 5), snake("me", &[(2, 3), (2, 2)], 59), vec![], &[]);
        let p = decision(prev, Move::Right, 1);
        let n = decision(next, Move::Up, 0);
        let first = reward(&p, &n, &config);
        for _ in 0..5 {
            assert_eq!(reward(&p, &n, &config), first);
        }
    }
}
