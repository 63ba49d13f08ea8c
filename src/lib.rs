//! # ML Battlesnake
//!
//! An online Q-learning Battlesnake agent. Every observation is rotated so the
//! snake always faces up before it is encoded, which lets one action-value
//! approximator serve all four headings. Decisions are buffered per game and
//! trained with a one-step Bellman update when the game ends.
//!
//! ## Modules
//!
//! - [`game`]: snapshot wire types, coordinates and moves
//! - [`ai`]: orientation, state encoding, rewards, policy, burn Q-network, agent
//! - [`training`]: turn buffer, episode trainer, rolling metrics
//! - [`checkpoint`]: weight persistence and pruning
//! - [`host`]: JSON-lines host session
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: structured error types

pub mod ai;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod game;
pub mod host;
pub mod training;
