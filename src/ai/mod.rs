mod agent;
pub mod approximator;
pub mod networks;
pub mod orientation;
pub mod policy;
pub mod reward;
pub mod state_encoding;

pub use agent::{AgentConfig, SnakeAgent, TurnDecision};
pub use approximator::{ActionValues, QApproximator};
pub use networks::{BurnQApproximator, NetworkConfig, QNetwork, QNetworkConfig};
pub use policy::EpsilonGreedyPolicy;
pub use reward::{Outcome, RewardConfig};
pub use state_encoding::{EncoderConfig, StateEncoder};
