mod q_network;

pub use q_network::{BurnQApproximator, NetworkConfig, QNetwork, QNetworkConfig};
