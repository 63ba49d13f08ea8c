use std::path::Path;

use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::nn::{Linear, LinearConfig, Relu};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::DefaultRecorder;
use burn::tensor::TensorData;

use crate::ai::approximator::{ActionValues, QApproximator};
use crate::error::ApproximatorError;
use crate::game::NUM_ACTIONS;

type InferBackend = NdArray;
type TrainBackend = Autodiff<InferBackend>;

const WEIGHTS_FILE: &str = "q_network";

/// Fully connected action-value network.
///
/// ```text
/// Input:  [batch, features]
/// FC1:    features -> hidden, ReLU
/// FC2:    hidden -> hidden, ReLU
/// FC3:    hidden -> 4  (one Q-value per move)
/// ```
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    fc3: Linear<B>,
    relu: Relu,
}

#[derive(Config, Debug)]
pub struct QNetworkConfig {
    pub input_size: usize,
    #[config(default = 24)]
    pub hidden_size: usize,
}

impl QNetworkConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> QNetwork<B> {
        QNetwork {
            fc1: LinearConfig::new(self.input_size, self.hidden_size).init(device),
            fc2: LinearConfig::new(self.hidden_size, self.hidden_size).init(device),
            fc3: LinearConfig::new(self.hidden_size, NUM_ACTIONS).init(device),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> QNetwork<B> {
    /// Forward pass: input [batch, features] -> output [batch, 4] Q-values.
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.relu.forward(self.fc1.forward(input));
        let x = self.relu.forward(self.fc2.forward(x));
        self.fc3.forward(x)
    }
}

/// Network hyperparameters, loadable from TOML.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub hidden_size: usize,
    /// Adam step size. Independent of the Q-learning rate.
    pub learning_rate: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            hidden_size: 24,
            learning_rate: 1e-3,
        }
    }
}

/// [`QApproximator`] backed by a burn [`QNetwork`] on the CPU, trained with
/// Adam on a mean squared error loss.
pub struct BurnQApproximator {
    network: QNetwork<TrainBackend>,
    optimizer: burn::optim::adaptor::OptimizerAdaptor<burn::optim::Adam, QNetwork<TrainBackend>, TrainBackend>,
    net_config: QNetworkConfig,
    learning_rate: f64,
    device: <TrainBackend as Backend>::Device,
    fit_steps: usize,
}

impl BurnQApproximator {
    /// Fresh, untrained network for feature vectors of length `input_size`.
    pub fn new(input_size: usize, config: &NetworkConfig) -> Self {
        let device = Default::default();
        let net_config = QNetworkConfig::new(input_size).with_hidden_size(config.hidden_size);
        let network = net_config.init(&device);
        BurnQApproximator {
            network,
            optimizer: AdamConfig::new().init(),
            net_config,
            learning_rate: config.learning_rate,
            device,
            fit_steps: 0,
        }
    }

    pub fn input_size(&self) -> usize {
        self.net_config.input_size
    }

    fn check_input(&self, features: &[f32]) -> Result<(), ApproximatorError> {
        if features.len() != self.input_size() {
            return Err(ApproximatorError::InputSize {
                expected: self.input_size(),
                actual: features.len(),
            });
        }
        Ok(())
    }

    fn row_tensor<B: Backend>(values: &[f32], device: &B::Device) -> Tensor<B, 2> {
        Tensor::<B, 1>::from_data(TensorData::from(values), device).reshape([1, values.len()])
    }
}

impl QApproximator for BurnQApproximator {
    fn predict(&self, features: &[f32]) -> Result<ActionValues, ApproximatorError> {
        self.check_input(features)?;
        let input = Self::row_tensor::<InferBackend>(features, &self.device);
        let q_values: Vec<f32> = self
            .network
            .valid()
            .forward(input)
            .into_data()
            .to_vec()
            .map_err(|e| ApproximatorError::Tensor(format!("{e:?}")))?;

        ActionValues::try_from(q_values.as_slice()).map_err(|_| ApproximatorError::OutputSize {
            expected: NUM_ACTIONS,
            actual: q_values.len(),
        })
    }

    fn fit(&mut self, features: &[f32], target: &ActionValues) -> Result<(), ApproximatorError> {
        self.check_input(features)?;
        let input = Self::row_tensor::<TrainBackend>(features, &self.device);
        let target = Self::row_tensor::<TrainBackend>(target, &self.device);

        // MSE loss over all four outputs; only the taken action differs from
        // the current prediction, so only it carries gradient.
        let diff = self.network.forward(input) - target;
        let loss = (diff.clone() * diff).mean();

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.network);
        self.network = self
            .optimizer
            .step(self.learning_rate, self.network.clone(), grads);
        self.fit_steps += 1;
        Ok(())
    }

    fn save(&self, locator: &Path) -> Result<(), ApproximatorError> {
        std::fs::create_dir_all(locator).map_err(|e| ApproximatorError::Save(e.to_string()))?;
        let recorder = DefaultRecorder::default();
        self.network
            .valid()
            .save_file(locator.join(WEIGHTS_FILE), &recorder)
            .map_err(|e| ApproximatorError::Save(e.to_string()))
    }

    fn load(&mut self, locator: &Path) -> Result<(), ApproximatorError> {
        let file = locator.join(format!("{WEIGHTS_FILE}.mpk"));
        if !file.exists() {
            return Err(ApproximatorError::NotFound(file));
        }
        let recorder = DefaultRecorder::default();
        let network: QNetwork<TrainBackend> = self
            .net_config
            .init(&self.device)
            .load_file(locator.join(WEIGHTS_FILE), &recorder, &self.device)
            .map_err(|e| ApproximatorError::Load(e.to_string()))?;
        self.network = network;
        self.optimizer = AdamConfig::new().init();
        Ok(())
    }

    fn fit_steps(&self) -> usize {
        self.fit_steps
    }
}
