//! The risk network: a small MLP trained with burn.
//!
//! 8 inputs -> 16 -> 8 -> 1, ReLU on the hidden layers. The head emits a raw
//! logit; `forward_probabilities` applies the sigmoid. Training uses the
//! logit output directly with a BCE-with-logits loss for stability.

use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;

use crate::schema::FEATURE_COUNT;

/// Network configuration
#[derive(Config, Debug)]
pub struct RiskNetConfig {
    /// Input feature count
    #[config(default = "8")]
    pub input_dim: usize,
    /// First hidden layer width
    #[config(default = "16")]
    pub hidden1_dim: usize,
    /// Second hidden layer width
    #[config(default = "8")]
    pub hidden2_dim: usize,
}

impl Default for RiskNetConfig {
    fn default() -> Self {
        Self {
            input_dim: FEATURE_COUNT,
            hidden1_dim: 16,
            hidden2_dim: 8,
        }
    }
}

impl RiskNetConfig {
    /// Initialize the network on the given device
    pub fn init<B: Backend>(&self, device: &B::Device) -> RiskNet<B> {
        let fc1 = LinearConfig::new(self.input_dim, self.hidden1_dim).init(device);
        let fc2 = LinearConfig::new(self.hidden1_dim, self.hidden2_dim).init(device);
        let head = LinearConfig::new(self.hidden2_dim, 1).init(device);

        RiskNet {
            fc1,
            fc2,
            head,
            activation: Relu::new(),
        }
    }
}

#[derive(Module, Debug)]
pub struct RiskNet<B: Backend> {
    pub fc1: Linear<B>,
    pub fc2: Linear<B>,
    pub head: Linear<B>,
    activation: Relu,
}

impl<B: Backend> RiskNet<B> {
    /// Forward pass returning raw logits with shape [batch, 1]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.activation.forward(self.fc1.forward(features));
        let x = self.activation.forward(self.fc2.forward(x));
        self.head.forward(x)
    }

    /// Forward pass returning probabilities with shape [batch]
    pub fn forward_probabilities(&self, features: Tensor<B, 2>) -> Tensor<B, 1> {
        let logits = self.forward(features).flatten::<1>(0, 1);
        burn::tensor::activation::sigmoid(logits)
    }
}
