//! The persisted model artifact and its inference path.
//!
//! A trained network is exported to a self-contained JSON file: layer weights,
//! the fitted scaler, the feature schema it was trained against, and training
//! metadata. Serving needs nothing but this file; the forward pass is plain
//! matrix-vector arithmetic, deterministic and dependency-light.
//!
//! Shape validation happens at load time, so a service never starts on a
//! corrupt or mismatched artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{DiariskError, Result};
use crate::ml::scaler::StandardScaler;
use crate::schema::{self, FEATURE_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Identity,
    Relu,
    Sigmoid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Weights shape: [out_dim][in_dim]
    pub weights: Vec<Vec<f64>>,
    /// Bias shape: [out_dim]
    pub bias: Vec<f64>,
    pub activation: Activation,
}

impl DenseLayer {
    fn in_dim(&self) -> usize {
        self.weights.first().map(|r| r.len()).unwrap_or(0)
    }

    fn out_dim(&self) -> usize {
        self.weights.len()
    }
}

/// Provenance recorded alongside the weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub trained_at: DateTime<Utc>,
    pub dataset_url: String,
    pub seed: u64,
    pub epochs: usize,
    /// Held-out accuracy at the training-time decision threshold
    pub test_accuracy: f64,
}

/// A fitted risk model as read back from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskModel {
    /// Wire names of the input features, in model input order
    pub feature_names: Vec<String>,
    pub scaler: StandardScaler,
    pub layers: Vec<DenseLayer>,
    pub metadata: ModelMetadata,
}

impl RiskModel {
    /// Load and validate an artifact. Any failure here is fatal to `serve`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            DiariskError::Model(format!("cannot read artifact {}: {}", path.display(), e))
        })?;
        let model: Self = serde_json::from_str(&content)
            .map_err(|e| DiariskError::Model(format!("malformed artifact: {}", e)))?;
        model.validate().map_err(DiariskError::Model)?;
        Ok(model)
    }

    /// Write the artifact, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.validate().map_err(DiariskError::Model)?;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, payload)?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.feature_names != schema::wire_names() {
            return Err(format!(
                "artifact feature schema {:?} does not match this build's schema {:?}",
                self.feature_names,
                schema::wire_names()
            ));
        }
        if self.scaler.mean.len() != FEATURE_COUNT || self.scaler.std.len() != FEATURE_COUNT {
            return Err(format!(
                "scaler dimensions {}/{} != feature count {}",
                self.scaler.mean.len(),
                self.scaler.std.len(),
                FEATURE_COUNT
            ));
        }
        if self
            .scaler
            .mean
            .iter()
            .chain(self.scaler.std.iter())
            .any(|v| !v.is_finite())
        {
            return Err("scaler contains non-finite values".to_string());
        }
        if self.scaler.std.iter().any(|v| *v < 0.0) {
            return Err("scaler std must be non-negative".to_string());
        }
        if self.layers.is_empty() {
            return Err("layers must not be empty".to_string());
        }

        let mut expected_in = FEATURE_COUNT;
        for (idx, layer) in self.layers.iter().enumerate() {
            if layer.out_dim() == 0 {
                return Err(format!("layer[{idx}] out_dim must be > 0"));
            }
            if layer.bias.len() != layer.out_dim() {
                return Err(format!(
                    "layer[{idx}] bias len {} != out_dim {}",
                    layer.bias.len(),
                    layer.out_dim()
                ));
            }
            for (r, row) in layer.weights.iter().enumerate() {
                if row.len() != expected_in {
                    return Err(format!(
                        "layer[{idx}] weights row {r} len {} != expected in_dim {expected_in}",
                        row.len()
                    ));
                }
                if row.iter().any(|v| !v.is_finite()) {
                    return Err(format!("layer[{idx}] weights contain non-finite values"));
                }
            }
            if layer.bias.iter().any(|v| !v.is_finite()) {
                return Err(format!("layer[{idx}] bias contains non-finite values"));
            }
            expected_in = layer.out_dim();
        }

        if expected_in != 1 {
            return Err(format!("final layer must have out_dim 1, got {expected_in}"));
        }
        match self.layers.last().map(|l| l.activation) {
            Some(Activation::Sigmoid) => {}
            other => {
                return Err(format!(
                    "final layer activation must be sigmoid, got {:?}",
                    other
                ))
            }
        }

        Ok(())
    }

    /// Score one sample: standardize, run the network, return the risk.
    ///
    /// Output is the sigmoid of the final unit, clamped into [0, 1] against
    /// floating-point drift.
    pub fn predict(&self, features: &[f64; FEATURE_COUNT]) -> Result<f64> {
        let mut x: Vec<f64> = self.scaler.transform_one(features).to_vec();

        for layer in &self.layers {
            let in_dim = layer.in_dim();
            if x.len() != in_dim {
                return Err(DiariskError::Model(format!(
                    "input dim mismatch: got {}, expected {}",
                    x.len(),
                    in_dim
                )));
            }

            let mut y = vec![0.0_f64; layer.out_dim()];
            for (o, row) in layer.weights.iter().enumerate() {
                let mut sum = layer.bias[o];
                for (i, w) in row.iter().enumerate() {
                    sum += w * x[i];
                }
                y[o] = apply_activation(sum, layer.activation);
            }
            x = y;
        }

        Ok(x[0].clamp(0.0, 1.0))
    }
}

fn apply_activation(x: f64, act: Activation) -> f64 {
    match act {
        Activation::Identity => x,
        Activation::Relu => x.max(0.0),
        Activation::Sigmoid => sigmoid(x),
    }
}

fn sigmoid(x: f64) -> f64 {
    // Numerically stable in both tails.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Identity scaler and a single sigmoid layer.
    fn single_layer_model(weights: [f64; FEATURE_COUNT]) -> RiskModel {
        RiskModel {
            feature_names: schema::wire_names(),
            scaler: StandardScaler {
                mean: vec![0.0; FEATURE_COUNT],
                std: vec![1.0; FEATURE_COUNT],
            },
            layers: vec![DenseLayer {
                weights: vec![weights.to_vec()],
                bias: vec![0.0],
                activation: Activation::Sigmoid,
            }],
            metadata: ModelMetadata {
                trained_at: DateTime::<Utc>::MIN_UTC,
                dataset_url: "memory://fixture".to_string(),
                seed: 42,
                epochs: 0,
                test_accuracy: 0.0,
            },
        }
    }

    #[test]
    fn zero_input_scores_half() {
        let model = single_layer_model([1.0; FEATURE_COUNT]);
        let risk = model.predict(&[0.0; FEATURE_COUNT]).unwrap();
        assert!((risk - 0.5).abs() < 1e-12);
    }

    #[test]
    fn risk_stays_in_unit_interval() {
        let model = single_layer_model([5.0, -3.0, 2.0, -1.0, 4.0, -2.0, 1.0, -5.0]);
        for scale in [-1000.0, -1.0, 0.0, 1.0, 1000.0] {
            let risk = model.predict(&[scale; FEATURE_COUNT]).unwrap();
            assert!((0.0..=1.0).contains(&risk), "risk {risk} for scale {scale}");
        }
    }

    #[test]
    fn scaler_is_applied_before_the_network() {
        let mut model = single_layer_model([1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        model.scaler.mean[0] = 10.0;
        model.scaler.std[0] = 2.0;

        // (12 - 10) / 2 = 1 -> sigmoid(1)
        let risk = model
            .predict(&[12.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
            .unwrap();
        assert!((risk - sigmoid(1.0)).abs() < 1e-12);
    }

    #[test]
    fn rejects_schema_mismatch() {
        let mut model = single_layer_model([1.0; FEATURE_COUNT]);
        model.feature_names.swap(0, 7);
        assert!(model.validate().is_err());
    }

    #[test]
    fn rejects_bad_layer_shapes() {
        let mut model = single_layer_model([1.0; FEATURE_COUNT]);
        model.layers[0].weights[0].pop();
        assert!(model.validate().is_err());

        let mut model = single_layer_model([1.0; FEATURE_COUNT]);
        model.layers[0].bias.push(0.0);
        assert!(model.validate().is_err());
    }

    #[test]
    fn rejects_non_sigmoid_head() {
        let mut model = single_layer_model([1.0; FEATURE_COUNT]);
        model.layers[0].activation = Activation::Relu;
        assert!(model.validate().is_err());
    }

    #[test]
    fn save_load_roundtrip() {
        let model = single_layer_model([0.5, -0.5, 0.25, -0.25, 1.0, -1.0, 2.0, -2.0]);
        let path = std::env::temp_dir().join("diarisk_artifact_roundtrip.json");

        model.save(&path).unwrap();
        let loaded = RiskModel::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let input = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        assert_eq!(
            model.predict(&input).unwrap(),
            loaded.predict(&input).unwrap()
        );
    }

    #[test]
    fn load_fails_on_missing_file() {
        assert!(RiskModel::load("/nonexistent/diarisk.json").is_err());
    }
}
