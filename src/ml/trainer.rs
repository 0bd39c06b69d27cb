//! Training job: fetch, split, scale, fit, evaluate, export.
//!
//! Training runs on `Autodiff<NdArray>` (CPU); evaluation and export use the
//! inner backend via `model.valid()`. The exported artifact is cross-checked
//! against the in-memory network before anything is written to disk, so a
//! failed run never leaves a partial or drifted artifact behind.

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};
use burn::module::AutodiffModule;
use burn::nn::loss::{BinaryCrossEntropyLoss, BinaryCrossEntropyLossConfig};
use burn::nn::Linear;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::TensorData;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::{AppConfig, TrainingConfig};
use crate::dataset::{fetch_dataset, split_train_test, LabeledSample};
use crate::error::{DiariskError, Result};
use crate::ml::artifact::{Activation, DenseLayer, ModelMetadata, RiskModel};
use crate::ml::metrics::EvalReport;
use crate::ml::network::{RiskNet, RiskNetConfig};
use crate::ml::scaler::StandardScaler;
use crate::schema::{self, FEATURE_COUNT};

type TrainBackend = Autodiff<NdArray>;
type EvalBackend = NdArray;

/// Run the whole training job against the configured dataset URL.
pub async fn run_training(config: &AppConfig) -> Result<EvalReport> {
    let samples = fetch_dataset(&config.dataset.url).await?;
    train_on_samples(samples, config)
}

/// Everything after the fetch: deterministic given the samples and config.
pub fn train_on_samples(samples: Vec<LabeledSample>, config: &AppConfig) -> Result<EvalReport> {
    let cfg = &config.training;

    let (train, test) = split_train_test(samples, cfg.test_fraction, cfg.seed);
    if train.is_empty() || test.is_empty() {
        return Err(DiariskError::Training(format!(
            "split produced {} train / {} test samples; need both non-empty",
            train.len(),
            test.len()
        )));
    }

    let train_x: Vec<[f64; FEATURE_COUNT]> = train.iter().map(|s| s.features).collect();
    let train_y: Vec<u8> = train.iter().map(|s| s.outcome).collect();
    let test_x: Vec<[f64; FEATURE_COUNT]> = test.iter().map(|s| s.features).collect();
    let test_y: Vec<u8> = test.iter().map(|s| s.outcome).collect();

    // Statistics come from the training partition only.
    let scaler = StandardScaler::fit(&train_x)?;
    let train_scaled = scaler.transform(&train_x);
    let test_scaled = scaler.transform(&test_x);

    let device = NdArrayDevice::default();
    let model = fit_network(&train_scaled, &train_y, cfg, &device)?;

    // Autodiff overhead off for evaluation and export.
    let model = model.valid();

    let probabilities = predict_probabilities(&model, &test_scaled, &device)?;
    let report = EvalReport::from_predictions(&probabilities, &test_y, cfg.threshold);
    info!(
        "Held-out evaluation: accuracy {:.4} on {} samples",
        report.accuracy, report.total
    );
    println!("{report}");

    let metadata = ModelMetadata {
        trained_at: Utc::now(),
        dataset_url: config.dataset.url.clone(),
        seed: cfg.seed,
        epochs: cfg.epochs,
        test_accuracy: report.accuracy,
    };
    let artifact = export_artifact(&model, scaler, metadata)?;
    verify_export_parity(&model, &artifact, &test_x, &test_scaled, &device)?;

    artifact.save(&config.model.artifact_path)?;
    info!(
        "Model saved to {}",
        config.model.artifact_path.display()
    );

    Ok(report)
}

/// Fit the network: Adam, BCE-with-logits, fixed epochs and batch size.
fn fit_network(
    train_x: &[[f64; FEATURE_COUNT]],
    train_y: &[u8],
    cfg: &TrainingConfig,
    device: &NdArrayDevice,
) -> Result<RiskNet<TrainBackend>> {
    let mut model: RiskNet<TrainBackend> = RiskNetConfig::default().init(device);
    let mut optim = AdamConfig::new().init();
    let loss_fn: BinaryCrossEntropyLoss<TrainBackend> = BinaryCrossEntropyLossConfig::new()
        .with_logits(true)
        .init(device);

    // Batch order reshuffles every epoch; seeded so runs are reproducible.
    let mut rng = StdRng::seed_from_u64(cfg.seed.wrapping_add(1));
    let mut indices: Vec<usize> = (0..train_x.len()).collect();

    for epoch in 1..=cfg.epochs {
        indices.shuffle(&mut rng);

        let mut loss_sum = 0.0f64;
        let mut batches = 0usize;

        for chunk in indices.chunks(cfg.batch_size) {
            let rows: Vec<[f64; FEATURE_COUNT]> = chunk.iter().map(|&i| train_x[i]).collect();
            let labels: Vec<u8> = chunk.iter().map(|&i| train_y[i]).collect();

            let x = features_tensor::<TrainBackend>(&rows, device);
            let y = labels_tensor::<TrainBackend>(&labels, device);

            let logits = model.forward(x).flatten::<1>(0, 1);
            let loss = loss_fn.forward(logits, y);

            loss_sum += loss.clone().into_scalar().elem::<f64>();
            batches += 1;

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(cfg.learning_rate, model, grads);
        }

        debug!(
            "Epoch {:>3}/{}: avg loss {:.4}",
            epoch,
            cfg.epochs,
            loss_sum / batches.max(1) as f64
        );
    }

    Ok(model)
}

/// Score a batch of already-scaled rows on the eval backend.
fn predict_probabilities(
    model: &RiskNet<EvalBackend>,
    scaled_rows: &[[f64; FEATURE_COUNT]],
    device: &NdArrayDevice,
) -> Result<Vec<f64>> {
    if scaled_rows.is_empty() {
        return Ok(Vec::new());
    }

    let x = features_tensor::<EvalBackend>(scaled_rows, device);
    let values: Vec<f32> = model
        .forward_probabilities(x)
        .into_data()
        .to_vec()
        .map_err(|e| DiariskError::Internal(format!("tensor readback failed: {e:?}")))?;

    Ok(values.into_iter().map(f64::from).collect())
}

fn features_tensor<B: Backend>(
    rows: &[[f64; FEATURE_COUNT]],
    device: &B::Device,
) -> Tensor<B, 2> {
    let flat: Vec<f32> = rows
        .iter()
        .flat_map(|r| r.iter().map(|v| *v as f32))
        .collect();
    Tensor::from_data(TensorData::new(flat, [rows.len(), FEATURE_COUNT]), device)
}

fn labels_tensor<B: Backend>(labels: &[u8], device: &B::Device) -> Tensor<B, 1, Int> {
    let values: Vec<i64> = labels.iter().map(|l| i64::from(*l)).collect();
    Tensor::from_data(TensorData::new(values, [labels.len()]), device)
}

/// Extract the fitted weights into the serving artifact.
fn export_artifact(
    model: &RiskNet<EvalBackend>,
    scaler: StandardScaler,
    metadata: ModelMetadata,
) -> Result<RiskModel> {
    let layers = vec![
        export_layer(&model.fc1, Activation::Relu)?,
        export_layer(&model.fc2, Activation::Relu)?,
        export_layer(&model.head, Activation::Sigmoid)?,
    ];

    let artifact = RiskModel {
        feature_names: schema::wire_names(),
        scaler,
        layers,
        metadata,
    };
    artifact.validate().map_err(DiariskError::Model)?;
    Ok(artifact)
}

/// Read one Linear's parameters out as [out][in] rows.
fn export_layer(linear: &Linear<EvalBackend>, activation: Activation) -> Result<DenseLayer> {
    let weight = linear.weight.val();
    let [in_dim, out_dim] = weight.dims();

    // burn stores Linear weights as [d_input, d_output].
    let flat: Vec<f32> = weight
        .into_data()
        .to_vec()
        .map_err(|e| DiariskError::Internal(format!("weight readback failed: {e:?}")))?;

    let bias: Vec<f32> = linear
        .bias
        .as_ref()
        .ok_or_else(|| DiariskError::Training("linear layer has no bias".to_string()))?
        .val()
        .into_data()
        .to_vec()
        .map_err(|e| DiariskError::Internal(format!("bias readback failed: {e:?}")))?;

    let mut weights = vec![vec![0.0f64; in_dim]; out_dim];
    for i in 0..in_dim {
        for o in 0..out_dim {
            weights[o][i] = f64::from(flat[i * out_dim + o]);
        }
    }

    Ok(DenseLayer {
        weights,
        bias: bias.into_iter().map(f64::from).collect(),
        activation,
    })
}

/// Cross-check the exported artifact against the live network before saving.
///
/// The artifact scales raw inputs itself, so it is fed raw rows while the
/// network gets the pre-scaled ones. Disagreement means an export bug; abort
/// rather than persist a silently wrong model.
fn verify_export_parity(
    model: &RiskNet<EvalBackend>,
    artifact: &RiskModel,
    raw_rows: &[[f64; FEATURE_COUNT]],
    scaled_rows: &[[f64; FEATURE_COUNT]],
    device: &NdArrayDevice,
) -> Result<()> {
    const SPOT_CHECKS: usize = 8;
    const TOLERANCE: f64 = 1e-4;

    let n = raw_rows.len().min(SPOT_CHECKS);
    let network = predict_probabilities(model, &scaled_rows[..n], device)?;

    for (idx, (raw, expected)) in raw_rows[..n].iter().zip(&network).enumerate() {
        let got = artifact.predict(raw)?;
        if (got - expected).abs() > TOLERANCE {
            return Err(DiariskError::Training(format!(
                "exported artifact diverges from the trained network on sample {idx}: \
                 {got:.6} vs {expected:.6}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_scaler() -> StandardScaler {
        StandardScaler {
            mean: vec![0.0; FEATURE_COUNT],
            std: vec![1.0; FEATURE_COUNT],
        }
    }

    fn metadata() -> ModelMetadata {
        ModelMetadata {
            trained_at: Utc::now(),
            dataset_url: "memory://fixture".to_string(),
            seed: 42,
            epochs: 0,
            test_accuracy: 0.0,
        }
    }

    #[test]
    fn exported_artifact_matches_network_outputs() {
        let device = NdArrayDevice::default();
        let model: RiskNet<EvalBackend> = RiskNetConfig::default().init(&device);

        let artifact = export_artifact(&model, identity_scaler(), metadata()).unwrap();

        let rows: Vec<[f64; FEATURE_COUNT]> = vec![
            [0.0; FEATURE_COUNT],
            [1.0, -1.0, 0.5, -0.5, 2.0, -2.0, 0.1, -0.1],
            [3.0, 0.2, -1.5, 0.7, -0.3, 1.1, -2.2, 0.9],
        ];
        let expected = predict_probabilities(&model, &rows, &device).unwrap();

        for (row, want) in rows.iter().zip(&expected) {
            let got = artifact.predict(row).unwrap();
            assert!(
                (got - want).abs() < 1e-4,
                "artifact {got} vs network {want}"
            );
        }
    }

    #[test]
    fn parity_check_catches_corrupted_export() {
        let device = NdArrayDevice::default();
        let model: RiskNet<EvalBackend> = RiskNetConfig::default().init(&device);

        let mut artifact = export_artifact(&model, identity_scaler(), metadata()).unwrap();
        // Corrupt one hidden weight well past the tolerance.
        artifact.layers[0].weights[0][0] += 50.0;

        let rows = vec![[1.0; FEATURE_COUNT]; 4];
        let scaled = rows.clone();
        assert!(verify_export_parity(&model, &artifact, &rows, &scaled, &device).is_err());
    }

    #[test]
    fn fit_learns_a_separable_toy_problem() {
        let device = NdArrayDevice::default();

        // Outcome is fully determined by the sign of the first feature.
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            let jitter = (i % 5) as f64 * 0.05;
            let mut row = [0.0; FEATURE_COUNT];
            row[0] = sign * (1.0 + jitter);
            rows.push(row);
            labels.push(if sign > 0.0 { 1u8 } else { 0u8 });
        }

        let cfg = TrainingConfig {
            seed: 42,
            test_fraction: 0.2,
            epochs: 150,
            batch_size: 8,
            learning_rate: 1e-2,
            threshold: 0.5,
        };

        let model = fit_network(&rows, &labels, &cfg, &device).unwrap();
        let model = model.valid();

        let probabilities = predict_probabilities(&model, &rows, &device).unwrap();
        let report = EvalReport::from_predictions(&probabilities, &labels, cfg.threshold);
        assert!(
            report.accuracy > 0.9,
            "toy problem accuracy {}",
            report.accuracy
        );
    }
}
