//! Dataset loading: fetch the remote CSV, parse it, split train/test.
//!
//! The source file is headerless; column order is fixed by `schema::FEATURES`
//! plus the trailing `Outcome` label.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::error::{DiariskError, Result};
use crate::schema::{FEATURES, FEATURE_COUNT, LABEL_COLUMN};

/// One labeled training row: eight features plus the binary outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSample {
    pub features: [f64; FEATURE_COUNT],
    pub outcome: u8,
}

/// Fetch the dataset CSV and parse it into labeled samples.
pub async fn fetch_dataset(url: &str) -> Result<Vec<LabeledSample>> {
    info!("Fetching dataset from {}", url);

    let body = reqwest::Client::new()
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let samples = parse_csv(&body)?;
    info!("Loaded {} samples", samples.len());
    Ok(samples)
}

/// Parse headerless CSV text: eight feature columns then the label.
pub fn parse_csv(text: &str) -> Result<Vec<LabeledSample>> {
    let mut samples = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != FEATURE_COUNT + 1 {
            return Err(DiariskError::Dataset(format!(
                "row {}: expected {} columns, got {}",
                line_no + 1,
                FEATURE_COUNT + 1,
                fields.len()
            )));
        }

        let mut features = [0.0; FEATURE_COUNT];
        for (idx, raw) in fields[..FEATURE_COUNT].iter().enumerate() {
            features[idx] = raw.trim().parse::<f64>().map_err(|_| {
                DiariskError::Dataset(format!(
                    "row {}: column {} ({}) is not numeric: {:?}",
                    line_no + 1,
                    idx + 1,
                    FEATURES[idx].column,
                    raw
                ))
            })?;
        }

        let label: f64 = fields[FEATURE_COUNT].trim().parse().map_err(|_| {
            DiariskError::Dataset(format!(
                "row {}: column {} ({}) is not numeric: {:?}",
                line_no + 1,
                FEATURE_COUNT + 1,
                LABEL_COLUMN,
                fields[FEATURE_COUNT]
            ))
        })?;

        samples.push(LabeledSample {
            features,
            outcome: if label != 0.0 { 1 } else { 0 },
        });
    }

    if samples.is_empty() {
        return Err(DiariskError::Dataset("dataset is empty".to_string()));
    }

    Ok(samples)
}

/// Shuffle with a fixed seed and split into (train, test).
///
/// The same seed over the same snapshot yields the same partitions. This is
/// determinism within this implementation; no claim is made that the
/// partitions match those produced by a different stack's PRNG.
pub fn split_train_test(
    mut samples: Vec<LabeledSample>,
    test_fraction: f64,
    seed: u64,
) -> (Vec<LabeledSample>, Vec<LabeledSample>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total = samples.len();
    let test_len = ((total as f64) * test_fraction).round() as usize;
    let split_at = total - test_len.min(total);

    let test = samples.split_off(split_at);

    debug!(
        "Dataset split: {} training, {} test (seed {})",
        samples.len(),
        test.len(),
        seed
    );

    (samples, test)
}
