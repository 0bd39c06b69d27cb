//! Per-feature standardization (zero mean, unit variance).
//!
//! Fitted on the training partition only and persisted inside the model
//! artifact so inference applies the exact same transform.

use serde::{Deserialize, Serialize};

use crate::error::{DiariskError, Result};
use crate::schema::FEATURE_COUNT;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl StandardScaler {
    /// Fit mean and standard deviation per feature.
    pub fn fit(rows: &[[f64; FEATURE_COUNT]]) -> Result<Self> {
        if rows.is_empty() {
            return Err(DiariskError::Dataset(
                "cannot fit scaler on an empty partition".to_string(),
            ));
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0; FEATURE_COUNT];
        for row in rows {
            for (i, v) in row.iter().enumerate() {
                mean[i] += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut var = vec![0.0; FEATURE_COUNT];
        for row in rows {
            for (i, v) in row.iter().enumerate() {
                let d = v - mean[i];
                var[i] += d * d;
            }
        }
        let std = var.into_iter().map(|v| (v / n).sqrt()).collect();

        Ok(Self { mean, std })
    }

    /// Standardize a single feature vector.
    pub fn transform_one(&self, row: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            // Constant features would divide by zero; clamp the denominator.
            let denom = self.std[i].max(1e-12);
            out[i] = (row[i] - self.mean[i]) / denom;
        }
        out
    }

    /// Standardize a batch of feature vectors.
    pub fn transform(&self, rows: &[[f64; FEATURE_COUNT]]) -> Vec<[f64; FEATURE_COUNT]> {
        rows.iter().map(|r| self.transform_one(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fitted_transform_has_zero_mean_unit_variance() {
        let rows: Vec<[f64; FEATURE_COUNT]> = (0..10)
            .map(|i| {
                let v = i as f64;
                [v, 2.0 * v, v + 1.0, 3.0, v * v, 0.5 * v, v - 4.0, 10.0 * v]
            })
            .collect();

        let scaler = StandardScaler::fit(&rows).unwrap();
        let scaled = scaler.transform(&rows);

        for i in [0usize, 1, 4, 7] {
            let mean: f64 = scaled.iter().map(|r| r[i]).sum::<f64>() / rows.len() as f64;
            let var: f64 =
                scaled.iter().map(|r| (r[i] - mean).powi(2)).sum::<f64>() / rows.len() as f64;
            assert!(mean.abs() < 1e-9, "feature {i} mean {mean}");
            assert!((var - 1.0).abs() < 1e-9, "feature {i} var {var}");
        }
    }

    #[test]
    fn constant_feature_does_not_blow_up() {
        let rows = vec![[3.0; FEATURE_COUNT]; 5];
        let scaler = StandardScaler::fit(&rows).unwrap();
        let scaled = scaler.transform_one(&[3.0; FEATURE_COUNT]);
        assert!(scaled.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn empty_partition_is_an_error() {
        assert!(StandardScaler::fit(&[]).is_err());
    }
}
