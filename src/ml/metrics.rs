//! Evaluation metrics for the held-out partition.

use std::fmt;

/// Precision/recall/F1 for one class.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassReport {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Binary classification report at a fixed decision threshold.
#[derive(Debug, Clone)]
pub struct EvalReport {
    pub accuracy: f64,
    pub threshold: f64,
    pub negative: ClassReport,
    pub positive: ClassReport,
    pub total: usize,
}

impl EvalReport {
    /// Build the report from predicted probabilities and true labels.
    pub fn from_predictions(probabilities: &[f64], labels: &[u8], threshold: f64) -> Self {
        assert_eq!(
            probabilities.len(),
            labels.len(),
            "probabilities and labels must align"
        );

        let mut tp = 0usize;
        let mut tn = 0usize;
        let mut fp = 0usize;
        let mut fn_ = 0usize;

        for (p, &label) in probabilities.iter().zip(labels) {
            let predicted = *p > threshold;
            match (predicted, label != 0) {
                (true, true) => tp += 1,
                (false, false) => tn += 1,
                (true, false) => fp += 1,
                (false, true) => fn_ += 1,
            }
        }

        let total = probabilities.len();
        let accuracy = if total > 0 {
            (tp + tn) as f64 / total as f64
        } else {
            0.0
        };

        Self {
            accuracy,
            threshold,
            negative: class_report(tn, fn_, fp, tn + fp),
            positive: class_report(tp, fp, fn_, tp + fn_),
            total,
        }
    }
}

fn class_report(true_hits: usize, false_hits: usize, misses: usize, support: usize) -> ClassReport {
    let precision = ratio(true_hits, true_hits + false_hits);
    let recall = ratio(true_hits, true_hits + misses);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ClassReport {
        precision,
        recall,
        f1,
        support,
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

impl fmt::Display for EvalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy: {:.4} ({} samples)", self.accuracy, self.total)?;
        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for (name, c) in [("0", &self.negative), ("1", &self.positive)] {
            writeln!(
                f,
                "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, c.precision, c.recall, c.f1, c.support
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let probs = [0.9, 0.1, 0.8, 0.2];
        let labels = [1, 0, 1, 0];

        let report = EvalReport::from_predictions(&probs, &labels, 0.5);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.positive.precision, 1.0);
        assert_eq!(report.positive.recall, 1.0);
        assert_eq!(report.negative.f1, 1.0);
        assert_eq!(report.positive.support, 2);
    }

    #[test]
    fn mixed_predictions() {
        // predictions at 0.5: [1, 1, 0, 0]; labels: [1, 0, 1, 0]
        let probs = [0.9, 0.7, 0.3, 0.1];
        let labels = [1, 0, 1, 0];

        let report = EvalReport::from_predictions(&probs, &labels, 0.5);
        assert_eq!(report.accuracy, 0.5);
        assert_eq!(report.positive.precision, 0.5);
        assert_eq!(report.positive.recall, 0.5);
        assert_eq!(report.negative.support, 2);
    }

    #[test]
    fn all_negative_predictions_have_zero_positive_recall() {
        let probs = [0.1, 0.2];
        let labels = [1, 1];

        let report = EvalReport::from_predictions(&probs, &labels, 0.5);
        assert_eq!(report.accuracy, 0.0);
        assert_eq!(report.positive.recall, 0.0);
        assert_eq!(report.positive.f1, 0.0);
    }

    #[test]
    fn report_renders_both_classes() {
        let report = EvalReport::from_predictions(&[0.9, 0.1], &[1, 0], 0.5);
        let text = report.to_string();
        assert!(text.contains("Accuracy"));
        assert!(text.contains("precision"));
    }
}
