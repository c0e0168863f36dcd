//! In-sample quality scores.

use crate::dataset::Label;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
}

impl ClassificationMetrics {
    /// The degenerate triple returned when scores cannot be computed.
    pub const ZERO: Self = Self { accuracy: 0.0, precision: 0.0, recall: 0.0 };

    /// Named view used by transports that carry metrics as a string map.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("accuracy".to_string(), self.accuracy),
            ("precision".to_string(), self.precision),
            ("recall".to_string(), self.recall),
        ])
    }
}

/// Computes accuracy plus support-weighted precision and recall.
///
/// Never fails: empty or mismatched inputs are logged and scored as
/// [`ClassificationMetrics::ZERO`].
#[must_use]
pub fn evaluate(y_true: &[Label], y_pred: &[Label]) -> ClassificationMetrics {
    match try_evaluate(y_true, y_pred) {
        Ok(metrics) => {
            info!(
                accuracy = metrics.accuracy,
                precision = metrics.precision,
                recall = metrics.recall,
                "Metrics calculated"
            );
            metrics
        }
        Err(reason) => {
            error!(%reason, "Error calculating metrics");
            ClassificationMetrics::ZERO
        }
    }
}

#[derive(Default)]
struct ClassCounts {
    support: usize,
    predicted: usize,
    true_positive: usize,
}

fn try_evaluate(y_true: &[Label], y_pred: &[Label]) -> Result<ClassificationMetrics, String> {
    if y_true.is_empty() {
        return Err("cannot score an empty label sequence".to_string());
    }
    if y_true.len() != y_pred.len() {
        return Err(format!(
            "label sequences differ in length: {} true vs {} predicted",
            y_true.len(),
            y_pred.len()
        ));
    }

    let mut counts: BTreeMap<Label, ClassCounts> = BTreeMap::new();
    for (&truth, &pred) in y_true.iter().zip(y_pred) {
        counts.entry(truth).or_default().support += 1;
        counts.entry(pred).or_default().predicted += 1;
        if truth == pred {
            counts.entry(truth).or_default().true_positive += 1;
        }
    }

    let n = y_true.len() as f64;
    let mut correct = 0usize;
    let mut precision = 0.0;
    let mut recall = 0.0;
    // Classes with no support carry zero weight.
    for c in counts.values().filter(|c| c.support > 0) {
        let weight = c.support as f64 / n;
        let tp = c.true_positive as f64;
        if c.predicted > 0 {
            precision += weight * tp / c.predicted as f64;
        }
        recall += weight * tp / c.support as f64;
        correct += c.true_positive;
    }

    Ok(ClassificationMetrics { accuracy: correct as f64 / n, precision, recall })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
    }

    #[test]
    fn test_perfect_predictions() {
        let m = evaluate(&[0, 0, 1], &[0, 0, 1]);
        assert_eq!(m, ClassificationMetrics { accuracy: 1.0, precision: 1.0, recall: 1.0 });
    }

    #[test]
    fn test_weighted_scores() {
        // class 0: support 3, predicted 2 (tp 2); class 1: support 1, predicted 2 (tp 1)
        let m = evaluate(&[0, 0, 0, 1], &[0, 0, 1, 1]);
        assert_close(m.accuracy, 0.75);
        assert_close(m.precision, 0.75 * 1.0 + 0.25 * 0.5);
        assert_close(m.recall, 0.75 * (2.0 / 3.0) + 0.25 * 1.0);
    }

    #[test]
    fn test_class_never_predicted_contributes_zero_precision() {
        let m = evaluate(&[0, 1], &[0, 0]);
        assert_close(m.accuracy, 0.5);
        // class 0: precision 1/2 weighted 0.5; class 1 never predicted.
        assert_close(m.precision, 0.25);
        assert_close(m.recall, 0.5);
    }

    #[test]
    fn test_predicted_only_class_has_no_weight() {
        let m = evaluate(&[0, 0], &[0, 2]);
        assert_close(m.precision, 1.0);
        assert_close(m.recall, 0.5);
    }

    #[test]
    fn test_empty_input_falls_back_to_zero() {
        assert_eq!(evaluate(&[], &[]), ClassificationMetrics::ZERO);
    }

    #[test]
    fn test_mismatched_lengths_fall_back_to_zero() {
        assert_eq!(evaluate(&[0, 1, 1], &[0, 1]), ClassificationMetrics::ZERO);
    }

    #[test]
    fn test_to_map_has_exactly_three_keys() {
        let map = ClassificationMetrics { accuracy: 0.5, precision: 0.25, recall: 0.75 }.to_map();
        assert_eq!(map.len(), 3);
        assert_close(map["recall"], 0.75);
    }
}
