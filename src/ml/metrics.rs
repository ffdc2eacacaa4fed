use crate::models::LeakClass;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Model evaluation metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Accuracy
    pub accuracy: f64,

    /// Macro-averaged precision
    pub precision: f64,

    /// Macro-averaged recall
    pub recall: f64,

    /// Macro-averaged F1 score
    pub f1_score: f64,

    /// Confusion matrix, rows = true class, columns = predicted class
    pub confusion_matrix: Array2<usize>,

    /// Per-class metrics keyed by class name
    pub per_class_metrics: BTreeMap<String, ClassMetrics>,
}

/// Per-class evaluation metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

impl ModelMetrics {
    /// Compute metrics from true/predicted class indices.
    ///
    /// Indices must be valid positions into [`LeakClass::ALL`].
    pub fn compute(y_true: &[usize], y_pred: &[usize]) -> Self {
        let n_classes = LeakClass::ALL.len();
        let n_samples = y_true.len().min(y_pred.len());

        let mut confusion = Array2::zeros((n_classes, n_classes));
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            if t < n_classes && p < n_classes {
                confusion[[t, p]] += 1;
            }
        }

        let correct: usize = (0..n_classes).map(|c| confusion[[c, c]]).sum();
        let accuracy = if n_samples > 0 {
            correct as f64 / n_samples as f64
        } else {
            0.0
        };

        let mut per_class = BTreeMap::new();
        for (idx, class) in LeakClass::ALL.iter().enumerate() {
            let tp = confusion[[idx, idx]];
            let fp: usize = (0..n_classes)
                .filter(|&t| t != idx)
                .map(|t| confusion[[t, idx]])
                .sum();
            let fn_count: usize = (0..n_classes)
                .filter(|&p| p != idx)
                .map(|p| confusion[[idx, p]])
                .sum();
            let support: usize = (0..n_classes).map(|p| confusion[[idx, p]]).sum();

            let precision = if tp + fp > 0 {
                tp as f64 / (tp + fp) as f64
            } else {
                0.0
            };
            let recall = if tp + fn_count > 0 {
                tp as f64 / (tp + fn_count) as f64
            } else {
                0.0
            };
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };

            per_class.insert(
                class.to_string(),
                ClassMetrics {
                    precision,
                    recall,
                    f1_score: f1,
                    support,
                },
            );
        }

        let k = n_classes as f64;
        let precision = per_class.values().map(|m| m.precision).sum::<f64>() / k;
        let recall = per_class.values().map(|m| m.recall).sum::<f64>() / k;
        let f1_score = per_class.values().map(|m| m.f1_score).sum::<f64>() / k;

        Self {
            accuracy,
            precision,
            recall,
            f1_score,
            confusion_matrix: confusion,
            per_class_metrics: per_class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let y = vec![0, 1, 2, 3, 0, 1];
        let metrics = ModelMetrics::compute(&y, &y);

        assert_eq!(metrics.accuracy, 1.0);
        assert_eq!(metrics.precision, 1.0);
        assert_eq!(metrics.recall, 1.0);
        assert_eq!(metrics.f1_score, 1.0);
        assert_eq!(metrics.confusion_matrix[[0, 0]], 2);
        assert_eq!(metrics.confusion_matrix[[3, 3]], 1);
    }

    #[test]
    fn test_known_confusion() {
        // Two none samples, one misclassified as micro
        let y_true = vec![0, 0, 1, 1];
        let y_pred = vec![0, 1, 1, 1];
        let metrics = ModelMetrics::compute(&y_true, &y_pred);

        assert_eq!(metrics.accuracy, 0.75);
        assert_eq!(metrics.confusion_matrix[[0, 1]], 1);

        let none = &metrics.per_class_metrics["none"];
        assert_eq!(none.support, 2);
        assert_eq!(none.precision, 1.0);
        assert_eq!(none.recall, 0.5);

        let micro = &metrics.per_class_metrics["micro"];
        assert!((micro.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(micro.recall, 1.0);
    }

    #[test]
    fn test_empty_input() {
        let metrics = ModelMetrics::compute(&[], &[]);
        assert_eq!(metrics.accuracy, 0.0);
        assert_eq!(metrics.per_class_metrics.len(), 4);
    }
}
