use crate::error::{AppError, Result};
use ndarray::Array2;
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_classifier::{
    DecisionTreeClassifier, DecisionTreeClassifierParameters, SplitCriterion,
};
use tracing::info;

type Tree = DecisionTreeClassifier<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// Ensemble hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of bagged trees
    pub n_trees: usize,

    /// Maximum tree depth
    pub max_depth: u16,

    /// Master seed; tree i derives its own seed from it, so training is
    /// bit-reproducible regardless of thread scheduling
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            seed: 42,
        }
    }
}

/// Bagged decision-tree ensemble over the standardized feature vector.
///
/// Class imbalance is compensated with inverse-frequency sample weights
/// driving each tree's bootstrap draw. Tree fitting is parallelized across
/// available cores; the call exposes no partial results.
#[derive(Debug, Serialize, Deserialize)]
pub struct LeakForestClassifier {
    config: ForestConfig,
    n_classes: usize,
    trees: Vec<Tree>,
    importances: Vec<f64>,
}

impl LeakForestClassifier {
    /// Train the ensemble. All-or-nothing: any tree failure aborts the fit.
    pub fn fit(
        x: &Array2<f64>,
        labels: &[usize],
        n_classes: usize,
        config: ForestConfig,
    ) -> Result<Self> {
        let (n_samples, n_features) = x.dim();

        if config.n_trees == 0 {
            return Err(AppError::Training(
                "ensemble needs at least one tree".to_string(),
            ));
        }
        if n_samples == 0 {
            return Err(AppError::Training(
                "cannot train on an empty feature matrix".to_string(),
            ));
        }
        if labels.len() != n_samples {
            return Err(AppError::Training(format!(
                "feature/label length mismatch: {n_samples} rows vs {} labels",
                labels.len()
            )));
        }
        if let Some(&bad) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(AppError::Training(format!(
                "label index {bad} out of range for {n_classes} classes"
            )));
        }

        let sample_weights = balanced_sample_weights(labels, n_classes);

        info!(
            n_samples,
            n_features,
            n_trees = config.n_trees,
            max_depth = config.max_depth,
            "fitting bagged tree ensemble"
        );

        let trees: Result<Vec<Tree>> = (0..config.n_trees)
            .into_par_iter()
            .map(|t| {
                let tree_seed = config.seed.wrapping_add(t as u64);
                let mut rng = StdRng::seed_from_u64(tree_seed);

                let bootstrap = WeightedIndex::new(&sample_weights)
                    .map_err(|e| AppError::Training(format!("invalid sample weights: {e}")))?;

                let mut data = Vec::with_capacity(n_samples * n_features);
                let mut y = Vec::with_capacity(n_samples);
                for _ in 0..n_samples {
                    let idx = bootstrap.sample(&mut rng);
                    data.extend(x.row(idx).iter().copied());
                    y.push(labels[idx] as i32);
                }

                let matrix = DenseMatrix::new(n_samples, n_features, data, false)
                    .map_err(|e| AppError::Training(format!("bootstrap matrix: {e}")))?;

                let mut params = DecisionTreeClassifierParameters::default()
                    .with_criterion(SplitCriterion::Gini)
                    .with_max_depth(config.max_depth);
                params.seed = Some(tree_seed);

                DecisionTreeClassifier::fit(&matrix, &y, params)
                    .map_err(|e| AppError::Training(format!("tree {t} fit failed: {e}")))
            })
            .collect();

        let mut classifier = Self {
            config,
            n_classes,
            trees: trees?,
            importances: vec![0.0; n_features],
        };
        classifier.importances = classifier.permutation_importances(x, labels)?;

        Ok(classifier)
    }

    /// Per-class probability vector per row: the fraction of tree votes.
    /// Each row sums to 1.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(AppError::Inference(
                "classifier has no fitted trees".to_string(),
            ));
        }

        let (n_samples, _) = x.dim();
        let matrix = to_dense(x)
            .map_err(|e| AppError::Inference(format!("invalid feature matrix: {e}")))?;

        let mut votes = Array2::zeros((n_samples, self.n_classes));
        for tree in &self.trees {
            let predictions = tree
                .predict(&matrix)
                .map_err(|e| AppError::Inference(format!("tree prediction failed: {e}")))?;
            for (i, &p) in predictions.iter().enumerate() {
                let class = p as usize;
                if class < self.n_classes {
                    votes[[i, class]] += 1.0;
                }
            }
        }

        votes /= self.trees.len() as f64;
        Ok(votes)
    }

    /// Predict class indices: argmax of the vote fractions, ties broken
    /// towards the lowest class index.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let proba = self.predict_proba(x)?;
        Ok((0..proba.nrows())
            .map(|i| argmax(proba.row(i).iter().copied()))
            .collect())
    }

    /// Per-feature permutation importance, normalized to sum to 1
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Seeded permutation importance over the training table: accuracy drop
    /// when one feature column is shuffled.
    fn permutation_importances(&self, x: &Array2<f64>, labels: &[usize]) -> Result<Vec<f64>> {
        let (n_samples, n_features) = x.dim();
        let baseline = accuracy(&self.predict(x)?, labels);

        let mut drops = Vec::with_capacity(n_features);
        for j in 0..n_features {
            let mut rng = StdRng::seed_from_u64(
                self.config
                    .seed
                    .wrapping_add(0x9E37_79B9_7F4A_7C15)
                    .wrapping_add(j as u64),
            );

            let mut column: Vec<f64> = (0..n_samples).map(|i| x[[i, j]]).collect();
            column.shuffle(&mut rng);

            let mut permuted = x.clone();
            for (i, value) in column.into_iter().enumerate() {
                permuted[[i, j]] = value;
            }

            let shuffled_accuracy = accuracy(&self.predict(&permuted)?, labels);
            drops.push((baseline - shuffled_accuracy).max(0.0));
        }

        let total: f64 = drops.iter().sum();
        if total > 0.0 {
            Ok(drops.into_iter().map(|d| d / total).collect())
        } else {
            Ok(vec![1.0 / n_features as f64; n_features])
        }
    }
}

/// Inverse-frequency ("balanced") per-sample weights
fn balanced_sample_weights(labels: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0usize; n_classes];
    for &label in labels {
        counts[label] += 1;
    }
    let present = counts.iter().filter(|&&c| c > 0).count().max(1);
    let n = labels.len() as f64;

    let class_weights: Vec<f64> = counts
        .iter()
        .map(|&c| if c > 0 { n / (present as f64 * c as f64) } else { 0.0 })
        .collect();

    labels.iter().map(|&l| class_weights[l]).collect()
}

fn to_dense(x: &Array2<f64>) -> std::result::Result<DenseMatrix<f64>, smartcore::error::Failed> {
    let (rows, cols) = x.dim();
    DenseMatrix::new(rows, cols, x.iter().copied().collect(), false)
}

fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, v) in values.enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}

fn accuracy(predicted: &[usize], expected: &[usize]) -> f64 {
    if expected.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(expected.iter())
        .filter(|(p, e)| p == e)
        .count();
    correct as f64 / expected.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    /// Two well-separated clusters on feature 0; feature 1 is noise
    fn toy_dataset() -> (Array2<f64>, Vec<usize>) {
        let mut data = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            data.extend([-2.0 - (i as f64) * 0.05, (i % 5) as f64 * 0.1]);
            labels.push(0);
        }
        for i in 0..20 {
            data.extend([2.0 + (i as f64) * 0.05, (i % 5) as f64 * 0.1]);
            labels.push(1);
        }
        let x = Array::from_shape_vec((40, 2), data).unwrap();
        (x, labels)
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_trees: 15,
            max_depth: 5,
            seed: 42,
        }
    }

    #[test]
    fn test_fit_and_predict_separable_data() {
        let (x, y) = toy_dataset();
        let clf = LeakForestClassifier::fit(&x, &y, 2, small_config()).unwrap();

        assert_eq!(clf.n_trees(), 15);
        assert_eq!(clf.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_proba_rows_sum_to_one() {
        let (x, y) = toy_dataset();
        let clf = LeakForestClassifier::fit(&x, &y, 2, small_config()).unwrap();

        let proba = clf.predict_proba(&x).unwrap();
        assert_eq!(proba.dim(), (40, 2));
        for i in 0..proba.nrows() {
            let total: f64 = proba.row(i).iter().sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_training_is_reproducible() {
        let (x, y) = toy_dataset();
        let a = LeakForestClassifier::fit(&x, &y, 2, small_config()).unwrap();
        let b = LeakForestClassifier::fit(&x, &y, 2, small_config()).unwrap();

        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_importances_normalized_and_ranked() {
        let (x, y) = toy_dataset();
        let clf = LeakForestClassifier::fit(&x, &y, 2, small_config()).unwrap();

        let importances = clf.feature_importances();
        let total: f64 = importances.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        // The separating feature dominates the noise feature
        assert!(importances[0] > importances[1]);
    }

    #[test]
    fn test_fit_rejects_bad_inputs() {
        let (x, y) = toy_dataset();

        let empty = Array2::<f64>::zeros((0, 2));
        assert!(LeakForestClassifier::fit(&empty, &[], 2, small_config()).is_err());

        assert!(LeakForestClassifier::fit(&x, &y[..10], 2, small_config()).is_err());

        let mut config = small_config();
        config.n_trees = 0;
        assert!(LeakForestClassifier::fit(&x, &y, 2, config).is_err());

        // Label out of range
        let mut bad = y.clone();
        bad[0] = 7;
        assert!(LeakForestClassifier::fit(&x, &bad, 2, small_config()).is_err());
    }

    #[test]
    fn test_balanced_weights_compensate_imbalance() {
        // 6 samples of class 0, 2 of class 1
        let labels = vec![0, 0, 0, 0, 0, 0, 1, 1];
        let weights = balanced_sample_weights(&labels, 2);

        // Total weight per class is equal under balancing
        let class0: f64 = weights[..6].iter().sum();
        let class1: f64 = weights[6..].iter().sum();
        assert!((class0 - class1).abs() < 1e-9);
        assert!(weights[6] > weights[0]);
    }

    #[test]
    fn test_argmax_tie_breaks_low_index() {
        assert_eq!(argmax([0.4, 0.4, 0.2].into_iter()), 0);
        assert_eq!(argmax([0.1, 0.5, 0.4].into_iter()), 1);
    }
}
