use crate::error::{AppError, Result};
use crate::ml::classifier::{ForestConfig, LeakForestClassifier};
use crate::ml::features::{FeatureEngineer, FEATURE_NAMES};
use crate::ml::metrics::ModelMetrics;
use crate::ml::preprocess::PreprocessStage;
use crate::models::LeakClass;
use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Stage names, in execution order
pub const PIPELINE_STAGES: [&str; 3] = ["engineer", "preprocess", "classifier"];

/// Provenance carried inside every persisted artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    pub trained_at: DateTime<Utc>,
    pub dataset_size: usize,
    pub n_features: usize,
    pub metrics: ModelMetrics,

    /// Permutation importance per feature name, summing to 1
    pub feature_importances: BTreeMap<String, f64>,

    /// Hyperparameters of the run, stringified for display
    pub hyperparameters: BTreeMap<String, String>,
}

/// The frozen fitted pipeline: feature engineering, preprocessing and the
/// tree ensemble fitted together on one dataset and never mutated again.
///
/// `fit` is the only constructor. A new model means a full retraining run
/// producing a new instance; concurrent readers of a fitted pipeline need no
/// synchronization.
#[derive(Debug, Serialize, Deserialize)]
pub struct LeakDetectionPipeline {
    engineer: FeatureEngineer,
    preprocess: PreprocessStage,
    classifier: LeakForestClassifier,
    metadata: TrainingMetadata,
}

impl LeakDetectionPipeline {
    /// Fit all stages in order on a labeled table.
    ///
    /// Training metrics are computed on the training set itself: the point
    /// is artifact provenance, not a generalization estimate.
    pub fn fit(
        rows: &[crate::models::SensorRow],
        labels: &[LeakClass],
        config: &ForestConfig,
    ) -> Result<Self> {
        if rows.is_empty() {
            return Err(AppError::Training(
                "cannot fit pipeline on an empty dataset".to_string(),
            ));
        }
        if rows.len() != labels.len() {
            return Err(AppError::Training(format!(
                "row/label length mismatch: {} rows vs {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let engineer = FeatureEngineer::new();
        let engineered = engineer.transform(rows);

        let preprocess = PreprocessStage::fit(&engineered)?;
        let x = preprocess.transform(&engineered);

        let y: Vec<usize> = labels.iter().map(|l| l.index()).collect();
        let classifier = LeakForestClassifier::fit(&x, &y, LeakClass::ALL.len(), *config)?;

        let predicted = classifier.predict(&x)?;
        let metrics = ModelMetrics::compute(&y, &predicted);

        let feature_importances: BTreeMap<String, f64> = FEATURE_NAMES
            .iter()
            .zip(classifier.feature_importances().iter())
            .map(|(name, importance)| (name.to_string(), *importance))
            .collect();

        let mut hyperparameters = BTreeMap::new();
        hyperparameters.insert("n_trees".to_string(), config.n_trees.to_string());
        hyperparameters.insert("max_depth".to_string(), config.max_depth.to_string());
        hyperparameters.insert("seed".to_string(), config.seed.to_string());
        hyperparameters.insert("criterion".to_string(), "gini".to_string());
        hyperparameters.insert("class_weight".to_string(), "balanced".to_string());

        let metadata = TrainingMetadata {
            trained_at: Utc::now(),
            dataset_size: rows.len(),
            n_features: FEATURE_NAMES.len(),
            metrics,
            feature_importances,
            hyperparameters,
        };

        info!(
            dataset_size = metadata.dataset_size,
            accuracy = metadata.metrics.accuracy,
            f1 = metadata.metrics.f1_score,
            "pipeline fit complete"
        );

        Ok(Self {
            engineer,
            preprocess,
            classifier,
            metadata,
        })
    }

    /// Classify one row, returning the class and the per-class probability
    /// vector in [`LeakClass::ALL`] order.
    pub fn predict_row(
        &self,
        row: &crate::models::SensorRow,
    ) -> Result<(LeakClass, Vec<f64>)> {
        let proba = self.predict_proba(std::slice::from_ref(row))?;
        let votes: Vec<f64> = proba.row(0).iter().copied().collect();

        let mut best = 0;
        for (i, &v) in votes.iter().enumerate() {
            if v > votes[best] {
                best = i;
            }
        }
        let class = LeakClass::from_index(best).ok_or_else(|| {
            AppError::Inference(format!("predicted class index {best} out of range"))
        })?;

        Ok((class, votes))
    }

    /// Classify a batch of rows
    pub fn predict(&self, rows: &[crate::models::SensorRow]) -> Result<Vec<LeakClass>> {
        let x = self.feature_matrix(rows);
        self.classifier
            .predict(&x)?
            .into_iter()
            .map(|idx| {
                LeakClass::from_index(idx).ok_or_else(|| {
                    AppError::Inference(format!("predicted class index {idx} out of range"))
                })
            })
            .collect()
    }

    /// Per-class probabilities for a batch, rows in input order
    pub fn predict_proba(&self, rows: &[crate::models::SensorRow]) -> Result<Array2<f64>> {
        let x = self.feature_matrix(rows);
        self.classifier.predict_proba(&x)
    }

    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }

    pub fn feature_importances(&self) -> &BTreeMap<String, f64> {
        &self.metadata.feature_importances
    }

    pub fn feature_names(&self) -> &'static [&'static str] {
        &FEATURE_NAMES
    }

    fn feature_matrix(&self, rows: &[crate::models::SensorRow]) -> Array2<f64> {
        let engineered = self.engineer.transform(rows);
        self.preprocess.transform(&engineered)
    }
}
