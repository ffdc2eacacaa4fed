/// Machine Learning module for leak classification
///
/// This module provides the deterministic training/inference pipeline:
/// - Physics-informed feature engineering from raw sensor columns
/// - Fit-once preprocessing (median imputation + standardization)
/// - Bagged decision-tree classification with balanced class weights
/// - The frozen fitted pipeline bundle and its training driver
pub mod classifier;
pub mod features;
pub mod metrics;
pub mod pipeline;
pub mod preprocess;
pub mod trainer;

pub use classifier::{ForestConfig, LeakForestClassifier};
pub use features::{FeatureEngineer, DERIVED_FEATURES, FEATURE_NAMES, PRESSURE_EPSILON};
pub use metrics::{ClassMetrics, ModelMetrics};
pub use pipeline::{LeakDetectionPipeline, TrainingMetadata, PIPELINE_STAGES};
pub use preprocess::PreprocessStage;
pub use trainer::{run_training, TrainingReport};
