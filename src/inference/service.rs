use crate::artifact::ArtifactStore;
use crate::error::{AppError, Result};
use crate::inference::decision::{decide, ClassificationResult};
use crate::ml::{LeakDetectionPipeline, TrainingMetadata, FEATURE_NAMES, PIPELINE_STAGES};
use crate::models::{LeakClass, SensorRow};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Whether the service currently holds a usable model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    NotLoaded,
    Active,
}

/// Introspection snapshot of the service and its loaded model
#[derive(Debug, Clone, Serialize)]
pub struct ServiceDescriptor {
    pub status: ArtifactStatus,
    pub artifact_path: String,
    pub stages: Vec<String>,
    pub feature_names: Vec<String>,
    pub classes: Vec<LeakClass>,

    /// Present only while a model is loaded
    pub metadata: Option<TrainingMetadata>,
}

/// Artifact-backed classification service.
///
/// The model is loaded lazily on first use and shared behind an `Arc`, so
/// concurrent classifications never block each other once loaded. A failed
/// load is not cached; the next call retries from storage.
pub struct InferenceService {
    store: ArtifactStore,
    pipeline: RwLock<Option<Arc<LeakDetectionPipeline>>>,
    load_guard: Mutex<()>,
}

impl InferenceService {
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            pipeline: RwLock::new(None),
            load_guard: Mutex::new(()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.pipeline.read().is_some()
    }

    /// Drop any loaded model and load fresh from storage, for picking up a
    /// newly trained artifact without restarting.
    pub fn reload(&self) -> Result<()> {
        let _guard = self.load_guard.lock();
        let pipeline = Arc::new(self.store.load()?);
        *self.pipeline.write() = Some(pipeline);
        info!("model artifact reloaded");
        Ok(())
    }

    /// Classify one row
    pub fn classify(&self, row: &SensorRow) -> Result<ClassificationResult> {
        let pipeline = self.pipeline()?;
        let (class, proba) = pipeline.predict_row(row)?;
        Ok(decide(class, &proba))
    }

    /// Classify one external JSON object
    pub fn classify_json(&self, value: &serde_json::Value) -> Result<ClassificationResult> {
        let row = SensorRow::from_json(value)?;
        self.classify(&row)
    }

    /// Classify a batch of external JSON objects.
    ///
    /// Returns one result per input, in input order; a malformed row fails
    /// on its own without touching its neighbors. The outer error only fires
    /// when no model can be loaded at all.
    pub fn classify_batch(
        &self,
        values: &[serde_json::Value],
    ) -> Result<Vec<Result<ClassificationResult>>> {
        let pipeline = self.pipeline()?;

        Ok(values
            .iter()
            .map(|value| {
                let row = SensorRow::from_json(value)?;
                let (class, proba) = pipeline.predict_row(&row)?;
                Ok(decide(class, &proba))
            })
            .collect())
    }

    /// Snapshot of service state, without triggering a load
    pub fn descriptor(&self) -> ServiceDescriptor {
        let loaded = self.pipeline.read().clone();
        ServiceDescriptor {
            status: if loaded.is_some() {
                ArtifactStatus::Active
            } else {
                ArtifactStatus::NotLoaded
            },
            artifact_path: self.store.path().display().to_string(),
            stages: PIPELINE_STAGES.iter().map(|s| s.to_string()).collect(),
            feature_names: FEATURE_NAMES.iter().map(|f| f.to_string()).collect(),
            classes: LeakClass::ALL.to_vec(),
            metadata: loaded.map(|p| p.metadata().clone()),
        }
    }

    /// Get the loaded pipeline, loading it on first use.
    ///
    /// Double-checked under the load guard so concurrent first calls load
    /// the artifact once.
    fn pipeline(&self) -> Result<Arc<LeakDetectionPipeline>> {
        if let Some(pipeline) = self.pipeline.read().as_ref() {
            return Ok(Arc::clone(pipeline));
        }

        let _guard = self.load_guard.lock();
        if let Some(pipeline) = self.pipeline.read().as_ref() {
            return Ok(Arc::clone(pipeline));
        }

        match self.store.load() {
            Ok(pipeline) => {
                let pipeline = Arc::new(pipeline);
                *self.pipeline.write() = Some(Arc::clone(&pipeline));
                Ok(pipeline)
            }
            Err(e) => {
                warn!(error = %e, "model load failed; inference unavailable");
                Err(AppError::ModelUnavailable(format!(
                    "no usable model artifact: {e}"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::DatasetAssembler;
    use crate::ml::ForestConfig;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn trained_store(dir: &std::path::Path, seed: u64) -> ArtifactStore {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut assembler =
            DatasetAssembler::with_seed(start, 0.02, seed).with_segment_minutes(1);
        let dataset = assembler.generate_full_dataset(900).unwrap();
        let (rows, labels): (Vec<SensorRow>, Vec<_>) = dataset
            .iter()
            .map(|s| (SensorRow::from(&s.reading), s.leak_status))
            .unzip();

        let config = ForestConfig {
            n_trees: 10,
            max_depth: 8,
            seed,
        };
        let pipeline = LeakDetectionPipeline::fit(&rows, &labels, &config).unwrap();

        let store = ArtifactStore::new(dir);
        store.save(&pipeline).unwrap();
        store
    }

    fn major_leak_json() -> serde_json::Value {
        json!({
            "pressure_psi": 65.0,
            "flow_rate_lpm": 95.0,
            "temperature_c": 24.0,
            "vibration_gforce": 1.8,
            "acoustic_db": 82.0
        })
    }

    fn normal_json() -> serde_json::Value {
        json!({
            "pressure_psi": 120.0,
            "flow_rate_lpm": 54.0,
            "temperature_c": 25.0,
            "vibration_gforce": 0.12,
            "acoustic_db": 41.0
        })
    }

    #[test]
    fn test_missing_artifact_fails_without_loading() {
        let dir = tempfile::tempdir().unwrap();
        let service = InferenceService::new(ArtifactStore::new(dir.path()));

        let err = service.classify_json(&normal_json()).unwrap_err();
        assert_eq!(err.error_code(), "MODEL_UNAVAILABLE");
        assert!(!service.is_loaded());
        assert_eq!(service.descriptor().status, ArtifactStatus::NotLoaded);
    }

    #[test]
    fn test_lazy_load_then_classify() {
        let dir = tempfile::tempdir().unwrap();
        let store = trained_store(dir.path(), 23);
        let service = InferenceService::new(store);
        assert!(!service.is_loaded());

        let result = service.classify_json(&major_leak_json()).unwrap();
        assert_eq!(result.leak_class, LeakClass::Catastrophic);
        assert!(result.anomaly_score > 0.0);
        assert!(service.is_loaded());

        let healthy = service.classify_json(&normal_json()).unwrap();
        assert_eq!(healthy.leak_class, LeakClass::None);
        assert_eq!(healthy.anomaly_score, 0.0);
    }

    #[test]
    fn test_descriptor_after_load() {
        let dir = tempfile::tempdir().unwrap();
        let service = InferenceService::new(trained_store(dir.path(), 29));
        service.reload().unwrap();

        let descriptor = service.descriptor();
        assert_eq!(descriptor.status, ArtifactStatus::Active);
        assert_eq!(descriptor.stages, vec!["engineer", "preprocess", "classifier"]);
        assert_eq!(descriptor.feature_names.len(), 8);
        assert_eq!(descriptor.classes, LeakClass::ALL.to_vec());
        assert!(descriptor.metadata.unwrap().dataset_size >= 900);
    }

    #[test]
    fn test_batch_preserves_order_and_isolates_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let service = InferenceService::new(trained_store(dir.path(), 31));

        let inputs = vec![
            normal_json(),
            json!({ "pressure_psi": "broken" }),
            major_leak_json(),
        ];
        let results = service.classify_batch(&inputs).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_ref().unwrap().leak_class, LeakClass::None);
        assert_eq!(
            results[1].as_ref().unwrap_err().error_code(),
            "INFERENCE_ERROR"
        );
        assert_eq!(
            results[2].as_ref().unwrap().leak_class,
            LeakClass::Catastrophic
        );
    }

    #[test]
    fn test_reload_picks_up_new_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = trained_store(dir.path(), 37);
        let service = InferenceService::new(store.clone());
        service.reload().unwrap();
        let before = service.descriptor().metadata.unwrap().trained_at;

        // Retrain into the same location
        trained_store(dir.path(), 41);
        service.reload().unwrap();
        let after = service.descriptor().metadata.unwrap().trained_at;

        assert!(after >= before);
        assert!(service.is_loaded());
    }

    #[test]
    fn test_concurrent_first_use_loads_once_and_serves_all() {
        let dir = tempfile::tempdir().unwrap();
        let service =
            std::sync::Arc::new(InferenceService::new(trained_store(dir.path(), 43)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = std::sync::Arc::clone(&service);
                std::thread::spawn(move || {
                    service.classify_json(&major_leak_json()).unwrap().leak_class
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), LeakClass::Catastrophic);
        }
    }
}
