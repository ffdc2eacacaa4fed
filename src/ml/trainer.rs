use crate::artifact::ArtifactStore;
use crate::config::Config;
use crate::error::Result;
use crate::ml::classifier::ForestConfig;
use crate::ml::metrics::ModelMetrics;
use crate::ml::pipeline::LeakDetectionPipeline;
use crate::models::{LabeledSample, LeakClass, SensorRow};
use chrono::Utc;
use std::path::PathBuf;
use tracing::{info, warn};

/// Audit copy of the raw training table, written next to the artifact
pub const AUDIT_CSV_FILE: &str = "training_data.csv";

/// Outcome of one training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub dataset_size: usize,
    pub metrics: ModelMetrics,
    pub artifact_path: PathBuf,
}

/// End-to-end training run: generate the synthetic dataset, fit the frozen
/// pipeline, persist the artifact.
///
/// The audit CSV is best-effort; a write failure is logged and never fails
/// the run.
pub fn run_training(config: &Config, store: &ArtifactStore) -> Result<TrainingReport> {
    let training = &config.training;

    info!(
        target_samples = training.target_samples,
        seed = training.seed,
        "starting training run"
    );

    let mut assembler = crate::generator::DatasetAssembler::with_seed(
        Utc::now(),
        training.noise_level,
        training.seed,
    )
    .with_segment_minutes(training.segment_minutes);

    let dataset = assembler.generate_full_dataset(training.target_samples)?;

    if training.audit_csv {
        if let Err(e) = write_audit_csv(store, &dataset) {
            warn!(error = %e, "failed to write training audit csv");
        }
    }

    let (rows, labels): (Vec<SensorRow>, Vec<LeakClass>) = dataset
        .iter()
        .map(|sample| (SensorRow::from(&sample.reading), sample.leak_status))
        .unzip();

    let forest = ForestConfig {
        n_trees: training.n_trees,
        max_depth: training.max_depth,
        seed: training.seed,
    };
    let pipeline = LeakDetectionPipeline::fit(&rows, &labels, &forest)?;

    store.save(&pipeline)?;

    let metrics = pipeline.metadata().metrics.clone();
    info!(
        dataset_size = rows.len(),
        accuracy = metrics.accuracy,
        f1 = metrics.f1_score,
        artifact = %store.path().display(),
        "training run complete"
    );

    Ok(TrainingReport {
        dataset_size: rows.len(),
        metrics,
        artifact_path: store.path().to_path_buf(),
    })
}

fn write_audit_csv(store: &ArtifactStore, dataset: &[LabeledSample]) -> Result<PathBuf> {
    let dir = store.path().parent().unwrap_or_else(|| std::path::Path::new("."));
    std::fs::create_dir_all(dir)?;
    let path = dir.join(AUDIT_CSV_FILE);

    let mut out = String::from(
        "timestamp,pressure_psi,flow_rate_lpm,temperature_c,vibration_gforce,acoustic_db,leak_status,scenario\n",
    );
    for sample in dataset {
        let timestamp = sample
            .reading
            .timestamp
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            timestamp,
            sample.reading.pressure_psi,
            sample.reading.flow_rate_lpm,
            sample.reading.temperature_c,
            sample.reading.vibration_gforce,
            sample.reading.acoustic_db,
            sample.leak_status,
            sample.scenario,
        ));
    }

    std::fs::write(&path, out)?;
    info!(path = %path.display(), rows = dataset.len(), "training audit csv written");
    Ok(path)
}
