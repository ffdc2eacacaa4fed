use crate::error::{AppError, Result};
use crate::generator::{Scenario, ScenarioGenerator};
use crate::models::LabeledSample;
use chrono::{DateTime, Utc};
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

/// Segment length used for dataset assembly (minutes)
pub const DEFAULT_SEGMENT_MINUTES: u32 = 5;

/// Builds a full labeled training table by drawing scenarios from the fixed
/// mix distribution and concatenating fixed-length segments.
pub struct DatasetAssembler {
    generator: ScenarioGenerator,
    rng: StdRng,
    segment_minutes: u32,
    noise_level: f64,
}

impl DatasetAssembler {
    pub fn new(start_time: DateTime<Utc>, noise_level: f64) -> Self {
        Self {
            generator: ScenarioGenerator::new(start_time),
            rng: StdRng::from_entropy(),
            segment_minutes: DEFAULT_SEGMENT_MINUTES,
            noise_level,
        }
    }

    /// Seeded constructor: both the scenario draws and the segment contents
    /// are reproducible.
    pub fn with_seed(start_time: DateTime<Utc>, noise_level: f64, seed: u64) -> Self {
        Self {
            generator: ScenarioGenerator::with_seed(start_time, seed.wrapping_add(1)),
            rng: StdRng::seed_from_u64(seed),
            segment_minutes: DEFAULT_SEGMENT_MINUTES,
            noise_level,
        }
    }

    pub fn with_segment_minutes(mut self, segment_minutes: u32) -> Self {
        self.segment_minutes = segment_minutes;
        self
    }

    /// Generate a mixed dataset of at least `target_rows` labeled samples.
    ///
    /// The final table may overshoot the target by up to one segment length;
    /// no trimming is applied.
    pub fn generate_full_dataset(&mut self, target_rows: usize) -> Result<Vec<LabeledSample>> {
        let weights: Vec<f64> = Scenario::ALL.iter().map(|s| s.mix_weight()).collect();
        let mix = WeightedIndex::new(&weights)
            .map_err(|e| AppError::Generation(format!("invalid scenario mix: {e}")))?;

        info!(target_rows, "generating synthetic dataset");

        let mut samples = Vec::with_capacity(target_rows);
        while samples.len() < target_rows {
            let scenario = Scenario::ALL[mix.sample(&mut self.rng)];
            let segment = self.generator.generate_segment(
                self.segment_minutes,
                scenario,
                self.noise_level,
            )?;
            samples.extend(segment);
        }

        info!(rows = samples.len(), "synthetic dataset generated");
        Ok(samples)
    }
}
