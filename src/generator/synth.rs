use crate::error::{AppError, Result};
use crate::generator::Scenario;
use crate::models::{LabeledSample, SensorReading};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::debug;

/// Produces labeled, time-ordered segments of sensor readings at 1 Hz.
///
/// The time cursor is ordinary per-instance state: successive calls generate
/// contiguous, non-overlapping segments on one timeline. Concurrent dataset
/// builds use independent generator values.
pub struct ScenarioGenerator {
    cursor: DateTime<Utc>,
    rng: StdRng,
}

impl ScenarioGenerator {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            cursor: start_time,
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded constructor for reproducible datasets
    pub fn with_seed(start_time: DateTime<Utc>, seed: u64) -> Self {
        Self {
            cursor: start_time,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Next timestamp the generator will emit
    pub fn cursor(&self) -> DateTime<Utc> {
        self.cursor
    }

    /// Generate one labeled segment for the given scenario.
    ///
    /// Parameter validation happens before any state is touched, so a failed
    /// call never corrupts the time cursor.
    pub fn generate_segment(
        &mut self,
        duration_minutes: u32,
        scenario: Scenario,
        noise_level: f64,
    ) -> Result<Vec<LabeledSample>> {
        if duration_minutes == 0 {
            return Err(AppError::Generation(
                "segment duration must be at least one minute".to_string(),
            ));
        }
        if !noise_level.is_finite() || noise_level < 0.0 {
            return Err(AppError::Generation(format!(
                "noise level must be a finite non-negative number, got {noise_level}"
            )));
        }

        let n_points = duration_minutes as usize * 60;
        let base_pressure = scenario.sample_base_pressure(&mut self.rng);

        let pressure_noise = normal(0.0, base_pressure * noise_level)?;
        let flow_noise = normal(0.0, 2.0)?;
        let vibration_noise = normal(0.0, 0.05)?;
        let acoustic_noise = normal(0.0, 5.0)?;
        let temperature_noise = normal(0.0, 0.5)?;

        debug!(
            scenario = %scenario,
            base_pressure,
            n_points,
            "generating segment"
        );

        let span = (n_points.saturating_sub(1)).max(1) as f64;
        let mut samples = Vec::with_capacity(n_points);

        for i in 0..n_points {
            let progress = i as f64 / span;

            let trend = match scenario.trend_end() {
                // Stable regime: independent per-sample jitter
                None => self.rng.gen_range(-0.1..0.1),
                Some(end) => end * progress,
            };

            let raw_pressure =
                base_pressure + trend + pressure_noise.sample(&mut self.rng);
            let pressure = scenario.clamp_pressure(raw_pressure);

            // Flow meter sits at the source: loss of containment downstream
            // shows up as higher flow while pressure drops.
            let base_flow = if scenario.is_leak() {
                50.0 + (150.0 - pressure) * 0.5
            } else {
                50.0 + (pressure - 100.0) * 0.2
            };
            let flow = base_flow + flow_noise.sample(&mut self.rng);

            // Leak turbulence drives vibration up as pressure falls
            let base_vibration = if scenario.is_leak() {
                0.5 + (100.0 - pressure) * 0.02
            } else {
                0.1
            };
            let vibration =
                (base_vibration + vibration_noise.sample(&mut self.rng)).abs();

            // High-frequency hiss
            let base_acoustic = if scenario.is_leak() {
                60.0 + (100.0 - pressure) * 0.5
            } else {
                40.0
            };
            let acoustic = base_acoustic + acoustic_noise.sample(&mut self.rng);

            // Temperature is a confounder: a slow seasonal term independent
            // of leak state.
            let temperature = 25.0
                + 5.0 * (3.0 * progress).sin()
                + temperature_noise.sample(&mut self.rng);

            samples.push(LabeledSample {
                reading: SensorReading {
                    pressure_psi: pressure,
                    flow_rate_lpm: flow,
                    temperature_c: temperature,
                    vibration_gforce: vibration,
                    acoustic_db: acoustic,
                    timestamp: Some(self.cursor + Duration::seconds(i as i64)),
                },
                leak_status: scenario.leak_class(),
                scenario,
            });
        }

        // Advance past the segment so the next one continues the timeline
        self.cursor += Duration::seconds(n_points as i64);

        Ok(samples)
    }
}

fn normal(mean: f64, std_dev: f64) -> Result<Normal<f64>> {
    Normal::new(mean, std_dev)
        .map_err(|e| AppError::Generation(format!("invalid noise distribution: {e}")))
}
