use crate::error::{AppError, Result};
use crate::generator::Scenario;
use crate::models::LeakClass;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The five raw sensor columns, in canonical order
pub const SENSOR_FIELDS: [&str; 5] = [
    "pressure_psi",
    "flow_rate_lpm",
    "temperature_c",
    "vibration_gforce",
    "acoustic_db",
];

/// One instantaneous reading from the five sensors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub pressure_psi: f64,
    pub flow_rate_lpm: f64,
    pub temperature_c: f64,
    pub vibration_gforce: f64,
    pub acoustic_db: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A generator-produced reading with its label and provenance tag.
///
/// The scenario tag is diagnostic only and is never fed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample {
    #[serde(flatten)]
    pub reading: SensorReading,

    pub leak_status: LeakClass,

    pub scenario: Scenario,
}

/// A loose column-name to value mapping, the unit of work of the feature
/// pipeline.
///
/// Rows built from external JSON may carry extra columns; those pass through
/// feature engineering untouched and are dropped by the preprocessing
/// allow-list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorRow(BTreeMap<String, f64>);

impl SensorRow {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, column: impl Into<String>, value: f64) {
        self.0.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        self.0.get(column).copied()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build a row from an external JSON mapping.
    ///
    /// The five sensor keys must be present and numeric. Extra numeric keys
    /// are carried through; non-numeric extras such as `timestamp` or
    /// `sensor_id` are accepted and ignored.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            AppError::Inference("input row must be a JSON object".to_string())
        })?;

        let mut row = Self::new();
        for (key, raw) in object {
            match raw.as_f64() {
                Some(v) if v.is_finite() => row.insert(key.clone(), v),
                _ if SENSOR_FIELDS.contains(&key.as_str()) => {
                    return Err(AppError::Inference(format!(
                        "sensor value for '{key}' is missing or not numeric"
                    )));
                }
                // Non-sensor metadata (timestamp, sensor_id, ...) is ignored
                _ => {}
            }
        }

        for field in SENSOR_FIELDS {
            if !row.contains(field) {
                return Err(AppError::Inference(format!(
                    "missing sensor value for '{field}'"
                )));
            }
        }

        Ok(row)
    }
}

impl From<&SensorReading> for SensorRow {
    fn from(reading: &SensorReading) -> Self {
        let mut row = SensorRow::new();
        row.insert("pressure_psi", reading.pressure_psi);
        row.insert("flow_rate_lpm", reading.flow_rate_lpm);
        row.insert("temperature_c", reading.temperature_c);
        row.insert("vibration_gforce", reading.vibration_gforce);
        row.insert("acoustic_db", reading.acoustic_db);
        row
    }
}
