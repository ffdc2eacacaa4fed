use crate::models::SensorRow;
use serde::{Deserialize, Serialize};

/// Derived physics-informed columns, in canonical order
pub const DERIVED_FEATURES: [&str; 3] = [
    "flow_pressure_ratio",
    "vibration_rms",
    "pressure_temp_interaction",
];

/// The full fixed feature list: five raw sensors plus three derived columns
pub const FEATURE_NAMES: [&str; 8] = [
    "pressure_psi",
    "flow_rate_lpm",
    "temperature_c",
    "vibration_gforce",
    "acoustic_db",
    "flow_pressure_ratio",
    "vibration_rms",
    "pressure_temp_interaction",
];

/// Division guard for the flow/pressure ratio at pressure -> 0
pub const PRESSURE_EPSILON: f64 = 1e-6;

/// Sinusoidal peak-to-RMS approximation
const PEAK_TO_RMS: f64 = 0.707;

/// Deterministic feature engineering shared identically by training and
/// inference.
///
/// Derived columns are pure functions of the raw columns of the same row:
/// no cross-row state, no label leakage. `fit` would be a no-op, so there is
/// none; the type is carried in the artifact for pipeline completeness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureEngineer;

impl FeatureEngineer {
    pub fn new() -> Self {
        Self
    }

    /// Append derived columns to one row.
    ///
    /// A derived value is only computed when its raw inputs are present;
    /// extra input columns pass through untouched.
    pub fn transform_row(&self, row: &SensorRow) -> SensorRow {
        let mut out = row.clone();

        if let (Some(flow), Some(pressure)) =
            (row.get("flow_rate_lpm"), row.get("pressure_psi"))
        {
            out.insert("flow_pressure_ratio", flow / (pressure + PRESSURE_EPSILON));
        }

        if let Some(vibration) = row.get("vibration_gforce") {
            out.insert("vibration_rms", vibration * PEAK_TO_RMS);
        }

        // Ideal-gas-inspired temperature compensation, referenced to 20 C
        if let (Some(pressure), Some(temperature)) =
            (row.get("pressure_psi"), row.get("temperature_c"))
        {
            out.insert(
                "pressure_temp_interaction",
                pressure * (temperature + 273.15) / 293.15,
            );
        }

        out
    }

    /// Batch mode: the same pure function mapped over every row
    pub fn transform(&self, rows: &[SensorRow]) -> Vec<SensorRow> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_row() -> SensorRow {
        let mut row = SensorRow::new();
        row.insert("pressure_psi", 120.0);
        row.insert("flow_rate_lpm", 54.0);
        row.insert("temperature_c", 25.0);
        row.insert("vibration_gforce", 0.12);
        row.insert("acoustic_db", 41.0);
        row
    }

    #[test]
    fn test_derived_values() {
        let engineer = FeatureEngineer::new();
        let out = engineer.transform_row(&raw_row());

        let ratio = out.get("flow_pressure_ratio").unwrap();
        assert!((ratio - 54.0 / (120.0 + PRESSURE_EPSILON)).abs() < 1e-12);

        let rms = out.get("vibration_rms").unwrap();
        assert!((rms - 0.12 * 0.707).abs() < 1e-12);

        let interaction = out.get("pressure_temp_interaction").unwrap();
        assert!((interaction - 120.0 * (25.0 + 273.15) / 293.15).abs() < 1e-12);
    }

    #[test]
    fn test_ratio_is_finite_at_zero_pressure() {
        let engineer = FeatureEngineer::new();
        let mut row = raw_row();
        row.insert("pressure_psi", 0.0);

        let out = engineer.transform_row(&row);
        assert!(out.get("flow_pressure_ratio").unwrap().is_finite());
    }

    #[test]
    fn test_pure_function_idempotence() {
        let engineer = FeatureEngineer::new();
        let once = engineer.transform_row(&raw_row());
        // Re-deriving from the already-transformed row restricted to the
        // same raw columns yields identical derived values.
        let twice = engineer.transform_row(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_single_and_batch_modes_agree() {
        let engineer = FeatureEngineer::new();
        let rows = vec![raw_row(), raw_row()];
        let batch = engineer.transform(&rows);
        assert_eq!(batch[0], engineer.transform_row(&rows[0]));
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_extra_columns_pass_through() {
        let engineer = FeatureEngineer::new();
        let mut row = raw_row();
        row.insert("line_voltage", 230.0);

        let out = engineer.transform_row(&row);
        assert_eq!(out.get("line_voltage"), Some(230.0));
    }

    #[test]
    fn test_missing_raw_columns_skip_derived() {
        let engineer = FeatureEngineer::new();
        let mut row = SensorRow::new();
        row.insert("vibration_gforce", 0.5);

        let out = engineer.transform_row(&row);
        assert!(out.contains("vibration_rms"));
        assert!(!out.contains("flow_pressure_ratio"));
        assert!(!out.contains("pressure_temp_interaction"));
    }

    #[test]
    fn test_feature_list_is_raw_then_derived() {
        assert_eq!(&FEATURE_NAMES[..5], &crate::models::SENSOR_FIELDS[..]);
        assert_eq!(&FEATURE_NAMES[5..], &DERIVED_FEATURES[..]);
    }
}
