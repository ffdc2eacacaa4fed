use crate::error::{AppError, Result};
use crate::ml::features::FEATURE_NAMES;
use crate::models::SensorRow;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Guard against degenerate standard deviations
const MIN_STD: f64 = 1e-12;

/// Fit-once numeric preprocessing: median imputation followed by
/// standardization over the fixed feature list.
///
/// The feature list is a strict allow-list: any column outside it is dropped,
/// which keeps the feature-vector shape stable no matter what stray fields a
/// caller passes. Frozen after fit; refit only happens inside a full
/// retraining run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessStage {
    medians: Vec<f64>,
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl PreprocessStage {
    /// Compute per-feature median, mean and std over an engineered table.
    ///
    /// The median is taken over present values; mean/std are taken over the
    /// median-imputed column, matching the impute-then-scale fit order.
    pub fn fit(rows: &[SensorRow]) -> Result<Self> {
        if rows.is_empty() {
            return Err(AppError::Training(
                "cannot fit preprocessing on an empty table".to_string(),
            ));
        }

        let mut medians = Vec::with_capacity(FEATURE_NAMES.len());
        let mut means = Vec::with_capacity(FEATURE_NAMES.len());
        let mut stds = Vec::with_capacity(FEATURE_NAMES.len());

        for feature in FEATURE_NAMES {
            let mut present: Vec<f64> = rows
                .iter()
                .filter_map(|row| row.get(feature))
                .filter(|v| v.is_finite())
                .collect();

            let median = if present.is_empty() {
                0.0
            } else {
                present.sort_by(|a, b| a.total_cmp(b));
                let mid = present.len() / 2;
                if present.len() % 2 == 0 {
                    (present[mid - 1] + present[mid]) / 2.0
                } else {
                    present[mid]
                }
            };

            let imputed: Vec<f64> = rows
                .iter()
                .map(|row| row.get(feature).filter(|v| v.is_finite()).unwrap_or(median))
                .collect();

            let n = imputed.len() as f64;
            let mean = imputed.iter().sum::<f64>() / n;
            let variance = imputed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std = variance.sqrt().max(MIN_STD);

            medians.push(median);
            means.push(mean);
            stds.push(std);
        }

        Ok(Self {
            medians,
            means,
            stds,
        })
    }

    /// Impute and standardize one row into the fixed 8-feature vector
    pub fn transform_row(&self, row: &SensorRow) -> Vec<f64> {
        FEATURE_NAMES
            .iter()
            .enumerate()
            .map(|(i, feature)| {
                let value = row
                    .get(feature)
                    .filter(|v| v.is_finite())
                    .unwrap_or(self.medians[i]);
                (value - self.means[i]) / self.stds[i]
            })
            .collect()
    }

    /// Transform a batch into an (n_rows x n_features) matrix
    pub fn transform(&self, rows: &[SensorRow]) -> Array2<f64> {
        let mut matrix = Array2::zeros((rows.len(), FEATURE_NAMES.len()));
        for (i, row) in rows.iter().enumerate() {
            for (j, value) in self.transform_row(row).into_iter().enumerate() {
                matrix[[i, j]] = value;
            }
        }
        matrix
    }

    pub fn median(&self, feature_index: usize) -> f64 {
        self.medians[feature_index]
    }
}
