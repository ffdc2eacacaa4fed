use crate::models::LeakClass;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A named synthetic operating regime.
///
/// Each scenario fixes a starting pressure band, a trend shape and the
/// correlation rules for the derived signals. Five scenarios map many-to-one
/// onto four leak classes: normal and early-deviation both label `none`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Scenario {
    /// Stable operation well inside the 100-150 PSI band
    Normal,
    /// 95-100 PSI, slight downward drift, still labeled `none`
    EarlyDeviation,
    /// 90-95 PSI, clear drop
    MicroLeak,
    /// 80-90 PSI, sustained loss
    MediumLeak,
    /// Below 80 PSI, rapid loss of containment
    MajorLeak,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Scenario::Normal,
        Scenario::EarlyDeviation,
        Scenario::MicroLeak,
        Scenario::MediumLeak,
        Scenario::MajorLeak,
    ];

    /// Share of this scenario in the assembled training mix
    pub fn mix_weight(self) -> f64 {
        match self {
            Scenario::Normal => 0.50,
            Scenario::EarlyDeviation => 0.10,
            Scenario::MicroLeak => 0.15,
            Scenario::MediumLeak => 0.15,
            Scenario::MajorLeak => 0.10,
        }
    }

    /// The label this scenario produces
    pub fn leak_class(self) -> LeakClass {
        match self {
            Scenario::Normal | Scenario::EarlyDeviation => LeakClass::None,
            Scenario::MicroLeak => LeakClass::Micro,
            Scenario::MediumLeak => LeakClass::Slow,
            Scenario::MajorLeak => LeakClass::Catastrophic,
        }
    }

    /// Whether the derived signals follow the leak correlation rules
    /// (flow, vibration and acoustic level rise as pressure drops)
    pub fn is_leak(self) -> bool {
        matches!(
            self,
            Scenario::MicroLeak | Scenario::MediumLeak | Scenario::MajorLeak
        )
    }

    /// Draw the starting pressure for one segment
    pub(crate) fn sample_base_pressure(self, rng: &mut StdRng) -> f64 {
        match self {
            Scenario::Normal => rng.gen_range(105.0..145.0),
            Scenario::EarlyDeviation => rng.gen_range(96.0..99.0),
            Scenario::MicroLeak => rng.gen_range(91.0..94.0),
            Scenario::MediumLeak => 89.0,
            Scenario::MajorLeak => rng.gen_range(40.0..75.0),
        }
    }

    /// Total linear pressure delta applied over one segment.
    ///
    /// `None` means no deterministic trend: the normal scenario jitters each
    /// sample independently instead of drifting.
    pub(crate) fn trend_end(self) -> Option<f64> {
        match self {
            Scenario::Normal => None,
            Scenario::EarlyDeviation => Some(-1.0),
            Scenario::MicroLeak => Some(-2.0),
            Scenario::MediumLeak => Some(-8.0),
            Scenario::MajorLeak => Some(-10.0),
        }
    }

    /// Hard clamp keeping label boundaries in feature space intact: major
    /// leak pressure stays strictly below 80, normal strictly above 100.
    pub(crate) fn clamp_pressure(self, pressure: f64) -> f64 {
        match self {
            Scenario::MajorLeak => pressure.min(79.9),
            Scenario::Normal => pressure.max(100.1),
            _ => pressure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_mix_weights_sum_to_one() {
        let total: f64 = Scenario::ALL.iter().map(|s| s.mix_weight()).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_scenario_to_label_mapping() {
        assert_eq!(Scenario::Normal.leak_class(), LeakClass::None);
        assert_eq!(Scenario::EarlyDeviation.leak_class(), LeakClass::None);
        assert_eq!(Scenario::MicroLeak.leak_class(), LeakClass::Micro);
        assert_eq!(Scenario::MediumLeak.leak_class(), LeakClass::Slow);
        assert_eq!(Scenario::MajorLeak.leak_class(), LeakClass::Catastrophic);
    }

    #[test]
    fn test_leak_correlation_rules() {
        assert!(!Scenario::Normal.is_leak());
        assert!(!Scenario::EarlyDeviation.is_leak());
        assert!(Scenario::MicroLeak.is_leak());
        assert!(Scenario::MediumLeak.is_leak());
        assert!(Scenario::MajorLeak.is_leak());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(Scenario::EarlyDeviation.to_string(), "early_deviation");
        assert_eq!(
            Scenario::from_str("major_leak").unwrap(),
            Scenario::MajorLeak
        );
    }

    #[test]
    fn test_clamp_boundaries() {
        assert!(Scenario::MajorLeak.clamp_pressure(95.0) < 80.0);
        assert!(Scenario::Normal.clamp_pressure(85.0) > 100.0);
        assert_eq!(Scenario::MicroLeak.clamp_pressure(92.5), 92.5);
    }
}
