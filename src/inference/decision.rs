use crate::models::{LeakClass, Severity};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Operator action surfaced when classification itself failed
pub const SYSTEM_ERROR_ACTION: &str = "system error - check logs";

/// One classified reading, ready for an operator or an alerting sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub leak_class: LeakClass,

    /// Confidence of the winning class, in [0, 1]
    pub leak_probability: f64,

    pub severity: Severity,

    /// 0 for a healthy reading, otherwise confidence scaled to [0, 100]
    pub anomaly_score: f64,

    pub recommended_action: String,
}

/// Severity tier for each leak class. Exhaustive on purpose: adding a class
/// forces a policy decision here.
pub fn severity_for(class: LeakClass) -> Severity {
    match class {
        LeakClass::None => Severity::Info,
        LeakClass::Micro => Severity::Warning,
        LeakClass::Slow => Severity::High,
        LeakClass::Catastrophic => Severity::Critical,
    }
}

/// Severity for a free-form class label, for callers holding strings from
/// logs or external systems. Unrecognized labels map to `Unknown`.
pub fn severity_for_label(label: &str) -> Severity {
    LeakClass::from_str(label)
        .map(severity_for)
        .unwrap_or(Severity::Unknown)
}

/// Operator guidance per class
pub fn recommended_action(class: LeakClass) -> &'static str {
    match class {
        LeakClass::None => "system optimal",
        LeakClass::Micro => "monitor trend closely",
        LeakClass::Slow => "schedule maintenance review",
        LeakClass::Catastrophic => "emergency shutdown required",
    }
}

/// Turn a class and its probability vector into the full decision record.
///
/// The probability vector is in [`LeakClass::ALL`] order; the winning-class
/// confidence drives the anomaly score.
pub fn decide(class: LeakClass, proba: &[f64]) -> ClassificationResult {
    let leak_probability = proba
        .iter()
        .copied()
        .fold(0.0_f64, f64::max)
        .clamp(0.0, 1.0);

    let anomaly_score = if class == LeakClass::None {
        0.0
    } else {
        leak_probability * 100.0
    };

    ClassificationResult {
        leak_class: class,
        leak_probability,
        severity: severity_for(class),
        anomaly_score,
        recommended_action: recommended_action(class).to_string(),
    }
}

/// Any non-healthy class is worth alerting on
pub fn is_alert_worthy(result: &ClassificationResult) -> bool {
    result.leak_class != LeakClass::None
}

/// Alert text for non-healthy results, `None` for healthy ones
pub fn alert_message(result: &ClassificationResult) -> Option<String> {
    if !is_alert_worthy(result) {
        return None;
    }
    Some(format!(
        "Leak Detected: {} (conf {:.1}%)",
        result.leak_class.to_string().to_uppercase(),
        result.leak_probability * 100.0
    ))
}
