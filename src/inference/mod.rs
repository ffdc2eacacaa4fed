/// Inference layer: the class-to-decision policy and the artifact-backed
/// classification service.
pub mod decision;
pub mod service;

pub use decision::{
    alert_message, decide, is_alert_worthy, recommended_action, severity_for,
    severity_for_label, ClassificationResult, SYSTEM_ERROR_ACTION,
};
pub use service::{ArtifactStatus, InferenceService, ServiceDescriptor};
