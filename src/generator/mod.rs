/// Synthetic training-data generation
///
/// This module provides the scenario-driven generator used when no real
/// sensor history exists:
/// - Five named operating regimes with physically-plausible signal shapes
/// - Segment generation on a continuous 1 Hz timeline
/// - Full-dataset assembly under a fixed scenario-mix distribution
pub mod assembler;
pub mod scenario;
pub mod synth;

pub use assembler::DatasetAssembler;
pub use scenario::Scenario;
pub use synth::ScenarioGenerator;
