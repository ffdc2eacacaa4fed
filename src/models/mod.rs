/// Domain types shared across generation, training and inference
pub mod leak;
pub mod reading;

pub use leak::{LeakClass, Severity};
pub use reading::{LabeledSample, SensorReading, SensorRow, SENSOR_FIELDS};
