//! LeakGuard: leak-severity classification for pipeline sensor telemetry.
//!
//! The crate covers the full model lifecycle:
//! - synthetic scenario generation of labeled sensor data
//! - a deterministic feature/preprocess/classify training pipeline
//! - atomic artifact persistence
//! - a lazy-loading inference service mapping classes to operator decisions

pub mod artifact;
pub mod config;
pub mod error;
pub mod generator;
pub mod inference;
pub mod ml;
pub mod models;

pub use config::Config;
pub use error::{AppError, Result};
