//! Model artifact persistence.
//!
//! One binary artifact per deployment directory, written atomically so a
//! crash mid-save never leaves a truncated file where a loadable model used
//! to be.

use crate::error::{AppError, Result};
use crate::ml::LeakDetectionPipeline;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Artifact file name inside the configured directory
pub const ARTIFACT_FILE: &str = "leak_model.bin";

/// Filesystem store for the fitted pipeline
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    path: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(ARTIFACT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Serialize and persist a fitted pipeline.
    ///
    /// Writes to a sibling temp file, then renames over the target, so
    /// readers only ever observe the old artifact or the complete new one.
    pub fn save(&self, pipeline: &LeakDetectionPipeline) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let bytes = bincode::serialize(pipeline)
            .map_err(|e| AppError::Serialization(format!("artifact encode failed: {e}")))?;

        let tmp = self.path.with_extension("bin.tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;

        info!(path = %self.path.display(), size_bytes = bytes.len(), "model artifact saved");
        Ok(())
    }

    /// Load the persisted pipeline.
    ///
    /// A missing file and a corrupt file both surface as artifact-load
    /// errors; the caller decides whether that is fatal.
    pub fn load(&self) -> Result<LeakDetectionPipeline> {
        let bytes = fs::read(&self.path).map_err(|e| {
            AppError::ArtifactLoad(format!(
                "cannot read artifact at {}: {e}",
                self.path.display()
            ))
        })?;

        let pipeline = bincode::deserialize(&bytes).map_err(|e| {
            AppError::ArtifactLoad(format!(
                "cannot decode artifact at {}: {e}",
                self.path.display()
            ))
        })?;

        info!(path = %self.path.display(), "model artifact loaded");
        Ok(pipeline)
    }
}
