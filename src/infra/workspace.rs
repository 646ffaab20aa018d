// ============================================================
// Layer 6 - Output Workspace
// ============================================================
// Every artifact of a fit/pred call lands under one root:
//
//   {root}/
//     results/       classification report, training stats, PR curve
//     models_BERT/   checkpoint bundles and the built tokenizer
//     prediction/    prediction CSVs
//
// All three directories are created in a single acquisition
// step before any work starts. If one cannot be created the
// call fails right there, before a model is built or a single
// batch is run, so a failed call never leaves half its outputs.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::error::{EngineError, EngineResult};

pub const RESULTS_DIR:    &str = "results";
pub const MODELS_DIR:     &str = "models_BERT";
pub const PREDICTION_DIR: &str = "prediction";

#[derive(Debug, Clone, PartialEq)]
pub struct OutputDirs {
    pub results:    PathBuf,
    pub models:     PathBuf,
    pub prediction: PathBuf,
}

impl OutputDirs {
    /// Paths under `root`, without touching the filesystem
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            results:    root.join(RESULTS_DIR),
            models:     root.join(MODELS_DIR),
            prediction: root.join(PREDICTION_DIR),
        }
    }

    /// Create every output directory (like `mkdir -p`) or fail
    pub fn acquire(root: impl AsRef<Path>) -> EngineResult<Self> {
        let dirs = Self::under(root);
        for dir in [&dirs.results, &dirs.models, &dirs.prediction] {
            fs::create_dir_all(dir).map_err(|e| EngineError::io(dir, e))?;
        }
        tracing::debug!(
            "Output directories ready: {}, {}, {}",
            dirs.results.display(),
            dirs.models.display(),
            dirs.prediction.display()
        );
        Ok(dirs)
    }
}
