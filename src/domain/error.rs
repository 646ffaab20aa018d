// ============================================================
// Layer 3 - Error Taxonomy
// ============================================================
// Every failure in the engine is fatal to the current fit/pred
// call; nothing below the CLI retries. The variants name the
// kind of failure so callers can decide how to report it:
//
//   Configuration - bad label type, invalid hyperparameters
//   Compute       - forward/backward or tensor readback failed
//   Io            - directory or file write/read failed
//
// The remaining variants wrap third-party errors from the CSV,
// JSON, tokenizer and checkpoint-recorder crates.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used across the engine
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Rejected before any work starts
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Failure inside the compute collaborator
    #[error("compute failure: {0}")]
    Compute(String),

    #[error("I/O failure at '{}': {source}", path.display())]
    Io {
        path:   PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Recorder failed to save or load model/optimizer state
    #[error("checkpoint error: {0}")]
    Checkpoint(String),
}

impl EngineError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn compute(msg: impl Into<String>) -> Self {
        Self::Compute(msg.into())
    }

    pub fn tokenizer(msg: impl std::fmt::Display) -> Self {
        Self::Tokenizer(msg.to_string())
    }

    pub fn checkpoint(msg: impl std::fmt::Display) -> Self {
        Self::Checkpoint(msg.to_string())
    }

    /// Attach the offending path to an `std::io::Error`
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io { path: path.as_ref().to_path_buf(), source }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_mentions_path() {
        let err = EngineError::io(
            "results/report.csv",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("results/report.csv"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_configuration_kind() {
        assert!(EngineError::configuration("bad").is_configuration());
        assert!(!EngineError::compute("oom").is_configuration());
    }
}
