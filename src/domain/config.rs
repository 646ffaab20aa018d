// ============================================================
// Layer 3 - Training Configuration
// ============================================================
// Immutable snapshot of the hyperparameters for one fit call.
// It is built once (from CLI flags or a saved JSON file),
// validated, and then only read.
//
// `deny_unknown_fields` makes a saved config with a typo or a
// stale option fail loudly instead of being silently ignored.

use serde::{Deserialize, Serialize};

use crate::domain::error::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainingConfig {
    pub batch_size:    usize,
    pub epochs:        usize,
    pub max_len:       usize,
    pub test_size:     f64,
    pub seed:          u64,
    pub learning_rate: f64,
    pub epsilon:       f64,
    pub eval_interval: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            batch_size:    16,
            epochs:        20,
            max_len:       512,
            test_size:     0.2,
            seed:          42,
            learning_rate: 5e-5,
            epsilon:       1e-8,
            eval_interval: 5,
        }
    }
}

impl TrainingConfig {
    /// Reject settings the engine cannot run with.
    ///
    /// `eval_interval > epochs` is rejected because the final
    /// classification report is built from the last evaluation,
    /// and with that setting no evaluation would ever happen.
    pub fn validate(&self) -> EngineResult<()> {
        if self.batch_size == 0 {
            return Err(EngineError::configuration("batch_size must be at least 1"));
        }
        if self.epochs == 0 {
            return Err(EngineError::configuration("epochs must be at least 1"));
        }
        if self.eval_interval == 0 {
            return Err(EngineError::configuration("eval_interval must be at least 1"));
        }
        if self.eval_interval > self.epochs {
            return Err(EngineError::configuration(format!(
                "eval_interval ({}) exceeds epochs ({}): no evaluation would run",
                self.eval_interval, self.epochs
            )));
        }
        if self.max_len < 2 {
            return Err(EngineError::configuration(
                "max_len must leave room for [CLS] and [SEP]",
            ));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(EngineError::configuration(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if !(self.learning_rate > 0.0) || !(self.epsilon > 0.0) {
            return Err(EngineError::configuration(
                "learning_rate and epsilon must be positive",
            ));
        }
        Ok(())
    }

    /// Batches per epoch as counted for the scheduler.
    ///
    /// One extra batch is always added, even when the dataset
    /// divides evenly. This count fixes the length of the LR decay
    /// curve, so it is kept exactly as is.
    pub fn batches_per_epoch(&self, num_train_examples: usize) -> usize {
        num_train_examples / self.batch_size + 1
    }

    /// Total scheduler steps: `batches_per_epoch * epochs`
    pub fn total_steps(&self, num_train_examples: usize) -> usize {
        self.batches_per_epoch(num_train_examples) * self.epochs
    }

    /// Whether the given 1-indexed epoch ends with an evaluation
    pub fn evaluates_at(&self, epoch: usize) -> bool {
        epoch % self.eval_interval == 0
    }
}
