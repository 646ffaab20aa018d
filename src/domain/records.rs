// ============================================================
// Layer 3 - Result Records
// ============================================================
// EpochRecord      - one row per training epoch, append-only,
//                    only ever used for reporting
// EvaluationResult - everything one evaluation pass produced
//
// Neither record drives control flow except `f1`, which the
// checkpoint manager compares against the best score.

use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpochRecord {
    /// 1-indexed epoch number
    pub epoch:             usize,
    /// Mean of the per-batch mean losses
    pub avg_train_loss:    f64,
    pub training_duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    /// Mean of the per-batch mean losses, NaN when no batch ran
    pub avg_val_loss:  f64,
    /// Raw class scores, one row per example, in batch order
    pub predictions:   Vec<Vec<f32>>,
    pub true_labels:   Vec<usize>,
    /// `argmax` of each prediction row
    pub derived_preds: Vec<usize>,
    pub accuracy:      f64,
    /// Support-weighted across classes
    pub precision:     f64,
    pub recall:        f64,
    pub f1:            f64,
}

impl EvaluationResult {
    pub fn len(&self) -> usize {
        self.true_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.true_labels.is_empty()
    }
}
