// ============================================================
// Layer 3 - Core Traits (Collaborator Seams)
// ============================================================
// The orchestration engine never sees Burn or the tokenizer
// directly. It drives three collaborators through these traits:
//
//   BatchSource       - turns texts (+ labels) into padded batches
//                       (implemented by data::batcher::SmartBatcher)
//   ClassifierSession - model + optimizer, one update per call
//                       (implemented by ml::session::BurnSession)
//   InferenceModel    - gradient-free scoring of a batch
//                       (implemented by ml::session::BurnInference)
//
// Tests implement them with small deterministic fakes so the
// epoch loop, evaluation and checkpoint policy run on any
// machine in milliseconds.

use std::path::Path;

use crate::domain::batch::TextBatch;
use crate::domain::error::EngineResult;

// ─── BatchSource ──────────────────────────────────────────────────────────────
/// Order in which a batch source emits its batches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOrder {
    /// Length-sorted, deterministic; used for evaluation and prediction
    Sequential,
    /// Batch order shuffled with the given seed; used for training
    Shuffled { seed: u64 },
}

pub trait BatchSource {
    /// Split `texts` into batches of at most `batch_size` rows.
    /// Every input row appears in exactly one batch.
    fn make_batches(
        &self,
        texts:      &[String],
        labels:     Option<&[usize]>,
        batch_size: usize,
        order:      BatchOrder,
    ) -> EngineResult<Vec<TextBatch>>;
}

// ─── InferenceModel ───────────────────────────────────────────────────────────
/// What one gradient-free forward pass returns for a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchScores {
    /// Mean loss over the batch, present when labels were supplied
    pub loss:   Option<f64>,
    /// One class-score row per batch row
    pub logits: Vec<Vec<f32>>,
}

pub trait InferenceModel {
    /// Forward pass without gradient tracking
    fn score(&self, batch: &TextBatch) -> EngineResult<BatchScores>;
}

// ─── ClassifierSession ────────────────────────────────────────────────────────
/// A trainable model bound to its optimizer.
pub trait ClassifierSession {
    type Inference: InferenceModel;

    /// One optimization step on one batch: forward with labels,
    /// backward, global gradient-norm clipping, optimizer update
    /// at `learning_rate`. Returns the batch's mean loss.
    fn train_step(&mut self, batch: &TextBatch, learning_rate: f64) -> EngineResult<f64>;

    /// Snapshot of the current weights in inference mode
    fn inference(&self) -> Self::Inference;

    /// Persist model and optimizer state into `dir` (which exists)
    fn save_state(&self, dir: &Path) -> EngineResult<()>;
}
