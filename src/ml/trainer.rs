// ============================================================
// Layer 5 - Training Step Executor
// ============================================================
// One full pass over one epoch's batches.
//
// Per batch:
//   1. Read the scheduled learning rate
//   2. session.train_step: forward with labels, backward,
//      global-norm clip at 1.0, one AdamW update
//   3. Add the batch's mean loss to the running sum
//   4. Advance the scheduler by one step
//
// Gradients are fresh for every backward pass in Burn (they are
// returned, not accumulated on the parameters), so there is no
// explicit zero-grad step.
//
// The epoch loss is the plain mean of per-batch mean losses:
//   avg_train_loss = Σ batch_loss / num_batches
// A short final batch therefore counts as much as a full one.
// This is the defined semantics and is kept as is.
//
// Any batch failure propagates out of the epoch; nothing is
// retried here.

use crate::domain::batch::TextBatch;
use crate::domain::error::EngineResult;
use crate::domain::records::EpochRecord;
use crate::domain::traits::ClassifierSession;
use crate::infra::progress::{format_elapsed, ProgressReporter};
use crate::ml::scheduler::LinearScheduler;

/// Model + optimizer (inside the session) and the LR schedule
/// that drives them. Owned by one fit call.
pub struct OptimizationState<S: ClassifierSession> {
    pub session:   S,
    pub scheduler: LinearScheduler,
}

impl<S: ClassifierSession> OptimizationState<S> {
    pub fn new(session: S, scheduler: LinearScheduler) -> Self {
        Self { session, scheduler }
    }

    /// One optimizer step followed by one scheduler step
    pub fn step(&mut self, batch: &TextBatch) -> EngineResult<f64> {
        let lr   = self.scheduler.current_lr();
        let loss = self.session.train_step(batch, lr)?;
        self.scheduler.step();
        Ok(loss)
    }
}

/// Run every batch once and return the epoch's record.
pub fn train_epoch<S: ClassifierSession>(
    state:           &mut OptimizationState<S>,
    batches:         &[TextBatch],
    epoch:           usize,
    update_interval: usize,
) -> EngineResult<EpochRecord> {
    tracing::info!("Training on {} batches...", batches.len());

    let progress = ProgressReporter::with_interval("train", batches.len(), update_interval);

    let mut total_loss = 0.0f64;
    for (step, batch) in batches.iter().enumerate() {
        progress.tick(step);
        total_loss += state.step(batch)?;
    }

    let avg_train_loss = if batches.is_empty() {
        f64::NAN
    } else {
        total_loss / batches.len() as f64
    };
    let training_duration = progress.elapsed();

    tracing::info!("  Average training loss: {:.4}", avg_train_loss);
    tracing::info!("  Training epoch took: {}", format_elapsed(training_duration));

    Ok(EpochRecord { epoch, avg_train_loss, training_duration })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::{BatchScores, InferenceModel};
    use std::path::Path;

    /// Loss = number of rows in the batch; records every LR it saw
    struct RecordingSession {
        lrs: Vec<f64>,
    }

    struct Unused;

    impl InferenceModel for Unused {
        fn score(&self, _batch: &TextBatch) -> EngineResult<BatchScores> {
            Ok(BatchScores { loss: None, logits: vec![] })
        }
    }

    impl ClassifierSession for RecordingSession {
        type Inference = Unused;

        fn train_step(&mut self, batch: &TextBatch, lr: f64) -> EngineResult<f64> {
            self.lrs.push(lr);
            Ok(batch.len() as f64)
        }

        fn inference(&self) -> Unused {
            Unused
        }

        fn save_state(&self, _dir: &Path) -> EngineResult<()> {
            Ok(())
        }
    }

    fn batch_of(rows: usize) -> TextBatch {
        TextBatch {
            indices:        (0..rows).collect(),
            input_ids:      vec![vec![101, 102]; rows],
            attention_mask: vec![vec![1, 1]; rows],
            labels:         Some(vec![0; rows]),
        }
    }

    #[test]
    fn test_loss_is_mean_of_batch_means() {
        let mut state = OptimizationState::new(
            RecordingSession { lrs: vec![] },
            LinearScheduler::new(1.0, 0, 4),
        );
        // Batch losses 4, 4, 1 -> mean 3 (not the row-weighted 3.67)
        let batches = vec![batch_of(4), batch_of(4), batch_of(1)];
        let record  = train_epoch(&mut state, &batches, 1, 1).unwrap();

        assert_eq!(record.epoch, 1);
        assert!((record.avg_train_loss - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_scheduler_advances_once_per_batch() {
        let mut state = OptimizationState::new(
            RecordingSession { lrs: vec![] },
            LinearScheduler::new(1.0, 0, 4),
        );
        let batches = vec![batch_of(2), batch_of(2)];
        train_epoch(&mut state, &batches, 1, 1).unwrap();
        train_epoch(&mut state, &batches, 2, 1).unwrap();

        assert_eq!(state.scheduler.steps_taken(), 4);
        assert_eq!(state.session.lrs, vec![1.0, 0.75, 0.5, 0.25]);
    }

    #[test]
    fn test_batch_failure_aborts_epoch() {
        struct Failing;
        impl ClassifierSession for Failing {
            type Inference = Unused;
            fn train_step(&mut self, _b: &TextBatch, _lr: f64) -> EngineResult<f64> {
                Err(crate::domain::error::EngineError::compute("out of memory"))
            }
            fn inference(&self) -> Unused {
                Unused
            }
            fn save_state(&self, _dir: &Path) -> EngineResult<()> {
                Ok(())
            }
        }

        let mut state = OptimizationState::new(Failing, LinearScheduler::new(1.0, 0, 4));
        let err = train_epoch(&mut state, &[batch_of(1)], 1, 1);
        assert!(err.is_err());
        // Scheduler did not advance past the failed batch
        assert_eq!(state.scheduler.steps_taken(), 0);
    }
}
