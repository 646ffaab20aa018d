// ============================================================
// Layer 6 - Checkpoint & Model-Selection Manager
// ============================================================
// Two separate concerns live here:
//
//   1. Selection (pure): BestScoreTracker decides whether a new
//      evaluation F1 strictly beats the best F1 seen so far in
//      this fit call. Equal scores do NOT count. Accuracy,
//      precision and recall are reported but never compared.
//
//   2. Persistence (I/O): on improvement, CheckpointManager
//      writes a new checkpoint bundle. Nothing is written
//      otherwise, so calling it again with a non-improving
//      result is a no-op.
//
// Bundle layout (one directory per improvement):
//
//   models_BERT/
//     {model}_{mm_dd_HH_MM}_EPOCH_{epoch}_F1_{f1:.4}.pth/
//       model.mpk.gz       ← model weights (Burn CompactRecorder)
//       optimizer.mpk.gz   ← AdamW moment estimates
//       classifier.json    ← architecture, needed to rebuild the model
//       scheduler.json     ← learning-rate schedule position
//
// The name keeps the usual `.pth` suffix, but it is a directory:
// the recorders write several files and append their own
// extensions, and the F1 part of the key already contains a dot.
//
// Old bundles are never deleted; each can be several hundred MB
// for a full-size encoder, so prune the directory by hand.
// Two improvements from different processes in the same minute
// with the same epoch and rounded F1 would share a name; that
// narrow collision is accepted.

use std::{fs, path::PathBuf};

use crate::domain::error::{EngineError, EngineResult};
use crate::domain::records::EvaluationResult;
use crate::domain::traits::ClassifierSession;
use crate::ml::scheduler::LinearScheduler;

pub const SCHEDULER_FILE: &str = "scheduler.json";

// ─── Selection ────────────────────────────────────────────────────────────────
/// Best weighted F1 seen so far; starts at 0 and never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BestScoreTracker {
    best_score: f64,
}

impl BestScoreTracker {
    pub fn new() -> Self {
        Self { best_score: 0.0 }
    }

    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    /// Returns the updated tracker and whether `f1` is a strict improvement.
    /// NaN never improves.
    pub fn select(self, f1: f64) -> (Self, bool) {
        if f1 > self.best_score {
            (Self { best_score: f1 }, true)
        } else {
            (self, false)
        }
    }
}

// ─── Checkpoint key ───────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointKey {
    pub model_name: String,
    pub timestamp:  String,
    pub epoch:      usize,
    pub f1:         f64,
}

impl CheckpointKey {
    /// `{model}_{timestamp}_EPOCH_{epoch}_F1_{f1 rounded to 4 places}.pth`
    pub fn dir_name(&self) -> String {
        format!(
            "{}_{}_EPOCH_{}_F1_{}.pth",
            self.model_name,
            self.timestamp,
            self.epoch,
            format_score(self.f1)
        )
    }
}

/// Round to 4 decimal places and print the shortest form, keeping
/// one decimal for whole numbers (`0.8123`, `0.8`, `1.0`).
pub fn format_score(score: f64) -> String {
    let rounded = (score * 10_000.0).round() / 10_000.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.1}")
    } else {
        format!("{rounded}")
    }
}

/// Month, day, hour and minute of the local clock
pub fn minute_stamp() -> String {
    chrono::Local::now().format("%m_%d_%H_%M").to_string()
}

/// What `maybe_checkpoint` did
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointOutcome {
    pub tracker: BestScoreTracker,
    /// Bundle directory, when one was written
    pub saved:   Option<PathBuf>,
}

// ─── Persistence ──────────────────────────────────────────────────────────────
pub struct CheckpointManager {
    /// Parent directory of all bundles (must already exist)
    dir:   PathBuf,
    clock: fn() -> String,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_clock(dir, minute_stamp)
    }

    /// Use a fixed clock, for reproducible names
    pub fn with_clock(dir: impl Into<PathBuf>, clock: fn() -> String) -> Self {
        Self { dir: dir.into(), clock }
    }

    /// Persist a bundle only when `eval.f1` strictly beats `tracker`.
    pub fn maybe_checkpoint<S: ClassifierSession>(
        &self,
        eval:       &EvaluationResult,
        tracker:    BestScoreTracker,
        session:    &S,
        scheduler:  &LinearScheduler,
        epoch:      usize,
        model_name: &str,
    ) -> EngineResult<CheckpointOutcome> {
        let (updated, improved) = tracker.select(eval.f1);
        if !improved {
            tracing::info!(
                "F1 {:.4} did not beat best {:.4}; no checkpoint written",
                eval.f1,
                tracker.best_score()
            );
            return Ok(CheckpointOutcome { tracker, saved: None });
        }

        let key = CheckpointKey {
            model_name: model_name.to_string(),
            timestamp:  (self.clock)(),
            epoch,
            f1:         eval.f1,
        };
        let path = self.save(&key, session, scheduler)?;
        tracing::info!(
            "New best F1 {:.4} (was {:.4}); model saved to '{}'",
            eval.f1,
            tracker.best_score(),
            path.display()
        );
        Ok(CheckpointOutcome { tracker: updated, saved: Some(path) })
    }

    /// Write a full bundle for `key` and return its directory
    pub fn save<S: ClassifierSession>(
        &self,
        key:       &CheckpointKey,
        session:   &S,
        scheduler: &LinearScheduler,
    ) -> EngineResult<PathBuf> {
        let bundle = self.dir.join(key.dir_name());
        fs::create_dir_all(&bundle).map_err(|e| EngineError::io(&bundle, e))?;

        session.save_state(&bundle)?;

        let sched_path = bundle.join(SCHEDULER_FILE);
        let json = serde_json::to_string_pretty(scheduler)?;
        fs::write(&sched_path, json).map_err(|e| EngineError::io(&sched_path, e))?;

        tracing::debug!("Checkpoint bundle written: '{}'", bundle.display());
        Ok(bundle)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::batch::TextBatch;
    use crate::domain::traits::{BatchScores, InferenceModel};
    use std::cell::Cell;
    use std::path::Path;

    /// Session that only records how many times it was saved
    struct CountingSession {
        saves: Cell<usize>,
    }

    struct NoopInference;

    impl InferenceModel for NoopInference {
        fn score(&self, batch: &TextBatch) -> EngineResult<BatchScores> {
            Ok(BatchScores { loss: Some(0.0), logits: vec![vec![0.0]; batch.len()] })
        }
    }

    impl ClassifierSession for CountingSession {
        type Inference = NoopInference;

        fn train_step(&mut self, _batch: &TextBatch, _lr: f64) -> EngineResult<f64> {
            Ok(0.0)
        }

        fn inference(&self) -> NoopInference {
            NoopInference
        }

        fn save_state(&self, dir: &Path) -> EngineResult<()> {
            self.saves.set(self.saves.get() + 1);
            fs::write(dir.join("model.bin"), b"weights").map_err(|e| EngineError::io(dir, e))
        }
    }

    fn eval_with_f1(f1: f64) -> EvaluationResult {
        EvaluationResult {
            avg_val_loss:  0.5,
            predictions:   vec![],
            true_labels:   vec![],
            derived_preds: vec![],
            accuracy:      f1,
            precision:     f1,
            recall:        f1,
            f1,
        }
    }

    fn fixed_clock() -> String {
        "10_19_12_30".to_string()
    }

    #[test]
    fn test_equal_score_does_not_improve() {
        let (t, improved) = BestScoreTracker::new().select(0.7);
        assert!(improved);
        let (t2, improved) = t.select(0.7);
        assert!(!improved);
        assert_eq!(t2.best_score(), 0.7);
    }

    #[test]
    fn test_zero_f1_never_improves_fresh_tracker() {
        let (_, improved) = BestScoreTracker::new().select(0.0);
        assert!(!improved);
        let (_, improved) = BestScoreTracker::new().select(f64::NAN);
        assert!(!improved);
    }

    #[test]
    fn test_tracker_is_monotonic() {
        let scores = [0.3, 0.1, 0.5, 0.5, 0.2, 0.9, 0.4];
        let mut tracker = BestScoreTracker::new();
        for s in scores {
            let before = tracker.best_score();
            tracker = tracker.select(s).0;
            assert!(tracker.best_score() >= before);
        }
        assert_eq!(tracker.best_score(), 0.9);
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0.812345), "0.8123");
        assert_eq!(format_score(0.8), "0.8");
        assert_eq!(format_score(1.0), "1.0");
        assert_eq!(format_score(0.66666), "0.6667");
    }

    #[test]
    fn test_dir_name() {
        let key = CheckpointKey {
            model_name: "bert-base-uncased".into(),
            timestamp:  fixed_clock(),
            epoch:      5,
            f1:         0.812345,
        };
        assert_eq!(key.dir_name(), "bert-base-uncased_10_19_12_30_EPOCH_5_F1_0.8123.pth");
    }

    #[test]
    fn test_checkpoint_written_only_on_improvement() {
        let tmp     = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::with_clock(tmp.path(), fixed_clock);
        let session = CountingSession { saves: Cell::new(0) };
        let sched   = LinearScheduler::new(1e-3, 0, 10);

        let first = manager
            .maybe_checkpoint(&eval_with_f1(0.6), BestScoreTracker::new(), &session, &sched, 1, "m")
            .unwrap();
        assert!(first.saved.is_some());
        assert_eq!(first.tracker.best_score(), 0.6);

        // Same result twice: never a second write
        for _ in 0..2 {
            let again = manager
                .maybe_checkpoint(&eval_with_f1(0.6), first.tracker, &session, &sched, 2, "m")
                .unwrap();
            assert!(again.saved.is_none());
            assert_eq!(again.tracker, first.tracker);
        }
        assert_eq!(session.saves.get(), 1);

        let bundle = first.saved.unwrap();
        assert!(bundle.join("model.bin").exists());
        let json       = fs::read_to_string(bundle.join(SCHEDULER_FILE)).unwrap();
        let sched_back: LinearScheduler = serde_json::from_str(&json).unwrap();
        assert_eq!(sched_back, sched);
        assert_eq!(
            bundle.file_name().unwrap().to_str().unwrap(),
            "m_10_19_12_30_EPOCH_1_F1_0.6.pth"
        );
    }
}
