// ============================================================
// Layer 2 - Fit Use Case (Epoch Orchestrator)
// ============================================================
// Drives one fit call through its phases:
//
//   Idle ─► Configuring ─► Training(1) ─┬─► Evaluating(1) ─┐
//                               ▲        │                  │
//                               │        └──────────────────┤
//                               └── Training(e+1) ◄─────────┤  (e < epochs)
//                                                           ▼
//                                                       Reporting ─► Idle
//
//   Configuring  validate config, compute total scheduler steps
//                (batches_per_epoch × epochs), build the LR
//                schedule, make the evaluation batches once
//   Training     one full epoch; always runs, no early stopping
//   Evaluating   only when epoch % eval_interval == 0; scores the
//                held-out set, then offers the result to the
//                checkpoint manager
//   Reporting    total wall-clock time, classification report and
//                PR curve data from the LAST evaluation
//
// All mutable run state (optimization state, best score, last
// evaluation, epoch records) lives in this call's locals and is
// handed back in FitOutcome; nothing survives between calls.

use std::{path::PathBuf, time::Instant};

use crate::domain::config::TrainingConfig;
use crate::domain::dataset::LabeledDataset;
use crate::domain::error::EngineResult;
use crate::domain::records::{EpochRecord, EvaluationResult};
use crate::domain::traits::{BatchOrder, BatchSource, ClassifierSession};
use crate::infra::{
    checkpoint::{BestScoreTracker, CheckpointManager},
    metrics::ClassificationReport,
    pr_curve::pr_curves,
    progress::{choose_update_interval, format_elapsed},
    report::{self, EpochStats, EvalSummary, StatsLogger},
    workspace::OutputDirs,
};
use crate::ml::{
    evaluator::evaluate,
    scheduler::LinearScheduler,
    trainer::{train_epoch, OptimizationState},
};

/// Desired number of progress lines per training epoch
pub const TRAIN_PROGRESS_UPDATES: usize = 5;

// ─── Phases ───────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Configuring,
    Training { epoch: usize },
    Evaluating { epoch: usize },
    Reporting,
}

/// Phase that follows `phase` under `cfg`. Pure.
pub fn next_phase(phase: Phase, cfg: &TrainingConfig) -> Phase {
    let after_epoch = |epoch: usize| {
        if epoch < cfg.epochs {
            Phase::Training { epoch: epoch + 1 }
        } else {
            Phase::Reporting
        }
    };
    match phase {
        Phase::Idle                       => Phase::Configuring,
        Phase::Configuring                => Phase::Training { epoch: 1 },
        Phase::Training { epoch } if cfg.evaluates_at(epoch) => Phase::Evaluating { epoch },
        Phase::Training { epoch }         => after_epoch(epoch),
        Phase::Evaluating { epoch }       => after_epoch(epoch),
        Phase::Reporting                  => Phase::Idle,
    }
}

/// Seed for the training batch order of one epoch
pub fn epoch_seed(seed: u64, epoch: usize) -> u64 {
    seed ^ (epoch as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

// ─── Outcome ──────────────────────────────────────────────────────────────────
pub struct FitOutcome<S: ClassifierSession> {
    pub state:           OptimizationState<S>,
    pub epochs:          Vec<EpochRecord>,
    pub last_evaluation: Option<EvaluationResult>,
    pub best:            BestScoreTracker,
    /// Bundle directory of every improvement, oldest first
    pub checkpoints:     Vec<PathBuf>,
    pub report_path:     Option<PathBuf>,
    /// Every phase entered, in order
    pub phases:          Vec<Phase>,
}

// ─── FitUseCase ───────────────────────────────────────────────────────────────
pub struct FitUseCase {
    config:     TrainingConfig,
    model_name: String,
    dirs:       OutputDirs,
    checkpoint: CheckpointManager,
}

impl FitUseCase {
    /// `dirs` must already be acquired
    pub fn new(config: TrainingConfig, model_name: impl Into<String>, dirs: OutputDirs) -> Self {
        let checkpoint = CheckpointManager::new(&dirs.models);
        Self { config, model_name: model_name.into(), dirs, checkpoint }
    }

    /// Replace the checkpoint manager (fixed clock in tests)
    #[cfg(test)]
    pub fn with_checkpoint_manager(mut self, checkpoint: CheckpointManager) -> Self {
        self.checkpoint = checkpoint;
        self
    }

    /// Train for every configured epoch and write the reports.
    pub fn execute<S, B>(
        &self,
        session: S,
        batcher: &B,
        train:   &LabeledDataset,
        test:    &LabeledDataset,
    ) -> EngineResult<FitOutcome<S>>
    where
        S: ClassifierSession,
        B: BatchSource,
    {
        let cfg        = &self.config;
        let started    = Instant::now();
        let mut phases = vec![Phase::Configuring];

        // ── Configuring ───────────────────────────────────────────────────────
        cfg.validate()?;
        let batches_per_epoch = cfg.batches_per_epoch(train.len());
        let total_steps       = cfg.total_steps(train.len());
        let update_interval   = choose_update_interval(batches_per_epoch, TRAIN_PROGRESS_UPDATES);
        let scheduler = LinearScheduler::new(cfg.learning_rate, 0, total_steps);
        let mut state = OptimizationState::new(session, scheduler);

        // Same order every time, so repeated evaluations are comparable
        let eval_batches = batcher.make_batches(
            &test.texts,
            Some(&test.labels),
            cfg.batch_size,
            BatchOrder::Sequential,
        )?;

        let stats = StatsLogger::create(report::training_stats_path(
            &self.dirs.results,
            &self.model_name,
            cfg.epochs,
        ))?;

        tracing::info!(
            "Fitting '{}': {} train / {} test examples, {} epochs, {} scheduler steps",
            self.model_name,
            train.len(),
            test.len(),
            cfg.epochs,
            total_steps
        );

        let mut epochs          = Vec::with_capacity(cfg.epochs);
        let mut best            = BestScoreTracker::new();
        let mut last_evaluation = None;
        let mut checkpoints     = Vec::new();
        let mut pending: Option<EpochRecord> = None;

        // ── Training ⇄ Evaluating ─────────────────────────────────────────────
        let mut phase = next_phase(Phase::Configuring, cfg);
        while phase != Phase::Reporting {
            phases.push(phase);
            match phase {
                Phase::Training { epoch } => {
                    tracing::info!("======== Epoch {} / {} ========", epoch, cfg.epochs);
                    let batches = batcher.make_batches(
                        &train.texts,
                        Some(&train.labels),
                        cfg.batch_size,
                        BatchOrder::Shuffled { seed: epoch_seed(cfg.seed, epoch) },
                    )?;
                    let record = train_epoch(&mut state, &batches, epoch, update_interval)?;
                    epochs.push(record.clone());

                    if cfg.evaluates_at(epoch) {
                        pending = Some(record);
                    } else {
                        stats.log(&EpochStats { record, evaluation: None })?;
                    }
                }
                Phase::Evaluating { epoch } => {
                    let model      = state.session.inference();
                    let evaluation = evaluate(&model, &eval_batches)?;

                    let outcome = self.checkpoint.maybe_checkpoint(
                        &evaluation,
                        best,
                        &state.session,
                        &state.scheduler,
                        epoch,
                        &self.model_name,
                    )?;
                    best = outcome.tracker;
                    checkpoints.extend(outcome.saved);

                    if let Some(record) = pending.take() {
                        stats.log(&EpochStats {
                            record,
                            evaluation: Some(EvalSummary::from(&evaluation)),
                        })?;
                    }
                    last_evaluation = Some(evaluation);
                }
                Phase::Idle | Phase::Configuring | Phase::Reporting => {}
            }
            phase = next_phase(phase, cfg);
        }

        // ── Reporting ─────────────────────────────────────────────────────────
        phases.push(Phase::Reporting);
        tracing::info!("Training complete!");
        tracing::info!("Total training took {} (h:mm:ss)", format_elapsed(started.elapsed()));
        tracing::debug!(
            "Scheduler stopped at step {} of {}",
            state.scheduler.steps_taken(),
            state.scheduler.total_steps()
        );

        let report_path = match &last_evaluation {
            Some(eval) => Some(self.write_reports(eval, &test.classes)?),
            None => {
                tracing::warn!("No evaluation ran; classification report not written");
                None
            }
        };

        phases.push(next_phase(Phase::Reporting, cfg));
        Ok(FitOutcome { state, epochs, last_evaluation, best, checkpoints, report_path, phases })
    }

    fn write_reports(&self, eval: &EvaluationResult, class_names: &[String]) -> EngineResult<PathBuf> {
        let epochs = self.config.epochs;

        let clf = ClassificationReport::compute(&eval.true_labels, &eval.derived_preds);
        tracing::info!("Classification report (last evaluation):\n{}", clf);
        let path = report::clf_report_path(&self.dirs.results, &self.model_name, epochs);
        report::write_classification_report(&path, &clf, class_names)?;
        tracing::info!("Classification report was saved to '{}'", path.display());

        let curves  = pr_curves(&eval.predictions, &eval.true_labels);
        let pr_path = report::pr_curve_path(&self.dirs.results, &self.model_name, epochs);
        report::write_pr_curves(&pr_path, &curves, class_names)?;

        Ok(path)
    }
}
