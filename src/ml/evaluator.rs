// ============================================================
// Layer 5 - Evaluation Step Executor
// ============================================================
// Scores a held-out batch sequence with an inference-mode model
// and condenses it into one EvaluationResult.
//
//   predictions   = score rows of every batch, concatenated in
//                   batch order
//   true_labels   = labels of every batch, same order
//   derived_preds = argmax of each prediction row (lowest index
//                   wins ties)
//   avg_val_loss  = mean of per-batch mean losses
//   precision / recall / F1 are support-weighted averages
//
// The model comes from session.inference(), which runs on the
// inner (non-autodiff) backend, so no gradient graph is built.
// Given the same weights and the same batches, two calls return
// identical results.

use crate::domain::batch::TextBatch;
use crate::domain::error::{EngineError, EngineResult};
use crate::domain::records::EvaluationResult;
use crate::domain::traits::InferenceModel;
use crate::infra::metrics::{argmax, ClassificationReport};
use crate::infra::progress::ProgressReporter;

/// Desired number of progress lines per evaluation pass
pub const EVAL_PROGRESS_UPDATES: usize = 10;

pub fn evaluate<M: InferenceModel>(model: &M, batches: &[TextBatch]) -> EngineResult<EvaluationResult> {
    let num_examples: usize = batches.iter().map(TextBatch::len).sum();
    tracing::info!("Predicting labels for {} test sentences...", num_examples);

    let progress = ProgressReporter::new("eval", batches.len(), EVAL_PROGRESS_UPDATES);

    let mut total_loss  = 0.0f64;
    let mut predictions = Vec::with_capacity(num_examples);
    let mut true_labels = Vec::with_capacity(num_examples);

    for (step, batch) in batches.iter().enumerate() {
        progress.tick(step);

        let labels = batch
            .labels
            .as_ref()
            .ok_or_else(|| EngineError::compute("evaluation batch has no labels"))?;
        let scores = model.score(batch)?;
        let loss = scores
            .loss
            .ok_or_else(|| EngineError::compute("model returned no loss for a labelled batch"))?;
        if scores.logits.len() != batch.len() {
            return Err(EngineError::compute(format!(
                "model returned {} score rows for a batch of {}",
                scores.logits.len(),
                batch.len()
            )));
        }

        total_loss += loss;
        predictions.extend(scores.logits);
        true_labels.extend_from_slice(labels);
    }

    let avg_val_loss = if batches.is_empty() {
        f64::NAN
    } else {
        total_loss / batches.len() as f64
    };

    let derived_preds: Vec<usize> = predictions.iter().map(|row| argmax(row)).collect();
    let report = ClassificationReport::compute(&true_labels, &derived_preds);

    tracing::info!("  Validation loss: {:.4}", avg_val_loss);
    tracing::info!(
        "  Accuracy: {:.4}  Precision: {:.4}  Recall: {:.4}  F1: {:.4}",
        report.accuracy,
        report.weighted_avg.precision,
        report.weighted_avg.recall,
        report.weighted_avg.f1
    );

    Ok(EvaluationResult {
        avg_val_loss,
        predictions,
        true_labels,
        derived_preds,
        accuracy:  report.accuracy,
        precision: report.weighted_avg.precision,
        recall:    report.weighted_avg.recall,
        f1:        report.weighted_avg.f1,
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::BatchScores;

    /// Scores class `input_ids[row][1] % 3` highest; loss = batch length
    struct TokenVote;

    impl InferenceModel for TokenVote {
        fn score(&self, batch: &TextBatch) -> EngineResult<BatchScores> {
            let logits = batch
                .input_ids
                .iter()
                .map(|row| {
                    let mut s = vec![0.0f32; 3];
                    s[(row[1] % 3) as usize] = 1.0;
                    s
                })
                .collect();
            Ok(BatchScores { loss: Some(batch.len() as f64), logits })
        }
    }

    fn batch(tokens: &[u32], labels: &[usize], first_index: usize) -> TextBatch {
        TextBatch {
            indices:        (first_index..first_index + tokens.len()).collect(),
            input_ids:      tokens.iter().map(|&t| vec![101, t, 102]).collect(),
            attention_mask: vec![vec![1, 1, 1]; tokens.len()],
            labels:         Some(labels.to_vec()),
        }
    }

    fn uneven_batches() -> Vec<TextBatch> {
        // 7 examples in batches of 3, 3, 1
        vec![
            batch(&[0, 1, 2], &[0, 1, 2], 0),
            batch(&[0, 1, 1], &[0, 1, 2], 3),
            batch(&[2], &[2], 6),
        ]
    }

    #[test]
    fn test_every_example_scored_once() {
        let r = evaluate(&TokenVote, &uneven_batches()).unwrap();
        assert_eq!(r.predictions.len(), 7);
        assert_eq!(r.true_labels.len(), 7);
        assert_eq!(r.derived_preds.len(), 7);
        assert_eq!(r.true_labels, vec![0, 1, 2, 0, 1, 2, 2]);
        assert_eq!(r.derived_preds, vec![0, 1, 2, 0, 1, 1, 2]);
    }

    #[test]
    fn test_loss_and_weighted_metrics() {
        let r = evaluate(&TokenVote, &uneven_batches()).unwrap();
        // Mean of batch losses 3, 3, 1
        assert!((r.avg_val_loss - 7.0 / 3.0).abs() < 1e-12);
        assert!((r.accuracy - 6.0 / 7.0).abs() < 1e-12);

        // class 1: p = 2/3, r = 1; class 2: p = 1, r = 2/3; class 0 perfect
        let f1_1 = 2.0 * (2.0 / 3.0) / (2.0 / 3.0 + 1.0);
        let f1_2 = f1_1;
        let weighted = (2.0 * 1.0 + 2.0 * f1_1 + 3.0 * f1_2) / 7.0;
        assert!((r.f1 - weighted).abs() < 1e-12);
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let batches = uneven_batches();
        let a = evaluate(&TokenVote, &batches).unwrap();
        let b = evaluate(&TokenVote, &batches).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_batches_gives_nan_loss_and_zero_metrics() {
        let r = evaluate(&TokenVote, &[]).unwrap();
        assert!(r.avg_val_loss.is_nan());
        assert!(r.is_empty());
        assert_eq!(r.f1, 0.0);
        assert_eq!(r.accuracy, 0.0);
    }

    #[test]
    fn test_unlabelled_batch_rejected() {
        let mut b = batch(&[1], &[1], 0);
        b.labels = None;
        assert!(matches!(evaluate(&TokenVote, &[b]), Err(EngineError::Compute(_))));
    }
}
