// ============================================================
// Layer 5 - Inferencer
// ============================================================
// Scores unlabelled batches and puts the score rows back into
// the order the texts were given in.
//
// The batcher sorts texts by length, so batch order is NOT input
// order. Each batch carries the input index of every row; this
// loop writes row r of a batch to slot indices[r]:
//
//   batches:  [idx 2, idx 0] [idx 1]
//   scores:   [s2,    s0   ] [s1   ]
//   output:   [s0, s1, s2]

use crate::domain::batch::TextBatch;
use crate::domain::error::{EngineError, EngineResult};
use crate::domain::traits::InferenceModel;
use crate::infra::metrics::argmax;
use crate::infra::progress::ProgressReporter;

pub const PREDICT_PROGRESS_UPDATES: usize = 10;

/// Class-score rows for `num_examples` inputs, in input order
pub fn predict<M: InferenceModel>(
    model:        &M,
    batches:      &[TextBatch],
    num_examples: usize,
) -> EngineResult<Vec<Vec<f32>>> {
    tracing::info!("Predicting labels for {} sentences...", num_examples);

    let progress = ProgressReporter::new("predict", batches.len(), PREDICT_PROGRESS_UPDATES);
    let mut slots: Vec<Option<Vec<f32>>> = vec![None; num_examples];

    for (step, batch) in batches.iter().enumerate() {
        progress.tick(step);

        let scores = model.score(batch)?;
        if scores.logits.len() != batch.len() {
            return Err(EngineError::compute(format!(
                "model returned {} score rows for a batch of {}",
                scores.logits.len(),
                batch.len()
            )));
        }
        for (&idx, row) in batch.indices.iter().zip(scores.logits) {
            let slot = slots.get_mut(idx).ok_or_else(|| {
                EngineError::compute(format!("batch row index {idx} out of range"))
            })?;
            *slot = Some(row);
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, s)| s.ok_or_else(|| EngineError::compute(format!("input {i} was never scored"))))
        .collect()
}

/// Predicted class id per score row
pub fn predicted_classes(scores: &[Vec<f32>]) -> Vec<usize> {
    scores.iter().map(|row| argmax(row)).collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::BatchScores;

    /// Score row = [index of the row in the input]
    struct EchoIndex;

    impl InferenceModel for EchoIndex {
        fn score(&self, batch: &TextBatch) -> EngineResult<BatchScores> {
            Ok(BatchScores {
                loss:   None,
                logits: batch.indices.iter().map(|&i| vec![i as f32]).collect(),
            })
        }
    }

    fn unlabelled(indices: &[usize]) -> TextBatch {
        TextBatch {
            indices:        indices.to_vec(),
            input_ids:      vec![vec![101, 102]; indices.len()],
            attention_mask: vec![vec![1, 1]; indices.len()],
            labels:         None,
        }
    }

    #[test]
    fn test_rows_restored_to_input_order() {
        let batches = vec![unlabelled(&[2, 0]), unlabelled(&[1])];
        let scores  = predict(&EchoIndex, &batches, 3).unwrap();
        assert_eq!(scores, vec![vec![0.0], vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_missing_row_is_an_error() {
        let batches = vec![unlabelled(&[0])];
        assert!(predict(&EchoIndex, &batches, 2).is_err());
    }

    #[test]
    fn test_empty_input() {
        let scores = predict(&EchoIndex, &[], 0).unwrap();
        assert!(scores.is_empty());
        assert!(predicted_classes(&scores).is_empty());
    }

    #[test]
    fn test_predicted_classes() {
        let scores = vec![vec![0.1, 0.9], vec![0.5, 0.5]];
        assert_eq!(predicted_classes(&scores), vec![1, 0]);
    }
}
