// ============================================================
// Layer 2 - Predict Use Case
// ============================================================
// Labels a list of texts with a trained classifier:
//
//   1. Acquire the output directories
//   2. Batch the texts (length-sorted, no labels)
//   3. Score every batch, restore input order
//   4. argmax → predicted class id per text
//   5. Write prediction/{model_type}_{yymmdd}.csv (text,prediction)
//
// Returns the raw class-score rows. An empty text list gives an
// empty score list and a CSV holding only the header row.

use std::path::PathBuf;

use crate::domain::error::EngineResult;
use crate::domain::traits::{BatchOrder, BatchSource, InferenceModel};
use crate::infra::{report, workspace::OutputDirs};
use crate::ml::inferencer::{predict, predicted_classes};

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionOutcome {
    /// Class scores per text, in input order
    pub scores:   Vec<Vec<f32>>,
    pub labels:   Vec<usize>,
    pub csv_path: PathBuf,
}

pub struct PredictUseCase {
    model_type:  String,
    batch_size:  usize,
    output_root: PathBuf,
}

impl PredictUseCase {
    pub fn new(model_type: impl Into<String>, batch_size: usize, output_root: impl Into<PathBuf>) -> Self {
        Self {
            model_type:  model_type.into(),
            batch_size,
            output_root: output_root.into(),
        }
    }

    pub fn execute<M, B>(&self, model: &M, batcher: &B, texts: &[String]) -> EngineResult<PredictionOutcome>
    where
        M: InferenceModel,
        B: BatchSource,
    {
        let dirs = OutputDirs::acquire(&self.output_root)?;

        let batches = batcher.make_batches(texts, None, self.batch_size, BatchOrder::Sequential)?;
        let scores  = predict(model, &batches, texts.len())?;
        let labels  = predicted_classes(&scores);

        let csv_path = report::prediction_path(&dirs.prediction, &self.model_type);
        let label_strings: Vec<String> = labels.iter().map(usize::to_string).collect();
        report::write_predictions(&csv_path, texts, &label_strings)?;
        tracing::info!("Predictions for {} texts saved to '{}'", texts.len(), csv_path.display());

        Ok(PredictionOutcome { scores, labels, csv_path })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::assemble_batches;
    use crate::domain::batch::TextBatch;
    use crate::domain::traits::BatchScores;

    /// Token = number of words
    struct WordCountBatcher;

    impl BatchSource for WordCountBatcher {
        fn make_batches(
            &self,
            texts:      &[String],
            labels:     Option<&[usize]>,
            batch_size: usize,
            order:      BatchOrder,
        ) -> EngineResult<Vec<TextBatch>> {
            let encoded = texts
                .iter()
                .map(|t| {
                    let mut ids = vec![101];
                    ids.extend(std::iter::repeat(200).take(t.split_whitespace().count()));
                    ids.push(102);
                    ids
                })
                .collect();
            assemble_batches(encoded, labels, batch_size, order, 0)
        }
    }

    /// Class 1 for rows longer than 3 tokens, else class 0
    struct LongIsPositive;

    impl InferenceModel for LongIsPositive {
        fn score(&self, batch: &TextBatch) -> EngineResult<BatchScores> {
            let logits = batch
                .attention_mask
                .iter()
                .map(|m| {
                    let len = m.iter().sum::<u32>();
                    if len > 3 { vec![0.0, 1.0] } else { vec![1.0, 0.0] }
                })
                .collect();
            Ok(BatchScores { loss: None, logits })
        }
    }

    #[test]
    fn test_predictions_follow_input_order() {
        let tmp   = tempfile::tempdir().unwrap();
        let uc    = PredictUseCase::new("bert", 2, tmp.path());
        let texts = vec![
            "a much longer sentence here".to_string(),
            "hi".to_string(),
            "two words".to_string(),
        ];
        let out = uc.execute(&LongIsPositive, &WordCountBatcher, &texts).unwrap();

        assert_eq!(out.labels, vec![1, 0, 1]);
        assert_eq!(out.scores.len(), 3);
        let csv = std::fs::read_to_string(&out.csv_path).unwrap();
        assert_eq!(
            csv,
            "text,prediction\na much longer sentence here,1\nhi,0\ntwo words,1\n"
        );
        assert!(out.csv_path.starts_with(tmp.path().join("prediction")));
    }

    #[test]
    fn test_empty_input_writes_header_only() {
        let tmp = tempfile::tempdir().unwrap();
        let uc  = PredictUseCase::new("bert", 16, tmp.path());
        let out = uc.execute(&LongIsPositive, &WordCountBatcher, &[]).unwrap();

        assert!(out.scores.is_empty());
        assert!(out.labels.is_empty());
        assert_eq!(std::fs::read_to_string(&out.csv_path).unwrap(), "text,prediction\n");
    }
}
