// ============================================================
// Layer 5 - Burn Classifier Session
// ============================================================
// Binds the transformer classifier to its optimizer and device
// and exposes them through the engine's collaborator traits.
//
//   BurnSession<B, O>   ClassifierSession on an autodiff backend
//                       (e.g. Autodiff<Wgpu>): one AdamW update
//                       per train_step, with global-norm clipping
//   BurnInference<B>    InferenceModel on the inner backend
//                       (e.g. Wgpu): no autodiff graph, dropout
//                       inactive
//
// Key Burn insight:
//   - Training uses Autodiff<Backend> for gradients
//   - model.valid() returns the model on the inner backend
//   - evaluation tensors must be built on that inner backend
//
// Checkpoint files written by save_state (inside the bundle
// directory the checkpoint manager created):
//   model.mpk.gz       weights (CompactRecorder)
//   optimizer.mpk.gz   AdamW moments (CompactRecorder)
//   classifier.json    ClassifierConfig, to rebuild the model

use std::path::{Path, PathBuf};

use burn::{
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    record::{CompactRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};

use crate::domain::batch::TextBatch;
use crate::domain::error::{EngineError, EngineResult};
use crate::domain::traits::{BatchScores, ClassifierSession, InferenceModel};
use crate::ml::clipping::{clip_global_norm, MAX_GRAD_NORM};
use crate::ml::model::{ClassifierConfig, TransformerClassifier};

pub const MODEL_FILE:     &str = "model";
pub const OPTIMIZER_FILE: &str = "optimizer";
pub const CONFIG_FILE:    &str = "classifier.json";

/// AdamW as used for fine-tuning: configurable epsilon, no weight decay
pub fn adamw<B: AutodiffBackend>(epsilon: f64) -> impl Optimizer<TransformerClassifier<B>, B> {
    AdamWConfig::new()
        .with_epsilon(epsilon as f32)
        .with_weight_decay(0.0)
        .init::<B, TransformerClassifier<B>>()
}

// ─── Tensor helpers ───────────────────────────────────────────────────────────
fn batch_inputs<B: Backend>(
    batch:  &TextBatch,
    device: &B::Device,
) -> (Tensor<B, 2, Int>, Tensor<B, 2, Int>) {
    let shape = [batch.len(), batch.seq_len()];
    let input_ids = Tensor::<B, 1, Int>::from_ints(batch.flat_input_ids().as_slice(), device)
        .reshape(shape);
    let attention_mask = Tensor::<B, 1, Int>::from_ints(batch.flat_attention_mask().as_slice(), device)
        .reshape(shape);
    (input_ids, attention_mask)
}

fn batch_targets<B: Backend>(labels: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
    let flat: Vec<i32> = labels.iter().map(|&l| l as i32).collect();
    Tensor::<B, 1, Int>::from_ints(flat.as_slice(), device)
}

fn logits_to_rows<B: Backend>(logits: Tensor<B, 2>) -> EngineResult<Vec<Vec<f32>>> {
    let [_, num_classes] = logits.dims();
    let flat = logits
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| EngineError::compute(format!("cannot read logits: {e:?}")))?;
    Ok(flat.chunks(num_classes.max(1)).map(<[f32]>::to_vec).collect())
}

fn record_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(name)
}

// ─── BurnSession ──────────────────────────────────────────────────────────────
pub struct BurnSession<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<TransformerClassifier<B>, B>,
{
    model:     TransformerClassifier<B>,
    optimizer: O,
    config:    ClassifierConfig,
    device:    B::Device,
}

impl<B, O> BurnSession<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<TransformerClassifier<B>, B>,
{
    /// Fresh randomly initialised model
    pub fn new(config: ClassifierConfig, optimizer: O, device: B::Device) -> Self {
        let model = config.init::<B>(&device);
        tracing::info!(
            "Classifier ready: {} layers, d_model={}, {} classes",
            config.num_layers,
            config.d_model,
            config.num_classes
        );
        Self { model, optimizer, config, device }
    }

    /// Replace the weights with those of an earlier checkpoint bundle.
    /// Optimizer moments are not restored.
    pub fn warm_start(mut self, bundle: &Path) -> EngineResult<Self> {
        let record = CompactRecorder::new()
            .load(record_path(bundle, MODEL_FILE), &self.device)
            .map_err(|e| EngineError::checkpoint(format!("{}: {e}", bundle.display())))?;
        self.model = self.model.load_record(record);
        tracing::info!("Warm start from '{}'", bundle.display());
        Ok(self)
    }
}

impl<B, O> ClassifierSession for BurnSession<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<TransformerClassifier<B>, B>,
{
    type Inference = BurnInference<B::InnerBackend>;

    fn train_step(&mut self, batch: &TextBatch, learning_rate: f64) -> EngineResult<f64> {
        let labels = batch
            .labels
            .as_deref()
            .ok_or_else(|| EngineError::compute("training batch has no labels"))?;

        let (input_ids, attention_mask) = batch_inputs::<B>(batch, &self.device);
        let targets = batch_targets::<B>(labels, &self.device);

        let output   = self.model.forward_classification(input_ids, attention_mask, targets);
        let loss_val = output.loss.clone().into_scalar().elem::<f64>();

        // Backward pass, clip, AdamW update
        let grads = output.loss.backward();
        let mut grads = GradientsParams::from_grads(grads, &self.model);
        clip_global_norm::<B, _>(&self.model, &mut grads, MAX_GRAD_NORM);
        self.model = self.optimizer.step(learning_rate, self.model.clone(), grads);

        Ok(loss_val)
    }

    fn inference(&self) -> BurnInference<B::InnerBackend> {
        BurnInference { model: self.model.valid(), device: self.device.clone() }
    }

    fn save_state(&self, dir: &Path) -> EngineResult<()> {
        let recorder = CompactRecorder::new();
        recorder
            .record(self.model.clone().into_record(), record_path(dir, MODEL_FILE))
            .map_err(EngineError::checkpoint)?;
        recorder
            .record(self.optimizer.to_record(), record_path(dir, OPTIMIZER_FILE))
            .map_err(EngineError::checkpoint)?;

        let cfg_path = dir.join(CONFIG_FILE);
        self.config.save(&cfg_path).map_err(|e| EngineError::io(&cfg_path, e))?;
        Ok(())
    }
}

// ─── BurnInference ────────────────────────────────────────────────────────────
pub struct BurnInference<B: Backend> {
    model:  TransformerClassifier<B>,
    device: B::Device,
}

impl<B: Backend> BurnInference<B> {
    /// Rebuild the model from a checkpoint bundle (weights + architecture)
    pub fn from_checkpoint(bundle: &Path, device: B::Device) -> EngineResult<Self> {
        let cfg_path = bundle.join(CONFIG_FILE);
        let config = ClassifierConfig::load(&cfg_path)
            .map_err(|e| EngineError::checkpoint(format!("{}: {e}", cfg_path.display())))?;

        let record = CompactRecorder::new()
            .load(record_path(bundle, MODEL_FILE), &device)
            .map_err(|e| EngineError::checkpoint(format!("{}: {e}", bundle.display())))?;
        let model = config.init::<B>(&device).load_record(record);

        tracing::info!(
            "Model loaded from '{}' ({} classes)",
            bundle.display(),
            config.num_classes
        );
        Ok(Self { model, device })
    }

    /// Longest sequence the position table covers
    pub fn max_seq_len(&self) -> usize {
        self.model.max_seq_len
    }
}

impl<B: Backend> InferenceModel for BurnInference<B> {
    fn score(&self, batch: &TextBatch) -> EngineResult<BatchScores> {
        if batch.is_empty() {
            return Ok(BatchScores { loss: None, logits: Vec::new() });
        }
        let (input_ids, attention_mask) = batch_inputs::<B>(batch, &self.device);

        let (loss, logits) = match &batch.labels {
            Some(labels) => {
                let targets = batch_targets::<B>(labels, &self.device);
                let out = self.model.forward_classification(input_ids, attention_mask, targets);
                (Some(out.loss.into_scalar().elem::<f64>()), out.logits)
            }
            None => (None, self.model.forward(input_ids, attention_mask)),
        };

        Ok(BatchScores { loss, logits: logits_to_rows(logits)? })
    }
}
