// ============================================================
// Layer 2 - TrainUseCase
// ============================================================
// Prepares everything a fit call needs, then hands over to the
// epoch orchestrator:
//
//   Step 1: Acquire output directories   (Layer 6 - infra)
//   Step 2: Load the labelled CSV        (Layer 4 - data)
//   Step 3: Held-out set: second CSV or
//           seeded split of the first    (Layer 4 - data)
//   Step 4: Resolve the tokenizer        (Layer 6 - infra)
//   Step 5: Build the smart batcher      (Layer 4 - data)
//   Step 6: Build the session            (Layer 5 - ml, via factory)
//   Step 7: Run the fit                  (Layer 2 - FitUseCase)
//
// The session is built through a caller-supplied factory so the
// choice of Burn backend (GPU or CPU) stays in the CLI layer.
//
// Reference: Rust Book §13 (Iterators and Closures)

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::application::fit_use_case::{FitOutcome, FitUseCase};
use crate::data::{
    batcher::SmartBatcher,
    loader::{load_dataset, unify_labels},
    splitter::split_dataset,
};
use crate::domain::config::TrainingConfig;
use crate::domain::error::EngineResult;
use crate::domain::traits::ClassifierSession;
use crate::infra::{
    tokenizer_store::{embedding_rows, TokenizerStore},
    workspace::OutputDirs,
};

// ─── Training Request ─────────────────────────────────────────────────────────
// Everything one training run needs besides the model architecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainRequest {
    pub data:        PathBuf,
    /// Separate held-out CSV; otherwise `test_size` of `data` is held out
    pub test_data:   Option<PathBuf>,
    pub label_type:  String,
    pub model_name:  String,
    /// Pretrained tokenizer.json; otherwise one is built from the data
    pub tokenizer:   Option<PathBuf>,
    pub output_root: PathBuf,
    /// Vocabulary size when a tokenizer has to be built
    pub vocab_size:  usize,
    pub training:    TrainingConfig,
}

impl Default for TrainRequest {
    fn default() -> Self {
        Self {
            data:        PathBuf::from("data/train.csv"),
            test_data:   None,
            label_type:  "predicate".to_string(),
            model_name:  "bert-base-uncased".to_string(),
            tokenizer:   None,
            output_root: PathBuf::from("."),
            vocab_size:  30522,
            training:    TrainingConfig::default(),
        }
    }
}

/// What the session factory needs to size the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelShape {
    /// Embedding rows covering every token id
    pub vocab_rows:  usize,
    pub num_classes: usize,
    pub max_len:     usize,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    request: TrainRequest,
}

impl TrainUseCase {
    pub fn new(request: TrainRequest) -> Self {
        Self { request }
    }

    /// Execute the full training pipeline end to end
    pub fn execute<S, F>(&self, make_session: F) -> EngineResult<FitOutcome<S>>
    where
        S: ClassifierSession,
        F: FnOnce(ModelShape) -> EngineResult<S>,
    {
        let req = &self.request;
        req.training.validate()?;

        // ── Step 1: Output directories ────────────────────────────────────────
        let dirs = OutputDirs::acquire(&req.output_root)?;

        // ── Step 2: Load the labelled data ────────────────────────────────────
        let full = load_dataset(&req.data, &req.label_type)?;

        // ── Step 3: Held-out set ──────────────────────────────────────────────
        let (train, test) = match &req.test_data {
            Some(path) => unify_labels(full, load_dataset(path, &req.label_type)?),
            None       => split_dataset(&full, req.training.test_size, req.training.seed),
        };
        tracing::info!(
            "Split: {} train, {} test, {} classes",
            train.len(),
            test.len(),
            train.num_classes
        );

        // ── Step 4: Tokenizer ─────────────────────────────────────────────────
        let tok_store = TokenizerStore::new(&dirs.models);
        let tokenizer = tok_store.resolve(
            req.tokenizer.as_deref(),
            &req.model_name,
            &train.texts,
            req.vocab_size,
        )?;
        let vocab_rows = embedding_rows(&tokenizer);

        // ── Step 5: Batcher ───────────────────────────────────────────────────
        let batcher = SmartBatcher::new(tokenizer, req.training.max_len);

        // ── Step 6: Session ───────────────────────────────────────────────────
        let session = make_session(ModelShape {
            vocab_rows,
            num_classes: train.num_classes,
            max_len:     req.training.max_len,
        })?;

        // ── Step 7: Fit ───────────────────────────────────────────────────────
        FitUseCase::new(req.training.clone(), &req.model_name, dirs)
            .execute(session, &batcher, &train, &test)
    }
}
