// ============================================================
// Layer 5 - ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn framework specific code.
// No other layer imports from burn directly, only this one.
//
// Why isolate Burn code here?
//   - If Burn's API changes, we only update this layer
//   - The epoch loop, evaluation and checkpoint policy are
//     testable without a GPU through the Layer 3 traits
//
// What's in this layer:
//
//   model.rs      - Transformer encoder + classification head
//   session.rs    - Model, AdamW and device behind the
//                   ClassifierSession / InferenceModel traits
//   clipping.rs   - Global gradient-norm clipping
//   scheduler.rs  - Linear learning-rate schedule
//   trainer.rs    - Training Step Executor (one epoch)
//   evaluator.rs  - Evaluation Step Executor
//   inferencer.rs - Unlabelled scoring in input order
//
// Only model.rs, session.rs and clipping.rs name Burn types; the
// executors work on any session through the traits.
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Devlin et al. (2019) BERT

pub mod model;

pub mod session;

pub mod clipping;

pub mod scheduler;

/// One training epoch: forward, backward, clip, step
pub mod trainer;

/// Held-out evaluation with weighted metrics
pub mod evaluator;

pub mod inferencer;
