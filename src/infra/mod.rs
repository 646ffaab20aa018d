// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by the application layer:
//
//   checkpoint.rs      best-F1 tracking and checkpoint bundles
//   tokenizer_store.rs tokenizer loading, building and saving
//   metrics.rs         argmax, accuracy, classification report
//   pr_curve.rs        one-vs-rest precision-recall data
//   report.rs          every CSV artifact a run writes
//   progress.rs        elapsed time and progress lines
//   workspace.rs       results/, models_BERT/, prediction/
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Best-score selection and checkpoint persistence
pub mod checkpoint;

/// Tokenizer training, saving, and loading
pub mod tokenizer_store;

/// Classification metrics
pub mod metrics;

/// Precision-recall curve data
pub mod pr_curve;

/// CSV report writers
pub mod report;

/// Progress reporting
pub mod progress;

/// Output directory layout
pub mod workspace;
