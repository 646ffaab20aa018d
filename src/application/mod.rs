// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one goal: fit a classifier or label new texts.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The epoch loop: train, evaluate, checkpoint, report
pub mod fit_use_case;

// Data loading and tokenizer setup ahead of a fit
pub mod train_use_case;

// Batch prediction to CSV
pub mod predict_use_case;
