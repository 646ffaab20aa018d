// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that define what the
// fine-tuning engine works with.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only data, invariants and the traits other layers implement
//
// The engine (Layer 5) and the orchestrator (Layer 2) talk to
// the model only through the traits in `traits.rs`, so every
// training/evaluation policy can be unit tested without a GPU.

/// Error taxonomy shared by every layer below the CLI
pub mod error;

/// Immutable hyperparameter snapshot for one fit call
pub mod config;

/// Texts + encoded integer labels loaded from CSV
pub mod dataset;

/// One padded batch of token ids, masks and labels
pub mod batch;

/// Per-epoch and per-evaluation result records
pub mod records;

/// Compute and batching collaborators
pub mod traits;
