// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from a CSV file on disk to padded batches of
// token ids:
//
//   CSV file
//       │
//       ▼
//   loader         → reads text + answer columns, encodes labels
//       │
//       ▼
//   preprocessor   → cleans text (whitespace, encoding)
//       │
//       ▼
//   splitter       → seeded train/test split
//       │
//       ▼
//   batcher        → tokenizes, length-sorts and pads per batch
//
// Each module is responsible for exactly one step.
//
// Reference: Rust Book §13 (Iterators and Closures)

/// Loads labelled and unlabelled CSV data
pub mod loader;

/// Cleans and normalises raw text
pub mod preprocessor;

/// Shuffles and splits data into train/test sets
pub mod splitter;

/// Smart batching: tokenization, length grouping, padding
pub mod batcher;
