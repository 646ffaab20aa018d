// ============================================================
// Layer 4 - Train/Test Splitter
// ============================================================
// Shuffles example indices and holds out a fraction for
// evaluation when no separate test file is given.
//
// The shuffle is seeded from the training config, so the same
// data + seed always produce the same split, and therefore the
// same evaluation set across runs being compared.
//
// Held-out size: round(n * test_size), clamped to [0, n].
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::dataset::LabeledDataset;

/// Shuffle `samples` with `seed` and split into (train, test).
pub fn split_train_test<T>(mut samples: Vec<T>, test_size: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total   = samples.len();
    let n_test  = ((total as f64) * test_size).round() as usize;
    let n_test  = n_test.min(total);
    let test    = samples.split_off(total - n_test);

    tracing::debug!(
        "Dataset split: {} training, {} test ({}% / {}%)",
        samples.len(),
        test.len(),
        (samples.len() * 100) / total.max(1),
        (test.len()    * 100) / total.max(1),
    );

    (samples, test)
}

/// Split a labelled dataset, keeping texts and labels aligned.
pub fn split_dataset(
    dataset:   &LabeledDataset,
    test_size: f64,
    seed:      u64,
) -> (LabeledDataset, LabeledDataset) {
    let indices: Vec<usize> = (0..dataset.len()).collect();
    let (train_idx, test_idx) = split_train_test(indices, test_size, seed);
    (dataset.subset(&train_idx), dataset.subset(&test_idx))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, test)     = split_train_test(items, 0.2, 42);
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(),  20);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..50).collect();
        let (train, test)     = split_train_test(items, 0.3, 7);
        let mut all: Vec<usize> = train.into_iter().chain(test).collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_train_test((0..40).collect::<Vec<usize>>(), 0.25, 123);
        let b = split_train_test((0..40).collect::<Vec<usize>>(), 0.25, 123);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_dataset() {
        let (train, test) = split_train_test(Vec::<usize>::new(), 0.2, 1);
        assert!(train.is_empty());
        assert!(test.is_empty());
    }

    #[test]
    fn test_split_dataset_keeps_pairs_together() {
        let ds = LabeledDataset {
            texts:       (0..10).map(|i| format!("text {i}")).collect(),
            labels:      (0..10).collect(),
            num_classes: 10,
            classes:     (0..10).map(|i| i.to_string()).collect(),
        };
        let (train, test) = split_dataset(&ds, 0.2, 42);
        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);
        for part in [&train, &test] {
            for (text, label) in part.texts.iter().zip(&part.labels) {
                assert_eq!(text, &format!("text {label}"));
            }
        }
    }
}
