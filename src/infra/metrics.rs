// ============================================================
// Layer 6 - Classification Metrics
// ============================================================
// Scores a list of predicted class ids against the true ids.
//
// Metrics reported per evaluation:
//   - accuracy:  exact-match rate
//   - precision, recall, F1: computed per class, then averaged
//     with each class weighted by its support (its count in the
//     true labels). Weighted and macro averages differ whenever
//     the classes are unbalanced, and model selection uses the
//     weighted F1, so the weighting matters.
//
// Classes considered: the sorted union of ids seen in the true
// labels and in the predictions. A class that was never predicted
// has precision 0 (instead of 0/0), and likewise for recall.
//
// Example report (printed after each evaluation):
//
//                 precision    recall  f1-score   support
//              0     0.8000    0.6667    0.7273         6
//              1     0.6000    0.7500    0.6667         4
//       accuracy                         0.7000        10
//      macro avg     0.7000    0.7083    0.6970        10
//   weighted avg     0.7200    0.7000    0.7030        10

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Index of the largest score; ties go to the lowest index.
/// NaN counts as the largest value, so the first NaN wins.
/// Returns 0 for an empty row.
pub fn argmax(scores: &[f32]) -> usize {
    let mut best_idx = 0;
    let mut best     = f32::NEG_INFINITY;
    for (i, &s) in scores.iter().enumerate() {
        if s.is_nan() {
            return i;
        }
        if s > best {
            best     = s;
            best_idx = i;
        }
    }
    best_idx
}

/// Fraction of positions where `pred == truth`; 0 for empty input
pub fn accuracy(truth: &[usize], pred: &[usize]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth.iter().zip(pred).filter(|(t, p)| t == p).count();
    correct as f64 / truth.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassScore {
    pub label:     usize,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Averages {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub per_class:    Vec<ClassScore>,
    pub accuracy:     f64,
    pub macro_avg:    Averages,
    pub weighted_avg: Averages,
    pub total:        usize,
}

impl ClassificationReport {
    pub fn compute(truth: &[usize], pred: &[usize]) -> Self {
        debug_assert_eq!(truth.len(), pred.len(), "labels and predictions must align");

        let labels: BTreeSet<usize> = truth.iter().chain(pred).copied().collect();
        let mut zero_division = false;

        let per_class: Vec<ClassScore> = labels
            .iter()
            .map(|&label| {
                let mut tp = 0usize;
                let mut fp = 0usize;
                let mut fn_ = 0usize;
                for (&t, &p) in truth.iter().zip(pred) {
                    match (t == label, p == label) {
                        (true, true)  => tp  += 1,
                        (false, true) => fp  += 1,
                        (true, false) => fn_ += 1,
                        _ => {}
                    }
                }
                let precision = ratio(tp, tp + fp, &mut zero_division);
                let recall    = ratio(tp, tp + fn_, &mut zero_division);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassScore { label, precision, recall, f1, support: tp + fn_ }
            })
            .collect();

        if zero_division {
            tracing::warn!(
                "Some classes have no predicted or no true samples; their precision/recall is set to 0"
            );
        }

        let n_classes = per_class.len().max(1) as f64;
        let macro_avg = Averages {
            precision: per_class.iter().map(|c| c.precision).sum::<f64>() / n_classes,
            recall:    per_class.iter().map(|c| c.recall).sum::<f64>() / n_classes,
            f1:        per_class.iter().map(|c| c.f1).sum::<f64>() / n_classes,
        };

        let total = truth.len();
        let weighted_avg = if total == 0 {
            Averages::default()
        } else {
            let w = |f: fn(&ClassScore) -> f64| -> f64 {
                per_class.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total as f64
            };
            Averages {
                precision: w(|c| c.precision),
                recall:    w(|c| c.recall),
                f1:        w(|c| c.f1),
            }
        };

        Self {
            per_class,
            accuracy: accuracy(truth, pred),
            macro_avg,
            weighted_avg,
            total,
        }
    }
}

fn ratio(num: usize, den: usize, zero_division: &mut bool) -> f64 {
    if den == 0 {
        *zero_division = true;
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>10} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        for c in &self.per_class {
            writeln!(
                f,
                "{:>14} {:>10.4} {:>9.4} {:>9.4} {:>9}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f, "{:>14} {:>10} {:>9} {:>9.4} {:>9}", "accuracy", "", "", self.accuracy, self.total)?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>14} {:>10.4} {:>9.4} {:>9.4} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.total
            )?;
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_argmax_ties_pick_lowest_index() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7]), 1);
        assert_eq!(argmax(&[2.0, -1.0]), 0);
        assert_eq!(argmax(&[]), 0);
    }

    #[test]
    fn test_argmax_first_nan_wins() {
        assert_eq!(argmax(&[1.0, f32::NAN]), 1);
        assert_eq!(argmax(&[f32::NAN, 5.0, f32::NAN]), 0);
        assert_eq!(argmax(&[0.5, 9.0, f32::NAN, f32::NAN]), 2);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "labels and predictions must align")]
    fn test_misaligned_inputs_are_caught_in_debug_builds() {
        ClassificationReport::compute(&[0, 1], &[0]);
    }

    #[test]
    fn test_perfect_predictions() {
        let r = ClassificationReport::compute(&[0, 1, 2, 1], &[0, 1, 2, 1]);
        assert!(close(r.accuracy, 1.0));
        assert!(close(r.weighted_avg.f1, 1.0));
        assert_eq!(r.per_class.len(), 3);
    }

    #[test]
    fn test_weighted_differs_from_macro() {
        // class 0: support 3, class 1: support 1
        let truth = [0, 0, 0, 1];
        let pred  = [0, 0, 1, 1];
        let r = ClassificationReport::compute(&truth, &pred);

        // class 0: p = 1, r = 2/3, f1 = 0.8
        // class 1: p = 1/2, r = 1, f1 = 2/3
        assert!(close(r.per_class[0].f1, 0.8));
        assert!(close(r.per_class[1].f1, 2.0 / 3.0));
        assert!(close(r.macro_avg.f1, (0.8 + 2.0 / 3.0) / 2.0));
        assert!(close(r.weighted_avg.f1, (0.8 * 3.0 + 2.0 / 3.0) / 4.0));
        assert!(close(r.weighted_avg.precision, (1.0 * 3.0 + 0.5) / 4.0));
        assert!(close(r.weighted_avg.recall, r.accuracy));
    }

    #[test]
    fn test_predicted_only_class_has_zero_weight() {
        // class 2 never occurs in truth: it is listed but has support 0
        let r = ClassificationReport::compute(&[0, 1], &[0, 2]);
        let c2 = r.per_class.iter().find(|c| c.label == 2).unwrap();
        assert_eq!(c2.support, 0);
        assert!(close(c2.precision, 0.0));
        assert!(close(r.weighted_avg.f1, 0.5));
    }

    #[test]
    fn test_empty_input() {
        let r = ClassificationReport::compute(&[], &[]);
        assert_eq!(r.total, 0);
        assert!(close(r.accuracy, 0.0));
        assert!(close(r.weighted_avg.f1, 0.0));
    }
}
