// ============================================================
// Layer 6 - Precision-Recall Curve Data
// ============================================================
// One-vs-rest precision-recall curves from the last evaluation,
// stored as numbers so they can be plotted by any tool later.
//
// For class c:
//   1. Softmax every score row; score_i = p_i(c)
//   2. Walk the examples in order of decreasing score; each
//      distinct score is a threshold
//   3. At each threshold: precision = TP / (TP + FP),
//                         recall    = TP / P
//
// Average precision (the area summary):
//   AP = Σ_n (R_n - R_{n-1}) * P_n
// over thresholds in decreasing order, with R_0 = 0.
//
// Classes with no positive example in the labels have no
// defined recall and are skipped.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrPoint {
    pub threshold: f64,
    pub precision: f64,
    pub recall:    f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrCurve {
    pub class:             usize,
    pub points:            Vec<PrPoint>,
    pub average_precision: f64,
}

/// Numerically stable softmax of one score row
pub fn softmax(row: &[f32]) -> Vec<f64> {
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = row.iter().map(|&s| (s as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Curve for one class from (score, is_positive) pairs
pub fn curve_for(class: usize, mut scored: Vec<(f64, bool)>) -> Option<PrCurve> {
    let positives = scored.iter().filter(|(_, p)| *p).count();
    if positives == 0 {
        return None;
    }
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut points = Vec::new();
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut i  = 0;
    while i < scored.len() {
        let threshold = scored[i].0;
        // Everything tied at this score crosses the threshold together
        while i < scored.len() && scored[i].0 == threshold {
            if scored[i].1 { tp += 1 } else { fp += 1 }
            i += 1;
        }
        points.push(PrPoint {
            threshold,
            precision: tp as f64 / (tp + fp) as f64,
            recall:    tp as f64 / positives as f64,
        });
    }

    let mut average_precision = 0.0;
    let mut prev_recall       = 0.0;
    for p in &points {
        average_precision += (p.recall - prev_recall) * p.precision;
        prev_recall = p.recall;
    }

    Some(PrCurve { class, points, average_precision })
}

/// One curve per class that has positives in `true_labels`
pub fn pr_curves(predictions: &[Vec<f32>], true_labels: &[usize]) -> Vec<PrCurve> {
    let probs: Vec<Vec<f64>> = predictions.iter().map(|row| softmax(row)).collect();
    let num_classes = probs.first().map(Vec::len).unwrap_or(0);

    (0..num_classes)
        .filter_map(|c| {
            let scored = probs
                .iter()
                .zip(true_labels)
                .map(|(p, &t)| (p[c], t == c))
                .collect();
            let curve = curve_for(c, scored);
            if curve.is_none() {
                tracing::warn!("Class {} has no positive examples; PR curve skipped", c);
            }
            curve
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let p = softmax(&[1.0, 2.0, 3.0]);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(p[2] > p[1] && p[1] > p[0]);
    }

    #[test]
    fn test_perfect_ranking_has_unit_ap() {
        let c = curve_for(0, vec![(0.9, true), (0.8, true), (0.1, false)]).unwrap();
        assert!((c.average_precision - 1.0).abs() < 1e-12);
        assert_eq!(c.points.last().unwrap().recall, 1.0);
    }

    #[test]
    fn test_average_precision_matches_hand_computation() {
        // Ranked: +, -, +  → P@1 = 1, P@3 = 2/3; AP = 0.5*1 + 0.5*2/3
        let c = curve_for(1, vec![(0.2, true), (0.9, true), (0.5, false)]).unwrap();
        assert!((c.average_precision - (0.5 + 1.0 / 3.0)).abs() < 1e-12);
        assert_eq!(c.points.len(), 3);
    }

    #[test]
    fn test_ties_share_one_threshold() {
        let c = curve_for(0, vec![(0.5, true), (0.5, false)]).unwrap();
        assert_eq!(c.points.len(), 1);
        assert_eq!(c.points[0].precision, 0.5);
    }

    #[test]
    fn test_class_without_positives_is_skipped() {
        let curves = pr_curves(&[vec![1.0, 0.0], vec![2.0, 0.0]], &[0, 0]);
        assert_eq!(curves.len(), 1);
        assert_eq!(curves[0].class, 0);
    }
}
