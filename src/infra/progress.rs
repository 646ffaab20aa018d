// ============================================================
// Layer 6 - Progress Reporter
// ============================================================
// Makes long fine-tuning runs observable:
//
//   format_duration        - seconds → "H:MM:SS"
//   choose_update_interval - how many steps between progress
//                            lines so roughly N lines get printed
//   ProgressReporter       - logs elapsed time and an estimate of
//                            the time remaining
//
// Reporting is a pure side channel. Nothing here feeds back into
// training, so removing every progress line leaves the results
// unchanged.

use std::time::{Duration, Instant};

/// Render a number of seconds as `H:MM:SS`.
///
/// Rounds to the nearest second; negative input is clamped to 0.
/// Hours are not wrapped into days.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    let hours   = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs    = total % 60;
    format!("{hours}:{minutes:02}:{secs:02}")
}

pub fn format_elapsed(duration: Duration) -> String {
    format_duration(duration.as_secs_f64())
}

/// Pick a step interval so that about `desired_updates` progress
/// lines appear over `total_steps` steps.
///
/// The exact interval is rounded to two significant digits of
/// `total_steps` (1,234 steps round the interval to the nearest 100)
/// but never to a unit coarser than the interval itself, so the
/// printed count stays within about 2x of the request.
/// Always at least 1.
pub fn choose_update_interval(total_steps: usize, desired_updates: usize) -> usize {
    if desired_updates == 0 || total_steps <= desired_updates {
        return 1;
    }
    let exact = total_steps as f64 / desired_updates as f64;

    let total_digits    = total_steps.to_string().len() as i32;
    let total_unit_exp  = total_digits - 2;
    let interval_exp    = exact.log10().floor() as i32;
    let unit = 10f64.powi(total_unit_exp.min(interval_exp));

    let rounded = ((exact / unit).round() * unit) as usize;
    rounded.max(1)
}

/// Tracks one pass over `total` steps and logs progress lines.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    label:    &'static str,
    total:    usize,
    interval: usize,
    started:  Instant,
}

impl ProgressReporter {
    pub fn new(label: &'static str, total: usize, desired_updates: usize) -> Self {
        Self::with_interval(label, total, choose_update_interval(total, desired_updates))
    }

    pub fn with_interval(label: &'static str, total: usize, interval: usize) -> Self {
        Self { label, total, interval: interval.max(1), started: Instant::now() }
    }

    /// Time since the reporter was created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Whether `step` (0-indexed) gets a progress line
    pub fn should_report(&self, step: usize) -> bool {
        step != 0 && step % self.interval == 0
    }

    /// Log a progress line for `step` when it falls on the interval
    pub fn tick(&self, step: usize) {
        if !self.should_report(step) {
            return;
        }
        let elapsed   = self.started.elapsed().as_secs_f64();
        let remaining = remaining_seconds(elapsed, step, self.total);
        tracing::info!(
            "  [{}] Batch {:>7} of {:>7}.    Elapsed: {}.  Remaining: {}.",
            self.label,
            step,
            self.total,
            format_duration(elapsed),
            format_duration(remaining),
        );
    }
}

/// Linear extrapolation: `elapsed / step * (total - step)`
pub fn remaining_seconds(elapsed: f64, step: usize, total: usize) -> f64 {
    if step == 0 {
        return 0.0;
    }
    elapsed / step as f64 * total.saturating_sub(step) as f64
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_examples() {
        assert_eq!(format_duration(0.0), "0:00:00");
        assert_eq!(format_duration(3661.0), "1:01:01");
        assert_eq!(format_duration(59.6), "0:01:00");
        assert_eq!(format_duration(90_000.0), "25:00:00");
    }

    #[test]
    fn test_format_duration_clamps_negative() {
        assert_eq!(format_duration(-12.0), "0:00:00");
        assert_eq!(format_duration(f64::NAN), "0:00:00");
    }

    #[test]
    fn test_interval_is_one_for_short_runs() {
        assert_eq!(choose_update_interval(3, 10), 1);
        assert_eq!(choose_update_interval(10, 10), 1);
        assert_eq!(choose_update_interval(0, 5), 1);
    }

    #[test]
    fn test_interval_rounds_to_leading_digits() {
        assert_eq!(choose_update_interval(1000, 5), 200);
        assert_eq!(choose_update_interval(1234, 10), 100);
        // Never rounds coarser than the interval's own magnitude
        assert_eq!(choose_update_interval(9999, 1999), 5);
        assert_eq!(choose_update_interval(15, 5), 3);
    }

    #[test]
    fn test_update_count_stays_near_request() {
        for total in 1..3000usize {
            for desired in [3usize, 5, 10, 37, 100] {
                let interval = choose_update_interval(total, desired);
                assert!(interval >= 1);
                let reports = (0..total)
                    .filter(|s| *s != 0 && s % interval == 0)
                    .count();
                let upper = 2 * desired + 1;
                assert!(
                    reports <= upper,
                    "total={total} desired={desired} interval={interval} reports={reports}"
                );
                if total >= 2 * desired {
                    assert!(reports * 3 >= desired, "too few reports for total={total}");
                }
            }
        }
    }

    #[test]
    fn test_remaining_extrapolates_linearly() {
        assert_eq!(remaining_seconds(10.0, 5, 20), 30.0);
        assert_eq!(remaining_seconds(10.0, 0, 20), 0.0);
        assert_eq!(remaining_seconds(10.0, 20, 20), 0.0);
    }

    #[test]
    fn test_reporter_skips_step_zero() {
        let r = ProgressReporter::with_interval("train", 10, 3);
        let reported: Vec<usize> = (0..10).filter(|&s| r.should_report(s)).collect();
        assert_eq!(reported, vec![3, 6, 9]);
    }
}
