// ============================================================
// Layer 5 - Linear Learning-Rate Schedule
// ============================================================
// Linear warmup followed by linear decay to zero:
//
//   step < warmup:  lr = base * step / warmup
//   otherwise:      lr = base * max(0, (total - step) / (total - warmup))
//
// The scheduler is advanced once per *batch*, right after the
// optimizer update, so the rate used for batch k is the value
// at step k. With warmup = 0 the first batch trains at the full
// base rate and the last scheduled step reaches 0.
//
// The state is plain data so it can be written into every
// checkpoint next to the model and optimizer records.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearScheduler {
    base_lr:      f64,
    warmup_steps: usize,
    total_steps:  usize,
    step:         usize,
}

impl LinearScheduler {
    pub fn new(base_lr: f64, warmup_steps: usize, total_steps: usize) -> Self {
        Self { base_lr, warmup_steps, total_steps, step: 0 }
    }

    /// Learning-rate multiplier at an arbitrary step
    pub fn factor_at(&self, step: usize) -> f64 {
        if step < self.warmup_steps {
            return step as f64 / self.warmup_steps.max(1) as f64;
        }
        let decay_span = self.total_steps.saturating_sub(self.warmup_steps).max(1);
        let left       = self.total_steps.saturating_sub(step);
        (left as f64 / decay_span as f64).max(0.0)
    }

    /// Learning rate for the next optimizer update
    pub fn current_lr(&self) -> f64 {
        self.base_lr * self.factor_at(self.step)
    }

    /// Advance by one batch
    pub fn step(&mut self) {
        self.step += 1;
    }

    pub fn steps_taken(&self) -> usize {
        self.step
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }
}
