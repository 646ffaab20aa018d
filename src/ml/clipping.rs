// ============================================================
// Layer 5 - Global Gradient-Norm Clipping
// ============================================================
// Burn's optimizer-level clipping works per parameter tensor.
// Fine-tuning recipes clip the norm of ALL gradients taken
// together instead:
//
//   norm  = sqrt( Σ_params Σ_elements g² )
//   if norm > max_norm:  g ← g * max_norm / (norm + 1e-6)
//
// Two module visitors do this in two passes over the model's
// parameters: the first accumulates the squared sum, the second
// rescales every gradient in place inside GradientsParams.

use burn::{
    module::{Module, ModuleVisitor, ParamId},
    optim::GradientsParams,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

pub const MAX_GRAD_NORM: f64 = 1.0;
const NORM_EPS: f64 = 1e-6;

/// Multiplier for all gradients, or `None` when already within bounds
pub fn clip_coefficient(total_norm: f64, max_norm: f64) -> Option<f64> {
    if total_norm.is_finite() && total_norm > max_norm {
        Some(max_norm / (total_norm + NORM_EPS))
    } else {
        None
    }
}

struct SquaredNorm<'a> {
    grads:  &'a GradientsParams,
    sum_sq: f64,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for SquaredNorm<'_> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.get::<B::InnerBackend, D>(id) {
            self.sum_sq += grad.powf_scalar(2.0).sum().into_scalar().elem::<f64>();
        }
    }
}

struct Rescale<'a> {
    grads: &'a mut GradientsParams,
    scale: f64,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for Rescale<'_> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.remove::<B::InnerBackend, D>(id) {
            self.grads.register::<B::InnerBackend, D>(id, grad.mul_scalar(self.scale));
        }
    }
}

/// L2 norm over every gradient the module owns
pub fn global_norm<B, M>(module: &M, grads: &GradientsParams) -> f64
where
    B: AutodiffBackend,
    M: Module<B>,
{
    let mut visitor = SquaredNorm { grads, sum_sq: 0.0 };
    module.visit(&mut visitor);
    visitor.sum_sq.sqrt()
}

/// Clip in place; returns the norm measured before clipping.
pub fn clip_global_norm<B, M>(module: &M, grads: &mut GradientsParams, max_norm: f64) -> f64
where
    B: AutodiffBackend,
    M: Module<B>,
{
    let norm = global_norm::<B, M>(module, grads);
    if let Some(scale) = clip_coefficient(norm, max_norm) {
        let mut visitor = Rescale { grads, scale };
        module.visit(&mut visitor);
        tracing::trace!("Gradient norm {:.4} clipped to {:.1}", norm, max_norm);
    }
    norm
}
