//! Bayesian sampling machinery.
//!
//! - [`eval`]: parallel (log-prior, log-likelihood) evaluation pools.
//! - [`chain`]: thinned per-phase sample storage.
//! - [`ensemble`]: the affine-invariant stretch-move sampler.
//! - [`ptsampler`]: the parallel-tempering ladder on top of it.
//! - [`diagnostics`]: advisory acceptance/autocorrelation statistics.
//! - [`fitter`]: the multi-phase shrinking-ball orchestrator.

pub mod chain;
pub mod diagnostics;
pub mod ensemble;
pub mod eval;
pub mod fitter;
pub mod ptsampler;

pub use chain::Chain;
pub use diagnostics::PhaseDiagnostics;
pub use ensemble::{p_ball, EnsembleSampler};
pub use eval::{EvalPool, LogProb, LogProbFn};
pub use fitter::{ball_ratio_sequence, FitOutput, FitRunner};
pub use ptsampler::{beta_ladder, PtSampler};

use crate::error::AppError;

/// What the orchestrator needs from a sampler. Both sampler kinds advance a
/// walker ensemble per call and retain a thinned chain; the tempering
/// implementation additionally carries its ladder internally and records only
/// the coldest rung.
pub trait Sampler {
    /// Draw fresh walker positions uniformly from the prior bounds.
    fn init_from_prior(&mut self, bounds: &[(f64, f64)], pool: &EvalPool)
        -> Result<(), AppError>;

    /// Reseed all walkers in a multiplicative Gaussian ball around `center`.
    fn reseed_ball(
        &mut self,
        center: &[f64],
        ratio: f64,
        pool: &EvalPool,
    ) -> Result<(), AppError>;

    /// Advance `n_steps` raw steps, recording into the chain.
    fn run(&mut self, n_steps: usize, pool: &EvalPool) -> Result<(), AppError>;

    fn chain(&self) -> &Chain;

    fn reset_chain(&mut self);

    /// Mean stretch-move acceptance over the last `run`.
    fn acceptance_fraction(&self) -> f64;

    /// Temperature-swap acceptance over the last `run`; `None` for the
    /// single-temperature sampler.
    fn swap_acceptance(&self) -> Option<f64>;
}
