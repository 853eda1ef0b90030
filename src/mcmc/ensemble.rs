//! Affine-invariant ensemble sampling (Goodman & Weare stretch moves).
//!
//! The ensemble is advanced in two half-updates: each walker in the active
//! half proposes a stretch along the line to a random walker of the other
//! half, with scale `z = ((a-1)u + 1)^2 / a` and acceptance
//! `min(1, z^(d-1) exp(dlogp))`. All proposals of a half are evaluated in one
//! parallel batch.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::error::AppError;
use crate::mcmc::chain::Chain;
use crate::mcmc::eval::EvalPool;
use crate::mcmc::Sampler;

/// Stretch-move scale parameter. The emcee default.
const STRETCH_A: f64 = 2.0;

/// Multiplicative Gaussian ball around a center point, one jitter per
/// dimension. `ratio = 0` reproduces the center exactly.
pub fn p_ball(center: &[f64], ratio: f64, rng: &mut StdRng) -> Vec<f64> {
    center
        .iter()
        .map(|&c| {
            let z: f64 = rng.sample(StandardNormal);
            c * (1.0 + ratio * z)
        })
        .collect()
}

/// One walker ensemble at a fixed inverse temperature.
///
/// `beta = 1` is the untempered posterior; the parallel-tempering sampler
/// holds one of these per rung.
pub(crate) struct WalkerEnsemble {
    pub(crate) beta: f64,
    pub(crate) positions: Vec<Vec<f64>>,
    pub(crate) log_prior: Vec<f64>,
    pub(crate) log_like: Vec<f64>,
    pub(crate) rng: StdRng,
    accepted: u64,
    proposed: u64,
}

impl WalkerEnsemble {
    pub(crate) fn new(beta: f64, seed: u64) -> Self {
        Self {
            beta,
            positions: Vec::new(),
            log_prior: Vec::new(),
            log_like: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
            accepted: 0,
            proposed: 0,
        }
    }

    pub(crate) fn n_walkers(&self) -> usize {
        self.positions.len()
    }

    /// Replace all walker positions and evaluate them.
    pub(crate) fn set_positions(
        &mut self,
        positions: Vec<Vec<f64>>,
        pool: &EvalPool,
    ) -> Result<(), AppError> {
        let values = pool.map(&positions)?;
        self.positions = positions;
        self.log_prior = values.iter().map(|v| v.0).collect();
        self.log_like = values.iter().map(|v| v.1).collect();
        Ok(())
    }

    fn logp(&self, i: usize) -> f64 {
        self.log_prior[i] + self.beta * self.log_like[i]
    }

    /// One raw step: update the first half against the second, then the
    /// second against the first.
    pub(crate) fn step(&mut self, pool: &EvalPool) -> Result<(), AppError> {
        let half = self.n_walkers() / 2;
        self.update_half(0, half, pool)?;
        self.update_half(half, self.n_walkers(), pool)
    }

    fn update_half(&mut self, lo: usize, hi: usize, pool: &EvalPool) -> Result<(), AppError> {
        let n = self.n_walkers();
        let n_dim = self.positions[0].len();
        let n_other = n - (hi - lo);

        let mut proposals = Vec::with_capacity(hi - lo);
        let mut zs = Vec::with_capacity(hi - lo);
        for i in lo..hi {
            // Complementary walker, drawn from the other half.
            let j = {
                let pick = self.rng.gen_range(0..n_other);
                if lo == 0 { hi + pick } else { pick }
            };
            let u: f64 = self.rng.r#gen();
            let z = ((STRETCH_A - 1.0) * u + 1.0).powi(2) / STRETCH_A;
            let other = &self.positions[j];
            let proposal: Vec<f64> = other
                .iter()
                .zip(self.positions[i].iter())
                .map(|(&o, &x)| o + z * (x - o))
                .collect();
            proposals.push(proposal);
            zs.push(z);
        }

        let values = pool.map(&proposals)?;
        for (offset, (proposal, (prior, like))) in
            proposals.into_iter().zip(values.into_iter()).enumerate()
        {
            let i = lo + offset;
            self.proposed += 1;
            let lnq = (n_dim as f64 - 1.0) * zs[offset].ln()
                + (prior + self.beta * like)
                - self.logp(i);
            let accept = lnq >= 0.0 || self.rng.r#gen::<f64>().ln() < lnq;
            if accept {
                self.positions[i] = proposal;
                self.log_prior[i] = prior;
                self.log_like[i] = like;
                self.accepted += 1;
            }
        }
        Ok(())
    }

    pub(crate) fn acceptance_fraction(&self) -> f64 {
        if self.proposed == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposed as f64
        }
    }

    pub(crate) fn reset_counters(&mut self) {
        self.accepted = 0;
        self.proposed = 0;
    }
}

/// The single-temperature ensemble sampler.
pub struct EnsembleSampler {
    ensemble: WalkerEnsemble,
    n_walkers: usize,
    chain: Chain,
}

impl EnsembleSampler {
    pub fn new(n_walkers: usize, n_pars: usize, thin: usize, seed: u64) -> Self {
        Self {
            ensemble: WalkerEnsemble::new(1.0, seed),
            n_walkers,
            chain: Chain::new(n_pars, thin),
        }
    }
}

impl Sampler for EnsembleSampler {
    fn init_from_prior(
        &mut self,
        bounds: &[(f64, f64)],
        pool: &EvalPool,
    ) -> Result<(), AppError> {
        let positions: Vec<Vec<f64>> = (0..self.n_walkers)
            .map(|_| {
                bounds
                    .iter()
                    .map(|&(lo, hi)| self.ensemble.rng.gen_range(lo..hi))
                    .collect()
            })
            .collect();
        self.ensemble.set_positions(positions, pool)
    }

    fn reseed_ball(
        &mut self,
        center: &[f64],
        ratio: f64,
        pool: &EvalPool,
    ) -> Result<(), AppError> {
        let positions: Vec<Vec<f64>> = (0..self.n_walkers)
            .map(|_| p_ball(center, ratio, &mut self.ensemble.rng))
            .collect();
        self.ensemble.set_positions(positions, pool)
    }

    fn run(&mut self, n_steps: usize, pool: &EvalPool) -> Result<(), AppError> {
        self.ensemble.reset_counters();
        for _ in 0..n_steps {
            self.ensemble.step(pool)?;
            self.chain
                .push(&self.ensemble.positions, &self.ensemble.log_like);
        }
        Ok(())
    }

    fn chain(&self) -> &Chain {
        &self.chain
    }

    fn reset_chain(&mut self) {
        self.chain.reset();
    }

    fn acceptance_fraction(&self) -> f64 {
        self.ensemble.acceptance_fraction()
    }

    fn swap_acceptance(&self) -> Option<f64> {
        None
    }
}
