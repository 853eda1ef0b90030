//! Parallel tempering.
//!
//! A ladder of walker ensembles samples the tempered posterior
//! `log_prior + beta * log_like`, with `beta` decreasing by a factor of
//! `1/sqrt(2)` per rung. After every stretch step, adjacent rungs attempt
//! walker swaps; hot rungs move freely across modes and good points percolate
//! down the ladder. The retained chain, and hence the posterior, always comes
//! from the coldest (`beta = 1`) rung.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::AppError;
use crate::mcmc::chain::Chain;
use crate::mcmc::ensemble::{p_ball, WalkerEnsemble};
use crate::mcmc::eval::EvalPool;
use crate::mcmc::Sampler;

/// `beta_t = 2^(-t/2)`, the emcee ladder spacing.
pub fn beta_ladder(n_temps: usize) -> Vec<f64> {
    (0..n_temps)
        .map(|t| std::f64::consts::SQRT_2.powi(-(t as i32)))
        .collect()
}

pub struct PtSampler {
    rungs: Vec<WalkerEnsemble>,
    n_walkers: usize,
    rng: StdRng,
    chain: Chain,
    swap_accepted: u64,
    swap_proposed: u64,
}

impl PtSampler {
    pub fn new(n_temps: usize, n_walkers: usize, n_pars: usize, thin: usize, seed: u64) -> Self {
        let rungs = beta_ladder(n_temps)
            .into_iter()
            .enumerate()
            .map(|(t, beta)| WalkerEnsemble::new(beta, seed.wrapping_add(1 + t as u64)))
            .collect();
        Self {
            rungs,
            n_walkers,
            rng: StdRng::seed_from_u64(seed),
            chain: Chain::new(n_pars, thin),
            swap_accepted: 0,
            swap_proposed: 0,
        }
    }

    /// Adjacent-pair swap sweep, from the hottest rung downward. Swapping
    /// exchanges the full walker state; the tempering factor only enters the
    /// acceptance ratio.
    fn swap_sweep(&mut self) {
        for t in (1..self.rungs.len()).rev() {
            let (cold_part, hot_part) = self.rungs.split_at_mut(t);
            let cold = &mut cold_part[t - 1];
            let hot = &mut hot_part[0];
            let dbeta = cold.beta - hot.beta;
            for w in 0..self.n_walkers {
                self.swap_proposed += 1;
                let ln_alpha = dbeta * (hot.log_like[w] - cold.log_like[w]);
                let accept = ln_alpha >= 0.0 || self.rng.r#gen::<f64>().ln() < ln_alpha;
                if accept {
                    std::mem::swap(&mut cold.positions[w], &mut hot.positions[w]);
                    std::mem::swap(&mut cold.log_prior[w], &mut hot.log_prior[w]);
                    std::mem::swap(&mut cold.log_like[w], &mut hot.log_like[w]);
                    self.swap_accepted += 1;
                }
            }
        }
    }
}

impl Sampler for PtSampler {
    fn init_from_prior(
        &mut self,
        bounds: &[(f64, f64)],
        pool: &EvalPool,
    ) -> Result<(), AppError> {
        let n_walkers = self.n_walkers;
        for rung in &mut self.rungs {
            let positions: Vec<Vec<f64>> = (0..n_walkers)
                .map(|_| {
                    bounds
                        .iter()
                        .map(|&(lo, hi)| rung.rng.gen_range(lo..hi))
                        .collect()
                })
                .collect();
            rung.set_positions(positions, pool)?;
        }
        Ok(())
    }

    fn reseed_ball(
        &mut self,
        center: &[f64],
        ratio: f64,
        pool: &EvalPool,
    ) -> Result<(), AppError> {
        let n_walkers = self.n_walkers;
        for rung in &mut self.rungs {
            let positions: Vec<Vec<f64>> = (0..n_walkers)
                .map(|_| p_ball(center, ratio, &mut rung.rng))
                .collect();
            rung.set_positions(positions, pool)?;
        }
        Ok(())
    }

    fn run(&mut self, n_steps: usize, pool: &EvalPool) -> Result<(), AppError> {
        for rung in &mut self.rungs {
            rung.reset_counters();
        }
        self.swap_accepted = 0;
        self.swap_proposed = 0;
        for _ in 0..n_steps {
            for rung in &mut self.rungs {
                rung.step(pool)?;
            }
            self.swap_sweep();
            let cold = &self.rungs[0];
            self.chain.push(&cold.positions, &cold.log_like);
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
        let sum: f64 = self.rungs.iter().map(|r| r.acceptance_fraction()).sum();
        sum / self.rungs.len() as f64
    }

    fn swap_acceptance(&self) -> Option<f64> {
        if self.swap_proposed == 0 {
            Some(0.0)
        } else {
            Some(self.swap_accepted as f64 / self.swap_proposed as f64)
        }
    }
}
