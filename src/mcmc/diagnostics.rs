//! Per-phase convergence diagnostics.
//!
//! Advisory only: the fitter reports these through the injected `Reporter`
//! and never changes control flow based on them. The operator judges
//! convergence.

use crate::mcmc::chain::Chain;

/// Summary statistics for one completed sampling phase.
#[derive(Debug, Clone)]
pub struct PhaseDiagnostics {
    pub phase: String,
    /// Mean stretch-move acceptance fraction over the phase.
    pub acceptance: f64,
    /// Temperature-swap acceptance fraction, tempering only.
    pub swap_acceptance: Option<f64>,
    /// Integrated autocorrelation time per parameter, walker-averaged.
    pub autocorr_time: Vec<f64>,
    /// Effective sample size per parameter over the retained chain.
    pub ess: Vec<f64>,
}

impl PhaseDiagnostics {
    pub fn from_chain(
        phase: impl Into<String>,
        chain: &Chain,
        acceptance: f64,
        swap_acceptance: Option<f64>,
    ) -> Self {
        let (autocorr_time, ess) = chain_mixing(chain);
        Self {
            phase: phase.into(),
            acceptance,
            swap_acceptance,
            autocorr_time,
            ess,
        }
    }
}

/// Integrated autocorrelation time `tau = 1 + 2 sum rho(k)` and
/// `ESS = N / tau` per parameter, averaging the autocorrelation function
/// over walkers and truncating the sum at the first non-positive lag.
fn chain_mixing(chain: &Chain) -> (Vec<f64>, Vec<f64>) {
    let n_pars = chain.n_pars();
    let n_steps = chain.len();
    let n_walkers = chain.n_walkers();
    // Too short for a meaningful estimate: report perfect mixing.
    if n_steps < 10 || n_walkers == 0 {
        let n_total = (n_steps * n_walkers) as f64;
        return (vec![1.0; n_pars], vec![n_total; n_pars]);
    }

    let max_lag = (n_steps / 2).min(100);
    let n_total = (n_steps * n_walkers) as f64;

    let mut taus = Vec::with_capacity(n_pars);
    let mut esses = Vec::with_capacity(n_pars);
    for par in 0..n_pars {
        let mut avg = vec![0.0; max_lag];
        for walker in 0..n_walkers {
            let series = chain.walker_series(walker, par);
            for (lag, value) in autocorrelation(&series, max_lag).into_iter().enumerate() {
                avg[lag] += value / n_walkers as f64;
            }
        }
        let mut sum = 0.0;
        for &rho in &avg {
            if rho <= 0.0 {
                break;
            }
            sum += rho;
        }
        let tau = 1.0 + 2.0 * sum;
        taus.push(tau);
        esses.push(n_total / tau);
    }
    (taus, esses)
}

/// Normalized autocorrelation at lags `1..=max_lag` (lag 0 is 1 by
/// definition and omitted).
fn autocorrelation(series: &[f64], max_lag: usize) -> Vec<f64> {
    let n = series.len();
    let mean = series.iter().sum::<f64>() / n as f64;
    let variance = series.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    if variance <= 0.0 {
        return vec![0.0; max_lag];
    }
    (1..=max_lag)
        .map(|lag| {
            if lag >= n {
                return 0.0;
            }
            let cov = (0..n - lag)
                .map(|i| (series[i] - mean) * (series[i + lag] - mean))
                .sum::<f64>()
                / n as f64;
            cov / variance
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn chain_from(series_per_walker: Vec<Vec<f64>>) -> Chain {
        let n_steps = series_per_walker[0].len();
        let mut chain = Chain::new(1, 1);
        for step in 0..n_steps {
            let positions: Vec<Vec<f64>> =
                series_per_walker.iter().map(|s| vec![s[step]]).collect();
            let logls = vec![0.0; series_per_walker.len()];
            chain.push(&positions, &logls);
        }
        chain
    }

    #[test]
    fn independent_samples_have_tau_near_one() {
        let mut rng = StdRng::seed_from_u64(9);
        let walkers: Vec<Vec<f64>> = (0..4)
            .map(|_| (0..500).map(|_| rng.r#gen::<f64>() - 0.5).collect())
            .collect();
        let chain = chain_from(walkers);
        let (tau, ess) = chain_mixing(&chain);
        assert!(tau[0] < 2.0, "tau={}", tau[0]);
        assert!(ess[0] > 1000.0, "ess={}", ess[0]);
    }

    #[test]
    fn sticky_chains_have_large_tau_and_small_ess() {
        let mut rng = StdRng::seed_from_u64(9);
        // AR(1) with strong persistence.
        let walkers: Vec<Vec<f64>> = (0..4)
            .map(|_| {
                let mut x = 0.0;
                (0..500)
                    .map(|_| {
                        x = 0.95 * x + 0.05 * (rng.r#gen::<f64>() - 0.5);
                        x
                    })
                    .collect()
            })
            .collect();
        let chain = chain_from(walkers);
        let (tau, ess) = chain_mixing(&chain);
        assert!(tau[0] > 5.0, "tau={}", tau[0]);
        assert!(ess[0] < 500.0, "ess={}", ess[0]);
    }

    #[test]
    fn constant_chains_do_not_divide_by_zero() {
        let chain = chain_from(vec![vec![2.0; 50], vec![2.0; 50]]);
        let (tau, ess) = chain_mixing(&chain);
        assert_eq!(tau[0], 1.0);
        assert!(ess[0].is_finite());
    }

    #[test]
    fn short_chains_fall_back_to_perfect_mixing() {
        let chain = chain_from(vec![vec![1.0, 2.0, 3.0]]);
        let (tau, _) = chain_mixing(&chain);
        assert_eq!(tau, vec![1.0]);
    }
}
