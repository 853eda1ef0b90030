//! Multi-phase fit orchestration.
//!
//! The run is a fixed state machine:
//!
//! `INIT -> BURNIN_1 .. BURNIN_k -> FINAL_SAMPLING -> DONE`
//!
//! The first burn-in starts from a uniform prior draw. Each later burn-in
//! reseeds the walkers in a multiplicative Gaussian ball around the best
//! point of the previous phase, with the ball ratio shrinking geometrically.
//! The final phase reuses the last ball ratio and its retained chain, minus a
//! configured burn-in prefix, is the posterior.

use std::sync::Arc;

use crate::data::SedData;
use crate::domain::{FitConfig, PosteriorSummary, SamplerKind};
use crate::error::AppError;
use crate::likelihood::{log_likelihood, log_likelihood_gp};
use crate::mcmc::diagnostics::PhaseDiagnostics;
use crate::mcmc::ensemble::EnsembleSampler;
use crate::mcmc::eval::{EvalPool, LogProbFn};
use crate::mcmc::ptsampler::PtSampler;
use crate::mcmc::Sampler;
use crate::models::ModelCombiner;
use crate::postprocess::{subsample, summarize};
use crate::report::Reporter;

// Prior bounds for the nuisance parameters (natural log scale).
const LNF_BOUNDS: (f64, f64) = (-10.0, 2.0);
const LNA_BOUNDS: (f64, f64) = (-10.0, 5.0);
const LNTAU_BOUNDS: (f64, f64) = (-10.0, 2.5);

/// Ball ratios applied before burn-in phases 2..=iteration, shrinking
/// geometrically from the initial radius.
pub fn ball_ratio_sequence(ball_r: f64, ball_t: f64, iteration: usize) -> Vec<f64> {
    (1..iteration)
        .map(|i| ball_r * ball_t.powi(i as i32))
        .collect()
}

/// Everything a finished run hands back.
pub struct FitOutput {
    /// Parameter names, varying model parameters first, then nuisance.
    pub par_names: Vec<String>,
    /// Flattened posterior rows (after burn-in discard and optional
    /// sub-sampling), step-major, columns in `par_names` order.
    pub samples: Vec<Vec<f64>>,
    /// Log-likelihood per posterior row.
    pub logl: Vec<f64>,
    /// Maximum-likelihood point of the production chain.
    pub best: Vec<f64>,
    pub best_logl: f64,
    pub summary: PosteriorSummary,
    pub diagnostics: Vec<PhaseDiagnostics>,
}

#[derive(Debug)]
pub struct FitRunner<M> {
    config: FitConfig,
    data: Arc<SedData>,
    model: M,
    par_names: Vec<String>,
    bounds: Vec<(f64, f64)>,
}

impl<M> FitRunner<M>
where
    M: ModelCombiner + Clone + 'static,
{
    pub fn new(config: FitConfig, data: SedData, model: M) -> Result<Self, AppError> {
        config.validate()?;

        let mut bounds = model.par_vary_ranges();
        if bounds.is_empty() {
            return Err(AppError::config(
                "The model has no varying parameters to fit.",
            ));
        }
        let mut par_names = model.par_vary_names();
        if config.model_unct {
            bounds.push(LNF_BOUNDS);
            par_names.push("lnf".to_string());
        }
        if config.spectral_corr {
            if data.n_spc() == 0 {
                return Err(AppError::config(
                    "Spectral correlation is on but the dataset has no spectrum.",
                ));
            }
            bounds.push(LNA_BOUNDS);
            par_names.push("lna".to_string());
            bounds.push(LNTAU_BOUNDS);
            par_names.push("lntau".to_string());
        }

        Ok(Self {
            config,
            data: Arc::new(data),
            model,
            par_names,
            bounds,
        })
    }

    pub fn par_names(&self) -> &[String] {
        &self.par_names
    }

    fn log_prob_fn(&self) -> LogProbFn {
        let bounds = self.bounds.clone();
        let data = Arc::clone(&self.data);
        let proto = self.model.clone();
        let policy = self.config.censor_policy;
        let model_unct = self.config.model_unct;
        let spectral_corr = self.config.spectral_corr;
        Arc::new(move |pars: &[f64]| {
            for (p, &(lo, hi)) in pars.iter().zip(bounds.iter()) {
                if !p.is_finite() || *p < lo || *p > hi {
                    return (f64::NEG_INFINITY, f64::NEG_INFINITY);
                }
            }
            let mut model = proto.clone();
            let logl = if spectral_corr {
                log_likelihood_gp(pars, &data, &mut model, policy, model_unct)
            } else {
                log_likelihood(pars, &data, &mut model, policy, model_unct)
            };
            match logl {
                Ok(v) if v.is_finite() => (0.0, v),
                // Numeric trouble in the hot path just makes the point
                // maximally unattractive.
                _ => (0.0, f64::NEG_INFINITY),
            }
        })
    }

    /// Run the whole state machine and return the posterior.
    pub fn run(&self, reporter: &dyn Reporter) -> Result<FitOutput, AppError> {
        let config = &self.config;
        let n_pars = self.bounds.len();

        // Probe a single evaluation with the real error path before any pool
        // is engaged. Structural problems (band/grid mismatches, wrong
        // parameter counts) surface here, not as a silently stuck sampler.
        let probe: Vec<f64> = self
            .bounds
            .iter()
            .map(|&(lo, hi)| 0.5 * (lo + hi))
            .collect();
        {
            let mut model = self.model.clone();
            if config.spectral_corr {
                log_likelihood_gp(
                    &probe,
                    &self.data,
                    &mut model,
                    config.censor_policy,
                    config.model_unct,
                )?;
            } else {
                log_likelihood(
                    &probe,
                    &self.data,
                    &mut model,
                    config.censor_policy,
                    config.model_unct,
                )?;
            }
        }

        let pool = EvalPool::new(config.pool, config.n_threads, self.log_prob_fn())?;
        let mut sampler: Box<dyn Sampler> = match config.sampler {
            SamplerKind::Ensemble => Box::new(EnsembleSampler::new(
                config.n_walkers,
                n_pars,
                config.thin,
                config.seed,
            )),
            SamplerKind::Tempering => Box::new(PtSampler::new(
                config.n_temps,
                config.n_walkers,
                n_pars,
                config.thin,
                config.seed,
            )),
        };

        let mut diagnostics = Vec::new();

        reporter.phase_start("burn-in 1", config.iter_step);
        sampler.init_from_prior(&self.bounds, &pool)?;
        sampler.run(config.iter_step, &pool)?;
        let diag = PhaseDiagnostics::from_chain(
            "burn-in 1",
            sampler.chain(),
            sampler.acceptance_fraction(),
            sampler.swap_acceptance(),
        );
        reporter.diagnostics(&diag);
        diagnostics.push(diag);
        let (mut pmax, mut logl_max) = sampler
            .chain()
            .p_logl_max()
            .ok_or_else(|| AppError::numeric(
                "Burn-in retained no steps; lower the thinning stride.",
            ))?;
        reporter.info(&format!("burn-in 1 best logL = {logl_max:.4}"));

        let ratios = ball_ratio_sequence(config.ball_r, config.ball_t, config.iteration);
        for (i, &ratio) in ratios.iter().enumerate() {
            let phase = format!("burn-in {}", i + 2);
            reporter.phase_start(&phase, config.iter_step);
            sampler.reset_chain();
            sampler.reseed_ball(&pmax, ratio, &pool)?;
            sampler.run(config.iter_step, &pool)?;
            let diag = PhaseDiagnostics::from_chain(
                phase.clone(),
                sampler.chain(),
                sampler.acceptance_fraction(),
                sampler.swap_acceptance(),
            );
            reporter.diagnostics(&diag);
            diagnostics.push(diag);
            let (p, l) = sampler.chain().p_logl_max().ok_or_else(|| {
                AppError::numeric("Burn-in retained no steps; lower the thinning stride.")
            })?;
            pmax = p;
            logl_max = l;
            reporter.info(&format!("{phase} best logL = {logl_max:.4}"));
        }

        let final_ratio = ratios.last().copied().unwrap_or(config.ball_r);
        reporter.phase_start("production", config.run_step);
        sampler.reset_chain();
        sampler.reseed_ball(&pmax, final_ratio, &pool)?;
        sampler.run(config.run_step, &pool)?;
        let diag = PhaseDiagnostics::from_chain(
            "production",
            sampler.chain(),
            sampler.acceptance_fraction(),
            sampler.swap_acceptance(),
        );
        reporter.diagnostics(&diag);
        diagnostics.push(diag);

        let chain = sampler.chain();
        // burn_in counts raw steps; the retained chain keeps every thin-th.
        let discard = config.burn_in / config.thin;
        if discard >= chain.len() {
            return Err(AppError::config(
                "The burn-in cutoff discards the entire production chain.",
            ));
        }
        let (best, best_logl) = chain.p_logl_max().ok_or_else(|| {
            AppError::numeric("Production retained no steps; lower the thinning stride.")
        })?;
        let mut samples = chain.flatten(discard);
        let mut logl = chain.flat_logl(discard);
        if let Some(fraction) = config.select_fraction {
            (samples, logl) = subsample(&samples, &logl, fraction, config.seed);
        }
        let summary = summarize(&samples, &self.par_names, config.percentiles)?;

        Ok(FitOutput {
            par_names: self.par_names.clone(),
            samples,
            logl,
            best,
            best_logl,
            summary,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::mock::{generate_mock, MockSpec};
    use crate::domain::{CensorPolicy, PercentileTriple, PoolKind};
    use crate::models::{LinearModel, ParamSpec};
    use crate::report::NullReporter;

    fn linear_truth() -> LinearModel {
        let grid: Vec<f64> = (0..101).map(|i| i as f64 * 0.1).collect();
        let mut m = LinearModel::new(
            grid,
            ParamSpec::Varying {
                min: -10.0,
                max: 10.0,
            },
            ParamSpec::Varying {
                min: -10.0,
                max: 10.0,
            },
        )
        .unwrap();
        m.update_par_list(&[1.5, -0.5]).unwrap();
        m
    }

    fn ten_point_dataset(model: &LinearModel) -> SedData {
        // Ten exact points carrying unit uncertainties.
        let spec = MockSpec {
            bands: Vec::new(),
            spc_wave: (0..10).map(|i| 0.5 + i as f64).collect(),
            spc_unct: vec![1.0; 10],
            f_add: None,
            noiseless: true,
            seed: 1,
        };
        generate_mock("linear", model, &spec).unwrap().data
    }

    fn scenario_config(pool: PoolKind, seed: u64) -> FitConfig {
        FitConfig {
            sampler: SamplerKind::Ensemble,
            n_walkers: 4,
            n_temps: 1,
            iteration: 2,
            iter_step: 50,
            run_step: 200,
            ball_r: 0.5,
            ball_t: 0.5,
            burn_in: 40,
            thin: 2,
            n_threads: 2,
            pool,
            percentiles: PercentileTriple::default(),
            censor_policy: CensorPolicy::Erf,
            model_unct: false,
            spectral_corr: false,
            select_fraction: None,
            seed,
        }
    }

    #[test]
    fn two_parameter_linear_scenario_recovers_the_truth() {
        let truth = linear_truth();
        let data = ten_point_dataset(&truth);
        let runner =
            FitRunner::new(scenario_config(PoolKind::Local, 42), data, truth).unwrap();
        let out = runner.run(&NullReporter).unwrap();

        // 200 production steps, thin 2, 40 raw steps discarded, 4 walkers.
        assert_eq!(out.samples.len(), (100 - 20) * 4);
        assert_eq!(out.samples.len(), out.logl.len());

        let n = out.samples.len() as f64;
        let mean_slope = out.samples.iter().map(|r| r[0]).sum::<f64>() / n;
        let mean_icpt = out.samples.iter().map(|r| r[1]).sum::<f64>() / n;
        assert!((mean_slope - 1.5).abs() < 0.2, "slope mean {mean_slope}");
        assert!((mean_icpt + 0.5).abs() < 0.2, "intercept mean {mean_icpt}");

        // The credible interval brackets the truth.
        let slope = &out.summary.params[0];
        assert!(slope.low < 1.5 && 1.5 < slope.high);
        assert!(out.best_logl.is_finite());
    }

    #[test]
    fn credible_interval_covers_the_truth_across_seeds() {
        let truth = linear_truth();
        let data = ten_point_dataset(&truth);
        let mut covered = 0;
        for seed in 0..10u64 {
            let runner = FitRunner::new(
                scenario_config(PoolKind::Local, 1000 + seed),
                data.clone(),
                truth.clone(),
            )
            .unwrap();
            let out = runner.run(&NullReporter).unwrap();
            let slope = &out.summary.params[0];
            let icpt = &out.summary.params[1];
            if slope.low < 1.5 && 1.5 < slope.high && icpt.low < -0.5 && -0.5 < icpt.high {
                covered += 1;
            }
        }
        assert!(covered >= 6, "truth inside the interval in {covered}/10 runs");
    }

    #[test]
    fn channel_pool_reproduces_the_local_pool_run() {
        let truth = linear_truth();
        let data = ten_point_dataset(&truth);
        let local = FitRunner::new(
            scenario_config(PoolKind::Local, 7),
            data.clone(),
            truth.clone(),
        )
        .unwrap()
        .run(&NullReporter)
        .unwrap();
        let channel = FitRunner::new(scenario_config(PoolKind::Channel, 7), data, truth)
            .unwrap()
            .run(&NullReporter)
            .unwrap();
        assert_eq!(local.samples, channel.samples);
        assert_eq!(local.best, channel.best);
    }

    #[test]
    fn tempering_run_produces_a_cold_chain_posterior() {
        let truth = linear_truth();
        let data = ten_point_dataset(&truth);
        let mut config = scenario_config(PoolKind::Local, 13);
        config.sampler = SamplerKind::Tempering;
        config.n_temps = 3;
        let out = FitRunner::new(config, data, truth)
            .unwrap()
            .run(&NullReporter)
            .unwrap();
        assert_eq!(out.samples.len(), (100 - 20) * 4);
        let n = out.samples.len() as f64;
        let mean_slope = out.samples.iter().map(|r| r[0]).sum::<f64>() / n;
        assert!((mean_slope - 1.5).abs() < 0.3, "slope mean {mean_slope}");
        assert!(out.diagnostics.last().unwrap().swap_acceptance.is_some());
    }

    #[test]
    fn invalid_config_fails_before_any_sampling() {
        let truth = linear_truth();
        let data = ten_point_dataset(&truth);
        let mut config = scenario_config(PoolKind::Local, 1);
        config.n_walkers = 5;
        let err = FitRunner::new(config, data, truth).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn ball_ratio_sequence_is_strictly_decreasing() {
        let ratios = ball_ratio_sequence(0.5, 0.5, 5);
        assert_eq!(ratios.len(), 4);
        assert!((ratios[0] - 0.25).abs() < 1e-12);
        for pair in ratios.windows(2) {
            assert!(pair[1] < pair[0]);
        }
    }

    #[test]
    fn nuisance_parameters_extend_names_and_bounds() {
        let truth = linear_truth();
        let spec = MockSpec {
            bands: Vec::new(),
            spc_wave: (0..10).map(|i| 0.5 + i as f64).collect(),
            spc_unct: vec![1.0; 10],
            f_add: None,
            noiseless: true,
            seed: 1,
        };
        let data = generate_mock("linear", &truth, &spec).unwrap().data;
        let mut config = scenario_config(PoolKind::Local, 1);
        config.model_unct = true;
        config.spectral_corr = true;
        let runner = FitRunner::new(config, data, truth).unwrap();
        assert_eq!(
            runner.par_names(),
            ["slope", "intercept", "lnf", "lna", "lntau"]
        );
    }
}
