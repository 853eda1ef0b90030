//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/tabular files
//! - reloaded later for plotting or comparisons

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Censoring flag carried by every measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CensorFlag {
    /// A regular detection with a symmetric Gaussian uncertainty.
    Detection,
    /// An upper limit: only a detection ceiling is known.
    UpperLimit,
}

impl CensorFlag {
    /// The 0/1 encoding used by the flattened `f` axis.
    pub fn as_f64(self) -> f64 {
        match self {
            CensorFlag::Detection => 0.0,
            CensorFlag::UpperLimit => 1.0,
        }
    }
}

/// How upper limits enter the chi-square.
///
/// All three policies treat detections identically; they differ only in the
/// censored-point term. Selected once at configuration time and fixed for the
/// whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CensorPolicy {
    /// Smooth erf penalty (Sawicki 2012). The default: the censored term is
    /// small when the model sits safely below the limit and diverges as the
    /// model exceeds it.
    Erf,
    /// An upper limit contributes nothing unless the model exceeds the datum,
    /// in which case it is penalized like a normal residual.
    HardThreshold,
    /// AGN-fitter style (Calistro Rivera et al. 2016): every upper limit is
    /// compared against half the datum with half the datum as the
    /// uncertainty, whether or not the model exceeds the limit.
    Rescaled,
}

impl FromStr for CensorPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, AppError> {
        match s {
            "erf" => Ok(CensorPolicy::Erf),
            "hard-threshold" => Ok(CensorPolicy::HardThreshold),
            "rescaled" => Ok(CensorPolicy::Rescaled),
            other => Err(AppError::config(format!(
                "Cannot recognise the censoring policy '{other}'."
            ))),
        }
    }
}

/// Which sampler drives the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplerKind {
    /// Affine-invariant ensemble sampler (Goodman & Weare stretch moves).
    Ensemble,
    /// Parallel tempering: a ladder of ensembles at different temperatures
    /// with periodic swap moves. The posterior is taken from the coldest rung.
    Tempering,
}

impl FromStr for SamplerKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, AppError> {
        match s {
            "ensemble" | "EnsembleSampler" => Ok(SamplerKind::Ensemble),
            "tempering" | "PTSampler" => Ok(SamplerKind::Tempering),
            other => Err(AppError::config(format!(
                "Cannot recognise the sampler '{other}'."
            ))),
        }
    }
}

/// How walker likelihoods are evaluated within a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    /// Fixed-size in-process worker pool (rayon).
    Local,
    /// Coordinator/follower message passing: parameter vectors are dispatched
    /// over a channel to follower threads that hold no state across tasks.
    Channel,
}

/// Rest-frame vs observed-frame for luminosity post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frame {
    Rest,
    Obs,
}

impl FromStr for Frame {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, AppError> {
        match s {
            "rest" => Ok(Frame::Rest),
            "obs" => Ok(Frame::Obs),
            other => Err(AppError::config(format!(
                "Cannot recognise the frame: '{other}'!"
            ))),
        }
    }
}

/// Percentiles (0..100) reported for each parameter in the best-fit summary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PercentileTriple {
    pub low: f64,
    pub center: f64,
    pub high: f64,
}

impl Default for PercentileTriple {
    fn default() -> Self {
        Self {
            low: 16.0,
            center: 50.0,
            high: 84.0,
        }
    }
}

/// A full run's configuration as understood by the fitter.
///
/// Ownership of how this gets populated (file, CLI, notebook) lies with an
/// external loader; the core only validates and consumes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitConfig {
    pub sampler: SamplerKind,
    /// Walkers per ensemble. Must be even and at least 2 for stretch moves.
    pub n_walkers: usize,
    /// Temperature rungs; only used by the tempering sampler.
    pub n_temps: usize,
    /// Total number of burn-in phases (the first runs from the prior draw,
    /// the rest from shrinking-ball reseeds).
    pub iteration: usize,
    /// Steps per burn-in phase.
    pub iter_step: usize,
    /// Production (final sampling) steps.
    pub run_step: usize,
    /// Initial ball radius ratio for reseeding.
    pub ball_r: f64,
    /// Geometric decay of the ball radius across phases, in (0, 1).
    pub ball_t: f64,
    /// Raw production steps discarded before the chain counts as posterior.
    pub burn_in: usize,
    /// Keep every `thin`-th step of the chain.
    pub thin: usize,
    /// Worker-pool size for parallel likelihood evaluation.
    pub n_threads: usize,
    pub pool: PoolKind,
    pub percentiles: PercentileTriple,
    pub censor_policy: CensorPolicy,
    /// Fit a fractional model-uncertainty nuisance parameter (ln f).
    pub model_unct: bool,
    /// Model the spectral residual with a Matern-3/2 Gaussian process
    /// (adds ln-amplitude and ln-correlation-length nuisance parameters).
    pub spectral_corr: bool,
    /// Optional random sub-sampling fraction (0, 1] applied before
    /// summarizing and persisting the posterior.
    pub select_fraction: Option<f64>,
    /// Seed for every stochastic component of the run.
    pub seed: u64,
}

impl FitConfig {
    /// Validate the configuration before any sampling work starts.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.n_walkers < 2 || self.n_walkers % 2 != 0 {
            return Err(AppError::config(
                "Walker count must be even and at least 2.",
            ));
        }
        if self.sampler == SamplerKind::Tempering && self.n_temps < 2 {
            return Err(AppError::config(
                "The tempering sampler needs at least 2 temperature rungs.",
            ));
        }
        if self.iteration == 0 {
            return Err(AppError::config("At least one burn-in phase is required."));
        }
        if self.iter_step == 0 || self.run_step == 0 {
            return Err(AppError::config("Step counts must be positive."));
        }
        if !(self.ball_r.is_finite() && self.ball_r >= 0.0) {
            return Err(AppError::config("Ball radius must be finite and >= 0."));
        }
        if !(self.ball_t > 0.0 && self.ball_t < 1.0) {
            return Err(AppError::config("Ball decay must lie in (0, 1)."));
        }
        if self.thin == 0 {
            return Err(AppError::config("Thinning stride must be positive."));
        }
        if self.n_threads == 0 {
            return Err(AppError::config("Worker-pool size must be positive."));
        }
        let p = &self.percentiles;
        let ordered = 0.0 < p.low && p.low < p.center && p.center < p.high && p.high < 100.0;
        if !ordered {
            return Err(AppError::config(
                "Summary percentiles must satisfy 0 < low < center < high < 100.",
            ));
        }
        if let Some(frac) = self.select_fraction {
            if !(frac > 0.0 && frac <= 1.0) {
                return Err(AppError::config(
                    "Posterior sub-sampling fraction must lie in (0, 1].",
                ));
            }
        }
        Ok(())
    }
}

/// Quantile summary for one parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSummary {
    pub name: String,
    pub low: f64,
    pub center: f64,
    pub high: f64,
}

/// Full posterior summary, one row per parameter in sampling order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosteriorSummary {
    pub percentiles: PercentileTriple,
    pub params: Vec<ParamSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> FitConfig {
        FitConfig {
            sampler: SamplerKind::Ensemble,
            n_walkers: 8,
            n_temps: 1,
            iteration: 2,
            iter_step: 50,
            run_step: 100,
            ball_r: 0.5,
            ball_t: 0.5,
            burn_in: 20,
            thin: 2,
            n_threads: 2,
            pool: PoolKind::Local,
            percentiles: PercentileTriple::default(),
            censor_policy: CensorPolicy::Erf,
            model_unct: false,
            spectral_corr: false,
            select_fraction: None,
            seed: 42,
        }
    }

    #[test]
    fn validate_accepts_reasonable_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_odd_walkers() {
        let mut config = base_config();
        config.n_walkers = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_decay() {
        let mut config = base_config();
        config.ball_t = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_sampler_string_is_fatal() {
        let err = "MagicSampler".parse::<SamplerKind>().unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn original_sampler_names_still_parse() {
        assert_eq!(
            "EnsembleSampler".parse::<SamplerKind>().unwrap(),
            SamplerKind::Ensemble
        );
        assert_eq!(
            "PTSampler".parse::<SamplerKind>().unwrap(),
            SamplerKind::Tempering
        );
    }

    #[test]
    fn unknown_frame_string_is_fatal() {
        assert!("lab".parse::<Frame>().is_err());
        assert_eq!("rest".parse::<Frame>().unwrap(), Frame::Rest);
    }
}
