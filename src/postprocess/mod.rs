//! Posterior post-processing: quantile summaries, sub-sampling, and
//! propagation of derived quantities through the posterior.

pub mod luminosity;

pub use luminosity::{luminosity_integrate, luminosity_specific};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::{ParamSummary, PercentileTriple, PosteriorSummary};
use crate::error::AppError;
use crate::math::percentile;

/// Per-parameter quantiles over the flattened posterior. Rows are samples,
/// columns follow `names` order.
pub fn summarize(
    samples: &[Vec<f64>],
    names: &[String],
    percentiles: PercentileTriple,
) -> Result<PosteriorSummary, AppError> {
    if samples.is_empty() {
        return Err(AppError::no_data("No posterior samples to summarize."));
    }
    if samples[0].len() != names.len() {
        return Err(AppError::config(format!(
            "Posterior has {} columns but {} parameter names.",
            samples[0].len(),
            names.len()
        )));
    }

    let mut params = Vec::with_capacity(names.len());
    for (col, name) in names.iter().enumerate() {
        let values: Vec<f64> = samples.iter().map(|row| row[col]).collect();
        let take = |pct: f64| {
            percentile(&values, pct).ok_or_else(|| {
                AppError::numeric(format!("Cannot compute percentiles for '{name}'."))
            })
        };
        params.push(ParamSummary {
            name: name.clone(),
            low: take(percentiles.low)?,
            center: take(percentiles.center)?,
            high: take(percentiles.high)?,
        });
    }
    Ok(PosteriorSummary {
        percentiles,
        params,
    })
}

/// Seeded random sub-sample of posterior rows (with replacement), keeping the
/// log-likelihoods paired row-for-row. `fraction` is clamped to yield at
/// least one row.
pub fn subsample(
    samples: &[Vec<f64>],
    logl: &[f64],
    fraction: f64,
    seed: u64,
) -> (Vec<Vec<f64>>, Vec<f64>) {
    if samples.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let n = ((samples.len() as f64 * fraction).ceil() as usize).clamp(1, samples.len());
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out_samples = Vec::with_capacity(n);
    let mut out_logl = Vec::with_capacity(n);
    for _ in 0..n {
        let idx = rng.gen_range(0..samples.len());
        out_samples.push(samples[idx].clone());
        out_logl.push(logl[idx]);
    }
    (out_samples, out_logl)
}

/// Propagate a derived quantity through the posterior: apply `func` to
/// `n_samples` randomly drawn rows (with replacement) and return the values.
///
/// The statistics of the returned list (median, percentiles) are the
/// posterior statistics of the derived quantity.
pub fn par_statistics<F>(func: F, n_samples: usize, samples: &[Vec<f64>], seed: u64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    if samples.is_empty() {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n_samples)
        .map(|_| func(&samples[rng.gen_range(0..samples.len())]))
        .collect()
}
