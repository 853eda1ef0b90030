//! Matern-3/2 Gaussian-process log-likelihood for spectral residuals.
//!
//! Adjacent spectral channels are not independent; treating them as such
//! overstates the information content of spectroscopy relative to photometry.
//! The residual vector is therefore modelled as zero-mean with covariance
//!
//! `K_ij = a * (1 + sqrt(3 d^2 / tau)) * exp(-sqrt(3 d^2 / tau)) + delta_ij s_i^2`
//!
//! where `d = |x_i - x_j|`. `tau` enters as the squared-length metric, the
//! same parameterization as george's `Matern32Kernel`.

use nalgebra::{Cholesky, DMatrix, DVector};

const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Matern-3/2 covariance between two points at distance `d`, with amplitude
/// `amp` and squared-length metric `metric`.
pub fn matern32(d: f64, amp: f64, metric: f64) -> f64 {
    let u = (3.0 * d * d / metric).sqrt();
    amp * (1.0 + u) * (-u).exp()
}

/// GP log-likelihood of `resid` observed at `x` with per-point noise `diag`
/// (standard deviations, added in quadrature on the diagonal).
///
/// Returns `f64::NEG_INFINITY` when the covariance is not positive definite
/// (a bad hyperparameter draw, not a fatal error).
pub fn matern32_lnlike(x: &[f64], resid: &[f64], diag: &[f64], amp: f64, metric: f64) -> f64 {
    let n = x.len();
    if n == 0 {
        return 0.0;
    }
    if !(amp.is_finite() && amp > 0.0 && metric.is_finite() && metric > 0.0) {
        return f64::NEG_INFINITY;
    }

    let mut k = DMatrix::<f64>::zeros(n, n);
    for i in 0..n {
        for j in 0..=i {
            let mut v = matern32(x[i] - x[j], amp, metric);
            if i == j {
                v += diag[i] * diag[i];
            }
            k[(i, j)] = v;
            k[(j, i)] = v;
        }
    }

    let Some(chol) = Cholesky::new(k) else {
        return f64::NEG_INFINITY;
    };
    let r = DVector::from_column_slice(resid);
    let alpha = chol.solve(&r);
    let quad = r.dot(&alpha);
    let ln_det: f64 = chol.l().diagonal().iter().map(|v| 2.0 * v.ln()).sum();
    -0.5 * (quad + ln_det + n as f64 * LN_2PI)
}
