//! Censoring-aware chi-square functions.
//!
//! The chi-square here is defined as (-2) * ln-likelihood up to an additive
//! constant. Detections always contribute the normalized squared residual
//! plus a `ln(2*pi*sigma^2)` normalization term; the three policies differ
//! only in how upper limits enter:
//!
//! - `Erf`: the Sawicki (2012) smooth penalty. Preferred default.
//! - `HardThreshold`: zero below the limit, normal residual above it.
//! - `Rescaled`: the AGN-fitter prescription, applied unconditionally.

use statrs::function::erf::erf;

use crate::domain::{CensorFlag, CensorPolicy};

const SQRT2: f64 = std::f64::consts::SQRT_2;
const PI2: f64 = 2.0 * std::f64::consts::PI;

/// Chi-square of `model` against `data` under the selected censoring policy.
///
/// Array lengths are validated by the dataset at construction; a batch with
/// zero detections or zero upper limits simply contributes zero.
pub fn chi_sq(
    policy: CensorPolicy,
    data: &[f64],
    model: &[f64],
    unct: &[f64],
    flag: &[CensorFlag],
) -> f64 {
    let detections = chi_sq_detections(data, model, unct, flag);
    let censored = match policy {
        CensorPolicy::Erf => censored_erf(data, model, unct, flag),
        CensorPolicy::HardThreshold => censored_hard(data, model, unct, flag),
        CensorPolicy::Rescaled => censored_rescaled(data, model, flag),
    };
    detections + censored
}

fn chi_sq_detections(data: &[f64], model: &[f64], unct: &[f64], flag: &[CensorFlag]) -> f64 {
    let mut chsq = 0.0;
    for i in 0..data.len() {
        if flag[i] != CensorFlag::Detection {
            continue;
        }
        let r = (data[i] - model[i]) / unct[i];
        chsq += r * r + (PI2 * unct[i] * unct[i]).ln();
    }
    chsq
}

/// Sawicki (2012): each limit contributes -2 ln(0.5 (1 + erf(r / sqrt(2))))
/// with r = (data - model) / unct. Small when the model sits safely below
/// the limit, divergent as the model exceeds it.
fn censored_erf(data: &[f64], model: &[f64], unct: &[f64], flag: &[CensorFlag]) -> f64 {
    let mut chsq = 0.0;
    for i in 0..data.len() {
        if flag[i] != CensorFlag::UpperLimit {
            continue;
        }
        let r = (data[i] - model[i]) / (unct[i] * SQRT2);
        chsq += -2.0 * (0.5 * (1.0 + erf(r))).ln();
    }
    chsq
}

/// A limit contributes only when the model exceeds the datum; the
/// normalization term is likewise restricted to the exceeding points.
fn censored_hard(data: &[f64], model: &[f64], unct: &[f64], flag: &[CensorFlag]) -> f64 {
    let mut chsq = 0.0;
    for i in 0..data.len() {
        if flag[i] != CensorFlag::UpperLimit || model[i] <= data[i] {
            continue;
        }
        let r = (model[i] - data[i]) / unct[i];
        chsq += r * r + (PI2 * unct[i] * unct[i]).ln();
    }
    chsq
}

/// Calistro Rivera et al. (2016): the limit is replaced by half the datum
/// with half the datum as the uncertainty, and the penalty applies whether
/// or not the model exceeds the limit. The reported uncertainty is ignored.
fn censored_rescaled(data: &[f64], model: &[f64], flag: &[CensorFlag]) -> f64 {
    let mut chsq = 0.0;
    for i in 0..data.len() {
        if flag[i] != CensorFlag::UpperLimit {
            continue;
        }
        let half = 0.5 * data[i];
        let r = (model[i] - half) / half;
        chsq += r * r + (PI2 * half * half).ln();
    }
    chsq
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICIES: [CensorPolicy; 3] = [
        CensorPolicy::Erf,
        CensorPolicy::HardThreshold,
        CensorPolicy::Rescaled,
    ];

    #[test]
    fn all_detection_inputs_agree_across_policies() {
        let data = [1.0, 2.0, 3.0, 4.0];
        let model = [1.1, 1.8, 3.3, 3.9];
        let unct = [0.2, 0.3, 0.4, 0.5];
        let flag = [CensorFlag::Detection; 4];
        let reference = chi_sq(CensorPolicy::Erf, &data, &model, &unct, &flag);
        for policy in POLICIES {
            let v = chi_sq(policy, &data, &model, &unct, &flag);
            assert!((v - reference).abs() < 1e-12, "{policy:?} diverged");
        }
    }

    #[test]
    fn zero_residual_with_unit_variance_normalization_gives_zero() {
        // sigma^2 = 1 / (2 pi) makes the ln(2 pi sigma^2) term vanish, so a
        // perfect model yields chi-square ~ 0 under every policy.
        let sigma = (1.0 / PI2).sqrt();
        let data = [5.0, 6.0, 7.0];
        let model = data;
        let unct = [sigma; 3];
        let flag = [CensorFlag::Detection; 3];
        for policy in POLICIES {
            let v = chi_sq(policy, &data, &model, &unct, &flag);
            assert!(v.abs() < 1e-12, "{policy:?} gave {v}");
        }
    }

    #[test]
    fn empty_batches_contribute_zero() {
        for policy in POLICIES {
            assert_eq!(chi_sq(policy, &[], &[], &[], &[]), 0.0);
        }
        // All censored, model far below the limits: erf term tends to zero.
        let data = [10.0, 12.0];
        let model = [0.0, 0.0];
        let unct = [0.1, 0.1];
        let flag = [CensorFlag::UpperLimit; 2];
        let v = chi_sq(CensorPolicy::Erf, &data, &model, &unct, &flag);
        assert!(v.abs() < 1e-9);
        // Hard threshold: model below the limits contributes exactly zero.
        let v = chi_sq(CensorPolicy::HardThreshold, &data, &model, &unct, &flag);
        assert_eq!(v, 0.0);
    }

    #[test]
    fn erf_penalty_is_monotone_in_model_excess() {
        let data = [5.0];
        let unct = [1.0];
        let flag = [CensorFlag::UpperLimit];
        let mut prev = f64::NEG_INFINITY;
        for i in 0..60 {
            let m = -10.0 + i as f64 * 0.5;
            let v = chi_sq(CensorPolicy::Erf, &data, &[m], &unct, &flag);
            assert!(v >= prev, "penalty decreased at model={m}");
            prev = v;
        }
        // Approaches zero as the model drops far below the limit.
        let far_below = chi_sq(CensorPolicy::Erf, &data, &[-60.0], &unct, &flag);
        assert!(far_below.abs() < 1e-9);
    }

    #[test]
    fn hard_threshold_penalizes_only_exceeding_points() {
        let data = [5.0, 5.0];
        let unct = [1.0, 1.0];
        let flag = [CensorFlag::UpperLimit; 2];
        // First point below the limit, second above it.
        let model = [4.0, 7.0];
        let v = chi_sq(CensorPolicy::HardThreshold, &data, &model, &unct, &flag);
        let expected = (2.0_f64 / 1.0).powi(2) + (PI2 * 1.0).ln();
        assert!((v - expected).abs() < 1e-12);
    }

    #[test]
    fn rescaled_policy_penalizes_even_below_the_limit() {
        // The AGN-fitter prescription is deliberately unconditional: a model
        // below the limit is still compared against data/2 with data/2 as the
        // uncertainty. This asymmetry is preserved on purpose.
        let data = [8.0];
        let unct = [1.0];
        let flag = [CensorFlag::UpperLimit];
        let below = chi_sq(CensorPolicy::Rescaled, &data, &[2.0], &unct, &flag);
        let half = 4.0_f64;
        let expected = ((2.0 - half) / half).powi(2) + (PI2 * half * half).ln();
        assert!((below - expected).abs() < 1e-12);
        // The minimum sits at model == data/2, not at model == 0.
        let at_half = chi_sq(CensorPolicy::Rescaled, &data, &[4.0], &unct, &flag);
        assert!(at_half < below);
        let at_zero = chi_sq(CensorPolicy::Rescaled, &data, &[0.0], &unct, &flag);
        assert!(at_half < at_zero);
    }
}
