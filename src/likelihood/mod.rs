//! Likelihood evaluation: model-to-data projection plus censoring-aware
//! chi-square, with an optional Gaussian-process treatment of spectral
//! residual correlation.
//!
//! Parameter vector layout (fixed for a whole run):
//!
//! `[varying model parameters..., ln f, ln a, ln tau]`
//!
//! where `ln f` is present when model-uncertainty fitting is on and
//! `ln a` / `ln tau` are present when spectral correlation is on.

pub mod chisq;
pub mod gp;

pub use chisq::chi_sq;
pub use gp::{matern32, matern32_lnlike};

use crate::data::{Axis, SedData};
use crate::domain::CensorPolicy;
use crate::error::AppError;
use crate::models::ModelCombiner;

/// Number of nuisance parameters appended to the varying model parameters.
pub fn n_nuisance(model_unct: bool, spectral_corr: bool) -> usize {
    usize::from(model_unct) + if spectral_corr { 2 } else { 0 }
}

/// Project the model onto the data spaces: synthetic photometry per band,
/// then the model resampled onto the spectroscopic grid. The concatenation
/// order matches `SedData::get_list`.
pub fn model_to_data(model: &impl ModelCombiner, data: &SedData) -> Result<Vec<f64>, AppError> {
    let wave = model.x_list();
    let flux = model.combine_result();
    let mut out = data.model_pht(wave, &flux)?;
    out.extend(data.model_spc(wave, &flux));
    Ok(out)
}

fn check_par_len(pars: &[f64], n_vary: usize, n_nui: usize) -> Result<(), AppError> {
    if pars.len() != n_vary + n_nui {
        return Err(AppError::config(format!(
            "Parameter vector has length {}, expected {} model + {} nuisance.",
            pars.len(),
            n_vary,
            n_nui
        )));
    }
    Ok(())
}

/// Standard log-likelihood: update the model, project, chi-square under the
/// configured censoring policy, return -0.5 * chi-square.
///
/// With `model_unct` on, every uncertainty is inflated to
/// `sqrt(e^2 + (f * model)^2)` with `f = exp(pars[n_vary])`.
pub fn log_likelihood(
    pars: &[f64],
    data: &SedData,
    model: &mut impl ModelCombiner,
    policy: CensorPolicy,
    model_unct: bool,
) -> Result<f64, AppError> {
    let n_vary = model.par_vary_list().len();
    check_par_len(pars, n_vary, n_nuisance(model_unct, false))?;
    model.update_par_list(&pars[..n_vary])?;
    let ym = model_to_data(model, data)?;

    let y = data.get_list(Axis::Y);
    let mut e = data.get_list(Axis::E);
    let flags = data.get_flags();
    if model_unct {
        let f = pars[n_vary].exp();
        for (s, m) in e.iter_mut().zip(ym.iter()) {
            *s = (*s * *s + (f * m) * (f * m)).sqrt();
        }
    }
    Ok(-0.5 * chi_sq(policy, &y, &ym, &e, &flags))
}

/// Spectral-correlation log-likelihood: the photometric term uses the
/// (optionally inflated) chi-square; the spectral residual is scored under a
/// Matern-3/2 GP whose amplitude and correlation length are the last two
/// parameters, non-dimensionalized by the spectrum's median flux and
/// wavelength span.
pub fn log_likelihood_gp(
    pars: &[f64],
    data: &SedData,
    model: &mut impl ModelCombiner,
    policy: CensorPolicy,
    model_unct: bool,
) -> Result<f64, AppError> {
    let n_vary = model.par_vary_list().len();
    check_par_len(pars, n_vary, n_nuisance(model_unct, true))?;
    model.update_par_list(&pars[..n_vary])?;

    let wave = model.x_list();
    let flux = model.combine_result();
    let y_pht_model = data.model_pht(wave, &flux)?;
    let y_spc_model = data.model_spc(wave, &flux);

    let mut idx = n_vary;
    let f = if model_unct {
        let f = pars[idx].exp();
        idx += 1;
        f
    } else {
        0.0
    };

    let lnl_pht = if y_pht_model.is_empty() {
        0.0
    } else {
        let y = data.get_ds_list(Axis::Y);
        let e = data.get_ds_list(Axis::E);
        let flags = data.get_ds_flags();
        let s: Vec<f64> = e
            .iter()
            .zip(y_pht_model.iter())
            .map(|(&e, &m)| (e * e + (f * m) * (f * m)).sqrt())
            .collect();
        -0.5 * chi_sq(policy, &y, &y_pht_model, &s, &flags)
    };

    let lnl_spc = if y_spc_model.is_empty() {
        0.0
    } else {
        let amp = pars[idx].exp() * data.spc_flux_median();
        let metric = pars[idx + 1].exp() * data.spc_wave_span();
        let x = data.get_cs_list(Axis::X);
        let y = data.get_cs_list(Axis::Y);
        let e = data.get_cs_list(Axis::E);
        let s: Vec<f64> = e
            .iter()
            .zip(y_spc_model.iter())
            .map(|(&e, &m)| (e * e + (f * m) * (f * m)).sqrt())
            .collect();
        let resid: Vec<f64> = y
            .iter()
            .zip(y_spc_model.iter())
            .map(|(&y, &m)| y - m)
            .collect();
        matern32_lnlike(&x, &resid, &s, amp, metric)
    };

    Ok(lnl_pht + lnl_spc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::mock::{MockBand, MockSpec, generate_mock};
    use crate::data::BandPass;
    use crate::models::{LinearModel, ParamSpec};

    fn model() -> LinearModel {
        let grid: Vec<f64> = (0..300).map(|i| i as f64 * 0.1).collect();
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
        m.update_par_list(&[2.0, 1.0]).unwrap();
        m
    }

    fn spec() -> MockSpec {
        MockSpec {
            bands: vec![
                MockBand {
                    name: "b1".into(),
                    pass: BandPass::top_hat(5.0, 0.4).unwrap(),
                    unct: 0.5,
                },
                MockBand {
                    name: "b2".into(),
                    pass: BandPass::top_hat(12.0, 0.4).unwrap(),
                    unct: 0.5,
                },
            ],
            spc_wave: (0..20).map(|i| 15.0 + i as f64 * 0.5).collect(),
            spc_unct: vec![0.3; 20],
            f_add: None,
            noiseless: false,
            seed: 7,
        }
    }

    #[test]
    fn logl_matches_the_mock_truth_at_the_injected_parameters() {
        let mut m = model();
        let mock = generate_mock("t", &m, &spec()).unwrap();
        let logl = log_likelihood(&[2.0, 1.0], &mock.data, &mut m, CensorPolicy::Erf, false)
            .unwrap();
        assert!(
            (logl - mock.logl_true).abs() < 1e-9,
            "logl={logl} truth={}",
            mock.logl_true
        );
    }

    #[test]
    fn projection_order_is_photometry_first() {
        let m = model();
        let mock = generate_mock("t", &m, &spec()).unwrap();
        let projected = model_to_data(&m, &mock.data).unwrap();
        assert_eq!(projected.len(), mock.data.len());
        // The first two entries are band-integrated, the rest resampled.
        assert!((projected[0] - 11.0).abs() < 0.1);
        assert!((projected[2] - (2.0 * 15.0 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn wrong_parameter_length_is_a_config_error() {
        let mut m = model();
        let mock = generate_mock("t", &m, &spec()).unwrap();
        let err =
            log_likelihood(&[2.0], &mock.data, &mut m, CensorPolicy::Erf, false).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn gp_logl_collapses_to_standard_for_tiny_amplitude() {
        let mut m = model();
        let mock = generate_mock("t", &m, &spec()).unwrap();
        // ln a very negative: the GP becomes independent Gaussians and the
        // total agrees with the standard likelihood (both with f off).
        let gp = log_likelihood_gp(
            &[2.0, 1.0, -40.0, 0.0],
            &mock.data,
            &mut m,
            CensorPolicy::Erf,
            false,
        )
        .unwrap();
        let standard =
            log_likelihood(&[2.0, 1.0], &mock.data, &mut m, CensorPolicy::Erf, false).unwrap();
        assert!((gp - standard).abs() < 1e-6, "gp={gp} standard={standard}");
    }

    #[test]
    fn model_uncertainty_widens_the_likelihood_for_bad_fits() {
        let mut m = model();
        let mock = generate_mock("t", &m, &spec()).unwrap();
        // At badly wrong parameters, inflating the uncertainty must not make
        // the fit worse.
        let narrow = log_likelihood(
            &[4.0, 3.0, (1e-9_f64).ln()],
            &mock.data,
            &mut m,
            CensorPolicy::Erf,
            true,
        )
        .unwrap();
        let wide = log_likelihood(
            &[4.0, 3.0, (0.5_f64).ln()],
            &mock.data,
            &mut m,
            CensorPolicy::Erf,
            true,
        )
        .unwrap();
        assert!(wide > narrow);
    }
}
