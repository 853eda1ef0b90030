//! Photometric bandpass response curves.

use crate::error::AppError;
use crate::math::{lin_interp, trapz};

/// A filter response curve: the wavelength-dependent sensitivity of one
/// photometric band.
#[derive(Debug, Clone)]
pub struct BandPass {
    wave: Vec<f64>,
    response: Vec<f64>,
    center: f64,
}

impl BandPass {
    pub fn new(wave: Vec<f64>, response: Vec<f64>, center: f64) -> Result<Self, AppError> {
        if wave.len() != response.len() {
            return Err(AppError::config(
                "Bandpass wavelength and response arrays have unequal lengths.",
            ));
        }
        if wave.len() < 2 {
            return Err(AppError::config(
                "A bandpass needs at least two response samples.",
            ));
        }
        if wave.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AppError::config(
                "Bandpass wavelengths must be strictly increasing.",
            ));
        }
        Ok(Self {
            wave,
            response,
            center,
        })
    }

    /// A narrow top-hat response around `center`, handy for tests and mocks.
    pub fn top_hat(center: f64, half_width: f64) -> Result<Self, AppError> {
        let w = half_width.abs().max(1e-6);
        Self::new(
            vec![center - w, center - 0.5 * w, center + 0.5 * w, center + w],
            vec![0.0, 1.0, 1.0, 0.0],
            center,
        )
    }

    pub fn center(&self) -> f64 {
        self.center
    }

    /// Flux density of a model spectrum through this filter: the average of
    /// the model weighted by the response curve and normalized by the curve's
    /// own integral.
    pub fn filter_pass(&self, wave_model: &[f64], flux_model: &[f64]) -> Result<f64, AppError> {
        let weighted: Vec<f64> = self
            .wave
            .iter()
            .zip(self.response.iter())
            .map(|(&w, &r)| lin_interp(wave_model, flux_model, w) * r)
            .collect();
        let norm = trapz(&self.wave, &self.response);
        if !(norm.is_finite() && norm > 0.0) {
            return Err(AppError::numeric(
                "Bandpass response curve integrates to a non-positive value.",
            ));
        }
        Ok(trapz(&self.wave, &weighted) / norm)
    }
}
