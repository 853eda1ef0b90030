//! Luminosity integrals over fitted SEDs.
//!
//! Flux densities are in mJy, wavelengths in microns, luminosity distances in
//! Mpc; results come out in erg/s (integrated) or erg/s/Hz (specific).

use crate::domain::Frame;
use crate::error::AppError;
use crate::math::{lin_interp, trapz};

/// Speed of light in micron/s.
pub const LS_MIC: f64 = 2.99792458e14;
/// One Mpc in cm.
pub const MPC: f64 = 3.08567758e24;
/// mJy per erg/s/cm^2/Hz.
pub const MJY: f64 = 1e26;

/// Integrated luminosity of an SED over an open wavelength interval,
/// integrating the flux density over frequency.
///
/// `frame` states whether `(wave, flux)` are rest-frame or observed-frame;
/// the rest-frame result carries the extra `(1+z)^-2` compression.
pub fn luminosity_integrate(
    flux: &[f64],
    wave: &[f64],
    dl: f64,
    z: f64,
    wave_range: (f64, f64),
    frame: Frame,
) -> Result<f64, AppError> {
    if flux.len() != wave.len() {
        return Err(AppError::config(
            "Flux and wavelength arrays have unequal lengths.",
        ));
    }
    if !(wave_range.0 < wave_range.1) {
        return Err(AppError::config(
            "The integration wavelength range is empty.",
        ));
    }

    let mut nu_in = Vec::new();
    let mut flux_in = Vec::new();
    for (&w, &s) in wave.iter().zip(flux.iter()) {
        if w > wave_range.0 && w < wave_range.1 {
            nu_in.push(LS_MIC / w);
            flux_in.push(s);
        }
    }
    // Ascending wavelength means descending frequency, hence the sign flip.
    let f_total = -trapz(&nu_in, &flux_in) / MJY;

    let area = 4.0 * std::f64::consts::PI * (dl * MPC).powi(2);
    let lum = match frame {
        Frame::Rest => f_total * area / (1.0 + z).powi(2),
        Frame::Obs => f_total * area,
    };
    Ok(lum)
}

/// Specific luminosity at `wave0`, interpolated from the SED.
pub fn luminosity_specific(
    flux: &[f64],
    wave: &[f64],
    wave0: f64,
    dl: f64,
    z: f64,
    frame: Frame,
) -> Result<f64, AppError> {
    if flux.len() != wave.len() {
        return Err(AppError::config(
            "Flux and wavelength arrays have unequal lengths.",
        ));
    }
    if wave.len() < 2 {
        return Err(AppError::no_data(
            "Need at least two SED points to interpolate.",
        ));
    }

    let s0 = lin_interp(wave, flux, wave0);
    let area = 4.0 * std::f64::consts::PI * (dl * MPC).powi(2);
    let lnu = match frame {
        Frame::Rest => s0 * area / (1.0 + z).powi(2) / MJY,
        Frame::Obs => s0 * area / (1.0 + z) / MJY,
    };
    Ok(lnu)
}
