//! Measurement sets and their flattened views.

use std::collections::HashSet;

use crate::data::bandpass::BandPass;
use crate::domain::CensorFlag;
use crate::error::AppError;
use crate::math::{lin_interp, median};

/// Which flattened axis to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Wavelength.
    X,
    /// Flux.
    Y,
    /// Uncertainty.
    E,
    /// Censoring flag (0 detection, 1 upper limit).
    F,
}

/// Named photometric measurements, one per band, each with a response curve.
#[derive(Debug, Clone)]
pub struct DiscreteSet {
    bands: Vec<String>,
    wave: Vec<f64>,
    flux: Vec<f64>,
    unct: Vec<f64>,
    flag: Vec<CensorFlag>,
    passes: Vec<BandPass>,
}

impl DiscreteSet {
    pub fn new(
        bands: Vec<String>,
        wave: Vec<f64>,
        flux: Vec<f64>,
        unct: Vec<f64>,
        flag: Vec<CensorFlag>,
        passes: Vec<BandPass>,
    ) -> Result<Self, AppError> {
        let n = bands.len();
        if [wave.len(), flux.len(), unct.len(), flag.len(), passes.len()]
            .iter()
            .any(|&len| len != n)
        {
            return Err(AppError::config(
                "Photometric band/wavelength/flux/uncertainty/flag arrays have unequal lengths.",
            ));
        }
        let unique: HashSet<&str> = bands.iter().map(|b| b.as_str()).collect();
        if unique.len() != n {
            return Err(AppError::config(
                "Photometric band identifiers must be unique within a set.",
            ));
        }
        Ok(Self {
            bands,
            wave,
            flux,
            unct,
            flag,
            passes,
        })
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn bands(&self) -> &[String] {
        &self.bands
    }

    fn axis(&self, axis: Axis) -> Vec<f64> {
        match axis {
            Axis::X => self.wave.clone(),
            Axis::Y => self.flux.clone(),
            Axis::E => self.unct.clone(),
            Axis::F => self.flag.iter().map(|f| f.as_f64()).collect(),
        }
    }

    fn flags(&self) -> Vec<CensorFlag> {
        self.flag.clone()
    }
}

/// An ordered spectroscopic measurement vector.
#[derive(Debug, Clone)]
pub struct ContinueSet {
    wave: Vec<f64>,
    flux: Vec<f64>,
    unct: Vec<f64>,
    flag: Vec<CensorFlag>,
}

impl ContinueSet {
    pub fn new(
        wave: Vec<f64>,
        flux: Vec<f64>,
        unct: Vec<f64>,
        flag: Vec<CensorFlag>,
    ) -> Result<Self, AppError> {
        let n = wave.len();
        if [flux.len(), unct.len(), flag.len()].iter().any(|&l| l != n) {
            return Err(AppError::config(
                "Spectroscopic wavelength/flux/uncertainty/flag arrays have unequal lengths.",
            ));
        }
        if wave.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AppError::config(
                "Spectroscopic wavelengths must be strictly increasing.",
            ));
        }
        Ok(Self {
            wave,
            flux,
            unct,
            flag,
        })
    }

    pub fn len(&self) -> usize {
        self.wave.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wave.is_empty()
    }

    /// Wavelength span, used to non-dimensionalize the GP correlation length.
    pub fn wave_span(&self) -> f64 {
        match (self.wave.first(), self.wave.last()) {
            (Some(&a), Some(&b)) => b - a,
            _ => 0.0,
        }
    }

    /// Median flux, used to non-dimensionalize the GP amplitude.
    pub fn flux_median(&self) -> f64 {
        median(&self.flux).unwrap_or(0.0)
    }

    fn axis(&self, axis: Axis) -> Vec<f64> {
        match axis {
            Axis::X => self.wave.clone(),
            Axis::Y => self.flux.clone(),
            Axis::E => self.unct.clone(),
            Axis::F => self.flag.iter().map(|f| f.as_f64()).collect(),
        }
    }

    fn flags(&self) -> Vec<CensorFlag> {
        self.flag.clone()
    }
}

/// The full observational dataset of one target.
///
/// Built once before fitting and read-only thereafter. Every flattened view
/// concatenates photometry first, spectroscopy second; the likelihood relies
/// on this ordering matching its model-projection order.
#[derive(Debug, Clone)]
pub struct SedData {
    name: String,
    pht: Option<DiscreteSet>,
    spc: Option<ContinueSet>,
}

impl SedData {
    pub fn new(
        name: impl Into<String>,
        pht: Option<DiscreteSet>,
        spc: Option<ContinueSet>,
    ) -> Result<Self, AppError> {
        let data = Self {
            name: name.into(),
            pht,
            spc,
        };
        if data.len() == 0 {
            return Err(AppError::no_data("The dataset contains no measurements."));
        }
        Ok(data)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n_pht(&self) -> usize {
        self.pht.as_ref().map_or(0, DiscreteSet::len)
    }

    pub fn n_spc(&self) -> usize {
        self.spc.as_ref().map_or(0, ContinueSet::len)
    }

    pub fn len(&self) -> usize {
        self.n_pht() + self.n_spc()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattened axis, photometry first then spectroscopy.
    pub fn get_list(&self, axis: Axis) -> Vec<f64> {
        let mut out = self.get_ds_list(axis);
        out.extend(self.get_cs_list(axis));
        out
    }

    /// Photometry-only view of an axis.
    pub fn get_ds_list(&self, axis: Axis) -> Vec<f64> {
        self.pht.as_ref().map_or_else(Vec::new, |p| p.axis(axis))
    }

    /// Spectroscopy-only view of an axis.
    pub fn get_cs_list(&self, axis: Axis) -> Vec<f64> {
        self.spc.as_ref().map_or_else(Vec::new, |s| s.axis(axis))
    }

    /// Typed censoring flags, flattened in the same order as `get_list`.
    pub fn get_flags(&self) -> Vec<CensorFlag> {
        let mut out = self.get_ds_flags();
        out.extend(self.get_cs_flags());
        out
    }

    pub fn get_ds_flags(&self) -> Vec<CensorFlag> {
        self.pht.as_ref().map_or_else(Vec::new, DiscreteSet::flags)
    }

    pub fn get_cs_flags(&self) -> Vec<CensorFlag> {
        self.spc.as_ref().map_or_else(Vec::new, ContinueSet::flags)
    }

    /// Synthesize one flux density per photometric band by integrating the
    /// model against each band's response curve.
    pub fn model_pht(&self, wave_model: &[f64], flux_model: &[f64]) -> Result<Vec<f64>, AppError> {
        let Some(pht) = &self.pht else {
            return Ok(Vec::new());
        };
        pht.passes
            .iter()
            .map(|p| p.filter_pass(wave_model, flux_model))
            .collect()
    }

    /// Resample the model onto the spectroscopic wavelength grid.
    pub fn model_spc(&self, wave_model: &[f64], flux_model: &[f64]) -> Vec<f64> {
        let Some(spc) = &self.spc else {
            return Vec::new();
        };
        spc.wave
            .iter()
            .map(|&w| lin_interp(wave_model, flux_model, w))
            .collect()
    }

    pub fn spc_wave_span(&self) -> f64 {
        self.spc.as_ref().map_or(0.0, ContinueSet::wave_span)
    }

    pub fn spc_flux_median(&self) -> f64 {
        self.spc.as_ref().map_or(0.0, ContinueSet::flux_median)
    }
}
