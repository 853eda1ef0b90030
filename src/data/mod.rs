//! Observational dataset: photometric and spectroscopic measurement sets.
//!
//! Responsibilities:
//!
//! - validate and hold the measurements (detections and upper limits)
//! - expose the flattened photometry-first axis views the likelihood uses
//! - synthesize data-comparable model quantities (per-band photometry,
//!   resampled spectra)

pub mod bandpass;
pub mod mock;
pub mod set;

pub use bandpass::*;
pub use set::*;
