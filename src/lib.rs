//! `sedfit` library crate.
//!
//! Fits a parametric emission model to a multi-wavelength measurement set
//! (broadband photometry plus optional spectroscopy) with Bayesian MCMC:
//!
//! - censoring-aware likelihoods (upper limits handled by selectable policies)
//! - optional Gaussian-process treatment of correlated spectral residuals
//! - a multi-phase ensemble / parallel-tempering search with shrinking-ball
//!   re-seeding between phases
//! - posterior extraction, quantile summaries, and tabular persistence
//!
//! The physical emission-template library is deliberately external: the fitter
//! only consumes the [`models::ModelCombiner`] interface.

pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod likelihood;
pub mod math;
pub mod mcmc;
pub mod models;
pub mod postprocess;
pub mod report;
