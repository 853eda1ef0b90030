//! The model-combiner seam and parameter specifications.
//!
//! The physical emission-template library lives outside this crate; the
//! fitter only consumes [`ModelCombiner`]. A small linear model is provided
//! for mocks and tests.

pub mod linear;

pub use linear::*;

use crate::error::AppError;

/// One model parameter: either pinned to a value or free with prior bounds.
///
/// Resolved once at model-build time; the fitter only ever sees the varying
/// subset and its bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamSpec {
    Fixed(f64),
    Varying { min: f64, max: f64 },
}

impl ParamSpec {
    pub fn is_varying(self) -> bool {
        matches!(self, ParamSpec::Varying { .. })
    }

    /// Midpoint of the bounds for varying parameters, the pinned value
    /// otherwise. Used as a deterministic starting value.
    pub fn initial(self) -> f64 {
        match self {
            ParamSpec::Fixed(v) => v,
            ParamSpec::Varying { min, max } => 0.5 * (min + max),
        }
    }

    pub fn bounds(self) -> Option<(f64, f64)> {
        match self {
            ParamSpec::Fixed(_) => None,
            ParamSpec::Varying { min, max } => Some((min, max)),
        }
    }

    pub fn validate(self) -> Result<(), AppError> {
        if let ParamSpec::Varying { min, max } = self {
            if !(min.is_finite() && max.is_finite() && max > min) {
                return Err(AppError::config(
                    "Varying parameter bounds must be finite with max > min.",
                ));
            }
        }
        Ok(())
    }
}

/// The combined parametric emission model, evaluated on a dense internal
/// wavelength grid. Mirrors the interface the fitter consumes from the
/// external template library.
pub trait ModelCombiner: Send + Sync {
    /// Update the varying parameters. The slice length must equal
    /// `par_vary_list().len()`.
    fn update_par_list(&mut self, pars: &[f64]) -> Result<(), AppError>;

    /// The internal wavelength grid the model is evaluated on.
    fn x_list(&self) -> &[f64];

    /// Total model flux on `x_list()` for the current parameters.
    fn combine_result(&self) -> Vec<f64>;

    /// Per-component flux contributions for the current parameters.
    fn component_result(&self) -> Vec<(String, Vec<f64>)>;

    /// Current values of the varying parameters, in sampling order.
    fn par_vary_list(&self) -> Vec<f64>;

    /// Prior bounds for the varying parameters, in sampling order.
    fn par_vary_ranges(&self) -> Vec<(f64, f64)>;

    /// Names of the varying parameters, in sampling order.
    fn par_vary_names(&self) -> Vec<String>;
}
