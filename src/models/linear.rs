//! A minimal linear model combiner.
//!
//! `flux(w) = slope * w + intercept`, with either coefficient optionally
//! pinned. This is the stand-in combiner used by mock datasets and the
//! sampler tests; real runs plug in the external template library through the
//! same [`ModelCombiner`] interface.

use crate::error::AppError;
use crate::models::{ModelCombiner, ParamSpec};

#[derive(Debug, Clone)]
pub struct LinearModel {
    grid: Vec<f64>,
    specs: [ParamSpec; 2],
    values: [f64; 2],
    vary_idx: Vec<usize>,
}

impl LinearModel {
    pub fn new(grid: Vec<f64>, slope: ParamSpec, intercept: ParamSpec) -> Result<Self, AppError> {
        if grid.len() < 2 {
            return Err(AppError::config(
                "The model wavelength grid needs at least two points.",
            ));
        }
        slope.validate()?;
        intercept.validate()?;
        let specs = [slope, intercept];
        let values = [slope.initial(), intercept.initial()];
        let vary_idx = (0..2).filter(|&i| specs[i].is_varying()).collect();
        Ok(Self {
            grid,
            specs,
            values,
            vary_idx,
        })
    }

    fn names() -> [&'static str; 2] {
        ["slope", "intercept"]
    }
}

impl ModelCombiner for LinearModel {
    fn update_par_list(&mut self, pars: &[f64]) -> Result<(), AppError> {
        if pars.len() != self.vary_idx.len() {
            return Err(AppError::config(format!(
                "Expected {} varying parameters, got {}.",
                self.vary_idx.len(),
                pars.len()
            )));
        }
        for (&idx, &v) in self.vary_idx.iter().zip(pars.iter()) {
            self.values[idx] = v;
        }
        Ok(())
    }

    fn x_list(&self) -> &[f64] {
        &self.grid
    }

    fn combine_result(&self) -> Vec<f64> {
        let [slope, intercept] = self.values;
        self.grid.iter().map(|&w| slope * w + intercept).collect()
    }

    fn component_result(&self) -> Vec<(String, Vec<f64>)> {
        vec![("linear".to_string(), self.combine_result())]
    }

    fn par_vary_list(&self) -> Vec<f64> {
        self.vary_idx.iter().map(|&i| self.values[i]).collect()
    }

    fn par_vary_ranges(&self) -> Vec<(f64, f64)> {
        self.vary_idx
            .iter()
            .filter_map(|&i| self.specs[i].bounds())
            .collect()
    }

    fn par_vary_names(&self) -> Vec<String> {
        let names = Self::names();
        self.vary_idx.iter().map(|&i| names[i].to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_and_evaluate() {
        let mut model = LinearModel::new(
            vec![0.0, 1.0, 2.0],
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
        model.update_par_list(&[2.0, 1.0]).unwrap();
        assert_eq!(model.combine_result(), vec![1.0, 3.0, 5.0]);
        assert_eq!(model.par_vary_list(), vec![2.0, 1.0]);
        assert_eq!(model.par_vary_names(), vec!["slope", "intercept"]);
        let components = model.component_result();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].0, "linear");
        assert_eq!(components[0].1, model.combine_result());
    }

    #[test]
    fn fixed_parameters_are_excluded_from_the_vary_list() {
        let model = LinearModel::new(
            vec![0.0, 1.0],
            ParamSpec::Fixed(1.5),
            ParamSpec::Varying { min: 0.0, max: 5.0 },
        )
        .unwrap();
        assert_eq!(model.par_vary_list().len(), 1);
        assert_eq!(model.par_vary_ranges(), vec![(0.0, 5.0)]);
        assert_eq!(model.par_vary_names(), vec!["intercept"]);
    }

    #[test]
    fn wrong_parameter_count_is_an_error() {
        let mut model = LinearModel::new(
            vec![0.0, 1.0],
            ParamSpec::Varying {
                min: -1.0,
                max: 1.0,
            },
            ParamSpec::Fixed(0.0),
        )
        .unwrap();
        assert!(model.update_par_list(&[1.0, 2.0]).is_err());
    }
}
