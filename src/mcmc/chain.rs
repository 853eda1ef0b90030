//! Thinned chain storage.
//!
//! A `Chain` holds the retained history of one phase: every `thin`-th raw
//! step's walker positions and log-likelihoods. It is reset at each phase
//! boundary; only the best point crosses over, via the reseed ball.

/// Retained sampler history, rebuilt per phase.
#[derive(Debug, Clone)]
pub struct Chain {
    n_pars: usize,
    thin: usize,
    raw_steps: usize,
    /// retained steps x walkers x parameters
    positions: Vec<Vec<Vec<f64>>>,
    /// retained steps x walkers
    logls: Vec<Vec<f64>>,
}

impl Chain {
    pub fn new(n_pars: usize, thin: usize) -> Self {
        Self {
            n_pars,
            thin,
            raw_steps: 0,
            positions: Vec::new(),
            logls: Vec::new(),
        }
    }

    /// Record one raw step. Returns whether the step was retained.
    pub fn push(&mut self, positions: &[Vec<f64>], logls: &[f64]) -> bool {
        self.raw_steps += 1;
        if self.raw_steps % self.thin != 0 {
            return false;
        }
        self.positions.push(positions.to_vec());
        self.logls.push(logls.to_vec());
        true
    }

    /// Retained (thinned) step count.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn n_pars(&self) -> usize {
        self.n_pars
    }

    pub fn thin(&self) -> usize {
        self.thin
    }

    /// Raw steps seen since the last reset, retained or not.
    pub fn raw_steps(&self) -> usize {
        self.raw_steps
    }

    pub fn reset(&mut self) {
        self.raw_steps = 0;
        self.positions.clear();
        self.logls.clear();
    }

    /// The position with the maximum retained log-likelihood, with its value.
    /// Ties go to the earliest occurrence (step order, then walker order).
    pub fn p_logl_max(&self) -> Option<(Vec<f64>, f64)> {
        let mut best: Option<(&[f64], f64)> = None;
        for (step, logls) in self.positions.iter().zip(self.logls.iter()) {
            for (pos, &logl) in step.iter().zip(logls.iter()) {
                match best {
                    Some((_, b)) if logl <= b => {}
                    _ => best = Some((pos, logl)),
                }
            }
        }
        best.map(|(pos, logl)| (pos.to_vec(), logl))
    }

    /// Collapse the step and walker axes into one sample matrix, dropping the
    /// first `discard` retained steps. Rows are ordered step-major.
    pub fn flatten(&self, discard: usize) -> Vec<Vec<f64>> {
        self.positions
            .iter()
            .skip(discard)
            .flat_map(|step| step.iter().cloned())
            .collect()
    }

    /// Log-likelihoods aligned row-for-row with [`Chain::flatten`].
    pub fn flat_logl(&self, discard: usize) -> Vec<f64> {
        self.logls
            .iter()
            .skip(discard)
            .flat_map(|step| step.iter().copied())
            .collect()
    }

    /// The series of one parameter for one walker, for autocorrelation.
    pub fn walker_series(&self, walker: usize, par: usize) -> Vec<f64> {
        self.positions
            .iter()
            .map(|step| step[walker][par])
            .collect()
    }

    pub fn n_walkers(&self) -> usize {
        self.positions.first().map_or(0, |step| step.len())
    }
}
