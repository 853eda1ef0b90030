//! Progress and diagnostics reporting.
//!
//! The fitter never prints on its own and never consults global state; it
//! talks to an injected [`Reporter`]. Operators get the console
//! implementation, tests get the silent one.

use crate::mcmc::PhaseDiagnostics;

pub trait Reporter {
    /// A sampling phase is about to start.
    fn phase_start(&self, name: &str, n_steps: usize);

    /// Free-form progress information.
    fn info(&self, message: &str);

    /// Advisory post-phase diagnostics. Never alters control flow.
    fn diagnostics(&self, diag: &PhaseDiagnostics);
}

/// Prints progress to stdout.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn phase_start(&self, name: &str, n_steps: usize) {
        println!("[{name}] sampling {n_steps} steps");
    }

    fn info(&self, message: &str) {
        println!("{message}");
    }

    fn diagnostics(&self, diag: &PhaseDiagnostics) {
        let mean_tau = mean(&diag.autocorr_time);
        let total_ess: f64 = diag.ess.iter().sum();
        match diag.swap_acceptance {
            Some(swap) => println!(
                "[{}] acceptance {:.3}, swap acceptance {:.3}, mean tau {:.1}, ESS {:.0}",
                diag.phase, diag.acceptance, swap, mean_tau, total_ess
            ),
            None => println!(
                "[{}] acceptance {:.3}, mean tau {:.1}, ESS {:.0}",
                diag.phase, diag.acceptance, mean_tau, total_ess
            ),
        }
    }
}

/// Discards everything. Used in tests.
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn phase_start(&self, _name: &str, _n_steps: usize) {}

    fn info(&self, _message: &str) {}

    fn diagnostics(&self, _diag: &PhaseDiagnostics) {}
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
