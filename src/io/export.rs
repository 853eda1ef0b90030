//! Export posterior results to plain tabular files.
//!
//! Two artifacts, both part of the reproducibility contract:
//!
//! - the posterior sample table, one row per retained sample, columns in
//!   parameter order with the log-likelihood appended;
//! - the best-fit summary table, one row per parameter with the low, center
//!   and high quantiles.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::PosteriorSummary;
use crate::error::AppError;
use crate::mcmc::FitOutput;

/// Write the flattened posterior samples to a CSV file.
pub fn write_samples_csv(path: &Path, output: &FitOutput) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create sample table '{}': {e}", path.display()))
    })?;

    writeln!(file, "{},logl", output.par_names.join(","))
        .map_err(|e| AppError::new(2, format!("Failed to write sample table header: {e}")))?;

    for (row, logl) in output.samples.iter().zip(output.logl.iter()) {
        let cells: Vec<String> = row.iter().map(|v| format!("{v:.10e}")).collect();
        writeln!(file, "{},{logl:.10e}", cells.join(","))
            .map_err(|e| AppError::new(2, format!("Failed to write sample table row: {e}")))?;
    }

    Ok(())
}

/// Write the per-parameter quantile summary to a CSV file.
pub fn write_bestfit_csv(path: &Path, summary: &PosteriorSummary) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::new(2, format!("Failed to create best-fit table '{}': {e}", path.display()))
    })?;

    let p = &summary.percentiles;
    writeln!(file, "parameter,p{},p{},p{}", p.low, p.center, p.high)
        .map_err(|e| AppError::new(2, format!("Failed to write best-fit header: {e}")))?;

    for param in &summary.params {
        writeln!(
            file,
            "{},{:.10e},{:.10e},{:.10e}",
            param.name, param.low, param.center, param.high
        )
        .map_err(|e| AppError::new(2, format!("Failed to write best-fit row: {e}")))?;
    }

    Ok(())
}

/// Serialize the summary as JSON for machine consumption.
pub fn write_summary_json(path: &Path, summary: &PosteriorSummary) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| AppError::new(2, format!("Failed to serialize the summary: {e}")))?;
    std::fs::write(path, json).map_err(|e| {
        AppError::new(2, format!("Failed to write summary '{}': {e}", path.display()))
    })
}
