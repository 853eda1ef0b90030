//! Tabular persistence of fit results.

pub mod export;

pub use export::{write_bestfit_csv, write_samples_csv, write_summary_json};
