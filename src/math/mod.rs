//! Small numerical helpers shared across the crate.

pub mod interp;

pub use interp::*;
