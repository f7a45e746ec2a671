//! Exporting chains for external plotting and analysis.

#[cfg(feature = "csv")]
pub mod csv;
