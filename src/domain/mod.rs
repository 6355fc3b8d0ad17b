//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the cleaned input series (`Observation`, `Series`)
//! - fitting outputs (`ThresholdFitResult`, `AnalysisResultSet`)
//! - analysis outputs (`StableRegion`, `AgreementCurve`, `ThresholdReport`)
//! - the run configuration (`AnalysisConfig`)

pub mod types;

pub use types::*;
