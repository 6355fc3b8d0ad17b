//! `evt-threshold` library crate.
//!
//! The binary (`evt`) is a thin wrapper around this library so that:
//!
//! - the numerical pipeline is testable without spawning processes
//! - the stages can be reused from other front-ends
//!
//! Pipeline per series: [`fit`] (threshold sweep) -> [`analysis`] (stability,
//! agreement, resolution). [`app::batch`] maps it over many series.

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
