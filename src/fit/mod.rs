//! Tail fitting across candidate thresholds.
//!
//! Responsibilities:
//!
//! - generate the threshold grid
//! - fit a GPD per threshold by maximum likelihood (parallel across thresholds)
//! - derive return values and AICc for the GPD and exponential models

pub mod engine;
pub mod grid;
pub mod mle;

pub use engine::*;
pub use grid::*;
pub use mle::*;
