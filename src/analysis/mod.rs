//! Post-fit analysis: stages 2-4 of the pipeline.
//!
//! - `stability`: flat stretches of the shape and scale columns
//! - `agreement`: where the GPD and exponential return values meet (XX) and cross (YY)
//! - `resolver`: one final threshold from the above

pub mod agreement;
pub mod resolver;
pub mod stability;

pub use agreement::{Agreement, detect_agreement};
pub use resolver::{Resolution, build_report, find_overlaps, resolve};
pub use stability::{merge_regions, segment_size, stable_regions};
