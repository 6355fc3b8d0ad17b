//! Input/output helpers.
//!
//! - series CSV ingest (`series`)
//! - results and threshold tables (`export`)
//! - per-series report JSON read/write (`report_json`)

pub mod export;
pub mod report_json;
pub mod series;

pub use export::*;
pub use report_json::*;
pub use series::*;
