//! Tail distribution models (GPD and its exponential special case).
//!
//! Models are implemented as small, pure functions so that fitting code can
//! stay generic.

pub mod tail;

pub use tail::*;
