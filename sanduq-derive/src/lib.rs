//! Derive macros for Sanduq.

pub use sanduq_macros::*;
