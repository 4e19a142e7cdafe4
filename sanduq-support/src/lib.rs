//! # Sanduq Support
//!
//! Shared utilities for the Sanduq DI crates.
//!
//! This crate provides:
//! - Text rendering for resolution chains and error hints
//! - Tracing subscriber setup for binaries and demos

pub mod logging;
pub mod rendering;
