//! Shared constants and synthetic data generation.
//!
//! The constants are used across the crate; the synthetic generator builds
//! on the experiment types and is used by tests and benches.

pub mod constants;
pub mod synthetic;
