//! Shared test helpers
//!
//! Fixture builders for experiments and run configurations, plus tolerance
//! assertions used across the integration tests.

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;
