//! Benchmark support crate for synaptome.
//!
//! Shared fixtures and parameter types for the Criterion benchmarks of the
//! random, degree-constrained and spatial generators.

pub mod error;
pub mod fixtures;
pub mod params;
