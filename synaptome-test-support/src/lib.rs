//! Shared test utilities used across synaptome crates.
//!
//! [`tracing::RecordingLayer`] captures spans and events so generator
//! instrumentation can be asserted, and [`ci::property_test_profile`] reads
//! the property-test run profile from the environment.

pub mod ci;
pub mod tracing;
