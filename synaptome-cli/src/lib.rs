//! Support library for the synaptome CLI binary.
//!
//! Exposes argument parsing, generation and edge-list rendering so tests can
//! drive the command pipeline without spawning a process.

pub mod cli;
pub mod logging;
