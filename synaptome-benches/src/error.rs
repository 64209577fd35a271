//! Benchmark setup error type.

use synaptome_core::GenerationError;

/// Errors that may occur while preparing a benchmark.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Parameter validation or a warm-up generation failed.
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
    /// A zero value was passed where a non-zero integer was required.
    #[error("expected a non-zero value for {context}")]
    ZeroValue {
        /// The parameter that was unexpectedly zero.
        context: &'static str,
    },
}
