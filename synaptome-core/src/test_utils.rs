//! Shared test utilities for `synaptome-core`.

use proptest::test_runner::Config as ProptestConfig;
use rand::{SeedableRng, rngs::SmallRng};
use synaptome_test_support::ci::property_test_profile::ProptestRunProfile;

/// Builds a standard proptest configuration from the shared CI profile.
///
/// This keeps property suites aligned on the same `PROPTEST_CASES` and
/// `SYNAPTOME_PBT_FORK` interpretation.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

/// Deterministic generator used by unit tests.
#[must_use]
pub(crate) fn seeded_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Node ids `0..count`.
#[must_use]
pub(crate) fn node_range(count: usize) -> Vec<usize> {
    (0..count).collect()
}
