//! Property-test run profile read from the environment.
//!
//! Every proptest suite in the workspace sizes its runs through
//! [`ProptestRunProfile`], so CI can scale case counts in one place.

use std::env;

/// Overrides the number of cases per property.
pub const PROPTEST_CASES_ENV_KEY: &str = "PROPTEST_CASES";
/// Runs each case in a forked subprocess when truthy.
pub const SYNAPTOME_PBT_FORK_ENV_KEY: &str = "SYNAPTOME_PBT_FORK";

/// Case count and fork mode for a property suite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProptestRunProfile {
    cases: u32,
    fork: bool,
}

impl ProptestRunProfile {
    /// Reads overrides from the environment, falling back to the defaults
    /// when a variable is unset or malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use synaptome_test_support::ci::property_test_profile::ProptestRunProfile;
    ///
    /// let profile = ProptestRunProfile::load(32, false);
    /// assert!(profile.cases() > 0);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32, default_fork: bool) -> Self {
        Self {
            cases: override_or(PROPTEST_CASES_ENV_KEY, default_cases, parse_cases),
            fork: override_or(SYNAPTOME_PBT_FORK_ENV_KEY, default_fork, parse_flag),
        }
    }

    /// Cases per property.
    #[must_use]
    #[rustfmt::skip]
    pub const fn cases(&self) -> u32 { self.cases }

    /// Whether cases run in forked subprocesses.
    #[must_use]
    #[rustfmt::skip]
    pub const fn fork(&self) -> bool { self.fork }
}

fn override_or<T>(key: &'static str, default: T, parse: fn(&str) -> Option<T>) -> T {
    let Ok(raw) = env::var(key) else {
        return default;
    };
    parse(&raw).unwrap_or_else(|| {
        tracing::warn!(env = key, raw = %raw, "ignoring malformed property-test override");
        default
    })
}

fn parse_cases(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|cases| *cases > 0)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use rstest::rstest;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_env<T>(cases: Option<&str>, fork: Option<&str>, f: impl FnOnce() -> T) -> T {
        let _lock = ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let saved: Vec<(&str, Option<String>)> = [PROPTEST_CASES_ENV_KEY, SYNAPTOME_PBT_FORK_ENV_KEY]
            .into_iter()
            .map(|key| (key, env::var(key).ok()))
            .collect();
        for (key, value) in [(PROPTEST_CASES_ENV_KEY, cases), (SYNAPTOME_PBT_FORK_ENV_KEY, fork)] {
            match value {
                // SAFETY: ENV_LOCK serialises every test touching these variables.
                Some(value) => unsafe { env::set_var(key, value) },
                // SAFETY: as above.
                None => unsafe { env::remove_var(key) },
            }
        }
        let out = f();
        for (key, value) in saved {
            match value {
                // SAFETY: as above.
                Some(value) => unsafe { env::set_var(key, value) },
                // SAFETY: as above.
                None => unsafe { env::remove_var(key) },
            }
        }
        out
    }

    #[rstest]
    fn defaults_apply_without_overrides() {
        let profile = with_env(None, None, || ProptestRunProfile::load(64, false));
        assert_eq!(profile, ProptestRunProfile { cases: 64, fork: false });
    }

    #[rstest]
    #[case("1", 1)]
    #[case(" 250 ", 250)]
    #[case("25000", 25_000)]
    fn valid_case_overrides_win(#[case] raw: &str, #[case] expected: u32) {
        let profile = with_env(Some(raw), None, || ProptestRunProfile::load(64, false));
        assert_eq!(profile.cases(), expected);
    }

    #[rstest]
    #[case("0")]
    #[case("-1")]
    #[case("many")]
    fn malformed_case_overrides_fall_back(#[case] raw: &str) {
        let profile = with_env(Some(raw), None, || ProptestRunProfile::load(64, false));
        assert_eq!(profile.cases(), 64);
    }

    #[rstest]
    #[case("true", true)]
    #[case("ON", true)]
    #[case("1", true)]
    #[case("no", false)]
    #[case("0", false)]
    #[case("maybe", true)]
    fn fork_flag_parses_or_keeps_default(#[case] raw: &str, #[case] expected: bool) {
        let profile = with_env(None, Some(raw), || ProptestRunProfile::load(64, true));
        assert_eq!(profile.fork(), expected);
    }
}
