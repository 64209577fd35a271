//! Options shared by every generator.

use std::num::NonZeroUsize;

use crate::error::{GenerationError, Result};

/// Default number of attempts granted to a bounded retry loop.
pub const MAX_ATTEMPTS: usize = 1000;

/// Structural flags and the retry budget applied to a generation call.
///
/// # Examples
/// ```
/// use synaptome_core::GraphOptions;
///
/// let options = GraphOptions::default().with_multigraph(true);
/// assert!(options.directed());
/// assert!(options.multigraph());
/// assert!(!GraphOptions::undirected().directed());
/// assert_eq!(options.retry_budget().max_attempts(), 1000);
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GraphOptions {
    directed: bool,
    multigraph: bool,
    retry_budget: RetryBudget,
}

impl GraphOptions {
    /// Creates options from explicit flags.
    #[must_use]
    pub const fn new(directed: bool, multigraph: bool) -> Self {
        Self {
            directed,
            multigraph,
            retry_budget: RetryBudget::DEFAULT,
        }
    }

    /// Undirected simple graph.
    #[must_use]
    pub const fn undirected() -> Self {
        Self::new(false, false)
    }

    /// Sets whether edges are directed.
    #[must_use]
    pub const fn with_directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    /// Sets whether duplicate edges are allowed.
    #[must_use]
    pub const fn with_multigraph(mut self, multigraph: bool) -> Self {
        self.multigraph = multigraph;
        self
    }

    /// Replaces the retry budget of bounded sampling loops.
    #[must_use]
    pub const fn with_retry_budget(mut self, retry_budget: RetryBudget) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    /// Returns whether edges are directed.
    #[must_use]
    #[rustfmt::skip]
    pub const fn directed(&self) -> bool { self.directed }

    /// Returns whether duplicate edges are allowed.
    #[must_use]
    #[rustfmt::skip]
    pub const fn multigraph(&self) -> bool { self.multigraph }

    /// Returns the retry budget of bounded sampling loops.
    #[must_use]
    #[rustfmt::skip]
    pub const fn retry_budget(&self) -> RetryBudget { self.retry_budget }
}

impl Default for GraphOptions {
    fn default() -> Self {
        Self::new(true, false)
    }
}

/// Upper bound on the iterations of a rejection or repair loop.
///
/// Exhausting the budget is reported as
/// [`GenerationError::ConvergenceFailure`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryBudget(NonZeroUsize);

impl RetryBudget {
    const DEFAULT: Self = match NonZeroUsize::new(MAX_ATTEMPTS) {
        Some(attempts) => Self(attempts),
        None => Self(NonZeroUsize::MIN),
    };

    /// Creates a budget allowing `max_attempts` iterations.
    ///
    /// # Errors
    /// Returns [`GenerationError::InvalidParameter`] when `max_attempts` is
    /// zero.
    ///
    /// # Examples
    /// ```
    /// use synaptome_core::RetryBudget;
    ///
    /// let budget = RetryBudget::new(50)?;
    /// assert_eq!(budget.max_attempts(), 50);
    /// assert!(RetryBudget::new(0).is_err());
    /// # Ok::<(), synaptome_core::GenerationError>(())
    /// ```
    pub fn new(max_attempts: usize) -> Result<Self> {
        NonZeroUsize::new(max_attempts)
            .map(Self)
            .ok_or_else(|| GenerationError::invalid("max_attempts", "must be greater than zero"))
    }

    /// Maximum number of iterations.
    #[must_use]
    pub const fn max_attempts(&self) -> usize {
        self.0.get()
    }

    /// Attempt count after which the degree repair step engages.
    #[must_use]
    pub(crate) const fn repair_threshold(&self) -> usize {
        self.0.get().div_ceil(2)
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self::DEFAULT
    }
}

pub(crate) fn probability(name: &'static str, value: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(GenerationError::invalid(
            name,
            format!("{value} is not a probability in [0, 1]"),
        ))
    }
}

pub(crate) fn non_negative(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(GenerationError::invalid(
            name,
            format!("{value} must be a finite, non-negative number"),
        ))
    }
}

pub(crate) fn positive(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(GenerationError::invalid(
            name,
            format!("{value} must be a finite, positive number"),
        ))
    }
}
