//! Random helpers shared by the generators.

use rand::{Rng, seq::index};
use rand_distr::{Binomial, Distribution};

use crate::error::{GenerationError, Result};

/// Draws from `Binomial(trials, probability)`.
pub(crate) fn binomial<R: Rng + ?Sized>(rng: &mut R, trials: usize, probability: f64) -> Result<usize> {
    if trials == 0 || probability <= 0.0 {
        return Ok(0);
    }
    let distribution = Binomial::new(trials as u64, probability)
        .map_err(|error| GenerationError::invalid("probability", error.to_string()))?;
    Ok(distribution.sample(rng) as usize)
}

/// Draws `amount` distinct indices from `0..len`, capped at `len`.
pub(crate) fn distinct_indices<R: Rng + ?Sized>(rng: &mut R, len: usize, amount: usize) -> Vec<usize> {
    index::sample(rng, len, amount.min(len)).into_vec()
}

/// Repeats each item as many times as its multiplicity.
pub(crate) fn repeat_by<T: Copy>(items: &[T], multiplicities: &[usize]) -> Vec<T> {
    let total = multiplicities.iter().sum();
    let mut out = Vec::with_capacity(total);
    for (&item, &count) in items.iter().zip(multiplicities) {
        out.extend(std::iter::repeat_n(item, count));
    }
    out
}
