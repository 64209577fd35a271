//! Helpers shared by the integration suites.

use std::collections::HashSet;

use rand::{SeedableRng, rngs::SmallRng};
use synaptome_core::Edge;

pub fn rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

pub fn ids(count: usize) -> Vec<usize> {
    (0..count).collect()
}

/// Panics when `edges` holds a self-loop or a repeated row (or a repeated
/// unordered pair when `directed` is false).
pub fn assert_simple(edges: &[Edge], directed: bool) {
    let mut seen = HashSet::with_capacity(edges.len());
    for edge in edges {
        assert!(!edge.is_self_loop(), "self-loop {edge:?}");
        let key = if directed { *edge } else { edge.canonical() };
        assert!(seen.insert(key), "duplicate {edge:?}");
    }
}
