//! Deterministic inputs shared by the benchmarks.

use rand::{SeedableRng, rngs::SmallRng};
use synaptome_core::{NodeId, Positions};

use crate::error::BenchSetupError;

/// Seed used by every benchmark.
pub const SEED: u64 = 42;

/// Fresh generator seeded with [`SEED`].
#[must_use]
pub fn bench_rng() -> SmallRng {
    SmallRng::seed_from_u64(SEED)
}

/// Node identifiers `0..count`.
#[must_use]
pub fn node_ids(count: usize) -> Vec<NodeId> {
    (0..count).collect()
}

/// Unit-spaced square grid with `side * side` points, row by row.
///
/// # Errors
/// Returns [`BenchSetupError::ZeroValue`] when `side` is zero.
///
/// # Examples
/// ```
/// use synaptome_benches::fixtures::grid_positions;
///
/// let grid = grid_positions(3)?;
/// assert_eq!(grid.len(), 9);
/// # Ok::<(), synaptome_benches::error::BenchSetupError>(())
/// ```
pub fn grid_positions(side: u32) -> Result<Positions, BenchSetupError> {
    if side == 0 {
        return Err(BenchSetupError::ZeroValue { context: "grid side" });
    }
    let points = (0..side)
        .flat_map(|row| (0..side).map(move |col| [f64::from(col), f64::from(row)]))
        .collect();
    Ok(Positions::planar(points))
}
