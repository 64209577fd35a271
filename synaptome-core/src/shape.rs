//! Spatial domains used to place nodes before distance-based generation.

use rand::Rng;

use crate::{
    error::{GenerationError, Result},
    params::{self, RetryBudget},
    spatial::Positions,
};

/// Node density used when no shape is supplied.
pub const DEFAULT_NEURON_DENSITY: f64 = 1000.0;

/// Axis-aligned bounding box of a shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Bounds {
    /// Lower corner.
    pub min: Vec<f64>,
    /// Upper corner.
    pub max: Vec<f64>,
}

/// A region of space nodes can be placed in.
pub trait Shape {
    /// Bounding box enclosing the region.
    fn bounds(&self) -> Bounds;

    /// Returns `true` when `point` lies inside the region.
    fn contains(&self, point: &[f64]) -> bool;
}

/// Axis-aligned rectangle centred on `centre`.
///
/// # Examples
/// ```
/// use synaptome_core::{Rectangle, Shape};
///
/// let rect = Rectangle::new(4.0, 2.0)?;
/// assert!(rect.contains(&[1.9, -0.9]));
/// assert!(!rect.contains(&[2.1, 0.0]));
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rectangle {
    width: f64,
    height: f64,
    centre: [f64; 2],
}

impl Rectangle {
    /// Rectangle of the given size centred on the origin.
    ///
    /// # Errors
    /// Returns [`GenerationError::InvalidParameter`] unless both sides are
    /// finite and positive.
    pub fn new(width: f64, height: f64) -> Result<Self> {
        Ok(Self {
            width: params::positive("width", width)?,
            height: params::positive("height", height)?,
            centre: [0.0, 0.0],
        })
    }

    /// Square with side `side`.
    ///
    /// # Errors
    /// Same as [`Rectangle::new`].
    pub fn square(side: f64) -> Result<Self> {
        Self::new(side, side)
    }

    /// Square holding `nodes` nodes at `density` nodes per unit area.
    ///
    /// # Errors
    /// Returns [`GenerationError::InvalidParameter`] when `density` is not
    /// positive or `nodes` is zero.
    pub fn for_density(nodes: usize, density: f64) -> Result<Self> {
        let density = params::positive("neuron_density", density)?;
        Self::square((nodes as f64 / density).sqrt())
    }

    /// Moves the centre.
    #[must_use]
    pub const fn with_centre(mut self, centre: [f64; 2]) -> Self {
        self.centre = centre;
        self
    }

    /// Returns the width.
    #[must_use]
    #[rustfmt::skip]
    pub const fn width(&self) -> f64 { self.width }

    /// Returns the height.
    #[must_use]
    #[rustfmt::skip]
    pub const fn height(&self) -> f64 { self.height }
}

impl Shape for Rectangle {
    fn bounds(&self) -> Bounds {
        let [x, y] = self.centre;
        Bounds {
            min: vec![x - self.width / 2.0, y - self.height / 2.0],
            max: vec![x + self.width / 2.0, y + self.height / 2.0],
        }
    }

    fn contains(&self, point: &[f64]) -> bool {
        let bounds = self.bounds();
        point.len() == bounds.min.len()
            && point
                .iter()
                .zip(bounds.min.iter().zip(&bounds.max))
                .all(|(value, (low, high))| (low..=high).contains(&value))
    }
}

/// Places `count` nodes uniformly inside `shape`.
///
/// Points are drawn uniformly in the bounding box and kept when the shape
/// contains them.
///
/// # Errors
/// - [`GenerationError::InvalidPositions`] when the bounding box is empty or
///   degenerate.
/// - [`GenerationError::ConvergenceFailure`] when a point cannot be placed
///   within the retry budget.
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use synaptome_core::{Rectangle, RetryBudget, Shape, uniform_positions};
///
/// let rect = Rectangle::square(2.0)?;
/// let mut rng = SmallRng::seed_from_u64(3);
/// let positions = uniform_positions(&mut rng, &rect, 50, RetryBudget::default())?;
/// assert_eq!(positions.len(), 50);
/// assert!((0..50).all(|node| positions.point(node).is_ok_and(|p| rect.contains(p))));
/// # Ok::<(), synaptome_core::GenerationError>(())
/// ```
pub fn uniform_positions<R, S>(rng: &mut R, shape: &S, count: usize, budget: RetryBudget) -> Result<Positions>
where
    R: Rng + ?Sized,
    S: Shape + ?Sized,
{
    let Bounds { min, max } = shape.bounds();
    if min.is_empty() || min.len() != max.len() || !min.iter().zip(&max).all(|(low, high)| low < high) {
        return Err(GenerationError::InvalidPositions {
            reason: "shape bounds are empty".into(),
        });
    }
    let dimensions = min.len();
    let mut coords = Vec::with_capacity(count * dimensions);
    let mut point = vec![0.0; dimensions];
    for placed in 0..count {
        let mut attempts = 0;
        loop {
            if attempts == budget.max_attempts() {
                return Err(GenerationError::ConvergenceFailure {
                    model: "uniform_positions",
                    accepted: placed,
                    target: count,
                    attempts,
                });
            }
            attempts += 1;
            for (slot, (low, high)) in point.iter_mut().zip(min.iter().zip(&max)) {
                *slot = rng.gen_range(*low..*high);
            }
            if shape.contains(&point) {
                coords.extend_from_slice(&point);
                break;
            }
        }
    }
    Positions::new(dimensions, coords)
}
