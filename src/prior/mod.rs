//! Prior distributions over blocks of the parameter space.
//!
//! A run composes one or more priors; each governs a contiguous block of
//! coordinates and the blocks are concatenated in insertion order, their
//! dimensions summing to D. Priors are black-box samplers to the nested
//! iteration: they fill the initial population and thin the candidates
//! produced by the constrained ellipsoid draw.

mod normal;
mod uniform;

pub use normal::NormalPrior;
pub use uniform::UniformPrior;

use nalgebra::{DMatrixViewMut, DVectorView};
use rand::rngs::StdRng;

/// Failure to construct a prior.
#[derive(Debug, Clone, PartialEq)]
pub enum PriorError {
    /// The parameter vectors defining the prior have different lengths.
    DimensionMismatch {
        /// Length of the first defining vector.
        first: usize,
        /// Length of the second defining vector.
        second: usize,
    },

    /// A lower bound is not strictly below its upper bound.
    InvertedBounds {
        /// Coordinate at fault.
        dimension: usize,
        /// Offending lower bound.
        minimum: f64,
        /// Offending upper bound.
        maximum: f64,
    },

    /// A scale parameter is not strictly positive.
    NonPositiveSpread {
        /// Coordinate at fault.
        dimension: usize,
        /// Offending standard deviation.
        std_dev: f64,
    },
}

impl std::fmt::Display for PriorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriorError::DimensionMismatch { first, second } => {
                write!(
                    f,
                    "Prior is misconfigured: defining vectors have lengths {} and {}",
                    first, second
                )
            }
            PriorError::InvertedBounds {
                dimension,
                minimum,
                maximum,
            } => {
                write!(
                    f,
                    "Prior is misconfigured: bounds [{}, {}] for coordinate {} are not increasing",
                    minimum, maximum, dimension
                )
            }
            PriorError::NonPositiveSpread { dimension, std_dev } => {
                write!(
                    f,
                    "Prior is misconfigured: standard deviation {} for coordinate {} is not positive",
                    std_dev, dimension
                )
            }
        }
    }
}

impl std::error::Error for PriorError {}

/// A prior distribution over a block of coordinates.
pub trait Prior {
    /// Number of coordinates this prior governs.
    fn n_dimensions(&self) -> usize;

    /// Fill each column of `block` with an independent sample.
    fn draw(&self, block: &mut DMatrixViewMut<f64>, rng: &mut StdRng);

    /// Rejection test for a candidate sub-vector produced by the constrained
    /// ellipsoid draw.
    ///
    /// Uniform priors accept iff the block lies inside their support;
    /// non-uniform priors thin by density so that accepted candidates are
    /// distributed per the prior within the sampled region.
    fn drawn_point_is_accepted(&self, block: &DVectorView<f64>, rng: &mut StdRng) -> bool;
}
