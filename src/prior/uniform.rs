//! Independent uniform prior over a box.

use nalgebra::{DMatrixViewMut, DVectorView};
use rand::rngs::StdRng;
use rand::Rng;

use super::{Prior, PriorError};
use crate::types::ParameterVector;

/// Uniform prior over the axis-aligned box `[minima, maxima]`.
#[derive(Debug, Clone)]
pub struct UniformPrior {
    minima: ParameterVector,
    maxima: ParameterVector,
}

impl UniformPrior {
    /// Create a uniform prior over `[minima, maxima]`.
    ///
    /// Fails with [`PriorError`] if the vectors differ in length or any
    /// lower bound is not strictly below its upper bound.
    pub fn new(minima: ParameterVector, maxima: ParameterVector) -> Result<Self, PriorError> {
        if minima.len() != maxima.len() {
            return Err(PriorError::DimensionMismatch {
                first: minima.len(),
                second: maxima.len(),
            });
        }

        for dimension in 0..minima.len() {
            if !(minima[dimension] < maxima[dimension]) {
                return Err(PriorError::InvertedBounds {
                    dimension,
                    minimum: minima[dimension],
                    maximum: maxima[dimension],
                });
            }
        }

        Ok(Self { minima, maxima })
    }

    /// Lower corner of the support box.
    pub fn minima(&self) -> &ParameterVector {
        &self.minima
    }

    /// Upper corner of the support box.
    pub fn maxima(&self) -> &ParameterVector {
        &self.maxima
    }
}

impl Prior for UniformPrior {
    fn n_dimensions(&self) -> usize {
        self.minima.len()
    }

    fn draw(&self, block: &mut DMatrixViewMut<f64>, rng: &mut StdRng) {
        for col in 0..block.ncols() {
            for row in 0..block.nrows() {
                block[(row, col)] = rng.random_range(self.minima[row]..self.maxima[row]);
            }
        }
    }

    fn drawn_point_is_accepted(&self, block: &DVectorView<f64>, _rng: &mut StdRng) -> bool {
        block
            .iter()
            .enumerate()
            .all(|(row, &value)| value >= self.minima[row] && value <= self.maxima[row])
    }
}
