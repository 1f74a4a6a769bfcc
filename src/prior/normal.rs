//! Independent Gaussian prior.

use nalgebra::{DMatrixViewMut, DVectorView};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;

use super::{Prior, PriorError};
use crate::types::ParameterVector;

/// Prior of independent Gaussians, one per coordinate.
#[derive(Debug, Clone)]
pub struct NormalPrior {
    means: ParameterVector,
    std_devs: ParameterVector,
}

impl NormalPrior {
    /// Create a Gaussian prior with per-coordinate means and standard
    /// deviations.
    ///
    /// Fails with [`PriorError`] if the vectors differ in length or any
    /// standard deviation is not strictly positive.
    pub fn new(means: ParameterVector, std_devs: ParameterVector) -> Result<Self, PriorError> {
        if means.len() != std_devs.len() {
            return Err(PriorError::DimensionMismatch {
                first: means.len(),
                second: std_devs.len(),
            });
        }

        for dimension in 0..std_devs.len() {
            if !(std_devs[dimension] > 0.0) {
                return Err(PriorError::NonPositiveSpread {
                    dimension,
                    std_dev: std_devs[dimension],
                });
            }
        }

        Ok(Self { means, std_devs })
    }

    /// Per-coordinate means.
    pub fn means(&self) -> &ParameterVector {
        &self.means
    }

    /// Per-coordinate standard deviations.
    pub fn std_devs(&self) -> &ParameterVector {
        &self.std_devs
    }

    /// Log density relative to the density maximum (which sits at the mean):
    /// `-(1/2) Σ ((x − μ)/σ)²`.
    fn ln_density_ratio(&self, block: &DVectorView<f64>) -> f64 {
        block
            .iter()
            .enumerate()
            .map(|(row, &value)| {
                let z = (value - self.means[row]) / self.std_devs[row];
                -0.5 * z * z
            })
            .sum()
    }
}

impl Prior for NormalPrior {
    fn n_dimensions(&self) -> usize {
        self.means.len()
    }

    fn draw(&self, block: &mut DMatrixViewMut<f64>, rng: &mut StdRng) {
        for col in 0..block.ncols() {
            for row in 0..block.nrows() {
                let z: f64 = rng.sample(StandardNormal);
                block[(row, col)] = self.means[row] + self.std_devs[row] * z;
            }
        }
    }

    fn drawn_point_is_accepted(&self, block: &DVectorView<f64>, rng: &mut StdRng) -> bool {
        // Thin uniformly-drawn candidates by the density ratio against the
        // mode so accepted points follow the Gaussian within the region.
        rng.random::<f64>() < self.ln_density_ratio(block).exp()
    }
}
