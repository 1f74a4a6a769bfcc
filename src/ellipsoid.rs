//! Bounding ellipsoids around clusters of live points.
//!
//! Each cluster of the live sample is wrapped in an ellipsoid derived from
//! its sample covariance, inflated by an enlargement factor `f`: the
//! containment region is `(x − c)ᵀ Σ⁻¹ (x − c) ≤ 1 + f`. The constrained
//! draw samples uniformly from the union of these regions.

use nalgebra::SymmetricEigen;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;
use statrs::function::gamma::ln_gamma;

use crate::constants::COVARIANCE_FLOOR;
use crate::types::{ParameterMatrix, ParameterVector};

/// Failure to build an ellipsoid from a cluster sample.
#[derive(Debug, Clone, PartialEq)]
pub enum EllipsoidError {
    /// The eigen-decomposition of the sample covariance produced a
    /// non-finite eigenvalue.
    IllConditioned {
        /// Index of the offending eigenvalue.
        axis: usize,
        /// The non-finite value encountered.
        eigenvalue: f64,
    },
}

impl std::fmt::Display for EllipsoidError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EllipsoidError::IllConditioned { axis, eigenvalue } => {
                write!(
                    f,
                    "Ellipsoid covariance is ill-conditioned: eigenvalue {} along axis {}",
                    eigenvalue, axis
                )
            }
        }
    }
}

impl std::error::Error for EllipsoidError {}

/// An enlarged bounding ellipsoid for one cluster of live points.
///
/// Holds the cluster centroid, sample covariance, its eigen-decomposition,
/// the enlargement factor and the enclosing hyper-volume. All buffers are
/// owned copies; nothing borrows the sampler's live matrix.
#[derive(Debug, Clone)]
pub struct Ellipsoid {
    center: ParameterVector,
    covariance: ParameterMatrix,
    eigenvalues: ParameterVector,
    eigenvectors: ParameterMatrix,
    enlargement: f64,
    ln_hyper_volume: f64,
    n_points: usize,
}

impl Ellipsoid {
    /// Build an ellipsoid from a D×n cluster sample with enlargement `f ≥ 0`.
    ///
    /// The covariance is the unbiased sample covariance (divisor n−1) when
    /// n > 1; a single-point cluster falls back to a spherical `εI`
    /// covariance. Eigenvalues are floored at ε so degenerate clusters keep
    /// a usable (if thin) containment region.
    pub fn build(sample: &ParameterMatrix, enlargement: f64) -> Result<Self, EllipsoidError> {
        let n_dimensions = sample.nrows();
        let n_points = sample.ncols();

        let center = sample.column_mean();

        let covariance = if n_points > 1 {
            let mut centered = sample.clone();
            for mut column in centered.column_iter_mut() {
                column -= &center;
            }
            (&centered * centered.transpose()) / (n_points as f64 - 1.0)
        } else {
            ParameterMatrix::identity(n_dimensions, n_dimensions) * COVARIANCE_FLOOR
        };

        let decomposition = SymmetricEigen::new(covariance.clone());
        let mut eigenvalues = decomposition.eigenvalues;
        let eigenvectors = decomposition.eigenvectors;

        for (axis, value) in eigenvalues.iter_mut().enumerate() {
            if !value.is_finite() {
                return Err(EllipsoidError::IllConditioned {
                    axis,
                    eigenvalue: *value,
                });
            }
            if *value < COVARIANCE_FLOOR {
                *value = COVARIANCE_FLOOR;
            }
        }

        let ln_hyper_volume = ln_unit_ball_volume(n_dimensions)
            + eigenvalues
                .iter()
                .map(|&lambda| 0.5 * ((1.0 + enlargement) * lambda).ln())
                .sum::<f64>();

        Ok(Self {
            center,
            covariance,
            eigenvalues,
            eigenvectors,
            enlargement,
            ln_hyper_volume,
            n_points,
        })
    }

    /// Whether `point` lies inside the enlarged containment region.
    pub fn contains(&self, point: &ParameterVector) -> bool {
        let offset = point - &self.center;
        let rotated = self.eigenvectors.transpose() * offset;

        let mahalanobis_sq: f64 = rotated
            .iter()
            .zip(self.eigenvalues.iter())
            .map(|(&y, &lambda)| y * y / lambda)
            .sum();

        mahalanobis_sq <= 1.0 + self.enlargement
    }

    /// Draw a point uniformly from the ellipsoid interior.
    ///
    /// A uniform D-ball deviate (isotropic Gaussian direction, radius
    /// `U(0,1)^(1/D)`) is stretched along each eigen-axis by
    /// `√((1+f)·λ)`, rotated into the eigenbasis and shifted to the center.
    pub fn sample_interior(&self, rng: &mut StdRng) -> ParameterVector {
        let n_dimensions = self.center.len();

        let mut direction =
            ParameterVector::from_fn(n_dimensions, |_, _| rng.sample::<f64, _>(StandardNormal));
        let norm = direction.norm();
        if norm > 0.0 {
            direction /= norm;
        } else {
            direction[0] = 1.0;
        }

        let radius = rng.random::<f64>().powf(1.0 / n_dimensions as f64);

        let stretched = ParameterVector::from_fn(n_dimensions, |k, _| {
            direction[k] * radius * ((1.0 + self.enlargement) * self.eigenvalues[k]).sqrt()
        });

        &self.center + &self.eigenvectors * stretched
    }

    /// Log of the enclosing hyper-volume
    /// `V_D · Π_k √((1+f)·λ_k)`.
    pub fn ln_hyper_volume(&self) -> f64 {
        self.ln_hyper_volume
    }

    /// The cluster centroid.
    pub fn center(&self) -> &ParameterVector {
        &self.center
    }

    /// The sample covariance the ellipsoid was built from.
    pub fn covariance(&self) -> &ParameterMatrix {
        &self.covariance
    }

    /// Eigenvalues of the sample covariance, floored at ε; no ordering is
    /// guaranteed.
    pub fn eigenvalues(&self) -> &ParameterVector {
        &self.eigenvalues
    }

    /// Orthonormal eigenvector matrix of the sample covariance.
    pub fn eigenvectors(&self) -> &ParameterMatrix {
        &self.eigenvectors
    }

    /// Enlargement factor `f` the ellipsoid was built with.
    pub fn enlargement(&self) -> f64 {
        self.enlargement
    }

    /// Number of cluster points the ellipsoid was built from.
    pub fn n_points(&self) -> usize {
        self.n_points
    }
}

/// Log-volume of the unit D-ball: `(D/2)·ln π − ln Γ(D/2 + 1)`.
fn ln_unit_ball_volume(n_dimensions: usize) -> f64 {
    let half = n_dimensions as f64 / 2.0;
    half * std::f64::consts::PI.ln() - ln_gamma(half + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn gaussian_cloud(rng: &mut StdRng, n_dimensions: usize, n_points: usize) -> ParameterMatrix {
        ParameterMatrix::from_fn(n_dimensions, n_points, |_, _| {
            rng.sample::<f64, _>(StandardNormal)
        })
    }

    #[test]
    fn unit_ball_volumes_match_closed_forms() {
        // V_1 = 2, V_2 = pi, V_3 = 4/3 pi.
        assert!((ln_unit_ball_volume(1) - 2.0_f64.ln()).abs() < 1e-12);
        assert!((ln_unit_ball_volume(2) - std::f64::consts::PI.ln()).abs() < 1e-12);
        let v3 = (4.0 / 3.0) * std::f64::consts::PI;
        assert!((ln_unit_ball_volume(3) - v3.ln()).abs() < 1e-12);
    }

    #[test]
    fn interior_draws_always_contained() {
        let mut rng = StdRng::seed_from_u64(7);
        let sample = gaussian_cloud(&mut rng, 3, 200);
        let ellipsoid = Ellipsoid::build(&sample, 0.5).unwrap();

        for _ in 0..1000 {
            let point = ellipsoid.sample_interior(&mut rng);
            assert!(
                ellipsoid.contains(&point),
                "interior draw fell outside its own ellipsoid"
            );
        }
    }

    #[test]
    fn center_is_contained_and_far_points_are_not() {
        let mut rng = StdRng::seed_from_u64(11);
        let sample = gaussian_cloud(&mut rng, 2, 100);
        let ellipsoid = Ellipsoid::build(&sample, 0.0).unwrap();

        assert!(ellipsoid.contains(ellipsoid.center()));

        let far = ellipsoid.center() + ParameterVector::from_vec(vec![100.0, 100.0]);
        assert!(!ellipsoid.contains(&far));
    }

    #[test]
    fn isotropic_volume_matches_disc_area() {
        // Two orthogonal unit offsets around the origin give a covariance of
        // (2/3)I in 2D, so the f = 0 region is the disc of radius sqrt(2/3).
        let sample = ParameterMatrix::from_vec(
            2,
            4,
            vec![1.0, 0.0, -1.0, 0.0, 0.0, 1.0, 0.0, -1.0],
        );
        let ellipsoid = Ellipsoid::build(&sample, 0.0).unwrap();

        let expected = (std::f64::consts::PI * (2.0 / 3.0)).ln();
        assert!((ellipsoid.ln_hyper_volume() - expected).abs() < 1e-10);
    }

    #[test]
    fn enlargement_scales_volume() {
        let mut rng = StdRng::seed_from_u64(13);
        let sample = gaussian_cloud(&mut rng, 2, 50);

        let tight = Ellipsoid::build(&sample, 0.0).unwrap();
        let inflated = Ellipsoid::build(&sample, 3.0).unwrap();

        // Each axis stretches by sqrt(1+f), so the area grows by (1+f)^(D/2).
        let expected_gap = 4.0_f64.ln();
        let gap = inflated.ln_hyper_volume() - tight.ln_hyper_volume();
        assert!((gap - expected_gap).abs() < 1e-10);
    }

    #[test]
    fn single_point_cluster_falls_back_to_spherical_floor() {
        let sample = ParameterMatrix::from_vec(2, 1, vec![3.0, -1.0]);
        let ellipsoid = Ellipsoid::build(&sample, 1.0).unwrap();

        assert_eq!(ellipsoid.n_points(), 1);
        assert!(ellipsoid.contains(&ParameterVector::from_vec(vec![3.0, -1.0])));
        for &lambda in ellipsoid.eigenvalues().iter() {
            assert!(lambda >= COVARIANCE_FLOOR);
        }
    }
}
