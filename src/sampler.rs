//! Constrained sampling from a union of cluster ellipsoids.
//!
//! After each clustering event the sampler wraps every cluster of live
//! points in an enlarged bounding ellipsoid. New candidates are drawn
//! uniformly from the union of those ellipsoids: pick an ellipsoid with
//! probability proportional to its hyper-volume, draw uniformly inside it,
//! then accept with probability `1/n_x` where `n_x` counts the ellipsoids
//! containing the candidate. The correction restores uniformity over the
//! union even where ellipsoids overlap. Surviving candidates are thinned by
//! the priors and finally by the hard likelihood constraint
//! `L(x) > L_worst`.

use rand::rngs::StdRng;
use rand::Rng;

use crate::ellipsoid::{Ellipsoid, EllipsoidError};
use crate::likelihood::Likelihood;
use crate::prior::Prior;
use crate::statistics::log_sum_exp_slice;
use crate::types::{ParameterMatrix, ParameterVector};

/// Outcome of a constrained draw.
#[derive(Debug, Clone)]
pub enum DrawOutcome {
    /// A point beating the likelihood constraint was found.
    Found {
        /// The newly drawn point.
        point: ParameterVector,
        /// Its log-likelihood, strictly above the constraint.
        log_likelihood: f64,
    },
    /// Every attempt was spent without beating the constraint.
    Exhausted {
        /// Number of candidates generated.
        attempts: usize,
    },
}

/// Failure on the draw path.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawError {
    /// The likelihood returned NaN for a candidate.
    PathologicalLikelihood {
        /// The candidate that triggered the NaN.
        point: Vec<f64>,
    },
    /// No ellipsoids have been built yet.
    NoEllipsoids,
}

impl std::fmt::Display for DrawError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrawError::PathologicalLikelihood { point } => {
                write!(f, "Likelihood returned NaN at {:?}", point)
            }
            DrawError::NoEllipsoids => {
                write!(f, "Constrained draw requested before any ellipsoid was built")
            }
        }
    }
}

impl std::error::Error for DrawError {}

/// Sampler over the union of per-cluster bounding ellipsoids.
///
/// Holds the ellipsoid set between clustering events; the enlargement factor
/// applied at build time follows the schedule `f = α₀ · X^β` where `X` is
/// the remaining prior mass, so the ellipsoids relax early and tighten as
/// the run closes in on the high-likelihood regions.
#[derive(Debug, Clone)]
pub struct MultiEllipsoidSampler {
    initial_enlargement_fraction: f64,
    shrinking_rate: f64,
    ellipsoids: Vec<Ellipsoid>,
}

impl MultiEllipsoidSampler {
    /// Create a sampler with enlargement schedule parameters `α₀ ≥ 0` and
    /// `β ∈ (0, 1)`.
    ///
    /// # Panics
    ///
    /// Panics if the parameters are outside those ranges.
    pub fn new(initial_enlargement_fraction: f64, shrinking_rate: f64) -> Self {
        assert!(
            initial_enlargement_fraction >= 0.0,
            "initial_enlargement_fraction must be non-negative"
        );
        assert!(
            shrinking_rate > 0.0 && shrinking_rate < 1.0,
            "shrinking_rate must be in (0, 1)"
        );
        Self {
            initial_enlargement_fraction,
            shrinking_rate,
            ellipsoids: Vec::new(),
        }
    }

    /// Current enlargement factor for a given remaining prior mass:
    /// `α₀ · exp(β · log_remaining_prior_mass)`.
    pub fn enlargement(&self, log_remaining_prior_mass: f64) -> f64 {
        self.initial_enlargement_fraction
            * (self.shrinking_rate * log_remaining_prior_mass).exp()
    }

    /// Rebuild one ellipsoid per cluster from the live sample.
    ///
    /// `indices` assigns each column of `sample` to a cluster in
    /// `[0, n_clusters)`; `sizes` are the per-cluster populations. Cluster
    /// sub-samples are copied into the ellipsoids, so the live matrix is not
    /// borrowed past this call.
    pub fn build(
        &mut self,
        sample: &ParameterMatrix,
        n_clusters: usize,
        indices: &[usize],
        sizes: &[usize],
        log_remaining_prior_mass: f64,
    ) -> Result<(), EllipsoidError> {
        let enlargement = self.enlargement(log_remaining_prior_mass);
        let n_dimensions = sample.nrows();

        let mut ellipsoids = Vec::with_capacity(n_clusters);

        for cluster in 0..n_clusters {
            let members: Vec<usize> = indices
                .iter()
                .enumerate()
                .filter(|&(_, &c)| c == cluster)
                .map(|(point, _)| point)
                .collect();
            debug_assert_eq!(members.len(), sizes[cluster]);

            if members.is_empty() {
                continue;
            }

            let block = ParameterMatrix::from_fn(n_dimensions, members.len(), |row, col| {
                sample[(row, members[col])]
            });
            ellipsoids.push(Ellipsoid::build(&block, enlargement)?);
        }

        self.ellipsoids = ellipsoids;
        Ok(())
    }

    /// Draw a point uniformly from the ellipsoid union subject to the prior
    /// and the likelihood constraint.
    ///
    /// Each candidate generation counts as one attempt, whether it fails the
    /// overlap correction, the prior test or the likelihood constraint. When
    /// `max_attempts` candidates have been spent, [`DrawOutcome::Exhausted`]
    /// is returned and the caller ends the run gracefully.
    pub fn draw_with_constraint<L: Likelihood>(
        &self,
        priors: &[Box<dyn Prior>],
        likelihood: &L,
        worst_log_likelihood: f64,
        max_attempts: usize,
        rng: &mut StdRng,
    ) -> Result<DrawOutcome, DrawError> {
        if self.ellipsoids.is_empty() {
            return Err(DrawError::NoEllipsoids);
        }

        // Volume-proportional selection weights, computed once per draw in
        // linear space relative to the largest ellipsoid.
        let ln_volumes: Vec<f64> = self
            .ellipsoids
            .iter()
            .map(Ellipsoid::ln_hyper_volume)
            .collect();
        let ln_total = log_sum_exp_slice(&ln_volumes);
        let weights: Vec<f64> = ln_volumes.iter().map(|&v| (v - ln_total).exp()).collect();

        for _ in 0..max_attempts {
            let chosen = pick_weighted(&weights, rng);
            let candidate = self.ellipsoids[chosen].sample_interior(rng);

            // Overlap correction: accept with probability 1/n_x.
            let containing = self
                .ellipsoids
                .iter()
                .filter(|e| e.contains(&candidate))
                .count()
                .max(1);
            if containing > 1 && rng.random::<f64>() >= 1.0 / containing as f64 {
                continue;
            }

            if !priors_accept(priors, &candidate, rng) {
                continue;
            }

            let log_likelihood = likelihood.log_value(&candidate);
            if log_likelihood.is_nan() {
                return Err(DrawError::PathologicalLikelihood {
                    point: candidate.iter().copied().collect(),
                });
            }

            if log_likelihood > worst_log_likelihood {
                return Ok(DrawOutcome::Found {
                    point: candidate,
                    log_likelihood,
                });
            }
        }

        Ok(DrawOutcome::Exhausted {
            attempts: max_attempts,
        })
    }

    /// The current ellipsoid set.
    pub fn ellipsoids(&self) -> &[Ellipsoid] {
        &self.ellipsoids
    }

    /// Number of ellipsoids currently held.
    pub fn n_ellipsoids(&self) -> usize {
        self.ellipsoids.len()
    }
}

/// Sample an index with the given normalized weights.
fn pick_weighted(weights: &[f64], rng: &mut StdRng) -> usize {
    let mut target = rng.random::<f64>();
    for (index, &weight) in weights.iter().enumerate() {
        target -= weight;
        if target <= 0.0 {
            return index;
        }
    }
    weights.len() - 1
}

/// Apply each prior's rejection test to its sub-block of the candidate.
fn priors_accept(
    priors: &[Box<dyn Prior>],
    candidate: &ParameterVector,
    rng: &mut StdRng,
) -> bool {
    let mut offset = 0;
    for prior in priors {
        let span = prior.n_dimensions();
        if !prior.drawn_point_is_accepted(&candidate.rows(offset, span), rng) {
            return false;
        }
        offset += span;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::likelihood::FnLikelihood;
    use crate::prior::UniformPrior;
    use rand::SeedableRng;

    fn box_prior(side: f64, n_dimensions: usize) -> Vec<Box<dyn Prior>> {
        vec![Box::new(
            UniformPrior::new(
                ParameterVector::from_element(n_dimensions, -side),
                ParameterVector::from_element(n_dimensions, side),
            )
            .unwrap(),
        )]
    }

    fn gaussian_cloud(rng: &mut StdRng, n_points: usize) -> ParameterMatrix {
        ParameterMatrix::from_fn(2, n_points, |_, _| {
            use rand_distr::StandardNormal;
            rng.sample::<f64, _>(StandardNormal)
        })
    }

    #[test]
    fn enlargement_schedule_decays_with_remaining_mass() {
        let sampler = MultiEllipsoidSampler::new(2.0, 0.5);
        assert!((sampler.enlargement(0.0) - 2.0).abs() < 1e-14);

        let early = sampler.enlargement(-0.1);
        let late = sampler.enlargement(-5.0);
        assert!(early < 2.0);
        assert!(late < early);
    }

    #[test]
    fn build_produces_one_ellipsoid_per_cluster() {
        let mut rng = StdRng::seed_from_u64(3);
        let sample = gaussian_cloud(&mut rng, 40);
        let indices: Vec<usize> = (0..40).map(|p| if p < 25 { 0 } else { 1 }).collect();

        let mut sampler = MultiEllipsoidSampler::new(1.0, 0.5);
        sampler
            .build(&sample, 2, &indices, &[25, 15], 0.0)
            .unwrap();

        assert_eq!(sampler.n_ellipsoids(), 2);
        assert_eq!(sampler.ellipsoids()[0].n_points(), 25);
        assert_eq!(sampler.ellipsoids()[1].n_points(), 15);
    }

    #[test]
    fn drawn_points_beat_the_constraint() {
        let mut rng = StdRng::seed_from_u64(9);
        let sample = gaussian_cloud(&mut rng, 100);
        let indices = vec![0_usize; 100];

        let mut sampler = MultiEllipsoidSampler::new(1.0, 0.5);
        sampler.build(&sample, 1, &indices, &[100], 0.0).unwrap();

        let priors = box_prior(10.0, 2);
        let likelihood = FnLikelihood::new(|p: &ParameterVector| -p.norm_squared());
        let worst = -4.0;

        for _ in 0..50 {
            match sampler
                .draw_with_constraint(&priors, &likelihood, worst, 10_000, &mut rng)
                .unwrap()
            {
                DrawOutcome::Found {
                    point,
                    log_likelihood,
                } => {
                    assert!(log_likelihood > worst);
                    assert_eq!(log_likelihood, -point.norm_squared());
                }
                DrawOutcome::Exhausted { .. } => {
                    panic!("draw should not exhaust on an easy constraint")
                }
            }
        }
    }

    #[test]
    fn impossible_constraint_exhausts() {
        let mut rng = StdRng::seed_from_u64(10);
        let sample = gaussian_cloud(&mut rng, 50);
        let indices = vec![0_usize; 50];

        let mut sampler = MultiEllipsoidSampler::new(1.0, 0.5);
        sampler.build(&sample, 1, &indices, &[50], 0.0).unwrap();

        let priors = box_prior(10.0, 2);
        let likelihood = FnLikelihood::new(|_: &ParameterVector| 0.0);

        match sampler
            .draw_with_constraint(&priors, &likelihood, 1.0, 64, &mut rng)
            .unwrap()
        {
            DrawOutcome::Exhausted { attempts } => assert_eq!(attempts, 64),
            DrawOutcome::Found { .. } => panic!("nothing beats a constraint above the maximum"),
        }
    }

    #[test]
    fn nan_likelihood_is_fatal() {
        let mut rng = StdRng::seed_from_u64(11);
        let sample = gaussian_cloud(&mut rng, 50);
        let indices = vec![0_usize; 50];

        let mut sampler = MultiEllipsoidSampler::new(1.0, 0.5);
        sampler.build(&sample, 1, &indices, &[50], 0.0).unwrap();

        let priors = box_prior(10.0, 2);
        let likelihood = FnLikelihood::new(|_: &ParameterVector| f64::NAN);

        let result =
            sampler.draw_with_constraint(&priors, &likelihood, -1.0, 100, &mut rng);
        assert!(matches!(
            result,
            Err(DrawError::PathologicalLikelihood { .. })
        ));
    }

    #[test]
    fn draw_before_build_is_an_error() {
        let sampler = MultiEllipsoidSampler::new(1.0, 0.5);
        let priors = box_prior(1.0, 2);
        let likelihood = FnLikelihood::new(|_: &ParameterVector| 0.0);
        let mut rng = StdRng::seed_from_u64(12);

        let result = sampler.draw_with_constraint(&priors, &likelihood, -1.0, 10, &mut rng);
        assert_eq!(result.unwrap_err(), DrawError::NoEllipsoids);
    }
}
