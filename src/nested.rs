//! The nested sampling engine.
//!
//! The sampler owns the live population and drives the outer loop: each
//! iteration peels off one shell of prior mass by discarding the worst live
//! point, folds its weight into the log-domain evidence and information
//! accumulators, and replaces it with a constrained draw from the ellipsoid
//! union. The loop stops when the live points' potential evidence
//! contribution drops below the termination factor relative to the evidence
//! gathered so far (Keeton 2011), or prematurely when the constrained draw
//! exhausts its attempt budget.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::cluster::Clusterer;
use crate::config::{ConfigError, SamplerConfig};
use crate::constants::{LOG_MASS_SENTINEL, PROGRESS_CADENCE};
use crate::ellipsoid::EllipsoidError;
use crate::likelihood::Likelihood;
use crate::output;
use crate::prior::Prior;
use crate::reducer::LivePointsReducer;
use crate::sampler::{DrawError, DrawOutcome, MultiEllipsoidSampler};
use crate::statistics::{log_sum_exp, log_sum_exp_slice};
use crate::types::{ParameterMatrix, PosteriorRecord};

/// Fatal failure of a nested sampling run.
#[derive(Debug)]
pub enum RunError {
    /// A cluster ellipsoid could not be built.
    Ellipsoid(EllipsoidError),

    /// The constrained draw hit a numerical pathology.
    Draw(DrawError),

    /// NaN surfaced in the likelihood or an accumulator.
    NumericalPathology {
        /// Where the pathology was detected.
        context: &'static str,
    },
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::Ellipsoid(error) => write!(f, "{}", error),
            RunError::Draw(error) => write!(f, "{}", error),
            RunError::NumericalPathology { context } => {
                write!(f, "Numerical pathology: {}", context)
            }
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RunError::Ellipsoid(error) => Some(error),
            RunError::Draw(error) => Some(error),
            RunError::NumericalPathology { .. } => None,
        }
    }
}

impl From<EllipsoidError> for RunError {
    fn from(error: EllipsoidError) -> Self {
        RunError::Ellipsoid(error)
    }
}

impl From<DrawError> for RunError {
    fn from(error: DrawError) -> Self {
        RunError::Draw(error)
    }
}

/// One clustering event on the cadence, as seen by the nested loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusteringEvent {
    /// Iteration counter when the event fired.
    pub n_iterations: usize,
    /// Cluster count produced by the event (1 during warm-up).
    pub n_clusters: usize,
}

/// Nested sampler with multi-ellipsoidal constrained prior sampling.
///
/// The live matrix and the posterior record are exclusively owned here;
/// the clusterer and the ellipsoid sampler receive views and hand back
/// owned results, never retaining references across calls.
pub struct NestedSampler<L: Likelihood, C: Clusterer> {
    config: SamplerConfig,
    priors: Vec<Box<dyn Prior>>,
    likelihood: L,
    clusterer: C,
    sampler: MultiEllipsoidSampler,
    rng: StdRng,
    n_dimensions: usize,

    live_points: ParameterMatrix,
    live_log_likelihoods: Vec<f64>,
    posterior: PosteriorRecord,

    log_evidence: f64,
    log_evidence_error: f64,
    information_gain: f64,
    log_cumulated_prior_mass: f64,
    log_remaining_prior_mass: f64,
    log_mean_live_evidence: f64,
    n_iterations: usize,
    n_clusters: usize,
    clustering_history: Vec<ClusteringEvent>,
    terminated_prematurely: bool,
    elapsed: Duration,
}

impl<L: Likelihood, C: Clusterer> NestedSampler<L, C> {
    /// Create a sampler over the concatenated priors.
    ///
    /// The parameter dimension D is the sum of the prior block dimensions;
    /// the blocks are laid out in the order the priors are given.
    pub fn new(
        config: SamplerConfig,
        priors: Vec<Box<dyn Prior>>,
        likelihood: L,
        clusterer: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let n_dimensions: usize = priors.iter().map(|p| p.n_dimensions()).sum();
        if n_dimensions == 0 {
            return Err(ConfigError::NoPriorDimensions);
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let sampler = MultiEllipsoidSampler::new(
            config.initial_enlargement_fraction,
            config.shrinking_rate,
        );

        Ok(Self {
            config,
            priors,
            likelihood,
            clusterer,
            sampler,
            rng,
            n_dimensions,
            live_points: ParameterMatrix::zeros(n_dimensions, 0),
            live_log_likelihoods: Vec::new(),
            posterior: PosteriorRecord::new(),
            log_evidence: LOG_MASS_SENTINEL,
            log_evidence_error: 0.0,
            information_gain: 0.0,
            log_cumulated_prior_mass: LOG_MASS_SENTINEL,
            log_remaining_prior_mass: 0.0,
            log_mean_live_evidence: LOG_MASS_SENTINEL,
            n_iterations: 0,
            n_clusters: 1,
            clustering_history: Vec::new(),
            terminated_prematurely: false,
            elapsed: Duration::ZERO,
        })
    }

    /// Reseed the private RNG (chainable).
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Toggle progress output on stderr (chainable).
    pub fn verbose(mut self, on: bool) -> Self {
        self.config.verbose = on;
        self
    }

    /// Run the nested sampling loop to termination.
    ///
    /// Draw-attempt exhaustion is a premature but valid termination: a
    /// warning goes to stderr, the partial posterior is finalized and
    /// `Ok(())` is returned. NaN from the likelihood aborts with
    /// [`RunError::NumericalPathology`] wrapped in the draw path, leaving
    /// the sampler state as of the failed iteration.
    pub fn run(&mut self, reducer: &mut dyn LivePointsReducer) -> Result<(), RunError> {
        let start = Instant::now();

        self.initialize()?;

        let n_initial = self.config.initial_n_live;
        let mut log_width = (-(-1.0 / n_initial as f64).exp()).ln_1p();
        self.log_cumulated_prior_mass = log_sum_exp(self.log_cumulated_prior_mass, log_width);

        let mut cluster_indices: Vec<usize> = vec![0; n_initial];
        let mut cluster_sizes: Vec<usize> = vec![n_initial];
        self.n_clusters = 1;

        loop {
            let n_live = self.live_log_likelihoods.len();

            // Locate the worst live point; its likelihood becomes the new
            // hard constraint.
            let (worst_index, worst_log_likelihood) = self.worst_live_point();
            let log_weight = log_width + worst_log_likelihood;

            self.posterior.push(
                self.live_points.column(worst_index).into_owned(),
                worst_log_likelihood,
                log_weight,
            );

            let (updated_evidence, updated_gain) = update_evidence(
                self.log_evidence,
                self.information_gain,
                log_weight,
                worst_log_likelihood,
            );
            self.log_evidence = updated_evidence;
            self.information_gain = updated_gain;
            if !self.information_gain.is_finite() || self.log_evidence.is_nan() {
                return Err(RunError::NumericalPathology {
                    context: "evidence accumulators left the finite range",
                });
            }

            // Mean live evidence after Keeton (2011): log of the mean live
            // likelihood shifted by the expected remaining prior mass.
            let n = n_live as f64;
            let log_mean_live_likelihood =
                log_sum_exp_slice(&self.live_log_likelihoods) - n.ln();
            self.log_mean_live_evidence = log_mean_live_likelihood
                + self.n_iterations as f64 * (n.ln() - (n + 1.0).ln());

            let remainder_ratio =
                (self.log_mean_live_evidence - self.log_evidence).exp();

            // Re-cluster on the configured cadence; during warm-up the
            // population still mirrors the prior and is kept as one cluster.
            if self.n_iterations % self.config.n_iterations_with_same_clustering == 0 {
                if self.n_iterations < self.config.n_initial_iterations_without_clustering {
                    self.n_clusters = 1;
                    cluster_indices.clear();
                    cluster_indices.resize(n_live, 0);
                    cluster_sizes = vec![n_live];
                } else {
                    self.n_clusters = self.clusterer.cluster(
                        &self.live_points,
                        &mut cluster_indices,
                        &mut cluster_sizes,
                        &mut self.rng,
                        self.config.verbose,
                    );
                }

                self.sampler.build(
                    &self.live_points,
                    self.n_clusters,
                    &cluster_indices,
                    &cluster_sizes,
                    self.log_remaining_prior_mass,
                )?;

                self.clustering_history.push(ClusteringEvent {
                    n_iterations: self.n_iterations,
                    n_clusters: self.n_clusters,
                });
            }

            if self.config.verbose && self.n_iterations % PROGRESS_CADENCE == 0 {
                eprintln!(
                    "{}",
                    output::format_progress(
                        self.n_iterations,
                        self.n_clusters,
                        n_live,
                        self.log_cumulated_prior_mass.exp(),
                        remainder_ratio,
                        self.log_evidence,
                        self.information_gain,
                    )
                );
            }

            match self.sampler.draw_with_constraint(
                &self.priors,
                &self.likelihood,
                worst_log_likelihood,
                self.config.max_draw_attempts,
                &mut self.rng,
            )? {
                DrawOutcome::Found {
                    point,
                    log_likelihood,
                } => {
                    self.live_points.set_column(worst_index, &point);
                    self.live_log_likelihoods[worst_index] = log_likelihood;
                }
                DrawOutcome::Exhausted { attempts } => {
                    eprintln!("{}", output::format_draw_failure(attempts));
                    self.terminated_prematurely = true;
                    break;
                }
            }

            self.n_iterations += 1;

            // Shrink the shell and keep the cumulated/remaining pair
            // consistent: e^cumulated + e^remaining = 1.
            log_width -= 1.0 / n;
            self.log_cumulated_prior_mass =
                log_sum_exp(self.log_cumulated_prior_mass, log_width);
            self.log_remaining_prior_mass =
                log_remaining_from_cumulated(self.log_cumulated_prior_mass);

            // Population reductions take effect only here, at the iteration
            // boundary.
            let floor = self.config.min_n_live.min(n_live);
            let target = reducer
                .update_n_objects(n_live, self.log_evidence, self.log_mean_live_evidence)
                .clamp(floor, n_live);
            if target < n_live {
                self.remove_worst_live_points(n_live - target, log_width);
            }

            if remainder_ratio <= self.config.termination_factor {
                break;
            }
        }

        self.finalize(log_width);
        self.elapsed = start.elapsed();

        if self.config.verbose {
            eprintln!(
                "{}",
                output::format_run_summary(
                    self.n_iterations,
                    self.posterior.len(),
                    self.log_evidence,
                    self.log_evidence_error,
                    self.information_gain,
                    self.elapsed,
                )
            );
        }

        Ok(())
    }

    /// Draw the initial population from the concatenated priors and
    /// evaluate the likelihood on every column.
    fn initialize(&mut self) -> Result<(), RunError> {
        let n_initial = self.config.initial_n_live;
        self.live_points = ParameterMatrix::zeros(self.n_dimensions, n_initial);

        let mut offset = 0;
        for prior in &self.priors {
            let span = prior.n_dimensions();
            let mut block = self.live_points.view_mut((offset, 0), (span, n_initial));
            prior.draw(&mut block, &mut self.rng);
            offset += span;
        }

        self.live_log_likelihoods = (0..n_initial)
            .map(|point| {
                self.likelihood
                    .log_value(&self.live_points.column(point).into_owned())
            })
            .collect();

        if self.live_log_likelihoods.iter().any(|l| l.is_nan()) {
            return Err(RunError::NumericalPathology {
                context: "likelihood returned NaN on the initial population",
            });
        }

        self.posterior = PosteriorRecord::new();
        self.log_evidence = LOG_MASS_SENTINEL;
        self.log_evidence_error = 0.0;
        self.information_gain = 0.0;
        self.log_cumulated_prior_mass = LOG_MASS_SENTINEL;
        self.log_remaining_prior_mass = 0.0;
        self.log_mean_live_evidence = LOG_MASS_SENTINEL;
        self.n_iterations = 0;
        self.clustering_history.clear();
        self.terminated_prematurely = false;

        Ok(())
    }

    /// Index and log-likelihood of the worst live point.
    fn worst_live_point(&self) -> (usize, f64) {
        let mut worst_index = 0;
        let mut worst = self.live_log_likelihoods[0];
        for (index, &value) in self.live_log_likelihoods.iter().enumerate().skip(1) {
            if value < worst {
                worst = value;
                worst_index = index;
            }
        }
        (worst_index, worst)
    }

    /// Drop the `count` worst live points, posting each to the posterior
    /// record with the current shell width first.
    fn remove_worst_live_points(&mut self, count: usize, log_width: f64) {
        let n_live = self.live_log_likelihoods.len();

        let mut order: Vec<usize> = (0..n_live).collect();
        order.sort_by(|&a, &b| {
            self.live_log_likelihoods[a].total_cmp(&self.live_log_likelihoods[b])
        });

        // Ascending likelihood keeps the posterior record ordered.
        for &index in order.iter().take(count) {
            self.posterior.push(
                self.live_points.column(index).into_owned(),
                self.live_log_likelihoods[index],
                log_width + self.live_log_likelihoods[index],
            );
        }

        let removed: Vec<bool> = {
            let mut flags = vec![false; n_live];
            for &index in order.iter().take(count) {
                flags[index] = true;
            }
            flags
        };
        let retained: Vec<usize> = (0..n_live).filter(|&i| !removed[i]).collect();

        let live_points = ParameterMatrix::from_fn(
            self.n_dimensions,
            retained.len(),
            |row, col| self.live_points[(row, retained[col])],
        );
        self.live_points = live_points;
        self.live_log_likelihoods = retained
            .iter()
            .map(|&i| self.live_log_likelihoods[i])
            .collect();
    }

    /// Append the remaining live batch, fix the evidence error and fold the
    /// mean live evidence into the total.
    fn finalize(&mut self, log_width: f64) {
        for point in 0..self.live_log_likelihoods.len() {
            self.posterior.push(
                self.live_points.column(point).into_owned(),
                self.live_log_likelihoods[point],
                log_width + self.live_log_likelihoods[point],
            );
        }

        let n_live = self.live_log_likelihoods.len() as f64;
        self.log_evidence_error = (self.information_gain.abs() / n_live).sqrt();
        self.log_evidence = log_sum_exp(self.log_mean_live_evidence, self.log_evidence);
    }

    /// The accumulated log-evidence.
    pub fn log_evidence(&self) -> f64 {
        self.log_evidence
    }

    /// Skilling's statistical error on the log-evidence: `√(|H|/N)`.
    pub fn log_evidence_error(&self) -> f64 {
        self.log_evidence_error
    }

    /// The information gain H (prior-to-posterior KL divergence).
    pub fn information_gain(&self) -> f64 {
        self.information_gain
    }

    /// Number of completed nested iterations.
    pub fn n_iterations(&self) -> usize {
        self.n_iterations
    }

    /// The posterior record accumulated so far.
    pub fn posterior(&self) -> &PosteriorRecord {
        &self.posterior
    }

    /// Dimension of the parameter space.
    pub fn n_dimensions(&self) -> usize {
        self.n_dimensions
    }

    /// Current live population size.
    pub fn n_live(&self) -> usize {
        self.live_log_likelihoods.len()
    }

    /// Cluster count from the most recent clustering event.
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Every clustering event of the run, one entry per cadence tick,
    /// in iteration order. Warm-up ticks record a single cluster.
    pub fn clustering_history(&self) -> &[ClusteringEvent] {
        &self.clustering_history
    }

    /// Log of the prior mass already integrated over.
    pub fn log_cumulated_prior_mass(&self) -> f64 {
        self.log_cumulated_prior_mass
    }

    /// Log of the prior mass still unexplored.
    pub fn log_remaining_prior_mass(&self) -> f64 {
        self.log_remaining_prior_mass
    }

    /// Keeton's mean live evidence from the last iteration.
    pub fn log_mean_live_evidence(&self) -> f64 {
        self.log_mean_live_evidence
    }

    /// Whether the run stopped on draw-attempt exhaustion rather than the
    /// termination criterion.
    pub fn terminated_prematurely(&self) -> bool {
        self.terminated_prematurely
    }

    /// Wall-clock duration of the completed run.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The active configuration.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }
}

/// One log-domain evidence/information update for a discarded point.
///
/// The recurrence is the standard Skilling form; note the *pre-update*
/// `log_evidence` inside the second term. The formula is applied literally:
/// a worst point with zero likelihood drives the first term to `0 * -inf`
/// and the resulting NaN is surfaced by the caller's finiteness check as a
/// fatal numerical pathology.
fn update_evidence(
    log_evidence: f64,
    information_gain: f64,
    log_weight: f64,
    worst_log_likelihood: f64,
) -> (f64, f64) {
    let updated_log_evidence = log_sum_exp(log_evidence, log_weight);
    let updated_gain = (log_weight - updated_log_evidence).exp() * worst_log_likelihood
        + (log_evidence - updated_log_evidence).exp() * (information_gain + log_evidence)
        - updated_log_evidence;

    (updated_log_evidence, updated_gain)
}

/// `log(1 - e^cumulated)`, clamped to `-inf` when the cumulated mass has
/// numerically reached unity.
fn log_remaining_from_cumulated(log_cumulated_prior_mass: f64) -> f64 {
    let remaining = (-log_cumulated_prior_mass.exp()).ln_1p();
    if remaining.is_nan() {
        f64::NEG_INFINITY
    } else {
        remaining
    }
}
