//! # nidus
//!
//! Bayesian evidence and posterior estimation via nested sampling with
//! multi-ellipsoidal constrained prior sampling.
//!
//! Given a log-likelihood surface over a D-dimensional parameter space and
//! one or more priors partitioning the coordinates, the sampler returns the
//! log of the marginal likelihood (the *evidence*), its statistical error,
//! the information gain, and a weighted posterior sample. Strongly
//! multimodal surfaces are handled by clustering the live points (k-means
//! over a pluggable metric) and sampling uniformly from the union of
//! enlarged bounding ellipsoids, with an overlap correction keeping the
//! union draw uniform.
//!
//! ## Quick Start
//!
//! ```no_run
//! use nalgebra::DVector;
//! use nidus::{
//!     EuclideanMetric, FerozReducer, FnLikelihood, KmeansClusterer, KmeansConfig,
//!     NestedSampler, Results, SamplerConfig, UniformPrior,
//! };
//!
//! // A 2D Gaussian likelihood over a uniform box prior.
//! let prior = UniformPrior::new(
//!     DVector::from_element(2, -5.0),
//!     DVector::from_element(2, 5.0),
//! )?;
//! let likelihood = FnLikelihood::new(|point: &DVector<f64>| -0.5 * point.norm_squared());
//!
//! let clusterer = KmeansClusterer::new(EuclideanMetric, KmeansConfig::default());
//! let config = SamplerConfig {
//!     initial_n_live: 500,
//!     termination_factor: 0.01,
//!     ..SamplerConfig::default()
//! };
//!
//! let mut sampler = NestedSampler::new(config, vec![Box::new(prior)], likelihood, clusterer)?;
//! let mut reducer = FerozReducer::new(0.01, 100);
//! sampler.run(&mut reducer)?;
//!
//! let results = Results::new(&sampler);
//! println!(
//!     "log(E) = {:.4} ± {:.4}",
//!     results.log_evidence(),
//!     results.log_evidence_error()
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Structure
//!
//! The engine is a composition of capabilities rather than a hierarchy:
//! [`Prior`], [`Likelihood`], [`Metric`], [`Clusterer`] and
//! [`LivePointsReducer`] are traits consumed by [`NestedSampler`], which
//! exclusively owns the live population and the posterior record. The run
//! is single-threaded and blocking; all randomness flows through one
//! private RNG seeded at construction.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod constants;
mod nested;
mod types;

// Functional modules
pub mod cluster;
pub mod ellipsoid;
pub mod likelihood;
pub mod metric;
pub mod output;
pub mod prior;
pub mod reducer;
pub mod results;
pub mod sampler;
pub mod statistics;

// Re-exports for the public API
pub use cluster::{Clusterer, KmeansClusterer, KmeansConfig};
pub use config::{ConfigError, SamplerConfig};
pub use constants::{COVARIANCE_FLOOR, LOG_MASS_SENTINEL, PROGRESS_CADENCE};
pub use ellipsoid::{Ellipsoid, EllipsoidError};
pub use likelihood::{FnLikelihood, Likelihood};
pub use metric::{EuclideanMetric, ManhattanMetric, Metric};
pub use nested::{ClusteringEvent, NestedSampler, RunError};
pub use prior::{NormalPrior, Prior, PriorError, UniformPrior};
pub use reducer::{ConstantReducer, ExponentialReducer, FerozReducer, LivePointsReducer};
pub use results::{ParameterSummary, Results, ResultsError};
pub use sampler::{DrawError, DrawOutcome, MultiEllipsoidSampler};
pub use types::{ParameterMatrix, ParameterVector, PosteriorRecord};
