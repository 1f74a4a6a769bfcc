//! Configuration for a nested sampling run.

use serde::{Deserialize, Serialize};

/// Configuration options for [`NestedSampler`](crate::NestedSampler).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Initial number of live points (default: 500).
    pub initial_n_live: usize,

    /// Minimum number of live points a reducer may shrink to (default: 100).
    pub min_n_live: usize,

    /// Initial ellipsoid enlargement fraction `α₀ ≥ 0` (default: 1.5).
    ///
    /// Zero means the bounding ellipsoids are used at their bare covariance
    /// scale; larger values relax them.
    pub initial_enlargement_fraction: f64,

    /// Enlargement shrinking exponent `β ∈ (0, 1)` (default: 0.2).
    ///
    /// The enlargement follows `α₀ · X^β` with `X` the remaining prior
    /// mass; smaller exponents shrink the ellipsoids more slowly.
    pub shrinking_rate: f64,

    /// Iterations before the first real clustering (default: 500).
    ///
    /// Early on the population still resembles the prior, so clusters found
    /// then are likely noise; a single cluster is assumed instead.
    pub n_initial_iterations_without_clustering: usize,

    /// Iterations between clustering events (default: 50).
    pub n_iterations_with_same_clustering: usize,

    /// Maximum candidate generations per replacement before the run stops
    /// prematurely (default: 5000).
    pub max_draw_attempts: usize,

    /// Termination threshold on the remainder-to-evidence ratio
    /// (default: 0.05).
    pub termination_factor: f64,

    /// Seed for the sampler's private RNG; `None` seeds from the operating
    /// system (default: `None`).
    pub seed: Option<u64>,

    /// Print progress lines on stderr during the run (default: false).
    pub verbose: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            initial_n_live: 500,
            min_n_live: 100,
            initial_enlargement_fraction: 1.5,
            shrinking_rate: 0.2,
            n_initial_iterations_without_clustering: 500,
            n_iterations_with_same_clustering: 50,
            max_draw_attempts: 5_000,
            termination_factor: 0.05,
            seed: None,
            verbose: false,
        }
    }
}

impl SamplerConfig {
    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_n_live == 0 {
            return Err(ConfigError::ZeroLivePoints);
        }
        if self.min_n_live == 0 {
            return Err(ConfigError::ZeroMinimumLivePoints);
        }
        if self.min_n_live > self.initial_n_live {
            return Err(ConfigError::MinimumExceedsInitial {
                min_n_live: self.min_n_live,
                initial_n_live: self.initial_n_live,
            });
        }
        if self.initial_enlargement_fraction < 0.0 {
            return Err(ConfigError::NegativeEnlargement {
                value: self.initial_enlargement_fraction,
            });
        }
        if !(self.shrinking_rate > 0.0 && self.shrinking_rate < 1.0) {
            return Err(ConfigError::ShrinkingRateOutOfRange {
                value: self.shrinking_rate,
            });
        }
        if self.n_iterations_with_same_clustering == 0 {
            return Err(ConfigError::ZeroClusteringCadence);
        }
        if self.max_draw_attempts == 0 {
            return Err(ConfigError::ZeroDrawAttempts);
        }
        if !(self.termination_factor > 0.0) {
            return Err(ConfigError::NonPositiveTermination {
                value: self.termination_factor,
            });
        }
        Ok(())
    }
}

/// Rejection of an inconsistent [`SamplerConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `initial_n_live` is zero.
    ZeroLivePoints,

    /// `min_n_live` is zero.
    ZeroMinimumLivePoints,

    /// The population floor exceeds the initial population.
    MinimumExceedsInitial {
        /// Configured floor.
        min_n_live: usize,
        /// Configured initial population.
        initial_n_live: usize,
    },

    /// `initial_enlargement_fraction` is negative.
    NegativeEnlargement {
        /// Offending value.
        value: f64,
    },

    /// `shrinking_rate` is outside `(0, 1)`.
    ShrinkingRateOutOfRange {
        /// Offending value.
        value: f64,
    },

    /// `n_iterations_with_same_clustering` is zero.
    ZeroClusteringCadence,

    /// `max_draw_attempts` is zero.
    ZeroDrawAttempts,

    /// `termination_factor` is not positive.
    NonPositiveTermination {
        /// Offending value.
        value: f64,
    },

    /// No priors were supplied, so the parameter space has no dimensions.
    NoPriorDimensions,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ZeroLivePoints => write!(f, "initial_n_live must be at least 1"),
            ConfigError::ZeroMinimumLivePoints => write!(f, "min_n_live must be at least 1"),
            ConfigError::MinimumExceedsInitial {
                min_n_live,
                initial_n_live,
            } => write!(
                f,
                "min_n_live ({}) exceeds initial_n_live ({})",
                min_n_live, initial_n_live
            ),
            ConfigError::NegativeEnlargement { value } => {
                write!(f, "initial_enlargement_fraction ({}) must be non-negative", value)
            }
            ConfigError::ShrinkingRateOutOfRange { value } => {
                write!(f, "shrinking_rate ({}) must be in (0, 1)", value)
            }
            ConfigError::ZeroClusteringCadence => {
                write!(f, "n_iterations_with_same_clustering must be at least 1")
            }
            ConfigError::ZeroDrawAttempts => write!(f, "max_draw_attempts must be at least 1"),
            ConfigError::NonPositiveTermination { value } => {
                write!(f, "termination_factor ({}) must be positive", value)
            }
            ConfigError::NoPriorDimensions => {
                write!(f, "at least one prior with a non-empty block is required")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SamplerConfig::default().validate().is_ok());
    }

    #[test]
    fn inverted_population_bounds_rejected() {
        let config = SamplerConfig {
            initial_n_live: 50,
            min_n_live: 100,
            ..SamplerConfig::default()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::MinimumExceedsInitial {
                min_n_live: 100,
                initial_n_live: 50,
            }
        );
    }

    #[test]
    fn shrinking_rate_bounds_enforced() {
        for bad in [0.0, 1.0, -0.3, 1.5] {
            let config = SamplerConfig {
                shrinking_rate: bad,
                ..SamplerConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::ShrinkingRateOutOfRange { .. })
            ));
        }
    }

    #[test]
    fn zero_termination_rejected() {
        let config = SamplerConfig {
            termination_factor: 0.0,
            ..SamplerConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveTermination { .. })
        ));
    }
}
