//! Live-point-count reduction policies.
//!
//! As the run accumulates evidence, the population can safely shrink: once
//! the live points' potential contribution falls below a tolerance relative
//! to the evidence already gathered, fewer points are needed to finish the
//! integral. Reductions take effect at iteration boundaries only; the
//! sampler posts removed points to the posterior record before dropping
//! them.

/// Policy computing the target live-point count for the next iteration.
pub trait LivePointsReducer {
    /// Target population given the current count and the evidence state.
    ///
    /// The returned count never exceeds `current_n`; implementations clamp
    /// from below at their configured minimum.
    fn update_n_objects(
        &mut self,
        current_n: usize,
        log_evidence: f64,
        log_mean_live_evidence: f64,
    ) -> usize;
}

/// No-op policy: the population never shrinks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantReducer;

impl LivePointsReducer for ConstantReducer {
    fn update_n_objects(
        &mut self,
        current_n: usize,
        _log_evidence: f64,
        _log_mean_live_evidence: f64,
    ) -> usize {
        current_n
    }
}

/// Linear-in-log-ratio shrinkage.
///
/// While the remainder-to-evidence ratio stays at or above the tolerance the
/// population is untouched. Below it, the excess over `min_n_live` shrinks
/// linearly with the log of the ratio, reaching the minimum one e-fold below
/// the tolerance.
#[derive(Debug, Clone)]
pub struct FerozReducer {
    tolerance: f64,
    min_n_live: usize,
}

impl FerozReducer {
    /// Create a reducer with the given evidence tolerance and population
    /// floor.
    ///
    /// # Panics
    ///
    /// Panics if `tolerance` is not in `(0, 1]` or `min_n_live` is zero.
    pub fn new(tolerance: f64, min_n_live: usize) -> Self {
        assert!(
            tolerance > 0.0 && tolerance <= 1.0,
            "tolerance must be in (0, 1]"
        );
        assert!(min_n_live >= 1, "min_n_live must be at least 1");
        Self {
            tolerance,
            min_n_live,
        }
    }
}

impl LivePointsReducer for FerozReducer {
    fn update_n_objects(
        &mut self,
        current_n: usize,
        log_evidence: f64,
        log_mean_live_evidence: f64,
    ) -> usize {
        if current_n <= self.min_n_live {
            return current_n;
        }

        let log_ratio = log_mean_live_evidence - log_evidence;
        let log_tolerance = self.tolerance.ln();

        if log_ratio >= log_tolerance {
            return current_n;
        }

        let keep_fraction = (1.0 - (log_tolerance - log_ratio)).max(0.0);
        let excess = (current_n - self.min_n_live) as f64;
        let target = self.min_n_live + (keep_fraction * excess).round() as usize;

        target.clamp(self.min_n_live, current_n)
    }
}

/// Geometric shrinkage.
///
/// Below the tolerance, the excess over `min_n_live` is multiplied by
/// `exp(-reduction_rate)` on every call.
#[derive(Debug, Clone)]
pub struct ExponentialReducer {
    tolerance: f64,
    reduction_rate: f64,
    min_n_live: usize,
}

impl ExponentialReducer {
    /// Create a reducer with the given evidence tolerance, per-call decay
    /// rate and population floor.
    ///
    /// # Panics
    ///
    /// Panics if `tolerance` is not in `(0, 1]`, `reduction_rate` is not
    /// positive, or `min_n_live` is zero.
    pub fn new(tolerance: f64, reduction_rate: f64, min_n_live: usize) -> Self {
        assert!(
            tolerance > 0.0 && tolerance <= 1.0,
            "tolerance must be in (0, 1]"
        );
        assert!(reduction_rate > 0.0, "reduction_rate must be positive");
        assert!(min_n_live >= 1, "min_n_live must be at least 1");
        Self {
            tolerance,
            reduction_rate,
            min_n_live,
        }
    }
}

impl LivePointsReducer for ExponentialReducer {
    fn update_n_objects(
        &mut self,
        current_n: usize,
        log_evidence: f64,
        log_mean_live_evidence: f64,
    ) -> usize {
        if current_n <= self.min_n_live {
            return current_n;
        }

        let log_ratio = log_mean_live_evidence - log_evidence;
        if log_ratio >= self.tolerance.ln() {
            return current_n;
        }

        let excess = (current_n - self.min_n_live) as f64;
        let kept = (excess * (-self.reduction_rate).exp()).floor() as usize;
        (self.min_n_live + kept).clamp(self.min_n_live, current_n)
    }
}
