//! Distance metrics over parameter vectors.
//!
//! The clusterer is polymorphic over this capability; the Euclidean metric is
//! the canonical choice and the one exercised by the end-to-end scenarios.

use nalgebra::DVectorView;

/// Pairwise distance between two D-vectors.
///
/// Implementations must be symmetric and return zero iff the arguments are
/// equal.
pub trait Metric {
    /// Distance between `x` and `y`; always non-negative.
    fn distance(&self, x: &DVectorView<f64>, y: &DVectorView<f64>) -> f64;
}

/// The L2 metric `‖x − y‖₂`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanMetric;

impl Metric for EuclideanMetric {
    fn distance(&self, x: &DVectorView<f64>, y: &DVectorView<f64>) -> f64 {
        (x - y).norm()
    }
}

/// The L1 metric `Σ|xᵢ − yᵢ|`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManhattanMetric;

impl Metric for ManhattanMetric {
    fn distance(&self, x: &DVectorView<f64>, y: &DVectorView<f64>) -> f64 {
        x.iter().zip(y.iter()).map(|(a, b)| (a - b).abs()).sum()
    }
}
