//! The likelihood surface being integrated.

use crate::types::ParameterVector;

/// A log-likelihood function over the parameter space.
///
/// Implementations must be pure with respect to the input vector. A return
/// of `-inf` denotes zero likelihood (a constraint violation); NaN is a
/// numerical pathology and aborts the run.
pub trait Likelihood {
    /// Natural log of the likelihood at `point`.
    fn log_value(&self, point: &ParameterVector) -> f64;
}

/// Adapter turning any closure into a [`Likelihood`].
///
/// ```
/// use nidus::{FnLikelihood, Likelihood};
/// use nalgebra::DVector;
///
/// let gaussian = FnLikelihood::new(|point: &DVector<f64>| -0.5 * point.norm_squared());
/// assert_eq!(gaussian.log_value(&DVector::zeros(2)), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct FnLikelihood<F>
where
    F: Fn(&ParameterVector) -> f64,
{
    function: F,
}

impl<F> FnLikelihood<F>
where
    F: Fn(&ParameterVector) -> f64,
{
    /// Wrap a closure computing the log-likelihood.
    pub fn new(function: F) -> Self {
        Self { function }
    }
}

impl<F> Likelihood for FnLikelihood<F>
where
    F: Fn(&ParameterVector) -> f64,
{
    fn log_value(&self, point: &ParameterVector) -> f64 {
        (self.function)(point)
    }
}
