//! Numeric constants shared across the crate.

/// Sentinel for log-domain accumulators that have not received any mass yet.
///
/// The smallest finite double rather than `-inf`: the information-gain
/// recurrence multiplies `exp(sentinel - updated)` (which underflows to zero)
/// by `(gain + sentinel)`, and a literal `-inf` would turn that product into
/// `0 * -inf = NaN` on the very first iteration.
pub const LOG_MASS_SENTINEL: f64 = f64::MIN;

/// Floor applied to covariance eigenvalues of degenerate clusters.
///
/// A single-point cluster has no spread at all and a collinear one has none
/// along some axis; flooring the eigenvalues keeps the bounding ellipsoid
/// usable instead of collapsing it to zero volume.
pub const COVARIANCE_FLOOR: f64 = 1e-10;

/// Iterations between progress lines on the diagnostic stream.
pub const PROGRESS_CADENCE: usize = 50;

/// Hard cap on Lloyd assignment/update rounds per k-means trial.
pub const MAX_LLOYD_ROUNDS: usize = 100;
