//! Quantiles of a weighted sample.
//!
//! Posterior samples produced by nested sampling carry one normalized weight
//! per point, so the usual equal-weight quantile estimators do not apply.
//! The estimator here is the inverse of the weighted empirical CDF: sort the
//! values, accumulate weights, and return the first value whose cumulative
//! weight reaches the requested probability.

/// Compute the `p`-quantile of `values` weighted by `weights`.
///
/// The weights need not be normalized; they are rescaled by their total.
/// Zero-weight entries are harmless.
///
/// # Panics
///
/// Panics if the slices are empty or of different lengths, if `p` is outside
/// `[0, 1]`, or if the total weight is not positive.
pub fn weighted_quantile(values: &[f64], weights: &[f64], p: f64) -> f64 {
    assert!(!values.is_empty(), "Cannot compute quantile of empty sample");
    assert_eq!(
        values.len(),
        weights.len(),
        "Values and weights must have the same length"
    );
    assert!(
        (0.0..=1.0).contains(&p),
        "Quantile probability must be in [0, 1]"
    );

    let total: f64 = weights.iter().sum();
    assert!(total > 0.0, "Total weight must be positive");

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let threshold = p * total;
    let mut cumulated = 0.0;

    for &index in &order {
        cumulated += weights[index];
        if cumulated >= threshold {
            return values[index];
        }
    }

    // Reachable only through accumulated rounding; the largest value is the
    // correct answer for p = 1.
    values[order[order.len() - 1]]
}
