//! Numerically stable log-sum-exp.
//!
//! All evidence and prior-mass bookkeeping happens in the log domain, so the
//! sampler never exponentiates before summing. The identity used throughout:
//!
//! ```text
//! log(e^a + e^b) = max(a, b) + log1p(e^(min(a, b) - max(a, b)))
//! ```
//!
//! which never overflows and loses no precision when the operands are orders
//! of magnitude apart.

/// Compute `log(e^a + e^b)` without leaving the log domain.
///
/// Either operand may be `-inf` (or a very negative sentinel such as
/// `f64::MIN`), in which case the other operand is returned unchanged up to
/// rounding.
pub fn log_sum_exp(a: f64, b: f64) -> f64 {
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };

    if hi == f64::NEG_INFINITY {
        // Both operands are zero in linear space.
        return f64::NEG_INFINITY;
    }

    hi + (lo - hi).exp().ln_1p()
}

/// Compute `log(sum_i e^(values[i]))` over a slice.
///
/// Returns `-inf` for an empty slice (an empty sum is zero in linear space).
pub fn log_sum_exp_slice(values: &[f64]) -> f64 {
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if hi == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }

    let sum: f64 = values.iter().map(|&v| (v - hi).exp()).sum();
    hi + sum.ln()
}
