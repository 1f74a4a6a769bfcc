//! Numerical kernels for log-domain accumulation and posterior summaries.
//!
//! This module provides the statistical infrastructure the sampler leans on:
//! - Numerically stable log-sum-exp, pairwise and over slices
//! - Weighted quantiles over a weighted posterior sample

mod log_sum_exp;
mod weighted_quantile;

pub use log_sum_exp::{log_sum_exp, log_sum_exp_slice};
pub use weighted_quantile::weighted_quantile;
