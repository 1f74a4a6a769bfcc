//! Partitioning of the live sample into clusters.
//!
//! The nested sampler hands the clusterer its live matrix on a configurable
//! cadence; one bounding ellipsoid is then built per cluster. The k-means
//! implementation picks the number of clusters with a BIC-like criterion.

mod kmeans;

pub use kmeans::{KmeansClusterer, KmeansConfig};

use rand::rngs::StdRng;

use crate::types::ParameterMatrix;

/// Partition a D×N sample into clusters.
pub trait Clusterer {
    /// Cluster the columns of `sample`.
    ///
    /// On return, `indices` holds one cluster index in `[0, k)` per column
    /// and `sizes` holds the per-cluster populations summing to N. Returns
    /// the number of clusters `k ≥ 1`.
    fn cluster(
        &self,
        sample: &ParameterMatrix,
        indices: &mut Vec<usize>,
        sizes: &mut Vec<usize>,
        rng: &mut StdRng,
        verbose: bool,
    ) -> usize;
}
