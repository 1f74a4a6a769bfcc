//! K-means clustering with BIC-based model selection.
//!
//! For each candidate cluster count k in `[min_clusters, max_clusters]` the
//! clusterer runs several k-means++ seeded trials of Lloyd's algorithm and
//! scores the best trial with a BIC-like penalty:
//!
//! ```text
//! BIC(k) = N·ln(W(k)/N) + k·D·ln(N)
//! ```
//!
//! where `W(k)` is the within-cluster sum of squared distances under the
//! configured metric. The k minimizing BIC wins; ties go to the smaller k.
//! Trials that collapse a cluster to zero members are discarded, and if
//! every trial at every k degenerates the sample is kept as one cluster.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Clusterer;
use crate::constants::MAX_LLOYD_ROUNDS;
use crate::metric::Metric;
use crate::types::{ParameterMatrix, ParameterVector};

/// Knobs for the k-means clusterer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KmeansConfig {
    /// Smallest cluster count to consider (default: 1).
    pub min_clusters: usize,

    /// Largest cluster count to consider (default: 6).
    pub max_clusters: usize,

    /// Independent k-means++ seeded trials per candidate k (default: 10).
    pub trials: usize,

    /// Convergence tolerance on centroid movement, relative to the largest
    /// coordinate range of the sample (default: 0.01).
    pub rel_tolerance: f64,
}

impl Default for KmeansConfig {
    fn default() -> Self {
        Self {
            min_clusters: 1,
            max_clusters: 6,
            trials: 10,
            rel_tolerance: 0.01,
        }
    }
}

/// K-means clusterer over a pluggable metric.
#[derive(Debug, Clone)]
pub struct KmeansClusterer<M: Metric> {
    metric: M,
    config: KmeansConfig,
}

impl<M: Metric> KmeansClusterer<M> {
    /// Create a clusterer with the given metric and configuration.
    ///
    /// # Panics
    ///
    /// Panics if `min_clusters` is zero, `min_clusters > max_clusters`,
    /// `trials` is zero, or `rel_tolerance` is outside `(0, 1)`.
    pub fn new(metric: M, config: KmeansConfig) -> Self {
        assert!(config.min_clusters >= 1, "min_clusters must be at least 1");
        assert!(
            config.min_clusters <= config.max_clusters,
            "min_clusters must not exceed max_clusters"
        );
        assert!(config.trials >= 1, "trials must be at least 1");
        assert!(
            config.rel_tolerance > 0.0 && config.rel_tolerance < 1.0,
            "rel_tolerance must be in (0, 1)"
        );
        Self { metric, config }
    }

    /// The clusterer configuration.
    pub fn config(&self) -> &KmeansConfig {
        &self.config
    }

    /// K-means++ seeding: the first centroid is a random sample point, each
    /// further centroid a point picked with probability proportional to its
    /// squared distance from the nearest centroid chosen so far.
    fn seed_centroids(
        &self,
        sample: &ParameterMatrix,
        k: usize,
        rng: &mut StdRng,
    ) -> Vec<ParameterVector> {
        let n_points = sample.ncols();
        let mut centroids: Vec<ParameterVector> = Vec::with_capacity(k);

        let first = rng.random_range(0..n_points);
        centroids.push(sample.column(first).into_owned());

        let mut nearest_sq = vec![0.0_f64; n_points];

        while centroids.len() < k {
            let latest = centroids.len() - 1;
            for point in 0..n_points {
                let d = self
                    .metric
                    .distance(&sample.column(point), &centroids[latest].as_view());
                let d_sq = d * d;
                if latest == 0 || d_sq < nearest_sq[point] {
                    nearest_sq[point] = d_sq;
                }
            }

            let total: f64 = nearest_sq.iter().sum();
            let chosen = if total > 0.0 {
                let mut target = rng.random::<f64>() * total;
                let mut chosen = n_points - 1;
                for (point, &weight) in nearest_sq.iter().enumerate() {
                    target -= weight;
                    if target <= 0.0 {
                        chosen = point;
                        break;
                    }
                }
                chosen
            } else {
                // All points coincide with a centroid already.
                rng.random_range(0..n_points)
            };

            centroids.push(sample.column(chosen).into_owned());
        }

        centroids
    }

    /// One full k-means trial. Returns the within-cluster sum of squared
    /// distances and the assignment, or `None` if a cluster emptied out.
    fn run_trial(
        &self,
        sample: &ParameterMatrix,
        k: usize,
        tolerance: f64,
        rng: &mut StdRng,
    ) -> Option<(f64, Vec<usize>, Vec<usize>)> {
        let n_dimensions = sample.nrows();
        let n_points = sample.ncols();

        let mut centroids = self.seed_centroids(sample, k, rng);
        let mut assignment = vec![0_usize; n_points];
        let mut sizes = vec![0_usize; k];

        for _ in 0..MAX_LLOYD_ROUNDS {
            // Assignment step.
            sizes.iter_mut().for_each(|s| *s = 0);
            for point in 0..n_points {
                let column = sample.column(point);
                let mut best = 0;
                let mut best_distance = f64::INFINITY;
                for (cluster, centroid) in centroids.iter().enumerate() {
                    let d = self.metric.distance(&column, &centroid.as_view());
                    if d < best_distance {
                        best_distance = d;
                        best = cluster;
                    }
                }
                assignment[point] = best;
                sizes[best] += 1;
            }

            if sizes.iter().any(|&s| s == 0) {
                return None;
            }

            // Update step.
            let mut updated =
                vec![ParameterVector::zeros(n_dimensions); k];
            for point in 0..n_points {
                updated[assignment[point]] += sample.column(point);
            }
            for (cluster, centroid) in updated.iter_mut().enumerate() {
                *centroid /= sizes[cluster] as f64;
            }

            let movement = centroids
                .iter()
                .zip(updated.iter())
                .map(|(old, new)| self.metric.distance(&old.as_view(), &new.as_view()))
                .fold(0.0_f64, f64::max);

            centroids = updated;

            if movement < tolerance {
                break;
            }
        }

        let distortion: f64 = (0..n_points)
            .map(|point| {
                let d = self
                    .metric
                    .distance(&sample.column(point), &centroids[assignment[point]].as_view());
                d * d
            })
            .sum();

        Some((distortion, assignment, sizes))
    }
}

/// Largest per-coordinate range of the sample, used to scale the relative
/// convergence tolerance.
fn largest_coordinate_range(sample: &ParameterMatrix) -> f64 {
    let mut largest = 0.0_f64;
    for row in 0..sample.nrows() {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for col in 0..sample.ncols() {
            let value = sample[(row, col)];
            lo = lo.min(value);
            hi = hi.max(value);
        }
        largest = largest.max(hi - lo);
    }
    largest
}

impl<M: Metric> Clusterer for KmeansClusterer<M> {
    fn cluster(
        &self,
        sample: &ParameterMatrix,
        indices: &mut Vec<usize>,
        sizes: &mut Vec<usize>,
        rng: &mut StdRng,
        verbose: bool,
    ) -> usize {
        let n_dimensions = sample.nrows();
        let n_points = sample.ncols();

        let k_max = self.config.max_clusters.min(n_points);
        let k_min = self.config.min_clusters.min(k_max);

        let range = largest_coordinate_range(sample);
        let tolerance = if range > 0.0 {
            self.config.rel_tolerance * range
        } else {
            self.config.rel_tolerance
        };

        let mut best: Option<(f64, usize, Vec<usize>, Vec<usize>)> = None;

        for k in k_min..=k_max {
            let mut best_trial: Option<(f64, Vec<usize>, Vec<usize>)> = None;

            for _ in 0..self.config.trials {
                if let Some(trial) = self.run_trial(sample, k, tolerance, rng) {
                    let replace = match &best_trial {
                        Some((w, _, _)) => trial.0 < *w,
                        None => true,
                    };
                    if replace {
                        best_trial = Some(trial);
                    }
                }
            }

            let Some((distortion, assignment, cluster_sizes)) = best_trial else {
                continue;
            };

            let n = n_points as f64;
            let mean_distortion = (distortion / n).max(f64::MIN_POSITIVE);
            let bic =
                n * mean_distortion.ln() + (k * n_dimensions) as f64 * n.ln();

            if verbose {
                eprintln!("k-means: k = {}  W = {:.6e}  BIC = {:.6e}", k, distortion, bic);
            }

            let replace = match &best {
                Some((best_bic, _, _, _)) => bic < *best_bic,
                None => true,
            };
            if replace {
                best = Some((bic, k, assignment, cluster_sizes));
            }
        }

        match best {
            Some((_, k, assignment, cluster_sizes)) => {
                *indices = assignment;
                *sizes = cluster_sizes;
                k
            }
            None => {
                // Every trial at every k degenerated; keep a single cluster.
                indices.clear();
                indices.resize(n_points, 0);
                *sizes = vec![n_points];
                1
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::EuclideanMetric;
    use rand::SeedableRng;

    fn two_blobs(separation: f64, per_blob: usize) -> ParameterMatrix {
        let mut rng = StdRng::seed_from_u64(42);
        ParameterMatrix::from_fn(2, 2 * per_blob, |_, col| {
            let center = if col < per_blob { 0.0 } else { separation };
            center + 0.1 * (rng.random::<f64>() - 0.5)
        })
    }

    #[test]
    fn separated_blobs_resolve_to_two_clusters() {
        let sample = two_blobs(10.0, 50);
        let clusterer = KmeansClusterer::new(
            EuclideanMetric,
            KmeansConfig {
                min_clusters: 1,
                max_clusters: 2,
                ..KmeansConfig::default()
            },
        );

        let mut indices = Vec::new();
        let mut sizes = Vec::new();
        let mut rng = StdRng::seed_from_u64(1);
        let k = clusterer.cluster(&sample, &mut indices, &mut sizes, &mut rng, false);

        assert_eq!(k, 2, "well-separated blobs should split into 2 clusters");
        assert_eq!(sizes.iter().sum::<usize>(), 100);
        assert_eq!(sizes.len(), 2);
        assert_eq!(indices.len(), 100);

        // All points of one blob share a cluster index.
        let first_blob = indices[0];
        assert!(indices[..50].iter().all(|&i| i == first_blob));
        assert!(indices[50..].iter().all(|&i| i != first_blob));
    }

    #[test]
    fn no_cluster_spans_both_blobs() {
        // With headroom above the true mode count the BIC may split further,
        // but a chosen cluster must never straddle the 10-sigma gap.
        let sample = two_blobs(10.0, 50);
        let clusterer = KmeansClusterer::new(
            EuclideanMetric,
            KmeansConfig {
                min_clusters: 1,
                max_clusters: 4,
                ..KmeansConfig::default()
            },
        );

        let mut indices = Vec::new();
        let mut sizes = Vec::new();
        let mut rng = StdRng::seed_from_u64(2);
        let k = clusterer.cluster(&sample, &mut indices, &mut sizes, &mut rng, false);

        assert!(k >= 2, "the two modes must be resolved");
        for cluster in 0..k {
            let in_first_blob = (0..50).any(|p| indices[p] == cluster);
            let in_second_blob = (50..100).any(|p| indices[p] == cluster);
            assert!(
                !(in_first_blob && in_second_blob),
                "cluster {} spans both blobs",
                cluster
            );
        }
    }

    #[test]
    fn two_coincident_groups_recovered_exactly() {
        // Twenty copies of each of two distinct locations: k = 2 yields zero
        // distortion and wins the BIC outright; k = 3 always empties a
        // cluster and is discarded.
        let sample = ParameterMatrix::from_fn(2, 40, |row, col| {
            if col < 20 {
                0.0
            } else if row == 0 {
                5.0
            } else {
                -5.0
            }
        });
        let clusterer = KmeansClusterer::new(
            EuclideanMetric,
            KmeansConfig {
                min_clusters: 1,
                max_clusters: 3,
                ..KmeansConfig::default()
            },
        );

        let mut indices = Vec::new();
        let mut sizes = Vec::new();
        let mut rng = StdRng::seed_from_u64(5);
        let k = clusterer.cluster(&sample, &mut indices, &mut sizes, &mut rng, false);

        assert_eq!(k, 2);
        assert_eq!(sizes, vec![20, 20]);
        assert_ne!(indices[0], indices[20]);
    }

    #[test]
    fn coincident_points_fall_back_to_one_cluster() {
        let sample = ParameterMatrix::from_fn(2, 20, |_, _| 1.5);
        let clusterer = KmeansClusterer::new(
            EuclideanMetric,
            KmeansConfig {
                min_clusters: 2,
                max_clusters: 3,
                ..KmeansConfig::default()
            },
        );

        let mut indices = Vec::new();
        let mut sizes = Vec::new();
        let mut rng = StdRng::seed_from_u64(3);
        let k = clusterer.cluster(&sample, &mut indices, &mut sizes, &mut rng, false);

        // Any k >= 2 assignment leaves an empty cluster, so every trial is
        // discarded and the degenerate fallback applies.
        assert_eq!(k, 1);
        assert_eq!(sizes, vec![20]);
        assert!(indices.iter().all(|&i| i == 0));
    }

    #[test]
    fn cluster_count_clamped_by_population() {
        let sample = two_blobs(10.0, 2);
        let clusterer = KmeansClusterer::new(
            EuclideanMetric,
            KmeansConfig {
                min_clusters: 1,
                max_clusters: 16,
                ..KmeansConfig::default()
            },
        );

        let mut indices = Vec::new();
        let mut sizes = Vec::new();
        let mut rng = StdRng::seed_from_u64(4);
        let k = clusterer.cluster(&sample, &mut indices, &mut sizes, &mut rng, false);

        assert!(k <= 4, "cannot produce more clusters than points");
        assert_eq!(sizes.iter().sum::<usize>(), 4);
    }

    #[test]
    #[should_panic(expected = "min_clusters must be at least 1")]
    fn zero_min_clusters_rejected() {
        KmeansClusterer::new(
            EuclideanMetric,
            KmeansConfig {
                min_clusters: 0,
                ..KmeansConfig::default()
            },
        );
    }
}
