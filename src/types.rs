//! Type aliases and shared containers.

use nalgebra::{DMatrix, DVector};

/// D×N matrix of sample points; points are columns.
pub type ParameterMatrix = DMatrix<f64>;

/// D-dimensional parameter vector (one point).
pub type ParameterVector = DVector<f64>;

/// Append-only record of points discarded by the nested iteration.
///
/// Entries arrive in order of non-decreasing log-likelihood, except for the
/// final batch of live points appended when the run terminates.
#[derive(Debug, Clone, Default)]
pub struct PosteriorRecord {
    points: Vec<ParameterVector>,
    log_likelihoods: Vec<f64>,
    log_weights: Vec<f64>,
}

impl PosteriorRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one discarded point with its log-likelihood and log-weight.
    pub fn push(&mut self, point: ParameterVector, log_likelihood: f64, log_weight: f64) {
        self.points.push(point);
        self.log_likelihoods.push(log_likelihood);
        self.log_weights.push(log_weight);
    }

    /// Number of recorded points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the record is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The recorded points, in insertion order.
    pub fn points(&self) -> &[ParameterVector] {
        &self.points
    }

    /// Log-likelihood of each recorded point, in insertion order.
    pub fn log_likelihoods(&self) -> &[f64] {
        &self.log_likelihoods
    }

    /// Log-weight (`log_width + log_likelihood`) of each recorded point.
    pub fn log_weights(&self) -> &[f64] {
        &self.log_weights
    }

    /// Assemble the D×M posterior matrix (points are columns).
    ///
    /// Returns an empty 0×0 matrix when nothing has been recorded.
    pub fn to_matrix(&self) -> ParameterMatrix {
        match self.points.first() {
            Some(first) => {
                let n_dimensions = first.len();
                ParameterMatrix::from_fn(n_dimensions, self.points.len(), |row, col| {
                    self.points[col][row]
                })
            }
            None => ParameterMatrix::zeros(0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_preserves_insertion_order() {
        let mut record = PosteriorRecord::new();
        record.push(ParameterVector::from_vec(vec![1.0, 2.0]), -3.0, -5.0);
        record.push(ParameterVector::from_vec(vec![3.0, 4.0]), -1.0, -4.0);

        assert_eq!(record.len(), 2);
        assert_eq!(record.log_likelihoods(), &[-3.0, -1.0]);
        assert_eq!(record.log_weights(), &[-5.0, -4.0]);

        let matrix = record.to_matrix();
        assert_eq!(matrix.nrows(), 2);
        assert_eq!(matrix.ncols(), 2);
        assert_eq!(matrix[(0, 1)], 3.0);
        assert_eq!(matrix[(1, 0)], 2.0);
    }

    #[test]
    fn empty_record_yields_empty_matrix() {
        let record = PosteriorRecord::new();
        assert!(record.is_empty());
        assert_eq!(record.to_matrix().ncols(), 0);
    }
}
