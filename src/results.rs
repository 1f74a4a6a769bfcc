//! Posterior views, parameter summaries and ASCII output.
//!
//! `Results` snapshots a finished run: the D×M posterior matrix, the
//! per-point log-likelihoods and log-weights, the evidence figures and the
//! wall-clock duration. From the normalized posterior it derives
//! per-parameter summaries (expectation, median, mode, second moment) and
//! writes the plain-ASCII files downstream tooling consumes: one trace file
//! per parameter plus single-file evidence and probability summaries, all
//! with `#`-commented headers.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cluster::Clusterer;
use crate::likelihood::Likelihood;
use crate::nested::NestedSampler;
use crate::statistics::weighted_quantile;
use crate::types::ParameterMatrix;

/// Failure while writing result files.
#[derive(Debug)]
pub enum ResultsError {
    /// An underlying filesystem write failed.
    Io {
        /// Path being written.
        path: String,
        /// The originating error.
        source: std::io::Error,
    },
}

impl std::fmt::Display for ResultsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultsError::Io { path, source } => {
                write!(f, "Failed writing results to '{}': {}", path, source)
            }
        }
    }
}

impl std::error::Error for ResultsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResultsError::Io { source, .. } => Some(source),
        }
    }
}

/// Per-parameter posterior summary.
///
/// Credible intervals are intentionally absent; downstream consumers derive
/// them from the trace files if needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSummary {
    /// Posterior expectation.
    pub mean: f64,
    /// Weighted posterior median.
    pub median: f64,
    /// Parameter value of the highest-weight posterior point.
    pub mode: f64,
    /// Second central moment of the posterior.
    pub second_moment: f64,
}

/// Read-only snapshot of a finished nested sampling run.
#[derive(Debug, Clone)]
pub struct Results {
    posterior: ParameterMatrix,
    log_likelihoods: Vec<f64>,
    log_weights: Vec<f64>,
    normalized_weights: Vec<f64>,
    log_evidence: f64,
    log_evidence_error: f64,
    information_gain: f64,
    n_iterations: usize,
    elapsed_seconds: f64,
}

impl Results {
    /// Snapshot the given sampler after `run` has returned.
    pub fn new<L: Likelihood, C: Clusterer>(sampler: &NestedSampler<L, C>) -> Self {
        let record = sampler.posterior();
        let log_evidence = sampler.log_evidence();

        let normalized_weights = record
            .log_weights()
            .iter()
            .map(|&log_weight| (log_weight - log_evidence).exp())
            .collect();

        Self {
            posterior: record.to_matrix(),
            log_likelihoods: record.log_likelihoods().to_vec(),
            log_weights: record.log_weights().to_vec(),
            normalized_weights,
            log_evidence,
            log_evidence_error: sampler.log_evidence_error(),
            information_gain: sampler.information_gain(),
            n_iterations: sampler.n_iterations(),
            elapsed_seconds: sampler.elapsed().as_secs_f64(),
        }
    }

    /// The D×M posterior matrix (points are columns).
    pub fn posterior(&self) -> &ParameterMatrix {
        &self.posterior
    }

    /// Log-likelihood of each posterior point.
    pub fn log_likelihoods(&self) -> &[f64] {
        &self.log_likelihoods
    }

    /// Log-weight of each posterior point.
    pub fn log_weights(&self) -> &[f64] {
        &self.log_weights
    }

    /// Posterior probability of each point, normalized by the evidence.
    pub fn normalized_weights(&self) -> &[f64] {
        &self.normalized_weights
    }

    /// The accumulated log-evidence.
    pub fn log_evidence(&self) -> f64 {
        self.log_evidence
    }

    /// Skilling's statistical error on the log-evidence.
    pub fn log_evidence_error(&self) -> f64 {
        self.log_evidence_error
    }

    /// The information gain H.
    pub fn information_gain(&self) -> f64 {
        self.information_gain
    }

    /// Number of nested iterations the run performed.
    pub fn n_iterations(&self) -> usize {
        self.n_iterations
    }

    /// Wall-clock duration of the run in seconds.
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    /// Per-parameter summaries from the normalized posterior.
    pub fn parameter_summaries(&self) -> Vec<ParameterSummary> {
        let total: f64 = self.normalized_weights.iter().sum();
        let mode_index = self
            .normalized_weights
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(index, _)| index)
            .unwrap_or(0);

        (0..self.posterior.nrows())
            .map(|row| {
                let values: Vec<f64> = self.posterior.row(row).iter().copied().collect();

                let mean = values
                    .iter()
                    .zip(self.normalized_weights.iter())
                    .map(|(v, w)| v * w)
                    .sum::<f64>()
                    / total;

                let second_moment = values
                    .iter()
                    .zip(self.normalized_weights.iter())
                    .map(|(v, w)| (v - mean) * (v - mean) * w)
                    .sum::<f64>()
                    / total;

                ParameterSummary {
                    mean,
                    median: weighted_quantile(&values, &self.normalized_weights, 0.5),
                    mode: values[mode_index],
                    second_moment,
                }
            })
            .collect()
    }

    /// Write one trace file per parameter: `{prefix}{index:03}.txt`.
    pub fn write_parameters(&self, path_prefix: &str) -> Result<(), ResultsError> {
        for row in 0..self.posterior.nrows() {
            let path = format!("{}{:03}.txt", path_prefix, row);
            let mut writer = open_writer(&path)?;

            write_lines(&path, &mut writer, |w| {
                writeln!(w, "# Posterior sample of parameter {}", row)?;
                writeln!(w, "# Column 1: parameter value")?;
                for col in 0..self.posterior.ncols() {
                    writeln!(w, "{:.12e}", self.posterior[(row, col)])?;
                }
                Ok(())
            })?;
        }
        Ok(())
    }

    /// Write the log-likelihood trace of the posterior sample.
    pub fn write_log_likelihood(&self, path: &str) -> Result<(), ResultsError> {
        let mut writer = open_writer(path)?;
        write_lines(path, &mut writer, |w| {
            writeln!(w, "# log(Likelihood) of posterior sample")?;
            writeln!(w, "# Column 1: log-likelihood")?;
            for value in &self.log_likelihoods {
                writeln!(w, "{:.12e}", value)?;
            }
            Ok(())
        })
    }

    /// Write the normalized posterior probabilities.
    pub fn write_posterior_probability(&self, path: &str) -> Result<(), ResultsError> {
        let mut writer = open_writer(path)?;
        write_lines(path, &mut writer, |w| {
            writeln!(w, "# Posterior probability distribution (normalized)")?;
            writeln!(w, "# Column 1: probability")?;
            for value in &self.normalized_weights {
                writeln!(w, "{:.12e}", value)?;
            }
            Ok(())
        })
    }

    /// Write the evidence block: log-evidence, its error and the
    /// information gain.
    pub fn write_evidence_information(&self, path: &str) -> Result<(), ResultsError> {
        let mut writer = open_writer(path)?;
        write_lines(path, &mut writer, |w| {
            writeln!(w, "# Skilling's log(Evidence)")?;
            writeln!(w, "{:.12e}", self.log_evidence)?;
            writeln!(w, "# Skilling's error on log(Evidence)")?;
            writeln!(w, "{:.12e}", self.log_evidence_error)?;
            writeln!(w, "# Skilling's information gain")?;
            writeln!(w, "{:.12e}", self.information_gain)?;
            Ok(())
        })
    }

    /// Write the per-parameter summary table, one row per parameter.
    pub fn write_parameters_summary(&self, path: &str) -> Result<(), ResultsError> {
        let summaries = self.parameter_summaries();
        let mut writer = open_writer(path)?;
        write_lines(path, &mut writer, |w| {
            writeln!(w, "# Posterior parameter summaries, one row per parameter")?;
            writeln!(w, "# Columns: mean, median, mode, second moment")?;
            for summary in &summaries {
                writeln!(
                    w,
                    "{:.12e}  {:.12e}  {:.12e}  {:.12e}",
                    summary.mean, summary.median, summary.mode, summary.second_moment
                )?;
            }
            Ok(())
        })
    }
}

fn open_writer(path: &str) -> Result<BufWriter<File>, ResultsError> {
    File::create(Path::new(path))
        .map(BufWriter::new)
        .map_err(|source| ResultsError::Io {
            path: path.to_string(),
            source,
        })
}

fn write_lines<F>(path: &str, writer: &mut BufWriter<File>, body: F) -> Result<(), ResultsError>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    body(writer).map_err(|source| ResultsError::Io {
        path: path.to_string(),
        source,
    })
}
