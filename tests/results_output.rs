//! ASCII output round-trip: trace files, evidence block and summaries.

use std::fs;
use std::path::PathBuf;

use nalgebra::DVector;
use nidus::{
    ConstantReducer, EuclideanMetric, FnLikelihood, KmeansClusterer, KmeansConfig, NestedSampler,
    ParameterVector, Results, SamplerConfig, UniformPrior,
};

fn close(a: f64, b: f64) -> bool {
    // Traces are written with 12 significant digits.
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

fn finished_results() -> Results {
    let config = SamplerConfig {
        initial_n_live: 100,
        min_n_live: 100,
        n_initial_iterations_without_clustering: 50,
        n_iterations_with_same_clustering: 20,
        max_draw_attempts: 5_000,
        termination_factor: 0.05,
        seed: Some(606),
        ..SamplerConfig::default()
    };

    let prior = UniformPrior::new(
        DVector::from_element(2, -3.0),
        DVector::from_element(2, 3.0),
    )
    .unwrap();
    let likelihood = FnLikelihood::new(|p: &ParameterVector| -0.5 * p.norm_squared());
    let clusterer = KmeansClusterer::new(
        EuclideanMetric,
        KmeansConfig {
            min_clusters: 1,
            max_clusters: 2,
            ..KmeansConfig::default()
        },
    );

    let mut sampler =
        NestedSampler::new(config, vec![Box::new(prior)], likelihood, clusterer).unwrap();
    sampler.run(&mut ConstantReducer).unwrap();
    Results::new(&sampler)
}

fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("nidus-results-{}-{}", label, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn parameter_traces_round_trip() {
    let results = finished_results();
    let dir = scratch_dir("traces");
    let prefix = dir.join("parameter").to_string_lossy().into_owned();

    results.write_parameters(&prefix).unwrap();

    for row in 0..2 {
        let path = format!("{}{:03}.txt", prefix, row);
        let contents = fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();

        assert!(lines.next().unwrap().starts_with('#'));
        assert!(lines.next().unwrap().starts_with('#'));

        let values: Vec<f64> = lines.map(|line| line.parse().unwrap()).collect();
        assert_eq!(values.len(), results.posterior().ncols());
        assert!(close(values[0], results.posterior()[(row, 0)]));
    }

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn evidence_block_round_trips() {
    let results = finished_results();
    let dir = scratch_dir("evidence");
    let path = dir.join("evidence.txt").to_string_lossy().into_owned();

    results.write_evidence_information(&path).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let values: Vec<f64> = contents
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(|line| line.parse().unwrap())
        .collect();

    assert_eq!(values.len(), 3);
    assert!(close(values[0], results.log_evidence()));
    assert!(close(values[1], results.log_evidence_error()));
    assert!(close(values[2], results.information_gain()));

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn probability_and_summary_files_are_consistent() {
    let results = finished_results();
    let dir = scratch_dir("summary");

    let prob_path = dir.join("posterior.txt").to_string_lossy().into_owned();
    results.write_posterior_probability(&prob_path).unwrap();
    let contents = fs::read_to_string(&prob_path).unwrap();
    let probabilities: Vec<f64> = contents
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(|line| line.parse().unwrap())
        .collect();
    assert_eq!(probabilities.len(), results.normalized_weights().len());
    let total: f64 = probabilities.iter().sum();
    assert!(
        (total - 1.0).abs() < 0.05,
        "written posterior sums to {}",
        total
    );

    let summary_path = dir.join("summary.txt").to_string_lossy().into_owned();
    results.write_parameters_summary(&summary_path).unwrap();
    let contents = fs::read_to_string(&summary_path).unwrap();
    let rows: Vec<&str> = contents
        .lines()
        .filter(|line| !line.starts_with('#'))
        .collect();
    assert_eq!(rows.len(), 2, "one summary row per parameter");

    let summaries = results.parameter_summaries();
    for (row, summary) in rows.iter().zip(summaries.iter()) {
        let columns: Vec<f64> = row
            .split_whitespace()
            .map(|column| column.parse().unwrap())
            .collect();
        assert_eq!(columns.len(), 4);
        assert!(close(columns[0], summary.mean));
    }

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn log_likelihood_trace_matches_the_record() {
    let results = finished_results();
    let dir = scratch_dir("loglike");
    let path = dir.join("loglike.txt").to_string_lossy().into_owned();

    results.write_log_likelihood(&path).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let values: Vec<f64> = contents
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(|line| line.parse().unwrap())
        .collect();

    assert_eq!(values.len(), results.log_likelihoods().len());
    for (&written, &recorded) in values.iter().zip(results.log_likelihoods()) {
        assert!(close(written, recorded));
    }

    fs::remove_dir_all(&dir).ok();
}
