//! Draw-attempt exhaustion: with a single attempt per replacement the run
//! must stop prematurely, keep the partial posterior, and raise nothing.

use nalgebra::DVector;
use nidus::{
    ConstantReducer, EuclideanMetric, FnLikelihood, KmeansClusterer, KmeansConfig, NestedSampler,
    ParameterVector, Results, SamplerConfig, UniformPrior,
};

#[test]
fn single_attempt_budget_forces_premature_stop() {
    let config = SamplerConfig {
        initial_n_live: 100,
        min_n_live: 100,
        n_initial_iterations_without_clustering: 50,
        n_iterations_with_same_clustering: 10,
        max_draw_attempts: 1,
        // Effectively unreachable: exhaustion must end the run first.
        termination_factor: 1e-10,
        seed: Some(5150),
        ..SamplerConfig::default()
    };

    // A needle-sharp likelihood keeps the acceptance region collapsing
    // faster than a one-candidate budget can track.
    let likelihood = FnLikelihood::new(|p: &ParameterVector| -0.5 * p.norm_squared() / 1e-4);
    let prior = UniformPrior::new(
        DVector::from_element(2, -5.0),
        DVector::from_element(2, 5.0),
    )
    .unwrap();
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

    sampler
        .run(&mut ConstantReducer)
        .expect("exhaustion is a graceful termination, not an error");

    assert!(sampler.terminated_prematurely());

    // The partial posterior is complete: one shell per completed iteration,
    // the shell posted by the failed iteration, and the full live batch.
    let record = sampler.posterior();
    assert_eq!(record.len(), sampler.n_iterations() + 1 + sampler.n_live());

    // And still usable downstream.
    let results = Results::new(&sampler);
    assert!(results.log_evidence().is_finite());
    assert_eq!(results.normalized_weights().len(), record.len());
}
