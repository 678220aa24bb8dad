use qecsim::{
    CodeType, MonteCarloConfig, MonteCarloSampler, NoiseConfig, NoiseType,
    repetition_logical_error_rate,
};

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn repetition_rate_converges_to_theory() {
    init();
    let noise = NoiseConfig::new(NoiseType::BitFlip, 0.01).unwrap();
    let config = MonteCarloConfig::new(CodeType::Repetition, noise, 20_000).with_seed(2024);
    let result = MonteCarloSampler::new(config).run().unwrap();

    assert_eq!(result.trials, 20_000);
    let theory = result.theoretical_rate.unwrap();
    assert!((theory - repetition_logical_error_rate(0.01)).abs() < 1e-15);
    assert!(
        result.within_standard_errors(2.0),
        "empirical {} vs theory {theory}",
        result.logical_error_rate
    );
}

#[test]
fn high_noise_rate_converges_to_theory() {
    init();
    let noise = NoiseConfig::new(NoiseType::BitFlip, 0.1).unwrap();
    let config = MonteCarloConfig::new(CodeType::Repetition, noise, 4_000).with_seed(7);
    let result = MonteCarloSampler::new(config).run().unwrap();
    assert!(result.logical_errors > 0);
    assert!(result.within_standard_errors(4.0));
}

#[test]
fn encoding_beats_bare_qubit_below_threshold() {
    let noise = NoiseConfig::new(NoiseType::BitFlip, 0.05).unwrap();
    let config = MonteCarloConfig::new(CodeType::Repetition, noise, 5_000).with_seed(3);
    let result = MonteCarloSampler::new(config).run().unwrap();
    assert!(result.logical_error_rate < 0.05);
}

#[test]
fn invalid_probability_is_rejected() {
    let mut noise = NoiseConfig::default();
    noise.probability = -0.1;
    let sampler = MonteCarloSampler::new(MonteCarloConfig::new(CodeType::Shor, noise, 10));
    assert!(sampler.run().is_err());
}
