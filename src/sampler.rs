use crate::codes::CodeType;
use crate::core::errors::SimulatorError;
use crate::core::{
    LogicalState, NoiseConfig, NoiseMode, repetition_logical_error_rate, shor_logical_error_rate,
};
use crate::simulator::{QecSimulator, SimulatorConfig};
use crate::snapshot::SnapshotPolicy;
use log::info;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Settings of a Monte Carlo batch.
#[derive(Clone, Debug, PartialEq)]
pub struct MonteCarloConfig {
    pub code_type: CodeType,
    pub initial_state: LogicalState,
    pub noise: NoiseConfig,
    pub trials: usize,
    /// A trial fails when its final fidelity is below this value.
    pub fidelity_threshold: f64,
    /// Trial `i` is seeded with `base_seed + i`.
    pub base_seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            code_type: CodeType::default(),
            initial_state: LogicalState::default(),
            noise: NoiseConfig::default(),
            trials: 1000,
            fidelity_threshold: 0.99,
            base_seed: 0,
        }
    }
}

impl MonteCarloConfig {
    pub fn new(code_type: CodeType, noise: NoiseConfig, trials: usize) -> Self {
        Self {
            code_type,
            noise,
            trials,
            ..Self::default()
        }
    }

    pub fn with_initial_state(mut self, state: LogicalState) -> Self {
        self.initial_state = state;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.fidelity_threshold = threshold;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.base_seed = seed;
        self
    }

    /// Configuration of the simulator running trial `index`.
    fn trial_config(&self, index: usize) -> SimulatorConfig {
        SimulatorConfig::new(self.code_type, self.initial_state)
            .with_noise(self.noise.clone())
            .with_snapshot_policy(SnapshotPolicy::Every(usize::MAX))
            .with_seed(self.base_seed.wrapping_add(index as u64))
    }

    /// Closed-form logical error rate, available for independent per-qubit noise only.
    pub fn theoretical_rate(&self) -> Option<f64> {
        if self.noise.mode != NoiseMode::Probability {
            return None;
        }
        let p = self.noise.probability;
        Some(match self.code_type {
            CodeType::Repetition => repetition_logical_error_rate(p),
            CodeType::Shor => shor_logical_error_rate(p),
        })
    }
}

/// Aggregate of a Monte Carlo batch.
#[derive(Clone, Debug, PartialEq)]
pub struct MonteCarloResult {
    pub trials: usize,
    pub logical_errors: usize,
    pub logical_error_rate: f64,
    /// Binomial standard error of `logical_error_rate`.
    pub standard_error: f64,
    pub theoretical_rate: Option<f64>,
}

impl MonteCarloResult {
    fn from_counts(trials: usize, logical_errors: usize, theoretical_rate: Option<f64>) -> Self {
        let rate = if trials == 0 {
            0.0
        } else {
            logical_errors as f64 / trials as f64
        };
        let standard_error = if trials == 0 {
            0.0
        } else {
            (rate * (1.0 - rate) / trials as f64).sqrt()
        };
        Self {
            trials,
            logical_errors,
            logical_error_rate: rate,
            standard_error,
            theoretical_rate,
        }
    }

    /// Whether the empirical rate lies within `k` standard errors of the theory.
    ///
    /// The standard error is taken from the theoretical rate, so a batch with zero
    /// failures is still judged meaningfully.
    pub fn within_standard_errors(&self, k: f64) -> bool {
        let Some(theory) = self.theoretical_rate else {
            return false;
        };
        if self.trials == 0 {
            return false;
        }
        let sigma = (theory * (1.0 - theory) / self.trials as f64).sqrt();
        (self.logical_error_rate - theory).abs() <= k * sigma
    }
}

/// Runs independent full correction cycles and counts logical failures.
#[derive(Clone, Debug, Default)]
pub struct MonteCarloSampler {
    pub config: MonteCarloConfig,
}

impl MonteCarloSampler {
    pub fn new(config: MonteCarloConfig) -> Self {
        Self { config }
    }

    /// Runs a single trial and reports whether it ended in a logical error.
    pub fn run_trial(&self, index: usize) -> Result<bool, SimulatorError> {
        let mut sim = QecSimulator::new(self.config.trial_config(index))?;
        let report = sim.run_full_cycle()?;
        Ok(report.fidelity < self.config.fidelity_threshold)
    }

    /// Runs every trial. Trials are independent, so with the `parallel` feature they
    /// are spread over the rayon pool; results do not depend on the feature.
    ///
    /// # Errors
    ///
    /// The first error raised by any trial, typically an invalid noise configuration.
    pub fn run(&self) -> Result<MonteCarloResult, SimulatorError> {
        self.config.noise.validate()?;
        let trials = self.config.trials;

        #[cfg(feature = "parallel")]
        let outcomes: Vec<bool> = (0..trials)
            .into_par_iter()
            .map(|i| self.run_trial(i))
            .collect::<Result<_, _>>()?;

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<bool> = (0..trials)
            .map(|i| self.run_trial(i))
            .collect::<Result<_, _>>()?;

        let logical_errors = outcomes.iter().filter(|&&failed| failed).count();
        let result =
            MonteCarloResult::from_counts(trials, logical_errors, self.config.theoretical_rate());
        info!(
            "{} code: {logical_errors}/{trials} logical errors (rate {:.3e} +/- {:.1e})",
            self.config.code_type.name(),
            result.logical_error_rate,
            result.standard_error
        );
        Ok(result)
    }
}
