//! Noise Module.
//!
//! Pauli noise is applied as quantum trajectories: each eligible qubit draws once and,
//! on a hit, receives a single Pauli gate. Only qubits with the `Data` role are ever
//! targeted; ancillas are immune between uses.

use crate::core::errors::{NoiseError, StateError};
use crate::core::gates::{GateOperation, Pauli};
use crate::core::system::{QuantumSystem, QubitRole, StepKind};
use crate::core::utils;
use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;

/// Which Pauli a triggered error applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NoiseType {
    /// Bit Flip -> X
    BitFlip,
    /// Phase Flip -> Z
    PhaseFlip,
    /// Bit-Phase Flip -> Y
    BitPhaseFlip,
    /// X, Y or Z with equal probability
    Depolarizing,
    #[default]
    None,
}

impl NoiseType {
    /// Pauli applied once an error has been triggered. `None` never yields one.
    pub fn sample_pauli<R: Rng + ?Sized>(self, rng: &mut R) -> Option<Pauli> {
        match self {
            NoiseType::BitFlip => Some(Pauli::X),
            NoiseType::PhaseFlip => Some(Pauli::Z),
            NoiseType::BitPhaseFlip => Some(Pauli::Y),
            NoiseType::Depolarizing => Some(Pauli::ALL[rng.random_range(0..3)]),
            NoiseType::None => None,
        }
    }

    /// Single-draw trajectory: error with probability `p`, depolarizing split in thirds.
    fn draw<R: Rng + ?Sized>(self, p: f64, rng: &mut R) -> Option<Pauli> {
        if self == NoiseType::None {
            return None;
        }
        let roll: f64 = rng.random();
        if roll >= p {
            return None;
        }
        if self == NoiseType::Depolarizing {
            let third = p / 3.0;
            return Some(if roll < third {
                Pauli::X
            } else if roll < 2.0 * third {
                Pauli::Y
            } else {
                Pauli::Z
            });
        }
        self.sample_pauli(rng)
    }
}

/// How many qubits receive ambient noise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NoiseMode {
    /// Each data qubit independently, with the configured probability.
    #[default]
    Probability,
    /// Exactly `min(n, data qubits)` randomly chosen data qubits.
    ExactCount(usize),
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct NoiseConfig {
    pub noise_type: NoiseType,
    pub probability: f64,
    pub mode: NoiseMode,
    /// Restricts noise to these qubits; `None` means every qubit.
    pub target_qubits: Option<Vec<usize>>,
}

impl NoiseConfig {
    pub fn new(noise_type: NoiseType, probability: f64) -> Result<Self, NoiseError> {
        validate_prob(probability)?;
        Ok(Self {
            noise_type,
            probability,
            ..Self::default()
        })
    }

    /// Noise that always hits exactly `count` data qubits.
    pub fn exact(noise_type: NoiseType, count: usize) -> Self {
        Self {
            noise_type,
            probability: 1.0,
            mode: NoiseMode::ExactCount(count),
            target_qubits: None,
        }
    }

    pub fn with_targets(mut self, targets: Vec<usize>) -> Self {
        self.target_qubits = Some(targets);
        self
    }

    /// Checks the probability and that no target qubit is listed twice.
    pub fn validate(&self) -> Result<(), NoiseError> {
        validate_prob(self.probability)?;
        if let Some(dup) = self.target_qubits.as_deref().and_then(utils::find_duplicate) {
            return Err(NoiseError::DuplicateQubit(dup));
        }
        Ok(())
    }
}

/// Which gates are eligible for gate-error injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GateErrorScope {
    #[default]
    All,
    SingleQubit,
    TwoQubit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GateErrorConfig {
    pub enabled: bool,
    pub error_type: NoiseType,
    /// Per target qubit, per gate.
    pub probability: f64,
    pub scope: GateErrorScope,
}

impl Default for GateErrorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            error_type: NoiseType::Depolarizing,
            probability: 0.0,
            scope: GateErrorScope::All,
        }
    }
}

impl GateErrorConfig {
    /// Enabled configuration covering all gates.
    pub fn new(error_type: NoiseType, probability: f64) -> Result<Self, NoiseError> {
        validate_prob(probability)?;
        Ok(Self {
            enabled: true,
            error_type,
            probability,
            scope: GateErrorScope::All,
        })
    }

    pub fn with_scope(mut self, scope: GateErrorScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn validate(&self) -> Result<(), NoiseError> {
        validate_prob(self.probability)
    }

    /// Whether `op` can trigger an error under this configuration.
    pub fn applies_to(&self, op: &GateOperation) -> bool {
        if !self.enabled || self.error_type == NoiseType::None {
            return false;
        }
        match self.scope {
            GateErrorScope::All => true,
            GateErrorScope::SingleQubit => op.targets().len() == 1,
            GateErrorScope::TwoQubit => op.targets().len() >= 2,
        }
    }
}

/// Outcome of ambient noise for one requested qubit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NoiseEvent {
    pub qubit: usize,
    /// False for non-data qubits, which are never touched.
    pub eligible: bool,
    pub error: Option<Pauli>,
}

impl NoiseEvent {
    pub fn applied(&self) -> bool {
        self.error.is_some()
    }
}

/// Applies ambient noise to the data qubits of `system`.
///
/// Returns one event per requested qubit, in request order, including ineligible ones.
///
/// # Errors
///
/// - `NoiseError::DuplicateQubit` if a target is listed twice.
/// - `NoiseError::StateError` if a target does not exist.
pub fn apply_noise<R: Rng + ?Sized>(
    system: &mut QuantumSystem,
    config: &NoiseConfig,
    rng: &mut R,
) -> Result<Vec<NoiseEvent>, NoiseError> {
    config.validate()?;
    let requested: Vec<usize> = match &config.target_qubits {
        Some(targets) => targets.clone(),
        None => (0..system.num_qubits()).collect(),
    };

    let mut events = Vec::with_capacity(requested.len());
    for &qubit in &requested {
        let info = system.qubit(qubit).ok_or(StateError::IndexOutOfBounds {
            index: qubit,
            num_qubits: system.num_qubits(),
        })?;
        events.push(NoiseEvent {
            qubit,
            eligible: info.role == QubitRole::Data,
            error: None,
        });
    }

    match config.mode {
        NoiseMode::Probability => {
            for event in events.iter_mut().filter(|e| e.eligible) {
                event.error = config.noise_type.draw(config.probability, rng);
            }
        }
        NoiseMode::ExactCount(count) => {
            let mut eligible: Vec<usize> =
                (0..events.len()).filter(|&i| events[i].eligible).collect();
            eligible.shuffle(rng);
            for &i in eligible.iter().take(count) {
                events[i].error = config.noise_type.sample_pauli(rng);
            }
        }
    }

    for event in &events {
        if let Some(error) = event.error {
            debug!("noise {error} on q{}", event.qubit);
            system.apply_pauli_error(
                event.qubit,
                error,
                StepKind::Noise,
                format!("Noise: {error} error on q{}", event.qubit),
            )?;
        }
    }

    Ok(events)
}

/// Probability that 2 or more of the 3 repetition-code qubits flip.
pub fn repetition_logical_error_rate(p: f64) -> f64 {
    3.0 * p * p * (1.0 - p) + p * p * p
}

/// Simplified approximation of the Shor code logical error rate, `p^2 (1 + 2p)`.
///
/// Not a rigorous derivation; it only serves as a reference curve.
pub fn shor_logical_error_rate(p: f64) -> f64 {
    p * p * (1.0 + 2.0 * p)
}

/// Validate probability parameter
fn validate_prob(p: f64) -> Result<(), NoiseError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(NoiseError::InvalidProbability(p));
    }
    Ok(())
}
