//! Simulator Orchestrator.
//!
//! Drives one logical qubit through `init -> encode -> noise -> syndrome -> correction
//! -> decode -> complete`. Every command is validated by [`Phase::transition`], and the
//! resulting state is handed to a [`SnapshotStore`] so the timeline can be scrubbed.

use crate::codes::{self, CodeType, ErrorCorrectingCode};
use crate::core::errors::{NoiseError, SimulatorError};
use crate::core::{
    BlochVector, CorrectionDetails, CorrectionOutcome, GateErrorConfig, GateErrorDetails,
    GateKind, GateOperation, LogicalState, NoiseConfig, NoiseEvent, Pauli, QuantumStep,
    QuantumSystem, QubitRole, StateVector, StepKind, Syndrome, apply_gate, apply_noise,
};
use crate::snapshot::{SnapshotPolicy, SnapshotStore};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Stage of the correction cycle, named after the last completed step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Init,
    Encode,
    Noise,
    Syndrome,
    Correction,
    Decode,
    Complete,
}

/// Commands that may move the simulator between phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Encode,
    ApplyNoise,
    InjectError,
    CustomGate,
    CustomCircuit,
    MeasureSyndrome,
    Correct,
    Decode,
    Finish,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Action::Encode => "encode",
            Action::ApplyNoise => "apply noise",
            Action::InjectError => "inject an error",
            Action::CustomGate => "apply a custom gate",
            Action::CustomCircuit => "apply a custom circuit",
            Action::MeasureSyndrome => "measure the syndrome",
            Action::Correct => "correct",
            Action::Decode => "decode",
            Action::Finish => "finish",
        }
    }
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Init => "init",
            Phase::Encode => "encode",
            Phase::Noise => "noise",
            Phase::Syndrome => "syndrome",
            Phase::Correction => "correction",
            Phase::Decode => "decode",
            Phase::Complete => "complete",
        }
    }

    /// The phase reached by performing `action` from `self`.
    pub fn transition(self, action: Action) -> Result<Phase, SimulatorError> {
        let next = match (self, action) {
            (Phase::Init, Action::Encode) => Phase::Encode,
            (Phase::Encode, Action::ApplyNoise) => Phase::Noise,
            (Phase::Encode | Phase::Noise, Action::InjectError | Action::CustomGate) => self,
            (Phase::Encode | Phase::Noise, Action::CustomCircuit) => Phase::Correction,
            (Phase::Noise, Action::MeasureSyndrome) => Phase::Syndrome,
            (Phase::Syndrome, Action::Correct) => Phase::Correction,
            (Phase::Correction, Action::Decode) => Phase::Decode,
            (Phase::Decode, Action::Finish) => Phase::Complete,
            _ => {
                return Err(SimulatorError::InvalidTransition {
                    phase: self.name(),
                    action: action.name(),
                });
            }
        };
        Ok(next)
    }

    /// The command `step_forward` performs from this phase.
    pub fn next_action(self) -> Option<Action> {
        match self {
            Phase::Init => Some(Action::Encode),
            Phase::Encode => Some(Action::ApplyNoise),
            Phase::Noise => Some(Action::MeasureSyndrome),
            Phase::Syndrome => Some(Action::Correct),
            Phase::Correction => Some(Action::Decode),
            Phase::Decode => Some(Action::Finish),
            Phase::Complete => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct SimulatorConfig {
    pub code_type: CodeType,
    pub initial_state: LogicalState,
    pub noise: NoiseConfig,
    pub gate_errors: Option<GateErrorConfig>,
    pub snapshot_policy: SnapshotPolicy,
    /// Seed for the simulator's random source; entropy from the OS when absent.
    pub seed: Option<u64>,
}

impl SimulatorConfig {
    pub fn new(code_type: CodeType, initial_state: LogicalState) -> Self {
        Self {
            code_type,
            initial_state,
            ..Self::default()
        }
    }

    pub fn with_noise(mut self, noise: NoiseConfig) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_gate_errors(mut self, config: GateErrorConfig) -> Self {
        self.gate_errors = Some(config);
        self
    }

    pub fn with_snapshot_policy(mut self, policy: SnapshotPolicy) -> Self {
        self.snapshot_policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), NoiseError> {
        self.noise.validate()?;
        if let Some(gate_errors) = &self.gate_errors {
            gate_errors.validate()?;
        }
        Ok(())
    }
}

/// A user-placed gate with an optional gate-error override for that gate alone.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomGate {
    pub operation: GateOperation,
    pub gate_errors: Option<GateErrorConfig>,
}

impl CustomGate {
    pub fn new(operation: GateOperation) -> Self {
        Self {
            operation,
            gate_errors: None,
        }
    }

    pub fn with_gate_errors(mut self, config: GateErrorConfig) -> Self {
        self.gate_errors = Some(config);
        self
    }
}

/// Result of [`QecSimulator::apply_custom_circuit`].
#[derive(Clone, Debug, PartialEq)]
pub struct CustomCircuitReport {
    pub gate_errors: Vec<GateErrorDetails>,
    pub correction: CorrectionDetails,
}

/// Summary of a full cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct CycleReport {
    pub noise_events: Vec<NoiseEvent>,
    pub correction: Option<CorrectionDetails>,
    pub actual_errors: usize,
    pub fidelity: f64,
}

/// Everything a snapshot must restore.
#[derive(Clone, Debug)]
struct SimulationState {
    phase: Phase,
    system: QuantumSystem,
    /// Noise-free state receiving only intentional operations.
    reference: StateVector,
    expected_syndrome: Syndrome,
    last_syndrome: Option<Syndrome>,
    last_correction: Option<CorrectionDetails>,
    noise_events: Vec<NoiseEvent>,
    actual_errors: usize,
}

pub struct QecSimulator {
    config: SimulatorConfig,
    code: &'static dyn ErrorCorrectingCode,
    rng: StdRng,
    current: SimulationState,
    snapshots: SnapshotStore<SimulationState>,
}

impl QecSimulator {
    /// Builds and initializes a simulator.
    pub fn new(config: SimulatorConfig) -> Result<Self, SimulatorError> {
        config.validate()?;
        let code = config.code_type.code();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let current = Self::fresh_state(&config, code)?;
        let mut sim = Self {
            snapshots: SnapshotStore::new(config.snapshot_policy),
            config,
            code,
            rng,
            current,
        };
        sim.snapshots.record(&sim.current, true);
        Ok(sim)
    }

    fn fresh_state(
        config: &SimulatorConfig,
        code: &dyn ErrorCorrectingCode,
    ) -> Result<SimulationState, SimulatorError> {
        let mut system = QuantumSystem::with_layout(code.layout())?;
        system.set_gate_error_config(config.gate_errors.clone());
        system.prepare_logical_state(config.initial_state, 0)?;

        Ok(SimulationState {
            phase: Phase::Init,
            reference: system.state().clone(),
            system,
            expected_syndrome: Syndrome::zeros(code.syndrome_len()),
            last_syndrome: None,
            last_correction: None,
            noise_events: Vec::new(),
            actual_errors: 0,
        })
    }

    // --- Queries ---

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn code(&self) -> &'static dyn ErrorCorrectingCode {
        self.code
    }

    pub fn phase(&self) -> Phase {
        self.current.phase
    }

    pub fn system(&self) -> &QuantumSystem {
        &self.current.system
    }

    pub fn state(&self) -> &StateVector {
        self.current.system.state()
    }

    pub fn history(&self) -> &[QuantumStep] {
        self.current.system.history()
    }

    pub fn bloch_coordinates(&self) -> Result<Vec<BlochVector>, SimulatorError> {
        Ok(self.current.system.bloch_coordinates()?)
    }

    /// Noise-free state the live state is compared against.
    pub fn reference_state(&self) -> &StateVector {
        &self.current.reference
    }

    /// Fidelity between the live state and the noise-free reference.
    pub fn fidelity(&self) -> f64 {
        self.current.system.fidelity(&self.current.reference)
    }

    pub fn expected_syndrome(&self) -> &Syndrome {
        &self.current.expected_syndrome
    }

    pub fn last_syndrome(&self) -> Option<&Syndrome> {
        self.current.last_syndrome.as_ref()
    }

    pub fn last_correction(&self) -> Option<&CorrectionDetails> {
        self.current.last_correction.as_ref()
    }

    pub fn noise_events(&self) -> &[NoiseEvent] {
        &self.current.noise_events
    }

    /// Errors actually injected so far: noise, gate errors and manual injections.
    pub fn actual_error_count(&self) -> usize {
        self.current.actual_errors
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn snapshot_index(&self) -> usize {
        self.snapshots.cursor()
    }

    // --- Commands ---

    /// Starts a new run from the configured logical state.
    pub fn initialize(&mut self) -> Result<(), SimulatorError> {
        self.current = Self::fresh_state(&self.config, self.code)?;
        self.snapshots.clear();
        self.snapshots.record(&self.current, true);
        info!(
            "initialized {} code with {}",
            self.config.code_type.name(),
            self.config.initial_state.ket()
        );
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), SimulatorError> {
        self.initialize()
    }

    pub fn encode(&mut self) -> Result<Vec<GateErrorDetails>, SimulatorError> {
        let next = self.current.phase.transition(Action::Encode)?;
        let circuit = self.code.encoding_circuit()?;
        let errors = codes::encode(self.code, &mut self.current.system, &mut self.rng)?;
        self.apply_to_reference(&circuit)?;
        self.current.actual_errors += errors.len();
        self.commit(next);
        Ok(errors)
    }

    /// Applies the configured ambient noise to the data qubits.
    pub fn apply_noise(&mut self) -> Result<Vec<NoiseEvent>, SimulatorError> {
        let next = self.current.phase.transition(Action::ApplyNoise)?;
        let events = apply_noise(&mut self.current.system, &self.config.noise, &mut self.rng)?;
        let applied = events.iter().filter(|e| e.applied()).count();
        if applied == 0 {
            self.current.system.log_step(StepKind::Noise, "No errors occurred");
        }
        self.current.actual_errors += applied;
        self.current.noise_events = events.clone();
        self.commit(next);
        Ok(events)
    }

    /// Forces a Pauli error on a data qubit.
    pub fn inject_error(&mut self, qubit: usize, pauli: Pauli) -> Result<(), SimulatorError> {
        let next = self.current.phase.transition(Action::InjectError)?;
        self.check_data_qubit(qubit)?;
        self.current.system.apply_pauli_error(
            qubit,
            pauli,
            StepKind::Noise,
            format!("Injected {pauli} error on q{qubit}"),
        )?;
        debug!("injected {pauli} on q{qubit}");
        self.current.actual_errors += 1;
        self.commit(next);
        Ok(())
    }

    pub fn measure_syndrome(&mut self) -> Result<Syndrome, SimulatorError> {
        let next = self.current.phase.transition(Action::MeasureSyndrome)?;
        let syndrome = self.extract_syndrome()?;
        self.commit(next);
        Ok(syndrome)
    }

    /// Applies the decode-table correction for the last syndrome.
    ///
    /// Never fails because too many errors happened: that case is reported through
    /// [`CorrectionOutcome::DistanceExceeded`] and a warning step.
    pub fn correct(&mut self) -> Result<CorrectionDetails, SimulatorError> {
        let next = self.current.phase.transition(Action::Correct)?;
        let details = self.run_correction()?;
        self.commit(next);
        Ok(details)
    }

    pub fn decode(&mut self) -> Result<Vec<GateErrorDetails>, SimulatorError> {
        let next = self.current.phase.transition(Action::Decode)?;
        let circuit = self.code.decoding_circuit()?;
        let errors = codes::decode(self.code, &mut self.current.system, &mut self.rng)?;
        self.apply_to_reference(&circuit)?;
        self.current.actual_errors += errors.len();
        self.commit(next);
        Ok(errors)
    }

    /// Closes the cycle with a fidelity marker.
    ///
    /// The marker is logged as a `Decode` step: it ends the decode stage of the history
    /// and carries no operation.
    pub fn finish(&mut self) -> Result<(), SimulatorError> {
        let next = self.current.phase.transition(Action::Finish)?;
        let fidelity = self.fidelity();
        self.current
            .system
            .log_step(StepKind::Decode, format!("Cycle complete, fidelity {fidelity:.4}"));
        self.commit(next);
        Ok(())
    }

    /// Advances one phase, replaying a stored snapshot when one exists ahead.
    ///
    /// Returns `false` once the cycle is complete.
    pub fn step_forward(&mut self) -> Result<bool, SimulatorError> {
        if let Some(state) = self.snapshots.forward() {
            self.current = state.clone();
            return Ok(true);
        }

        match self.current.phase.next_action() {
            None => Ok(false),
            Some(Action::Encode) => self.encode().map(|_| true),
            Some(Action::ApplyNoise) => self.apply_noise().map(|_| true),
            Some(Action::MeasureSyndrome) => self.measure_syndrome().map(|_| true),
            Some(Action::Correct) => self.correct().map(|_| true),
            Some(Action::Decode) => self.decode().map(|_| true),
            Some(Action::Finish) => self.finish().map(|_| true),
            Some(_) => Ok(false),
        }
    }

    /// Restores the previous snapshot. Returns `false` at the start of the timeline.
    pub fn step_backward(&mut self) -> bool {
        match self.snapshots.back() {
            Some(state) => {
                self.current = state.clone();
                true
            }
            None => false,
        }
    }

    pub fn go_to_step(&mut self, index: usize) -> Result<(), SimulatorError> {
        let len = self.snapshots.len();
        let state = self
            .snapshots
            .go_to(index)
            .ok_or(SimulatorError::SnapshotOutOfRange { index, len })?;
        self.current = state.clone();
        Ok(())
    }

    /// Runs the remaining phases of the cycle, starting over if already complete.
    pub fn run_full_cycle(&mut self) -> Result<CycleReport, SimulatorError> {
        if self.current.phase == Phase::Complete {
            self.initialize()?;
        }
        while self.step_forward()? {}

        Ok(CycleReport {
            noise_events: self.current.noise_events.clone(),
            correction: self.current.last_correction.clone(),
            actual_errors: self.current.actual_errors,
            fidelity: self.fidelity(),
        })
    }

    /// Applies one user-placed single-qubit gate to a data qubit.
    ///
    /// The gate is intentional: it reaches the reference state and its syndrome
    /// signature is folded into the expected syndrome.
    pub fn apply_custom_gate(
        &mut self,
        gate: &CustomGate,
    ) -> Result<Vec<GateErrorDetails>, SimulatorError> {
        let next = self.current.phase.transition(Action::CustomGate)?;
        let errors = self.run_custom_gate(gate)?;
        self.commit(next);
        Ok(errors)
    }

    /// Applies user-placed gates, then measures and corrects only the part of the
    /// syndrome the gates do not explain.
    pub fn apply_custom_circuit(
        &mut self,
        gates: &[CustomGate],
    ) -> Result<CustomCircuitReport, SimulatorError> {
        let next = self.current.phase.transition(Action::CustomCircuit)?;
        for gate in gates {
            self.validate_custom_gate(gate)?;
        }

        let mut gate_errors = Vec::new();
        for gate in gates {
            gate_errors.extend(self.run_custom_gate(gate)?);
        }
        self.extract_syndrome()?;
        let correction = self.run_correction()?;
        self.commit(next);

        Ok(CustomCircuitReport {
            gate_errors,
            correction,
        })
    }

    // --- Internals ---

    fn commit(&mut self, next: Phase) {
        let boundary = next != self.current.phase;
        if boundary {
            info!("phase {} -> {}", self.current.phase.name(), next.name());
        }
        self.current.phase = next;
        self.snapshots.record(&self.current, boundary);
    }

    fn apply_to_reference(&mut self, circuit: &[GateOperation]) -> Result<(), SimulatorError> {
        for op in circuit {
            apply_gate(&mut self.current.reference, op)?;
        }
        Ok(())
    }

    fn check_data_qubit(&self, qubit: usize) -> Result<(), SimulatorError> {
        match self.current.system.qubit(qubit) {
            Some(info) if info.role == QubitRole::Data => Ok(()),
            _ => Err(SimulatorError::NotDataQubit(qubit)),
        }
    }

    fn validate_custom_gate(&self, gate: &CustomGate) -> Result<(), SimulatorError> {
        let kind = gate.operation.kind();
        if kind.arity() != 1 {
            return Err(SimulatorError::UnsupportedCustomGate(kind.name()));
        }
        self.check_data_qubit(gate.operation.targets()[0])?;
        if let Some(config) = &gate.gate_errors {
            config.validate()?;
        }
        Ok(())
    }

    fn run_custom_gate(
        &mut self,
        gate: &CustomGate,
    ) -> Result<Vec<GateErrorDetails>, SimulatorError> {
        self.validate_custom_gate(gate)?;
        let op = &gate.operation;
        let qubit = op.targets()[0];

        let system = &mut self.current.system;
        let previous = match &gate.gate_errors {
            Some(config) => Some(system.set_gate_error_config(Some(config.clone()))),
            None => None,
        };
        let result = system.apply_gate(op, &mut self.rng);
        if let Some(previous) = previous {
            system.set_gate_error_config(previous);
        }
        let errors = result?;

        apply_gate(&mut self.current.reference, op)?;
        if let Some(pauli) = intentional_pauli(op.kind()) {
            let signature = self.code.syndrome_of(qubit, pauli);
            self.current.expected_syndrome = self.current.expected_syndrome.xor(&signature)?;
        }
        self.current.actual_errors += errors.len();
        Ok(errors)
    }

    fn extract_syndrome(&mut self) -> Result<Syndrome, SimulatorError> {
        let before = self.current.system.history().len();
        let rng: &mut dyn RngCore = &mut self.rng;
        let syndrome = self.code.extract_syndrome(&mut self.current.system, rng)?;
        let gate_errors = self.current.system.history()[before..]
            .iter()
            .filter(|s| s.kind == StepKind::GateError)
            .count();
        self.current.actual_errors += gate_errors;

        info!("syndrome {syndrome}");
        self.current.last_syndrome = Some(syndrome.clone());
        Ok(syndrome)
    }

    fn run_correction(&mut self) -> Result<CorrectionDetails, SimulatorError> {
        let measured = self
            .current
            .last_syndrome
            .clone()
            .unwrap_or_else(|| Syndrome::zeros(self.code.syndrome_len()));
        let expected = self.current.expected_syndrome.clone();
        let residual = measured.xor(&expected)?;
        let corrections = self.code.corrections_for(&residual)?;
        let actual_errors = self.current.actual_errors;
        let outcome = CorrectionOutcome::classify(actual_errors);

        if outcome == CorrectionOutcome::DistanceExceeded {
            warn!(
                "{actual_errors} errors exceed what the code can correct; correction may be wrong"
            );
            self.current.system.log_step(
                StepKind::Correction,
                format!(
                    "Warning: {actual_errors} errors occurred, more than the code corrects. \
                     Syndrome {residual} may point to the wrong qubit."
                ),
            );
        }

        let errors =
            codes::apply_corrections(&mut self.current.system, &corrections, &mut self.rng)?;
        self.current.actual_errors += errors.len();

        let details = CorrectionDetails {
            measured,
            expected,
            residual,
            corrections,
            actual_errors,
            outcome,
        };
        let description = if details.corrections.is_empty() {
            format!("Syndrome {}: no correction needed", details.residual)
        } else {
            let applied: Vec<String> = details
                .corrections
                .iter()
                .map(|c| format!("{} on q{}", c.pauli, c.qubit))
                .collect();
            format!("Syndrome {}: applied {}", details.residual, applied.join(", "))
        };
        self.current.system.log_correction(description, details.clone());
        self.current.last_correction = Some(details.clone());
        Ok(details)
    }
}

/// Pauli whose syndrome signature an intentional single-qubit gate is assumed to carry.
///
/// Gates that only partially rotate a qubit follow their more probable branch:
/// a rotation counts as its Pauli when sin^2(theta/2) > 1/2. H counts as a bit flip.
fn intentional_pauli(kind: GateKind) -> Option<Pauli> {
    let dominant = |theta: f64| (theta / 2.0).sin().powi(2) > 0.5;
    match kind {
        GateKind::X | GateKind::H => Some(Pauli::X),
        GateKind::Y => Some(Pauli::Y),
        GateKind::Z => Some(Pauli::Z),
        GateKind::Rx(theta) if dominant(theta) => Some(Pauli::X),
        GateKind::Ry(theta) if dominant(theta) => Some(Pauli::Y),
        GateKind::Rz(theta) if dominant(theta) => Some(Pauli::Z),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn transitions_are_linear() {
        let mut phase = Phase::Init;
        let mut visited = vec![phase];
        while let Some(action) = phase.next_action() {
            phase = phase.transition(action).unwrap();
            visited.push(phase);
        }
        assert_eq!(
            visited,
            vec![
                Phase::Init,
                Phase::Encode,
                Phase::Noise,
                Phase::Syndrome,
                Phase::Correction,
                Phase::Decode,
                Phase::Complete
            ]
        );
    }

    #[test]
    fn out_of_order_actions_are_rejected() {
        assert_eq!(
            Phase::Init.transition(Action::Correct),
            Err(SimulatorError::InvalidTransition {
                phase: "init",
                action: "correct"
            })
        );
        assert!(Phase::Syndrome.transition(Action::InjectError).is_err());
        assert!(Phase::Complete.transition(Action::Finish).is_err());
        assert_eq!(Phase::Noise.transition(Action::CustomGate), Ok(Phase::Noise));
        assert_eq!(Phase::Encode.transition(Action::CustomCircuit), Ok(Phase::Correction));
    }

    #[test]
    fn intentional_pauli_follows_dominant_branch() {
        assert_eq!(intentional_pauli(GateKind::H), Some(Pauli::X));
        assert_eq!(intentional_pauli(GateKind::Rx(PI)), Some(Pauli::X));
        assert_eq!(intentional_pauli(GateKind::Rx(0.2)), None);
        assert_eq!(intentional_pauli(GateKind::Ry(0.9 * PI)), Some(Pauli::Y));
        assert_eq!(intentional_pauli(GateKind::Rz(PI)), Some(Pauli::Z));
        assert_eq!(intentional_pauli(GateKind::S), None);
        assert_eq!(intentional_pauli(GateKind::T), None);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = SimulatorConfig::default();
        config.noise.probability = 2.0;
        assert!(matches!(
            QecSimulator::new(config),
            Err(SimulatorError::NoiseError(NoiseError::InvalidProbability(_)))
        ));
    }
}
