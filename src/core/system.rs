//! Quantum System: the live state plus qubit metadata and a replayable history.

use crate::core::errors::StateError;
use crate::core::gates::{self, GateKind, GateOperation, Pauli};
use crate::core::noise::GateErrorConfig;
use crate::core::state::{BlochVector, StateVector};
use crate::core::syndrome::CorrectionDetails;
use log::debug;
use rand::Rng;

/// What a qubit is used for. Ambient noise only ever targets `Data`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QubitRole {
    Data,
    Ancilla,
    Syndrome,
}

#[derive(Clone, Debug, PartialEq)]
pub struct QubitInfo {
    pub index: usize,
    pub label: String,
    pub role: QubitRole,
}

impl QubitInfo {
    pub fn data(index: usize) -> Self {
        Self {
            index,
            label: format!("q{index}"),
            role: QubitRole::Data,
        }
    }

    pub fn ancilla(index: usize) -> Self {
        Self {
            index,
            label: format!("a{index}"),
            role: QubitRole::Ancilla,
        }
    }
}

/// Single-qubit state loaded before encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogicalState {
    #[default]
    Zero,
    One,
    Plus,
    Minus,
}

impl LogicalState {
    /// Gates preparing this state from |0>.
    fn preparation(self) -> &'static [GateKind] {
        match self {
            LogicalState::Zero => &[],
            LogicalState::One => &[GateKind::X],
            LogicalState::Plus => &[GateKind::H],
            LogicalState::Minus => &[GateKind::X, GateKind::H],
        }
    }

    pub fn ket(self) -> &'static str {
        match self {
            LogicalState::Zero => "|0>",
            LogicalState::One => "|1>",
            LogicalState::Plus => "|+>",
            LogicalState::Minus => "|->",
        }
    }
}

/// Tag of a history entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepKind {
    Gate,
    Measurement,
    Noise,
    GateError,
    Encode,
    Decode,
    Correction,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeasurementRecord {
    pub qubit: usize,
    pub result: u8,
}

/// An error injected right after a gate.
#[derive(Clone, Debug, PartialEq)]
pub struct GateErrorDetails {
    pub gate: GateKind,
    pub qubit: usize,
    pub error: Pauli,
    pub probability: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StepDetails {
    GateError(GateErrorDetails),
    Correction(CorrectionDetails),
}

/// One entry of the execution history.
#[derive(Clone, Debug, PartialEq)]
pub struct QuantumStep {
    /// Monotonically increasing within one run.
    pub sequence: u64,
    pub kind: StepKind,
    pub operation: Option<GateOperation>,
    pub description: String,
    pub state_before: StateVector,
    pub state_after: StateVector,
    pub measurement: Option<MeasurementRecord>,
    pub details: Option<StepDetails>,
}

#[derive(Clone, Debug)]
pub struct QuantumSystem {
    state: StateVector,
    qubits: Vec<QubitInfo>,
    history: Vec<QuantumStep>,
    gate_errors: Option<GateErrorConfig>,
    next_sequence: u64,
}

impl QuantumSystem {
    /// Creates a system of `num_qubits` data qubits in |0...0>.
    pub fn new(num_qubits: usize) -> Result<Self, StateError> {
        Self::with_layout((0..num_qubits).map(QubitInfo::data).collect())
    }

    /// Creates a system whose qubits are described by `qubits`, in index order.
    pub fn with_layout(qubits: Vec<QubitInfo>) -> Result<Self, StateError> {
        let state = StateVector::new(qubits.len())?;
        Ok(Self {
            state,
            qubits,
            history: Vec::new(),
            gate_errors: None,
            next_sequence: 0,
        })
    }

    pub fn num_qubits(&self) -> usize {
        self.state.num_qubits()
    }

    pub fn state(&self) -> &StateVector {
        &self.state
    }

    pub fn qubits(&self) -> &[QubitInfo] {
        &self.qubits
    }

    pub fn qubit(&self, index: usize) -> Option<&QubitInfo> {
        self.qubits.get(index)
    }

    /// Indices of qubits with the `Data` role.
    pub fn data_qubits(&self) -> Vec<usize> {
        self.qubits_with_role(QubitRole::Data)
    }

    pub fn qubits_with_role(&self, role: QubitRole) -> Vec<usize> {
        self.qubits
            .iter()
            .filter(|q| q.role == role)
            .map(|q| q.index)
            .collect()
    }

    pub fn history(&self) -> &[QuantumStep] {
        &self.history
    }

    pub fn gate_error_config(&self) -> Option<&GateErrorConfig> {
        self.gate_errors.as_ref()
    }

    /// Replaces the gate-error configuration, returning the previous one.
    pub fn set_gate_error_config(
        &mut self,
        config: Option<GateErrorConfig>,
    ) -> Option<GateErrorConfig> {
        std::mem::replace(&mut self.gate_errors, config)
    }

    pub fn set_role(&mut self, index: usize, role: QubitRole) -> Result<(), StateError> {
        self.qubit_mut(index)?.role = role;
        Ok(())
    }

    pub fn set_label(&mut self, index: usize, label: impl Into<String>) -> Result<(), StateError> {
        self.qubit_mut(index)?.label = label.into();
        Ok(())
    }

    fn qubit_mut(&mut self, index: usize) -> Result<&mut QubitInfo, StateError> {
        let num_qubits = self.qubits.len();
        self.qubits
            .get_mut(index)
            .ok_or(StateError::IndexOutOfBounds { index, num_qubits })
    }

    /// Applies a gate, logged as a plain gate step, with gate-error injection.
    pub fn apply_gate<R: Rng + ?Sized>(
        &mut self,
        op: &GateOperation,
        rng: &mut R,
    ) -> Result<Vec<GateErrorDetails>, StateError> {
        self.apply_gate_as(op, StepKind::Gate, rng)
    }

    /// Applies a gate logged under `kind`, then injects gate errors if configured.
    ///
    /// Each target qubit draws independently, so a two-qubit gate can produce two errors.
    pub fn apply_gate_as<R: Rng + ?Sized>(
        &mut self,
        op: &GateOperation,
        kind: StepKind,
        rng: &mut R,
    ) -> Result<Vec<GateErrorDetails>, StateError> {
        self.apply_ideal_gate_as(op, kind, op.to_string())?;

        let Some(config) = self.gate_errors.clone() else {
            return Ok(Vec::new());
        };
        if !config.applies_to(op) {
            return Ok(Vec::new());
        }

        let mut injected = Vec::new();
        for &qubit in op.targets() {
            if rng.random::<f64>() >= config.probability {
                continue;
            }
            let Some(error) = config.error_type.sample_pauli(rng) else {
                continue;
            };

            let details = GateErrorDetails {
                gate: op.kind(),
                qubit,
                error,
                probability: config.probability,
            };
            debug!("gate error {error} on q{qubit} after {op}");

            let before = self.state.clone();
            let error_op = GateOperation::single(error.gate_kind(), qubit)?;
            gates::apply_gate(&mut self.state, &error_op)?;
            self.record(
                StepKind::GateError,
                Some(error_op),
                format!("Gate error: {error} on q{qubit} after {}", op.kind().name()),
                before,
                None,
                Some(StepDetails::GateError(details.clone())),
            );
            injected.push(details);
        }
        Ok(injected)
    }

    /// Applies a gate without any error injection.
    pub fn apply_ideal_gate_as(
        &mut self,
        op: &GateOperation,
        kind: StepKind,
        description: impl Into<String>,
    ) -> Result<(), StateError> {
        let before = self.state.clone();
        gates::apply_gate(&mut self.state, op)?;
        self.record(kind, Some(op.clone()), description.into(), before, None, None);
        Ok(())
    }

    /// Applies a Pauli error outside of any gate (ambient noise or manual injection).
    pub fn apply_pauli_error(
        &mut self,
        qubit: usize,
        error: Pauli,
        kind: StepKind,
        description: impl Into<String>,
    ) -> Result<(), StateError> {
        let op = GateOperation::single(error.gate_kind(), qubit)?;
        self.apply_ideal_gate_as(&op, kind, description)
    }

    /// Measures one qubit in the Z basis, collapsing the state.
    pub fn measure_qubit<R: Rng + ?Sized>(
        &mut self,
        qubit: usize,
        rng: &mut R,
    ) -> Result<u8, StateError> {
        let before = self.state.clone();
        let result = self.state.measure_qubit(qubit, rng)?;
        let label = self
            .qubit(qubit)
            .map_or_else(|| format!("q{qubit}"), |q| q.label.clone());
        self.record(
            StepKind::Measurement,
            None,
            format!("Measure {label} -> {result}"),
            before,
            Some(MeasurementRecord { qubit, result }),
            None,
        );
        Ok(result)
    }

    /// Records a marker without changing the state.
    pub fn log_step(&mut self, kind: StepKind, description: impl Into<String>) {
        let before = self.state.clone();
        self.record(kind, None, description.into(), before, None, None);
    }

    /// Records a correction summary without changing the state.
    pub fn log_correction(&mut self, description: impl Into<String>, details: CorrectionDetails) {
        let before = self.state.clone();
        self.record(
            StepKind::Correction,
            None,
            description.into(),
            before,
            None,
            Some(StepDetails::Correction(details)),
        );
    }

    /// Loads `logical` onto `qubit` of a freshly reset register. Never subject to gate errors.
    pub fn prepare_logical_state(
        &mut self,
        logical: LogicalState,
        qubit: usize,
    ) -> Result<(), StateError> {
        self.state.validate_qubit_index(qubit)?;
        let before = self.state.clone();
        for &kind in logical.preparation() {
            gates::apply_gate(&mut self.state, &GateOperation::single(kind, qubit)?)?;
        }
        self.record(
            StepKind::Encode,
            None,
            format!("Prepare logical {} on q{qubit}", logical.ket()),
            before,
            None,
            None,
        );
        Ok(())
    }

    /// Returns to |0...0> and clears the history.
    pub fn reset(&mut self) {
        self.state.reset();
        self.history.clear();
        self.next_sequence = 0;
    }

    /// Bloch vector of every qubit, in index order.
    pub fn bloch_coordinates(&self) -> Result<Vec<BlochVector>, StateError> {
        (0..self.num_qubits())
            .map(|q| self.state.bloch_coordinates(q))
            .collect()
    }

    pub fn fidelity(&self, reference: &StateVector) -> f64 {
        self.state.fidelity(reference)
    }

    fn record(
        &mut self,
        kind: StepKind,
        operation: Option<GateOperation>,
        description: String,
        state_before: StateVector,
        measurement: Option<MeasurementRecord>,
        details: Option<StepDetails>,
    ) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.history.push(QuantumStep {
            sequence,
            kind,
            operation,
            description,
            state_before,
            state_after: self.state.clone(),
            measurement,
            details,
        });
    }
}
