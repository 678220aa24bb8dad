//! Quantum error-correcting codes.
//!
//! This module contains the stabilizer codes the simulator can run:
//! - **Repetition**: 3 data qubits protecting against a single bit flip.
//! - **Shor**: 9 data qubits protecting against any single-qubit Pauli error.
//!
//! Both extract syndromes through ancillas borrowed from an [`AncillaPool`].

mod ancilla;
pub mod repetition;
pub mod shor;

pub use ancilla::AncillaPool;
pub use repetition::RepetitionCode;
pub use shor::ShorCode;

use crate::core::errors::{CodeError, GateError};
use crate::core::{
    Correction, GateErrorDetails, GateKind, GateOperation, Pauli, QuantumSystem, QubitInfo,
    StepKind, Syndrome,
};
use rand::RngCore;

/// Selects one of the built-in codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CodeType {
    #[default]
    Repetition,
    Shor,
}

static REPETITION: RepetitionCode = RepetitionCode;
static SHOR: ShorCode = ShorCode;

impl CodeType {
    pub fn code(self) -> &'static dyn ErrorCorrectingCode {
        match self {
            CodeType::Repetition => &REPETITION,
            CodeType::Shor => &SHOR,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CodeType::Repetition => "3-qubit repetition",
            CodeType::Shor => "9-qubit Shor",
        }
    }
}

/// A stabilizer code: its circuits, its syndrome extraction and its decode table.
///
/// Data qubits occupy indices `0..data_qubits()`, ancillas follow.
pub trait ErrorCorrectingCode: Send + Sync {
    fn code_type(&self) -> CodeType;

    fn data_qubits(&self) -> usize;

    /// Physical ancilla qubits, reused across syndrome bits.
    fn ancilla_qubits(&self) -> usize;

    fn syndrome_len(&self) -> usize;

    fn total_qubits(&self) -> usize {
        self.data_qubits() + self.ancilla_qubits()
    }

    fn layout(&self) -> Vec<QubitInfo> {
        let data = self.data_qubits();
        (0..data)
            .map(QubitInfo::data)
            .chain((data..self.total_qubits()).map(QubitInfo::ancilla))
            .collect()
    }

    fn ancilla_pool(&self) -> AncillaPool {
        AncillaPool::new((self.data_qubits()..self.total_qubits()).collect())
    }

    /// Gates mapping the logical qubit on q0 to the codeword.
    fn encoding_circuit(&self) -> Result<Vec<GateOperation>, GateError>;

    /// Exact reverse of the encoding circuit.
    fn decoding_circuit(&self) -> Result<Vec<GateOperation>, GateError> {
        Ok(self
            .encoding_circuit()?
            .iter()
            .rev()
            .map(GateOperation::inverse)
            .collect())
    }

    /// Measures every stabilizer through ancillas, leaving each ancilla back in |0>.
    fn extract_syndrome(
        &self,
        system: &mut QuantumSystem,
        rng: &mut dyn RngCore,
    ) -> Result<Syndrome, CodeError>;

    /// Decode table: the corrective Paulis for a syndrome.
    fn corrections_for(&self, syndrome: &Syndrome) -> Result<Vec<Correction>, CodeError>;

    /// Syndrome produced by a single Pauli on one data qubit of a valid codeword.
    fn syndrome_of(&self, qubit: usize, pauli: Pauli) -> Syndrome;

    fn check_syndrome(&self, syndrome: &Syndrome) -> Result<(), CodeError> {
        if syndrome.len() != self.syndrome_len() {
            return Err(CodeError::InvalidSyndromeLength {
                expected: self.syndrome_len(),
                got: syndrome.len(),
            });
        }
        Ok(())
    }
}

/// Runs the encoding circuit, logging each gate as an encode step.
pub fn encode(
    code: &dyn ErrorCorrectingCode,
    system: &mut QuantumSystem,
    rng: &mut dyn RngCore,
) -> Result<Vec<GateErrorDetails>, CodeError> {
    run_circuit(system, &code.encoding_circuit()?, StepKind::Encode, rng)
}

/// Runs the decoding circuit, logging each gate as a decode step.
pub fn decode(
    code: &dyn ErrorCorrectingCode,
    system: &mut QuantumSystem,
    rng: &mut dyn RngCore,
) -> Result<Vec<GateErrorDetails>, CodeError> {
    run_circuit(system, &code.decoding_circuit()?, StepKind::Decode, rng)
}

/// Applies the corrective Paulis as gates.
pub fn apply_corrections(
    system: &mut QuantumSystem,
    corrections: &[Correction],
    rng: &mut dyn RngCore,
) -> Result<Vec<GateErrorDetails>, CodeError> {
    let ops = corrections
        .iter()
        .map(|c| {
            GateOperation::single(c.pauli.gate_kind(), c.qubit)
                .map(|op| op.with_label(format!("Correct {} on q{}", c.pauli, c.qubit)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    run_circuit(system, &ops, StepKind::Correction, rng)
}

fn run_circuit(
    system: &mut QuantumSystem,
    ops: &[GateOperation],
    kind: StepKind,
    rng: &mut dyn RngCore,
) -> Result<Vec<GateErrorDetails>, CodeError> {
    let mut errors = Vec::new();
    for op in ops {
        errors.extend(system.apply_gate_as(op, kind, rng)?);
    }
    Ok(errors)
}

/// Measures the Z-parity of `data` into a borrowed ancilla.
pub(crate) fn measure_z_parity(
    system: &mut QuantumSystem,
    pool: &mut AncillaPool,
    role: &str,
    data: &[usize],
    rng: &mut dyn RngCore,
) -> Result<u8, CodeError> {
    let ancilla = pool.allocate(system, role)?;
    for &q in data {
        system.apply_gate(&GateOperation::cnot(q, ancilla)?, rng)?;
    }
    let result = system.measure_qubit(ancilla, rng)?;
    pool.release(system, ancilla, result)?;
    Ok(result)
}

/// Measures the X-parity of `data` by phase kickback onto a borrowed ancilla.
pub(crate) fn measure_x_parity(
    system: &mut QuantumSystem,
    pool: &mut AncillaPool,
    role: &str,
    data: &[usize],
    rng: &mut dyn RngCore,
) -> Result<u8, CodeError> {
    let ancilla = pool.allocate(system, role)?;
    let hadamard = GateOperation::single(GateKind::H, ancilla)?;
    system.apply_gate(&hadamard, rng)?;
    for &q in data {
        system.apply_gate(&GateOperation::cnot(ancilla, q)?, rng)?;
    }
    system.apply_gate(&hadamard, rng)?;
    let result = system.measure_qubit(ancilla, rng)?;
    pool.release(system, ancilla, result)?;
    Ok(result)
}
