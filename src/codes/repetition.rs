//! 3-qubit bit-flip repetition code.
//!
//! Encoding is a CNOT fan-out from q0 onto q1 and q2, after the logical state has been
//! loaded on q0. Two ancillas (q3, q4) each hold one parity bit:
//!
//! | s1 | s2 | meaning         | correction |
//! |----|----|-----------------|------------|
//! | 0  | 0  | no error        | none       |
//! | 1  | 0  | error on q0     | X on q0    |
//! | 1  | 1  | error on q1     | X on q1    |
//! | 0  | 1  | error on q2     | X on q2    |

use super::{CodeType, ErrorCorrectingCode, measure_z_parity};
use crate::core::errors::{CodeError, GateError};
use crate::core::{Correction, GateOperation, Pauli, QuantumSystem, Syndrome};
use rand::RngCore;

#[derive(Clone, Copy, Debug, Default)]
pub struct RepetitionCode;

/// Position inside a 3-qubit block flagged by the parities `(s1, s2)`.
pub(crate) fn flagged_position(s1: u8, s2: u8) -> Option<usize> {
    match (s1, s2) {
        (1, 0) => Some(0),
        (1, 1) => Some(1),
        (0, 1) => Some(2),
        _ => None,
    }
}

/// Parities `(s1, s2)` raised by a bit flip at `position` inside a block.
pub(crate) fn parities_of(position: usize) -> (u8, u8) {
    match position {
        0 => (1, 0),
        1 => (1, 1),
        2 => (0, 1),
        _ => (0, 0),
    }
}

/// Measures the two ZZ parities of `block` through the pool.
pub(crate) fn extract_block_parities(
    system: &mut QuantumSystem,
    pool: &mut super::AncillaPool,
    block: [usize; 3],
    label: &str,
    rng: &mut dyn RngCore,
) -> Result<(u8, u8), CodeError> {
    let [a, b, c] = block;
    let s1 = measure_z_parity(system, pool, &format!("{label}Z{a}Z{b}"), &[a, b], rng)?;
    let s2 = measure_z_parity(system, pool, &format!("{label}Z{b}Z{c}"), &[b, c], rng)?;
    Ok((s1, s2))
}

impl ErrorCorrectingCode for RepetitionCode {
    fn code_type(&self) -> CodeType {
        CodeType::Repetition
    }

    fn data_qubits(&self) -> usize {
        3
    }

    fn ancilla_qubits(&self) -> usize {
        2
    }

    fn syndrome_len(&self) -> usize {
        2
    }

    fn encoding_circuit(&self) -> Result<Vec<GateOperation>, GateError> {
        Ok(vec![GateOperation::cnot(0, 1)?, GateOperation::cnot(0, 2)?])
    }

    fn extract_syndrome(
        &self,
        system: &mut QuantumSystem,
        rng: &mut dyn RngCore,
    ) -> Result<Syndrome, CodeError> {
        let mut pool = self.ancilla_pool();
        let (s1, s2) = extract_block_parities(system, &mut pool, [0, 1, 2], "", rng)?;
        Ok(Syndrome::new(vec![s1, s2]))
    }

    fn corrections_for(&self, syndrome: &Syndrome) -> Result<Vec<Correction>, CodeError> {
        self.check_syndrome(syndrome)?;
        let bits = syndrome.bits();
        Ok(flagged_position(bits[0], bits[1])
            .map(|qubit| Correction {
                qubit,
                pauli: Pauli::X,
            })
            .into_iter()
            .collect())
    }

    fn syndrome_of(&self, qubit: usize, pauli: Pauli) -> Syndrome {
        if qubit >= 3 || !pauli.flips_bit() {
            return Syndrome::zeros(2);
        }
        let (s1, s2) = parities_of(qubit);
        Syndrome::new(vec![s1, s2])
    }
}
