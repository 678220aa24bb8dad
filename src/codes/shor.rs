//! 9-qubit Shor code.
//!
//! Three blocks `{0,1,2}`, `{3,4,5}`, `{6,7,8}` each form a bit-flip repetition code;
//! the block leaders 0, 3, 6 form a phase-flip repetition code on top. Syndrome bits:
//!
//! - `s0..s5`: ZZ parities, two per block, same table as the repetition code.
//! - `s6`: X on blocks 1+2, `s7`: X on blocks 2+3.
//!
//! All eight roles share one physical ancilla (q9), reset before every reuse, which
//! keeps the register at 2^10 amplitudes.

use super::repetition::{extract_block_parities, flagged_position, parities_of};
use super::{CodeType, ErrorCorrectingCode, measure_x_parity};
use crate::core::errors::{CodeError, GateError};
use crate::core::{Correction, GateKind, GateOperation, Pauli, QuantumSystem, Syndrome};
use rand::RngCore;

pub const BLOCKS: [[usize; 3]; 3] = [[0, 1, 2], [3, 4, 5], [6, 7, 8]];

#[derive(Clone, Copy, Debug, Default)]
pub struct ShorCode;

impl ShorCode {
    /// Syndrome bits of the phase checks touched by a phase flip in `block`.
    fn phase_bits(block: usize) -> (u8, u8) {
        match block {
            0 => (1, 0),
            1 => (1, 1),
            2 => (0, 1),
            _ => (0, 0),
        }
    }
}

impl ErrorCorrectingCode for ShorCode {
    fn code_type(&self) -> CodeType {
        CodeType::Shor
    }

    fn data_qubits(&self) -> usize {
        9
    }

    fn ancilla_qubits(&self) -> usize {
        1
    }

    fn syndrome_len(&self) -> usize {
        8
    }

    fn encoding_circuit(&self) -> Result<Vec<GateOperation>, GateError> {
        let leaders = BLOCKS.map(|b| b[0]);

        // Phase layer: spread q0 over the block leaders in the X basis
        let mut ops = vec![
            GateOperation::single(GateKind::H, leaders[0])?,
            GateOperation::cnot(leaders[0], leaders[1])?,
            GateOperation::cnot(leaders[0], leaders[2])?,
        ];
        for &leader in &leaders {
            ops.push(GateOperation::single(GateKind::H, leader)?);
        }

        // Bit layer
        for [leader, a, b] in BLOCKS {
            ops.push(GateOperation::cnot(leader, a)?);
            ops.push(GateOperation::cnot(leader, b)?);
        }
        Ok(ops)
    }

    fn extract_syndrome(
        &self,
        system: &mut QuantumSystem,
        rng: &mut dyn RngCore,
    ) -> Result<Syndrome, CodeError> {
        let mut pool = self.ancilla_pool();
        let mut bits = Vec::with_capacity(8);

        for (i, block) in BLOCKS.into_iter().enumerate() {
            let (s1, s2) =
                extract_block_parities(system, &mut pool, block, &format!("B{}:", i + 1), rng)?;
            bits.push(s1);
            bits.push(s2);
        }

        for (first, second) in [(0, 1), (1, 2)] {
            let data: Vec<usize> = BLOCKS[first]
                .iter()
                .chain(BLOCKS[second].iter())
                .copied()
                .collect();
            let role = format!("X-block{}{}", first + 1, second + 1);
            bits.push(measure_x_parity(system, &mut pool, &role, &data, rng)?);
        }

        Ok(Syndrome::new(bits))
    }

    fn corrections_for(&self, syndrome: &Syndrome) -> Result<Vec<Correction>, CodeError> {
        self.check_syndrome(syndrome)?;
        let bits = syndrome.bits();
        let mut corrections = Vec::new();

        for (i, block) in BLOCKS.iter().enumerate() {
            if let Some(position) = flagged_position(bits[2 * i], bits[2 * i + 1]) {
                corrections.push(Correction {
                    qubit: block[position],
                    pauli: Pauli::X,
                });
            }
        }

        // A Z on the leader fixes the whole block: its three qubits share one phase
        if let Some(block) = flagged_position(bits[6], bits[7]) {
            corrections.push(Correction {
                qubit: BLOCKS[block][0],
                pauli: Pauli::Z,
            });
        }

        Ok(corrections)
    }

    fn syndrome_of(&self, qubit: usize, pauli: Pauli) -> Syndrome {
        let mut syndrome = Syndrome::zeros(8);
        if qubit >= 9 {
            return syndrome;
        }
        let (block, position) = (qubit / 3, qubit % 3);

        if pauli.flips_bit() {
            let (s1, s2) = parities_of(position);
            if s1 == 1 {
                syndrome.toggle(2 * block);
            }
            if s2 == 1 {
                syndrome.toggle(2 * block + 1);
            }
        }
        if pauli.flips_phase() {
            let (s6, s7) = Self::phase_bits(block);
            if s6 == 1 {
                syndrome.toggle(6);
            }
            if s7 == 1 {
                syndrome.toggle(7);
            }
        }
        syndrome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::encode;
    use crate::core::{LogicalState, StepKind};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn register_stays_at_ten_qubits() {
        let code = ShorCode;
        assert_eq!(code.total_qubits(), 10);
        assert_eq!(code.ancilla_pool().capacity(), 1);
    }

    #[test]
    fn decoding_reverses_encoding() {
        let code = ShorCode;
        let enc = code.encoding_circuit().unwrap();
        let dec = code.decoding_circuit().unwrap();
        assert_eq!(enc.len(), dec.len());
        assert_eq!(
            enc.first().map(|op| op.targets().to_vec()),
            dec.last().map(|op| op.targets().to_vec())
        );
    }

    #[test]
    fn clean_codeword_has_trivial_syndrome() {
        let mut rng = StdRng::seed_from_u64(3);
        let code = ShorCode;
        for logical in [LogicalState::Zero, LogicalState::One, LogicalState::Plus] {
            let mut sys = QuantumSystem::with_layout(code.layout()).unwrap();
            sys.prepare_logical_state(logical, 0).unwrap();
            encode(&code, &mut sys, &mut rng).unwrap();
            let syndrome = code.extract_syndrome(&mut sys, &mut rng).unwrap();
            assert!(syndrome.is_trivial(), "{logical:?}: {syndrome}");
        }
    }

    #[test]
    fn measured_syndrome_matches_signature() {
        let code = ShorCode;
        let mut rng = StdRng::seed_from_u64(8);
        for qubit in [0, 4, 8] {
            for pauli in Pauli::ALL {
                let mut sys = QuantumSystem::with_layout(code.layout()).unwrap();
                encode(&code, &mut sys, &mut rng).unwrap();
                sys.apply_pauli_error(qubit, pauli, StepKind::Noise, "inject").unwrap();
                let syndrome = code.extract_syndrome(&mut sys, &mut rng).unwrap();
                assert_eq!(syndrome, code.syndrome_of(qubit, pauli), "{pauli} on q{qubit}");
            }
        }
    }

    #[test]
    fn phase_table_targets_block_leaders() {
        let code = ShorCode;
        let fix = code.corrections_for(&code.syndrome_of(5, Pauli::Z)).unwrap();
        assert_eq!(fix, vec![Correction { qubit: 3, pauli: Pauli::Z }]);

        let fix = code.corrections_for(&code.syndrome_of(7, Pauli::Y)).unwrap();
        assert_eq!(
            fix,
            vec![
                Correction { qubit: 7, pauli: Pauli::X },
                Correction { qubit: 6, pauli: Pauli::Z },
            ]
        );
    }
}
