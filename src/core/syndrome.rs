use crate::core::errors::CodeError;
use crate::core::gates::Pauli;
use std::fmt;

/// Parity-check outcomes of one extraction round, one bit per stabilizer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Syndrome {
    bits: Vec<u8>,
}

impl Syndrome {
    /// Creates a syndrome from measured bits. Only the lowest bit of each value is kept.
    pub fn new(bits: Vec<u8>) -> Self {
        Self {
            bits: bits.into_iter().map(|b| b & 1).collect(),
        }
    }

    pub fn zeros(len: usize) -> Self {
        Self { bits: vec![0; len] }
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// No stabilizer fired.
    pub fn is_trivial(&self) -> bool {
        self.bits.iter().all(|&b| b == 0)
    }

    /// Bitwise XOR of two syndromes of the same length.
    pub fn xor(&self, other: &Syndrome) -> Result<Syndrome, CodeError> {
        if self.len() != other.len() {
            return Err(CodeError::InvalidSyndromeLength {
                expected: self.len(),
                got: other.len(),
            });
        }
        Ok(Syndrome {
            bits: self
                .bits
                .iter()
                .zip(other.bits.iter())
                .map(|(a, b)| a ^ b)
                .collect(),
        })
    }

    /// Flips bit `index` in place. Out-of-range indices are ignored.
    pub fn toggle(&mut self, index: usize) {
        if let Some(bit) = self.bits.get_mut(index) {
            *bit ^= 1;
        }
    }
}

impl fmt::Display for Syndrome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.bits {
            write!(f, "{bit}")?;
        }
        Ok(())
    }
}

/// One corrective Pauli chosen by a decode table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Correction {
    pub qubit: usize,
    pub pauli: Pauli,
}

/// How a correction round relates to the errors that actually happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrectionOutcome {
    /// No error occurred and the syndrome agreed.
    NoError,
    /// At most one error occurred, within the code distance.
    Corrected,
    /// Two or more errors occurred; the applied correction may be wrong.
    DistanceExceeded,
}

/// Payload attached to a correction step for renderers.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrectionDetails {
    pub measured: Syndrome,
    /// Syndrome explained by intentional gates; all zero outside custom circuits.
    pub expected: Syndrome,
    /// `measured ^ expected`, the part attributed to unintended errors.
    pub residual: Syndrome,
    pub corrections: Vec<Correction>,
    pub actual_errors: usize,
    pub outcome: CorrectionOutcome,
}

impl CorrectionOutcome {
    /// Classifies a round from the number of errors actually injected.
    pub fn classify(actual_errors: usize) -> Self {
        match actual_errors {
            0 => CorrectionOutcome::NoError,
            1 => CorrectionOutcome::Corrected,
            _ => CorrectionOutcome::DistanceExceeded,
        }
    }
}
