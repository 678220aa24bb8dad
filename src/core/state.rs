use crate::core::errors::StateError;
use crate::core::utils::TOLERANCE;
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use rand::Rng;

/// Largest register the dense representation accepts (2^17 amplitudes).
pub const MAX_QUBITS: usize = 17;

/// Dense pure state over `num_qubits` qubits.
///
/// Amplitude `i` belongs to the basis state whose bit `k` is the value of qubit `k`.
#[derive(Clone, Debug, PartialEq)]
pub struct StateVector {
    amplitudes: Array1<Complex64>,
    num_qubits: usize,
}

/// Cartesian point on the Bloch sphere of a single qubit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlochVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl BlochVector {
    /// Length of the vector: 1 for a pure unentangled qubit, shorter when mixed.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

impl StateVector {
    /// Creates a new state initialized to |0...0>.
    pub fn new(num_qubits: usize) -> Result<Self, StateError> {
        Self::basis_state(num_qubits, 0)
    }

    /// Creates the computational basis state `|index>`.
    pub fn basis_state(num_qubits: usize, index: usize) -> Result<Self, StateError> {
        Self::check_qubit_count(num_qubits)?;
        let dim = 1 << num_qubits;
        if index >= dim {
            return Err(StateError::IndexOutOfBounds {
                index,
                num_qubits,
            });
        }

        let mut amplitudes = Array1::<Complex64>::zeros(dim);
        amplitudes[index] = Complex64::new(1.0, 0.0);

        Ok(Self {
            amplitudes,
            num_qubits,
        })
    }

    /// Creates a state from raw amplitudes.
    ///
    /// The vector is taken as given: call [`StateVector::normalize`] before use if the
    /// amplitudes were built unnormalized.
    pub fn from_amplitudes(amplitudes: Array1<Complex64>) -> Result<Self, StateError> {
        let dim = amplitudes.len();

        // Dimension must be a power of 2
        if dim < 2 || !dim.is_power_of_two() {
            return Err(StateError::InvalidDimensions(dim));
        }

        let num_qubits = dim.trailing_zeros() as usize;
        Self::check_qubit_count(num_qubits)?;

        Ok(Self {
            amplitudes,
            num_qubits,
        })
    }

    fn check_qubit_count(num_qubits: usize) -> Result<(), StateError> {
        if num_qubits == 0 {
            return Err(StateError::ZeroQubits);
        }
        if num_qubits > MAX_QUBITS {
            return Err(StateError::TooManyQubits {
                requested: num_qubits,
                max: MAX_QUBITS,
            });
        }
        Ok(())
    }

    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of amplitudes (2^n).
    pub fn dim(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn amplitudes(&self) -> &Array1<Complex64> {
        &self.amplitudes
    }

    pub(crate) fn amplitudes_mut(&mut self) -> &mut Array1<Complex64> {
        &mut self.amplitudes
    }

    /// Amplitude of basis state `index`, zero when out of range.
    pub fn amplitude(&self, index: usize) -> Complex64 {
        self.amplitudes
            .get(index)
            .copied()
            .unwrap_or(Complex64::new(0.0, 0.0))
    }

    /// Checks if a given index is within the register.
    pub fn validate_qubit_index(&self, index: usize) -> Result<(), StateError> {
        if index >= self.num_qubits {
            return Err(StateError::IndexOutOfBounds {
                index,
                num_qubits: self.num_qubits,
            });
        }
        Ok(())
    }

    /// Sum of squared amplitudes.
    pub fn norm_squared(&self) -> f64 {
        self.amplitudes.iter().map(|c| c.norm_sqr()).sum()
    }

    pub fn is_normalized(&self, tolerance: f64) -> bool {
        (self.norm_squared() - 1.0).abs() <= tolerance
    }

    /// Rescales the vector to unit L2 norm.
    pub fn normalize(&mut self) -> Result<(), StateError> {
        let norm = self.norm_squared().sqrt();
        if norm < TOLERANCE {
            return Err(StateError::ZeroNorm);
        }
        self.amplitudes.mapv_inplace(|c| c / norm);
        Ok(())
    }

    /// Returns the state to |0...0>.
    pub fn reset(&mut self) {
        self.amplitudes.fill(Complex64::new(0.0, 0.0));
        self.amplitudes[0] = Complex64::new(1.0, 0.0);
    }

    /// Probability of observing basis state `index`.
    pub fn probability(&self, index: usize) -> f64 {
        self.amplitude(index).norm_sqr()
    }

    /// Probability of every basis state, in index order.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|c| c.norm_sqr()).collect()
    }

    /// Probability of measuring qubit `qubit` as 1.
    pub fn qubit_probability(&self, qubit: usize) -> Result<f64, StateError> {
        self.validate_qubit_index(qubit)?;
        let mask = 1 << qubit;

        Ok(self
            .amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, c)| c.norm_sqr())
            .sum())
    }

    /// Physical measurement in the Z basis which collapses the state irretrievably.
    ///
    /// Returns the classical outcome (0 or 1).
    pub fn measure_qubit<R: Rng + ?Sized>(
        &mut self,
        qubit: usize,
        rng: &mut R,
    ) -> Result<u8, StateError> {
        let p_one = self.qubit_probability(qubit)?;
        let roll: f64 = rng.random();
        let outcome = u8::from(roll < p_one);

        let mask = 1 << qubit;
        let keep_set = outcome == 1;
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if (i & mask != 0) != keep_set {
                *amp = Complex64::new(0.0, 0.0);
            }
        }
        self.normalize()?;

        Ok(outcome)
    }

    /// Single-qubit reduced density matrix, tracing out every other qubit.
    pub fn reduced_density_matrix(&self, qubit: usize) -> Result<Array2<Complex64>, StateError> {
        self.validate_qubit_index(qubit)?;
        let mask = 1 << qubit;

        let mut rho = Array2::<Complex64>::zeros((2, 2));
        for i in (0..self.dim()).filter(|i| i & mask == 0) {
            let a0 = self.amplitudes[i];
            let a1 = self.amplitudes[i | mask];
            rho[[0, 0]] += a0 * a0.conj();
            rho[[0, 1]] += a0 * a1.conj();
            rho[[1, 0]] += a1 * a0.conj();
            rho[[1, 1]] += a1 * a1.conj();
        }
        Ok(rho)
    }

    /// Bloch coordinates of one qubit, for display.
    pub fn bloch_coordinates(&self, qubit: usize) -> Result<BlochVector, StateError> {
        let rho = self.reduced_density_matrix(qubit)?;
        let rho01 = rho[[0, 1]];

        Ok(BlochVector {
            x: 2.0 * rho01.re,
            y: -2.0 * rho01.im,
            z: rho[[0, 0]].re - rho[[1, 1]].re,
        })
    }

    /// `<self|other>`, or `None` when the dimensions differ.
    pub fn inner_product(&self, other: &StateVector) -> Option<Complex64> {
        if self.dim() != other.dim() {
            return None;
        }
        Some(
            self.amplitudes
                .iter()
                .zip(other.amplitudes.iter())
                .map(|(a, b)| a.conj() * b)
                .sum(),
        )
    }

    /// |<self|other>|^2. Mismatched dimensions yield 0.
    pub fn fidelity(&self, other: &StateVector) -> f64 {
        self.inner_product(other).map_or(0.0, |overlap| overlap.norm_sqr())
    }
}
