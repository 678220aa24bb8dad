//! Gate Engine.
//!
//! Gates are a closed set of kinds, each with a fixed arity, validated when a
//! [`GateOperation`] is built. Application to a [`StateVector`] goes through one of
//! three paths: a 2x2 update over index pairs, a 4x4 update over index quadruples, or
//! an amplitude permutation for CNOT, SWAP and Toffoli.

use crate::core::errors::{GateError, StateError};
use crate::core::state::StateVector;
use crate::core::utils;
use ndarray::{Array2, arr2};
use num_complex::Complex64;
use std::f64::consts::PI;
use std::fmt;

/// The supported gate set. Rotation gates carry their angle in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GateKind {
    I,
    X,
    Y,
    Z,
    H,
    S,
    T,
    Rx(f64),
    Ry(f64),
    Rz(f64),
    /// Targets are `[control, target]`.
    Cnot,
    Cz,
    Swap,
    /// Targets are `[control, control, target]`.
    Toffoli,
}

impl GateKind {
    pub fn name(&self) -> &'static str {
        match self {
            GateKind::I => "I",
            GateKind::X => "X",
            GateKind::Y => "Y",
            GateKind::Z => "Z",
            GateKind::H => "H",
            GateKind::S => "S",
            GateKind::T => "T",
            GateKind::Rx(_) => "Rx",
            GateKind::Ry(_) => "Ry",
            GateKind::Rz(_) => "Rz",
            GateKind::Cnot => "CNOT",
            GateKind::Cz => "CZ",
            GateKind::Swap => "SWAP",
            GateKind::Toffoli => "Toffoli",
        }
    }

    /// Number of target qubits the gate acts on.
    pub fn arity(&self) -> usize {
        match self {
            GateKind::Cnot | GateKind::Cz | GateKind::Swap => 2,
            GateKind::Toffoli => 3,
            _ => 1,
        }
    }

    /// Rotation angle, if the gate is parameterized.
    pub fn parameter(&self) -> Option<f64> {
        match self {
            GateKind::Rx(theta) | GateKind::Ry(theta) | GateKind::Rz(theta) => Some(*theta),
            _ => None,
        }
    }

    /// Resolves a gate by name. Only rotations read `params`; extra values are ignored.
    pub fn from_name(name: &str, params: &[f64]) -> Result<Self, GateError> {
        let angle = |gate: &'static str| {
            params
                .first()
                .copied()
                .ok_or(GateError::MissingParameter(gate))
        };

        let kind = match name.to_ascii_uppercase().as_str() {
            "I" | "ID" => GateKind::I,
            "X" => GateKind::X,
            "Y" => GateKind::Y,
            "Z" => GateKind::Z,
            "H" => GateKind::H,
            "S" => GateKind::S,
            "T" => GateKind::T,
            "RX" => GateKind::Rx(angle("Rx")?),
            "RY" => GateKind::Ry(angle("Ry")?),
            "RZ" => GateKind::Rz(angle("Rz")?),
            "CNOT" | "CX" => GateKind::Cnot,
            "CZ" => GateKind::Cz,
            "SWAP" => GateKind::Swap,
            "TOFFOLI" | "CCX" => GateKind::Toffoli,
            _ => return Err(GateError::UnsupportedGate(name.to_string())),
        };
        Ok(kind)
    }

    /// Inverse gate. S and T invert to Z rotations, equal up to a global phase.
    pub fn inverse(&self) -> GateKind {
        match *self {
            GateKind::S => GateKind::Rz(-PI / 2.0),
            GateKind::T => GateKind::Rz(-PI / 4.0),
            GateKind::Rx(theta) => GateKind::Rx(-theta),
            GateKind::Ry(theta) => GateKind::Ry(-theta),
            GateKind::Rz(theta) => GateKind::Rz(-theta),
            other => other,
        }
    }

    /// Unitary matrix of the gate on its local register.
    ///
    /// Bit `k` of a row/column index is the value of the `k`-th target qubit.
    pub fn matrix(&self) -> Array2<Complex64> {
        let zero = Complex64::new(0.0, 0.0);
        let one = Complex64::new(1.0, 0.0);
        let i = Complex64::new(0.0, 1.0);

        match *self {
            GateKind::I => Array2::eye(2),
            GateKind::X => pauli_x(),
            GateKind::Y => arr2(&[[zero, -i], [i, zero]]),
            GateKind::Z => pauli_z(),
            GateKind::H => {
                let factor = Complex64::new(1.0 / 2.0_f64.sqrt(), 0.0);
                arr2(&[[factor, factor], [factor, -factor]])
            }
            GateKind::S => arr2(&[[one, zero], [zero, i]]),
            GateKind::T => arr2(&[[one, zero], [zero, Complex64::from_polar(1.0, PI / 4.0)]]),
            GateKind::Rx(theta) => {
                let c = Complex64::new((theta / 2.0).cos(), 0.0);
                let s = Complex64::new(0.0, -(theta / 2.0).sin());
                arr2(&[[c, s], [s, c]])
            }
            GateKind::Ry(theta) => {
                let c = Complex64::new((theta / 2.0).cos(), 0.0);
                let s = Complex64::new((theta / 2.0).sin(), 0.0);
                arr2(&[[c, -s], [s, c]])
            }
            GateKind::Rz(theta) => arr2(&[
                [Complex64::from_polar(1.0, -theta / 2.0), zero],
                [zero, Complex64::from_polar(1.0, theta / 2.0)],
            ]),
            GateKind::Cnot => utils::expand_operator(2, &pauli_x(), &[1], &[0]),
            GateKind::Cz => utils::expand_operator(2, &pauli_z(), &[1], &[0]),
            GateKind::Swap => arr2(&[
                [one, zero, zero, zero],
                [zero, zero, one, zero],
                [zero, one, zero, zero],
                [zero, zero, zero, one],
            ]),
            GateKind::Toffoli => utils::expand_operator(3, &pauli_x(), &[2], &[0, 1]),
        }
    }
}

fn pauli_x() -> Array2<Complex64> {
    let zero = Complex64::new(0.0, 0.0);
    let one = Complex64::new(1.0, 0.0);
    arr2(&[[zero, one], [one, zero]])
}

fn pauli_z() -> Array2<Complex64> {
    let zero = Complex64::new(0.0, 0.0);
    let one = Complex64::new(1.0, 0.0);
    arr2(&[[one, zero], [zero, -one]])
}

/// Single-qubit Pauli error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pauli {
    X,
    Y,
    Z,
}

impl Pauli {
    pub const ALL: [Pauli; 3] = [Pauli::X, Pauli::Y, Pauli::Z];

    pub fn gate_kind(self) -> GateKind {
        match self {
            Pauli::X => GateKind::X,
            Pauli::Y => GateKind::Y,
            Pauli::Z => GateKind::Z,
        }
    }

    /// Whether the error flips the computational basis value (X or Y).
    pub fn flips_bit(self) -> bool {
        matches!(self, Pauli::X | Pauli::Y)
    }

    /// Whether the error flips the relative phase (Z or Y).
    pub fn flips_phase(self) -> bool {
        matches!(self, Pauli::Z | Pauli::Y)
    }
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.gate_kind().name())
    }
}

/// A gate bound to its target qubits.
#[derive(Clone, Debug, PartialEq)]
pub struct GateOperation {
    kind: GateKind,
    targets: Vec<usize>,
    /// Optional display label for circuit renderers.
    pub label: Option<String>,
}

impl GateOperation {
    /// Binds `kind` to `targets`.
    ///
    /// # Errors
    ///
    /// Returns `GateError` if:
    /// - The number of targets does not match the gate arity.
    /// - A qubit appears more than once.
    pub fn new(kind: GateKind, targets: &[usize]) -> Result<Self, GateError> {
        if targets.len() != kind.arity() {
            return Err(GateError::InvalidOperandCount {
                gate: kind.name(),
                expected: kind.arity(),
                got: targets.len(),
            });
        }

        if let Some(dup) = utils::find_duplicate(targets) {
            return Err(GateError::DuplicateQubit(dup));
        }

        Ok(Self {
            kind,
            targets: targets.to_vec(),
            label: None,
        })
    }

    /// Builds an operation from a gate name, as supplied by a circuit editor.
    pub fn from_name(name: &str, targets: &[usize], params: &[f64]) -> Result<Self, GateError> {
        Self::new(GateKind::from_name(name, params)?, targets)
    }

    pub fn single(kind: GateKind, qubit: usize) -> Result<Self, GateError> {
        Self::new(kind, &[qubit])
    }

    pub fn cnot(control: usize, target: usize) -> Result<Self, GateError> {
        Self::new(GateKind::Cnot, &[control, target])
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn kind(&self) -> GateKind {
        self.kind
    }

    pub fn targets(&self) -> &[usize] {
        &self.targets
    }

    /// The operation undoing this one (up to global phase).
    pub fn inverse(&self) -> GateOperation {
        GateOperation {
            kind: self.kind.inverse(),
            targets: self.targets.clone(),
            label: None,
        }
    }
}

impl fmt::Display for GateOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            return f.write_str(label);
        }
        write!(f, "{}", self.kind.name())?;
        if let Some(theta) = self.kind.parameter() {
            write!(f, "({theta:.4})")?;
        }
        let qubits: Vec<String> = self.targets.iter().map(|q| format!("q{q}")).collect();
        write!(f, " {}", qubits.join(", "))
    }
}

/// Applies `op` to `state` in place.
///
/// # Errors
///
/// - `StateError::IndexOutOfBounds` when a target does not exist in the state.
/// - `GateError::InvalidOperandCount` when the targets do not match the gate arity.
pub fn apply_gate(state: &mut StateVector, op: &GateOperation) -> Result<(), StateError> {
    let t = op.targets();
    if t.len() != op.kind.arity() {
        return Err(GateError::InvalidOperandCount {
            gate: op.kind.name(),
            expected: op.kind.arity(),
            got: t.len(),
        }
        .into());
    }
    for &q in t {
        state.validate_qubit_index(q)?;
    }

    match op.kind {
        GateKind::I => {}
        GateKind::Cnot => apply_controlled_x(state, &t[..1], t[1]),
        GateKind::Toffoli => apply_controlled_x(state, &t[..2], t[2]),
        GateKind::Swap => apply_swap(state, t[0], t[1]),
        GateKind::Cz => apply_two_qubit_matrix(state, &op.kind.matrix(), t[0], t[1]),
        kind => apply_single_qubit_matrix(state, &kind.matrix(), t[0]),
    }
    Ok(())
}

/// Applies a 2x2 matrix to `qubit`, pairing indices that differ only in that bit.
pub(crate) fn apply_single_qubit_matrix(
    state: &mut StateVector,
    m: &Array2<Complex64>,
    qubit: usize,
) {
    let mask = 1 << qubit;
    let dim = state.dim();
    let amps = state.amplitudes_mut();

    for i in (0..dim).filter(|i| i & mask == 0) {
        let j = i | mask;
        let a = amps[i];
        let b = amps[j];
        amps[i] = m[[0, 0]] * a + m[[0, 1]] * b;
        amps[j] = m[[1, 0]] * a + m[[1, 1]] * b;
    }
}

/// Applies a 4x4 matrix to `(q0, q1)`, where `q0` is the low bit of the local index.
pub(crate) fn apply_two_qubit_matrix(
    state: &mut StateVector,
    m: &Array2<Complex64>,
    q0: usize,
    q1: usize,
) {
    let targets = [q0, q1];
    let mask = utils::mask_of(&targets);
    let dim = state.dim();
    let amps = state.amplitudes_mut();

    for base in (0..dim).filter(|i| i & mask == 0) {
        let indices: [usize; 4] =
            std::array::from_fn(|local| base | utils::deposit_bits(local, &targets));
        let input: [Complex64; 4] = std::array::from_fn(|k| amps[indices[k]]);

        for (row, &idx) in indices.iter().enumerate() {
            amps[idx] = (0..4).map(|col| m[[row, col]] * input[col]).sum();
        }
    }
}

/// Multi-controlled X as a permutation: swaps pairs whose controls are all 1.
fn apply_controlled_x(state: &mut StateVector, controls: &[usize], target: usize) {
    let control_mask = utils::mask_of(controls);
    let target_mask = 1 << target;
    let dim = state.dim();
    let amps = state.amplitudes_mut();

    for i in 0..dim {
        if i & control_mask == control_mask && i & target_mask == 0 {
            amps.swap(i, i | target_mask);
        }
    }
}

fn apply_swap(state: &mut StateVector, a: usize, b: usize) {
    let mask_a = 1 << a;
    let mask_b = 1 << b;
    let dim = state.dim();
    let amps = state.amplitudes_mut();

    for i in 0..dim {
        if i & mask_a != 0 && i & mask_b == 0 {
            amps.swap(i, i ^ mask_a ^ mask_b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    fn states_match(a: &StateVector, b: &StateVector) -> bool {
        a.amplitudes()
            .iter()
            .zip(b.amplitudes().iter())
            .all(|(x, y)| approx_eq(*x, *y))
    }

    /// A non-trivial 3-qubit state to exercise every amplitude.
    fn scrambled(n: usize) -> StateVector {
        let amps: Array1<Complex64> = (0..1 << n)
            .map(|i| Complex64::new(1.0 + i as f64, 0.5 * i as f64 - 1.0))
            .collect();
        let mut sv = StateVector::from_amplitudes(amps).unwrap();
        sv.normalize().unwrap();
        sv
    }

    fn apply(sv: &mut StateVector, kind: GateKind, targets: &[usize]) {
        apply_gate(sv, &GateOperation::new(kind, targets).unwrap()).unwrap();
    }

    #[test]
    fn every_gate_matrix_is_unitary() {
        let kinds = [
            GateKind::I,
            GateKind::X,
            GateKind::Y,
            GateKind::Z,
            GateKind::H,
            GateKind::S,
            GateKind::T,
            GateKind::Rx(0.3),
            GateKind::Ry(1.1),
            GateKind::Rz(-2.4),
            GateKind::Cnot,
            GateKind::Cz,
            GateKind::Swap,
            GateKind::Toffoli,
        ];
        for kind in kinds {
            let m = kind.matrix();
            assert_eq!(m.nrows(), 1 << kind.arity(), "{}", kind.name());
            assert!(utils::is_unitary(&m), "{} is not unitary", kind.name());
        }
    }

    #[test]
    fn x_flips_target_bit() {
        let mut sv = StateVector::new(3).unwrap();
        apply(&mut sv, GateKind::X, &[1]);
        assert!((sv.probability(0b010) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn hadamard_creates_equal_superposition() {
        let mut sv = StateVector::new(1).unwrap();
        apply(&mut sv, GateKind::H, &[0]);
        assert!((sv.probability(0) - 0.5).abs() < 1e-12);
        assert!((sv.probability(1) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn cnot_builds_bell_state() {
        let mut sv = StateVector::new(2).unwrap();
        apply(&mut sv, GateKind::H, &[0]);
        apply(&mut sv, GateKind::Cnot, &[0, 1]);
        assert!((sv.probability(0b00) - 0.5).abs() < 1e-12);
        assert!((sv.probability(0b11) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn permutation_shortcuts_match_matrices() {
        for (kind, targets) in [
            (GateKind::Cnot, vec![2, 0]),
            (GateKind::Swap, vec![0, 2]),
            (GateKind::Cz, vec![1, 2]),
        ] {
            let mut fast = scrambled(3);
            let mut slow = fast.clone();
            apply(&mut fast, kind, &targets);
            apply_two_qubit_matrix(&mut slow, &kind.matrix(), targets[0], targets[1]);
            assert!(states_match(&fast, &slow), "{} mismatch", kind.name());
        }
    }

    #[test]
    fn toffoli_flips_only_when_both_controls_set() {
        let mut sv = StateVector::basis_state(3, 0b011).unwrap();
        apply(&mut sv, GateKind::Toffoli, &[0, 1, 2]);
        assert!((sv.probability(0b111) - 1.0).abs() < 1e-12);

        let mut sv = StateVector::basis_state(3, 0b001).unwrap();
        apply(&mut sv, GateKind::Toffoli, &[0, 1, 2]);
        assert!((sv.probability(0b001) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn gate_followed_by_inverse_is_identity() {
        let cases = [
            (GateKind::X, vec![0]),
            (GateKind::H, vec![1]),
            (GateKind::Y, vec![2]),
            (GateKind::Rx(0.7), vec![0]),
            (GateKind::Ry(-1.3), vec![1]),
            (GateKind::Rz(2.2), vec![2]),
            (GateKind::Cnot, vec![0, 1]),
            (GateKind::Cz, vec![2, 0]),
            (GateKind::Swap, vec![1, 2]),
            (GateKind::Toffoli, vec![2, 0, 1]),
        ];
        for (kind, targets) in cases {
            let original = scrambled(3);
            let mut sv = original.clone();
            let op = GateOperation::new(kind, &targets).unwrap();
            apply_gate(&mut sv, &op).unwrap();
            apply_gate(&mut sv, &op.inverse()).unwrap();
            assert!(states_match(&sv, &original), "{} round trip", kind.name());
        }
    }

    #[test]
    fn s_inverse_matches_up_to_global_phase() {
        let original = scrambled(2);
        let mut sv = original.clone();
        let op = GateOperation::single(GateKind::S, 1).unwrap();
        apply_gate(&mut sv, &op).unwrap();
        apply_gate(&mut sv, &op.inverse()).unwrap();
        assert!((sv.fidelity(&original) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn gates_preserve_norm() {
        let mut sv = scrambled(4);
        for (kind, targets) in [
            (GateKind::H, vec![3]),
            (GateKind::T, vec![0]),
            (GateKind::Cz, vec![0, 3]),
            (GateKind::Rx(0.9), vec![2]),
            (GateKind::Toffoli, vec![3, 1, 0]),
        ] {
            apply(&mut sv, kind, &targets);
            assert!(sv.is_normalized(1e-9));
        }
    }

    #[test]
    fn construction_validates_operands() {
        assert_eq!(
            GateOperation::new(GateKind::Cnot, &[0]),
            Err(GateError::InvalidOperandCount {
                gate: "CNOT",
                expected: 2,
                got: 1
            })
        );
        assert_eq!(
            GateOperation::new(GateKind::Swap, &[1, 1]),
            Err(GateError::DuplicateQubit(1))
        );
        assert!(matches!(
            GateOperation::from_name("sqrt_x", &[0], &[]),
            Err(GateError::UnsupportedGate(_))
        ));
        assert_eq!(
            GateOperation::from_name("rz", &[0], &[]),
            Err(GateError::MissingParameter("Rz"))
        );
        let op = GateOperation::from_name("cx", &[0, 1], &[9.9]).unwrap();
        assert_eq!(op.kind(), GateKind::Cnot);
    }

    #[test]
    fn out_of_range_target_is_rejected() {
        let mut sv = StateVector::new(2).unwrap();
        let op = GateOperation::single(GateKind::X, 5).unwrap();
        assert!(matches!(
            apply_gate(&mut sv, &op),
            Err(StateError::IndexOutOfBounds { index: 5, .. })
        ));
    }

    #[test]
    fn arity_mismatch_is_an_error_not_a_panic() {
        let mut sv = StateVector::new(2).unwrap();
        let op = GateOperation {
            kind: GateKind::Cnot,
            targets: vec![0],
            label: None,
        };
        assert_eq!(
            apply_gate(&mut sv, &op),
            Err(StateError::GateError(GateError::InvalidOperandCount {
                gate: "CNOT",
                expected: 2,
                got: 1
            }))
        );
        assert!((sv.probability(0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn display_uses_label_or_targets() {
        let op = GateOperation::cnot(0, 3).unwrap();
        assert_eq!(op.to_string(), "CNOT q0, q3");
        let op = op.with_label("fan-out");
        assert_eq!(op.to_string(), "fan-out");
    }
}
